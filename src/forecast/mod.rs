/// Forecast synthesis: prompt rendering, the model client, and validation
/// of what comes back.
///
/// Submodules:
/// - `prompt`: deterministic prompt template over a snapshot.
/// - `claude`: Anthropic Messages API client behind the `ModelClient` seam.
/// - `synthesis`: strict parse, schema checks and metadata merge.

pub mod claude;
pub mod prompt;
pub mod synthesis;
