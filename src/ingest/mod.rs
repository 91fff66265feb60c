/// Provider clients.
///
/// Each external source gets its own file; `fetch` holds the shared
/// single-attempt fetcher and the transport seam they all go through.
pub mod fetch;
pub mod lcra;
pub mod mesonet;
pub mod nws;
pub mod radar;
pub mod usgs;
