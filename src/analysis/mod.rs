/// Geospatial selection and regional reduction of station data.
///
/// Submodules:
/// - `stations`: nearest-station selection within a radius.
/// - `regional`: mean/sum statistics and threshold indicators.

pub mod regional;
pub mod stations;

/// Rounds half away from zero to `decimals` places.
pub(crate) fn round_to(value: f64, decimals: i32) -> f64 {
    let factor = 10f64.powi(decimals);
    (value * factor).round() / factor
}
