/// USGS NWIS Instantaneous Values (IV) query by bounding box.
///
/// The IV service returns WaterML rendered as JSON; the pipeline only needs
/// the number of reporting time series, so the payload is kept opaque.

use serde_json::Value;

use crate::model::Coordinate;

/// Discharge (cfs) and gage height (ft).
pub const PARAM_DISCHARGE: &str = "00060";
pub const PARAM_STAGE: &str = "00065";

/// Builds an IV URL for all active sites inside a box of ±`half_width_deg`
/// around `target`.
///
/// USGS expects `bBox=west,south,east,north` with at most 7 decimal places.
pub fn build_bbox_url(base_url: &str, target: Coordinate, half_width_deg: f64) -> String {
    format!(
        "{}?format=json&parameterCd={},{}&bBox={:.4},{:.4},{:.4},{:.4}&siteStatus=active",
        base_url,
        PARAM_STAGE,
        PARAM_DISCHARGE,
        target.lon - half_width_deg,
        target.lat - half_width_deg,
        target.lon + half_width_deg,
        target.lat + half_width_deg,
    )
}

/// Number of `value.timeSeries` entries, 0 when the shape is not as expected.
pub fn count_time_series(payload: &Value) -> usize {
    payload
        .get("value")
        .and_then(|v| v.get("timeSeries"))
        .and_then(Value::as_array)
        .map_or(0, Vec::len)
}
