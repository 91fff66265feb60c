/// LCRA Hydromet endpoints (Lower Colorado River Authority).
///
/// Both endpoints return flat JSON arrays: one entry per stage/flow site,
/// and one entry per Highland Lakes reservoir. The pipeline passes the bodies
/// through untouched and only reports how many entries came back.

use serde_json::Value;

/// Entries in a flat array body; 0 for any other shape.
pub fn count_entries(payload: &Value) -> usize {
    payload.as_array().map_or(0, Vec::len)
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_count_entries_only_counts_arrays() {
        assert_eq!(count_entries(&json!([{"site": "Llano"}, {"site": "Junction"}])), 2);
        assert_eq!(count_entries(&json!({"sites": [1, 2, 3]})), 0, "schema drift counts as none");
        assert_eq!(count_entries(&Value::Null), 0);
    }
}
