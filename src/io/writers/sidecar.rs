use std::path::Path;

use serde::Serialize;
use tracing::info;

use crate::error::Result;

/// Write `value` as pretty JSON, stamped with the creation time.
pub fn write_json_sidecar<T: Serialize>(path: &Path, value: &T) -> Result<()> {
    let mut json = serde_json::to_value(value)?;
    if let serde_json::Value::Object(map) = &mut json {
        map.insert(
            "created".to_string(),
            serde_json::Value::String(chrono::Utc::now().to_rfc3339()),
        );
    }
    let json_string = serde_json::to_string_pretty(&json)?;
    std::fs::write(path, json_string)?;

    info!("Created metadata sidecar: {:?}", path);
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[derive(Serialize)]
    struct Layout {
        rows: usize,
    }

    #[test]
    fn sidecar_carries_fields_and_timestamp() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("decomp.json");
        write_json_sidecar(&path, &Layout { rows: 7 }).unwrap();
        let v: serde_json::Value =
            serde_json::from_str(&std::fs::read_to_string(&path).unwrap()).unwrap();
        assert_eq!(v["rows"], 7);
        assert!(v["created"].is_string());
    }
}
