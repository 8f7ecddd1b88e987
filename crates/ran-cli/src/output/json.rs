//! JSON output formatting

use anyhow::Result;
use serde::Serialize;

/// Serialize a value, pretty-printed when requested
pub fn to_string<T: Serialize>(value: &T, pretty: bool) -> Result<String> {
    let json = if pretty {
        serde_json::to_string_pretty(value)?
    } else {
        serde_json::to_string(value)?
    };
    Ok(json)
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_to_string() {
        let value = json!({"total": 2});
        assert_eq!(to_string(&value, false).unwrap(), r#"{"total":2}"#);
        assert!(to_string(&value, true).unwrap().contains('\n'));
    }
}
