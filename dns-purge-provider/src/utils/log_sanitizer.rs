//! Log sanitization utilities
//!
//! Raw API messages and resource metadata can be arbitrarily long; these helpers
//! keep log lines bounded.

/// Maximum number of bytes kept from a value before truncation.
const TRUNCATE_LIMIT: usize = 256;

/// Truncate a string for logging, never splitting a UTF-8 character.
pub fn truncate_for_log(s: &str) -> String {
    if s.len() <= TRUNCATE_LIMIT {
        return s.to_string();
    }
    let cut = s
        .char_indices()
        .map(|(i, _)| i)
        .take_while(|&i| i <= TRUNCATE_LIMIT)
        .last()
        .unwrap_or(0);
    format!("{}... [truncated, total {} bytes]", &s[..cut], s.len())
}

/// Compact JSON rendering of resource metadata for debug logs.
pub fn metadata_for_log(value: &serde_json::Value) -> String {
    if value.is_null() {
        return "-".to_string();
    }
    truncate_for_log(&value.to_string())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn short_string_unchanged() {
        assert_eq!(truncate_for_log("zone in use"), "zone in use");
    }

    #[test]
    fn long_string_truncated_with_total() {
        let s = "x".repeat(TRUNCATE_LIMIT * 2);
        let result = truncate_for_log(&s);
        assert!(result.ends_with(&format!("[truncated, total {} bytes]", TRUNCATE_LIMIT * 2)));
        assert!(result.len() < s.len());
    }

    #[test]
    fn multibyte_boundary_respected() {
        let s = "é".repeat(TRUNCATE_LIMIT);
        let result = truncate_for_log(&s);
        assert!(result.contains("... [truncated"));
    }

    #[test]
    fn null_metadata_renders_dash() {
        assert_eq!(metadata_for_log(&serde_json::Value::Null), "-");
        assert_eq!(
            metadata_for_log(&serde_json::json!({"private_zone": true})),
            "{\"private_zone\":true}"
        );
    }
}
