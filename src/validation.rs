//! Field validation helpers for documents parsed at the boundary.

/// Validate that a string is not empty (after trimming).
pub fn validate_non_empty(s: &str, field: &str) -> crate::types::Result<()> {
    if s.trim().is_empty() {
        return Err(crate::types::Error::config_malformed(format!(
            "{} cannot be empty",
            field
        )));
    }
    Ok(())
}

/// Validate that a value lies within `0..=max`.
pub fn validate_at_most(n: i64, max: i64, field: &str) -> crate::types::Result<()> {
    if n < 0 || n > max {
        return Err(crate::types::Error::config_malformed(format!(
            "{} must be between 0 and {}, got {}",
            field, max, n
        )));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_validate_non_empty() {
        assert!(validate_non_empty("fake_tool", "id").is_ok());
        let err = validate_non_empty("  ", "tools[0].id").unwrap_err();
        assert!(err.to_string().contains("tools[0].id cannot be empty"));
    }

    #[test]
    fn test_validate_at_most() {
        assert!(validate_at_most(0, 100, "progress").is_ok());
        assert!(validate_at_most(100, 100, "progress").is_ok());
        let err = validate_at_most(101, 100, "progress").unwrap_err();
        assert!(err.to_string().contains("progress must be between 0 and 100, got 101"));
        assert!(validate_at_most(-1, 100, "progress").is_err());
    }
}
