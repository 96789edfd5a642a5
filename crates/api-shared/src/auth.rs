//! Request authentication shared by API surfaces.
//!
//! Key comparison only; which capabilities a successful match grants is the core crate's
//! business. The expected key comes from configuration resolved at startup, never from the
//! environment at request time.

/// Decides whether a presented API key grants the edit capability.
///
/// # Arguments
///
/// * `provided` - The key presented with the request (usually the `x-api-key` header).
/// * `expected` - The configured editor key; `None` means no key is configured and the
///   deployment is read-only.
///
/// # Returns
///
/// `true` only when both keys are present, non-empty and equal.
pub fn api_key_grants_edit(provided: Option<&str>, expected: Option<&str>) -> bool {
    match (provided, expected) {
        (Some(provided), Some(expected)) => !expected.is_empty() && provided == expected,
        _ => false,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_matching_key_grants_edit() {
        assert!(api_key_grants_edit(Some("secret"), Some("secret")));
    }

    #[test]
    fn test_wrong_key_is_rejected() {
        assert!(!api_key_grants_edit(Some("guess"), Some("secret")));
    }

    #[test]
    fn test_missing_key_is_rejected() {
        assert!(!api_key_grants_edit(None, Some("secret")));
    }

    #[test]
    fn test_unconfigured_deployment_rejects_everything() {
        assert!(!api_key_grants_edit(Some("anything"), None));
        assert!(!api_key_grants_edit(None, None));
    }

    #[test]
    fn test_empty_configured_key_never_matches() {
        assert!(!api_key_grants_edit(Some(""), Some("")));
    }
}
