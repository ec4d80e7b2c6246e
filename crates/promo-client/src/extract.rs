//! Promo code extraction from create-code responses
//!
//! The endpoint normally answers `{"promoCode":"..."}` but has been seen
//! wrapping that object in non-JSON text. Structured parsing is tried first;
//! a pattern scan over the raw body is the fallback.
//!
//! Codes end up as one line of the output file and are read back trimmed at
//! startup, so only a code that survives that round trip unchanged is
//! accepted: surrounding whitespace is trimmed, and anything still holding
//! whitespace, control characters or escapes is rejected.

use std::sync::LazyLock;

use regex::Regex;
use serde::Deserialize;

static PROMO_CODE_PATTERN: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r#""promoCode"\s*:\s*"([^"\\]+)""#).expect("promo code regex is valid")
});

#[derive(Debug, Deserialize)]
struct CreateCodeBody {
    #[serde(rename = "promoCode")]
    promo_code: Option<String>,
}

/// Extract the promo code from a create-code response body.
///
/// Returns `None` when neither the structured parse nor the pattern scan
/// finds a usable code.
pub fn extract_promo_code(body: &str) -> Option<String> {
    if let Ok(parsed) = serde_json::from_str::<CreateCodeBody>(body.trim())
        && let Some(code) = parsed.promo_code.as_deref().and_then(normalize_code)
    {
        return Some(code);
    }

    PROMO_CODE_PATTERN
        .captures(body)
        .and_then(|caps| caps.get(1))
        .and_then(|m| normalize_code(m.as_str()))
}

fn normalize_code(raw: &str) -> Option<String> {
    let code = raw.trim();
    if code.is_empty() || code.chars().any(|c| c.is_whitespace() || c.is_control()) {
        return None;
    }
    Some(code.to_string())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn plain_json_body() {
        assert_eq!(
            extract_promo_code(r#"{"promoCode":"ABC123"}"#).as_deref(),
            Some("ABC123")
        );
    }

    #[test]
    fn json_with_whitespace_and_extra_fields() {
        let body = r#"
            { "promoCode" : "BIKE-7Q2-XYZ", "expiresAt": 1700000000 }
        "#;
        assert_eq!(extract_promo_code(body).as_deref(), Some("BIKE-7Q2-XYZ"));
    }

    #[test]
    fn code_wrapped_in_non_json_noise() {
        let body = r#"<html>callback({"promoCode":"XYZ"});</html>"#;
        assert_eq!(extract_promo_code(body).as_deref(), Some("XYZ"));
    }

    #[test]
    fn code_nested_in_envelope() {
        let body = r#"{"data":{"promoCode":"NESTED-1"}}"#;
        assert_eq!(extract_promo_code(body).as_deref(), Some("NESTED-1"));
    }

    #[test]
    fn body_without_code_yields_none() {
        assert_eq!(extract_promo_code(r#"{"error":"not eligible"}"#), None);
        assert_eq!(extract_promo_code("service unavailable"), None);
        assert_eq!(extract_promo_code(""), None);
    }

    #[test]
    fn empty_code_yields_none() {
        assert_eq!(extract_promo_code(r#"{"promoCode":""}"#), None);
        assert_eq!(extract_promo_code(r#"{"promoCode":null}"#), None);
    }

    #[test]
    fn surrounding_whitespace_is_trimmed() {
        assert_eq!(
            extract_promo_code(r#"{"promoCode":" PAD "}"#).as_deref(),
            Some("PAD")
        );
        assert_eq!(
            extract_promo_code("callback({\"promoCode\":\"\tPAD\t\"})").as_deref(),
            Some("PAD")
        );
    }

    #[test]
    fn code_spanning_lines_is_rejected() {
        // escaped newline in JSON, and the same escape seen by the pattern scan
        assert_eq!(extract_promo_code(r#"{"promoCode":"AB\nCD"}"#), None);
        assert_eq!(extract_promo_code(r#"x{"promoCode":"AB\nCD"}"#), None);
        // raw newline inside a non-JSON body
        assert_eq!(extract_promo_code("x{\"promoCode\":\"AB\nCD\"}"), None);
        assert_eq!(extract_promo_code(r#"{"promoCode":"AB CD"}"#), None);
    }
}
