//! Secret wrapper for app tokens and bearer tokens

use std::fmt;
use zeroize::Zeroize;

/// Sensitive value - redacted in Debug/Display/logs, zeroed on drop
pub struct Secret<T: Zeroize>(T);

impl<T: Zeroize> Secret<T> {
    pub fn new(value: T) -> Self {
        Self(value)
    }

    /// Expose the inner value (use only at the request boundary)
    pub fn expose(&self) -> &T {
        &self.0
    }
}

impl Secret<String> {
    /// Short, log-safe identifier: the first 8 characters followed by `…`.
    ///
    /// Values of 8 characters or fewer are fully masked.
    pub fn fingerprint(&self) -> String {
        let prefix: String = self.0.chars().take(8).collect();
        if prefix.chars().count() == self.0.chars().count() {
            return "…".to_string();
        }
        format!("{prefix}…")
    }
}

impl<T: Zeroize> fmt::Debug for Secret<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "[REDACTED]")
    }
}

impl<T: Zeroize> fmt::Display for Secret<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "[REDACTED]")
    }
}

impl<T: Zeroize> Drop for Secret<T> {
    fn drop(&mut self) {
        self.0.zeroize();
    }
}

impl<T: Zeroize + Clone> Clone for Secret<T> {
    fn clone(&self) -> Self {
        Self(self.0.clone())
    }
}

impl<T: Zeroize + PartialEq> PartialEq for Secret<T> {
    fn eq(&self, other: &Self) -> bool {
        self.0 == other.0
    }
}

impl<T: Zeroize + Eq> Eq for Secret<T> {}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn debug_and_display_are_redacted() {
        let token = Secret::new(String::from("app-token-0123456789"));
        assert_eq!(format!("{token:?}"), "[REDACTED]");
        assert_eq!(format!("{token}"), "[REDACTED]");
    }

    #[test]
    fn expose_returns_inner_value() {
        let token = Secret::new(String::from("bearer-abc"));
        assert_eq!(token.expose(), "bearer-abc");
    }

    #[test]
    fn fingerprint_keeps_only_a_prefix() {
        let token = Secret::new(String::from("d28721be-fd2d-4b45-869e-9f253b554e50"));
        assert_eq!(token.fingerprint(), "d28721be…");
    }

    #[test]
    fn fingerprint_masks_short_values_entirely() {
        let token = Secret::new(String::from("short"));
        assert_eq!(token.fingerprint(), "…");
    }

    #[test]
    fn equality_compares_inner_values() {
        assert_eq!(Secret::new(String::from("a")), Secret::new(String::from("a")));
        assert_ne!(Secret::new(String::from("a")), Secret::new(String::from("b")));
    }
}
