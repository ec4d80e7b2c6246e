//! Credential file loading
//!
//! One credential per line, three `|`-separated fields:
//!
//! ```text
//! appToken|promoId|eventType
//! ```
//!
//! Fields are trimmed. Blank lines are ignored; lines with the wrong field
//! count or an empty field are skipped with a warning and counted, so one bad
//! line never prevents the rest of the file from loading.

use std::path::Path;

use common::Secret;
use tracing::{info, warn};

use crate::error::{Error, Result};

/// One app token plus the promo it is entitled to act on.
///
/// Immutable once loaded. The app token is the identity of the record and is
/// kept behind `Secret` so it never reaches logs; use `fingerprint()` instead.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CredentialRecord {
    pub app_token: Secret<String>,
    pub promo_id: String,
    pub event_type: String,
}

impl CredentialRecord {
    pub fn new(
        app_token: impl Into<String>,
        promo_id: impl Into<String>,
        event_type: impl Into<String>,
    ) -> Self {
        Self {
            app_token: Secret::new(app_token.into()),
            promo_id: promo_id.into(),
            event_type: event_type.into(),
        }
    }

    /// Log-safe identifier for this credential.
    pub fn fingerprint(&self) -> String {
        self.app_token.fingerprint()
    }
}

/// Result of parsing a credential file.
#[derive(Debug, Default)]
pub struct LoadReport {
    pub records: Vec<CredentialRecord>,
    /// Non-blank lines that could not be parsed
    pub skipped: usize,
}

/// Parse a single line. `Ok(None)` for blank lines.
pub fn parse_line(line: &str) -> Result<Option<CredentialRecord>> {
    let line = line.trim();
    if line.is_empty() {
        return Ok(None);
    }

    let fields: Vec<&str> = line.split('|').map(str::trim).collect();
    let [app_token, promo_id, event_type] = fields.as_slice() else {
        return Err(Error::CredentialParse(format!(
            "expected 3 fields, found {}",
            fields.len()
        )));
    };

    if app_token.is_empty() || promo_id.is_empty() || event_type.is_empty() {
        return Err(Error::CredentialParse("empty field".into()));
    }

    Ok(Some(CredentialRecord::new(
        *app_token,
        *promo_id,
        *event_type,
    )))
}

/// Parse the full contents of a credential file.
pub fn parse_credentials(contents: &str) -> LoadReport {
    let mut report = LoadReport::default();
    for (index, line) in contents.lines().enumerate() {
        match parse_line(line) {
            Ok(Some(record)) => report.records.push(record),
            Ok(None) => {}
            Err(e) => {
                warn!(line = index + 1, error = %e, "skipping malformed credential line");
                report.skipped += 1;
            }
        }
    }
    report
}

/// Read and parse a credential file.
pub async fn load_credentials(path: &Path) -> Result<LoadReport> {
    let contents = tokio::fs::read_to_string(path)
        .await
        .map_err(|e| Error::Io(format!("reading {}: {e}", path.display())))?;
    let report = parse_credentials(&contents);
    info!(
        path = %path.display(),
        credentials = report.records.len(),
        skipped = report.skipped,
        "loaded credentials"
    );
    Ok(report)
}
