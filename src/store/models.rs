// Safeguard — Record data models
//
// SECURITY: The `secret` field is private and wiped on drop. It is never
// included in Debug output, log messages, or serialized summaries.
// Read it explicitly through `Record::secret()`.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use zeroize::Zeroizing;

/// A stored password record.
///
/// `id` and `created_at` are assigned by the store on insertion and never
/// change. `updated_at` is refreshed on every successful update.
#[derive(Clone, PartialEq, Eq)]
pub struct Record {
    pub id: String,
    pub service: String,
    pub username: String,
    /// The credential value. NEVER printed, logged, or Debug-displayed
    secret: Zeroizing<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Record {
    /// Create a new Record with all fields.
    pub fn new(
        id: String,
        service: String,
        username: String,
        secret: String,
        created_at: DateTime<Utc>,
        updated_at: DateTime<Utc>,
    ) -> Self {
        Self {
            id,
            service,
            username,
            secret: Zeroizing::new(secret),
            created_at,
            updated_at,
        }
    }

    /// Access the raw secret value.
    pub fn secret(&self) -> &str {
        &self.secret
    }

    /// Secret-free view suitable for listing and serialization.
    pub fn summary(&self) -> RecordSummary {
        RecordSummary {
            id: self.id.clone(),
            service: self.service.clone(),
            username: self.username.clone(),
            created_at: self.created_at,
            updated_at: self.updated_at,
        }
    }

    /// Case-insensitive substring match over `service` and `username`.
    /// `needle` must already be lower-cased. The secret is never consulted.
    pub(crate) fn matches(&self, needle: &str) -> bool {
        self.service.to_lowercase().contains(needle)
            || self.username.to_lowercase().contains(needle)
    }
}

/// Custom Debug implementation that NEVER reveals the secret.
impl fmt::Debug for Record {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Record")
            .field("id", &self.id)
            .field("service", &self.service)
            .field("username", &self.username)
            .field("secret", &"[REDACTED]")
            .field("created_at", &self.created_at)
            .field("updated_at", &self.updated_at)
            .finish()
    }
}

impl fmt::Display for Record {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "[{}] {} — {}", self.id, self.service, self.username)
    }
}

/// A lightweight view of a record, used for listing.
/// Never contains the secret value.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RecordSummary {
    pub id: String,
    pub service: String,
    pub username: String,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl fmt::Display for RecordSummary {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "[{}] {} — {}", self.id, self.service, self.username)
    }
}

/// Input for creating a new record. Empty strings are accepted.
pub struct RecordFields {
    pub service: String,
    pub username: String,
    pub secret: String,
}

impl RecordFields {
    pub fn new(
        service: impl Into<String>,
        username: impl Into<String>,
        secret: impl Into<String>,
    ) -> Self {
        Self {
            service: service.into(),
            username: username.into(),
            secret: secret.into(),
        }
    }
}

/// Input for updating a record. `None` keeps the stored value.
#[derive(Default)]
pub struct RecordPatch {
    pub service: Option<String>,
    pub username: Option<String>,
    pub secret: Option<String>,
}

impl RecordPatch {
    pub fn is_empty(&self) -> bool {
        self.service.is_none() && self.username.is_none() && self.secret.is_none()
    }

    /// Merge this patch over an existing record, leaving identity untouched.
    pub(crate) fn apply(self, record: &mut Record) {
        if let Some(service) = self.service {
            record.service = service;
        }
        if let Some(username) = self.username {
            record.username = username;
        }
        if let Some(secret) = self.secret {
            record.secret = Zeroizing::new(secret);
        }
    }
}

/// A full set of fields replaces all three mutable values.
impl From<RecordFields> for RecordPatch {
    fn from(fields: RecordFields) -> Self {
        Self {
            service: Some(fields.service),
            username: Some(fields.username),
            secret: Some(fields.secret),
        }
    }
}

// ─── Tests ───────────────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;

    fn sample() -> Record {
        let now = Utc::now();
        Record::new(
            "rec-1".to_string(),
            "GitHub".to_string(),
            "alice".to_string(),
            "ghp_super_secret_12345".to_string(),
            now,
            now,
        )
    }

    #[test]
    fn test_record_debug_redacts_secret() {
        let debug_output = format!("{:?}", sample());
        assert!(debug_output.contains("[REDACTED]"));
        assert!(
            !debug_output.contains("ghp_super_secret_12345"),
            "Debug output must NEVER contain the raw secret"
        );
    }

    #[test]
    fn test_record_display_does_not_contain_secret() {
        let display_output = format!("{}", sample());
        assert!(!display_output.contains("ghp_super_secret_12345"));
        assert!(display_output.contains("GitHub"));
        assert!(display_output.contains("alice"));
    }

    #[test]
    fn test_summary_json_has_no_secret() {
        let json = serde_json::to_string(&sample().summary()).unwrap();
        assert!(!json.contains("secret"));
        assert!(json.contains("\"service\":\"GitHub\""));
    }

    #[test]
    fn test_matches_is_case_insensitive_and_ignores_secret() {
        let record = sample();
        assert!(record.matches("git"));
        assert!(record.matches("lic"));
        assert!(!record.matches("ghp_"), "secret must never be matched");
        assert!(!record.matches("gitlab"));
    }

    #[test]
    fn test_patch_keeps_absent_fields() {
        let mut record = sample();
        RecordPatch {
            username: Some("alice2".to_string()),
            ..Default::default()
        }
        .apply(&mut record);

        assert_eq!(record.service, "GitHub");
        assert_eq!(record.username, "alice2");
        assert_eq!(record.secret(), "ghp_super_secret_12345");
        assert_eq!(record.id, "rec-1");
    }

    #[test]
    fn test_full_fields_replace_everything() {
        let mut record = sample();
        let patch = RecordPatch::from(RecordFields::new("", "bob", "hunter2"));
        assert!(!patch.is_empty());
        patch.apply(&mut record);

        assert_eq!(record.service, "");
        assert_eq!(record.username, "bob");
        assert_eq!(record.secret(), "hunter2");
    }
}
