//! Authenticated identity as handed over by the session provider

use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Authenticated user reference. Read-only for everything in this crate.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Identity {
    pub id: Uuid,
    pub email: String,
    /// Free-form user metadata (username, phone, ...)
    #[serde(default)]
    pub metadata: serde_json::Value,
}

impl Identity {
    pub fn new(id: Uuid, email: impl Into<String>) -> Self {
        Self {
            id,
            email: email.into(),
            metadata: serde_json::Value::Null,
        }
    }

    pub fn with_metadata(mut self, metadata: serde_json::Value) -> Self {
        self.metadata = metadata;
        self
    }

    /// Username from metadata, else the local part of the email
    pub fn display_name(&self) -> String {
        let username = self.metadata.get("username").and_then(|v| v.as_str());
        display_name(username, Some(&self.email))
    }
}

/// Name shown for a user: username, else email local part, else a placeholder
pub fn display_name(username: Option<&str>, email: Option<&str>) -> String {
    if let Some(name) = username.filter(|n| !n.is_empty()) {
        return name.to_string();
    }

    email
        .and_then(|e| e.split('@').next())
        .filter(|local| !local.is_empty())
        .map(str::to_string)
        .unwrap_or_else(|| "Unknown User".to_string())
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_display_name_prefers_username() {
        let identity = Identity::new(Uuid::new_v4(), "jane@homeland.co.ke")
            .with_metadata(json!({ "username": "jkamau" }));
        assert_eq!(identity.display_name(), "jkamau");
    }

    #[test]
    fn test_display_name_falls_back_to_email_then_placeholder() {
        let identity = Identity::new(Uuid::new_v4(), "jane@homeland.co.ke");
        assert_eq!(identity.display_name(), "jane");

        assert_eq!(display_name(Some(""), None), "Unknown User");
        assert_eq!(display_name(None, Some("@nowhere")), "Unknown User");
    }
}
