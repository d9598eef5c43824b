//! Protected view gate
//!
//! Decides only on identity presence. Whether the identity may use a given
//! view is left to the view itself (see [`crate::controls::admin_view_access`])
//! and to the server-side checks in [`crate::middleware`].

use crate::config::AccessConfig;
use crate::models::Identity;

/// Outcome of gating a protected view
#[derive(Debug, Clone, PartialEq)]
pub enum GateDecision {
    /// Render the view for this identity
    Render(Identity),
    /// Send the visitor elsewhere
    Redirect { to: String },
}

/// Gate in front of every authenticated view
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ViewGate {
    sign_in_path: String,
}

impl ViewGate {
    pub fn new(sign_in_path: impl Into<String>) -> Self {
        Self {
            sign_in_path: sign_in_path.into(),
        }
    }

    pub fn sign_in_path(&self) -> &str {
        &self.sign_in_path
    }

    pub fn check(&self, identity: Option<&Identity>) -> GateDecision {
        match identity {
            Some(identity) => GateDecision::Render(identity.clone()),
            None => GateDecision::Redirect {
                to: self.sign_in_path.clone(),
            },
        }
    }
}

impl Default for ViewGate {
    fn default() -> Self {
        Self::new("/signin")
    }
}

impl From<&AccessConfig> for ViewGate {
    fn from(config: &AccessConfig) -> Self {
        Self::new(config.sign_in_path.clone())
    }
}
