//! Session identity and lifecycle state

use std::fmt;

use serde::{Deserialize, Serialize};

/// Identity used when the caller does not supply one
pub const DEFAULT_SESSION_ID: &str = "session";

// ----------------------------------------------------------------------------
// Session Identity
// ----------------------------------------------------------------------------

/// Opaque, caller-chosen identity of an advertising session
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct SessionId(String);

impl SessionId {
    /// Wrap a caller-supplied identity as is
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    /// Resolve an optional identity, substituting the default for `None` or ""
    pub fn resolve(id: Option<&str>) -> Self {
        match id {
            Some(id) if !id.is_empty() => Self::new(id),
            _ => Self::default(),
        }
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl Default for SessionId {
    fn default() -> Self {
        Self(DEFAULT_SESSION_ID.to_string())
    }
}

impl fmt::Display for SessionId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

// ----------------------------------------------------------------------------
// Session State
// ----------------------------------------------------------------------------

/// Lifecycle state of the peripheral controller
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub enum SessionState {
    /// Nothing is being advertised
    #[default]
    Idle,
    /// The gateway accepted an advertisement for this session
    Active(SessionId),
}

impl SessionState {
    pub fn is_active(&self) -> bool {
        matches!(self, Self::Active(_))
    }

    /// Identity of the active session, if any
    pub fn session_id(&self) -> Option<&SessionId> {
        match self {
            Self::Active(id) => Some(id),
            Self::Idle => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_resolve_substitutes_default() {
        assert_eq!(SessionId::resolve(None).as_str(), "session");
        assert_eq!(SessionId::resolve(Some("")).as_str(), "session");
        assert_eq!(SessionId::resolve(Some("abc")).as_str(), "abc");
    }

    #[test]
    fn test_state_accessors() {
        let state = SessionState::Active(SessionId::new("s1"));
        assert!(state.is_active());
        assert_eq!(state.session_id().map(SessionId::as_str), Some("s1"));
        assert_eq!(SessionState::default(), SessionState::Idle);
        assert!(SessionState::Idle.session_id().is_none());
    }
}
