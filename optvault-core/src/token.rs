//! Token and authorization-state payloads.
//!
//! Both are persisted as JSON values. A stored value counts as a token only
//! if it deserializes into [`AccessToken`]; a state counts as present when it
//! is anything other than JSON null.

use std::collections::BTreeMap;

use chrono::Utc;
use serde::{Deserialize, Serialize};

use crate::Timestamp;

/// When an access token stops being usable.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(tag = "kind", content = "at", rename_all = "snake_case")]
pub enum EndOfLife {
    /// Provider did not say
    #[default]
    Unknown,
    /// Token never expires
    Never,
    /// Token expires at the given instant
    At(Timestamp),
}

/// An OAuth access token as handed over by the flow layer.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AccessToken {
    pub access_token: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub refresh_token: Option<String>,
    #[serde(default)]
    pub end_of_life: EndOfLife,
    /// Provider-specific response fields (scope, token_type, ...).
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub extra_params: BTreeMap<String, serde_json::Value>,
}

impl AccessToken {
    pub fn new(access_token: impl Into<String>) -> Self {
        Self {
            access_token: access_token.into(),
            refresh_token: None,
            end_of_life: EndOfLife::Unknown,
            extra_params: BTreeMap::new(),
        }
    }

    pub fn with_refresh_token(mut self, refresh_token: impl Into<String>) -> Self {
        self.refresh_token = Some(refresh_token.into());
        self
    }

    pub fn with_end_of_life(mut self, end_of_life: EndOfLife) -> Self {
        self.end_of_life = end_of_life;
        self
    }

    /// Set the end of life `lifetime` from now.
    pub fn with_lifetime(self, lifetime: chrono::Duration) -> Self {
        self.with_end_of_life(EndOfLife::At(Utc::now() + lifetime))
    }

    pub fn with_extra_param(mut self, key: impl Into<String>, value: serde_json::Value) -> Self {
        self.extra_params.insert(key.into(), value);
        self
    }

    /// True once a known end of life has passed. Unknown and Never are not expired.
    pub fn is_expired(&self) -> bool {
        match &self.end_of_life {
            EndOfLife::At(at) => *at <= Utc::now(),
            EndOfLife::Unknown | EndOfLife::Never => false,
        }
    }

    /// The "is a token" predicate applied to raw stored values.
    pub fn from_stored(value: &serde_json::Value) -> Option<Self> {
        serde_json::from_value(value.clone()).ok()
    }
}

/// Opaque authorization state (usually the CSRF `state` parameter).
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(transparent)]
pub struct AuthorizationState(pub serde_json::Value);

impl AuthorizationState {
    /// A state that does not count as present.
    pub fn null() -> Self {
        Self(serde_json::Value::Null)
    }

    pub fn is_present(&self) -> bool {
        !self.0.is_null()
    }

    /// The state as a string, when it is one.
    pub fn as_str(&self) -> Option<&str> {
        self.0.as_str()
    }

    pub fn into_value(self) -> serde_json::Value {
        self.0
    }
}

impl From<&str> for AuthorizationState {
    fn from(s: &str) -> Self {
        Self(serde_json::Value::String(s.to_string()))
    }
}

impl From<String> for AuthorizationState {
    fn from(s: String) -> Self {
        Self(serde_json::Value::String(s))
    }
}

impl From<serde_json::Value> for AuthorizationState {
    fn from(value: serde_json::Value) -> Self {
        Self(value)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_token_builder() {
        let token = AccessToken::new("abc")
            .with_refresh_token("def")
            .with_end_of_life(EndOfLife::Never)
            .with_extra_param("scope", json!("repo"));
        assert_eq!(token.access_token, "abc");
        assert_eq!(token.refresh_token.as_deref(), Some("def"));
        assert_eq!(token.end_of_life, EndOfLife::Never);
        assert_eq!(token.extra_params["scope"], json!("repo"));
    }

    #[test]
    fn test_is_expired() {
        assert!(!AccessToken::new("a").is_expired());
        assert!(!AccessToken::new("a")
            .with_end_of_life(EndOfLife::Never)
            .is_expired());
        assert!(AccessToken::new("a")
            .with_lifetime(chrono::Duration::seconds(-10))
            .is_expired());
        assert!(!AccessToken::new("a")
            .with_lifetime(chrono::Duration::hours(1))
            .is_expired());
    }

    #[test]
    fn test_token_predicate_accepts_minimal_object() {
        let stored = json!({ "access_token": "abc" });
        let token = AccessToken::from_stored(&stored).expect("minimal token should parse");
        assert_eq!(token, AccessToken::new("abc"));
    }

    #[test]
    fn test_token_predicate_rejects_other_values() {
        assert!(AccessToken::from_stored(&json!(null)).is_none());
        assert!(AccessToken::from_stored(&json!("abc")).is_none());
        assert!(AccessToken::from_stored(&json!(42)).is_none());
        assert!(AccessToken::from_stored(&json!({ "token": "abc" })).is_none());
    }

    #[test]
    fn test_expired_token_still_counts_as_token() {
        let token = AccessToken::new("old").with_lifetime(chrono::Duration::seconds(-1));
        let stored = serde_json::to_value(&token).unwrap();
        assert!(AccessToken::from_stored(&stored).is_some());
    }

    #[test]
    fn test_end_of_life_json_shape() {
        let stored = serde_json::to_value(EndOfLife::Never).unwrap();
        assert_eq!(stored, json!({ "kind": "never" }));
    }

    #[test]
    fn test_state_presence() {
        assert!(AuthorizationState::from("xyz").is_present());
        assert!(AuthorizationState::from(json!(0)).is_present());
        assert!(AuthorizationState::from(json!("")).is_present());
        assert!(!AuthorizationState::null().is_present());
        assert!(!AuthorizationState::default().is_present());
    }

    #[test]
    fn test_state_is_transparent() {
        let state = AuthorizationState::from("xyz");
        assert_eq!(serde_json::to_value(&state).unwrap(), json!("xyz"));
        assert_eq!(state.as_str(), Some("xyz"));
    }
}
