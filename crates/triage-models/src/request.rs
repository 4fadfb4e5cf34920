use serde::{Deserialize, Serialize};

/// Ambient context supplied by the caller alongside the request text.
///
/// The engine never gathers context itself; whatever files, errors or
/// metadata the integrating process has on hand are passed through here and
/// consumed by the fallback scorer's trigger heuristics.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct RequestContext {
    /// Files the caller is currently working with.
    #[serde(default)]
    pub current_files: Vec<String>,
    /// Files changed recently (e.g. in the last few commits).
    #[serde(default)]
    pub changed_files: Vec<String>,
    /// Recent error messages from logs, builds or tests.
    #[serde(default)]
    pub recent_errors: Vec<String>,
    /// Free-form metadata, passed through untouched.
    #[serde(default)]
    pub metadata: Option<serde_json::Value>,
}

impl RequestContext {
    pub fn is_empty(&self) -> bool {
        self.current_files.is_empty()
            && self.changed_files.is_empty()
            && self.recent_errors.is_empty()
            && self.metadata.is_none()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn roundtrip_full_context() {
        let context = RequestContext {
            current_files: vec!["src/auth/login.rs".to_string()],
            changed_files: vec!["migrations/002_users.sql".to_string()],
            recent_errors: vec!["authentication failed for user 42".to_string()],
            metadata: Some(serde_json::json!({"branch": "feature/sso"})),
        };

        let json = serde_json::to_string(&context).unwrap();
        let deserialized: RequestContext = serde_json::from_str(&json).unwrap();
        assert_eq!(context, deserialized);
    }

    #[test]
    fn missing_fields_default_to_empty() {
        let context: RequestContext = serde_json::from_str("{}").unwrap();
        assert!(context.is_empty());
    }
}
