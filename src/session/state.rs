//! Storage-state snapshot types

use serde::{Deserialize, Serialize};

/// Browser cookie in storage-state form
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Cookie {
    pub name: String,
    pub value: String,
    pub domain: String,
    #[serde(default = "default_path")]
    pub path: String,
    /// Unix seconds; -1 for session cookies
    #[serde(default = "default_expires")]
    pub expires: f64,
    #[serde(default)]
    pub http_only: bool,
    #[serde(default)]
    pub secure: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub same_site: Option<String>,
}

fn default_path() -> String {
    "/".to_string()
}

fn default_expires() -> f64 {
    -1.0
}

impl Cookie {
    pub fn new(name: impl Into<String>, value: impl Into<String>, domain: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            value: value.into(),
            domain: domain.into(),
            path: default_path(),
            expires: default_expires(),
            http_only: false,
            secure: false,
            same_site: None,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NameValue {
    pub name: String,
    pub value: String,
}

/// Local storage entries of one origin
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct OriginState {
    pub origin: String,
    #[serde(default)]
    pub local_storage: Vec<NameValue>,
}

/// Cookies and local storage captured from a logged-in session
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct SessionState {
    #[serde(default)]
    pub cookies: Vec<Cookie>,
    #[serde(default)]
    pub origins: Vec<OriginState>,
}

impl SessionState {
    /// A snapshot without cookies does not count as a login
    pub fn is_authenticated(&self) -> bool {
        !self.cookies.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_storage_state_file() {
        let state: SessionState = serde_json::from_str(
            r#"{
  "cookies": [
    {
      "name": "UserToken",
      "value": "token",
      "domain": ".csdn.net",
      "path": "/",
      "expires": -1.0,
      "httpOnly": true,
      "secure": true,
      "sameSite": "Lax"
    }
  ],
  "origins": [
    {"origin": "https://editor.csdn.net", "localStorage": [{"name": "draft", "value": "1"}]}
  ]
}"#,
        )
        .unwrap();

        assert!(state.is_authenticated());
        assert_eq!(state.cookies[0].same_site.as_deref(), Some("Lax"));
        assert!(state.cookies[0].http_only);
        assert_eq!(state.origins[0].local_storage.len(), 1);
    }

    #[test]
    fn test_missing_cookie_field_is_not_authenticated() {
        let state: SessionState = serde_json::from_str(r#"{"origins": []}"#).unwrap();
        assert!(!state.is_authenticated());
    }

    #[test]
    fn test_cookie_defaults() {
        let cookie: Cookie =
            serde_json::from_str(r#"{"name": "SUB", "value": "x", "domain": ".weibo.com"}"#)
                .unwrap();

        assert_eq!(cookie.path, "/");
        assert_eq!(cookie.expires, -1.0);
        assert!(cookie.same_site.is_none());
    }
}
