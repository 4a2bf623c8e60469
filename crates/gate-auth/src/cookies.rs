//! Session cookie policy

use axum::http::HeaderMap;
use axum::http::header::COOKIE;
use cookie::time::Duration;
use cookie::{Cookie, SameSite};
use serde::{Deserialize, Serialize};

/// SameSite attribute for the session cookie
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SameSitePolicy {
    #[default]
    Lax,
    Strict,
    None,
}

impl SameSitePolicy {
    fn as_same_site(self) -> SameSite {
        match self {
            SameSitePolicy::Lax => SameSite::Lax,
            SameSitePolicy::Strict => SameSite::Strict,
            SameSitePolicy::None => SameSite::None,
        }
    }
}

/// Cookie attributes used for the session cookie.
///
/// Cross-origin deployments need `same_site = "none"` together with
/// `secure = true`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CookieConfig {
    #[serde(default = "default_cookie_name")]
    pub name: String,
    #[serde(default)]
    pub secure: bool,
    #[serde(default)]
    pub same_site: SameSitePolicy,
    #[serde(default = "default_http_only")]
    pub http_only: bool,
    #[serde(default = "default_cookie_path")]
    pub path: String,
    #[serde(default = "default_max_age_secs")]
    pub max_age_secs: i64,
}

impl Default for CookieConfig {
    fn default() -> Self {
        Self {
            name: default_cookie_name(),
            secure: false,
            same_site: SameSitePolicy::default(),
            http_only: default_http_only(),
            path: default_cookie_path(),
            max_age_secs: default_max_age_secs(),
        }
    }
}

fn default_cookie_name() -> String {
    "llm_gate.sid".to_string()
}

fn default_http_only() -> bool {
    true
}

fn default_cookie_path() -> String {
    "/".to_string()
}

fn default_max_age_secs() -> i64 {
    24 * 3600
}

impl CookieConfig {
    fn builder(&self, value: String) -> cookie::CookieBuilder<'static> {
        Cookie::build((self.name.clone(), value))
            .path(self.path.clone())
            .secure(self.secure)
            .http_only(self.http_only)
            .same_site(self.same_site.as_same_site())
    }

    /// Cookie carrying a freshly issued session token
    pub fn session_cookie(&self, token: &str) -> Cookie<'static> {
        self.builder(token.to_string())
            .max_age(Duration::seconds(self.max_age_secs))
            .build()
    }

    /// Cookie instructing the client to discard its session cookie
    pub fn removal_cookie(&self) -> Cookie<'static> {
        let mut cookie = self.builder(String::new()).build();
        cookie.make_removal();
        cookie
    }

    /// Read the session token from the request `Cookie` headers
    pub fn read_token(&self, headers: &HeaderMap) -> Option<String> {
        headers
            .get_all(COOKIE)
            .iter()
            .filter_map(|value| value.to_str().ok())
            .flat_map(|value| Cookie::split_parse(value.to_string()))
            .filter_map(Result::ok)
            .find(|cookie| cookie.name() == self.name && !cookie.value().is_empty())
            .map(|cookie| cookie.value().to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::http::HeaderValue;

    #[test]
    fn test_session_cookie_attributes() {
        let config = CookieConfig {
            secure: true,
            same_site: SameSitePolicy::None,
            ..CookieConfig::default()
        };

        let rendered = config.session_cookie("tok").to_string();
        assert!(rendered.starts_with("llm_gate.sid=tok"));
        assert!(rendered.contains("HttpOnly"));
        assert!(rendered.contains("Secure"));
        assert!(rendered.contains("SameSite=None"));
        assert!(rendered.contains("Max-Age=86400"));
        assert!(rendered.contains("Path=/"));
    }

    #[test]
    fn test_removal_cookie() {
        let rendered = CookieConfig::default().removal_cookie().to_string();
        assert!(rendered.starts_with("llm_gate.sid=;"));
        assert!(rendered.contains("Max-Age=0"));
    }

    #[test]
    fn test_read_token_among_other_cookies() {
        let config = CookieConfig::default();
        let mut headers = HeaderMap::new();
        headers.append(COOKIE, HeaderValue::from_static("theme=dark; llm_gate.sid=abc.def"));

        assert_eq!(config.read_token(&headers).as_deref(), Some("abc.def"));
    }

    #[test]
    fn test_read_token_absent() {
        let config = CookieConfig::default();
        let mut headers = HeaderMap::new();
        assert_eq!(config.read_token(&headers), None);

        headers.append(COOKIE, HeaderValue::from_static("llm_gate.sid="));
        assert_eq!(config.read_token(&headers), None);
    }

    #[test]
    fn test_same_site_deserialize() {
        #[derive(Deserialize)]
        struct Wrapper {
            cookie: CookieConfig,
        }

        let parsed: Wrapper = serde_json::from_str(r#"{"cookie":{"same_site":"strict"}}"#).unwrap();
        assert_eq!(parsed.cookie.same_site, SameSitePolicy::Strict);
        assert_eq!(parsed.cookie.name, "llm_gate.sid");
    }
}
