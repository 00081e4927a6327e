//! Link targets: href resolution and host matching.
//!
//! Hosts compare case-insensitively by containment, so `saucelabs.com`
//! accepts `https://www.saucelabs.com/` and `https://SauceLabs.com/about`.
//! An expectation may carry a path prefix (`linkedin.com/company/sauce-labs`),
//! in which case the URL path must start with it too.

use crate::result::{NavError, NavResult};
use serde::{Deserialize, Serialize};
use url::Url;

/// Resolve a raw href against the URL of the page it was read from
pub fn resolve_href(base_url: &str, href: &str) -> NavResult<Url> {
    let base = Url::parse(base_url).map_err(|e| NavError::InvalidUrl {
        url: base_url.to_string(),
        message: e.to_string(),
    })?;
    base.join(href.trim()).map_err(|e| NavError::InvalidUrl {
        url: href.to_string(),
        message: e.to_string(),
    })
}

/// Lower-cased host of `url`, if it parses and has one
#[must_use]
pub fn host_of(url: &str) -> Option<String> {
    Url::parse(url)
        .ok()
        .and_then(|u| u.host_str().map(str::to_ascii_lowercase))
}

/// Whether two URLs name the same document, ignoring any fragment
///
/// Following `#` or `#section` only scrolls the page, so it is not a
/// navigation.
#[must_use]
pub fn same_document(a: &str, b: &str) -> bool {
    match (Url::parse(a), Url::parse(b)) {
        (Ok(mut a), Ok(mut b)) => {
            a.set_fragment(None);
            b.set_fragment(None);
            a == b
        }
        _ => a == b,
    }
}

/// Where a link is expected to land
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct ExpectedHost {
    host: String,
    path_prefix: Option<String>,
}

impl ExpectedHost {
    /// Parse a bare host, a host with a path, or a full URL
    pub fn parse(raw: &str) -> NavResult<Self> {
        let raw = raw.trim();
        if raw.is_empty() {
            return Err(NavError::config("expected host must not be empty"));
        }

        if raw.contains("://") {
            let url = Url::parse(raw).map_err(|e| NavError::InvalidUrl {
                url: raw.to_string(),
                message: e.to_string(),
            })?;
            let host = url
                .host_str()
                .ok_or_else(|| NavError::config(format!("{raw} has no host")))?;
            return Ok(Self {
                host: host.to_ascii_lowercase(),
                path_prefix: normalize_prefix(url.path()),
            });
        }

        let (host, path) = match raw.find('/') {
            Some(idx) => (&raw[..idx], &raw[idx..]),
            None => (raw, ""),
        };
        if host.is_empty() {
            return Err(NavError::config(format!("{raw} has no host part")));
        }
        Ok(Self {
            host: host.to_ascii_lowercase(),
            path_prefix: normalize_prefix(path),
        })
    }

    /// Expectation derived from a link's resolved href: its host only
    pub fn from_href(resolved: &Url) -> NavResult<Self> {
        let host = resolved
            .host_str()
            .ok_or_else(|| NavError::config(format!("link target {resolved} has no host")))?;
        Ok(Self {
            host: host.to_ascii_lowercase(),
            path_prefix: None,
        })
    }

    /// Expected host, lower-cased
    #[must_use]
    pub fn host(&self) -> &str {
        &self.host
    }

    /// Optional path prefix, lower-cased, without trailing slash
    #[must_use]
    pub fn path_prefix(&self) -> Option<&str> {
        self.path_prefix.as_deref()
    }

    /// Whether `url` lands on this host (and path prefix, if any)
    #[must_use]
    pub fn matches(&self, url: &str) -> bool {
        let Ok(parsed) = Url::parse(url) else {
            return false;
        };
        let Some(host) = parsed.host_str() else {
            return false;
        };
        if !host.to_ascii_lowercase().contains(&self.host) {
            return false;
        }
        match &self.path_prefix {
            // the prefix must end on a segment boundary
            Some(prefix) => parsed
                .path()
                .to_ascii_lowercase()
                .strip_prefix(prefix.as_str())
                .is_some_and(|rest| rest.is_empty() || rest.starts_with('/')),
            None => true,
        }
    }
}

fn normalize_prefix(path: &str) -> Option<String> {
    let trimmed = path.trim_end_matches('/');
    if trimmed.is_empty() {
        None
    } else {
        Some(trimmed.to_ascii_lowercase())
    }
}

impl std::fmt::Display for ExpectedHost {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match &self.path_prefix {
            Some(prefix) => write!(f, "{}{}", self.host, prefix),
            None => f.write_str(&self.host),
        }
    }
}

impl std::str::FromStr for ExpectedHost {
    type Err = NavError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse(s)
    }
}

impl TryFrom<String> for ExpectedHost {
    type Error = NavError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        Self::parse(&value)
    }
}

impl From<ExpectedHost> for String {
    fn from(value: ExpectedHost) -> Self {
        value.to_string()
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::expect_used)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    mod resolve_tests {
        use super::*;

        #[test]
        fn test_relative_href_resolves_against_page() {
            let url = resolve_href("https://site.example/form", "/help").unwrap();
            assert_eq!(url.as_str(), "https://site.example/help");
        }

        #[test]
        fn test_sibling_relative_href() {
            let url = resolve_href(
                "https://cac-tat.s3.eu-central-1.amazonaws.com/index.html",
                "privacy.html",
            )
            .unwrap();
            assert_eq!(
                url.as_str(),
                "https://cac-tat.s3.eu-central-1.amazonaws.com/privacy.html"
            );
        }

        #[test]
        fn test_absolute_href_wins() {
            let url = resolve_href("https://site.example/form", "https://github.com/org/repo").unwrap();
            assert_eq!(url.host_str(), Some("github.com"));
        }

        #[test]
        fn test_invalid_base() {
            let err = resolve_href("not a url", "/help").unwrap_err();
            assert!(matches!(err, NavError::InvalidUrl { .. }));
        }

        #[test]
        fn test_host_of() {
            assert_eq!(host_of("https://WWW.SauceDemo.com/v1/"), Some("www.saucedemo.com".into()));
            assert_eq!(host_of("about:blank"), None);
            assert_eq!(host_of("garbage"), None);
        }

        #[test]
        fn test_same_document_ignores_fragment() {
            let form = "https://site.example/form";
            assert!(same_document(form, "https://site.example/form#"));
            assert!(same_document(form, "https://site.example/form#section"));
            assert!(!same_document(form, "https://site.example/help"));
            assert!(!same_document(form, "https://site.example/form?step=2"));
            assert!(same_document("about:blank", "about:blank"));
        }
    }

    mod expected_host_tests {
        use super::*;

        #[test]
        fn test_bare_host() {
            let expected = ExpectedHost::parse("GitHub.com").unwrap();
            assert_eq!(expected.host(), "github.com");
            assert!(expected.path_prefix().is_none());
            assert!(expected.matches("https://github.com/org/repo"));
            assert!(expected.matches("https://www.github.com/"));
        }

        #[test]
        fn test_mismatch() {
            let expected = ExpectedHost::parse("partner.example").unwrap();
            assert!(!expected.matches("https://evil.example/"));
        }

        #[test]
        fn test_host_with_path_prefix() {
            let expected = ExpectedHost::parse("linkedin.com/company/sauce-labs").unwrap();
            assert_eq!(expected.path_prefix(), Some("/company/sauce-labs"));
            assert!(expected.matches("https://www.linkedin.com/company/sauce-labs/"));
            assert!(!expected.matches("https://www.linkedin.com/feed/"));
        }

        #[test]
        fn test_path_prefix_stops_at_segment_boundary() {
            let expected = ExpectedHost::parse("linkedin.com/company/sauce").unwrap();
            assert!(expected.matches("https://www.linkedin.com/company/sauce"));
            assert!(expected.matches("https://www.linkedin.com/company/sauce/jobs"));
            assert!(!expected.matches("https://www.linkedin.com/company/sauce-labs-evil"));
            assert!(!expected.matches("https://www.linkedin.com/company/saucepan"));
        }

        #[test]
        fn test_full_url_expectation() {
            let expected = ExpectedHost::parse("https://github.com/").unwrap();
            assert_eq!(expected.host(), "github.com");
            assert!(expected.path_prefix().is_none());
            assert_eq!(expected.to_string(), "github.com");
        }

        #[test]
        fn test_unparseable_url_never_matches() {
            let expected = ExpectedHost::parse("site.example").unwrap();
            assert!(!expected.matches(""));
            assert!(!expected.matches("about:blank"));
        }

        #[test]
        fn test_empty_rejected() {
            assert!(ExpectedHost::parse("  ").is_err());
            assert!(ExpectedHost::parse("/only/path").is_err());
        }

        #[test]
        fn test_from_href() {
            let url = resolve_href("https://site.example/form", "/help").unwrap();
            let expected = ExpectedHost::from_href(&url).unwrap();
            assert_eq!(expected.host(), "site.example");
            assert!(expected.matches("https://site.example/help"));
        }

        #[test]
        fn test_serde_as_string() {
            let expected: ExpectedHost = serde_yaml_ng::from_str("\"facebook.com/saucelabs\"").unwrap();
            assert_eq!(expected.path_prefix(), Some("/saucelabs"));
            let json = serde_json::to_string(&expected).unwrap();
            assert_eq!(json, "\"facebook.com/saucelabs\"");
        }
    }

    proptest! {
        #[test]
        fn prop_subdomains_match(sub in "[a-z]{1,10}", host in "[a-z]{1,12}\\.(com|org|example)") {
            let expected = ExpectedHost::parse(&host).unwrap();
            let url = format!("https://{sub}.{host}/some/path");
            prop_assert!(expected.matches(&url));
        }

        #[test]
        fn prop_case_insensitive(host in "[a-zA-Z]{1,12}\\.com") {
            let expected = ExpectedHost::parse(&host.to_uppercase()).unwrap();
            let url = format!("https://{}/", host.to_lowercase());
            prop_assert!(expected.matches(&url));
        }
    }
}
