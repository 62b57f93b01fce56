//! Cookie codec for the two session slots.
//!
//! Every slot cookie is `HttpOnly`, `SameSite=Lax`, scoped to `/`, and
//! `Secure` in production. Clearing a slot sends the same attributes with
//! `Max-Age=0`.

use axum::http::{
    HeaderMap, HeaderValue,
    header::{COOKIE, InvalidHeaderValue},
};
use std::time::Duration;

use super::Slot;
use crate::config::AuthConfig;

/// Attributes applied to every slot cookie.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct CookiePolicy {
    secure: bool,
    access_max_age: Duration,
    renewal_max_age: Duration,
}

impl CookiePolicy {
    #[must_use]
    pub fn from_config(config: &AuthConfig) -> Self {
        Self {
            secure: config.cookies_secure(),
            access_max_age: config.access_window(),
            renewal_max_age: config.renewal_window(),
        }
    }

    #[must_use]
    pub const fn secure(&self) -> bool {
        self.secure
    }

    #[must_use]
    pub const fn max_age(&self, slot: Slot) -> Duration {
        match slot {
            Slot::Access => self.access_max_age,
            Slot::Renewal => self.renewal_max_age,
        }
    }
}

/// Build the `Set-Cookie` value that writes a slot.
pub(crate) fn set_cookie(
    slot: Slot,
    value: &str,
    max_age: Duration,
    secure: bool,
) -> Result<HeaderValue, InvalidHeaderValue> {
    let name = slot.cookie_name();
    let max_age = max_age.as_secs();
    let mut cookie = format!("{name}={value}; Path=/; HttpOnly; SameSite=Lax; Max-Age={max_age}");
    if secure {
        cookie.push_str("; Secure");
    }
    HeaderValue::from_str(&cookie)
}

/// Build the `Set-Cookie` value that erases a slot.
pub(crate) fn clear_cookie(slot: Slot, secure: bool) -> Result<HeaderValue, InvalidHeaderValue> {
    let name = slot.cookie_name();
    let mut cookie = format!("{name}=; Path=/; HttpOnly; SameSite=Lax; Max-Age=0");
    if secure {
        cookie.push_str("; Secure");
    }
    HeaderValue::from_str(&cookie)
}

/// Read a cookie by name from every `Cookie` header on the request.
/// Empty values read as absent.
pub(crate) fn read_cookie(headers: &HeaderMap, name: &str) -> Option<String> {
    for header in headers.get_all(COOKIE) {
        let Ok(value) = header.to_str() else {
            continue;
        };
        for pair in value.split(';') {
            let mut parts = pair.trim().splitn(2, '=');
            let (Some(key), Some(val)) = (parts.next(), parts.next()) else {
                continue;
            };
            let val = val.trim();
            if key.trim() == name && !val.is_empty() {
                return Some(val.to_string());
            }
        }
    }
    None
}

/// Whether a secret can travel as a bare cookie value.
pub(crate) fn is_cookie_safe(value: &str) -> bool {
    !value.is_empty()
        && value
            .bytes()
            .all(|b| b.is_ascii_graphic() && !matches!(b, b';' | b',' | b'"' | b'\\'))
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn set_cookie_carries_all_attributes() {
        let cookie = set_cookie(Slot::Access, "abc.def", Duration::from_secs(1800), true).unwrap();
        assert_eq!(
            cookie.to_str().unwrap(),
            "access=abc.def; Path=/; HttpOnly; SameSite=Lax; Max-Age=1800; Secure"
        );
    }

    #[test]
    fn set_cookie_insecure_outside_production() {
        let cookie =
            set_cookie(Slot::Renewal, "r1", Duration::from_secs(604_800), false).unwrap();
        assert_eq!(
            cookie.to_str().unwrap(),
            "renewal=r1; Path=/; HttpOnly; SameSite=Lax; Max-Age=604800"
        );
    }

    #[test]
    fn clear_cookie_expires_immediately() {
        let cookie = clear_cookie(Slot::Renewal, false).unwrap();
        assert_eq!(
            cookie.to_str().unwrap(),
            "renewal=; Path=/; HttpOnly; SameSite=Lax; Max-Age=0"
        );
    }

    #[test]
    fn read_cookie_finds_named_value() {
        let mut headers = HeaderMap::new();
        headers.insert(
            COOKIE,
            HeaderValue::from_static("theme=dark; access=a1; renewal=r1"),
        );
        assert_eq!(read_cookie(&headers, "access"), Some("a1".to_string()));
        assert_eq!(read_cookie(&headers, "renewal"), Some("r1".to_string()));
        assert_eq!(read_cookie(&headers, "missing"), None);
    }

    #[test]
    fn read_cookie_scans_multiple_headers_and_skips_empty() {
        let mut headers = HeaderMap::new();
        headers.append(COOKIE, HeaderValue::from_static("access="));
        headers.append(COOKIE, HeaderValue::from_static("renewal=r2"));
        assert_eq!(read_cookie(&headers, "access"), None);
        assert_eq!(read_cookie(&headers, "renewal"), Some("r2".to_string()));
    }

    #[test]
    fn cookie_safe_values() {
        assert!(is_cookie_safe("eyJhbGciOiJIUzI1NiJ9.eyJpZCI6MX0.sig-_"));
        assert!(!is_cookie_safe(""));
        assert!(!is_cookie_safe("a;b"));
        assert!(!is_cookie_safe("a b"));
    }
}
