use crate::domain_model::Expires;
use chrono::{DateTime, Utc};

pub const DEFAULT_COOKIE_NAME: &str = "session_id";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SameSite {
    Strict,
    Lax,
    None,
}

impl SameSite {
    fn as_str(self) -> &'static str {
        match self {
            SameSite::Strict => "Strict",
            SameSite::Lax => "Lax",
            SameSite::None => "None",
        }
    }
}

/// Client-visible token configuration.
///
/// `expires` overrides the cookie expiry; without it the cookie follows the
/// created session's own expiry instant.
#[derive(Debug, Clone)]
pub struct CookieOptions {
    pub name: String,
    pub expires: Option<Expires>,
    pub secure: bool,
    pub http_only: bool,
    pub path: String,
    pub same_site: Option<SameSite>,
}

impl Default for CookieOptions {
    fn default() -> Self {
        CookieOptions {
            name: DEFAULT_COOKIE_NAME.to_string(),
            expires: None,
            secure: true,
            http_only: true,
            path: "/".to_string(),
            same_site: None,
        }
    }
}

impl CookieOptions {
    pub fn named(name: impl Into<String>) -> Self {
        CookieOptions {
            name: name.into(),
            ..Default::default()
        }
    }

    pub fn with_expires(mut self, expires: Expires) -> Self {
        self.expires = Some(expires);
        self
    }

    pub fn with_path(mut self, path: impl Into<String>) -> Self {
        self.path = path.into();
        self
    }

    pub fn with_same_site(mut self, same_site: SameSite) -> Self {
        self.same_site = Some(same_site);
        self
    }

    pub fn with_secure(mut self, secure: bool) -> Self {
        self.secure = secure;
        self
    }

    pub fn with_http_only(mut self, http_only: bool) -> Self {
        self.http_only = http_only;
        self
    }
}

fn http_date(instant: DateTime<Utc>) -> String {
    instant.format("%a, %d %b %Y %H:%M:%S GMT").to_string()
}

/// Serialize a `Set-Cookie` value carrying the session token.
pub fn build_set_cookie(options: &CookieOptions, value: &str, expires_at: DateTime<Utc>) -> String {
    let mut cookie = format!(
        "{}={}; Expires={}; Path={}",
        options.name,
        value,
        http_date(expires_at),
        options.path
    );
    if options.secure {
        cookie.push_str("; Secure");
    }
    if options.http_only {
        cookie.push_str("; HttpOnly");
    }
    if let Some(same_site) = options.same_site {
        cookie.push_str("; SameSite=");
        cookie.push_str(same_site.as_str());
    }
    cookie
}

/// Serialize a `Set-Cookie` value that clears the token: empty value, expiry
/// at the Unix epoch.
pub fn build_clear_cookie(options: &CookieOptions) -> String {
    build_set_cookie(options, "", DateTime::<Utc>::UNIX_EPOCH)
}

/// Extract one cookie's value from a `Cookie:` request header.
pub fn parse_cookie_header(header: &str, name: &str) -> Option<String> {
    header.split(';').find_map(|pair| {
        let (key, value) = pair.trim().split_once('=')?;
        if key == name {
            Some(value.to_string())
        } else {
            None
        }
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn set_cookie_carries_expiry_and_attributes() {
        let options = CookieOptions::default().with_same_site(SameSite::Lax);
        let expires_at = DateTime::parse_from_rfc3339("2030-01-02T03:04:05Z")
            .unwrap()
            .with_timezone(&Utc);

        let cookie = build_set_cookie(&options, "abc123", expires_at);
        assert_eq!(
            cookie,
            "session_id=abc123; Expires=Wed, 02 Jan 2030 03:04:05 GMT; Path=/; Secure; HttpOnly; SameSite=Lax"
        );
    }

    #[test]
    fn clear_cookie_expires_at_epoch() {
        let cookie = build_clear_cookie(&CookieOptions::default());
        assert!(cookie.starts_with("session_id=; "));
        assert!(cookie.contains("Expires=Thu, 01 Jan 1970 00:00:00 GMT"));
    }

    #[test]
    fn parses_one_cookie_out_of_many() {
        let header = "theme=dark; session_id=abc123; lang=en";
        assert_eq!(
            parse_cookie_header(header, "session_id"),
            Some("abc123".to_string())
        );
        assert_eq!(parse_cookie_header(header, "missing"), None);
    }
}
