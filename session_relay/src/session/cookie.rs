use std::fmt;

use headers::HeaderMapExt;
use http::header::HeaderMap;

/// Snapshot of the cookies a request arrived with
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RequestCookies {
    entries: Vec<(String, String)>,
}

impl RequestCookies {
    pub fn from_headers(headers: &HeaderMap) -> Self {
        let Some(cookie) = headers.typed_get::<headers::Cookie>() else {
            tracing::debug!("No cookie header found");
            return Self::default();
        };

        Self {
            entries: cookie
                .iter()
                .map(|(name, value)| (name.to_string(), value.to_string()))
                .collect(),
        }
    }

    pub fn get(&self, name: &str) -> Option<&str> {
        self.entries
            .iter()
            .find(|(n, _)| n == name)
            .map(|(_, v)| v.as_str())
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &str)> {
        self.entries.iter().map(|(n, v)| (n.as_str(), v.as_str()))
    }

    /// Overlay a cookie write so later reads in the same request observe it
    pub fn apply(&mut self, cookie: &CookieToSet) {
        self.entries.retain(|(n, _)| n != &cookie.name);
        if !cookie.is_removal() {
            self.entries.push((cookie.name.clone(), cookie.value.clone()));
        }
    }
}

impl<N: Into<String>, V: Into<String>> FromIterator<(N, V)> for RequestCookies {
    fn from_iter<T: IntoIterator<Item = (N, V)>>(iter: T) -> Self {
        Self {
            entries: iter
                .into_iter()
                .map(|(n, v)| (n.into(), v.into()))
                .collect(),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SameSite {
    Strict,
    Lax,
    None,
}

impl fmt::Display for SameSite {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            SameSite::Strict => "Strict",
            SameSite::Lax => "Lax",
            SameSite::None => "None",
        })
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CookieOptions {
    pub path: String,
    pub max_age: Option<i64>,
    pub http_only: bool,
    pub secure: bool,
    pub same_site: SameSite,
}

impl Default for CookieOptions {
    fn default() -> Self {
        Self {
            path: "/".to_string(),
            max_age: None,
            http_only: true,
            secure: true,
            same_site: SameSite::Lax,
        }
    }
}

/// A cookie write requested by the provider during a request
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CookieToSet {
    pub name: String,
    pub value: String,
    pub options: CookieOptions,
}

impl CookieToSet {
    pub fn new(name: impl Into<String>, value: impl Into<String>, options: CookieOptions) -> Self {
        Self {
            name: name.into(),
            value: value.into(),
            options,
        }
    }

    /// A write that makes the browser drop `name`
    pub fn removal(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            value: String::new(),
            options: CookieOptions {
                max_age: Some(0),
                ..CookieOptions::default()
            },
        }
    }

    pub fn is_removal(&self) -> bool {
        self.options.max_age.is_some_and(|age| age <= 0)
    }

    /// Serialize as a `Set-Cookie` header value
    pub fn to_header_value(&self) -> String {
        let mut cookie = format!(
            "{}={}; SameSite={}",
            self.name, self.value, self.options.same_site
        );
        if self.options.secure {
            cookie.push_str("; Secure");
        }
        if self.options.http_only {
            cookie.push_str("; HttpOnly");
        }
        cookie.push_str(&format!("; Path={}", self.options.path));
        if let Some(max_age) = self.options.max_age {
            cookie.push_str(&format!("; Max-Age={max_age}"));
        }
        cookie
    }
}
