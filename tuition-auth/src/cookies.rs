use dashmap::DashMap;
use reqwest::header::{HeaderMap, SET_COOKIE};
use serde::{Deserialize, Serialize};

/// Cookies handed out by the API. They are replayed on every request the
/// way a browser does with `credentials: include`.
#[derive(Clone, Debug, Default, Serialize, Deserialize)]
pub struct CookieJar {
    cookies: DashMap<String, String>,
}

impl CookieJar {
    pub fn get(&self, name: &str) -> Option<String> {
        self.cookies.get(name).map(|value| value.value().clone())
    }

    pub fn insert<K: Into<String>, V: Into<String>>(&self, name: K, value: V) {
        self.cookies.insert(name.into(), value.into());
    }

    pub fn is_empty(&self) -> bool {
        self.cookies.is_empty()
    }

    pub fn clear(&self) {
        self.cookies.clear();
    }

    /// Applies every `Set-Cookie` header of a response.
    pub fn absorb(&self, headers: &HeaderMap) {
        for value in headers.get_all(SET_COOKIE) {
            match value.to_str() {
                Ok(raw) => self.apply_set_cookie(raw),
                Err(_) => log::debug!("ignoring non-ascii Set-Cookie header"),
            }
        }
    }

    fn apply_set_cookie(&self, raw: &str) {
        let mut parts = raw.split(';').map(str::trim);
        let Some((name, value)) = parts.next().and_then(|pair| pair.split_once('=')) else {
            return;
        };
        let name = name.trim();
        if name.is_empty() {
            return;
        }
        let expired = parts.any(|attr| {
            let attr = attr.to_ascii_lowercase();
            attr == "max-age=0" || attr.starts_with("max-age=-")
        });

        if expired || value.is_empty() {
            self.cookies.remove(name);
        } else {
            self.cookies.insert(name.to_string(), value.to_string());
        }
    }

    /// Value for the `Cookie` request header, names sorted for stable output.
    pub fn header_value(&self) -> Option<String> {
        if self.cookies.is_empty() {
            return None;
        }
        let mut pairs = self
            .cookies
            .iter()
            .map(|entry| format!("{}={}", entry.key(), entry.value()))
            .collect::<Vec<_>>();
        pairs.sort();
        Some(pairs.join("; "))
    }
}
