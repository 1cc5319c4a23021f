//! Secret scrubbing for log records and persisted cassettes
//!
//! A [`Scrubber`] holds a case-insensitive set of field names. Any header,
//! query parameter, form field or JSON key with one of those names has its
//! value replaced by [`REDACTED`]. Passwords embedded in URLs are masked
//! regardless of the field list.

use crate::types::JsonValue;
use once_cell::sync::Lazy;
use std::collections::{BTreeMap, HashSet};
use url::form_urlencoded;
use url::Url;

/// Replacement for scrubbed values
pub const REDACTED: &str = "REDACTED";

/// Field names scrubbed by [`Scrubber::default`]
pub const DEFAULT_SENSITIVE_FIELDS: &[&str] = &[
    "authorization",
    "proxy-authorization",
    "cookie",
    "set-cookie",
    "x-api-key",
    "api_key",
    "apikey",
    "key",
    "token",
    "access_token",
    "refresh_token",
    "client_secret",
    "secret",
    "password",
];

static DEFAULT_SCRUBBER: Lazy<Scrubber> = Lazy::new(Scrubber::default);

/// Scrubber with [`DEFAULT_SENSITIVE_FIELDS`]
pub fn default_scrubber() -> &'static Scrubber {
    &DEFAULT_SCRUBBER
}

/// Scrub a URL with the default field list
pub fn scrub_url(url: &str) -> String {
    DEFAULT_SCRUBBER.scrub_url(url)
}

/// Mask passwords in every URL-looking string inside a JSON value
pub(crate) fn scrub_proxy_urls(value: &mut JsonValue) {
    match value {
        JsonValue::String(s) => {
            if let Ok(mut url) = Url::parse(s) {
                if mask_password(&mut url) {
                    *s = url.to_string();
                }
            }
        }
        JsonValue::Array(items) => items.iter_mut().for_each(scrub_proxy_urls),
        JsonValue::Object(map) => map.values_mut().for_each(scrub_proxy_urls),
        _ => {}
    }
}

fn mask_password(url: &mut Url) -> bool {
    if url.password().is_some() {
        return url.set_password(Some(REDACTED)).is_ok();
    }
    false
}

/// Replaces values of sensitive fields
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Scrubber {
    fields: HashSet<String>,
}

impl Default for Scrubber {
    fn default() -> Self {
        Self::new(DEFAULT_SENSITIVE_FIELDS)
    }
}

impl Scrubber {
    /// Scrubber for exactly these field names
    pub fn new<I, S>(fields: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        Self {
            fields: fields
                .into_iter()
                .map(|f| f.as_ref().to_ascii_lowercase())
                .collect(),
        }
    }

    /// Also scrub `name`
    #[must_use]
    pub fn field(mut self, name: impl AsRef<str>) -> Self {
        self.fields.insert(name.as_ref().to_ascii_lowercase());
        self
    }

    pub fn is_sensitive(&self, name: &str) -> bool {
        self.fields.contains(&name.to_ascii_lowercase())
    }

    /// Scrub query values and any embedded password.
    ///
    /// Input that does not parse as a URL loses its query string entirely.
    pub fn scrub_url(&self, raw: &str) -> String {
        let Ok(mut url) = Url::parse(raw) else {
            return raw.split('?').next().unwrap_or(raw).to_string();
        };

        mask_password(&mut url);

        if url.query().is_some_and(|q| !q.is_empty()) {
            let pairs: Vec<(String, String)> = url
                .query_pairs()
                .map(|(k, v)| {
                    let value = if self.is_sensitive(&k) {
                        REDACTED.to_string()
                    } else {
                        v.into_owned()
                    };
                    (k.into_owned(), value)
                })
                .collect();
            url.query_pairs_mut().clear().extend_pairs(pairs);
        }

        url.to_string()
    }

    /// Scrub header values in place
    pub fn scrub_headers(&self, headers: &mut BTreeMap<String, String>) {
        for (name, value) in headers.iter_mut() {
            if self.is_sensitive(name) {
                *value = REDACTED.to_string();
            }
        }
    }

    /// Scrub JSON object keys, recursively
    pub fn scrub_json(&self, value: &mut JsonValue) {
        match value {
            JsonValue::Object(map) => {
                for (key, inner) in map.iter_mut() {
                    if self.is_sensitive(key) {
                        *inner = JsonValue::String(REDACTED.to_string());
                    } else {
                        self.scrub_json(inner);
                    }
                }
            }
            JsonValue::Array(items) => {
                for item in items {
                    self.scrub_json(item);
                }
            }
            _ => {}
        }
    }

    /// Scrub an `application/x-www-form-urlencoded` body
    pub fn scrub_form(&self, body: &str) -> String {
        let pairs = form_urlencoded::parse(body.as_bytes()).map(|(k, v)| {
            let value = if self.is_sensitive(&k) {
                REDACTED.to_string()
            } else {
                v.into_owned()
            };
            (k.into_owned(), value)
        });
        form_urlencoded::Serializer::new(String::new())
            .extend_pairs(pairs)
            .finish()
    }

    /// Scrub a body of unknown type: JSON documents and form bodies are
    /// scrubbed, anything else is returned unchanged
    pub fn scrub_body(&self, body: &str) -> String {
        if let Ok(mut value) = serde_json::from_str::<JsonValue>(body) {
            if value.is_object() || value.is_array() {
                self.scrub_json(&mut value);
                return value.to_string();
            }
        }
        if body.contains('=') && !body.contains(char::is_whitespace) {
            return self.scrub_form(body);
        }
        body.to_string()
    }
}
