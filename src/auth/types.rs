//! Auth configuration types

use crate::broker::RequestBuilderExt;
use secrecy::{ExposeSecret, SecretString};
use serde::{Deserialize, Serialize};

/// Location for API key placement
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Location {
    /// Place in HTTP header
    #[default]
    Header,
    /// Place in query parameter
    Query,
}

/// Authentication applied to outgoing requests
#[derive(Debug, Clone)]
pub enum Auth {
    /// API key in a header or query parameter
    ApiKey {
        /// Where to place the API key
        location: Location,
        /// Header or query parameter name
        name: String,
        /// Prefix to add before the value (e.g., "Token ")
        prefix: Option<String>,
        /// The API key value
        value: SecretString,
    },

    /// HTTP Basic authentication
    Basic {
        username: String,
        password: SecretString,
    },

    /// Bearer token authentication
    Bearer { token: SecretString },
}

impl Auth {
    /// API key sent in a header
    pub fn api_key_header(name: impl Into<String>, value: impl Into<String>) -> Self {
        Self::ApiKey {
            location: Location::Header,
            name: name.into(),
            prefix: None,
            value: SecretString::from(value.into()),
        }
    }

    /// API key sent as a query parameter
    pub fn api_key_query(name: impl Into<String>, value: impl Into<String>) -> Self {
        Self::ApiKey {
            location: Location::Query,
            name: name.into(),
            prefix: None,
            value: SecretString::from(value.into()),
        }
    }

    /// HTTP Basic credentials
    pub fn basic(username: impl Into<String>, password: impl Into<String>) -> Self {
        Self::Basic {
            username: username.into(),
            password: SecretString::from(password.into()),
        }
    }

    /// Bearer token
    pub fn bearer(token: impl Into<String>) -> Self {
        Self::Bearer {
            token: SecretString::from(token.into()),
        }
    }

    /// Name of the header this auth sets, if it sets one
    pub fn header_name(&self) -> Option<&str> {
        match self {
            Auth::ApiKey {
                location: Location::Header,
                name,
                ..
            } => Some(name),
            Auth::ApiKey { .. } => None,
            Auth::Basic { .. } | Auth::Bearer { .. } => Some("Authorization"),
        }
    }

    /// Apply authentication to a request builder
    pub(crate) fn apply<B: RequestBuilderExt>(&self, req: B) -> B {
        match self {
            Auth::ApiKey {
                location,
                name,
                prefix,
                value,
            } => {
                let val = format!(
                    "{}{}",
                    prefix.as_deref().unwrap_or(""),
                    value.expose_secret()
                );
                match location {
                    Location::Header => req.with_header(name, &val),
                    Location::Query => req.with_query(&[(name.clone(), val)]),
                }
            }

            Auth::Basic { username, password } => {
                req.with_basic_auth(username, password.expose_secret())
            }

            Auth::Bearer { token } => req.with_bearer(token.expose_secret()),
        }
    }
}
