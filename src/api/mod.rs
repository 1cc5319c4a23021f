//! Typed connectors for third-party APIs
//!
//! Each connector wraps a broker of either flavor. Request shapes are built
//! once as [`Call`](crate::broker::Call)s and sent by whichever broker the
//! connector owns.
//!
//! | Connector | Base URL | Credential |
//! |-----------|----------|------------|
//! | [`DomainToolsConnector`] | `https://api.domaintools.com` | `DOMAINTOOLS_API_KEY` |
//! | [`IpqsConnector`] | `https://ipqualityscore.com/api/json` | `IPQS_API_KEY` |

mod domaintools;
mod ipqs;

pub use domaintools::{
    AsyncDomainToolsConnector, DomainToolsConnector, DOMAINTOOLS_API_KEY, DOMAINTOOLS_BASE_URL,
    IRIS_INVESTIGATE_PARAMS,
};
pub use ipqs::{AsyncIpqsConnector, IpqsConnector, IPQS_API_KEY, IPQS_BASE_URL};

use crate::config::BrokerOptions;
use crate::error::Result;
use crate::types::{Flavor, OptionStringExt};
use secrecy::SecretString;
use tracing::info;

/// Fill in the default base URL and resolve the connector's API key.
///
/// The key comes from the argument, then the process environment, then the
/// env file; the environment is only consulted when `load_env_vars` is set.
pub(crate) fn connector_options(
    mut options: BrokerOptions,
    default_base_url: &str,
    key_name: &str,
    api_key: Option<String>,
    flavor: Flavor,
) -> Result<(BrokerOptions, SecretString)> {
    if options.base_url.is_empty() {
        options.base_url = default_base_url.to_string();
    }
    options.validate(flavor)?;

    let env = options.load_environment()?;
    if let Some(key) = api_key.none_if_empty() {
        options.credentials.insert(key_name, key);
    }
    let key = options.credentials.require(key_name, &env)?;
    options.env = Some(env);

    Ok((options, key))
}

/// One record per connector operation. Parameter values stay out of logs.
pub(crate) fn log_operation(enabled: bool, operation: &str, query: Option<&str>, params: &[(&str, &str)]) {
    if !enabled {
        return;
    }
    match query {
        Some(query) => info!(operation, query, "{operation} called"),
        None => {
            let mut keys: Vec<&str> = params.iter().map(|(k, _)| *k).collect();
            keys.sort_unstable();
            info!(operation, params = ?keys, "{operation} called");
        }
    }
}

/// Owned query pairs from borrowed ones
pub(crate) fn owned_pairs(params: &[(&str, &str)]) -> Vec<(String, String)> {
    params
        .iter()
        .map(|(k, v)| ((*k).to_string(), (*v).to_string()))
        .collect()
}

#[cfg(test)]
mod tests;
