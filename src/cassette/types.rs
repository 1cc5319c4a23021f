//! Cassette data model

use crate::error::{Error, Result};
use crate::redact::Scrubber;
use chrono::{DateTime, Utc};
use reqwest::header::HeaderMap;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::path::Path;

/// Request half of a recorded exchange
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RecordedRequest {
    pub method: String,
    pub uri: String,
    #[serde(default)]
    pub headers: BTreeMap<String, String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub body: Option<String>,
}

impl RecordedRequest {
    pub(crate) fn capture(
        method: &reqwest::Method,
        url: &url::Url,
        headers: &HeaderMap,
        body: Option<&[u8]>,
    ) -> Self {
        Self {
            method: method.as_str().to_string(),
            uri: url.to_string(),
            headers: header_map(headers),
            body: body.map(|b| String::from_utf8_lossy(b).into_owned()),
        }
    }

    /// Path of the recorded URI
    pub fn path(&self) -> String {
        match url::Url::parse(&self.uri) {
            Ok(url) => url.path().to_string(),
            Err(_) => self.uri.split('?').next().unwrap_or_default().to_string(),
        }
    }

    /// Query pairs of the recorded URI
    pub fn query_pairs(&self) -> Vec<(String, String)> {
        url::Url::parse(&self.uri)
            .map(|url| url.query_pairs().into_owned().collect())
            .unwrap_or_default()
    }
}

/// Response half of a recorded exchange
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RecordedResponse {
    pub status: u16,
    #[serde(default)]
    pub headers: BTreeMap<String, String>,
    #[serde(default)]
    pub body: String,
}

impl RecordedResponse {
    pub(crate) fn capture(status: u16, headers: &HeaderMap, body: &[u8]) -> Self {
        Self {
            status,
            headers: header_map(headers),
            body: String::from_utf8_lossy(body).into_owned(),
        }
    }
}

/// One request/response pair
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Interaction {
    pub request: RecordedRequest,
    pub response: RecordedResponse,
    pub recorded_at: DateTime<Utc>,
}

/// A named, ordered list of recorded exchanges
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Cassette {
    pub name: String,
    /// Library name and version that produced the recording
    #[serde(default)]
    pub recorded_with: String,
    #[serde(default)]
    pub interactions: Vec<Interaction>,
}

impl Cassette {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            recorded_with: format!("{}/{}", crate::NAME, crate::VERSION),
            interactions: Vec::new(),
        }
    }

    /// Append an exchange, stamped with the current time
    pub fn push(&mut self, request: RecordedRequest, response: RecordedResponse) {
        self.interactions.push(Interaction {
            request,
            response,
            recorded_at: Utc::now(),
        });
    }

    pub fn len(&self) -> usize {
        self.interactions.len()
    }

    pub fn is_empty(&self) -> bool {
        self.interactions.is_empty()
    }

    /// A copy with secrets removed from URIs, headers and bodies
    pub fn scrubbed(&self, scrubber: &Scrubber) -> Self {
        let interactions = self
            .interactions
            .iter()
            .map(|interaction| {
                let mut interaction = interaction.clone();
                let request = &mut interaction.request;
                request.uri = scrubber.scrub_url(&request.uri);
                scrubber.scrub_headers(&mut request.headers);
                request.body = request.body.as_deref().map(|b| scrubber.scrub_body(b));

                let response = &mut interaction.response;
                scrubber.scrub_headers(&mut response.headers);
                response.body = scrubber.scrub_body(&response.body);
                interaction
            })
            .collect();

        Self {
            name: self.name.clone(),
            recorded_with: self.recorded_with.clone(),
            interactions,
        }
    }

    /// Serialize to YAML
    pub fn to_yaml(&self) -> Result<String> {
        Ok(serde_yaml::to_string(self)?)
    }

    /// Parse from YAML
    pub fn from_yaml(content: &str) -> Result<Self> {
        Ok(serde_yaml::from_str(content)?)
    }

    /// Scrub and write to `path`. Unscrubbed data never reaches disk.
    pub fn save(&self, path: impl AsRef<Path>, scrubber: &Scrubber) -> Result<()> {
        let path = path.as_ref();
        let yaml = self.scrubbed(scrubber).to_yaml()?;
        if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
            std::fs::create_dir_all(parent)?;
        }
        std::fs::write(path, yaml)?;
        tracing::debug!(
            path = %path.display(),
            interactions = self.len(),
            "Saved cassette"
        );
        Ok(())
    }

    /// Read a cassette from `path`
    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let content = std::fs::read_to_string(path).map_err(|e| {
            Error::Other(format!("Failed to read cassette '{}': {e}", path.display()))
        })?;
        Self::from_yaml(&content)
    }
}

fn header_map(headers: &HeaderMap) -> BTreeMap<String, String> {
    headers
        .iter()
        .filter_map(|(name, value)| {
            value
                .to_str()
                .ok()
                .map(|v| (name.as_str().to_string(), v.to_string()))
        })
        .collect()
}
