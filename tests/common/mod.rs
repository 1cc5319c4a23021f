//! Shared helpers for integration tests

#![allow(dead_code)]

use apiary::cassette::Cassette;
use apiary::redact::REDACTED;
use wiremock::matchers::{method, path, query_param};
use wiremock::{Mock, MockServer, ResponseTemplate};

/// Serve every interaction of `cassette` from `server`.
///
/// Requests match on method, path and the non-scrubbed query pairs; each
/// interaction is expected exactly once.
pub async fn mount_cassette(server: &MockServer, cassette: &Cassette) {
    for interaction in &cassette.interactions {
        let request = &interaction.request;
        let mut mock = Mock::given(method(request.method.as_str())).and(path(request.path()));
        for (key, value) in request.query_pairs() {
            if value != REDACTED {
                mock = mock.and(query_param(key, value));
            }
        }

        let mut template =
            ResponseTemplate::new(interaction.response.status).set_body_string(&interaction.response.body);
        if let Some(content_type) = interaction.response.headers.get("content-type") {
            template = template.insert_header("content-type", content_type.as_str());
        }

        mock.respond_with(template).expect(1).mount(server).await;
    }
}

/// Start a server replaying `cassette`
pub async fn replay(cassette: &Cassette) -> MockServer {
    let server = MockServer::start().await;
    mount_cassette(&server, cassette).await;
    server
}
