//! Fake upstream services for proxy tests.

use serde_json::json;
use wiremock::matchers::any;
use wiremock::{Mock, MockServer, Request, ResponseTemplate};

/// A recording upstream that answers every request with `200` and a JSON
/// echo of the method, path, query and body it saw.
pub struct MockUpstream {
    server: MockServer,
}

impl MockUpstream {
    /// Starts an echoing upstream on a random port.
    pub async fn start() -> Self {
        let server = MockServer::start().await;
        Mock::given(any())
            .respond_with(|request: &Request| {
                ResponseTemplate::new(200)
                    .insert_header("x-upstream", "mock")
                    .set_body_json(json!({
                        "method": request.method.as_str(),
                        "path": request.url.path(),
                        "query": request.url.query(),
                        "body": String::from_utf8_lossy(&request.body),
                    }))
            })
            .mount(&server)
            .await;
        Self { server }
    }

    /// Starts an upstream with no mocks mounted, for callers that register
    /// their own expectations.
    pub async fn bare() -> Self {
        Self {
            server: MockServer::start().await,
        }
    }

    /// Base URL of the upstream.
    #[must_use]
    pub fn uri(&self) -> String {
        self.server.uri()
    }

    /// Underlying server, for mounting custom mocks.
    #[must_use]
    pub const fn server(&self) -> &MockServer {
        &self.server
    }

    /// Requests received so far.
    ///
    /// # Panics
    ///
    /// Panics if request recording was disabled.
    pub async fn requests(&self) -> Vec<Request> {
        self.server
            .received_requests()
            .await
            .expect("request recording enabled")
    }

    /// Number of requests received so far.
    pub async fn received_count(&self) -> usize {
        self.requests().await.len()
    }
}

/// A base URL nothing listens on.
#[must_use]
pub fn unreachable_upstream() -> String {
    "http://127.0.0.1:1".to_string()
}
