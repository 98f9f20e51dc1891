use std::time::Duration;

use serde::Deserialize;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum HttpClientError {
    #[error("failed to build http client: {0}")]
    Build(#[from] reqwest::Error),
}

pub fn build_client(timeout_secs: u64) -> Result<reqwest::Client, HttpClientError> {
    let client = reqwest::Client::builder()
        .timeout(Duration::from_secs(timeout_secs))
        .user_agent(concat!("cartsim/", env!("CARGO_PKG_VERSION")))
        .build()?;
    Ok(client)
}

/// `{"error": "..."}` bodies returned by the quote backend and the couriers.
#[derive(Debug, Default, Deserialize)]
pub(crate) struct ErrorBody {
    #[serde(default)]
    pub error: Option<serde_json::Value>,
}

impl ErrorBody {
    /// Parses a body leniently; anything that is not an error object yields `None`.
    pub(crate) fn message(raw: &str) -> Option<String> {
        let body: ErrorBody = serde_json::from_str(raw).ok()?;
        match body.error? {
            serde_json::Value::String(message) => Some(message),
            serde_json::Value::Null => None,
            other => Some(other.to_string()),
        }
    }
}

pub(crate) fn join_url(base: &str, path: &str) -> String {
    format!("{}/{}", base.trim_end_matches('/'), path.trim_start_matches('/'))
}

#[cfg(test)]
pub(crate) mod test_support {
    use axum::Router;

    pub(crate) async fn serve(router: Router) -> String {
        let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.expect("bind listener");
        let address = listener.local_addr().expect("local address");
        tokio::spawn(async move {
            axum::serve(listener, router).await.expect("fake server");
        });
        format!("http://{address}")
    }

    /// An address nothing listens on.
    pub(crate) async fn closed_port() -> String {
        let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.expect("bind listener");
        let address = listener.local_addr().expect("local address");
        drop(listener);
        format!("http://{address}")
    }
}
