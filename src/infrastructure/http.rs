//! HTTP endpoint prober backed by reqwest.

use std::time::Duration;

use anyhow::{Context, Result};
use async_trait::async_trait;
use reqwest::{Client as ReqwestClient, Method};

use crate::domain::models::Endpoint;
use crate::domain::ports::EndpointProber;

/// Sends the declared request and treats any 2xx answer as healthy.
#[derive(Debug, Clone)]
pub struct HttpEndpointProber {
    http_client: ReqwestClient,
}

impl HttpEndpointProber {
    pub fn new(timeout: Duration) -> Result<Self> {
        let http_client = ReqwestClient::builder()
            .timeout(timeout)
            .tcp_nodelay(true)
            .build()
            .context("Failed to build HTTP client")?;
        Ok(Self { http_client })
    }
}

#[async_trait]
impl EndpointProber for HttpEndpointProber {
    async fn probe(&self, endpoint: &Endpoint) -> bool {
        let method = match Method::from_bytes(endpoint.method.to_uppercase().as_bytes()) {
            Ok(method) => method,
            Err(e) => {
                tracing::warn!(endpoint = %endpoint, error = %e, "Invalid HTTP method");
                return false;
            }
        };

        match self.http_client.request(method, &endpoint.url).send().await {
            Ok(response) => {
                let status = response.status();
                tracing::debug!(endpoint = %endpoint, status = status.as_u16(), "Endpoint probed");
                status.is_success()
            }
            Err(e) => {
                tracing::debug!(endpoint = %endpoint, error = %e, "Endpoint unreachable");
                false
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use mockito::Server;

    fn prober() -> HttpEndpointProber {
        HttpEndpointProber::new(Duration::from_secs(2)).expect("client builds")
    }

    #[tokio::test]
    async fn test_success_status_is_working() {
        let mut server = Server::new_async().await;
        let mock = server
            .mock("GET", "/health")
            .with_status(200)
            .create_async()
            .await;

        let endpoint = Endpoint::get(format!("{}/health", server.url()));
        assert!(prober().probe(&endpoint).await);
        mock.assert_async().await;
    }

    #[tokio::test]
    async fn test_error_status_is_not_working() {
        let mut server = Server::new_async().await;
        let _mock = server
            .mock("POST", "/login")
            .with_status(500)
            .create_async()
            .await;

        let endpoint = Endpoint {
            url: format!("{}/login", server.url()),
            method: "post".to_string(),
        };
        assert!(!prober().probe(&endpoint).await);
    }

    #[tokio::test]
    async fn test_unreachable_is_not_working() {
        let endpoint = Endpoint::get("http://127.0.0.1:1/nothing");
        assert!(!prober().probe(&endpoint).await);
    }
}
