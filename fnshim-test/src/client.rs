//! Client for invoking hosted functions

use reqwest::{Client, Method};

use crate::server::TestError;

/// Status and body of a function invocation over HTTP
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FunctionReply {
    pub status: u16,
    pub body: String,
}

/// Client for a running function host
pub struct FunctionClient {
    base_url: String,
    client: Client,
}

impl FunctionClient {
    /// Create a new client
    pub fn new(base_url: String) -> Self {
        let client = Client::builder()
            .timeout(std::time::Duration::from_secs(30))
            .build()
            .expect("Failed to create HTTP client");

        Self { base_url, client }
    }

    /// Get the base URL
    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    /// GET /.netlify/functions/{name}
    pub async fn invoke(&self, name: &str) -> Result<FunctionReply, TestError> {
        self.request(Method::GET, &format!("/.netlify/functions/{name}"), None)
            .await
    }

    /// Send `method` to `path` with an optional body
    pub async fn request(
        &self,
        method: Method,
        path: &str,
        body: Option<String>,
    ) -> Result<FunctionReply, TestError> {
        let url = format!("{}{}", self.base_url, path);
        let mut request = self.client.request(method, &url);
        if let Some(body) = body {
            request = request.body(body);
        }

        let response = request.send().await?;
        let status = response.status().as_u16();
        let body = response.text().await?;
        Ok(FunctionReply { status, body })
    }
}

impl From<reqwest::Error> for TestError {
    fn from(e: reqwest::Error) -> Self {
        TestError::ClientError(e.to_string())
    }
}
