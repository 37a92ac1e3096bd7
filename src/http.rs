use std::time::Duration;

use reqwest::blocking::Client;
use reqwest::header::{ACCEPT, AUTHORIZATION, HeaderMap, HeaderValue, USER_AGENT};
use serde_json::Value;
use tracing::debug;

use crate::error::ImportError;

/// Credentials acquired once per run and attached to every request.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Session {
    pub access_token: Option<String>,
    pub api_token: Option<String>,
}

impl Session {
    /// The legacy api token is sent raw and wins over the bearer token.
    pub fn authorization(&self) -> Option<String> {
        if let Some(token) = self.api_token.as_deref().filter(|t| !t.is_empty()) {
            return Some(token.to_string());
        }
        self.access_token
            .as_deref()
            .filter(|t| !t.is_empty())
            .map(|token| format!("Bearer {token}"))
    }
}

pub trait Transport: Send + Sync {
    fn get_json(&self, url: &str, authorization: Option<&str>) -> Result<Value, ImportError>;
    fn post_form(&self, url: &str, form: &[(&str, &str)]) -> Result<Value, ImportError>;
}

#[derive(Clone)]
pub struct HttpTransport {
    client: Client,
}

impl HttpTransport {
    pub fn new(timeout: Option<Duration>) -> Result<Self, ImportError> {
        let mut headers = HeaderMap::new();
        headers.insert(
            USER_AGENT,
            HeaderValue::from_str(&format!("inat-import/{}", env!("CARGO_PKG_VERSION")))
                .map_err(|err| ImportError::Transport(err.to_string()))?,
        );
        headers.insert(ACCEPT, HeaderValue::from_static("application/json"));

        let mut builder = Client::builder().default_headers(headers);
        if let Some(timeout) = timeout {
            builder = builder.timeout(timeout);
        }
        let client = builder
            .build()
            .map_err(|err| ImportError::Transport(err.to_string()))?;
        Ok(Self { client })
    }

    fn handle_status(
        response: reqwest::blocking::Response,
    ) -> Result<reqwest::blocking::Response, ImportError> {
        if response.status().is_success() {
            return Ok(response);
        }
        let status = response.status().as_u16();
        let message = response
            .text()
            .unwrap_or_else(|_| "iNaturalist request failed".to_string());
        Err(ImportError::Status { status, message })
    }

    fn decode(response: reqwest::blocking::Response) -> Result<Value, ImportError> {
        let body = response
            .text()
            .map_err(|err| ImportError::Transport(err.to_string()))?;
        serde_json::from_str(&body).map_err(|err| ImportError::Decode(err.to_string()))
    }
}

impl Transport for HttpTransport {
    fn get_json(&self, url: &str, authorization: Option<&str>) -> Result<Value, ImportError> {
        debug!(url, "GET");
        let mut request = self.client.get(url);
        if let Some(value) = authorization {
            request = request.header(AUTHORIZATION, value);
        }
        let response = request
            .send()
            .map_err(|err| ImportError::Transport(err.to_string()))?;
        Self::decode(Self::handle_status(response)?)
    }

    fn post_form(&self, url: &str, form: &[(&str, &str)]) -> Result<Value, ImportError> {
        debug!(url, "POST");
        let response = self
            .client
            .post(url)
            .form(form)
            .send()
            .map_err(|err| ImportError::Transport(err.to_string()))?;
        Self::decode(Self::handle_status(response)?)
    }
}
