//! HTTP collaborator for the vAPI endpoints.
//!
//! A [`Resource`] is built from a base path, optionally extended with one
//! sub-path segment and query parameters, then turned into a [`Request`] and
//! executed by the [`Client`]. Each call is exactly one HTTP exchange.

use std::time::Duration;

use reqwest::header::{HeaderMap, HeaderValue, ACCEPT, CONTENT_TYPE};
use reqwest::{Method, Url};
use serde::{de::DeserializeOwned, Deserialize, Serialize};
use tracing::{debug, warn};

use crate::error::Error;

/// Header carrying an existing vAPI session token.
pub const SESSION_HEADER: &str = "vmware-api-session-id";

/// Query parameter that turns a call into an asynchronous task.
pub const TASK_PARAM: &str = "vmw-task";

const DEFAULT_TIMEOUT: Duration = Duration::from_secs(60);

/// Connection settings for [`Client`].
#[derive(Debug, Clone)]
pub struct ClientConfig {
    /// Scheme and host of the vCenter endpoint, e.g. `https://vc.example.com`.
    pub base_url: String,

    /// Session token obtained out of band.
    pub session_id: Option<String>,

    /// Skip TLS certificate verification.
    pub insecure: bool,

    /// Per-request timeout.
    pub timeout: Duration,
}

impl ClientConfig {
    pub fn new(base_url: impl Into<String>) -> Self {
        Self {
            base_url: base_url.into(),
            session_id: None,
            insecure: false,
            timeout: DEFAULT_TIMEOUT,
        }
    }
}

/// REST client shared by all resource managers.
#[derive(Debug, Clone)]
pub struct Client {
    http: reqwest::Client,
    base_url: String,
}

impl Client {
    /// Create a new client from connection settings.
    pub fn new(config: &ClientConfig) -> Result<Self, Error> {
        let mut headers = HeaderMap::new();
        headers.insert(CONTENT_TYPE, HeaderValue::from_static("application/json"));
        headers.insert(ACCEPT, HeaderValue::from_static("application/json"));

        if let Some(session_id) = &config.session_id {
            let mut value = HeaderValue::from_str(session_id)?;
            value.set_sensitive(true);
            headers.insert(SESSION_HEADER, value);
        }

        let http = reqwest::Client::builder()
            .default_headers(headers)
            .timeout(config.timeout)
            .danger_accept_invalid_certs(config.insecure)
            .build()?;

        let base_url = config.base_url.trim_end_matches('/').to_string();
        Url::parse(&base_url)?;

        Ok(Self { http, base_url })
    }

    /// Start building a reference to the resource at `path`.
    pub fn resource(&self, path: &str) -> Result<Resource, Error> {
        let url = Url::parse(&format!("{}{}", self.base_url, path))?;
        Ok(Resource { url })
    }

    /// Execute a request and decode the JSON body into `T`.
    ///
    /// An empty body skips decoding and yields `T::default()`.
    pub async fn execute<T: DeserializeOwned + Default>(&self, request: Request) -> Result<T, Error> {
        let body = self.send(request).await?;
        if body.iter().all(u8::is_ascii_whitespace) {
            return Ok(T::default());
        }
        Ok(serde_json::from_slice(&body)?)
    }

    /// Execute a request whose response body is not needed.
    pub async fn execute_unit(&self, request: Request) -> Result<(), Error> {
        self.send(request).await.map(|_| ())
    }

    async fn send(&self, request: Request) -> Result<Vec<u8>, Error> {
        debug!(method = %request.method, url = %request.url, "Sending vAPI request");

        let mut builder = self.http.request(request.method.clone(), request.url.clone());
        if let Some(body) = &request.body {
            builder = builder.json(body);
        }
        let response = builder.send().await?;

        let status = response.status();
        if !status.is_success() {
            return Err(handle_error(&request, response).await);
        }

        debug!(method = %request.method, url = %request.url, status = status.as_u16(), "vAPI request succeeded");
        Ok(response.bytes().await?.to_vec())
    }
}

/// Turn a non-2xx response into [`Error::Http`].
async fn handle_error(request: &Request, response: reqwest::Response) -> Error {
    let status = response.status();
    let text = response.text().await.unwrap_or_default();

    let (error_type, message) = match serde_json::from_str::<ApiErrorResponse>(&text) {
        Ok(body) if body.error_type.is_some() || !body.messages.is_empty() => {
            let message = body
                .messages
                .iter()
                .map(|m| m.default_message.as_str())
                .filter(|m| !m.is_empty())
                .collect::<Vec<_>>()
                .join("; ");
            (body.error_type, message)
        }
        _ => (None, text.trim().to_string()),
    };

    let message = if message.is_empty() {
        status
            .canonical_reason()
            .unwrap_or("unknown error")
            .to_string()
    } else {
        message
    };

    warn!(
        method = %request.method,
        url = %request.url,
        status = status.as_u16(),
        error_type = error_type.as_deref().unwrap_or("-"),
        "vAPI request failed"
    );

    Error::Http {
        status: status.as_u16(),
        error_type,
        message,
    }
}

/// A resource URL under construction.
#[derive(Debug, Clone)]
pub struct Resource {
    url: Url,
}

impl Resource {
    /// Append a single path segment, percent-encoded.
    pub fn with_subpath(mut self, segment: &str) -> Self {
        if let Ok(mut segments) = self.url.path_segments_mut() {
            segments.pop_if_empty().push(segment);
        }
        self
    }

    /// Append a query parameter.
    pub fn with_param(mut self, key: &str, value: &str) -> Self {
        self.url.query_pairs_mut().append_pair(key, value);
        self
    }

    /// Append a query parameter only when a value is present.
    pub fn with_optional_param(self, key: &str, value: Option<&str>) -> Self {
        match value {
            Some(value) => self.with_param(key, value),
            None => self,
        }
    }

    /// Append a multi-value parameter joined with `,`.
    ///
    /// An empty list leaves the parameter out entirely.
    pub fn with_list_param<S: AsRef<str>>(self, key: &str, values: &[S]) -> Self {
        if values.is_empty() {
            return self;
        }
        let joined = values
            .iter()
            .map(AsRef::as_ref)
            .collect::<Vec<_>>()
            .join(",");
        self.with_param(key, &joined)
    }

    /// Mark the call as an asynchronous task (`vmw-task=true`).
    pub fn as_task(self) -> Self {
        self.with_param(TASK_PARAM, "true")
    }

    pub fn url(&self) -> &Url {
        &self.url
    }

    /// Build a request without a body.
    pub fn request(self, method: Method) -> Request {
        Request {
            method,
            url: self.url,
            body: None,
        }
    }

    /// Build a request carrying `body` as JSON.
    pub fn request_with_body<B: Serialize>(self, method: Method, body: &B) -> Result<Request, Error> {
        Ok(Request {
            method,
            url: self.url,
            body: Some(serde_json::to_value(body)?),
        })
    }
}

/// A fully built request.
#[derive(Debug, Clone)]
pub struct Request {
    pub method: Method,
    pub url: Url,
    pub body: Option<serde_json::Value>,
}

/// Localizable message as used by vAPI errors and tasks.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct LocalizableMessage {
    #[serde(default)]
    pub id: String,
    #[serde(default)]
    pub default_message: String,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub args: Vec<String>,
}

/// vAPI standard error document.
#[derive(Debug, Deserialize)]
struct ApiErrorResponse {
    #[serde(default)]
    error_type: Option<String>,
    #[serde(default)]
    messages: Vec<LocalizableMessage>,
}

#[cfg(test)]
mod tests {
    use super::*;

    fn client() -> Client {
        Client::new(&ClientConfig::new("https://vc.example.com/")).unwrap()
    }

    #[test]
    fn resource_joins_base_and_path() {
        let resource = client().resource("/api/cis/tasks").unwrap();
        assert_eq!(resource.url().as_str(), "https://vc.example.com/api/cis/tasks");
    }

    #[test]
    fn subpath_is_a_single_encoded_segment() {
        let resource = client()
            .resource("/api/esx/settings/depots/offline")
            .unwrap()
            .with_subpath("depot/1 a");
        assert_eq!(
            resource.url().path(),
            "/api/esx/settings/depots/offline/depot%2F1%20a"
        );
    }

    #[test]
    fn empty_list_param_is_omitted() {
        let empty: [&str; 0] = [];
        let resource = client()
            .resource("/api/esx/settings/depot-content/components")
            .unwrap()
            .with_list_param("vendors", &empty);
        assert_eq!(resource.url().query(), None);
    }

    #[test]
    fn list_param_joins_in_order() {
        let resource = client()
            .resource("/api/esx/settings/depot-content/components")
            .unwrap()
            .with_list_param("vendors", &["VMware", "Dell"]);
        let pairs: Vec<(String, String)> = resource.url().query_pairs().into_owned().collect();
        assert_eq!(pairs, vec![("vendors".to_string(), "VMware,Dell".to_string())]);
    }

    #[test]
    fn task_resource_carries_task_param() {
        let resource = client()
            .resource("/api/esx/settings/depots/offline")
            .unwrap()
            .with_subpath("depot-1")
            .as_task();
        assert_eq!(resource.url().query(), Some("vmw-task=true"));
    }

    #[test]
    fn request_with_body_keeps_json() {
        let request = client()
            .resource("/api/cis/tasks")
            .unwrap()
            .request_with_body(Method::POST, &serde_json::json!({ "message": "hi" }))
            .unwrap();
        assert_eq!(request.method, Method::POST);
        assert_eq!(request.body, Some(serde_json::json!({ "message": "hi" })));
    }

    #[test]
    fn invalid_base_url_is_rejected() {
        let err = Client::new(&ClientConfig::new("not a url")).unwrap_err();
        assert!(matches!(err, Error::InvalidUrl(_)));
    }
}
