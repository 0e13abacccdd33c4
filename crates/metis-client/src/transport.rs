//! Shared request executor.
//!
//! Every ordinary (non-streaming) call goes through one [`Transport`], which
//! owns the pooled HTTP client. An exchange is fully buffered before it is
//! classified, and each call resolves exactly once: with the raw body on a 2xx
//! response or with a classified [`Error`] otherwise. Nothing is retried.

use std::fmt;
use std::sync::Arc;

use reqwest::header::{HeaderName, HeaderValue, CONTENT_TYPE};

use crate::config::ClientConfig;
use crate::endpoint::build_url;
use crate::error::{classify, Error, Result};
use crate::multipart::MultipartForm;

/// Content type for JSON request bodies.
pub const JSON_CONTENT_TYPE: &str = "application/json; charset=utf-8";

/// HTTP method of a request.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Method {
    Get,
    Post,
    Put,
    Patch,
    Delete,
}

impl Method {
    /// Upper-case method name.
    pub fn as_str(&self) -> &'static str {
        match self {
            Method::Get => "GET",
            Method::Post => "POST",
            Method::Put => "PUT",
            Method::Patch => "PATCH",
            Method::Delete => "DELETE",
        }
    }
}

impl fmt::Display for Method {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl From<Method> for reqwest::Method {
    fn from(method: Method) -> Self {
        match method {
            Method::Get => reqwest::Method::GET,
            Method::Post => reqwest::Method::POST,
            Method::Put => reqwest::Method::PUT,
            Method::Patch => reqwest::Method::PATCH,
            Method::Delete => reqwest::Method::DELETE,
        }
    }
}

/// Body of a request.
#[derive(Debug, Clone, Default)]
pub enum RequestBody {
    #[default]
    Empty,
    /// Pre-serialized JSON text.
    Json(String),
    Multipart(MultipartForm),
}

/// Everything needed to issue one request.
#[derive(Debug, Clone)]
pub struct RequestDescriptor {
    pub method: Method,
    /// Endpoint path relative to the base URL.
    pub path: String,
    /// Query parameters, appended in order.
    pub query: Vec<(String, String)>,
    /// Extra request headers.
    pub headers: Vec<(String, String)>,
    pub body: RequestBody,
}

impl RequestDescriptor {
    /// Create a descriptor with no query, headers, or body.
    pub fn new(method: Method, path: impl Into<String>) -> Self {
        Self {
            method,
            path: path.into(),
            query: Vec::new(),
            headers: Vec::new(),
            body: RequestBody::Empty,
        }
    }

    /// Append a query parameter.
    pub fn query(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.query.push((key.into(), value.into()));
        self
    }

    /// Append several query parameters.
    pub fn query_pairs<K, V>(mut self, pairs: &[(K, V)]) -> Self
    where
        K: AsRef<str>,
        V: AsRef<str>,
    {
        self.query.extend(
            pairs
                .iter()
                .map(|(k, v)| (k.as_ref().to_string(), v.as_ref().to_string())),
        );
        self
    }

    /// Append a header.
    pub fn header(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.headers.push((name.into(), value.into()));
        self
    }

    /// Attach a pre-serialized JSON body.
    pub fn json(mut self, body: impl Into<String>) -> Self {
        self.body = RequestBody::Json(body.into());
        self
    }

    /// Attach a multipart body.
    pub fn multipart(mut self, form: MultipartForm) -> Self {
        self.body = RequestBody::Multipart(form);
        self
    }
}

/// Request executor bound to one pooled HTTP client.
#[derive(Clone)]
pub struct Transport {
    http: reqwest::Client,
    config: Arc<ClientConfig>,
}

impl Transport {
    /// Create an executor for the given configuration.
    pub fn new(config: Arc<ClientConfig>) -> Result<Self> {
        config.validate()?;

        let http = reqwest::Client::builder()
            .connect_timeout(config.timeout())
            .read_timeout(config.timeout())
            .user_agent(config.user_agent())
            .build()
            .map_err(|e| Error::Config(format!("failed to build HTTP client: {e}")))?;

        Ok(Self { http, config })
    }

    /// Configuration this executor was built with.
    pub fn config(&self) -> &ClientConfig {
        &self.config
    }

    /// Make a GET request.
    pub async fn get(&self, path: &str, query: &[(&str, &str)]) -> Result<String> {
        self.execute(RequestDescriptor::new(Method::Get, path).query_pairs(query))
            .await
    }

    /// Make a POST request with a JSON body.
    pub async fn post(
        &self,
        path: &str,
        body: impl Into<String>,
        query: &[(&str, &str)],
    ) -> Result<String> {
        self.execute(
            RequestDescriptor::new(Method::Post, path)
                .query_pairs(query)
                .json(body),
        )
        .await
    }

    /// Make a PUT request with a JSON body.
    pub async fn put(
        &self,
        path: &str,
        body: impl Into<String>,
        query: &[(&str, &str)],
    ) -> Result<String> {
        self.execute(
            RequestDescriptor::new(Method::Put, path)
                .query_pairs(query)
                .json(body),
        )
        .await
    }

    /// Make a PATCH request with a JSON body.
    pub async fn patch(
        &self,
        path: &str,
        body: impl Into<String>,
        query: &[(&str, &str)],
    ) -> Result<String> {
        self.execute(
            RequestDescriptor::new(Method::Patch, path)
                .query_pairs(query)
                .json(body),
        )
        .await
    }

    /// Make a DELETE request.
    pub async fn delete(&self, path: &str, query: &[(&str, &str)]) -> Result<String> {
        self.execute(RequestDescriptor::new(Method::Delete, path).query_pairs(query))
            .await
    }

    /// Make a POST request with a multipart body.
    pub async fn post_multipart(
        &self,
        path: &str,
        form: MultipartForm,
        query: &[(&str, &str)],
    ) -> Result<String> {
        self.execute(
            RequestDescriptor::new(Method::Post, path)
                .query_pairs(query)
                .multipart(form),
        )
        .await
    }

    /// Issue a request and return the raw response body.
    pub async fn execute(&self, request: RequestDescriptor) -> Result<String> {
        let RequestDescriptor {
            method,
            path,
            query,
            headers,
            body,
        } = request;

        let url = build_url(&self.config.base_url, &path, &query)?;

        let mut builder = self
            .http
            .request(method.into(), url.clone())
            .bearer_auth(&self.config.api_key);

        for (name, value) in headers {
            let name = HeaderName::from_bytes(name.as_bytes())
                .map_err(|e| Error::Encoding(format!("invalid header name {name:?}: {e}")))?;
            let value = HeaderValue::from_str(&value)
                .map_err(|e| Error::Encoding(format!("invalid value for header {name}: {e}")))?;
            builder = builder.header(name, value);
        }

        builder = match body {
            RequestBody::Empty => builder,
            RequestBody::Json(json) => builder
                .header(CONTENT_TYPE, HeaderValue::from_static(JSON_CONTENT_TYPE))
                .body(json),
            RequestBody::Multipart(form) => builder.multipart(form.encode().await?),
        };

        tracing::debug!(%method, %url, "Sending request");

        let response = builder.send().await.map_err(Error::from_transport)?;
        let status = response.status();
        let text = response.text().await.map_err(Error::from_transport)?;

        tracing::debug!(
            %method,
            %url,
            status = status.as_u16(),
            bytes = text.len(),
            "Received response"
        );

        match classify(status, &text) {
            Some(err) => Err(err),
            None => Ok(text),
        }
    }
}

impl fmt::Debug for Transport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Transport")
            .field("config", &self.config)
            .finish_non_exhaustive()
    }
}
