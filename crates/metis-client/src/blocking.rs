//! Blocking client.
//!
//! Wraps the async [`MetisClient`](crate::MetisClient) with a private
//! current-thread runtime. Each call blocks until its request resolves.
//! Must not be used from within an async runtime.

use serde::de::DeserializeOwned;
use serde::Serialize;
use tokio::runtime::{Builder, Runtime};

use crate::config::ClientConfig;
use crate::error::{Error, Result};
use crate::multipart::MultipartForm;

/// Blocking Metis API client.
#[derive(Debug)]
pub struct MetisClient {
    inner: crate::MetisClient,
    runtime: Runtime,
}

impl MetisClient {
    /// Create a client for the production host.
    pub fn new(api_key: impl Into<String>) -> Result<Self> {
        Self::from_config(ClientConfig::new(api_key))
    }

    /// Create a client from a resolved configuration.
    pub fn from_config(config: ClientConfig) -> Result<Self> {
        Self::wrap(crate::MetisClient::from_config(config)?)
    }

    /// Drive an existing async client synchronously.
    pub fn wrap(inner: crate::MetisClient) -> Result<Self> {
        let runtime = Builder::new_current_thread()
            .enable_all()
            .build()
            .map_err(|e| Error::Config(format!("failed to start runtime: {e}")))?;
        Ok(Self { inner, runtime })
    }

    /// The wrapped async client.
    pub fn inner(&self) -> &crate::MetisClient {
        &self.inner
    }

    /// Make a GET request and return the raw body.
    pub fn get(&self, path: &str, query: &[(&str, &str)]) -> Result<String> {
        self.runtime.block_on(self.inner.transport().get(path, query))
    }

    /// Make a POST request with a JSON body and return the raw body.
    pub fn post(
        &self,
        path: &str,
        body: impl Into<String>,
        query: &[(&str, &str)],
    ) -> Result<String> {
        self.runtime
            .block_on(self.inner.transport().post(path, body, query))
    }

    /// Make a PUT request with a JSON body and return the raw body.
    pub fn put(
        &self,
        path: &str,
        body: impl Into<String>,
        query: &[(&str, &str)],
    ) -> Result<String> {
        self.runtime
            .block_on(self.inner.transport().put(path, body, query))
    }

    /// Make a PATCH request with a JSON body and return the raw body.
    pub fn patch(
        &self,
        path: &str,
        body: impl Into<String>,
        query: &[(&str, &str)],
    ) -> Result<String> {
        self.runtime
            .block_on(self.inner.transport().patch(path, body, query))
    }

    /// Make a DELETE request and return the raw body.
    pub fn delete(&self, path: &str, query: &[(&str, &str)]) -> Result<String> {
        self.runtime
            .block_on(self.inner.transport().delete(path, query))
    }

    /// Upload a multipart form and return the raw body.
    pub fn post_multipart(
        &self,
        path: &str,
        form: MultipartForm,
        query: &[(&str, &str)],
    ) -> Result<String> {
        self.runtime
            .block_on(self.inner.transport().post_multipart(path, form, query))
    }

    /// Make a GET request and decode the response.
    pub fn get_json<T: DeserializeOwned>(&self, path: &str, query: &[(&str, &str)]) -> Result<T> {
        self.runtime.block_on(self.inner.get_json(path, query))
    }

    /// Make a POST request with a JSON body and decode the response.
    pub fn post_json<T, B>(&self, path: &str, body: &B) -> Result<T>
    where
        T: DeserializeOwned,
        B: Serialize + ?Sized,
    {
        self.runtime.block_on(self.inner.post_json(path, body))
    }
}
