//! Meta API.

use crate::client::MetisClient;
use crate::error::Result;
use crate::types::{MetaResponse, PricingResponse};

/// Meta API client.
pub struct MetaApi {
    client: MetisClient,
}

impl MetaApi {
    pub(crate) fn new(client: MetisClient) -> Self {
        Self { client }
    }

    /// List available providers and models.
    pub async fn get(&self) -> Result<MetaResponse> {
        self.client.get_json("api/v1/meta", &[]).await
    }

    /// Get pricing for chat and image providers.
    pub async fn pricing(&self) -> Result<PricingResponse> {
        self.client.get_json("api/v1/meta/pricing", &[]).await
    }
}
