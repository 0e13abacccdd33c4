//! Credit API.

use crate::client::MetisClient;
use crate::error::Result;
use crate::types::{AddCreditRequest, UserStatement};

/// Credit API client.
pub struct CreditApi {
    client: MetisClient,
}

impl CreditApi {
    pub(crate) fn new(client: MetisClient) -> Self {
        Self { client }
    }

    /// Get the caller's balance and transactions.
    pub async fn statement(&self) -> Result<UserStatement> {
        self.client.get_json("api/v1/credit/statement", &[]).await
    }

    /// Credit a user's account. Requires an admin key.
    pub async fn add_credit(&self, request: &AddCreditRequest) -> Result<()> {
        self.client
            .post_unit("api/v1/credit/admin/add", request)
            .await
    }

    /// List users whose balance is running low. Requires an admin key.
    pub async fn low_balances(&self) -> Result<Vec<UserStatement>> {
        self.client.get_json("api/v1/credit/low-balances", &[]).await
    }
}
