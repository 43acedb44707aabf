use crate::error::{IncomeError, Result};
use crate::models::Receipt;
use crate::payload::IncomePayload;
use core_runtime::config::ClientConfig;
use serde::Deserialize;
use std::sync::Arc;
use tracing::{debug, info, instrument, warn};

const INCOME_PATH: &str = "/income";

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct IncomeResponse {
    #[serde(default)]
    approved_receipt_uuid: Option<String>,
}

/// Client for the income registration endpoint.
#[derive(Debug, Clone)]
pub struct IncomeApi {
    config: Arc<ClientConfig>,
}

impl IncomeApi {
    pub fn new(config: Arc<ClientConfig>) -> Self {
        Self { config }
    }

    /// Register an income and return the receipt links.
    ///
    /// `tax_id` is the INN of the authenticated user; it is part of both
    /// receipt URLs.
    ///
    /// # Errors
    ///
    /// - [`IncomeError::RequestFailed`] on a non-success status
    /// - [`IncomeError::Transport`] if no response was received
    /// - [`IncomeError::InvalidResponse`] if the answer has no receipt id
    #[instrument(skip(self, access_token, payload), fields(services = payload.services().len()))]
    pub async fn register(
        &self,
        access_token: &str,
        payload: &IncomePayload,
        tax_id: &str,
    ) -> Result<Receipt> {
        let request = self
            .config
            .post(INCOME_PATH, &self.config.referers.income)
            .bearer_token(access_token)
            .json(payload)?;

        debug!(total = %payload.total_amount(), "Registering income");
        let response = self.config.http_client.execute(request).await?;

        if !response.is_success() {
            let body = response.text_lossy();
            warn!(status = response.status, "Income registration rejected");
            return Err(IncomeError::RequestFailed {
                status: response.status,
                body,
            });
        }

        let answer: IncomeResponse = response.json().map_err(|e| {
            IncomeError::InvalidResponse(format!("failed to parse income answer: {}", e))
        })?;

        let receipt_id = answer
            .approved_receipt_uuid
            .filter(|id| !id.is_empty())
            .ok_or_else(|| {
                IncomeError::InvalidResponse("income answer has no receipt id".to_string())
            })?;

        info!(receipt_id = %receipt_id, "Income registered");
        Ok(self.receipt(tax_id, receipt_id))
    }

    /// Receipt links for `receipt_id` issued to the taxpayer `tax_id`.
    pub fn receipt(&self, tax_id: &str, receipt_id: String) -> Receipt {
        let base = self
            .config
            .endpoint(&format!("/receipt/{}/{}", tax_id, receipt_id));

        Receipt {
            json_url: format!("{}/json", base),
            print_url: format!("{}/print", base),
            id: receipt_id,
        }
    }
}
