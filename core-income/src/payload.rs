//! Wire body of the `/income` call.

use crate::amount::Amount;
use crate::error::{IncomeError, Result};
use crate::models::IncomeRequest;
use chrono::{DateTime, FixedOffset, SecondsFormat, SubsecRound, Utc};
use serde::Serialize;

const PAYMENT_TYPE: &str = "CASH";
const INCOME_TYPE: &str = "FROM_INDIVIDUAL";

/// Income registration body, with every amount already rounded.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct IncomePayload {
    payment_type: &'static str,
    ignore_max_total_income_restriction: bool,
    client: IncomeClient,
    operation_time: String,
    request_time: String,
    services: Vec<ServiceLine>,
    total_amount: Amount,
}

/// Buyer block; incomes from individuals carry no buyer details.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
struct IncomeClient {
    contact_phone: Option<String>,
    display_name: Option<String>,
    inn: Option<String>,
    income_type: &'static str,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ServiceLine {
    pub name: String,
    pub quantity: u32,
    /// Rounded subtotal of the line
    pub amount: Amount,
}

impl IncomePayload {
    /// Build the body for `request`, stamped with `now` rendered in `offset`
    /// and truncated to whole seconds.
    ///
    /// Each line amount is `quantity × unit_amount` rounded half-up to two
    /// decimals; the total is the exact sum of the rounded lines.
    ///
    /// # Errors
    ///
    /// [`IncomeError::InvalidRequest`] when the request has no items or an
    /// amount cannot be represented.
    pub fn build(request: &IncomeRequest, now: DateTime<Utc>, offset: FixedOffset) -> Result<Self> {
        if request.is_empty() {
            return Err(IncomeError::InvalidRequest(
                "at least one item is required".to_string(),
            ));
        }

        let services = request
            .items()
            .iter()
            .map(|item| {
                Ok(ServiceLine {
                    name: item.name.clone(),
                    quantity: item.quantity,
                    amount: Amount::round_half_up(item.subtotal())?,
                })
            })
            .collect::<Result<Vec<_>>>()?;

        let total_amount = Amount::checked_sum(services.iter().map(|line| &line.amount))
            .ok_or_else(|| IncomeError::InvalidRequest("total amount is out of range".to_string()))?;

        let timestamp = now
            .trunc_subsecs(0)
            .with_timezone(&offset)
            .to_rfc3339_opts(SecondsFormat::Secs, true);

        Ok(Self {
            payment_type: PAYMENT_TYPE,
            ignore_max_total_income_restriction: false,
            client: IncomeClient {
                contact_phone: None,
                display_name: None,
                inn: None,
                income_type: INCOME_TYPE,
            },
            operation_time: timestamp.clone(),
            request_time: timestamp,
            services,
            total_amount,
        })
    }

    pub fn services(&self) -> &[ServiceLine] {
        &self.services
    }

    pub fn total_amount(&self) -> Amount {
        self.total_amount
    }

    pub fn operation_time(&self) -> &str {
        &self.operation_time
    }
}
