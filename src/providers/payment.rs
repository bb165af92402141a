use async_trait::async_trait;
use chrono::Utc;
use rust_decimal::Decimal;
use serde_json::Value;
use uuid::Uuid;

use crate::entity::orders::PaymentMethod;

pub struct ChargeRequest<'a> {
    pub transaction_id: Uuid,
    pub amount: Decimal,
    pub method: PaymentMethod,
    pub details: &'a Value,
}

#[derive(Debug, Clone, PartialEq)]
pub enum ChargeOutcome {
    Approved { reference: String },
    Declined { reason: String },
}

#[async_trait]
pub trait PaymentGateway: Send + Sync {
    async fn charge(&self, request: ChargeRequest<'_>) -> anyhow::Result<ChargeOutcome>;
}

/// Gateway stand-in that approves every charge. A caller-supplied
/// `transaction_id` in the payment details is used as the reference.
pub struct SimulatedGateway;

#[async_trait]
impl PaymentGateway for SimulatedGateway {
    async fn charge(&self, request: ChargeRequest<'_>) -> anyhow::Result<ChargeOutcome> {
        let reference = request
            .details
            .get("transaction_id")
            .and_then(Value::as_str)
            .filter(|s| !s.is_empty())
            .map(str::to_owned)
            .unwrap_or_else(|| format!("TXN_{}", Utc::now().timestamp_millis()));

        tracing::info!(
            transaction = %request.transaction_id,
            amount = %request.amount,
            method = request.method.as_str(),
            reference = %reference,
            "simulated charge approved"
        );
        Ok(ChargeOutcome::Approved { reference })
    }
}
