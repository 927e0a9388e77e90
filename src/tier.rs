//! Payment/tier collaborator: the gate signal and invoice creation.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use crate::error::TierError;

/// A service-fee invoice, as the payment collaborator reports it.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Invoice {
    pub status: InvoiceStatus,
    /// Link the user pays through, when the gateway produced one.
    pub pay_link: Option<String>,
    pub amount: u64,
    pub currency: String,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum InvoiceStatus {
    Created,
    Disabled,
}

/// Gate signal + invoice creation. The engine only reads the signal and
/// only requests an invoice when gated offers exist.
#[async_trait]
pub trait TierGate: Send + Sync {
    async fn is_paid(&self, user_id: &str) -> bool;
    async fn create_invoice(&self, user_id: &str) -> Result<Invoice, TierError>;
}

/// Stub for environments where the payment gateway is switched off: nobody
/// is on the paid tier and invoices come back disabled with no pay link.
pub struct DisabledPayments {
    amount: u64,
    currency: String,
}

impl DisabledPayments {
    pub fn new(amount: u64, currency: String) -> Self {
        Self { amount, currency }
    }
}

#[async_trait]
impl TierGate for DisabledPayments {
    async fn is_paid(&self, _user_id: &str) -> bool {
        false
    }

    async fn create_invoice(&self, user_id: &str) -> Result<Invoice, TierError> {
        tracing::debug!(user = user_id, "payment gateway disabled, returning stub invoice");
        Ok(Invoice {
            status: InvoiceStatus::Disabled,
            pay_link: None,
            amount: self.amount,
            currency: self.currency.clone(),
        })
    }
}
