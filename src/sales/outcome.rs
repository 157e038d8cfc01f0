use thiserror::Error;

use crate::domain::Sale;

/// A post-commit step that did not go through. The sale itself stands.
#[derive(Debug, Clone, Error, PartialEq)]
pub enum SideEffectFailure {
    #[error("customer {customer_id} purchase totals were not updated: {reason}")]
    CustomerAggregate { customer_id: String, reason: String },
    #[error("low-stock alert for {product_name} was not recorded: {reason}")]
    LowStockAlert {
        product_id: String,
        product_name: String,
        reason: String,
    },
}

#[derive(Debug, Clone, PartialEq)]
pub enum SaleOutcome {
    /// Committed and every follow-up step succeeded.
    Completed(Sale),
    /// Committed, but some follow-up steps failed.
    PartialSuccess {
        sale: Sale,
        failures: Vec<SideEffectFailure>,
    },
    /// The idempotency key had already been used; this is the original sale.
    Replayed(Sale),
}

impl SaleOutcome {
    pub(crate) fn from_failures(sale: Sale, failures: Vec<SideEffectFailure>) -> Self {
        if failures.is_empty() {
            SaleOutcome::Completed(sale)
        } else {
            SaleOutcome::PartialSuccess { sale, failures }
        }
    }

    pub fn sale(&self) -> &Sale {
        match self {
            SaleOutcome::Completed(sale)
            | SaleOutcome::PartialSuccess { sale, .. }
            | SaleOutcome::Replayed(sale) => sale,
        }
    }

    pub fn into_sale(self) -> Sale {
        match self {
            SaleOutcome::Completed(sale)
            | SaleOutcome::PartialSuccess { sale, .. }
            | SaleOutcome::Replayed(sale) => sale,
        }
    }

    pub fn failures(&self) -> &[SideEffectFailure] {
        match self {
            SaleOutcome::PartialSuccess { failures, .. } => failures,
            _ => &[],
        }
    }

    pub fn is_partial_success(&self) -> bool {
        matches!(self, SaleOutcome::PartialSuccess { .. })
    }
}
