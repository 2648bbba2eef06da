//! Payment attempt records.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::error::{DomainError, Result};

use super::{Currency, Money, PaymentStatus};

/// One payment attempt against an order.
///
/// An order may accumulate several records (retries, refunds); exactly
/// one is authoritative for the order's current payment status — see
/// [`authoritative_payment`].
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Payment {
    pub payment_intent_id: String,
    pub payment_method_id: Option<String>,
    pub amount: Money,
    pub currency: Currency,
    pub status: PaymentStatus,
    pub charge_id: Option<String>,
    pub failure_reason: Option<String>,
    pub processed_at: Option<DateTime<Utc>>,
    pub refunded_amount: Money,
    pub created_at: DateTime<Utc>,
}

impl Payment {
    /// Records a successful capture.
    pub fn succeeded(
        payment_intent_id: impl Into<String>,
        charge_id: impl Into<String>,
        amount: Money,
        currency: Currency,
        now: DateTime<Utc>,
    ) -> Self {
        Self {
            payment_intent_id: payment_intent_id.into(),
            payment_method_id: None,
            amount,
            currency,
            status: PaymentStatus::Succeeded,
            charge_id: Some(charge_id.into()),
            failure_reason: None,
            processed_at: Some(now),
            refunded_amount: Money::zero(),
            created_at: now,
        }
    }

    /// Records a failed attempt with the provider's reason.
    pub fn failed(
        payment_intent_id: impl Into<String>,
        amount: Money,
        currency: Currency,
        reason: impl Into<String>,
        now: DateTime<Utc>,
    ) -> Self {
        Self {
            payment_intent_id: payment_intent_id.into(),
            payment_method_id: None,
            amount,
            currency,
            status: PaymentStatus::Failed,
            charge_id: None,
            failure_reason: Some(reason.into()),
            processed_at: Some(now),
            refunded_amount: Money::zero(),
            created_at: now,
        }
    }

    /// Returns the amount still refundable on this payment.
    pub fn refundable(&self) -> Money {
        self.amount - self.refunded_amount
    }

    /// Accumulates a refund, moving the status to `Refunded` when the
    /// full amount has been returned, `PartiallyRefunded` otherwise.
    pub fn apply_refund(&mut self, amount: Money) -> Result<()> {
        if amount > self.refundable() {
            return Err(DomainError::OverRefund {
                requested: amount,
                refundable: self.refundable(),
            });
        }
        self.refunded_amount += amount;
        self.status = if self.refunded_amount == self.amount {
            PaymentStatus::Refunded
        } else {
            PaymentStatus::PartiallyRefunded
        };
        Ok(())
    }
}

/// Selects the authoritative payment record: the most recent non-failed
/// one, or the most recent overall if every attempt failed.
pub fn authoritative_payment(payments: &[Payment]) -> Option<&Payment> {
    payments
        .iter()
        .filter(|p| p.status != PaymentStatus::Failed)
        .max_by_key(|p| p.created_at)
        .or_else(|| payments.iter().max_by_key(|p| p.created_at))
}
