//! Refunds for cancelled orders.
//!
//! [`resolve`] decides how much goes back to the customer and through which channel. Carrying the refund out is the
//! job of the storage backend, which applies the plan inside the same transaction that cancels the order, so that a
//! failed gateway refund leaves the order untouched.
use famto_common::MoneyError;
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::db_types::{DeliveryOption, Money, Order, OrderId, PaymentMode};

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum RefundPlan {
    /// Credit the customer's Famto wallet
    WalletCredit { customer_id: String, amount: Money },
    /// Refund the amount to the original payment through the payment gateway
    GatewayRefund { customer_id: String, payment_id: String, amount: Money },
    /// Nothing was collected, so nothing is returned
    NoMovement,
}

impl RefundPlan {
    pub fn amount(&self) -> Money {
        match self {
            RefundPlan::WalletCredit { amount, .. } | RefundPlan::GatewayRefund { amount, .. } => *amount,
            RefundPlan::NoMovement => Money::default(),
        }
    }
}

/// The refund that was carried out when an order was cancelled.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum RefundOutcome {
    WalletCredited { amount: Money, new_balance: Money },
    GatewayRefunded { amount: Money, refund_id: String },
    NoMovement,
}

impl RefundOutcome {
    pub fn amount(&self) -> Money {
        match self {
            RefundOutcome::WalletCredited { amount, .. } | RefundOutcome::GatewayRefunded { amount, .. } => *amount,
            RefundOutcome::NoMovement => Money::default(),
        }
    }
}

#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum RefundError {
    #[error("Scheduled order {0} has no delivery window to prorate the refund over")]
    MissingSchedule(OrderId),
    #[error("Could not compute the refund. {0}")]
    Arithmetic(#[from] MoneyError),
}

/// The amount to return to the customer: the grand total for on-demand orders, or a single day's share of it for
/// scheduled orders.
pub fn refund_amount(order: &Order) -> Result<Money, RefundError> {
    let total = order.grand_total();
    match order.delivery_option {
        DeliveryOption::OnDemand => Ok(total),
        DeliveryOption::Scheduled => {
            let days = order.num_of_days().ok_or_else(|| RefundError::MissingSchedule(order.id.clone()))?;
            Ok(total.divide_evenly(days)?)
        },
    }
}

pub fn resolve(order: &Order) -> Result<RefundPlan, RefundError> {
    let customer_id = order.customer_id.clone();
    let plan = match (order.payment_mode, order.payment_id.as_ref()) {
        (PaymentMode::FamtoCash, _) => RefundPlan::WalletCredit { customer_id, amount: refund_amount(order)? },
        (PaymentMode::OnlinePayment, Some(payment_id)) => {
            RefundPlan::GatewayRefund { customer_id, payment_id: payment_id.clone(), amount: refund_amount(order)? }
        },
        (PaymentMode::OnlinePayment, None) | (PaymentMode::CashOnDelivery, _) => RefundPlan::NoMovement,
    };
    Ok(plan)
}
