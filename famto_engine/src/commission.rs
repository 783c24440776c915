//! Merchant / platform earnings split for orders placed with merchants on the Commission pricing model.
use famto_common::MoneyError;
use serde::{Deserialize, Serialize};

use crate::db_types::{CommissionDetail, CommissionRuleRecord, CommissionType, Money};

const MAX_BASIS_POINTS: i64 = 10_000;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum CommissionRule {
    /// A share of the item total, in basis points (1250 = 12.5%)
    Percentage { basis_points: i64 },
    /// A flat fee per order
    Fixed(Money),
}

impl From<&CommissionRuleRecord> for CommissionRule {
    fn from(record: &CommissionRuleRecord) -> Self {
        match record.commission_type {
            CommissionType::Percentage => CommissionRule::Percentage { basis_points: record.commission_value },
            CommissionType::Fixed => CommissionRule::Fixed(Money::from(record.commission_value)),
        }
    }
}

/// Splits `total` between the merchant and the platform.
///
/// The platform's share is computed first (rounded half-to-even for percentages, capped at the total for fixed fees)
/// and the merchant receives the remainder, so that the two shares always add up to `total` exactly.
///
/// Percentages outside 0% to 100% and negative fees are refused, so neither share can come out negative.
pub fn split(total: Money, rule: CommissionRule) -> Result<CommissionDetail, MoneyError> {
    let famto_earnings = match rule {
        CommissionRule::Percentage { basis_points } if !(0..=MAX_BASIS_POINTS).contains(&basis_points) => {
            return Err(MoneyError::OutOfRange(format!("{basis_points} basis points")));
        },
        CommissionRule::Percentage { basis_points } => total.portion_bps(basis_points)?,
        CommissionRule::Fixed(fee) if fee.value() < 0 => {
            return Err(MoneyError::OutOfRange(format!("a fixed commission of {fee}")));
        },
        CommissionRule::Fixed(fee) => fee.min(total),
    };
    let merchant_earnings = total - famto_earnings;
    Ok(CommissionDetail { merchant_earnings, famto_earnings })
}
