//! Fee arithmetic for monthly receipts.
//!
//! Everything here is pure: the same inputs always give the same amounts,
//! and no input can make a total fail. Unparseable amounts count as zero.

use std::str::FromStr;

use chrono::NaiveDate;
use rust_decimal::Decimal;
use shared::{AttendanceRecord, AttendanceStatus, FeePolicy};
use tracing::debug;

/// Components of a receipt and the two sums derived from them
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct FeeTotals {
    pub base_amount: Decimal,
    pub absence_fine: Decimal,
    pub other_adjustments: Decimal,
    pub arrears: Decimal,
    /// The period's own charge; this is what the fee record stores as `amount`
    pub base_subtotal: Decimal,
    /// What the student owes overall, including carried-over debt
    pub total_payable: Decimal,
}

impl FeeTotals {
    pub fn compute(
        base_amount: Decimal,
        absence_fine: Decimal,
        other_adjustments: Decimal,
        arrears: Decimal,
    ) -> Self {
        let base_subtotal = base_amount + absence_fine + other_adjustments;
        Self {
            base_amount,
            absence_fine,
            other_adjustments,
            arrears,
            base_subtotal,
            total_payable: base_subtotal + arrears,
        }
    }
}

/// Parse a user-typed amount, tolerating a currency prefix, thousands
/// separators and surrounding whitespace.
pub fn parse_amount(input: &str, currency_symbol: &str) -> Option<Decimal> {
    let trimmed = input.trim();
    let without_symbol = if currency_symbol.is_empty() {
        trimmed
    } else {
        trimmed.strip_prefix(currency_symbol).unwrap_or(trimmed)
    };
    let cleaned: String = without_symbol
        .chars()
        .filter(|c| *c != ',' && !c.is_whitespace())
        .collect();

    if cleaned.is_empty() {
        return None;
    }
    Decimal::from_str(&cleaned)
        .or_else(|_| Decimal::from_scientific(&cleaned))
        .ok()
}

/// Number of `absent` entries in a month of attendance
pub fn count_absences(records: &[AttendanceRecord]) -> u32 {
    let absent = records
        .iter()
        .filter(|record| record.status == AttendanceStatus::Absent)
        .count();
    u32::try_from(absent).unwrap_or(u32::MAX)
}

/// Fee calculator configured with the school's fine and arrears rules
#[derive(Debug, Clone, Default)]
pub struct FeeCalculator {
    policy: FeePolicy,
}

impl FeeCalculator {
    pub fn new(policy: FeePolicy) -> Self {
        Self { policy }
    }

    pub fn policy(&self) -> &FeePolicy {
        &self.policy
    }

    /// Numeric value of a form field. Empty or non-numeric input is zero.
    // TODO: confirm with the accounts office whether garbage input should
    // block submission instead of silently counting as zero.
    pub fn coerce_amount(&self, input: &str) -> Decimal {
        match parse_amount(input, &self.policy.currency_symbol) {
            Some(amount) => amount,
            None => {
                if !input.trim().is_empty() {
                    debug!("Treating unparseable amount {:?} as zero", input);
                }
                Decimal::ZERO
            }
        }
    }

    /// Totals from raw form inputs
    pub fn totals(
        &self,
        base_amount: &str,
        absence_fine: &str,
        other_adjustments: &str,
        arrears: &str,
    ) -> FeeTotals {
        FeeTotals::compute(
            self.coerce_amount(base_amount),
            self.coerce_amount(absence_fine),
            self.coerce_amount(other_adjustments),
            self.coerce_amount(arrears),
        )
    }

    /// Fine suggested for `absences` days absent in a month
    pub fn suggested_absence_fine(&self, absences: u32) -> Decimal {
        let chargeable = absences.saturating_sub(self.policy.absence_threshold);
        Decimal::from(chargeable) * self.policy.fine_per_absence
    }

    /// Whether `today` falls in the month the school started using the system
    pub fn is_system_start_month(&self, today: NaiveDate) -> bool {
        self.policy.system_start.contains(today)
    }

    /// Arrears to use for a receipt generated on `today`. Nothing can be
    /// owed from before the system existed.
    pub fn effective_arrears(&self, looked_up: Decimal, today: NaiveDate) -> Decimal {
        if self.is_system_start_month(today) {
            Decimal::ZERO
        } else {
            looked_up
        }
    }

    /// Format amount for display
    pub fn format_amount(&self, amount: Decimal) -> String {
        format!("{} {:.2}", self.policy.currency_symbol, amount.round_dp(2))
    }
}
