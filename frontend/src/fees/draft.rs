use chrono::NaiveDate;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use shared::{CreateFeeRecordRequest, FeeStatus, FeeType};

use super::calculator::{FeeCalculator, FeeTotals};

/// Raw text of a money field, kept exactly as typed.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct AmountInput(String);

impl AmountInput {
    pub fn new(text: impl Into<String>) -> Self {
        Self(text.into())
    }

    pub fn from_decimal(amount: Decimal) -> Self {
        Self(amount.normalize().to_string())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    pub fn is_blank(&self) -> bool {
        self.0.trim().is_empty()
    }
}

impl From<&str> for AmountInput {
    fn from(text: &str) -> Self {
        Self::new(text)
    }
}

impl From<String> for AmountInput {
    fn from(text: String) -> Self {
        Self(text)
    }
}

/// In-progress receipt for one student and month. Never sent as is; only
/// the request built from it leaves the client.
#[derive(Debug, Clone, PartialEq)]
pub struct FeeReceiptDraft {
    pub student_id: String,
    pub fee_type: FeeType,
    pub base_amount: AmountInput,
    pub absence_fine: AmountInput,
    pub other_adjustments: AmountInput,
    pub arrears: AmountInput,
    pub due_date: NaiveDate,
    pub description: String,
    pub status: FeeStatus,
    absence_fine_edited: bool,
    arrears_edited: bool,
}

impl FeeReceiptDraft {
    pub fn new(
        student_id: impl Into<String>,
        fee_type: FeeType,
        base_amount: impl Into<AmountInput>,
        due_date: NaiveDate,
    ) -> Self {
        Self {
            student_id: student_id.into(),
            fee_type,
            base_amount: base_amount.into(),
            absence_fine: AmountInput::default(),
            other_adjustments: AmountInput::default(),
            arrears: AmountInput::default(),
            due_date,
            description: String::new(),
            status: FeeStatus::Unpaid,
            absence_fine_edited: false,
            arrears_edited: false,
        }
    }

    /// User edit of the absence fine; later suggestions will not overwrite it
    pub fn edit_absence_fine(&mut self, input: impl Into<AmountInput>) {
        self.absence_fine = input.into();
        self.absence_fine_edited = true;
    }

    pub fn absence_fine_edited(&self) -> bool {
        self.absence_fine_edited
    }

    /// Pre-fill the absence fine unless the user already changed it.
    /// Returns whether the suggestion was applied.
    pub fn suggest_absence_fine(&mut self, suggested: Decimal) -> bool {
        if self.absence_fine_edited {
            return false;
        }
        self.absence_fine = AmountInput::from_decimal(suggested);
        true
    }

    /// User edit of the arrears; the arrears lookup will not overwrite it
    pub fn edit_arrears(&mut self, input: impl Into<AmountInput>) {
        self.arrears = input.into();
        self.arrears_edited = true;
    }

    pub fn arrears_edited(&self) -> bool {
        self.arrears_edited
    }

    /// Pre-fill the arrears from the lookup unless the user already set them
    pub fn suggest_arrears(&mut self, looked_up: Decimal) -> bool {
        if self.arrears_edited {
            return false;
        }
        self.arrears = AmountInput::from_decimal(looked_up);
        true
    }

    pub fn totals(&self, calculator: &FeeCalculator) -> FeeTotals {
        calculator.totals(
            self.base_amount.as_str(),
            self.absence_fine.as_str(),
            self.other_adjustments.as_str(),
            self.arrears.as_str(),
        )
    }

    /// Payload for `POST /api/fees`: the period's charge as `amount`, the
    /// carried-over debt as `arrears`.
    pub fn to_create_request(&self, calculator: &FeeCalculator) -> CreateFeeRecordRequest {
        let totals = self.totals(calculator);
        CreateFeeRecordRequest {
            student: self.student_id.trim().to_string(),
            fee_type: self.fee_type,
            amount: totals.base_subtotal,
            due_date: self.due_date,
            status: self.status,
            description: self.description.trim().to_string(),
            arrears: totals.arrears,
        }
    }
}
