//! Plain fee record entry, without fines or arrears lookups.
//!
//! Selecting the "all" fee type creates one record per configured sub-type,
//! one request at a time. Records that were created stay created even when a
//! later sub-type fails.

use std::sync::Arc;

use chrono::NaiveDate;
use rust_decimal::Decimal;
use shared::{CreateFeeRecordRequest, FeePolicy, FeeRecord, FeeStatus, FeeType, FeeTypeSelection};
use tracing::{info, warn};

use super::calculator::FeeCalculator;
use super::draft::AmountInput;
use super::session::WorkflowError;
use crate::services::{ApiError, SchoolApi};

pub const BULK_PARTIAL_FAILURE_MESSAGE: &str =
    "Some fee records could not be created. Please review the student's fees and try again.";

/// The direct entry form as submitted
#[derive(Debug, Clone, PartialEq)]
pub struct FeeEntryForm {
    pub student_id: String,
    pub selection: FeeTypeSelection,
    pub amount: AmountInput,
    pub due_date: NaiveDate,
    pub status: FeeStatus,
    pub description: String,
}

/// What a bulk submission managed to create
#[derive(Debug, Clone, PartialEq, Default)]
pub struct BulkCreationReport {
    pub created: Vec<FeeRecord>,
    pub failed: Vec<FeeType>,
    /// Single aggregate message, set when any sub-type failed
    pub warning: Option<String>,
}

impl BulkCreationReport {
    pub fn is_complete(&self) -> bool {
        self.failed.is_empty()
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum FeeEntryOutcome {
    Created(FeeRecord),
    Bulk(BulkCreationReport),
}

pub struct FeeEntryService<A: SchoolApi + ?Sized> {
    api: Arc<A>,
    calculator: FeeCalculator,
}

impl<A: SchoolApi + ?Sized> FeeEntryService<A> {
    pub fn new(api: Arc<A>, policy: FeePolicy) -> Self {
        Self {
            api,
            calculator: FeeCalculator::new(policy),
        }
    }

    pub async fn submit(&self, form: &FeeEntryForm) -> Result<FeeEntryOutcome, WorkflowError> {
        if form.student_id.trim().is_empty() {
            return Err(WorkflowError::MissingStudent);
        }
        match form.selection {
            FeeTypeSelection::Single(fee_type) => {
                let record = self.create_single(form, fee_type).await?;
                Ok(FeeEntryOutcome::Created(record))
            }
            FeeTypeSelection::All => Ok(FeeEntryOutcome::Bulk(self.create_bulk(form).await)),
        }
    }

    pub async fn create_single(&self, form: &FeeEntryForm, fee_type: FeeType) -> Result<FeeRecord, ApiError> {
        let request = self.build_request(form, fee_type);
        info!(
            "Creating {} fee for student {}: amount {}",
            fee_type, request.student, request.amount
        );
        self.api.create_fee_record(&request).await
    }

    /// Create one record per configured sub-type, in order
    pub async fn create_bulk(&self, form: &FeeEntryForm) -> BulkCreationReport {
        let mut report = BulkCreationReport::default();

        for &fee_type in &self.calculator.policy().bulk_fee_types {
            match self.create_single(form, fee_type).await {
                Ok(record) => report.created.push(record),
                Err(e) => {
                    warn!("Bulk creation of {} fee failed: {}", fee_type, e);
                    report.failed.push(fee_type);
                }
            }
        }

        if !report.failed.is_empty() {
            warn!(
                "Bulk fee entry for student {}: {} created, {} failed",
                form.student_id,
                report.created.len(),
                report.failed.len()
            );
            report.warning = Some(BULK_PARTIAL_FAILURE_MESSAGE.to_string());
        }
        report
    }

    fn build_request(&self, form: &FeeEntryForm, fee_type: FeeType) -> CreateFeeRecordRequest {
        CreateFeeRecordRequest {
            student: form.student_id.trim().to_string(),
            fee_type,
            amount: self.calculator.coerce_amount(form.amount.as_str()),
            due_date: form.due_date,
            status: form.status,
            description: form.description.trim().to_string(),
            arrears: Decimal::ZERO,
        }
    }
}
