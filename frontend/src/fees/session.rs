//! Two-step "review, then create" flow for a monthly fee receipt.
//!
//! ```text
//! Draft --submit--> Confirming --confirm--> Submitting --ok--> Done
//!   ^                 |    ^                    |
//!   +------back-------+    +-------error--------+
//! ```
//!
//! No request is issued before the user has seen the confirmation summary.

use std::fmt;
use std::sync::Arc;

use chrono::NaiveDate;
use shared::{FeePolicy, FeeReceipt, FeeRecord, FeeStatus, FeeType};
use thiserror::Error;
use tokio::sync::mpsc;
use tracing::{debug, info, warn};
use uuid::Uuid;

use super::calculator::{FeeCalculator, FeeTotals};
use super::cancellation::SessionToken;
use super::draft::{AmountInput, FeeReceiptDraft};
use super::enrichment::{EnrichmentUpdate, ReceiptEnricher};
use crate::services::date_utils::{self, format_display_date};
use crate::services::{ApiError, SchoolApi};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ReceiptStage {
    Draft,
    Confirming,
    Submitting,
    Done,
}

impl fmt::Display for ReceiptStage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            ReceiptStage::Draft => "draft",
            ReceiptStage::Confirming => "confirming",
            ReceiptStage::Submitting => "submitting",
            ReceiptStage::Done => "done",
        };
        f.write_str(name)
    }
}

#[derive(Debug, Clone, Error, PartialEq)]
pub enum WorkflowError {
    #[error("cannot {action} while the receipt is {from}")]
    InvalidTransition {
        from: ReceiptStage,
        action: &'static str,
    },
    #[error("a student must be selected")]
    MissingStudent,
    #[error("the fee record was already created; only the receipt is pending")]
    RecordAlreadyCreated,
    #[error("the receipt session was closed")]
    Cancelled,
    #[error(transparent)]
    Api(#[from] ApiError),
}

impl WorkflowError {
    /// Inline text for the form
    pub fn user_message(&self) -> String {
        match self {
            WorkflowError::Api(e) => e.user_message(),
            other => other.to_string(),
        }
    }
}

/// Read-only review shown before anything is created
#[derive(Debug, Clone, PartialEq)]
pub struct ConfirmationSummary {
    pub student_id: String,
    pub fee_type: FeeType,
    pub status: FeeStatus,
    pub due_date: String,
    pub description: String,
    pub totals: FeeTotals,
    /// Display lines, e.g. ("Absence fine", "Rs. 200.00")
    pub lines: Vec<(String, String)>,
    pub duplicate_warning: bool,
}

/// Created record plus its printable receipt
#[derive(Debug, Clone, PartialEq)]
pub struct ReceiptOutcome {
    pub fee_record: FeeRecord,
    pub receipt: FeeReceipt,
}

pub const DUPLICATE_WARNING: &str =
    "A fee record already exists for this student this month. Creating another one is still allowed.";

/// One receipt-generation flow, from opening the form to the printed receipt
pub struct ReceiptSession<A: SchoolApi + ?Sized> {
    id: Uuid,
    api: Arc<A>,
    calculator: FeeCalculator,
    draft: FeeReceiptDraft,
    stage: ReceiptStage,
    today: NaiveDate,
    token: SessionToken,
    absences: Option<u32>,
    duplicates: Vec<FeeRecord>,
    /// Lookups that landed while the summary was on screen
    held_updates: Vec<EnrichmentUpdate>,
    /// Record created by a confirm whose receipt generation then failed
    created_record: Option<FeeRecord>,
    last_error: Option<String>,
    outcome: Option<ReceiptOutcome>,
}

impl<A: SchoolApi + ?Sized + 'static> ReceiptSession<A> {
    pub fn new(api: Arc<A>, policy: FeePolicy, draft: FeeReceiptDraft) -> Self {
        Self::starting_on(api, policy, draft, date_utils::today())
    }

    /// Session whose "current month" is the month of `today`
    pub fn starting_on(api: Arc<A>, policy: FeePolicy, draft: FeeReceiptDraft, today: NaiveDate) -> Self {
        let id = Uuid::new_v4();
        info!("Receipt session {} opened for student {}", id, draft.student_id);
        Self {
            id,
            api,
            calculator: FeeCalculator::new(policy),
            draft,
            stage: ReceiptStage::Draft,
            today,
            token: SessionToken::new(),
            absences: None,
            duplicates: Vec::new(),
            held_updates: Vec::new(),
            created_record: None,
            last_error: None,
            outcome: None,
        }
    }

    pub fn id(&self) -> Uuid {
        self.id
    }

    pub fn stage(&self) -> ReceiptStage {
        self.stage
    }

    pub fn draft(&self) -> &FeeReceiptDraft {
        &self.draft
    }

    pub fn totals(&self) -> FeeTotals {
        self.draft.totals(&self.calculator)
    }

    pub fn absences(&self) -> Option<u32> {
        self.absences
    }

    pub fn has_duplicate_warning(&self) -> bool {
        !self.duplicates.is_empty()
    }

    pub fn duplicate_warning(&self) -> Option<&'static str> {
        self.has_duplicate_warning().then_some(DUPLICATE_WARNING)
    }

    pub fn duplicate_records(&self) -> &[FeeRecord] {
        &self.duplicates
    }

    pub fn last_error(&self) -> Option<&str> {
        self.last_error.as_deref()
    }

    pub fn outcome(&self) -> Option<&ReceiptOutcome> {
        self.outcome.as_ref()
    }

    pub fn token(&self) -> &SessionToken {
        &self.token
    }

    pub fn is_closed(&self) -> bool {
        self.token.is_cancelled()
    }

    /// Start the arrears, attendance and duplicate lookups in the background.
    /// Feed each received update to [`apply_enrichment`](Self::apply_enrichment).
    pub fn spawn_enrichment(&self) -> mpsc::UnboundedReceiver<EnrichmentUpdate> {
        let enricher = ReceiptEnricher::new(Arc::clone(&self.api), self.calculator.clone());
        enricher.spawn(&self.draft.student_id, self.today, &self.token)
    }

    /// Run the lookups and apply their results in place
    pub async fn enrich(&mut self) {
        let mut updates = self.spawn_enrichment();
        while let Some(update) = updates.recv().await {
            self.apply_enrichment(update);
        }
    }

    /// Apply a lookup result to the draft. Returns whether the draft took it
    /// now.
    ///
    /// The confirmation summary is frozen: updates arriving in `Confirming`
    /// are held and applied on [`back`](Self::back). Once submission has
    /// started, or the session is closed, updates are dropped.
    pub fn apply_enrichment(&mut self, update: EnrichmentUpdate) -> bool {
        if self.is_closed() {
            debug!("Session {} ignoring update after close: {:?}", self.id, update);
            return false;
        }
        match self.stage {
            ReceiptStage::Draft => {
                self.apply_to_draft(update);
                true
            }
            ReceiptStage::Confirming => {
                debug!("Session {} holding update until back: {:?}", self.id, update);
                self.held_updates.push(update);
                false
            }
            ReceiptStage::Submitting | ReceiptStage::Done => {
                debug!("Session {} ignoring stale update {:?}", self.id, update);
                false
            }
        }
    }

    fn apply_to_draft(&mut self, update: EnrichmentUpdate) {
        match update {
            EnrichmentUpdate::Arrears(arrears) => {
                let arrears = self.calculator.effective_arrears(arrears, self.today);
                if !self.draft.suggest_arrears(arrears) {
                    debug!("Session {}: keeping user-entered arrears", self.id);
                }
            }
            EnrichmentUpdate::Absences {
                absences,
                suggested_fine,
            } => {
                self.absences = Some(absences);
                if self.draft.suggest_absence_fine(suggested_fine) {
                    debug!(
                        "Session {}: {} absence(s), suggested fine {}",
                        self.id, absences, suggested_fine
                    );
                }
            }
            EnrichmentUpdate::Duplicates(records) => {
                if !records.is_empty() {
                    warn!(
                        "Session {}: {} fee record(s) already exist for student {} this month",
                        self.id,
                        records.len(),
                        self.draft.student_id
                    );
                }
                self.duplicates = records;
            }
        }
    }

    fn require_stage(&self, expected: ReceiptStage, action: &'static str) -> Result<(), WorkflowError> {
        if self.is_closed() && self.stage != ReceiptStage::Done {
            return Err(WorkflowError::Cancelled);
        }
        if self.stage != expected {
            return Err(WorkflowError::InvalidTransition {
                from: self.stage,
                action,
            });
        }
        Ok(())
    }

    fn edit(&mut self, change: impl FnOnce(&mut FeeReceiptDraft)) -> Result<(), WorkflowError> {
        self.require_stage(ReceiptStage::Draft, "edit")?;
        change(&mut self.draft);
        Ok(())
    }

    pub fn set_fee_type(&mut self, fee_type: FeeType) -> Result<(), WorkflowError> {
        self.edit(|draft| draft.fee_type = fee_type)
    }

    pub fn set_base_amount(&mut self, input: impl Into<AmountInput>) -> Result<(), WorkflowError> {
        let input = input.into();
        self.edit(|draft| draft.base_amount = input)
    }

    pub fn set_absence_fine(&mut self, input: impl Into<AmountInput>) -> Result<(), WorkflowError> {
        let input = input.into();
        self.edit(|draft| draft.edit_absence_fine(input))
    }

    pub fn set_other_adjustments(&mut self, input: impl Into<AmountInput>) -> Result<(), WorkflowError> {
        let input = input.into();
        self.edit(|draft| draft.other_adjustments = input)
    }

    pub fn set_arrears(&mut self, input: impl Into<AmountInput>) -> Result<(), WorkflowError> {
        let input = input.into();
        self.edit(|draft| draft.edit_arrears(input))
    }

    pub fn set_due_date(&mut self, due_date: NaiveDate) -> Result<(), WorkflowError> {
        self.edit(|draft| draft.due_date = due_date)
    }

    pub fn set_description(&mut self, description: impl Into<String>) -> Result<(), WorkflowError> {
        let description = description.into();
        self.edit(|draft| draft.description = description)
    }

    pub fn set_status(&mut self, status: FeeStatus) -> Result<(), WorkflowError> {
        self.edit(|draft| draft.status = status)
    }

    /// Review the draft. Nothing is sent yet.
    pub fn submit(&mut self) -> Result<ConfirmationSummary, WorkflowError> {
        self.require_stage(ReceiptStage::Draft, "submit")?;
        if self.draft.student_id.trim().is_empty() {
            return Err(WorkflowError::MissingStudent);
        }
        self.stage = ReceiptStage::Confirming;
        self.last_error = None;
        info!("Session {} moved to confirmation", self.id);
        Ok(self.summary())
    }

    /// Leave the confirmation step to keep editing
    pub fn back(&mut self) -> Result<(), WorkflowError> {
        self.require_stage(ReceiptStage::Confirming, "go back")?;
        if self.created_record.is_some() {
            return Err(WorkflowError::RecordAlreadyCreated);
        }
        self.stage = ReceiptStage::Draft;
        self.last_error = None;
        for update in std::mem::take(&mut self.held_updates) {
            self.apply_to_draft(update);
        }
        Ok(())
    }

    /// Create the fee record, then generate its receipt.
    ///
    /// On failure the session returns to `Confirming` with the error kept in
    /// [`last_error`](Self::last_error). A record created before a failed
    /// receipt generation is reused on the next confirm.
    pub async fn confirm(&mut self) -> Result<ReceiptOutcome, WorkflowError> {
        self.require_stage(ReceiptStage::Confirming, "confirm")?;
        self.stage = ReceiptStage::Submitting;
        self.last_error = None;

        let api = Arc::clone(&self.api);
        let fee_record = match self.created_record.take() {
            Some(record) => record,
            None => {
                let request = self.draft.to_create_request(&self.calculator);
                info!(
                    "Session {} creating {} fee for student {}: amount {} arrears {}",
                    self.id, request.fee_type, request.student, request.amount, request.arrears
                );
                match api.create_fee_record(&request).await {
                    Ok(record) => record,
                    Err(e) => return Err(self.fail(e)),
                }
            }
        };

        match api.generate_receipt(&fee_record.id).await {
            Ok(receipt) => {
                info!("Session {} finished: fee record {}", self.id, fee_record.id);
                let outcome = ReceiptOutcome { fee_record, receipt };
                self.stage = ReceiptStage::Done;
                self.outcome = Some(outcome.clone());
                self.token.cancel();
                Ok(outcome)
            }
            Err(e) => {
                self.created_record = Some(fee_record);
                Err(self.fail(e))
            }
        }
    }

    fn fail(&mut self, error: ApiError) -> WorkflowError {
        warn!("Session {} request failed: {}", self.id, error);
        self.stage = ReceiptStage::Confirming;
        self.last_error = Some(error.user_message());
        WorkflowError::Api(error)
    }

    /// Close the session; pending lookups stop delivering updates
    pub fn cancel(&mut self) {
        if !self.token.is_cancelled() {
            info!("Receipt session {} closed in stage {}", self.id, self.stage);
        }
        self.token.cancel();
    }

    /// Summary of the draft as it stands
    pub fn summary(&self) -> ConfirmationSummary {
        let totals = self.totals();
        let format = |amount| self.calculator.format_amount(amount);
        let lines = vec![
            ("Base amount".to_string(), format(totals.base_amount)),
            ("Absence fine".to_string(), format(totals.absence_fine)),
            ("Other adjustments".to_string(), format(totals.other_adjustments)),
            ("Subtotal".to_string(), format(totals.base_subtotal)),
            ("Arrears".to_string(), format(totals.arrears)),
            ("Total payable".to_string(), format(totals.total_payable)),
        ];

        ConfirmationSummary {
            student_id: self.draft.student_id.clone(),
            fee_type: self.draft.fee_type,
            status: self.draft.status,
            due_date: format_display_date(self.draft.due_date),
            description: self.draft.description.clone(),
            totals,
            lines,
            duplicate_warning: self.has_duplicate_warning(),
        }
    }
}

impl<A: SchoolApi + ?Sized> Drop for ReceiptSession<A> {
    fn drop(&mut self) {
        self.token.cancel();
    }
}
