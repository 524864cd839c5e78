//! # Fees
//!
//! Monthly fee receipts and direct fee record entry.
//!
//! - **calculator**: amount parsing, totals, absence fines, arrears rules
//! - **draft**: the editable receipt form and its request payload
//! - **enrichment**: background arrears / attendance / duplicate lookups
//! - **session**: the draft → confirm → create workflow
//! - **direct_entry**: plain create form, including the "all" bulk variant
//! - **cancellation**: token that stops lookups when a session closes

pub mod calculator;
pub mod cancellation;
pub mod direct_entry;
pub mod draft;
pub mod enrichment;
pub mod session;

pub use calculator::{count_absences, parse_amount, FeeCalculator, FeeTotals};
pub use cancellation::SessionToken;
pub use direct_entry::{
    BulkCreationReport, FeeEntryForm, FeeEntryOutcome, FeeEntryService, BULK_PARTIAL_FAILURE_MESSAGE,
};
pub use draft::{AmountInput, FeeReceiptDraft};
pub use enrichment::{EnrichmentUpdate, ReceiptEnricher};
pub use session::{
    ConfirmationSummary, ReceiptOutcome, ReceiptSession, ReceiptStage, WorkflowError, DUPLICATE_WARNING,
};
