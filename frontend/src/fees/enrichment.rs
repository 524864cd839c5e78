//! Background lookups that pre-fill a receipt draft.
//!
//! Arrears, absences and existing records are fetched concurrently. None of
//! them can fail the draft: errors are logged and replaced by a safe default.

use std::sync::Arc;

use chrono::NaiveDate;
use rust_decimal::Decimal;
use shared::{AttendanceQuery, FeeRecord, FeeRecordQuery, YearMonth};
use tokio::sync::mpsc;
use tracing::{debug, info, warn};

use super::calculator::{count_absences, FeeCalculator};
use super::cancellation::SessionToken;
use crate::services::SchoolApi;

/// Result of one lookup, applied to the draft by its owner
#[derive(Debug, Clone, PartialEq)]
pub enum EnrichmentUpdate {
    Arrears(Decimal),
    Absences { absences: u32, suggested_fine: Decimal },
    Duplicates(Vec<FeeRecord>),
}

/// Runs the draft lookups for one student
pub struct ReceiptEnricher<A: SchoolApi + ?Sized> {
    api: Arc<A>,
    calculator: FeeCalculator,
}

impl<A: SchoolApi + ?Sized> Clone for ReceiptEnricher<A> {
    fn clone(&self) -> Self {
        Self {
            api: Arc::clone(&self.api),
            calculator: self.calculator.clone(),
        }
    }
}

impl<A: SchoolApi + ?Sized + 'static> ReceiptEnricher<A> {
    pub fn new(api: Arc<A>, calculator: FeeCalculator) -> Self {
        Self { api, calculator }
    }

    /// Outstanding balance, or zero if unknown or in the system start month
    pub async fn lookup_arrears(&self, student_id: &str, today: NaiveDate) -> Decimal {
        if self.calculator.is_system_start_month(today) {
            debug!("Skipping arrears lookup for {}: system start month", student_id);
            return Decimal::ZERO;
        }
        match self.api.get_arrears(student_id).await {
            Ok(arrears) => self.calculator.effective_arrears(arrears, today),
            Err(e) => {
                warn!("Arrears lookup failed for {}: {}", student_id, e);
                Decimal::ZERO
            }
        }
    }

    /// Absences this month and the fine they suggest
    pub async fn lookup_absences(&self, student_id: &str, today: NaiveDate) -> (u32, Decimal) {
        let query = AttendanceQuery::for_month(student_id, today);
        match self.api.list_attendance(&query).await {
            Ok(records) => {
                let absences = count_absences(&records);
                (absences, self.calculator.suggested_absence_fine(absences))
            }
            Err(e) => {
                warn!("Attendance lookup failed for {}: {}", student_id, e);
                (0, Decimal::ZERO)
            }
        }
    }

    /// Fee records already created for this student this month
    pub async fn lookup_duplicates(&self, student_id: &str, today: NaiveDate) -> Vec<FeeRecord> {
        let period = YearMonth::from_date(today);
        let query = FeeRecordQuery {
            student_id: student_id.to_string(),
            month: period.month,
            year: period.year,
        };
        match self.api.list_fee_records(&query).await {
            Ok(records) => records,
            Err(e) => {
                warn!("Duplicate check failed for {}: {}", student_id, e);
                Vec::new()
            }
        }
    }

    /// Start all three lookups. Updates arrive in completion order; once
    /// `token` is cancelled no further updates are sent.
    pub fn spawn(
        &self,
        student_id: &str,
        today: NaiveDate,
        token: &SessionToken,
    ) -> mpsc::UnboundedReceiver<EnrichmentUpdate> {
        let (tx, rx) = mpsc::unbounded_channel();
        info!("Starting receipt enrichment for student {}", student_id);

        {
            let (enricher, tx, token, student_id) = self.task_parts(&tx, token, student_id);
            tokio::spawn(async move {
                if let Some(arrears) = token
                    .run_until_cancelled(enricher.lookup_arrears(&student_id, today))
                    .await
                {
                    let _ = tx.send(EnrichmentUpdate::Arrears(arrears));
                }
            });
        }
        {
            let (enricher, tx, token, student_id) = self.task_parts(&tx, token, student_id);
            tokio::spawn(async move {
                if let Some((absences, suggested_fine)) = token
                    .run_until_cancelled(enricher.lookup_absences(&student_id, today))
                    .await
                {
                    let _ = tx.send(EnrichmentUpdate::Absences {
                        absences,
                        suggested_fine,
                    });
                }
            });
        }
        {
            let (enricher, tx, token, student_id) = self.task_parts(&tx, token, student_id);
            tokio::spawn(async move {
                if let Some(records) = token
                    .run_until_cancelled(enricher.lookup_duplicates(&student_id, today))
                    .await
                {
                    let _ = tx.send(EnrichmentUpdate::Duplicates(records));
                }
            });
        }

        rx
    }

    fn task_parts(
        &self,
        tx: &mpsc::UnboundedSender<EnrichmentUpdate>,
        token: &SessionToken,
        student_id: &str,
    ) -> (Self, mpsc::UnboundedSender<EnrichmentUpdate>, SessionToken, String) {
        (self.clone(), tx.clone(), token.clone(), student_id.to_string())
    }
}
