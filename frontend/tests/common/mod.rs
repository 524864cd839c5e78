//! Scripted stand-in for the school API.

#![allow(dead_code)]

use std::collections::HashSet;
use std::sync::Mutex;
use std::time::Duration;

use async_trait::async_trait;
use chrono::NaiveDate;
use rust_decimal::Decimal;
use school_admin_frontend::services::{ApiError, SchoolApi};
use shared::{
    AttendanceQuery, AttendanceRecord, AttendanceStatus, CreateFeeRecordRequest, FeeReceipt,
    FeeRecord, FeeRecordQuery, FeePolicy, FeeStatus, FeeType, YearMonth,
};

pub fn date(year: i32, month: u32, day: u32) -> NaiveDate {
    NaiveDate::from_ymd_opt(year, month, day).unwrap()
}

pub fn dec(value: i64) -> Decimal {
    Decimal::from(value)
}

/// Policy whose start month is safely in the past for `date(2025, 6, 15)`
pub fn test_policy() -> FeePolicy {
    FeePolicy {
        system_start: YearMonth::new(2025, 1),
        bulk_fee_types: vec![FeeType::Tuition, FeeType::Exam],
        ..FeePolicy::default()
    }
}

pub fn attendance(statuses: &[AttendanceStatus]) -> Vec<AttendanceRecord> {
    statuses
        .iter()
        .enumerate()
        .map(|(i, status)| AttendanceRecord {
            id: format!("att-{}", i),
            user_id: Some("stu-1".to_string()),
            date: None,
            status: *status,
        })
        .collect()
}

pub fn existing_record(id: &str) -> FeeRecord {
    FeeRecord {
        id: id.to_string(),
        student: "stu-1".to_string(),
        fee_type: FeeType::Tuition,
        amount: dec(1500),
        arrears: Decimal::ZERO,
        due_date: None,
        status: FeeStatus::Unpaid,
        description: None,
        month: Some(6),
        year: Some(2025),
    }
}

pub struct FakeSchoolApi {
    arrears: Mutex<Result<Decimal, ApiError>>,
    fee_records: Mutex<Result<Vec<FeeRecord>, ApiError>>,
    attendance: Mutex<Result<Vec<AttendanceRecord>, ApiError>>,
    failing_fee_types: Mutex<HashSet<FeeType>>,
    create_error: Mutex<Option<ApiError>>,
    receipt_error: Mutex<Option<ApiError>>,
    lookup_delay: Mutex<Option<Duration>>,
    pub created: Mutex<Vec<CreateFeeRecordRequest>>,
    pub receipt_requests: Mutex<Vec<String>>,
    pub calls: Mutex<Vec<&'static str>>,
}

impl Default for FakeSchoolApi {
    fn default() -> Self {
        Self {
            arrears: Mutex::new(Ok(Decimal::ZERO)),
            fee_records: Mutex::new(Ok(Vec::new())),
            attendance: Mutex::new(Ok(Vec::new())),
            failing_fee_types: Mutex::new(HashSet::new()),
            create_error: Mutex::new(None),
            receipt_error: Mutex::new(None),
            lookup_delay: Mutex::new(None),
            created: Mutex::new(Vec::new()),
            receipt_requests: Mutex::new(Vec::new()),
            calls: Mutex::new(Vec::new()),
        }
    }
}

impl FakeSchoolApi {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_arrears(self, result: Result<Decimal, ApiError>) -> Self {
        *self.arrears.lock().unwrap() = result;
        self
    }

    pub fn with_fee_records(self, result: Result<Vec<FeeRecord>, ApiError>) -> Self {
        *self.fee_records.lock().unwrap() = result;
        self
    }

    pub fn with_attendance(self, result: Result<Vec<AttendanceRecord>, ApiError>) -> Self {
        *self.attendance.lock().unwrap() = result;
        self
    }

    pub fn failing_for(self, fee_type: FeeType) -> Self {
        self.failing_fee_types.lock().unwrap().insert(fee_type);
        self
    }

    pub fn with_lookup_delay(self, delay: Duration) -> Self {
        *self.lookup_delay.lock().unwrap() = Some(delay);
        self
    }

    pub fn fail_next_create(&self, error: ApiError) {
        *self.create_error.lock().unwrap() = Some(error);
    }

    pub fn fail_next_receipt(&self, error: ApiError) {
        *self.receipt_error.lock().unwrap() = Some(error);
    }

    pub fn created_count(&self) -> usize {
        self.created.lock().unwrap().len()
    }

    pub fn call_count(&self, name: &str) -> usize {
        self.calls.lock().unwrap().iter().filter(|c| **c == name).count()
    }

    fn record_call(&self, name: &'static str) {
        self.calls.lock().unwrap().push(name);
    }

    async fn delay(&self) {
        let delay = *self.lookup_delay.lock().unwrap();
        if let Some(delay) = delay {
            tokio::time::sleep(delay).await;
        }
    }
}

#[async_trait]
impl SchoolApi for FakeSchoolApi {
    async fn get_arrears(&self, _student_id: &str) -> Result<Decimal, ApiError> {
        self.record_call("get_arrears");
        self.delay().await;
        self.arrears.lock().unwrap().clone()
    }

    async fn list_fee_records(&self, _query: &FeeRecordQuery) -> Result<Vec<FeeRecord>, ApiError> {
        self.record_call("list_fee_records");
        self.delay().await;
        self.fee_records.lock().unwrap().clone()
    }

    async fn list_attendance(&self, _query: &AttendanceQuery) -> Result<Vec<AttendanceRecord>, ApiError> {
        self.record_call("list_attendance");
        self.delay().await;
        self.attendance.lock().unwrap().clone()
    }

    async fn create_fee_record(&self, request: &CreateFeeRecordRequest) -> Result<FeeRecord, ApiError> {
        self.record_call("create_fee_record");
        if let Some(error) = self.create_error.lock().unwrap().take() {
            return Err(error);
        }
        if self.failing_fee_types.lock().unwrap().contains(&request.fee_type) {
            return Err(ApiError::server(Some(500), Some(format!("{} fee failed", request.fee_type))));
        }

        let mut created = self.created.lock().unwrap();
        created.push(request.clone());
        Ok(FeeRecord {
            id: format!("fee-{}", created.len()),
            student: request.student.clone(),
            fee_type: request.fee_type,
            amount: request.amount,
            arrears: request.arrears,
            due_date: Some(request.due_date.to_string()),
            status: request.status,
            description: Some(request.description.clone()),
            month: None,
            year: None,
        })
    }

    async fn generate_receipt(&self, fee_id: &str) -> Result<FeeReceipt, ApiError> {
        self.record_call("generate_receipt");
        self.receipt_requests.lock().unwrap().push(fee_id.to_string());
        if let Some(error) = self.receipt_error.lock().unwrap().take() {
            return Err(error);
        }
        Ok(FeeReceipt {
            receipt_number: Some(format!("RCPT-{}", fee_id)),
            details: Default::default(),
        })
    }
}
