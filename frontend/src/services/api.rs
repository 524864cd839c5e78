use std::time::Duration;

use async_trait::async_trait;
use rust_decimal::Decimal;
use serde::de::DeserializeOwned;
use shared::{
    ApiResponse, ArrearsResponse, AttendanceQuery, AttendanceRecord, CreateFeeRecordRequest,
    FeeReceipt, FeeRecord, FeeRecordQuery,
};
use tracing::{debug, warn};

use crate::config::ApiConfig;
use crate::services::errors::ApiError;

/// Operations the admin console needs from the school REST API.
///
/// The fee workflow only talks to this trait, so tests can script the
/// server's answers without a network.
#[async_trait]
pub trait SchoolApi: Send + Sync {
    /// Outstanding unpaid balance from earlier periods
    async fn get_arrears(&self, student_id: &str) -> Result<Decimal, ApiError>;

    /// Fee records for one student in one billing month
    async fn list_fee_records(&self, query: &FeeRecordQuery) -> Result<Vec<FeeRecord>, ApiError>;

    /// Student attendance between two dates (inclusive)
    async fn list_attendance(&self, query: &AttendanceQuery) -> Result<Vec<AttendanceRecord>, ApiError>;

    async fn create_fee_record(&self, request: &CreateFeeRecordRequest) -> Result<FeeRecord, ApiError>;

    /// Generate the printable receipt for an existing fee record
    async fn generate_receipt(&self, fee_id: &str) -> Result<FeeReceipt, ApiError>;
}

/// API client for communicating with the school backend over HTTP
#[derive(Clone)]
pub struct ApiClient {
    base_url: String,
    http: reqwest::Client,
}

impl ApiClient {
    /// Create a new API client with the default base URL
    pub fn new() -> Self {
        Self::from_config(&ApiConfig::default())
    }

    /// Create a new API client with a custom base URL
    pub fn with_base_url(base_url: impl Into<String>) -> Self {
        Self::from_config(&ApiConfig {
            base_url: base_url.into(),
            ..ApiConfig::default()
        })
    }

    pub fn from_config(config: &ApiConfig) -> Self {
        let http = match reqwest::Client::builder()
            .timeout(Duration::from_secs(config.timeout_secs))
            .build()
        {
            Ok(http) => http,
            Err(e) => {
                warn!(
                    "Failed to build HTTP client with a {}s timeout, using defaults: {}",
                    config.timeout_secs, e
                );
                reqwest::Client::default()
            }
        };
        Self {
            base_url: config.base_url.trim_end_matches('/').to_string(),
            http,
        }
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    /// Test connection to the backend
    pub async fn test_connection(&self) -> Result<(), ApiError> {
        self.http
            .get(self.url("/api/fees"))
            .send()
            .await
            .map(|_| ())
            .map_err(|e| ApiError::Transport(e.to_string()))
    }

    fn url(&self, path: &str) -> String {
        format!("{}{}", self.base_url, path)
    }

    async fn send(&self, request: reqwest::RequestBuilder) -> Result<(u16, String), ApiError> {
        let response = request.send().await?;
        let status = response.status().as_u16();
        let body = response.text().await?;
        Ok((status, body))
    }

    /// Unwraps the `{ success, message, data }` envelope
    async fn fetch<T: DeserializeOwned>(&self, request: reqwest::RequestBuilder) -> Result<T, ApiError> {
        let (status, body) = self.send(request).await?;
        let envelope = parse_envelope::<T>(status, &body)?;
        envelope
            .data
            .ok_or_else(|| ApiError::Decode("response is missing 'data'".to_string()))
    }
}

impl Default for ApiClient {
    fn default() -> Self {
        Self::new()
    }
}

fn is_success(status: u16) -> bool {
    (200..300).contains(&status)
}

/// Message carried by an error body, if the server sent one
fn error_message(body: &str) -> Option<String> {
    serde_json::from_str::<ApiResponse<serde_json::Value>>(body)
        .ok()
        .and_then(|envelope| envelope.message)
}

fn parse_envelope<T: DeserializeOwned>(status: u16, body: &str) -> Result<ApiResponse<T>, ApiError> {
    if !is_success(status) {
        warn!("School API returned status {}", status);
        return Err(ApiError::server(Some(status), error_message(body)));
    }

    let envelope: ApiResponse<T> =
        serde_json::from_str(body).map_err(|e| ApiError::Decode(e.to_string()))?;
    if !envelope.success {
        return Err(ApiError::server(Some(status), envelope.message));
    }
    Ok(envelope)
}

#[async_trait]
impl SchoolApi for ApiClient {
    async fn get_arrears(&self, student_id: &str) -> Result<Decimal, ApiError> {
        debug!("GET arrears for student {}", student_id);
        let url = self.url(&format!("/api/fees/arrears/{}", student_id));
        let (status, body) = self.send(self.http.get(url)).await?;

        if !is_success(status) {
            return Err(ApiError::server(Some(status), error_message(&body)));
        }
        let response: ArrearsResponse =
            serde_json::from_str(&body).map_err(|e| ApiError::Decode(e.to_string()))?;
        if !response.success {
            return Err(ApiError::server(Some(status), response.message));
        }
        Ok(response.arrears.unwrap_or_default())
    }

    async fn list_fee_records(&self, query: &FeeRecordQuery) -> Result<Vec<FeeRecord>, ApiError> {
        debug!(
            "GET fee records for student {} in {:04}-{:02}",
            query.student_id, query.year, query.month
        );
        let request = self.http.get(self.url("/api/fees")).query(&[
            ("studentId", query.student_id.clone()),
            ("month", query.month.to_string()),
            ("year", query.year.to_string()),
        ]);
        self.fetch(request).await
    }

    async fn list_attendance(&self, query: &AttendanceQuery) -> Result<Vec<AttendanceRecord>, ApiError> {
        debug!(
            "GET attendance for student {} from {} to {}",
            query.user_id, query.start_date, query.end_date
        );
        let request = self.http.get(self.url("/api/attendance")).query(&[
            ("userType", "student".to_string()),
            ("userId", query.user_id.clone()),
            ("startDate", query.start_date.to_string()),
            ("endDate", query.end_date.to_string()),
        ]);
        self.fetch(request).await
    }

    async fn create_fee_record(&self, request: &CreateFeeRecordRequest) -> Result<FeeRecord, ApiError> {
        debug!(
            "POST fee record: student {} type {} amount {} arrears {}",
            request.student, request.fee_type, request.amount, request.arrears
        );
        let builder = self.http.post(self.url("/api/fees")).json(request);
        self.fetch(builder).await
    }

    async fn generate_receipt(&self, fee_id: &str) -> Result<FeeReceipt, ApiError> {
        debug!("GET receipt for fee record {}", fee_id);
        let url = self.url(&format!("/api/fee-receipts/generate/{}", fee_id));
        self.fetch(self.http.get(url)).await
    }
}
