use chrono::{Datelike, NaiveDate};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Standard envelope returned by every school API endpoint.
///
/// `success` is the application-level verdict; a 200 response with
/// `success: false` is still a failure.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ApiResponse<T> {
    #[serde(default)]
    pub success: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
    #[serde(default = "Option::default", skip_serializing_if = "Option::is_none")]
    pub data: Option<T>,
}

impl<T> ApiResponse<T> {
    pub fn ok(data: T) -> Self {
        Self {
            success: true,
            message: None,
            data: Some(data),
        }
    }

    pub fn failure(message: impl Into<String>) -> Self {
        Self {
            success: false,
            message: Some(message.into()),
            data: None,
        }
    }
}

/// Response of `GET /api/fees/arrears/{studentId}`. The balance sits at the
/// top level instead of under `data`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ArrearsResponse {
    #[serde(default)]
    pub success: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
    #[serde(default)]
    pub arrears: Option<Decimal>,
}

/// Payment status of a fee record
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum FeeStatus {
    #[default]
    Unpaid,
    Paid,
    Partial,
    Overdue,
}

impl FeeStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            FeeStatus::Unpaid => "unpaid",
            FeeStatus::Paid => "paid",
            FeeStatus::Partial => "partial",
            FeeStatus::Overdue => "overdue",
        }
    }
}

impl fmt::Display for FeeStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Kind of charge a fee record represents
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum FeeType {
    Tuition,
    Exam,
    Transport,
    Library,
    Laboratory,
    Sports,
    Other,
}

impl FeeType {
    pub fn as_str(&self) -> &'static str {
        match self {
            FeeType::Tuition => "tuition",
            FeeType::Exam => "exam",
            FeeType::Transport => "transport",
            FeeType::Library => "library",
            FeeType::Laboratory => "laboratory",
            FeeType::Sports => "sports",
            FeeType::Other => "other",
        }
    }
}

impl fmt::Display for FeeType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Error returned when a fee type string is not recognised
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UnknownFeeType(pub String);

impl fmt::Display for UnknownFeeType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "unknown fee type '{}'", self.0)
    }
}

impl std::error::Error for UnknownFeeType {}

impl FromStr for FeeType {
    type Err = UnknownFeeType;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "tuition" => Ok(FeeType::Tuition),
            "exam" => Ok(FeeType::Exam),
            "transport" => Ok(FeeType::Transport),
            "library" => Ok(FeeType::Library),
            "laboratory" => Ok(FeeType::Laboratory),
            "sports" => Ok(FeeType::Sports),
            "other" => Ok(FeeType::Other),
            other => Err(UnknownFeeType(other.to_string())),
        }
    }
}

/// Fee type picked on the direct entry form. `All` fans out into one
/// record per configured sub-type.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FeeTypeSelection {
    All,
    Single(FeeType),
}

impl FromStr for FeeTypeSelection {
    type Err = UnknownFeeType;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        if s.trim().eq_ignore_ascii_case("all") {
            Ok(FeeTypeSelection::All)
        } else {
            s.parse().map(FeeTypeSelection::Single)
        }
    }
}

impl fmt::Display for FeeTypeSelection {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            FeeTypeSelection::All => f.write_str("all"),
            FeeTypeSelection::Single(fee_type) => fee_type.fmt(f),
        }
    }
}

/// A persisted billing entry as returned by the fee endpoints
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FeeRecord {
    #[serde(rename = "_id", alias = "id")]
    pub id: String,
    pub student: String,
    pub fee_type: FeeType,
    pub amount: Decimal,
    #[serde(default)]
    pub arrears: Decimal,
    /// Server-formatted timestamp (ISO 8601)
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub due_date: Option<String>,
    #[serde(default)]
    pub status: FeeStatus,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub month: Option<u32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub year: Option<i32>,
}

/// Body of `POST /api/fees`
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateFeeRecordRequest {
    pub student: String,
    pub fee_type: FeeType,
    /// The period's own charge, excluding arrears
    pub amount: Decimal,
    pub due_date: NaiveDate,
    pub status: FeeStatus,
    pub description: String,
    /// Debt carried over from earlier periods, tracked separately
    pub arrears: Decimal,
}

/// Query for `GET /api/fees`
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FeeRecordQuery {
    pub student_id: String,
    pub month: u32,
    pub year: i32,
}

/// Attendance status as reported by the attendance endpoint
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum AttendanceStatus {
    Present,
    Absent,
    Late,
    Excused,
    #[serde(other)]
    Other,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AttendanceRecord {
    #[serde(rename = "_id", alias = "id", default)]
    pub id: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub user_id: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub date: Option<String>,
    pub status: AttendanceStatus,
}

/// Query for `GET /api/attendance`, always for students
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AttendanceQuery {
    pub user_id: String,
    pub start_date: NaiveDate,
    pub end_date: NaiveDate,
}

impl AttendanceQuery {
    /// Query spanning the whole calendar month containing `day`
    pub fn for_month(user_id: impl Into<String>, day: NaiveDate) -> Self {
        let period = YearMonth::from_date(day);
        Self {
            user_id: user_id.into(),
            start_date: period.first_day(),
            end_date: period.last_day(),
        }
    }
}

/// Printable receipt produced by `GET /api/fee-receipts/generate/{feeId}`.
/// Only the receipt number is interpreted; the rest is passed through.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Default)]
#[serde(rename_all = "camelCase")]
pub struct FeeReceipt {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub receipt_number: Option<String>,
    #[serde(flatten)]
    pub details: serde_json::Map<String, serde_json::Value>,
}

/// A calendar month, used for billing periods
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct YearMonth {
    pub year: i32,
    pub month: u32,
}

impl YearMonth {
    pub fn new(year: i32, month: u32) -> Self {
        Self { year, month }
    }

    pub fn from_date(date: NaiveDate) -> Self {
        Self {
            year: date.year(),
            month: date.month(),
        }
    }

    pub fn contains(&self, date: NaiveDate) -> bool {
        date.year() == self.year && date.month() == self.month
    }

    pub fn first_day(&self) -> NaiveDate {
        NaiveDate::from_ymd_opt(self.year, self.month, 1).unwrap_or(NaiveDate::MIN)
    }

    pub fn last_day(&self) -> NaiveDate {
        let (next_year, next_month) = if self.month >= 12 {
            (self.year + 1, 1)
        } else {
            (self.year, self.month + 1)
        };
        NaiveDate::from_ymd_opt(next_year, next_month, 1)
            .and_then(|d| d.pred_opt())
            .unwrap_or(NaiveDate::MAX)
    }
}

impl fmt::Display for YearMonth {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:04}-{:02}", self.year, self.month)
    }
}

/// Rules for fines, arrears and bulk creation
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct FeePolicy {
    /// Absences allowed per month before fines apply
    pub absence_threshold: u32,
    pub fine_per_absence: Decimal,
    /// First month the school used the system; no arrears exist before it
    pub system_start: YearMonth,
    /// Sub-types created when the "all" fee type is selected
    pub bulk_fee_types: Vec<FeeType>,
    pub currency_symbol: String,
}

impl Default for FeePolicy {
    fn default() -> Self {
        Self {
            absence_threshold: 3,
            fine_per_absence: Decimal::from(100),
            system_start: YearMonth::new(2025, 1),
            bulk_fee_types: vec![
                FeeType::Tuition,
                FeeType::Exam,
                FeeType::Transport,
                FeeType::Library,
            ],
            currency_symbol: "Rs.".to_string(),
        }
    }
}

/// Back-stack behaviour
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct NavigationConfig {
    /// Maximum number of visits kept in history
    pub history_capacity: usize,
    /// Route used by `go_back` when nothing better is known
    pub default_path: String,
}

impl Default for NavigationConfig {
    fn default() -> Self {
        Self {
            history_capacity: 50,
            default_path: "/dashboard".to_string(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn fee_record_reads_mongo_style_id() {
        let json = r#"{
            "_id": "fee-1",
            "student": "stu-9",
            "feeType": "tuition",
            "amount": 1500,
            "arrears": 250.5,
            "status": "partial"
        }"#;
        let record: FeeRecord = serde_json::from_str(json).unwrap();
        assert_eq!(record.id, "fee-1");
        assert_eq!(record.fee_type, FeeType::Tuition);
        assert_eq!(record.amount, Decimal::from(1500));
        assert_eq!(record.arrears, Decimal::new(2505, 1));
        assert_eq!(record.status, FeeStatus::Partial);
    }

    #[test]
    fn create_request_uses_camel_case_and_plain_date() {
        let request = CreateFeeRecordRequest {
            student: "stu-1".to_string(),
            fee_type: FeeType::Exam,
            amount: Decimal::from(1200),
            due_date: NaiveDate::from_ymd_opt(2025, 3, 10).unwrap(),
            status: FeeStatus::Unpaid,
            description: "March".to_string(),
            arrears: Decimal::from(300),
        };
        let value = serde_json::to_value(&request).unwrap();
        assert_eq!(value["feeType"], "exam");
        assert_eq!(value["dueDate"], "2025-03-10");
        assert_eq!(value["amount"].as_f64(), Some(1200.0));
        assert_eq!(value["arrears"].as_f64(), Some(300.0));
    }

    #[test]
    fn unknown_attendance_status_is_tolerated() {
        let json = r#"{"_id": "a1", "status": "holiday"}"#;
        let record: AttendanceRecord = serde_json::from_str(json).unwrap();
        assert_eq!(record.status, AttendanceStatus::Other);
    }

    #[test]
    fn fee_type_selection_parses_all() {
        assert_eq!("all".parse::<FeeTypeSelection>(), Ok(FeeTypeSelection::All));
        assert_eq!(
            "Exam".parse::<FeeTypeSelection>(),
            Ok(FeeTypeSelection::Single(FeeType::Exam))
        );
        assert!("parking".parse::<FeeTypeSelection>().is_err());
    }

    #[test]
    fn year_month_bounds() {
        let feb = YearMonth::new(2024, 2);
        assert_eq!(feb.first_day(), NaiveDate::from_ymd_opt(2024, 2, 1).unwrap());
        assert_eq!(feb.last_day(), NaiveDate::from_ymd_opt(2024, 2, 29).unwrap());

        let dec = YearMonth::new(2025, 12);
        assert_eq!(dec.last_day(), NaiveDate::from_ymd_opt(2025, 12, 31).unwrap());
        assert_eq!(dec.to_string(), "2025-12");
    }

    #[test]
    fn envelope_without_data_is_a_failure() {
        let json = r#"{"success": false, "message": "Student not found"}"#;
        let response: ApiResponse<Vec<FeeRecord>> = serde_json::from_str(json).unwrap();
        assert!(!response.success);
        assert!(response.data.is_none());
        assert_eq!(response.message.as_deref(), Some("Student not found"));
    }
}
