//! Records read from and written to the hosted store.
//!
//! Field names follow the table columns. Optional columns decode as `None`
//! when absent so partially populated rows still load.

use std::fmt;

use chrono::{DateTime, Months, NaiveDate, Utc};
use serde::{Deserialize, Serialize};

/// Primary keys come back as integers from some tables and as text from
/// others.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(untagged)]
pub enum RowId {
    Number(i64),
    Text(String),
}

impl fmt::Display for RowId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Number(n) => write!(f, "{n}"),
            Self::Text(s) => f.write_str(s),
        }
    }
}

impl From<&str> for RowId {
    fn from(value: &str) -> Self {
        Self::Text(value.to_owned())
    }
}

impl From<i64> for RowId {
    fn from(value: i64) -> Self {
        Self::Number(value)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Student {
    pub id: RowId,
    pub name: String,
    pub roll_number: Option<u32>,
    pub class: Option<String>,
    pub stream: Option<String>,
    pub attendance_percentage: Option<f64>,
    pub percentile: Option<f64>,
    pub rank: Option<u32>,
    pub photo_url: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Parent {
    pub id: RowId,
    pub name: String,
    pub phone: Option<String>,
    pub email: Option<String>,
    pub student_id: Option<RowId>,
    pub relation: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Teacher {
    pub id: RowId,
    pub name: String,
    pub email: Option<String>,
    pub phone: Option<String>,
    pub department: Option<String>,
    pub experience_years: Option<u32>,
    pub rating: Option<f64>,
    pub total_students: Option<u32>,
    pub classes_assigned: Option<u32>,
    pub photo_url: Option<String>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum FeeStatus {
    Paid,
    Pending,
    Overdue,
    #[serde(other)]
    Unknown,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Fee {
    pub id: RowId,
    pub student_id: Option<RowId>,
    pub month: Option<String>,
    pub amount: f64,
    pub status: FeeStatus,
    pub due_date: Option<NaiveDate>,
    pub payment_date: Option<NaiveDate>,
    pub payment_method: Option<String>,
    pub transaction_id: Option<String>,
}

/// Details recorded when a fee is paid. The fee is marked paid and dated
/// today in the same update.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct FeePayment {
    pub payment_method: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub transaction_id: Option<String>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum AttendanceStatus {
    Present,
    Absent,
    Leave,
    Late,
    #[serde(other)]
    Unknown,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AttendanceRecord {
    pub id: Option<RowId>,
    pub student_id: Option<RowId>,
    pub date: NaiveDate,
    pub status: AttendanceStatus,
    pub remarks: Option<String>,
}

/// Inclusive date range for attendance queries.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DateRange {
    pub start: NaiveDate,
    pub end: NaiveDate,
}

/// Only the `status` column of an attendance row.
#[derive(Debug, Deserialize)]
pub(crate) struct StatusRow {
    pub status: AttendanceStatus,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AttendanceSummary {
    pub total: u64,
    pub present: u64,
    pub absent: u64,
    pub leave: u64,
    /// Present share with two decimals, `"0.00"` when there are no records.
    pub percentage: String,
}

impl AttendanceSummary {
    pub fn from_statuses(statuses: impl IntoIterator<Item = AttendanceStatus>) -> Self {
        let mut summary = Self {
            total: 0,
            present: 0,
            absent: 0,
            leave: 0,
            percentage: String::new(),
        };

        for status in statuses {
            summary.total += 1;
            match status {
                AttendanceStatus::Present => summary.present += 1,
                AttendanceStatus::Absent => summary.absent += 1,
                AttendanceStatus::Leave => summary.leave += 1,
                AttendanceStatus::Late | AttendanceStatus::Unknown => {}
            }
        }

        summary.percentage = if summary.total > 0 {
            format!("{:.2}", summary.present as f64 / summary.total as f64 * 100.0)
        } else {
            "0.00".to_owned()
        };
        summary
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct ClassAttendance {
    pub present: u64,
    pub absent: u64,
    pub total: u64,
}

impl ClassAttendance {
    pub fn from_statuses(statuses: impl IntoIterator<Item = AttendanceStatus>) -> Self {
        let mut summary = Self {
            present: 0,
            absent: 0,
            total: 0,
        };
        for status in statuses {
            summary.total += 1;
            match status {
                AttendanceStatus::Present => summary.present += 1,
                AttendanceStatus::Absent => summary.absent += 1,
                _ => {}
            }
        }
        summary
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Exam {
    pub id: RowId,
    pub student_id: Option<RowId>,
    pub name: String,
    pub exam_date: NaiveDate,
    /// `upcoming` or `completed`.
    pub status: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TimetableEntry {
    pub id: RowId,
    pub student_id: Option<RowId>,
    pub subject: String,
    pub teacher_name: Option<String>,
    pub date: Option<NaiveDate>,
    /// Wall-clock time as stored, e.g. `09:00`.
    pub class_start_time: String,
    pub class_end_time: Option<String>,
    pub room: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Document {
    pub id: RowId,
    pub student_id: Option<RowId>,
    pub title: String,
    pub category: Option<String>,
    pub file_url: Option<String>,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LeaveApplication {
    pub id: Option<RowId>,
    pub student_id: RowId,
    pub leave_type: Option<String>,
    pub start_date: NaiveDate,
    pub end_date: NaiveDate,
    pub reason: String,
    pub status: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct NewLeaveApplication {
    pub student_id: RowId,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub leave_type: Option<String>,
    pub start_date: NaiveDate,
    pub end_date: NaiveDate,
    pub reason: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChatMessage {
    pub id: Option<RowId>,
    pub student_id: RowId,
    pub sender_type: String,
    pub sender_name: Option<String>,
    pub message: String,
    pub created_at: DateTime<Utc>,
}

/// A message typed by a parent. The timestamp and sender type are added
/// when it is stored.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct NewChatMessage {
    pub student_id: RowId,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub sender_name: Option<String>,
    pub message: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Communication {
    pub id: RowId,
    pub student_id: Option<RowId>,
    pub title: String,
    pub message: String,
    pub sender: Option<String>,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Homework {
    pub teacher_id: RowId,
    pub class: String,
    pub subject: String,
    pub title: String,
    pub description: Option<String>,
    pub due_date: NaiveDate,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MarksEntry {
    pub teacher_id: RowId,
    pub student_id: RowId,
    pub exam_id: Option<RowId>,
    pub subject: String,
    pub marks_obtained: f64,
    pub max_marks: f64,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum NotificationCategory {
    Academic,
    Financial,
    Administrative,
    #[default]
    #[serde(other)]
    System,
}

impl NotificationCategory {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Academic => "academic",
            Self::Financial => "financial",
            Self::Administrative => "administrative",
            Self::System => "system",
        }
    }
}

fn default_icon() -> String {
    "fa-info-circle".to_owned()
}

fn default_color() -> String {
    "blue".to_owned()
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Notification {
    pub id: RowId,
    #[serde(default)]
    pub category: NotificationCategory,
    pub title: String,
    pub message: String,
    #[serde(alias = "created_at")]
    pub timestamp: DateTime<Utc>,
    #[serde(default)]
    pub read: bool,
    #[serde(default = "default_icon")]
    pub icon: String,
    #[serde(default = "default_color")]
    pub color: String,
    #[serde(default, alias = "action_url")]
    pub action_url: Option<String>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SearchKind {
    Student,
    Teacher,
    Page,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SearchHit {
    pub id: String,
    #[serde(rename = "type")]
    pub kind: SearchKind,
    pub name: String,
    pub description: String,
    pub url: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AttendanceStats {
    pub total: u64,
    pub present: u64,
    pub absent: u64,
    /// Rounded to a whole percent; 0 when there are no records.
    pub percentage: u32,
    pub date: NaiveDate,
}

impl AttendanceStats {
    pub fn from_statuses(date: NaiveDate, statuses: impl IntoIterator<Item = AttendanceStatus>) -> Self {
        let summary = ClassAttendance::from_statuses(statuses);
        let percentage = if summary.total > 0 {
            (summary.present as f64 / summary.total as f64 * 100.0).round() as u32
        } else {
            0
        };

        Self {
            total: summary.total,
            present: summary.present,
            absent: summary.absent,
            percentage,
            date,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Period {
    Week,
    #[default]
    Month,
    Year,
}

impl Period {
    /// First day counted for a period ending `today`.
    pub fn start_from(self, today: NaiveDate) -> NaiveDate {
        let start = match self {
            Self::Week => today.checked_sub_days(chrono::Days::new(7)),
            Self::Month => today.checked_sub_months(Months::new(1)),
            Self::Year => today.checked_sub_months(Months::new(12)),
        };
        start.unwrap_or(NaiveDate::MIN)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Revenue {
    pub amount: f64,
    pub formatted: String,
    pub period: Period,
    /// Number of paid fees summed; absent on mock data.
    pub count: Option<usize>,
    /// Change against the previous period; only mock data carries one.
    pub trend: Option<String>,
}

/// Only the columns summed for revenue.
#[derive(Debug, Deserialize)]
pub(crate) struct PaidAmountRow {
    pub amount: Option<f64>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Activity {
    pub id: RowId,
    #[serde(rename = "type")]
    pub kind: String,
    pub title: String,
    pub description: Option<String>,
    /// Pre-rendered relative time, when the source provides one.
    pub time: Option<String>,
    pub icon: Option<String>,
    pub color: Option<String>,
    #[serde(alias = "created_at")]
    pub timestamp: Option<DateTime<Utc>>,
}

/// Rupee amount in lakhs (`₹2.4L`), thousands (`₹15.0K`) or plain.
pub fn format_currency(amount: f64) -> String {
    if amount >= 100_000.0 {
        format!("₹{:.1}L", amount / 100_000.0)
    } else if amount >= 1_000.0 {
        format!("₹{:.1}K", amount / 1_000.0)
    } else {
        format!("₹{amount}")
    }
}
