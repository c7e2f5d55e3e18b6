//! Parent/student portal reads and writes.

use serde_json::Value;

use super::models::{
    AttendanceRecord, AttendanceSummary, ChatMessage, Communication, DateRange, Document, Exam, Fee,
    FeePayment, FeeStatus, LeaveApplication, NewChatMessage, NewLeaveApplication, Parent, StatusRow,
    Student, TimetableEntry,
};
use super::{DataService, QueryResult, decode_rows, decode_single, fixtures, to_row};
use crate::backend::{RemoteError, TableQuery, tables};

pub const DEFAULT_UPCOMING_EXAMS: usize = 5;
pub const DEFAULT_CHAT_LIMIT: usize = 50;

impl DataService {
    #[cfg_attr(
        feature = "tracing",
        tracing::instrument(name = "get_student", skip_all)
    )]
    pub async fn get_student(&self, student_id: &str) -> QueryResult<Student> {
        let query = TableQuery::from(tables::STUDENTS).eq("id", student_id).single();
        self.read("Loading student data", fixtures::student, move |client| async move {
            decode_single(client.select(&query).await?, tables::STUDENTS)
        })
        .await
    }

    #[cfg_attr(
        feature = "tracing",
        tracing::instrument(name = "get_parent", skip_all)
    )]
    pub async fn get_parent(&self, parent_id: &str) -> QueryResult<Parent> {
        let query = TableQuery::from(tables::PARENTS).eq("id", parent_id).single();
        self.read("Loading parent data", fixtures::parent, move |client| async move {
            decode_single(client.select(&query).await?, tables::PARENTS)
        })
        .await
    }

    /// Most recent due date first.
    #[cfg_attr(
        feature = "tracing",
        tracing::instrument(name = "get_fees_by_student", skip_all)
    )]
    pub async fn get_fees_by_student(&self, student_id: &str) -> QueryResult<Vec<Fee>> {
        let query = TableQuery::from(tables::FEES)
            .eq("student_id", student_id)
            .order("due_date", false);
        self.read("Loading fees", fixtures::fees, move |client| async move {
            decode_rows(client.select(&query).await?)
        })
        .await
    }

    /// Marks a fee paid, dated today.
    #[cfg_attr(
        feature = "tracing",
        tracing::instrument(name = "submit_fee_payment", skip_all)
    )]
    pub async fn submit_fee_payment(&self, fee_id: &str, payment: FeePayment) -> QueryResult<Vec<Fee>> {
        let today = self.now().date_naive();
        let query = TableQuery::from(tables::FEES).eq("id", fee_id);

        let demo = || {
            fixtures::fees()
                .into_iter()
                .filter(|fee| fee.id.to_string() == fee_id)
                .map(|fee| Fee {
                    status: FeeStatus::Paid,
                    payment_date: Some(today),
                    payment_method: Some(payment.payment_method.clone()),
                    transaction_id: payment.transaction_id.clone(),
                    ..fee
                })
                .collect()
        };

        let patch = payment_patch(&payment, today);
        self.write("Processing fee payment", demo, move |client| async move {
            decode_rows(client.update(&query, patch?).await?)
        })
        .await
    }

    /// Newest first, optionally limited to `range` (inclusive).
    #[cfg_attr(
        feature = "tracing",
        tracing::instrument(name = "get_attendance_by_student", skip_all)
    )]
    pub async fn get_attendance_by_student(
        &self,
        student_id: &str,
        range: Option<DateRange>,
    ) -> QueryResult<Vec<AttendanceRecord>> {
        let mut query = TableQuery::from(tables::ATTENDANCE)
            .eq("student_id", student_id)
            .order("date", false);
        if let Some(range) = range {
            query = query.gte("date", range.start).lte("date", range.end);
        }

        let today = self.now().date_naive();
        self.read(
            "Loading attendance data",
            || fixtures::attendance_records(today),
            move |client| async move { decode_rows(client.select(&query).await?) },
        )
        .await
    }

    #[cfg_attr(
        feature = "tracing",
        tracing::instrument(name = "get_attendance_summary", skip_all)
    )]
    pub async fn get_attendance_summary(&self, student_id: &str) -> QueryResult<AttendanceSummary> {
        let query = TableQuery::from(tables::ATTENDANCE)
            .select("status")
            .eq("student_id", student_id);
        self.read(
            "Loading attendance summary",
            fixtures::attendance_summary,
            move |client| async move {
                let rows: Vec<StatusRow> = decode_rows(client.select(&query).await?)?;
                Ok::<_, RemoteError>(AttendanceSummary::from_statuses(
                    rows.into_iter().map(|r| r.status),
                ))
            },
        )
        .await
    }

    /// Earliest first.
    #[cfg_attr(
        feature = "tracing",
        tracing::instrument(name = "get_exams_by_student", skip_all)
    )]
    pub async fn get_exams_by_student(&self, student_id: &str) -> QueryResult<Vec<Exam>> {
        let query = TableQuery::from(tables::EXAMS)
            .eq("student_id", student_id)
            .order("exam_date", true);
        self.read("Loading exam schedule", fixtures::exams, move |client| async move {
            decode_rows(client.select(&query).await?)
        })
        .await
    }

    /// Exams from today (local date) on, earliest first.
    #[cfg_attr(
        feature = "tracing",
        tracing::instrument(name = "get_upcoming_exams", skip_all)
    )]
    pub async fn get_upcoming_exams(&self, student_id: &str, limit: Option<usize>) -> QueryResult<Vec<Exam>> {
        let limit = limit.unwrap_or(DEFAULT_UPCOMING_EXAMS);
        let today = self.clock.local().date_naive();
        let query = TableQuery::from(tables::EXAMS)
            .eq("student_id", student_id)
            .gte("exam_date", today)
            .order("exam_date", true)
            .limit(limit);

        let mock = || {
            let mut exams: Vec<Exam> = fixtures::exams()
                .into_iter()
                .filter(|exam| exam.status.as_deref() == Some("upcoming"))
                .collect();
            exams.sort_by_key(|exam| exam.exam_date);
            exams.truncate(limit);
            exams
        };

        self.read("Loading upcoming exams", mock, move |client| async move {
            decode_rows(client.select(&query).await?)
        })
        .await
    }

    /// Ordered by start time, optionally for one day.
    #[cfg_attr(
        feature = "tracing",
        tracing::instrument(name = "get_timetable", skip_all)
    )]
    pub async fn get_timetable(
        &self,
        student_id: &str,
        date: Option<chrono::NaiveDate>,
    ) -> QueryResult<Vec<TimetableEntry>> {
        let mut query = TableQuery::from(tables::TIMETABLE)
            .eq("student_id", student_id)
            .order("class_start_time", true);
        if let Some(date) = date {
            query = query.eq("date", date);
        }

        self.read(
            "Loading timetable",
            || fixtures::timetable(date),
            move |client| async move { decode_rows(client.select(&query).await?) },
        )
        .await
    }

    #[cfg_attr(
        feature = "tracing",
        tracing::instrument(name = "get_documents_by_student", skip_all)
    )]
    pub async fn get_documents_by_student(&self, student_id: &str) -> QueryResult<Vec<Document>> {
        let query = TableQuery::from(tables::DOCUMENTS)
            .eq("student_id", student_id)
            .order("created_at", false);
        let now = self.now();
        self.read(
            "Loading documents",
            || fixtures::documents(now),
            move |client| async move { decode_rows(client.select(&query).await?) },
        )
        .await
    }

    #[cfg_attr(
        feature = "tracing",
        tracing::instrument(name = "get_leaves_by_student", skip_all)
    )]
    pub async fn get_leaves_by_student(&self, student_id: &str) -> QueryResult<Vec<LeaveApplication>> {
        let query = TableQuery::from(tables::LEAVES)
            .eq("student_id", student_id)
            .order("start_date", false);
        let today = self.now().date_naive();
        self.read(
            "Loading leave applications",
            || fixtures::leaves(today),
            move |client| async move { decode_rows(client.select(&query).await?) },
        )
        .await
    }

    #[cfg_attr(
        feature = "tracing",
        tracing::instrument(name = "submit_leave_application", skip_all)
    )]
    pub async fn submit_leave_application(
        &self,
        application: NewLeaveApplication,
    ) -> QueryResult<Vec<LeaveApplication>> {
        let row = to_row(&application);
        self.write(
            "Submitting leave application",
            || vec![fixtures::leave_echo(&application)],
            move |client| async move { decode_rows(client.insert(tables::LEAVES, vec![row?]).await?) },
        )
        .await
    }

    /// The latest `limit` messages (default 50), oldest first.
    #[cfg_attr(
        feature = "tracing",
        tracing::instrument(name = "get_chat_messages", skip_all)
    )]
    pub async fn get_chat_messages(
        &self,
        student_id: &str,
        limit: Option<usize>,
    ) -> QueryResult<Vec<ChatMessage>> {
        let query = TableQuery::from(tables::CHAT_MESSAGES)
            .eq("student_id", student_id)
            .order("created_at", false)
            .limit(limit.unwrap_or(DEFAULT_CHAT_LIMIT));
        let now = self.now();

        self.read(
            "Loading chat messages",
            || fixtures::chat_messages(now),
            move |client| async move {
                let mut messages: Vec<ChatMessage> = decode_rows(client.select(&query).await?)?;
                messages.reverse();
                Ok::<_, RemoteError>(messages)
            },
        )
        .await
    }

    /// Stores a parent's message, stamped now.
    #[cfg_attr(
        feature = "tracing",
        tracing::instrument(name = "send_chat_message", skip_all)
    )]
    pub async fn send_chat_message(&self, message: NewChatMessage) -> QueryResult<Vec<ChatMessage>> {
        let now = self.now();
        let row = chat_row(&message, now);
        self.write(
            "Sending message",
            || vec![fixtures::chat_echo(&message, now)],
            move |client| async move {
                decode_rows(client.insert(tables::CHAT_MESSAGES, vec![row?]).await?)
            },
        )
        .await
    }

    #[cfg_attr(
        feature = "tracing",
        tracing::instrument(name = "get_communications", skip_all)
    )]
    pub async fn get_communications(&self, student_id: &str) -> QueryResult<Vec<Communication>> {
        let query = TableQuery::from(tables::COMMUNICATIONS)
            .eq("student_id", student_id)
            .order("created_at", false);
        let now = self.now();
        self.read(
            "Loading communications",
            || fixtures::communications(now),
            move |client| async move { decode_rows(client.select(&query).await?) },
        )
        .await
    }
}

fn payment_patch(payment: &FeePayment, today: chrono::NaiveDate) -> Result<Value, RemoteError> {
    let mut patch = to_row(payment)?;
    if let Value::Object(fields) = &mut patch {
        fields.insert("status".to_owned(), Value::from("paid"));
        fields.insert("payment_date".to_owned(), Value::from(today.to_string()));
    }
    Ok(patch)
}

fn chat_row(message: &NewChatMessage, now: chrono::DateTime<chrono::Utc>) -> Result<Value, RemoteError> {
    let mut row = to_row(message)?;
    if let Value::Object(fields) = &mut row {
        fields.insert("created_at".to_owned(), Value::from(now.to_rfc3339()));
        fields.insert("sender_type".to_owned(), Value::from("parent"));
    }
    Ok(row)
}
