//! Data layer behaviour when the backend is missing or failing.
//!
//! Run with: `cargo test --features mocks --test resilience`

#![cfg(feature = "mocks")]
#![allow(clippy::unwrap_used, clippy::expect_used)]

use std::sync::Arc;

use campusgate::backend::{RemoteError, tables};
use campusgate::data::{
    FeePayment, GENERIC_MESSAGE, Homework, MarksEntry, NETWORK_MESSAGE, NewChatMessage,
    NewLeaveApplication, Period, RowId, SESSION_EXPIRED_MESSAGE, TIMEOUT_MESSAGE,
};
use campusgate::testing::{ManualClock, MockTableClient, RecordedCall, RecordingListener};
use campusgate::{
    BackendConfig, DataService, ErrorInfo, EventRegistry, Outcome, PortalEvent, QueryResult,
};
use chrono::NaiveDate;
use mockable::Clock;

struct Harness {
    data: DataService,
    client: Arc<MockTableClient>,
    listener: RecordingListener,
}

fn harness(config: &BackendConfig) -> Harness {
    let client = Arc::new(MockTableClient::new());
    let listener = RecordingListener::new();
    let mut registry = EventRegistry::new();
    registry.listen(listener.clone());

    let data = DataService::new(
        config,
        client.clone(),
        Arc::new(registry),
        Arc::new(ManualClock::default()),
    );
    Harness {
        data,
        client,
        listener,
    }
}

fn configured() -> Harness {
    harness(&BackendConfig::new("https://abc.supabase.co", "anon-key"))
}

fn date(y: i32, m: u32, d: u32) -> NaiveDate {
    NaiveDate::from_ymd_opt(y, m, d).unwrap()
}

fn assert_degraded<T>(result: &QueryResult<T>) {
    assert!(result.success);
    assert!(result.is_mock);
    assert!(result.error.is_none());
    assert_eq!(result.outcome(), Outcome::DegradedMock);
}

fn assert_failed<T: std::fmt::Debug>(result: &QueryResult<T>) -> &ErrorInfo {
    assert!(!result.success);
    assert!(!result.is_mock);
    assert!(result.data.is_none(), "no mock data on failed writes: {:?}", result.data);
    assert_eq!(result.outcome(), Outcome::Failure);
    result.error.as_ref().unwrap()
}

#[tokio::test]
async fn test_placeholder_config_serves_mock_student() {
    let h = harness(&BackendConfig::default());

    let result = h.data.get_student("S1").await;

    assert!(result.success);
    assert!(result.is_mock);
    assert!(result.is_demo());
    assert_eq!(result.data.unwrap().id, RowId::from("mock-student-1"));
    assert!(h.client.calls().is_empty());
}

#[tokio::test]
async fn test_every_read_degrades_to_non_empty_mock() {
    let h = configured();
    h.client.fail_all(RemoteError::network("connection refused"));
    let d = &h.data;

    let r = d.get_student("S1").await;
    assert_degraded(&r);
    let r = d.get_parent("P1").await;
    assert_degraded(&r);
    let r = d.get_teacher("T1").await;
    assert_degraded(&r);
    let r = d.get_attendance_summary("S1").await;
    assert_degraded(&r);
    let r = d.get_teacher_class_attendance("T1").await;
    assert_degraded(&r);
    let r = d.get_attendance_stats(None).await;
    assert_degraded(&r);
    let r = d.get_revenue(Period::Year).await;
    assert_degraded(&r);

    let r = d.get_students_count().await;
    assert_degraded(&r);
    assert_eq!(r.data, Some(1245));
    let r = d.get_teachers_count().await;
    assert_degraded(&r);
    assert_eq!(r.data, Some(85));

    macro_rules! non_empty_list {
        ($call:expr) => {{
            let r = $call.await;
            assert_degraded(&r);
            assert!(!r.data.as_ref().unwrap().is_empty(), "{}", stringify!($call));
        }};
    }

    non_empty_list!(d.get_fees_by_student("S1"));
    non_empty_list!(d.get_attendance_by_student("S1", None));
    non_empty_list!(d.get_exams_by_student("S1"));
    non_empty_list!(d.get_upcoming_exams("S1", None));
    non_empty_list!(d.get_timetable("S1", Some(date(2026, 3, 2))));
    non_empty_list!(d.get_documents_by_student("S1"));
    non_empty_list!(d.get_leaves_by_student("S1"));
    non_empty_list!(d.get_chat_messages("S1", None));
    non_empty_list!(d.get_communications("S1"));
    non_empty_list!(d.get_notifications(None));
    non_empty_list!(d.get_recent_activities(None));
    non_empty_list!(d.search_global("rishu"));

    // reads never surface errors to users
    assert!(h.listener.events().iter().all(|e| !e.is_user_visible()));
    assert!(h.listener.names().iter().all(|name| *name == "data.degraded"));
}

#[tokio::test]
async fn test_degraded_payload_is_deterministic() {
    let h = configured();
    h.client.fail_table(tables::FEES, RemoteError::timeout("operation timed out"));

    let first = h.data.get_fees_by_student("S1").await.data.unwrap();
    let second = h.data.get_fees_by_student("S1").await.data.unwrap();

    assert_eq!(first, second);
}

#[tokio::test]
async fn test_degraded_read_keeps_diagnostic() {
    let h = configured();
    h.client.fail_table(tables::STUDENTS, RemoteError::status(401, "JWT expired"));

    let result = h.data.get_student("S1").await;

    assert!(!result.is_demo());
    assert_eq!(result.diagnostic.as_deref(), Some("status 401: JWT expired"));
    let Some(PortalEvent::DataDegraded { action, .. }) = h.listener.events().pop() else {
        panic!("expected a data.degraded event");
    };
    assert_eq!(action, "Loading student data");
}

#[tokio::test]
async fn test_every_write_fails_with_sanitized_error() {
    let h = configured();
    h.client.fail_all(RemoteError::network("connection refused: tcp connect error"));
    let d = &h.data;

    let r = d
        .submit_fee_payment(
            "F1",
            FeePayment {
                payment_method: "upi".to_owned(),
                transaction_id: Some("TXN123".to_owned()),
            },
        )
        .await;
    assert_eq!(assert_failed(&r).message, NETWORK_MESSAGE);

    let r = d
        .submit_leave_application(NewLeaveApplication {
            student_id: RowId::from("S1"),
            leave_type: Some("sick".to_owned()),
            start_date: date(2026, 3, 3),
            end_date: date(2026, 3, 4),
            reason: "Fever".to_owned(),
        })
        .await;
    assert_eq!(assert_failed(&r).message, NETWORK_MESSAGE);

    let r = d
        .send_chat_message(NewChatMessage {
            student_id: RowId::from("S1"),
            sender_name: None,
            message: "Will be absent tomorrow".to_owned(),
        })
        .await;
    assert_eq!(assert_failed(&r).message, NETWORK_MESSAGE);

    let r = d
        .submit_homework(Homework {
            teacher_id: RowId::from("T1"),
            class: "8B".to_owned(),
            subject: "Mathematics".to_owned(),
            title: "Chapter 4 exercises".to_owned(),
            description: None,
            due_date: date(2026, 3, 6),
        })
        .await;
    assert_eq!(assert_failed(&r).message, NETWORK_MESSAGE);

    let r = d
        .submit_marks(MarksEntry {
            teacher_id: RowId::from("T1"),
            student_id: RowId::from("S1"),
            exam_id: None,
            subject: "Physics".to_owned(),
            marks_obtained: 78.0,
            max_marks: 100.0,
        })
        .await;
    let error = assert_failed(&r);
    assert_eq!(error.message, NETWORK_MESSAGE);
    assert_eq!(error.title, "Error: Submitting marks");

    let failures = h
        .listener
        .events()
        .into_iter()
        .filter(|e| matches!(e, PortalEvent::OperationFailed { .. }))
        .count();
    assert_eq!(failures, 5);
}

#[tokio::test]
async fn test_write_error_messages_by_kind() {
    let h = configured();
    let payment = || FeePayment {
        payment_method: "card".to_owned(),
        transaction_id: None,
    };

    h.client.fail_all(RemoteError::status(401, "JWT expired"));
    let r = h.data.submit_fee_payment("F1", payment()).await;
    assert_eq!(assert_failed(&r).message, SESSION_EXPIRED_MESSAGE);

    h.client.fail_all(RemoteError::timeout("operation timed out"));
    let r = h.data.submit_fee_payment("F1", payment()).await;
    assert_eq!(assert_failed(&r).message, TIMEOUT_MESSAGE);

    h.client.fail_all(RemoteError::status(500, "duplicate key value violates unique constraint"));
    let r = h.data.submit_fee_payment("F1", payment()).await;
    let error = assert_failed(&r);
    assert_eq!(error.message, GENERIC_MESSAGE);
    assert!(!error.message.contains("duplicate key"));
}

#[tokio::test]
async fn test_demo_writes_echo_without_backend() {
    let h = harness(&BackendConfig::default());

    let r = h
        .data
        .submit_marks(MarksEntry {
            teacher_id: RowId::from("T1"),
            student_id: RowId::from("S1"),
            exam_id: Some(RowId::Number(3)),
            subject: "Chemistry".to_owned(),
            marks_obtained: 64.5,
            max_marks: 80.0,
        })
        .await;

    assert_eq!(r.outcome(), Outcome::DegradedMock);
    assert!(r.is_demo());
    assert_eq!(r.data.unwrap()[0].subject, "Chemistry");
    assert!(h.client.calls().is_empty());
}

#[tokio::test]
async fn test_filters_pass_through_unmodified() {
    let h = configured();

    h.data.get_upcoming_exams("S42", Some(3)).await;

    let calls = h.client.calls();
    let RecordedCall::Select(query) = &calls[0] else {
        panic!("expected a select");
    };
    assert_eq!(query.table, tables::EXAMS);
    assert_eq!(query.filters[0].value, "S42");
    let today = ManualClock::default().local().date_naive();
    assert_eq!(query.filters[1].value, today.to_string());
    assert_eq!(query.limit, Some(3));
}
