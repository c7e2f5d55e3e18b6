//! Deterministic payloads served in demo mode and after failed reads.
//!
//! Relative timestamps are computed from the injected clock, so two calls at
//! the same instant produce identical data.

use chrono::{DateTime, Duration, NaiveDate, Utc};

use super::models::*;

const STUDENT_PHOTO: &str = "https://ui-avatars.com/api/?name=Rishu+Kumar&background=random&size=200";
const TEACHER_PHOTO: &str = "https://ui-avatars.com/api/?name=Priya+Singh&background=random&size=200";

fn date(y: i32, m: u32, d: u32) -> NaiveDate {
    NaiveDate::from_ymd_opt(y, m, d).unwrap_or_default()
}

fn text(value: &str) -> Option<String> {
    Some(value.to_owned())
}

pub(crate) fn student() -> Student {
    Student {
        id: "mock-student-1".into(),
        name: "Rishu Kumar".to_owned(),
        roll_number: Some(25),
        class: text("12th"),
        stream: text("Science"),
        attendance_percentage: Some(88.0),
        percentile: Some(87.0),
        rank: Some(12),
        photo_url: text(STUDENT_PHOTO),
    }
}

pub(crate) fn parent() -> Parent {
    Parent {
        id: "mock-parent-1".into(),
        name: "Anil Kumar".to_owned(),
        phone: text("+91-98765-11111"),
        email: text("anil.kumar@example.com"),
        student_id: Some("mock-student-1".into()),
        relation: text("Father"),
    }
}

pub(crate) fn teacher() -> Teacher {
    Teacher {
        id: "mock-teacher-1".into(),
        name: "Mrs. Priya Singh".to_owned(),
        email: text("priya.singh@school.edu"),
        phone: text("+91-98765-43210"),
        department: text("Mathematics & Science"),
        experience_years: Some(12),
        rating: Some(4.8),
        total_students: Some(158),
        classes_assigned: Some(4),
        photo_url: text(TEACHER_PHOTO),
    }
}

pub(crate) fn fees() -> Vec<Fee> {
    vec![
        Fee {
            id: RowId::Number(1),
            student_id: None,
            month: text("March 2026"),
            amount: 8500.0,
            status: FeeStatus::Pending,
            due_date: Some(date(2026, 3, 30)),
            payment_date: None,
            payment_method: None,
            transaction_id: None,
        },
        Fee {
            id: RowId::Number(2),
            student_id: None,
            month: text("February 2026"),
            amount: 8500.0,
            status: FeeStatus::Paid,
            due_date: Some(date(2026, 2, 28)),
            payment_date: Some(date(2026, 2, 20)),
            payment_method: None,
            transaction_id: None,
        },
    ]
}

pub(crate) fn attendance_records(today: NaiveDate) -> Vec<AttendanceRecord> {
    let statuses = [
        AttendanceStatus::Present,
        AttendanceStatus::Present,
        AttendanceStatus::Absent,
        AttendanceStatus::Present,
        AttendanceStatus::Leave,
    ];

    statuses
        .into_iter()
        .enumerate()
        .map(|(offset, status)| AttendanceRecord {
            id: Some(RowId::Number(offset as i64 + 1)),
            student_id: Some("mock-student-1".into()),
            date: today - Duration::days(offset as i64),
            status,
            remarks: (status == AttendanceStatus::Leave).then(|| "Family function".to_owned()),
        })
        .collect()
}

pub(crate) fn attendance_summary() -> AttendanceSummary {
    AttendanceSummary {
        total: 100,
        present: 88,
        absent: 8,
        leave: 4,
        percentage: "88.00".to_owned(),
    }
}

pub(crate) fn class_attendance() -> ClassAttendance {
    ClassAttendance {
        present: 92,
        absent: 8,
        total: 100,
    }
}

pub(crate) fn exams() -> Vec<Exam> {
    let exam = |id: i64, name: &str, exam_date: NaiveDate, status: &str| Exam {
        id: id.into(),
        student_id: None,
        name: name.to_owned(),
        exam_date,
        status: text(status),
    };

    vec![
        exam(1, "Mathematics", date(2026, 1, 14), "upcoming"),
        exam(2, "Physics", date(2026, 1, 12), "completed"),
        exam(3, "Chemistry", date(2026, 1, 16), "upcoming"),
    ]
}

pub(crate) fn timetable(day: Option<NaiveDate>) -> Vec<TimetableEntry> {
    let slot = |id: i64, subject: &str, teacher: &str, start: &str, end: &str, room: &str| TimetableEntry {
        id: id.into(),
        student_id: Some("mock-student-1".into()),
        subject: subject.to_owned(),
        teacher_name: text(teacher),
        date: day,
        class_start_time: start.to_owned(),
        class_end_time: text(end),
        room: text(room),
    };

    vec![
        slot(1, "Mathematics", "Mrs. Priya Singh", "09:00", "09:45", "Room 12"),
        slot(2, "Physics", "Mr. Arjun Mehta", "09:50", "10:35", "Lab 2"),
        slot(3, "Chemistry", "Dr. Kavita Rao", "10:50", "11:35", "Lab 1"),
        slot(4, "English", "Ms. Neha Verma", "11:40", "12:25", "Room 12"),
    ]
}

pub(crate) fn documents(now: DateTime<Utc>) -> Vec<Document> {
    vec![
        Document {
            id: RowId::Number(1),
            student_id: Some("mock-student-1".into()),
            title: "Report Card - Term 1".to_owned(),
            category: text("academic"),
            file_url: None,
            created_at: now - Duration::days(30),
        },
        Document {
            id: RowId::Number(2),
            student_id: Some("mock-student-1".into()),
            title: "Fee Receipt - February 2026".to_owned(),
            category: text("financial"),
            file_url: None,
            created_at: now - Duration::days(40),
        },
    ]
}

pub(crate) fn leaves(today: NaiveDate) -> Vec<LeaveApplication> {
    vec![LeaveApplication {
        id: Some(RowId::Number(1)),
        student_id: "mock-student-1".into(),
        leave_type: text("sick"),
        start_date: today - Duration::days(10),
        end_date: today - Duration::days(9),
        reason: "Fever".to_owned(),
        status: text("approved"),
    }]
}

pub(crate) fn leave_echo(application: &NewLeaveApplication) -> LeaveApplication {
    LeaveApplication {
        id: None,
        student_id: application.student_id.clone(),
        leave_type: application.leave_type.clone(),
        start_date: application.start_date,
        end_date: application.end_date,
        reason: application.reason.clone(),
        status: text("pending"),
    }
}

/// Oldest first.
pub(crate) fn chat_messages(now: DateTime<Utc>) -> Vec<ChatMessage> {
    let message = |id: i64, sender_type: &str, sender: &str, body: &str, minutes_ago: i64| ChatMessage {
        id: Some(id.into()),
        student_id: "mock-student-1".into(),
        sender_type: sender_type.to_owned(),
        sender_name: text(sender),
        message: body.to_owned(),
        created_at: now - Duration::minutes(minutes_ago),
    };

    vec![
        message(1, "teacher", "Mrs. Priya Singh", "Rishu did well in today's maths test.", 90),
        message(2, "parent", "Anil Kumar", "Thank you for the update!", 60),
    ]
}

pub(crate) fn chat_echo(message: &NewChatMessage, now: DateTime<Utc>) -> ChatMessage {
    ChatMessage {
        id: None,
        student_id: message.student_id.clone(),
        sender_type: "parent".to_owned(),
        sender_name: message.sender_name.clone(),
        message: message.message.clone(),
        created_at: now,
    }
}

pub(crate) fn communications(now: DateTime<Utc>) -> Vec<Communication> {
    vec![Communication {
        id: RowId::Number(1),
        student_id: None,
        title: "Parent-Teacher Meeting".to_owned(),
        message: "PTM for all classes is scheduled for Saturday at 10 AM.".to_owned(),
        sender: text("School Office"),
        created_at: now - Duration::days(2),
    }]
}

pub(crate) fn students_count() -> u64 {
    1245
}

pub(crate) fn teachers_count() -> u64 {
    85
}

pub(crate) fn attendance_stats(date: NaiveDate) -> AttendanceStats {
    AttendanceStats {
        total: 1245,
        present: 1145,
        absent: 100,
        percentage: 92,
        date,
    }
}

pub(crate) fn revenue(period: Period) -> Revenue {
    Revenue {
        amount: 240_000.0,
        formatted: "₹2.4L".to_owned(),
        period,
        count: None,
        trend: text("+8%"),
    }
}

pub(crate) fn activities(now: DateTime<Utc>) -> Vec<Activity> {
    let activity = |id: i64, kind: &str, title: &str, description: &str, hours: i64, icon: &str, color: &str| {
        Activity {
            id: id.into(),
            kind: kind.to_owned(),
            title: title.to_owned(),
            description: text(description),
            time: Some(format!("{hours} hour{} ago", if hours == 1 { "" } else { "s" })),
            icon: text(icon),
            color: text(color),
            timestamp: Some(now - Duration::hours(hours)),
        }
    };

    vec![
        activity(1, "student", "New Student Admitted", "Rahul Sharma - Class 5A", 1, "fa-user-plus", "green"),
        activity(2, "teacher", "Teacher Assigned", "Mrs. Priya Singh assigned to Class 8B", 3, "fa-chalkboard-teacher", "blue"),
        activity(3, "finance", "Fee Payment Received", "₹15,000 from 3 parents", 5, "fa-rupee-sign", "yellow"),
    ]
}

pub(crate) fn notifications(now: DateTime<Utc>) -> Vec<Notification> {
    let notification = |id: &str,
                        category: NotificationCategory,
                        title: &str,
                        message: &str,
                        age: Duration,
                        read: bool,
                        icon: &str,
                        color: &str,
                        action_url: Option<&str>| Notification {
        id: id.into(),
        category,
        title: title.to_owned(),
        message: message.to_owned(),
        timestamp: now - age,
        read,
        icon: icon.to_owned(),
        color: color.to_owned(),
        action_url: action_url.map(str::to_owned),
    };

    vec![
        notification(
            "N001",
            NotificationCategory::Academic,
            "Exam Schedule Released",
            "Mid-term exam schedule for Class 12th is now available",
            Duration::hours(1),
            false,
            "fa-calendar-check",
            "blue",
            Some("4 P-S_View/exam.html"),
        ),
        notification(
            "N002",
            NotificationCategory::Financial,
            "Fee Payment Due",
            "December tuition fee payment is pending. Due date: 15th Jan",
            Duration::hours(2),
            false,
            "fa-rupee-sign",
            "yellow",
            Some("4 P-S_View/finance.html"),
        ),
        notification(
            "N003",
            NotificationCategory::Administrative,
            "Annual Sports Meet",
            "Registration open for inter-school sports meet. Submit names by Friday",
            Duration::days(1),
            true,
            "fa-bullhorn",
            "purple",
            None,
        ),
        notification(
            "N004",
            NotificationCategory::Academic,
            "Homework Submitted",
            "Your Mathematics homework has been submitted successfully",
            Duration::days(2),
            true,
            "fa-check-circle",
            "green",
            None,
        ),
        notification(
            "N005",
            NotificationCategory::System,
            "Profile Updated",
            "Your profile information has been updated",
            Duration::days(3),
            true,
            "fa-user",
            "gray",
            Some("4 P-S_View/profile.html"),
        ),
    ]
}

fn search_catalogue() -> Vec<SearchHit> {
    let hit = |id: &str, kind: SearchKind, name: &str, description: &str, url: &str| SearchHit {
        id: id.to_owned(),
        kind,
        name: name.to_owned(),
        description: description.to_owned(),
        url: url.to_owned(),
    };

    vec![
        hit("S001", SearchKind::Student, "Rishu Kumar", "12th Science", "../4 P-S_View/index.html"),
        hit("S002", SearchKind::Student, "Rahul Sharma", "Class 5A", "../4 P-S_View/index.html"),
        hit("T001", SearchKind::Teacher, "Mrs. Priya Singh", "Mathematics", "../3 Teacher-View/dashboard.html"),
        hit("P001", SearchKind::Page, "Dashboard", "Go to Dashboard", "../index.html"),
        hit("P002", SearchKind::Page, "Fee Payment", "Pay School Fees", "../4 P-S_View/fees.html"),
    ]
}

/// Catalogue entries whose name or description contains `query`, ignoring case.
pub(crate) fn search_results(query: &str) -> Vec<SearchHit> {
    let needle = query.to_lowercase();
    search_catalogue()
        .into_iter()
        .filter(|hit| {
            hit.name.to_lowercase().contains(&needle) || hit.description.to_lowercase().contains(&needle)
        })
        .collect()
}
