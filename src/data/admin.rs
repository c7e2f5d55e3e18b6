//! School-admin dashboard figures.

use chrono::NaiveDate;

use super::models::{Activity, AttendanceStats, PaidAmountRow, Period, Revenue, StatusRow, format_currency};
use super::{DataService, QueryResult, decode_rows, fixtures};
use crate::backend::{RemoteError, TableQuery, tables};

pub const DEFAULT_ACTIVITY_LIMIT: usize = 10;

impl DataService {
    #[cfg_attr(
        feature = "tracing",
        tracing::instrument(name = "get_students_count", skip_all)
    )]
    pub async fn get_students_count(&self) -> QueryResult<u64> {
        let query = TableQuery::from(tables::STUDENTS);
        self.read("Counting students", fixtures::students_count, move |client| async move {
            client.count(&query).await
        })
        .await
    }

    #[cfg_attr(
        feature = "tracing",
        tracing::instrument(name = "get_teachers_count", skip_all)
    )]
    pub async fn get_teachers_count(&self) -> QueryResult<u64> {
        let query = TableQuery::from(tables::TEACHERS);
        self.read("Counting teachers", fixtures::teachers_count, move |client| async move {
            client.count(&query).await
        })
        .await
    }

    /// School-wide attendance for `date`, today (UTC) when omitted.
    #[cfg_attr(
        feature = "tracing",
        tracing::instrument(name = "get_attendance_stats", skip_all)
    )]
    pub async fn get_attendance_stats(&self, date: Option<NaiveDate>) -> QueryResult<AttendanceStats> {
        let date = date.unwrap_or_else(|| self.now().date_naive());
        let query = TableQuery::from(tables::ATTENDANCE)
            .select("status")
            .eq("date", date);

        self.read(
            "Loading attendance stats",
            || fixtures::attendance_stats(date),
            move |client| async move {
                let rows: Vec<StatusRow> = decode_rows(client.select(&query).await?)?;
                Ok::<_, RemoteError>(AttendanceStats::from_statuses(
                    date,
                    rows.into_iter().map(|r| r.status),
                ))
            },
        )
        .await
    }

    /// Paid fees since the start of `period`.
    #[cfg_attr(
        feature = "tracing",
        tracing::instrument(name = "get_revenue", skip_all, fields(period = ?period))
    )]
    pub async fn get_revenue(&self, period: Period) -> QueryResult<Revenue> {
        let since = period.start_from(self.now().date_naive());
        let query = TableQuery::from(tables::FEES)
            .select("amount, payment_date")
            .eq("status", "paid")
            .gte("payment_date", since);

        self.read(
            "Loading revenue",
            || fixtures::revenue(period),
            move |client| async move {
                let rows: Vec<PaidAmountRow> = decode_rows(client.select(&query).await?)?;
                let amount: f64 = rows.iter().filter_map(|r| r.amount).sum();
                Ok::<_, RemoteError>(Revenue {
                    amount,
                    formatted: format_currency(amount),
                    period,
                    count: Some(rows.len()),
                    trend: None,
                })
            },
        )
        .await
    }

    /// Newest first, at most `limit` (default 10).
    #[cfg_attr(
        feature = "tracing",
        tracing::instrument(name = "get_recent_activities", skip_all)
    )]
    pub async fn get_recent_activities(&self, limit: Option<usize>) -> QueryResult<Vec<Activity>> {
        let limit = limit.unwrap_or(DEFAULT_ACTIVITY_LIMIT);
        let query = TableQuery::from(tables::ACTIVITY_LOGS)
            .order("created_at", false)
            .limit(limit);
        let now = self.now();

        self.read(
            "Loading recent activities",
            || {
                let mut activities = fixtures::activities(now);
                activities.truncate(limit);
                activities
            },
            move |client| async move { decode_rows(client.select(&query).await?) },
        )
        .await
    }
}

#[cfg(test)]
mod tests {
    use mockable::Clock;
    use serde_json::json;

    use super::*;
    use crate::backend::RecordedCall;
    use crate::data::test_support::{demo, harness};

    #[tokio::test]
    async fn test_counts() {
        let h = harness();
        h.client.seed(tables::STUDENTS, vec![json!({"id": 1}), json!({"id": 2})]);

        assert_eq!(h.data.get_students_count().await.data, Some(2));
        assert_eq!(h.data.get_teachers_count().await.data, Some(0));

        h.client.fail_table(tables::TEACHERS, RemoteError::timeout("deadline"));
        let degraded = h.data.get_teachers_count().await;
        assert!(degraded.is_mock);
        assert_eq!(degraded.data, Some(85));
    }

    #[tokio::test]
    async fn test_attendance_stats_default_to_today() {
        let h = harness();
        let today = h.clock.utc().date_naive().to_string();
        h.client.seed(
            tables::ATTENDANCE,
            vec![
                json!({"date": today, "status": "present"}),
                json!({"date": today, "status": "present"}),
                json!({"date": today, "status": "absent"}),
                json!({"date": "2026-01-01", "status": "absent"}),
            ],
        );

        let stats = h.data.get_attendance_stats(None).await.data.unwrap();

        assert_eq!(stats.total, 3);
        assert_eq!(stats.percentage, 67);
        assert_eq!(stats.date, h.clock.utc().date_naive());
    }

    #[tokio::test]
    async fn test_revenue_sums_paid_fees_in_period() {
        let h = harness();
        h.client.seed(
            tables::FEES,
            vec![
                json!({"amount": 8500.0, "status": "paid", "payment_date": "2026-02-20"}),
                json!({"amount": 91500.0, "status": "paid", "payment_date": "2026-02-25"}),
                json!({"amount": 8500.0, "status": "pending", "payment_date": null}),
                json!({"amount": 50000.0, "status": "paid", "payment_date": "2025-12-01"}),
            ],
        );

        let revenue = h.data.get_revenue(Period::Month).await.data.unwrap();

        assert_eq!(revenue.amount, 100_000.0);
        assert_eq!(revenue.formatted, "₹1.0L");
        assert_eq!(revenue.count, Some(2));
        assert_eq!(revenue.trend, None);

        let RecordedCall::Select(query) = &h.client.calls()[0] else {
            panic!("expected a select");
        };
        assert_eq!(query.filters[1].value, "2026-02-02");
    }

    #[tokio::test]
    async fn test_mock_revenue_keeps_period() {
        let (data, _) = demo();

        let revenue = data.get_revenue(Period::Year).await.data.unwrap();
        assert_eq!(revenue.formatted, "₹2.4L");
        assert_eq!(revenue.period, Period::Year);
        assert_eq!(revenue.trend.as_deref(), Some("+8%"));
    }

    #[tokio::test]
    async fn test_mock_activities_are_relative_to_now() {
        let (data, _) = demo();

        let activities = data.get_recent_activities(Some(2)).await.data.unwrap();

        assert_eq!(activities.len(), 2);
        assert_eq!(activities[0].title, "New Student Admitted");
        assert_eq!(activities[1].time.as_deref(), Some("3 hours ago"));
    }
}
