use super::models::Notification;
use super::{DataService, QueryResult, decode_rows, fixtures};
use crate::backend::{TableQuery, tables};

pub const DEFAULT_NOTIFICATION_LIMIT: usize = 20;

impl DataService {
    /// Newest first, at most `limit` (default 20).
    #[cfg_attr(
        feature = "tracing",
        tracing::instrument(name = "get_notifications", skip_all)
    )]
    pub async fn get_notifications(&self, limit: Option<usize>) -> QueryResult<Vec<Notification>> {
        let query = TableQuery::from(tables::NOTIFICATIONS)
            .order("created_at", false)
            .limit(limit.unwrap_or(DEFAULT_NOTIFICATION_LIMIT));
        let now = self.now();

        self.read(
            "Loading notifications",
            || fixtures::notifications(now),
            move |client| async move { decode_rows(client.select(&query).await?) },
        )
        .await
    }
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::*;
    use crate::data::models::{NotificationCategory, RowId};
    use crate::data::test_support::{demo, harness};

    #[tokio::test]
    async fn test_mock_notifications() {
        let (data, _) = demo();

        let notifications = data.get_notifications(None).await.data.unwrap();

        assert_eq!(notifications.len(), 5);
        assert_eq!(notifications.iter().filter(|n| !n.read).count(), 2);
        assert_eq!(notifications[0].id, RowId::from("N001"));
        assert_eq!(notifications[4].category, NotificationCategory::System);
    }

    #[tokio::test]
    async fn test_remote_notifications_newest_first() {
        let h = harness();
        h.client.seed(
            tables::NOTIFICATIONS,
            vec![
                json!({"id": 1, "title": "Old", "message": "m", "created_at": "2026-03-01T08:00:00Z"}),
                json!({"id": 2, "title": "New", "message": "m", "created_at": "2026-03-02T08:00:00Z", "category": "academic"}),
            ],
        );

        let notifications = h.data.get_notifications(Some(1)).await.data.unwrap();

        assert_eq!(notifications.len(), 1);
        assert_eq!(notifications[0].title, "New");
        assert_eq!(notifications[0].category, NotificationCategory::Academic);
    }
}
