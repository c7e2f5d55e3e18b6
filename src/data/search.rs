use super::models::{SearchHit, SearchKind, Student, Teacher};
use super::{DataService, QueryResult, decode_rows, fixtures};
use crate::backend::{RemoteError, TableQuery, tables};

const PER_KIND_LIMIT: usize = 5;

impl DataService {
    /// Students and teachers whose name contains `query`, ignoring case.
    ///
    /// The two tables are queried concurrently; if either fails the whole
    /// search falls back to the mock catalogue. A blank query returns no
    /// hits without touching the backend.
    #[cfg_attr(
        feature = "tracing",
        tracing::instrument(name = "search_global", skip_all)
    )]
    pub async fn search_global(&self, query: &str) -> QueryResult<Vec<SearchHit>> {
        let query = query.trim();
        if query.is_empty() {
            return QueryResult::success(Vec::new());
        }

        let students = TableQuery::from(tables::STUDENTS)
            .select("id, name, class, roll_number")
            .ilike_contains("name", query)
            .limit(PER_KIND_LIMIT);
        let teachers = TableQuery::from(tables::TEACHERS)
            .select("id, name, department")
            .ilike_contains("name", query)
            .limit(PER_KIND_LIMIT);

        self.read(
            "Searching",
            || fixtures::search_results(query),
            move |client| async move {
                let (students, teachers) = tokio::join!(client.select(&students), client.select(&teachers));
                let students: Vec<Student> = decode_rows(students?)?;
                let teachers: Vec<Teacher> = decode_rows(teachers?)?;

                let hits = students
                    .into_iter()
                    .map(student_hit)
                    .chain(teachers.into_iter().map(teacher_hit))
                    .collect();
                Ok::<_, RemoteError>(hits)
            },
        )
        .await
    }
}

fn student_hit(student: Student) -> SearchHit {
    let roll = student.roll_number.map(|r| r.to_string()).unwrap_or_default();
    SearchHit {
        url: format!("../4 P-S_View/profile.html?id={}", student.id),
        id: student.id.to_string(),
        kind: SearchKind::Student,
        description: format!("Class {} | Roll: {roll}", student.class.unwrap_or_default()),
        name: student.name,
    }
}

fn teacher_hit(teacher: Teacher) -> SearchHit {
    SearchHit {
        url: format!("../3 Teacher-View/profile.html?id={}", teacher.id),
        id: teacher.id.to_string(),
        kind: SearchKind::Teacher,
        description: teacher.department.unwrap_or_default(),
        name: teacher.name,
    }
}

#[cfg(test)]
mod tests {
    use std::time::Duration;

    use serde_json::json;

    use super::*;
    use crate::data::test_support::{demo, harness};

    #[tokio::test]
    async fn test_blank_query_skips_backend() {
        let h = harness();

        let result = h.data.search_global("   ").await;

        assert!(result.success);
        assert!(!result.is_mock);
        assert_eq!(result.data, Some(Vec::new()));
        assert!(h.client.calls().is_empty());
    }

    #[tokio::test]
    async fn test_remote_search_maps_both_tables() {
        let h = harness();
        h.client.seed(
            tables::STUDENTS,
            vec![json!({"id": 7, "name": "Rishu Kumar", "class": "12th", "roll_number": 25})],
        );
        h.client.seed(
            tables::TEACHERS,
            vec![
                json!({"id": "T9", "name": "Mr. Rishi Verma", "department": "Physics"}),
                json!({"id": "T10", "name": "Ms. Neha Verma", "department": "English"}),
            ],
        );

        let hits = h.data.search_global("RISH").await.data.unwrap();

        assert_eq!(hits.len(), 2);
        assert_eq!(hits[0].kind, SearchKind::Student);
        assert_eq!(hits[0].description, "Class 12th | Roll: 25");
        assert_eq!(hits[0].url, "../4 P-S_View/profile.html?id=7");
        assert_eq!(hits[1].kind, SearchKind::Teacher);
        assert_eq!(hits[1].description, "Physics");
        assert_eq!(hits[1].url, "../3 Teacher-View/profile.html?id=T9");
    }

    #[tokio::test(start_paused = true)]
    async fn test_tables_are_queried_concurrently() {
        let h = harness();
        h.client.set_latency(tables::STUDENTS, Duration::from_millis(200));
        h.client.set_latency(tables::TEACHERS, Duration::from_millis(200));

        let started = tokio::time::Instant::now();
        h.data.search_global("ri").await;

        assert!(started.elapsed() < Duration::from_millis(400));
        assert_eq!(h.client.calls().len(), 2);
    }

    #[tokio::test]
    async fn test_one_failing_table_falls_back_to_catalogue() {
        let h = harness();
        h.client.fail_table(tables::TEACHERS, RemoteError::network("connection reset"));

        let result = h.data.search_global("fee").await;

        assert!(result.is_mock);
        let hits = result.data.unwrap();
        assert_eq!(hits.len(), 1);
        assert_eq!(hits[0].name, "Fee Payment");
    }

    #[tokio::test]
    async fn test_mock_search_matches_description() {
        let (data, _) = demo();

        let hits = data.search_global("class").await.data.unwrap();
        let ids: Vec<_> = hits.iter().map(|h| h.id.as_str()).collect();
        assert_eq!(ids, vec!["S002"]);
    }
}
