//! Teacher portal reads and writes.

use super::models::{ClassAttendance, Homework, MarksEntry, StatusRow, Teacher};
use super::{DataService, QueryResult, decode_rows, decode_single, fixtures, to_row};
use crate::backend::{RemoteError, TableQuery, tables};

impl DataService {
    #[cfg_attr(
        feature = "tracing",
        tracing::instrument(name = "get_teacher", skip_all)
    )]
    pub async fn get_teacher(&self, teacher_id: &str) -> QueryResult<Teacher> {
        let query = TableQuery::from(tables::TEACHERS).eq("id", teacher_id).single();
        self.read("Loading teacher data", fixtures::teacher, move |client| async move {
            decode_single(client.select(&query).await?, tables::TEACHERS)
        })
        .await
    }

    /// Present/absent totals across every class the teacher takes.
    #[cfg_attr(
        feature = "tracing",
        tracing::instrument(name = "get_teacher_class_attendance", skip_all)
    )]
    pub async fn get_teacher_class_attendance(&self, teacher_id: &str) -> QueryResult<ClassAttendance> {
        let query = TableQuery::from(tables::CLASS_ATTENDANCE).eq("teacher_id", teacher_id);
        self.read(
            "Loading class attendance",
            fixtures::class_attendance,
            move |client| async move {
                let rows: Vec<StatusRow> = decode_rows(client.select(&query).await?)?;
                Ok::<_, RemoteError>(ClassAttendance::from_statuses(rows.into_iter().map(|r| r.status)))
            },
        )
        .await
    }

    #[cfg_attr(
        feature = "tracing",
        tracing::instrument(name = "submit_homework", skip_all)
    )]
    pub async fn submit_homework(&self, homework: Homework) -> QueryResult<Vec<Homework>> {
        let row = to_row(&homework);
        self.write(
            "Uploading homework",
            || vec![homework.clone()],
            move |client| async move { decode_rows(client.insert(tables::HOMEWORK, vec![row?]).await?) },
        )
        .await
    }

    #[cfg_attr(
        feature = "tracing",
        tracing::instrument(name = "submit_marks", skip_all)
    )]
    pub async fn submit_marks(&self, marks: MarksEntry) -> QueryResult<Vec<MarksEntry>> {
        let row = to_row(&marks);
        self.write(
            "Submitting marks",
            || vec![marks.clone()],
            move |client| async move { decode_rows(client.insert(tables::MARKS, vec![row?]).await?) },
        )
        .await
    }
}
