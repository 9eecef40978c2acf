// Task-queue endpoints
//
// Query and mutate the server's asynchronous task queues (upload, copy,
// offline download, decompress, move). Single-task mutations pass `tid` as
// a query parameter; batch mutations POST the tid list as the body. The
// batch endpoints make no rollback guarantee -- their per-item result
// payload is passed through untouched.

use reqwest::Method;
use serde_json::{Value, json};
use tracing::debug;

use crate::client::OpenListClient;
use crate::error::Error;
use crate::models::{TaskEntry, TaskType};

fn task_path(task_type: TaskType, op: &str) -> String {
    format!("/api/task/{task_type}/{op}")
}

impl OpenListClient {
    /// Fetch detail for tasks of one type, optionally narrowed to a single
    /// task id.
    ///
    /// `POST /api/task/{type}/info[?tid=...]`
    pub async fn get_task_info(
        &self,
        task_type: TaskType,
        tid: Option<&str>,
    ) -> Result<Value, Error> {
        let query: Vec<(&str, String)> = match tid {
            Some(tid) if tid.is_empty() => {
                return Err(Error::validation("tid must not be empty"));
            }
            Some(tid) => vec![("tid", tid.to_owned())],
            None => Vec::new(),
        };
        debug!(%task_type, ?tid, "fetching task info");
        self.request(Method::POST, &task_path(task_type, "info"), &query, None)
            .await
    }

    /// List finished tasks (succeeded, failed, or canceled).
    ///
    /// `GET /api/task/{type}/done`
    pub async fn get_task_done(&self, task_type: TaskType) -> Result<Vec<TaskEntry>, Error> {
        debug!(%task_type, "listing done tasks");
        let tasks: Option<Vec<TaskEntry>> =
            self.get_json(&task_path(task_type, "done")).await?;
        Ok(tasks.unwrap_or_default())
    }

    /// List pending and running tasks.
    ///
    /// `GET /api/task/{type}/undone`
    pub async fn get_task_undone(&self, task_type: TaskType) -> Result<Vec<TaskEntry>, Error> {
        debug!(%task_type, "listing undone tasks");
        let tasks: Option<Vec<TaskEntry>> =
            self.get_json(&task_path(task_type, "undone")).await?;
        Ok(tasks.unwrap_or_default())
    }

    /// Delete a single finished task record.
    ///
    /// `POST /api/task/{type}/delete?tid=...`
    pub async fn delete_task(&self, task_type: TaskType, tid: &str) -> Result<Value, Error> {
        self.single_task_op(task_type, "delete", tid).await
    }

    /// Cancel a single running task.
    ///
    /// `POST /api/task/{type}/cancel?tid=...`
    pub async fn cancel_task(&self, task_type: TaskType, tid: &str) -> Result<Value, Error> {
        self.single_task_op(task_type, "cancel", tid).await
    }

    /// Re-queue a single failed task.
    ///
    /// `POST /api/task/{type}/retry?tid=...`
    pub async fn retry_task(&self, task_type: TaskType, tid: &str) -> Result<Value, Error> {
        self.single_task_op(task_type, "retry", tid).await
    }

    /// Clear every finished task record of one type.
    ///
    /// `POST /api/task/{type}/clear_done`
    pub async fn clear_done_tasks(&self, task_type: TaskType) -> Result<Value, Error> {
        debug!(%task_type, "clearing done tasks");
        self.post_json(&task_path(task_type, "clear_done"), json!({}))
            .await
    }

    /// Clear only the successfully finished task records of one type.
    ///
    /// `POST /api/task/{type}/clear_succeeded`
    pub async fn clear_succeeded_tasks(&self, task_type: TaskType) -> Result<Value, Error> {
        debug!(%task_type, "clearing succeeded tasks");
        self.post_json(&task_path(task_type, "clear_succeeded"), json!({}))
            .await
    }

    /// Re-queue every failed task of one type.
    ///
    /// `POST /api/task/{type}/retry_failed`
    pub async fn retry_failed_tasks(&self, task_type: TaskType) -> Result<Value, Error> {
        debug!(%task_type, "retrying failed tasks");
        self.post_json(&task_path(task_type, "retry_failed"), json!({}))
            .await
    }

    /// Delete several finished task records in one call.
    ///
    /// `POST /api/task/{type}/delete_some` with the tid list as the body.
    pub async fn delete_some_tasks(
        &self,
        task_type: TaskType,
        tids: &[String],
    ) -> Result<Value, Error> {
        self.batch_task_op(task_type, "delete_some", tids).await
    }

    /// Cancel several running tasks in one call.
    ///
    /// `POST /api/task/{type}/cancel_some`
    pub async fn cancel_some_tasks(
        &self,
        task_type: TaskType,
        tids: &[String],
    ) -> Result<Value, Error> {
        self.batch_task_op(task_type, "cancel_some", tids).await
    }

    /// Re-queue several failed tasks in one call.
    ///
    /// `POST /api/task/{type}/retry_some`
    pub async fn retry_some_tasks(
        &self,
        task_type: TaskType,
        tids: &[String],
    ) -> Result<Value, Error> {
        self.batch_task_op(task_type, "retry_some", tids).await
    }

    // ── Shared shapes ────────────────────────────────────────────────

    async fn single_task_op(
        &self,
        task_type: TaskType,
        op: &str,
        tid: &str,
    ) -> Result<Value, Error> {
        if tid.is_empty() {
            return Err(Error::validation("tid must not be empty"));
        }
        debug!(%task_type, op, tid, "task mutation");
        self.request(
            Method::POST,
            &task_path(task_type, op),
            &[("tid", tid.to_owned())],
            None,
        )
        .await
    }

    async fn batch_task_op(
        &self,
        task_type: TaskType,
        op: &str,
        tids: &[String],
    ) -> Result<Value, Error> {
        if tids.is_empty() {
            return Err(Error::validation("tids must not be empty"));
        }
        debug!(%task_type, op, count = tids.len(), "batch task mutation");
        self.post_json(&task_path(task_type, op), json!(tids)).await
    }
}
