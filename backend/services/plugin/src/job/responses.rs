use billflow_tasks::{ChangeRecord, JobBatch, Task};
use serde::Serialize;

/// The platform expects each task wrapped under `task_options`.
#[derive(Debug, Serialize)]
pub struct TaskEnvelope {
    pub task_options: Task,
}

#[derive(Debug, Serialize)]
pub struct GetTasksResponse {
    pub tasks: Vec<TaskEnvelope>,
    pub changed: Vec<ChangeRecord>,
}

impl From<JobBatch> for GetTasksResponse {
    fn from(batch: JobBatch) -> Self {
        Self {
            tasks: batch
                .tasks
                .into_iter()
                .map(|task_options| TaskEnvelope { task_options })
                .collect(),
            changed: batch.changed,
        }
    }
}
