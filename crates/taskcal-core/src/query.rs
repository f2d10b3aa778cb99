use uuid::Uuid;

use crate::models::TaskStatus;

/// Filters applied to a windowed or list query. All present filters must
/// match (conjunction); free text matches title or description.
#[derive(Debug, Clone, Default)]
pub struct TaskFilters {
    pub assignee_id: Option<Uuid>,
    pub business_id: Option<Uuid>,
    pub status: Option<TaskStatus>,
    pub text: Option<String>,
}

impl TaskFilters {
    pub fn is_empty(&self) -> bool {
        self.assignee_id.is_none()
            && self.business_id.is_none()
            && self.status.is_none()
            && self.text.is_none()
    }

    pub fn with_status(status: TaskStatus) -> Self {
        Self {
            status: Some(status),
            ..Self::default()
        }
    }

    pub fn with_assignee(assignee_id: Uuid) -> Self {
        Self {
            assignee_id: Some(assignee_id),
            ..Self::default()
        }
    }
}
