/// Role and ownership checks
///
/// # Permission Model
///
/// 1. **Managers** may do everything with every task and administer users.
/// 2. **Employees** may read, update the status of, and report on tasks
///    assigned to them, and nothing else.
///
/// These checks never touch storage; callers load the task first.

use super::middleware::AuthContext;
use crate::models::task::Task;

/// Error type for authorization checks
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum AuthzError {
    /// Operation is reserved for managers
    #[error("Only managers can perform this action")]
    ManagerRequired,

    /// Employee tried to act on a task assigned to someone else
    #[error("You can only access tasks assigned to you")]
    NotAssignee,
}

/// Ensures the actor is a manager
pub fn require_manager(actor: &AuthContext) -> Result<(), AuthzError> {
    if actor.is_manager() {
        Ok(())
    } else {
        Err(AuthzError::ManagerRequired)
    }
}

/// Ensures the actor is a manager or the task's current assignee
pub fn require_task_access(actor: &AuthContext, task: &Task) -> Result<(), AuthzError> {
    if actor.is_manager() || task.employee_id == actor.user_id {
        Ok(())
    } else {
        Err(AuthzError::NotAssignee)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::task::{TaskPriority, TaskStatus};
    use crate::models::user::UserRole;
    use chrono::Utc;

    fn actor(user_id: i64, role: UserRole) -> AuthContext {
        AuthContext {
            user_id,
            role,
            username: format!("user{}", user_id),
            full_name: format!("User {}", user_id),
        }
    }

    fn task_for(employee_id: i64) -> Task {
        Task {
            id: 10,
            title: "Fix printer".to_string(),
            description: None,
            status: TaskStatus::Open,
            priority: TaskPriority::Medium,
            task_date: None,
            deadline: None,
            device_model: None,
            serial_number: None,
            reported_issue: None,
            work_report: None,
            cancellation_reason: None,
            employee_id,
            creator_id: Some(1),
            actual_start_time: None,
            actual_end_time: None,
            created_at: Utc::now(),
            updated_at: Utc::now(),
        }
    }

    #[test]
    fn test_require_manager() {
        assert!(require_manager(&actor(1, UserRole::Manager)).is_ok());
        assert_eq!(
            require_manager(&actor(2, UserRole::Employee)),
            Err(AuthzError::ManagerRequired)
        );
    }

    #[test]
    fn test_require_task_access() {
        let task = task_for(7);

        assert!(require_task_access(&actor(1, UserRole::Manager), &task).is_ok());
        assert!(require_task_access(&actor(7, UserRole::Employee), &task).is_ok());
        assert_eq!(
            require_task_access(&actor(8, UserRole::Employee), &task),
            Err(AuthzError::NotAssignee)
        );
    }
}
