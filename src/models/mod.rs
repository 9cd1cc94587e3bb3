pub mod patch;
pub mod session;
pub mod task;
pub mod user;

pub use patch::Field;
pub use session::{NewRefreshToken, RefreshToken};
pub use task::{
    CreateTaskRequest, NewTask, Pagination, Task, TaskChanges, TaskFilter, TaskListQuery,
    TaskPage, TaskStatus, UpdateTaskRequest,
};
pub use user::{NewUser, User, UserRecord};
