pub mod task;
pub mod user;

pub use task::{
    NewTask, Page, PageRequest, PaginationInfo, Task, TaskFilter, TaskInput, TaskQuery, TaskUpdate,
};
pub use user::{NewUser, Role, User};
