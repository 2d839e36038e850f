pub mod error;
pub mod model;
pub mod repository;
pub mod view;

pub use error::Error;
pub use model::task::{Task, TaskDraft, TaskId, TaskStatus};
pub use repository::{HttpTaskRepository, TaskRepository};
pub use view::engine::{ViewEvent, ViewModel};
pub use view::query::{PageView, TASKS_PER_PAGE};
pub use view::state::{Notice, PendingKind, Severity, SortKey, StatusFilter};

pub type Result<T> = std::result::Result<T, Error>;
