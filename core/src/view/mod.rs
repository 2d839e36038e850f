pub mod engine;
pub mod query;
pub mod state;

// Re-export
pub use engine::{ViewEvent, ViewModel};
pub use query::{PageView, TASKS_PER_PAGE};
pub use state::{Notice, PendingKind, Severity, SortKey, StatusFilter};
