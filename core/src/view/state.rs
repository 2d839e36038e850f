use std::time::{Duration, Instant};

use crate::model::task::TaskStatus;

/// How long a notice stays up before it dismisses itself.
pub const NOTICE_TTL: Duration = Duration::from_secs(3);

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StatusFilter {
    All,
    Only(TaskStatus),
}

impl Default for StatusFilter {
    fn default() -> Self {
        StatusFilter::All
    }
}

impl StatusFilter {
    pub fn matches(&self, status: TaskStatus) -> bool {
        match self {
            StatusFilter::All => true,
            StatusFilter::Only(only) => *only == status,
        }
    }

    pub fn label(&self) -> &'static str {
        match self {
            StatusFilter::All => "All",
            StatusFilter::Only(status) => status.label(),
        }
    }

    /// All -> TODO -> IN PROGRESS -> DONE -> All.
    pub fn next(&self) -> StatusFilter {
        match self {
            StatusFilter::All => StatusFilter::Only(TaskStatus::Todo),
            StatusFilter::Only(TaskStatus::Done) => StatusFilter::All,
            StatusFilter::Only(status) => StatusFilter::Only(status.next()),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SortKey {
    DueDateAsc,
    DueDateDesc,
    TitleAsc,
    TitleDesc,
}

impl Default for SortKey {
    fn default() -> Self {
        SortKey::DueDateAsc
    }
}

impl SortKey {
    pub fn label(&self) -> &'static str {
        match self {
            SortKey::DueDateAsc => "Due Date (Earliest First)",
            SortKey::DueDateDesc => "Due Date (Latest First)",
            SortKey::TitleAsc => "Title (A-Z)",
            SortKey::TitleDesc => "Title (Z-A)",
        }
    }

    pub fn next(&self) -> SortKey {
        match self {
            SortKey::DueDateAsc => SortKey::DueDateDesc,
            SortKey::DueDateDesc => SortKey::TitleAsc,
            SortKey::TitleAsc => SortKey::TitleDesc,
            SortKey::TitleDesc => SortKey::DueDateAsc,
        }
    }
}

/// One in-flight remote call per (task id, kind); the marker both disables
/// the triggering control and rejects re-entrant commands.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum PendingKind {
    Delete,
    Edit,
    StatusUpdate,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Severity {
    Success,
    Error,
    Info,
}

/// Single-slot transient notification. A new one replaces the current one.
#[derive(Debug, Clone)]
pub struct Notice {
    pub message: String,
    pub severity: Severity,
    posted: Instant,
}

impl Notice {
    pub fn new(message: impl Into<String>, severity: Severity) -> Self {
        Self {
            message: message.into(),
            severity,
            posted: Instant::now(),
        }
    }

    pub fn is_expired(&self, now: Instant) -> bool {
        now.duration_since(self.posted) >= NOTICE_TTL
    }
}
