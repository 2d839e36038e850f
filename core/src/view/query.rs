//! The pure derived-view pipeline: filter, then sort, then paginate.
//! No side effects; the engine recomputes this on every state change.

use std::cmp::Ordering;

use crate::model::task::Task;
use crate::view::state::{SortKey, StatusFilter};

pub const TASKS_PER_PAGE: usize = 5;

/// One page of the derived view plus the numbers the pager needs.
#[derive(Debug, Clone, PartialEq)]
pub struct PageView {
    pub tasks: Vec<Task>,
    /// Effective page, clamped into `1..=total_pages`.
    pub page: usize,
    pub total_pages: usize,
    /// Tasks surviving the filter stage, across all pages.
    pub matching: usize,
}

/// A task survives the filter iff its status matches and the search term
/// appears case-insensitively in the title or description.
pub fn matches(task: &Task, filter: StatusFilter, search: &str) -> bool {
    if !filter.matches(task.status) {
        return false;
    }
    if search.is_empty() {
        return true;
    }
    let needle = search.to_lowercase();
    task.title.to_lowercase().contains(&needle)
        || task
            .description
            .as_deref()
            .unwrap_or("")
            .to_lowercase()
            .contains(&needle)
}

/// Comparator for the sort stage. Missing due dates order first ascending
/// and last descending; titles compare case-insensitively. Ties are left
/// to the stable sort, which keeps filter-stage order.
pub fn compare(a: &Task, b: &Task, key: SortKey) -> Ordering {
    match key {
        SortKey::DueDateAsc => a.due_date.cmp(&b.due_date),
        SortKey::DueDateDesc => b.due_date.cmp(&a.due_date),
        SortKey::TitleAsc => a.title.to_lowercase().cmp(&b.title.to_lowercase()),
        SortKey::TitleDesc => b.title.to_lowercase().cmp(&a.title.to_lowercase()),
    }
}

pub fn total_pages(matching: usize) -> usize {
    matching.div_ceil(TASKS_PER_PAGE).max(1)
}

pub fn derive_page(
    tasks: &[Task],
    filter: StatusFilter,
    search: &str,
    sort: SortKey,
    page: usize,
) -> PageView {
    let mut filtered: Vec<&Task> = tasks.iter().filter(|t| matches(t, filter, search)).collect();
    filtered.sort_by(|a, b| compare(a, b, sort));

    let matching = filtered.len();
    let total_pages = total_pages(matching);
    let page = page.clamp(1, total_pages);
    let tasks = filtered
        .into_iter()
        .skip((page - 1) * TASKS_PER_PAGE)
        .take(TASKS_PER_PAGE)
        .cloned()
        .collect();

    PageView {
        tasks,
        page,
        total_pages,
        matching,
    }
}
