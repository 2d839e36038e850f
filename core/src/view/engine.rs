//! The view-model engine: owns the authoritative task collection and all
//! transient UI state, issues repository calls, and reconciles completions.
//!
//! Presentation reads derived snapshots and dispatches intents; nothing
//! else mutates this state. Remote calls run as spawned tasks so the rest
//! of the UI stays interactive; their results come back as [`ViewEvent`]s
//! on the channel handed to [`ViewModel::new`], and the caller feeds them
//! into [`ViewModel::handle`] on the UI task.

use std::collections::HashSet;
use std::sync::Arc;
use std::time::Instant;

use tokio::sync::mpsc::UnboundedSender;
use tracing::{debug, warn};

use crate::error::Error;
use crate::model::task::{Task, TaskDraft, TaskId, TaskStatus};
use crate::repository::traits::TaskRepository;
use crate::view::query::{self, PageView};
use crate::view::state::{Notice, PendingKind, Severity, SortKey, StatusFilter};

/// Completion of a remote call, delivered back to the UI task.
#[derive(Debug)]
pub enum ViewEvent {
    Loaded(Result<Vec<Task>, Error>),
    Created(Result<Task, Error>),
    Updated {
        id: TaskId,
        result: Result<Task, Error>,
    },
    StatusChanged {
        id: TaskId,
        result: Result<Task, Error>,
    },
    Deleted {
        id: TaskId,
        result: Result<(), Error>,
    },
}

pub struct ViewModel<R> {
    repo: Arc<R>,
    events: UnboundedSender<ViewEvent>,

    /// Read-through cache of the remote collection, fully reloaded after
    /// every successful mutation.
    tasks: Vec<Task>,
    loading: bool,

    search: String,
    filter: StatusFilter,
    sort: SortKey,
    page: usize,

    pending: HashSet<(TaskId, PendingKind)>,
    submitting: bool,

    add_open: bool,
    editing: Option<TaskId>,
    confirming_delete: Option<TaskId>,

    form_error: Option<String>,
    edit_error: Option<String>,
    list_error: Option<String>,

    notice: Option<Notice>,
}

impl<R: TaskRepository + 'static> ViewModel<R> {
    pub fn new(repo: R, events: UnboundedSender<ViewEvent>) -> Self {
        Self {
            repo: Arc::new(repo),
            events,
            tasks: Vec::new(),
            loading: false,
            search: String::new(),
            filter: StatusFilter::default(),
            sort: SortKey::default(),
            page: 1,
            pending: HashSet::new(),
            submitting: false,
            add_open: false,
            editing: None,
            confirming_delete: None,
            form_error: None,
            edit_error: None,
            list_error: None,
            notice: None,
        }
    }

    // Derived state, read by presentation.

    pub fn page_view(&self) -> PageView {
        query::derive_page(&self.tasks, self.filter, &self.search, self.sort, self.page)
    }

    pub fn task(&self, id: TaskId) -> Option<&Task> {
        self.tasks.iter().find(|t| t.id == id)
    }

    pub fn total_tasks(&self) -> usize {
        self.tasks.len()
    }

    pub fn is_loading(&self) -> bool {
        self.loading
    }

    pub fn search(&self) -> &str {
        &self.search
    }

    pub fn filter(&self) -> StatusFilter {
        self.filter
    }

    pub fn sort(&self) -> SortKey {
        self.sort
    }

    pub fn is_pending(&self, id: TaskId, kind: PendingKind) -> bool {
        self.pending.contains(&(id, kind))
    }

    pub fn has_pending(&self, id: TaskId) -> bool {
        self.pending.iter().any(|(pid, _)| *pid == id)
    }

    pub fn is_submitting(&self) -> bool {
        self.submitting
    }

    pub fn add_open(&self) -> bool {
        self.add_open
    }

    pub fn editing(&self) -> Option<TaskId> {
        self.editing
    }

    pub fn confirming_delete(&self) -> Option<&Task> {
        self.confirming_delete.and_then(|id| self.task(id))
    }

    pub fn form_error(&self) -> Option<&str> {
        self.form_error.as_deref()
    }

    pub fn edit_error(&self) -> Option<&str> {
        self.edit_error.as_deref()
    }

    pub fn list_error(&self) -> Option<&str> {
        self.list_error.as_deref()
    }

    pub fn notice(&self) -> Option<&Notice> {
        self.notice.as_ref()
    }

    // Commands.

    /// Reload the collection from the server. No in-flight guard at the
    /// collection level: every call issues a fresh request and the latest
    /// completion wins.
    pub fn refresh(&mut self) {
        self.loading = true;
        let repo = Arc::clone(&self.repo);
        let events = self.events.clone();
        tokio::spawn(async move {
            let result = repo.list().await;
            let _ = events.send(ViewEvent::Loaded(result));
        });
    }

    pub fn set_search(&mut self, term: impl Into<String>) {
        self.search = term.into();
        self.page = 1;
    }

    pub fn set_filter(&mut self, filter: StatusFilter) {
        self.filter = filter;
        self.page = 1;
    }

    pub fn set_sort(&mut self, sort: SortKey) {
        self.sort = sort;
        self.page = 1;
    }

    pub fn next_page(&mut self) {
        let view = self.page_view();
        if view.page < view.total_pages {
            self.page = view.page + 1;
        }
    }

    pub fn prev_page(&mut self) {
        let view = self.page_view();
        if view.page > 1 {
            self.page = view.page - 1;
        }
    }

    pub fn open_add(&mut self) {
        self.add_open = true;
        self.form_error = None;
    }

    pub fn cancel_add(&mut self) {
        self.add_open = false;
        self.form_error = None;
    }

    /// Create a task from the draft. Rejected while another form submission
    /// is in flight, so a double press cannot issue two creates.
    pub fn submit_add(&mut self, draft: TaskDraft) -> bool {
        if self.submitting {
            return false;
        }
        if let Err(message) = draft.validate() {
            self.form_error = Some(message.to_string());
            return false;
        }
        self.form_error = None;
        self.submitting = true;
        let repo = Arc::clone(&self.repo);
        let events = self.events.clone();
        tokio::spawn(async move {
            let result = repo.create(&draft).await;
            let _ = events.send(ViewEvent::Created(result));
        });
        true
    }

    /// Open the edit surface for a task. Returns the current field values
    /// for the form to prefill, or None while an update for the same task
    /// is still outstanding.
    pub fn open_edit(&mut self, id: TaskId) -> Option<Task> {
        if self.is_pending(id, PendingKind::Edit) {
            return None;
        }
        let task = self.task(id)?.clone();
        self.editing = Some(id);
        self.edit_error = None;
        Some(task)
    }

    pub fn cancel_edit(&mut self) {
        self.editing = None;
        self.edit_error = None;
    }

    pub fn submit_edit(&mut self, draft: TaskDraft) -> bool {
        let Some(id) = self.editing else {
            return false;
        };
        if self.submitting || self.is_pending(id, PendingKind::Edit) {
            return false;
        }
        if let Err(message) = draft.validate() {
            self.edit_error = Some(message.to_string());
            return false;
        }
        self.edit_error = None;
        self.submitting = true;
        self.pending.insert((id, PendingKind::Edit));
        let repo = Arc::clone(&self.repo);
        let events = self.events.clone();
        tokio::spawn(async move {
            let result = repo.update(id, &draft).await;
            let _ = events.send(ViewEvent::Updated { id, result });
        });
        true
    }

    /// Inline status change: resubmits the task's own fields with the new
    /// status. The collection keeps the old status until the server
    /// confirms, so a rejected change never shows up in the view.
    pub fn change_status(&mut self, id: TaskId, status: TaskStatus) -> bool {
        if self.is_pending(id, PendingKind::StatusUpdate) {
            return false;
        }
        let Some(task) = self.task(id) else {
            return false;
        };
        if task.status == status {
            return false;
        }
        let mut draft = task.draft();
        draft.status = status;
        self.list_error = None;
        self.pending.insert((id, PendingKind::StatusUpdate));
        let repo = Arc::clone(&self.repo);
        let events = self.events.clone();
        tokio::spawn(async move {
            let result = repo.update(id, &draft).await;
            let _ = events.send(ViewEvent::StatusChanged { id, result });
        });
        true
    }

    /// First phase of delete: nothing is removed until [`confirm_delete`].
    ///
    /// [`confirm_delete`]: ViewModel::confirm_delete
    pub fn request_delete(&mut self, id: TaskId) -> bool {
        if self.is_pending(id, PendingKind::Delete) || self.task(id).is_none() {
            return false;
        }
        self.confirming_delete = Some(id);
        true
    }

    pub fn cancel_delete(&mut self) {
        self.confirming_delete = None;
    }

    pub fn confirm_delete(&mut self) -> bool {
        let Some(id) = self.confirming_delete.take() else {
            return false;
        };
        if self.is_pending(id, PendingKind::Delete) {
            return false;
        }
        self.list_error = None;
        self.pending.insert((id, PendingKind::Delete));
        let repo = Arc::clone(&self.repo);
        let events = self.events.clone();
        tokio::spawn(async move {
            let result = repo.delete(id).await;
            let _ = events.send(ViewEvent::Deleted { id, result });
        });
        true
    }

    pub fn dismiss_notice(&mut self) {
        self.notice = None;
    }

    /// Drop the notice once its display window has passed.
    pub fn tick(&mut self, now: Instant) {
        if self.notice.as_ref().is_some_and(|n| n.is_expired(now)) {
            self.notice = None;
        }
    }

    // Reconciliation.

    pub fn handle(&mut self, event: ViewEvent) {
        match event {
            ViewEvent::Loaded(Ok(tasks)) => {
                self.loading = false;
                self.list_error = None;
                if tasks.len() != self.tasks.len() {
                    self.page = 1;
                }
                self.tasks = tasks;
                self.clamp_page();
            }
            ViewEvent::Loaded(Err(err)) => {
                self.loading = false;
                warn!(%err, "list refresh failed");
                self.list_error = Some("Failed to fetch tasks".to_string());
                self.notify("Failed to fetch tasks", Severity::Error);
            }
            ViewEvent::Created(Ok(task)) => {
                debug!(id = task.id, "task created");
                self.submitting = false;
                self.add_open = false;
                self.form_error = None;
                self.notify("Task added!", Severity::Success);
                self.refresh();
            }
            ViewEvent::Created(Err(err)) => {
                self.submitting = false;
                warn!(%err, "create failed");
                self.form_error = Some("Failed to add task".to_string());
                self.notify("Failed to add task", Severity::Error);
            }
            ViewEvent::Updated { id, result } => {
                self.pending.remove(&(id, PendingKind::Edit));
                self.submitting = false;
                match result {
                    Ok(_) => {
                        self.editing = None;
                        self.edit_error = None;
                        self.notify("Task updated!", Severity::Success);
                        self.refresh();
                    }
                    Err(err) => {
                        warn!(id, %err, "update failed");
                        self.edit_error = Some("Failed to update task".to_string());
                        self.notify("Failed to update task", Severity::Error);
                    }
                }
            }
            ViewEvent::StatusChanged { id, result } => {
                self.pending.remove(&(id, PendingKind::StatusUpdate));
                match result {
                    Ok(_) => {
                        self.notify("Status updated!", Severity::Success);
                        self.refresh();
                    }
                    Err(err) => {
                        warn!(id, %err, "status update failed");
                        self.list_error = Some("Failed to update status".to_string());
                        self.notify("Failed to update status", Severity::Error);
                    }
                }
            }
            ViewEvent::Deleted { id, result } => {
                self.pending.remove(&(id, PendingKind::Delete));
                match result {
                    Ok(()) => {
                        self.notify("Task deleted!", Severity::Success);
                        self.refresh();
                    }
                    Err(err) => {
                        warn!(id, %err, "delete failed");
                        self.list_error = Some("Failed to delete task".to_string());
                        self.notify("Failed to delete task", Severity::Error);
                    }
                }
            }
        }
    }

    fn notify(&mut self, message: &str, severity: Severity) {
        self.notice = Some(Notice::new(message, severity));
    }

    fn clamp_page(&mut self) {
        let matching = self
            .tasks
            .iter()
            .filter(|t| query::matches(t, self.filter, &self.search))
            .count();
        self.page = self.page.clamp(1, query::total_pages(matching));
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Mutex;
    use std::time::Duration;

    use async_trait::async_trait;
    use tokio::sync::mpsc::{self, UnboundedReceiver};

    use super::*;
    use crate::Result;

    #[derive(Default)]
    struct StubRepo {
        tasks: Mutex<Vec<Task>>,
        next_id: Mutex<TaskId>,
        fail_list: bool,
        fail_create: bool,
        fail_update: bool,
        fail_delete: bool,
    }

    impl StubRepo {
        fn seeded(tasks: Vec<Task>) -> Self {
            let next_id = tasks.iter().map(|t| t.id).max().unwrap_or(0);
            Self {
                tasks: Mutex::new(tasks),
                next_id: Mutex::new(next_id),
                ..Default::default()
            }
        }
    }

    fn rejected() -> Error {
        Error::Server("status 500".to_string())
    }

    #[async_trait]
    impl TaskRepository for StubRepo {
        async fn list(&self) -> Result<Vec<Task>> {
            if self.fail_list {
                return Err(rejected());
            }
            Ok(self.tasks.lock().unwrap().clone())
        }

        async fn create(&self, draft: &TaskDraft) -> Result<Task> {
            if self.fail_create {
                return Err(rejected());
            }
            let mut next_id = self.next_id.lock().unwrap();
            *next_id += 1;
            let task = Task {
                id: *next_id,
                title: draft.title.clone(),
                description: draft.description.clone(),
                status: draft.status,
                due_date: draft.due_date,
            };
            self.tasks.lock().unwrap().push(task.clone());
            Ok(task)
        }

        async fn update(&self, id: TaskId, draft: &TaskDraft) -> Result<Task> {
            if self.fail_update {
                return Err(rejected());
            }
            let mut tasks = self.tasks.lock().unwrap();
            let task = tasks
                .iter_mut()
                .find(|t| t.id == id)
                .ok_or(Error::NotFound(id))?;
            task.title = draft.title.clone();
            task.description = draft.description.clone();
            task.status = draft.status;
            task.due_date = draft.due_date;
            Ok(task.clone())
        }

        async fn delete(&self, id: TaskId) -> Result<()> {
            if self.fail_delete {
                return Err(rejected());
            }
            let mut tasks = self.tasks.lock().unwrap();
            let before = tasks.len();
            tasks.retain(|t| t.id != id);
            if tasks.len() == before {
                return Err(Error::NotFound(id));
            }
            Ok(())
        }
    }

    fn vm(repo: StubRepo) -> (ViewModel<StubRepo>, UnboundedReceiver<ViewEvent>) {
        let (tx, rx) = mpsc::unbounded_channel();
        (ViewModel::new(repo, tx), rx)
    }

    fn seeded_task(id: TaskId, title: &str) -> Task {
        Task {
            id,
            title: title.to_string(),
            description: None,
            status: TaskStatus::Todo,
            due_date: None,
        }
    }

    fn new_draft(title: &str) -> TaskDraft {
        TaskDraft {
            title: title.to_string(),
            description: None,
            status: TaskStatus::Todo,
            due_date: None,
        }
    }

    /// Feed the next `n` completions back into the engine.
    async fn drain(vm: &mut ViewModel<StubRepo>, rx: &mut UnboundedReceiver<ViewEvent>, n: usize) {
        for _ in 0..n {
            let event = rx.recv().await.expect("completion event");
            vm.handle(event);
        }
    }

    #[tokio::test]
    async fn add_then_search_repaginates() {
        let (mut vm, mut rx) = vm(StubRepo::default());
        vm.refresh();
        drain(&mut vm, &mut rx, 1).await;
        let view = vm.page_view();
        assert_eq!((view.page, view.total_pages, view.matching), (1, 1, 0));

        vm.open_add();
        assert!(vm.submit_add(new_draft("Buy milk")));
        drain(&mut vm, &mut rx, 2).await; // Created + the refresh it triggers
        assert!(!vm.add_open());
        assert_eq!(vm.notice().unwrap().message, "Task added!");
        let view = vm.page_view();
        assert_eq!((view.page, view.total_pages, view.matching), (1, 1, 1));

        for title in ["Call Ann", "Call Bob", "Pay rent", "Mow lawn", "Read book"] {
            assert!(vm.submit_add(new_draft(title)));
            drain(&mut vm, &mut rx, 2).await;
        }
        assert_eq!(vm.total_tasks(), 6);
        assert_eq!(vm.page_view().total_pages, 2);

        vm.next_page();
        assert_eq!(vm.page_view().page, 2);

        vm.set_search("call");
        let view = vm.page_view();
        assert_eq!((view.page, view.total_pages, view.matching), (1, 1, 2));
        assert!(view.tasks.iter().all(|t| t.title.starts_with("Call")));
    }

    #[tokio::test]
    async fn status_change_rolls_back_on_rejection() {
        let repo = StubRepo {
            fail_update: true,
            ..StubRepo::seeded(vec![seeded_task(1, "Buy milk")])
        };
        let (mut vm, mut rx) = vm(repo);
        vm.refresh();
        drain(&mut vm, &mut rx, 1).await;

        assert!(vm.change_status(1, TaskStatus::Done));
        // the collection still shows the unconfirmed old status
        assert_eq!(vm.task(1).unwrap().status, TaskStatus::Todo);
        drain(&mut vm, &mut rx, 1).await;

        assert_eq!(vm.task(1).unwrap().status, TaskStatus::Todo);
        assert_eq!(vm.page_view().tasks[0].status, TaskStatus::Todo);
        assert_eq!(vm.notice().unwrap().severity, Severity::Error);
        assert_eq!(vm.list_error(), Some("Failed to update status"));
        assert!(!vm.is_pending(1, PendingKind::StatusUpdate));
    }

    #[tokio::test]
    async fn delete_is_two_phase() {
        let (mut vm, mut rx) = vm(StubRepo::seeded(vec![seeded_task(1, "Buy milk")]));
        vm.refresh();
        drain(&mut vm, &mut rx, 1).await;

        assert!(vm.request_delete(1));
        assert_eq!(vm.confirming_delete().unwrap().id, 1);
        assert_eq!(vm.total_tasks(), 1, "nothing removed before confirmation");
        assert!(rx.try_recv().is_err(), "no remote call before confirmation");

        vm.cancel_delete();
        assert!(vm.confirming_delete().is_none());
        assert_eq!(vm.total_tasks(), 1);

        assert!(vm.request_delete(1));
        assert!(vm.confirm_delete());
        drain(&mut vm, &mut rx, 2).await; // Deleted + refresh
        assert_eq!(vm.total_tasks(), 0);
        assert_eq!(vm.notice().unwrap().message, "Task deleted!");
    }

    #[tokio::test]
    async fn failed_delete_leaves_the_task_in_place() {
        let repo = StubRepo {
            fail_delete: true,
            ..StubRepo::seeded(vec![seeded_task(1, "Buy milk")])
        };
        let (mut vm, mut rx) = vm(repo);
        vm.refresh();
        drain(&mut vm, &mut rx, 1).await;

        vm.request_delete(1);
        vm.confirm_delete();
        drain(&mut vm, &mut rx, 1).await;
        assert_eq!(vm.total_tasks(), 1);
        assert_eq!(vm.list_error(), Some("Failed to delete task"));
        assert!(!vm.is_pending(1, PendingKind::Delete));
    }

    #[tokio::test]
    async fn reentrant_row_commands_are_rejected() {
        let (mut vm, mut rx) = vm(StubRepo::seeded(vec![seeded_task(1, "Buy milk")]));
        vm.refresh();
        drain(&mut vm, &mut rx, 1).await;

        assert!(vm.change_status(1, TaskStatus::Done));
        assert!(vm.is_pending(1, PendingKind::StatusUpdate));
        assert!(!vm.change_status(1, TaskStatus::InProgress));
        drain(&mut vm, &mut rx, 2).await;
        assert_eq!(vm.task(1).unwrap().status, TaskStatus::Done);
    }

    #[tokio::test]
    async fn double_submission_is_guarded() {
        let (mut vm, mut rx) = vm(StubRepo::default());
        vm.open_add();
        assert!(vm.submit_add(new_draft("Buy milk")));
        assert!(!vm.submit_add(new_draft("Buy milk")), "second press ignored");
        drain(&mut vm, &mut rx, 2).await;
        assert!(rx.try_recv().is_err(), "exactly one create was issued");
        assert_eq!(vm.total_tasks(), 1);
    }

    #[tokio::test]
    async fn invalid_draft_never_reaches_the_repository() {
        let (mut vm, mut rx) = vm(StubRepo::default());
        vm.open_add();
        assert!(!vm.submit_add(new_draft("")));
        assert_eq!(vm.form_error(), Some("Title is required."));
        assert!(vm.add_open(), "surface stays open on validation failure");
        assert!(rx.try_recv().is_err());
    }

    #[tokio::test]
    async fn edit_error_does_not_clobber_the_add_surface() {
        let repo = StubRepo {
            fail_update: true,
            ..StubRepo::seeded(vec![seeded_task(1, "Buy milk")])
        };
        let (mut vm, mut rx) = vm(repo);
        vm.refresh();
        drain(&mut vm, &mut rx, 1).await;

        let prefill = vm.open_edit(1).unwrap();
        assert_eq!(prefill.title, "Buy milk");
        assert!(vm.submit_edit(new_draft("Buy oat milk")));
        drain(&mut vm, &mut rx, 1).await;

        assert_eq!(vm.edit_error(), Some("Failed to update task"));
        assert_eq!(vm.form_error(), None);
        assert_eq!(vm.editing(), Some(1), "edit surface stays open");
        assert_eq!(vm.task(1).unwrap().title, "Buy milk");
    }

    #[tokio::test]
    async fn failed_fetch_surfaces_collection_error() {
        let repo = StubRepo {
            fail_list: true,
            ..Default::default()
        };
        let (mut vm, mut rx) = vm(repo);
        vm.refresh();
        assert!(vm.is_loading());
        drain(&mut vm, &mut rx, 1).await;
        assert!(!vm.is_loading());
        assert_eq!(vm.list_error(), Some("Failed to fetch tasks"));
        assert_eq!(vm.notice().unwrap().severity, Severity::Error);
    }

    #[tokio::test]
    async fn notice_is_single_slot_and_expires() {
        let repo = StubRepo {
            fail_delete: true,
            ..StubRepo::seeded(vec![seeded_task(1, "Buy milk")])
        };
        let (mut vm, mut rx) = vm(repo);
        vm.refresh();
        drain(&mut vm, &mut rx, 1).await;

        vm.open_add();
        vm.submit_add(new_draft("Pay rent"));
        drain(&mut vm, &mut rx, 2).await;
        assert_eq!(vm.notice().unwrap().message, "Task added!");

        vm.request_delete(1);
        vm.confirm_delete();
        drain(&mut vm, &mut rx, 1).await;
        // replaced, not queued
        assert_eq!(vm.notice().unwrap().message, "Failed to delete task");

        vm.tick(Instant::now() + Duration::from_secs(4));
        assert!(vm.notice().is_none());
    }
}
