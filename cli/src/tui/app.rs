use chrono::NaiveDate;
use crossterm::event::{KeyCode, KeyEvent};
use ratatui::widgets::TableState;
use taskger_core::{HttpTaskRepository, Task, TaskDraft, TaskId, TaskStatus, ViewModel};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FormField {
    Title,
    Description,
    DueDate,
    Status,
}

/// Keystroke-level state of the add/edit form. The engine owns which
/// surface is open and the validation errors; this is just the text
/// being typed.
pub struct FormState {
    pub title: String,
    pub description: String,
    pub due_date: String,
    pub status: TaskStatus,
    pub field: FormField,
    pub cursor: usize,
    pub local_error: Option<String>,
    pub editing: bool,
}

impl FormState {
    pub fn empty() -> Self {
        Self {
            title: String::new(),
            description: String::new(),
            due_date: String::new(),
            status: TaskStatus::default(),
            field: FormField::Title,
            cursor: 0,
            local_error: None,
            editing: false,
        }
    }

    pub fn from_task(task: &Task) -> Self {
        let title = task.title.clone();
        let cursor = title.chars().count();
        Self {
            title,
            description: task.description.clone().unwrap_or_default(),
            due_date: task
                .due_date
                .map(|d| d.format("%Y-%m-%d").to_string())
                .unwrap_or_default(),
            status: task.status,
            field: FormField::Title,
            cursor,
            local_error: None,
            editing: true,
        }
    }

    pub fn submit_label(&self) -> &'static str {
        if self.editing {
            "Update Task"
        } else {
            "Add Task"
        }
    }

    fn buffer(&mut self) -> Option<&mut String> {
        match self.field {
            FormField::Title => Some(&mut self.title),
            FormField::Description => Some(&mut self.description),
            FormField::DueDate => Some(&mut self.due_date),
            FormField::Status => None,
        }
    }

    pub fn buffer_text(&self) -> &str {
        match self.field {
            FormField::Title => &self.title,
            FormField::Description => &self.description,
            FormField::DueDate => &self.due_date,
            FormField::Status => "",
        }
    }

    pub fn input_char(&mut self, c: char) {
        let cursor = self.cursor;
        if let Some(buf) = self.buffer() {
            let byte_index: usize = buf.chars().take(cursor).map(|c| c.len_utf8()).sum();
            buf.insert(byte_index, c);
            self.cursor += 1;
        }
    }

    pub fn delete_char(&mut self) {
        if self.cursor == 0 {
            return;
        }
        let cursor = self.cursor;
        if let Some(buf) = self.buffer() {
            let byte_index: usize = buf.chars().take(cursor - 1).map(|c| c.len_utf8()).sum();
            buf.remove(byte_index);
            self.cursor -= 1;
        }
    }

    pub fn move_cursor_left(&mut self) {
        if self.cursor > 0 {
            self.cursor -= 1;
        }
    }

    pub fn move_cursor_right(&mut self) {
        let len = self.buffer_text().chars().count();
        if self.cursor < len {
            self.cursor += 1;
        }
    }

    pub fn next_field(&mut self) {
        self.focus(match self.field {
            FormField::Title => FormField::Description,
            FormField::Description => FormField::DueDate,
            FormField::DueDate => FormField::Status,
            FormField::Status => FormField::Title,
        });
    }

    pub fn prev_field(&mut self) {
        self.focus(match self.field {
            FormField::Title => FormField::Status,
            FormField::Description => FormField::Title,
            FormField::DueDate => FormField::Description,
            FormField::Status => FormField::DueDate,
        });
    }

    fn focus(&mut self, field: FormField) {
        self.field = field;
        self.cursor = self.buffer_text().chars().count();
    }

    pub fn cycle_status(&mut self) {
        self.status = self.status.next();
    }

    /// Build the draft to submit. The due date is the one field the form
    /// itself polices, since free text stands in for a date picker here.
    pub fn to_draft(&mut self) -> Option<TaskDraft> {
        let due_date = match self.due_date.trim() {
            "" => None,
            text => match NaiveDate::parse_from_str(text, "%Y-%m-%d") {
                Ok(date) => Some(date),
                Err(_) => {
                    self.local_error = Some("Due date must be YYYY-MM-DD.".to_string());
                    return None;
                }
            },
        };
        self.local_error = None;
        let description = if self.description.is_empty() {
            None
        } else {
            Some(self.description.clone())
        };
        Some(TaskDraft {
            title: self.title.clone(),
            description,
            status: self.status,
            due_date,
        })
    }
}

pub struct App {
    pub vm: ViewModel<HttpTaskRepository>,
    pub table: TableState,
    pub form: Option<FormState>,
    pub searching: bool,
    pub should_quit: bool,
}

impl App {
    pub fn new(vm: ViewModel<HttpTaskRepository>) -> App {
        App {
            vm,
            table: TableState::default(),
            form: None,
            searching: false,
            should_quit: false,
        }
    }

    pub fn selected_task_id(&self) -> Option<TaskId> {
        let view = self.vm.page_view();
        self.table
            .selected()
            .and_then(|i| view.tasks.get(i))
            .map(|t| t.id)
    }

    pub fn on_key(&mut self, key: KeyEvent) {
        if self.vm.confirming_delete().is_some() {
            self.on_confirm_key(key.code);
        } else if self.form.is_some() {
            self.on_form_key(key.code);
        } else if self.searching {
            self.on_search_key(key.code);
        } else {
            self.on_normal_key(key.code);
        }
    }

    fn on_normal_key(&mut self, code: KeyCode) {
        match code {
            KeyCode::Char('q') => self.should_quit = true,
            KeyCode::Down | KeyCode::Char('j') => self.next_row(),
            KeyCode::Up | KeyCode::Char('k') => self.previous_row(),
            KeyCode::Char('a') => {
                self.vm.open_add();
                self.form = Some(FormState::empty());
            }
            KeyCode::Char('e') => {
                if let Some(id) = self.selected_task_id() {
                    if let Some(task) = self.vm.open_edit(id) {
                        self.form = Some(FormState::from_task(&task));
                    }
                }
            }
            KeyCode::Char('d') | KeyCode::Delete => {
                if let Some(id) = self.selected_task_id() {
                    self.vm.request_delete(id);
                }
            }
            KeyCode::Char('s') => {
                if let Some(id) = self.selected_task_id() {
                    let next = self.vm.task(id).map(|t| t.status.next());
                    if let Some(next) = next {
                        self.vm.change_status(id, next);
                    }
                }
            }
            KeyCode::Char('/') => self.searching = true,
            KeyCode::Char('f') => {
                let next = self.vm.filter().next();
                self.vm.set_filter(next);
            }
            KeyCode::Char('o') => {
                let next = self.vm.sort().next();
                self.vm.set_sort(next);
            }
            KeyCode::Left | KeyCode::Char('h') => self.vm.prev_page(),
            KeyCode::Right | KeyCode::Char('l') => self.vm.next_page(),
            KeyCode::Char('r') => self.vm.refresh(),
            KeyCode::Esc => self.vm.dismiss_notice(),
            _ => {}
        }
    }

    fn on_search_key(&mut self, code: KeyCode) {
        match code {
            KeyCode::Enter | KeyCode::Esc => self.searching = false,
            KeyCode::Char(c) => {
                let mut term = self.vm.search().to_string();
                term.push(c);
                self.vm.set_search(term);
            }
            KeyCode::Backspace => {
                let mut term = self.vm.search().to_string();
                term.pop();
                self.vm.set_search(term);
            }
            _ => {}
        }
    }

    fn on_form_key(&mut self, code: KeyCode) {
        let Some(form) = self.form.as_mut() else {
            return;
        };
        match code {
            KeyCode::Esc => {
                if form.editing {
                    self.vm.cancel_edit();
                } else {
                    self.vm.cancel_add();
                }
                self.form = None;
            }
            KeyCode::Enter => {
                if let Some(draft) = form.to_draft() {
                    if form.editing {
                        self.vm.submit_edit(draft);
                    } else {
                        self.vm.submit_add(draft);
                    }
                }
            }
            KeyCode::Tab | KeyCode::Down => form.next_field(),
            KeyCode::BackTab | KeyCode::Up => form.prev_field(),
            KeyCode::Left => {
                if form.field == FormField::Status {
                    form.cycle_status();
                } else {
                    form.move_cursor_left();
                }
            }
            KeyCode::Right => {
                if form.field == FormField::Status {
                    form.cycle_status();
                } else {
                    form.move_cursor_right();
                }
            }
            KeyCode::Backspace => form.delete_char(),
            KeyCode::Char(c) => {
                if form.field == FormField::Status {
                    if c == ' ' {
                        form.cycle_status();
                    }
                } else {
                    form.input_char(c);
                }
            }
            _ => {}
        }
    }

    fn on_confirm_key(&mut self, code: KeyCode) {
        match code {
            KeyCode::Char('y') | KeyCode::Enter => {
                self.vm.confirm_delete();
            }
            KeyCode::Char('n') | KeyCode::Esc => self.vm.cancel_delete(),
            _ => {}
        }
    }

    fn next_row(&mut self) {
        let len = self.vm.page_view().tasks.len();
        if len == 0 {
            return;
        }
        let i = match self.table.selected() {
            Some(i) => {
                if i >= len - 1 {
                    0
                } else {
                    i + 1
                }
            }
            None => 0,
        };
        self.table.select(Some(i));
    }

    fn previous_row(&mut self) {
        let len = self.vm.page_view().tasks.len();
        if len == 0 {
            return;
        }
        let i = match self.table.selected() {
            Some(i) => {
                if i == 0 {
                    len - 1
                } else {
                    i - 1
                }
            }
            None => 0,
        };
        self.table.select(Some(i));
    }

    /// Keep presentation state consistent with the engine after events:
    /// drop the form once its surface closed, keep the row selection on
    /// the (possibly shorter) current page.
    pub fn reconcile(&mut self) {
        if self.form.is_some() && !self.vm.add_open() && self.vm.editing().is_none() {
            self.form = None;
        }
        let len = self.vm.page_view().tasks.len();
        if len == 0 {
            self.table.select(None);
        } else {
            match self.table.selected() {
                Some(i) if i >= len => self.table.select(Some(len - 1)),
                None => self.table.select(Some(0)),
                _ => {}
            }
        }
    }
}
