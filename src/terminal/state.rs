use ratatui::widgets::ListState;

use crate::domain::email::{Attachment, Email};
use crate::portal::Task;
use crate::portal::forms::{ImapDefaults, LoginForm, RegisterForm};

/// What a key press asks the event loop to do.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Action {
    Login,
    Register,
    Refresh,
    Download { email_id: String, filename: String },
    Logout,
    ShowLogin,
    ShowRegister,
    DismissMessage,
    Quit,
}

impl Action {
    /// The backend request this action makes, if any, so a loading frame
    /// naming it can be drawn first.
    pub fn task(&self) -> Option<Task> {
        match self {
            Action::Login => Some(Task::Login),
            Action::Register => Some(Task::Register),
            Action::Refresh => Some(Task::Refresh),
            Action::Download { .. } => Some(Task::Download),
            Action::Logout => Some(Task::Logout),
            Action::ShowLogin | Action::ShowRegister | Action::DismissMessage | Action::Quit => {
                None
            }
        }
    }
}

/// Text fields of a form, addressed by position.
pub trait FormFields {
    fn labels(&self) -> &'static [&'static str];
    fn value(&self, idx: usize) -> &str;
    fn value_mut(&mut self, idx: usize) -> &mut String;
    fn is_secret(&self, _idx: usize) -> bool {
        false
    }
    fn accepts(&self, _idx: usize, _c: char) -> bool {
        true
    }
}

impl FormFields for LoginForm {
    fn labels(&self) -> &'static [&'static str] {
        &["Email Address", "Password"]
    }

    fn value(&self, idx: usize) -> &str {
        match idx {
            0 => &self.email,
            _ => &self.password,
        }
    }

    fn value_mut(&mut self, idx: usize) -> &mut String {
        match idx {
            0 => &mut self.email,
            _ => &mut self.password,
        }
    }

    fn is_secret(&self, idx: usize) -> bool {
        idx == 1
    }
}

impl FormFields for RegisterForm {
    fn labels(&self) -> &'static [&'static str] {
        &[
            "Email Address",
            "App Password",
            "Email App Password",
            "IMAP Server",
            "Port",
        ]
    }

    fn value(&self, idx: usize) -> &str {
        match idx {
            0 => &self.email,
            1 => &self.password,
            2 => &self.email_password,
            3 => &self.imap_server,
            _ => &self.imap_port,
        }
    }

    fn value_mut(&mut self, idx: usize) -> &mut String {
        match idx {
            0 => &mut self.email,
            1 => &mut self.password,
            2 => &mut self.email_password,
            3 => &mut self.imap_server,
            _ => &mut self.imap_port,
        }
    }

    fn is_secret(&self, idx: usize) -> bool {
        idx == 1 || idx == 2
    }

    fn accepts(&self, idx: usize, c: char) -> bool {
        idx != 4 || (c.is_ascii_digit() && self.imap_port.len() < 5)
    }
}

/// A form plus the index of the focused field.
#[derive(Debug, Clone, PartialEq)]
pub struct FormScreen<F> {
    pub form: F,
    pub field: usize,
}

impl<F: FormFields> FormScreen<F> {
    pub fn new(form: F) -> Self {
        Self { form, field: 0 }
    }

    fn len(&self) -> usize {
        self.form.labels().len()
    }

    pub fn next_field(&mut self) {
        self.field = (self.field + 1) % self.len();
    }

    pub fn prev_field(&mut self) {
        self.field = (self.field + self.len() - 1) % self.len();
    }

    pub fn type_char(&mut self, c: char) {
        if self.form.accepts(self.field, c) {
            self.form.value_mut(self.field).push(c);
        }
    }

    pub fn backspace(&mut self) {
        self.form.value_mut(self.field).pop();
    }
}

/// Selection inside the email list: which email, and which of its attachments.
#[derive(Debug, Default)]
pub struct DashboardState {
    pub list_state: ListState,
    pub attachment: usize,
}

impl DashboardState {
    pub fn selected(&self) -> Option<usize> {
        self.list_state.selected()
    }

    /// Keep the selection valid after the list was replaced.
    pub fn sync(&mut self, emails: &[Email]) {
        let len = emails.len();
        match self.list_state.selected() {
            _ if len == 0 => {
                self.list_state.select(None);
                self.attachment = 0;
            }
            None => {
                self.list_state.select(Some(0));
                self.attachment = 0;
            }
            Some(i) if i >= len => {
                self.list_state.select(Some(len - 1));
                self.attachment = 0;
            }
            Some(_) => {}
        }
        let count = self
            .selected()
            .and_then(|i| emails.get(i))
            .map_or(0, |e| e.attachments.len());
        if self.attachment >= count {
            self.attachment = 0;
        }
    }

    pub fn move_selection(&mut self, delta: i32, len: usize) {
        if len == 0 {
            self.list_state.select(None);
            return;
        }
        let cur = self.list_state.selected().unwrap_or(0) as i32;
        let next = (cur + delta).clamp(0, len as i32 - 1) as usize;
        if Some(next) != self.list_state.selected() {
            self.attachment = 0;
        }
        self.list_state.select(Some(next));
    }

    pub fn cycle_attachment(&mut self, delta: i32, count: usize) {
        if count == 0 {
            self.attachment = 0;
            return;
        }
        let n = count as i32;
        self.attachment = ((self.attachment as i32 + delta).rem_euclid(n)) as usize;
    }

    pub fn selected_attachment<'a>(&self, emails: &'a [Email]) -> Option<(&'a Email, &'a Attachment)> {
        let email = emails.get(self.selected()?)?;
        let attachment = email.attachments.get(self.attachment)?;
        Some((email, attachment))
    }
}

pub struct AppState {
    pub login: FormScreen<LoginForm>,
    pub register: FormScreen<RegisterForm>,
    pub dashboard: DashboardState,
}

impl AppState {
    pub fn new(defaults: &ImapDefaults) -> Self {
        Self {
            login: FormScreen::new(LoginForm::default()),
            register: FormScreen::new(RegisterForm::new(defaults)),
            dashboard: DashboardState::default(),
        }
    }
}
