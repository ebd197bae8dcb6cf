//! Session controller: owns what the views show and talks to the backend.

pub mod forms;

use anyhow::{Result, anyhow};
use log::{debug, info, warn};
use std::path::{Path, PathBuf};

use crate::api::{ApiClient, ApiError, Backend};
use crate::auth::{TokenStore, open_token_store};
use crate::config::{Config, resolve_download_dir};
use crate::domain::email::Email;
use crate::domain::session::{Session, UserProfile};
use crate::download::save_attachment;
use forms::{ImapDefaults, LoginForm, RegisterForm};

pub const SESSION_EXPIRED: &str = "Session expired. Please login again.";
pub const LOGIN_OK: &str = "Login successful!";
pub const REGISTER_OK: &str = "Registration successful! Please login.";

/// The backend request currently in flight.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Task {
    Login,
    Register,
    Refresh,
    Download,
    Logout,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum View {
    #[default]
    Login,
    Register,
    Dashboard,
}

pub struct Portal {
    backend: Box<dyn Backend>,
    tokens: Box<dyn TokenStore>,
    download_dir: PathBuf,
    imap_defaults: ImapDefaults,

    session: Option<Session>,
    emails: Vec<Email>,
    view: View,
    loading: Option<Task>,
    error: Option<String>,
    success: Option<String>,
}

impl Portal {
    pub fn new(
        backend: Box<dyn Backend>,
        tokens: Box<dyn TokenStore>,
        download_dir: PathBuf,
        imap_defaults: ImapDefaults,
    ) -> Self {
        Self {
            backend,
            tokens,
            download_dir,
            imap_defaults,
            session: None,
            emails: Vec::new(),
            view: View::Login,
            loading: None,
            error: None,
            success: None,
        }
    }

    /// Wire up the HTTP client and token store described by `cfg`.
    pub fn from_config(cfg: &Config, api_url: Option<&str>) -> Result<Self> {
        let base = cfg.api_base_url(api_url);
        let client = ApiClient::new(&base, cfg.request_timeout())
            .map_err(|e| anyhow!("backend url '{base}': {e}"))?;
        info!("using backend {}", client.base_url());
        Ok(Self::new(
            Box::new(client),
            open_token_store(cfg.token_backend())?,
            resolve_download_dir(cfg),
            cfg.imap_defaults(),
        ))
    }

    // ----- state -----

    pub fn view(&self) -> View {
        self.view
    }

    pub fn user(&self) -> Option<&UserProfile> {
        self.session.as_ref().map(|s| &s.user)
    }

    pub fn emails(&self) -> &[Email] {
        &self.emails
    }

    pub fn is_loading(&self) -> bool {
        self.loading.is_some()
    }

    pub fn task(&self) -> Option<Task> {
        self.loading
    }

    pub fn error(&self) -> Option<&str> {
        self.error.as_deref()
    }

    pub fn success(&self) -> Option<&str> {
        self.success.as_deref()
    }

    pub fn imap_defaults(&self) -> &ImapDefaults {
        &self.imap_defaults
    }

    pub fn download_dir(&self) -> &Path {
        &self.download_dir
    }

    pub fn token_store(&self) -> &dyn TokenStore {
        self.tokens.as_ref()
    }

    /// Flag a request as in flight so the next frame can show it. The
    /// operation itself clears the flag when it returns.
    pub fn mark_loading(&mut self, task: Task) {
        self.loading = Some(task);
    }

    // ----- view switching -----

    pub fn show_login(&mut self) {
        if self.session.is_none() {
            self.view = View::Login;
        }
    }

    pub fn show_register(&mut self) {
        if self.session.is_none() {
            self.view = View::Register;
        }
    }

    pub fn dismiss_error(&mut self) {
        self.error = None;
    }

    pub fn dismiss_success(&mut self) {
        self.success = None;
    }

    // ----- operations -----

    /// Resume a stored session, if any.
    pub fn restore(&mut self) {
        match self.tokens.load() {
            Ok(Some(token)) => {
                debug!("found stored token, checking profile");
                self.fetch_profile(&token);
            }
            Ok(None) => debug!("no stored session"),
            Err(e) => {
                warn!("could not read stored session: {e}");
                self.error = Some(format!("Could not read stored session: {e}"));
            }
        }
    }

    /// Any failure here means the token is unusable and the session ends.
    pub fn fetch_profile(&mut self, token: &str) {
        match self.backend.profile(token) {
            Ok(user) => {
                info!("session active for {}", user.email);
                self.session = Some(Session {
                    token: token.to_string(),
                    user,
                });
                self.view = View::Dashboard;
                self.error = None;
                self.success = None;
                self.fetch_emails();
            }
            Err(e) => {
                warn!("profile fetch failed: {e}");
                self.expire_session();
            }
        }
    }

    pub fn login(&mut self, form: &LoginForm) {
        self.error = None;
        self.success = None;
        if let Err(msg) = form.validate() {
            self.loading = None;
            self.error = Some(msg);
            return;
        }

        self.loading = Some(Task::Login);
        match self.backend.login(&form.credentials()) {
            Ok(resp) => match self.tokens.save(&resp.access_token) {
                Ok(()) => {
                    self.fetch_profile(&resp.access_token);
                    if self.session.is_some() {
                        self.success = Some(LOGIN_OK.to_string());
                    }
                }
                Err(e) => {
                    warn!("could not persist token: {e}");
                    self.error = Some(format!("Could not store session: {e}"));
                }
            },
            Err(e) => {
                warn!("login failed: {e}");
                self.error = Some(e.to_string());
            }
        }
        self.loading = None;
    }

    /// Success only means the backend accepted the account; IMAP credentials
    /// are checked later, when emails are fetched.
    pub fn register(&mut self, form: &RegisterForm) {
        self.error = None;
        self.success = None;
        if let Err(msg) = form.validate() {
            self.loading = None;
            self.error = Some(msg);
            return;
        }

        self.loading = Some(Task::Register);
        match self
            .backend
            .register(&form.registration(&self.imap_defaults))
        {
            Ok(()) => {
                info!("registered {}", form.email.trim());
                self.view = View::Login;
                self.success = Some(REGISTER_OK.to_string());
            }
            Err(e) => {
                warn!("registration failed: {e}");
                self.error = Some(e.to_string());
            }
        }
        self.loading = None;
    }

    pub fn fetch_emails(&mut self) {
        let Some(token) = self.token() else {
            debug!("fetch_emails without a session");
            return;
        };

        self.error = None;
        self.success = None;
        self.loading = Some(Task::Refresh);
        match self.backend.emails(&token) {
            Ok(emails) => {
                info!("fetched {} emails", emails.len());
                self.emails = emails;
            }
            Err(e) => self.request_failed("Failed to fetch emails", e),
        }
        self.loading = None;
    }

    pub fn download_attachment(&mut self, email_id: &str, filename: &str) {
        let Some(token) = self.token() else {
            debug!("download without a session");
            return;
        };

        self.error = None;
        self.success = None;
        self.loading = Some(Task::Download);
        match self.backend.attachment(&token, email_id, filename) {
            Ok(bytes) => match save_attachment(&self.download_dir, filename, &bytes) {
                Ok(path) => self.success = Some(format!("Saved {}", path.display())),
                Err(e) => {
                    warn!("could not save {filename}: {e}");
                    self.error = Some(format!("Failed to download attachment: {e}"));
                }
            },
            Err(e) => self.request_failed("Failed to download attachment", e),
        }
        self.loading = None;
    }

    /// Always ends the local session, whatever the backend says.
    pub fn logout(&mut self) {
        let token = self
            .token()
            .or_else(|| self.tokens.load().ok().flatten());
        if let Some(token) = token
            && let Err(e) = self.backend.logout(&token)
        {
            debug!("backend logout failed: {e}");
        }

        self.drop_session();
        self.loading = None;
        self.error = None;
        self.success = None;
        info!("logged out");
    }

    // ----- helpers -----

    fn token(&self) -> Option<String> {
        self.session.as_ref().map(|s| s.token.clone())
    }

    fn request_failed(&mut self, what: &str, e: ApiError) {
        if e.is_unauthorized() {
            warn!("{what}: token rejected");
            self.expire_session();
        } else {
            warn!("{what}: {e}");
            self.error = Some(format!("{what}: {e}"));
        }
    }

    fn expire_session(&mut self) {
        self.drop_session();
        self.success = None;
        self.error = Some(SESSION_EXPIRED.to_string());
    }

    fn drop_session(&mut self) {
        if let Err(e) = self.tokens.clear() {
            warn!("could not clear stored token: {e}");
        }
        self.session = None;
        self.emails.clear();
        self.view = View::Login;
    }
}
