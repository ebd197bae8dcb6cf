use crate::api::types::{Credentials, Registration};

/// IMAP settings prefilled in the register form and used when a field is left blank.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ImapDefaults {
    pub server: String,
    pub port: u16,
}

impl Default for ImapDefaults {
    fn default() -> Self {
        Self {
            server: "imap.gmail.com".to_string(),
            port: 993,
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct LoginForm {
    pub email: String,
    pub password: String,
}

impl LoginForm {
    pub fn validate(&self) -> Result<(), String> {
        check_email(&self.email)?;
        require("Password", &self.password)
    }

    pub fn credentials(&self) -> Credentials {
        Credentials {
            email: self.email.trim().to_string(),
            password: self.password.clone(),
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct RegisterForm {
    pub email: String,
    /// Password for the portal account.
    pub password: String,
    /// App password the backend uses to log in to the mailbox.
    pub email_password: String,
    pub imap_server: String,
    /// Kept as typed; parsed on submit.
    pub imap_port: String,
}

impl RegisterForm {
    pub fn new(defaults: &ImapDefaults) -> Self {
        Self {
            email: String::new(),
            password: String::new(),
            email_password: String::new(),
            imap_server: defaults.server.clone(),
            imap_port: defaults.port.to_string(),
        }
    }

    pub fn validate(&self) -> Result<(), String> {
        check_email(&self.email)?;
        require("App Password", &self.password)?;
        require("Email App Password", &self.email_password)
    }

    /// Blank server and blank, zero or non-numeric port fall back to `defaults`.
    pub fn registration(&self, defaults: &ImapDefaults) -> Registration {
        let server = self.imap_server.trim();
        let port = self
            .imap_port
            .trim()
            .parse::<u16>()
            .ok()
            .filter(|p| *p != 0)
            .unwrap_or(defaults.port);
        Registration {
            email: self.email.trim().to_string(),
            password: self.password.clone(),
            imap_server: if server.is_empty() {
                defaults.server.clone()
            } else {
                server.to_string()
            },
            imap_port: port,
            email_password: self.email_password.clone(),
        }
    }
}

fn require(label: &str, value: &str) -> Result<(), String> {
    if value.is_empty() {
        Err(format!("{label} is required"))
    } else {
        Ok(())
    }
}

fn check_email(value: &str) -> Result<(), String> {
    let value = value.trim();
    require("Email Address", value)?;
    match value.split_once('@') {
        Some((local, domain)) if !local.is_empty() && !domain.is_empty() => Ok(()),
        _ => Err(format!("'{value}' is not a valid email address")),
    }
}
