//! Who is logged in, and the login form that gets them there.

use std::fmt;

use ratatui::crossterm::event::{KeyCode, KeyEvent};
use tracing::info;

use crate::inputter::Inputter;

pub const MSG_FIELDS_REQUIRED: &str = "All fields are required";
pub const MSG_INVALID_CREDENTIALS: &str = "Invalid credentials. Please try again.";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Role {
    Admin,
    Validator,
    User,
}

impl Role {
    pub const ALL: [Role; 3] = [Role::Admin, Role::Validator, Role::User];

    pub fn label(&self) -> &'static str {
        match self {
            Role::Admin => "Administrator",
            Role::Validator => "Validator",
            Role::User => "Regular User",
        }
    }

    pub fn parse(s: &str) -> Option<Role> {
        match s.to_ascii_lowercase().as_str() {
            "admin" => Some(Role::Admin),
            "validator" => Some(Role::Validator),
            "user" => Some(Role::User),
            _ => None,
        }
    }
}

impl fmt::Display for Role {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            Role::Admin => "admin",
            Role::Validator => "validator",
            Role::User => "user",
        };
        f.write_str(s)
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct User {
    pub id: String,
    pub name: String,
    pub role: Role,
    pub username: String,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Credentials {
    pub username: String,
    pub password: String,
    pub role: Role,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LoginError {
    MissingFields,
    InvalidCredentials,
}

impl LoginError {
    pub fn message(&self) -> &'static str {
        match self {
            LoginError::MissingFields => MSG_FIELDS_REQUIRED,
            LoginError::InvalidCredentials => MSG_INVALID_CREDENTIALS,
        }
    }
}

/// Read access to the logged in user, plus the two transitions that change it.
pub trait Session {
    fn current_user(&self) -> Option<&User>;
    fn login(&mut self, credentials: &Credentials) -> Result<&User, LoginError>;
    fn logout(&mut self);

    fn is_authenticated(&self) -> bool {
        self.current_user().is_some()
    }
}

/// Accepts any non-empty credentials.
#[derive(Debug, Default)]
pub struct MockSession {
    user: Option<User>,
}

impl Session for MockSession {
    fn current_user(&self) -> Option<&User> {
        self.user.as_ref()
    }

    fn login(&mut self, credentials: &Credentials) -> Result<&User, LoginError> {
        if credentials.username.trim().is_empty() || credentials.password.is_empty() {
            return Err(LoginError::InvalidCredentials);
        }
        info!("Login as {} ({})", credentials.username, credentials.role);
        Ok(&*self.user.insert(User {
            id: "1".to_string(),
            name: credentials.username.clone(),
            role: credentials.role,
            username: credentials.username.clone(),
        }))
    }

    fn logout(&mut self) {
        if let Some(user) = self.user.take() {
            info!("Logout {}", user.username);
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LoginField {
    Username,
    Password,
    Role,
}

impl LoginField {
    fn next(self) -> Self {
        match self {
            LoginField::Username => LoginField::Password,
            LoginField::Password => LoginField::Role,
            LoginField::Role => LoginField::Username,
        }
    }

    fn prev(self) -> Self {
        match self {
            LoginField::Username => LoginField::Role,
            LoginField::Password => LoginField::Username,
            LoginField::Role => LoginField::Password,
        }
    }
}

pub struct LoginForm {
    pub username: Inputter,
    pub password: Inputter,
    pub role: Option<Role>,
    pub focus: LoginField,
    pub error: Option<&'static str>,
    pub submitting: bool,
}

impl Default for LoginForm {
    fn default() -> Self {
        Self {
            username: Inputter::default(),
            password: Inputter::default(),
            role: None,
            focus: LoginField::Username,
            error: None,
            submitting: false,
        }
    }
}

impl LoginForm {
    /// Handles one key. Returns the credentials when the form was submitted
    /// and all fields are filled in.
    pub fn read(&mut self, key: KeyEvent) -> Option<Credentials> {
        if self.submitting {
            return None;
        }
        match key.code {
            KeyCode::Tab | KeyCode::Down => {
                self.focus = self.focus.next();
                None
            }
            KeyCode::BackTab | KeyCode::Up => {
                self.focus = self.focus.prev();
                None
            }
            KeyCode::Enter => self.submit(),
            _ => {
                match self.focus {
                    LoginField::Username => {
                        self.username.read(key);
                    }
                    LoginField::Password => {
                        self.password.read(key);
                    }
                    LoginField::Role => self.cycle_role(key.code),
                }
                None
            }
        }
    }

    pub fn submit(&mut self) -> Option<Credentials> {
        self.error = None;
        match (self.username.value(), self.password.value(), self.role) {
            (u, p, Some(role)) if !u.is_empty() && !p.is_empty() => {
                self.submitting = true;
                Some(Credentials {
                    username: u.to_string(),
                    password: p.to_string(),
                    role,
                })
            }
            _ => {
                self.error = Some(LoginError::MissingFields.message());
                None
            }
        }
    }

    pub fn fail(&mut self, err: &LoginError) {
        self.submitting = false;
        self.error = Some(err.message());
    }

    pub fn reset(&mut self) {
        *self = Self::default();
    }

    fn cycle_role(&mut self, code: KeyCode) {
        let idx = self.role.and_then(|r| Role::ALL.iter().position(|&x| x == r));
        self.role = match (code, idx) {
            (KeyCode::Right | KeyCode::Char(' '), None) => Some(Role::ALL[0]),
            (KeyCode::Right | KeyCode::Char(' '), Some(i)) => Some(Role::ALL[(i + 1) % Role::ALL.len()]),
            (KeyCode::Left, None) => Some(Role::ALL[Role::ALL.len() - 1]),
            (KeyCode::Left, Some(i)) => Some(Role::ALL[(i + Role::ALL.len() - 1) % Role::ALL.len()]),
            (KeyCode::Backspace | KeyCode::Delete, _) => None,
            _ => self.role,
        };
    }
}
