use crate::data::persistence::Persistable;
use regex::Regex;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::path::{Path, PathBuf};
use std::sync::LazyLock;
use thiserror::Error;
use tracing::{info, warn};
use uuid::Uuid;

pub const PASSWORD_MIN_LENGTH: usize = 6;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Field {
    Username,
    Email,
    Password,
    ConfirmPassword,
}

impl fmt::Display for Field {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Field::Username => "username",
            Field::Email => "email",
            Field::Password => "password",
            Field::ConfirmPassword => "confirm password",
        };
        f.write_str(name)
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FieldError {
    pub field: Field,
    pub message: String,
}

impl FieldError {
    fn new(field: Field, message: &str) -> Self {
        FieldError {
            field,
            message: message.to_string(),
        }
    }
}

fn join_messages(errors: &[FieldError]) -> String {
    errors
        .iter()
        .map(|e| e.message.as_str())
        .collect::<Vec<_>>()
        .join("; ")
}

#[derive(Debug, Error)]
pub enum AuthError {
    #[error("Invalid email or password!")]
    InvalidCredentials,
    #[error("Email already in use!")]
    EmailInUse,
    #[error("{}", join_messages(.0))]
    Validation(Vec<FieldError>),
    #[error(transparent)]
    Storage(#[from] anyhow::Error),
}

/// Credential service: who is signed in, and how to become signed in.
pub trait Identity {
    fn sign_in(&mut self, email: &str, password: &str) -> Result<(), AuthError>;
    fn sign_up(&mut self, email: &str, password: &str, username: &str) -> Result<(), AuthError>;
    fn sign_out(&mut self) -> Result<(), AuthError>;
    fn current_user_id(&self) -> Option<String>;
}

// ── Validation ────────────────────────────────────────────────────────────────

static EMAIL: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^[^@\s]+@[^@\s.]+(\.[^@\s.]+)+$").expect("email pattern")
});

fn is_valid_email(email: &str) -> bool {
    EMAIL.is_match(email)
}

fn check_email(email: &str, errors: &mut Vec<FieldError>) {
    if email.is_empty() {
        errors.push(FieldError::new(Field::Email, "Email is required"));
    } else if !is_valid_email(email) {
        errors.push(FieldError::new(Field::Email, "Invalid email"));
    }
}

fn check_password(password: &str, errors: &mut Vec<FieldError>) {
    if password.is_empty() {
        errors.push(FieldError::new(Field::Password, "Password is required"));
    } else if password.chars().count() < PASSWORD_MIN_LENGTH {
        errors.push(FieldError::new(
            Field::Password,
            "Password must be at least 6 characters",
        ));
    }
}

pub fn validate_sign_in(email: &str, password: &str) -> Vec<FieldError> {
    let mut errors = Vec::new();
    check_email(email.trim(), &mut errors);
    check_password(password, &mut errors);
    errors
}

/// `confirm` is checked only when the caller collected one.
pub fn validate_sign_up(
    username: &str,
    email: &str,
    password: &str,
    confirm: Option<&str>,
) -> Vec<FieldError> {
    let mut errors = Vec::new();
    if username.trim().is_empty() {
        errors.push(FieldError::new(Field::Username, "Username is required"));
    }
    check_email(email.trim(), &mut errors);
    check_password(password, &mut errors);
    match confirm {
        Some("") => errors.push(FieldError::new(
            Field::ConfirmPassword,
            "Confirm password is required",
        )),
        Some(c) if c != password => {
            errors.push(FieldError::new(Field::ConfirmPassword, "Passwords must match"))
        }
        _ => {}
    }
    errors
}

// ── Local file-backed identity ────────────────────────────────────────────────

#[derive(Serialize, Deserialize, Clone, Debug)]
pub struct UserRecord {
    pub id: String,
    pub username: String,
    pub email: String,
    pub password_hash: String,
}

#[derive(Serialize, Deserialize, Default, Debug)]
struct UserData {
    users: Vec<UserRecord>,
}

impl Persistable for UserData {
    fn filename() -> &'static str {
        "users.yaml"
    }
    fn is_json() -> bool {
        false
    }
}

#[derive(Serialize, Deserialize, Default, Debug)]
struct Session {
    user_id: Option<String>,
}

impl Persistable for Session {
    fn filename() -> &'static str {
        "session.json"
    }
    fn is_json() -> bool {
        true
    }
}

/// Users in `users.yaml`, the signed-in user in `session.json`.
pub struct LocalIdentity {
    dir: PathBuf,
    users: UserData,
    session: Session,
    cost: u32,
}

impl LocalIdentity {
    pub fn open(dir: &Path) -> anyhow::Result<Self> {
        Ok(LocalIdentity {
            dir: dir.to_path_buf(),
            users: UserData::load_from(dir)?,
            session: Session::load_from(dir)?,
            cost: bcrypt::DEFAULT_COST,
        })
    }

    /// Overrides the bcrypt work factor.
    #[cfg(test)]
    pub fn with_cost(mut self, cost: u32) -> Self {
        self.cost = cost;
        self
    }

    pub fn current_user(&self) -> Option<&UserRecord> {
        let id = self.session.user_id.as_deref()?;
        self.users.users.iter().find(|u| u.id == id)
    }

    fn find_by_email(&self, email: &str) -> Option<&UserRecord> {
        self.users
            .users
            .iter()
            .find(|u| u.email.eq_ignore_ascii_case(email))
    }

    fn start_session(&mut self, user_id: String) -> Result<(), AuthError> {
        self.session.user_id = Some(user_id);
        self.session.save_to(&self.dir)?;
        Ok(())
    }
}

impl Identity for LocalIdentity {
    fn sign_in(&mut self, email: &str, password: &str) -> Result<(), AuthError> {
        let errors = validate_sign_in(email, password);
        if !errors.is_empty() {
            return Err(AuthError::Validation(errors));
        }
        let email = email.trim();
        let user = self.find_by_email(email).ok_or_else(|| {
            warn!(email, "sign-in for unknown email");
            AuthError::InvalidCredentials
        })?;
        let matches = bcrypt::verify(password, &user.password_hash)
            .map_err(|e| anyhow::anyhow!("failed to verify password: {e}"))?;
        if !matches {
            warn!(email, "sign-in with wrong password");
            return Err(AuthError::InvalidCredentials);
        }
        let id = user.id.clone();
        self.start_session(id)?;
        info!(email, "signed in");
        Ok(())
    }

    fn sign_up(&mut self, email: &str, password: &str, username: &str) -> Result<(), AuthError> {
        let errors = validate_sign_up(username, email, password, None);
        if !errors.is_empty() {
            return Err(AuthError::Validation(errors));
        }
        let email = email.trim();
        if self.find_by_email(email).is_some() {
            return Err(AuthError::EmailInUse);
        }
        let password_hash = bcrypt::hash(password, self.cost)
            .map_err(|e| anyhow::anyhow!("failed to hash password: {e}"))?;
        let user = UserRecord {
            id: Uuid::new_v4().to_string(),
            username: username.trim().to_string(),
            email: email.to_string(),
            password_hash,
        };
        let id = user.id.clone();
        self.users.users.push(user);
        self.users.save_to(&self.dir)?;
        self.start_session(id)?;
        info!(email, "signed up");
        Ok(())
    }

    fn sign_out(&mut self) -> Result<(), AuthError> {
        self.session.user_id = None;
        self.session.save_to(&self.dir)?;
        info!("signed out");
        Ok(())
    }

    fn current_user_id(&self) -> Option<String> {
        self.current_user().map(|u| u.id.clone())
    }
}
