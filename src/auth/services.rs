use anyhow::Context;
use lazy_static::lazy_static;
use regex::Regex;
use tracing::{debug, info, warn};

use crate::auth::{
    dto::PublicUser,
    error::AuthError,
    password::{hash_password, verify_password},
    repo::UserStore,
    repo_types::NewUser,
};

pub const MIN_PASSWORD_LEN: usize = 8;

const DUMMY_PASSWORD: &str = "Unused-login-placeholder";

lazy_static! {
    static ref DUMMY_HASH: Option<String> = hash_password(DUMMY_PASSWORD).ok();
}

fn has_capital_letter(password: &str) -> bool {
    lazy_static! {
        static ref CAPITAL_RE: Regex = Regex::new(r"[A-Z]").unwrap();
    }
    CAPITAL_RE.is_match(password)
}

/// Registration fields after validation; every one is known to be present.
#[derive(Debug)]
pub struct Registration {
    pub password: String,
    pub email: String,
    pub first_name: String,
    pub last_name: String,
}

/// Checks every field and returns all messages at once.
///
/// Password rules short-circuit (missing, then length, then capital letter);
/// the other fields are checked regardless of earlier failures.
pub fn validate_registration(
    password: Option<String>,
    email: Option<String>,
    first_name: Option<String>,
    last_name: Option<String>,
) -> Result<Registration, Vec<String>> {
    let mut errors = Vec::new();

    match password.as_deref() {
        None => errors.push("Password is missing".to_string()),
        Some(p) if p.chars().count() < MIN_PASSWORD_LEN => {
            errors.push(format!("Password should have at least {MIN_PASSWORD_LEN} characters"));
        }
        Some(p) if !has_capital_letter(p) => {
            errors.push("Password should contain at least one capital letter".to_string());
        }
        Some(_) => {}
    }
    if email.is_none() {
        errors.push("Email is missing".to_string());
    }
    if first_name.is_none() {
        errors.push("First name is missing".to_string());
    }
    if last_name.is_none() {
        errors.push("Last name is missing".to_string());
    }

    if !errors.is_empty() {
        return Err(errors);
    }
    match (password, email, first_name, last_name) {
        (Some(password), Some(email), Some(first_name), Some(last_name)) => Ok(Registration {
            password,
            email,
            first_name,
            last_name,
        }),
        _ => Err(errors),
    }
}

// Argon2 is deliberately slow; keep it off the async workers.
async fn run_blocking<T, F>(f: F) -> Result<T, AuthError>
where
    F: FnOnce() -> anyhow::Result<T> + Send + 'static,
    T: Send + 'static,
{
    tokio::task::spawn_blocking(f)
        .await
        .context("password hashing task failed")
        .and_then(|r| r)
        .map_err(AuthError::Internal)
}

pub async fn register(
    store: &dyn UserStore,
    password: Option<String>,
    email: Option<String>,
    first_name: Option<String>,
    last_name: Option<String>,
) -> Result<PublicUser, AuthError> {
    let reg = validate_registration(password, email, first_name, last_name).map_err(|errors| {
        warn!(?errors, "registration rejected");
        AuthError::Validation(errors)
    })?;

    if store.find_by_email(&reg.email).await?.is_some() {
        warn!(email = %reg.email, "email already registered");
        return Err(AuthError::DuplicateEmail);
    }

    let Registration {
        password,
        email,
        first_name,
        last_name,
    } = reg;
    let password_hash = run_blocking(move || hash_password(&password)).await?;

    // The store's unique index still decides if another request won the race.
    let user = store
        .create(NewUser {
            email,
            password_hash,
            first_name,
            last_name,
        })
        .await
        .inspect_err(|e| warn!(error = %e, "create user failed"))?;

    info!(user_id = user.id, email = %user.email, "user registered");
    Ok(user.into())
}

/// Verifies `plain` against `stored`, or against a fixed stand-in hash when
/// there is no user. Both paths pay the same Argon2 cost; the stand-in never
/// counts as a match.
async fn check_password(stored: Option<String>, plain: &str) -> Result<bool, AuthError> {
    let plain = plain.to_owned();
    run_blocking(move || match stored {
        Some(stored) => verify_password(&plain, &stored),
        None => {
            if let Some(dummy) = DUMMY_HASH.as_deref() {
                verify_password(&plain, dummy)?;
            }
            Ok(false)
        }
    })
    .await
}

pub async fn login(
    store: &dyn UserStore,
    email: &str,
    password: &str,
) -> Result<PublicUser, AuthError> {
    let user = store.find_by_email(email).await?;
    let stored = user.as_ref().map(|u| u.password_hash.clone());
    let ok = check_password(stored, password).await?;

    match user {
        Some(user) if ok => {
            debug!(user_id = user.id, "credentials verified");
            Ok(user.into())
        }
        Some(user) => {
            warn!(email = %email, user_id = user.id, "login invalid password");
            Err(AuthError::InvalidCredentials)
        }
        None => {
            warn!(email = %email, "login unknown email");
            Err(AuthError::InvalidCredentials)
        }
    }
}

pub async fn find_user(store: &dyn UserStore, id: i64) -> Result<Option<PublicUser>, AuthError> {
    Ok(store.find_by_id(id).await?.map(PublicUser::from))
}
