//! Input checks shared by the services. Every failure is a
//! [`CoreError::Validation`] with a message suitable for the client.

use pisalist_shared::constants::{
    MAX_EMAIL_CHARS, MAX_EVENT_CHARS, MAX_IMPORTANCE, MAX_USERNAME_CHARS, MIN_IMPORTANCE,
    MIN_PASSWORD_CHARS, MIN_USERNAME_CHARS,
};
use pisalist_shared::{CoreError, CoreResult, Importance};

pub fn event(event: &str) -> CoreResult<()> {
    if event.trim().is_empty() {
        return Err(CoreError::validation("event must not be empty"));
    }
    if event.chars().count() > MAX_EVENT_CHARS {
        return Err(CoreError::validation(format!(
            "event must be at most {MAX_EVENT_CHARS} characters"
        )));
    }
    Ok(())
}

pub fn importance(level: i64) -> CoreResult<Importance> {
    Importance::new(level).ok_or_else(|| {
        CoreError::validation(format!(
            "importance_level must be between {MIN_IMPORTANCE} and {MAX_IMPORTANCE}"
        ))
    })
}

pub fn username(username: &str) -> CoreResult<()> {
    let len = username.chars().count();
    if !(MIN_USERNAME_CHARS..=MAX_USERNAME_CHARS).contains(&len) {
        return Err(CoreError::validation(format!(
            "username must be {MIN_USERNAME_CHARS}-{MAX_USERNAME_CHARS} characters"
        )));
    }
    Ok(())
}

pub fn password(password: &str) -> CoreResult<()> {
    if password.chars().count() < MIN_PASSWORD_CHARS {
        return Err(CoreError::validation(format!(
            "password must be at least {MIN_PASSWORD_CHARS} characters"
        )));
    }
    Ok(())
}

/// Accepts `local@domain.tld` without whitespace.
pub fn email(email: &str) -> CoreResult<()> {
    let invalid = || CoreError::validation("email address is invalid");

    if email.chars().count() > MAX_EMAIL_CHARS || email.chars().any(char::is_whitespace) {
        return Err(invalid());
    }

    let (local, domain) = email.split_once('@').ok_or_else(invalid)?;
    if local.is_empty() || domain.contains('@') {
        return Err(invalid());
    }

    let (host, tld) = domain.rsplit_once('.').ok_or_else(invalid)?;
    if host.is_empty() || tld.is_empty() {
        return Err(invalid());
    }
    Ok(())
}
