use crate::data::identity::{validate_sign_up, FieldError};
use crate::data::persistence::get_data_dir;
use crate::data::{Identity, LocalIdentity};
use anyhow::{bail, Context, Result};
use std::io::Write;
use std::path::Path;

fn open_identity() -> Result<LocalIdentity> {
    LocalIdentity::open(&get_data_dir()?)
}

/// Id of the signed-in user, or an error telling the user how to sign in.
pub(crate) fn require_user(dir: &Path) -> Result<String> {
    LocalIdentity::open(dir)?
        .current_user_id()
        .context("Not signed in. Run `schengen signin` or `schengen signup` first.")
}

fn write_field_errors<W: Write>(errors: &[FieldError], out: &mut W) -> Result<()> {
    for e in errors {
        writeln!(out, "  {}: {}", e.field, e.message)?;
    }
    Ok(())
}

pub fn signup(email: &str, username: &str, password: &str, confirm: Option<&str>) -> Result<()> {
    let mut identity = open_identity()?;
    sign_up_with(
        &mut identity,
        email,
        username,
        password,
        confirm,
        &mut std::io::stdout(),
    )
}

pub(crate) fn sign_up_with<W: Write>(
    identity: &mut dyn Identity,
    email: &str,
    username: &str,
    password: &str,
    confirm: Option<&str>,
    out: &mut W,
) -> Result<()> {
    let errors = validate_sign_up(username, email, password, confirm);
    if !errors.is_empty() {
        write_field_errors(&errors, out)?;
        bail!("sign-up form is invalid");
    }
    identity.sign_up(email, password, username)?;
    writeln!(out, "Signed up and signed in as {} <{}>", username.trim(), email.trim())?;
    Ok(())
}

pub fn signin(email: &str, password: &str) -> Result<()> {
    let mut identity = open_identity()?;
    sign_in_with(&mut identity, email, password, &mut std::io::stdout())
}

pub(crate) fn sign_in_with<W: Write>(
    identity: &mut dyn Identity,
    email: &str,
    password: &str,
    out: &mut W,
) -> Result<()> {
    identity.sign_in(email, password)?;
    writeln!(out, "Signed in as {}", email.trim())?;
    Ok(())
}

pub fn signout() -> Result<()> {
    let mut identity = open_identity()?;
    identity.sign_out()?;
    println!("Signed out.");
    Ok(())
}

pub fn whoami() -> Result<()> {
    let identity = open_identity()?;
    write_whoami(&identity, &mut std::io::stdout())
}

pub(crate) fn write_whoami<W: Write>(identity: &LocalIdentity, out: &mut W) -> Result<()> {
    match identity.current_user() {
        Some(user) => writeln!(out, "{} <{}>", user.username, user.email)?,
        None => writeln!(out, "Not signed in.")?,
    }
    Ok(())
}
