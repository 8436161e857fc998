// crates/registry-cli/src/commands/user.rs
// ============================================================================
// Module: User Commands
// Description: `login`, `logout`, `register`, and `account`.
// Purpose: Manage the signed-in session and inspect user profiles.
// Dependencies: crate::client, crate::session
// ============================================================================

use clap::Args;

use crate::client::RegistryClient;
use crate::commands::client_with_session;
use crate::config::Config;
use crate::error::CliResult;
use crate::output::write_stdout_line;
use crate::session;
use crate::session::Session;

/// Arguments for `knot login`.
#[derive(Args, Debug)]
pub struct LoginArgs {
    /// Account username.
    pub username: String,
    /// Account password.
    pub password: String,
}

/// Arguments for `knot register`.
#[derive(Args, Debug)]
pub struct RegisterArgs {
    /// Desired username.
    pub username: String,
    /// Contact email.
    pub email: String,
    /// Account password.
    pub password: String,
}

/// Arguments for `knot account`.
#[derive(Args, Debug)]
pub struct AccountArgs {
    /// Username to look up; defaults to the signed-in user.
    pub username: Option<String>,
}

/// Executes `knot login`.
pub async fn login(config: &Config, args: LoginArgs) -> CliResult<()> {
    let client = RegistryClient::new(&config.url, None);
    let token = client.login(&args.username, &args.password).await?;

    session::save_session(&Session {
        username: args.username.clone(),
        token: token.access_token,
    })?;

    write_stdout_line(&format!("Success! Authorized as {}", args.username))?;
    Ok(())
}

/// Executes `knot logout`.
pub fn logout() -> CliResult<()> {
    let current = session::get_session()?;
    session::remove_session()?;

    match current {
        Some(session) => write_stdout_line(&format!("Success! Logged out of {}", session.username))?,
        None => write_stdout_line("Already logged out.")?,
    }

    Ok(())
}

/// Executes `knot register`.
pub async fn register(config: &Config, args: RegisterArgs) -> CliResult<()> {
    let client = RegistryClient::new(&config.url, None);
    let user = client.register(&args.username, &args.email, &args.password).await?;
    write_stdout_line(&format!("Registration successful! Welcome, {}.", user.username))?;

    let token = client.login(&args.username, &args.password).await?;
    session::save_session(&Session {
        username: args.username.clone(),
        token: token.access_token,
    })?;
    write_stdout_line(&format!("Success! Authorized as {}", args.username))?;
    Ok(())
}

/// Executes `knot account [username]`.
pub async fn account(config: &Config, args: AccountArgs) -> CliResult<()> {
    let current = session::require_session()?;
    let client = client_with_session(config, Some(&current));
    let username = args.username.unwrap_or_else(|| current.username.clone());

    let user = client.get_user(&username).await?;

    write_stdout_line(&format!("Username: {}", user.username))?;
    write_stdout_line(&format!("Email: {}", user.email))?;
    write_stdout_line(&format!("Registered: {}", user.registered))?;

    if user.namespaces.is_empty() {
        write_stdout_line("Member of namespaces: (none)")?;
    } else {
        write_stdout_line(&format!("Member of namespaces: {}", user.namespaces.join(", ")))?;
    }

    Ok(())
}
