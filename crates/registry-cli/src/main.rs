// crates/registry-cli/src/main.rs
// ============================================================================
// Module: Registry CLI Entry Point
// Description: Command dispatcher for the `knot` package registry client.
// Purpose: Parse arguments, load config, and route to the right command.
// Dependencies: clap, registry-core, reqwest, tokio
// ============================================================================

//! ## Overview
//! Every subcommand returns a `CliResult<()>`; `main` is the only place that
//! turns an `Err` into a printed message and a nonzero exit code.

mod client;
mod commands;
mod config;
mod error;
mod manifest;
mod output;
mod session;
mod spec;

use std::process::ExitCode;

use clap::Parser;
use clap::Subcommand;

use crate::commands::namespace::NamespaceCommand;
use crate::commands::package::DownloadArgs;
use crate::commands::package::InfoArgs;
use crate::commands::package::ListArgs;
use crate::commands::package::PkgCommand;
use crate::commands::package::PublishArgs;
use crate::commands::package::TagCommand;
use crate::commands::package::UnpublishArgs;
use crate::commands::user::AccountArgs;
use crate::commands::user::LoginArgs;
use crate::commands::user::RegisterArgs;
use crate::config::Config;
use crate::error::CliResult;
use crate::output::emit_error;

/// Top-level CLI definition.
#[derive(Parser, Debug)]
#[command(name = "knot", disable_help_subcommand = true, arg_required_else_help = true)]
struct Cli {
    /// Registry server base URL, overriding the saved config for this invocation.
    #[arg(long, global = true)]
    url: Option<String>,
    /// Selected subcommand to execute.
    #[command(subcommand)]
    command: Commands,
}

/// Supported CLI subcommands.
#[derive(Subcommand, Debug)]
enum Commands {
    /// Sign in to the registry.
    Login(LoginArgs),
    /// Sign out of the current session.
    Logout,
    /// Register a new account.
    Register(RegisterArgs),
    /// Show information about a user.
    Account(AccountArgs),
    /// Manage namespaces, their members, and their roles.
    Namespace {
        /// Selected namespace subcommand.
        #[command(subcommand)]
        command: NamespaceCommand,
    },
    /// List known packages.
    List(ListArgs),
    /// Show a package's metadata, versions, and tags.
    Info(InfoArgs),
    /// Download a package version's tarball.
    Download(DownloadArgs),
    /// Manage packages.
    Pkg {
        /// Selected package-management subcommand.
        #[command(subcommand)]
        command: PkgCommand,
    },
    /// Manage a package's tags.
    Tag {
        /// Selected tag subcommand.
        #[command(subcommand)]
        command: TagCommand,
    },
    /// Publish a version from a manifest file.
    Publish(PublishArgs),
    /// Remove a published version.
    Unpublish(UnpublishArgs),
    /// List every permission code the server recognizes.
    Permissions,
}

/// CLI entry point returning an exit code.
#[tokio::main(flavor = "multi_thread")]
async fn main() -> ExitCode {
    match run().await {
        Ok(()) => ExitCode::SUCCESS,
        Err(error) => emit_error(&error.to_string()),
    }
}

async fn run() -> CliResult<()> {
    let cli = Cli::parse();
    let mut config = Config::load()?;

    if let Some(url) = cli.url {
        config.url = url;
    }

    match cli.command {
        Commands::Login(args) => commands::user::login(&config, args).await,
        Commands::Logout => commands::user::logout(),
        Commands::Register(args) => commands::user::register(&config, args).await,
        Commands::Account(args) => commands::user::account(&config, args).await,
        Commands::Namespace {
            command,
        } => commands::namespace::run(&config, command).await,
        Commands::List(args) => commands::package::list(&config, args).await,
        Commands::Info(args) => commands::package::info(&config, args).await,
        Commands::Download(args) => commands::package::download(&config, args).await,
        Commands::Pkg {
            command,
        } => commands::package::run_pkg(&config, command).await,
        Commands::Tag {
            command,
        } => commands::package::run_tag(&config, command).await,
        Commands::Publish(args) => commands::package::publish(&config, args).await,
        Commands::Unpublish(args) => commands::package::unpublish(&config, args).await,
        Commands::Permissions => permissions(&config).await,
    }
}

async fn permissions(config: &Config) -> CliResult<()> {
    let session = session::get_session()?;
    let client = commands::client_with_session(config, session.as_ref());
    let catalog = client.get_permissions().await?;

    for entry in catalog {
        let code = commands::permission_code_str(entry.code);
        output::write_stdout_line(&format!("{code} — {}", entry.description))?;
    }

    Ok(())
}
