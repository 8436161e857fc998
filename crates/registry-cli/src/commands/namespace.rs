// crates/registry-cli/src/commands/namespace.rs
// ============================================================================
// Module: Namespace Commands
// Description: `namespace create|info|edit|delete`, `namespace user ...`,
//              `namespace role ...`.
// Purpose: Manage namespaces, their members, and their roles.
// Dependencies: crate::client
// ============================================================================

use std::collections::BTreeSet;

use clap::Args;
use clap::Subcommand;

use crate::commands::authenticated_client;
use crate::commands::parse_permission;
use crate::config::Config;
use crate::error::CliResult;
use crate::output::write_stdout_line;

/// Namespace subcommands.
#[derive(Subcommand, Debug)]
pub enum NamespaceCommand {
    /// Create a namespace.
    Create(NamespaceCreateArgs),
    /// Show a namespace's members and roles.
    Info(NamespaceNameArgs),
    /// Edit a namespace's metadata.
    Edit(NamespaceEditArgs),
    /// Delete a namespace.
    Delete(NamespaceNameArgs),
    /// Manage namespace membership.
    User {
        /// Selected membership subcommand.
        #[command(subcommand)]
        command: NamespaceUserCommand,
    },
    /// Manage namespace roles.
    Role {
        /// Selected role subcommand.
        #[command(subcommand)]
        command: NamespaceRoleCommand,
    },
}

/// Just a namespace name.
#[derive(Args, Debug)]
pub struct NamespaceNameArgs {
    /// Namespace name.
    pub name: String,
}

/// Arguments for `namespace create`.
#[derive(Args, Debug)]
pub struct NamespaceCreateArgs {
    /// Namespace name.
    pub name: String,
    /// Free-text description.
    #[arg(long, default_value = "")]
    pub description: String,
    /// Optional homepage URL.
    #[arg(long)]
    pub homepage: Option<String>,
}

/// Arguments for `namespace edit`.
#[derive(Args, Debug)]
pub struct NamespaceEditArgs {
    /// Current namespace name.
    pub name: String,
    /// New namespace name; defaults to unchanged.
    #[arg(long)]
    pub rename: Option<String>,
    /// New description.
    #[arg(long, default_value = "")]
    pub description: String,
    /// New homepage URL.
    #[arg(long)]
    pub homepage: Option<String>,
}

/// Namespace membership subcommands.
#[derive(Subcommand, Debug)]
pub enum NamespaceUserCommand {
    /// Add a member to a namespace.
    Add(NamespaceUserAddArgs),
    /// Change a member's role.
    Edit(NamespaceUserAddArgs),
    /// Remove a member from a namespace.
    Remove(NamespaceUserRemoveArgs),
}

/// Arguments shared by `namespace user add` and `namespace user edit`.
#[derive(Args, Debug)]
pub struct NamespaceUserAddArgs {
    /// Namespace name.
    pub namespace: String,
    /// Member's username.
    pub username: String,
    /// Role name to grant.
    pub role: String,
}

/// Arguments for `namespace user remove`.
#[derive(Args, Debug)]
pub struct NamespaceUserRemoveArgs {
    /// Namespace name.
    pub namespace: String,
    /// Member's username.
    pub username: String,
}

/// Namespace role subcommands.
#[derive(Subcommand, Debug)]
pub enum NamespaceRoleCommand {
    /// Create a role.
    Create(NamespaceRoleCreateArgs),
    /// Edit a role's name or permissions.
    Edit(NamespaceRoleEditArgs),
    /// Delete a role.
    Delete(NamespaceRoleDeleteArgs),
}

/// Arguments for `namespace role create`.
#[derive(Args, Debug)]
pub struct NamespaceRoleCreateArgs {
    /// Namespace name.
    pub namespace: String,
    /// Role name.
    pub name: String,
    /// Permission codes granted by the role; repeatable.
    #[arg(long = "permission", value_name = "CODE")]
    pub permissions: Vec<String>,
}

/// Arguments for `namespace role edit`.
#[derive(Args, Debug)]
pub struct NamespaceRoleEditArgs {
    /// Namespace name.
    pub namespace: String,
    /// Current role name.
    pub name: String,
    /// New role name; defaults to unchanged.
    #[arg(long)]
    pub rename: Option<String>,
    /// Permission codes granted by the role; repeatable. Replaces the
    /// existing set entirely.
    #[arg(long = "permission", value_name = "CODE")]
    pub permissions: Vec<String>,
}

/// Arguments for `namespace role delete`.
#[derive(Args, Debug)]
pub struct NamespaceRoleDeleteArgs {
    /// Namespace name.
    pub namespace: String,
    /// Role name.
    pub name: String,
}

/// Dispatches a [`NamespaceCommand`].
pub async fn run(config: &Config, command: NamespaceCommand) -> CliResult<()> {
    match command {
        NamespaceCommand::Create(args) => create(config, args).await,
        NamespaceCommand::Info(args) => info(config, args).await,
        NamespaceCommand::Edit(args) => edit(config, args).await,
        NamespaceCommand::Delete(args) => delete(config, args).await,
        NamespaceCommand::User {
            command,
        } => user(config, command).await,
        NamespaceCommand::Role {
            command,
        } => role(config, command).await,
    }
}

async fn create(config: &Config, args: NamespaceCreateArgs) -> CliResult<()> {
    let (client, _) = authenticated_client(config)?;
    let namespace = client.create_namespace(&args.name, &args.description, args.homepage.as_deref()).await?;
    write_stdout_line(&format!("Created namespace {}.", namespace.name))?;
    Ok(())
}

async fn info(config: &Config, args: NamespaceNameArgs) -> CliResult<()> {
    let (client, _) = authenticated_client(config)?;
    let namespace = client.get_namespace(&args.name).await?;

    write_stdout_line(&format!("Namespace: {}", namespace.name))?;
    write_stdout_line(&format!("Description: {}", namespace.description))?;
    write_stdout_line(&format!("Homepage: {}", namespace.homepage.as_deref().unwrap_or("(none)")))?;

    for member in &namespace.users {
        write_stdout_line(&format!("  user {} — {}", member.username, member.role))?;
    }

    for role in &namespace.roles {
        let permissions: Vec<&str> = role.permissions.iter().copied().map(crate::commands::permission_code_str).collect();
        write_stdout_line(&format!("  role {} — {}", role.name, permissions.join(", ")))?;
    }

    Ok(())
}

async fn edit(config: &Config, args: NamespaceEditArgs) -> CliResult<()> {
    let (client, _) = authenticated_client(config)?;
    let new_name = args.rename.unwrap_or_else(|| args.name.clone());
    let namespace = client.edit_namespace(&args.name, &new_name, &args.description, args.homepage.as_deref()).await?;
    write_stdout_line(&format!("Updated namespace {}.", namespace.name))?;
    Ok(())
}

async fn delete(config: &Config, args: NamespaceNameArgs) -> CliResult<()> {
    let (client, _) = authenticated_client(config)?;
    client.delete_namespace(&args.name).await?;
    write_stdout_line(&format!("Deleted namespace {}.", args.name))?;
    Ok(())
}

async fn user(config: &Config, command: NamespaceUserCommand) -> CliResult<()> {
    let (client, _) = authenticated_client(config)?;

    match command {
        NamespaceUserCommand::Add(args) => {
            client.add_namespace_user(&args.namespace, &args.username, &args.role).await?;
            write_stdout_line(&format!("Added {} to {} as {}.", args.username, args.namespace, args.role))?;
        }
        NamespaceUserCommand::Edit(args) => {
            client.edit_namespace_user(&args.namespace, &args.username, &args.role).await?;
            write_stdout_line(&format!("Changed {}'s role in {} to {}.", args.username, args.namespace, args.role))?;
        }
        NamespaceUserCommand::Remove(args) => {
            client.remove_namespace_user(&args.namespace, &args.username).await?;
            write_stdout_line(&format!("Removed {} from {}.", args.username, args.namespace))?;
        }
    }

    Ok(())
}

async fn role(config: &Config, command: NamespaceRoleCommand) -> CliResult<()> {
    let (client, _) = authenticated_client(config)?;

    match command {
        NamespaceRoleCommand::Create(args) => {
            let permissions = parse_permissions(&args.permissions)?;
            client.create_namespace_role(&args.namespace, &args.name, &permissions).await?;
            write_stdout_line(&format!("Created role {} in {}.", args.name, args.namespace))?;
        }
        NamespaceRoleCommand::Edit(args) => {
            let permissions = parse_permissions(&args.permissions)?;
            let new_name = args.rename.unwrap_or_else(|| args.name.clone());
            client.edit_namespace_role(&args.namespace, &args.name, &new_name, &permissions).await?;
            write_stdout_line(&format!("Updated role {} in {}.", new_name, args.namespace))?;
        }
        NamespaceRoleCommand::Delete(args) => {
            client.delete_namespace_role(&args.namespace, &args.name).await?;
            write_stdout_line(&format!("Deleted role {} in {}.", args.name, args.namespace))?;
        }
    }

    Ok(())
}

fn parse_permissions(values: &[String]) -> CliResult<BTreeSet<registry_core::model::PermissionCode>> {
    values.iter().map(|value| parse_permission(value)).collect()
}
