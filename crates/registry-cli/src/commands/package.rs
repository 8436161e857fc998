// crates/registry-cli/src/commands/package.rs
// ============================================================================
// Module: Package Commands
// Description: `list`, `info`, `download`, `publish`, `unpublish`,
//              `pkg create|edit|delete`, `tag set|delete`.
// Purpose: Manage packages, their versions, and their tags.
// Dependencies: crate::client, crate::manifest, crate::spec
// ============================================================================

use std::collections::BTreeSet;
use std::path::PathBuf;

use clap::Args;
use clap::Subcommand;

use crate::client::NewVersion;
use crate::client::PackageOut;
use crate::client::PackageVersionOut;
use crate::commands::authenticated_client;
use crate::commands::client_with_session;
use crate::config::Config;
use crate::error::CliError;
use crate::error::CliResult;
use crate::manifest::read_manifest;
use crate::output::write_stdout_line;
use crate::session;
use crate::spec::PackageSpec;
use crate::spec::VersionSelector;

/// Arguments for `knot list`.
#[derive(Args, Debug)]
pub struct ListArgs {
    /// Only list packages owned by this namespace.
    #[arg(long)]
    pub namespace: Option<String>,
    /// Only list packages whose name contains this substring.
    pub query: Option<String>,
}

/// Arguments for `knot info`.
#[derive(Args, Debug)]
pub struct InfoArgs {
    /// Package name.
    pub package: String,
}

/// Arguments for `knot download`.
#[derive(Args, Debug)]
pub struct DownloadArgs {
    /// Package spec: `name`, `name:version`, or `name@tag`.
    pub spec: String,
    /// Where to write the downloaded tarball.
    pub out_path: PathBuf,
}

/// Arguments for `knot publish`.
#[derive(Args, Debug)]
pub struct PublishArgs {
    /// Package to publish a version of.
    pub package: String,
    /// Path to the manifest file describing the version.
    #[arg(long, short = 'm', default_value = "knot.toml")]
    pub manifest: PathBuf,
    /// Replace an already-published version instead of creating a new one.
    #[arg(long, value_name = "VERSION")]
    pub replace: Option<String>,
    /// Assume "yes" to any replace confirmation instead of prompting.
    #[arg(long, short = 'y')]
    pub yes: bool,
}

/// Arguments for `knot unpublish`.
#[derive(Args, Debug)]
pub struct UnpublishArgs {
    /// Package name.
    pub package: String,
    /// Version to remove.
    pub version: String,
    /// Skip the removal confirmation prompt.
    #[arg(long, short = 'y')]
    pub yes: bool,
}

/// `pkg` subcommands.
#[derive(Subcommand, Debug)]
pub enum PkgCommand {
    /// Create a package, optionally seeding it with an initial version from a manifest.
    Create(PkgCreateArgs),
    /// Edit a package's metadata.
    Edit(PkgEditArgs),
    /// Delete a package.
    Delete(PkgNameArgs),
}

/// Just a package name.
#[derive(Args, Debug)]
pub struct PkgNameArgs {
    /// Package name.
    pub name: String,
}

/// Arguments for `pkg create`.
#[derive(Args, Debug)]
pub struct PkgCreateArgs {
    /// Package name.
    pub name: String,
    /// One-line summary.
    #[arg(long, default_value = "")]
    pub summary: String,
    /// Owning namespace, if any.
    #[arg(long)]
    pub namespace: Option<String>,
    /// Free-text label; repeatable.
    #[arg(long = "label", value_name = "LABEL")]
    pub labels: Vec<String>,
    /// Additional owner username, beyond the caller; repeatable.
    #[arg(long = "owner", value_name = "USERNAME")]
    pub owners: Vec<String>,
    /// Manifest describing an initial version to publish with the package.
    #[arg(long)]
    pub manifest: Option<PathBuf>,
}

/// Arguments for `pkg edit`.
#[derive(Args, Debug)]
pub struct PkgEditArgs {
    /// Current package name.
    pub name: String,
    /// New package name; defaults to unchanged.
    #[arg(long)]
    pub rename: Option<String>,
    /// New one-line summary.
    #[arg(long, default_value = "")]
    pub summary: String,
    /// New owning namespace.
    #[arg(long)]
    pub namespace: Option<String>,
    /// Free-text label; repeatable. Replaces the existing set entirely.
    #[arg(long = "label", value_name = "LABEL")]
    pub labels: Vec<String>,
    /// Owner username; repeatable. Replaces the existing set entirely.
    #[arg(long = "owner", value_name = "USERNAME")]
    pub owners: Vec<String>,
}

/// `tag` subcommands.
#[derive(Subcommand, Debug)]
pub enum TagCommand {
    /// Create or retarget a tag to point at a version.
    Set(TagSetArgs),
    /// Delete a tag.
    Delete(TagDeleteArgs),
}

/// Arguments for `tag set`.
#[derive(Args, Debug)]
pub struct TagSetArgs {
    /// Package name.
    pub package: String,
    /// Tag name.
    pub tag: String,
    /// Version the tag should point at.
    pub version: String,
}

/// Arguments for `tag delete`.
#[derive(Args, Debug)]
pub struct TagDeleteArgs {
    /// Package name.
    pub package: String,
    /// Tag name.
    pub tag: String,
}

/// Executes `knot list`.
pub async fn list(config: &Config, args: ListArgs) -> CliResult<()> {
    let session = session::get_session()?;
    let client = client_with_session(config, session.as_ref());

    let packages = match &args.namespace {
        Some(namespace) => client.get_namespace_packages(namespace).await?,
        None => client.get_packages().await?,
    };

    let filtered = packages.into_iter().filter(|package| match &args.query {
        Some(query) => package.name.contains(query.as_str()),
        None => true,
    });

    let mut printed_any = false;
    for package in filtered {
        printed_any = true;
        let namespace = package.namespace.as_deref().unwrap_or("(none)");
        write_stdout_line(&format!("{} [{namespace}] — {} ({} downloads)", package.name, package.summary, package.downloads))?;
    }

    if !printed_any {
        write_stdout_line("No packages found.")?;
    }

    Ok(())
}

/// Executes `knot info`.
pub async fn info(config: &Config, args: InfoArgs) -> CliResult<()> {
    let session = session::get_session()?;
    let client = client_with_session(config, session.as_ref());
    let package = client.get_package(&args.package).await?;
    print_package(&package)?;
    Ok(())
}

fn print_package(package: &PackageOut) -> CliResult<()> {
    write_stdout_line(&format!("Name: {}", package.name))?;
    write_stdout_line(&format!("Summary: {}", package.summary))?;
    write_stdout_line(&format!("Namespace: {}", package.namespace.as_deref().unwrap_or("(none)")))?;
    write_stdout_line(&format!("Owners: {}", package.owners.join(", ")))?;
    write_stdout_line(&format!("Downloads: {}", package.downloads))?;

    if !package.labels.is_empty() {
        write_stdout_line(&format!("Labels: {}", package.labels.join(", ")))?;
    }

    for version in &package.versions {
        write_stdout_line(&format!("  version {}", version.version))?;
    }

    for tag in &package.tags {
        write_stdout_line(&format!("  tag {} -> {}", tag.name, tag.version))?;
    }

    Ok(())
}

fn resolve_version<'a>(package: &'a PackageOut, selector: &VersionSelector) -> CliResult<&'a PackageVersionOut> {
    match selector {
        VersionSelector::Latest => package
            .versions
            .iter()
            .max_by(|left, right| {
                let left = semver::Version::parse(&left.version).ok();
                let right = semver::Version::parse(&right.version).ok();
                left.cmp(&right)
            })
            .ok_or_else(|| CliError::Invalid(format!("{} has no published versions", package.name))),
        VersionSelector::Version(version) => package
            .versions
            .iter()
            .find(|candidate| &candidate.version == version)
            .ok_or_else(|| CliError::Invalid(format!("{} has no version {version}", package.name))),
        VersionSelector::Tag(tag) => {
            let target = package
                .tags
                .iter()
                .find(|candidate| &candidate.name == tag)
                .ok_or_else(|| CliError::Invalid(format!("{} has no tag {tag}", package.name)))?;
            package
                .versions
                .iter()
                .find(|candidate| candidate.version == target.version)
                .ok_or_else(|| CliError::Invalid(format!("{} tag {tag} refers to a missing version", package.name)))
        }
    }
}

/// Executes `knot download`.
pub async fn download(config: &Config, args: DownloadArgs) -> CliResult<()> {
    let spec = PackageSpec::parse(&args.spec);
    let session = session::get_session()?;
    let client = client_with_session(config, session.as_ref());

    let package = client.get_package(&spec.package).await?;
    let version = resolve_version(&package, &spec.selector)?;
    let tarball = version
        .tarball
        .clone()
        .ok_or_else(|| CliError::Invalid(format!("{} {} has no tarball URL", package.name, version.version)))?;

    let bytes = reqwest::get(&tarball).await?.bytes().await?;
    std::fs::write(&args.out_path, &bytes)?;

    write_stdout_line(&format!("Downloaded {} {} to {}", package.name, version.version, args.out_path.display()))?;
    Ok(())
}

/// Executes `knot publish`.
///
/// Publishing a version that already exists aborts with an already-exists
/// error unless the caller passes `--replace`/`--yes` or confirms a prompt,
/// in which case the version is edited in place instead of created.
pub async fn publish(config: &Config, args: PublishArgs) -> CliResult<()> {
    let (client, _) = authenticated_client(config)?;
    let manifest = read_manifest(&args.manifest)?;
    let version = manifest_to_new_version(&manifest)?;

    if let Some(target) = &args.replace {
        if !args.yes && !crate::output::confirm("Are you sure you want to replace the version?")? {
            return Err(CliError::Invalid("replace not confirmed".to_string()));
        }

        let published = client.edit_package_version(&args.package, target, &version).await?;
        write_stdout_line(&format!("Replaced {} {}.", args.package, published.version))?;
        return Ok(());
    }

    match client.create_package_version(&args.package, &version).await {
        Ok(published) => {
            write_stdout_line(&format!("Published {} {}.", args.package, published.version))?;
            Ok(())
        }
        Err(CliError::Server { detail, what: Some(what) }) if what == "Version" => {
            let confirmed = args.yes
                || crate::output::confirm("This version of the package already exists. Are you sure you want to replace it?")?;

            if !confirmed {
                return Err(CliError::Server { detail, what: Some(what) });
            }

            let published = client.edit_package_version(&args.package, &version.version, &version).await?;
            write_stdout_line(&format!("Version already existed, replaced {} {}.", args.package, published.version))?;
            Ok(())
        }
        Err(other) => Err(other),
    }
}

/// Executes `knot unpublish`.
pub async fn unpublish(config: &Config, args: UnpublishArgs) -> CliResult<()> {
    if !args.yes && !crate::output::confirm("Are you sure you want to remove the version?")? {
        return Err(CliError::Invalid("unpublish not confirmed".to_string()));
    }

    let (client, _) = authenticated_client(config)?;
    client.delete_package_version(&args.package, &args.version).await?;
    write_stdout_line(&format!("Unpublished {} {}.", args.package, args.version))?;
    Ok(())
}

/// Dispatches a [`PkgCommand`].
pub async fn run_pkg(config: &Config, command: PkgCommand) -> CliResult<()> {
    match command {
        PkgCommand::Create(args) => pkg_create(config, args).await,
        PkgCommand::Edit(args) => pkg_edit(config, args).await,
        PkgCommand::Delete(args) => pkg_delete(config, args).await,
    }
}

async fn pkg_create(config: &Config, args: PkgCreateArgs) -> CliResult<()> {
    let (client, caller) = authenticated_client(config)?;

    let mut versions = Vec::new();
    if let Some(manifest_path) = &args.manifest {
        let manifest = read_manifest(manifest_path)?;
        versions.push(manifest_to_new_version(&manifest)?);
    }

    let mut owners: BTreeSet<String> = args.owners.into_iter().collect();
    owners.insert(caller.username.clone());

    let labels: BTreeSet<String> = args.labels.into_iter().collect();

    let package = client
        .create_package(&args.name, &args.summary, args.namespace.as_deref(), &labels, &owners, &versions)
        .await?;

    write_stdout_line(&format!("Created package {}.", package.name))?;
    Ok(())
}

async fn pkg_edit(config: &Config, args: PkgEditArgs) -> CliResult<()> {
    let (client, _) = authenticated_client(config)?;
    let new_name = args.rename.unwrap_or_else(|| args.name.clone());
    let labels: BTreeSet<String> = args.labels.into_iter().collect();
    let owners: BTreeSet<String> = args.owners.into_iter().collect();

    let package = client.edit_package(&args.name, &new_name, &args.summary, args.namespace.as_deref(), &labels, &owners).await?;
    write_stdout_line(&format!("Updated package {}.", package.name))?;
    Ok(())
}

async fn pkg_delete(config: &Config, args: PkgNameArgs) -> CliResult<()> {
    let (client, _) = authenticated_client(config)?;
    client.delete_package(&args.name).await?;
    write_stdout_line(&format!("Deleted package {}.", args.name))?;
    Ok(())
}

/// Dispatches a [`TagCommand`].
pub async fn run_tag(config: &Config, command: TagCommand) -> CliResult<()> {
    let (client, _) = authenticated_client(config)?;

    match command {
        TagCommand::Set(args) => {
            let tag = client.set_package_tag(&args.package, &args.tag, &args.version).await?;
            write_stdout_line(&format!("Tag {} on {} now points at {}.", tag.name, args.package, tag.version))?;
        }
        TagCommand::Delete(args) => {
            client.delete_package_tag(&args.package, &args.tag).await?;
            write_stdout_line(&format!("Deleted tag {} on {}.", args.tag, args.package))?;
        }
    }

    Ok(())
}

fn manifest_to_new_version(manifest: &crate::manifest::PackageManifestV1) -> CliResult<NewVersion> {
    let checksums = manifest
        .checksums
        .iter()
        .map(|checksum| parse_checksum(&checksum.algorithm, &checksum.value))
        .collect::<CliResult<Vec<_>>>()?;

    let dependencies = manifest
        .dependencies
        .iter()
        .map(|dependency| crate::client::PackageDependencyWire {
            package: dependency.package.clone(),
            spec: dependency.spec.clone(),
        })
        .collect();

    Ok(NewVersion {
        version: manifest.version.clone(),
        description: manifest.description.clone(),
        repository: manifest.repository.clone(),
        tarball: manifest.tarball.clone(),
        checksums,
        dependencies,
    })
}

fn parse_checksum(algorithm: &str, value: &str) -> CliResult<crate::client::PackageChecksumWire> {
    use registry_core::model::ChecksumAlgorithm;

    let algorithm = match algorithm {
        "md5" => ChecksumAlgorithm::Md5,
        "sha1" => ChecksumAlgorithm::Sha1,
        "sha256" => ChecksumAlgorithm::Sha256,
        "sha512" => ChecksumAlgorithm::Sha512,
        other => return Err(CliError::Invalid(format!("unknown checksum algorithm \"{other}\""))),
    };

    Ok(crate::client::PackageChecksumWire {
        algorithm,
        value: value.to_string(),
    })
}
