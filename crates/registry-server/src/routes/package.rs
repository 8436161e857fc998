// crates/registry-server/src/routes/package.rs
// ============================================================================
// Module: Package Routes
// Description: Package, version, and tag CRUD.
// Purpose: Mirror the reference implementation's exact handler sequencing,
//          including unknown-owner/unknown-dependency and tag/dependent
//          delete guards.
// Dependencies: axum, registry-core, registry-store-sqlite
// ============================================================================

use std::collections::BTreeSet;

use axum::extract::Path;
use axum::extract::State;
use axum::Json;

use registry_core::acl;
use registry_core::model::PermissionCode;
use registry_core::validate;
use registry_store_sqlite::NewPackageVersion;

use crate::error::ApiError;
use crate::extract::AuthenticatedUser;
use crate::state::AppState;
use crate::wire::PackageBriefOut;
use crate::wire::PackageChecksumWire;
use crate::wire::PackageCreate;
use crate::wire::PackageDependencyWire;
use crate::wire::PackageEdit;
use crate::wire::PackageOut;
use crate::wire::PackageTagBody;
use crate::wire::PackageTagWire;
use crate::wire::PackageVersionBody;
use crate::wire::PackageVersionOut;

fn to_package_out(aggregate: registry_store_sqlite::PackageAggregate) -> PackageOut {
    PackageOut {
        name: aggregate.brief.name,
        summary: aggregate.brief.summary,
        labels: aggregate.labels,
        namespace: aggregate.brief.namespace,
        owners: aggregate.owners,
        downloads: aggregate.brief.downloads,
        versions: aggregate.versions.into_iter().map(to_version_out).collect(),
        tags: aggregate
            .tags
            .into_iter()
            .map(|tag| PackageTagWire {
                name: tag.name,
                version: tag.version,
            })
            .collect(),
    }
}

fn to_version_out(version: registry_store_sqlite::PackageVersionView) -> PackageVersionOut {
    PackageVersionOut {
        version: version.version,
        description: version.description,
        repository: version.repository,
        tarball: version.tarball,
        checksums: version
            .checksums
            .into_iter()
            .map(|checksum| PackageChecksumWire {
                algorithm: checksum.algorithm,
                value: checksum.value,
            })
            .collect(),
        dependencies: version
            .dependencies
            .into_iter()
            .map(|dependency| PackageDependencyWire {
                package: dependency.package,
                spec: dependency.spec,
            })
            .collect(),
        created_date: version.created_date,
    }
}

/// Validates and decodes one version body into storage form, checking that
/// every dependency names a package that exists.
fn build_new_version(state: &AppState, body: &PackageVersionBody) -> Result<NewPackageVersion, ApiError> {
    if validate::parse_version(&body.version).is_none() {
        return Err(ApiError::Validation(format!("{} is not a valid semantic version", body.version)));
    }

    if let Some(duplicate) = validate::first_duplicate(body.checksums.iter(), |checksum| checksum.algorithm) {
        return Err(ApiError::Validation(format!("duplicate checksum algorithm {duplicate:?}")));
    }

    let mut checksums = Vec::with_capacity(body.checksums.len());
    for checksum in &body.checksums {
        let decoded = validate::decode_checksum(checksum.algorithm, &checksum.value)
            .ok_or_else(|| ApiError::Validation(format!("checksum value is not valid {:?} hex", checksum.algorithm)))?;
        checksums.push((checksum.algorithm, decoded));
    }

    let dependency_names: BTreeSet<String> = body.dependencies.iter().map(|dependency| dependency.package.clone()).collect();
    let unknown = state.store.get_unknown_packages(&dependency_names)?;
    if !unknown.is_empty() {
        return Err(ApiError::UnknownDependencies { packages: unknown });
    }

    let dependencies = body.dependencies.iter().map(|dependency| (dependency.package.clone(), dependency.spec.clone())).collect();

    Ok(NewPackageVersion {
        version: body.version.clone(),
        description: body.description.clone(),
        repository: body.repository.clone(),
        tarball: body.tarball.clone(),
        checksums,
        dependencies,
    })
}

/// `GET /package` — no authentication required.
///
/// # Errors
/// Returns [`ApiError::Internal`] on an unexpected storage failure.
pub async fn get_packages(State(state): State<AppState>) -> Result<Json<Vec<PackageBriefOut>>, ApiError> {
    Ok(Json(state.store.get_packages()?.into_iter().map(PackageBriefOut::from).collect()))
}

/// `GET /package/{package}` — no authentication required.
///
/// # Errors
/// Returns [`ApiError::NotFound`] if the package does not exist.
pub async fn get_package(State(state): State<AppState>, Path(name): Path<String>) -> Result<Json<PackageOut>, ApiError> {
    let aggregate = state.store.get_package(&name)?.ok_or(ApiError::NotFound { what: "Package" })?;
    Ok(Json(to_package_out(aggregate)))
}

/// `POST /package` — creates a package, optionally publishing versions and
/// tags in the same request. Every named owner must already be a
/// registered user, and every declared dependency must name an existing
/// package.
///
/// # Errors
/// Returns [`ApiError::Validation`], [`ApiError::UnknownOwners`],
/// [`ApiError::UnknownDependencies`], or [`ApiError::AlreadyExists`].
pub async fn create_package(
    State(state): State<AppState>,
    caller: AuthenticatedUser,
    Json(body): Json<PackageCreate>,
) -> Result<Json<PackageOut>, ApiError> {
    if !validate::is_valid_package_name(&body.name) {
        return Err(ApiError::Validation("invalid package name".to_string()));
    }

    if let Some(namespace) = &body.namespace {
        let permissions = state.store.get_namespace_user_permissions(namespace, &caller.username)?;

        let allowed = acl::require(acl::check_namespace_edit(caller.role, &permissions), false) || permissions.contains(&PermissionCode::PackageCreate);

        if !allowed {
            return Err(ApiError::NoPermission);
        }
    }

    if state.store.package_exists(&body.name)? {
        return Err(ApiError::AlreadyExists { what: "Package" });
    }

    let mut owners = body.owners.clone();
    owners.insert(caller.username.clone());

    let unknown_owners = state.store.get_unknown_users(&owners)?;
    if !unknown_owners.is_empty() {
        return Err(ApiError::UnknownOwners { usernames: unknown_owners });
    }

    if let Some(duplicate) = validate::first_duplicate(body.versions.iter(), |version| version.version.clone()) {
        return Err(ApiError::Validation(format!("duplicate version {duplicate}")));
    }

    let mut versions = Vec::with_capacity(body.versions.len());
    for version_body in &body.versions {
        versions.push(build_new_version(&state, version_body)?);
    }

    let known_versions: BTreeSet<&str> = body.versions.iter().map(|version| version.version.as_str()).collect();
    for tag in &body.tags {
        if !known_versions.contains(tag.version.as_str()) {
            return Err(ApiError::Validation(format!("tag {} refers to a version not in this request", tag.name)));
        }
    }

    let namespace_id = match &body.namespace {
        Some(namespace) => Some(state.store.get_namespace_id(namespace)?.ok_or(ApiError::NotFound { what: "Namespace" })?),
        None => None,
    };

    let tags: Vec<(String, String)> = body.tags.iter().map(|tag| (tag.name.clone(), tag.version.clone())).collect();

    state.store.create_package(&body.name, namespace_id, &body.summary, &owners, &body.labels, &versions, &tags, &caller.username)?;

    let aggregate = state.store.get_package(&body.name)?.ok_or(ApiError::Internal)?;
    Ok(Json(to_package_out(aggregate)))
}

/// `POST /package/{package}` — edits a package's metadata, namespace,
/// owners, and labels.
///
/// # Errors
/// Returns [`ApiError::NoPermission`], [`ApiError::UnknownOwners`],
/// [`ApiError::NoPackageOwnerRemains`], or [`ApiError::AlreadyExists`].
pub async fn edit_package(
    State(state): State<AppState>,
    caller: AuthenticatedUser,
    Path(name): Path<String>,
    Json(body): Json<PackageEdit>,
) -> Result<Json<PackageOut>, ApiError> {
    let existing = state.store.get_package(&name)?.ok_or(ApiError::NotFound { what: "Package" })?;

    let namespace_permissions = match &existing.brief.namespace {
        Some(namespace) => state.store.get_namespace_user_permissions(namespace, &caller.username)?,
        None => BTreeSet::new(),
    };

    if !acl::can_edit_package(caller.role, &namespace_permissions, &existing.owners, &caller.username) {
        return Err(ApiError::NoPermission);
    }

    if body.owners.is_empty() {
        return Err(ApiError::NoPackageOwnerRemains);
    }

    let unknown_owners = state.store.get_unknown_users(&body.owners)?;
    if !unknown_owners.is_empty() {
        return Err(ApiError::UnknownOwners { usernames: unknown_owners });
    }

    let renaming = body.name != name;
    if renaming && state.store.package_exists(&body.name)? {
        return Err(ApiError::AlreadyExists { what: "Package" });
    }

    let namespace_id = match &body.namespace {
        Some(namespace) => Some(state.store.get_namespace_id(namespace)?.ok_or(ApiError::NotFound { what: "Namespace" })?),
        None => None,
    };

    state.store.edit_package(&name, &body.name, namespace_id, &body.summary, &body.owners, &body.labels, &caller.username)?;

    let aggregate = state.store.get_package(&body.name)?.ok_or(ApiError::Internal)?;
    Ok(Json(to_package_out(aggregate)))
}

/// `DELETE /package/{package}` — rejects deleting a package still depended
/// on by another package's version.
///
/// # Errors
/// Returns [`ApiError::NoPermission`], [`ApiError::NotFound`], or
/// [`ApiError::HasDependents`].
pub async fn delete_package(State(state): State<AppState>, caller: AuthenticatedUser, Path(name): Path<String>) -> Result<(), ApiError> {
    let existing = state.store.get_package(&name)?.ok_or(ApiError::NotFound { what: "Package" })?;

    let namespace_permissions = match &existing.brief.namespace {
        Some(namespace) => state.store.get_namespace_user_permissions(namespace, &caller.username)?,
        None => BTreeSet::new(),
    };

    if !acl::can_edit_package(caller.role, &namespace_permissions, &existing.owners, &caller.username) {
        return Err(ApiError::NoPermission);
    }

    if state.store.package_has_dependents(&name)? {
        return Err(ApiError::HasDependents);
    }

    state.store.delete_package(&name)?;
    Ok(())
}

/// `POST /package/{package}/version` — publishes a new version. Individual
/// versions and tags are not fetched standalone; they travel inside the
/// `GET /package/{package}` aggregate.
///
/// # Errors
/// Returns [`ApiError::NoPermission`], [`ApiError::UnknownDependencies`], or
/// [`ApiError::AlreadyExists`].
pub async fn create_package_version(
    State(state): State<AppState>,
    caller: AuthenticatedUser,
    Path(name): Path<String>,
    Json(body): Json<PackageVersionBody>,
) -> Result<Json<PackageVersionOut>, ApiError> {
    let existing = state.store.get_package(&name)?.ok_or(ApiError::NotFound { what: "Package" })?;

    let namespace_permissions = match &existing.brief.namespace {
        Some(namespace) => state.store.get_namespace_user_permissions(namespace, &caller.username)?,
        None => BTreeSet::new(),
    };

    if !acl::can_edit_package(caller.role, &namespace_permissions, &existing.owners, &caller.username) {
        return Err(ApiError::NoPermission);
    }

    let package_id = state.store.get_package_id(&name)?.ok_or(ApiError::NotFound { what: "Package" })?;

    if state.store.package_version_exists(package_id, &body.version)? {
        return Err(ApiError::AlreadyExists { what: "Version" });
    }

    let new_version = build_new_version(&state, &body)?;
    state.store.create_package_version(package_id, &new_version, &caller.username)?;

    let found = state
        .store
        .get_package_version(package_id, &body.version)?
        .ok_or(ApiError::Internal)?;

    Ok(Json(to_version_out(found)))
}

/// `GET /package/{package}/version` — no authentication required.
///
/// # Errors
/// Returns [`ApiError::NotFound`] if the package does not exist.
pub async fn get_package_versions(State(state): State<AppState>, Path(name): Path<String>) -> Result<Json<Vec<PackageVersionOut>>, ApiError> {
    let package_id = state.store.get_package_id(&name)?.ok_or(ApiError::NotFound { what: "Package" })?;
    let versions = state.store.get_package_versions(package_id)?;
    Ok(Json(versions.into_iter().map(to_version_out).collect()))
}

/// `GET /package/{package}/version/{version}` — no authentication required.
///
/// # Errors
/// Returns [`ApiError::NotFound`] if the package or version does not exist.
pub async fn get_package_version(State(state): State<AppState>, Path((name, version)): Path<(String, String)>) -> Result<Json<PackageVersionOut>, ApiError> {
    let package_id = state.store.get_package_id(&name)?.ok_or(ApiError::NotFound { what: "Package" })?;
    let found = state.store.get_package_version(package_id, &version)?.ok_or(ApiError::NotFound { what: "Version" })?;
    Ok(Json(to_version_out(found)))
}

/// `POST /package/{package}/version/{version}` — edits a version's
/// description, links, checksums, and dependencies in place, optionally
/// renaming the version string itself.
///
/// # Errors
/// Returns [`ApiError::NoPermission`], [`ApiError::NotFound`],
/// [`ApiError::AlreadyExists`], or [`ApiError::UnknownDependencies`].
pub async fn edit_package_version(
    State(state): State<AppState>,
    caller: AuthenticatedUser,
    Path((name, version)): Path<(String, String)>,
    Json(body): Json<PackageVersionBody>,
) -> Result<Json<PackageVersionOut>, ApiError> {
    let existing = state.store.get_package(&name)?.ok_or(ApiError::NotFound { what: "Package" })?;
    let package_id = state.store.get_package_id(&name)?.ok_or(ApiError::NotFound { what: "Package" })?;

    let current = state.store.get_package_version(package_id, &version)?.ok_or(ApiError::NotFound { what: "Version" })?;

    let namespace_permissions = match &existing.brief.namespace {
        Some(namespace) => state.store.get_namespace_user_permissions(namespace, &caller.username)?,
        None => BTreeSet::new(),
    };

    if !acl::can_edit_package(caller.role, &namespace_permissions, &existing.owners, &caller.username) {
        return Err(ApiError::NoPermission);
    }

    if current.version != body.version && state.store.package_version_exists(package_id, &body.version)? {
        return Err(ApiError::AlreadyExists { what: "Version" });
    }

    let updated = build_new_version(&state, &body)?;
    state.store.edit_package_version(package_id, &version, &updated)?;

    let found = state
        .store
        .get_package_version(package_id, &body.version)?
        .ok_or(ApiError::Internal)?;

    Ok(Json(to_version_out(found)))
}

/// `DELETE /package/{package}/version/{version}` — rejects deleting a
/// version a tag still points at.
///
/// # Errors
/// Returns [`ApiError::NoPermission`], [`ApiError::NotFound`], or
/// [`ApiError::HasReferringTags`].
pub async fn delete_package_version(
    State(state): State<AppState>,
    caller: AuthenticatedUser,
    Path((name, version)): Path<(String, String)>,
) -> Result<(), ApiError> {
    let existing = state.store.get_package(&name)?.ok_or(ApiError::NotFound { what: "Package" })?;

    let namespace_permissions = match &existing.brief.namespace {
        Some(namespace) => state.store.get_namespace_user_permissions(namespace, &caller.username)?,
        None => BTreeSet::new(),
    };

    if !acl::can_edit_package(caller.role, &namespace_permissions, &existing.owners, &caller.username) {
        return Err(ApiError::NoPermission);
    }

    let package_id = state.store.get_package_id(&name)?.ok_or(ApiError::NotFound { what: "Package" })?;

    if state.store.get_package_version(package_id, &version)?.is_none() {
        return Err(ApiError::NotFound { what: "Version" });
    }

    if state.store.package_version_is_tagged(package_id, &version)? {
        return Err(ApiError::HasReferringTags);
    }

    state.store.delete_package_version(package_id, &version)?;
    Ok(())
}

/// `GET /package/{package}/tag` — no authentication required.
///
/// # Errors
/// Returns [`ApiError::NotFound`] if the package does not exist.
pub async fn get_package_tags(State(state): State<AppState>, Path(name): Path<String>) -> Result<Json<Vec<PackageTagWire>>, ApiError> {
    let package_id = state.store.get_package_id(&name)?.ok_or(ApiError::NotFound { what: "Package" })?;
    let tags = state.store.get_package_tags(package_id)?;
    Ok(Json(
        tags.into_iter()
            .map(|tag| PackageTagWire {
                name: tag.name,
                version: tag.version,
            })
            .collect(),
    ))
}

/// `GET /package/{package}/tag/{tag}` — no authentication required.
///
/// # Errors
/// Returns [`ApiError::NotFound`] if the package or tag does not exist.
pub async fn get_package_tag(State(state): State<AppState>, Path((name, tag)): Path<(String, String)>) -> Result<Json<PackageTagWire>, ApiError> {
    let package_id = state.store.get_package_id(&name)?.ok_or(ApiError::NotFound { what: "Package" })?;
    let found = state.store.get_package_tag(package_id, &tag)?.ok_or(ApiError::NotFound { what: "Tag" })?;
    Ok(Json(PackageTagWire {
        name: found.name,
        version: found.version,
    }))
}

/// `POST /package/{package}/tag/{tag}` — creates the tag if absent, or
/// retargets it to a different version if it already exists.
///
/// # Errors
/// Returns [`ApiError::NoPermission`] or [`ApiError::NotFound`].
pub async fn create_package_tag(
    State(state): State<AppState>,
    caller: AuthenticatedUser,
    Path((name, tag)): Path<(String, String)>,
    Json(body): Json<PackageTagBody>,
) -> Result<Json<PackageTagWire>, ApiError> {
    let existing = state.store.get_package(&name)?.ok_or(ApiError::NotFound { what: "Package" })?;

    let namespace_permissions = match &existing.brief.namespace {
        Some(namespace) => state.store.get_namespace_user_permissions(namespace, &caller.username)?,
        None => BTreeSet::new(),
    };

    if !acl::can_edit_package(caller.role, &namespace_permissions, &existing.owners, &caller.username) {
        return Err(ApiError::NoPermission);
    }

    let package_id = state.store.get_package_id(&name)?.ok_or(ApiError::NotFound { what: "Package" })?;

    if state.store.package_tag_exists(package_id, &tag)? {
        state.store.edit_package_tag(package_id, &tag, &tag, &body.version)?;
    } else {
        state.store.create_package_tag(package_id, &tag, &body.version)?;
    }

    Ok(Json(PackageTagWire {
        name: tag,
        version: body.version,
    }))
}

/// `DELETE /package/{package}/tag/{tag}` — removes a tag.
///
/// # Errors
/// Returns [`ApiError::NoPermission`] or [`ApiError::NotFound`].
pub async fn delete_package_tag(
    State(state): State<AppState>,
    caller: AuthenticatedUser,
    Path((name, tag)): Path<(String, String)>,
) -> Result<(), ApiError> {
    let existing = state.store.get_package(&name)?.ok_or(ApiError::NotFound { what: "Package" })?;

    let namespace_permissions = match &existing.brief.namespace {
        Some(namespace) => state.store.get_namespace_user_permissions(namespace, &caller.username)?,
        None => BTreeSet::new(),
    };

    if !acl::can_edit_package(caller.role, &namespace_permissions, &existing.owners, &caller.username) {
        return Err(ApiError::NoPermission);
    }

    let package_id = state.store.get_package_id(&name)?.ok_or(ApiError::NotFound { what: "Package" })?;

    if state.store.get_package_tag(package_id, &tag)?.is_none() {
        return Err(ApiError::NotFound { what: "Tag" });
    }

    state.store.delete_package_tag(package_id, &tag)?;
    Ok(())
}
