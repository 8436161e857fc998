// crates/registry-cli/src/client.rs
// ============================================================================
// Module: Registry HTTP Client
// Description: Thin async wrapper over the registry's JSON API.
// Purpose: Give every command one place to build requests and decode
//          responses/errors, instead of repeating `reqwest` boilerplate.
// Dependencies: reqwest, serde, serde_json
// ============================================================================

//! ## Overview
//! `registry-server`'s wire types are private to that crate, so the shapes
//! below are this crate's own response models. They mirror the server's
//! JSON field-for-field but are declared independently, the same way a
//! hand-written API client would be if no shared schema package existed.

use std::collections::BTreeSet;

use registry_core::model::ChecksumAlgorithm;
use registry_core::model::PermissionCode;
use registry_core::model::UserRole;
use serde::Deserialize;
use serde::Serialize;
use serde_json::json;
use serde_json::Value;

use crate::error::CliError;
use crate::error::CliResult;

/// A minted bearer token.
#[derive(Debug, Deserialize)]
pub struct AuthToken {
    /// The token itself.
    pub access_token: String,
}

/// A user's full profile.
#[derive(Debug, Deserialize)]
pub struct FullUserInfo {
    /// Login name.
    pub username: String,
    /// Contact email.
    pub email: String,
    /// Registration time, Unix seconds.
    pub registered: i64,
    /// Namespaces the user belongs to.
    pub namespaces: Vec<String>,
    /// Global role.
    pub role: UserRole,
}

/// A namespace with its members and roles.
#[derive(Debug, Deserialize)]
pub struct NamespaceOut {
    /// Namespace name.
    pub name: String,
    /// Free-text description.
    pub description: String,
    /// Optional homepage URL.
    pub homepage: Option<String>,
    /// Creation time, Unix seconds.
    pub created_date: i64,
    /// Current members.
    pub users: Vec<NamespaceUserOut>,
    /// Current roles.
    pub roles: Vec<NamespaceRoleOut>,
}

/// One namespace member.
#[derive(Debug, Deserialize)]
pub struct NamespaceUserOut {
    /// Member's username.
    pub username: String,
    /// Name of the role the member currently holds.
    pub role: String,
}

/// One namespace role.
#[derive(Debug, Deserialize)]
pub struct NamespaceRoleOut {
    /// Role name.
    pub name: String,
    /// Permissions granted by this role.
    pub permissions: BTreeSet<PermissionCode>,
}

/// A package without its owners, labels, versions, or tags.
#[derive(Debug, Deserialize)]
pub struct PackageBriefOut {
    /// Package name.
    pub name: String,
    /// One-line summary.
    pub summary: String,
    /// Owning namespace, if any.
    pub namespace: Option<String>,
    /// Cumulative download count.
    pub downloads: i64,
}

/// A package with its versions and tags.
#[derive(Debug, Deserialize)]
pub struct PackageOut {
    /// Package name.
    pub name: String,
    /// One-line summary.
    pub summary: String,
    /// Free-text labels.
    pub labels: Vec<String>,
    /// Owning namespace, if any.
    pub namespace: Option<String>,
    /// Usernames with edit rights on this package directly.
    pub owners: Vec<String>,
    /// Cumulative download count.
    pub downloads: i64,
    /// Published versions.
    pub versions: Vec<PackageVersionOut>,
    /// Tags defined on the package.
    pub tags: Vec<PackageTagWire>,
}

/// One published version of a package.
#[derive(Debug, Deserialize)]
pub struct PackageVersionOut {
    /// Semantic version string.
    pub version: String,
    /// Release notes.
    pub description: String,
    /// Optional source repository URL.
    pub repository: Option<String>,
    /// Optional tarball URL.
    pub tarball: Option<String>,
    /// Checksums attached to this version.
    pub checksums: Vec<PackageChecksumWire>,
    /// Dependencies declared by this version.
    pub dependencies: Vec<PackageDependencyWire>,
    /// Publish time, Unix seconds.
    pub created_date: i64,
}

/// One checksum on the wire.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PackageChecksumWire {
    /// Digest algorithm.
    pub algorithm: ChecksumAlgorithm,
    /// Lowercase hex digest.
    pub value: String,
}

/// One dependency on the wire.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PackageDependencyWire {
    /// The depended-on package's name.
    pub package: String,
    /// Dependency version spec, as written by the publisher.
    pub spec: String,
}

/// One tag on the wire.
#[derive(Debug, Clone, Deserialize)]
pub struct PackageTagWire {
    /// Tag name.
    pub name: String,
    /// The version the tag refers to.
    pub version: String,
}

/// One entry of the `/permission` catalog.
#[derive(Debug, Deserialize)]
pub struct PermissionOut {
    /// The permission code.
    pub code: PermissionCode,
    /// Human-readable description.
    pub description: String,
}

/// The body of a non-2xx JSON response.
#[derive(Debug, Deserialize)]
struct ErrorBody {
    detail: String,
    #[serde(default)]
    what: Option<String>,
}

/// A package version to publish, for `create_package` and `create_package_version`.
#[derive(Debug, Clone, Serialize)]
pub struct NewVersion {
    /// Semantic version string.
    pub version: String,
    /// Release notes.
    pub description: String,
    /// Optional source repository URL.
    pub repository: Option<String>,
    /// Optional tarball URL.
    pub tarball: Option<String>,
    /// Checksums attached to this version.
    pub checksums: Vec<PackageChecksumWire>,
    /// Dependencies declared by this version.
    pub dependencies: Vec<PackageDependencyWire>,
}

/// Thin wrapper over `reqwest::Client` that knows the registry's base URL
/// and, once signed in, attaches a bearer token to every request.
pub struct RegistryClient {
    http: reqwest::Client,
    base_url: String,
    token: Option<String>,
}

impl RegistryClient {
    /// Builds a client for `base_url`, optionally carrying a bearer token.
    #[must_use]
    pub fn new(base_url: &str, token: Option<String>) -> Self {
        Self {
            http: reqwest::Client::new(),
            base_url: base_url.trim_end_matches('/').to_string(),
            token,
        }
    }

    fn url(&self, path: &str) -> String {
        format!("{}{path}", self.base_url)
    }

    fn request(&self, method: reqwest::Method, path: &str) -> reqwest::RequestBuilder {
        let builder = self.http.request(method, self.url(path));

        match &self.token {
            Some(token) => builder.bearer_auth(token),
            None => builder,
        }
    }

    async fn send_json<T: serde::de::DeserializeOwned>(&self, builder: reqwest::RequestBuilder) -> CliResult<T> {
        let response = builder.send().await?;
        Self::decode(response).await
    }

    async fn send_empty(&self, builder: reqwest::RequestBuilder) -> CliResult<()> {
        let response = builder.send().await?;

        if response.status().is_success() {
            return Ok(());
        }

        Err(Self::server_error(response).await)
    }

    async fn decode<T: serde::de::DeserializeOwned>(response: reqwest::Response) -> CliResult<T> {
        if !response.status().is_success() {
            return Err(Self::server_error(response).await);
        }

        Ok(response.json::<T>().await?)
    }

    async fn server_error(response: reqwest::Response) -> CliError {
        match response.json::<ErrorBody>().await {
            Ok(body) => CliError::Server {
                detail: body.detail,
                what: body.what,
            },
            Err(_) => CliError::Server {
                detail: "the registry returned an error with no readable detail".to_string(),
                what: None,
            },
        }
    }

    /// `POST /login`.
    pub async fn login(&self, username: &str, password: &str) -> CliResult<AuthToken> {
        let form = [("username", username), ("password", password)];
        let builder = self.http.post(self.url("/login")).form(&form);
        self.send_json(builder).await
    }

    /// `POST /user`.
    pub async fn register(&self, username: &str, email: &str, password: &str) -> CliResult<FullUserInfo> {
        let body = json!({ "username": username, "email": email, "password": password });
        let builder = self.request(reqwest::Method::POST, "/user").json(&body);
        self.send_json(builder).await
    }

    /// `GET /user/{username}`.
    pub async fn get_user(&self, username: &str) -> CliResult<FullUserInfo> {
        let builder = self.request(reqwest::Method::GET, &format!("/user/{username}"));
        self.send_json(builder).await
    }

    /// `POST /namespace`.
    pub async fn create_namespace(&self, name: &str, description: &str, homepage: Option<&str>) -> CliResult<NamespaceOut> {
        let body = namespace_body(name, description, homepage);
        let builder = self.request(reqwest::Method::POST, "/namespace").json(&body);
        self.send_json(builder).await
    }

    /// `GET /namespace/{namespace}`.
    pub async fn get_namespace(&self, name: &str) -> CliResult<NamespaceOut> {
        let builder = self.request(reqwest::Method::GET, &format!("/namespace/{name}"));
        self.send_json(builder).await
    }

    /// `POST /namespace/{namespace}`.
    pub async fn edit_namespace(&self, current_name: &str, new_name: &str, description: &str, homepage: Option<&str>) -> CliResult<NamespaceOut> {
        let body = namespace_body(new_name, description, homepage);
        let builder = self.request(reqwest::Method::POST, &format!("/namespace/{current_name}")).json(&body);
        self.send_json(builder).await
    }

    /// `DELETE /namespace/{namespace}`.
    pub async fn delete_namespace(&self, name: &str) -> CliResult<()> {
        let builder = self.request(reqwest::Method::DELETE, &format!("/namespace/{name}"));
        self.send_empty(builder).await
    }

    /// `GET /namespace/{namespace}/package`.
    pub async fn get_namespace_packages(&self, namespace: &str) -> CliResult<Vec<PackageBriefOut>> {
        let builder = self.request(reqwest::Method::GET, &format!("/namespace/{namespace}/package"));
        self.send_json(builder).await
    }

    /// `POST /namespace/{namespace}/user`.
    pub async fn add_namespace_user(&self, namespace: &str, username: &str, role: &str) -> CliResult<NamespaceUserOut> {
        let body = json!({ "username": username, "role": role });
        let builder = self.request(reqwest::Method::POST, &format!("/namespace/{namespace}/user")).json(&body);
        self.send_json(builder).await
    }

    /// `POST /namespace/{namespace}/user/{username}`.
    pub async fn edit_namespace_user(&self, namespace: &str, username: &str, role: &str) -> CliResult<NamespaceUserOut> {
        let body = json!({ "role": role });
        let builder = self.request(reqwest::Method::POST, &format!("/namespace/{namespace}/user/{username}")).json(&body);
        self.send_json(builder).await
    }

    /// `DELETE /namespace/{namespace}/user/{username}`.
    pub async fn remove_namespace_user(&self, namespace: &str, username: &str) -> CliResult<()> {
        let builder = self.request(reqwest::Method::DELETE, &format!("/namespace/{namespace}/user/{username}"));
        self.send_empty(builder).await
    }

    /// `POST /namespace/{namespace}/role`.
    pub async fn create_namespace_role(&self, namespace: &str, name: &str, permissions: &BTreeSet<PermissionCode>) -> CliResult<NamespaceRoleOut> {
        let body = json!({ "name": name, "permissions": permissions });
        let builder = self.request(reqwest::Method::POST, &format!("/namespace/{namespace}/role")).json(&body);
        self.send_json(builder).await
    }

    /// `POST /namespace/{namespace}/role/{role}`.
    pub async fn edit_namespace_role(
        &self,
        namespace: &str,
        current_name: &str,
        new_name: &str,
        permissions: &BTreeSet<PermissionCode>,
    ) -> CliResult<NamespaceRoleOut> {
        let body = json!({ "name": new_name, "permissions": permissions });
        let builder = self.request(reqwest::Method::POST, &format!("/namespace/{namespace}/role/{current_name}")).json(&body);
        self.send_json(builder).await
    }

    /// `DELETE /namespace/{namespace}/role/{role}`.
    pub async fn delete_namespace_role(&self, namespace: &str, name: &str) -> CliResult<()> {
        let builder = self.request(reqwest::Method::DELETE, &format!("/namespace/{namespace}/role/{name}"));
        self.send_empty(builder).await
    }

    /// `GET /package`.
    pub async fn get_packages(&self) -> CliResult<Vec<PackageBriefOut>> {
        let builder = self.request(reqwest::Method::GET, "/package");
        self.send_json(builder).await
    }

    /// `GET /package/{package}`.
    pub async fn get_package(&self, name: &str) -> CliResult<PackageOut> {
        let builder = self.request(reqwest::Method::GET, &format!("/package/{name}"));
        self.send_json(builder).await
    }

    /// `POST /package`.
    pub async fn create_package(
        &self,
        name: &str,
        summary: &str,
        namespace: Option<&str>,
        labels: &BTreeSet<String>,
        owners: &BTreeSet<String>,
        versions: &[NewVersion],
    ) -> CliResult<PackageOut> {
        let body = json!({
            "name": name,
            "summary": summary,
            "namespace": namespace,
            "labels": labels,
            "owners": owners,
            "versions": versions,
            "tags": Value::Array(Vec::new()),
        });
        let builder = self.request(reqwest::Method::POST, "/package").json(&body);
        self.send_json(builder).await
    }

    /// `POST /package/{package}`.
    pub async fn edit_package(
        &self,
        current_name: &str,
        new_name: &str,
        summary: &str,
        namespace: Option<&str>,
        labels: &BTreeSet<String>,
        owners: &BTreeSet<String>,
    ) -> CliResult<PackageOut> {
        let body = json!({
            "name": new_name,
            "summary": summary,
            "namespace": namespace,
            "labels": labels,
            "owners": owners,
        });
        let builder = self.request(reqwest::Method::POST, &format!("/package/{current_name}")).json(&body);
        self.send_json(builder).await
    }

    /// `DELETE /package/{package}`.
    pub async fn delete_package(&self, name: &str) -> CliResult<()> {
        let builder = self.request(reqwest::Method::DELETE, &format!("/package/{name}"));
        self.send_empty(builder).await
    }

    /// `POST /package/{package}/version`.
    pub async fn create_package_version(&self, package: &str, version: &NewVersion) -> CliResult<PackageVersionOut> {
        let builder = self.request(reqwest::Method::POST, &format!("/package/{package}/version")).json(version);
        self.send_json(builder).await
    }

    /// `POST /package/{package}/version/{version}`.
    pub async fn edit_package_version(&self, package: &str, version: &str, updated: &NewVersion) -> CliResult<PackageVersionOut> {
        let builder = self.request(reqwest::Method::POST, &format!("/package/{package}/version/{version}")).json(updated);
        self.send_json(builder).await
    }

    /// `DELETE /package/{package}/version/{version}`.
    pub async fn delete_package_version(&self, package: &str, version: &str) -> CliResult<()> {
        let builder = self.request(reqwest::Method::DELETE, &format!("/package/{package}/version/{version}"));
        self.send_empty(builder).await
    }

    /// `POST /package/{package}/tag/{tag}`.
    pub async fn set_package_tag(&self, package: &str, tag: &str, version: &str) -> CliResult<PackageTagWire> {
        let body = json!({ "version": version });
        let builder = self.request(reqwest::Method::POST, &format!("/package/{package}/tag/{tag}")).json(&body);
        self.send_json(builder).await
    }

    /// `DELETE /package/{package}/tag/{tag}`.
    pub async fn delete_package_tag(&self, package: &str, tag: &str) -> CliResult<()> {
        let builder = self.request(reqwest::Method::DELETE, &format!("/package/{package}/tag/{tag}"));
        self.send_empty(builder).await
    }

    /// `GET /permission`.
    pub async fn get_permissions(&self) -> CliResult<Vec<PermissionOut>> {
        let builder = self.request(reqwest::Method::GET, "/permission");
        self.send_json(builder).await
    }
}

fn namespace_body(name: &str, description: &str, homepage: Option<&str>) -> Value {
    json!({ "name": name, "description": description, "homepage": homepage })
}
