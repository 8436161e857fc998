// crates/registry-core/src/lib.rs
// ============================================================================
// Module: Registry Core
// Description: Domain model, identifiers, permission logic, and validation
//              rules shared by the registry's storage, server, and CLI crates.
// Purpose: Keep business rules in one dependency-free crate so they can be
//          unit tested without a database or an HTTP server.
// ============================================================================

//! ## Overview
//! `registry-core` has no I/O of its own. It defines what a package, a
//! namespace, and a permission are, and the pure rules for checking one
//! against another. Everything that touches SQLite, JSON over HTTP, or the
//! filesystem lives in a separate crate that depends on this one.

pub mod acl;
pub mod core;
pub mod model;
pub mod validate;
