// crates/registry-core/src/core/identifiers.rs
// ============================================================================
// Module: Registry Identifiers
// Description: Canonical opaque identifiers for registry entities.
// Purpose: Provide strongly typed, serializable identifiers with stable wire forms.
// Dependencies: serde
// ============================================================================

//! ## Overview
//! This module defines the opaque identifiers used throughout the registry.
//! Numeric identifiers enforce non-zero, 1-based invariants at construction
//! boundaries; they back SQLite `INTEGER PRIMARY KEY` columns.

// ============================================================================
// SECTION: Imports
// ============================================================================

use std::fmt;
use std::num::NonZeroU64;

use serde::Deserialize;
use serde::Serialize;

// ============================================================================
// SECTION: Macro: numeric identifier boilerplate
// ============================================================================

macro_rules! numeric_id {
    ($name:ident, $doc:literal) => {
        #[doc = $doc]
        ///
        /// # Invariants
        /// - Always >= 1 (non-zero, 1-based).
        #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
        #[serde(transparent)]
        pub struct $name(NonZeroU64);

        impl $name {
            #[doc = concat!("Creates a new ", stringify!($name), " from a non-zero value.")]
            #[must_use]
            pub const fn new(id: NonZeroU64) -> Self {
                Self(id)
            }

            #[doc = concat!("Creates a ", stringify!($name), " from a raw value (returns `None` if zero).")]
            #[must_use]
            pub fn from_raw(raw: u64) -> Option<Self> {
                NonZeroU64::new(raw).map(Self)
            }

            /// Returns the raw identifier value (always >= 1).
            #[must_use]
            pub const fn get(self) -> u64 {
                self.0.get()
            }
        }

        impl fmt::Display for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                self.0.get().fmt(f)
            }
        }
    };
}

numeric_id!(UserId, "User identifier.");
numeric_id!(NamespaceId, "Namespace identifier.");
numeric_id!(PackageId, "Package identifier.");
numeric_id!(VersionId, "Package version identifier.");
numeric_id!(RoleId, "Namespace role identifier.");

// ============================================================================
// SECTION: Macro: opaque string identifier boilerplate
// ============================================================================

macro_rules! string_id {
    ($name:ident, $doc:literal) => {
        #[doc = $doc]
        ///
        /// # Invariants
        /// - Opaque UTF-8 string; no normalization or validation is applied by this type.
        #[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
        #[serde(transparent)]
        pub struct $name(String);

        impl $name {
            #[doc = concat!("Creates a new ", stringify!($name), ".")]
            #[must_use]
            pub fn new(id: impl Into<String>) -> Self {
                Self(id.into())
            }

            /// Returns the identifier as a string slice.
            #[must_use]
            pub fn as_str(&self) -> &str {
                &self.0
            }
        }

        impl fmt::Display for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                self.0.fmt(f)
            }
        }

        impl From<&str> for $name {
            fn from(value: &str) -> Self {
                Self::new(value)
            }
        }

        impl From<String> for $name {
            fn from(value: String) -> Self {
                Self::new(value)
            }
        }
    };
}

string_id!(Username, "Username, used as the stable human-facing user key.");
string_id!(PackageName, "Package name, used as the stable human-facing package key.");
string_id!(NamespaceName, "Namespace name, used as the stable human-facing namespace key.");

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn numeric_id_round_trips_through_display() {
        let id = UserId::from_raw(7).expect("7 is non-zero");
        assert_eq!(id.get(), 7);
        assert_eq!(id.to_string(), "7");
    }

    #[test]
    fn numeric_id_rejects_zero() {
        assert!(UserId::from_raw(0).is_none());
    }

    #[test]
    fn string_id_round_trips() {
        let name = Username::from("alex");
        assert_eq!(name.as_str(), "alex");
        assert_eq!(name.to_string(), "alex");
    }
}
