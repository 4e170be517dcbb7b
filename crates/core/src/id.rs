// SPDX-License-Identifier: MIT

//! Opaque 128-bit identifiers.
//!
//! Every entity in the data model (`spec.md` §3: Job, Workflow, Worker) is
//! keyed by a random v4 UUID wrapped in a distinct newtype, so a `JobId`
//! can never be handed to a function expecting a `WorkerId` by accident.

/// Define a newtype ID wrapper around [`uuid::Uuid`].
///
/// Generates `new()` for random generation, `from_uuid`/`parse` for
/// round-tripping, `Display`, `FromStr`, and the trait impls needed to use
/// the ID as a `HashMap` key or Postgres-style unique index column.
#[macro_export]
macro_rules! define_id {
    (
        $(#[$meta:meta])*
        pub struct $name:ident;
    ) => {
        $(#[$meta])*
        #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, ::serde::Serialize, ::serde::Deserialize)]
        #[serde(transparent)]
        pub struct $name(pub ::uuid::Uuid);

        impl $name {
            /// Generate a new random (v4) identifier.
            pub fn new() -> Self {
                Self(::uuid::Uuid::new_v4())
            }

            /// Wrap an existing UUID (e.g. one read back from storage).
            pub fn from_uuid(id: ::uuid::Uuid) -> Self {
                Self(id)
            }

            /// Parse from its textual form. Fails with `uuid::Error` on malformed input.
            pub fn parse(s: &str) -> Result<Self, ::uuid::Error> {
                Ok(Self(::uuid::Uuid::parse_str(s)?))
            }

            pub fn as_uuid(&self) -> ::uuid::Uuid {
                self.0
            }
        }

        impl Default for $name {
            fn default() -> Self {
                Self::new()
            }
        }

        impl std::fmt::Display for $name {
            fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
                write!(f, "{}", self.0)
            }
        }

        impl std::str::FromStr for $name {
            type Err = ::uuid::Error;

            fn from_str(s: &str) -> Result<Self, Self::Err> {
                Self::parse(s)
            }
        }

        impl From<::uuid::Uuid> for $name {
            fn from(id: ::uuid::Uuid) -> Self {
                Self(id)
            }
        }
    };
}

#[cfg(test)]
#[path = "id_tests.rs"]
mod tests;
