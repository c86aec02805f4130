//! Type-safe identifier wrappers around [`String`].
//!
//! Journey entities are keyed by human-readable strings rather than opaque
//! UUIDs: achievements use stable slugs (`data-collector`), data points use
//! a dimension prefix followed by a time-ordered suffix. The wrappers keep
//! the two id spaces from being mixed at compile time while serializing as
//! plain JSON strings.

use serde::{Deserialize, Serialize};
use ts_rs::TS;
use uuid::Uuid;

/// Generates a newtype wrapper around [`String`] with standard derives.
macro_rules! define_key {
    (
        $(#[$meta:meta])*
        $name:ident
    ) => {
        $(#[$meta])*
        #[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize, TS)]
        #[serde(transparent)]
        #[ts(export, export_to = "bindings/")]
        pub struct $name(pub String);

        impl $name {
            /// Wrap an existing key.
            pub fn new(key: impl Into<String>) -> Self {
                Self(key.into())
            }

            /// Generate a fresh key of the form `{prefix}-{uuid-v7}`.
            ///
            /// UUID v7 is time-ordered, so generated keys sort by creation
            /// time within the same prefix.
            pub fn generate(prefix: &str) -> Self {
                Self(format!("{prefix}-{}", Uuid::now_v7()))
            }

            /// Borrow the key as a string slice.
            pub fn as_str(&self) -> &str {
                &self.0
            }
        }

        impl core::fmt::Display for $name {
            fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
                f.write_str(&self.0)
            }
        }

        impl From<&str> for $name {
            fn from(key: &str) -> Self {
                Self(key.to_owned())
            }
        }

        impl From<String> for $name {
            fn from(key: String) -> Self {
                Self(key)
            }
        }

        impl PartialEq<str> for $name {
            fn eq(&self, other: &str) -> bool {
                self.0 == other
            }
        }

        impl PartialEq<&str> for $name {
            fn eq(&self, other: &&str) -> bool {
                self.0 == *other
            }
        }
    };
}

define_key! {
    /// Unique identifier for a collected data point.
    DataPointId
}

define_key! {
    /// Unique identifier for an achievement. Unlocking is idempotent per id.
    AchievementId
}
