//! Case-insensitive identifiers.
//!
//! Both identifiers keep the spelling they were created with for display and
//! serialization, while equality, ordering and hashing use a lowercase canonical form.
//! Normalization happens once, at construction, so map lookups never re-fold case.

use crate::error::DomainError;
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use std::cmp::Ordering;
use std::fmt;
use std::hash::{Hash, Hasher};
use std::str::FromStr;
use std::sync::Arc;

macro_rules! case_insensitive_id {
    ($(#[$meta:meta])* $name:ident, $label:literal) => {
        $(#[$meta])*
        #[derive(Clone)]
        pub struct $name {
            display: Arc<str>,
            canonical: Arc<str>,
        }

        impl $name {
            #[doc = concat!("Creates a new ", $label, " id, trimming surrounding whitespace.")]
            ///
            /// # Errors
            /// Returns [`DomainError::InvalidIdentifier`] if the input is empty or whitespace.
            pub fn new(value: impl AsRef<str>) -> Result<Self, DomainError> {
                let trimmed = value.as_ref().trim();
                if trimmed.is_empty() {
                    return Err(DomainError::InvalidIdentifier {
                        message: concat!($label, " id cannot be empty").into(),
                        context: None,
                    });
                }
                let canonical = if trimmed.chars().any(char::is_uppercase) {
                    Arc::from(trimmed.to_lowercase())
                } else {
                    Arc::from(trimmed)
                };
                Ok(Self { display: Arc::from(trimmed), canonical })
            }

            /// The identifier as originally spelled.
            #[must_use]
            pub fn as_str(&self) -> &str {
                &self.display
            }

            /// The lowercase form used for comparisons.
            #[must_use]
            pub fn canonical(&self) -> &str {
                &self.canonical
            }

            /// Case-insensitive comparison against a raw string.
            #[must_use]
            pub fn matches(&self, other: &str) -> bool {
                let other = other.trim();
                self.display.eq_ignore_ascii_case(other) || *self.canonical == other.to_lowercase()
            }
        }

        impl PartialEq for $name {
            fn eq(&self, other: &Self) -> bool {
                self.canonical == other.canonical
            }
        }

        impl Eq for $name {}

        impl Hash for $name {
            fn hash<H: Hasher>(&self, state: &mut H) {
                self.canonical.hash(state);
            }
        }

        impl PartialOrd for $name {
            fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
                Some(self.cmp(other))
            }
        }

        impl Ord for $name {
            fn cmp(&self, other: &Self) -> Ordering {
                self.canonical.cmp(&other.canonical)
            }
        }

        impl fmt::Debug for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                f.debug_tuple(stringify!($name)).field(&&*self.display).finish()
            }
        }

        impl fmt::Display for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                f.pad(&self.display)
            }
        }

        impl FromStr for $name {
            type Err = DomainError;

            fn from_str(s: &str) -> Result<Self, Self::Err> {
                Self::new(s)
            }
        }

        impl TryFrom<&str> for $name {
            type Error = DomainError;

            fn try_from(value: &str) -> Result<Self, Self::Error> {
                Self::new(value)
            }
        }

        impl TryFrom<String> for $name {
            type Error = DomainError;

            fn try_from(value: String) -> Result<Self, Self::Error> {
                Self::new(value)
            }
        }

        impl AsRef<str> for $name {
            fn as_ref(&self) -> &str {
                &self.display
            }
        }

        impl Serialize for $name {
            fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
            where
                S: Serializer,
            {
                serializer.serialize_str(&self.display)
            }
        }

        impl<'de> Deserialize<'de> for $name {
            fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
            where
                D: Deserializer<'de>,
            {
                let raw = String::deserialize(deserializer)?;
                Self::new(raw).map_err(serde::de::Error::custom)
            }
        }
    };
}

case_insensitive_id!(
    /// Normalized, case-insensitive name of a tenant shell.
    ShellId,
    "Shell"
);

case_insensitive_id!(
    /// Normalized, case-insensitive id of a pluggable feature.
    FeatureId,
    "Feature"
);
