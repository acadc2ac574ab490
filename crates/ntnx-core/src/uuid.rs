//! Strongly-typed identifier wrappers for Acropolis resources.
//!
//! Identifiers are assigned by the server and treated as opaque strings: the
//! management plane hands out UUIDs, but nothing here depends on their
//! format. Distinct wrapper types keep an image id from being passed where a
//! VM disk id is expected.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use crate::error::{Error, Result};

/// Macro to generate strongly-typed identifier wrapper types.
macro_rules! id_type {
    ($(#[$meta:meta])* $name:ident, $doc:expr) => {
        $(#[$meta])*
        #[doc = $doc]
        #[derive(Debug, Clone, Default, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
        #[serde(transparent)]
        pub struct $name(String);

        impl $name {
            /// Wraps an identifier without validation.
            #[must_use]
            pub fn new(id: impl Into<String>) -> Self {
                Self(id.into())
            }

            /// Creates a new random identifier (UUID v4).
            #[must_use]
            pub fn new_v4() -> Self {
                Self(::uuid::Uuid::new_v4().to_string())
            }

            /// Returns the identifier as a string slice.
            #[must_use]
            pub fn as_str(&self) -> &str {
                &self.0
            }

            /// Returns true if the identifier is empty (server default body).
            #[must_use]
            pub fn is_empty(&self) -> bool {
                self.0.is_empty()
            }

            /// Parses a non-empty identifier.
            ///
            /// # Errors
            ///
            /// Returns an error if the input is empty or contains a `/`.
            pub fn parse_str(input: &str) -> Result<Self> {
                if input.is_empty() || input.contains('/') {
                    return Err(Error::InvalidId(format!(
                        "{} `{input}`",
                        stringify!($name)
                    )));
                }
                Ok(Self(input.to_string()))
            }
        }

        impl From<String> for $name {
            fn from(id: String) -> Self {
                Self(id)
            }
        }

        impl From<&str> for $name {
            fn from(id: &str) -> Self {
                Self(id.to_string())
            }
        }

        impl From<$name> for String {
            fn from(wrapper: $name) -> Self {
                wrapper.0
            }
        }

        impl FromStr for $name {
            type Err = Error;

            fn from_str(s: &str) -> Result<Self> {
                Self::parse_str(s)
            }
        }

        impl fmt::Display for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                f.write_str(&self.0)
            }
        }

        impl AsRef<str> for $name {
            fn as_ref(&self) -> &str {
                &self.0
            }
        }
    };
}

id_type!(ImageUuid, "Image identifier");
id_type!(VmUuid, "Virtual machine identifier");
id_type!(VmDiskUuid, "Virtual disk identifier");
id_type!(ContainerUuid, "Storage container identifier");
id_type!(TaskUuid, "Asynchronous task identifier");

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_new_v4_is_unique() {
        let a = ImageUuid::new_v4();
        let b = ImageUuid::new_v4();
        assert_ne!(a, b);
        assert_eq!(a.as_str().len(), 36);
    }

    #[test]
    fn test_parse_accepts_opaque_ids() {
        let id: VmDiskUuid = "d1".parse().unwrap();
        assert_eq!(id.as_str(), "d1");
        assert_eq!(id.to_string(), "d1");
    }

    #[test]
    fn test_parse_rejects_empty_and_slash() {
        assert!(matches!(
            ImageUuid::parse_str(""),
            Err(Error::InvalidId(_))
        ));
        assert!(matches!(
            ImageUuid::parse_str("a/b"),
            Err(Error::InvalidId(_))
        ));
    }

    #[test]
    fn test_serde_transparent() {
        let id = TaskUuid::new("task-1");
        let json = serde_json::to_string(&id).unwrap();
        assert_eq!(json, "\"task-1\"");

        let back: TaskUuid = serde_json::from_str(&json).unwrap();
        assert_eq!(back, id);
    }

    #[test]
    fn test_default_is_empty() {
        assert!(ImageUuid::default().is_empty());
        assert!(!ImageUuid::new("u1").is_empty());
    }
}
