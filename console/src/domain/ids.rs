//! Validated identifiers for entities and columns.
//!
//! Both identifiers are opaque, trimmed, non-empty strings. They serialise as
//! plain JSON strings so they can key maps in configuration payloads.

use std::fmt;

use serde::{Deserialize, Serialize};

/// Validation errors raised when constructing identifiers.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum IdValidationError {
    /// The identifier was empty.
    #[error("{kind} must not be empty")]
    Empty {
        /// Identifier kind, e.g. `entity id`.
        kind: &'static str,
    },
    /// The identifier carried leading or trailing whitespace.
    #[error("{kind} must not contain surrounding whitespace: {value:?}")]
    Untrimmed {
        /// Identifier kind, e.g. `entity id`.
        kind: &'static str,
        /// The rejected input.
        value: String,
    },
}

fn validate(kind: &'static str, value: &str) -> Result<(), IdValidationError> {
    if value.is_empty() {
        return Err(IdValidationError::Empty { kind });
    }
    if value.trim() != value {
        return Err(IdValidationError::Untrimmed {
            kind,
            value: value.to_owned(),
        });
    }
    Ok(())
}

macro_rules! define_id {
    ($(#[$meta:meta])* $name:ident, $kind:literal) => {
        $(#[$meta])*
        #[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
        #[serde(try_from = "String", into = "String")]
        pub struct $name(String);

        impl $name {
            /// Validate and construct the identifier from borrowed input.
            pub fn new(value: impl AsRef<str>) -> Result<Self, IdValidationError> {
                Self::try_from(value.as_ref().to_owned())
            }

            /// Borrow the raw identifier.
            #[must_use]
            pub fn as_str(&self) -> &str {
                self.0.as_str()
            }
        }

        impl AsRef<str> for $name {
            fn as_ref(&self) -> &str {
                self.as_str()
            }
        }

        impl fmt::Display for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                f.write_str(self.as_str())
            }
        }

        impl From<$name> for String {
            fn from(value: $name) -> Self {
                value.0
            }
        }

        impl TryFrom<String> for $name {
            type Error = IdValidationError;

            fn try_from(value: String) -> Result<Self, Self::Error> {
                validate($kind, &value)?;
                Ok(Self(value))
            }
        }
    };
}

define_id!(
    /// Name of a record type managed by the console, e.g. `users`.
    ///
    /// # Examples
    ///
    /// ```
    /// # use admin_console::domain::EntityId;
    /// let entity = EntityId::new("audit-logs").expect("valid entity id");
    /// assert_eq!(entity.as_str(), "audit-logs");
    /// assert!(EntityId::new(" users").is_err());
    /// ```
    EntityId,
    "entity id"
);

define_id!(
    /// One renderable attribute of an entity in a table view.
    ColumnId,
    "column id"
);
