//! Domain newtypes with validation
//!
//! Strongly-typed wrappers for remote identifiers. Each newtype ensures data
//! validity at construction time.

use std::fmt::{self, Display, Formatter};
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use super::errors::DomainError;

/// Alias understood by the file store for the user's top-level folder
pub const ROOT_ALIAS: &str = "root";

// ============================================================================
// ItemId
// ============================================================================

/// Opaque identifier of a file, folder or document in the remote store
///
/// Remote ids are URL-safe tokens: letters, digits, `-` and `_`. The
/// validation keeps ids safe to splice into request paths and search
/// queries.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct ItemId(String);

impl ItemId {
    /// Create a new ItemId
    ///
    /// # Errors
    /// Returns error if the ID is empty or contains characters outside the
    /// URL-safe set
    pub fn new(id: impl Into<String>) -> Result<Self, DomainError> {
        let id = id.into();
        if id.is_empty() {
            return Err(DomainError::InvalidItemId(
                "Item ID cannot be empty".to_string(),
            ));
        }

        if !id
            .chars()
            .all(|c| c.is_ascii_alphanumeric() || c == '-' || c == '_')
        {
            return Err(DomainError::InvalidItemId(format!(
                "Item ID contains invalid characters: {id}"
            )));
        }

        Ok(Self(id))
    }

    /// The id of the user's root folder
    #[must_use]
    pub fn root() -> Self {
        Self(ROOT_ALIAS.to_string())
    }

    /// Whether this id is the root alias
    #[must_use]
    pub fn is_root(&self) -> bool {
        self.0 == ROOT_ALIAS
    }

    /// Get the inner string reference
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl Display for ItemId {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl FromStr for ItemId {
    type Err = DomainError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::new(s)
    }
}

impl TryFrom<String> for ItemId {
    type Error = DomainError;

    fn try_from(s: String) -> Result<Self, Self::Error> {
        Self::new(s)
    }
}

impl From<ItemId> for String {
    fn from(id: ItemId) -> Self {
        id.0
    }
}

impl AsRef<str> for ItemId {
    fn as_ref(&self) -> &str {
        &self.0
    }
}
