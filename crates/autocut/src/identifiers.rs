//! Newtype domain identifiers.
//!
//! Every tracker concept that has an identity is represented as a distinct
//! newtype wrapping a primitive. This prevents passing an [`IssueNumber`]
//! (repository-scoped, what humans type after `#`) where an [`IssueId`]
//! (tracker-global, what project cards reference) is expected, even though
//! both are `u64` under the hood.

use serde::{Deserialize, Serialize};
use uuid::Uuid;

// ---------------------------------------------------------------------------
// Macro for String-wrapped newtypes.
// Generates: struct, new() returning Option<Self>, as_str(), Display.
// ---------------------------------------------------------------------------
macro_rules! string_id {
    (
        $(#[$attr:meta])*
        $name:ident
    ) => {
        $(#[$attr])*
        #[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
        pub struct $name(String);

        impl $name {
            /// Creates a new identifier, returning `None` if the value is empty.
            pub fn new(value: impl Into<String>) -> Option<Self> {
                let v = value.into();
                if v.is_empty() { None } else { Some(Self(v)) }
            }

            /// Returns the identifier as a string slice.
            pub fn as_str(&self) -> &str {
                &self.0
            }
        }

        impl std::fmt::Display for $name {
            fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
                write!(f, "{}", self.0)
            }
        }
    };
}

// ---------------------------------------------------------------------------
// Macro for u64-wrapped newtypes (tracker-assigned integers).
// Generates: struct (Copy), new(), as_u64(), Display.
// ---------------------------------------------------------------------------
macro_rules! u64_id {
    (
        $(#[$attr:meta])*
        $name:ident
    ) => {
        $(#[$attr])*
        #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
        pub struct $name(u64);

        impl $name {
            /// Creates a new identifier from a raw integer.
            pub fn new(value: u64) -> Self {
                Self(value)
            }

            /// Returns the underlying integer value.
            pub fn as_u64(self) -> u64 {
                self.0
            }
        }

        impl std::fmt::Display for $name {
            fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
                write!(f, "{}", self.0)
            }
        }
    };
}

// ---------------------------------------------------------------------------
// Identifiers: tracker-integer-backed
// ---------------------------------------------------------------------------

u64_id! {
    /// Repository-scoped issue number (the `#123` in a tracker URL).
    ///
    /// Used for every write against an existing issue: comments and state edits.
    IssueNumber
}

u64_id! {
    /// Tracker-global issue identifier.
    ///
    /// Distinct from [`IssueNumber`]; project cards reference issues by this id.
    IssueId
}

u64_id! {
    /// Identifies a project board resolved by name.
    ProjectId
}

u64_id! {
    /// Identifies a column within a project board.
    ColumnId
}

// ---------------------------------------------------------------------------
// Identifiers: UUID-backed (internally generated)
// ---------------------------------------------------------------------------

/// Identifies a single cut (one invocation of the dispatcher).
///
/// Generated fresh for every CLI invocation and recorded on the tracing span
/// so all activity from a single run can be correlated.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct CutRunId(Uuid);

impl CutRunId {
    /// Generates a new random run identifier.
    pub fn new_random() -> Self {
        Self(Uuid::new_v4())
    }
}

impl std::fmt::Display for CutRunId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

// ---------------------------------------------------------------------------
// Identifiers: String-backed
// ---------------------------------------------------------------------------

string_id! {
    /// An issue label (e.g. the sentinel `"autocut"` or a caller-supplied
    /// `"flaky-test"`).
    Label
}

string_id! {
    /// Owner (user or organisation) of the repository issues are filed in.
    RepositoryOwner
}

string_id! {
    /// Name of the repository issues are filed in, without the owner prefix.
    RepositoryName
}

impl Label {
    /// The sentinel label used when none is configured.
    pub fn sentinel() -> Self {
        Self("autocut".to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn string_ids_reject_empty_values() {
        assert!(Label::new("").is_none());
        assert_eq!(Label::new("flaky").map(|l| l.to_string()), Some("flaky".to_string()));
    }

    #[test]
    fn sentinel_label_is_autocut() {
        assert_eq!(Label::sentinel().as_str(), "autocut");
    }

    #[test]
    fn run_ids_are_unique() {
        assert_ne!(CutRunId::new_random(), CutRunId::new_random());
    }
}
