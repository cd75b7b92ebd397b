//! # Opaque process identifiers.
//!
//! A [`ProcessId`] names one supervised process for the lifetime of a
//! [`Supervisor`](crate::Supervisor) instance. Identifiers are minted once
//! at spawn, never reused, and carry no meaning beyond registry lookup.

use std::fmt;

use uuid::Uuid;

/// Registry identifier of a supervised process.
///
/// Globally unique (UUID v4 backed) and immutable.
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub struct ProcessId(String);

impl ProcessId {
    /// Mints a fresh identifier.
    pub(crate) fn generate() -> Self {
        Self(Uuid::new_v4().to_string())
    }

    /// Returns the identifier as a string slice.
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for ProcessId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn generated_ids_are_unique() {
        assert_ne!(ProcessId::generate(), ProcessId::generate());
    }

    #[test]
    fn display_matches_as_str() {
        let id = ProcessId::generate();
        assert_eq!(id.to_string(), id.as_str());
    }
}
