//! Symbolic lookup keys.
//!
//! Slots, children, plugin types and roots can all be addressed either by their
//! numeric id or by their name. A [`Key`] carries exactly one of the two; the
//! id `0` and the empty name are never valid handles.

use core::fmt;

use crate::error::{GraphError, GraphResult};

/// Addresses an object by id or by name, never both.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum Key {
    /// Numeric id (ids start at 1).
    Id(u32),
    /// Name, unique within the owning registry.
    Name(String),
}

impl Key {
    /// Build a key from an optional id and an optional name.
    ///
    /// Exactly one of the two must be present. The id `0` and the empty name
    /// count as absent.
    ///
    /// # Errors
    ///
    /// Returns [`GraphError::Malformed`] if both or neither are supplied.
    pub fn from_parts(id: Option<u32>, name: Option<&str>) -> GraphResult<Self> {
        let id = id.filter(|&id| id != 0);
        let name = name.filter(|name| !name.is_empty());
        match (id, name) {
            (Some(id), None) => Ok(Key::Id(id)),
            (None, Some(name)) => Ok(Key::Name(name.to_owned())),
            (Some(_), Some(_)) => Err(GraphError::Malformed(
                "both an id and a name were supplied",
            )),
            (None, None) => Err(GraphError::Malformed(
                "neither an id nor a name was supplied",
            )),
        }
    }

    /// Reject the null handles (`Id(0)`, empty name).
    pub fn validated(self) -> GraphResult<Self> {
        match self {
            Key::Id(0) => Err(GraphError::Malformed("id 0 is not a valid handle")),
            Key::Name(ref name) if name.is_empty() => {
                Err(GraphError::Malformed("the empty name is not a valid handle"))
            }
            key => Ok(key),
        }
    }

    /// Returns true if the key designates the object with this id and name.
    pub fn matches(&self, id: u32, name: Option<&str>) -> bool {
        match self {
            Key::Id(wanted) => *wanted == id,
            Key::Name(wanted) => name == Some(wanted.as_str()),
        }
    }
}

impl fmt::Display for Key {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Key::Id(id) => write!(f, "#{id}"),
            Key::Name(name) => write!(f, "'{name}'"),
        }
    }
}

impl From<u32> for Key {
    fn from(id: u32) -> Self {
        Key::Id(id)
    }
}

impl From<&str> for Key {
    fn from(name: &str) -> Self {
        Key::Name(name.to_owned())
    }
}

impl From<String> for Key {
    fn from(name: String) -> Self {
        Key::Name(name)
    }
}

impl From<&String> for Key {
    fn from(name: &String) -> Self {
        Key::Name(name.clone())
    }
}

impl From<&Key> for Key {
    fn from(key: &Key) -> Self {
        key.clone()
    }
}
