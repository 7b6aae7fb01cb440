use std::cell::RefCell;
use std::fmt;
use std::rc::Rc;

use serde::{Deserialize, Deserializer, Serialize, Serializer};

/// Sentinel uid guaranteed not to match any stored node.
pub const SENTINEL_UID: &str = "0x0";

const TEMP_PREFIX: &str = "_:";

/// A node identity.
///
/// Three forms: empty (never saved), temporary `_:<token>` (minted at first
/// save, before commit) and permanent `0x…` (assigned by the backend). The
/// value lives behind a shared handle so that commit-time resolution of a
/// temporary uid is visible through every clone: the coordinator's
/// registration list and the caller's model observe the same cell.
///
/// Deliberately `!Send`: the mapping layer is single-threaded by design.
#[derive(Clone, Default)]
pub struct Uid(Rc<RefCell<String>>);

impl Uid {
    pub fn new(value: impl Into<String>) -> Self {
        Self(Rc::new(RefCell::new(value.into())))
    }

    pub fn get(&self) -> String {
        self.0.borrow().clone()
    }

    pub fn set(&self, value: impl Into<String>) {
        *self.0.borrow_mut() = value.into();
    }

    pub fn is_empty(&self) -> bool {
        self.0.borrow().is_empty()
    }

    /// Whether this is a client-minted `_:` uid awaiting commit.
    pub fn is_temp(&self) -> bool {
        self.0.borrow().starts_with(TEMP_PREFIX)
    }

    /// Whether this node has a permanent, backend-assigned uid.
    pub fn is_saved(&self) -> bool {
        !self.is_empty() && !self.is_temp()
    }

    /// The token part of a temporary uid, without the `_:` prefix.
    pub fn temp_token(&self) -> Option<String> {
        self.0.borrow().strip_prefix(TEMP_PREFIX).map(String::from)
    }
}

/// Whether `uid` has the permanent `0x…` form.
pub fn is_valid_uid(uid: &str) -> bool {
    uid.len() >= 2 && uid.starts_with("0x")
}

impl PartialEq for Uid {
    fn eq(&self, other: &Self) -> bool {
        *self.0.borrow() == *other.0.borrow()
    }
}

impl Eq for Uid {}

impl fmt::Debug for Uid {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Uid({:?})", self.0.borrow())
    }
}

impl fmt::Display for Uid {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0.borrow())
    }
}

impl From<&str> for Uid {
    fn from(value: &str) -> Self {
        Uid::new(value)
    }
}

impl Serialize for Uid {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&self.0.borrow())
    }
}

impl<'de> Deserialize<'de> for Uid {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        String::deserialize(deserializer).map(Uid::new)
    }
}
