use std::fmt;

use uuid::Uuid;

/// Runtime identity of a method receiver.
///
/// Allocated once when the receiver is built and never derived from its
/// state, so two receivers with equal fields still have different ids.
/// Keep it out of the receiver's serialized state (`#[serde(skip)]`),
/// otherwise state-based sharing between instances stops working.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct InstanceId(Uuid);

impl InstanceId {
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }

    pub fn as_uuid(&self) -> Uuid {
        self.0
    }
}

impl Default for InstanceId {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Display for InstanceId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.0.fmt(f)
    }
}

/// Receivers of cached methods expose their identity through this trait.
pub trait Identified {
    fn instance_id(&self) -> InstanceId;
}
