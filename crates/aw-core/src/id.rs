//! Opaque identifiers used throughout the control plane.

use std::fmt;

use serde::{Deserialize, Serialize};
use uuid::Uuid;

macro_rules! uuid_id {
    ($(#[$doc:meta])* $name:ident) => {
        $(#[$doc])*
        #[derive(
            Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize,
        )]
        #[serde(transparent)]
        pub struct $name(Uuid);

        impl $name {
            /// Create a new random id.
            #[must_use]
            pub fn new() -> Self {
                Self(Uuid::new_v4())
            }

            #[must_use]
            pub fn as_uuid(&self) -> &Uuid {
                &self.0
            }
        }

        impl Default for $name {
            fn default() -> Self {
                Self::new()
            }
        }

        impl fmt::Display for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                write!(f, "{}", self.0)
            }
        }

        impl From<Uuid> for $name {
            fn from(id: Uuid) -> Self {
                Self(id)
            }
        }
    };
}

uuid_id!(
    /// Identity of a controlled agent.
    AgentId
);

impl AgentId {
    /// Sentinel id for control-plane events not tied to one agent, such
    /// as a global kill-switch release.
    #[must_use]
    pub fn control_plane() -> Self {
        Self(Uuid::nil())
    }
}

uuid_id!(
    /// Globally unique audit event id.
    EventId
);

uuid_id!(
    /// Id of a pending-approval request.
    RequestId
);

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn ids_are_unique() {
        assert_ne!(AgentId::new(), AgentId::new());
        assert_ne!(EventId::new(), EventId::new());
    }

    #[test]
    fn control_plane_id_is_stable() {
        assert_eq!(AgentId::control_plane(), AgentId::control_plane());
        assert_ne!(AgentId::control_plane(), AgentId::new());
    }

    #[test]
    fn id_serde_is_transparent() {
        let id = AgentId::new();
        let json = serde_json::to_string(&id).unwrap();
        assert_eq!(json, format!("\"{}\"", id));
        let back: AgentId = serde_json::from_str(&json).unwrap();
        assert_eq!(back, id);
    }
}
