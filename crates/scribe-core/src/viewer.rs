use uuid::Uuid;

use crate::error::{CoreError, Result};

/// An authenticated user as seen by the core.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Identity {
    pub id: Uuid,
    pub username: String,
}

/// Who is making the request.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub enum Viewer {
    #[default]
    Anonymous,
    User(Identity),
}

impl Viewer {
    pub fn user(id: Uuid, username: impl Into<String>) -> Self {
        Self::User(Identity {
            id,
            username: username.into(),
        })
    }

    pub fn identity(&self) -> Option<&Identity> {
        match self {
            Self::Anonymous => None,
            Self::User(identity) => Some(identity),
        }
    }

    /// The identity, or `Unauthorized` for anonymous viewers.
    pub fn require(&self) -> Result<&Identity> {
        self.identity().ok_or(CoreError::Unauthorized)
    }

    pub fn is_authenticated(&self) -> bool {
        matches!(self, Self::User(_))
    }
}
