use std::ops::Deref;

use uuid::Uuid;

/// Unique identifier type
#[derive(Debug, Clone, serde::Deserialize, serde::Serialize, PartialEq, Eq, Hash, Default)]
pub struct UniqueIdentifier(Uuid);

/// Identifies one write operation for its whole lifetime
pub type OperationUuid = UniqueIdentifier;

impl UniqueIdentifier {
    /// Create a new unique identifier
    pub fn new(uuid: Uuid) -> Self {
        UniqueIdentifier(uuid)
    }

    /// Create a new random unique identifier
    pub fn random() -> Self {
        UniqueIdentifier(Uuid::new_v4())
    }
}

impl Deref for UniqueIdentifier {
    type Target = Uuid;

    fn deref(&self) -> &Self::Target {
        &self.0
    }
}

impl std::fmt::Display for UniqueIdentifier {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}
