use crate::domain::error::DomainError;
use crate::domain::model::StateMap;

pub type Result<T> = std::result::Result<T, DomainError>;

/// Repository trait for persisted circuit-breaker state
pub trait StateRepository: Send + Sync {
    /// Read the whole map. Missing or unreadable storage yields an empty map.
    fn load(&self) -> StateMap;

    /// Overwrite the stored map with `state`
    fn save(&self, state: &StateMap) -> Result<()>;
}

