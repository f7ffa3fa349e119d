use crate::domain::model::{AccountState, StateMap};
use crate::domain::repository::StateRepository;

/// In-memory owner of all circuit-breaker state, flushed on every mutation
pub struct StateStore<R: StateRepository> {
    repo: R,
    state: StateMap,
}

impl<R: StateRepository> StateStore<R> {
    /// Load the persisted map once. Missing or corrupt storage yields an empty store.
    pub fn load(repo: R) -> Self {
        let state = repo.load();
        tracing::info!("State store loaded with {} tracked account(s)", state.len());
        Self { repo, state }
    }

    pub fn get(&self, username: &str) -> Option<&AccountState> {
        self.state.get(username)
    }

    /// Replace the record for `username` and persist
    pub fn upsert(&mut self, username: &str, record: AccountState) {
        self.state.insert(username.to_string(), record);
        self.persist();
    }

    /// Delete the record for `username`, persisting only if one existed
    pub fn remove(&mut self, username: &str) -> bool {
        if self.state.remove(username).is_none() {
            return false;
        }
        self.persist();
        true
    }

    // A failed flush must not abort the run; the in-memory copy stays authoritative
    fn persist(&self) {
        if let Err(e) = self.repo.save(&self.state) {
            tracing::error!("Failed to persist account state: {}", e);
        }
    }
}
