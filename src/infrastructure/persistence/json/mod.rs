mod state_repo;

pub use state_repo::JsonStateRepository;
