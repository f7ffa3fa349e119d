mod breaker;
mod login_flow;
mod state_store;

pub use breaker::{unix_now, CircuitBreaker};
pub use login_flow::LoginFlow;
pub use state_store::StateStore;
