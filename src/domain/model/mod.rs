mod account;
mod account_state;
mod outcome;
mod session;

pub use account::Account;
pub use account_state::{AccountState, StateMap};
pub use outcome::{RunOutcome, RunSummary};
pub use session::{CaptureStatus, LoginStage};
