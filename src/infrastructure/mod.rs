pub mod browser;
pub mod config;
pub mod logging;
pub mod notify;
pub mod otp;
pub mod persistence;
