pub mod config;
pub mod console;
pub mod error;
pub mod logging;
pub mod ringing;
pub mod scenario;
pub mod services;
pub mod tasks;
pub mod time_provider;
pub mod time_since;
pub mod title;
