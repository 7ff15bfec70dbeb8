pub mod coordinator;
pub mod config;
pub mod poll;
pub mod provider;
pub mod keys;

pub use coordinator::*;
pub use config::PollConfiguration;
pub use poll::*;
pub use provider::*;
pub use keys::*;
