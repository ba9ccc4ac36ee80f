// CLI layer - the operator front-end over the moderation service.

pub mod args;
pub mod dispatch;

pub use args::Cli;
pub use dispatch::{acting_user, execute};
