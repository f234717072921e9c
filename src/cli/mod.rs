pub mod commands;
pub mod handlers;

pub use commands::{CliArgs, Commands, HealthArgs, ServeArgs};
pub use handlers::{handle_health, handle_serve};
