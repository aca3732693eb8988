pub mod download_command;
pub mod notifier;
pub mod router;
