pub mod configuration;
pub mod history;
pub mod transfer;
