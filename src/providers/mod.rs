pub mod path_guard;

pub mod fetcher;
pub mod http_fetcher;

pub mod history_store;
pub mod yaml_history_store;

pub mod executor;
pub mod tokio_executor;
