pub mod config;
pub mod event;
pub mod instance;
pub mod notify;
pub mod pipeline;
pub mod status;
pub mod store;
pub mod upload;
