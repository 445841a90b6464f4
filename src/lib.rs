pub mod backend;
pub mod config;
pub mod context;
pub mod errors;
pub mod keys;
pub mod models;
pub mod phases;
pub mod pipeline;
pub mod poller;
pub mod session;
pub mod store;
pub mod ui;
pub mod workspace;

#[cfg(test)]
pub(crate) mod test_support;
