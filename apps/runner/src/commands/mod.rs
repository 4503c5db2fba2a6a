pub mod build;
pub mod run_server;
pub mod status;
