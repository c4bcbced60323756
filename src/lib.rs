pub mod config;
pub mod gateway;
pub mod ipc;
pub mod wizard;
