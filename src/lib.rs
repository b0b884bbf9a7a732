pub mod app;
pub mod cache;
pub mod cli;
pub mod config;
pub mod coordinator;
pub mod domain;
pub mod gateway;
pub mod listing;
pub mod progress;
pub mod search;
pub mod store;
pub mod ui;
