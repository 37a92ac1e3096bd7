pub mod app;
pub mod config;
pub mod domain;
pub mod error;
pub mod flatten;
pub mod http;
pub mod inat;
pub mod output;
pub mod places;
pub mod store;
pub mod taxonomy;
