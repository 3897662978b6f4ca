pub mod api;
pub mod bootstrap;
pub mod config;
pub mod db;
pub mod logging;
pub mod records;
pub mod store;
