pub mod api;
pub mod archive;
pub mod config;
pub mod errors;
pub mod logging;
pub mod purge;
pub mod snowflake;
pub mod ui;
