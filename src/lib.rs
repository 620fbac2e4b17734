pub mod config;
pub mod core;
pub mod enums;
pub mod errors;
pub mod models;
pub mod utils;
