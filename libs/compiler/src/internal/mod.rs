pub mod config;
pub mod errors;
pub mod module;
pub(crate) mod settings;
pub mod solc;
