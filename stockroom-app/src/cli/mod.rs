pub mod commands;
pub mod edit;
pub mod opts;
