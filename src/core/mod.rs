pub mod backend;
pub mod config;
pub mod safety;
pub mod session;
pub mod terminal;
