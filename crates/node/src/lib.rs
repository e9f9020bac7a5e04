pub mod cli;
pub mod config;
mod service;


pub use service::*;
