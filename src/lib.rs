pub mod config;
pub mod dtos;
pub mod engagement;
pub mod error;
pub mod models;
pub mod realtime;
pub mod repositories;
pub mod services;

pub use config::Config;
pub use error::{Error, Result};
