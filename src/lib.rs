pub mod app;
pub mod auth;
pub mod cert;
pub mod config;
pub mod error;
pub mod kubeconfig;
pub mod types;
pub mod utils;
pub mod web;

pub use error::{Error, Result};
