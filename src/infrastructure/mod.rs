//! Infrastructure layer - AWS adapters, logging and services

pub mod aws;
pub mod logging;
pub mod sanitizer;
pub mod services;
