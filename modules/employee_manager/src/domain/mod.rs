pub mod error;
pub mod paginator;
pub mod repo;
pub mod service;
pub mod validation;
