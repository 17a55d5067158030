//! Company, department and employee management with a paginated employee search.

use std::sync::Arc;

use modkit::RegistryBuilder;

// === PUBLIC CONTRACT ===
pub mod contract;
pub use contract::{client, error, model};

// === MODULE DEFINITION ===
pub mod module;
pub use module::EmployeeManager;

// Internal layers, public for integration tests.
#[doc(hidden)]
pub mod api;
#[doc(hidden)]
pub mod config;
#[doc(hidden)]
pub mod domain;
#[doc(hidden)]
pub mod gateways;
#[doc(hidden)]
pub mod infra;

pub const MODULE_NAME: &str = "employee_manager";

/// Add the module to `b` with its database and REST capabilities.
pub fn register(b: &mut RegistryBuilder) -> Arc<EmployeeManager> {
    let module = Arc::new(EmployeeManager::default());
    b.add(MODULE_NAME, &["api_ingress"], module.clone())
        .with_db(module.clone())
        .with_rest(module.clone());
    module
}
