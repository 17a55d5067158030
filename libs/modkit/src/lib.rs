//! # ModKit
//!
//! Small module system used by the employee manager server.
//!
//! A module is a struct implementing [`Module`] plus any of the optional
//! capabilities ([`DbModule`], [`RestfulModule`], [`RestHostModule`],
//! [`StatefulModule`]). Modules are added to a [`RegistryBuilder`] with their
//! dependencies, topo-sorted, and then driven through the lifecycle phases
//! `init → db → rest → start → stop` by [`runtime::run`].
//!
//! ```rust,ignore
//! let mut b = RegistryBuilder::default();
//! api_ingress::register(&mut b);
//! employee_manager::register(&mut b);
//! let registry = b.build_topo_sorted()?;
//! ```

pub use anyhow::Result;
pub use async_trait::async_trait;

pub mod api;
pub mod client_hub;
pub mod context;
pub mod contracts;
pub mod registry;
pub mod runtime;

pub use api::problem::{
    bad_request, conflict, internal_error, not_found, Problem, ProblemResponse, ValidationError,
};
pub use api::{OpenApiRegistry, OperationBuilder};
pub use client_hub::ClientHub;
pub use context::{ConfigProvider, ModuleCtx, ModuleCtxBuilder};
pub use contracts::*;
pub use registry::{ModuleRegistry, RegistryBuilder, RegistryError};
pub use runtime::{run, DbOptions, RunOptions, ShutdownOptions};
