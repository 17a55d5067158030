//! REST helpers shared by modules: the typed operation builder, RFC 9457
//! problems and a few response shorthands.

pub mod operation_builder;
pub mod problem;
pub mod response;

pub use operation_builder::{
    ensure_schema, state, Missing, OpenApiRegistry, OperationBuilder, OperationSpec,
    ParamLocation, ParamSpec, Present, RequestBodySpec, ResponseSpec,
};
