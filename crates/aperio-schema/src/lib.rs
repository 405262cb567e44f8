//! # aperio-schema — Meta-Model, Registry, and Validation Pipeline
//!
//! This crate owns the description side of Aperio: schemas and the
//! entities built from them (parameters, request bodies, responses,
//! security schemes, operations), the process-scoped definitions
//! registry, and the two wrapping pipelines that turn raw input into
//! validated value trees.
//!
//! ## Design
//!
//! - **One namespace, built then frozen.** A [`Definitions`] registry
//!   is assembled at startup and frozen once; every later lookup is a
//!   read-only borrow, so a frozen registry shares freely across
//!   request-handling threads.
//! - **Schemas are immutable.** Construction goes through
//!   [`SchemaBuilder`]; references between schemas are names resolved
//!   through the registry on demand, which is what lets a tree node
//!   type reference itself.
//! - **Two pipelines, one violation surface.** [`wrap`](wrap::wrap)
//!   handles parsed JSON; [`coerce`](coerce::coerce) first casts
//!   string-typed surface input. Both report input problems as
//!   path-scoped violations in a shared [`ErrorSink`], collected in a
//!   single pass; definition defects are hard `Result` failures.

pub mod coerce;
pub mod entity;
pub mod registry;
pub mod schema;
pub mod validators;
pub mod wrap;

pub use coerce::{coerce, DomNode, DomValue};
pub use entity::{
    ExampleObject, HttpScheme, Link, MediaTypeObject, Method, Operation, OperationBuilder,
    Parameter, ParameterLocation, ParameterRef, RequestBody, RequestBodyRef, Response,
    ResponseRef, SecurityScheme, Server, ServerVariable,
};
pub use registry::{Definitions, Usage};
pub use schema::{
    AdditionalProperties, Discriminator, PrimitiveKind, Schema, SchemaBuilder, SchemaKind,
};
pub use validators::{Validator, ValidatorKind, ValueFormat};
pub use wrap::{wrap, Node, Repr, SerializeOpts, MAX_WRAP_DEPTH};

// Re-exported so downstream crates need only one import for the
// validation surface.
pub use aperio_core::{ErrorSink, Violation, ViolationKind};
