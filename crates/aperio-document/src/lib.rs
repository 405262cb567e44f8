//! # aperio-document — Version-Specific Document Projection
//!
//! Renders one definitions registry into any of four document dialects:
//! Swagger 2.0 and OpenAPI 3.0 / 3.1 / 3.2. One source of truth fans
//! out to structurally different documents; the dialect decides field
//! names, nesting, and which entities exist at all.
//!
//! ## Design
//!
//! - Projection is pure: (entity, registry, version) in, nested mapping
//!   out. No mutation, no I/O.
//! - Absence over placeholders: fields a dialect lacks are omitted, and
//!   entities a dialect predates produce no output rather than an empty
//!   object.
//! - Rendered documents are content-addressed via canonical (RFC 8785)
//!   bytes, so a digest identifies a document independent of key order.

pub mod document;
pub mod media;
pub mod project;
pub mod version;

pub use document::{document_digest, to_document, DocumentInfo};
pub use media::best_match;
pub use project::ToDocument;
pub use version::DocVersion;
