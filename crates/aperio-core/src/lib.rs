//! # aperio-core — Foundational Types for Aperio
//!
//! This crate is the bedrock of the Aperio toolkit. It defines the
//! primitives shared by the schema engine and the document projector;
//! every other crate in the workspace depends on `aperio-core`, and it
//! depends on nothing internal.
//!
//! ## Key Design Principles
//!
//! 1. **Two disjoint error classes.** [`DefinitionError`] marks defects
//!    in the API definition itself and propagates as a hard failure.
//!    [`Violation`]s describe bad request input and accumulate in an
//!    [`ErrorSink`] so one pass reports every problem in a payload.
//!
//! 2. **Build, then freeze.** [`Attrs`] and the definitions registry in
//!    `aperio-schema` are mutated single-threaded during startup and
//!    frozen once; afterwards they are read-only and safe to share
//!    across request-handling threads without synchronization.
//!
//! 3. **`CanonicalBytes` newtype.** All document digest computation
//!    flows through [`CanonicalBytes::new()`]; [`sha256_digest()`]
//!    accepts nothing else.
//!
//! 4. **Exhaustive matching on closed enums.** [`Existence`],
//!    [`Status`], and [`ViolationKind`] are matched exhaustively —
//!    adding a variant forces every consumer to handle it.
//!
//! ## Crate Policy
//!
//! - No dependencies on other `aperio-*` crates.
//! - No `unsafe` code.
//! - No `panic!()` or `.unwrap()` outside tests.

pub mod attrs;
pub mod canonical;
pub mod digest;
pub mod error;
pub mod existence;
pub mod path;
pub mod status;

// Re-export primary types for ergonomic imports.
pub use attrs::{AttrValue, Attrs};
pub use canonical::CanonicalBytes;
pub use digest::{sha256_digest, sha256_hex, ContentDigest, DigestAlgorithm};
pub use error::{CanonicalizationError, DefinitionError, ErrorSink, Violation, ViolationKind};
pub use existence::{Existence, Presence};
pub use path::{AttrPath, PathSegment};
pub use status::{Status, StatusRange};
