//! Irregular 2D nesting: no-fit-polygon placement driven by a genetic
//! algorithm over part order and rotation.
//!
//! Module map (see DESIGN.md for what each one is grounded on):
//! - [`geometry`] — polygon predicates and constructive primitives (G)
//! - [`boolean`] — Clipper-backed union/difference/offset, plus Minkowski
//!   sum/difference and polygon cleaning (B)
//! - [`part`] — the positioned, holed polygon tree shared by parts and bins
//! - [`nfp`] — the no-fit-polygon engine (N)
//! - [`cache`] — the generation-scoped NFP cache (C)
//! - [`placement`] — bottom-left placement of an ordered part sequence (P)
//! - [`ga`] — the genetic algorithm over (order, rotation) individuals (GA)
//! - [`coordinator`] — drives the generation loop and NFP fan-out (K)
//! - [`svg_parser`] / [`dxf_parser`] / [`line_merge`] — Shape Source readers
//! - [`error`] — the crate's error type

pub mod boolean;
pub mod cache;
pub mod coordinator;
pub mod dxf_parser;
pub mod error;
pub mod ga;
pub mod geometry;
pub mod line_merge;
pub mod nfp;
pub mod part;
pub mod placement;
pub mod svg_parser;

pub use coordinator::{Coordinator, NestConfig, NestResult};
pub use error::{NestError, Result};
pub use part::Polygon;
