//! Per-section relaxation state and the rewriter that drives one pass
//! over a transformable section (spec.md §3, §4.5).

pub mod anchor;
pub mod aux;
pub mod rewriter;

pub use anchor::Anchor;
pub use aux::{RelaxAux, RelocInfo, StagedWrite};
pub use rewriter::{PassOutcome, SectionReloc, TransformableSection};
