//! Error types returned by the relaxation engine.
//!
//! Mirrors the error-handling shape used throughout `goblin`'s newer
//! modules (e.g. `elf::build_attributes::Error`): a hand-written enum with
//! manual `Display`/`Error` impls and `From` conversions, rather than a
//! derive-macro crate.

use core::fmt;

use crate::reloc::RelocKind;

/// Where, in the object being relaxed, an error occurred.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ErrorLocation {
    /// Byte offset of the relocation within its input section.
    pub offset: u64,
    /// Index of the relocation within the section's relocation list.
    pub reloc_index: usize,
}

/// Errors produced while applying relocations or while relaxing/expanding
/// a section (spec.md §7).
#[derive(Debug)]
pub enum RelaxError {
    /// The resolved value does not fit in the relocation's bit field.
    ///
    /// Non-fatal per relocation only when the symbol is undefined-weak; the
    /// applier never constructs this variant in that case (spec.md §4.2),
    /// so by the time a caller observes this error it is fatal to the link.
    OutOfRange {
        loc: ErrorLocation,
        kind: RelocKind,
        value: i64,
    },
    /// An `S{N}`-family relocation's value has non-zero low bits.
    Misaligned {
        loc: ErrorLocation,
        kind: RelocKind,
        value: i64,
    },
    /// A relocation kind number the property tables don't recognise.
    UnknownRelocKind { loc: ErrorLocation, raw: u32 },
    /// A `NEG`/`ASHIFTR_1` composite's successor relocations did not share
    /// the expected buffer location (spec.md §4.2, §7). The original C++
    /// calls `exit(6)`; this crate returns an error instead and leaves the
    /// decision of how fatal that is to the host linker.
    CompositeLogicError { loc: ErrorLocation },
}

impl fmt::Display for RelaxError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            RelaxError::OutOfRange { loc, kind, value } => write!(
                f,
                "relocation {kind:?} at offset {:#x} (reloc #{}) out of range: value {:#x}",
                loc.offset, loc.reloc_index, value
            ),
            RelaxError::Misaligned { loc, kind, value } => write!(
                f,
                "relocation {kind:?} at offset {:#x} (reloc #{}) misaligned: value {:#x}",
                loc.offset, loc.reloc_index, value
            ),
            RelaxError::UnknownRelocKind { loc, raw } => write!(
                f,
                "unknown relocation kind {raw} at offset {:#x} (reloc #{})",
                loc.offset, loc.reloc_index
            ),
            RelaxError::CompositeLogicError { loc } => write!(
                f,
                "composite NEG/ASHIFTR_1 relocation at offset {:#x} (reloc #{}) does not share a buffer location with its successor",
                loc.offset, loc.reloc_index
            ),
        }
    }
}

#[cfg(feature = "std")]
impl std::error::Error for RelaxError {}

pub type Result<T> = core::result::Result<T, RelaxError>;
