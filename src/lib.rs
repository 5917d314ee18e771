//! Link-time code transformation engine for the nanoMIPS instruction set.
//!
//! Rewrites relocatable object sections marked transformable by the
//! assembler so that oversized sequences collapse to shorter equivalents
//! when resolved values permit ("relaxation"), and undersized sequences
//! grow into longer equivalents when they don't ("expansion"). ELF object
//! parsing, symbol resolution, and output-section placement are a host
//! linker's job; this crate only owns the fixed-point rewrite itself.
//!
//! Five cooperating pieces, leaves first:
//! - [`codec`] — variable-width (2/4/6-byte) instruction reads/writes.
//! - [`reloc`] — relocation classification and bit-field patching.
//! - [`insn`] and [`reloc::property`] — static instruction/relocation
//!   property tables.
//! - [`transform`] — the controller and template data model driving one
//!   relocation's replacement choice.
//! - [`section`] — the per-section rewriter that ties it all together.
//!
//! [`engine::Engine`] is the entry point a host calls once per pass.

#![cfg_attr(not(feature = "std"), no_std)]

#[cfg(feature = "alloc")]
extern crate alloc;

/// Re-exports `Vec`/`vec!` from whichever of `std`/`alloc` is active, so
/// the rest of the crate can write plain `Vec<T>` regardless of which
/// feature combination is enabled.
pub(crate) mod prelude {
    #[cfg(feature = "std")]
    pub use std::vec;
    #[cfg(feature = "std")]
    pub use std::vec::Vec;

    #[cfg(all(feature = "alloc", not(feature = "std")))]
    pub use alloc::vec;
    #[cfg(all(feature = "alloc", not(feature = "std")))]
    pub use alloc::vec::Vec;
}

pub mod codec;
pub mod config;
pub mod container;
pub mod engine;
pub mod error;
pub mod insn;
pub mod reloc;
pub mod section;
pub mod symbol;
pub mod transform;

pub use config::Config;
pub use container::{Ctx, Width};
pub use engine::Engine;
pub use error::{ErrorLocation, RelaxError, Result};
pub use reloc::RelocKind;
