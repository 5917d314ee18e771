//! Link-wide width and endianness context.
//!
//! Grounded in `goblin`'s `container::Ctx` (referenced throughout
//! `elf::reloc` and `elf::writer` as `Ctx { container, le }`): a small
//! `Copy` struct threaded through every read/write instead of picked up
//! from thread-local or global state, so the same engine can serve 32- or
//! 64-bit, little- or big-endian links side by side (spec.md §9,
//! "Static polymorphism over endianness and word size").

use scroll::Endian;

/// ELF word size, as carried by the link driver's `wordsize` option
/// (spec.md §6).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Width {
    W32,
    W64,
}

impl Width {
    pub fn from_bytes(wordsize: u8) -> Self {
        match wordsize {
            4 => Width::W32,
            8 => Width::W64,
            other => panic!("unsupported wordsize: {other} (nanoMIPS links are 4 or 8 bytes)"),
        }
    }

    pub fn bits(self) -> u32 {
        match self {
            Width::W32 => 32,
            Width::W64 => 64,
        }
    }
}

/// Endianness and word-size context for one link.
///
/// `scroll::Endian` already distinguishes little/big; `Ctx` bundles it with
/// the word width the same way `goblin::container::Ctx` bundles
/// `scroll::Endian` with `Container`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Ctx {
    pub width: Width,
    pub endian: Endian,
}

impl Ctx {
    pub fn new(width: Width, endian: Endian) -> Self {
        Ctx { width, endian }
    }

    pub fn is_little(self) -> bool {
        self.endian.is_little()
    }

    pub fn is_big(self) -> bool {
        !self.endian.is_little()
    }
}

impl Default for Ctx {
    fn default() -> Self {
        Ctx::new(Width::W32, Endian::Little)
    }
}
