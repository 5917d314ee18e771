//! The nanoMIPS instruction codec (spec.md §4.1).
//!
//! nanoMIPS decodes variable-length instructions (2, 4 or 6 bytes) by
//! reading the opcode half-word first. The ISA therefore mandates that on
//! little-endian targets, the two 16-bit halves of a 32-bit instruction are
//! stored swapped in memory so the opcode still comes first; this module
//! hides that entirely from callers, the same role `readShuffle32`/
//! `writeShuffle32` play in the original `NanoMips.cpp`.
//!
//! Reads and writes go through `scroll`'s `Pread`/`Pwrite`, matching the
//! pattern `goblin::elf::reloc` uses for every endian-sensitive access,
//! rather than hand-rolled byte shifting.

use scroll::{Endian, Pread, Pwrite};

use crate::container::Ctx;

/// Size, in bytes, of a nanoMIPS instruction. `0` is reserved for the
/// `NONE` relocation kind and never reaches the codec.
pub type InsnSize = u32;

/// `Codec::read_insn`'s offset convention for 48-bit (6-byte) instructions
/// (spec.md §9 open question, resolved in `SPEC_FULL.md` §10.7):
/// a 6-byte relocation's offset points at the start of the 32-bit immediate
/// tail, not at the instruction's opcode half. The opcode half therefore
/// lives `OPCODE_BACKOFF_6BYTE` bytes *before* the relocation offset, and
/// callers computing an instruction's start offset must subtract it for
/// 6-byte owners (see `Reloc::insn_offset` in `crate::reloc`).
pub const OPCODE_BACKOFF_6BYTE: u64 = 2;

/// Reads a nanoMIPS instruction of `size` bytes from `data` at `offset`,
/// under link context `ctx` (only `ctx.endian` matters here).
///
/// - `size == 2` or `size == 6`: a 16-bit big-endian read. For a 6-byte
///   instruction this reads the *opcode* half only — callers wanting the
///   32-bit immediate tail use [`read_imm48`].
/// - `size == 4`: a 32-bit read, with the two 16-bit halves swapped back
///   into opcode-first order when the link is little-endian.
///
/// # Panics
/// Panics if `size` is not one of `{2, 4, 6}` — any other size is a program
/// invariant violation (spec.md §7), not a recoverable error.
pub fn read_insn(data: &[u8], offset: u64, size: InsnSize, ctx: Ctx) -> u64 {
    let offset = offset as usize;
    match size {
        2 | 6 => data
            .pread_with::<u16>(offset, Endian::Big)
            .expect("instruction read out of bounds") as u64,
        4 => read_shuffle32(data, offset, ctx.endian) as u64,
        other => unreachable!("unknown byte size of nanoMIPS instruction: {other} (only 2, 4 and 6 known)"),
    }
}

/// Inverse of [`read_insn`]: writes `value` as a nanoMIPS instruction of
/// `size` bytes into `buffer` at `offset`.
///
/// # Panics
/// Same invariant as [`read_insn`].
pub fn write_insn(value: u64, buffer: &mut [u8], offset: u64, size: InsnSize, ctx: Ctx) {
    let offset = offset as usize;
    match size {
        2 | 6 => buffer
            .pwrite_with(value as u16, offset, Endian::Big)
            .expect("instruction write out of bounds"),
        4 => write_shuffle32(buffer, offset, value as u32, ctx.endian),
        other => unreachable!("unknown byte size of nanoMIPS instruction: {other} (only 2, 4 and 6 known)"),
    };
}

/// Writes the 32-bit immediate tail of a 48-bit instruction.
///
/// Different from the 32-bit instruction form: the tail stores
/// low-half-first in memory order, so the swap applies on the *opposite*
/// endianness (big-endian swaps, little-endian doesn't), per spec.md §4.1.
/// `ctx.endian` is inverted internally to express that opposite polarity.
pub fn write_imm48(buffer: &mut [u8], offset: u64, value: u64, ctx: Ctx) {
    write_shuffle32(buffer, offset as usize, value as u32, invert(ctx.endian));
}

/// Reads the 32-bit immediate tail of a 48-bit instruction; inverse of
/// [`write_imm48`].
pub fn read_imm48(data: &[u8], offset: u64, ctx: Ctx) -> u64 {
    read_shuffle32(data, offset as usize, invert(ctx.endian)) as u64
}

fn invert(endian: Endian) -> Endian {
    if endian.is_little() {
        Endian::Big
    } else {
        Endian::Little
    }
}

/// `expr & ~0xFFF` — the base-page address of a PC-relative expression
/// (spec.md §4.1, used by `PC_HI20`/PAGE-PC relocations).
pub fn page_mask(expr: u64) -> u64 {
    expr & !0xFFFu64
}

/// Reads a 32-bit big-endian value and swaps its two 16-bit halves when
/// `swap_on` is little-endian, so the opcode half-word always comes back
/// in the low-addressed position regardless of how the link stores it.
fn read_shuffle32(data: &[u8], offset: usize, swap_on: Endian) -> u32 {
    let v: u32 = data.pread_with(offset, Endian::Big).expect("instruction read out of bounds");
    if swap_on.is_little() {
        (v << 16) | (v >> 16)
    } else {
        v
    }
}

/// Inverse of [`read_shuffle32`].
fn write_shuffle32(buffer: &mut [u8], offset: usize, value: u32, swap_on: Endian) {
    let value = if swap_on.is_little() {
        (value << 16) | (value >> 16)
    } else {
        value
    };
    buffer
        .pwrite_with(value, offset, Endian::Big)
        .expect("instruction write out of bounds");
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::container::Width;

    fn le() -> Ctx {
        Ctx::new(Width::W32, Endian::Little)
    }

    fn be() -> Ctx {
        Ctx::new(Width::W32, Endian::Big)
    }

    #[test]
    fn page_mask_clears_low_bits() {
        assert_eq!(page_mask(0x1234_5678), 0x1234_5000);
        assert_eq!(page_mask(0xfff), 0);
        assert_eq!(page_mask(0x1000), 0x1000);
    }

    #[test]
    fn round_trip_2byte() {
        let mut buf = [0u8; 4];
        write_insn(0x9008, &mut buf, 1, 2, le());
        assert_eq!(read_insn(&buf, 1, 2, le()), 0x9008);
    }

    #[test]
    fn round_trip_4byte_little_endian_swap() {
        let mut buf = [0u8; 8];
        write_insn(0x8000_c000, &mut buf, 2, 4, le());
        assert_eq!(read_insn(&buf, 2, 4, le()), 0x8000_c000);
        // opcode half (0x8000) must land in the low-addressed 16 bits.
        assert_eq!(&buf[2..4], &[0x80, 0x00]);
    }

    #[test]
    fn round_trip_4byte_big_endian_no_swap() {
        let mut buf = [0u8; 8];
        write_insn(0x8000_c000, &mut buf, 2, 4, be());
        assert_eq!(read_insn(&buf, 2, 4, be()), 0x8000_c000);
        assert_eq!(&buf[2..4], &[0x80, 0x00]);
        assert_eq!(&buf[4..6], &[0xc0, 0x00]);
    }

    #[test]
    fn imm48_round_trip() {
        let mut buf = [0u8; 8];
        write_imm48(&mut buf, 2, 0xdead_beef, le());
        assert_eq!(read_imm48(&buf, 2, le()), 0xdead_beef);
    }

    #[test]
    #[should_panic]
    fn malformed_size_panics() {
        let buf = [0u8; 8];
        read_insn(&buf, 0, 3, le());
    }
}
