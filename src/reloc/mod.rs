//! nanoMIPS relocation kinds and classification.
//!
//! Parsing the host object file's raw `r_type` numbers into [`RelocKind`] is
//! the host's job (spec.md §1 treats ELF object parsing as an external
//! collaborator); this module defines the kind taxonomy the rest of the
//! engine operates on and a stable raw encoding a host can translate its own
//! `r_type` values into, the same way `goblin::elf::relocation_constants`
//! defines one `pub const R_<ARCH>_<NAME>: u32` per architecture relocation
//! rather than hard-coding numbers inline at every use site.

pub mod apply;
pub mod property;

/// One nanoMIPS relocation kind (spec.md §6), plus the engine-internal
/// `NEG_COMPOSITE` meta-kind synthesized by [`rel_expr`](apply::rel_expr)
/// when a `NEG` relocation opens a composite group.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[non_exhaustive]
pub enum RelocKind {
    None,
    /// `R_NANOMIPS_32`
    Abs32,
    I32,
    Hi20,
    Lo12,
    Lo4S2,
    Signed8,
    Signed16,
    Unsigned8,
    Unsigned16,
    Pc4S1,
    Pc7S1,
    Pc10S1,
    Pc11S1,
    Pc14S1,
    Pc21S1,
    Pc25S1,
    PcI32,
    Pc32,
    Gprel7S2,
    Gprel17S1,
    Gprel18,
    Gprel19S2,
    GprelHi20,
    GprelLo12,
    GprelI32,
    PcHi20,
    Neg,
    AshiftR1,
    Fixed,
    Align,
    Insn16,
    Insn32,
    Fill,
    Max,
    SaveRestore,
    /// Synthesized by [`apply::rel_expr`] for the first relocation of a
    /// `NEG` composite group; never appears in a host's input relocation
    /// list.
    NegComposite,
}

/// Stable raw wire encoding for [`RelocKind`]. Deliberately *not* the public
/// nanoMIPS psABI relocation numbers — object-file parsing sits outside
/// this crate (spec.md §1), so a host translates its own `r_type` values
/// to/from these through [`RelocKind::from_raw`]/[`RelocKind::to_raw`].
pub mod raw {
    pub const NONE: u32 = 0;
    pub const ABS32: u32 = 1;
    pub const I32: u32 = 2;
    pub const HI20: u32 = 3;
    pub const LO12: u32 = 4;
    pub const LO4_S2: u32 = 5;
    pub const SIGNED_8: u32 = 6;
    pub const SIGNED_16: u32 = 7;
    pub const UNSIGNED_8: u32 = 8;
    pub const UNSIGNED_16: u32 = 9;
    pub const PC4_S1: u32 = 10;
    pub const PC7_S1: u32 = 11;
    pub const PC10_S1: u32 = 12;
    pub const PC11_S1: u32 = 13;
    pub const PC14_S1: u32 = 14;
    pub const PC21_S1: u32 = 15;
    pub const PC25_S1: u32 = 16;
    pub const PC_I32: u32 = 17;
    pub const PC32: u32 = 18;
    pub const GPREL7_S2: u32 = 19;
    pub const GPREL17_S1: u32 = 20;
    pub const GPREL18: u32 = 21;
    pub const GPREL19_S2: u32 = 22;
    pub const GPREL_HI20: u32 = 23;
    pub const GPREL_LO12: u32 = 24;
    pub const GPREL_I32: u32 = 25;
    pub const PC_HI20: u32 = 26;
    pub const NEG: u32 = 27;
    pub const ASHIFTR_1: u32 = 28;
    pub const FIXED: u32 = 29;
    pub const ALIGN: u32 = 30;
    pub const INSN16: u32 = 31;
    pub const INSN32: u32 = 32;
    pub const FILL: u32 = 33;
    pub const MAX: u32 = 34;
    pub const SAVERESTORE: u32 = 35;
}

impl RelocKind {
    pub fn from_raw(raw: u32) -> Option<RelocKind> {
        use raw::*;
        Some(match raw {
            NONE => RelocKind::None,
            ABS32 => RelocKind::Abs32,
            I32 => RelocKind::I32,
            HI20 => RelocKind::Hi20,
            LO12 => RelocKind::Lo12,
            LO4_S2 => RelocKind::Lo4S2,
            SIGNED_8 => RelocKind::Signed8,
            SIGNED_16 => RelocKind::Signed16,
            UNSIGNED_8 => RelocKind::Unsigned8,
            UNSIGNED_16 => RelocKind::Unsigned16,
            PC4_S1 => RelocKind::Pc4S1,
            PC7_S1 => RelocKind::Pc7S1,
            PC10_S1 => RelocKind::Pc10S1,
            PC11_S1 => RelocKind::Pc11S1,
            PC14_S1 => RelocKind::Pc14S1,
            PC21_S1 => RelocKind::Pc21S1,
            PC25_S1 => RelocKind::Pc25S1,
            PC_I32 => RelocKind::PcI32,
            PC32 => RelocKind::Pc32,
            GPREL7_S2 => RelocKind::Gprel7S2,
            GPREL17_S1 => RelocKind::Gprel17S1,
            GPREL18 => RelocKind::Gprel18,
            GPREL19_S2 => RelocKind::Gprel19S2,
            GPREL_HI20 => RelocKind::GprelHi20,
            GPREL_LO12 => RelocKind::GprelLo12,
            GPREL_I32 => RelocKind::GprelI32,
            PC_HI20 => RelocKind::PcHi20,
            NEG => RelocKind::Neg,
            ASHIFTR_1 => RelocKind::AshiftR1,
            FIXED => RelocKind::Fixed,
            ALIGN => RelocKind::Align,
            INSN16 => RelocKind::Insn16,
            INSN32 => RelocKind::Insn32,
            FILL => RelocKind::Fill,
            MAX => RelocKind::Max,
            SAVERESTORE => RelocKind::SaveRestore,
            _ => return None,
        })
    }

    /// Inverse of [`RelocKind::from_raw`]. Panics for [`RelocKind::NegComposite`],
    /// which has no wire representation — it never leaves the engine.
    pub fn to_raw(self) -> u32 {
        use raw::*;
        match self {
            RelocKind::None => NONE,
            RelocKind::Abs32 => ABS32,
            RelocKind::I32 => I32,
            RelocKind::Hi20 => HI20,
            RelocKind::Lo12 => LO12,
            RelocKind::Lo4S2 => LO4_S2,
            RelocKind::Signed8 => SIGNED_8,
            RelocKind::Signed16 => SIGNED_16,
            RelocKind::Unsigned8 => UNSIGNED_8,
            RelocKind::Unsigned16 => UNSIGNED_16,
            RelocKind::Pc4S1 => PC4_S1,
            RelocKind::Pc7S1 => PC7_S1,
            RelocKind::Pc10S1 => PC10_S1,
            RelocKind::Pc11S1 => PC11_S1,
            RelocKind::Pc14S1 => PC14_S1,
            RelocKind::Pc21S1 => PC21_S1,
            RelocKind::Pc25S1 => PC25_S1,
            RelocKind::PcI32 => PC_I32,
            RelocKind::Pc32 => PC32,
            RelocKind::Gprel7S2 => GPREL7_S2,
            RelocKind::Gprel17S1 => GPREL17_S1,
            RelocKind::Gprel18 => GPREL18,
            RelocKind::Gprel19S2 => GPREL19_S2,
            RelocKind::GprelHi20 => GPREL_HI20,
            RelocKind::GprelLo12 => GPREL_LO12,
            RelocKind::GprelI32 => GPREL_I32,
            RelocKind::PcHi20 => PC_HI20,
            RelocKind::Neg => NEG,
            RelocKind::AshiftR1 => ASHIFTR_1,
            RelocKind::Fixed => FIXED,
            RelocKind::Align => ALIGN,
            RelocKind::Insn16 => INSN16,
            RelocKind::Insn32 => INSN32,
            RelocKind::Fill => FILL,
            RelocKind::Max => MAX,
            RelocKind::SaveRestore => SAVERESTORE,
            RelocKind::NegComposite => unreachable!("NEG_COMPOSITE is engine-internal and has no wire encoding"),
        }
    }

    /// Owning instruction size in bytes, per the relocation property table
    /// (spec.md §3). Delegates to [`property::get_reloc_property`].
    pub fn owner_size(self) -> u32 {
        property::get_reloc_property(self).insn_size
    }

    /// `true` for the `SIGNED_8`/`SIGNED_16` kinds specifically, used by the
    /// composite `NEG` resolver's sign-extension rule (spec.md §4.2).
    pub fn is_signed_8_or_16(self) -> bool {
        matches!(self, RelocKind::Signed8 | RelocKind::Signed16)
    }

    /// `true` when the relocation's bit-width check in [`apply::apply`] is
    /// unsigned (spec.md §4.2's "one kind (`PC4_S1`) is treated as unsigned
    /// despite its name" plus the GP-relative and unsigned families).
    pub fn is_unsigned(self) -> bool {
        matches!(
            self,
            RelocKind::Pc4S1
                | RelocKind::Unsigned8
                | RelocKind::Unsigned16
                | RelocKind::Gprel7S2
                | RelocKind::Gprel17S1
                | RelocKind::Gprel18
                | RelocKind::Gprel19S2
                | RelocKind::Lo4S2
        )
    }

    /// `true` for the `S{N}`-alignment family (kinds whose name encodes a
    /// shift, e.g. `PC25_S1`, `GPREL19_S2`) that require their resolved
    /// value's low bits to be zero before shifting down.
    pub fn alignment_shift(self) -> u32 {
        match self {
            RelocKind::Pc4S1
            | RelocKind::Pc7S1
            | RelocKind::Pc10S1
            | RelocKind::Pc11S1
            | RelocKind::Pc14S1
            | RelocKind::Pc21S1
            | RelocKind::Pc25S1
            | RelocKind::Gprel7S2
            | RelocKind::Gprel17S1
            | RelocKind::Gprel19S2
            | RelocKind::Lo4S2 => 1,
            _ => 0,
        }
    }
}

/// Abstract classification of a relocation kind (spec.md §4.2).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RelExpr {
    PcRel,
    Abs,
    GpRel,
    PagePc,
    /// The relocation opens (or continues) a `NEG`/`ASHIFTR_1` composite
    /// group; resolved by [`apply::resolve_neg_composite`].
    NegComposite,
    /// A relax/expand hint (`FIXED`, `ALIGN`, `INSN16`, `INSN32`, `FILL`,
    /// `MAX`, `SAVERESTORE`) carrying no addend of its own.
    RelaxHint,
    None,
}

pub use apply::rel_expr;
