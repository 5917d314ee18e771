//! Relocation property table (spec.md §3, §4.3).
//!
//! In the original this table is emitted offline by a TableGen backend from
//! a declarative `.td` description (out of scope here, spec.md §1). This
//! module carries the same *shape* — name, owning instruction size,
//! immediate bit width, opcode mask — as a flat immutable table, per the
//! Design Notes' "represent as a flat immutable vector" guidance, rather
//! than a generated match statement the way the original backend would
//! produce one.

use super::RelocKind;

/// Per-relocation-kind metadata (spec.md §3).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RelocProperty {
    pub name: &'static str,
    /// Owning instruction size in bytes: 2, 4 or 6. 0 for relocations with
    /// no owning instruction (composite legs and hints).
    pub insn_size: u32,
    /// Number of significant bits in the relocated immediate.
    pub bits: u32,
    /// 64-bit mask isolating the opcode bits of the owning instruction
    /// form, i.e. everything outside the immediate field.
    pub mask: u64,
}

macro_rules! prop {
    ($name:literal, $size:expr, $bits:expr, $mask:expr) => {
        RelocProperty {
            name: $name,
            insn_size: $size,
            bits: $bits,
            mask: $mask,
        }
    };
}

static TABLE: &[(RelocKind, RelocProperty)] = &[
    (RelocKind::None, prop!("NONE", 0, 0, 0)),
    (RelocKind::Abs32, prop!("32", 6, 32, 0)),
    (RelocKind::I32, prop!("I32", 6, 32, 0)),
    (RelocKind::Hi20, prop!("HI20", 4, 32, 0xffe0_0002)),
    (RelocKind::Lo12, prop!("LO12", 4, 12, 0xffff_f000)),
    (RelocKind::Lo4S2, prop!("LO4_S2", 2, 6, 0xfff0)),
    (RelocKind::Signed8, prop!("SIGNED_8", 2, 8, 0xff00)),
    (RelocKind::Signed16, prop!("SIGNED_16", 2, 16, 0)),
    (RelocKind::Unsigned8, prop!("UNSIGNED_8", 2, 8, 0xff00)),
    (RelocKind::Unsigned16, prop!("UNSIGNED_16", 2, 16, 0)),
    (RelocKind::Pc4S1, prop!("PC4_S1", 2, 5, 0xfff0)),
    (RelocKind::Pc7S1, prop!("PC7_S1", 2, 8, 0xff80)),
    (RelocKind::Pc10S1, prop!("PC10_S1", 2, 11, 0xfc00)),
    (RelocKind::Pc11S1, prop!("PC11_S1", 4, 12, 0xffff_f800)),
    (RelocKind::Pc14S1, prop!("PC14_S1", 4, 15, 0xffff_c000)),
    (RelocKind::Pc21S1, prop!("PC21_S1", 4, 22, 0xffe0_0000)),
    (RelocKind::Pc25S1, prop!("PC25_S1", 4, 26, 0xfe00_0000)),
    (RelocKind::PcI32, prop!("PC_I32", 6, 32, 0)),
    (RelocKind::Pc32, prop!("PC32", 6, 32, 0)),
    (RelocKind::Gprel7S2, prop!("GPREL7_S2", 2, 9, 0xff80)),
    (RelocKind::Gprel17S1, prop!("GPREL17_S1", 4, 18, 0xfff8_0001)),
    (RelocKind::Gprel18, prop!("GPREL18", 4, 18, 0xfffc_0000)),
    (RelocKind::Gprel19S2, prop!("GPREL19_S2", 4, 21, 0xffe0_0003)),
    (RelocKind::GprelHi20, prop!("GPREL_HI20", 4, 32, 0xffe0_0002)),
    (RelocKind::GprelLo12, prop!("GPREL_LO12", 4, 12, 0xffff_f000)),
    (RelocKind::GprelI32, prop!("GPREL_I32", 6, 32, 0)),
    (RelocKind::PcHi20, prop!("PC_HI20", 4, 32, 0xffe0_0002)),
    (RelocKind::Neg, prop!("NEG", 0, 0, 0)),
    (RelocKind::AshiftR1, prop!("ASHIFTR_1", 0, 0, 0)),
    (RelocKind::Fixed, prop!("FIXED", 0, 0, 0)),
    (RelocKind::Align, prop!("ALIGN", 0, 0, 0)),
    (RelocKind::Insn16, prop!("INSN16", 0, 0, 0)),
    (RelocKind::Insn32, prop!("INSN32", 0, 0, 0)),
    (RelocKind::Fill, prop!("FILL", 0, 0, 0)),
    (RelocKind::Max, prop!("MAX", 0, 0, 0)),
    (RelocKind::SaveRestore, prop!("SAVERESTORE", 0, 0, 0)),
    (RelocKind::NegComposite, prop!("NEG_COMPOSITE", 0, 0, 0)),
];

/// Looks up a relocation kind's static property entry.
///
/// # Panics
/// Never — every [`RelocKind`] variant has a table entry; a missing entry
/// would be a bug in this table, not a runtime condition a caller reacts
/// to.
pub fn get_reloc_property(kind: RelocKind) -> RelocProperty {
    TABLE
        .iter()
        .find(|(k, _)| *k == kind)
        .map(|(_, p)| *p)
        .expect("every RelocKind variant must have a RelocProperty table entry")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn every_kind_has_an_entry() {
        assert_eq!(get_reloc_property(RelocKind::Pc25S1).insn_size, 4);
        assert_eq!(get_reloc_property(RelocKind::Pc25S1).bits, 26);
        assert_eq!(get_reloc_property(RelocKind::Lo12).insn_size, 4);
        assert_eq!(get_reloc_property(RelocKind::PcI32).insn_size, 6);
    }

    #[test]
    fn hints_carry_no_owning_instruction() {
        for kind in [RelocKind::Align, RelocKind::Fixed, RelocKind::Insn16, RelocKind::Insn32] {
            assert_eq!(get_reloc_property(kind).insn_size, 0);
        }
    }
}
