//! Transform templates (spec.md §3): declarative replacement recipes
//! matched against one instruction form.
//!
//! Normally TableGen-generated (`TRANSFORM_TEMPLATE`/`INS_TEMPLATE` in
//! `NanoMipsTransformationPropertyEmitter.cpp`); this module carries the
//! same shape as a small static table instead, populated with the
//! instruction forms in `crate::insn`.

use crate::insn::InsProperty;
use crate::reloc::RelocKind;

/// Whether a template shrinks or grows its owning instruction(s).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TemplateKind {
    Relax,
    Expand,
}

/// One instruction to emit as part of a template's replacement sequence.
#[derive(Debug, Clone, Copy)]
pub struct EmittedInsn {
    pub prop: &'static InsProperty,
    /// Relocation kind the emitted instruction carries, if any (a deleted
    /// instruction emits zero of these).
    pub reloc: Option<RelocKind>,
    /// Re-insert the matched instruction's target register into this slot.
    pub insert_t: bool,
    /// Re-insert the matched instruction's source register into this slot.
    pub insert_s: bool,
}

/// A replacement recipe for one matched instruction (spec.md §3).
#[derive(Debug, Clone, Copy)]
pub struct Template {
    pub kind: TemplateKind,
    /// The instruction form this template replaces.
    pub matches: &'static InsProperty,
    /// The relocation kind whose value selected this template (a template
    /// is only a candidate for one relocation kind's evaluation, though
    /// the same `InsProperty` may be reachable from more than one kind).
    pub from_reloc: RelocKind,
    pub insns: &'static [EmittedInsn],
}

impl Template {
    /// Total size in bytes of this template's replacement sequence; 0 for
    /// a pure deletion (e.g. a `HI20`-bearing `lui` absorbed into a
    /// GP-relative load).
    pub fn target_size(&self) -> u32 {
        self.insns.iter().map(|i| i.prop.size).sum()
    }

    /// The new primary relocation kind the section rewriter records for
    /// this transformed relocation (spec.md §4.4): the first emitted
    /// instruction's relocation kind, or `NONE` for a pure deletion.
    pub fn primary_new_kind(&self) -> RelocKind {
        self.insns
            .iter()
            .find_map(|i| i.reloc)
            .unwrap_or(RelocKind::None)
    }

    /// Whether `value` fits the bit field of this template's primary new
    /// relocation kind. A pure deletion (no emitted relocation) always
    /// fits — there is no encoding to range-check.
    pub fn fits(&self, value: i64) -> bool {
        let kind = self.primary_new_kind();
        if kind == RelocKind::None {
            return true;
        }
        if matches!(kind, RelocKind::Lo12 | RelocKind::GprelLo12) {
            // relocate() never range-checks these; they always "fit".
            return true;
        }
        let prop = crate::reloc::property::get_reloc_property(kind);
        let shifted = value >> kind.alignment_shift();
        if kind.is_unsigned() {
            shifted >= 0 && (prop.bits >= 64 || (shifted as u64) < (1u64 << prop.bits))
        } else {
            let lo = -(1i64 << (prop.bits - 1));
            let hi = (1i64 << (prop.bits - 1)) - 1;
            shifted >= lo && shifted <= hi
        }
    }
}

macro_rules! emit {
    ($prop:expr) => {
        EmittedInsn {
            prop: &$prop,
            reloc: None,
            insert_t: false,
            insert_s: false,
        }
    };
    ($prop:expr, $reloc:expr) => {
        EmittedInsn {
            prop: &$prop,
            reloc: Some($reloc),
            insert_t: true,
            insert_s: true,
        }
    };
}

static BALC_TO_BC16: &[EmittedInsn] = &[emit!(crate::insn::BC16, RelocKind::Pc10S1)];
/// Relax: a 32-bit `balc`/`bc` whose target fits `PC10_S1` collapses to the
/// 16-bit `bc16` (spec.md §8 scenario 1).
pub static TEMPLATE_PC25_TO_PC10: Template = Template {
    kind: TemplateKind::Relax,
    matches: &crate::insn::BC,
    from_reloc: RelocKind::Pc25S1,
    insns: BALC_TO_BC16,
};
pub static TEMPLATE_BALC_TO_PC10: Template = Template {
    kind: TemplateKind::Relax,
    matches: &crate::insn::BALC,
    from_reloc: RelocKind::Pc25S1,
    insns: BALC_TO_BC16,
};

static LUI_DELETED: &[EmittedInsn] = &[];
/// Relax: the `lui` half of a `HI20`/`LO12` small-data pair is dropped
/// entirely once the pair collapses to a single GP-relative load (spec.md
/// §8 scenario 2). The companion `LO12` template below carries the
/// surviving instruction.
pub static TEMPLATE_HI20_DELETE: Template = Template {
    kind: TemplateKind::Relax,
    matches: &crate::insn::LUI,
    from_reloc: RelocKind::Hi20,
    insns: LUI_DELETED,
};

static LW_TO_LW_GP: &[EmittedInsn] = &[emit!(crate::insn::LW_GP, RelocKind::Gprel19S2)];
/// Relax: `lw` addressed through a `HI20`/`LO12` pair collapses to
/// `lw[gp]` with `GPREL19_S2` once the symbol is within GP range (spec.md
/// §8 scenario 2).
pub static TEMPLATE_LO12_TO_GPREL19: Template = Template {
    kind: TemplateKind::Relax,
    matches: &crate::insn::LW,
    from_reloc: RelocKind::Lo12,
    insns: LW_TO_LW_GP,
};

static LO12_EXPAND: &[EmittedInsn] = &[
    emit!(crate::insn::LUI, RelocKind::Hi20),
    emit!(crate::insn::LW, RelocKind::Lo12),
];
/// Expand: a `LO12` field that can't reach its symbol directly grows into
/// a `HI20`/`LO12` pair (spec.md §8 scenario 3).
pub static TEMPLATE_LO12_EXPAND: Template = Template {
    kind: TemplateKind::Expand,
    matches: &crate::insn::LW_GP,
    from_reloc: RelocKind::Lo12,
    insns: LO12_EXPAND,
};

/// All templates, grouped by which relocation kind can select them.
pub static TEMPLATES: &[&Template] = &[
    &TEMPLATE_PC25_TO_PC10,
    &TEMPLATE_BALC_TO_PC10,
    &TEMPLATE_HI20_DELETE,
    &TEMPLATE_LO12_TO_GPREL19,
    &TEMPLATE_LO12_EXPAND,
];
