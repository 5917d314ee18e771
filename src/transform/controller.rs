//! Transform controller (spec.md §4.3, §4.4): drives one relaxation pass
//! over a section's relocations, picking templates and tracking whether
//! the fixed-point loop needs another round.

use crate::insn::{self, InsProperty};
use crate::prelude::Vec;
use crate::reloc::RelocKind;
use crate::transform::template::{Template, TEMPLATES};

/// Which direction of transform the controller is currently attempting
/// (spec.md §4.4): shrink first, then grow whatever no longer fits, then
/// settle.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Mode {
    Relax,
    Expand,
    /// The fixed point: neither direction produced a change last pass.
    None,
}

/// Per-section transform state: current mode plus whether anything
/// changed in the pass just completed.
#[derive(Debug, Clone, Copy)]
pub struct Controller {
    mode: Mode,
    changed: bool,
}

impl Controller {
    pub fn new(relax_enabled: bool, expand_enabled: bool) -> Controller {
        let mode = if relax_enabled {
            Mode::Relax
        } else if expand_enabled {
            Mode::Expand
        } else {
            Mode::None
        };
        Controller {
            mode,
            changed: false,
        }
    }

    pub fn mode(&self) -> Mode {
        self.mode
    }

    /// Looks up the instruction form this relocation owns, honouring
    /// `INSN16`/`INSN32` hints attached to the same offset: either hint
    /// forces a fixed encoding width and suppresses both relaxation and
    /// expansion for the instruction it's attached to (SPEC_FULL.md §10.7
    /// Open Question 2).
    pub fn get_ins_property(
        &self,
        insn_value: u64,
        owner_size: u32,
        mask: u64,
        forced_hint: Option<RelocKind>,
    ) -> Option<(&'static InsProperty, bool)> {
        if matches!(forced_hint, Some(RelocKind::Insn16) | Some(RelocKind::Insn32)) {
            #[cfg(feature = "log")]
            log::warn!(
                "INSN16/INSN32 hint at instruction {insn_value:#x} suppresses relax/expand for its owner"
            );
            let prop = insn::match_ins_property(insn_value, mask, owner_size);
            return prop.map(|p| (p, true));
        }
        insn::match_ins_property(insn_value, mask, owner_size).map(|p| (p, false))
    }

    /// Picks a candidate template for `reloc_kind` applied to `ins_prop`,
    /// filtered to the controller's current mode and to templates whose
    /// target relocation can actually hold `value` (spec.md §4.3). Returns
    /// `None` when nothing matches or the instruction carries a
    /// suppressing `INSN16`/`INSN32` hint.
    pub fn get_transform_template(
        &self,
        ins_prop: &'static InsProperty,
        reloc_kind: RelocKind,
        value: i64,
        suppressed: bool,
    ) -> Option<&'static Template> {
        if suppressed || self.mode == Mode::None {
            return None;
        }
        let found = TEMPLATES.iter().copied().find(|t| {
            t.kind == template_kind_for(self.mode)
                && core::ptr::eq(t.matches, ins_prop)
                && t.from_reloc == reloc_kind
                && t.fits(value)
        });
        #[cfg(feature = "log")]
        log::trace!(
            "template lookup: {} reloc {reloc_kind:?} value {value:#x} -> {}",
            ins_prop.name,
            found.map(|t| t.matches.name).unwrap_or("none")
        );
        found
    }

    /// Applies a chosen template's register carry-over: the matched
    /// instruction's target/source registers flow into the first emitted
    /// instruction that requests them (spec.md §4.3). Narrow (3-bit)
    /// fields are converted through [`insn::convert_narrow_reg`]/
    /// [`insn::narrow_reg_encoding`] as needed by the emitted form's field
    /// width.
    pub fn carry_registers(template: &Template, matched_insn: u64) -> Vec<u64> {
        let mut out = Vec::with_capacity(template.insns.len());
        for emitted in template.insns {
            let mut value = emitted.prop.opcode;
            if emitted.insert_t {
                if let (Some(src_t), Some(dst_t)) = (find_t_source(template), emitted.prop.t_reg) {
                    let raw = src_t.extract(matched_insn);
                    if let Some(converted) = convert_reg_width(raw, src_t.size, dst_t.size) {
                        value = dst_t.insert(value, converted);
                    }
                }
            }
            if emitted.insert_s {
                if let (Some(src_s), Some(dst_s)) = (find_s_source(template), emitted.prop.s_reg) {
                    let raw = src_s.extract(matched_insn);
                    if let Some(converted) = convert_reg_width(raw, src_s.size, dst_s.size) {
                        value = dst_s.insert(value, converted);
                    }
                }
            }
            out.push(value);
        }
        out
    }

    /// `true` once a pass has completed without recording any change — the
    /// driver stops iterating and moves `Relax` on to `Expand`, or `Expand`
    /// to rest.
    pub fn should_run_again(&self) -> bool {
        self.changed
    }

    pub fn set_changed(&mut self) {
        self.changed = true;
    }

    /// Advances the state machine after a pass that made no changes:
    /// `Relax` falls through to `Expand` (if enabled), `Expand` settles at
    /// `None`. Resets the changed flag for the next pass either way.
    pub fn change_state(&mut self, expand_enabled: bool) {
        let from = self.mode;
        self.mode = match self.mode {
            Mode::Relax if expand_enabled => Mode::Expand,
            Mode::Relax | Mode::Expand | Mode::None => Mode::None,
        };
        #[cfg(feature = "log")]
        if from != self.mode {
            log::debug!("controller mode {from:?} -> {:?}", self.mode);
        }
        self.changed = false;
    }
}

fn template_kind_for(mode: Mode) -> crate::transform::TemplateKind {
    match mode {
        Mode::Relax => crate::transform::TemplateKind::Relax,
        Mode::Expand => crate::transform::TemplateKind::Expand,
        Mode::None => crate::transform::TemplateKind::Relax,
    }
}

fn find_t_source(template: &Template) -> Option<crate::insn::RegField> {
    template.matches.t_reg
}

fn find_s_source(template: &Template) -> Option<crate::insn::RegField> {
    template.matches.s_reg
}

/// Converts a register number between field widths, going through the
/// narrow/full mapping when either side is a 3-bit field. Widening or
/// narrowing between two non-3-bit fields is a plain passthrough.
fn convert_reg_width(raw: u32, from_size: u32, to_size: u32) -> Option<u32> {
    match (from_size, to_size) {
        (3, 3) => Some(raw),
        (3, _) => insn::convert_narrow_reg(raw),
        (_, 3) => insn::narrow_reg_encoding(raw),
        _ => Some(raw),
    }
}

/// `nop32`/`nop16` literal encodings used by [`split_nop`] (SPEC_FULL.md
/// §10.6): a 4-byte `ALIGN`/`MAX` padding run over-shoots by exactly 2
/// bytes on one 16-bit boundary, and the section rewriter replaces the
/// last 32-bit nop with two 16-bit ones rather than leave a gap.
pub const NOP32: u32 = 0x8000_c000;
pub const NOP16: u16 = 0x9008;

/// Splits one 32-bit nop into two 16-bit nops, for `ALIGN`/`FILL`/`MAX`
/// padding that needs to shed exactly 2 bytes without leaving a hole
/// (SPEC_FULL.md §10.6).
pub fn split_nop32_to_nop16() -> [u16; 2] {
    [NOP16, NOP16]
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::insn::{BALC, BC16};

    #[test]
    fn new_picks_relax_first_when_both_enabled() {
        let c = Controller::new(true, true);
        assert_eq!(c.mode(), Mode::Relax);
    }

    #[test]
    fn new_falls_back_to_expand_when_relax_disabled() {
        let c = Controller::new(false, true);
        assert_eq!(c.mode(), Mode::Expand);
    }

    #[test]
    fn change_state_advances_relax_to_expand() {
        let mut c = Controller::new(true, true);
        c.change_state(true);
        assert_eq!(c.mode(), Mode::Expand);
        assert!(!c.should_run_again());
    }

    #[test]
    fn change_state_settles_expand_to_none() {
        let mut c = Controller::new(false, true);
        c.change_state(true);
        assert_eq!(c.mode(), Mode::None);
    }

    #[test]
    fn insn16_hint_suppresses_template_selection() {
        let c = Controller::new(true, false);
        let (prop, suppressed) = c
            .get_ins_property(BALC.opcode, 4, 0xfe00_0000, Some(RelocKind::Insn32))
            .unwrap();
        assert_eq!(prop, &BALC);
        assert!(suppressed);
        assert!(c
            .get_transform_template(prop, RelocKind::Pc25S1, 0x10, suppressed)
            .is_none());
    }

    #[test]
    fn picks_balc_to_bc16_relax_template_when_value_fits() {
        let c = Controller::new(true, false);
        let template = c
            .get_transform_template(&BALC, RelocKind::Pc25S1, 0x400, false)
            .expect("value fits PC10_S1");
        assert_eq!(template.matches, &BALC);
        assert!(core::ptr::eq(template.insns[0].prop, &BC16));
    }

    #[test]
    fn rejects_template_when_value_does_not_fit_target_width() {
        let c = Controller::new(true, false);
        // PC10_S1 carries 11 signed bits post-shift; this overflows it.
        assert!(c
            .get_transform_template(&BALC, RelocKind::Pc25S1, 0x10_0000, false)
            .is_none());
    }

    #[test]
    fn carries_target_register_through_lw_to_lw_gp() {
        use crate::insn::LW;
        let matched = LW.t_reg.unwrap().insert(LW.opcode, 17);
        let template = crate::transform::template::TEMPLATE_LO12_TO_GPREL19;
        let emitted = Controller::carry_registers(&template, matched);
        let lw_gp = &crate::insn::LW_GP;
        assert_eq!(lw_gp.t_reg.unwrap().extract(emitted[0]), 17);
    }
}
