//! Section Rewriter (spec.md §4.5): per input section, walks relocations
//! in offset order, queries the Transform Controller, stages writes,
//! freezes symbol anchors, and materialises a resized section buffer at
//! the end of a pass that changed anything.

use crate::codec;
use crate::container::Ctx;
use crate::prelude::{vec, Vec};
use crate::reloc::{rel_expr, RelExpr, RelocKind};
use crate::symbol::{SectionId, SymbolId, SymbolTable};
use crate::transform::template::Template;
use crate::transform::Controller;

use super::anchor::{sort_anchors, Anchor};
use super::aux::{RelaxAux, RelocInfo};

/// A relocation as the rewriter needs to see it. ELF parsing of the raw
/// `r_type`/`r_offset`/addend fields is the host's job (spec.md §1); this
/// is the normalised shape the engine operates on.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SectionReloc {
    pub offset: u64,
    pub kind: RelocKind,
    pub symbol: SymbolId,
    pub addend: i64,
}

/// One section under relaxation: its bytes, its relocation list, and the
/// auxiliary state carried across passes (spec.md §3 `RelaxAux`).
#[derive(Debug, Clone)]
pub struct TransformableSection {
    pub id: SectionId,
    pub addr: u64,
    pub data: Vec<u8>,
    pub relocations: Vec<SectionReloc>,
    pub aux: RelaxAux,
}

impl TransformableSection {
    pub fn new(id: SectionId, addr: u64, data: Vec<u8>, relocations: Vec<SectionReloc>) -> TransformableSection {
        TransformableSection {
            id,
            addr,
            data,
            relocations,
            aux: RelaxAux::new(),
        }
    }
}

/// Pre-pass setup (spec.md §4.5, pass 0 only): builds and sorts this
/// section's anchor list from every defined symbol whose storage lies in
/// it, and sorts the relocation list by offset.
pub fn setup(section: &mut TransformableSection, symbols: &SymbolTable) {
    section.relocations.sort_by_key(|r| r.offset);
    let mut anchors = Vec::new();
    for (id, sym) in symbols.defined_in(section.id) {
        anchors.push(Anchor::start(sym.value, id));
        if sym.size > 0 {
            anchors.push(Anchor::end(sym.value + sym.size, id));
        }
    }
    sort_anchors(&mut anchors);
    section.aux.anchors = anchors;
}

/// Outcome of one rewriter pass over a section.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PassOutcome {
    pub changed: bool,
    pub total_delta: i64,
}

/// Runs one pass over `section` in the controller's current mode
/// (spec.md §4.5 steps 1-6), staging writes and freezing anchors, then
/// materialises a resized buffer if anything changed.
pub fn run_pass(
    section: &mut TransformableSection,
    symbols: &mut SymbolTable,
    controller: &mut Controller,
    ctx: Ctx,
) -> PassOutcome {
    section.aux.reloc_info = vec![RelocInfo::unchanged(RelocKind::None); section.relocations.len()];
    section.aux.writes.clear();

    let mut total_delta: i64 = 0;
    let mut anchor_cursor = 0usize;
    let mut changed = false;

    for rel_idx in 0..section.relocations.len() {
        let reloc = section.relocations[rel_idx];

        if matches!(reloc.kind, RelocKind::Align) {
            handle_align(section, symbols, reloc, total_delta, ctx);
            continue;
        }

        // Every relocation's recorded offset shifts by whatever delta
        // preceded it in this pass, whether or not it is itself
        // transformed — a later relocation in an untransformed section
        // region still needs to track bytes dropped/gained earlier on.
        section.aux.reloc_info[rel_idx].cumulative_delta = total_delta;

        if matches!(reloc.kind, RelocKind::None) {
            continue;
        }
        if matches!(reloc.kind, RelocKind::Fill | RelocKind::Max) {
            continue;
        }
        if symbols.get(reloc.symbol).is_undef_weak {
            continue;
        }

        let owner_size = reloc.kind.owner_size();
        if owner_size == 0 {
            continue;
        }
        let insn_offset = reloc.offset - u64::from(owner_size == 6) * codec::OPCODE_BACKOFF_6BYTE;
        let insn_value = codec::read_insn(&section.data, insn_offset, owner_size, ctx);

        let ins_prop = match crate::insn::match_ins_property(insn_value, reloc_mask(reloc.kind), owner_size) {
            Some(p) => p,
            None => continue,
        };
        #[cfg(feature = "log")]
        log::trace!(
            "reloc #{rel_idx} offset {:#x} kind {:?} matched instruction {}",
            reloc.offset,
            reloc.kind,
            ins_prop.name
        );

        let current_addr = section.addr as i64 + reloc.offset as i64 - total_delta;
        let target = symbols.get(reloc.symbol).value as i64 + reloc.addend;
        let value = resolved_value(reloc.kind, target, current_addr);

        let forced_hint = section
            .relocations
            .iter()
            .find(|r| r.offset == insn_offset && matches!(r.kind, RelocKind::Insn16 | RelocKind::Insn32))
            .map(|r| r.kind);

        let (prop, suppressed) = match controller.get_ins_property(insn_value, owner_size, reloc_mask(reloc.kind), forced_hint) {
            Some(r) => r,
            None => continue,
        };
        debug_assert!(core::ptr::eq(prop, ins_prop));

        let template = match controller.get_transform_template(ins_prop, reloc.kind, value, suppressed) {
            Some(t) => t,
            None => continue,
        };

        let current_size = owner_size;
        let target_size = template.target_size();
        let delta = current_size as i64 - target_size as i64;

        // `delta == 0` still needs staging: a same-size substitution (e.g.
        // `lw` -> `lw[gp]`) changes the owning instruction's opcode and
        // relocation kind without changing the section's length. The
        // relocation's own offset shifts by the delta *preceding* it
        // (already recorded above), not by its own contribution, since an
        // instruction shrinking or growing in place doesn't move its own
        // start.
        freeze_anchors_up_to(section, symbols, &mut anchor_cursor, reloc.offset, total_delta);

        section.aux.reloc_info[rel_idx].new_kind = template.primary_new_kind();
        section.aux.reloc_info[rel_idx].touched = true;
        total_delta += delta;
        stage_template(section, template, insn_value);
        controller.set_changed();
        changed = true;
    }

    freeze_anchors_up_to(section, symbols, &mut anchor_cursor, u64::MAX, total_delta);

    if changed {
        finalize(section, total_delta, ctx);
    }

    PassOutcome { changed, total_delta }
}

/// Freezes every anchor whose offset is `<= upto` to stable coordinates
/// before `total_delta` advances further (spec.md §4.5 step 4), writing
/// the frozen position back into the anchor's backing symbol: a
/// start-anchor rebases `symbol.value` (and its own offset, so later
/// passes work off stable coordinates); an end-anchor rebases
/// `symbol.size` off whatever `symbol.value` already holds, which is
/// already this pass's frozen start position because anchors sort start
/// before end at equal offsets and a symbol's start offset never exceeds
/// its paired end offset.
fn freeze_anchors_up_to(
    section: &mut TransformableSection,
    symbols: &mut SymbolTable,
    cursor: &mut usize,
    upto: u64,
    total_delta: i64,
) {
    while *cursor < section.aux.anchors.len() && section.aux.anchors[*cursor].offset <= upto {
        let anchor = section.aux.anchors[*cursor];
        if anchor.is_end {
            let sym = symbols.get_mut(anchor.symbol);
            sym.size = (anchor.offset as i64 - total_delta + sym.value as i64) as u64;
        } else {
            let new_value = (anchor.offset as i64 - total_delta) as u64;
            symbols.get_mut(anchor.symbol).value = new_value;
            section.aux.anchors[*cursor].offset = new_value;
        }
        *cursor += 1;
    }
}

fn stage_template(section: &mut TransformableSection, template: &Template, matched_insn: u64) {
    let emitted = Controller::carry_registers(template, matched_insn);
    if emitted.is_empty() {
        // A pure deletion still needs one group-closing entry so the
        // finalize loop's continuation-flag chain has something to stop
        // at for this relocation.
        section.aux.push_write(0, 0, false);
        return;
    }
    let last = emitted.len() - 1;
    for (i, (insn, emitted_insn)) in emitted.iter().zip(template.insns.iter()).enumerate() {
        section
            .aux
            .push_write(*insn, emitted_insn.prop.size, i != last);
    }
}

/// Classifies a relocation's abstract expression and computes the value
/// the template-fitting logic checks against. PC-relative forms use
/// `target - current_addr`; everything else passes the resolved target
/// straight through, leaving the instruction-size backoff and GP-base
/// subtraction that `apply::apply` performs at write time untouched here
/// (this is a template *selection* value, not the final written one).
fn resolved_value(kind: RelocKind, target: i64, current_addr: i64) -> i64 {
    match rel_expr(kind) {
        RelExpr::PcRel | RelExpr::PagePc => target - current_addr,
        RelExpr::Abs | RelExpr::GpRel => target,
        RelExpr::NegComposite | RelExpr::RelaxHint | RelExpr::None => 0,
    }
}

fn reloc_mask(kind: RelocKind) -> u64 {
    crate::reloc::property::get_reloc_property(kind).mask
}

fn align_up(addr: u64, align: u64) -> u64 {
    if align <= 1 {
        addr
    } else {
        (addr + align - 1) & !(align - 1)
    }
}

/// Recomputes one `ALIGN` relocation's padding in place (spec.md §4.4):
/// the relocation's symbol carries the alignment boundary as a
/// logarithm in `value` and the current padding byte count in `size`.
/// An adjacent `MAX` relocation at the same offset clamps the result;
/// an adjacent `FILL` supplies the byte pattern for the unreachable
/// portion of the gap (zero, absent one). Section length is unchanged:
/// only the boundary between "never executed fill" and "must decode as
/// a no-op" shifts within the already-reserved padding region.
fn handle_align(
    section: &mut TransformableSection,
    symbols: &mut SymbolTable,
    reloc: SectionReloc,
    total_delta: i64,
    ctx: Ctx,
) {
    let log2 = symbols.get(reloc.symbol).value;
    let old_padding = symbols.get(reloc.symbol).size;
    let current_addr = (section.addr as i64 + reloc.offset as i64 - total_delta) as u64;
    let align = 1u64 << log2;
    let new_addr = align_up(current_addr, align);
    let mut new_padding = new_addr - current_addr;

    if let Some(max_reloc) = section
        .relocations
        .iter()
        .find(|r| r.offset == reloc.offset && r.kind == RelocKind::Max)
    {
        let max = symbols.get(max_reloc.symbol).value;
        if new_padding > max {
            #[cfg(feature = "log")]
            log::warn!(
                "ALIGN padding {new_padding} at offset {:#x} exceeds MAX {max}, clamped to 0",
                reloc.offset
            );
            new_padding = 0;
        }
    }

    if new_padding < old_padding && old_padding >= 4 && new_padding >= old_padding - 4 {
        let nop_region_start = reloc.offset + old_padding - 4;
        if (nop_region_start as usize + 4) <= section.data.len() {
            codec::write_insn(
                u64::from(crate::transform::NOP16),
                &mut section.data,
                nop_region_start,
                2,
                ctx,
            );
            codec::write_insn(
                u64::from(crate::transform::NOP16),
                &mut section.data,
                nop_region_start + 2,
                2,
                ctx,
            );
        }
    }

    symbols.get_mut(reloc.symbol).size = new_padding;
}

/// Materialises a resized section buffer (spec.md §4.5, after the loop):
/// copies untouched bytes, splices in each transformed relocation's
/// staged writes in place of its old instruction, and copies the tail.
fn finalize(section: &mut TransformableSection, total_delta: i64, ctx: Ctx) {
    let new_len = (section.data.len() as i64 - total_delta) as usize;
    let mut new_data = Vec::with_capacity(new_len);
    let mut src_cursor = 0u64;
    let mut write_cursor = 0usize;

    for (rel_idx, reloc) in section.relocations.iter().enumerate() {
        let info = section.aux.reloc_info[rel_idx];
        if !info.touched {
            continue;
        }
        let owner_size = reloc.kind.owner_size();
        let insn_offset = reloc.offset - u64::from(owner_size == 6) * codec::OPCODE_BACKOFF_6BYTE;

        new_data.extend_from_slice(&section.data[src_cursor as usize..insn_offset as usize]);

        loop {
            let write = section.aux.writes[write_cursor];
            new_data.extend_from_slice(&encode_write(write.insn, write.size, ctx));
            write_cursor += 1;
            if !write.continuation {
                break;
            }
        }
        src_cursor = insn_offset + u64::from(owner_size);
    }

    new_data.extend_from_slice(&section.data[src_cursor as usize..]);
    debug_assert_eq!(new_data.len(), new_len);
    section.data = new_data;

    adjust_relocation_offsets(section);
}

fn encode_write(insn: u64, size: u32, ctx: Ctx) -> Vec<u8> {
    if size == 0 {
        return Vec::new();
    }
    let mut buf = vec![0u8; size as usize];
    codec::write_insn(insn, &mut buf, 0, size, ctx);
    buf
}

/// Adjusts every relocation's recorded offset by the cumulative delta
/// that precedes it, applying the ±2 parity correction when a 48-bit
/// owner's backoff convention no longer matches its (possibly new)
/// owning instruction size (spec.md §4.5).
fn adjust_relocation_offsets(section: &mut TransformableSection) {
    for (rel_idx, reloc) in section.relocations.iter_mut().enumerate() {
        let info = section.aux.reloc_info[rel_idx];
        reloc.offset = (reloc.offset as i64 - info.cumulative_delta) as u64;
        if info.touched {
            reloc.kind = info.new_kind;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::container::Width;
    use crate::symbol::{SectionId, Symbol};

    fn ctx() -> Ctx {
        Ctx::new(Width::W32, scroll::Endian::Little)
    }

    #[test]
    fn setup_builds_sorted_anchors_for_defined_symbols() {
        let mut symbols = SymbolTable::new();
        let sec = SectionId(0);
        symbols.push(Symbol::defined(sec, 0x10, 4));
        symbols.push(Symbol::defined(sec, 0x4, 0));
        let mut section = TransformableSection::new(sec, 0x1000, vec![0u8; 0x20], vec![]);
        setup(&mut section, &symbols);
        assert_eq!(section.aux.anchors[0].offset, 0x4);
        assert_eq!(section.aux.anchors[1].offset, 0x10);
    }

    #[test]
    fn pass_with_no_relocations_makes_no_change() {
        let mut symbols = SymbolTable::new();
        let sec = SectionId(0);
        let mut section = TransformableSection::new(sec, 0x1000, vec![0u8; 8], vec![]);
        setup(&mut section, &symbols);
        let mut controller = Controller::new(true, false);
        let outcome = run_pass(&mut section, &mut symbols, &mut controller, ctx());
        assert!(!outcome.changed);
        assert_eq!(outcome.total_delta, 0);
    }

    #[test]
    fn balc_to_bc16_relax_shrinks_section_by_two_bytes() {
        use crate::insn::BALC;

        let mut symbols = SymbolTable::new();
        let sec = SectionId(0);
        // Target 0x400 bytes ahead of the instruction fits PC10_S1.
        let target_sym = symbols.push(Symbol::defined(sec, 0x1400, 0));

        let mut data = vec![0u8; 8];
        codec::write_insn(BALC.opcode, &mut data, 0, 4, ctx());

        let reloc = SectionReloc {
            offset: 0,
            kind: RelocKind::Pc25S1,
            symbol: target_sym,
            addend: 0,
        };
        let mut section = TransformableSection::new(sec, 0x1000, data, vec![reloc]);
        setup(&mut section, &symbols);

        let mut controller = Controller::new(true, false);
        let outcome = run_pass(&mut section, &mut symbols, &mut controller, ctx());

        assert!(outcome.changed);
        assert_eq!(outcome.total_delta, 2);
        assert_eq!(section.data.len(), 6);
        assert_eq!(section.relocations[0].kind, RelocKind::Pc10S1);
    }

    #[test]
    fn align_shrink_splits_trailing_nop32_into_two_nop16() {
        // 6-byte padding region: 2 bytes of fill followed by a 4-byte
        // NOP32, at section offset 0x10. The code before it has shrunk
        // so only 2 bytes of padding are still needed to reach the next
        // 8-byte boundary.
        let mut symbols = SymbolTable::new();
        let sec = SectionId(0);
        // log2(8) == 3; size starts at the old padding, 6 bytes. An
        // ALIGN control symbol carries these as raw value/size fields
        // read by offset, not a real position in `sec` — give it no
        // section so it doesn't also become a section anchor.
        let align_sym = symbols.push(Symbol {
            section: None,
            value: 3,
            size: 6,
            is_undef_weak: false,
        });

        let mut data = vec![0u8; 0x20];
        codec::write_insn(crate::transform::NOP32 as u64, &mut data, 0x12, 4, ctx());

        let reloc = SectionReloc {
            offset: 0x10,
            kind: RelocKind::Align,
            symbol: align_sym,
            addend: 0,
        };
        let mut section = TransformableSection::new(sec, 0x1006, data, vec![reloc]);
        setup(&mut section, &symbols);

        let mut controller = Controller::new(true, false);
        run_pass(&mut section, &mut symbols, &mut controller, ctx());

        assert_eq!(symbols.get(align_sym).size, 2);
        assert_eq!(
            codec::read_insn(&section.data, 0x12, 2, ctx()),
            u64::from(crate::transform::NOP16)
        );
        assert_eq!(
            codec::read_insn(&section.data, 0x14, 2, ctx()),
            u64::from(crate::transform::NOP16)
        );
    }
}
