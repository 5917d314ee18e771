//! Per-section relaxation bookkeeping (spec.md §3): the auxiliary data a
//! section carries across passes, separate from its instruction bytes so
//! the rewriter can stage edits without mutating the section in place
//! until a pass actually commits.

use crate::prelude::Vec;
use crate::reloc::RelocKind;
use super::anchor::Anchor;

/// Running state for one relocation's resolved kind and the cumulative
/// byte-offset delta everything after it has picked up from earlier
/// relaxations/expansions in the same section (spec.md §4.5).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RelocInfo {
    pub cumulative_delta: i64,
    pub new_kind: RelocKind,
    /// `true` once a template has actually been applied to this relocation
    /// in the current pass. Distinguishes "untouched this pass" from
    /// "touched, and its new kind happens to be `NONE`" (a same-offset
    /// instruction deleted outright, e.g. the `lui` half of a collapsed
    /// `HI20`/`LO12` pair) — both finalize and offset adjustment need to
    /// know which one they're looking at.
    pub touched: bool,
}

impl RelocInfo {
    pub fn unchanged(kind: RelocKind) -> RelocInfo {
        RelocInfo {
            cumulative_delta: 0,
            new_kind: kind,
            touched: false,
        }
    }
}

/// One instruction staged for the section's rewritten byte stream,
/// recorded instead of written immediately so a pass can be aborted
/// (e.g. a template whose target turns out not to fit once earlier
/// deltas are folded in) without leaving partial edits behind.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct StagedWrite {
    pub insn: u64,
    pub size: u32,
    /// `true` when this write is the second or later instruction emitted
    /// by the same template — used by the rewriter to avoid re-anchoring
    /// relocations in the middle of one replacement sequence.
    pub continuation: bool,
}

/// Auxiliary relaxation state threaded alongside a section's own byte
/// buffer (spec.md §3, §9 Design Notes).
#[derive(Debug, Clone, Default)]
pub struct RelaxAux {
    pub anchors: Vec<Anchor>,
    pub reloc_info: Vec<RelocInfo>,
    pub writes: Vec<StagedWrite>,
}

impl RelaxAux {
    pub fn new() -> RelaxAux {
        RelaxAux::default()
    }

    pub fn push_write(&mut self, insn: u64, size: u32, continuation: bool) {
        self.writes.push(StagedWrite {
            insn,
            size,
            continuation,
        });
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn unchanged_reloc_info_has_zero_delta() {
        let info = RelocInfo::unchanged(RelocKind::Lo12);
        assert_eq!(info.cumulative_delta, 0);
        assert_eq!(info.new_kind, RelocKind::Lo12);
        assert!(!info.touched);
    }
}
