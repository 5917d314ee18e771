//! Symbol anchors within a section (spec.md §3, §9 Design Notes): the
//! points a section's relaxation pass must track so that every symbol
//! still lands on the right byte once earlier instructions shrink or
//! grow.

use crate::symbol::SymbolId;

#[cfg(test)]
use crate::prelude::vec;

/// One symbol's position inside a section being relaxed. `is_end` marks
/// an anchor recorded for a symbol whose `value + size` falls inside the
/// section (a function's end, typically) as distinct from its start,
/// since the two can end up on opposite sides of a deleted instruction.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Anchor {
    pub offset: u64,
    pub symbol: SymbolId,
    pub is_end: bool,
}

impl Anchor {
    pub fn start(offset: u64, symbol: SymbolId) -> Anchor {
        Anchor {
            offset,
            symbol,
            is_end: false,
        }
    }

    pub fn end(offset: u64, symbol: SymbolId) -> Anchor {
        Anchor {
            offset,
            symbol,
            is_end: true,
        }
    }
}

/// Sorts anchors by offset, with start anchors ordered before end anchors
/// at the same offset so a zero-length symbol sitting exactly at a
/// deletion boundary resolves its start before its end (spec.md §4.5).
pub fn sort_anchors(anchors: &mut [Anchor]) {
    anchors.sort_by(|a, b| a.offset.cmp(&b.offset).then(a.is_end.cmp(&b.is_end)));
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn sort_orders_start_before_end_at_same_offset() {
        let sym = SymbolId(0);
        let mut anchors = vec![Anchor::end(8, sym), Anchor::start(8, sym)];
        sort_anchors(&mut anchors);
        assert!(!anchors[0].is_end);
        assert!(anchors[1].is_end);
    }

    #[test]
    fn sort_orders_by_offset_first() {
        let sym = SymbolId(0);
        let mut anchors = vec![Anchor::start(16, sym), Anchor::start(4, sym)];
        sort_anchors(&mut anchors);
        assert_eq!(anchors[0].offset, 4);
        assert_eq!(anchors[1].offset, 16);
    }
}
