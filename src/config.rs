//! Link-time configuration consumed by the relaxation engine (spec.md
//! §6). A plain struct with a `default()` and small builder setters,
//! the same shape `goblin::pe::options::ParseOptions` uses for its own
//! handful of parser toggles rather than a derive-macro builder crate.

use crate::container::Width;

/// Configuration options the host link driver supplies (spec.md §6).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Config {
    /// Enable relaxation passes.
    pub relax: bool,
    /// Enable expansion passes.
    pub expand: bool,
    /// `-r`/partial-link mode; disables the engine entirely when true
    /// (spec.md §4.6).
    pub relocatable: bool,
    /// Permit `LO12` relaxations specifically (some link layouts keep
    /// `LO12` forms stable for debugging even with `relax` enabled).
    pub relax_lo12: bool,
    /// Forbid selecting 16-bit instruction variants; templates whose
    /// emitted forms are all 2-byte are skipped.
    pub insn32: bool,
    /// Hardware errata workaround toggles.
    pub fix_hw110880: bool,
    pub fix_hw113064: bool,
    /// Scratch register number (0..31) used by expansions that need one.
    pub expand_reg: u8,
    pub strict_address_modes: bool,
    pub wordsize: Width,
}

impl Config {
    /// Default configuration: no relaxation, no expansion, 32-bit
    /// wordsize. A host enables what it needs via the setters below.
    pub fn default() -> Config {
        Config {
            relax: false,
            expand: false,
            relocatable: false,
            relax_lo12: true,
            insn32: false,
            fix_hw110880: false,
            fix_hw113064: false,
            expand_reg: 25,
            strict_address_modes: false,
            wordsize: Width::W32,
        }
    }

    pub fn relax(mut self, relax: bool) -> Config {
        self.relax = relax;
        self
    }

    pub fn expand(mut self, expand: bool) -> Config {
        self.expand = expand;
        self
    }

    pub fn relocatable(mut self, relocatable: bool) -> Config {
        self.relocatable = relocatable;
        self
    }

    pub fn relax_lo12(mut self, relax_lo12: bool) -> Config {
        self.relax_lo12 = relax_lo12;
        self
    }

    pub fn insn32(mut self, insn32: bool) -> Config {
        self.insn32 = insn32;
        self
    }

    pub fn expand_reg(mut self, reg: u8) -> Config {
        assert!(reg <= 31, "expand_reg must be a valid GPR number (0..=31)");
        self.expand_reg = reg;
        self
    }

    pub fn wordsize(mut self, wordsize: Width) -> Config {
        self.wordsize = wordsize;
        self
    }

    /// `true` when the engine should run at all (spec.md §4.6): not a
    /// relocatable link, and at least one of relax/expand requested.
    pub fn engine_active(&self) -> bool {
        !self.relocatable && (self.relax || self.expand)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_engine_is_inactive() {
        assert!(!Config::default().engine_active());
    }

    #[test]
    fn relocatable_disables_engine_even_with_relax_set() {
        let cfg = Config::default().relax(true).relocatable(true);
        assert!(!cfg.engine_active());
    }

    #[test]
    fn relax_or_expand_enables_engine() {
        assert!(Config::default().relax(true).engine_active());
        assert!(Config::default().expand(true).engine_active());
    }

    #[test]
    #[should_panic]
    fn expand_reg_rejects_out_of_range_register() {
        Config::default().expand_reg(32);
    }
}
