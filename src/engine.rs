//! Top-level relaxation engine (spec.md §2, §4.6, §5): the single entry
//! point a host link driver calls once per pass.

use crate::config::Config;
use crate::container::Ctx;
use crate::prelude::{vec, Vec};
use crate::section::{self, TransformableSection};
use crate::symbol::SymbolTable;
use crate::transform::Controller;

/// Drives relaxation/expansion for every eligible section of one link.
///
/// Owns one [`Controller`] per section (spec.md §5: "the controller's
/// internal mode and changed flag" are per-engine-instance state, not
/// global), plus the shared [`Ctx`] every codec/applier call needs.
pub struct Engine {
    config: Config,
    ctx: Ctx,
    controllers: Vec<Controller>,
    setup_done: bool,
}

impl Engine {
    /// Builds an engine for `config`; does nothing yet if
    /// [`Config::engine_active`] is false (spec.md §4.6's `mayRelax`
    /// gate) — callers should check [`Engine::is_active`] before looping.
    pub fn new(config: Config) -> Engine {
        Engine {
            config,
            ctx: Ctx::new(config.wordsize, default_endian()),
            controllers: Vec::new(),
            setup_done: false,
        }
    }

    pub fn with_endian(config: Config, endian: scroll::Endian) -> Engine {
        Engine {
            config,
            ctx: Ctx::new(config.wordsize, endian),
            controllers: Vec::new(),
            setup_done: false,
        }
    }

    /// `true` when the engine should run at all (spec.md §4.6).
    pub fn is_active(&self) -> bool {
        self.config.engine_active()
    }

    /// One synchronous pass over every section in `sections` (spec.md
    /// §2, §5): returns whether any section still needs another pass.
    /// A host calls this in a loop, pass-numbered from 0, until it
    /// returns `false` and every controller has reached [`crate::transform::Mode::None`].
    pub fn relax_once(&mut self, sections: &mut [TransformableSection], symbols: &mut SymbolTable) -> bool {
        if !self.is_active() {
            return false;
        }

        if self.controllers.len() != sections.len() {
            self.controllers = (0..sections.len())
                .map(|_| Controller::new(self.config.relax, self.config.expand))
                .collect();
        }

        if !self.setup_done {
            for section in sections.iter_mut() {
                section::rewriter::setup(section, symbols);
            }
            self.setup_done = true;
        }

        let mut any_needs_another_pass = false;

        for (section, controller) in sections.iter_mut().zip(self.controllers.iter_mut()) {
            if controller.mode() == crate::transform::Mode::None {
                continue;
            }
            let outcome = section::rewriter::run_pass(section, symbols, controller, self.ctx);
            #[cfg(feature = "log")]
            log::debug!(
                "section {:?} pass: mode {:?} changed={} total_delta={}",
                section.id,
                controller.mode(),
                outcome.changed,
                outcome.total_delta
            );
            if !outcome.changed {
                controller.change_state(self.config.expand);
            }
            if controller.mode() != crate::transform::Mode::None {
                any_needs_another_pass = true;
            }
        }

        any_needs_another_pass
    }

    /// `true` once every section's controller has settled at the
    /// terminal mode.
    pub fn converged(&self) -> bool {
        self.controllers.iter().all(|c| c.mode() == crate::transform::Mode::None)
    }
}

fn default_endian() -> scroll::Endian {
    scroll::Endian::Little
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::container::Width;
    use crate::reloc::RelocKind;
    use crate::section::rewriter::{SectionReloc, TransformableSection};
    use crate::symbol::{SectionId, Symbol};

    #[test]
    fn inactive_config_never_runs_a_pass() {
        let mut engine = Engine::new(Config::default());
        let mut symbols = SymbolTable::new();
        let mut sections: Vec<TransformableSection> = Vec::new();
        assert!(!engine.relax_once(&mut sections, &mut symbols));
    }

    #[test]
    fn runs_to_convergence_on_a_single_relaxable_section() {
        use crate::codec;
        use crate::insn::BALC;

        let config = Config::default().relax(true).wordsize(Width::W32);
        let mut engine = Engine::new(config);

        let mut symbols = SymbolTable::new();
        let sec_id = SectionId(0);
        let target = symbols.push(Symbol::defined(sec_id, 0x1400, 0));

        let mut data = vec![0u8; 8];
        codec::write_insn(
            BALC.opcode,
            &mut data,
            0,
            4,
            Ctx::new(Width::W32, scroll::Endian::Little),
        );
        let reloc = SectionReloc {
            offset: 0,
            kind: RelocKind::Pc25S1,
            symbol: target,
            addend: 0,
        };
        let mut sections = vec![TransformableSection::new(sec_id, 0x1000, data, vec![reloc])];

        let mut passes = 0;
        loop {
            let needs_more = engine.relax_once(&mut sections, &mut symbols);
            passes += 1;
            if !needs_more || passes > 8 {
                break;
            }
        }

        assert!(engine.converged());
        assert_eq!(sections[0].data.len(), 6);
    }
}
