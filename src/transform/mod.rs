pub mod controller;
pub mod template;

pub use controller::{Controller, Mode, NOP16, NOP32};
pub use template::{EmittedInsn, Template, TemplateKind, TEMPLATES};
