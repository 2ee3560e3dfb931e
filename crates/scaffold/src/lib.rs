//! Scaffolding layer for ExecPlan workflows.
//!
//! Owns the file-level work around the managed-region patcher: resolving the
//! repository layout, installing templates and managed blocks (`init`), and
//! validating an existing tree (`doctor`). All structural problems are
//! collected and reported in one pass; nothing here panics on a malformed
//! document.

pub mod config;
pub mod doctor;
pub mod init;
pub mod presets;
pub mod templates;

/// Markers delimiting the managed block in AGENTS.md / CLAUDE.md.
pub const MANAGED_BEGIN: &str = "<!-- execplans:begin -->";
pub const MANAGED_END: &str = "<!-- execplans:end -->";

pub use config::{Assistants, Config, Options, Preset};
pub use doctor::run_doctor;
pub use init::{run_init, InitReport};
