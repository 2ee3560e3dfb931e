//! Static template content installed by `init`.

pub const PLANS: &str = include_str!("../templates/PLANS.md");
pub const EXECPLANS_README: &str = include_str!("../templates/execplans-README.md");
pub const MANAGED_BLOCK: &str = include_str!("../templates/managed-block.md");
pub const SKILL_EXECPLAN_CREATE: &str = include_str!("../templates/skill-execplan-create.md");
pub const SKILL_EXECPLAN_EXECUTE: &str = include_str!("../templates/skill-execplan-execute.md");

/// The block installed between the managed markers, without the trailing
/// newline the patcher adds itself.
pub fn managed_block() -> &'static str {
    MANAGED_BLOCK.trim_end()
}
