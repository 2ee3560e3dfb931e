//! The codex-max preset: the agent harness installed on top of the standard
//! scaffold. One table drives both `init` (what to install) and `doctor`
//! (what must exist), so the two can never disagree about the file set.

/// One file the preset ships. `relative_path` is always resolved against the
/// repository root, independent of the configurable directories.
pub struct PresetFile {
    pub relative_path: &'static str,
    pub content: &'static str,
    pub executable: bool,
}

const fn file(relative_path: &'static str, content: &'static str) -> PresetFile {
    PresetFile {
        relative_path,
        content,
        executable: false,
    }
}

const fn script(relative_path: &'static str, content: &'static str) -> PresetFile {
    PresetFile {
        relative_path,
        content,
        executable: true,
    }
}

pub const CODEX_MAX_FILES: &[PresetFile] = &[
    file(
        "ARCHITECTURE.md",
        include_str!("../templates/codex-max/ARCHITECTURE.md"),
    ),
    file(
        ".codex/config.toml",
        include_str!("../templates/codex-max/codex/config.toml"),
    ),
    file(
        "docs/design-docs/index.md",
        include_str!("../templates/codex-max/docs/design-docs/index.md"),
    ),
    file(
        "docs/exec-plans/tech-debt-tracker.md",
        include_str!("../templates/codex-max/docs/exec-plans/tech-debt-tracker.md"),
    ),
    file(
        "docs/generated/db-schema.md",
        include_str!("../templates/codex-max/docs/generated/db-schema.md"),
    ),
    file(
        "docs/product-specs/index.md",
        include_str!("../templates/codex-max/docs/product-specs/index.md"),
    ),
    file(
        "docs/references/design-system-reference-llms.txt",
        include_str!("../templates/codex-max/docs/references/design-system-reference-llms.txt"),
    ),
    file(
        "docs/SECURITY.md",
        include_str!("../templates/codex-max/docs/SECURITY.md"),
    ),
    script(
        ".agent/harness/worktree/up.sh",
        include_str!("../templates/codex-max/harness/worktree/up.sh"),
    ),
    script(
        ".agent/harness/worktree/down.sh",
        include_str!("../templates/codex-max/harness/worktree/down.sh"),
    ),
    script(
        ".agent/harness/worktree/status.sh",
        include_str!("../templates/codex-max/harness/worktree/status.sh"),
    ),
    file(
        ".agent/harness/observability/docker-compose.yml",
        include_str!("../templates/codex-max/harness/observability/docker-compose.yml"),
    ),
    script(
        ".agent/harness/observability/smoke.sh",
        include_str!("../templates/codex-max/harness/observability/smoke.sh"),
    ),
    file(
        ".agent/harness/observability/vector/vector.yaml",
        include_str!("../templates/codex-max/harness/observability/vector/vector.yaml"),
    ),
    file(
        ".agent/harness/mcp/observability-server/server.mjs",
        include_str!("../templates/codex-max/harness/mcp/observability-server/server.mjs"),
    ),
    file(
        ".agents/skills/ui-legibility/SKILL.md",
        include_str!("../templates/codex-max/skills/ui-legibility/SKILL.md"),
    ),
];

/// Substrings doctor requires in `.codex/config.toml` once it exists.
pub const CODEX_CONFIG_REQUIRED_BLOCKS: [&str; 2] =
    ["[mcp_servers.chrome_devtools]", "[mcp_servers.observability]"];
