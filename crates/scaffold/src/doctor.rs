use anyhow::{Context, Result};
use std::path::Path;

use crate::config::{Config, Preset};
use crate::presets;
use crate::{MANAGED_BEGIN, MANAGED_END};

const REQUIRED_PLAN_HEADINGS: [&str; 4] = [
    "## Progress",
    "## Surprises & Discoveries",
    "## Decision Log",
    "## Outcomes & Retrospective",
];

fn check_managed_file(path: &Path, fixes: &mut Vec<String>) -> Result<()> {
    if !path.exists() {
        fixes.push(format!(
            "Fix: Create {} with execplans managed block (run `execplans init`).",
            path.display()
        ));
        return Ok(());
    }

    let content =
        std::fs::read_to_string(path).with_context(|| format!("read {}", path.display()))?;
    let document = path.display().to_string();
    match execplan_patcher::find_region(&document, &content, MANAGED_BEGIN, MANAGED_END) {
        Ok(Some(_)) => {}
        Ok(None) => fixes.push(format!(
            "Fix: Add {MANAGED_BEGIN} and {MANAGED_END} markers to {} (or rerun `execplans init`).",
            path.display()
        )),
        // Malformed markers are diagnostics here, never failures.
        Err(err) => fixes.push(format!("Fix: {err} (or rerun `execplans init`).")),
    }
    Ok(())
}

fn parse_frontmatter(content: &str) -> Option<serde_yaml::Mapping> {
    let rest = content.strip_prefix("---")?;
    let rest = rest.strip_prefix('\r').unwrap_or(rest);
    let rest = rest.strip_prefix('\n')?;
    let end = rest.find("\n---")?;
    match serde_yaml::from_str(&rest[..end]) {
        Ok(serde_yaml::Value::Mapping(mapping)) => Some(mapping),
        _ => None,
    }
}

fn frontmatter_string(mapping: &serde_yaml::Mapping, key: &str) -> Option<String> {
    match mapping.get(key) {
        Some(serde_yaml::Value::String(value)) if !value.trim().is_empty() => {
            Some(value.clone())
        }
        _ => None,
    }
}

fn check_skill_file(path: &Path, fixes: &mut Vec<String>) -> Result<()> {
    if !path.exists() {
        fixes.push(format!("Fix: Create {} (run `execplans init`).", path.display()));
        return Ok(());
    }

    let content =
        std::fs::read_to_string(path).with_context(|| format!("read {}", path.display()))?;
    let Some(frontmatter) = parse_frontmatter(&content) else {
        fixes.push(format!(
            "Fix: Add YAML frontmatter with non-empty name and description to {}.",
            path.display()
        ));
        return Ok(());
    };

    if frontmatter_string(&frontmatter, "name").is_none() {
        fixes.push(format!(
            "Fix: Set non-empty frontmatter field \"name\" in {}.",
            path.display()
        ));
    }
    if frontmatter_string(&frontmatter, "description").is_none() {
        fixes.push(format!(
            "Fix: Set non-empty frontmatter field \"description\" in {}.",
            path.display()
        ));
    }
    Ok(())
}

/// Validates the ExecPlan structure under `config.root` and returns one fix
/// suggestion per problem found. An empty list means the tree is healthy.
pub fn run_doctor(config: &Config) -> Result<Vec<String>> {
    let mut fixes = Vec::new();

    if !config.plans_file_path.exists() {
        fixes.push(format!(
            "Fix: Create {} (run `execplans init`).",
            config.plans_file_path.display()
        ));
    }
    if !config.execplans_dir.exists() {
        fixes.push(format!(
            "Fix: Create {} directory (run `execplans init`).",
            config.execplans_dir.display()
        ));
    }

    if config.assistants.needs_agents_file {
        check_managed_file(&config.agents_file_path, &mut fixes)?;
    }
    if config.assistants.needs_claude_file {
        check_managed_file(&config.claude_file_path, &mut fixes)?;
    }

    if config.plans_file_path.exists() {
        let plans = std::fs::read_to_string(&config.plans_file_path)
            .with_context(|| format!("read {}", config.plans_file_path.display()))?;
        for heading in REQUIRED_PLAN_HEADINGS {
            if !plans.contains(heading) {
                fixes.push(format!(
                    "Fix: Add required heading \"{heading}\" to {}.",
                    config.plans_file_path.display()
                ));
            }
        }
    }

    if config.assistants.needs_codex_skills {
        check_skill_file(&config.execplan_create_skill_path, &mut fixes)?;
        check_skill_file(&config.execplan_execute_skill_path, &mut fixes)?;
    }

    if config.preset == Preset::CodexMax {
        check_codex_max(config, &mut fixes)?;
    }

    Ok(fixes)
}

/// The codex-max harness is validated against the same table `init`
/// installs from, plus the MCP server blocks inside `.codex/config.toml`.
fn check_codex_max(config: &Config, fixes: &mut Vec<String>) -> Result<()> {
    for preset_file in presets::CODEX_MAX_FILES {
        let path = config.root.join(preset_file.relative_path);
        if !path.exists() {
            fixes.push(format!(
                "Fix: Create {} (run `execplans init --preset codex-max`).",
                path.display()
            ));
        }
    }

    let codex_config_path = config.root.join(".codex/config.toml");
    if codex_config_path.exists() {
        let codex_config = std::fs::read_to_string(&codex_config_path)
            .with_context(|| format!("read {}", codex_config_path.display()))?;
        for block in presets::CODEX_CONFIG_REQUIRED_BLOCKS {
            if !codex_config.contains(block) {
                fixes.push(format!(
                    "Fix: Add {block} block to {} (or rerun `execplans init --preset codex-max`).",
                    codex_config_path.display()
                ));
            }
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn frontmatter_requires_a_mapping() {
        assert!(parse_frontmatter("---\n- just\n- a list\n---\n").is_none());
        assert!(parse_frontmatter("no frontmatter at all\n").is_none());
    }

    #[test]
    fn frontmatter_fields_must_be_non_empty_strings() {
        let mapping = parse_frontmatter("---\nname: execplan-create\ndescription: \"  \"\n---\n")
            .expect("mapping");
        assert_eq!(
            frontmatter_string(&mapping, "name").as_deref(),
            Some("execplan-create")
        );
        assert!(frontmatter_string(&mapping, "description").is_none());
    }
}
