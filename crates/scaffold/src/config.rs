use anyhow::{Context, Result};
use std::path::{Path, PathBuf};

/// Raw options as supplied on the command line. Everything optional; the
/// defaults live in [`Config::resolve`].
#[derive(Debug, Default, Clone)]
pub struct Options {
    pub root: Option<PathBuf>,
    pub assistants: Option<String>,
    pub preset: Option<String>,
    pub agents_file: Option<String>,
    pub claude_file: Option<String>,
    pub plan_dir: Option<String>,
    pub execplans_dir: Option<String>,
    pub skills_dir: Option<String>,
    pub force: bool,
    pub dry_run: bool,
}

/// Which assistant-facing files the run should manage.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Assistants {
    pub needs_agents_file: bool,
    pub needs_claude_file: bool,
    pub needs_codex_skills: bool,
}

impl Assistants {
    fn parse(list: &str) -> Result<Self> {
        let mut assistants = Assistants {
            needs_agents_file: false,
            needs_claude_file: false,
            needs_codex_skills: false,
        };
        for token in list.split(',').map(str::trim).filter(|t| !t.is_empty()) {
            match token {
                "all" => {
                    assistants.needs_agents_file = true;
                    assistants.needs_claude_file = true;
                    assistants.needs_codex_skills = true;
                }
                "codex" => {
                    assistants.needs_agents_file = true;
                    assistants.needs_codex_skills = true;
                }
                "claude" => assistants.needs_claude_file = true,
                "augment" => assistants.needs_agents_file = true,
                other => anyhow::bail!(
                    "unknown assistant target {other:?} (expected codex, claude, augment, all)"
                ),
            }
        }
        Ok(assistants)
    }
}

/// Which file set `init` installs and `doctor` demands.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Preset {
    Standard,
    CodexMax,
}

impl Preset {
    fn parse(name: &str) -> Result<Self> {
        match name.trim() {
            "standard" => Ok(Preset::Standard),
            "codex-max" => Ok(Preset::CodexMax),
            other => anyhow::bail!("unknown preset {other:?} (expected standard, codex-max)"),
        }
    }
}

/// Fully resolved repository layout for one init/doctor run.
#[derive(Debug, Clone)]
pub struct Config {
    pub root: PathBuf,
    pub assistants: Assistants,
    pub preset: Preset,
    pub agents_file_path: PathBuf,
    pub claude_file_path: PathBuf,
    pub plans_file_path: PathBuf,
    pub execplans_dir: PathBuf,
    pub execplans_readme_path: PathBuf,
    pub skills_dir: PathBuf,
    pub execplan_create_skill_path: PathBuf,
    pub execplan_execute_skill_path: PathBuf,
    pub force: bool,
    pub dry_run: bool,
}

fn join(root: &Path, relative: &str) -> PathBuf {
    let relative = Path::new(relative);
    if relative.is_absolute() {
        relative.to_path_buf()
    } else {
        root.join(relative)
    }
}

impl Config {
    pub fn resolve(options: &Options) -> Result<Self> {
        let root = match &options.root {
            Some(root) => root.clone(),
            None => std::env::current_dir().context("resolve current directory")?,
        };

        let assistants =
            Assistants::parse(options.assistants.as_deref().unwrap_or("all"))?;
        let preset = Preset::parse(options.preset.as_deref().unwrap_or("standard"))?;

        let plan_dir = join(&root, options.plan_dir.as_deref().unwrap_or(".agent"));
        let execplans_dir = join(
            &root,
            options.execplans_dir.as_deref().unwrap_or(".agent/execplans"),
        );
        let skills_dir = join(
            &root,
            options.skills_dir.as_deref().unwrap_or(".agents/skills"),
        );

        Ok(Self {
            agents_file_path: join(&root, options.agents_file.as_deref().unwrap_or("AGENTS.md")),
            claude_file_path: join(&root, options.claude_file.as_deref().unwrap_or("CLAUDE.md")),
            plans_file_path: plan_dir.join("PLANS.md"),
            execplans_readme_path: execplans_dir.join("README.md"),
            execplan_create_skill_path: skills_dir.join("execplan-create").join("SKILL.md"),
            execplan_execute_skill_path: skills_dir.join("execplan-execute").join("SKILL.md"),
            execplans_dir,
            skills_dir,
            root,
            assistants,
            preset,
            force: options.force,
            dry_run: options.dry_run,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_targets_cover_everything() {
        let assistants = Assistants::parse("all").unwrap();
        assert!(assistants.needs_agents_file);
        assert!(assistants.needs_claude_file);
        assert!(assistants.needs_codex_skills);
    }

    #[test]
    fn codex_only_skips_claude_file() {
        let assistants = Assistants::parse("codex").unwrap();
        assert!(assistants.needs_agents_file);
        assert!(!assistants.needs_claude_file);
        assert!(assistants.needs_codex_skills);
    }

    #[test]
    fn combined_targets_union() {
        let assistants = Assistants::parse("claude, augment").unwrap();
        assert!(assistants.needs_agents_file);
        assert!(assistants.needs_claude_file);
        assert!(!assistants.needs_codex_skills);
    }

    #[test]
    fn unknown_target_is_rejected() {
        assert!(Assistants::parse("copilot").is_err());
    }

    #[test]
    fn preset_defaults_to_standard_and_rejects_unknown_names() {
        let config = Config::resolve(&Options {
            root: Some(PathBuf::from("/repo")),
            ..Options::default()
        })
        .unwrap();
        assert_eq!(config.preset, Preset::Standard);

        let codex_max = Config::resolve(&Options {
            root: Some(PathBuf::from("/repo")),
            preset: Some("codex-max".to_string()),
            ..Options::default()
        })
        .unwrap();
        assert_eq!(codex_max.preset, Preset::CodexMax);

        assert!(Preset::parse("maximal").is_err());
    }

    #[test]
    fn resolves_paths_under_root() {
        let config = Config::resolve(&Options {
            root: Some(PathBuf::from("/repo")),
            ..Options::default()
        })
        .unwrap();
        assert_eq!(config.agents_file_path, PathBuf::from("/repo/AGENTS.md"));
        assert_eq!(config.plans_file_path, PathBuf::from("/repo/.agent/PLANS.md"));
        assert_eq!(
            config.execplan_create_skill_path,
            PathBuf::from("/repo/.agents/skills/execplan-create/SKILL.md")
        );
    }
}
