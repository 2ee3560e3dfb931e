use anyhow::{Context, Result};
use std::path::Path;

use crate::config::{Config, Preset};
use crate::{presets, templates};
use crate::{MANAGED_BEGIN, MANAGED_END};

/// Everything one init run did (or, under dry-run, would do). Structural
/// problems in managed files land in `errors` instead of aborting the run,
/// so one report can cover many files.
#[derive(Debug, Default)]
pub struct InitReport {
    pub actions: Vec<String>,
    pub errors: Vec<String>,
}

impl InitReport {
    pub fn is_clean(&self) -> bool {
        self.errors.is_empty()
    }

    fn action(&mut self, dry_run: bool, verb: &str, path: &Path) {
        let prefix = if dry_run { "Would " } else { "" };
        self.actions.push(format!("{prefix}{verb}: {}", path.display()));
    }
}

fn ensure_dir(config: &Config, dir: &Path, report: &mut InitReport) -> Result<()> {
    if dir.exists() {
        return Ok(());
    }
    report.action(config.dry_run, "Create", dir);
    if !config.dry_run {
        std::fs::create_dir_all(dir)
            .with_context(|| format!("create directory {}", dir.display()))?;
    }
    Ok(())
}

/// Returns true when the file was actually written (never under dry-run).
fn write_template(
    config: &Config,
    path: &Path,
    content: &str,
    report: &mut InitReport,
) -> Result<bool> {
    let exists = path.exists();
    if exists && !config.force {
        report.action(config.dry_run, "Skip", path);
        return Ok(false);
    }

    let verb = if exists { "Update" } else { "Create" };
    report.action(config.dry_run, verb, path);
    if config.dry_run {
        return Ok(false);
    }
    if let Some(parent) = path.parent() {
        std::fs::create_dir_all(parent)
            .with_context(|| format!("create directory {}", parent.display()))?;
    }
    std::fs::write(path, content).with_context(|| format!("write {}", path.display()))?;
    Ok(true)
}

#[cfg(unix)]
fn set_executable(path: &Path) -> Result<()> {
    use std::os::unix::fs::PermissionsExt;
    let metadata = std::fs::metadata(path)
        .with_context(|| format!("stat {}", path.display()))?;
    let mut permissions = metadata.permissions();
    permissions.set_mode(permissions.mode() | 0o755);
    std::fs::set_permissions(path, permissions)
        .with_context(|| format!("chmod {}", path.display()))
}

#[cfg(not(unix))]
fn set_executable(_path: &Path) -> Result<()> {
    Ok(())
}

fn install_managed_block(config: &Config, path: &Path, report: &mut InitReport) -> Result<()> {
    let existing = match std::fs::read_to_string(path) {
        Ok(content) => Some(content),
        Err(err) if err.kind() == std::io::ErrorKind::NotFound => None,
        Err(err) => {
            return Err(err).with_context(|| format!("read {}", path.display()));
        }
    };

    let document = path.display().to_string();
    let next = match execplan_patcher::patch(
        &document,
        existing.as_deref(),
        MANAGED_BEGIN,
        MANAGED_END,
        templates::managed_block(),
    ) {
        Ok(next) => next,
        Err(err) => {
            // Collected, never thrown: the rest of the run still happens.
            report.errors.push(err.to_string());
            return Ok(());
        }
    };

    if existing.as_deref() == Some(next.as_str()) {
        report.action(config.dry_run, "Skip", path);
        return Ok(());
    }

    let verb = if existing.is_some() { "Update" } else { "Create" };
    report.action(config.dry_run, verb, path);
    if !config.dry_run {
        std::fs::write(path, next).with_context(|| format!("write {}", path.display()))?;
    }
    Ok(())
}

/// Scaffolds (or re-patches) the ExecPlan structure under `config.root`.
/// Idempotent: a second run over an untouched tree changes nothing.
pub fn run_init(config: &Config) -> Result<InitReport> {
    let mut report = InitReport::default();

    ensure_dir(config, &config.execplans_dir, &mut report)?;
    write_template(config, &config.plans_file_path, templates::PLANS, &mut report)?;
    write_template(
        config,
        &config.execplans_readme_path,
        templates::EXECPLANS_README,
        &mut report,
    )?;

    if config.assistants.needs_codex_skills {
        write_template(
            config,
            &config.execplan_create_skill_path,
            templates::SKILL_EXECPLAN_CREATE,
            &mut report,
        )?;
        write_template(
            config,
            &config.execplan_execute_skill_path,
            templates::SKILL_EXECPLAN_EXECUTE,
            &mut report,
        )?;
    }

    if config.assistants.needs_agents_file {
        install_managed_block(config, &config.agents_file_path, &mut report)?;
    }
    if config.assistants.needs_claude_file {
        install_managed_block(config, &config.claude_file_path, &mut report)?;
    }

    if config.preset == Preset::CodexMax {
        for preset_file in presets::CODEX_MAX_FILES {
            let path = config.root.join(preset_file.relative_path);
            let wrote = write_template(config, &path, preset_file.content, &mut report)?;
            if wrote && preset_file.executable {
                set_executable(&path)?;
            }
        }
    }

    for error in &report.errors {
        log::warn!("init: {error}");
    }
    Ok(report)
}
