//! The `execplans` binary: scaffold and validate ExecPlan workflows.

use anyhow::Result;
use clap::{Args, Parser, Subcommand};
use std::io::{self, Write};
use std::path::PathBuf;
use std::process::ExitCode;

use execplan_scaffold::{run_doctor, run_init, Config, Options};

#[derive(Parser)]
#[command(name = "execplans")]
#[command(about = "Scaffold and validate ExecPlan workflows", long_about = None)]
#[command(version)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Args)]
struct CommonArgs {
    /// Set repository root
    #[arg(long)]
    root: Option<PathBuf>,

    /// Assistant targets: codex,claude,augment,all
    #[arg(long, default_value = "all")]
    assistants: String,

    /// Init preset: standard,codex-max
    #[arg(long, default_value = "standard")]
    preset: String,

    /// AGENTS.md filename
    #[arg(long = "agents-file", default_value = "AGENTS.md")]
    agents_file: String,

    /// CLAUDE.md filename
    #[arg(long = "claude-file", default_value = "CLAUDE.md")]
    claude_file: String,

    /// Path to .agent directory
    #[arg(long = "plan-dir", default_value = ".agent")]
    plan_dir: String,

    /// Path to execplans directory
    #[arg(long = "execplans-dir", default_value = ".agent/execplans")]
    execplans_dir: String,

    /// Path to skills directory
    #[arg(long = "skills-dir", default_value = ".agents/skills")]
    skills_dir: String,

    /// Overwrite managed templates and blocks
    #[arg(long)]
    force: bool,

    /// Show planned changes without writing files
    #[arg(long = "dry-run")]
    dry_run: bool,
}

impl CommonArgs {
    fn into_options(self) -> Options {
        Options {
            root: self.root,
            assistants: Some(self.assistants),
            preset: Some(self.preset),
            agents_file: Some(self.agents_file),
            claude_file: Some(self.claude_file),
            plan_dir: Some(self.plan_dir),
            execplans_dir: Some(self.execplans_dir),
            skills_dir: Some(self.skills_dir),
            force: self.force,
            dry_run: self.dry_run,
        }
    }
}

#[derive(Subcommand)]
enum Commands {
    /// Scaffold or patch repo structure for ExecPlans
    Init(CommonArgs),
    /// Validate ExecPlans structure and managed files
    Doctor(CommonArgs),
}

fn print_line(line: &str) -> Result<()> {
    let mut stdout = io::stdout().lock();
    if let Err(err) = stdout
        .write_all(line.as_bytes())
        .and_then(|_| stdout.write_all(b"\n"))
        .and_then(|_| stdout.flush())
    {
        if err.kind() == io::ErrorKind::BrokenPipe {
            return Ok(());
        }
        return Err(err.into());
    }
    Ok(())
}

fn cmd_init(args: CommonArgs) -> Result<u8> {
    let config = Config::resolve(&args.into_options())?;
    log::debug!("init in {}", config.root.display());
    let report = run_init(&config)?;
    for line in &report.actions {
        print_line(line)?;
    }
    for error in &report.errors {
        print_line(&format!("Error: {error}"))?;
    }
    Ok(if report.is_clean() { 0 } else { 1 })
}

fn cmd_doctor(args: CommonArgs) -> Result<u8> {
    let config = Config::resolve(&args.into_options())?;
    log::debug!("doctor in {}", config.root.display());
    let fixes = run_doctor(&config)?;
    if fixes.is_empty() {
        print_line("OK")?;
        return Ok(0);
    }
    for line in &fixes {
        print_line(line)?;
    }
    Ok(1)
}

fn main() -> ExitCode {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("warn")).init();

    let cli = Cli::parse();
    let outcome = match cli.command {
        Commands::Init(args) => cmd_init(args),
        Commands::Doctor(args) => cmd_doctor(args),
    };

    match outcome {
        Ok(code) => ExitCode::from(code),
        Err(err) => {
            eprintln!("{err:#}");
            ExitCode::FAILURE
        }
    }
}
