use anyhow::Result;
use clap::{Args, Parser, Subcommand};
use colored::*;
use std::path::Path;
use std::process::{Command, Stdio};
use std::time::Instant;

/// Largest image the default PROM window holds
const PROM_WINDOW: u64 = 1024 * 1024;

const DEFAULT_PROM: &str = "roms/ip30prom.rev4.9.bin";

#[derive(Parser)]
#[command(name = "x")]
#[command(about = "Development automation for speedracer")]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

/// Library test filters; none selected runs everything
#[derive(Args, Clone, Copy, Default)]
struct ModuleFilter {
    /// CPU, CP0 and TLB tests
    #[arg(long)]
    cpu: bool,
    /// Physical bus and MMIO tests
    #[arg(long)]
    memory: bool,
    /// Interrupt line tests
    #[arg(long)]
    interrupt: bool,
    /// System integration tests
    #[arg(long)]
    system: bool,
}

impl ModuleFilter {
    fn selected(&self) -> Vec<(&'static str, &'static str)> {
        [
            (self.cpu, "core::cpu", "CPU"),
            (self.memory, "core::memory", "Memory"),
            (self.interrupt, "core::interrupt", "Interrupt"),
            (self.system, "core::system", "System"),
        ]
        .into_iter()
        .filter(|(enabled, _, _)| *enabled)
        .map(|(_, path, name)| (path, name))
        .collect()
    }
}

#[derive(Subcommand)]
enum Commands {
    /// Run all CI checks (fmt, clippy, build, test)
    Ci {
        #[arg(long)]
        verbose: bool,
    },
    /// Quick checks before commit (fmt, clippy)
    Check {
        #[arg(long)]
        verbose: bool,
    },
    /// Format code
    Fmt {
        #[arg(long)]
        check: bool,
    },
    /// Run clippy
    Clippy {
        #[arg(long)]
        fix: bool,
    },
    /// Build the project
    Build {
        #[arg(long)]
        release: bool,
    },
    /// Run tests
    Test {
        #[arg(long)]
        doc: bool,
        #[arg(long)]
        ignored: bool,
        #[command(flatten)]
        modules: ModuleFilter,
    },
    /// Run benchmarks
    Bench,
    /// Boot the IP30 PROM image in the emulator
    PromBoot {
        /// Path to the PROM image
        #[arg(default_value = DEFAULT_PROM)]
        prom_path: String,
        /// Number of instructions to execute
        #[arg(short = 'n', long, default_value = "100000")]
        instructions: u64,
        /// Write an execution trace to this file
        #[arg(long)]
        trace: Option<String>,
        /// Build in release mode
        #[arg(long)]
        release: bool,
    },
    /// Hex dump the start of the PROM image
    PromDump {
        #[arg(default_value = DEFAULT_PROM)]
        prom_path: String,
        /// Bytes to dump
        #[arg(short = 'b', long, default_value = "256")]
        bytes: usize,
    },
    /// Pre-commit hook (fmt, clippy, test)
    PreCommit,
    /// Install git hooks
    InstallHooks,
}

fn main() -> Result<()> {
    let cli = Cli::parse();

    match cli.command {
        Commands::Ci { verbose } => run_ci(verbose),
        Commands::Check { verbose } => run_check(verbose),
        Commands::Fmt { check } => run_fmt(check),
        Commands::Clippy { fix } => run_clippy(fix),
        Commands::Build { release } => run_build(release),
        Commands::Test {
            doc,
            ignored,
            modules,
        } => run_test(doc, ignored, modules),
        Commands::Bench => run_bench(),
        Commands::PromBoot {
            prom_path,
            instructions,
            trace,
            release,
        } => run_prom_boot(&prom_path, instructions, trace.as_deref(), release),
        Commands::PromDump { prom_path, bytes } => run_prom_dump(&prom_path, bytes),
        Commands::PreCommit => run_pre_commit(),
        Commands::InstallHooks => install_hooks(),
    }
}

fn run_ci(verbose: bool) -> Result<()> {
    println!("{}", "=== Running CI Pipeline ===".bold().blue());

    let start = Instant::now();

    run_task("Format Check", || run_fmt(true), verbose)?;
    run_task("Clippy", || run_clippy(false), verbose)?;
    run_task("Build", || run_build(false), verbose)?;
    run_task(
        "Test",
        || run_test(false, false, ModuleFilter::default()),
        verbose,
    )?;

    report_elapsed("✓ CI passed in", start);
    Ok(())
}

fn run_check(verbose: bool) -> Result<()> {
    println!("{}", "=== Running Quick Checks ===".bold().blue());

    let start = Instant::now();

    run_task("Format Check", || run_fmt(true), verbose)?;
    run_task("Clippy", || run_clippy(false), verbose)?;

    report_elapsed("✓ Checks passed in", start);
    Ok(())
}

fn run_fmt(check: bool) -> Result<()> {
    let mut cmd = cargo("fmt");
    cmd.arg("--all");

    if check {
        cmd.arg("--").arg("--check");
    }

    execute_command(&mut cmd)
}

fn run_clippy(fix: bool) -> Result<()> {
    let mut cmd = cargo("clippy");
    cmd.arg("--workspace").arg("--all-targets");

    if fix {
        cmd.arg("--fix");
    } else {
        cmd.arg("--").arg("-D").arg("warnings");
    }

    execute_command(&mut cmd)
}

fn run_build(release: bool) -> Result<()> {
    let mut cmd = cargo("build");

    if release {
        cmd.arg("--release");
    }

    execute_command(&mut cmd)
}

fn run_test(doc: bool, ignored: bool, modules: ModuleFilter) -> Result<()> {
    let selected = modules.selected();

    if doc || selected.is_empty() {
        let mut cmd = cargo("test");
        if doc {
            cmd.arg("--doc");
        }
        if ignored {
            cmd.arg("--").arg("--ignored");
        }
        return execute_command(&mut cmd);
    }

    let mut failed = Vec::new();

    for (module_path, module_name) in &selected {
        println!("{} Running {} tests...", "→".blue(), module_name.bold());

        let mut cmd = cargo("test");
        cmd.arg("--lib").arg(module_path);
        if ignored {
            cmd.arg("--").arg("--ignored");
        }

        match execute_command(&mut cmd) {
            Ok(_) => println!("{} {} tests passed\n", "✓".green(), module_name),
            Err(e) => {
                println!("{} {} tests failed\n", "✗".red(), module_name);
                if selected.len() == 1 {
                    return Err(e);
                }
                failed.push(*module_name);
            }
        }
    }

    if failed.is_empty() {
        Ok(())
    } else {
        anyhow::bail!("Tests failed in: {}", failed.join(", "))
    }
}

fn run_bench() -> Result<()> {
    execute_command(&mut cargo("bench"))
}

/// Check that a PROM image exists and fits the PROM window
fn check_prom(prom_path: &str) -> Result<u64> {
    let path = Path::new(prom_path);
    if !path.exists() {
        println!(
            "{} PROM image not found: {}",
            "✗".red().bold(),
            prom_path.yellow()
        );
        println!(
            "\n{} Place the IP30 PROM at {} or pass its path.",
            "ℹ".blue(),
            DEFAULT_PROM
        );
        anyhow::bail!("PROM image not found");
    }

    let size = std::fs::metadata(path)?.len();
    if size == 0 || size > PROM_WINDOW || size % 4 != 0 {
        println!(
            "{} Unusable PROM size: {} bytes (expected a word multiple up to {} bytes)",
            "✗".red().bold(),
            size,
            PROM_WINDOW
        );
        anyhow::bail!("Invalid PROM image size");
    }

    println!(
        "{} PROM image: {} ({} bytes)",
        "✓".green(),
        prom_path.cyan(),
        size
    );
    Ok(size)
}

fn run_prom_boot(
    prom_path: &str,
    instructions: u64,
    trace: Option<&str>,
    release: bool,
) -> Result<()> {
    println!("{}", "=== PROM Boot ===".bold().blue());

    check_prom(prom_path)?;
    println!(
        "{} Instructions: {}",
        "→".blue(),
        instructions.to_string().bold()
    );
    println!(
        "{} Build mode: {}",
        "→".blue(),
        if release {
            "release".green().bold()
        } else {
            "debug".yellow().bold()
        }
    );
    println!();

    let start = Instant::now();

    let mut cmd = cargo("run");
    if release {
        cmd.arg("--release");
    }
    cmd.arg("--bin")
        .arg("speedracer")
        .arg("--")
        .arg(prom_path)
        .arg("-n")
        .arg(instructions.to_string());
    if let Some(trace_path) = trace {
        cmd.arg("--trace").arg(trace_path);
    }

    if let Err(e) = execute_command(&mut cmd) {
        println!("\n{} PROM boot failed", "✗".red().bold());
        return Err(e);
    }

    report_elapsed("✓ PROM boot completed in", start);
    Ok(())
}

fn run_prom_dump(prom_path: &str, bytes: usize) -> Result<()> {
    check_prom(prom_path)?;

    let mut cmd = cargo("run");
    cmd.arg("--quiet")
        .arg("--bin")
        .arg("speedracer")
        .arg("--")
        .arg(prom_path)
        .arg(format!("--hexdump={}", bytes));

    execute_command(&mut cmd)
}

fn run_pre_commit() -> Result<()> {
    println!("{}", "=== Pre-commit Checks ===".bold().blue());

    let start = Instant::now();

    run_task("Format Check", || run_fmt(true), false)?;
    run_task("Clippy", || run_clippy(false), false)?;
    run_task(
        "Test",
        || run_test(false, false, ModuleFilter::default()),
        false,
    )?;

    report_elapsed("✓ Pre-commit checks passed in", start);
    Ok(())
}

fn install_hooks() -> Result<()> {
    use std::fs;

    println!("{}", "Installing git hooks...".bold());

    let hook_content = r#"#!/bin/sh
# Generated by cargo x install-hooks
set -e

cargo x pre-commit
"#;

    let hook_path = ".git/hooks/pre-commit";
    fs::write(hook_path, hook_content)?;

    #[cfg(unix)]
    {
        use std::os::unix::fs::PermissionsExt;

        let mut perms = fs::metadata(hook_path)?.permissions();
        perms.set_mode(0o755);
        fs::set_permissions(hook_path, perms)?;
    }

    println!("{}", "✓ Git hooks installed".green());
    Ok(())
}

fn run_task<F>(name: &str, task: F, verbose: bool) -> Result<()>
where
    F: FnOnce() -> Result<()>,
{
    print!("{} {} ... ", "→".blue(), name);

    let start = Instant::now();
    let result = task();

    match &result {
        Ok(_) if verbose => println!(
            "{} ({:.2}s)",
            "✓".green().bold(),
            start.elapsed().as_secs_f64()
        ),
        Ok(_) => println!("{}", "✓".green().bold()),
        Err(_) => println!("{}", "✗".red().bold()),
    }
    result
}

fn report_elapsed(message: &str, start: Instant) {
    println!(
        "\n{} {}",
        message.green().bold(),
        format!("{:.2}s", start.elapsed().as_secs_f64()).bold()
    );
}

fn cargo(subcommand: &str) -> Command {
    let mut cmd = Command::new("cargo");
    cmd.arg(subcommand);
    cmd
}

fn execute_command(cmd: &mut Command) -> Result<()> {
    let status = cmd
        .stdout(Stdio::inherit())
        .stderr(Stdio::inherit())
        .status()?;

    if !status.success() {
        anyhow::bail!("Command failed with exit code: {}", status);
    }

    Ok(())
}
