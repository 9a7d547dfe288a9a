use anyhow::Result;
use clap::{Parser, Subcommand};
use std::process::Command;

/// Crates with unsafe storage code, run under Miri.
const MIRI_CRATES: [&str; 3] = ["mu-ranges", "mu-array", "mu-handle"];

#[derive(Parser)]
#[command(name = "xtask", about = "Workspace automation for mu")]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Run all checks: fmt, clippy, tests, doc, teardown smoke run
    Check,
    /// Run cargo fmt --check on all crates
    Fmt,
    /// Run clippy on all crates
    Clippy,
    /// Run all tests
    Test,
    /// Run the unsafe-heavy crates' tests under Miri (needs nightly)
    Miri,
    /// Build rustdoc for the workspace
    Doc,
    /// Build the entire workspace
    Build,
    /// Run the array growth benchmarks in release mode
    Bench,
    /// Run `mu-cli teardown` against the headless backend
    Smoke,
}

fn main() -> Result<()> {
    let cli = Cli::parse();

    match cli.command {
        Commands::Check => {
            run_fmt()?;
            run_clippy()?;
            run_tests()?;
            run_doc()?;
            run_smoke()?;
        }
        Commands::Fmt => run_fmt()?,
        Commands::Clippy => run_clippy()?,
        Commands::Test => run_tests()?,
        Commands::Miri => run_miri()?,
        Commands::Doc => run_doc()?,
        Commands::Build => run_build()?,
        Commands::Bench => run_bench()?,
        Commands::Smoke => run_smoke()?,
    }

    Ok(())
}

fn cargo(label: &str, args: &[&str]) -> Result<()> {
    println!("==> Running cargo {label}");
    let status = Command::new("cargo").args(args).status()?;
    if !status.success() {
        anyhow::bail!("cargo {label} failed");
    }
    Ok(())
}

fn run_fmt() -> Result<()> {
    cargo("fmt --check", &["fmt", "--all", "--", "--check"])
}

fn run_clippy() -> Result<()> {
    cargo(
        "clippy",
        &[
            "clippy",
            "--workspace",
            "--all-targets",
            "--",
            "-D",
            "warnings",
        ],
    )
}

fn run_tests() -> Result<()> {
    cargo("test", &["test", "--workspace"])
}

fn run_miri() -> Result<()> {
    let mut args = vec!["+nightly", "miri", "test"];
    for krate in MIRI_CRATES {
        args.extend(["-p", krate]);
    }
    cargo("miri test", &args)
}

fn run_doc() -> Result<()> {
    cargo("doc", &["doc", "--workspace", "--no-deps"])
}

fn run_build() -> Result<()> {
    cargo("build", &["build", "--workspace"])
}

fn run_bench() -> Result<()> {
    cargo(
        "bench",
        &["bench", "-p", "mu-array", "--bench", "bench_array_growth"],
    )
}

fn run_smoke() -> Result<()> {
    cargo(
        "run mu-cli teardown",
        &["run", "-p", "mu-cli", "--", "teardown"],
    )
}
