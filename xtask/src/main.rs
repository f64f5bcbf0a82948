use std::fs;
use std::io::Write;
use std::path::Path;
use std::process::{exit, Command, ExitStatus};

use clap::{Parser, Subcommand, ValueEnum};
use zip::write::FileOptions;
use zip::{CompressionMethod, ZipWriter};

// ── CLI definition ─────────────────────────────────────────────────

#[derive(Parser)]
#[command(
    name = "xtask",
    about = "Task runner for the lambdabased workspace",
    long_about = "A unified CLI for CI checks and release packaging of the\n\
                  lambdabased command line tool."
)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Run CI checks (fmt, clippy, tests)
    Ci {
        /// Job to run
        #[arg(value_enum, default_value_t = CiJob::Check)]
        job: CiJob,
    },
    /// Build the lambdabased binary and zip it into dist/
    Package {
        /// Compilation target triple
        #[arg(long, default_value = "x86_64-unknown-linux-gnu")]
        target: String,
        /// Build profile used for the binary
        #[arg(value_enum, long, default_value_t = BuildProfile::Release)]
        profile: BuildProfile,
    },
}

#[derive(Clone, ValueEnum)]
enum CiJob {
    /// Formatting and clippy
    Lint,
    /// Unit and integration tests
    Test,
    /// Lint + test
    Check,
}

#[derive(Clone, Copy, ValueEnum)]
enum BuildProfile {
    Debug,
    Release,
}

impl BuildProfile {
    fn dir_name(self) -> &'static str {
        match self {
            Self::Debug => "debug",
            Self::Release => "release",
        }
    }

    fn as_cargo_flag(self) -> Option<&'static str> {
        match self {
            Self::Debug => None,
            Self::Release => Some("--release"),
        }
    }
}

// ── helpers ────────────────────────────────────────────────────────

fn step(label: &str) {
    eprintln!("\n=== {label} ===");
}

fn cargo(args: &[&str]) -> ExitStatus {
    eprintln!("+ cargo {}", args.join(" "));
    Command::new("cargo")
        .args(args)
        .status()
        .expect("failed to execute cargo")
}

fn run_cargo(args: &[&str]) {
    let status = cargo(args);
    if !status.success() {
        exit(status.code().unwrap_or(1));
    }
}

fn package_cli(target: &str, profile: BuildProfile) {
    ensure_rust_target_installed(target);

    step("Build lambdabased binary");

    let mut cargo_args = vec![
        "build",
        "-p",
        "invocation_resource_lambda",
        "--target",
        target,
        "--bin",
        "lambdabased",
    ];
    if let Some(flag) = profile.as_cargo_flag() {
        cargo_args.push(flag);
    }
    run_cargo(&cargo_args);

    step("Package release archive");
    let target_dir = Path::new("target").join(target).join(profile.dir_name());
    let dist_dir = Path::new("dist");
    fs::create_dir_all(dist_dir).expect("failed to create dist directory");

    let executable = executable_file_name(target);
    let archive = dist_dir.join(format!("lambdabased_{target}.zip"));
    write_release_archive(&target_dir.join(executable), executable, &archive);

    eprintln!("\nlambdabased release archive:\n- {}", archive.display());
}

/// Fails early when the lambdabased cross-compile target is missing, since
/// `cargo build --target` would otherwise stop with a less direct error.
fn ensure_rust_target_installed(target: &str) {
    let installed = match Command::new("rustup")
        .args(["target", "list", "--installed"])
        .output()
    {
        Ok(output) if output.status.success() => output.stdout,
        Ok(output) => {
            let details = String::from_utf8_lossy(&output.stderr);
            let details = details.trim();
            panic!("could not list rust targets before building lambdabased: {details}")
        }
        Err(error) => {
            eprintln!("warning: rustup unavailable ({error}); target `{target}` not checked");
            return;
        }
    };

    let installed = String::from_utf8_lossy(&installed);
    if !installed.lines().any(|line| line.trim() == target) {
        panic!(
            "lambdabased cannot be packaged for `{target}`: run `rustup target add {target}`, then `cargo xtask package --target {target}`"
        );
    }
}

/// Name of the lambdabased executable, both on disk and inside the archive.
fn executable_file_name(target: &str) -> &'static str {
    if target.contains("windows") {
        "lambdabased.exe"
    } else {
        "lambdabased"
    }
}

/// Writes the single-entry lambdabased release archive.
fn write_release_archive(executable: &Path, entry_name: &str, archive: &Path) {
    let contents = match fs::read(executable) {
        Ok(contents) => contents,
        Err(error) => {
            let path = executable.display();
            panic!("lambdabased build produced no executable at {path}: {error}")
        }
    };
    let file = match fs::File::create(archive) {
        Ok(file) => file,
        Err(error) => {
            let path = archive.display();
            panic!("cannot create lambdabased release archive {path}: {error}")
        }
    };

    // Executable bit so the unpacked CLI runs without a chmod.
    let options = FileOptions::default()
        .compression_method(CompressionMethod::Deflated)
        .unix_permissions(0o755);
    let mut archive_writer = ZipWriter::new(file);
    archive_writer
        .start_file(entry_name, options)
        .expect("release archive rejected the lambdabased entry");
    archive_writer
        .write_all(&contents)
        .expect("writing lambdabased into the release archive");
    archive_writer
        .finish()
        .expect("finalizing the lambdabased release archive");
}

// ── CI jobs ────────────────────────────────────────────────────────

fn ci_lint() {
    step("Check formatting");
    run_cargo(&["fmt", "--all", "--", "--check"]);

    step("Clippy");
    run_cargo(&[
        "clippy",
        "--all-targets",
        "--all-features",
        "--",
        "-D",
        "warnings",
    ]);
}

fn ci_test() {
    step("Test invocation_resource_core");
    run_cargo(&["test", "-p", "invocation_resource_core"]);

    step("Test invocation_resource_lambda");
    run_cargo(&["test", "-p", "invocation_resource_lambda"]);
}

// ── main ───────────────────────────────────────────────────────────

fn main() {
    let cli = Cli::parse();

    match cli.command {
        Commands::Ci { job } => match job {
            CiJob::Lint => ci_lint(),
            CiJob::Test => ci_test(),
            CiJob::Check => {
                ci_lint();
                ci_test();
            }
        },
        Commands::Package { target, profile } => package_cli(&target, profile),
    }
}
