//! macho-uuid - Read the UUIDs of Apple binaries and debug symbols
//!
//! Usage:
//!   macho-uuid <path>                  Print uuid, cpu and path per image
//!   macho-uuid <path> --formatted      Print dashed uppercase UUIDs
//!   macho-uuid <path> --extract <dir>  Also write each image to <dir>

use std::fs;
use std::path::{Path, PathBuf};
use std::process::ExitCode;

use anyhow::{Context, Result};
use clap::{ArgAction, Parser};
use macho_uuid::{resolve_macho_files, MachoMember};
use tracing::info;
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(name = "macho-uuid", version)]
#[command(
    about = "Read the UUID of a .app, .dSYM, .framework, .xcarchive or macOS binary file",
    long_about = None
)]
struct Cli {
    /// Path to a .app, .dSYM, .framework, .bundle, .xcarchive, .dylib or binary file
    path: PathBuf,

    /// Print UUIDs dashed and uppercase
    #[arg(short, long)]
    formatted: bool,

    /// Write each resolved image to this directory as a standalone file
    #[arg(short, long, value_name = "DIR")]
    extract: Option<PathBuf>,

    /// Increase log verbosity (-v for debug, -vv for trace)
    #[arg(short, long, action = ArgAction::Count)]
    verbose: u8,
}

fn main() -> ExitCode {
    let cli = Cli::parse();
    init_tracing(cli.verbose);

    match run(&cli) {
        Ok(()) => ExitCode::SUCCESS,
        Err(err) => {
            eprintln!("{err:#}");
            ExitCode::FAILURE
        }
    }
}

fn init_tracing(verbose: u8) {
    let default = match verbose {
        0 => "warn",
        1 => "debug",
        _ => "trace",
    };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .without_time()
        .init();
}

fn run(cli: &Cli) -> Result<()> {
    let members = resolve_macho_files(&cli.path)?;

    if let Some(dir) = &cli.extract {
        fs::create_dir_all(dir)
            .with_context(|| format!("Failed to create directory: {}", dir.display()))?;
    }

    for member in &members {
        print_member(member, cli.formatted)?;
        if let Some(dir) = &cli.extract {
            extract_member(member, dir)?;
        }
    }

    Ok(())
}

fn print_member(member: &MachoMember, formatted: bool) -> Result<()> {
    let uuid = if formatted {
        member.uuid_formatted()?.unwrap_or_default()
    } else {
        member.uuid_hex()?
    };
    let cpu = member.cpu_type()?;
    let path = member
        .path()
        .map(|p| p.display().to_string())
        .unwrap_or_default();

    println!("{uuid} {cpu} {path}");
    Ok(())
}

fn extract_member(member: &MachoMember, dir: &Path) -> Result<()> {
    let name = member
        .path()
        .and_then(Path::file_name)
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_else(|| "macho".to_string());
    let output = dir.join(format!("{}-{}", member.uuid_hex()?, name));

    member
        .write_file(&output)
        .with_context(|| format!("Failed to write {}", output.display()))?;
    info!(output = %output.display(), size = member.size(), "extracted member");
    Ok(())
}
