use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use std::path::PathBuf;

use crate::env_mapping::EnvMapping;
use crate::generate::{self, GenContext};
use crate::version::VersionInfo;

#[derive(Parser)]
#[command(name = "packgen")]
#[command(about = "A deterministic generator of NuGet manifests, MSBuild targets, and packaging scripts")]
#[command(version = "0.1.0")]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Generate all nuspecs, targets files, and scripts
    Gen {
        /// Project root (where templates/AssemblyInfo.cs lives)
        #[arg(long, default_value = ".")]
        root: PathBuf,

        /// Output directory
        #[arg(long, default_value = "bld")]
        out: PathBuf,

        /// Root of the native binary build tree referenced by nuspecs
        #[arg(long, default_value = "../cb/bld/bin")]
        native_bin: PathBuf,

        /// Stamp a release version instead of a prerelease
        #[arg(long)]
        release: bool,

        /// Override the prerelease timestamp (yyyyMMddHHmmss) for
        /// reproducible output
        #[arg(long)]
        stamp: Option<String>,
    },

    /// List the packages that would be generated
    List {
        /// Emit JSON for tooling
        #[arg(long)]
        json: bool,
    },

    /// Check system requirements and configuration
    Doctor,
}

pub fn run_cli() -> Result<()> {
    let cli = Cli::parse();

    match cli.command {
        Commands::Gen {
            root,
            out,
            native_bin,
            release,
            stamp,
        } => gen_command(root, out, native_bin, release, stamp),
        Commands::List { json } => list_command(json),
        Commands::Doctor => doctor_command(),
    }
}

fn make_version(release: bool, stamp: Option<String>) -> Result<VersionInfo> {
    if release {
        if stamp.is_some() {
            return Err(anyhow::anyhow!("--stamp only applies to prerelease versions"));
        }
        return Ok(VersionInfo::release());
    }
    Ok(match stamp {
        Some(stamp) => VersionInfo::prerelease_with_stamp(&stamp),
        None => VersionInfo::prerelease(),
    })
}

fn gen_command(
    root: PathBuf,
    out: PathBuf,
    native_bin: PathBuf,
    release: bool,
    stamp: Option<String>,
) -> Result<()> {
    let version = make_version(release, stamp)?;
    println!("Generating package set {}", version.nuspec_version());

    let ctx = GenContext::new(&root, &out, &native_bin, version);
    let written = generate::generate_all(&ctx).context("Failed to generate package set")?;

    println!("\nWrote {} files to {}", written.len(), ctx.out_dir.display());
    Ok(())
}

fn list_command(json: bool) -> Result<()> {
    let ctx = GenContext::new(".", "bld", "../cb/bld/bin", VersionInfo::release());
    let summaries = generate::package_summaries(&ctx);

    if json {
        let out = serde_json::to_string_pretty(&summaries)
            .context("Failed to serialize package list")?;
        println!("{}", out);
    } else {
        for summary in &summaries {
            println!("{} {}", summary.id, summary.version);
        }
    }
    Ok(())
}

fn doctor_command() -> Result<()> {
    println!("packgen doctor - checking packaging tools...\n");

    check_command_available("nuget", "NuGet CLI (pack/push)");
    check_command_available("msbuild", "MSBuild (solution build)");

    let mapping = EnvMapping::new();
    let envs = mapping.supported_envs();
    println!("\nEnvironment mapping support:");
    println!("  Supported environments: {}", envs.len());
    for env in envs.iter().take(5) {
        if let Ok(tfm) = mapping.framework_moniker(env) {
            println!("    {} -> {}", env, tfm);
        }
    }
    if envs.len() > 5 {
        println!("    ... and {} more", envs.len() - 5);
    }

    println!("\n✓ packgen doctor check complete");
    Ok(())
}

fn check_command_available(command: &str, description: &str) {
    match which::which(command) {
        Ok(path) => println!("✓ {} found at: {}", description, path.display()),
        Err(_) => {
            // the generator itself never runs these, so a missing tool is
            // a warning rather than an error
            println!("✗ {} not found ({})", description, command);
        }
    }
}
