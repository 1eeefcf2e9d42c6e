//! One linear pass: build the static tables, then write assembly-info
//! files, every nuspec (with its targets files), and the scripts.

use anyhow::{Context, Result};
use serde::Serialize;
use std::collections::HashSet;
use std::fs;
use std::path::{Path, PathBuf};

use crate::config::Projects;
use crate::env_mapping::EnvMapping;
use crate::nuspec::{self, SqlCipherBundleKind};
use crate::scripts;
use crate::version::VersionInfo;

/// Everything a generation pass needs, constructed once and passed
/// explicitly. The tables are read-only after this.
#[derive(Debug, Clone)]
pub struct GenContext {
    pub mapping: EnvMapping,
    pub projects: Projects,
    pub version: VersionInfo,
    pub root_dir: PathBuf,
    pub out_dir: PathBuf,
    /// Root of the native-binary build tree referenced by nuspec src
    /// attributes (the binaries themselves are not read).
    pub native_bin: PathBuf,
}

impl GenContext {
    pub fn new(
        root_dir: impl AsRef<Path>,
        out_dir: impl AsRef<Path>,
        native_bin: impl AsRef<Path>,
        version: VersionInfo,
    ) -> Self {
        Self {
            mapping: EnvMapping::new(),
            projects: Projects::init(),
            version,
            root_dir: root_dir.as_ref().to_path_buf(),
            out_dir: out_dir.as_ref().to_path_buf(),
            native_bin: native_bin.as_ref().to_path_buf(),
        }
    }
}

/// A generated package, as reported by `packgen list`.
#[derive(Debug, Clone, Serialize)]
pub struct PackageSummary {
    pub id: String,
    pub version: String,
}

pub fn package_summaries(ctx: &GenContext) -> Vec<PackageSummary> {
    let version = ctx.version.nuspec_version();
    let mut ids = vec![
        "SQLitePCLRaw.core".to_string(),
        "SQLitePCLRaw.ugly".to_string(),
        "SQLitePCLRaw.bundle_green".to_string(),
        "SQLitePCLRaw.bundle_e_sqlite3".to_string(),
        "SQLitePCLRaw.bundle_sqlcipher".to_string(),
        "SQLitePCLRaw.bundle_zetetic".to_string(),
        "SQLitePCLRaw.bundle_winsqlite3".to_string(),
    ];
    ids.extend(ctx.projects.in_area("lib").map(|cfg| cfg.id()));
    ids.extend(ctx.projects.native_libs.iter().map(|cfg| cfg.id()));
    ids.push("SQLitePCLRaw.lib.e_sqlite3.osx".to_string());
    ids.push("SQLitePCLRaw.lib.e_sqlite3.linux".to_string());
    ids.push("SQLitePCLRaw.lib.sqlcipher.windows".to_string());
    ids.push("SQLitePCLRaw.lib.sqlcipher.osx".to_string());
    ids.push("SQLitePCLRaw.lib.sqlcipher.linux".to_string());

    ids.into_iter()
        .map(|id| PackageSummary {
            id,
            version: version.clone(),
        })
        .collect()
}

/// Substitute the two placeholder tokens in the AssemblyInfo template,
/// once per distinct assembly.
fn gen_assembly_info(ctx: &GenContext) -> Result<Vec<PathBuf>> {
    let template_path = ctx.root_dir.join("templates").join("AssemblyInfo.cs");
    let template = fs::read_to_string(&template_path)
        .with_context(|| format!("Failed to read template {}", template_path.display()))?;

    let mut written = Vec::new();
    let mut seen = HashSet::new();
    for cfg in &ctx.projects.csproj {
        if !seen.insert(cfg.assembly_name.clone()) {
            continue;
        }
        let body = template
            .replace(
                "REPLACE_WITH_ASSEMBLY_NAME",
                &format!("\"{}\"", cfg.assembly_name),
            )
            .replace(
                "REPLACE_WITH_ASSEMBLY_VERSION",
                &format!("\"{}\"", ctx.version.assembly_version()),
            );

        let path = ctx
            .out_dir
            .join(format!("AssemblyInfo.{}.cs", cfg.assembly_name));
        fs::write(&path, body)
            .with_context(|| format!("Failed to write {}", path.display()))?;
        written.push(path);
    }
    Ok(written)
}

/// Generate the whole output set. Fails fast on the first unrecognized
/// enumeration value or filesystem error; partial output is never
/// acceptable, and regeneration is cheap.
pub fn generate_all(ctx: &GenContext) -> Result<Vec<PathBuf>> {
    fs::create_dir_all(&ctx.out_dir).with_context(|| {
        format!("Failed to create output directory {}", ctx.out_dir.display())
    })?;

    let mut written = Vec::new();

    written.extend(gen_assembly_info(ctx)?);

    written.push(nuspec::gen_nuspec_core(ctx)?);
    written.push(nuspec::gen_nuspec_ugly(ctx)?);
    written.push(nuspec::gen_nuspec_bundle_green(ctx)?);
    written.push(nuspec::gen_nuspec_bundle_e_sqlite3(ctx)?);
    written.push(nuspec::gen_nuspec_bundle_winsqlite3(ctx)?);
    written.push(nuspec::gen_nuspec_bundle_sqlcipher(ctx, SqlCipherBundleKind::Unofficial)?);
    written.push(nuspec::gen_nuspec_bundle_sqlcipher(ctx, SqlCipherBundleKind::Zetetic)?);

    for cfg in ctx.projects.in_area("lib") {
        written.push(nuspec::gen_nuspec_embedded(ctx, cfg)?);
    }

    for cfg in &ctx.projects.native_libs {
        written.push(nuspec::gen_nuspec_toolset_lib(ctx, cfg)?);
    }

    written.push(nuspec::gen_nuspec_e_sqlite3_platform(ctx, "osx")?);
    written.push(nuspec::gen_nuspec_e_sqlite3_platform(ctx, "linux")?);

    written.push(nuspec::gen_nuspec_sqlcipher_platform(ctx, "windows")?);
    written.push(nuspec::gen_nuspec_sqlcipher_platform(ctx, "osx")?);
    written.push(nuspec::gen_nuspec_sqlcipher_platform(ctx, "linux")?);

    written.push(scripts::gen_build_script(ctx)?);
    written.push(scripts::gen_pack_script(ctx)?);
    written.push(scripts::gen_push_script(ctx)?);

    Ok(written)
}
