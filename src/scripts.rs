//! Writes the build/pack/push PowerShell scripts: fixed sequences of
//! external tool invocations, one line per generated package.

use anyhow::{Context, Result};
use std::fmt::Write as _;
use std::path::PathBuf;

use crate::config::ROOT_NAME;
use crate::generate::GenContext;

const PUSH_SOURCE: &str = "https://www.nuget.org/api/v2/package";

// Packages that are always generated, in the order the scripts list them.
const FIXED_IDS: &[&str] = &[
    "core",
    "ugly",
    "bundle_green",
    "bundle_e_sqlite3",
    "bundle_sqlcipher",
    "bundle_zetetic",
    "bundle_winsqlite3",
    "lib.e_sqlite3.osx",
    "lib.e_sqlite3.linux",
    "lib.sqlcipher.windows",
    "lib.sqlcipher.osx",
    "lib.sqlcipher.linux",
];

fn package_ids(ctx: &GenContext) -> Vec<String> {
    let mut ids: Vec<String> = FIXED_IDS
        .iter()
        .map(|suffix| format!("{}.{}", ROOT_NAME, suffix))
        .collect();
    ids.extend(ctx.projects.in_area("lib").map(|cfg| cfg.id()));
    ids.extend(ctx.projects.native_libs.iter().map(|cfg| cfg.id()));
    ids
}

fn write_script(ctx: &GenContext, name: &str, body: String) -> Result<PathBuf> {
    let path = ctx.out_dir.join(name);
    std::fs::write(&path, body)
        .with_context(|| format!("Failed to write {}", path.display()))?;
    println!("Generated {}", path.display());
    Ok(path)
}

pub fn gen_build_script(ctx: &GenContext) -> Result<PathBuf> {
    let mut body = String::new();
    // the ancient PCL profile configs need an old nuget for restore
    body.push_str("../nuget_old.exe restore sqlitepcl.sln\n");
    body.push_str("msbuild /p:Configuration=Release sqlitepcl.sln\n");
    write_script(ctx, "build.ps1", body)
}

pub fn gen_pack_script(ctx: &GenContext) -> Result<PathBuf> {
    let mut body = String::new();
    for id in package_ids(ctx) {
        writeln!(body, "../nuget pack {}.nuspec", id).unwrap();
    }
    body.push_str("ls *.nupkg\n");
    write_script(ctx, "pack.ps1", body)
}

pub fn gen_push_script(ctx: &GenContext) -> Result<PathBuf> {
    let version = ctx.version.nuspec_version();
    let mut body = String::new();
    body.push_str("ls *.nupkg\n");
    for id in package_ids(ctx) {
        writeln!(
            body,
            "../nuget push -Source {} {}.{}.nupkg",
            PUSH_SOURCE, id, version
        )
        .unwrap();
    }
    write_script(ctx, "push.ps1", body)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::version::VersionInfo;
    use tempfile::TempDir;

    fn test_ctx(tmp: &TempDir) -> GenContext {
        let ctx = GenContext::new(
            tmp.path(),
            &tmp.path().join("bld"),
            "../cb/bld/bin",
            VersionInfo::prerelease_with_stamp("20190301120000"),
        );
        std::fs::create_dir_all(&ctx.out_dir).unwrap();
        ctx
    }

    #[test]
    fn test_pack_script_lists_every_package() {
        let tmp = TempDir::new().unwrap();
        let ctx = test_ctx(&tmp);

        let path = gen_pack_script(&ctx).unwrap();
        let body = std::fs::read_to_string(path).unwrap();

        assert!(body.contains("../nuget pack SQLitePCLRaw.core.nuspec\n"));
        assert!(body.contains("../nuget pack SQLitePCLRaw.bundle_zetetic.nuspec\n"));
        assert!(body.contains("../nuget pack SQLitePCLRaw.lib.e_sqlite3.v110_xp.nuspec\n"));
        assert!(body.contains("../nuget pack SQLitePCLRaw.lib.sqlcipher.ios_unified.static.nuspec\n"));
        assert!(body.ends_with("ls *.nupkg\n"));
    }

    #[test]
    fn test_push_script_names_versioned_nupkgs() {
        let tmp = TempDir::new().unwrap();
        let ctx = test_ctx(&tmp);

        let path = gen_push_script(&ctx).unwrap();
        let body = std::fs::read_to_string(path).unwrap();

        assert!(body.starts_with("ls *.nupkg\n"));
        assert!(body.contains(
            "../nuget push -Source https://www.nuget.org/api/v2/package SQLitePCLRaw.core.1.1.14-pre20190301120000.nupkg\n"
        ));
    }

    #[test]
    fn test_build_script_is_fixed() {
        let tmp = TempDir::new().unwrap();
        let ctx = test_ctx(&tmp);

        let path = gen_build_script(&ctx).unwrap();
        let body = std::fs::read_to_string(path).unwrap();

        assert_eq!(
            body,
            "../nuget_old.exe restore sqlitepcl.sln\nmsbuild /p:Configuration=Release sqlitepcl.sln\n"
        );
    }
}
