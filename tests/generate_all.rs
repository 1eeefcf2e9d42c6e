//! End-to-end tests over the full generation pass.

use std::collections::BTreeMap;
use std::fs;
use std::path::Path;

use tempfile::TempDir;

use packgen::generate::{self, GenContext};
use packgen::version::VersionInfo;

const TEMPLATE: &str = "[assembly: AssemblyTitle(REPLACE_WITH_ASSEMBLY_NAME)]\n[assembly: AssemblyVersion(REPLACE_WITH_ASSEMBLY_VERSION)]\n";

fn make_ctx(tmp: &TempDir, out_name: &str, version: VersionInfo) -> GenContext {
    let templates = tmp.path().join("templates");
    fs::create_dir_all(&templates).unwrap();
    fs::write(templates.join("AssemblyInfo.cs"), TEMPLATE).unwrap();
    GenContext::new(
        tmp.path(),
        &tmp.path().join(out_name),
        "../cb/bld/bin",
        version,
    )
}

fn snapshot(dir: &Path) -> BTreeMap<String, Vec<u8>> {
    let mut out = BTreeMap::new();
    collect(dir, dir, &mut out);
    out
}

fn collect(root: &Path, dir: &Path, out: &mut BTreeMap<String, Vec<u8>>) {
    for entry in fs::read_dir(dir).unwrap() {
        let entry = entry.unwrap();
        let path = entry.path();
        if path.is_dir() {
            collect(root, &path, out);
        } else {
            let rel = path.strip_prefix(root).unwrap().to_string_lossy().into_owned();
            out.insert(rel, fs::read(&path).unwrap());
        }
    }
}

#[test]
fn regeneration_is_byte_for_byte_idempotent() {
    let tmp = TempDir::new().unwrap();
    let version = VersionInfo::prerelease_with_stamp("20190301120000");

    let ctx_a = make_ctx(&tmp, "bld_a", version.clone());
    generate::generate_all(&ctx_a).unwrap();

    let ctx_b = make_ctx(&tmp, "bld_b", version);
    generate::generate_all(&ctx_b).unwrap();

    let a = snapshot(&ctx_a.out_dir);
    let b = snapshot(&ctx_b.out_dir);
    assert!(!a.is_empty());
    assert_eq!(a, b);
}

#[test]
fn net45_resolves_to_the_win_family_native_package() {
    let tmp = TempDir::new().unwrap();
    let ctx = make_ctx(&tmp, "bld", VersionInfo::release());
    generate::generate_all(&ctx).unwrap();

    // net45 -> toolset v110_xp -> RID prefix "win"
    assert_eq!(ctx.mapping.toolset("net45").unwrap(), "v110_xp");
    assert_eq!(ctx.mapping.rid_prefix("v110_xp").unwrap(), "win");

    // and that package's manifest carries both win-x86 and win-x64 entries
    let nuspec = fs::read_to_string(
        ctx.out_dir.join("SQLitePCLRaw.lib.e_sqlite3.v110_xp.nuspec"),
    )
    .unwrap();
    assert!(nuspec.contains("runtimes\\win-x86\\native\\"));
    assert!(nuspec.contains("runtimes\\win-x64\\native\\"));
}

#[test]
fn bundle_dependency_groups_follow_the_os_family_table() {
    let tmp = TempDir::new().unwrap();
    let ctx = make_ctx(&tmp, "bld", VersionInfo::release());
    generate::generate_all(&ctx).unwrap();

    let bundle = fs::read_to_string(ctx.out_dir.join("SQLitePCLRaw.bundle_e_sqlite3.nuspec")).unwrap();

    // desktop group: core plus the resolved native-library packages
    let net45_group = bundle
        .split("<group ")
        .find(|g| g.starts_with("targetFramework=\"net45\""))
        .unwrap();
    assert!(net45_group.contains("id=\"SQLitePCLRaw.core\""));
    assert!(net45_group.contains("id=\"SQLitePCLRaw.lib.e_sqlite3.v110_xp\""));

    // mobile groups name a different sub-package per OS family
    let android_group = bundle
        .split("<group ")
        .find(|g| g.starts_with("targetFramework=\"MonoAndroid\""))
        .unwrap();
    assert!(android_group.contains("id=\"SQLitePCLRaw.lib.e_sqlite3.android\""));

    let ios_group = bundle
        .split("<group ")
        .find(|g| g.starts_with("targetFramework=\"Xamarin.iOS10\""))
        .unwrap();
    assert!(ios_group.contains("id=\"SQLitePCLRaw.lib.e_sqlite3.ios_unified.static\""));
}

#[test]
fn every_generated_targets_file_is_referenced_by_a_nuspec() {
    let tmp = TempDir::new().unwrap();
    let ctx = make_ctx(&tmp, "bld", VersionInfo::release());
    generate::generate_all(&ctx).unwrap();

    let mut nuspec_text = String::new();
    for entry in fs::read_dir(&ctx.out_dir).unwrap() {
        let path = entry.unwrap().path();
        if path.extension().is_some_and(|e| e == "nuspec") {
            nuspec_text.push_str(&fs::read_to_string(&path).unwrap());
        }
    }

    for entry in fs::read_dir(&ctx.out_dir).unwrap() {
        let path = entry.unwrap().path();
        let name = path.file_name().unwrap().to_string_lossy().into_owned();
        if name.ends_with(".targets") {
            assert!(
                nuspec_text.contains(&format!("src=\"{}\"", name)),
                "orphaned targets file: {}",
                name
            );
        }
    }
}

#[test]
fn scripts_cover_every_nuspec() {
    let tmp = TempDir::new().unwrap();
    let ctx = make_ctx(&tmp, "bld", VersionInfo::release());
    generate::generate_all(&ctx).unwrap();

    let pack = fs::read_to_string(ctx.out_dir.join("pack.ps1")).unwrap();
    let push = fs::read_to_string(ctx.out_dir.join("push.ps1")).unwrap();

    for entry in fs::read_dir(&ctx.out_dir).unwrap() {
        let path = entry.unwrap().path();
        let name = path.file_name().unwrap().to_string_lossy().into_owned();
        if let Some(id) = name.strip_suffix(".nuspec") {
            assert!(pack.contains(&format!("../nuget pack {}.nuspec", id)), "{}", id);
            assert!(push.contains(&format!("{}.1.1.14.nupkg", id)), "{}", id);
        }
    }
}
