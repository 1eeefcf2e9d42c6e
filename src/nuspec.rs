//! Assembles one nuspec document per package: fixed metadata, dependency
//! groups keyed by framework moniker, and an ordered file-entry list
//! built from the static project tables.

use anyhow::{Context, Result};
use std::fs;
use std::path::{Path, PathBuf};

use crate::config::{NativeLibConfig, ProjectConfig, ROOT_NAME};
use crate::env_mapping::MappingError;
use crate::generate::GenContext;
use crate::targets;
use crate::xml::{Document, Element};

const PROJECT_URL: &str = "https://github.com/ericsink/SQLitePCL.raw";
const COPYRIGHT: &str = "Copyright 2014-2019 Zumero, LLC";
const PCL_SUMMARY: &str =
    "A Portable Class Library (PCL) for low-level (raw) access to SQLite";
const BUNDLE_SUMMARY: &str =
    "Batteries-included package to bring in SQLitePCL.raw and dependencies";
const NATIVE_DESCRIPTION: &str = "This package contains a platform-specific native code build of SQLite for use with SQLitePCL.raw.  To use this, you need SQLitePCLRaw.core as well as SQLitePCLRaw.provider.e_sqlite3.net45 or similar.  Convenience packages are named SQLitePCLRaw.bundle_*.";
const BUNDLE_TAGS: &str = "sqlite pcl database monotouch ios monodroid android wp8 wpa";

const RELEASE_NOTES: &str = "1.1.13:  fix problems with unofficial sqlcipher builds for Android and iOS.  use new license tag for nuspecs.  1.1.12:  update e_sqlite3 builds to 3.26.0.  bug fix for bundle_zetetic on iOS.  1.1.11:  put a copy of alpine-x64/e_sqlite3 into linux-musl-x64, for .NET Core 2.1.  1.1.10:  improve bundle_zetetic.  update e_sqlite3 to 3.22.0 and turn on FTS5.  fix bundled sqlcipher build for UWP.  AssemblyVersion now being updated properly.  attempt fix crash involving CLR finalizer.  add e_sqlite3 builds for linux-arm64 and alpine-x64.  change generic Windows builds to use win-foo instead of win7-foo.  add support for SQLITE_DETERMINISTIC.  added sqlite3_blob_open overload to support higher perf in certain cases.  fix problem with Mac-but-not-Xamarin and targets file.   1.1.9:  bug fixes for Xamarin.Mac.  add a sqlcipher build for UWP.  1.1.8:  SQLite builds for .NET Core ARM, linux and Windows IoT.  Finalizers.  Fix Xam.Mac issue with bundle_green.  Fix edge case in one of the sqlite3_column_blob() overloads.  New 'bundle_zetetic' for use with official SQLCipher builds from Zetetic.  1.1.7:  Drop SQLite down to 3.18.2.  1.1.6:  AssetTargetFallback fixes.  update sqlite builds to 3.19.3.  1.1.5:  bug fix path in lib.foo.linux targets file.  1.1.4:  tweak use of nuget .targets files for compat with .NET Core.  1.1.3:  add SQLITE_CHECKPOINT_TRUNCATE symbol definition.  add new blob overloads to enable better performance in certain cases.  chg winsqlite3 to use StdCall.  fix targets files for better compat with VS 2017 nuget pack.  add 32-bit linux build for e_sqlite3.  update to latest libcrypto builds from couchbase folks.  1.1.2:  ability to FreezeProvider().  update e_sqlite3 builds to 3.16.1.  1.1.1:  add support for config_log.  update e_sqlite3 builds to 3.15.2.  fix possible memory corruption when using prepare_v2() with multiple statements.  better errmsg from ugly.step().  add win8 dep groups in bundles.  fix batteries_v2.Init() to be 'last call wins' like the v1 version is.  chg raw.SetProvider() to avoid calling sqlite3_initialize() so that sqlite3_config() can be used.  better support for Xamarin.Mac.  1.1.0:  fix problem with winsqlite3 on UWP.  remove iOS Classic support.  add sqlite3_enable_load_extension.  add sqlite3_config/initialize/shutdown.  add Batteries_V2.Init().  1.0.1:  fix problem with bundle_e_sqlite3 on iOS.  fix issues with .NET Core.  add bundle_sqlcipher.  1.0.0 release:  Contains minor breaking changes since 0.9.x.  All package names now begin with SQLitePCLRaw.  Now supports netstandard.  Fixes for UWP and Android N.  Change all unit tests to xunit.  Support for winsqlite3.dll and custom SQLite builds.";

struct Metadata<'a> {
    id: &'a str,
    title: &'a str,
    description: &'a str,
    authors: &'a str,
    summary: &'a str,
    tags: &'a str,
    min_client_version: &'a str,
}

fn metadata_element(ctx: &GenContext, m: &Metadata) -> Element {
    Element::new("metadata")
        .attr("minClientVersion", m.min_client_version)
        .text_element("id", m.id)
        .text_element("version", &ctx.version.nuspec_version())
        .text_element("title", m.title)
        .text_element("description", m.description)
        .text_element("authors", m.authors)
        .text_element("owners", "Eric Sink")
        .text_element("copyright", COPYRIGHT)
        .text_element("requireLicenseAcceptance", "false")
        .child(Element::new("license").attr("type", "expression").text("Apache-2.0"))
        .text_element("projectUrl", PROJECT_URL)
        .text_element("releaseNotes", RELEASE_NOTES)
        .text_element("summary", m.summary)
        .text_element("tags", m.tags)
}

fn package_root() -> Element {
    Element::new("package").attr(
        "xmlns",
        "http://schemas.microsoft.com/packaging/2010/07/nuspec.xsd",
    )
}

fn dependency(id: &str, version: &str) -> Element {
    Element::new("dependency").attr("id", id).attr("version", version)
}

fn dep_core(ctx: &GenContext) -> Element {
    dependency(
        &format!("{}.core", ROOT_NAME),
        &ctx.version.nuspec_version(),
    )
}

fn dep_netstandard() -> Element {
    dependency("NETStandard.Library", "1.6.0")
}

/// A plain dependency group: framework moniker plus, optionally, the core
/// package. `env = None` is the fallback group with no targetFramework.
fn dep_group(ctx: &GenContext, env: Option<&str>, with_core: bool) -> Result<Element> {
    let mut group = Element::new("group");
    if let Some(env) = env {
        group = group.attr("targetFramework", ctx.mapping.framework_moniker(env)?);
        // these frameworks also need the netstandard base library
        if env == "uwp10" || env == "netstandard11" {
            group = group.child(dep_netstandard());
        }
    }
    if with_core {
        group = group.child(dep_core(ctx));
    }
    Ok(group)
}

/// A bundle dependency group: core, the provider for the wrapped engine,
/// and (when the bundle carries native libs) the native-library
/// sub-package resolved from the OS-family table.
///
/// `env_target` names the group's framework moniker; `env_deps` names the
/// env the dependencies are resolved for. They differ only for
/// netcoreapp, which resolves deps as netstandard11.
fn bundle_dep_group(
    ctx: &GenContext,
    env_target: &str,
    env_deps: &str,
    what: &str,
    lib: bool,
) -> Result<Element> {
    let version = ctx.version.nuspec_version();
    let mut group = Element::new("group")
        .attr("targetFramework", ctx.mapping.framework_moniker(env_target)?)
        .child(dep_core(ctx));

    // iOS and watchOS use an "internal" provider for everything except
    // the system SQLite.
    let provider = if (env_deps == "ios_unified" || env_deps == "watchos") && what != "sqlite3" {
        format!("{}.provider.internal.{}", ROOT_NAME, env_deps)
    } else {
        format!("{}.provider.{}.{}", ROOT_NAME, what, env_deps)
    };
    group = group.child(dependency(&provider, &version));

    if lib {
        match what {
            "e_sqlite3" => match env_deps {
                "android" => {
                    group = group
                        .child(dependency(&format!("{}.lib.e_sqlite3.android", ROOT_NAME), &version));
                }
                "macos" => {
                    group = group
                        .child(dependency(&format!("{}.lib.e_sqlite3.osx", ROOT_NAME), &version));
                }
                "ios_unified" | "watchos" => {
                    group = group.child(dependency(
                        &format!("{}.lib.e_sqlite3.{}.static", ROOT_NAME, env_deps),
                        &version,
                    ));
                }
                // netstandard11 is also used for netcoreapp, so the
                // desktop trio covers it
                "net35" | "net40" | "net45" | "netstandard11" => {
                    group = group
                        .child(dependency(&format!("{}.lib.e_sqlite3.v110_xp", ROOT_NAME), &version))
                        .child(dependency(&format!("{}.lib.e_sqlite3.osx", ROOT_NAME), &version))
                        .child(dependency(&format!("{}.lib.e_sqlite3.linux", ROOT_NAME), &version));
                }
                _ => {
                    group = group.child(dependency(
                        &format!(
                            "{}.lib.e_sqlite3.{}",
                            ROOT_NAME,
                            ctx.mapping.toolset(env_deps)?
                        ),
                        &version,
                    ));
                }
            },
            "sqlcipher" => match env_deps {
                "android" => {
                    group = group
                        .child(dependency(&format!("{}.lib.sqlcipher.android", ROOT_NAME), &version));
                }
                "macos" => {
                    group = group
                        .child(dependency(&format!("{}.lib.sqlcipher.osx", ROOT_NAME), &version));
                }
                "ios_unified" | "watchos" => {
                    group = group.child(dependency(
                        &format!("{}.lib.sqlcipher.{}.static", ROOT_NAME, env_deps),
                        &version,
                    ));
                }
                "net35" | "net40" | "net45" | "netstandard11" => {
                    group = group
                        .child(dependency(&format!("{}.lib.sqlcipher.windows", ROOT_NAME), &version))
                        .child(dependency(&format!("{}.lib.sqlcipher.osx", ROOT_NAME), &version))
                        .child(dependency(&format!("{}.lib.sqlcipher.linux", ROOT_NAME), &version));
                }
                "uwp10" => {
                    group = group
                        .child(dependency(&format!("{}.lib.sqlcipher.windows", ROOT_NAME), &version));
                }
                _ => {
                    group = group.child(dependency(
                        &format!(
                            "{}.lib.sqlcipher.{}",
                            ROOT_NAME,
                            ctx.mapping.toolset(env_deps)?
                        ),
                        &version,
                    ));
                }
            },
            _ => {}
        }
    }

    Ok(group)
}

/// Append a project's products to a nuspec file list, preceded by a
/// comment naming the project.
fn push_file_entries(ctx: &GenContext, files: &mut Element, cfg: &ProjectConfig) -> Result<()> {
    // the assembly may be built with one env's settings and dropped into
    // another env's spot in the package
    let target_env = cfg
        .nuget_override_target_env
        .as_deref()
        .unwrap_or(&cfg.env);

    let target = if cfg.env == "wp80" {
        format!("build\\wp80\\{}\\", cfg.cpu)
    } else {
        ctx.mapping.nuget_target_path(target_env)?
    };

    files.push_comment(&cfg.name);
    for product in cfg.products() {
        files.push(Element::new("file").attr("src", &product).attr("target", &target));
    }
    Ok(())
}

/// An empty directory under lib to keep nuget from adding a reference
/// for this framework.
fn push_empty_lib(ctx: &GenContext, files: &mut Element, tfm: &str) -> Result<()> {
    let dir = ctx.out_dir.join("empty").join(tfm);
    fs::create_dir_all(&dir)
        .with_context(|| format!("Failed to create placeholder directory {}", dir.display()))?;

    files.push_comment("empty directory in lib to avoid nuget adding a reference");
    files.push(
        Element::new("file")
            .attr("src", &format!("empty\\{}\\", tfm))
            .attr("target", &format!("lib\\{}", tfm)),
    );
    Ok(())
}

fn write_doc(out_dir: &Path, name: &str, root: Element) -> Result<PathBuf> {
    let path = out_dir.join(name);
    fs::write(&path, Document::new(root).to_xml())
        .with_context(|| format!("Failed to write {}", path.display()))?;
    println!("Generated {}", path.display());
    Ok(path)
}

pub fn gen_nuspec_core(ctx: &GenContext) -> Result<PathBuf> {
    let id = format!("{}.core", ROOT_NAME);

    let mut deps = Element::new("dependencies");
    for env in [
        "android",
        "ios_unified",
        "macos",
        "net35",
        "net40",
        "net45",
        "win81",
        "wpa81",
        "wp80",
        "uwp10",
        "profile111",
        "profile136",
        "profile259",
        "netstandard11",
    ] {
        deps.push(dep_group(ctx, Some(env), false)?);
    }
    deps.push(dep_group(ctx, None, false)?);

    let mut files = Element::new("files");
    for cfg in ctx.projects.in_area("core") {
        push_file_entries(ctx, &mut files, cfg)?;
    }

    let root = package_root()
        .child(
            metadata_element(
                ctx,
                &Metadata {
                    id: &id,
                    title: &id,
                    description: "SQLitePCL.raw is a Portable Class Library (PCL) for low-level (raw) access to SQLite.  This package does not provide an API which is friendly to app developers.  Rather, it provides an API which handles platform and configuration issues, upon which a friendlier API can be built.  In order to use this package, you will need to also add one of the SQLitePCLRaw.provider.* packages and call raw.SetProvider().  Convenience packages are named SQLitePCLRaw.bundle_*.",
                    authors: "Eric Sink, et al",
                    summary: PCL_SUMMARY,
                    tags: "sqlite pcl database xamarin monotouch ios monodroid android wp8 wpa netstandard uwp",
                    min_client_version: "2.8.1",
                },
            )
            .child(deps),
        )
        .child(files);

    write_doc(&ctx.out_dir, &format!("{}.nuspec", id), root)
}

pub fn gen_nuspec_ugly(ctx: &GenContext) -> Result<PathBuf> {
    let id = format!("{}.ugly", ROOT_NAME);

    let mut deps = Element::new("dependencies");
    for env in [
        "android",
        "ios_unified",
        "macos",
        "net35",
        "net40",
        "net45",
        "win81",
        "wpa81",
        "wp80",
        "uwp10",
        "profile111",
        "profile136",
        "profile259",
        "netstandard11",
    ] {
        deps.push(dep_group(ctx, Some(env), true)?);
    }
    deps.push(dep_group(ctx, None, true)?);

    let mut files = Element::new("files");
    for cfg in ctx.projects.in_area("ugly") {
        push_file_entries(ctx, &mut files, cfg)?;
    }

    let root = package_root()
        .child(
            metadata_element(
                ctx,
                &Metadata {
                    id: &id,
                    title: &id,
                    description: "These extension methods for SQLitePCL.raw provide a more usable API while remaining stylistically similar to the sqlite3 C API, which most C# developers would consider 'ugly'.  This package exists for people who (1) really like the sqlite3 C API, and (2) really like C#.  So far, evidence suggests that 100% of the people matching both criteria are named Eric Sink, but this package is available just in case he is not the only one of his kind.",
                    authors: "Eric Sink",
                    summary: "Extension methods for SQLitePCLRaw, providing an ugly-but-usable API",
                    tags: BUNDLE_TAGS,
                    min_client_version: "2.5",
                },
            )
            .child(deps),
        )
        .child(files);

    write_doc(&ctx.out_dir, &format!("{}.nuspec", id), root)
}

fn bundle_metadata<'a>(id: &'a str, description: &'a str) -> Metadata<'a> {
    Metadata {
        id,
        title: id,
        description,
        authors: "Eric Sink",
        summary: BUNDLE_SUMMARY,
        tags: BUNDLE_TAGS,
        min_client_version: "2.5",
    }
}

fn bundle_files(ctx: &GenContext, area: &str, include_wp80: bool) -> Result<Element> {
    let mut files = Element::new("files");
    for cfg in ctx.projects.in_area(area) {
        if !include_wp80 && cfg.env == "wp80" {
            continue;
        }
        push_file_entries(ctx, &mut files, cfg)?;
    }
    Ok(files)
}

pub fn gen_nuspec_bundle_green(ctx: &GenContext) -> Result<PathBuf> {
    let id = format!("{}.bundle_green", ROOT_NAME);

    let mut deps = Element::new("dependencies");
    deps.push(bundle_dep_group(ctx, "android", "android", "e_sqlite3", true)?);
    // green policy: iOS rides the system SQLite
    deps.push(bundle_dep_group(ctx, "ios_unified", "ios_unified", "sqlite3", true)?);
    deps.push(bundle_dep_group(ctx, "macos", "macos", "e_sqlite3", true)?);
    deps.push(bundle_dep_group(ctx, "wpa81", "wpa81", "e_sqlite3", true)?);
    deps.push(bundle_dep_group(ctx, "wp80", "wp80", "e_sqlite3", true)?);
    deps.push(bundle_dep_group(ctx, "win8", "win8", "e_sqlite3", true)?);
    deps.push(bundle_dep_group(ctx, "win81", "win81", "e_sqlite3", true)?);
    deps.push(bundle_dep_group(ctx, "uwp10", "uwp10", "e_sqlite3", true)?);
    deps.push(bundle_dep_group(ctx, "net35", "net35", "e_sqlite3", true)?);
    deps.push(bundle_dep_group(ctx, "net40", "net40", "e_sqlite3", true)?);
    deps.push(bundle_dep_group(ctx, "net45", "net45", "e_sqlite3", true)?);
    deps.push(bundle_dep_group(ctx, "netcoreapp", "netstandard11", "e_sqlite3", true)?);
    for env in ["profile111", "profile136", "profile259", "netstandard11"] {
        deps.push(dep_group(ctx, Some(env), true)?);
    }
    deps.push(dep_group(ctx, None, true)?);

    let root = package_root()
        .child(
            metadata_element(
                ctx,
                &bundle_metadata(
                    &id,
                    "This 'batteries-included' bundle brings in SQLitePCLRaw.core and the necessary stuff for certain common use cases.  Call SQLitePCL.Batteries.Init().  Policy of this bundle: iOS=system SQLite, others=e_sqlite3 included",
                ),
            )
            .child(deps),
        )
        .child(bundle_files(ctx, "batteries_green", false)?);

    write_doc(&ctx.out_dir, &format!("{}.nuspec", id), root)
}

pub fn gen_nuspec_bundle_e_sqlite3(ctx: &GenContext) -> Result<PathBuf> {
    let id = format!("{}.bundle_e_sqlite3", ROOT_NAME);

    let mut deps = Element::new("dependencies");
    for env in [
        "android",
        "ios_unified",
        "macos",
        "wpa81",
        "wp80",
        "win8",
        "win81",
        "uwp10",
        "net35",
        "net40",
        "net45",
    ] {
        deps.push(bundle_dep_group(ctx, env, env, "e_sqlite3", true)?);
    }
    deps.push(bundle_dep_group(ctx, "netcoreapp", "netstandard11", "e_sqlite3", true)?);
    for env in ["profile111", "profile136", "profile259", "netstandard11"] {
        deps.push(dep_group(ctx, Some(env), true)?);
    }
    deps.push(dep_group(ctx, None, true)?);

    let root = package_root()
        .child(
            metadata_element(
                ctx,
                &bundle_metadata(
                    &id,
                    "This 'batteries-included' bundle brings in SQLitePCLRaw.core and the necessary stuff for certain common use cases.  Call SQLitePCL.Batteries.Init().  Policy of this bundle: e_sqlite3 included",
                ),
            )
            .child(deps),
        )
        .child(bundle_files(ctx, "batteries_e_sqlite3", false)?);

    write_doc(&ctx.out_dir, &format!("{}.nuspec", id), root)
}

pub fn gen_nuspec_bundle_winsqlite3(ctx: &GenContext) -> Result<PathBuf> {
    let id = format!("{}.bundle_winsqlite3", ROOT_NAME);

    let deps = Element::new("dependencies").child(
        Element::new("group")
            .attr("targetFramework", ctx.mapping.framework_moniker("uwp10")?)
            .child(dep_core(ctx))
            .child(dependency(
                &format!("{}.provider.winsqlite3.uwp10", ROOT_NAME),
                &ctx.version.nuspec_version(),
            )),
    );

    let root = package_root()
        .child(
            metadata_element(
                ctx,
                &bundle_metadata(
                    &id,
                    "This 'batteries-included' bundle brings in SQLitePCLRaw.core and the necessary stuff for certain common use cases.  Call SQLitePCL.Batteries.Init().  Policy of this bundle: .no SQLite library included, uses winsqlite3.dll",
                ),
            )
            .child(deps),
        )
        .child(bundle_files(ctx, "batteries_winsqlite3", false)?);

    write_doc(&ctx.out_dir, &format!("{}.nuspec", id), root)
}

/// The two sqlcipher bundle flavors: the unofficial builds carry native
/// lib dependencies; the Zetetic flavor references the official builds,
/// which are not packaged here.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SqlCipherBundleKind {
    Unofficial,
    Zetetic,
}

pub fn gen_nuspec_bundle_sqlcipher(ctx: &GenContext, kind: SqlCipherBundleKind) -> Result<PathBuf> {
    let id = match kind {
        SqlCipherBundleKind::Unofficial => format!("{}.bundle_sqlcipher", ROOT_NAME),
        SqlCipherBundleKind::Zetetic => format!("{}.bundle_zetetic", ROOT_NAME),
    };
    let description = match kind {
        SqlCipherBundleKind::Unofficial => "This 'batteries-included' bundle brings in SQLitePCLRaw.core and the necessary stuff for certain common use cases.  Call SQLitePCL.Batteries.Init().  Policy of this bundle: unofficial open source sqlcipher builds included.  Note that these sqlcipher builds are unofficial and unsupported.  For official sqlcipher builds, contact Zetetic.",
        SqlCipherBundleKind::Zetetic => "This 'batteries-included' bundle brings in SQLitePCLRaw.core and the necessary stuff for certain common use cases.  Call SQLitePCL.Batteries.Init().  Policy of this bundle: reference the official SQLCipher builds from Zetetic, which are not included in this package",
    };
    let lib_deps = kind == SqlCipherBundleKind::Unofficial;

    let mut deps = Element::new("dependencies");
    for env in ["android", "ios_unified", "macos", "net35", "net40", "net45"] {
        deps.push(bundle_dep_group(ctx, env, env, "sqlcipher", lib_deps)?);
    }
    deps.push(bundle_dep_group(ctx, "netcoreapp", "netstandard11", "sqlcipher", lib_deps)?);
    deps.push(bundle_dep_group(ctx, "wpa81", "wpa81", "sqlcipher", lib_deps)?);
    deps.push(bundle_dep_group(ctx, "win8", "win8", "sqlcipher", lib_deps)?);
    deps.push(bundle_dep_group(ctx, "win81", "win81", "sqlcipher", lib_deps)?);
    // the uwp10 group keeps its lib dependency in both flavors
    deps.push(bundle_dep_group(ctx, "uwp10", "uwp10", "sqlcipher", true)?);
    for env in ["profile111", "profile136", "profile259", "netstandard11"] {
        deps.push(dep_group(ctx, Some(env), true)?);
    }
    deps.push(dep_group(ctx, None, true)?);

    let root = package_root()
        .child(metadata_element(ctx, &bundle_metadata(&id, description)).child(deps))
        .child(bundle_files(ctx, "batteries_sqlcipher", true)?);

    write_doc(&ctx.out_dir, &format!("{}.nuspec", id), root)
}

/// The per-toolset native packages: e_sqlite3.dll builds for the Windows
/// family, one package per compiler/ABI generation. The (flavor, arch,
/// rid) sets are fixed per toolset.
pub fn gen_nuspec_toolset_lib(ctx: &GenContext, cfg: &NativeLibConfig) -> Result<PathBuf> {
    let id = cfg.id();

    // (build toolset dir, flavor, arch, rid)
    let entries: &[(&str, &str, &str, &str)] = match cfg.toolset.as_str() {
        "v110_xp" => &[
            ("v110", "xp", "x86", "win-x86"),
            ("v110", "xp", "x64", "win-x64"),
            ("v140", "plain", "arm", "win8-arm"),
        ],
        "v110" => &[
            ("v110", "appcontainer", "arm", "win8-arm"),
            ("v110", "appcontainer", "x64", "win8-x64"),
            ("v110", "appcontainer", "x86", "win8-x86"),
        ],
        "v120" => &[
            ("v120", "appcontainer", "arm", "win81-arm"),
            ("v120", "appcontainer", "x64", "win81-x64"),
            ("v120", "appcontainer", "x86", "win81-x86"),
        ],
        "v140" => &[
            ("v140", "appcontainer", "arm", "win10-arm"),
            ("v140", "appcontainer", "x64", "win10-x64"),
            ("v140", "appcontainer", "x86", "win10-x86"),
        ],
        "v110_wp80" => &[
            ("v110", "wp80", "arm", "wp80-arm"),
            ("v110", "wp80", "x86", "wp80-x86"),
        ],
        "v120_wp81" => &[
            ("v120", "wp81", "arm", "wpa81-arm"),
            ("v120", "wp81", "x86", "wpa81-x86"),
        ],
        other => return Err(MappingError::UnrecognizedToolset(other.to_string()).into()),
    };

    let mut files = Element::new("files");
    for (build_toolset, flavor, arch, rid) in entries {
        files.push(
            Element::new("file")
                .attr(
                    "src",
                    &format!(
                        "{}/e_sqlite3/win/{}/{}/{}/e_sqlite3.dll",
                        ctx.native_bin.display(),
                        build_toolset,
                        flavor,
                        arch
                    ),
                )
                .attr("target", &format!("runtimes\\{}\\native\\", rid)),
        );
    }

    if cfg.toolset == "v110_xp" {
        // desktop package: dual-arch targets file, loaded from net35 so it
        // applies to every later desktop framework
        let tname = targets::gen_targets_dual_arch(ctx, &id)?;
        files.push(
            Element::new("file")
                .attr("src", &tname)
                .attr("target", &format!("build\\net35\\{}.targets", id)),
        );
        push_empty_lib(ctx, &mut files, "net35")?;
        push_empty_lib(ctx, &mut files, "netstandard1.0")?;
        push_empty_lib(ctx, &mut files, "netstandard2.0")?;
    } else {
        let tname = targets::gen_targets_toolset(ctx, &id, &cfg.toolset)?;
        files.push(
            Element::new("file")
                .attr("src", &tname)
                .attr("target", &format!("build\\{}.targets", id)),
        );
    }

    let root = package_root()
        .child(metadata_element(
            ctx,
            &Metadata {
                id: &id,
                title: &id,
                description: NATIVE_DESCRIPTION,
                authors: "Eric Sink, D. Richard Hipp, et al",
                summary: PCL_SUMMARY,
                tags: "sqlite",
                min_client_version: "2.8.1",
            },
        ))
        .child(files);

    write_doc(&ctx.out_dir, &format!("{}.nuspec", id), root)
}

/// The osx/linux e_sqlite3 packages: a fixed set of (source binary → RID
/// runtimes directory) entries plus the copy-rules targets file.
pub fn gen_nuspec_e_sqlite3_platform(ctx: &GenContext, plat: &str) -> Result<PathBuf> {
    let id = format!("{}.lib.e_sqlite3.{}", ROOT_NAME, plat);
    let title = format!("Native code only (e_sqlite3, {}) for {}", plat, ROOT_NAME);

    let mut files = Element::new("files");
    let tname = format!("{}.targets", id);
    match plat {
        "osx" => {
            files.push(
                Element::new("file")
                    .attr(
                        "src",
                        &format!("{}/e_sqlite3/mac/libe_sqlite3.dylib", ctx.native_bin.display()),
                    )
                    .attr("target", "runtimes\\osx-x64\\native\\libe_sqlite3.dylib"),
            );
            targets::gen_targets_osx(ctx, &tname, "libe_sqlite3.dylib", false)?;
        }
        "linux" => {
            // (source arch dir, rid); musl-x64 is duplicated into
            // alpine-x64 for .NET Core 2.1
            for (arch, rid) in [
                ("x64", "linux-x64"),
                ("x86", "linux-x86"),
                ("armhf", "linux-arm"),
                ("armsf", "linux-armel"),
                ("musl-x64", "linux-musl-x64"),
                ("musl-x64", "alpine-x64"),
                ("arm64", "linux-arm64"),
            ] {
                files.push(
                    Element::new("file")
                        .attr(
                            "src",
                            &format!(
                                "{}/e_sqlite3/linux/{}/libe_sqlite3.so",
                                ctx.native_bin.display(),
                                arch
                            ),
                        )
                        .attr("target", &format!("runtimes\\{}\\native\\libe_sqlite3.so", rid)),
                );
            }
            targets::gen_targets_linux(ctx, &tname, "libe_sqlite3.so")?;
        }
        other => return Err(MappingError::UnrecognizedEnvironment(other.to_string()).into()),
    }

    files.push(
        Element::new("file")
            .attr("src", &tname)
            .attr("target", &format!("build\\net35\\{}.targets", id)),
    );

    if plat == "osx" {
        push_empty_lib(ctx, &mut files, "Xamarin.Mac20")?;
        let mac_tname = format!("{}.Xamarin.Mac20.targets", id);
        targets::gen_targets_osx(ctx, &mac_tname, "libe_sqlite3.dylib", true)?;
        files.push(
            Element::new("file")
                .attr("src", &mac_tname)
                .attr("target", &format!("build\\Xamarin.Mac20\\{}.targets", id)),
        );
    }

    push_empty_lib(ctx, &mut files, "net35")?;
    push_empty_lib(ctx, &mut files, "netstandard1.0")?;
    push_empty_lib(ctx, &mut files, "netstandard2.0")?;

    let root = package_root()
        .child(metadata_element(
            ctx,
            &Metadata {
                id: &id,
                title: &title,
                description: NATIVE_DESCRIPTION,
                authors: "Eric Sink, D. Richard Hipp, et al",
                summary: PCL_SUMMARY,
                tags: "sqlite",
                min_client_version: "2.8.1",
            },
        ))
        .child(files);

    write_doc(&ctx.out_dir, &format!("{}.nuspec", id), root)
}

/// The windows/osx/linux sqlcipher packages (unofficial Couchbase builds).
pub fn gen_nuspec_sqlcipher_platform(ctx: &GenContext, plat: &str) -> Result<PathBuf> {
    let id = format!("{}.lib.sqlcipher.{}", ROOT_NAME, plat);
    let title = format!("Native code only (sqlcipher, {}) for {}", plat, ROOT_NAME);

    let mut files = Element::new("files");
    let tname = format!("{}.targets", id);
    match plat {
        "windows" => {
            for (flavor, arch, target) in [
                ("plain", "x86", "runtimes\\win-x86\\native\\sqlcipher.dll".to_string()),
                ("plain", "x64", "runtimes\\win-x64\\native\\sqlcipher.dll".to_string()),
                ("plain", "arm", "runtimes\\win-arm\\native\\sqlcipher.dll".to_string()),
                (
                    "appcontainer",
                    "x64",
                    "runtimes\\win10-x64\\nativeassets\\uap10.0\\sqlcipher.dll".to_string(),
                ),
                (
                    "appcontainer",
                    "x86",
                    "runtimes\\win10-x86\\nativeassets\\uap10.0\\sqlcipher.dll".to_string(),
                ),
                (
                    "appcontainer",
                    "arm",
                    "runtimes\\win10-arm\\nativeassets\\uap10.0\\sqlcipher.dll".to_string(),
                ),
            ] {
                files.push(
                    Element::new("file")
                        .attr(
                            "src",
                            &format!(
                                "{}/sqlcipher/win/v140/{}/{}/sqlcipher.dll",
                                ctx.native_bin.display(),
                                flavor,
                                arch
                            ),
                        )
                        .attr("target", &target),
                );
            }
            targets::gen_targets_windows(ctx, &tname, "sqlcipher.dll")?;
        }
        "osx" => {
            files.push(
                Element::new("file")
                    .attr(
                        "src",
                        &format!("{}/sqlcipher/mac/libsqlcipher.dylib", ctx.native_bin.display()),
                    )
                    .attr("target", "runtimes\\osx-x64\\native\\libsqlcipher.dylib"),
            );
            targets::gen_targets_osx(ctx, &tname, "libsqlcipher.dylib", false)?;
        }
        "linux" => {
            for (arch, rid) in [("x64", "linux-x64"), ("x86", "linux-x86")] {
                files.push(
                    Element::new("file")
                        .attr(
                            "src",
                            &format!(
                                "{}/sqlcipher/linux/{}/libsqlcipher.so",
                                ctx.native_bin.display(),
                                arch
                            ),
                        )
                        .attr("target", &format!("runtimes\\{}\\native\\libsqlcipher.so", rid)),
                );
            }
            targets::gen_targets_linux(ctx, &tname, "libsqlcipher.so")?;
        }
        other => return Err(MappingError::UnrecognizedEnvironment(other.to_string()).into()),
    }

    files.push(
        Element::new("file")
            .attr("src", &tname)
            .attr("target", &format!("build\\net35\\{}.targets", id)),
    );

    if plat == "osx" {
        push_empty_lib(ctx, &mut files, "Xamarin.Mac20")?;
        let mac_tname = format!("{}.Xamarin.Mac20.targets", id);
        targets::gen_targets_osx(ctx, &mac_tname, "libsqlcipher.dylib", true)?;
        files.push(
            Element::new("file")
                .attr("src", &mac_tname)
                .attr("target", &format!("build\\Xamarin.Mac20\\{}.targets", id)),
        );
    }

    push_empty_lib(ctx, &mut files, "net35")?;
    push_empty_lib(ctx, &mut files, "uap10.0")?;
    push_empty_lib(ctx, &mut files, "netstandard1.0")?;
    push_empty_lib(ctx, &mut files, "netstandard2.0")?;

    let root = package_root()
        .child(metadata_element(
            ctx,
            &Metadata {
                id: &id,
                title: &title,
                description: "This package contains a platform-specific native code build of SQLCipher (see sqlcipher/sqlcipher on GitHub) for use with SQLitePCL.raw.  The build of SQLCipher packaged here is built and maintained by Couchbase (see couchbaselabs/couchbase-lite-libsqlcipher on GitHub).  To use this, you need SQLitePCLRaw.core as well as SQLitePCLRaw.provider.sqlcipher.net45 or similar.  Convenience packages are named SQLitePCLRaw.bundle_*.",
                authors: "Couchbase, SQLite, Zetetic",
                summary: PCL_SUMMARY,
                tags: BUNDLE_TAGS,
                min_client_version: "2.8.1",
            },
        ))
        .child(files);

    write_doc(&ctx.out_dir, &format!("{}.nuspec", id), root)
}

/// Embedding-target packages (area `lib`): the native code ships inside a
/// managed assembly, so the nuspec is metadata plus the assembly entry.
pub fn gen_nuspec_embedded(ctx: &GenContext, cfg: &ProjectConfig) -> Result<PathBuf> {
    let id = cfg.id();

    let mut files = Element::new("files");
    push_file_entries(ctx, &mut files, cfg)?;

    let root = package_root()
        .child(metadata_element(
            ctx,
            &Metadata {
                id: &id,
                title: &id,
                description: NATIVE_DESCRIPTION,
                authors: "Eric Sink, D. Richard Hipp, et al",
                summary: PCL_SUMMARY,
                tags: "sqlite xamarin",
                min_client_version: "2.8.1",
            },
        ))
        .child(files);

    write_doc(&ctx.out_dir, &format!("{}.nuspec", id), root)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::generate::GenContext;
    use crate::version::VersionInfo;
    use tempfile::TempDir;

    fn test_ctx(tmp: &TempDir) -> GenContext {
        GenContext::new(
            tmp.path(),
            &tmp.path().join("bld"),
            "../cb/bld/bin",
            VersionInfo::release(),
        )
    }

    fn read(path: &std::path::Path) -> String {
        std::fs::read_to_string(path).unwrap()
    }

    #[test]
    fn test_core_nuspec_has_no_dependencies_on_other_packages() {
        let tmp = TempDir::new().unwrap();
        let ctx = test_ctx(&tmp);
        std::fs::create_dir_all(&ctx.out_dir).unwrap();

        let path = gen_nuspec_core(&ctx).unwrap();
        let xml = read(&path);

        assert!(xml.contains("<id>SQLitePCLRaw.core</id>"));
        assert!(xml.contains("<version>1.1.14</version>"));
        // the description mentions provider packages; only dependency
        // elements matter here
        assert!(xml.contains("add one of the SQLitePCLRaw.provider.* packages"));
        assert!(!xml.contains("id=\"SQLitePCLRaw.provider"));
        // every core assembly is listed
        assert!(xml.contains("src=\"core.net45/bin/release/SQLitePCLRaw.core.dll\""));
        assert!(xml.contains("target=\"lib\\net45\\\""));
        // wp80 assemblies are cpu-qualified
        assert!(xml.contains("target=\"build\\wp80\\x86\\\""));
        assert!(xml.contains("target=\"build\\wp80\\arm\\\""));
    }

    #[test]
    fn test_ugly_nuspec_depends_on_core_per_group() {
        let tmp = TempDir::new().unwrap();
        let ctx = test_ctx(&tmp);
        std::fs::create_dir_all(&ctx.out_dir).unwrap();

        let xml = read(&gen_nuspec_ugly(&ctx).unwrap());

        assert!(xml.contains("<id>SQLitePCLRaw.ugly</id>"));
        assert!(xml.contains("id=\"SQLitePCLRaw.core\""));
        assert!(xml.contains("targetFramework=\"MonoAndroid\""));
    }

    #[test]
    fn test_bundle_green_desktop_group_names_core_and_native_libs() {
        let tmp = TempDir::new().unwrap();
        let ctx = test_ctx(&tmp);
        std::fs::create_dir_all(&ctx.out_dir).unwrap();

        let xml = read(&gen_nuspec_bundle_green(&ctx).unwrap());

        // desktop environments pull the win/osx/linux trio
        assert!(xml.contains("id=\"SQLitePCLRaw.lib.e_sqlite3.v110_xp\""));
        assert!(xml.contains("id=\"SQLitePCLRaw.lib.e_sqlite3.osx\""));
        assert!(xml.contains("id=\"SQLitePCLRaw.lib.e_sqlite3.linux\""));
        // green policy: iOS uses the system sqlite3 provider, no lib dep
        assert!(xml.contains("id=\"SQLitePCLRaw.provider.sqlite3.ios_unified\""));
        assert!(!xml.contains("lib.e_sqlite3.ios_unified.static"));
        // android gets its own native lib package
        assert!(xml.contains("id=\"SQLitePCLRaw.lib.e_sqlite3.android\""));
    }

    #[test]
    fn test_bundle_e_sqlite3_ios_uses_internal_provider_and_static_lib() {
        let tmp = TempDir::new().unwrap();
        let ctx = test_ctx(&tmp);
        std::fs::create_dir_all(&ctx.out_dir).unwrap();

        let xml = read(&gen_nuspec_bundle_e_sqlite3(&ctx).unwrap());

        assert!(xml.contains("id=\"SQLitePCLRaw.provider.internal.ios_unified\""));
        assert!(xml.contains("id=\"SQLitePCLRaw.lib.e_sqlite3.ios_unified.static\""));
        // store environments resolve through the env->toolset table
        assert!(xml.contains("id=\"SQLitePCLRaw.lib.e_sqlite3.v140\""));
    }

    #[test]
    fn test_bundle_zetetic_omits_lib_deps_except_uwp() {
        let tmp = TempDir::new().unwrap();
        let ctx = test_ctx(&tmp);
        std::fs::create_dir_all(&ctx.out_dir).unwrap();

        let xml = read(&gen_nuspec_bundle_sqlcipher(&ctx, SqlCipherBundleKind::Zetetic).unwrap());

        assert!(xml.contains("<id>SQLitePCLRaw.bundle_zetetic</id>"));
        assert!(!xml.contains("id=\"SQLitePCLRaw.lib.sqlcipher.osx\""));
        assert!(!xml.contains("id=\"SQLitePCLRaw.lib.sqlcipher.linux\""));
        // uwp10 keeps its lib dependency in both flavors
        assert!(xml.contains("id=\"SQLitePCLRaw.lib.sqlcipher.windows\""));
    }

    #[test]
    fn test_toolset_lib_v110_xp_covers_the_win_rid_family() {
        let tmp = TempDir::new().unwrap();
        let ctx = test_ctx(&tmp);
        std::fs::create_dir_all(&ctx.out_dir).unwrap();

        let cfg = ctx
            .projects
            .native_libs
            .iter()
            .find(|c| c.toolset == "v110_xp")
            .unwrap()
            .clone();
        let xml = read(&gen_nuspec_toolset_lib(&ctx, &cfg).unwrap());

        assert!(xml.contains("<id>SQLitePCLRaw.lib.e_sqlite3.v110_xp</id>"));
        assert!(xml.contains("target=\"runtimes\\win-x86\\native\\\""));
        assert!(xml.contains("target=\"runtimes\\win-x64\\native\\\""));
        // the arm build comes from the v140 toolset but lands in win8-arm
        assert!(xml.contains("target=\"runtimes\\win8-arm\\native\\\""));
        // dual-arch targets file is loaded from net35
        assert!(xml.contains("target=\"build\\net35\\SQLitePCLRaw.lib.e_sqlite3.v110_xp.targets\""));
    }

    #[test]
    fn test_linux_e_sqlite3_aliases_musl_into_alpine() {
        let tmp = TempDir::new().unwrap();
        let ctx = test_ctx(&tmp);
        std::fs::create_dir_all(&ctx.out_dir).unwrap();

        let xml = read(&gen_nuspec_e_sqlite3_platform(&ctx, "linux").unwrap());

        assert!(xml.contains("target=\"runtimes\\linux-musl-x64\\native\\libe_sqlite3.so\""));
        assert!(xml.contains("target=\"runtimes\\alpine-x64\\native\\libe_sqlite3.so\""));
        assert!(xml.contains("target=\"runtimes\\linux-armel\\native\\libe_sqlite3.so\""));
    }

    #[test]
    fn test_unknown_platform_is_rejected() {
        let tmp = TempDir::new().unwrap();
        let ctx = test_ctx(&tmp);
        std::fs::create_dir_all(&ctx.out_dir).unwrap();

        assert!(gen_nuspec_e_sqlite3_platform(&ctx, "freebsd").is_err());
        assert!(gen_nuspec_sqlcipher_platform(&ctx, "beos").is_err());
    }
}
