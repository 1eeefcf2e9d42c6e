//! Emits the MSBuild `.targets` documents that copy the right native
//! binary next to the build output, conditioned on OS and target CPU.
//!
//! Each document injects a Target ahead of ResolveAssemblyReferences.
//! Target names are derived from the package id (the original tool used a
//! fresh GUID per run, which made regeneration non-idempotent).

use anyhow::{Context, Result};
use std::fs;

use crate::env_mapping::MappingError;
use crate::generate::GenContext;
use crate::xml::{Document, Element};

const MSBUILD_XMLNS: &str = "http://schemas.microsoft.com/developer/msbuild/2003";

fn project_root() -> Element {
    Element::new("Project")
        .attr("xmlns", MSBUILD_XMLNS)
        .attr("ToolsVersion", "4.0")
}

fn inject_target_name(id: &str) -> String {
    format!("InjectReference_{}", id.replace(['.', '-'], "_"))
}

fn content_item(include: &str, link: Option<&str>) -> Element {
    let mut item = Element::new("Content").attr("Include", include);
    if let Some(link) = link {
        item = item.text_element("Link", link);
    }
    item.text_element("CopyToOutputDirectory", "PreserveNewest")
        .text_element("Pack", "false")
}

fn depends_on_chain(target_name: &str) -> Element {
    Element::new("PropertyGroup").text_element(
        "ResolveAssemblyReferencesDependsOn",
        &format!("$(ResolveAssemblyReferencesDependsOn);{}", target_name),
    )
}

fn write_targets(ctx: &GenContext, tname: &str, root: Element) -> Result<()> {
    let path = ctx.out_dir.join(tname);
    fs::write(&path, Document::new(root).to_xml())
        .with_context(|| format!("Failed to write {}", path.display()))?;
    println!("Generated {}", path.display());
    Ok(())
}

/// Per-toolset copy rules for the Windows store/phone packages: one
/// platform-conditioned ItemGroup per CPU, copying from the
/// `<rid-prefix>-<cpu>` runtimes directory. v110/v120 also need a VCLibs
/// SDK reference for non-AnyCPU builds.
pub fn gen_targets_toolset(ctx: &GenContext, id: &str, toolset: &str) -> Result<String> {
    let tname = format!("{}.targets", id);
    let mut project = project_root();

    match toolset {
        "v110_xp" => {} // statically linked
        "v110" | "v120" => {
            let vclibs_version = if toolset == "v110" { "11.0" } else { "12.0" };
            project.push(
                Element::new("ItemGroup")
                    .attr(
                        "Condition",
                        " '$(Platform.Trim().Substring(0,3).ToLower())' != 'any' ",
                    )
                    .child(Element::new("SDKReference").attr(
                        "Include",
                        &format!("Microsoft.VCLibs, Version={}", vclibs_version),
                    )),
            );
        }
        "v140" | "v110_wp80" | "v120_wp81" => {}
        other => return Err(MappingError::UnrecognizedToolset(other.to_string()).into()),
    }

    let cpus: &[&str] = match toolset {
        "v110_xp" => &["x86", "x64", "arm"],
        "v110" | "v120" | "v140" => &["arm", "x64", "x86"],
        "v110_wp80" | "v120_wp81" => &["arm", "x86"],
        other => return Err(MappingError::UnrecognizedToolset(other.to_string()).into()),
    };

    let front = ctx.mapping.rid_prefix(toolset)?;
    let mut target = Element::new("Target")
        .attr("Name", &inject_target_name(id))
        .attr("BeforeTargets", "ResolveAssemblyReferences")
        .attr("Condition", " '$(OS)' == 'Windows_NT' ");

    for cpu in cpus {
        target.push(
            Element::new("ItemGroup")
                .attr(
                    "Condition",
                    &format!(" '$(Platform.ToLower())' == '{}' ", cpu.to_lowercase()),
                )
                .child(content_item(
                    &format!(
                        "$(MSBuildThisFileDirectory)..\\runtimes\\{}-{}\\native\\e_sqlite3.dll",
                        front, cpu
                    ),
                    None,
                )),
        );
    }
    project.push(target);

    write_targets(ctx, &tname, project)?;
    Ok(tname)
}

/// Copy rules for the AnyCPU desktop package: both x86 and x64 binaries
/// land in arch subdirectories of the output, and the runtime picks one.
pub fn gen_targets_dual_arch(ctx: &GenContext, id: &str) -> Result<String> {
    let tname = format!("{}.targets", id);
    let target_name = inject_target_name(id);

    let mut item_group = Element::new("ItemGroup").attr("Condition", " '$(OS)' == 'Windows_NT' ");
    for cpu in ["x86", "x64"] {
        item_group.push(content_item(
            &format!(
                "$(MSBuildThisFileDirectory)..\\..\\runtimes\\win-{}\\native\\e_sqlite3.dll",
                cpu
            ),
            Some(&format!("{}\\e_sqlite3.dll", cpu)),
        ));
    }

    let project = project_root()
        .child(
            Element::new("Target")
                .attr("Name", &target_name)
                .attr("BeforeTargets", "ResolveAssemblyReferences")
                .child(item_group),
        )
        .child(depends_on_chain(&target_name));

    write_targets(ctx, &tname, project)?;
    Ok(tname)
}

pub fn gen_targets_windows(ctx: &GenContext, tname: &str, filename: &str) -> Result<()> {
    let id = tname.trim_end_matches(".targets");
    let target_name = inject_target_name(id);

    let mut item_group = Element::new("ItemGroup").attr("Condition", " '$(OS)' == 'Windows_NT' ");
    for cpu in ["x86", "x64"] {
        item_group.push(content_item(
            &format!(
                "$(MSBuildThisFileDirectory)..\\..\\runtimes\\win-{}\\native\\{}",
                cpu, filename
            ),
            Some(&format!("{}\\{}", cpu, filename)),
        ));
    }

    let project = project_root()
        .child(
            Element::new("Target")
                .attr("Name", &target_name)
                .attr("BeforeTargets", "ResolveAssemblyReferences")
                .child(item_group),
        )
        .child(depends_on_chain(&target_name));

    write_targets(ctx, tname, project)
}

/// macOS copy rules. The plain variant copies the dylib next to the
/// output; the Xamarin.Mac variant declares it as a NativeReference.
pub fn gen_targets_osx(ctx: &GenContext, tname: &str, filename: &str, for_xam_mac: bool) -> Result<()> {
    let id = tname.trim_end_matches(".targets");
    let target_name = inject_target_name(id);
    let include = format!(
        "$(MSBuildThisFileDirectory)..\\..\\runtimes\\osx-x64\\native\\{}",
        filename
    );

    let payload = if for_xam_mac {
        Element::new("NativeReference")
            .attr("Include", &include)
            .text_element("Kind", "Dynamic")
            .text_element("SmartLink", "False")
    } else {
        content_item(&include, Some(filename))
    };

    let project = project_root()
        .child(
            Element::new("Target")
                .attr("Name", &target_name)
                .attr("BeforeTargets", "ResolveAssemblyReferences")
                .child(
                    Element::new("ItemGroup")
                        .attr(
                            "Condition",
                            " '$(OS)' == 'Unix' AND Exists('/Library/Frameworks') ",
                        )
                        .child(payload),
                ),
        )
        .child(depends_on_chain(&target_name));

    write_targets(ctx, tname, project)
}

pub fn gen_targets_linux(ctx: &GenContext, tname: &str, filename: &str) -> Result<()> {
    let id = tname.trim_end_matches(".targets");
    let target_name = inject_target_name(id);

    // dllimport can't find the library by arch subdirectory on linux, so
    // only the x64 build is copied, unqualified
    let project = project_root()
        .child(
            Element::new("Target")
                .attr("Name", &target_name)
                .attr("BeforeTargets", "ResolveAssemblyReferences")
                .child(
                    Element::new("ItemGroup")
                        .attr(
                            "Condition",
                            " '$(OS)' == 'Unix' AND !Exists('/Library/Frameworks') ",
                        )
                        .child(content_item(
                            &format!(
                                "$(MSBuildThisFileDirectory)..\\..\\runtimes\\linux-x64\\native\\{}",
                                filename
                            ),
                            Some(filename),
                        )),
                ),
        )
        .child(depends_on_chain(&target_name));

    write_targets(ctx, tname, project)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::generate::GenContext;
    use crate::version::VersionInfo;
    use tempfile::TempDir;

    fn test_ctx(tmp: &TempDir) -> GenContext {
        let ctx = GenContext::new(
            tmp.path(),
            &tmp.path().join("bld"),
            "../cb/bld/bin",
            VersionInfo::release(),
        );
        std::fs::create_dir_all(&ctx.out_dir).unwrap();
        ctx
    }

    fn read(ctx: &GenContext, tname: &str) -> String {
        std::fs::read_to_string(ctx.out_dir.join(tname)).unwrap()
    }

    #[test]
    fn test_toolset_targets_use_rid_prefix_per_cpu() {
        let tmp = TempDir::new().unwrap();
        let ctx = test_ctx(&tmp);

        let tname = gen_targets_toolset(&ctx, "SQLitePCLRaw.lib.e_sqlite3.v140", "v140").unwrap();
        let xml = read(&ctx, &tname);

        for cpu in ["arm", "x64", "x86"] {
            assert!(xml.contains(&format!(
                "..\\runtimes\\win10-{}\\native\\e_sqlite3.dll",
                cpu
            )));
            assert!(xml.contains(&format!(" '$(Platform.ToLower())' == '{}' ", cpu)));
        }
        assert!(xml.contains("BeforeTargets=\"ResolveAssemblyReferences\""));
        assert!(xml.contains(" '$(OS)' == 'Windows_NT' "));
    }

    #[test]
    fn test_v110_needs_vclibs_sdk_reference() {
        let tmp = TempDir::new().unwrap();
        let ctx = test_ctx(&tmp);

        let tname = gen_targets_toolset(&ctx, "SQLitePCLRaw.lib.e_sqlite3.v110", "v110").unwrap();
        let xml = read(&ctx, &tname);

        assert!(xml.contains("Microsoft.VCLibs, Version=11.0"));
    }

    #[test]
    fn test_dual_arch_targets_link_into_arch_subdirs() {
        let tmp = TempDir::new().unwrap();
        let ctx = test_ctx(&tmp);

        let tname = gen_targets_dual_arch(&ctx, "SQLitePCLRaw.lib.e_sqlite3.v110_xp").unwrap();
        let xml = read(&ctx, &tname);

        assert!(xml.contains("..\\..\\runtimes\\win-x86\\native\\e_sqlite3.dll"));
        assert!(xml.contains("<Link>x64\\e_sqlite3.dll</Link>"));
        assert!(xml.contains("ResolveAssemblyReferencesDependsOn"));
    }

    #[test]
    fn test_osx_variants() {
        let tmp = TempDir::new().unwrap();
        let ctx = test_ctx(&tmp);

        gen_targets_osx(&ctx, "a.targets", "libe_sqlite3.dylib", false).unwrap();
        let plain = read(&ctx, "a.targets");
        assert!(plain.contains("Exists('/Library/Frameworks')"));
        assert!(plain.contains("<CopyToOutputDirectory>PreserveNewest</CopyToOutputDirectory>"));

        gen_targets_osx(&ctx, "b.targets", "libe_sqlite3.dylib", true).unwrap();
        let xam = read(&ctx, "b.targets");
        assert!(xam.contains("<NativeReference"));
        assert!(xam.contains("<SmartLink>False</SmartLink>"));
    }

    #[test]
    fn test_linux_condition_excludes_macs() {
        let tmp = TempDir::new().unwrap();
        let ctx = test_ctx(&tmp);

        gen_targets_linux(&ctx, "c.targets", "libe_sqlite3.so").unwrap();
        let xml = read(&ctx, "c.targets");

        assert!(xml.contains("!Exists('/Library/Frameworks')"));
        assert!(xml.contains("..\\..\\runtimes\\linux-x64\\native\\libe_sqlite3.so"));
    }

    #[test]
    fn test_target_names_are_deterministic() {
        assert_eq!(
            inject_target_name("SQLitePCLRaw.lib.e_sqlite3.v110_xp"),
            "InjectReference_SQLitePCLRaw_lib_e_sqlite3_v110_xp"
        );
    }
}
