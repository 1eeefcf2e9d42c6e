use serde::Serialize;

pub const ROOT_NAME: &str = "SQLitePCLRaw";

/// One managed-assembly project: a package area plus the environment
/// (and, where the area ships per-CPU builds, the CPU) it targets.
///
/// Uniqueness: (area, env, cpu) within areas that ship per-CPU builds,
/// (area, env) otherwise. `Projects::init` is the only constructor of
/// these, so the tables below are the invariant's ground truth.
#[derive(Debug, Clone, Serialize)]
pub struct ProjectConfig {
    pub area: String,
    /// Provider name, where the area wraps one (e.g. "e_sqlite3").
    pub what: Option<String>,
    pub name: String,
    pub assembly_name: String,
    pub env: String,
    /// Build with one env's settings, drop the assembly into another
    /// env's spot in the package.
    pub nuget_override_target_env: Option<String>,
    pub cpu: String,
}

impl ProjectConfig {
    fn new(area: &str, name: &str, assembly_name: &str, env: &str) -> Self {
        Self {
            area: area.to_string(),
            what: None,
            name: name.to_string(),
            assembly_name: assembly_name.to_string(),
            env: env.to_string(),
            nuget_override_target_env: None,
            cpu: "anycpu".to_string(),
        }
    }

    fn with_cpu(mut self, cpu: &str) -> Self {
        self.cpu = cpu.to_string();
        self
    }

    pub fn id(&self) -> String {
        format!("{}.{}", ROOT_NAME, self.name)
    }

    /// Compiled-output naming convention. The descriptor alone determines
    /// the path; no filesystem probing.
    pub fn products(&self) -> Vec<String> {
        vec![format!(
            "{}/bin/release/{}.dll",
            self.name, self.assembly_name
        )]
    }
}

/// One per-toolset native-library package (dynamic e_sqlite3 builds for
/// the Windows family).
#[derive(Debug, Clone, Serialize)]
pub struct NativeLibConfig {
    pub toolset: String,
}

impl NativeLibConfig {
    fn new(toolset: &str) -> Self {
        Self {
            toolset: toolset.to_string(),
        }
    }

    pub fn name(&self) -> String {
        format!("lib.e_sqlite3.{}", self.toolset)
    }

    pub fn id(&self) -> String {
        format!("{}.{}", ROOT_NAME, self.name())
    }

    pub fn title(&self) -> String {
        format!(
            "Native code only (e_sqlite3, compiled with {}) for {}",
            self.toolset, ROOT_NAME
        )
    }
}

/// The full static project tables, built once at start-of-run.
#[derive(Debug, Clone)]
pub struct Projects {
    pub csproj: Vec<ProjectConfig>,
    pub native_libs: Vec<NativeLibConfig>,
}

// Environments with a managed core/ugly assembly of their own. wp80 is
// handled separately because its assemblies are per-CPU.
const ASSEMBLY_ENVS: &[&str] = &[
    "android",
    "ios_unified",
    "macos",
    "net35",
    "net40",
    "net45",
    "win8",
    "win81",
    "wpa81",
    "uwp10",
    "profile111",
    "profile136",
    "profile259",
    "netstandard11",
];

const BATTERIES_ENVS: &[&str] = &[
    "android",
    "ios_unified",
    "macos",
    "net35",
    "net40",
    "net45",
    "win8",
    "win81",
    "wp80",
    "wpa81",
    "uwp10",
    "netstandard11",
];

impl Projects {
    pub fn init() -> Self {
        let mut csproj = Vec::new();

        for env in ASSEMBLY_ENVS {
            csproj.push(ProjectConfig::new(
                "core",
                &format!("core.{}", env),
                &format!("{}.core", ROOT_NAME),
                env,
            ));
        }
        for cpu in ["x86", "arm"] {
            csproj.push(
                ProjectConfig::new(
                    "core",
                    &format!("core.wp80.{}", cpu),
                    &format!("{}.core", ROOT_NAME),
                    "wp80",
                )
                .with_cpu(cpu),
            );
        }

        for env in ASSEMBLY_ENVS {
            csproj.push(ProjectConfig::new(
                "ugly",
                &format!("ugly.{}", env),
                &format!("{}.ugly", ROOT_NAME),
                env,
            ));
        }

        for area in [
            "batteries_green",
            "batteries_e_sqlite3",
            "batteries_sqlcipher",
        ] {
            for env in BATTERIES_ENVS {
                // sqlcipher never had a wp80 batteries assembly
                if *env == "wp80" && area == "batteries_sqlcipher" {
                    continue;
                }
                csproj.push(ProjectConfig::new(
                    area,
                    &format!("{}.{}", area, env),
                    &format!("{}.batteries_v2", ROOT_NAME),
                    env,
                ));
            }
        }
        csproj.push(ProjectConfig::new(
            "batteries_winsqlite3",
            "batteries_winsqlite3.uwp10",
            &format!("{}.batteries_v2", ROOT_NAME),
            "uwp10",
        ));

        // Embedding-target packages: native code carried inside a managed
        // assembly, one package per (engine, mobile target).
        for what in ["e_sqlite3", "sqlcipher"] {
            for name in [
                format!("lib.{}.android", what),
                format!("lib.{}.ios_unified.static", what),
            ] {
                let env = if name.contains("android") {
                    "android"
                } else {
                    "ios_unified"
                };
                let mut cfg = ProjectConfig::new(
                    "lib",
                    &name,
                    &format!("{}.{}", ROOT_NAME, name),
                    env,
                );
                cfg.what = Some(what.to_string());
                csproj.push(cfg);
            }
        }

        let native_libs = vec![
            NativeLibConfig::new("v110_xp"),
            NativeLibConfig::new("v110"),
            NativeLibConfig::new("v110_wp80"),
            NativeLibConfig::new("v120"),
            NativeLibConfig::new("v120_wp81"),
            NativeLibConfig::new("v140"),
        ];

        Self {
            csproj,
            native_libs,
        }
    }

    pub fn in_area(&self, area: &str) -> impl Iterator<Item = &ProjectConfig> {
        self.csproj.iter().filter(move |cfg| cfg.area == area)
    }

    pub fn find(&self, area: &str, env: &str) -> Option<&ProjectConfig> {
        self.csproj
            .iter()
            .find(|cfg| cfg.area == area && cfg.env == env)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashSet;

    #[test]
    fn test_product_naming_convention() {
        let cfg = ProjectConfig::new("core", "core.net45", "SQLitePCLRaw.core", "net45");

        assert_eq!(
            cfg.products(),
            vec!["core.net45/bin/release/SQLitePCLRaw.core.dll"]
        );
        assert_eq!(cfg.id(), "SQLitePCLRaw.core.net45");
    }

    #[test]
    fn test_native_lib_naming() {
        let cfg = NativeLibConfig::new("v110_xp");

        assert_eq!(cfg.name(), "lib.e_sqlite3.v110_xp");
        assert_eq!(cfg.id(), "SQLitePCLRaw.lib.e_sqlite3.v110_xp");
    }

    #[test]
    fn test_area_env_cpu_tuples_are_unique() {
        let projects = Projects::init();

        let mut seen = HashSet::new();
        for cfg in &projects.csproj {
            assert!(
                seen.insert((
                    cfg.area.clone(),
                    cfg.what.clone(),
                    cfg.env.clone(),
                    cfg.cpu.clone()
                )),
                "duplicate (area, what, env, cpu): ({}, {:?}, {}, {})",
                cfg.area,
                cfg.what,
                cfg.env,
                cfg.cpu
            );
        }
    }

    #[test]
    fn test_every_area_is_populated() {
        let projects = Projects::init();

        for area in [
            "core",
            "ugly",
            "batteries_green",
            "batteries_e_sqlite3",
            "batteries_sqlcipher",
            "batteries_winsqlite3",
            "lib",
        ] {
            assert!(projects.in_area(area).count() > 0, "empty area: {}", area);
        }
        assert_eq!(projects.native_libs.len(), 6);
    }

    #[test]
    fn test_wp80_core_is_per_cpu() {
        let projects = Projects::init();

        let cpus: Vec<&str> = projects
            .in_area("core")
            .filter(|cfg| cfg.env == "wp80")
            .map(|cfg| cfg.cpu.as_str())
            .collect();
        assert_eq!(cpus, vec!["x86", "arm"]);
    }
}
