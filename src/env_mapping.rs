use std::collections::HashMap;

use thiserror::Error;

/// Lookup of an environment, toolset, or platform string outside the
/// static tables. Any occurrence aborts the whole run: a partially
/// generated package set is not safe to publish.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum MappingError {
    #[error("unrecognized environment: {0}")]
    UnrecognizedEnvironment(String),
    #[error("unrecognized toolset: {0}")]
    UnrecognizedToolset(String),
}

/// The static environment/toolset tables. Built once at startup and
/// passed explicitly to everything that needs a lookup.
#[derive(Debug, Clone)]
pub struct EnvMapping {
    env_to_tfm: HashMap<String, String>,
    env_to_toolset: HashMap<String, String>,
    toolset_to_rid_prefix: HashMap<String, String>,
    portable_targets: HashMap<String, String>,
}

impl EnvMapping {
    pub fn new() -> Self {
        let mut tfm = HashMap::new();
        tfm.insert("ios_unified".to_string(), "Xamarin.iOS10".to_string());
        tfm.insert("macos".to_string(), "Xamarin.Mac20".to_string());
        tfm.insert("watchos".to_string(), "Xamarin.WatchOS".to_string());
        tfm.insert("android".to_string(), "MonoAndroid".to_string());
        tfm.insert("net45".to_string(), "net45".to_string());
        tfm.insert("net40".to_string(), "net40".to_string());
        tfm.insert("net35".to_string(), "net35".to_string());
        tfm.insert("wp80".to_string(), "wp8".to_string());
        tfm.insert("wp81_sl".to_string(), "wp81".to_string());
        tfm.insert("wpa81".to_string(), "wpa81".to_string());
        tfm.insert("uwp10".to_string(), "uap10.0".to_string());
        tfm.insert("win8".to_string(), "win8".to_string());
        tfm.insert("win81".to_string(), "win81".to_string());
        tfm.insert("netstandard11".to_string(), "netstandard1.1".to_string());
        tfm.insert("netstandard10".to_string(), "netstandard1.0".to_string());
        tfm.insert("netcoreapp".to_string(), "netcoreapp".to_string());

        let mut toolset = HashMap::new();
        toolset.insert("net45".to_string(), "v110_xp".to_string());
        toolset.insert("net40".to_string(), "v110_xp".to_string());
        toolset.insert("net35".to_string(), "v110_xp".to_string());
        toolset.insert("wp80".to_string(), "v110_wp80".to_string());
        toolset.insert("wp81_sl".to_string(), "v120".to_string());
        toolset.insert("wpa81".to_string(), "v120_wp81".to_string());
        toolset.insert("uwp10".to_string(), "v140".to_string());
        toolset.insert("win8".to_string(), "v110".to_string());
        toolset.insert("win81".to_string(), "v120".to_string());

        let mut rid = HashMap::new();
        // for our builds, v110_xp always corresponds to a win-whatever RID
        rid.insert("v110_xp".to_string(), "win".to_string());
        rid.insert("v110".to_string(), "win8".to_string());
        rid.insert("v110_wp80".to_string(), "wp80".to_string());
        rid.insert("v120".to_string(), "win81".to_string());
        rid.insert("v120_wp81".to_string(), "wpa81".to_string());
        rid.insert("v140".to_string(), "win10".to_string());

        let mut portable = HashMap::new();
        portable.insert(
            "profile78".to_string(),
            "portable-net45+netcore45+wp8+MonoAndroid10+MonoTouch10+Xamarin.iOS10".to_string(),
        );
        portable.insert(
            "profile259".to_string(),
            "portable-net45+netcore45+wpa81+wp8+MonoAndroid10+MonoTouch10+Xamarin.iOS10".to_string(),
        );
        portable.insert(
            "profile111".to_string(),
            "portable-net45+netcore45+wpa81+MonoAndroid10+MonoTouch10+Xamarin.iOS10".to_string(),
        );
        portable.insert(
            "profile158".to_string(),
            "portable-net45+sl5+netcore45+wp8+MonoAndroid10+MonoTouch10+Xamarin.iOS10".to_string(),
        );
        portable.insert(
            "profile136".to_string(),
            "portable-net40+sl5+netcore45+wp8+MonoAndroid10+MonoTouch10+Xamarin.iOS10".to_string(),
        );

        let mapping = Self {
            env_to_tfm: tfm,
            env_to_toolset: toolset,
            toolset_to_rid_prefix: rid,
            portable_targets: portable,
        };
        mapping.validate();
        mapping
    }

    // The tables must cover each other: every env that maps to a toolset
    // must have a framework name, and every toolset must have a RID prefix.
    fn validate(&self) {
        for (env, toolset) in &self.env_to_toolset {
            assert!(
                self.env_to_tfm.contains_key(env),
                "env {} has a toolset but no framework name",
                env
            );
            assert!(
                self.toolset_to_rid_prefix.contains_key(toolset),
                "toolset {} has no RID prefix",
                toolset
            );
        }
    }

    pub fn env_is_portable(env: &str) -> bool {
        env.starts_with("profile")
    }

    /// The NuGet framework moniker for an environment. Portable profiles
    /// resolve to their full `portable-...` target string.
    pub fn framework_moniker(&self, env: &str) -> Result<&str, MappingError> {
        if Self::env_is_portable(env) {
            return self.portable_target_string(env);
        }
        self.env_to_tfm
            .get(env)
            .map(|s| s.as_str())
            .ok_or_else(|| MappingError::UnrecognizedEnvironment(env.to_string()))
    }

    pub fn portable_target_string(&self, env: &str) -> Result<&str, MappingError> {
        self.portable_targets
            .get(env)
            .map(|s| s.as_str())
            .ok_or_else(|| MappingError::UnrecognizedEnvironment(env.to_string()))
    }

    /// The native-compiler toolset associated with a non-portable
    /// desktop/store/phone environment.
    pub fn toolset(&self, env: &str) -> Result<&str, MappingError> {
        self.env_to_toolset
            .get(env)
            .map(|s| s.as_str())
            .ok_or_else(|| MappingError::UnrecognizedEnvironment(env.to_string()))
    }

    /// The runtime-identifier family prefix used to name native binary
    /// output directories, e.g. `win` for `v110_xp` builds.
    pub fn rid_prefix(&self, toolset: &str) -> Result<&str, MappingError> {
        self.toolset_to_rid_prefix
            .get(toolset)
            .map(|s| s.as_str())
            .ok_or_else(|| MappingError::UnrecognizedToolset(toolset.to_string()))
    }

    /// Where a package's assembly lands inside the nupkg for this env.
    ///
    /// `wp80` assemblies are CPU-qualified and go into `build\wp80\<cpu>\`
    /// instead; that case is handled by the file-entry writer, which has
    /// the cpu in hand.
    pub fn nuget_target_path(&self, env: &str) -> Result<String, MappingError> {
        Ok(format!("lib\\{}\\", self.framework_moniker(env)?))
    }

    pub fn supported_envs(&self) -> Vec<&str> {
        let mut envs: Vec<&str> = self
            .env_to_tfm
            .keys()
            .chain(self.portable_targets.keys())
            .map(|s| s.as_str())
            .collect();
        envs.sort_unstable();
        envs
    }
}

impl Default for EnvMapping {
    fn default() -> Self {
        Self::new()
    }
}
