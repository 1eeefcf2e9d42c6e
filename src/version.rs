use chrono::{NaiveDate, Utc};
use serde::Serialize;

pub const MAJOR_VERSION: u32 = 1;
pub const MINOR_VERSION: u32 = 1;
pub const PATCH_VERSION: u32 = 14;

/// The version strings stamped into every generated document.
///
/// The prerelease stamp and the assembly-version day count are the only
/// fields that vary between runs; fixing the stamp makes the entire
/// output set byte-for-byte reproducible.
#[derive(Debug, Clone, Serialize)]
pub struct VersionInfo {
    major: u32,
    minor: u32,
    patch: u32,
    /// `yyyyMMddHHmmss` stamp for prerelease versions; `None` means a
    /// release version.
    pre_stamp: Option<String>,
    build_days: i64,
}

impl VersionInfo {
    pub fn prerelease() -> Self {
        Self::prerelease_with_stamp(&Utc::now().format("%Y%m%d%H%M%S").to_string())
    }

    pub fn prerelease_with_stamp(stamp: &str) -> Self {
        Self {
            major: MAJOR_VERSION,
            minor: MINOR_VERSION,
            patch: PATCH_VERSION,
            pre_stamp: Some(stamp.to_string()),
            build_days: days_since_epoch(),
        }
    }

    pub fn release() -> Self {
        Self {
            major: MAJOR_VERSION,
            minor: MINOR_VERSION,
            patch: PATCH_VERSION,
            pre_stamp: None,
            build_days: days_since_epoch(),
        }
    }

    /// The version written into nuspec metadata and script lines.
    pub fn nuspec_version(&self) -> String {
        match &self.pre_stamp {
            Some(stamp) => format!("{}.{}.{}-pre{}", self.major, self.minor, self.patch, stamp),
            None => format!("{}.{}.{}", self.major, self.minor, self.patch),
        }
    }

    /// The four-part version substituted into AssemblyInfo templates.
    pub fn assembly_version(&self) -> String {
        format!(
            "{}.{}.{}.{}",
            self.major, self.minor, self.patch, self.build_days
        )
    }
}

fn days_since_epoch() -> i64 {
    // AssemblyVersion revision counts days since the project's 2018-01-01
    // versioning epoch.
    let epoch = NaiveDate::from_ymd_opt(2018, 1, 1).unwrap();
    (Utc::now().date_naive() - epoch).num_days()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_release_version() {
        let v = VersionInfo::release();
        assert_eq!(v.nuspec_version(), "1.1.14");
    }

    #[test]
    fn test_prerelease_version_carries_stamp() {
        let v = VersionInfo::prerelease_with_stamp("20190301120000");
        assert_eq!(v.nuspec_version(), "1.1.14-pre20190301120000");
    }

    #[test]
    fn test_assembly_version_has_four_parts() {
        let v = VersionInfo::release();
        let av = v.assembly_version();
        let parts: Vec<&str> = av.split('.').collect();
        assert_eq!(parts.len(), 4);
        assert_eq!(&parts[..3], &["1", "1", "14"]);
        assert!(parts[3].parse::<i64>().unwrap() > 0);
    }
}
