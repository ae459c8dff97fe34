//! Publishing-velocity signals from sibling versions in the same date partition.

use crate::corpus::sibling_dirs;
use crate::error::Result;
use semver::Version;
use std::path::Path;

/// Precedence class of the declared version
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum UpdateType {
    #[default]
    Initial = 0,
    Major = 1,
    Minor = 2,
    Patch = 3,
    PreRelease = 4,
}

#[derive(Debug, Clone, PartialEq)]
pub struct HistoryFeatures {
    pub is_first_version: bool,
    pub has_other_versions_today: bool,
    pub is_rapid_update: bool,
    pub version_velocity: f64,
    pub maintenance_score: f64,
    pub time_between_updates: u64,
    pub update_type: UpdateType,
}

impl Default for HistoryFeatures {
    fn default() -> Self {
        Self {
            is_first_version: true,
            has_other_versions_today: false,
            is_rapid_update: false,
            version_velocity: 0.0,
            maintenance_score: 0.0,
            time_between_updates: 0,
            update_type: UpdateType::Initial,
        }
    }
}

/// `(is_first_version, update_type)` for a version string. Unparsable input
/// gives the first-version default.
pub fn classify_version(raw: &str) -> (bool, UpdateType) {
    let trimmed = raw.trim();
    let Ok(v) = Version::parse(trimmed.trim_start_matches(['v', '='])) else {
        return (true, UpdateType::Initial);
    };

    // prefix checked on the declared text, so "v1.0.0" is not a first release
    let is_first = v.major > 0 && trimmed.starts_with("1.0.0");
    let update_type = if !v.pre.is_empty() {
        UpdateType::PreRelease
    } else if v.patch > 0 {
        UpdateType::Patch
    } else if v.minor > 0 {
        UpdateType::Minor
    } else if v.major > 0 {
        UpdateType::Major
    } else {
        UpdateType::Initial
    };
    (is_first, update_type)
}

/// Velocity saturates at ten siblings
pub fn version_velocity(siblings: usize) -> f64 {
    (siblings as f64 / 10.0).min(1.0)
}

#[derive(Debug, Clone, Default)]
pub struct VersionHistoryAnalyzer;

impl VersionHistoryAnalyzer {
    pub fn analyze(&self, sample: &Path, version: &str) -> Result<HistoryFeatures> {
        let siblings = sibling_dirs(sample)?.len();
        let (is_first_version, update_type) = classify_version(version);
        Ok(HistoryFeatures {
            is_first_version,
            has_other_versions_today: siblings > 0,
            is_rapid_update: siblings >= 2,
            version_velocity: version_velocity(siblings),
            maintenance_score: if siblings > 0 { 1.0 } else { 0.0 },
            time_between_updates: siblings as u64,
            update_type,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;

    #[test]
    fn classifies_versions() {
        assert_eq!(classify_version("1.0.0"), (true, UpdateType::Major));
        assert_eq!(classify_version("v1.0.0"), (false, UpdateType::Major));
        assert_eq!(classify_version(" 1.0.0 "), (true, UpdateType::Major));
        assert_eq!(classify_version("=2.1.0"), (false, UpdateType::Minor));
        assert_eq!(classify_version("1.0.3"), (false, UpdateType::Patch));
        assert_eq!(classify_version("2.4.0"), (false, UpdateType::Minor));
        assert_eq!(classify_version("3.0.0"), (false, UpdateType::Major));
        assert_eq!(classify_version("1.0.0-beta.1"), (true, UpdateType::PreRelease));
        assert_eq!(classify_version("0.0.0"), (false, UpdateType::Initial));
    }

    #[test]
    fn unparsable_version_is_first() {
        assert_eq!(classify_version("latest"), (true, UpdateType::Initial));
        assert_eq!(classify_version(""), (true, UpdateType::Initial));
    }

    #[test]
    fn velocity_bounds() {
        assert_eq!(version_velocity(0), 0.0);
        assert_eq!(version_velocity(5), 0.5);
        assert_eq!(version_velocity(10), 1.0);
        assert_eq!(version_velocity(250), 1.0);
        let mut prev = 0.0;
        for n in 0..30 {
            let v = version_velocity(n);
            assert!(v >= prev && v <= 1.0);
            prev = v;
        }
    }

    #[test]
    fn siblings_in_partition() {
        let dir = tempfile::tempdir().unwrap();
        for p in ["pkg-1.0.0", "pkg-1.0.1", "pkg-1.0.2"] {
            fs::create_dir(dir.path().join(p)).unwrap();
        }
        let h = VersionHistoryAnalyzer
            .analyze(&dir.path().join("pkg-1.0.2"), "1.0.2")
            .unwrap();
        assert!(h.has_other_versions_today);
        assert!(h.is_rapid_update);
        assert_eq!(h.time_between_updates, 2);
        assert_eq!(h.version_velocity, 0.2);
        assert_eq!(h.maintenance_score, 1.0);
        assert!(!h.is_first_version);
        assert_eq!(h.update_type, UpdateType::Patch);
    }

    #[test]
    fn lone_sample() {
        let dir = tempfile::tempdir().unwrap();
        fs::create_dir(dir.path().join("only")).unwrap();
        let h = VersionHistoryAnalyzer.analyze(&dir.path().join("only"), "1.0.0").unwrap();
        assert!(!h.has_other_versions_today);
        assert!(!h.is_rapid_update);
        assert_eq!(h.version_velocity, 0.0);
    }
}
