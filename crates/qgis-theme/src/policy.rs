//! Version-dependent rules deciding which `layer` entries belong to a theme.
//!
//! QGIS 3.26 started writing every layer into a theme with an explicit
//! `visible` flag. Older projects only list the layers that were checked.

use std::fmt;

/// QGIS project version encoded as `major * 10000 + minor * 100 + patch`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default)]
pub struct ProjectVersion(pub u32);

impl ProjectVersion {
    /// Oldest/unknown version, used when the caller cannot supply one.
    pub const UNKNOWN: ProjectVersion = ProjectVersion(0);

    pub const fn new(major: u32, minor: u32, patch: u32) -> Self {
        let minor = if minor > 99 { 99 } else { minor };
        let patch = if patch > 99 { 99 } else { patch };
        ProjectVersion(major.saturating_mul(10000).saturating_add(minor * 100 + patch))
    }

    /// Parse the `version` attribute of a `<qgis>` root element, e.g.
    /// `"3.28.4-Firenze"`. Missing components default to 0.
    pub fn parse(text: &str) -> Option<Self> {
        let numeric = text
            .trim()
            .split(|c: char| c == '-' || c.is_whitespace())
            .next()?;
        let mut parts = numeric.split('.');
        let major = parts.next()?.parse().ok()?;
        let minor = match parts.next() {
            Some(part) => part.parse().ok()?,
            None => 0,
        };
        let patch = match parts.next() {
            Some(part) => part.parse().ok()?,
            None => 0,
        };
        Some(ProjectVersion::new(major, minor, patch))
    }

    pub fn major(self) -> u32 {
        self.0 / 10000
    }

    pub fn minor(self) -> u32 {
        self.0 / 100 % 100
    }

    pub fn patch(self) -> u32 {
        self.0 % 100
    }
}

impl fmt::Display for ProjectVersion {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}.{}.{}", self.major(), self.minor(), self.patch())
    }
}

/// First release writing full layer enumerations into themes (QGIS 3.26).
pub const FULL_ENUMERATION_SINCE: ProjectVersion = ProjectVersion::new(3, 26, 0);

/// Decides from the raw `visible` attribute whether a layer entry is kept.
pub trait InclusionPolicy: fmt::Debug + Send + Sync {
    fn name(&self) -> &'static str;

    fn includes(&self, visible: Option<&str>) -> bool;
}

/// Every layer is listed; only an explicit `visible="0"` excludes it.
#[derive(Debug, Clone, Copy, Default)]
pub struct FullEnumeration;

impl InclusionPolicy for FullEnumeration {
    fn name(&self) -> &'static str {
        "full-enumeration"
    }

    fn includes(&self, visible: Option<&str>) -> bool {
        visible != Some("0")
    }
}

/// Only checked layers are listed; a present `visible` other than `"1"`
/// excludes the layer, an absent one keeps it.
#[derive(Debug, Clone, Copy, Default)]
pub struct CheckedOnly;

impl InclusionPolicy for CheckedOnly {
    fn name(&self) -> &'static str {
        "checked-only"
    }

    fn includes(&self, visible: Option<&str>) -> bool {
        matches!(visible, None | Some("1"))
    }
}

/// Policy for a project version.
pub fn policy_for(version: ProjectVersion) -> &'static dyn InclusionPolicy {
    if version >= FULL_ENUMERATION_SINCE {
        &FullEnumeration
    } else {
        &CheckedOnly
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn version_parsing() {
        assert_eq!(ProjectVersion::parse("3.26.0-Buenos Aires"), Some(ProjectVersion(32600)));
        assert_eq!(ProjectVersion::parse("3.28.4-Firenze"), Some(ProjectVersion(32804)));
        assert_eq!(ProjectVersion::parse("3.4.15-Madeira"), Some(ProjectVersion(30415)));
        assert_eq!(ProjectVersion::parse(" 3.22 "), Some(ProjectVersion(32200)));
        assert_eq!(ProjectVersion::parse("3"), Some(ProjectVersion(30000)));
        assert_eq!(ProjectVersion::parse("3.10.120"), Some(ProjectVersion(31099)));
        assert_eq!(ProjectVersion::parse(""), None);
        assert_eq!(ProjectVersion::parse("dev"), None);
        assert_eq!(ProjectVersion::parse("3.x.1"), None);
    }

    #[test]
    fn version_display_and_default() {
        assert_eq!(ProjectVersion(32804).to_string(), "3.28.4");
        assert_eq!(ProjectVersion::default(), ProjectVersion::UNKNOWN);
    }

    #[test]
    fn full_enumeration_excludes_only_explicit_zero() {
        let policy = FullEnumeration;
        assert!(policy.includes(Some("1")));
        assert!(policy.includes(None));
        assert!(policy.includes(Some("true")));
        assert!(!policy.includes(Some("0")));
    }

    #[test]
    fn checked_only_excludes_anything_but_one() {
        let policy = CheckedOnly;
        assert!(policy.includes(Some("1")));
        assert!(policy.includes(None));
        assert!(!policy.includes(Some("0")));
        assert!(!policy.includes(Some("")));
        assert!(!policy.includes(Some("true")));
    }

    #[test]
    fn threshold_selects_policy() {
        assert_eq!(policy_for(ProjectVersion::UNKNOWN).name(), "checked-only");
        assert_eq!(policy_for(ProjectVersion::new(3, 24, 99)).name(), "checked-only");
        assert_eq!(policy_for(FULL_ENUMERATION_SINCE).name(), "full-enumeration");
        assert_eq!(policy_for(ProjectVersion::new(3, 34, 0)).name(), "full-enumeration");
    }
}
