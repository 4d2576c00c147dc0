use std::{
    fmt::{self, Display},
    str::FromStr,
};

use crate::error::VersionError;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Version {
    pub major: u32,
    pub minor: u32,
    pub patch: Option<u32>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Snapshot {
    pub year: u32,
    pub week: u32,
    pub build: char,
}

/// How the game reports the profile in `--versionType`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum MinecraftVersion {
    Release(Version),
    Snapshot(Snapshot),
    /// Modded or otherwise unrecognised profile id, kept verbatim.
    Custom(String),
}

impl MinecraftVersion {
    pub fn classify(id: &str) -> Self {
        let id = id.trim();
        if let Ok(ver) = Version::from_str(id) {
            return MinecraftVersion::Release(ver);
        }
        if let Ok(snap) = Snapshot::from_str(id) {
            return MinecraftVersion::Snapshot(snap);
        }
        MinecraftVersion::Custom(id.to_string())
    }

    pub fn version_type(&self) -> &'static str {
        match self {
            MinecraftVersion::Release(_) => "release",
            MinecraftVersion::Snapshot(_) => "snapshot",
            MinecraftVersion::Custom(_) => "custom",
        }
    }
}

impl Display for Version {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.patch {
            Some(patch) => write!(f, "{}.{}.{}", self.major, self.minor, patch),
            None => write!(f, "{}.{}", self.major, self.minor),
        }
    }
}

impl Display for Snapshot {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}w{:02}{}", self.year, self.week, self.build)
    }
}

impl Display for MinecraftVersion {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            MinecraftVersion::Release(v) => v.fmt(f),
            MinecraftVersion::Snapshot(s) => s.fmt(f),
            MinecraftVersion::Custom(id) => f.write_str(id),
        }
    }
}

impl FromStr for Version {
    type Err = VersionError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let mut split = s.split('.');

        let major_str = split
            .next()
            .filter(|v| !v.is_empty())
            .ok_or(VersionError::MissingMajor)?;
        let minor_str = split.next().ok_or(VersionError::MissingMinor)?;
        let patch_str = split.next();

        if split.next().is_some() {
            return Err(VersionError::ExtraComponents);
        }

        let major = major_str
            .parse::<u32>()
            .map_err(|_| VersionError::IncorrectMajor(major_str.to_string()))?;

        let minor = minor_str
            .parse::<u32>()
            .map_err(|_| VersionError::IncorrectMinor(minor_str.to_string()))?;

        let patch = patch_str
            .map(|p| {
                p.parse::<u32>()
                    .map_err(|_| VersionError::IncorrectPatch(p.to_string()))
            })
            .transpose()?;

        Ok(Self {
            major,
            minor,
            patch,
        })
    }
}

impl FromStr for Snapshot {
    type Err = VersionError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let (year_str, rest) = s
            .split_once('w')
            .ok_or(VersionError::InvalidSnapshotFormat)?;

        if rest.len() != 3 || !rest.is_char_boundary(2) {
            return Err(VersionError::InvalidSnapshotFormat);
        }

        let week_str = &rest[..2];
        let build_str = &rest[2..];

        let year = year_str
            .parse::<u32>()
            .map_err(|_| VersionError::IncorrectYear(year_str.to_string()))?;

        let week = week_str
            .parse::<u32>()
            .map_err(|_| VersionError::IncorrectWeek(week_str.to_string()))?;

        let build = match build_str.chars().next() {
            Some(c) if c.is_ascii_lowercase() => c,
            _ => return Err(VersionError::IncorrectBuild(build_str.to_string())),
        };

        Ok(Self { year, week, build })
    }
}
