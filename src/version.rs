use std::cmp::Ordering;
use std::fmt::{self, Display, Formatter};
use std::str::FromStr;

use failure_derive::Fail;

/// A minecraft version of the form `major.minor` or `major.minor.patch`.
///
/// The patch component is optional and its absence is remembered,
/// so `1.16` and `1.16.0` are distinct versions. A missing patch
/// compares as the literal value `-1`, which makes `1.16` order
/// before `1.16.0` - that quirk is load bearing for the version
/// threshold checks and must not be changed.
#[derive(Copy, Clone, Debug, Eq, PartialEq, Hash)]
pub struct MinecraftVersion {
    pub major: u32,
    pub minor: u32,
    pub patch: Option<u32>,
}
impl MinecraftVersion {
    #[inline]
    fn patch_key(self) -> i64 {
        self.patch.map_or(-1, i64::from)
    }
    #[inline]
    pub(crate) fn unknown(self) -> UnknownMinecraftVersion {
        UnknownMinecraftVersion(self)
    }
}
impl Ord for MinecraftVersion {
    fn cmp(&self, other: &MinecraftVersion) -> Ordering {
        (self.major, self.minor, self.patch_key())
            .cmp(&(other.major, other.minor, other.patch_key()))
    }
}
impl PartialOrd for MinecraftVersion {
    #[inline]
    fn partial_cmp(&self, other: &MinecraftVersion) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}
impl FromStr for MinecraftVersion {
    type Err = InvalidMinecraftVersion;

    fn from_str(s: &str) -> Result<Self, InvalidMinecraftVersion> {
        let mut parts = s.split('.');
        let error = || InvalidMinecraftVersion(s.into());
        let major = parts.next()
            .and_then(|s| s.parse().ok())
            .ok_or_else(error)?;
        let minor = parts.next()
            .and_then(|s| s.parse().ok())
            .ok_or_else(error)?;
        let patch = match parts.next() {
            Some(s) => Some(s.parse().ok().ok_or_else(error)?),
            None => None
        };
        if parts.next().is_some() {
            return Err(error())
        }
        Ok(MinecraftVersion { major, minor, patch })
    }
}
impl Display for MinecraftVersion {
    fn fmt(&self, f: &mut Formatter) -> fmt::Result {
        write!(f, "{}.{}", self.major, self.minor)?;
        if let Some(patch) = self.patch {
            write!(f, ".{}", patch)?;
        }
        Ok(())
    }
}
#[derive(Debug, Fail)]
#[fail(display = "Invalid minecraft version {:?}", _0)]
pub struct InvalidMinecraftVersion(String);
#[derive(Debug, Fail)]
#[fail(display = "Unknown minecraft version {}", _0)]
pub struct UnknownMinecraftVersion(MinecraftVersion);
