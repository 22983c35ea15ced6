use std::fs;
use std::path::PathBuf;

use failure::Error;
use failure_derive::Fail;

use mappings::repo::REPACKAGE_SUFFIX;
use mappings::MinecraftVersion;

/// The directories a remap run works in, all under one build directory.
#[derive(Clone, Debug)]
pub struct ProjectPaths {
    build_dir: PathBuf,
}
impl ProjectPaths {
    /// Create the working directories up front.
    pub fn setup(build_dir: PathBuf) -> Result<ProjectPaths, Error> {
        let paths = ProjectPaths { build_dir };
        fs::create_dir_all(paths.tmp_dir())?;
        fs::create_dir_all(paths.libs_dir())?;
        fs::create_dir_all(paths.mappings_dir())?;
        Ok(paths)
    }
    /// Scratch space for intermediate artifacts.
    #[inline]
    pub fn tmp_dir(&self) -> PathBuf {
        self.build_dir.join("tmp")
    }
    /// Where retained artifacts end up.
    #[inline]
    pub fn libs_dir(&self) -> PathBuf {
        self.build_dir.join("libs")
    }
    /// The mapping cache location.
    #[inline]
    pub fn mappings_dir(&self) -> PathBuf {
        self.build_dir.join("mappings")
    }
}

/// Everything a single pipeline run needs to know, passed explicitly
/// so repeated runs can't observe stale version state.
#[derive(Clone, Debug)]
pub struct RemapConfig {
    pub version: MinecraftVersion,
    pub input_jar: PathBuf,
    pub paths: ProjectPaths,
}

#[derive(Debug, Fail)]
#[fail(display = "Could not resolve the target minecraft version from {:?}\n\
                  Pass the spigot dependency version, like 1.19.4-R0.1-SNAPSHOT", notation)]
pub struct UnresolvedVersion {
    notation: String,
}

/// Resolve a version from either a plain version string or the full
/// spigot dependency notation (`1.19.4-R0.1-SNAPSHOT`).
pub fn resolve_version(notation: &str) -> Result<MinecraftVersion, Error> {
    let plain = notation.strip_suffix(REPACKAGE_SUFFIX).unwrap_or(notation);
    plain.parse()
        .map_err(|_| UnresolvedVersion { notation: notation.into() }.into())
}
