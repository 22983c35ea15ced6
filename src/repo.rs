//! Locating upstream build artifacts in a local maven repository layout.
use std::env;
use std::path::PathBuf;

use failure::Error;
use failure_derive::Fail;

use crate::MinecraftVersion;

pub const SPIGOT_GROUP: &str = "org.spigotmc";
pub const SPIGOT_ARTIFACT: &str = "spigot";
pub const SERVER_ARTIFACT: &str = "minecraft-server";
/// The suffix spigot appends to every repackaged artifact version.
pub const REPACKAGE_SUFFIX: &str = "-R0.1-SNAPSHOT";

const BUILD_TOOLS_HINT: &str =
    "Please make sure you have ran BuildTools with the --remapped option";

#[derive(Debug, Fail)]
#[fail(display = "Missing {} at {:?}\n{}", what, path, hint)]
pub struct MissingArtifact {
    pub what: &'static str,
    pub path: PathBuf,
    pub hint: &'static str,
}

pub struct MavenRepo {
    root: PathBuf,
}
impl MavenRepo {
    #[inline]
    pub fn new(root: PathBuf) -> MavenRepo {
        MavenRepo { root }
    }
    /// The repository BuildTools installs into: `~/.m2/repository`.
    pub fn user_default() -> Result<MavenRepo, Error> {
        let home = env::var_os("HOME")
            .or_else(|| env::var_os("USERPROFILE"))
            .ok_or_else(|| failure::format_err!("Could not determine the home directory"))?;
        let mut root = PathBuf::from(home);
        root.push(".m2");
        root.push("repository");
        Ok(MavenRepo::new(root))
    }
    fn artifact_dir(&self, group: &str, artifact: &str, version: &str) -> PathBuf {
        let mut dir = self.root.clone();
        for part in group.split('.') {
            dir.push(part);
        }
        dir.push(artifact);
        dir.push(version);
        dir
    }
    fn server_file(&self, version: MinecraftVersion, suffix: &str) -> PathBuf {
        let notation = format!("{}{}", version, REPACKAGE_SUFFIX);
        self.artifact_dir(SPIGOT_GROUP, SERVER_ARTIFACT, &notation)
            .join(format!("{}-{}-{}", SERVER_ARTIFACT, notation, suffix))
    }
    /// The mojang obfuscation table, stored obfuscated-first.
    pub fn mojang_mappings(&self, version: MinecraftVersion) -> Result<PathBuf, Error> {
        require(self.server_file(version, "maps-mojang.txt"), "mojang mapping table")
    }
    /// The spigot class rename table.
    pub fn spigot_class_mappings(&self, version: MinecraftVersion) -> Result<PathBuf, Error> {
        require(self.server_file(version, "maps-spigot.csrg"), "spigot mapping table")
    }
    /// The spigot member rename table. Not every version ships one.
    pub fn spigot_member_mappings(&self, version: MinecraftVersion) -> Option<PathBuf> {
        let path = self.server_file(version, "maps-spigot-members.csrg");
        if path.is_file() { Some(path) } else { None }
    }
    /// The remapped server jar, used as the classpath when resolving
    /// inherited member renames.
    pub fn classpath_jar(&self, version: MinecraftVersion) -> Result<PathBuf, Error> {
        let notation = format!("{}{}", version, REPACKAGE_SUFFIX);
        let path = self.artifact_dir(SPIGOT_GROUP, SPIGOT_ARTIFACT, &notation)
            .join(format!("{}-{}.jar", SPIGOT_ARTIFACT, notation));
        require(path, "classpath jar")
    }
}

fn require(path: PathBuf, what: &'static str) -> Result<PathBuf, Error> {
    if path.is_file() {
        Ok(path)
    } else {
        Err(MissingArtifact { what, path, hint: BUILD_TOOLS_HINT }.into())
    }
}
