//! The on-disk mapping cache.
//!
//! Every file is keyed by version and reused unconditionally once it
//! exists; there is no freshness check. Downloads and derived-table
//! generation only happen on a miss, and an unresolvable miss is fatal.
use std::fs;
use std::path::{Path, PathBuf};

use failure::Error;
use failure_derive::Fail;
use log::info;

use crate::MinecraftVersion;
use crate::utils;

/// Where the version independent CVN mapping tables are published.
pub const DEFAULT_MAPPINGS_URL: &str =
    "https://raw.githubusercontent.com/Cross-Version-NMS/CVN-mappings/main/mappings/{}.tiny";
/// Where the craftbukkit build descriptor for a version can be fetched.
pub const DEFAULT_CRAFTBUKKIT_POM_URL: &str =
    "https://hub.spigotmc.org/stash/projects/SPIGOT/repos/craftbukkit/raw/pom.xml?at={}";

#[derive(Debug, Fail)]
#[fail(display = "No {} property in the craftbukkit build descriptor", field)]
pub struct MissingBuildProperty {
    pub field: &'static str,
}

pub struct MappingsCache {
    location: PathBuf,
    mappings_url: String,
    craftbukkit_pom_url: String,
}
impl MappingsCache {
    pub fn setup(location: PathBuf) -> Result<MappingsCache, Error> {
        fs::create_dir_all(&location)?;
        Ok(MappingsCache {
            location,
            mappings_url: DEFAULT_MAPPINGS_URL.into(),
            craftbukkit_pom_url: DEFAULT_CRAFTBUKKIT_POM_URL.into(),
        })
    }
    pub fn with_mappings_url(mut self, url: impl Into<String>) -> MappingsCache {
        self.mappings_url = url.into();
        self
    }
    pub fn with_craftbukkit_pom_url(mut self, url: impl Into<String>) -> MappingsCache {
        self.craftbukkit_pom_url = url.into();
        self
    }
    #[inline]
    pub fn location(&self) -> &Path {
        &self.location
    }
    /// The downloaded intermediary table for a version, fetching it on a
    /// miss. A 404 means the version has no published mappings.
    pub fn intermediary_mappings(&self, version: MinecraftVersion) -> Result<PathBuf, Error> {
        let location = self.location
            .join(format!("mappings-{}-intermediary-original.tiny", version));
        if !location.exists() {
            let url = self.mappings_url.replace("{}", &version.to_string());
            info!("Downloading mappings {}", url);
            match utils::download_to_file(&url, &location) {
                Err(ref e) if e.downcast_ref::<utils::HttpNotFound>().is_some() => {
                    return Err(version.unknown().into())
                }
                Err(e) => return Err(e),
                Ok(()) => info!("Downloaded mappings to {}", location.display()),
            }
        }
        Ok(location)
    }
    /// Where the generated final mapping table for a version lives.
    pub fn final_mappings_path(&self, version: MinecraftVersion) -> PathBuf {
        self.location.join(format!("mappings-{}-intermediary.tiny", version))
    }
    /// Where the generated combined spigot table for a version lives.
    pub fn combined_mappings_path(&self, version: MinecraftVersion) -> PathBuf {
        self.location.join(format!("bukkit-{}-combined.csrg", version))
    }
    /// Run `generate` to produce a derived mapping file, unless it
    /// already exists.
    pub fn ensure_derived<F>(&self, location: &Path, generate: F) -> Result<(), Error>
        where F: FnOnce(&Path) -> Result<(), Error> {
        if location.exists() {
            return Ok(())
        }
        if let Some(parent) = location.parent() {
            fs::create_dir_all(parent)?;
        }
        generate(location)
    }
    /// The craftbukkit package notation for a version (`1_16_R3` style),
    /// read from the `minecraft_version` property of the fetched build
    /// descriptor.
    pub fn craftbukkit_package_notation(&self, version: MinecraftVersion) -> Result<String, Error> {
        let location = self.location.join(format!("craftbukkit-{}.pom", version));
        if !location.exists() {
            let url = self.craftbukkit_pom_url.replace("{}", &version.to_string());
            info!("Fetching craftbukkit build descriptor {}", url);
            utils::download_to_file(&url, &location)?;
        }
        let descriptor = fs::read_to_string(&location)?;
        extract_tag_text(&descriptor, "minecraft_version")
            .ok_or_else(|| MissingBuildProperty { field: "minecraft_version" }.into())
    }
}

/// Pull the text of the first `<tag>...</tag>` element out of a
/// document. The descriptor is tiny and only one field is ever read,
/// so this doesn't try to be a real XML parser.
fn extract_tag_text(document: &str, tag: &str) -> Option<String> {
    let open = format!("<{}>", tag);
    let close = format!("</{}>", tag);
    let start = document.find(&open)? + open.len();
    let end = document[start..].find(&close)? + start;
    Some(document[start..end].trim().to_string())
}
