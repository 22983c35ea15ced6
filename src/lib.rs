//! Mapping data for remapping compiled plugin jars between the naming
//! schemes used by different minecraft server distributions:
//! - `mojang` - The names mojang publishes, which plugins compile against.
//! - `official` - The obfuscated runtime names, used to bridge everything else.
//! - `spigot` - The names used by spigot's remapped server distribution.
//! - `intermediary` - The version independent CVN names.
//!
//! This crate holds the data model: versions, mapping tables, the two
//! textual codecs, table merging and the on-disk mapping cache.
//! Driving a jar through the remap stages lives in `minecraft-remap-pipeline`.
extern crate indexmap;
extern crate failure;
extern crate failure_derive;
extern crate itertools;
extern crate log;
extern crate curl;

pub mod cache;
pub mod formats;
pub mod mappings;
pub mod merge;
pub mod repo;
mod version;
mod utils;

pub use self::mappings::{MappingTable, MemberRef};
pub use self::version::{InvalidMinecraftVersion, MinecraftVersion, UnknownMinecraftVersion};
