//! Drives a compiled plugin jar through the chain of namespace remaps
//! needed to target the version independent CVN runtime:
//! `mojang -> official -> spigot -> intermediary`.
//!
//! The orchestration here decides, per target version, which mapping
//! tables are needed, generates the derived ones, and runs the stages
//! strictly in sequence. The actual bytecode rewriting is delegated to
//! an external [`JarRemapper`](remapper::JarRemapper).
extern crate failure;
extern crate failure_derive;
extern crate indexmap;
extern crate log;
extern crate md5;
extern crate scopeguard;
extern crate walkdir;
extern crate zip;

extern crate mappings;

pub mod config;
pub mod jar;
pub mod mover;
pub mod pipeline;
pub mod remapper;
pub mod stage;

pub use self::config::{ProjectPaths, RemapConfig};
pub use self::pipeline::{Artifact, PipelineOutput, RemapPipeline, FIRST_MOJMAP_VERSION};
pub use self::remapper::{JarRemapper, RemapJob};
pub use self::stage::{Namespace, PipelineStage, TransformKind};
