use std::fmt::{self, Display, Formatter};
use std::path::PathBuf;

use mappings::MappingTable;

/// The symbol naming schemes an artifact passes through.
#[derive(Copy, Clone, Debug, Eq, PartialEq, Hash)]
pub enum Namespace {
    /// The published mojang names plugins compile against.
    Mojang,
    /// The obfuscated runtime names.
    Official,
    /// The spigot distribution names.
    Spigot,
    /// The version independent CVN names.
    Intermediary,
}
impl Namespace {
    #[inline]
    pub fn id(self) -> &'static str {
        match self {
            Namespace::Mojang => "mojang",
            Namespace::Official => "official",
            Namespace::Spigot => "spigot",
            Namespace::Intermediary => "intermediary",
        }
    }
}
impl Display for Namespace {
    fn fmt(&self, f: &mut Formatter) -> fmt::Result {
        f.write_str(self.id())
    }
}

/// How much of a mapping table a stage applies.
#[derive(Copy, Clone, Debug, Eq, PartialEq)]
pub enum TransformKind {
    Classes,
    ClassesAndMembers,
}
impl Display for TransformKind {
    fn fmt(&self, f: &mut Formatter) -> fmt::Result {
        f.write_str(match *self {
            TransformKind::Classes => "classes",
            TransformKind::ClassesAndMembers => "classes and members",
        })
    }
}

/// One remap stage: translate the current artifact between two
/// namespaces using a fully resolved mapping table.
pub struct PipelineStage {
    pub original: Namespace,
    pub renamed: Namespace,
    pub kind: TransformKind,
    pub mappings: MappingTable,
    /// Reference archive for resolving inherited member renames,
    /// only needed by the final stage.
    pub classpath: Option<PathBuf>,
    /// Let unresolved member conflicts pass through unchanged instead
    /// of aborting.
    pub ignore_conflicts: bool,
    /// Keep the produced artifact after the run; transient otherwise.
    pub retained: bool,
}
