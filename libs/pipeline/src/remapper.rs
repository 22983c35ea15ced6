use std::path::Path;

use failure::Error;

use mappings::MappingTable;

/// One invocation of the external remap engine.
pub struct RemapJob<'a> {
    pub input: &'a Path,
    pub output: &'a Path,
    pub mappings: &'a MappingTable,
    /// Reference archive used to resolve inherited member renames.
    pub classpath: Option<&'a Path>,
    /// Let unresolved member conflicts pass through unchanged.
    pub ignore_conflicts: bool,
}

/// An external engine that rewrites every symbolic reference in a jar
/// from the job's original namespace to its renamed namespace.
///
/// The bytecode rewriting itself is out of scope for this crate; the
/// pipeline only decides which jobs to run and in what order.
pub trait JarRemapper {
    fn remap(&self, job: &RemapJob) -> Result<(), Error>;
}
