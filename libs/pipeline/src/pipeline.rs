use std::fs::{self, File};
use std::io::{BufReader, BufWriter};
use std::path::{Path, PathBuf};

use failure::Error;
use failure_derive::Fail;
use log::{debug, info};

use mappings::cache::MappingsCache;
use mappings::formats::{MultiMappingsFile, PairMappingsFormat, PairParseOptions};
use mappings::merge;
use mappings::repo::{MavenRepo, MissingArtifact};
use mappings::{MappingTable, MinecraftVersion};

use crate::config::RemapConfig;
use crate::jar::{self, FinalizeJob};
use crate::remapper::{JarRemapper, RemapJob};
use crate::stage::{Namespace, PipelineStage, TransformKind};

/// The first version with published mojang mappings. Below it the
/// spigot package layout still carries a per-version suffix that the
/// final mapping table has to be retrofitted with.
pub const FIRST_MOJMAP_VERSION: MinecraftVersion =
    MinecraftVersion { major: 1, minor: 17, patch: None };

const NMS_PACKAGE: &str = "net/minecraft/server";

#[derive(Debug, Fail)]
#[fail(display = "Unable to remap {}2{}: {}", original, renamed, cause)]
pub struct StageError {
    original: Namespace,
    renamed: Namespace,
    cause: Error,
}

/// An archive produced by the pipeline.
#[derive(Clone, Debug)]
pub struct Artifact {
    pub namespace: Namespace,
    pub path: PathBuf,
    /// Retained artifacts survive the run; transient ones are deleted
    /// once the next stage has consumed them.
    pub retained: bool,
}

#[derive(Debug)]
pub struct PipelineOutput {
    /// The retained artifacts, in production order.
    pub artifacts: Vec<Artifact>,
    /// Relocations for the retained artifacts.
    pub moves: Vec<(PathBuf, PathBuf)>,
    /// The finalized intermediary jar.
    pub final_jar: PathBuf,
}

/// Remaps one compiled plugin jar through the full namespace chain for
/// one version. Owns every artifact it produces until the run finishes.
pub struct RemapPipeline<'a, R: JarRemapper> {
    config: &'a RemapConfig,
    cache: &'a MappingsCache,
    repo: &'a MavenRepo,
    remapper: &'a R,
}
impl<'a, R: JarRemapper> RemapPipeline<'a, R> {
    pub fn new(
        config: &'a RemapConfig,
        cache: &'a MappingsCache,
        repo: &'a MavenRepo,
        remapper: &'a R
    ) -> Self {
        RemapPipeline { config, cache, repo, remapper }
    }

    pub fn run(&self) -> Result<PipelineOutput, Error> {
        let version = self.config.version;
        // Resolve every prerequisite before touching the filesystem
        let mojang_maps = self.repo.mojang_mappings(version)?;
        let spigot_class_maps = self.repo.spigot_class_mappings(version)?;
        let spigot_member_maps = self.repo.spigot_member_mappings(version);
        let classpath_jar = self.repo.classpath_jar(version)?;
        if !self.config.input_jar.is_file() {
            return Err(MissingArtifact {
                what: "compiled plugin jar",
                path: self.config.input_jar.clone(),
                hint: "Run the jar build before remapping",
            }.into())
        }

        let final_maps = self.ensure_final_mappings(
            &spigot_class_maps,
            spigot_member_maps.as_ref().map(PathBuf::as_path)
        )?;
        let stages = self.build_stages(
            &mojang_maps,
            &spigot_class_maps,
            spigot_member_maps.as_ref().map(PathBuf::as_path),
            &final_maps,
            &classpath_jar
        )?;

        let tmp = self.config.paths.tmp_dir();
        let original = tmp.join(artifact_name(&self.config.input_jar, "original"));
        fs::copy(&self.config.input_jar, &original)?;
        let mut artifacts = vec![Artifact {
            namespace: Namespace::Mojang,
            path: original.clone(),
            retained: true,
        }];

        let mut current = original;
        for stage in &stages {
            let output = tmp.join(artifact_name(&self.config.input_jar, stage.renamed.id()));
            info!("Remapping jar to {} mappings ({})", stage.renamed, stage.kind);
            let job = RemapJob {
                input: &current,
                output: &output,
                mappings: &stage.mappings,
                classpath: stage.classpath.as_ref().map(PathBuf::as_path),
                ignore_conflicts: stage.ignore_conflicts,
            };
            self.remapper.remap(&job).map_err(|cause| StageError {
                original: stage.original,
                renamed: stage.renamed,
                cause,
            })?;
            debug!("Remapped jar to {}", output.display());
            artifacts.push(Artifact {
                namespace: stage.renamed,
                path: output.clone(),
                retained: stage.retained,
            });
            current = output;
        }

        // Finalize the intermediary artifact into a plain plugin jar
        let final_jar = match self.config.input_jar.file_name() {
            Some(name) => tmp.join(name),
            None => tmp.join("plugin.jar"),
        };
        jar::finalize_plugin_jar(&FinalizeJob {
            input: &current,
            output: &final_jar,
            scratch_root: &tmp,
        })?;

        // Transient artifacts have served their purpose
        for artifact in &artifacts {
            if !artifact.retained {
                fs::remove_file(&artifact.path)?;
            }
        }
        artifacts.retain(|artifact| artifact.retained);

        let libs = self.config.paths.libs_dir();
        let mut moves = Vec::with_capacity(artifacts.len());
        for artifact in &artifacts {
            // The intermediary artifact is relocated in its finalized form
            if artifact.namespace == Namespace::Intermediary {
                continue
            }
            moves.push((artifact.path.clone(), libs.clone()));
        }
        moves.push((final_jar.clone(), libs));

        Ok(PipelineOutput { artifacts, moves, final_jar })
    }

    /// Make sure the generated spigot -> intermediary table exists,
    /// deriving it from the downloaded intermediary table and the
    /// spigot tables when absent.
    fn ensure_final_mappings(
        &self,
        class_maps: &Path,
        member_maps: Option<&Path>
    ) -> Result<PathBuf, Error> {
        let version = self.config.version;
        let location = self.cache.final_mappings_path(version);
        if location.exists() {
            return Ok(location)
        }
        let legacy = version < FIRST_MOJMAP_VERSION;
        let intermediary = self.cache.intermediary_mappings(version)?;
        let vendor = match member_maps {
            Some(members) if legacy => {
                let combined = self.ensure_combined_mappings(class_maps, members)?;
                parse_pair(&combined, true)?
            }
            _ => parse_pair(class_maps, false)?,
        };
        self.cache.ensure_derived(&location, |out| {
            info!("Generating final mappings for {}", version);
            let file = MultiMappingsFile::parse_stream(
                BufReader::new(File::open(&intermediary)?)
            )?;
            let primary = file.table(Namespace::Official.id(), Namespace::Intermediary.id())?;
            let mut merged = merge::rebase_original(&primary, &vendor)?;
            if legacy {
                let notation = self.cache.craftbukkit_package_notation(version)?;
                let replacement = format!("{}/v{}", NMS_PACKAGE, notation);
                debug!("Retrofitting package prefix {}", replacement);
                merged = merge::apply_package_prefix(&merged, NMS_PACKAGE, &replacement, true);
            }
            merged.rename_original_namespace(Namespace::Spigot.id());
            MultiMappingsFile::from_table(&merged)
                .write(BufWriter::new(File::create(out)?))?;
            info!("Finished generating final mappings, saved to {}", out.display());
            Ok(())
        })?;
        Ok(location)
    }

    /// Make sure the combined spigot class+member table exists.
    fn ensure_combined_mappings(
        &self,
        class_maps: &Path,
        member_maps: &Path
    ) -> Result<PathBuf, Error> {
        let location = self.cache.combined_mappings_path(self.config.version);
        self.cache.ensure_derived(&location, |out| {
            debug!("Combining spigot mappings into {}", out.display());
            let classes = parse_pair(class_maps, false)?;
            let members = parse_pair(member_maps, true)?;
            let combined = merge::combine_class_members(&classes, &members);
            PairMappingsFormat::write(&combined, BufWriter::new(File::create(out)?))?;
            Ok(())
        })?;
        Ok(location)
    }

    fn build_stages(
        &self,
        mojang_maps: &Path,
        class_maps: &Path,
        member_maps: Option<&Path>,
        final_maps: &Path,
        classpath_jar: &Path
    ) -> Result<Vec<PipelineStage>, Error> {
        let mut stages = Vec::with_capacity(3);
        // The mojang table is stored obfuscated-first and read inverted
        let obfuscate = PairMappingsFormat::parse_stream(
            BufReader::new(File::open(mojang_maps)?),
            Namespace::Mojang.id(),
            Namespace::Official.id(),
            PairParseOptions { members: true, invert: true }
        )?;
        stages.push(PipelineStage {
            original: Namespace::Mojang,
            renamed: Namespace::Official,
            kind: TransformKind::ClassesAndMembers,
            mappings: obfuscate,
            classpath: None,
            ignore_conflicts: false,
            retained: false,
        });

        let (kind, vendor) = match member_maps {
            Some(members) => {
                let combined = self.ensure_combined_mappings(class_maps, members)?;
                (TransformKind::ClassesAndMembers, parse_pair(&combined, true)?)
            }
            None => (TransformKind::Classes, parse_pair(class_maps, false)?),
        };
        stages.push(PipelineStage {
            original: Namespace::Official,
            renamed: Namespace::Spigot,
            kind,
            mappings: vendor,
            classpath: None,
            ignore_conflicts: false,
            retained: true,
        });

        let file = MultiMappingsFile::parse_stream(BufReader::new(File::open(final_maps)?))?;
        let intermediary = file.table(Namespace::Spigot.id(), Namespace::Intermediary.id())?;
        stages.push(PipelineStage {
            original: Namespace::Spigot,
            renamed: Namespace::Intermediary,
            kind: TransformKind::ClassesAndMembers,
            mappings: intermediary,
            // Member completeness can't be guaranteed for every spigot
            // distribution, so the final stage tolerates conflicts and
            // resolves inherited members against the reference jar.
            classpath: Some(classpath_jar.to_owned()),
            ignore_conflicts: true,
            retained: true,
        });
        Ok(stages)
    }
}

fn parse_pair(path: &Path, members: bool) -> Result<MappingTable, Error> {
    PairMappingsFormat::parse_stream(
        BufReader::new(File::open(path)?),
        Namespace::Official.id(),
        Namespace::Spigot.id(),
        PairParseOptions { members, invert: false }
    )
}

/// Insert a namespace suffix before the file extension:
/// `plugin.jar` + `official` -> `plugin-official.jar`.
fn artifact_name(jar: &Path, suffix: &str) -> String {
    let stem = jar.file_stem().and_then(|s| s.to_str()).unwrap_or("plugin");
    match jar.extension().and_then(|s| s.to_str()) {
        Some(extension) => format!("{}-{}.{}", stem, suffix, extension),
        None => format!("{}-{}", stem, suffix),
    }
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn artifact_names() {
        assert_eq!(artifact_name(Path::new("my-plugin-1.0.jar"), "official"),
                   "my-plugin-1.0-official.jar");
        assert_eq!(artifact_name(Path::new("plugin"), "spigot"), "plugin-spigot");
    }

    #[test]
    fn threshold_partitions_versions() {
        let legacy: MinecraftVersion = "1.16.5".parse().unwrap();
        let boundary: MinecraftVersion = "1.17".parse().unwrap();
        let modern: MinecraftVersion = "1.18".parse().unwrap();
        assert!(legacy < FIRST_MOJMAP_VERSION);
        assert!(!(boundary < FIRST_MOJMAP_VERSION));
        assert!(!(modern < FIRST_MOJMAP_VERSION));
    }
}
