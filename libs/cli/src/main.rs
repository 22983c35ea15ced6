#[macro_use]
extern crate clap;
extern crate env_logger;
extern crate failure;
extern crate mappings;
extern crate pipeline;

use std::fs::{self, File};
use std::io::BufWriter;
use std::path::{Path, PathBuf};
use std::process::Command;

use failure::{bail, Error};

use mappings::cache::MappingsCache;
use mappings::formats::MultiMappingsFile;
use mappings::repo::MavenRepo;
use pipeline::{config, mover, JarRemapper, Namespace, ProjectPaths, RemapConfig, RemapJob, RemapPipeline};

fn app() -> clap::App<'static, 'static> {
    clap_app!(minecraft_remap =>
        (version: crate_version!())
        (author: crate_authors!())
        (about: "Remaps a compiled plugin jar to the spigot and CVN intermediary namespaces")
        (@arg build_dir: --("build-dir") +takes_value default_value[build] "The build directory to work in")
        (@arg maven_repo: --("maven-repo") +takes_value "An alternate maven repository location")
        (@arg mappings_url: --("mappings-url") +takes_value "An alternate mappings download url template")
        (@arg remapper: --remapper +takes_value +required "The external jar remapper command to invoke")
        (@arg version: +required "The target minecraft version, plain or spigot dependency notation")
        (@arg jar: +required "The compiled plugin jar to remap")
    )
}

fn main() -> Result<(), Error> {
    env_logger::init();
    let matches = app().get_matches();
    let version = config::resolve_version(matches.value_of("version").unwrap())?;
    let input_jar = PathBuf::from(matches.value_of("jar").unwrap());
    let paths = ProjectPaths::setup(PathBuf::from(matches.value_of("build_dir").unwrap()))?;
    let repo = match matches.value_of("maven_repo") {
        Some(path) => MavenRepo::new(PathBuf::from(path)),
        None => MavenRepo::user_default()?,
    };
    let mut cache = MappingsCache::setup(paths.mappings_dir())?;
    if let Some(url) = matches.value_of("mappings_url") {
        cache = cache.with_mappings_url(url);
    }
    let remapper = CommandJarRemapper {
        program: matches.value_of("remapper").unwrap().to_owned(),
    };

    let config = RemapConfig { version, input_jar, paths };
    let output = RemapPipeline::new(&config, &cache, &repo, &remapper).run()?;
    mover::move_artifacts(&output.moves);

    println!("Finished remapping jars. Jar:");
    println!("Intermediary mapped (to be used with CVN): {}", file_name(&output.final_jar));
    for artifact in &output.artifacts {
        match artifact.namespace {
            Namespace::Spigot => {
                println!("Spigot mapped (to be used like normal): {}", file_name(&artifact.path))
            }
            Namespace::Mojang => {
                println!("Original (Unmapped): {}", file_name(&artifact.path))
            }
            _ => {}
        }
    }
    Ok(())
}

fn file_name(path: &Path) -> String {
    path.file_name()
        .map(|name| name.to_string_lossy().into_owned())
        .unwrap_or_default()
}

/// Shells out to an external remap engine, materializing the stage
/// table to a file the engine can read.
struct CommandJarRemapper {
    program: String,
}
impl JarRemapper for CommandJarRemapper {
    fn remap(&self, job: &RemapJob) -> Result<(), Error> {
        let mappings_file = job.output.with_extension("tiny");
        MultiMappingsFile::from_table(job.mappings)
            .write(BufWriter::new(File::create(&mappings_file)?))?;
        let mut command = Command::new(&self.program);
        command
            .arg("--input").arg(job.input)
            .arg("--output").arg(job.output)
            .arg("--mappings").arg(&mappings_file)
            .arg("--from").arg(job.mappings.original_namespace())
            .arg("--to").arg(job.mappings.renamed_namespace());
        if let Some(classpath) = job.classpath {
            command.arg("--classpath").arg(classpath);
        }
        if job.ignore_conflicts {
            command.arg("--ignore-conflicts");
        }
        let status = command.status()?;
        if !status.success() {
            bail!("Remapper {} failed: {}", self.program, status)
        }
        fs::remove_file(&mappings_file)?;
        Ok(())
    }
}
