//! End to end pipeline runs against fixture repositories, with a
//! recording copy-through engine standing in for the external remapper.
use std::cell::RefCell;
use std::fs::{self, File};
use std::io::{BufReader, Write};
use std::path::{Path, PathBuf};

use failure::Error;
use tempfile::TempDir;
use zip::write::FileOptions;
use zip::ZipWriter;

use mappings::cache::MappingsCache;
use mappings::formats::MultiMappingsFile;
use mappings::repo::MavenRepo;
use minecraft_remap_pipeline::{
    mover, JarRemapper, Namespace, ProjectPaths, RemapConfig, RemapJob, RemapPipeline,
};

struct RecordedJob {
    original_namespace: String,
    renamed_namespace: String,
    input: PathBuf,
    output: PathBuf,
    classpath: Option<PathBuf>,
    ignore_conflicts: bool,
    class_entries: Vec<(String, String)>,
}

#[derive(Default)]
struct RecordingRemapper {
    jobs: RefCell<Vec<RecordedJob>>,
}
impl JarRemapper for RecordingRemapper {
    fn remap(&self, job: &RemapJob) -> Result<(), Error> {
        self.jobs.borrow_mut().push(RecordedJob {
            original_namespace: job.mappings.original_namespace().into(),
            renamed_namespace: job.mappings.renamed_namespace().into(),
            input: job.input.to_owned(),
            output: job.output.to_owned(),
            classpath: job.classpath.map(Path::to_owned),
            ignore_conflicts: job.ignore_conflicts,
            class_entries: job.mappings.classes()
                .map(|(original, renamed)| (original.into(), renamed.into()))
                .collect(),
        });
        fs::copy(job.input, job.output)?;
        Ok(())
    }
}

struct Fixture {
    dir: TempDir,
    config: RemapConfig,
    cache: MappingsCache,
    repo: MavenRepo,
}

const INTERMEDIARY_TINY: &str = "\
v1\tofficial\tintermediary
CLASS\ta\tnet/cvn/class_0
CLASS\tq\tnet/cvn/class_1
FIELD\ta\tI\tfoo\tfield_0
METHOD\ta\t()V\tbar\tmethod_0
";

// Stored obfuscated-first, inverted on load
const MOJANG_MAPS: &str = "\
a net/minecraft/world/entity/Entity
a entityFoo foo
";

const SPIGOT_CLASS_MAPS: &str = "\
a net/minecraft/server/Entity
q net/minecraft/server/World
";

// Owners are written in the renamed (spigot) names
const SPIGOT_MEMBER_MAPS: &str = "\
net/minecraft/server/Entity foo fooField
";

const CRAFTBUKKIT_POM: &str = "\
<project>\n  <properties>\n    <minecraft_version>1_16_R3</minecraft_version>\n  </properties>\n</project>\n";

fn write_plugin_jar(path: &Path) {
    let mut writer = ZipWriter::new(File::create(path).unwrap());
    writer.start_file("plugin.yml".to_string(), FileOptions::default()).unwrap();
    writer.write_all(b"name:Test\nversion:1.0\n").unwrap();
    writer.start_file("com/example/Main.class".to_string(), FileOptions::default()).unwrap();
    writer.write_all(b"\xca\xfe\xba\xbe fake").unwrap();
    writer.finish().unwrap();
}

fn setup(version: &str, with_members: bool) -> Fixture {
    let dir = tempfile::tempdir().unwrap();
    let paths = ProjectPaths::setup(dir.path().join("build")).unwrap();

    // A populated local maven repository
    let notation = format!("{}-R0.1-SNAPSHOT", version);
    let server_dir = dir.path()
        .join("repository/org/spigotmc/minecraft-server")
        .join(&notation);
    fs::create_dir_all(&server_dir).unwrap();
    fs::write(
        server_dir.join(format!("minecraft-server-{}-maps-mojang.txt", notation)),
        MOJANG_MAPS
    ).unwrap();
    fs::write(
        server_dir.join(format!("minecraft-server-{}-maps-spigot.csrg", notation)),
        SPIGOT_CLASS_MAPS
    ).unwrap();
    if with_members {
        fs::write(
            server_dir.join(format!("minecraft-server-{}-maps-spigot-members.csrg", notation)),
            SPIGOT_MEMBER_MAPS
        ).unwrap();
    }
    let spigot_dir = dir.path()
        .join("repository/org/spigotmc/spigot")
        .join(&notation);
    fs::create_dir_all(&spigot_dir).unwrap();
    fs::write(spigot_dir.join(format!("spigot-{}.jar", notation)), b"reference jar").unwrap();

    // Pre-seeded cache: any network fetch would hit the invalid urls
    let cache = MappingsCache::setup(paths.mappings_dir()).unwrap()
        .with_mappings_url("invalid://nowhere/{}.tiny")
        .with_craftbukkit_pom_url("invalid://nowhere/{}.pom");
    fs::write(
        paths.mappings_dir().join(format!("mappings-{}-intermediary-original.tiny", version)),
        INTERMEDIARY_TINY
    ).unwrap();
    fs::write(
        paths.mappings_dir().join(format!("craftbukkit-{}.pom", version)),
        CRAFTBUKKIT_POM
    ).unwrap();

    let input_jar = dir.path().join("my-plugin.jar");
    write_plugin_jar(&input_jar);

    let repo = MavenRepo::new(dir.path().join("repository"));
    let config = RemapConfig {
        version: version.parse().unwrap(),
        input_jar,
        paths,
    };
    Fixture { dir, config, cache, repo }
}

fn final_table(fixture: &Fixture) -> mappings::MappingTable {
    let path = fixture.cache.final_mappings_path(fixture.config.version);
    let file = MultiMappingsFile::parse_stream(BufReader::new(File::open(path).unwrap())).unwrap();
    file.table("spigot", "intermediary").unwrap()
}

#[test]
fn legacy_version_runs_all_stages_with_package_retrofit() {
    let fixture = setup("1.16.5", true);
    let remapper = RecordingRemapper::default();
    let pipeline = RemapPipeline::new(&fixture.config, &fixture.cache, &fixture.repo, &remapper);
    let output = pipeline.run().unwrap();

    let jobs = remapper.jobs.borrow();
    assert_eq!(jobs.len(), 3);
    assert_eq!(jobs[0].original_namespace, "mojang");
    assert_eq!(jobs[0].renamed_namespace, "official");
    assert!(jobs[0].classpath.is_none());
    assert!(!jobs[0].ignore_conflicts);
    // The obfuscation table was inverted on load
    assert!(jobs[0].class_entries.contains(
        &("net/minecraft/world/entity/Entity".into(), "a".into())
    ));

    assert_eq!(jobs[1].original_namespace, "official");
    assert_eq!(jobs[1].renamed_namespace, "spigot");

    // The stages form a linear chain over the tmp artifacts
    assert!(jobs[0].input.ends_with("my-plugin-original.jar"));
    assert_eq!(jobs[1].input, jobs[0].output);
    assert_eq!(jobs[2].input, jobs[1].output);

    assert_eq!(jobs[2].original_namespace, "spigot");
    assert_eq!(jobs[2].renamed_namespace, "intermediary");
    assert!(jobs[2].ignore_conflicts);
    let classpath = jobs[2].classpath.as_ref().unwrap();
    assert!(classpath.ends_with("spigot-1.16.5-R0.1-SNAPSHOT.jar"));

    // The generated table carries the version suffixed packages, so no
    // unsuffixed vendor path survives into the final stage
    let table = final_table(&fixture);
    assert_eq!(table.remap_class("net/minecraft/server/v1_16_R3/Entity"), "net/cvn/class_0");
    assert_eq!(table.remap_class("net/minecraft/server/v1_16_R3/World"), "net/cvn/class_1");
    assert_eq!(table.get_remapped_class("net/minecraft/server/Entity"), None);
    // Members were combined and rebased onto the spigot owners
    let (field, renamed) = table.fields().next().unwrap();
    assert_eq!(field.owner, "net/minecraft/server/Entity");
    assert_eq!(field.name, "foo");
    assert_eq!(renamed, "field_0");

    // Visible artifact set: original, spigot, intermediary - the
    // official jar was transient and deleted
    let tmp = fixture.config.paths.tmp_dir();
    assert!(tmp.join("my-plugin-original.jar").is_file());
    assert!(tmp.join("my-plugin-spigot.jar").is_file());
    assert!(tmp.join("my-plugin-intermediary.jar").is_file());
    assert!(tmp.join("my-plugin.jar").is_file());
    assert!(!tmp.join("my-plugin-official.jar").exists());
    let namespaces = output.artifacts.iter().map(|a| a.namespace).collect::<Vec<_>>();
    assert_eq!(namespaces, [Namespace::Mojang, Namespace::Spigot, Namespace::Intermediary]);

    // Relocation drains the retained artifacts into the libs directory
    mover::move_artifacts(&output.moves);
    let libs = fixture.config.paths.libs_dir();
    assert!(libs.join("my-plugin-original.jar").is_file());
    assert!(libs.join("my-plugin-spigot.jar").is_file());
    assert!(libs.join("my-plugin.jar").is_file());
    assert!(!tmp.join("my-plugin-original.jar").exists());
    assert!(!tmp.join("my-plugin.jar").exists());
}

#[test]
fn modern_version_skips_package_retrofit() {
    let fixture = setup("1.18", false);
    let remapper = RecordingRemapper::default();
    let pipeline = RemapPipeline::new(&fixture.config, &fixture.cache, &fixture.repo, &remapper);
    let output = pipeline.run().unwrap();

    let jobs = remapper.jobs.borrow();
    assert_eq!(jobs.len(), 3);
    // No member table, so the vendor stage is class-only
    assert_eq!(jobs[1].class_entries.len(), 2);

    // The generated table keeps the canonical package layout
    let table = final_table(&fixture);
    assert_eq!(table.remap_class("net/minecraft/server/Entity"), "net/cvn/class_0");
    assert_eq!(table.get_remapped_class("net/minecraft/server/v1_16_R3/Entity"), None);

    let namespaces = output.artifacts.iter().map(|a| a.namespace).collect::<Vec<_>>();
    assert_eq!(namespaces, [Namespace::Mojang, Namespace::Spigot, Namespace::Intermediary]);
}

#[test]
fn generated_mappings_are_reused_across_runs() {
    let fixture = setup("1.18", false);
    let remapper = RecordingRemapper::default();
    RemapPipeline::new(&fixture.config, &fixture.cache, &fixture.repo, &remapper)
        .run().unwrap();
    // Poison the downloaded table; a second run must not re-derive from it
    fs::write(
        fixture.config.paths.mappings_dir().join("mappings-1.18-intermediary-original.tiny"),
        "v1\tofficial\tintermediary\nCLASS\ta\tnet/cvn/other\n"
    ).unwrap();
    RemapPipeline::new(&fixture.config, &fixture.cache, &fixture.repo, &remapper)
        .run().unwrap();
    let table = final_table(&fixture);
    assert_eq!(table.remap_class("net/minecraft/server/Entity"), "net/cvn/class_0");
}

#[test]
fn missing_prerequisites_abort_before_any_remap() {
    let fixture = setup("1.18", false);
    let notation = "1.18-R0.1-SNAPSHOT";
    let jar = fixture.dir.path()
        .join("repository/org/spigotmc/spigot")
        .join(notation)
        .join(format!("spigot-{}.jar", notation));
    fs::remove_file(jar).unwrap();
    let remapper = RecordingRemapper::default();
    let error = RemapPipeline::new(&fixture.config, &fixture.cache, &fixture.repo, &remapper)
        .run().unwrap_err();
    assert!(error.downcast_ref::<mappings::repo::MissingArtifact>().is_some());
    assert!(remapper.jobs.borrow().is_empty());
    assert!(!fixture.config.paths.tmp_dir().join("my-plugin-original.jar").exists());
}
