//! Finalizing the intermediary artifact: swap the plugin descriptor for
//! a generated placeholder, preserve the original, drop in the loader
//! shim class and repackage.
use std::fmt::{self, Display, Formatter};
use std::fs::{self, File};
use std::io::{self, BufReader, BufWriter};
use std::path::Path;

use failure::Error;
use failure_derive::Fail;
use indexmap::IndexMap;
use md5::{Digest, Md5};
use walkdir::WalkDir;
use zip::write::FileOptions;
use zip::{ZipArchive, ZipWriter};

pub const DESCRIPTOR_NAME: &str = "plugin.yml";
/// Where the original descriptor is preserved inside the finalized jar.
pub const DESCRIPTOR_BACKUP_NAME: &str = "cvn-plugin.yml";
pub const SHIM_CLASS_NAME: &str = "DummyJavaPlugin.class";

const DESCRIPTOR_TEMPLATE: &str = include_str!("../resources/dummy-plugin.yml");
const SHIM_CLASS: &[u8] = include_bytes!("../resources/DummyJavaPlugin.class");

#[derive(Debug, Fail)]
#[fail(display = "Could not find the plugin.yml file in the jar")]
pub struct MissingDescriptor;

#[derive(Debug, Fail)]
#[fail(display = "{} not present in plugin.yml", field)]
pub struct MissingDescriptorField {
    pub field: &'static str,
}

pub struct FinalizeJob<'a> {
    pub input: &'a Path,
    pub output: &'a Path,
    /// Where the scratch tree may be created.
    pub scratch_root: &'a Path,
}

pub fn finalize_plugin_jar(job: &FinalizeJob) -> Result<(), Error> {
    // The guard removes the scratch tree on every exit path
    let scratch = scopeguard::guard(job.scratch_root.join("unarchive"), |dir| {
        let _ = fs::remove_dir_all(&*dir);
    });
    fs::create_dir_all(&*scratch)?;
    unpack_jar(job.input, &scratch)?;

    let descriptor = scratch.join(DESCRIPTOR_NAME);
    if !descriptor.is_file() {
        return Err(MissingDescriptor.into())
    }
    let records = parse_descriptor(&fs::read_to_string(&descriptor)?);
    let name = records.get("name")
        .ok_or(MissingDescriptorField { field: "name" })?;
    let uuid = derive_plugin_uuid(name);

    fs::copy(&descriptor, scratch.join(DESCRIPTOR_BACKUP_NAME))?;
    let mut replacement = String::with_capacity(DESCRIPTOR_TEMPLATE.len());
    for line in DESCRIPTOR_TEMPLATE.lines() {
        replacement.push_str(&line.replace("${uuid}", &uuid.to_string()));
        replacement.push('\n');
    }
    fs::write(&descriptor, replacement)?;
    fs::write(scratch.join(SHIM_CLASS_NAME), SHIM_CLASS)?;

    repack_jar(&scratch, job.output)?;
    Ok(())
}

/// Parses line based `key:value` records. Only the text between the
/// first and second colon forms the value, nothing is trimmed, and a
/// line whose value would be empty produces no record. Existing
/// descriptors rely on these exact quirks.
pub fn parse_descriptor(text: &str) -> IndexMap<String, String> {
    let mut records = IndexMap::new();
    for line in text.lines() {
        let mut parts = line.split(':').collect::<Vec<&str>>();
        while parts.last() == Some(&"") {
            parts.pop();
        }
        if parts.len() < 2 {
            continue
        }
        records.insert(parts[0].to_owned(), parts[1].to_owned());
    }
    records
}

/// A 128 bit identifier derived from a descriptor name.
#[derive(Copy, Clone, Debug, Eq, PartialEq, Hash)]
pub struct PluginUuid {
    high: u64,
    low: u64,
}
impl Display for PluginUuid {
    fn fmt(&self, f: &mut Formatter) -> fmt::Result {
        write!(
            f,
            "{:08x}-{:04x}-{:04x}-{:04x}-{:012x}",
            (self.high >> 32) as u32,
            (self.high >> 16) as u16,
            self.high as u16,
            (self.low >> 48) as u16,
            self.low & 0x0000_ffff_ffff_ffff
        )
    }
}

/// Derive the placeholder identity for a plugin name: the MD5 digest of
/// the name's bytes, with the first eight bytes forming the high word
/// and the next eight the low word. Not an RFC 4122 UUID, but the CVN
/// loader expects exactly this construction.
pub fn derive_plugin_uuid(name: &str) -> PluginUuid {
    let digest = Md5::digest(name.as_bytes());
    let mut high = [0u8; 8];
    let mut low = [0u8; 8];
    high.copy_from_slice(&digest[..8]);
    low.copy_from_slice(&digest[8..16]);
    PluginUuid {
        high: u64::from_be_bytes(high),
        low: u64::from_be_bytes(low),
    }
}

fn unpack_jar(jar: &Path, target: &Path) -> Result<(), Error> {
    let mut archive = ZipArchive::new(BufReader::new(File::open(jar)?))?;
    for index in 0..archive.len() {
        let mut entry = archive.by_index(index)?;
        let location = target.join(entry.name());
        if entry.name().ends_with('/') {
            fs::create_dir_all(&location)?;
            continue
        }
        if let Some(parent) = location.parent() {
            fs::create_dir_all(parent)?;
        }
        io::copy(&mut entry, &mut File::create(&location)?)?;
    }
    Ok(())
}

fn repack_jar(source: &Path, jar: &Path) -> Result<(), Error> {
    let mut writer = ZipWriter::new(BufWriter::new(File::create(jar)?));
    for entry in WalkDir::new(source) {
        let entry = entry?;
        if !entry.file_type().is_file() {
            continue
        }
        let relative = entry.path().strip_prefix(source)?;
        // Entry names always use forward slashes, whatever the host uses
        let name = relative.to_string_lossy().replace('\\', "/");
        writer.start_file(name, FileOptions::default())?;
        io::copy(&mut File::open(entry.path())?, &mut writer)?;
    }
    writer.finish()?;
    Ok(())
}

#[cfg(test)]
mod test {
    use std::collections::BTreeMap;
    use std::io::{Read, Write};

    use super::*;

    #[test]
    fn descriptor_value_stops_at_second_colon() {
        let records = parse_descriptor("name:Test\nwebsite:https://example.com\n");
        assert_eq!(records["name"], "Test");
        // The colon inside the url truncates the value
        assert_eq!(records["website"], "https");
    }

    #[test]
    fn descriptor_values_are_not_trimmed() {
        let records = parse_descriptor("name: My Plugin\n");
        assert_eq!(records["name"], " My Plugin");
    }

    #[test]
    fn descriptor_skips_bare_lines() {
        let records = parse_descriptor("just a line\nname:\n\nmain:com.example.Main\n");
        assert_eq!(records.len(), 1);
        assert_eq!(records["main"], "com.example.Main");
    }

    #[test]
    fn uuid_matches_known_digest() {
        // MD5("test") = 098f6bcd4621d373cade4e832627b4f6
        assert_eq!(
            derive_plugin_uuid("test").to_string(),
            "098f6bcd-4621-d373-cade-4e832627b4f6"
        );
    }

    #[test]
    fn uuid_is_deterministic_and_input_sensitive() {
        assert_eq!(derive_plugin_uuid("MyPlugin"), derive_plugin_uuid("MyPlugin"));
        assert_ne!(derive_plugin_uuid("MyPlugin"), derive_plugin_uuid("MyPlugiN"));
    }

    fn write_test_jar(path: &Path, entries: &[(&str, &[u8])]) {
        let mut writer = ZipWriter::new(File::create(path).unwrap());
        for (name, data) in entries {
            writer.start_file(name.to_string(), FileOptions::default()).unwrap();
            writer.write_all(data).unwrap();
        }
        writer.finish().unwrap();
    }

    fn read_jar(path: &Path) -> BTreeMap<String, Vec<u8>> {
        let mut archive = ZipArchive::new(File::open(path).unwrap()).unwrap();
        let mut entries = BTreeMap::new();
        for index in 0..archive.len() {
            let mut entry = archive.by_index(index).unwrap();
            let mut data = Vec::new();
            entry.read_to_end(&mut data).unwrap();
            entries.insert(entry.name().to_owned(), data);
        }
        entries
    }

    #[test]
    fn repack_round_trip() {
        let dir = tempfile::tempdir().unwrap();
        let original = dir.path().join("original.jar");
        let rebuilt = dir.path().join("rebuilt.jar");
        let entries: &[(&str, &[u8])] = &[
            ("plugin.yml", b"name:Test\n"),
            ("com/example/Main.class", b"\xca\xfe\xba\xbe fake"),
            ("assets/data.bin", &[0u8, 1, 2, 3]),
        ];
        write_test_jar(&original, entries);
        let unpacked = dir.path().join("unpacked");
        unpack_jar(&original, &unpacked).unwrap();
        repack_jar(&unpacked, &rebuilt).unwrap();
        assert_eq!(read_jar(&original), read_jar(&rebuilt));
    }

    #[test]
    fn finalize_replaces_descriptor_and_installs_shim() {
        let dir = tempfile::tempdir().unwrap();
        let input = dir.path().join("plugin-intermediary.jar");
        let output = dir.path().join("plugin.jar");
        write_test_jar(&input, &[
            ("plugin.yml", b"name:Test\nversion:1.0\n"),
            ("com/example/Main.class", b"\xca\xfe\xba\xbe fake"),
        ]);
        finalize_plugin_jar(&FinalizeJob {
            input: &input,
            output: &output,
            scratch_root: dir.path(),
        }).unwrap();

        let entries = read_jar(&output);
        // Original descriptor preserved under the backup name
        assert_eq!(entries[DESCRIPTOR_BACKUP_NAME], b"name:Test\nversion:1.0\n".to_vec());
        // Replacement descriptor carries the derived identity
        let descriptor = String::from_utf8(entries[DESCRIPTOR_NAME].clone()).unwrap();
        let uuid = derive_plugin_uuid("Test").to_string();
        assert!(descriptor.contains(&uuid), "{}", descriptor);
        assert!(!descriptor.contains("${uuid}"));
        assert_eq!(entries[SHIM_CLASS_NAME], SHIM_CLASS.to_vec());
        assert!(entries.contains_key("com/example/Main.class"));
        // Scratch tree is gone
        assert!(!dir.path().join("unarchive").exists());
    }

    #[test]
    fn finalize_requires_descriptor() {
        let dir = tempfile::tempdir().unwrap();
        let input = dir.path().join("bare.jar");
        let output = dir.path().join("out.jar");
        write_test_jar(&input, &[("com/example/Main.class", b"x")]);
        let error = finalize_plugin_jar(&FinalizeJob {
            input: &input,
            output: &output,
            scratch_root: dir.path(),
        }).unwrap_err();
        assert!(error.downcast_ref::<MissingDescriptor>().is_some());
        // Cleanup also happens on the failure path
        assert!(!dir.path().join("unarchive").exists());
    }

    #[test]
    fn finalize_requires_name_field() {
        let dir = tempfile::tempdir().unwrap();
        let input = dir.path().join("anon.jar");
        let output = dir.path().join("out.jar");
        write_test_jar(&input, &[("plugin.yml", b"main:com.example.Main\n")]);
        let error = finalize_plugin_jar(&FinalizeJob {
            input: &input,
            output: &output,
            scratch_root: dir.path(),
        }).unwrap_err();
        let missing = error.downcast_ref::<MissingDescriptorField>().unwrap();
        assert_eq!(missing.field, "name");
    }
}
