//! The two textual mapping codecs.
//!
//! The pair format is the whitespace separated csrg style: untagged rows,
//! one directional rename per row. The multi namespace format is the tiny
//! v1 style: a tab separated header naming every namespace, then rows
//! tagged `CLASS`, `FIELD` or `METHOD` carrying one name per namespace.
use std::io::{BufRead, Write};

use failure::Error;
use failure_derive::Fail;
use itertools::Itertools;

use crate::mappings::{MappingTable, MemberRef};

#[derive(Debug, Fail)]
#[fail(display = "Malformed mapping line {}: {:?}", line_number, line)]
pub struct MalformedMappingLine {
    pub line_number: usize,
    pub line: String,
}

#[derive(Debug, Fail)]
#[fail(display = "Unknown mapping namespace {:?}", _0)]
pub struct UnknownNamespace(String);

#[inline]
fn malformed(line_number: usize, line: &str) -> Error {
    MalformedMappingLine { line_number, line: line.into() }.into()
}

#[derive(Copy, Clone, Debug, Default)]
pub struct PairParseOptions {
    /// Parse member rows too. Otherwise only class rows are read and
    /// member rows are ignored.
    pub members: bool,
    /// Swap the name columns on load, for tables stored renamed-first.
    pub invert: bool,
}

/// Codec for the pair format: `original renamed` class rows,
/// `owner name renamed` field rows and `owner name descriptor renamed`
/// method rows. Blank lines and `#` comments are skipped.
pub struct PairMappingsFormat;
impl PairMappingsFormat {
    pub fn parse_stream<R: BufRead>(
        reader: R,
        original_namespace: &str,
        renamed_namespace: &str,
        options: PairParseOptions
    ) -> Result<MappingTable, Error> {
        let mut table = MappingTable::new(original_namespace, renamed_namespace);
        for (index, line) in reader.lines().enumerate() {
            let line = line?;
            let trimmed = line.trim();
            if trimmed.is_empty() || trimmed.starts_with('#') {
                continue
            }
            let tokens = trimmed.split_whitespace().collect::<Vec<&str>>();
            match tokens.as_slice() {
                &[original, renamed] => {
                    let (original, renamed) = swap_if(options.invert, original, renamed);
                    table.set_class_name(original.into(), renamed.into());
                }
                &[owner, name, renamed] if options.members => {
                    let (name, renamed) = swap_if(options.invert, name, renamed);
                    table.set_field_name(MemberRef::new(owner, name), renamed.into());
                }
                &[owner, name, descriptor, renamed] if options.members => {
                    let (name, renamed) = swap_if(options.invert, name, renamed);
                    table.set_method_name(
                        MemberRef::with_descriptor(owner, name, descriptor),
                        renamed.into()
                    );
                }
                // Member rows in a class-only load
                &[_, _, _] | &[_, _, _, _] => continue,
                _ => return Err(malformed(index + 1, &line)),
            }
        }
        Ok(table)
    }
    pub fn write<W: Write>(table: &MappingTable, mut writer: W) -> Result<(), Error> {
        for (original, renamed) in table.classes() {
            writeln!(writer, "{} {}", original, renamed)?;
        }
        for (member, renamed) in table.fields() {
            writeln!(writer, "{} {} {}", member.owner, member.name, renamed)?;
        }
        for (member, renamed) in table.methods() {
            match member.descriptor {
                Some(ref descriptor) => {
                    writeln!(writer, "{} {} {} {}", member.owner, member.name, descriptor, renamed)?;
                }
                None => writeln!(writer, "{} {} {}", member.owner, member.name, renamed)?,
            }
        }
        Ok(())
    }
}

#[inline]
fn swap_if<'a>(invert: bool, first: &'a str, second: &'a str) -> (&'a str, &'a str) {
    if invert { (second, first) } else { (first, second) }
}

const MULTI_FORMAT_HEADER: &str = "v1";

#[derive(Debug)]
struct MemberRow {
    owner: String,
    descriptor: String,
    names: Vec<String>,
}

/// An in-memory multi namespace mapping file.
///
/// Owner and descriptor columns of member rows are written in the first
/// namespace, so projecting a pair whose original namespace isn't the
/// first translates owners through the class rows.
#[derive(Debug)]
pub struct MultiMappingsFile {
    namespaces: Vec<String>,
    classes: Vec<Vec<String>>,
    fields: Vec<MemberRow>,
    methods: Vec<MemberRow>,
}
impl MultiMappingsFile {
    pub fn parse_stream<R: BufRead>(reader: R) -> Result<MultiMappingsFile, Error> {
        let mut lines = reader.lines().enumerate();
        let (index, header) = match lines.next() {
            Some((index, line)) => (index, line?),
            None => return Err(malformed(1, "")),
        };
        let mut columns = header.split('\t');
        if columns.next() != Some(MULTI_FORMAT_HEADER) {
            return Err(malformed(index + 1, &header))
        }
        let namespaces = columns.map(String::from).collect::<Vec<String>>();
        if namespaces.len() < 2 {
            return Err(malformed(index + 1, &header))
        }
        let mut file = MultiMappingsFile {
            namespaces,
            classes: Vec::new(),
            fields: Vec::new(),
            methods: Vec::new(),
        };
        let expected = file.namespaces.len();
        for (index, line) in lines {
            let line = line?;
            if line.is_empty() {
                continue
            }
            let tokens = line.split('\t').collect::<Vec<&str>>();
            match tokens.first() {
                Some(&"CLASS") if tokens.len() == expected + 1 => {
                    file.classes.push(tokens[1..].iter().map(|s| (*s).into()).collect());
                }
                Some(&"FIELD") if tokens.len() == expected + 3 => {
                    file.fields.push(Self::member_row(&tokens));
                }
                Some(&"METHOD") if tokens.len() == expected + 3 => {
                    file.methods.push(Self::member_row(&tokens));
                }
                _ => return Err(malformed(index + 1, &line)),
            }
        }
        Ok(file)
    }
    fn member_row(tokens: &[&str]) -> MemberRow {
        MemberRow {
            owner: tokens[1].into(),
            descriptor: tokens[2].into(),
            names: tokens[3..].iter().map(|s| (*s).into()).collect(),
        }
    }
    pub fn write<W: Write>(&self, mut writer: W) -> Result<(), Error> {
        writeln!(writer, "{}\t{}", MULTI_FORMAT_HEADER, self.namespaces.iter().join("\t"))?;
        for names in &self.classes {
            writeln!(writer, "CLASS\t{}", names.iter().join("\t"))?;
        }
        for field in &self.fields {
            writeln!(writer, "FIELD\t{}\t{}\t{}", field.owner, field.descriptor, field.names.iter().join("\t"))?;
        }
        for method in &self.methods {
            writeln!(writer, "METHOD\t{}\t{}\t{}", method.owner, method.descriptor, method.names.iter().join("\t"))?;
        }
        Ok(())
    }
    #[inline]
    pub fn namespaces(&self) -> &[String] {
        &self.namespaces
    }
    fn namespace_index(&self, namespace: &str) -> Result<usize, Error> {
        self.namespaces.iter()
            .position(|candidate| candidate == namespace)
            .ok_or_else(|| UnknownNamespace(namespace.into()).into())
    }
    /// Project the directional table between two of the file's namespaces.
    pub fn table(&self, original: &str, renamed: &str) -> Result<MappingTable, Error> {
        let original_index = self.namespace_index(original)?;
        let renamed_index = self.namespace_index(renamed)?;
        let mut table = MappingTable::new(original, renamed);
        for names in &self.classes {
            table.set_class_name(names[original_index].clone(), names[renamed_index].clone());
        }
        // Owners are stored in the first namespace
        let owners = self.classes.iter()
            .map(|names| (names[0].as_str(), names[original_index].as_str()))
            .collect::<indexmap::IndexMap<&str, &str>>();
        let remap_owner = |owner: &str| -> String {
            if original_index == 0 {
                owner.into()
            } else {
                owners.get(owner).cloned().unwrap_or(owner).into()
            }
        };
        for field in &self.fields {
            table.set_field_name(
                MemberRef::with_descriptor(
                    remap_owner(&field.owner),
                    field.names[original_index].clone(),
                    field.descriptor.clone()
                ),
                field.names[renamed_index].clone()
            );
        }
        for method in &self.methods {
            table.set_method_name(
                MemberRef::with_descriptor(
                    remap_owner(&method.owner),
                    method.names[original_index].clone(),
                    method.descriptor.clone()
                ),
                method.names[renamed_index].clone()
            );
        }
        Ok(table)
    }
    pub fn from_table(table: &MappingTable) -> MultiMappingsFile {
        let mut file = MultiMappingsFile {
            namespaces: vec![
                table.original_namespace().into(),
                table.renamed_namespace().into(),
            ],
            classes: Vec::with_capacity(table.class_count()),
            fields: Vec::new(),
            methods: Vec::new(),
        };
        for (original, renamed) in table.classes() {
            file.classes.push(vec![original.into(), renamed.into()]);
        }
        for (member, renamed) in table.fields() {
            file.fields.push(MemberRow {
                owner: member.owner.clone(),
                descriptor: member.descriptor.clone().unwrap_or_default(),
                names: vec![member.name.clone(), renamed.into()],
            });
        }
        for (member, renamed) in table.methods() {
            file.methods.push(MemberRow {
                owner: member.owner.clone(),
                descriptor: member.descriptor.clone().unwrap_or_default(),
                names: vec![member.name.clone(), renamed.into()],
            });
        }
        file
    }
}
