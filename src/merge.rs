//! Combining mapping tables that share a namespace.
use failure::Error;
use failure_derive::Fail;
use indexmap::IndexMap;

use crate::mappings::{MappingTable, MemberRef};

#[derive(Debug, Fail)]
#[fail(display = "Mapping tables don't share an original namespace: {:?} vs {:?}", _0, _1)]
pub struct NamespaceMismatch(String, String);

/// Rebase `primary` (A -> B) onto the names produced by `relocation`
/// (A -> C), yielding a C -> B table.
///
/// Classes and member owners absent from the relocation table pass
/// through with their A name unchanged. Runs in O(|primary| + |relocation|).
pub fn rebase_original(primary: &MappingTable, relocation: &MappingTable) -> Result<MappingTable, Error> {
    if primary.original_namespace() != relocation.original_namespace() {
        return Err(NamespaceMismatch(
            primary.original_namespace().into(),
            relocation.original_namespace().into()
        ).into())
    }
    let mut result = MappingTable::new(
        relocation.renamed_namespace(),
        primary.renamed_namespace()
    );
    for (original, renamed) in primary.classes() {
        result.set_class_name(relocation.remap_class(original).into(), renamed.into());
    }
    for (member, renamed) in primary.fields() {
        result.set_field_name(relocate_member(member, relocation), renamed.into());
    }
    for (member, renamed) in primary.methods() {
        result.set_method_name(relocate_member(member, relocation), renamed.into());
    }
    Ok(result)
}

#[inline]
fn relocate_member(member: &MemberRef, relocation: &MappingTable) -> MemberRef {
    MemberRef {
        owner: relocation.remap_class(&member.owner).into(),
        name: member.name.clone(),
        descriptor: member.descriptor.clone(),
    }
}

/// Rewrite the leading package segment of every entry starting with
/// `prefix` to `replacement`, leaving the rest of the path untouched.
/// With `classes_only` set, member owners keep their original package.
pub fn apply_package_prefix(
    table: &MappingTable,
    prefix: &str,
    replacement: &str,
    classes_only: bool
) -> MappingTable {
    let mut result = MappingTable::new(table.original_namespace(), table.renamed_namespace());
    for (original, renamed) in table.classes() {
        result.set_class_name(rewrite_prefix(original, prefix, replacement), renamed.into());
    }
    for (member, renamed) in table.fields() {
        result.set_field_name(reprefix_member(member, prefix, replacement, classes_only), renamed.into());
    }
    for (member, renamed) in table.methods() {
        result.set_method_name(reprefix_member(member, prefix, replacement, classes_only), renamed.into());
    }
    result
}

fn reprefix_member(member: &MemberRef, prefix: &str, replacement: &str, classes_only: bool) -> MemberRef {
    if classes_only {
        member.clone()
    } else {
        MemberRef {
            owner: rewrite_prefix(&member.owner, prefix, replacement),
            name: member.name.clone(),
            descriptor: member.descriptor.clone(),
        }
    }
}

fn rewrite_prefix(path: &str, prefix: &str, replacement: &str) -> String {
    match path.strip_prefix(prefix) {
        Some(rest) if rest.is_empty() || rest.starts_with('/') || prefix.ends_with('/') => {
            format!("{}{}", replacement, rest)
        }
        _ => path.into(),
    }
}

/// Fold a member table whose owners are written in the renamed class
/// names back onto the class table, producing one combined class+member
/// table keyed entirely by the original namespace.
pub fn combine_class_members(classes: &MappingTable, members: &MappingTable) -> MappingTable {
    let inverted = classes.classes()
        .map(|(original, renamed)| (renamed, original))
        .collect::<IndexMap<&str, &str>>();
    let restore_owner = |owner: &str| -> String {
        inverted.get(owner).cloned().unwrap_or(owner).into()
    };
    let mut result = classes.clone();
    for (member, renamed) in members.fields() {
        result.set_field_name(MemberRef {
            owner: restore_owner(&member.owner),
            name: member.name.clone(),
            descriptor: member.descriptor.clone(),
        }, renamed.into());
    }
    for (member, renamed) in members.methods() {
        result.set_method_name(MemberRef {
            owner: restore_owner(&member.owner),
            name: member.name.clone(),
            descriptor: member.descriptor.clone(),
        }, renamed.into());
    }
    result
}
