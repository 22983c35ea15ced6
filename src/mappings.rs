use indexmap::IndexMap;

/// A class member reference: the owning class, the member name and an
/// optional descriptor. Fields read from the pair format carry no
/// descriptor, everything else does.
#[derive(Clone, Debug, Eq, PartialEq, Hash)]
pub struct MemberRef {
    pub owner: String,
    pub name: String,
    pub descriptor: Option<String>,
}
impl MemberRef {
    #[inline]
    pub fn new(owner: impl Into<String>, name: impl Into<String>) -> MemberRef {
        MemberRef { owner: owner.into(), name: name.into(), descriptor: None }
    }
    #[inline]
    pub fn with_descriptor(
        owner: impl Into<String>,
        name: impl Into<String>,
        descriptor: impl Into<String>
    ) -> MemberRef {
        MemberRef { owner: owner.into(), name: name.into(), descriptor: Some(descriptor.into()) }
    }
}

/// A directional table of class and member renames between exactly two
/// namespaces. Entries keep their insertion order and keys are unique,
/// with later insertions replacing earlier ones.
#[derive(Clone, Debug, Default)]
pub struct MappingTable {
    original_namespace: String,
    renamed_namespace: String,
    classes: IndexMap<String, String>,
    fields: IndexMap<MemberRef, String>,
    methods: IndexMap<MemberRef, String>,
}
impl MappingTable {
    pub fn new(original_namespace: impl Into<String>, renamed_namespace: impl Into<String>) -> MappingTable {
        MappingTable {
            original_namespace: original_namespace.into(),
            renamed_namespace: renamed_namespace.into(),
            classes: IndexMap::new(),
            fields: IndexMap::new(),
            methods: IndexMap::new(),
        }
    }
    #[inline]
    pub fn original_namespace(&self) -> &str {
        &self.original_namespace
    }
    #[inline]
    pub fn renamed_namespace(&self) -> &str {
        &self.renamed_namespace
    }
    /// Relabel the original namespace without touching any entries.
    pub fn rename_original_namespace(&mut self, label: impl Into<String>) {
        self.original_namespace = label.into();
    }
    pub fn set_class_name(&mut self, original: String, renamed: String) {
        self.classes.insert(original, renamed);
    }
    pub fn set_field_name(&mut self, original: MemberRef, renamed: String) {
        self.fields.insert(original, renamed);
    }
    pub fn set_method_name(&mut self, original: MemberRef, renamed: String) {
        self.methods.insert(original, renamed);
    }
    #[inline]
    pub fn get_remapped_class(&self, original: &str) -> Option<&str> {
        self.classes.get(original).map(String::as_str)
    }
    /// Remap a class name, treating an absent entry as mapped to itself.
    #[inline]
    pub fn remap_class<'a>(&'a self, original: &'a str) -> &'a str {
        self.get_remapped_class(original).unwrap_or(original)
    }
    pub fn classes(&self) -> impl Iterator<Item = (&str, &str)> {
        self.classes.iter().map(|(original, renamed)| (original.as_str(), renamed.as_str()))
    }
    pub fn fields(&self) -> impl Iterator<Item = (&MemberRef, &str)> {
        self.fields.iter().map(|(original, renamed)| (original, renamed.as_str()))
    }
    pub fn methods(&self) -> impl Iterator<Item = (&MemberRef, &str)> {
        self.methods.iter().map(|(original, renamed)| (original, renamed.as_str()))
    }
    #[inline]
    pub fn class_count(&self) -> usize {
        self.classes.len()
    }
    #[inline]
    pub fn is_empty(&self) -> bool {
        self.classes.is_empty() && self.fields.is_empty() && self.methods.is_empty()
    }
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn remap_class_falls_back_to_itself() {
        let mut table = MappingTable::new("official", "spigot");
        table.set_class_name("a".into(), "Entity".into());
        assert_eq!(table.remap_class("a"), "Entity");
        assert_eq!(table.remap_class("b"), "b");
        assert_eq!(table.get_remapped_class("b"), None);
    }

    #[test]
    fn duplicate_keys_replace() {
        let mut table = MappingTable::new("official", "spigot");
        table.set_class_name("a".into(), "Entity".into());
        table.set_class_name("a".into(), "EntityLiving".into());
        assert_eq!(table.class_count(), 1);
        assert_eq!(table.remap_class("a"), "EntityLiving");
    }

    #[test]
    fn rename_original_namespace_is_metadata_only() {
        let mut table = MappingTable::new("bukkit", "intermediary");
        table.set_class_name("a".into(), "class_0".into());
        table.rename_original_namespace("spigot");
        assert_eq!(table.original_namespace(), "spigot");
        assert_eq!(table.renamed_namespace(), "intermediary");
        assert_eq!(table.remap_class("a"), "class_0");
    }
}
