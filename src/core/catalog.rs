use crate::domain::mirror::Capability;
use crate::domain::model::{TypeDescriptor, TypeRef};
use std::collections::{BTreeMap, BTreeSet, HashSet, VecDeque};

/// 掃描結果：不可變的型別目錄
///
/// `buckets` 記錄每個 capability 探索到的型別，`types` 是這些型別連同其
/// ancestors 與成員型別的完整宇宙，供 resolver 與 builders 查詢。
#[derive(Debug, Clone, Default)]
pub struct TypeCatalog {
    buckets: BTreeMap<Capability, BTreeSet<String>>,
    types: BTreeMap<String, TypeDescriptor>,
}

impl TypeCatalog {
    pub fn new(
        buckets: BTreeMap<Capability, BTreeSet<String>>,
        types: BTreeMap<String, TypeDescriptor>,
    ) -> Self {
        Self { buckets, types }
    }

    /// 直接從描述建立目錄，主要給測試與沒有掃描階段的呼叫者使用
    pub fn from_descriptors(
        descriptors: impl IntoIterator<Item = TypeDescriptor>,
        buckets: BTreeMap<Capability, BTreeSet<String>>,
    ) -> Self {
        let types = descriptors
            .into_iter()
            .map(|d| (d.name.clone(), d))
            .collect();
        Self { buckets, types }
    }

    pub fn descriptor(&self, type_name: &str) -> Option<&TypeDescriptor> {
        self.types.get(type_name)
    }

    pub fn contains(&self, type_name: &str) -> bool {
        self.types.contains_key(type_name)
    }

    pub fn len(&self) -> usize {
        self.types.len()
    }

    pub fn is_empty(&self) -> bool {
        self.types.is_empty()
    }

    pub fn bucket(&self, capability: Capability) -> impl Iterator<Item = &str> {
        self.buckets
            .get(&capability)
            .into_iter()
            .flat_map(|names| names.iter().map(String::as_str))
    }

    pub fn buckets(&self) -> &BTreeMap<Capability, BTreeSet<String>> {
        &self.buckets
    }

    pub fn in_bucket(&self, capability: Capability, type_name: &str) -> bool {
        self.buckets
            .get(&capability)
            .is_some_and(|names| names.contains(type_name))
    }

    /// 直接 supertype 的使用位置；未知型別回傳空
    pub fn direct_supertypes(&self, type_name: &str) -> Vec<&TypeRef> {
        self.descriptor(type_name)
            .map(|d| d.direct_supertypes().collect())
            .unwrap_or_default()
    }

    /// 所有傳遞 ancestors (superclasses + interfaces)，最具體的在前
    ///
    /// 以廣度優先走訪，同一層先 superclass 再 interfaces；經由多條路徑到達
    /// 的 ancestor 只出現一次。不在目錄中的 ancestor 也會列出，但不再往上展開。
    pub fn ancestors(&self, type_name: &str) -> Vec<String> {
        let mut ordered = Vec::new();
        let mut seen: HashSet<String> = HashSet::new();
        seen.insert(type_name.to_string());
        let mut queue: VecDeque<String> = VecDeque::new();
        queue.push_back(type_name.to_string());

        while let Some(current) = queue.pop_front() {
            for supertype in self.direct_supertypes(&current) {
                if let Some(name) = supertype.raw_name() {
                    if seen.insert(name.to_string()) {
                        ordered.push(name.to_string());
                        queue.push_back(name.to_string());
                    }
                }
            }
        }

        ordered
    }

    /// superclass 鏈 (不含 interfaces)，由型別本身開始
    pub fn class_chain(&self, type_name: &str) -> Vec<String> {
        let mut chain = vec![type_name.to_string()];
        let mut current = type_name.to_string();
        while let Some(parent) = self
            .descriptor(&current)
            .and_then(|d| d.superclass.as_ref())
            .and_then(TypeRef::raw_name)
        {
            if chain.iter().any(|c| c == parent) {
                break;
            }
            chain.push(parent.to_string());
            current = parent.to_string();
        }
        chain
    }

    /// `sub` 是否等於或傳遞繼承 `sup`
    pub fn is_subtype(&self, sub: &str, sup: &str) -> bool {
        sub == sup || self.ancestors(sub).iter().any(|a| a == sup)
    }

    /// 型別是否滿足任一 marker (含 marker 本身以外的傳遞關係)
    pub fn satisfies_any(&self, type_name: &str, markers: &[&str]) -> bool {
        let ancestors = self.ancestors(type_name);
        markers
            .iter()
            .any(|m| ancestors.iter().any(|a| a == m))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn diamond() -> TypeCatalog {
        TypeCatalog::from_descriptors(
            vec![
                TypeDescriptor::interface("t.Top"),
                TypeDescriptor::interface("t.Left").implements(TypeRef::named("t.Top")),
                TypeDescriptor::interface("t.Right").implements(TypeRef::named("t.Top")),
                TypeDescriptor::class("t.Base").implements(TypeRef::named("t.Left")),
                TypeDescriptor::class("t.Leaf")
                    .extends(TypeRef::named("t.Base"))
                    .implements(TypeRef::named("t.Right")),
            ],
            BTreeMap::new(),
        )
    }

    #[test]
    fn test_ancestors_most_specific_first_without_duplicates() {
        let catalog = diamond();
        assert_eq!(
            catalog.ancestors("t.Leaf"),
            vec!["t.Base", "t.Right", "t.Left", "t.Top"]
        );
    }

    #[test]
    fn test_is_subtype() {
        let catalog = diamond();
        assert!(catalog.is_subtype("t.Leaf", "t.Top"));
        assert!(catalog.is_subtype("t.Leaf", "t.Leaf"));
        assert!(!catalog.is_subtype("t.Top", "t.Leaf"));
    }

    #[test]
    fn test_class_chain_skips_interfaces() {
        let catalog = diamond();
        assert_eq!(catalog.class_chain("t.Leaf"), vec!["t.Leaf", "t.Base"]);
    }

    #[test]
    fn test_cyclic_hierarchy_terminates() {
        let catalog = TypeCatalog::from_descriptors(
            vec![
                TypeDescriptor::class("c.A").extends(TypeRef::named("c.B")),
                TypeDescriptor::class("c.B").extends(TypeRef::named("c.A")),
            ],
            BTreeMap::new(),
        );
        assert_eq!(catalog.ancestors("c.A"), vec!["c.B"]);
        assert_eq!(catalog.class_chain("c.A"), vec!["c.A", "c.B"]);
    }
}
