use factgate_domain::module::ModuleId;
use std::borrow::Cow;
use std::fmt;

/// Method name used for whole-section reads, including snapshot priming.
pub const SECTION_METHOD: &str = "section";

/// Identity of one cached read: module, method and canonical parameters.
///
/// Parameters are kept sorted by name, so the order in which they are added never changes
/// equality or hashing. Setting a parameter twice keeps the last value.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct CacheKey {
    module: ModuleId,
    method: Cow<'static, str>,
    params: Vec<(Cow<'static, str>, String)>,
}

impl CacheKey {
    pub fn new(module: ModuleId, method: impl Into<Cow<'static, str>>) -> Self {
        Self { module, method: method.into(), params: Vec::new() }
    }

    /// Key of a whole-section read.
    #[must_use]
    pub const fn section(module: ModuleId) -> Self {
        Self { module, method: Cow::Borrowed(SECTION_METHOD), params: Vec::new() }
    }

    #[must_use]
    pub fn param(mut self, name: impl Into<Cow<'static, str>>, value: impl ToString) -> Self {
        let name = name.into();
        let value = value.to_string();
        match self.params.binary_search_by(|(existing, _)| existing.cmp(&name)) {
            Ok(pos) => self.params[pos].1 = value,
            Err(pos) => self.params.insert(pos, (name, value)),
        }
        self
    }

    #[must_use]
    pub const fn module(&self) -> ModuleId {
        self.module
    }

    #[must_use]
    pub fn method(&self) -> &str {
        &self.method
    }

    pub fn params(&self) -> impl ExactSizeIterator<Item = (&str, &str)> {
        self.params.iter().map(|(name, value)| (name.as_ref(), value.as_str()))
    }
}

impl fmt::Display for CacheKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}::{}(", self.module, self.method)?;
        for (i, (name, value)) in self.params.iter().enumerate() {
            if i > 0 {
                f.write_str(", ")?;
            }
            write!(f, "{name}={value}")?;
        }
        f.write_str(")")
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::hash_map::DefaultHasher;
    use std::hash::{Hash, Hasher};

    fn hash(key: &CacheKey) -> u64 {
        let mut hasher = DefaultHasher::new();
        key.hash(&mut hasher);
        hasher.finish()
    }

    #[test]
    fn parameter_order_does_not_change_identity() {
        let module = ModuleId::new(3);
        let a = CacheKey::new(module, "disk").param("mount", "/").param("unit", "mb");
        let b = CacheKey::new(module, "disk").param("unit", "mb").param("mount", "/");
        assert_eq!(a, b);
        assert_eq!(hash(&a), hash(&b));
        assert_eq!(a.to_string(), "#3::disk(mount=/, unit=mb)");
    }

    #[test]
    fn repeated_parameter_keeps_last_value() {
        let key = CacheKey::new(ModuleId::new(1), "cpu").param("core", 0).param("core", 2);
        assert_eq!(key.params().collect::<Vec<_>>(), vec![("core", "2")]);
    }

    #[test]
    fn sections_differ_from_methods() {
        let module = ModuleId::new(0);
        assert_ne!(CacheKey::section(module), CacheKey::new(module, "usage"));
        assert_eq!(CacheKey::section(module).method(), SECTION_METHOD);
    }
}
