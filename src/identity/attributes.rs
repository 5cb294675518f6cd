use std::collections::{BTreeMap, BTreeSet};

use crate::core::config::AttributeConfig;

use super::client::UserAttribute;

/// Per-request access attributes: attribute name mapped to the values the
/// caller is allowed to see. Built fresh for every request, owned by it,
/// and dropped with it.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct AccessAttributeSet(BTreeMap<String, BTreeSet<String>>);

impl AccessAttributeSet {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&mut self, name: impl Into<String>, value: impl Into<String>) {
        self.0.entry(name.into()).or_default().insert(value.into());
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn get(&self, name: &str) -> Option<&BTreeSet<String>> {
        self.0.get(name)
    }

    pub fn iter(&self) -> impl Iterator<Item = (&String, &BTreeSet<String>)> {
        self.0.iter()
    }

    /// Reduce the provider's raw claims to the configured access
    /// attributes: keep names carrying the namespace prefix whose
    /// unprefixed name is in the allow-list, split values on commas, trim,
    /// and drop empty fragments.
    pub fn from_provider_attributes(
        attrs: &[UserAttribute],
        config: &AttributeConfig,
    ) -> Self {
        let mut set = Self::new();

        for attr in attrs {
            let Some(name) = attr.name.strip_prefix(config.prefix.as_str()) else {
                continue;
            };
            if !config.allowed.iter().any(|allowed| allowed == name) {
                continue;
            }
            for value in attr.value.split(',') {
                let value = value.trim();
                if !value.is_empty() {
                    set.insert(name, value);
                }
            }
        }

        set
    }
}
