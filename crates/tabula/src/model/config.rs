//! Schema-wide options and their inheritance.

use serde::{Deserialize, Serialize};

/// How columns that the schema does not declare are treated.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Strictness {
    /// Extra columns are allowed.
    #[default]
    No,
    /// Extra columns are a failure.
    Yes,
    /// Extra columns are dropped from the validated table.
    Filter,
}

impl From<bool> for Strictness {
    fn from(strict: bool) -> Self {
        if strict { Strictness::Yes } else { Strictness::No }
    }
}

/// Per-model option overrides. Unset options inherit from ancestors.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    pub name: Option<String>,
    pub coerce: Option<bool>,
    pub strict: Option<Strictness>,
    pub ordered: Option<bool>,
    pub multiindex_name: Option<String>,
    pub multiindex_coerce: Option<bool>,
    pub multiindex_strict: Option<bool>,
    pub multiindex_ordered: Option<bool>,
}

impl Config {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn name(mut self, name: impl Into<String>) -> Self {
        self.name = Some(name.into());
        self
    }

    pub fn coerce(mut self, coerce: bool) -> Self {
        self.coerce = Some(coerce);
        self
    }

    pub fn strict(mut self, strict: impl Into<Strictness>) -> Self {
        self.strict = Some(strict.into());
        self
    }

    pub fn ordered(mut self, ordered: bool) -> Self {
        self.ordered = Some(ordered);
        self
    }

    pub fn multiindex_name(mut self, name: impl Into<String>) -> Self {
        self.multiindex_name = Some(name.into());
        self
    }

    pub fn multiindex_coerce(mut self, coerce: bool) -> Self {
        self.multiindex_coerce = Some(coerce);
        self
    }

    pub fn multiindex_strict(mut self, strict: bool) -> Self {
        self.multiindex_strict = Some(strict);
        self
    }

    pub fn multiindex_ordered(mut self, ordered: bool) -> Self {
        self.multiindex_ordered = Some(ordered);
        self
    }

    /// Overlay `self` on top of `parent`: set options win.
    pub fn merge(&self, parent: &Config) -> Config {
        Config {
            name: self.name.clone().or_else(|| parent.name.clone()),
            coerce: self.coerce.or(parent.coerce),
            strict: self.strict.or(parent.strict),
            ordered: self.ordered.or(parent.ordered),
            multiindex_name: self
                .multiindex_name
                .clone()
                .or_else(|| parent.multiindex_name.clone()),
            multiindex_coerce: self.multiindex_coerce.or(parent.multiindex_coerce),
            multiindex_strict: self.multiindex_strict.or(parent.multiindex_strict),
            multiindex_ordered: self.multiindex_ordered.or(parent.multiindex_ordered),
        }
    }

    /// Fill unset options with their defaults.
    pub fn resolve(&self) -> ResolvedConfig {
        ResolvedConfig {
            name: self.name.clone(),
            coerce: self.coerce.unwrap_or(false),
            strict: self.strict.unwrap_or_default(),
            ordered: self.ordered.unwrap_or(false),
            multiindex_name: self.multiindex_name.clone(),
            multiindex_coerce: self.multiindex_coerce.unwrap_or(false),
            multiindex_strict: self.multiindex_strict.unwrap_or(false),
            multiindex_ordered: self.multiindex_ordered.unwrap_or(true),
        }
    }
}

/// Options with every default applied.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ResolvedConfig {
    pub name: Option<String>,
    pub coerce: bool,
    pub strict: Strictness,
    pub ordered: bool,
    pub multiindex_name: Option<String>,
    pub multiindex_coerce: bool,
    pub multiindex_strict: bool,
    pub multiindex_ordered: bool,
}

impl Default for ResolvedConfig {
    fn default() -> Self {
        Config::default().resolve()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_child_overrides_parent() {
        let base = Config::new()
            .name("Base schema")
            .coerce(true)
            .ordered(true)
            .multiindex_strict(true)
            .multiindex_name("mi");
        let child = Config::new().name("Child schema").strict(true).multiindex_strict(false);

        let merged = child.merge(&base).resolve();
        assert_eq!(merged.name.as_deref(), Some("Child schema"));
        assert!(merged.coerce);
        assert!(merged.ordered);
        assert_eq!(merged.strict, Strictness::Yes);
        assert!(!merged.multiindex_strict);
        assert_eq!(merged.multiindex_name.as_deref(), Some("mi"));
    }

    #[test]
    fn test_defaults() {
        let resolved = ResolvedConfig::default();
        assert!(!resolved.coerce);
        assert_eq!(resolved.strict, Strictness::No);
        assert!(resolved.multiindex_ordered);
    }

    #[test]
    fn test_deserialize_partial_config() {
        let config: Config =
            serde_json::from_str(r#"{"strict": "filter", "coerce": true}"#).unwrap();
        assert_eq!(config.strict, Some(Strictness::Filter));
        assert_eq!(config.ordered, None);
    }
}
