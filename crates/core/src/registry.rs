//! The registry of metadata fields exposed over REST.
//!
//! The registry is built once at startup and never changes afterwards: handlers look fields
//! up but cannot add, remove or mutate them. Each entry binds a REST-visible field name (one
//! canonical protected key plus accepted aliases) to a value kind, a write capability and a
//! human-readable description.
//!
//! The canonical keys all start with `_`, which the metadata store treats as protected:
//! the generic write path skips them, so the sanitising accessors in [`crate::adapter`]
//! are the only way these keys ever change.

use crate::capability::Capability;
use crate::meta::MetaKey;
use crate::sanitize::ValueKind;

/// Immutable description of one exposed metadata field.
#[derive(Clone, Debug)]
pub struct FieldSpec {
    key: MetaKey,
    kind: ValueKind,
    capability: Capability,
    description: &'static str,
    aliases: &'static [&'static str],
}

impl FieldSpec {
    fn new(
        key: &'static str,
        kind: ValueKind,
        capability: Capability,
        description: &'static str,
        aliases: &'static [&'static str],
    ) -> Self {
        Self {
            key: MetaKey::registered(key),
            kind,
            capability,
            description,
            aliases,
        }
    }

    /// The canonical storage key. Always protected (underscore-prefixed).
    pub fn key(&self) -> &MetaKey {
        &self.key
    }

    pub fn kind(&self) -> ValueKind {
        self.kind
    }

    /// Capability required to write this field.
    pub fn capability(&self) -> Capability {
        self.capability
    }

    pub fn description(&self) -> &'static str {
        self.description
    }

    /// Accepted request names other than the canonical key.
    pub fn aliases(&self) -> &'static [&'static str] {
        self.aliases
    }

    /// True if `name` denotes this field, by canonical key or by alias.
    ///
    /// Matching is exact; field names are lowercase by convention and no case folding
    /// is applied.
    pub fn matches(&self, name: &str) -> bool {
        self.key.as_str() == name || self.aliases.contains(&name)
    }
}

/// Immutable collection of registered fields.
#[derive(Clone, Debug)]
pub struct FieldRegistry {
    fields: Vec<FieldSpec>,
}

impl FieldRegistry {
    /// Builds the registry of the three SEO fields this service exposes.
    pub fn seo_fields() -> Self {
        Self {
            fields: vec![
                FieldSpec::new(
                    "_seo_focuskw",
                    ValueKind::ShortText,
                    Capability::EditPosts,
                    "Focus keyphrase the content is optimised for",
                    &["focuskw", "focus_keyphrase"],
                ),
                FieldSpec::new(
                    "_seo_title",
                    ValueKind::ShortText,
                    Capability::EditPosts,
                    "Title shown in search engine results",
                    &["seo_title"],
                ),
                FieldSpec::new(
                    "_seo_metadesc",
                    ValueKind::LongText,
                    Capability::EditPosts,
                    "Description shown in search engine results",
                    &["metadesc", "meta_description"],
                ),
            ],
        }
    }

    /// Looks a field up by canonical key or alias.
    pub fn resolve(&self, name: &str) -> Option<&FieldSpec> {
        self.fields.iter().find(|field| field.matches(name))
    }

    /// All registered fields, in registration order.
    pub fn fields(&self) -> &[FieldSpec] {
        &self.fields
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_seo_registry_has_three_fields() {
        let registry = FieldRegistry::seo_fields();
        assert_eq!(registry.fields().len(), 3);
    }

    #[test]
    fn test_resolve_by_canonical_key() {
        let registry = FieldRegistry::seo_fields();
        let field = registry
            .resolve("_seo_focuskw")
            .expect("canonical key should resolve");
        assert_eq!(field.key().as_str(), "_seo_focuskw");
        assert_eq!(field.kind(), ValueKind::ShortText);
    }

    #[test]
    fn test_resolve_by_alias() {
        let registry = FieldRegistry::seo_fields();
        for (alias, canonical) in [
            ("focuskw", "_seo_focuskw"),
            ("focus_keyphrase", "_seo_focuskw"),
            ("seo_title", "_seo_title"),
            ("metadesc", "_seo_metadesc"),
            ("meta_description", "_seo_metadesc"),
        ] {
            let field = registry
                .resolve(alias)
                .unwrap_or_else(|| panic!("alias '{alias}' should resolve"));
            assert_eq!(field.key().as_str(), canonical);
        }
    }

    #[test]
    fn test_resolve_unknown_name_is_none() {
        let registry = FieldRegistry::seo_fields();
        assert!(registry.resolve("focus").is_none());
        assert!(registry.resolve("").is_none());
        assert!(registry.resolve("_seo_unknown").is_none());
    }

    #[test]
    fn test_resolve_is_case_sensitive() {
        let registry = FieldRegistry::seo_fields();
        assert!(registry.resolve("FOCUSKW").is_none());
        assert!(registry.resolve("_SEO_TITLE").is_none());
    }

    #[test]
    fn test_all_canonical_keys_are_protected() {
        let registry = FieldRegistry::seo_fields();
        for field in registry.fields() {
            assert!(
                field.key().is_protected(),
                "field '{}' must use a protected key",
                field.key()
            );
        }
    }

    #[test]
    fn test_metadesc_is_long_text() {
        let registry = FieldRegistry::seo_fields();
        let field = registry.resolve("metadesc").expect("should resolve");
        assert_eq!(field.kind(), ValueKind::LongText);
    }

    #[test]
    fn test_all_fields_require_edit_capability() {
        let registry = FieldRegistry::seo_fields();
        for field in registry.fields() {
            assert_eq!(field.capability(), Capability::EditPosts);
        }
    }
}
