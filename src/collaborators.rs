//! The CMS pieces the widget leans on but does not own: widget property
//! storage, translations and node (page) urls. Each is a small trait so the
//! host can plug in its own; the implementations here are what the standalone
//! server runs with.

use std::collections::HashMap;
use std::sync::RwLock;

/// Widget-scoped key/value storage (title, list id, cached schema, ...)
pub trait PropertyStore: Send + Sync {
    fn get(
        &self,
        key: &str,
    ) -> Option<String>;

    fn set(
        &self,
        key: &str,
        value: String,
    );
}

/// Key of a property that has one value per locale (e.g. `nl.title`)
pub fn localized_key(
    locale: &str,
    key: &str,
) -> String {
    format!("{locale}.{key}")
}

#[derive(Default)]
pub struct InMemoryPropertyStore {
    values: RwLock<HashMap<String, String>>,
}

impl InMemoryPropertyStore {
    pub fn new(seed: HashMap<String, String>) -> Self {
        Self {
            values: RwLock::new(seed),
        }
    }
}

impl PropertyStore for InMemoryPropertyStore {
    fn get(
        &self,
        key: &str,
    ) -> Option<String> {
        // a poisoned lock only means another request panicked mid-write; the
        // map itself is still usable
        let values = self.values.read().unwrap_or_else(|e| e.into_inner());
        values.get(key).cloned()
    }

    fn set(
        &self,
        key: &str,
        value: String,
    ) {
        let mut values = self.values.write().unwrap_or_else(|e| e.into_inner());
        values.insert(key.to_string(), value);
    }
}

/// User-facing text only; nothing branches on the result
pub trait Translator: Send + Sync {
    /// `None` if there is no translation for `key`
    fn translate(
        &self,
        key: &str,
        params: &[(&str, &str)],
    ) -> Option<String>;

    /// Translation, or the key itself
    fn translate_or_key(
        &self,
        key: &str,
        params: &[(&str, &str)],
    ) -> String {
        self.translate(key, params)
            .unwrap_or_else(|| key.to_string())
    }
}

/// Translations loaded from configuration. `{name}` in a translation is
/// replaced by the param called `name`.
#[derive(Default)]
pub struct StaticTranslator {
    translations: HashMap<String, String>,
}

impl StaticTranslator {
    pub fn new(translations: HashMap<String, String>) -> Self { Self { translations } }
}

impl Translator for StaticTranslator {
    fn translate(
        &self,
        key: &str,
        params: &[(&str, &str)],
    ) -> Option<String> {
        let mut text = self.translations.get(key)?.clone();
        for (name, value) in params {
            text = text.replace(&format!("{{{name}}}"), value);
        }
        Some(text)
    }
}

/// Maps a CMS node (page) id to a url in the given locale
pub trait NodeResolver: Send + Sync {
    fn resolve(
        &self,
        node_id: &str,
        locale: &str,
    ) -> Option<String>;
}

#[derive(Default)]
pub struct StaticNodeResolver {
    /// node id -> path, without the locale prefix
    nodes: HashMap<String, String>,
}

impl StaticNodeResolver {
    pub fn new(nodes: HashMap<String, String>) -> Self { Self { nodes } }
}

impl NodeResolver for StaticNodeResolver {
    fn resolve(
        &self,
        node_id: &str,
        locale: &str,
    ) -> Option<String> {
        let path = self.nodes.get(node_id)?;
        Some(format!("/{locale}/{}", path.trim_start_matches('/')))
    }
}
