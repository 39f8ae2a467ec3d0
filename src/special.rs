//! Providers that resolve `? ... ?` special sequences to literal string sets.

use std::collections::BTreeMap;
use std::fmt;
use std::sync::{Arc, LazyLock};

use regex::Regex;

/// Trait for expanding special sequences into the strings they stand for
pub trait SpecialSequenceProvider: Send + Sync + fmt::Debug {
    /// Get the name of this provider
    fn name(&self) -> &str;

    /// Check if this provider understands the marker text between the `?` marks
    fn is_valid(&self, text: &str) -> bool;

    /// The literal alternatives for `text`. Only called when `is_valid` accepted it.
    fn generate(&self, text: &str) -> Vec<String>;
}

/// Markers compare without surrounding whitespace and ignoring ASCII case
fn normalize(text: &str) -> String {
    text.split_whitespace()
        .collect::<Vec<_>>()
        .join(" ")
        .to_ascii_lowercase()
}

/// Maps marker names to fixed sets of strings
#[derive(Debug, Clone, Default)]
pub struct TableProvider {
    entries: BTreeMap<String, Vec<String>>,
}

impl TableProvider {
    pub fn new() -> Self {
        TableProvider::default()
    }

    /// Add (or replace) the strings for `marker`
    pub fn insert<S: AsRef<str>>(mut self, marker: &str, values: &[S]) -> Self {
        self.entries.insert(
            normalize(marker),
            values.iter().map(|v| v.as_ref().to_string()).collect(),
        );
        self
    }
}

impl From<&BTreeMap<String, Vec<String>>> for TableProvider {
    fn from(table: &BTreeMap<String, Vec<String>>) -> Self {
        table
            .iter()
            .fold(TableProvider::new(), |provider, (marker, values)| {
                provider.insert(marker, values)
            })
    }
}

impl SpecialSequenceProvider for TableProvider {
    fn name(&self) -> &str {
        "table"
    }

    fn is_valid(&self, text: &str) -> bool {
        self.entries.contains_key(&normalize(text))
    }

    fn generate(&self, text: &str) -> Vec<String> {
        self.entries
            .get(&normalize(text))
            .cloned()
            .unwrap_or_default()
    }
}

/// Named character classes such as `? digit ?` or `? letter ?`
#[derive(Debug, Clone)]
pub struct CharacterClassProvider;

impl CharacterClassProvider {
    fn class(text: &str) -> Option<Vec<char>> {
        let chars = match normalize(text).as_str() {
            "digit" | "decimal digit" => ('0'..='9').collect(),
            "hex digit" | "hexadecimal digit" => {
                ('0'..='9').chain('a'..='f').chain('A'..='F').collect()
            }
            "uppercase letter" => ('A'..='Z').collect(),
            "lowercase letter" => ('a'..='z').collect(),
            "letter" => ('A'..='Z').chain('a'..='z').collect(),
            "space" | "space character" => vec![' '],
            "whitespace" | "white space" => vec![' ', '\t', '\n', '\r'],
            _ => return None,
        };
        Some(chars)
    }
}

impl SpecialSequenceProvider for CharacterClassProvider {
    fn name(&self) -> &str {
        "character_class"
    }

    fn is_valid(&self, text: &str) -> bool {
        Self::class(text).is_some()
    }

    fn generate(&self, text: &str) -> Vec<String> {
        Self::class(text)
            .unwrap_or_default()
            .into_iter()
            .map(String::from)
            .collect()
    }
}

static RANGE_PATTERN: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r#"^\s*(?:'(.)'|"(.)"|(\S))\s*\.\.\s*(?:'(.)'|"(.)"|(\S))\s*$"#)
        .expect("range pattern is a valid regex")
});

/// Inclusive character ranges such as `? a..f ?` or `? '0'..'9' ?`
#[derive(Debug, Clone)]
pub struct CharacterRangeProvider;

impl CharacterRangeProvider {
    fn bounds(text: &str) -> Option<(char, char)> {
        let captures = RANGE_PATTERN.captures(text)?;
        let first = (1..=3).find_map(|i| captures.get(i))?;
        let last = (4..=6).find_map(|i| captures.get(i))?;

        let first = first.as_str().chars().next()?;
        let last = last.as_str().chars().next()?;
        (first <= last).then_some((first, last))
    }
}

impl SpecialSequenceProvider for CharacterRangeProvider {
    fn name(&self) -> &str {
        "character_range"
    }

    fn is_valid(&self, text: &str) -> bool {
        Self::bounds(text).is_some()
    }

    fn generate(&self, text: &str) -> Vec<String> {
        match Self::bounds(text) {
            Some((first, last)) => (first..=last).map(String::from).collect(),
            None => Vec::new(),
        }
    }
}

/// Ordered collection of providers; the first one accepting a marker wins
#[derive(Debug, Clone, Default)]
pub struct ProviderRegistry {
    providers: Vec<Arc<dyn SpecialSequenceProvider>>,
}

impl ProviderRegistry {
    /// Create a new empty registry
    pub fn new() -> Self {
        ProviderRegistry {
            providers: Vec::new(),
        }
    }

    /// Append a provider; it is consulted after every provider registered before it
    pub fn register<P: SpecialSequenceProvider + 'static>(&mut self, provider: P) -> &mut Self {
        self.providers.push(Arc::new(provider));
        self
    }

    /// Insert a provider ahead of all registered ones
    pub fn register_first<P: SpecialSequenceProvider + 'static>(
        &mut self,
        provider: P,
    ) -> &mut Self {
        self.providers.insert(0, Arc::new(provider));
        self
    }

    /// The first provider whose validity check accepts `text`
    pub fn resolve(&self, text: &str) -> Option<&dyn SpecialSequenceProvider> {
        self.providers
            .iter()
            .find(|p| p.is_valid(text))
            .map(|p| &**p)
    }

    /// Names of all registered providers, in consultation order
    pub fn names(&self) -> Vec<String> {
        self.providers.iter().map(|p| p.name().to_string()).collect()
    }

    /// Register the built-in providers
    pub fn register_defaults(&mut self) -> &mut Self {
        self.register(CharacterClassProvider)
            .register(CharacterRangeProvider)
    }
}

/// Create a registry holding the built-in providers
pub fn default_provider_registry() -> ProviderRegistry {
    let mut registry = ProviderRegistry::new();
    registry.register_defaults();
    registry
}
