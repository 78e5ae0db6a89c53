//! Caption normalization: turning raw header cells into field keys.
//!
//! A caption is first looked up (trimmed, case-insensitively) in the explicit [`CaptionMapping`];
//! when there is no entry, the configured [`CaptionTransform`] derives a key from the trimmed,
//! original-case caption.

use std::collections::HashMap;
use std::fmt;
use std::sync::Arc;

use serde::{Deserialize, Serialize};

/// Ordered, case-insensitive caption to field-key mapping.
///
/// Later entries for the same caption replace earlier ones in place.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CaptionMapping {
    entries: Vec<(String, String)>,
    index: HashMap<String, usize>,
}

impl CaptionMapping {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add `caption → key`. Blank captions or keys are ignored.
    pub fn insert(&mut self, caption: impl AsRef<str>, key: impl Into<String>) {
        let caption = caption.as_ref().trim();
        let key: String = key.into();
        let key = key.trim();
        if caption.is_empty() || key.is_empty() {
            tracing::debug!(caption, key, "ignoring blank caption mapping entry");
            return;
        }
        let lookup = caption.to_lowercase();
        match self.index.get(&lookup) {
            Some(&pos) => self.entries[pos] = (caption.to_string(), key.to_string()),
            None => {
                self.index.insert(lookup, self.entries.len());
                self.entries.push((caption.to_string(), key.to_string()));
            }
        }
    }

    /// Builder-style [`Self::insert`].
    pub fn with(mut self, caption: impl AsRef<str>, key: impl Into<String>) -> Self {
        self.insert(caption, key);
        self
    }

    /// Target key for `caption`, matched trimmed and case-insensitively.
    pub fn get(&self, caption: &str) -> Option<&str> {
        self.index
            .get(&caption.trim().to_lowercase())
            .map(|&pos| self.entries[pos].1.as_str())
    }

    /// `(caption, key)` pairs in insertion order.
    pub fn iter(&self) -> impl Iterator<Item = (&str, &str)> {
        self.entries.iter().map(|(c, k)| (c.as_str(), k.as_str()))
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

impl<C, K> FromIterator<(C, K)> for CaptionMapping
where
    C: AsRef<str>,
    K: Into<String>,
{
    fn from_iter<I: IntoIterator<Item = (C, K)>>(iter: I) -> Self {
        let mut mapping = Self::new();
        for (caption, key) in iter {
            mapping.insert(caption, key);
        }
        mapping
    }
}

/// Naming style produced by [`CaptionTransform::Identifier`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum KeyStyle {
    /// `First Name` → `firstName`
    #[default]
    Camel,
    /// `First Name` → `FirstName`
    Pascal,
    /// `First Name` → `first_name`
    Snake,
    /// `First Name` → `first-name`
    Kebab,
}

impl KeyStyle {
    /// Join the words of `caption` in this style. `None` when the caption has no word characters.
    pub fn apply(self, caption: &str) -> Option<String> {
        let words = split_words(caption);
        if words.is_empty() {
            return None;
        }
        let key = match self {
            KeyStyle::Camel => {
                let mut out = words[0].to_lowercase();
                for w in &words[1..] {
                    out.push_str(&capitalize(w));
                }
                out
            }
            KeyStyle::Pascal => words.iter().map(|w| capitalize(w)).collect(),
            KeyStyle::Snake => join_lower(&words, "_"),
            KeyStyle::Kebab => join_lower(&words, "-"),
        };
        Some(key)
    }
}

type CustomTransform = Arc<dyn Fn(&str) -> Option<String> + Send + Sync>;

/// Pure function deriving a key from a caption that has no explicit mapping entry.
#[derive(Clone)]
pub enum CaptionTransform {
    /// Keep the trimmed caption as the key.
    AsCaption,
    /// Re-case the caption's words (default: camel case).
    Identifier(KeyStyle),
    /// Exact caption lookup; unknown captions have no key.
    Translate(Arc<HashMap<String, String>>),
    /// Caller supplied function.
    Custom(CustomTransform),
}

impl Default for CaptionTransform {
    fn default() -> Self {
        CaptionTransform::Identifier(KeyStyle::default())
    }
}

impl fmt::Debug for CaptionTransform {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            CaptionTransform::AsCaption => f.write_str("AsCaption"),
            CaptionTransform::Identifier(style) => f.debug_tuple("Identifier").field(style).finish(),
            CaptionTransform::Translate(dict) => f
                .debug_struct("Translate")
                .field("entries", &dict.len())
                .finish(),
            CaptionTransform::Custom(_) => f.write_str("Custom(..)"),
        }
    }
}

impl CaptionTransform {
    /// Dictionary transform from `(caption, key)` pairs.
    pub fn translate<C, K, I>(dictionary: I) -> Self
    where
        C: Into<String>,
        K: Into<String>,
        I: IntoIterator<Item = (C, K)>,
    {
        let dict = dictionary
            .into_iter()
            .map(|(c, k)| (c.into(), k.into()))
            .collect();
        CaptionTransform::Translate(Arc::new(dict))
    }

    pub fn custom<F>(f: F) -> Self
    where
        F: Fn(&str) -> Option<String> + Send + Sync + 'static,
    {
        CaptionTransform::Custom(Arc::new(f))
    }

    /// Derive a key from an already trimmed caption.
    pub fn apply(&self, caption: &str) -> Option<String> {
        let key = match self {
            CaptionTransform::AsCaption => Some(caption.to_string()),
            CaptionTransform::Identifier(style) => style.apply(caption),
            CaptionTransform::Translate(dict) => dict.get(caption).cloned(),
            CaptionTransform::Custom(f) => f(caption),
        };
        key.filter(|k| !k.is_empty())
    }
}

/// Caption → key pipeline: trim, explicit mapping, then transform.
#[derive(Debug, Clone, Default)]
pub struct CaptionNormalizer {
    mapping: CaptionMapping,
    transform: CaptionTransform,
}

impl CaptionNormalizer {
    pub fn new(mapping: CaptionMapping, transform: CaptionTransform) -> Self {
        Self { mapping, transform }
    }

    pub fn mapping(&self) -> &CaptionMapping {
        &self.mapping
    }

    /// Key for `raw`: the explicit mapping target if any, else the transform result.
    pub fn normalize(&self, raw: &str) -> Option<String> {
        let caption = raw.trim();
        if caption.is_empty() {
            return None;
        }
        match self.mapping.get(caption) {
            Some(key) => Some(key.to_string()),
            None => self.transform.apply(caption),
        }
    }

    /// Transform-only key for `raw`, ignoring the explicit mapping.
    pub fn derive_key(&self, raw: &str) -> Option<String> {
        let caption = raw.trim();
        if caption.is_empty() {
            return None;
        }
        self.transform.apply(caption)
    }
}

/// Split on non-alphanumeric runs and lower→upper case changes (`HTTPServer` → `HTTP`, `Server`).
fn split_words(caption: &str) -> Vec<String> {
    let chars: Vec<char> = caption.chars().collect();
    let mut words = Vec::new();
    let mut current = String::new();

    for (i, &ch) in chars.iter().enumerate() {
        if !ch.is_alphanumeric() {
            if !current.is_empty() {
                words.push(std::mem::take(&mut current));
            }
            continue;
        }
        if ch.is_uppercase() && !current.is_empty() {
            let prev = chars[i - 1];
            let next_is_lower = chars.get(i + 1).is_some_and(|c| c.is_lowercase());
            if prev.is_lowercase() || prev.is_numeric() || (prev.is_uppercase() && next_is_lower) {
                words.push(std::mem::take(&mut current));
            }
        }
        current.push(ch);
    }
    if !current.is_empty() {
        words.push(current);
    }
    words
}

fn capitalize(word: &str) -> String {
    let mut chars = word.chars();
    match chars.next() {
        Some(first) => first.to_uppercase().chain(chars.flat_map(char::to_lowercase)).collect(),
        None => String::new(),
    }
}

fn join_lower(words: &[String], sep: &str) -> String {
    words
        .iter()
        .map(|w| w.to_lowercase())
        .collect::<Vec<_>>()
        .join(sep)
}
