//! Resolve captions to setters for a record target.
//!
//! For typed targets the resolver starts from [`RecordTarget::discover`] and overlays the explicit
//! caption mapping; dotted target keys become [`Setter::NestedPath`]. For dynamic targets every
//! explicit mapping entry becomes a [`Setter::Mapping`].

use std::collections::{BTreeSet, HashMap};

use crate::caption::{CaptionMapping, CaptionNormalizer, CaptionTransform};
use crate::error::{IngestionError, IngestionResult};
use crate::record::{RecordTarget, Setter};
use crate::tolerance::{Diagnostics, Tolerance};

/// Caption → setter lookup table for one run.
#[derive(Debug)]
pub struct ResolvedSchema<T> {
    /// Lower-cased explicit caption → setter.
    by_caption: HashMap<String, Setter<T>>,
    /// Field key → setter.
    by_key: HashMap<String, Setter<T>>,
    normalizer: CaptionNormalizer,
    on_the_fly: bool,
}

impl<T> ResolvedSchema<T> {
    pub fn is_empty(&self) -> bool {
        self.by_caption.is_empty() && self.by_key.is_empty()
    }

    /// Whether unmapped captions bind under their derived key.
    pub fn binds_on_the_fly(&self) -> bool {
        self.on_the_fly
    }

    /// Setter for a raw header caption.
    ///
    /// Explicit captions win, then the transform-derived key, then (dynamic targets under
    /// `AggressiveRead` only) a fresh mapping under the normalized key.
    pub fn lookup(&self, raw_caption: &str) -> Option<Setter<T>> {
        let caption = raw_caption.trim();
        if caption.is_empty() {
            return None;
        }
        if let Some(setter) = self.by_caption.get(&caption.to_lowercase()) {
            return Some(setter.clone());
        }
        let derived = self.normalizer.derive_key(caption);
        if let Some(setter) = derived.as_ref().and_then(|key| self.by_key.get(key)) {
            return Some(setter.clone());
        }
        if self.on_the_fly {
            return self.normalizer.normalize(caption).map(Setter::Mapping);
        }
        None
    }

    /// Keys a fully built column index is expected to bind.
    pub fn expected_keys(&self) -> BTreeSet<String> {
        self.by_caption
            .values()
            .chain(self.by_key.values())
            .map(Setter::key)
            .collect()
    }
}

/// Builds a [`ResolvedSchema`] from the caption mapping, transform and tolerance of a run.
#[derive(Debug, Clone)]
pub struct SchemaResolver<'a> {
    mapping: &'a CaptionMapping,
    transform: &'a CaptionTransform,
    tolerance: Tolerance,
}

impl<'a> SchemaResolver<'a> {
    pub fn new(mapping: &'a CaptionMapping, transform: &'a CaptionTransform, tolerance: Tolerance) -> Self {
        Self {
            mapping,
            transform,
            tolerance,
        }
    }

    pub fn resolve<T: RecordTarget>(&self, diagnostics: &mut Diagnostics) -> IngestionResult<ResolvedSchema<T>> {
        let normalizer = CaptionNormalizer::new(self.mapping.clone(), self.transform.clone());
        let mut by_caption = HashMap::new();
        let mut by_key = HashMap::new();

        if T::DYNAMIC {
            for (caption, key) in self.mapping.iter() {
                by_caption.insert(caption.to_lowercase(), Setter::Mapping(key.to_string()));
            }
        } else {
            by_key.extend(T::discover());
            for (_, key) in self.mapping.iter().filter(|(_, key)| key.contains('.')) {
                by_key.insert(key.to_string(), Setter::nested(key));
            }
            for (caption, key) in self.mapping.iter() {
                let setter = by_key.get(key).cloned().or_else(|| {
                    if self.tolerance.is_strict() {
                        return None;
                    }
                    normalizer
                        .derive_key(caption)
                        .and_then(|derived| by_key.get(&derived).cloned())
                });
                match setter {
                    Some(setter) => {
                        by_caption.insert(caption.to_lowercase(), setter);
                    }
                    None => tracing::debug!(caption, key, "mapped field is not assignable"),
                }
            }
        }

        let on_the_fly = T::DYNAMIC && self.tolerance.binds_unmapped();
        if by_caption.is_empty() && by_key.is_empty() && !on_the_fly {
            self.tolerance.recover(
                IngestionError::SchemaResolution {
                    message: "no caption mapping could be resolved for the target record".to_string(),
                },
                diagnostics,
            )?;
        }

        Ok(ResolvedSchema {
            by_caption,
            by_key,
            normalizer,
            on_the_fly,
        })
    }
}
