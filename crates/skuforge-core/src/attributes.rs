//! # Variant Attributes
//!
//! Ordered attribute bags and duplicate-variant detection.
//!
//! Variants come in two shapes:
//! ```text
//! Legacy:   { "size": "L", "color": "Red" }
//! Dynamic:  { "attributes": [ {"key": "Color", "value": "Red"},
//!                             {"key": "Size",  "value": "L"} ] }
//! ```
//! Both reduce to the same signature (`color:red|size:l`), so two variants
//! are duplicates when their signatures match, whatever the insertion order.

use std::collections::HashMap;

use serde::{Deserialize, Serialize};

use crate::error::{CoreError, CoreResult, ValidationError};

/// One `(key, value)` pair of an [`AttributeBag`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AttributePair {
    pub key: String,
    pub value: String,
}

/// Ordered `(key, value)` pairs with unique keys (compared case-insensitively).
///
/// Order is preserved for rendering `{ATTRIBUTE_VALUE}`; it is ignored by
/// [`VariantAttributes::signature`].
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(try_from = "Vec<AttributePair>", into = "Vec<AttributePair>")]
pub struct AttributeBag {
    pairs: Vec<AttributePair>,
}

impl AttributeBag {
    pub fn new() -> Self {
        Self::default()
    }

    /// Builds a bag, failing on the first repeated key.
    pub fn from_pairs<K, V>(pairs: impl IntoIterator<Item = (K, V)>) -> CoreResult<Self>
    where
        K: Into<String>,
        V: Into<String>,
    {
        let mut bag = AttributeBag::new();
        for (key, value) in pairs {
            bag.insert(key, value)?;
        }
        Ok(bag)
    }

    /// Appends a pair.
    pub fn insert(&mut self, key: impl Into<String>, value: impl Into<String>) -> CoreResult<()> {
        let key = key.into();
        let trimmed = key.trim();
        if trimmed.is_empty() {
            return Err(ValidationError::required("attribute key").into());
        }
        if self.pairs.iter().any(|p| canonical(&p.key) == canonical(trimmed)) {
            return Err(CoreError::DuplicateAttributeKey(trimmed.to_string()));
        }
        self.pairs.push(AttributePair {
            key: trimmed.to_string(),
            value: value.into(),
        });
        Ok(())
    }

    pub fn get(&self, key: &str) -> Option<&str> {
        let wanted = canonical(key);
        self.pairs
            .iter()
            .find(|p| canonical(&p.key) == wanted)
            .map(|p| p.value.as_str())
    }

    pub fn iter(&self) -> impl Iterator<Item = &AttributePair> {
        self.pairs.iter()
    }

    /// Values in insertion order.
    pub fn values(&self) -> Vec<String> {
        self.pairs.iter().map(|p| p.value.clone()).collect()
    }

    pub fn len(&self) -> usize {
        self.pairs.len()
    }

    pub fn is_empty(&self) -> bool {
        self.pairs.is_empty()
    }
}

impl TryFrom<Vec<AttributePair>> for AttributeBag {
    type Error = CoreError;

    fn try_from(pairs: Vec<AttributePair>) -> Result<Self, Self::Error> {
        AttributeBag::from_pairs(pairs.into_iter().map(|p| (p.key, p.value)))
    }
}

impl From<AttributeBag> for Vec<AttributePair> {
    fn from(bag: AttributeBag) -> Self {
        bag.pairs
    }
}

/// The legacy fixed-shape attributes.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct LegacyAttributes {
    #[serde(default)]
    pub size: Option<String>,
    #[serde(default)]
    pub color: Option<String>,
}

/// Attributes of a variant in either supported shape.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum VariantAttributes {
    Dynamic { attributes: AttributeBag },
    Legacy(LegacyAttributes),
}

impl VariantAttributes {
    pub fn legacy(size: Option<&str>, color: Option<&str>) -> Self {
        VariantAttributes::Legacy(LegacyAttributes {
            size: size.map(str::to_string),
            color: color.map(str::to_string),
        })
    }

    pub fn dynamic(attributes: AttributeBag) -> Self {
        VariantAttributes::Dynamic { attributes }
    }

    /// `(key, value)` pairs in rendering order. Legacy variants render
    /// color before size; empty legacy fields are skipped.
    pub fn pairs(&self) -> Vec<(String, String)> {
        match self {
            VariantAttributes::Dynamic { attributes } => attributes
                .iter()
                .map(|p| (p.key.clone(), p.value.clone()))
                .collect(),
            VariantAttributes::Legacy(legacy) => [("color", &legacy.color), ("size", &legacy.size)]
                .into_iter()
                .filter_map(|(key, value)| match value.as_deref().map(str::trim) {
                    Some(v) if !v.is_empty() => Some((key.to_string(), v.to_string())),
                    _ => None,
                })
                .collect(),
        }
    }

    /// Attribute values in rendering order, ready for abbreviation.
    pub fn values(&self) -> Vec<String> {
        self.pairs().into_iter().map(|(_, v)| v).collect()
    }

    /// Order-independent identity: sorted, normalized `key:value` pairs.
    pub fn signature(&self) -> String {
        let mut parts: Vec<String> = self
            .pairs()
            .into_iter()
            .map(|(k, v)| format!("{}:{}", canonical(&k), canonical(&v)))
            .collect();
        parts.sort();
        parts.join("|")
    }
}

fn canonical(s: &str) -> String {
    s.split_whitespace()
        .collect::<Vec<_>>()
        .join(" ")
        .to_lowercase()
}

/// Returns every `(earlier, later)` index pair whose signatures match.
///
/// ## Example
/// ```rust
/// use skuforge_core::attributes::{find_duplicate_variants, AttributeBag, VariantAttributes};
///
/// let a = VariantAttributes::legacy(Some("L"), Some("Red"));
/// let b = VariantAttributes::dynamic(
///     AttributeBag::from_pairs([("Size", "l"), ("Color", "red")]).unwrap(),
/// );
/// assert_eq!(find_duplicate_variants(&[a, b]), vec![(0, 1)]);
/// ```
pub fn find_duplicate_variants(variants: &[VariantAttributes]) -> Vec<(usize, usize)> {
    let mut seen: HashMap<String, Vec<usize>> = HashMap::new();
    let mut duplicates = Vec::new();

    for (idx, variant) in variants.iter().enumerate() {
        let entry = seen.entry(variant.signature()).or_default();
        duplicates.extend(entry.iter().map(|earlier| (*earlier, idx)));
        entry.push(idx);
    }

    duplicates
}

// =============================================================================
// Unit Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_bag_rejects_duplicate_keys() {
        let err = AttributeBag::from_pairs([("Color", "Red"), ("color", "Blue")]).unwrap_err();
        assert!(matches!(err, CoreError::DuplicateAttributeKey(k) if k == "color"));
    }

    #[test]
    fn test_bag_rejects_blank_key() {
        assert!(AttributeBag::from_pairs([(" ", "Red")]).is_err());
    }

    #[test]
    fn test_bag_preserves_order() {
        let bag = AttributeBag::from_pairs([("Size", "L"), ("Color", "Red")]).unwrap();
        assert_eq!(bag.values(), vec!["L", "Red"]);
        assert_eq!(bag.get("color"), Some("Red"));
        assert_eq!(bag.len(), 2);
    }

    #[test]
    fn test_dynamic_duplicates_ignore_order() {
        let a = VariantAttributes::dynamic(
            AttributeBag::from_pairs([("Color", "Red"), ("Size", "L")]).unwrap(),
        );
        let b = VariantAttributes::dynamic(
            AttributeBag::from_pairs([("size", "l"), ("COLOR", " red ")]).unwrap(),
        );
        let c = VariantAttributes::dynamic(
            AttributeBag::from_pairs([("Color", "Blue"), ("Size", "L")]).unwrap(),
        );

        assert_eq!(a.signature(), b.signature());
        assert_eq!(find_duplicate_variants(&[a, c, b]), vec![(0, 2)]);
    }

    #[test]
    fn test_legacy_duplicates() {
        let a = VariantAttributes::legacy(Some("M"), Some("Black"));
        let b = VariantAttributes::legacy(Some("m"), Some("BLACK"));
        let c = VariantAttributes::legacy(Some("M"), None);

        assert_eq!(find_duplicate_variants(&[a, b, c]), vec![(0, 1)]);
    }

    #[test]
    fn test_legacy_values_render_color_first() {
        let v = VariantAttributes::legacy(Some("L"), Some("Red"));
        assert_eq!(v.values(), vec!["Red", "L"]);
    }

    #[test]
    fn test_three_way_duplicates() {
        let v = VariantAttributes::legacy(Some("S"), Some("White"));
        let all = vec![v.clone(), v.clone(), v];
        assert_eq!(find_duplicate_variants(&all), vec![(0, 1), (0, 2), (1, 2)]);
    }

    #[test]
    fn test_serde_shapes() {
        let legacy: VariantAttributes =
            serde_json::from_str(r#"{"size":"L","color":"Red"}"#).unwrap();
        assert!(matches!(legacy, VariantAttributes::Legacy(_)));

        let dynamic: VariantAttributes = serde_json::from_str(
            r#"{"attributes":[{"key":"Color","value":"Red"},{"key":"Size","value":"L"}]}"#,
        )
        .unwrap();
        assert!(matches!(dynamic, VariantAttributes::Dynamic { .. }));
        assert_eq!(legacy.signature(), dynamic.signature());

        let bad = serde_json::from_str::<VariantAttributes>(
            r#"{"attributes":[{"key":"Color","value":"Red"},{"key":"color","value":"Blue"}]}"#,
        );
        assert!(bad.is_err());
    }
}
