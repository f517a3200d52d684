//! Blockstate definition parsing.
//!
//! Blockstates map block properties to model references. There are two
//! formats: "variants", an ordered list of predicate strings, and
//! "multipart", an ordered list of conditionally applied parts.

use crate::identifier::Identifier;
use crate::region::Properties;
use crate::types::BlockTransform;
use serde::de::{MapAccess, Visitor};
use serde::{Deserialize, Deserializer, Serialize};
use std::collections::BTreeMap;
use std::fmt;

/// A blockstate definition from blockstates/*.json.
#[derive(Debug, Clone)]
pub enum BlockstateDefinition {
    /// Predicate rules in declaration order.
    Variants(Vec<VariantRule>),
    /// Conditional model application.
    Multipart(Vec<MultipartCase>),
}

impl<'de> Deserialize<'de> for BlockstateDefinition {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        #[derive(Deserialize)]
        struct RawBlockstate {
            variants: Option<OrderedVariants>,
            multipart: Option<Vec<MultipartCase>>,
        }

        let raw = RawBlockstate::deserialize(deserializer)?;

        if let Some(variants) = raw.variants {
            Ok(BlockstateDefinition::Variants(variants.0))
        } else if let Some(multipart) = raw.multipart {
            Ok(BlockstateDefinition::Multipart(multipart))
        } else {
            Ok(BlockstateDefinition::Variants(Vec::new()))
        }
    }
}

/// The `variants` object, keeping keys in the order they were written.
struct OrderedVariants(Vec<VariantRule>);

impl<'de> Deserialize<'de> for OrderedVariants {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        struct OrderedVisitor;

        impl<'de> Visitor<'de> for OrderedVisitor {
            type Value = OrderedVariants;

            fn expecting(&self, f: &mut fmt::Formatter) -> fmt::Result {
                f.write_str("a map of property predicates to model variants")
            }

            fn visit_map<A: MapAccess<'de>>(self, mut map: A) -> Result<Self::Value, A::Error> {
                let mut rules = Vec::with_capacity(map.size_hint().unwrap_or(0));
                while let Some((predicate, value)) = map.next_entry::<String, VariantValue>()? {
                    rules.push(VariantRule::new(predicate, value.into_vec()));
                }
                Ok(OrderedVariants(rules))
            }
        }

        deserializer.deserialize_map(OrderedVisitor)
    }
}

/// A variant value can be a single model or an array of alternatives.
#[derive(Debug, Clone, Deserialize)]
#[serde(untagged)]
enum VariantValue {
    Single(ModelVariant),
    Multiple(Vec<ModelVariant>),
}

impl VariantValue {
    fn into_vec(self) -> Vec<ModelVariant> {
        match self {
            VariantValue::Single(v) => vec![v],
            VariantValue::Multiple(v) => v,
        }
    }
}

/// One `"k=v,k2=v2": ...` entry of a variants blockstate.
#[derive(Debug, Clone)]
pub struct VariantRule {
    pub predicate: String,
    pub conditions: Vec<(String, String)>,
    pub variants: Vec<ModelVariant>,
}

impl VariantRule {
    pub fn new(predicate: impl Into<String>, variants: Vec<ModelVariant>) -> Self {
        let predicate = predicate.into();
        let conditions = parse_predicate(&predicate);
        Self {
            predicate,
            conditions,
            variants,
        }
    }

    /// Every predicate key must be present with an equal value.
    pub fn matches(&self, properties: &Properties) -> bool {
        self.conditions
            .iter()
            .all(|(key, value)| properties.matches(key, value))
    }
}

/// Split a predicate string into `(key, value)` pairs. The empty string has none.
pub fn parse_predicate(predicate: &str) -> Vec<(String, String)> {
    predicate
        .split(',')
        .filter(|clause| !clause.is_empty())
        .map(|clause| match clause.split_once('=') {
            Some((k, v)) => (k.trim().to_string(), v.trim().to_string()),
            None => (clause.trim().to_string(), String::new()),
        })
        .collect()
}

/// A model reference with block rotation.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ModelVariant {
    /// Model identifier (e.g., "block/stone" or "minecraft:block/stone").
    pub model: String,
    /// X rotation in degrees (0, 90, 180, 270).
    #[serde(default)]
    pub x: i32,
    /// Y rotation in degrees (0, 90, 180, 270).
    #[serde(default)]
    pub y: i32,
    #[serde(default)]
    pub uvlock: bool,
    /// Parsed for completeness; selection among alternatives is uniform.
    #[serde(default = "default_weight")]
    pub weight: u32,
}

fn default_weight() -> u32 {
    1
}

impl ModelVariant {
    pub fn new(model: impl Into<String>) -> Self {
        Self {
            model: model.into(),
            x: 0,
            y: 0,
            uvlock: false,
            weight: 1,
        }
    }

    pub fn with_rotation(mut self, x: i32, y: i32) -> Self {
        self.x = x;
        self.y = y;
        self
    }

    pub fn model_id(&self) -> Identifier {
        Identifier::parse(&self.model)
    }

    pub fn transform(&self) -> BlockTransform {
        BlockTransform::new(self.x, self.y, self.uvlock)
    }
}

/// A multipart case with optional condition.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MultipartCase {
    #[serde(default)]
    pub when: Option<MultipartCondition>,
    pub apply: ApplyValue,
}

impl MultipartCase {
    /// How many times this case applies to `properties`.
    pub fn applications(&self, properties: &Properties) -> usize {
        match &self.when {
            None => 1,
            Some(condition) => condition.applications(properties),
        }
    }
}

/// The apply value can be a single model or an array of alternatives.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(untagged)]
pub enum ApplyValue {
    Single(ModelVariant),
    Multiple(Vec<ModelVariant>),
}

impl ApplyValue {
    pub fn variants(&self) -> &[ModelVariant] {
        match self {
            ApplyValue::Single(v) => std::slice::from_ref(v),
            ApplyValue::Multiple(v) => v,
        }
    }
}

/// A set of `property: value` requirements. A value may list alternatives
/// separated by `|`.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct Clause(BTreeMap<String, String>);

impl Clause {
    pub fn new<K: Into<String>, V: Into<String>>(pairs: impl IntoIterator<Item = (K, V)>) -> Self {
        Clause(
            pairs
                .into_iter()
                .map(|(k, v)| (k.into(), v.into()))
                .collect(),
        )
    }

    /// Does `value` satisfy the requirement for `key`? False if the clause
    /// does not mention the key.
    pub fn accepts(&self, key: &str, value: &crate::region::PropertyValue) -> bool {
        self.0
            .get(key)
            .map(|expected| expected.split('|').any(|alt| value.matches(alt)))
            .unwrap_or(false)
    }

    /// All requirements hold.
    pub fn holds(&self, properties: &Properties) -> bool {
        self.0.keys().all(|key| {
            properties
                .get(key)
                .map(|value| self.accepts(key, value))
                .unwrap_or(false)
        })
    }
}

impl<'de> Deserialize<'de> for Clause {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        // Conditions are usually strings, but some packs write bare booleans.
        let raw = BTreeMap::<String, crate::region::PropertyValue>::deserialize(deserializer)?;
        Ok(Clause(
            raw.into_iter().map(|(k, v)| (k, v.to_string())).collect(),
        ))
    }
}

/// Multipart condition for when a case applies.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(untagged)]
pub enum MultipartCondition {
    /// At least one clause holds.
    Or {
        #[serde(rename = "OR")]
        any: Vec<Clause>,
    },
    /// Every clause holds.
    And {
        #[serde(rename = "AND")]
        all: Vec<Clause>,
    },
    /// One application per runtime property matching a condition entry.
    Simple(Clause),
}

impl MultipartCondition {
    /// Number of times the guarded part applies. Properties whose value is
    /// `none` are ignored.
    ///
    /// `AND` and `OR` conditions apply at most once. A flat condition applies
    /// once for every runtime property it matches, so a flat condition naming
    /// two keys that both match applies twice.
    pub fn applications(&self, properties: &Properties) -> usize {
        let filtered = properties.without_none();
        match self {
            MultipartCondition::Or { any } => any.iter().any(|c| c.holds(&filtered)) as usize,
            MultipartCondition::And { all } => all.iter().all(|c| c.holds(&filtered)) as usize,
            MultipartCondition::Simple(clause) => filtered
                .iter()
                .filter(|(key, value)| clause.accepts(key.as_str(), value))
                .count(),
        }
    }

    pub fn matches(&self, properties: &Properties) -> bool {
        self.applications(properties) > 0
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_simple_variants() {
        let json = r#"{
            "variants": {
                "": { "model": "block/stone" }
            }
        }"#;

        let def: BlockstateDefinition = serde_json::from_str(json).unwrap();
        match def {
            BlockstateDefinition::Variants(rules) => {
                assert_eq!(rules.len(), 1);
                assert!(rules[0].conditions.is_empty());
                assert_eq!(rules[0].variants[0].model, "block/stone");
                assert!(rules[0].matches(&Properties::new()));
            }
            _ => panic!("Expected Variants"),
        }
    }

    #[test]
    fn test_variants_keep_declared_order() {
        let json = r#"{
            "variants": {
                "facing=south": { "model": "block/furnace", "y": 180 },
                "facing=north": { "model": "block/furnace" },
                "facing=west": { "model": "block/furnace", "y": 270 },
                "facing=east": { "model": "block/furnace", "y": 90 }
            }
        }"#;

        let def: BlockstateDefinition = serde_json::from_str(json).unwrap();
        let BlockstateDefinition::Variants(rules) = def else {
            panic!("Expected Variants");
        };
        let order: Vec<_> = rules.iter().map(|r| r.predicate.as_str()).collect();
        assert_eq!(
            order,
            vec!["facing=south", "facing=north", "facing=west", "facing=east"]
        );
        assert_eq!(rules[3].variants[0].transform(), BlockTransform::new(0, 90, false));
    }

    #[test]
    fn test_parse_weighted_variants() {
        let json = r#"{
            "variants": {
                "": [
                    { "model": "block/stone", "weight": 10 },
                    { "model": "block/stone_mirrored", "weight": 5 }
                ]
            }
        }"#;

        let def: BlockstateDefinition = serde_json::from_str(json).unwrap();
        let BlockstateDefinition::Variants(rules) = def else {
            panic!("Expected Variants");
        };
        assert_eq!(rules[0].variants.len(), 2);
        assert_eq!(rules[0].variants[1].weight, 5);
    }

    #[test]
    fn test_variant_rule_requires_every_key() {
        let rule = VariantRule::new("facing=north,half=top", vec![]);
        let north_top = Properties::new().with("facing", "north").with("half", "top");
        let north_only = Properties::new().with("facing", "north");

        assert!(rule.matches(&north_top));
        assert!(!rule.matches(&north_only));
    }

    #[test]
    fn test_parse_predicate() {
        assert!(parse_predicate("").is_empty());
        assert_eq!(
            parse_predicate("axis=x,lit=true"),
            vec![
                ("axis".to_string(), "x".to_string()),
                ("lit".to_string(), "true".to_string())
            ]
        );
    }

    #[test]
    fn test_parse_multipart() {
        let json = r#"{
            "multipart": [
                { "apply": { "model": "block/fence_post" } },
                { "when": { "north": "true" }, "apply": { "model": "block/fence_side" } },
                { "when": { "AND": [{ "up": "true" }, { "north": "low|tall" }] },
                  "apply": [{ "model": "block/wall_side" }, { "model": "block/wall_side_alt" }] }
            ]
        }"#;

        let def: BlockstateDefinition = serde_json::from_str(json).unwrap();
        let BlockstateDefinition::Multipart(cases) = def else {
            panic!("Expected Multipart");
        };
        assert_eq!(cases.len(), 3);
        assert!(cases[0].when.is_none());
        assert!(matches!(cases[1].when, Some(MultipartCondition::Simple(_))));
        assert!(matches!(cases[2].when, Some(MultipartCondition::And { .. })));
        assert_eq!(cases[2].apply.variants().len(), 2);
    }

    #[test]
    fn test_condition_or() {
        let json = r#"{ "OR": [{ "facing": "north" }, { "facing": "south" }] }"#;
        let cond: MultipartCondition = serde_json::from_str(json).unwrap();

        assert!(cond.matches(&Properties::new().with("facing", "north")));
        assert!(cond.matches(&Properties::new().with("facing", "south")));
        assert!(!cond.matches(&Properties::new().with("facing", "east")));
    }

    #[test]
    fn test_condition_and_ignores_none_values() {
        let json = r#"{ "AND": [{ "north": "none" }] }"#;
        let cond: MultipartCondition = serde_json::from_str(json).unwrap();

        // `none` entries are removed before evaluation, so they never match.
        assert!(!cond.matches(&Properties::new().with("north", "none")));
    }

    #[test]
    fn test_condition_pipe_values() {
        let cond = MultipartCondition::Simple(Clause::new([("east", "low|tall")]));

        assert!(cond.matches(&Properties::new().with("east", "low")));
        assert!(cond.matches(&Properties::new().with("east", "tall")));
        assert!(!cond.matches(&Properties::new().with("east", "none")));
    }

    #[test]
    fn test_flat_condition_applies_once_per_matching_key() {
        let cond = MultipartCondition::Simple(Clause::new([("north", "true"), ("east", "true")]));
        let both = Properties::new().with("north", true).with("east", true);
        let one = Properties::new().with("north", true).with("east", false);

        assert_eq!(cond.applications(&both), 2);
        assert_eq!(cond.applications(&one), 1);
        assert_eq!(cond.applications(&Properties::new()), 0);
    }

    #[test]
    fn test_boolean_condition_values() {
        let json = r#"{ "north": true }"#;
        let cond: MultipartCondition = serde_json::from_str(json).unwrap();
        assert!(cond.matches(&Properties::new().with("north", "true")));
    }
}
