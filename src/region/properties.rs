//! Block state properties.
//!
//! Properties arrive as a loosely typed bag (`"facing": "north"`,
//! `"waterlogged": false`, `"power": 15`). Keys the resolver cares about are
//! enumerated; anything else is kept under [`PropertyKey::Other`]. Every
//! value has a canonical string form, which is what blockstate predicates
//! compare against.

use serde::{Deserialize, Deserializer, Serialize, Serializer};
use std::cmp::Ordering;
use std::collections::BTreeMap;
use std::fmt;
use std::hash::{Hash, Hasher};

/// Value used by connection properties to mean "not connected".
pub const NONE_LITERAL: &str = "none";

/// A property name.
#[derive(Debug, Clone)]
pub enum PropertyKey {
    Facing,
    Axis,
    Half,
    Open,
    Powered,
    Short,
    Type,
    Waterlogged,
    North,
    South,
    East,
    West,
    Up,
    Down,
    Other(String),
}

impl PropertyKey {
    pub fn parse(key: &str) -> Self {
        match key {
            "facing" => PropertyKey::Facing,
            "axis" => PropertyKey::Axis,
            "half" => PropertyKey::Half,
            "open" => PropertyKey::Open,
            "powered" => PropertyKey::Powered,
            "short" => PropertyKey::Short,
            "type" => PropertyKey::Type,
            "waterlogged" => PropertyKey::Waterlogged,
            "north" => PropertyKey::North,
            "south" => PropertyKey::South,
            "east" => PropertyKey::East,
            "west" => PropertyKey::West,
            "up" => PropertyKey::Up,
            "down" => PropertyKey::Down,
            other => PropertyKey::Other(other.to_string()),
        }
    }

    pub fn as_str(&self) -> &str {
        match self {
            PropertyKey::Facing => "facing",
            PropertyKey::Axis => "axis",
            PropertyKey::Half => "half",
            PropertyKey::Open => "open",
            PropertyKey::Powered => "powered",
            PropertyKey::Short => "short",
            PropertyKey::Type => "type",
            PropertyKey::Waterlogged => "waterlogged",
            PropertyKey::North => "north",
            PropertyKey::South => "south",
            PropertyKey::East => "east",
            PropertyKey::West => "west",
            PropertyKey::Up => "up",
            PropertyKey::Down => "down",
            PropertyKey::Other(key) => key,
        }
    }

    /// Connection keys (`north`, `up`, ...) whose `none` value means unset.
    pub fn is_directional(&self) -> bool {
        matches!(
            self,
            PropertyKey::North
                | PropertyKey::South
                | PropertyKey::East
                | PropertyKey::West
                | PropertyKey::Up
                | PropertyKey::Down
        )
    }
}

// Keys compare by name so that `Other("facing")` and `Facing` are one key.
impl PartialEq for PropertyKey {
    fn eq(&self, other: &Self) -> bool {
        self.as_str() == other.as_str()
    }
}

impl Eq for PropertyKey {}

impl Hash for PropertyKey {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.as_str().hash(state);
    }
}

impl PartialOrd for PropertyKey {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for PropertyKey {
    fn cmp(&self, other: &Self) -> Ordering {
        self.as_str().cmp(other.as_str())
    }
}

impl fmt::Display for PropertyKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A property value.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum PropertyValue {
    Bool(bool),
    Int(i64),
    Name(String),
}

impl PropertyValue {
    /// Interpret a string value, recognizing booleans and integers.
    pub fn parse(value: &str) -> Self {
        match value {
            "true" => PropertyValue::Bool(true),
            "false" => PropertyValue::Bool(false),
            _ => match value.parse::<i64>() {
                Ok(n) => PropertyValue::Int(n),
                Err(_) => PropertyValue::Name(value.to_string()),
            },
        }
    }

    pub fn is_none_literal(&self) -> bool {
        matches!(self, PropertyValue::Name(name) if name == NONE_LITERAL)
    }

    /// Compare against a predicate value from a blockstate file.
    pub fn matches(&self, expected: &str) -> bool {
        match self {
            PropertyValue::Bool(b) => expected == if *b { "true" } else { "false" },
            PropertyValue::Int(n) => expected.parse::<i64>().map(|e| e == *n).unwrap_or(false),
            PropertyValue::Name(name) => name == expected,
        }
    }
}

impl fmt::Display for PropertyValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            PropertyValue::Bool(b) => write!(f, "{}", b),
            PropertyValue::Int(n) => write!(f, "{}", n),
            PropertyValue::Name(name) => f.write_str(name),
        }
    }
}

impl From<&str> for PropertyValue {
    fn from(value: &str) -> Self {
        PropertyValue::parse(value)
    }
}

impl From<bool> for PropertyValue {
    fn from(value: bool) -> Self {
        PropertyValue::Bool(value)
    }
}

impl From<i64> for PropertyValue {
    fn from(value: i64) -> Self {
        PropertyValue::Int(value)
    }
}

impl<'de> Deserialize<'de> for PropertyValue {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        #[derive(Deserialize)]
        #[serde(untagged)]
        enum RawValue {
            Bool(bool),
            Int(i64),
            Text(String),
        }

        Ok(match RawValue::deserialize(deserializer)? {
            RawValue::Bool(b) => PropertyValue::Bool(b),
            RawValue::Int(n) => PropertyValue::Int(n),
            RawValue::Text(s) => PropertyValue::parse(&s),
        })
    }
}

impl Serialize for PropertyValue {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_str(self)
    }
}

/// The property set of one block state, ordered by key name.
#[derive(Debug, Clone, Default, PartialEq, Eq, Hash)]
pub struct Properties(BTreeMap<PropertyKey, PropertyValue>);

impl Properties {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with(mut self, key: &str, value: impl Into<PropertyValue>) -> Self {
        self.insert(key, value);
        self
    }

    pub fn insert(&mut self, key: &str, value: impl Into<PropertyValue>) {
        self.0.insert(PropertyKey::parse(key), value.into());
    }

    pub fn get(&self, key: &str) -> Option<&PropertyValue> {
        self.0.get(&PropertyKey::parse(key))
    }

    pub fn iter(&self) -> impl Iterator<Item = (&PropertyKey, &PropertyValue)> {
        self.0.iter()
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// Does the runtime value of `key` equal `expected`? Missing keys never match.
    pub fn matches(&self, key: &str, expected: &str) -> bool {
        self.get(key).map(|v| v.matches(expected)).unwrap_or(false)
    }

    /// Copy without entries whose value is the `none` literal.
    pub fn without_none(&self) -> Properties {
        Properties(
            self.0
                .iter()
                .filter(|(_, value)| !value.is_none_literal())
                .map(|(k, v)| (k.clone(), v.clone()))
                .collect(),
        )
    }

    /// Normalized `k=v,k2=v2` form, sorted by key.
    pub fn cache_key(&self) -> String {
        self.to_string()
    }
}

impl fmt::Display for Properties {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for (i, (key, value)) in self.0.iter().enumerate() {
            if i > 0 {
                f.write_str(",")?;
            }
            write!(f, "{}={}", key, value)?;
        }
        Ok(())
    }
}

impl<'de> Deserialize<'de> for Properties {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let raw = BTreeMap::<String, PropertyValue>::deserialize(deserializer)?;
        Ok(Properties(
            raw.into_iter()
                .map(|(k, v)| (PropertyKey::parse(&k), v))
                .collect(),
        ))
    }
}

impl Serialize for Properties {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_map(self.0.iter().map(|(k, v)| (k.as_str(), v)))
    }
}

impl<K: AsRef<str>, V: Into<PropertyValue>> FromIterator<(K, V)> for Properties {
    fn from_iter<I: IntoIterator<Item = (K, V)>>(iter: I) -> Self {
        let mut props = Properties::new();
        for (k, v) in iter {
            props.insert(k.as_ref(), v);
        }
        props
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_value_parsing() {
        assert_eq!(PropertyValue::parse("true"), PropertyValue::Bool(true));
        assert_eq!(PropertyValue::parse("15"), PropertyValue::Int(15));
        assert_eq!(
            PropertyValue::parse("north"),
            PropertyValue::Name("north".to_string())
        );
    }

    #[test]
    fn test_typed_values_match_predicate_strings() {
        let props = Properties::new()
            .with("waterlogged", false)
            .with("power", 7)
            .with("facing", "west");

        assert!(props.matches("waterlogged", "false"));
        assert!(props.matches("power", "7"));
        assert!(props.matches("facing", "west"));
        assert!(!props.matches("facing", "east"));
        assert!(!props.matches("axis", "x"));
    }

    #[test]
    fn test_known_and_fallback_keys() {
        assert_eq!(PropertyKey::parse("facing"), PropertyKey::Facing);
        assert_eq!(
            PropertyKey::parse("power"),
            PropertyKey::Other("power".to_string())
        );
        assert_eq!(PropertyKey::Other("facing".to_string()), PropertyKey::Facing);
        assert!(PropertyKey::North.is_directional());
        assert!(!PropertyKey::Facing.is_directional());
    }

    #[test]
    fn test_without_none() {
        let props = Properties::new()
            .with("north", "none")
            .with("east", "side")
            .with("power", 0);
        let filtered = props.without_none();

        assert_eq!(filtered.len(), 2);
        assert!(filtered.get("north").is_none());
        assert!(filtered.matches("east", "side"));
    }

    #[test]
    fn test_cache_key_is_sorted() {
        let props = Properties::new().with("half", "bottom").with("facing", "north");
        assert_eq!(props.cache_key(), "facing=north,half=bottom");
        assert_eq!(Properties::new().cache_key(), "");
    }

    #[test]
    fn test_deserialize_mixed_values() {
        let json = r#"{ "facing": "up", "extended": "false", "power": 3, "lit": true }"#;
        let props: Properties = serde_json::from_str(json).unwrap();

        assert_eq!(props.get("extended"), Some(&PropertyValue::Bool(false)));
        assert_eq!(props.get("power"), Some(&PropertyValue::Int(3)));
        assert_eq!(props.get("lit"), Some(&PropertyValue::Bool(true)));
        assert_eq!(props.cache_key(), "extended=false,facing=up,lit=true,power=3");
    }
}
