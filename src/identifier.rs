//! Resource identifiers such as `minecraft:block/oak_button`.
//!
//! An identifier is split into an optional namespace, an optional folder and
//! the file name. The three accepted shapes are `namespace:folder/file`,
//! `namespace:file` and `folder/file`. Parsing never fails: input with no
//! usable component produces an empty identifier, and the stages that need a
//! file name report [`ResolveError::MalformedIdentifier`] when they ask for it.

use crate::error::{AssetKind, ResolveError, Result};
use serde::{Serialize, Serializer};
use std::fmt;
use std::hash::{Hash, Hasher};
use std::str::FromStr;
use std::sync::OnceLock;

/// Namespace used when an identifier does not name one.
pub const DEFAULT_NAMESPACE: &str = "minecraft";

/// Folder used when an identifier does not name one.
pub const DEFAULT_FOLDER: &str = "block";

/// A parsed resource identifier.
#[derive(Debug, Clone, Default)]
pub struct Identifier {
    raw: String,
    namespace: Option<String>,
    folder: Option<String>,
    file: Option<String>,
    folder_file: OnceLock<String>,
    namespace_folder_file: OnceLock<String>,
    namespace_file: OnceLock<String>,
}

impl Identifier {
    /// Parse an identifier string.
    pub fn parse(raw: &str) -> Self {
        let tokens = tokenize(raw);

        let rest = match tokens.first() {
            Some((_, Some(':'))) => &tokens[1..],
            _ => &tokens[..],
        };
        let namespace = if rest.len() < tokens.len() {
            Some(tokens[0].0.to_string())
        } else {
            None
        };

        let (folder, file) = match rest.split_last() {
            Some(((file, _), [])) => (None, Some(file.to_string())),
            Some(((file, _), folders)) => {
                let folder = folders
                    .iter()
                    .map(|(token, _)| *token)
                    .collect::<Vec<_>>()
                    .join("/");
                (Some(folder), Some(file.to_string()))
            }
            None => (None, None),
        };

        Self {
            raw: raw.to_string(),
            namespace,
            folder,
            file,
            ..Default::default()
        }
    }

    /// The string this identifier was parsed from.
    pub fn raw(&self) -> &str {
        &self.raw
    }

    /// Namespace, defaulting to `minecraft`.
    pub fn namespace(&self) -> &str {
        self.namespace.as_deref().unwrap_or(DEFAULT_NAMESPACE)
    }

    /// Folder, defaulting to `block`.
    pub fn folder(&self) -> &str {
        self.folder.as_deref().unwrap_or(DEFAULT_FOLDER)
    }

    pub fn has_namespace(&self) -> bool {
        self.namespace.is_some()
    }

    pub fn has_folder(&self) -> bool {
        self.folder.is_some()
    }

    pub fn file(&self) -> Option<&str> {
        self.file.as_deref()
    }

    /// The file component, or `MalformedIdentifier` if there is none.
    pub fn file_name(&self) -> Result<&str> {
        self.file()
            .ok_or_else(|| ResolveError::MalformedIdentifier(self.raw.clone()))
    }

    pub fn is_empty(&self) -> bool {
        self.file.is_none()
    }

    /// `folder/file`.
    pub fn folder_file(&self) -> &str {
        self.folder_file
            .get_or_init(|| format!("{}/{}", self.folder(), self.file().unwrap_or_default()))
    }

    /// `namespace:folder/file`.
    pub fn namespace_folder_file(&self) -> &str {
        self.namespace_folder_file
            .get_or_init(|| format!("{}:{}", self.namespace(), self.folder_file()))
    }

    /// `namespace:file`.
    pub fn namespace_file(&self) -> &str {
        self.namespace_file
            .get_or_init(|| format!("{}:{}", self.namespace(), self.file().unwrap_or_default()))
    }

    /// Relative path of the blockstate definition for this block id.
    pub fn blockstate_path(&self) -> Result<String> {
        Ok(format!(
            "assets/{}/blockstates/{}.json",
            self.namespace(),
            self.file_name()?
        ))
    }

    /// Relative path of the model file.
    pub fn model_path(&self) -> Result<String> {
        let file = self.file_name()?;
        Ok(format!(
            "assets/{}/models/{}/{}.json",
            self.namespace(),
            self.folder(),
            file
        ))
    }

    /// Relative path of the texture image.
    pub fn texture_path(&self) -> Result<String> {
        let file = self.file_name()?;
        Ok(format!(
            "assets/{}/textures/{}/{}.png",
            self.namespace(),
            self.folder(),
            file
        ))
    }

    /// Relative path of the texture's animation metadata.
    pub fn mcmeta_path(&self) -> Result<String> {
        Ok(format!("{}.mcmeta", self.texture_path()?))
    }

    /// Asset-relative path for the given asset kind.
    pub fn asset_path(&self, kind: AssetKind) -> Result<String> {
        match kind {
            AssetKind::Blockstate => self.blockstate_path(),
            AssetKind::Model => self.model_path(),
            AssetKind::Texture => self.texture_path(),
            AssetKind::AnimationMeta => self.mcmeta_path(),
        }
    }

    /// Check if this names one of the air blocks.
    pub fn is_air(&self) -> bool {
        self.namespace() == DEFAULT_NAMESPACE
            && matches!(self.file(), Some("air" | "cave_air" | "void_air"))
    }
}

/// Maximal runs of word characters followed by `:`, `/` or end of input,
/// paired with the separator that ended them.
fn tokenize(raw: &str) -> Vec<(&str, Option<char>)> {
    let bytes = raw.as_bytes();
    let is_word = |b: u8| b.is_ascii_alphanumeric() || b == b'_';

    let mut tokens = Vec::new();
    let mut i = 0;
    while i < bytes.len() {
        if !is_word(bytes[i]) {
            i += 1;
            continue;
        }
        let start = i;
        while i < bytes.len() && is_word(bytes[i]) {
            i += 1;
        }
        match bytes.get(i) {
            None => tokens.push((&raw[start..i], None)),
            Some(b':') => tokens.push((&raw[start..i], Some(':'))),
            Some(b'/') => tokens.push((&raw[start..i], Some('/'))),
            Some(_) => {}
        }
    }
    tokens
}

impl PartialEq for Identifier {
    fn eq(&self, other: &Self) -> bool {
        self.namespace() == other.namespace()
            && self.folder == other.folder
            && self.file == other.file
    }
}

impl Eq for Identifier {}

impl Hash for Identifier {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.namespace().hash(state);
        self.folder.hash(state);
        self.file.hash(state);
    }
}

impl FromStr for Identifier {
    type Err = std::convert::Infallible;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        Ok(Identifier::parse(s))
    }
}

impl From<&str> for Identifier {
    fn from(s: &str) -> Self {
        Identifier::parse(s)
    }
}

impl fmt::Display for Identifier {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.folder.is_some() {
            f.write_str(self.namespace_folder_file())
        } else {
            f.write_str(self.namespace_file())
        }
    }
}

impl Serialize for Identifier {
    fn serialize<S: Serializer>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error> {
        serializer.collect_str(self)
    }
}
