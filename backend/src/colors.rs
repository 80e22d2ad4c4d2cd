// src/colors.rs
use base64::engine::general_purpose::STANDARD;
use base64::Engine;
use log::{debug, info};
use sha2::{Digest, Sha256};
use std::collections::HashMap;
use std::fs;
use std::io;
use std::path::Path;

use crate::record::{Category, FIELD_SEPARATOR};

pub const DEFAULT_HEX: &str = "#add8e6";
pub const ERROR_HEX: &str = "#ff000d";

/// A footer color together with the CSP hash of the exact style fragment
/// that renders it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Color {
    pub hex: String,
    pub hash: String,
}

impl Color {
    pub fn new(hex: impl Into<String>) -> Self {
        let hex = hex.into();
        let hash = style_hash(&hex);
        Color { hex, hash }
    }

    pub fn default_color() -> Self {
        Color::new(DEFAULT_HEX)
    }

    /// Used whenever there is no record to show.
    pub fn error_color() -> Self {
        Color::new(ERROR_HEX)
    }

    pub fn style_fragment(&self) -> String {
        style_fragment(&self.hex)
    }

    /// Value for a `style-src-elem` directive.
    pub fn csp_source(&self) -> String {
        format!("'sha256-{}'", self.hash)
    }
}

pub fn style_fragment(hex: &str) -> String {
    format!(".footer {{background-color:{};}}", hex)
}

/// Base64 SHA-256 of the style fragment, as browsers compute it for CSP.
pub fn style_hash(hex: &str) -> String {
    let digest = Sha256::digest(style_fragment(hex).as_bytes());
    STANDARD.encode(digest)
}

/// Maps categories to footer colors. Unmapped categories get the default.
#[derive(Debug, Clone)]
pub struct ColorResolver {
    mapping: HashMap<Category, Color>,
    default: Color,
    error: Color,
}

impl Default for ColorResolver {
    fn default() -> Self {
        ColorResolver {
            mapping: HashMap::new(),
            default: Color::default_color(),
            error: Color::error_color(),
        }
    }
}

impl ColorResolver {
    /// Parses `category|color` lines; the last mapping for a category wins.
    pub fn parse(text: &str) -> Self {
        let mut resolver = ColorResolver::default();

        for (index, line) in text.lines().enumerate() {
            if line.trim().is_empty() {
                continue;
            }

            let fields: Vec<&str> = line.split(FIELD_SEPARATOR).collect();
            let [category, hex] = fields.as_slice() else {
                debug!("Invalid color mapping at line {}: `{}`. Skipping.", index + 1, line);
                continue;
            };

            resolver
                .mapping
                .insert(Category::new(category.trim()), Color::new(hex.trim()));
        }

        resolver
    }

    pub fn from_file(path: &Path) -> io::Result<Self> {
        let text = fs::read_to_string(path)?;
        let resolver = ColorResolver::parse(&text);
        info!("Loaded {} color mappings from {}", resolver.len(), path.display());
        Ok(resolver)
    }

    pub fn len(&self) -> usize {
        self.mapping.len()
    }

    pub fn is_empty(&self) -> bool {
        self.mapping.is_empty()
    }

    pub fn resolve(&self, category: &Category) -> &Color {
        self.mapping.get(category).unwrap_or(&self.default)
    }

    pub fn error(&self) -> &Color {
        &self.error
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn hash_matches_known_fragment_digest() {
        let expected = STANDARD.encode(Sha256::digest(b".footer {background-color:#add8e6;}"));
        assert_eq!(Color::default_color().hash, expected);
        assert_eq!(style_hash(DEFAULT_HEX), style_hash(DEFAULT_HEX));
    }

    #[test]
    fn unmapped_categories_use_default() {
        let resolver = ColorResolver::parse("History|#123456\n");
        assert_eq!(resolver.resolve(&Category::from("Sports")), &Color::default_color());
        assert_eq!(resolver.resolve(&Category::from("History")).hex, "#123456");
    }

    #[test]
    fn last_mapping_wins_and_values_are_trimmed() {
        let resolver = ColorResolver::parse(" History | #111111 \nHistory|#222222\n");
        let color = resolver.resolve(&Category::from("History"));
        assert_eq!(color.hex, "#222222");
        assert_eq!(color.hash, style_hash("#222222"));
        assert_eq!(resolver.len(), 1);
    }

    #[test]
    fn malformed_and_blank_lines_are_skipped() {
        let resolver = ColorResolver::parse("\nnot a mapping\na|b|c\nArt|#abcdef\n");
        assert_eq!(resolver.len(), 1);
    }

    #[test]
    fn error_color_is_independent_of_mapping() {
        let resolver = ColorResolver::parse("Error|#000000\n");
        assert_eq!(resolver.error().hex, ERROR_HEX);
        assert_eq!(resolver.error().style_fragment(), ".footer {background-color:#ff000d;}");
    }
}
