//! Font catalog for the editor session.

use std::collections::BTreeSet;

use serde::{Deserialize, Serialize};

/// Families the editor offers without a network fetch. The renderer still
/// checks that each one is actually installed before relying on it.
pub const BUNDLED_FONTS: &[&str] = &[
    "Inter",
    "Roboto",
    "Open Sans",
    "Lato",
    "Montserrat",
    "Poppins",
    "Oswald",
    "Playfair Display",
    "Merriweather",
    "Bebas Neue",
    "Caveat",
    "Pacifico",
    "Dancing Script",
];

/// Generic families the renderer always resolves.
const GENERIC_FAMILIES: &[&str] = &["serif", "sans-serif", "monospace", "cursive", "fantasy"];

/// Which font families are available without loading.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FontCatalog {
    local: BTreeSet<String>,
}

impl FontCatalog {
    /// Catalog with no local fonts.
    #[must_use]
    pub fn empty() -> Self {
        Self {
            local: BTreeSet::new(),
        }
    }

    /// Register a family as locally available.
    pub fn add_local(&mut self, family: impl Into<String>) {
        self.local.insert(family.into());
    }

    /// Whether a family can be used without a fetch.
    #[must_use]
    pub fn is_local(&self, family: &str) -> bool {
        let family = family.trim();
        Self::is_generic(family) || self.local.iter().any(|f| f.eq_ignore_ascii_case(family))
    }

    /// Whether `family` is a generic family such as `sans-serif`.
    #[must_use]
    pub fn is_generic(family: &str) -> bool {
        let family = family.trim();
        GENERIC_FAMILIES.iter().any(|g| g.eq_ignore_ascii_case(family))
    }

    /// Locally available families.
    pub fn families(&self) -> impl Iterator<Item = &str> {
        self.local.iter().map(String::as_str)
    }
}

impl Default for FontCatalog {
    fn default() -> Self {
        let mut catalog = Self::empty();
        for family in BUNDLED_FONTS {
            catalog.add_local(*family);
        }
        catalog
    }
}
