//! Catalog of palette entries.
//!
//! The host editor describes every block it offers in the palette. Entries
//! are looked up by id, or by their visible label when the palette markup
//! carries no id.

use serde::{Deserialize, Serialize};
use vitrail_carton::{CompactString, FxHashMap};

/// One block offered in the palette.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PaletteEntry {
    /// Stable identifier, matched against `data-entry-id`.
    pub id: CompactString,

    /// Visible label.
    pub label: String,

    /// Category (e.g., "Layout", "Media").
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub category: Option<String>,

    /// Preview kind. Falls back to the category when absent.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub kind: Option<String>,

    /// Short description shown in the preview.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub content: Option<String>,

    /// Image URL used by media previews.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub media: Option<String>,

    /// Display order within the category.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub order: Option<u32>,
}

impl PaletteEntry {
    pub fn new(id: impl Into<CompactString>, label: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            label: label.into(),
            category: None,
            kind: None,
            content: None,
            media: None,
            order: None,
        }
    }

    pub fn with_kind(mut self, kind: impl Into<String>) -> Self {
        self.kind = Some(kind.into());
        self
    }

    pub fn with_category(mut self, category: impl Into<String>) -> Self {
        self.category = Some(category.into());
        self
    }

    pub fn with_content(mut self, content: impl Into<String>) -> Self {
        self.content = Some(content.into());
        self
    }

    pub fn with_media(mut self, media: impl Into<String>) -> Self {
        self.media = Some(media.into());
        self
    }
}

/// Error type for catalog construction.
#[derive(Debug, thiserror::Error)]
pub enum CatalogError {
    #[error("palette entry id must not be empty (label '{0}')")]
    EmptyId(String),

    #[error("duplicate palette entry id '{0}'")]
    DuplicateId(CompactString),

    #[error("invalid palette catalog: {0}")]
    Json(#[from] serde_json::Error),
}

/// Palette entries, owned by one editor runtime.
#[derive(Debug, Clone, Default)]
pub struct PaletteCatalog {
    entries: Vec<PaletteEntry>,
    by_id: FxHashMap<CompactString, usize>,
}

impl PaletteCatalog {
    pub fn new() -> Self {
        Self::default()
    }

    /// Parse a JSON array of entries.
    pub fn from_json(source: &str) -> Result<Self, CatalogError> {
        let entries: Vec<PaletteEntry> = serde_json::from_str(source)?;
        let mut catalog = Self::new();
        for entry in entries {
            catalog.insert(entry)?;
        }
        Ok(catalog)
    }

    pub fn insert(&mut self, entry: PaletteEntry) -> Result<(), CatalogError> {
        if entry.id.trim().is_empty() {
            return Err(CatalogError::EmptyId(entry.label));
        }
        if self.by_id.contains_key(&entry.id) {
            return Err(CatalogError::DuplicateId(entry.id));
        }
        self.by_id.insert(entry.id.clone(), self.entries.len());
        self.entries.push(entry);
        Ok(())
    }

    pub fn get(&self, id: &str) -> Option<&PaletteEntry> {
        self.by_id.get(id.trim()).map(|&index| &self.entries[index])
    }

    /// Entry whose label matches, ignoring surrounding whitespace and case.
    pub fn by_label(&self, label: &str) -> Option<&PaletteEntry> {
        let label = label.trim();
        if label.is_empty() {
            return None;
        }
        self.entries
            .iter()
            .find(|entry| entry.label.trim() == label)
            .or_else(|| {
                self.entries
                    .iter()
                    .find(|entry| entry.label.trim().eq_ignore_ascii_case(label))
            })
    }

    /// Look up by id first, then by label.
    pub fn resolve(&self, id: Option<&str>, label: &str) -> Option<&PaletteEntry> {
        id.and_then(|id| self.get(id))
            .or_else(|| self.by_label(label))
    }

    /// Entries grouped by category, sorted by category name; entries within
    /// a category by order, then label. Uncategorized entries come last.
    pub fn categories(&self) -> Vec<(&str, Vec<&PaletteEntry>)> {
        let mut groups: FxHashMap<&str, Vec<&PaletteEntry>> = FxHashMap::default();
        for entry in &self.entries {
            let category = entry.category.as_deref().unwrap_or("");
            groups.entry(category).or_default().push(entry);
        }

        let mut groups: Vec<_> = groups.into_iter().collect();
        groups.sort_by(|(a, _), (b, _)| (a.is_empty(), a).cmp(&(b.is_empty(), b)));
        for (_, entries) in &mut groups {
            entries.sort_by(|a, b| {
                a.order
                    .unwrap_or(u32::MAX)
                    .cmp(&b.order.unwrap_or(u32::MAX))
                    .then_with(|| a.label.cmp(&b.label))
            });
        }
        groups
    }

    pub fn iter(&self) -> impl Iterator<Item = &PaletteEntry> {
        self.entries.iter()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const SOURCE: &str = r#"[
        {"id": "hero-carousel", "label": "Hero carousel", "category": "Media", "kind": "carousel", "order": 2},
        {"id": "faq", "label": "FAQ", "category": "Content", "kind": "collapse"},
        {"id": "gallery", "label": "Gallery", "category": "Media", "order": 1},
        {"id": "spacer", "label": "Spacer"}
    ]"#;

    #[test]
    fn test_from_json() {
        let catalog = PaletteCatalog::from_json(SOURCE).unwrap();
        assert_eq!(catalog.len(), 4);
        let faq = catalog.get("faq").unwrap();
        assert_eq!(faq.kind.as_deref(), Some("collapse"));
        assert!(faq.media.is_none());
    }

    #[test]
    fn test_resolve_prefers_id_then_label() {
        let catalog = PaletteCatalog::from_json(SOURCE).unwrap();
        assert_eq!(catalog.resolve(Some("faq"), "Gallery").unwrap().id, "faq");
        assert_eq!(catalog.resolve(Some("missing"), "  Gallery\n").unwrap().id, "gallery");
        assert_eq!(catalog.resolve(None, "hero CAROUSEL").unwrap().id, "hero-carousel");
        assert!(catalog.resolve(None, "Unknown block").is_none());
        assert!(catalog.resolve(None, "   ").is_none());
    }

    #[test]
    fn test_categories_are_sorted() {
        let catalog = PaletteCatalog::from_json(SOURCE).unwrap();
        let groups: Vec<(&str, Vec<&str>)> = catalog
            .categories()
            .into_iter()
            .map(|(name, entries)| (name, entries.iter().map(|e| e.id.as_str()).collect()))
            .collect();
        assert_eq!(
            groups,
            vec![
                ("Content", vec!["faq"]),
                ("Media", vec!["gallery", "hero-carousel"]),
                ("", vec!["spacer"]),
            ]
        );
    }

    #[test]
    fn test_rejects_duplicates_and_empty_ids() {
        let mut catalog = PaletteCatalog::new();
        catalog.insert(PaletteEntry::new("a", "A")).unwrap();
        assert!(matches!(
            catalog.insert(PaletteEntry::new("a", "Again")),
            Err(CatalogError::DuplicateId(id)) if id == "a"
        ));
        assert!(matches!(
            catalog.insert(PaletteEntry::new(" ", "Blank")),
            Err(CatalogError::EmptyId(_))
        ));
        assert!(matches!(
            PaletteCatalog::from_json("{"),
            Err(CatalogError::Json(_))
        ));
    }
}
