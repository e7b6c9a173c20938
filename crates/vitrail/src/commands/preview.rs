//! Preview command - render the hover preview of a palette entry.

use std::fmt::Write as _;
use std::path::PathBuf;

use clap::Args;
use vitrail::musea::{render_preview, render_unknown, PaletteCatalog, PreviewKind};

use super::CommandError;

#[derive(Args)]
pub struct PreviewArgs {
    /// Palette catalog (JSON array of entries)
    pub catalog: PathBuf,

    /// Entry id or visible label; omit with --list
    #[arg(required_unless_present = "list")]
    pub entry: Option<String>,

    /// List the catalog by category instead of rendering
    #[arg(long)]
    pub list: bool,
}

pub fn run(args: PreviewArgs) -> Result<String, CommandError> {
    let source = std::fs::read_to_string(&args.catalog).map_err(|source| CommandError::Io {
        path: args.catalog.display().to_string(),
        source,
    })?;
    let catalog = PaletteCatalog::from_json(&source)?;
    tracing::debug!("{}: {} palette entries", args.catalog.display(), catalog.len());

    match args.entry.as_deref() {
        Some(entry) if !args.list => Ok(render(&catalog, entry)),
        _ => Ok(list(&catalog)),
    }
}

/// Preview of the entry with id or label `query`, generic when not found.
fn render(catalog: &PaletteCatalog, query: &str) -> String {
    match catalog.resolve(Some(query), query) {
        Some(entry) => render_preview(entry),
        None => {
            tracing::info!("'{}' is not in the catalog, rendering the generic preview", query);
            render_unknown(query)
        }
    }
}

fn list(catalog: &PaletteCatalog) -> String {
    let mut out = String::new();
    for (category, entries) in catalog.categories() {
        let name = if category.is_empty() { "(uncategorized)" } else { category };
        let _ = writeln!(out, "{}", name);
        for entry in entries {
            let _ = writeln!(
                out,
                "  {:<20} {:<24} {}",
                entry.id.as_str(),
                entry.label,
                PreviewKind::of(entry).as_str()
            );
        }
    }
    out.truncate(out.trim_end().len());
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    const CATALOG: &str = r#"[
        {"id": "hero", "label": "Hero carousel", "category": "Media", "kind": "slider"},
        {"id": "faq", "label": "FAQ", "category": "Content", "kind": "accordion"},
        {"id": "spacer", "label": "Spacer"}
    ]"#;

    fn catalog() -> PaletteCatalog {
        PaletteCatalog::from_json(CATALOG).unwrap()
    }

    #[test]
    fn test_render_by_id_and_label() {
        let catalog = catalog();
        assert!(render(&catalog, "hero").contains("block-preview--carousel"));
        assert!(render(&catalog, "faq").contains("block-preview--collapse"));
        assert!(render(&catalog, "hero carousel").contains("block-preview--carousel"));
    }

    #[test]
    fn test_unknown_entry_falls_back() {
        let html = render(&catalog(), "Pricing");
        assert!(html.starts_with("<div class=\"block-preview block-preview--generic\">"));
        assert!(html.contains("Pricing"));
    }

    #[test]
    fn test_list() {
        insta::assert_snapshot!(list(&catalog()), @r"
        Content
          faq                  FAQ                      collapse
        Media
          hero                 Hero carousel            carousel
        (uncategorized)
          spacer               Spacer                   generic
        ");
    }

    #[test]
    fn test_missing_file() {
        let result = run(PreviewArgs {
            catalog: PathBuf::from("/nonexistent/vitrail/catalog.json"),
            entry: Some("faq".into()),
            list: false,
        });
        assert!(matches!(result, Err(CommandError::Io { .. })));
    }
}
