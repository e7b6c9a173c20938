//! Preview fragments for palette entries.
//!
//! Every entry is rendered by the renderer of its [`PreviewKind`]. Kinds are
//! resolved from the entry's `kind` (or, failing that, its category) through
//! a static table of names and aliases; anything unknown gets the generic
//! renderer.

use std::borrow::Cow;

use phf::phf_map;
use serde::{Deserialize, Serialize};

use crate::catalog::PaletteEntry;

/// Shape of a preview.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PreviewKind {
    Carousel,
    Collapse,
    Card,
    Button,
    Text,
    Image,
    Layout,
    Generic,
}

/// Kind names and their aliases.
static KINDS: phf::Map<&'static str, PreviewKind> = phf_map! {
    "carousel" => PreviewKind::Carousel,
    "slider" => PreviewKind::Carousel,
    "slideshow" => PreviewKind::Carousel,
    "collapse" => PreviewKind::Collapse,
    "accordion" => PreviewKind::Collapse,
    "card" => PreviewKind::Card,
    "cards" => PreviewKind::Card,
    "button" => PreviewKind::Button,
    "buttons" => PreviewKind::Button,
    "text" => PreviewKind::Text,
    "heading" => PreviewKind::Text,
    "paragraph" => PreviewKind::Text,
    "typography" => PreviewKind::Text,
    "image" => PreviewKind::Image,
    "media" => PreviewKind::Image,
    "layout" => PreviewKind::Layout,
    "grid" => PreviewKind::Layout,
    "columns" => PreviewKind::Layout,
    "section" => PreviewKind::Layout,
};

/// Renders the body of a preview.
pub type Renderer = fn(&PaletteEntry) -> String;

impl PreviewKind {
    /// Kind named by `key`, case-insensitive.
    pub fn from_key(key: &str) -> Option<Self> {
        let key = key.trim();
        KINDS
            .get(key)
            .or_else(|| KINDS.get(key.to_ascii_lowercase().as_str()))
            .copied()
    }

    /// Kind of `entry`: its `kind`, else its category, else generic.
    pub fn of(entry: &PaletteEntry) -> Self {
        entry
            .kind
            .as_deref()
            .and_then(Self::from_key)
            .or_else(|| entry.category.as_deref().and_then(Self::from_key))
            .unwrap_or(PreviewKind::Generic)
    }

    pub fn as_str(self) -> &'static str {
        match self {
            PreviewKind::Carousel => "carousel",
            PreviewKind::Collapse => "collapse",
            PreviewKind::Card => "card",
            PreviewKind::Button => "button",
            PreviewKind::Text => "text",
            PreviewKind::Image => "image",
            PreviewKind::Layout => "layout",
            PreviewKind::Generic => "generic",
        }
    }

    pub fn renderer(self) -> Renderer {
        match self {
            PreviewKind::Carousel => carousel_body,
            PreviewKind::Collapse => collapse_body,
            PreviewKind::Card => card_body,
            PreviewKind::Button => button_body,
            PreviewKind::Text => text_body,
            PreviewKind::Image => image_body,
            PreviewKind::Layout => layout_body,
            PreviewKind::Generic => generic_body,
        }
    }
}

/// Full preview fragment for `entry`.
pub fn render_preview(entry: &PaletteEntry) -> String {
    let kind = PreviewKind::of(entry);
    wrap(kind, &entry.label, &(kind.renderer())(entry), entry.content.as_deref())
}

/// Preview for a hovered entry that is not in the catalog.
pub fn render_unknown(label: &str) -> String {
    let entry = PaletteEntry::new("", label.trim());
    wrap(PreviewKind::Generic, &entry.label, &generic_body(&entry), None)
}

fn wrap(kind: PreviewKind, label: &str, body: &str, caption: Option<&str>) -> String {
    let mut out = String::with_capacity(128 + body.len());
    out.push_str("<div class=\"block-preview block-preview--");
    out.push_str(kind.as_str());
    out.push_str("\"><div class=\"block-preview__title\">");
    out.push_str(&text(label));
    out.push_str("</div><div class=\"block-preview__body\">");
    out.push_str(body);
    out.push_str("</div>");
    if let Some(caption) = caption.filter(|c| !c.trim().is_empty()) {
        out.push_str("<p class=\"block-preview__caption\">");
        out.push_str(&text(caption.trim()));
        out.push_str("</p>");
    }
    out.push_str("</div>");
    out
}

fn text(value: &str) -> Cow<'_, str> {
    htmlize::escape_text(value)
}

fn attr(value: &str) -> Cow<'_, str> {
    htmlize::escape_attribute(value)
}

fn carousel_body(entry: &PaletteEntry) -> String {
    let slide = match &entry.media {
        Some(src) => format!("<img class=\"carousel-preview__slide\" src=\"{}\" alt=\"\">", attr(src)),
        None => "<div class=\"carousel-preview__slide\"></div>".to_owned(),
    };
    format!(
        "<div class=\"carousel-preview\">{}<div class=\"carousel-preview__dots\"><span class=\"active\"></span><span></span><span></span></div></div>",
        slide
    )
}

fn collapse_body(entry: &PaletteEntry) -> String {
    format!(
        "<div class=\"collapse-preview\"><div class=\"collapse-preview__header\">{}</div><div class=\"collapse-preview__header is-collapsed\">{}</div></div>",
        text(&entry.label),
        text(&entry.label)
    )
}

fn card_body(entry: &PaletteEntry) -> String {
    let image = entry
        .media
        .as_deref()
        .map(|src| format!("<img class=\"card-img-top\" src=\"{}\" alt=\"\">", attr(src)))
        .unwrap_or_default();
    format!(
        "<div class=\"card\">{}<div class=\"card-body\"><h5 class=\"card-title\">{}</h5></div></div>",
        image,
        text(&entry.label)
    )
}

fn button_body(entry: &PaletteEntry) -> String {
    format!(
        "<button type=\"button\" class=\"btn btn-primary\">{}</button>",
        text(&entry.label)
    )
}

fn text_body(entry: &PaletteEntry) -> String {
    format!("<p class=\"text-preview\">{}</p>", text(&entry.label))
}

fn image_body(entry: &PaletteEntry) -> String {
    match &entry.media {
        Some(src) => format!(
            "<img class=\"image-preview\" src=\"{}\" alt=\"{}\">",
            attr(src),
            attr(&entry.label)
        ),
        None => "<div class=\"image-preview image-preview--empty\"></div>".to_owned(),
    }
}

fn layout_body(_entry: &PaletteEntry) -> String {
    "<div class=\"layout-preview\"><span></span><span></span><span></span></div>".to_owned()
}

fn generic_body(entry: &PaletteEntry) -> String {
    format!("<div class=\"generic-preview\">{}</div>", text(&entry.label))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_kind_resolution() {
        assert_eq!(PreviewKind::from_key("Accordion"), Some(PreviewKind::Collapse));
        assert_eq!(PreviewKind::from_key(" grid "), Some(PreviewKind::Layout));
        assert_eq!(PreviewKind::from_key("pricing"), None);

        let by_category = PaletteEntry::new("hero", "Hero").with_category("Slider");
        assert_eq!(PreviewKind::of(&by_category), PreviewKind::Carousel);

        let unknown = PaletteEntry::new("x", "X").with_kind("pricing-table");
        assert_eq!(PreviewKind::of(&unknown), PreviewKind::Generic);
    }

    #[test]
    fn test_button_preview() {
        let entry = PaletteEntry::new("cta", "Buy <now>").with_kind("button");
        insta::assert_snapshot!(
            render_preview(&entry),
            @r#"<div class="block-preview block-preview--button"><div class="block-preview__title">Buy &lt;now&gt;</div><div class="block-preview__body"><button type="button" class="btn btn-primary">Buy &lt;now&gt;</button></div></div>"#
        );
    }

    #[test]
    fn test_carousel_preview_with_media_and_caption() {
        let entry = PaletteEntry::new("hero", "Hero")
            .with_kind("carousel")
            .with_media("/img/a.png?x=1&y=\"2\"")
            .with_content("Rotating banner");
        insta::assert_snapshot!(
            render_preview(&entry),
            @r#"<div class="block-preview block-preview--carousel"><div class="block-preview__title">Hero</div><div class="block-preview__body"><div class="carousel-preview"><img class="carousel-preview__slide" src="/img/a.png?x=1&amp;y=&quot;2&quot;" alt=""><div class="carousel-preview__dots"><span class="active"></span><span></span><span></span></div></div></div><p class="block-preview__caption">Rotating banner</p></div>"#
        );
    }

    #[test]
    fn test_unknown_entry_uses_generic_renderer() {
        insta::assert_snapshot!(
            render_unknown("  Pricing table "),
            @r#"<div class="block-preview block-preview--generic"><div class="block-preview__title">Pricing table</div><div class="block-preview__body"><div class="generic-preview">Pricing table</div></div></div>"#
        );
    }

    #[test]
    fn test_every_kind_renders_its_own_class() {
        for kind in [
            PreviewKind::Carousel,
            PreviewKind::Collapse,
            PreviewKind::Card,
            PreviewKind::Button,
            PreviewKind::Text,
            PreviewKind::Image,
            PreviewKind::Layout,
            PreviewKind::Generic,
        ] {
            let entry = PaletteEntry::new("e", "Entry").with_kind(kind.as_str());
            let html = render_preview(&entry);
            assert!(
                html.starts_with(&format!("<div class=\"block-preview block-preview--{}\">", kind.as_str())),
                "{}",
                html
            );
        }
    }
}
