//! Built-in widget adapters for the Bootstrap carousel and collapse.

use serde::{Serialize, Serializer};
use vitrail_cadre::{AssetSpec, Event, EventKind, Frame};

use crate::component::ComponentInstance;
use crate::widget::{WidgetAdapter, WidgetHandle};

/// Interval used when the configured one is missing, non-finite or not positive.
pub const DEFAULT_CAROUSEL_INTERVAL_MS: u64 = 5000;

/// Global installed by the widget bundle.
pub const BOOTSTRAP_GLOBAL: &str = "bootstrap";

pub const BOOTSTRAP_SCRIPT_URL: &str =
    "https://cdn.jsdelivr.net/npm/bootstrap@5.3.3/dist/js/bootstrap.bundle.min.js";

pub const BOOTSTRAP_SCRIPT_ID: &str = "bootstrap-bundle-script";

/// The widget bundle both built-in adapters load.
pub fn bootstrap_asset() -> AssetSpec {
    AssetSpec::new(BOOTSTRAP_GLOBAL, BOOTSTRAP_SCRIPT_URL, BOOTSTRAP_SCRIPT_ID)
}

/// Longest delay a frame timer accepts without firing immediately.
pub const MAX_TIMER_MS: u64 = i32::MAX as u64;

/// Clamp a configured interval to something the library can run.
pub fn normalize_interval(value: Option<f64>, default_ms: u64) -> u64 {
    match value {
        Some(ms) if ms.is_finite() && ms > 0.0 => {
            (ms.round().min(MAX_TIMER_MS as f64) as u64).clamp(1, MAX_TIMER_MS)
        }
        _ => default_ms,
    }
}

/// A number of milliseconds, or `false` to disable.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Interval {
    Millis(u64),
    Off,
}

impl Serialize for Interval {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        match self {
            Interval::Millis(ms) => serializer.serialize_u64(*ms),
            Interval::Off => serializer.serialize_bool(false),
        }
    }
}

/// `"hover"` or `false`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PauseOn {
    Hover,
    Never,
}

impl Serialize for PauseOn {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        match self {
            PauseOn::Hover => serializer.serialize_str("hover"),
            PauseOn::Never => serializer.serialize_bool(false),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct CarouselOptions {
    pub interval: Interval,
    pub wrap: bool,
    pub pause: PauseOn,
    pub keyboard: bool,
    pub ride: bool,
}

const CAROUSEL_BEHAVIOR: &[&str] = &["interval", "loop", "pause-on-hover", "keyboard", "autoplay"];

#[derive(Debug, Clone)]
pub struct CarouselAdapter {
    asset: AssetSpec,
    default_interval_ms: u64,
}

impl CarouselAdapter {
    pub fn new(asset: AssetSpec, default_interval_ms: u64) -> Self {
        Self {
            asset,
            default_interval_ms,
        }
    }
}

impl Default for CarouselAdapter {
    fn default() -> Self {
        Self::new(bootstrap_asset(), DEFAULT_CAROUSEL_INTERVAL_MS)
    }
}

impl WidgetAdapter for CarouselAdapter {
    type Options = CarouselOptions;

    fn kind(&self) -> &'static str {
        "carousel"
    }

    fn asset(&self) -> &AssetSpec {
        &self.asset
    }

    fn options(&self, component: &ComponentInstance) -> CarouselOptions {
        let attrs = &component.attributes;
        let autoplay = attrs.flag("autoplay").unwrap_or(true);
        let raw = attrs.number("interval");
        let interval = normalize_interval(raw, self.default_interval_ms);
        let in_range = |ms: &f64| ms.is_finite() && *ms > 0.0 && *ms <= MAX_TIMER_MS as f64;
        if let Some(ms) = raw.filter(|ms| !in_range(ms)) {
            tracing::debug!("carousel: interval {} replaced by {} ms", ms, interval);
        }
        CarouselOptions {
            interval: if autoplay {
                Interval::Millis(interval)
            } else {
                Interval::Off
            },
            wrap: attrs.flag("loop").unwrap_or(true),
            pause: if attrs.flag("pause-on-hover").unwrap_or(true) {
                PauseOn::Hover
            } else {
                PauseOn::Never
            },
            keyboard: attrs.flag("keyboard").unwrap_or(true),
            ride: autoplay,
        }
    }

    fn is_behavioral(&self, attribute: &str) -> bool {
        CAROUSEL_BEHAVIOR.contains(&attribute)
    }

    fn events(&self) -> &'static [EventKind] {
        &[EventKind::Click]
    }

    /// Forward clicks on slide controls to the instance.
    fn handle_event(&self, handle: &WidgetHandle, frame: &Frame, event: &Event) {
        let control = frame.closest(event.target, Some(handle.node()), |node| {
            frame.has_attribute(node, "data-bs-slide")
        });
        if let Some(control) = control {
            if let Some(direction) = frame.attribute(control, "data-bs-slide") {
                handle.call(&direction);
            }
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct CollapseOptions {
    pub toggle: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub parent: Option<String>,
}

const COLLAPSE_BEHAVIOR: &[&str] = &["open", "accordion"];

#[derive(Debug, Clone)]
pub struct CollapseAdapter {
    asset: AssetSpec,
}

impl CollapseAdapter {
    pub fn new(asset: AssetSpec) -> Self {
        Self { asset }
    }
}

impl Default for CollapseAdapter {
    fn default() -> Self {
        Self::new(bootstrap_asset())
    }
}

impl WidgetAdapter for CollapseAdapter {
    type Options = CollapseOptions;

    fn kind(&self) -> &'static str {
        "collapse"
    }

    fn asset(&self) -> &AssetSpec {
        &self.asset
    }

    fn options(&self, component: &ComponentInstance) -> CollapseOptions {
        let parent = component
            .attributes
            .string("accordion")
            .map(|group| group.trim().trim_start_matches('#').to_owned())
            .filter(|group| !group.is_empty())
            .map(|group| format!("#{}", group));
        CollapseOptions {
            toggle: component.attributes.flag("open").unwrap_or(false),
            parent,
        }
    }

    fn is_behavioral(&self, attribute: &str) -> bool {
        COLLAPSE_BEHAVIOR.contains(&attribute)
    }

    fn events(&self) -> &'static [EventKind] {
        &[EventKind::Click]
    }

    fn handle_event(&self, handle: &WidgetHandle, frame: &Frame, event: &Event) {
        let toggle = frame.closest(event.target, Some(handle.node()), |node| {
            frame.attribute(node, "data-bs-toggle").as_deref() == Some("collapse")
        });
        if toggle.is_some() {
            handle.call("toggle");
        }
    }
}
