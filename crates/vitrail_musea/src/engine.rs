//! Hover previews for the block palette.
//!
//! The engine puts a single `pointerover`/`pointerout` pair on the palette
//! container and works out the hovered entry from the event target, so
//! entries can come and go freely. A preview is shown once the pointer has
//! rested on an entry for the configured delay, and at most one preview
//! exists at a time.
//!
//! The palette may not be mounted yet when the engine starts; the container
//! lookup is retried with backoff a bounded number of times, after which the
//! engine stays inert.

use std::cell::RefCell;
use std::rc::{Rc, Weak};
use std::time::Duration;

use vitrail_cadre::{DomError, Event, EventKind, Frame, ListenerId, NodeId};
use vitrail_carton::{retry, CompactString, Rect, Retry, RetryPolicy, Scheduler, Size, TimerId};

use crate::catalog::PaletteCatalog;
use crate::placement::{place, Placement, PlacementOptions, Side};
use crate::preview::{render_preview, render_unknown};

/// Class of the tooltip element.
pub const TOOLTIP_CLASS: &str = "block-preview-tooltip";

/// Class added while the tooltip animates out.
pub const LEAVING_CLASS: &str = "is-leaving";

/// Attribute holding an entry's stable identity.
pub const ENTRY_ID_ATTRIBUTE: &str = "data-entry-id";

#[derive(Debug, Clone, PartialEq)]
pub struct HoverOptions {
    pub container_class: CompactString,
    pub entry_class: CompactString,
    /// Time the pointer must rest on an entry before its preview shows.
    pub delay: Duration,
    /// Exit transition length.
    pub exit: Duration,
    pub preview_size: Size,
    pub placement: PlacementOptions,
    /// Container lookup schedule.
    pub retry: RetryPolicy,
}

impl Default for HoverOptions {
    fn default() -> Self {
        Self {
            container_class: "blocks-container".into(),
            entry_class: "block-entry".into(),
            delay: Duration::from_millis(300),
            exit: Duration::from_millis(150),
            preview_size: Size::new(400.0, 300.0),
            placement: PlacementOptions::default(),
            retry: RetryPolicy::default(),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum HoverPhase {
    /// Looking for the palette container.
    Starting,
    Idle,
    /// Waiting out the hover delay.
    Pending,
    Showing,
    /// The container never appeared.
    Inert,
    TornDown,
}

struct EngineState {
    phase: HoverPhase,
    attempts: u32,
    container: Option<NodeId>,
    listeners: Vec<ListenerId>,
    retry: Option<Retry>,
    hovered: Option<NodeId>,
    timer: Option<TimerId>,
    tooltip: Option<NodeId>,
    leaving: Vec<(NodeId, TimerId)>,
}

struct EngineInner {
    frame: Frame,
    catalog: Rc<RefCell<PaletteCatalog>>,
    scheduler: Rc<dyn Scheduler>,
    options: HoverOptions,
    state: RefCell<EngineState>,
}

/// Hover preview engine bound to one palette document.
///
/// Dropping the engine tears it down.
pub struct HoverPreviewEngine {
    inner: Rc<EngineInner>,
}

impl HoverPreviewEngine {
    /// Start the engine on `frame`, the document that hosts the palette.
    ///
    /// The first container lookup happens before this returns.
    pub fn start(
        frame: Frame,
        catalog: Rc<RefCell<PaletteCatalog>>,
        scheduler: Rc<dyn Scheduler>,
        options: HoverOptions,
    ) -> Self {
        let inner = Rc::new(EngineInner {
            frame,
            catalog,
            scheduler,
            options,
            state: RefCell::new(EngineState {
                phase: HoverPhase::Starting,
                attempts: 0,
                container: None,
                listeners: Vec::new(),
                retry: None,
                hovered: None,
                timer: None,
                tooltip: None,
                leaving: Vec::new(),
            }),
        });

        let attempt: Weak<EngineInner> = Rc::downgrade(&inner);
        let exhausted: Weak<EngineInner> = Rc::downgrade(&inner);
        let container_class = inner.options.container_class.clone();
        let handle = retry(
            inner.scheduler.clone(),
            inner.options.retry,
            move |n| {
                attempt
                    .upgrade()
                    .is_some_and(|inner| EngineInner::try_attach(&inner, n))
            },
            move |attempts| {
                tracing::warn!(
                    "palette container .{} not found after {} attempts, hover previews disabled",
                    container_class,
                    attempts
                );
                if let Some(inner) = exhausted.upgrade() {
                    let mut state = inner.state.borrow_mut();
                    if state.phase == HoverPhase::Starting {
                        state.phase = HoverPhase::Inert;
                    }
                }
            },
        );
        if !handle.is_finished() {
            inner.state.borrow_mut().retry = Some(handle);
        }

        Self { inner }
    }

    pub fn phase(&self) -> HoverPhase {
        self.inner.state.borrow().phase
    }

    /// Container lookups made so far.
    pub fn attempts(&self) -> u32 {
        self.inner.state.borrow().attempts
    }

    pub fn container(&self) -> Option<NodeId> {
        self.inner.state.borrow().container
    }

    /// Entry under the pointer, if any.
    pub fn hovered(&self) -> Option<NodeId> {
        self.inner.state.borrow().hovered
    }

    /// The visible tooltip, not counting one that is animating out.
    pub fn tooltip(&self) -> Option<NodeId> {
        self.inner.state.borrow().tooltip
    }

    pub fn options(&self) -> &HoverOptions {
        &self.inner.options
    }

    /// Remove the listeners, cancel every timer and the container lookup,
    /// and remove the tooltip. Safe to call repeatedly.
    pub fn teardown(&self) {
        self.inner.teardown();
    }
}

impl Drop for HoverPreviewEngine {
    fn drop(&mut self) {
        self.inner.teardown();
    }
}

impl std::fmt::Debug for HoverPreviewEngine {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let state = self.inner.state.borrow();
        f.debug_struct("HoverPreviewEngine")
            .field("frame", &self.inner.frame.id())
            .field("phase", &state.phase)
            .field("attempts", &state.attempts)
            .finish()
    }
}

impl EngineInner {
    fn try_attach(this: &Rc<Self>, attempt: u32) -> bool {
        this.state.borrow_mut().attempts = attempt;
        let Some(container) = this.frame.find_by_class(&this.options.container_class) else {
            tracing::debug!(
                "attempt {}: palette container .{} not mounted yet",
                attempt,
                this.options.container_class
            );
            return false;
        };

        let over = Self::listen(this, container, EventKind::PointerOver, Self::on_over);
        let out = Self::listen(this, container, EventKind::PointerOut, Self::on_out);
        match (over, out) {
            (Ok(over), Ok(out)) => {
                let mut state = this.state.borrow_mut();
                state.container = Some(container);
                state.listeners = vec![over, out];
                state.phase = HoverPhase::Idle;
                tracing::debug!("hover previews attached after {} attempt(s)", attempt);
                true
            }
            (over, out) => {
                for id in [over, out].into_iter().flatten() {
                    this.frame.remove_listener(id);
                }
                tracing::warn!("could not listen on palette container in {}", this.frame.id());
                false
            }
        }
    }

    fn listen(
        this: &Rc<Self>,
        container: NodeId,
        kind: EventKind,
        handler: fn(&Rc<Self>, &Event),
    ) -> Result<ListenerId, DomError> {
        let weak = Rc::downgrade(this);
        this.frame.add_listener(container, kind, move |_, event| {
            if let Some(inner) = weak.upgrade() {
                handler(&inner, event);
            }
        })
    }

    /// Palette entry containing `target`.
    fn entry_at(&self, target: NodeId) -> Option<NodeId> {
        let container = self.state.borrow().container?;
        let class = &self.options.entry_class;
        self.frame
            .closest(target, Some(container), |node| self.frame.has_class(node, class))
    }

    fn on_over(this: &Rc<Self>, event: &Event) {
        let Some(entry) = this.entry_at(event.target) else {
            return;
        };
        let previous = {
            let mut state = this.state.borrow_mut();
            if state.phase == HoverPhase::TornDown || state.hovered == Some(entry) {
                return;
            }
            state.hovered = Some(entry);
            state.phase = HoverPhase::Pending;
            state.timer.take()
        };
        if let Some(timer) = previous {
            this.scheduler.clear_timeout(timer);
        }

        let weak = Rc::downgrade(this);
        let timer = this.scheduler.set_timeout(
            this.options.delay,
            Box::new(move || {
                if let Some(inner) = weak.upgrade() {
                    Self::fire(&inner, entry);
                }
            }),
        );
        this.state.borrow_mut().timer = Some(timer);
    }

    fn on_out(this: &Rc<Self>, event: &Event) {
        let Some(entry) = this.entry_at(event.target) else {
            return;
        };
        if let Some(to) = event.related_target {
            if this.frame.contains(entry, to) {
                return;
            }
        }
        let (timer, tooltip) = {
            let mut state = this.state.borrow_mut();
            if state.hovered != Some(entry) {
                return;
            }
            state.hovered = None;
            state.phase = HoverPhase::Idle;
            (state.timer.take(), state.tooltip.take())
        };
        if let Some(timer) = timer {
            this.scheduler.clear_timeout(timer);
        }
        if let Some(tooltip) = tooltip {
            Self::dismiss(this, tooltip);
        }
    }

    fn fire(this: &Rc<Self>, entry: NodeId) {
        {
            let mut state = this.state.borrow_mut();
            state.timer = None;
            if state.phase != HoverPhase::Pending || state.hovered != Some(entry) {
                return;
            }
            if !this.frame.is_connected(entry) {
                state.hovered = None;
                state.phase = HoverPhase::Idle;
                return;
            }
        }

        let id = this
            .frame
            .attribute(entry, ENTRY_ID_ATTRIBUTE)
            .filter(|id| !id.trim().is_empty());
        let text = this.frame.text_content(entry);
        let label = text.trim();
        let html = {
            let catalog = this.catalog.borrow();
            match catalog.resolve(id.as_deref(), label) {
                Some(found) => render_preview(found),
                None => {
                    tracing::debug!(
                        "no palette entry for '{}', using the generic preview",
                        id.as_deref().unwrap_or(label)
                    );
                    render_unknown(label)
                }
            }
        };
        this.show(entry, &html);
    }

    fn show(&self, entry: NodeId, html: &str) {
        let (previous, leaving) = {
            let mut state = self.state.borrow_mut();
            (state.tooltip.take(), std::mem::take(&mut state.leaving))
        };
        for (node, timer) in leaving {
            self.scheduler.clear_timeout(timer);
            self.discard(node);
        }
        if let Some(previous) = previous {
            self.discard(previous);
        }

        let anchor = self.frame.rect(entry).unwrap_or_else(Rect::empty);
        let size = self.options.preview_size;
        let placement = place(anchor, size, self.frame.viewport(), &self.options.placement);
        let tooltip = self.create_tooltip(html, &placement, size);

        let mut state = self.state.borrow_mut();
        match tooltip {
            Ok(tooltip) => {
                state.tooltip = Some(tooltip);
                state.phase = HoverPhase::Showing;
            }
            Err(err) => {
                tracing::warn!("could not show palette preview: {}", err);
                state.phase = HoverPhase::Idle;
            }
        }
    }

    fn create_tooltip(
        &self,
        html: &str,
        placement: &Placement,
        size: Size,
    ) -> Result<NodeId, DomError> {
        let frame = &self.frame;
        let node = frame.create_element("div")?;

        let mut class = String::from(TOOLTIP_CLASS);
        class.push_str(match placement.side {
            Side::Right => " is-right",
            Side::Left => " is-left",
        });
        if placement.flipped {
            class.push_str(" is-flipped");
        }
        frame.set_attribute(node, "class", &class)?;
        frame.set_attribute(
            node,
            "style",
            &format!(
                "left: {}px; top: {}px; width: {}px; height: {}px",
                placement.x, placement.y, size.width, size.height
            ),
        )?;
        frame.set_markup(node, html)?;
        frame.set_rect(node, placement.rect(size))?;
        frame.append_child(frame.body(), node)?;
        Ok(node)
    }

    /// Start the exit transition of `tooltip` and remove it afterwards.
    fn dismiss(this: &Rc<Self>, tooltip: NodeId) {
        let class = this.frame.attribute(tooltip, "class").unwrap_or_default();
        if let Err(err) = this
            .frame
            .set_attribute(tooltip, "class", &format!("{} {}", class, LEAVING_CLASS))
        {
            tracing::debug!("could not animate preview out: {}", err);
            this.discard(tooltip);
            return;
        }

        let weak = Rc::downgrade(this);
        let timer = this.scheduler.set_timeout(
            this.options.exit,
            Box::new(move || {
                if let Some(inner) = weak.upgrade() {
                    inner
                        .state
                        .borrow_mut()
                        .leaving
                        .retain(|(node, _)| *node != tooltip);
                    inner.discard(tooltip);
                }
            }),
        );
        this.state.borrow_mut().leaving.push((tooltip, timer));
    }

    fn discard(&self, node: NodeId) {
        if let Err(err) = self.frame.remove(node) {
            tracing::debug!("could not remove preview: {}", err);
        }
    }

    fn teardown(&self) {
        let (retry, listeners, timer, tooltip, leaving) = {
            let mut state = self.state.borrow_mut();
            if state.phase == HoverPhase::TornDown {
                return;
            }
            state.phase = HoverPhase::TornDown;
            state.hovered = None;
            state.container = None;
            (
                state.retry.take(),
                std::mem::take(&mut state.listeners),
                state.timer.take(),
                state.tooltip.take(),
                std::mem::take(&mut state.leaving),
            )
        };
        if let Some(retry) = retry {
            retry.cancel();
        }
        for listener in listeners {
            self.frame.remove_listener(listener);
        }
        if let Some(timer) = timer {
            self.scheduler.clear_timeout(timer);
        }
        for (node, timer) in leaving {
            self.scheduler.clear_timeout(timer);
            self.discard(node);
        }
        if let Some(tooltip) = tooltip {
            self.discard(tooltip);
        }
        tracing::debug!("hover previews torn down in {}", self.frame.id());
    }
}
