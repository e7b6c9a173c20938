//! Keeping a live widget in sync with its component.
//!
//! A [`WidgetBinding`] owns one component instance and the widget bound to
//! its node. Every render and every behavioral attribute change tears the
//! previous widget down before a new one is constructed, so a node never has
//! two live widgets.
//!
//! Rebinding awaits the asset loader. While it waits, a newer rebind or a
//! removal may happen; each rebind takes a generation number and its
//! continuation does nothing once that number is stale.

use std::cell::RefCell;
use std::rc::{Rc, Weak};

use serde_json::Value;
use vitrail_cadre::{AssetLoader, DomError, ElementRef, ListenerId};
use vitrail_carton::{generate_unique_id, CompactString};

use crate::component::ComponentInstance;
use crate::widget::{WidgetAdapter, WidgetHandle};

/// Token in component templates replaced by the component id on render.
pub const ID_PLACEHOLDER: &str = "__COMPONENT_ID__";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BindingState {
    Unbound,
    Bound,
    Removed,
}

/// Result of a rebind.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BindOutcome {
    /// A fresh widget is live.
    Bound,
    /// The library could not be loaded, or refused to construct. Static markup only.
    Unavailable,
    /// A later rebind or a removal took over while this one waited.
    Superseded,
    /// The node or its frame went away while waiting.
    Detached,
}

/// Result of an attribute update.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UpdateOutcome {
    /// The attribute only affects markup; the widget was left alone.
    MarkupOnly,
    /// Stored before the first render; applied when it happens.
    Deferred,
    Rebound(BindOutcome),
}

/// Contract violations by the caller.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum BindingError {
    #[error("component has not been rendered yet")]
    NotRendered,

    #[error("component was removed")]
    Removed,

    #[error(transparent)]
    Dom(#[from] DomError),
}

struct Inner {
    component: ComponentInstance,
    element: Option<ElementRef>,
    handle: Option<WidgetHandle>,
    state: BindingState,
    generation: u64,
    listeners: Vec<ListenerId>,
}

/// Lifecycle controller for one widget component.
pub struct WidgetBinding<A: WidgetAdapter> {
    adapter: Rc<A>,
    loader: Rc<AssetLoader>,
    inner: Rc<RefCell<Inner>>,
}

impl<A: WidgetAdapter + 'static> WidgetBinding<A> {
    pub fn new(adapter: Rc<A>, loader: Rc<AssetLoader>, component: ComponentInstance) -> Self {
        Self {
            adapter,
            loader,
            inner: Rc::new(RefCell::new(Inner {
                component,
                element: None,
                handle: None,
                state: BindingState::Unbound,
                generation: 0,
                listeners: Vec::new(),
            })),
        }
    }

    pub fn state(&self) -> BindingState {
        self.inner.borrow().state
    }

    pub fn is_bound(&self) -> bool {
        self.state() == BindingState::Bound
    }

    /// Id assigned on first render.
    pub fn id(&self) -> Option<CompactString> {
        self.inner.borrow().component.id.clone()
    }

    /// Snapshot of the component.
    pub fn component(&self) -> ComponentInstance {
        self.inner.borrow().component.clone()
    }

    pub fn element(&self) -> Option<ElementRef> {
        self.inner.borrow().element.clone()
    }

    /// The live widget, if bound.
    pub fn handle(&self) -> Option<WidgetHandle> {
        self.inner.borrow().handle.clone()
    }

    /// Number of rebinds started so far.
    pub fn generation(&self) -> u64 {
        self.inner.borrow().generation
    }

    /// Bind to a freshly rendered node.
    ///
    /// Assigns the component id if it has none, writes it to the node,
    /// substitutes [`ID_PLACEHOLDER`] in the node's markup and rebinds.
    pub async fn render(&self, element: ElementRef) -> Result<BindOutcome, BindingError> {
        if self.state() == BindingState::Removed {
            return Err(BindingError::Removed);
        }
        if !element.frame.is_attached() {
            tracing::debug!("{}: render into detached {}", self.adapter.kind(), element.frame.id());
            return Ok(BindOutcome::Detached);
        }
        self.attach(&element)?;
        self.rebind().await
    }

    /// Point the binding at `element`. A widget left on a previous node is
    /// disposed here, before the library for the new node is awaited.
    fn attach(&self, element: &ElementRef) -> Result<(), BindingError> {
        let (id, moved, stale) = {
            let mut inner = self.inner.borrow_mut();
            if inner.state == BindingState::Removed {
                return Err(BindingError::Removed);
            }
            let id = match inner.component.id.clone() {
                Some(id) => id,
                None => {
                    // Adopt the node's own id unless another element shares it.
                    let id = element
                        .attribute("id")
                        .filter(|id| {
                            !id.is_empty()
                                && element
                                    .frame
                                    .elements_with_id(id)
                                    .iter()
                                    .all(|node| *node == element.node)
                        })
                        .map(CompactString::from)
                        .unwrap_or_else(|| {
                            generate_unique_id(self.adapter.kind(), |candidate| {
                                element.frame.element_by_id(candidate).is_some()
                            })
                        });
                    tracing::debug!("{}: assigned id {}", self.adapter.kind(), id);
                    inner.component.id = Some(id.clone());
                    id
                }
            };
            let moved = inner.element.as_ref() != Some(element);
            let stale = if moved {
                let previous = inner.element.replace(element.clone());
                let listeners = std::mem::take(&mut inner.listeners);
                let handle = inner.handle.take();
                inner.state = BindingState::Unbound;
                previous.map(|previous| (previous, listeners, handle))
            } else {
                None
            };
            (id, moved, stale)
        };

        if let Some((previous, listeners, handle)) = stale {
            for listener in listeners {
                previous.frame.remove_listener(listener);
            }
            if let Some(handle) = handle {
                tracing::debug!(
                    "{}: node replaced, disposing widget in {}",
                    self.adapter.kind(),
                    previous.frame.id()
                );
                self.adapter.dispose(&handle);
            }
        }

        if element.attribute("id").as_deref() != Some(id.as_str()) {
            element.set_attribute("id", &id)?;
        }
        if let Some(markup) = element.markup() {
            if markup.contains(ID_PLACEHOLDER) {
                element.set_markup(markup.replace(ID_PLACEHOLDER, &id))?;
            }
        }
        if moved {
            self.listen(element)?;
        }
        Ok(())
    }

    /// Install the adapter's event listeners on the node.
    fn listen(&self, element: &ElementRef) -> Result<(), BindingError> {
        let mut ids = Vec::new();
        for kind in self.adapter.events() {
            let inner: Weak<RefCell<Inner>> = Rc::downgrade(&self.inner);
            let adapter = self.adapter.clone();
            let id = element.frame.add_listener(element.node, *kind, move |frame, event| {
                let Some(inner) = inner.upgrade() else {
                    return;
                };
                let handle = inner.borrow().handle.clone();
                if let Some(handle) = handle {
                    adapter.handle_event(&handle, frame, event);
                }
            })?;
            ids.push(id);
        }
        self.inner.borrow_mut().listeners.extend(ids);
        Ok(())
    }

    /// Store an attribute and rebind if the widget depends on it.
    pub async fn update(
        &self,
        name: &str,
        value: impl Into<Value>,
    ) -> Result<UpdateOutcome, BindingError> {
        let rendered = {
            let mut inner = self.inner.borrow_mut();
            if inner.state == BindingState::Removed {
                return Err(BindingError::Removed);
            }
            inner.component.attributes.set(name, value);
            inner.element.is_some()
        };
        if !self.adapter.is_behavioral(name) {
            return Ok(UpdateOutcome::MarkupOnly);
        }
        if !rendered {
            return Ok(UpdateOutcome::Deferred);
        }
        Ok(UpdateOutcome::Rebound(self.rebind().await?))
    }

    /// Dispose the current widget and construct a new one from the current
    /// attributes.
    pub async fn rebind(&self) -> Result<BindOutcome, BindingError> {
        let (element, generation) = {
            let mut inner = self.inner.borrow_mut();
            if inner.state == BindingState::Removed {
                return Err(BindingError::Removed);
            }
            let element = inner.element.clone().ok_or(BindingError::NotRendered)?;
            inner.generation += 1;
            (element, inner.generation)
        };
        let kind = self.adapter.kind();

        let adapter = &self.adapter;
        let library = self
            .loader
            .ensure(&element.frame, adapter.asset(), |frame| adapter.probe(frame))
            .await;

        let (library, previous, options) = {
            let mut inner = self.inner.borrow_mut();
            if inner.state == BindingState::Removed || inner.generation != generation {
                tracing::debug!("{}: rebind {} superseded", kind, generation);
                return Ok(BindOutcome::Superseded);
            }
            if !element.is_connected() {
                tracing::debug!("{}: node left the document during rebind {}", kind, generation);
                return Ok(BindOutcome::Detached);
            }
            let Some(library) = library else {
                tracing::warn!(
                    "{}: widget library unavailable, {} stays static",
                    kind,
                    inner.component.id.as_deref().unwrap_or("component")
                );
                return Ok(BindOutcome::Unavailable);
            };
            inner.state = BindingState::Unbound;
            (library, inner.handle.take(), adapter.options(&inner.component))
        };

        // Dispose before create, outside the borrow.
        if let Some(previous) = &previous {
            adapter.dispose(previous);
        }
        if let Some(foreign) = adapter.existing(&*library, &element) {
            let ours = previous
                .as_ref()
                .is_some_and(|previous| previous.same_instance(&foreign));
            if !ours {
                tracing::debug!("{}: disposing foreign instance on node", kind);
                adapter.dispose(&foreign);
            }
        }
        let handle = adapter.construct(&*library, &element, &options);

        let mut inner = self.inner.borrow_mut();
        match handle {
            Some(handle) => {
                tracing::debug!("{}: bound (rebind {})", kind, generation);
                inner.handle = Some(handle);
                inner.state = BindingState::Bound;
                Ok(BindOutcome::Bound)
            }
            None => {
                tracing::warn!("{}: library refused to construct the widget", kind);
                Ok(BindOutcome::Unavailable)
            }
        }
    }

    /// Dispose the widget and release the node. Idempotent.
    pub fn remove(&self) {
        let (handle, element, listeners) = {
            let mut inner = self.inner.borrow_mut();
            if inner.state == BindingState::Removed {
                return;
            }
            inner.state = BindingState::Removed;
            inner.generation += 1;
            (
                inner.handle.take(),
                inner.element.take(),
                std::mem::take(&mut inner.listeners),
            )
        };
        if let Some(handle) = handle {
            self.adapter.dispose(&handle);
        }
        if let Some(element) = element {
            for listener in listeners {
                element.frame.remove_listener(listener);
            }
        }
        tracing::debug!("{}: removed", self.adapter.kind());
    }
}

impl<A: WidgetAdapter> std::fmt::Debug for WidgetBinding<A> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let inner = self.inner.borrow();
        f.debug_struct("WidgetBinding")
            .field("kind", &self.adapter.kind())
            .field("id", &inner.component.id)
            .field("state", &inner.state)
            .field("generation", &inner.generation)
            .finish()
    }
}
