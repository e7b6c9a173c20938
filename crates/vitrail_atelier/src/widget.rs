//! The seam between the editor and an imperative widget library.
//!
//! A widget library (Bootstrap's carousel, collapse and friends) is a script
//! that installs itself as a global of the frame's window. [`WidgetLibrary`]
//! is the slice of its API the runtime calls; a host exposes the real library
//! through it by installing a [`LibraryHandle`] global into the frame.
//!
//! [`WidgetAdapter`] describes one widget kind: which asset provides it, how
//! component attributes map to constructor options, and which attributes
//! require rebuilding the live instance.

use std::cell::Cell;
use std::rc::Rc;

use serde::Serialize;
use serde_json::Value;
use vitrail_cadre::{AssetSpec, DomError, ElementRef, Event, EventKind, Frame, NodeId};

use crate::component::ComponentInstance;

/// A live widget object bound to one node.
pub trait WidgetInstance {
    /// Release the instance. Libraries may assume this is called once.
    fn dispose(&self);

    /// Invoke a method such as `next` or `toggle`. Returns `false` if the
    /// instance does not support it.
    fn call(&self, method: &str) -> bool {
        let _ = method;
        false
    }
}

/// Constructor side of a widget library.
pub trait WidgetLibrary {
    /// `new Kind(element, options)`. `None` when the library refuses.
    fn construct(
        &self,
        kind: &str,
        element: &ElementRef,
        options: &Value,
    ) -> Option<Rc<dyn WidgetInstance>>;

    /// `Kind.getInstance(element)`.
    fn instance(&self, kind: &str, element: &ElementRef) -> Option<Rc<dyn WidgetInstance>>;
}

/// Window global through which a loaded library is reachable.
#[derive(Clone)]
pub struct LibraryHandle(pub Rc<dyn WidgetLibrary>);

impl LibraryHandle {
    /// Expose `library` on the frame's window as `name`.
    pub fn install(frame: &Frame, name: &str, library: Rc<dyn WidgetLibrary>) -> Result<(), DomError> {
        frame.set_global(name, Rc::new(LibraryHandle(library)))
    }

    /// Look up a library previously installed as `name`.
    pub fn probe(frame: &Frame, name: &str) -> Option<Rc<dyn WidgetLibrary>> {
        frame
            .global::<LibraryHandle>(name)
            .map(|handle| handle.0.clone())
    }
}

/// Our reference to a live widget instance.
///
/// Clones share the disposed flag, so disposing through any clone is seen by
/// all of them and the library is called at most once.
#[derive(Clone)]
pub struct WidgetHandle {
    kind: &'static str,
    node: NodeId,
    instance: Rc<dyn WidgetInstance>,
    disposed: Rc<Cell<bool>>,
}

impl WidgetHandle {
    pub fn new(kind: &'static str, node: NodeId, instance: Rc<dyn WidgetInstance>) -> Self {
        Self {
            kind,
            node,
            instance,
            disposed: Rc::new(Cell::new(false)),
        }
    }

    pub fn kind(&self) -> &'static str {
        self.kind
    }

    pub fn node(&self) -> NodeId {
        self.node
    }

    /// Dispose the instance. Further calls do nothing.
    pub fn dispose(&self) {
        if !self.disposed.replace(true) {
            self.instance.dispose();
        }
    }

    pub fn is_disposed(&self) -> bool {
        self.disposed.get()
    }

    /// Forward a method call unless disposed.
    pub fn call(&self, method: &str) -> bool {
        !self.is_disposed() && self.instance.call(method)
    }

    /// Whether both handles refer to the same library object.
    pub fn same_instance(&self, other: &WidgetHandle) -> bool {
        std::ptr::addr_eq(Rc::as_ptr(&self.instance), Rc::as_ptr(&other.instance))
    }
}

impl std::fmt::Debug for WidgetHandle {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("WidgetHandle")
            .field("kind", &self.kind)
            .field("node", &self.node)
            .field("disposed", &self.is_disposed())
            .finish()
    }
}

/// One kind of widget.
pub trait WidgetAdapter {
    /// Constructor options, serialized to JSON for the library.
    type Options: Serialize;

    fn kind(&self) -> &'static str;

    /// The script providing the library.
    fn asset(&self) -> &AssetSpec;

    /// Options for the current attribute values, already normalized.
    fn options(&self, component: &ComponentInstance) -> Self::Options;

    /// Whether changing `attribute` requires rebuilding the instance.
    fn is_behavioral(&self, attribute: &str) -> bool;

    /// Find the library in `frame`.
    fn probe(&self, frame: &Frame) -> Option<Rc<dyn WidgetLibrary>> {
        LibraryHandle::probe(frame, &self.asset().name)
    }

    fn construct(
        &self,
        library: &dyn WidgetLibrary,
        element: &ElementRef,
        options: &Self::Options,
    ) -> Option<WidgetHandle> {
        let options = match serde_json::to_value(options) {
            Ok(options) => options,
            Err(err) => {
                tracing::warn!("{}: could not encode options: {}", self.kind(), err);
                return None;
            }
        };
        library
            .construct(self.kind(), element, &options)
            .map(|instance| WidgetHandle::new(self.kind(), element.node, instance))
    }

    /// An instance the library already holds for `element`, bound by someone else.
    fn existing(&self, library: &dyn WidgetLibrary, element: &ElementRef) -> Option<WidgetHandle> {
        library
            .instance(self.kind(), element)
            .map(|instance| WidgetHandle::new(self.kind(), element.node, instance))
    }

    fn dispose(&self, handle: &WidgetHandle) {
        handle.dispose();
    }

    /// Events the binding listens for on the widget's node.
    fn events(&self) -> &'static [EventKind] {
        &[]
    }

    /// React to one of [`events`](Self::events) while bound.
    fn handle_event(&self, handle: &WidgetHandle, frame: &Frame, event: &Event) {
        let _ = (handle, frame, event);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use vitrail_carton::Size;

    struct Counter(Cell<u32>);

    impl WidgetInstance for Counter {
        fn dispose(&self) {
            self.0.set(self.0.get() + 1);
        }
    }

    #[test]
    fn test_handle_dispose_is_idempotent() {
        let frame = Frame::new(Size::new(100.0, 100.0));
        let node = frame.append_new(frame.body(), "div").unwrap();
        let instance = Rc::new(Counter(Cell::new(0)));
        let handle = WidgetHandle::new("carousel", node, instance.clone());
        let clone = handle.clone();

        handle.dispose();
        clone.dispose();
        handle.dispose();
        assert_eq!(instance.0.get(), 1);
        assert!(clone.is_disposed());
    }

    #[test]
    fn test_same_instance() {
        let frame = Frame::new(Size::new(100.0, 100.0));
        let node = frame.append_new(frame.body(), "div").unwrap();
        let instance: Rc<dyn WidgetInstance> = Rc::new(Counter(Cell::new(0)));
        let handle = WidgetHandle::new("carousel", node, instance.clone());
        let again = WidgetHandle::new("carousel", node, instance);
        let other = WidgetHandle::new("carousel", node, Rc::new(Counter(Cell::new(0))));
        assert!(handle.same_instance(&again));
        assert!(!handle.same_instance(&other));
    }
}
