//! Headless document model for a sandboxed frame.
//!
//! A [`Frame`] is one isolated document/window pair. The host editor mirrors
//! its real canvas into this model (or drives it directly in headless mode);
//! the runtime only ever reads and mutates the frame through this API.
//!
//! Nodes live in an arena owned by the frame and are addressed by [`NodeId`].
//! Each node carries its raw inner markup as an opaque string next to its
//! structural children: widget templates are rewritten as text, while event
//! delegation and hit-testing walk the structural tree.

use std::any::Any;
use std::cell::RefCell;
use std::fmt;
use std::rc::{Rc, Weak};
use std::sync::atomic::{AtomicU64, Ordering};

use serde::{Deserialize, Serialize};
use vitrail_carton::{CompactString, FxHashMap, Rect, Size};

static NEXT_FRAME_ID: AtomicU64 = AtomicU64::new(1);

/// Identity of a frame's document.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct FrameId(u64);

impl fmt::Display for FrameId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "frame#{}", self.0)
    }
}

/// Index of a node inside its frame.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct NodeId(u32);

/// Handle returned by [`Frame::add_listener`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ListenerId(u64);

/// DOM events the runtime cares about.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum EventKind {
    Load,
    Error,
    PointerOver,
    PointerOut,
    Click,
}

/// A dispatched event.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Event {
    pub kind: EventKind,
    /// Node the event originated from.
    pub target: NodeId,
    /// For pointer events: the node the pointer came from (over) or moved to (out).
    pub related_target: Option<NodeId>,
}

impl Event {
    pub const fn new(kind: EventKind, target: NodeId) -> Self {
        Self {
            kind,
            target,
            related_target: None,
        }
    }

    pub const fn load(target: NodeId) -> Self {
        Self::new(EventKind::Load, target)
    }

    pub const fn error(target: NodeId) -> Self {
        Self::new(EventKind::Error, target)
    }

    pub const fn pointer_over(target: NodeId, from: Option<NodeId>) -> Self {
        Self {
            kind: EventKind::PointerOver,
            target,
            related_target: from,
        }
    }

    pub const fn pointer_out(target: NodeId, to: Option<NodeId>) -> Self {
        Self {
            kind: EventKind::PointerOut,
            target,
            related_target: to,
        }
    }
}

/// Event callback. Receives the frame the event was dispatched on.
pub type Listener = Rc<dyn Fn(&Frame, &Event)>;

/// Error type for frame mutations.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum DomError {
    #[error("{0} has been detached")]
    Detached(FrameId),

    #[error("node {0:?} does not exist")]
    UnknownNode(NodeId),

    #[error("cannot append {child:?} to {parent:?}: the parent is inside the child")]
    Cycle { parent: NodeId, child: NodeId },
}

#[derive(Debug, Default)]
struct NodeData {
    tag: CompactString,
    attributes: Vec<(CompactString, String)>,
    markup: String,
    text: String,
    children: Vec<NodeId>,
    parent: Option<NodeId>,
    rect: Rect,
}

struct ListenerEntry {
    id: ListenerId,
    node: NodeId,
    kind: EventKind,
    callback: Listener,
}

struct FrameState {
    id: FrameId,
    attached: bool,
    viewport: Size,
    nodes: FxHashMap<NodeId, NodeData>,
    next_node: u32,
    root: NodeId,
    head: NodeId,
    body: NodeId,
    globals: FxHashMap<CompactString, Rc<dyn Any>>,
    listeners: Vec<ListenerEntry>,
    next_listener: u64,
}

impl FrameState {
    fn ensure_attached(&self) -> Result<(), DomError> {
        if self.attached {
            Ok(())
        } else {
            Err(DomError::Detached(self.id))
        }
    }

    fn alloc(&mut self, tag: &str) -> NodeId {
        let id = NodeId(self.next_node);
        self.next_node += 1;
        self.nodes.insert(
            id,
            NodeData {
                tag: CompactString::from(tag),
                ..NodeData::default()
            },
        );
        id
    }

    fn node(&self, id: NodeId) -> Result<&NodeData, DomError> {
        self.nodes.get(&id).ok_or(DomError::UnknownNode(id))
    }

    fn node_mut(&mut self, id: NodeId) -> Result<&mut NodeData, DomError> {
        self.ensure_attached()?;
        self.nodes.get_mut(&id).ok_or(DomError::UnknownNode(id))
    }

    fn is_inclusive_ancestor(&self, ancestor: NodeId, mut node: NodeId) -> bool {
        loop {
            if node == ancestor {
                return true;
            }
            match self.nodes.get(&node).and_then(|n| n.parent) {
                Some(parent) => node = parent,
                None => return false,
            }
        }
    }

    /// Connected nodes in document order.
    fn document_order(&self) -> Vec<NodeId> {
        let mut order = Vec::with_capacity(self.nodes.len());
        let mut stack = vec![self.root];
        while let Some(id) = stack.pop() {
            order.push(id);
            if let Some(node) = self.nodes.get(&id) {
                stack.extend(node.children.iter().rev().copied());
            }
        }
        order
    }

    fn attribute(&self, id: NodeId, name: &str) -> Option<&str> {
        self.nodes
            .get(&id)?
            .attributes
            .iter()
            .find(|(key, _)| key == name)
            .map(|(_, value)| value.as_str())
    }
}

/// Handle to a frame's document and window.
///
/// Cloning the handle does not clone the document.
#[derive(Clone)]
pub struct Frame {
    state: Rc<RefCell<FrameState>>,
}

/// Non-owning handle to a frame.
#[derive(Clone)]
pub struct WeakFrame {
    id: FrameId,
    state: Weak<RefCell<FrameState>>,
}

impl WeakFrame {
    pub fn id(&self) -> FrameId {
        self.id
    }

    pub fn upgrade(&self) -> Option<Frame> {
        self.state.upgrade().map(|state| Frame { state })
    }

    /// Whether the frame still exists and has not been detached.
    pub fn is_alive(&self) -> bool {
        self.upgrade().is_some_and(|frame| frame.is_attached())
    }
}

impl Frame {
    /// Create an empty `<html><head/><body/></html>` document.
    pub fn new(viewport: Size) -> Self {
        let id = FrameId(NEXT_FRAME_ID.fetch_add(1, Ordering::Relaxed));
        let mut state = FrameState {
            id,
            attached: true,
            viewport,
            nodes: FxHashMap::default(),
            next_node: 0,
            root: NodeId(0),
            head: NodeId(0),
            body: NodeId(0),
            globals: FxHashMap::default(),
            listeners: Vec::new(),
            next_listener: 0,
        };
        let root = state.alloc("html");
        let head = state.alloc("head");
        let body = state.alloc("body");
        for child in [head, body] {
            if let Some(node) = state.nodes.get_mut(&child) {
                node.parent = Some(root);
            }
        }
        if let Some(node) = state.nodes.get_mut(&root) {
            node.children = vec![head, body];
        }
        state.root = root;
        state.head = head;
        state.body = body;
        Self {
            state: Rc::new(RefCell::new(state)),
        }
    }

    pub fn id(&self) -> FrameId {
        self.state.borrow().id
    }

    pub fn downgrade(&self) -> WeakFrame {
        WeakFrame {
            id: self.id(),
            state: Rc::downgrade(&self.state),
        }
    }

    pub fn is_attached(&self) -> bool {
        self.state.borrow().attached
    }

    /// Discard the document. Listeners and globals are dropped and every
    /// further mutation fails with [`DomError::Detached`].
    pub fn detach(&self) {
        let (listeners, globals) = {
            let mut state = self.state.borrow_mut();
            state.attached = false;
            (
                std::mem::take(&mut state.listeners),
                std::mem::take(&mut state.globals),
            )
        };
        drop(listeners);
        drop(globals);
    }

    pub fn viewport(&self) -> Size {
        self.state.borrow().viewport
    }

    pub fn set_viewport(&self, viewport: Size) {
        self.state.borrow_mut().viewport = viewport;
    }

    pub fn root(&self) -> NodeId {
        self.state.borrow().root
    }

    pub fn head(&self) -> NodeId {
        self.state.borrow().head
    }

    pub fn body(&self) -> NodeId {
        self.state.borrow().body
    }

    // ------------------------------------------------------------------
    // Tree
    // ------------------------------------------------------------------

    /// Create a detached element.
    pub fn create_element(&self, tag: &str) -> Result<NodeId, DomError> {
        let mut state = self.state.borrow_mut();
        state.ensure_attached()?;
        Ok(state.alloc(tag))
    }

    /// Create an element and append it to `parent`.
    pub fn append_new(&self, parent: NodeId, tag: &str) -> Result<NodeId, DomError> {
        let child = self.create_element(tag)?;
        self.append_child(parent, child)?;
        Ok(child)
    }

    /// Move `child` to the end of `parent`'s children.
    pub fn append_child(&self, parent: NodeId, child: NodeId) -> Result<(), DomError> {
        let mut state = self.state.borrow_mut();
        state.ensure_attached()?;
        state.node(parent)?;
        state.node(child)?;
        if state.is_inclusive_ancestor(child, parent) {
            return Err(DomError::Cycle { parent, child });
        }
        let old_parent = state.node(child)?.parent;
        if let Some(old_parent) = old_parent {
            state.node_mut(old_parent)?.children.retain(|c| *c != child);
        }
        state.node_mut(child)?.parent = Some(parent);
        state.node_mut(parent)?.children.push(child);
        Ok(())
    }

    /// Remove `node` and its subtree from the document, together with every
    /// listener registered on them.
    pub fn remove(&self, node: NodeId) -> Result<(), DomError> {
        let removed_listeners = {
            let mut state = self.state.borrow_mut();
            state.ensure_attached()?;
            let parent = state.node(node)?.parent;
            if let Some(parent) = parent {
                state.node_mut(parent)?.children.retain(|c| *c != node);
            }
            let mut stack = vec![node];
            let mut subtree = Vec::new();
            while let Some(id) = stack.pop() {
                if let Some(data) = state.nodes.remove(&id) {
                    stack.extend(data.children);
                    subtree.push(id);
                }
            }
            let (removed, kept): (Vec<_>, Vec<_>) = std::mem::take(&mut state.listeners)
                .into_iter()
                .partition(|entry| subtree.contains(&entry.node));
            state.listeners = kept;
            removed
        };
        // Callbacks may own frame handles; drop them outside the borrow.
        drop(removed_listeners);
        Ok(())
    }

    pub fn exists(&self, node: NodeId) -> bool {
        self.state.borrow().nodes.contains_key(&node)
    }

    /// Whether `node` is reachable from the document root of an attached frame.
    pub fn is_connected(&self, node: NodeId) -> bool {
        let state = self.state.borrow();
        state.attached && state.nodes.contains_key(&node) && state.is_inclusive_ancestor(state.root, node)
    }

    pub fn parent(&self, node: NodeId) -> Option<NodeId> {
        self.state.borrow().nodes.get(&node)?.parent
    }

    pub fn children(&self, node: NodeId) -> Vec<NodeId> {
        self.state
            .borrow()
            .nodes
            .get(&node)
            .map(|n| n.children.clone())
            .unwrap_or_default()
    }

    pub fn tag(&self, node: NodeId) -> Option<CompactString> {
        self.state.borrow().nodes.get(&node).map(|n| n.tag.clone())
    }

    /// Whether `node` is `ancestor` or one of its descendants.
    pub fn contains(&self, ancestor: NodeId, node: NodeId) -> bool {
        self.state.borrow().is_inclusive_ancestor(ancestor, node)
    }

    /// Walk from `node` up to (and including) `boundary`, returning the first
    /// node accepted by `predicate`.
    ///
    /// The frame is not borrowed while `predicate` runs, so it may call back
    /// into the frame.
    pub fn closest(
        &self,
        node: NodeId,
        boundary: Option<NodeId>,
        predicate: impl Fn(NodeId) -> bool,
    ) -> Option<NodeId> {
        let mut current = Some(node);
        while let Some(id) = current {
            if predicate(id) {
                return Some(id);
            }
            if Some(id) == boundary {
                return None;
            }
            current = self.parent(id);
        }
        None
    }

    // ------------------------------------------------------------------
    // Queries
    // ------------------------------------------------------------------

    /// First connected element whose `id` attribute equals `id`.
    pub fn element_by_id(&self, id: &str) -> Option<NodeId> {
        let state = self.state.borrow();
        if !state.attached {
            return None;
        }
        state
            .document_order()
            .into_iter()
            .find(|node| state.attribute(*node, "id") == Some(id))
    }

    /// Every connected element whose `id` attribute equals `id`.
    pub fn elements_with_id(&self, id: &str) -> Vec<NodeId> {
        let state = self.state.borrow();
        state
            .document_order()
            .into_iter()
            .filter(|node| state.attribute(*node, "id") == Some(id))
            .collect()
    }

    /// First connected element carrying `class`.
    pub fn find_by_class(&self, class: &str) -> Option<NodeId> {
        let state = self.state.borrow();
        if !state.attached {
            return None;
        }
        state
            .document_order()
            .into_iter()
            .find(|node| class_matches(state.attribute(*node, "class"), class))
    }

    // ------------------------------------------------------------------
    // Attributes, markup, text, geometry
    // ------------------------------------------------------------------

    pub fn attribute(&self, node: NodeId, name: &str) -> Option<String> {
        self.state.borrow().attribute(node, name).map(str::to_owned)
    }

    pub fn has_attribute(&self, node: NodeId, name: &str) -> bool {
        self.state.borrow().attribute(node, name).is_some()
    }

    pub fn set_attribute(&self, node: NodeId, name: &str, value: &str) -> Result<(), DomError> {
        let mut state = self.state.borrow_mut();
        let data = state.node_mut(node)?;
        match data.attributes.iter_mut().find(|(key, _)| key == name) {
            Some((_, existing)) => {
                existing.clear();
                existing.push_str(value);
            }
            None => data
                .attributes
                .push((CompactString::from(name), value.to_owned())),
        }
        Ok(())
    }

    pub fn remove_attribute(&self, node: NodeId, name: &str) -> Result<Option<String>, DomError> {
        let mut state = self.state.borrow_mut();
        let data = state.node_mut(node)?;
        let position = data.attributes.iter().position(|(key, _)| key == name);
        Ok(position.map(|index| data.attributes.remove(index).1))
    }

    pub fn has_class(&self, node: NodeId, class: &str) -> bool {
        class_matches(self.state.borrow().attribute(node, "class"), class)
    }

    /// Raw inner markup of `node`.
    pub fn markup(&self, node: NodeId) -> Option<String> {
        self.state.borrow().nodes.get(&node).map(|n| n.markup.clone())
    }

    pub fn set_markup(&self, node: NodeId, markup: impl Into<String>) -> Result<(), DomError> {
        self.state.borrow_mut().node_mut(node)?.markup = markup.into();
        Ok(())
    }

    pub fn set_text(&self, node: NodeId, text: impl Into<String>) -> Result<(), DomError> {
        self.state.borrow_mut().node_mut(node)?.text = text.into();
        Ok(())
    }

    /// Concatenated text of `node` and its descendants, in document order.
    pub fn text_content(&self, node: NodeId) -> String {
        let state = self.state.borrow();
        let mut out = String::new();
        let mut stack = vec![node];
        while let Some(id) = stack.pop() {
            if let Some(data) = state.nodes.get(&id) {
                out.push_str(&data.text);
                stack.extend(data.children.iter().rev().copied());
            }
        }
        out
    }

    pub fn rect(&self, node: NodeId) -> Option<Rect> {
        self.state.borrow().nodes.get(&node).map(|n| n.rect)
    }

    pub fn set_rect(&self, node: NodeId, rect: Rect) -> Result<(), DomError> {
        self.state.borrow_mut().node_mut(node)?.rect = rect;
        Ok(())
    }

    // ------------------------------------------------------------------
    // Window globals
    // ------------------------------------------------------------------

    /// Expose `value` as a global of this frame's window.
    pub fn set_global(&self, name: &str, value: Rc<dyn Any>) -> Result<(), DomError> {
        let mut state = self.state.borrow_mut();
        state.ensure_attached()?;
        state.globals.insert(CompactString::from(name), value);
        Ok(())
    }

    /// Look up a global and downcast it to `T`.
    pub fn global<T: Any>(&self, name: &str) -> Option<Rc<T>> {
        let value = self.state.borrow().globals.get(name)?.clone();
        value.downcast::<T>().ok()
    }

    pub fn remove_global(&self, name: &str) -> Option<Rc<dyn Any>> {
        self.state.borrow_mut().globals.remove(name)
    }

    // ------------------------------------------------------------------
    // Events
    // ------------------------------------------------------------------

    pub fn add_listener(
        &self,
        node: NodeId,
        kind: EventKind,
        callback: impl Fn(&Frame, &Event) + 'static,
    ) -> Result<ListenerId, DomError> {
        let mut state = self.state.borrow_mut();
        state.ensure_attached()?;
        state.node(node)?;
        let id = ListenerId(state.next_listener);
        state.next_listener += 1;
        state.listeners.push(ListenerEntry {
            id,
            node,
            kind,
            callback: Rc::new(callback),
        });
        Ok(id)
    }

    /// Returns `false` if the listener was already gone.
    pub fn remove_listener(&self, id: ListenerId) -> bool {
        let removed = {
            let mut state = self.state.borrow_mut();
            let position = state.listeners.iter().position(|entry| entry.id == id);
            position.map(|index| state.listeners.remove(index))
        };
        removed.is_some()
    }

    pub fn listener_count(&self, node: NodeId, kind: EventKind) -> usize {
        self.state
            .borrow()
            .listeners
            .iter()
            .filter(|entry| entry.node == node && entry.kind == kind)
            .count()
    }

    /// Dispatch `event`, bubbling from the target up to the root.
    ///
    /// Returns the number of listeners invoked.
    pub fn dispatch(&self, event: Event) -> usize {
        let mut invoked = 0;
        let mut current = Some(event.target);
        while let Some(node) = current {
            let callbacks: Vec<Listener> = {
                let state = self.state.borrow();
                if !state.attached {
                    return invoked;
                }
                state
                    .listeners
                    .iter()
                    .filter(|entry| entry.node == node && entry.kind == event.kind)
                    .map(|entry| entry.callback.clone())
                    .collect()
            };
            for callback in callbacks {
                callback(self, &event);
                invoked += 1;
            }
            current = self.parent(node);
        }
        invoked
    }
}

impl PartialEq for Frame {
    fn eq(&self, other: &Self) -> bool {
        Rc::ptr_eq(&self.state, &other.state)
    }
}

impl Eq for Frame {}

impl fmt::Debug for Frame {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let state = self.state.borrow();
        f.debug_struct("Frame")
            .field("id", &state.id)
            .field("attached", &state.attached)
            .field("nodes", &state.nodes.len())
            .finish()
    }
}

fn class_matches(attribute: Option<&str>, class: &str) -> bool {
    attribute.is_some_and(|value| value.split_ascii_whitespace().any(|c| c == class))
}

/// A node together with the frame that owns it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ElementRef {
    pub frame: Frame,
    pub node: NodeId,
}

impl ElementRef {
    pub fn new(frame: Frame, node: NodeId) -> Self {
        Self { frame, node }
    }

    pub fn is_connected(&self) -> bool {
        self.frame.is_connected(self.node)
    }

    pub fn attribute(&self, name: &str) -> Option<String> {
        self.frame.attribute(self.node, name)
    }

    pub fn set_attribute(&self, name: &str, value: &str) -> Result<(), DomError> {
        self.frame.set_attribute(self.node, name, value)
    }

    pub fn markup(&self) -> Option<String> {
        self.frame.markup(self.node)
    }

    pub fn set_markup(&self, markup: impl Into<String>) -> Result<(), DomError> {
        self.frame.set_markup(self.node, markup)
    }
}
