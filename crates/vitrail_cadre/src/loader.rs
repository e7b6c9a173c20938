//! Memoized script loading into frames.
//!
//! [`AssetLoader::ensure`] makes a third-party library available inside a
//! frame: it probes the frame's globals, and only if the library is missing
//! injects a `<script>` into `<head>` and waits for its load or error event.
//!
//! The loader keeps one [`LoadToken`] per frame and asset. Every caller that
//! asks for the same asset on the same frame, concurrently or later, awaits
//! that token, so the script element is created and fetched exactly once.
//! Tokens are forgotten when their frame is dropped or detached.

use std::cell::{Cell, RefCell};
use std::rc::Rc;

use futures::channel::oneshot;
use futures::future::{self, FutureExt, LocalBoxFuture, Shared};
use serde::{Deserialize, Serialize};
use vitrail_carton::{CompactString, FxHashMap};

use crate::dom::{DomError, EventKind, Frame, FrameId, NodeId, WeakFrame};

/// Attribute set on a script element once its load event fired.
pub const LOADED_FLAG: &str = "data-loaded";

/// Where a library comes from and how its script element is identified.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AssetSpec {
    /// Registry key, usually the global the library installs.
    pub name: CompactString,
    pub script_url: String,
    /// `id` of the injected `<script>`; at most one such element per document.
    pub element_id: CompactString,
}

impl AssetSpec {
    pub fn new(
        name: impl Into<CompactString>,
        script_url: impl Into<String>,
        element_id: impl Into<CompactString>,
    ) -> Self {
        Self {
            name: name.into(),
            script_url: script_url.into(),
            element_id: element_id.into(),
        }
    }
}

/// Settled state of a script load.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LoadStatus {
    Loaded,
    Failed,
}

/// Shared, write-once outcome of one script injection.
pub type LoadToken = Shared<LocalBoxFuture<'static, LoadStatus>>;

/// Detailed result of [`AssetLoader::resolve`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AssetResolution<L> {
    /// The library is available.
    Ready(L),
    /// The script element reported an error.
    LoadFailed,
    /// The script loaded but the probe still finds nothing.
    MissingGlobal,
    /// The frame was detached before or during the load.
    Detached,
}

impl<L> AssetResolution<L> {
    pub fn into_library(self) -> Option<L> {
        match self {
            AssetResolution::Ready(library) => Some(library),
            _ => None,
        }
    }

    pub fn is_ready(&self) -> bool {
        matches!(self, AssetResolution::Ready(_))
    }
}

struct TokenEntry {
    frame: WeakFrame,
    token: LoadToken,
}

/// Registry of load tokens, owned by one editor runtime.
#[derive(Default)]
pub struct AssetLoader {
    tokens: RefCell<FxHashMap<(FrameId, CompactString), TokenEntry>>,
    injected: Cell<usize>,
}

impl AssetLoader {
    pub fn new() -> Self {
        Self::default()
    }

    /// Resolve to the library, or `None` if it cannot be made available.
    ///
    /// Never fails: a missing library is a degraded state the caller handles.
    pub async fn ensure<L, P>(&self, frame: &Frame, asset: &AssetSpec, probe: P) -> Option<L>
    where
        P: Fn(&Frame) -> Option<L>,
    {
        self.resolve(frame, asset, probe).await.into_library()
    }

    /// Like [`ensure`](Self::ensure), but reports why the library is missing.
    pub async fn resolve<L, P>(&self, frame: &Frame, asset: &AssetSpec, probe: P) -> AssetResolution<L>
    where
        P: Fn(&Frame) -> Option<L>,
    {
        if let Some(library) = probe(frame) {
            return AssetResolution::Ready(library);
        }

        let token = match self.token(frame, asset) {
            Ok(token) => token,
            Err(DomError::Detached(_)) => return AssetResolution::Detached,
            Err(err) => {
                tracing::warn!("{}: could not inject script into {}: {}", asset.name, frame.id(), err);
                return AssetResolution::LoadFailed;
            }
        };

        let status = token.await;
        if !frame.is_attached() {
            return AssetResolution::Detached;
        }
        match status {
            LoadStatus::Loaded => match probe(frame) {
                Some(library) => AssetResolution::Ready(library),
                None => {
                    tracing::warn!(
                        "{}: script loaded in {} but the library is not available",
                        asset.name,
                        frame.id()
                    );
                    AssetResolution::MissingGlobal
                }
            },
            LoadStatus::Failed => {
                tracing::warn!("{}: script {} failed to load in {}", asset.name, asset.script_url, frame.id());
                AssetResolution::LoadFailed
            }
        }
    }

    /// Return the token for `asset` on `frame`, starting the load if needed.
    pub fn token(&self, frame: &Frame, asset: &AssetSpec) -> Result<LoadToken, DomError> {
        self.prune();

        let key = (frame.id(), asset.name.clone());
        if let Some(entry) = self.tokens.borrow().get(&key) {
            return Ok(entry.token.clone());
        }

        let token = self.start_load(frame, asset)?;
        self.tokens.borrow_mut().insert(
            key,
            TokenEntry {
                frame: frame.downgrade(),
                token: token.clone(),
            },
        );
        Ok(token)
    }

    fn start_load(&self, frame: &Frame, asset: &AssetSpec) -> Result<LoadToken, DomError> {
        if !frame.is_attached() {
            return Err(DomError::Detached(frame.id()));
        }

        if let Some(script) = frame.element_by_id(&asset.element_id) {
            if frame.attribute(script, LOADED_FLAG).as_deref() == Some("true") {
                tracing::debug!("{}: script already loaded in {}", asset.name, frame.id());
                return Ok(settled(LoadStatus::Loaded));
            }
            tracing::debug!("{}: joining in-flight script in {}", asset.name, frame.id());
            return listen(frame, script);
        }

        let script = frame.create_element("script")?;
        frame.set_attribute(script, "id", &asset.element_id)?;
        frame.set_attribute(script, "src", &asset.script_url)?;
        let token = listen(frame, script)?;
        frame.append_child(frame.head(), script)?;
        self.injected.set(self.injected.get() + 1);
        tracing::debug!("{}: injected {} into {}", asset.name, asset.script_url, frame.id());
        Ok(token)
    }

    /// Number of script elements this loader created.
    pub fn injected_count(&self) -> usize {
        self.injected.get()
    }

    /// Number of tracked tokens that have not settled yet.
    pub fn pending_count(&self) -> usize {
        self.tokens
            .borrow()
            .values()
            .filter(|entry| entry.token.peek().is_none())
            .count()
    }

    /// Number of tracked tokens, settled or not.
    pub fn tracked_count(&self) -> usize {
        self.tokens.borrow().len()
    }

    /// Drop every token of a frame. Returns how many were dropped.
    pub fn forget_frame(&self, frame: FrameId) -> usize {
        let mut tokens = self.tokens.borrow_mut();
        let before = tokens.len();
        tokens.retain(|(id, _), _| *id != frame);
        before - tokens.len()
    }

    fn prune(&self) {
        self.tokens
            .borrow_mut()
            .retain(|_, entry| entry.frame.is_alive());
    }
}

fn settled(status: LoadStatus) -> LoadToken {
    future::ready(status).boxed_local().shared()
}

/// Attach load/error listeners to `script` and return the token they settle.
fn listen(frame: &Frame, script: NodeId) -> Result<LoadToken, DomError> {
    let (sender, receiver) = oneshot::channel::<LoadStatus>();
    let sender = Rc::new(RefCell::new(Some(sender)));

    let on_load = sender.clone();
    frame.add_listener(script, EventKind::Load, move |frame, event| {
        if let Err(err) = frame.set_attribute(event.target, LOADED_FLAG, "true") {
            tracing::debug!("could not flag script as loaded: {}", err);
        }
        settle(&on_load, LoadStatus::Loaded);
    })?;
    frame.add_listener(script, EventKind::Error, move |_, _| {
        settle(&sender, LoadStatus::Failed);
    })?;

    // A dropped sender means the frame went away before the script settled.
    Ok(receiver
        .map(|status| status.unwrap_or(LoadStatus::Failed))
        .boxed_local()
        .shared())
}

fn settle(sender: &RefCell<Option<oneshot::Sender<LoadStatus>>>, status: LoadStatus) {
    if let Some(sender) = sender.borrow_mut().take() {
        let _ = sender.send(status);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::dom::Event;
    use vitrail_carton::Size;

    fn asset() -> AssetSpec {
        AssetSpec::new("lib", "https://cdn.example/lib.js", "lib-script")
    }

    #[test]
    fn test_fast_path_does_not_touch_registry() {
        let frame = Frame::new(Size::new(800.0, 600.0));
        let loader = AssetLoader::new();
        let result = loader
            .ensure(&frame, &asset(), |_| Some(7))
            .now_or_never()
            .flatten();

        assert_eq!(result, Some(7));
        assert_eq!(loader.tracked_count(), 0);
        assert!(frame.element_by_id("lib-script").is_none());
    }

    #[test]
    fn test_token_is_memoized_per_frame() {
        let frame = Frame::new(Size::new(800.0, 600.0));
        let loader = AssetLoader::new();
        loader.token(&frame, &asset()).unwrap();
        loader.token(&frame, &asset()).unwrap();

        assert_eq!(loader.injected_count(), 1);
        assert_eq!(loader.pending_count(), 1);
        assert_eq!(frame.elements_with_id("lib-script").len(), 1);
    }

    #[test]
    fn test_loaded_flag_is_set_on_load() {
        let frame = Frame::new(Size::new(800.0, 600.0));
        let loader = AssetLoader::new();
        let token = loader.token(&frame, &asset()).unwrap();
        let script = frame.element_by_id("lib-script").unwrap();

        frame.dispatch(Event::load(script));
        assert_eq!(frame.attribute(script, LOADED_FLAG).as_deref(), Some("true"));
        assert_eq!(token.now_or_never(), Some(LoadStatus::Loaded));
        assert_eq!(loader.pending_count(), 0);
    }

    #[test]
    fn test_detached_frame_tokens_are_pruned() {
        let frame = Frame::new(Size::new(800.0, 600.0));
        let other = Frame::new(Size::new(800.0, 600.0));
        let loader = AssetLoader::new();
        let token = loader.token(&frame, &asset()).unwrap();

        frame.detach();
        assert_eq!(token.now_or_never(), Some(LoadStatus::Failed));
        loader.token(&other, &asset()).unwrap();
        assert_eq!(loader.tracked_count(), 1);
        assert_eq!(loader.forget_frame(other.id()), 1);
    }
}
