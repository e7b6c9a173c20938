//! Per-editor runtime.
//!
//! A [`Runtime`] owns everything that would otherwise be process-wide: the
//! asset loader with its load tokens, the component type registry and the
//! palette catalog. Two editors in one process use two runtimes and share
//! nothing.

use std::cell::{Ref, RefCell};
use std::rc::Rc;

use serde_json::Value;
use vitrail_atelier::{
    BindOutcome, BindingError, BindingState, CarouselAdapter, CollapseAdapter, ComponentInstance,
    ComponentRegistry, RegistryError, UpdateOutcome, WidgetAdapter, WidgetBinding,
};
use vitrail_cadre::{AssetLoader, AssetSpec, ElementRef, Frame};
use vitrail_carton::Scheduler;
use vitrail_musea::{CatalogError, HoverPreviewEngine, PaletteCatalog};

use crate::config::{ConfigError, RuntimeConfig};

/// Error type for runtime setup and component creation.
#[derive(Debug, thiserror::Error)]
pub enum RuntimeError {
    #[error(transparent)]
    Config(#[from] ConfigError),

    #[error(transparent)]
    Registry(#[from] RegistryError),

    #[error(transparent)]
    Catalog(#[from] CatalogError),

    #[error("component type '{type_name}' uses unknown widget kind '{kind}'")]
    UnknownWidget { type_name: String, kind: String },
}

/// Binding for one of the built-in widget kinds.
#[derive(Debug)]
pub enum ComponentBinding {
    Carousel(WidgetBinding<CarouselAdapter>),
    Collapse(WidgetBinding<CollapseAdapter>),
}

impl ComponentBinding {
    pub fn kind(&self) -> &'static str {
        match self {
            Self::Carousel(_) => "carousel",
            Self::Collapse(_) => "collapse",
        }
    }

    pub fn state(&self) -> BindingState {
        match self {
            Self::Carousel(binding) => binding.state(),
            Self::Collapse(binding) => binding.state(),
        }
    }

    pub async fn render(&self, element: ElementRef) -> Result<BindOutcome, BindingError> {
        match self {
            Self::Carousel(binding) => binding.render(element).await,
            Self::Collapse(binding) => binding.render(element).await,
        }
    }

    pub async fn update(
        &self,
        name: &str,
        value: impl Into<Value>,
    ) -> Result<UpdateOutcome, BindingError> {
        match self {
            Self::Carousel(binding) => binding.update(name, value).await,
            Self::Collapse(binding) => binding.update(name, value).await,
        }
    }

    pub fn remove(&self) {
        match self {
            Self::Carousel(binding) => binding.remove(),
            Self::Collapse(binding) => binding.remove(),
        }
    }
}

pub struct Runtime {
    config: RuntimeConfig,
    scheduler: Rc<dyn Scheduler>,
    loader: Rc<AssetLoader>,
    registry: ComponentRegistry,
    catalog: Rc<RefCell<PaletteCatalog>>,
    carousel: Rc<CarouselAdapter>,
    collapse: Rc<CollapseAdapter>,
}

impl Runtime {
    /// Runtime with the built-in component types and an empty palette.
    pub fn new(config: RuntimeConfig, scheduler: Rc<dyn Scheduler>) -> Result<Self, RuntimeError> {
        config.validate()?;
        let asset = config.widgets.asset();
        let carousel = Rc::new(CarouselAdapter::new(
            asset.clone(),
            config.widgets.carousel_interval_ms,
        ));
        let collapse = Rc::new(CollapseAdapter::new(asset));
        Ok(Self {
            registry: ComponentRegistry::with_builtins()?,
            loader: Rc::new(AssetLoader::new()),
            catalog: Rc::new(RefCell::new(PaletteCatalog::new())),
            carousel,
            collapse,
            scheduler,
            config,
        })
    }

    pub fn config(&self) -> &RuntimeConfig {
        &self.config
    }

    pub fn scheduler(&self) -> &Rc<dyn Scheduler> {
        &self.scheduler
    }

    pub fn loader(&self) -> &Rc<AssetLoader> {
        &self.loader
    }

    /// The widget library asset shared by the built-in adapters.
    pub fn asset(&self) -> &AssetSpec {
        self.carousel.asset()
    }

    pub fn registry(&self) -> &ComponentRegistry {
        &self.registry
    }

    pub fn registry_mut(&mut self) -> &mut ComponentRegistry {
        &mut self.registry
    }

    pub fn catalog(&self) -> Ref<'_, PaletteCatalog> {
        self.catalog.borrow()
    }

    /// Replace the palette catalog with the entries in `source`.
    ///
    /// Engines already started see the new entries on their next hover.
    pub fn load_catalog(&self, source: &str) -> Result<usize, RuntimeError> {
        let catalog = PaletteCatalog::from_json(source)?;
        let count = catalog.len();
        *self.catalog.borrow_mut() = catalog;
        tracing::debug!("palette catalog loaded with {} entries", count);
        Ok(count)
    }

    /// New component of a registered type.
    pub fn instantiate(&self, type_name: &str) -> Result<ComponentInstance, RegistryError> {
        self.registry.instantiate(type_name)
    }

    /// Binding picked by the widget kind of the component's registered type.
    ///
    /// `Ok(None)` for types without a widget.
    pub fn bind(
        &self,
        component: ComponentInstance,
    ) -> Result<Option<ComponentBinding>, RuntimeError> {
        let component_type = self
            .registry
            .get(&component.type_name)
            .ok_or_else(|| RegistryError::Unknown(component.type_name.clone()))?;
        let binding = match component_type.widget {
            None => return Ok(None),
            Some("carousel") => ComponentBinding::Carousel(self.carousel_binding(component)),
            Some("collapse") => ComponentBinding::Collapse(self.collapse_binding(component)),
            Some(kind) => {
                return Err(RuntimeError::UnknownWidget {
                    type_name: component.type_name.to_string(),
                    kind: kind.to_owned(),
                })
            }
        };
        Ok(Some(binding))
    }

    pub fn carousel_binding(&self, component: ComponentInstance) -> WidgetBinding<CarouselAdapter> {
        self.binding(self.carousel.clone(), component)
    }

    pub fn collapse_binding(&self, component: ComponentInstance) -> WidgetBinding<CollapseAdapter> {
        self.binding(self.collapse.clone(), component)
    }

    /// Binding for a custom adapter, sharing this runtime's asset loader.
    pub fn binding<A: WidgetAdapter + 'static>(
        &self,
        adapter: Rc<A>,
        component: ComponentInstance,
    ) -> WidgetBinding<A> {
        WidgetBinding::new(adapter, self.loader.clone(), component)
    }

    /// Start hover previews on the palette hosted by `frame`.
    pub fn hover_engine(&self, frame: Frame) -> HoverPreviewEngine {
        HoverPreviewEngine::start(
            frame,
            self.catalog.clone(),
            self.scheduler.clone(),
            self.config.hover.to_options(),
        )
    }
}

impl std::fmt::Debug for Runtime {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Runtime")
            .field("config", &self.config)
            .field("types", &self.registry.names())
            .field("entries", &self.catalog.borrow().len())
            .field("tracked_loads", &self.loader.tracked_count())
            .finish()
    }
}
