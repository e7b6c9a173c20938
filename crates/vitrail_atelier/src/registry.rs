//! Component types and their trait schema.
//!
//! Each registered [`ComponentType`] declares the classes it manages and the
//! traits the editor exposes for it. A trait's kind says how its value is
//! read; its effect says what changing it touches: the node markup, the
//! class attribute, or the bound widget.

use serde_json::Value;
use vitrail_carton::{CompactString, FxHashMap};

use crate::classes::{ClassList, ClassSpecError, ManagedClassSpec};
use crate::component::ComponentInstance;

/// How a trait's value is interpreted.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TraitKind {
    Text,
    Number,
    Checkbox,
    /// Adds `class` while the value is truthy. The class must be a member of
    /// one of the type's option families.
    Toggle { class: CompactString },
    /// The value is the active member of option family `family`, or empty.
    Select { family: usize },
}

/// What changing a trait affects.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TraitEffect {
    Markup,
    Classes,
    Behavior,
}

#[derive(Debug, Clone, PartialEq)]
pub struct TraitSpec {
    pub name: CompactString,
    pub kind: TraitKind,
    pub effect: TraitEffect,
    /// Value given to new instances.
    pub default: Option<Value>,
}

impl TraitSpec {
    pub fn new(name: &str, kind: TraitKind, effect: TraitEffect) -> Self {
        Self {
            name: name.into(),
            kind,
            effect,
            default: None,
        }
    }

    pub fn text(name: &str) -> Self {
        Self::new(name, TraitKind::Text, TraitEffect::Markup)
    }

    pub fn behavior(name: &str, kind: TraitKind) -> Self {
        Self::new(name, kind, TraitEffect::Behavior)
    }

    pub fn select(name: &str, family: usize) -> Self {
        Self::new(name, TraitKind::Select { family }, TraitEffect::Classes)
    }

    pub fn toggle(name: &str, class: &str) -> Self {
        Self::new(
            name,
            TraitKind::Toggle {
                class: class.into(),
            },
            TraitEffect::Classes,
        )
    }

    pub fn with_default(mut self, value: impl Into<Value>) -> Self {
        self.default = Some(value.into());
        self
    }

    /// Class selection for this trait given the instance's attributes.
    fn selection(&self, component: &ComponentInstance) -> Option<String> {
        match &self.kind {
            TraitKind::Select { .. } => component.attributes.string(&self.name),
            TraitKind::Toggle { class } => component
                .attributes
                .flag(&self.name)
                .unwrap_or(false)
                .then(|| class.to_string()),
            _ => None,
        }
    }
}

/// A block the editor can place on the canvas.
#[derive(Debug, Clone, PartialEq)]
pub struct ComponentType {
    pub name: CompactString,
    /// Tag of the root node.
    pub tag: CompactString,
    pub classes: ManagedClassSpec,
    pub traits: Vec<TraitSpec>,
    /// Inner markup of new instances. May contain the id placeholder.
    pub template: String,
    /// Kind of widget bound to the node, if any.
    pub widget: Option<&'static str>,
}

impl ComponentType {
    pub fn trait_spec(&self, name: &str) -> Option<&TraitSpec> {
        self.traits.iter().find(|spec| spec.name == name)
    }

    pub fn effect_of(&self, attribute: &str) -> Option<TraitEffect> {
        self.trait_spec(attribute).map(|spec| spec.effect)
    }
}

/// Error type for the component registry.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum RegistryError {
    #[error("component type '{0}' is already registered")]
    Duplicate(CompactString),

    #[error("unknown component type '{0}'")]
    Unknown(CompactString),

    #[error("trait '{name}' refers to option family {family}, which does not exist")]
    UnknownFamily { name: CompactString, family: usize },

    #[error("trait '{name}' toggles '{class}', which is not in any option family")]
    UnmanagedToggle {
        name: CompactString,
        class: CompactString,
    },

    #[error("trait '{0}' is declared twice")]
    DuplicateTrait(CompactString),

    #[error(transparent)]
    Classes(#[from] ClassSpecError),
}

/// Registered component types, owned by one editor runtime.
#[derive(Debug, Default)]
pub struct ComponentRegistry {
    types: FxHashMap<CompactString, ComponentType>,
}

impl ComponentRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Registry preloaded with [`builtin_types`].
    pub fn with_builtins() -> Result<Self, RegistryError> {
        let mut registry = Self::new();
        for component_type in builtin_types()? {
            registry.register(component_type)?;
        }
        Ok(registry)
    }

    pub fn register(&mut self, component_type: ComponentType) -> Result<(), RegistryError> {
        if self.types.contains_key(&component_type.name) {
            return Err(RegistryError::Duplicate(component_type.name));
        }
        validate(&component_type)?;
        tracing::debug!("registered component type {}", component_type.name);
        self.types.insert(component_type.name.clone(), component_type);
        Ok(())
    }

    pub fn get(&self, name: &str) -> Option<&ComponentType> {
        self.types.get(name)
    }

    fn require(&self, name: &str) -> Result<&ComponentType, RegistryError> {
        self.get(name)
            .ok_or_else(|| RegistryError::Unknown(name.into()))
    }

    /// Registered type names, sorted.
    pub fn names(&self) -> Vec<&str> {
        let mut names: Vec<&str> = self.types.keys().map(CompactString::as_str).collect();
        names.sort_unstable();
        names
    }

    pub fn len(&self) -> usize {
        self.types.len()
    }

    pub fn is_empty(&self) -> bool {
        self.types.is_empty()
    }

    /// Class selections implied by the instance's class traits, in trait order.
    pub fn selections(&self, component: &ComponentInstance) -> Result<Vec<String>, RegistryError> {
        let component_type = self.require(&component.type_name)?;
        Ok(component_type
            .traits
            .iter()
            .filter_map(|spec| spec.selection(component))
            .collect())
    }

    /// Reconcile the instance's classes against its type and store the result.
    pub fn apply_classes(&self, component: &mut ComponentInstance) -> Result<(), RegistryError> {
        let selections = self.selections(component)?;
        let component_type = self.require(&component.type_name)?;
        component.classes = component_type
            .classes
            .reconcile(&component.classes, &selections);
        Ok(())
    }

    /// New instance with trait defaults and reconciled classes.
    pub fn instantiate(&self, name: &str) -> Result<ComponentInstance, RegistryError> {
        let component_type = self.require(name)?;
        let mut component = ComponentInstance::new(component_type.name.clone());
        for spec in &component_type.traits {
            if let Some(default) = &spec.default {
                component.attributes.set(&spec.name, default.clone());
            }
        }
        self.apply_classes(&mut component)?;
        Ok(component)
    }

    /// Markup of a fresh instance: root tag, reconciled classes and template.
    pub fn markup(&self, component: &ComponentInstance) -> Result<String, RegistryError> {
        let component_type = self.require(&component.type_name)?;
        Ok(format!(
            "<{tag} class=\"{classes}\">{template}</{tag}>",
            tag = component_type.tag,
            classes = component.classes,
            template = component_type.template,
        ))
    }
}

fn validate(component_type: &ComponentType) -> Result<(), RegistryError> {
    let classes = &component_type.classes;
    for (index, spec) in component_type.traits.iter().enumerate() {
        if component_type.traits[..index]
            .iter()
            .any(|earlier| earlier.name == spec.name)
        {
            return Err(RegistryError::DuplicateTrait(spec.name.clone()));
        }
        match &spec.kind {
            TraitKind::Select { family } if classes.family(*family).is_none() => {
                return Err(RegistryError::UnknownFamily {
                    name: spec.name.clone(),
                    family: *family,
                });
            }
            TraitKind::Toggle { class } if classes.family_of(class).is_none() => {
                return Err(RegistryError::UnmanagedToggle {
                    name: spec.name.clone(),
                    class: class.clone(),
                });
            }
            _ => {}
        }
    }
    Ok(())
}

const CAROUSEL_TEMPLATE: &str = r##"<div class="carousel-inner"><div class="carousel-item active"><img src="https://placehold.co/1200x480?text=Slide+1" class="d-block w-100" alt="Slide 1"></div><div class="carousel-item"><img src="https://placehold.co/1200x480?text=Slide+2" class="d-block w-100" alt="Slide 2"></div><div class="carousel-item"><img src="https://placehold.co/1200x480?text=Slide+3" class="d-block w-100" alt="Slide 3"></div></div><button class="carousel-control-prev" type="button" data-bs-target="#__COMPONENT_ID__" data-bs-slide="prev"><span class="carousel-control-prev-icon" aria-hidden="true"></span><span class="visually-hidden">Previous</span></button><button class="carousel-control-next" type="button" data-bs-target="#__COMPONENT_ID__" data-bs-slide="next"><span class="carousel-control-next-icon" aria-hidden="true"></span><span class="visually-hidden">Next</span></button>"##;

const COLLAPSE_TEMPLATE: &str = r##"<h2 class="accordion-header"><button class="accordion-button collapsed" type="button" data-bs-toggle="collapse" data-bs-target="#__COMPONENT_ID__-body" aria-controls="__COMPONENT_ID__-body">Section title</button></h2><div id="__COMPONENT_ID__-body" class="accordion-collapse collapse"><div class="accordion-body">Section content</div></div>"##;

const CARD_TEMPLATE: &str = r##"<div class="card-body"><h5 class="card-title">Card title</h5><p class="card-text">Some quick example text.</p></div>"##;

/// The component types every editor starts with.
pub fn builtin_types() -> Result<Vec<ComponentType>, RegistryError> {
    Ok(vec![
        ComponentType {
            name: "carousel".into(),
            tag: "div".into(),
            classes: ManagedClassSpec::new(
                ClassList::parse("carousel slide"),
                vec![ClassList::parse("carousel-fade"), ClassList::parse("carousel-dark")],
            )?,
            traits: vec![
                TraitSpec::behavior("interval", TraitKind::Number).with_default(5000),
                TraitSpec::behavior("loop", TraitKind::Checkbox).with_default(true),
                TraitSpec::behavior("pause-on-hover", TraitKind::Checkbox).with_default(true),
                TraitSpec::behavior("keyboard", TraitKind::Checkbox).with_default(true),
                TraitSpec::behavior("autoplay", TraitKind::Checkbox).with_default(true),
                TraitSpec::toggle("fade", "carousel-fade"),
                TraitSpec::toggle("dark", "carousel-dark"),
            ],
            template: CAROUSEL_TEMPLATE.to_owned(),
            widget: Some("carousel"),
        },
        ComponentType {
            name: "collapse".into(),
            tag: "div".into(),
            classes: ManagedClassSpec::new(
                ClassList::parse("accordion-item"),
                vec![ClassList::parse("border-0")],
            )?,
            traits: vec![
                TraitSpec::text("title").with_default("Section title"),
                TraitSpec::behavior("open", TraitKind::Checkbox).with_default(false),
                TraitSpec::behavior("accordion", TraitKind::Text),
                TraitSpec::toggle("flush", "border-0"),
            ],
            template: COLLAPSE_TEMPLATE.to_owned(),
            widget: Some("collapse"),
        },
        ComponentType {
            name: "card".into(),
            tag: "div".into(),
            classes: ManagedClassSpec::new(
                ClassList::parse("card"),
                vec![
                    ClassList::parse("shadow-sm shadow shadow-lg"),
                    ClassList::parse("text-bg-primary text-bg-secondary text-bg-dark text-bg-light"),
                ],
            )?,
            traits: vec![
                TraitSpec::text("title").with_default("Card title"),
                TraitSpec::select("shadow", 0).with_default("shadow-sm"),
                TraitSpec::select("color", 1).with_default(""),
            ],
            template: CARD_TEMPLATE.to_owned(),
            widget: None,
        },
    ])
}
