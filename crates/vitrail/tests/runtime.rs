//! End-to-end wiring of the per-editor runtime.

use std::cell::RefCell;
use std::rc::Rc;
use std::time::Duration;

use futures::executor::block_on;
use serde_json::Value;
use vitrail::atelier::{BindOutcome, LibraryHandle, WidgetInstance, WidgetLibrary};
use vitrail::cadre::{ElementRef, Event, Frame};
use vitrail::carton::Size;
use vitrail::musea::HoverPhase;
use vitrail::{
    load_config_from_str, ComponentBinding, ConfigError, ManualScheduler, Runtime, RuntimeConfig,
    RuntimeError,
};

struct NoopWidget;

impl WidgetInstance for NoopWidget {
    fn dispose(&self) {}
}

#[derive(Default)]
struct RecordingLibrary {
    options: RefCell<Vec<Value>>,
}

impl WidgetLibrary for RecordingLibrary {
    fn construct(
        &self,
        _kind: &str,
        _element: &ElementRef,
        options: &Value,
    ) -> Option<Rc<dyn WidgetInstance>> {
        self.options.borrow_mut().push(options.clone());
        Some(Rc::new(NoopWidget))
    }

    fn instance(&self, _kind: &str, _element: &ElementRef) -> Option<Rc<dyn WidgetInstance>> {
        None
    }
}

fn frame() -> Frame {
    Frame::new(Size::new(1280.0, 720.0))
}

fn runtime(config: RuntimeConfig) -> (Runtime, Rc<ManualScheduler>) {
    let scheduler = Rc::new(ManualScheduler::new());
    let runtime = Runtime::new(config, scheduler.clone()).unwrap();
    (runtime, scheduler)
}

#[test]
fn carousel_falls_back_to_the_configured_interval() {
    let config = load_config_from_str(r#"{ "widgets": { "carouselIntervalMs": 2500 } }"#).unwrap();
    let (runtime, _) = runtime(config);

    let frame = frame();
    let library = Rc::new(RecordingLibrary::default());
    LibraryHandle::install(&frame, &runtime.asset().name, library.clone()).unwrap();

    let mut component = runtime.instantiate("carousel").unwrap();
    component.attributes.set("interval", "soon");
    let node = frame.append_new(frame.body(), "div").unwrap();
    let template = &runtime.registry().get("carousel").unwrap().template;
    frame.set_markup(node, template.as_str()).unwrap();

    let binding = runtime.carousel_binding(component);
    let outcome = block_on(binding.render(ElementRef::new(frame.clone(), node))).unwrap();

    assert_eq!(outcome, BindOutcome::Bound);
    assert_eq!(library.options.borrow().len(), 1);
    assert_eq!(library.options.borrow()[0]["interval"], 2500);
    assert_eq!(runtime.loader().injected_count(), 0);
}

#[test]
fn runtimes_keep_separate_load_registries() {
    let (first, _) = runtime(RuntimeConfig::default());
    let (second, _) = runtime(RuntimeConfig::default());
    assert!(!Rc::ptr_eq(first.loader(), second.loader()));

    let frame = frame();
    let _first = first.loader().token(&frame, first.asset()).unwrap();
    let _second = second.loader().token(&frame, second.asset()).unwrap();

    assert_eq!(first.loader().injected_count(), 1);
    assert_eq!(second.loader().injected_count(), 0);
    assert_eq!(first.loader().tracked_count(), 1);
    assert_eq!(second.loader().tracked_count(), 1);
    assert_eq!(frame.elements_with_id(&first.asset().element_id).len(), 1);
}

#[test]
fn hover_engine_uses_configured_delay_and_current_catalog() {
    let config = load_config_from_str(r#"{ "hover": { "delayMs": 450 } }"#).unwrap();
    let (runtime, scheduler) = runtime(config);

    let palette = frame();
    let container = palette.append_new(palette.body(), "div").unwrap();
    palette.set_attribute(container, "class", "blocks-container").unwrap();
    let entry = palette.append_new(container, "div").unwrap();
    palette.set_attribute(entry, "class", "block-entry").unwrap();
    palette.set_attribute(entry, "data-entry-id", "faq").unwrap();
    palette.set_text(entry, "FAQ").unwrap();

    let engine = runtime.hover_engine(palette.clone());
    assert_eq!(engine.phase(), HoverPhase::Idle);

    assert_eq!(
        runtime
            .load_catalog(r#"[{"id": "faq", "label": "FAQ", "kind": "collapse"}]"#)
            .unwrap(),
        1
    );

    palette.dispatch(Event::pointer_over(entry, None));
    scheduler.advance(Duration::from_millis(449));
    assert!(engine.tooltip().is_none());
    scheduler.advance(Duration::from_millis(1));

    let markup = palette.markup(engine.tooltip().unwrap()).unwrap();
    assert!(markup.contains("block-preview--collapse"), "{}", markup);
}

#[test]
fn invalid_config_is_rejected() {
    let config = RuntimeConfig {
        hover: vitrail::HoverConfig {
            preview_height: f64::NAN,
            ..Default::default()
        },
        ..Default::default()
    };
    let result = Runtime::new(config, Rc::new(ManualScheduler::new()));
    assert!(matches!(
        result,
        Err(RuntimeError::Config(ConfigError::Invalid { field: "hover.previewHeight", .. }))
    ));
}

#[test]
fn bind_dispatches_on_the_registered_widget_kind() {
    let (mut runtime, _) = runtime(RuntimeConfig::default());

    let carousel = runtime.bind(runtime.instantiate("carousel").unwrap()).unwrap();
    assert!(matches!(carousel, Some(ComponentBinding::Carousel(_))));
    let collapse = runtime.bind(runtime.instantiate("collapse").unwrap()).unwrap();
    assert_eq!(collapse.map(|binding| binding.kind()), Some("collapse"));
    assert!(runtime.bind(runtime.instantiate("card").unwrap()).unwrap().is_none());

    let mut tabs = runtime.registry().get("card").unwrap().clone();
    tabs.name = "tabs".into();
    tabs.widget = Some("tabs");
    runtime.registry_mut().register(tabs).unwrap();
    assert!(matches!(
        runtime.bind(runtime.instantiate("tabs").unwrap()),
        Err(RuntimeError::UnknownWidget { .. })
    ));
}

#[test]
fn bound_collapse_renders_through_the_dispatching_binding() {
    let (runtime, _) = runtime(RuntimeConfig::default());
    let frame = frame();
    let library = Rc::new(RecordingLibrary::default());
    LibraryHandle::install(&frame, &runtime.asset().name, library.clone()).unwrap();

    let node = frame.append_new(frame.body(), "div").unwrap();
    let binding = runtime
        .bind(runtime.instantiate("collapse").unwrap())
        .unwrap()
        .unwrap();
    let outcome = block_on(binding.render(ElementRef::new(frame.clone(), node))).unwrap();
    assert_eq!(outcome, BindOutcome::Bound);
    assert_eq!(library.options.borrow()[0], serde_json::json!({"toggle": false}));

    binding.remove();
    assert_eq!(binding.state(), vitrail::atelier::BindingState::Removed);
}
