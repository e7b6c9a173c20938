//! Script loading across concurrent callers.

use std::cell::RefCell;
use std::rc::Rc;

use futures::executor::LocalPool;
use futures::task::LocalSpawnExt;
use vitrail_cadre::{AssetLoader, AssetResolution, AssetSpec, Event, Frame, LOADED_FLAG};
use vitrail_carton::Size;

struct Library {
    version: &'static str,
}

fn asset() -> AssetSpec {
    AssetSpec::new("widgets", "https://cdn.example/widgets.js", "widgets-script")
}

fn probe(frame: &Frame) -> Option<Rc<Library>> {
    frame.global::<Library>("widgets")
}

fn frame() -> Frame {
    Frame::new(Size::new(1280.0, 720.0))
}

type Results = Rc<RefCell<Vec<AssetResolution<Rc<Library>>>>>;

fn spawn_callers(pool: &LocalPool, loader: &Rc<AssetLoader>, frame: &Frame, n: usize) -> Results {
    let results: Results = Rc::new(RefCell::new(Vec::new()));
    for _ in 0..n {
        let loader = loader.clone();
        let frame = frame.clone();
        let results = results.clone();
        pool.spawner()
            .spawn_local(async move {
                let resolution = loader.resolve(&frame, &asset(), probe).await;
                results.borrow_mut().push(resolution);
            })
            .unwrap();
    }
    results
}

#[test]
fn concurrent_callers_share_one_script() {
    for n in [1, 2, 5, 20] {
        let mut pool = LocalPool::new();
        let loader = Rc::new(AssetLoader::new());
        let frame = frame();
        let results = spawn_callers(&pool, &loader, &frame, n);

        pool.run_until_stalled();
        assert!(results.borrow().is_empty());
        let scripts = frame.elements_with_id("widgets-script");
        assert_eq!(scripts.len(), 1);
        assert_eq!(loader.injected_count(), 1);
        assert_eq!(frame.parent(scripts[0]), Some(frame.head()));

        // The script runs and installs its global, then the load event fires.
        frame
            .set_global("widgets", Rc::new(Library { version: "5.3" }))
            .unwrap();
        frame.dispatch(Event::load(scripts[0]));
        pool.run_until_stalled();

        let results = results.borrow();
        assert_eq!(results.len(), n);
        let first = match &results[0] {
            AssetResolution::Ready(library) => library.clone(),
            _ => panic!("expected the library to be ready"),
        };
        assert_eq!(first.version, "5.3");
        for result in results.iter() {
            match result {
                AssetResolution::Ready(library) => assert!(Rc::ptr_eq(library, &first)),
                _ => panic!("every caller must see the same library"),
            }
        }
    }
}

#[test]
fn two_callers_resolve_on_load() {
    let mut pool = LocalPool::new();
    let loader = Rc::new(AssetLoader::new());
    let frame = frame();
    let results = spawn_callers(&pool, &loader, &frame, 2);
    pool.run_until_stalled();

    let script = frame.element_by_id("widgets-script").unwrap();
    assert_eq!(frame.attribute(script, "src").as_deref(), Some("https://cdn.example/widgets.js"));
    frame.set_global("widgets", Rc::new(Library { version: "1" })).unwrap();
    frame.dispatch(Event::load(script));
    pool.run_until_stalled();

    assert_eq!(results.borrow().len(), 2);
    assert!(results.borrow().iter().all(AssetResolution::is_ready));
    assert_eq!(frame.attribute(script, LOADED_FLAG).as_deref(), Some("true"));
}

#[test]
fn error_event_resolves_every_caller_to_none() {
    let mut pool = LocalPool::new();
    let loader = Rc::new(AssetLoader::new());
    let frame = frame();
    let results = spawn_callers(&pool, &loader, &frame, 3);
    pool.run_until_stalled();

    let script = frame.element_by_id("widgets-script").unwrap();
    frame.dispatch(Event::error(script));
    pool.run_until_stalled();

    let results = results.borrow();
    assert_eq!(results.len(), 3);
    assert!(results
        .iter()
        .all(|result| matches!(result, AssetResolution::LoadFailed)));
}

#[test]
fn load_without_global_is_reported_as_missing() {
    let mut pool = LocalPool::new();
    let loader = Rc::new(AssetLoader::new());
    let frame = frame();
    let results = spawn_callers(&pool, &loader, &frame, 1);
    pool.run_until_stalled();

    let script = frame.element_by_id("widgets-script").unwrap();
    frame.dispatch(Event::load(script));
    pool.run_until_stalled();

    assert!(matches!(results.borrow()[0], AssetResolution::MissingGlobal));
}

#[test]
fn probe_hit_creates_no_script() {
    let loader = AssetLoader::new();
    let frame = frame();
    frame.set_global("widgets", Rc::new(Library { version: "reused" })).unwrap();

    let library = futures::executor::block_on(loader.ensure(&frame, &asset(), probe));
    assert_eq!(library.map(|l| l.version), Some("reused"));
    assert!(frame.elements_with_id("widgets-script").is_empty());
    assert_eq!(loader.injected_count(), 0);
}

#[test]
fn joins_script_injected_by_another_code_path() {
    let mut pool = LocalPool::new();
    let loader = Rc::new(AssetLoader::new());
    let frame = frame();
    let foreign = frame.append_new(frame.head(), "script").unwrap();
    frame.set_attribute(foreign, "id", "widgets-script").unwrap();

    let results = spawn_callers(&pool, &loader, &frame, 2);
    pool.run_until_stalled();
    assert_eq!(loader.injected_count(), 0);
    assert_eq!(frame.elements_with_id("widgets-script"), vec![foreign]);

    frame.set_global("widgets", Rc::new(Library { version: "x" })).unwrap();
    frame.dispatch(Event::load(foreign));
    pool.run_until_stalled();
    assert!(results.borrow().iter().all(AssetResolution::is_ready));
}

#[test]
fn already_loaded_script_resolves_through_probe() {
    let loader = AssetLoader::new();
    let frame = frame();
    let script = frame.append_new(frame.head(), "script").unwrap();
    frame.set_attribute(script, "id", "widgets-script").unwrap();
    frame.set_attribute(script, LOADED_FLAG, "true").unwrap();

    let resolution = futures::executor::block_on(loader.resolve(&frame, &asset(), probe));
    assert!(matches!(resolution, AssetResolution::MissingGlobal));
    assert_eq!(frame.elements_with_id("widgets-script").len(), 1);
}

#[test]
fn detached_frame_resolves_as_detached() {
    let mut pool = LocalPool::new();
    let loader = Rc::new(AssetLoader::new());
    let frame = frame();
    let results = spawn_callers(&pool, &loader, &frame, 2);
    pool.run_until_stalled();

    frame.detach();
    pool.run_until_stalled();
    assert!(results
        .borrow()
        .iter()
        .all(|result| matches!(result, AssetResolution::Detached)));

    let late = futures::executor::block_on(loader.resolve(&frame, &asset(), probe));
    assert!(matches!(late, AssetResolution::Detached));
}

#[test]
fn separate_frames_get_separate_scripts() {
    let mut pool = LocalPool::new();
    let loader = Rc::new(AssetLoader::new());
    let first = frame();
    let second = frame();
    spawn_callers(&pool, &loader, &first, 2);
    spawn_callers(&pool, &loader, &second, 2);
    pool.run_until_stalled();

    assert_eq!(loader.injected_count(), 2);
    assert_eq!(first.elements_with_id("widgets-script").len(), 1);
    assert_eq!(second.elements_with_id("widgets-script").len(), 1);
    assert_eq!(loader.pending_count(), 2);
}
