use std::cell::RefCell;
use std::rc::Rc;

use vdom_core::{h, ActionTree, ActionValue, App, AppConfig, Document, MemoryDocument};

use super::{Settled, StdRuntime};

#[test]
fn spawned_task_raises_the_signal() {
    let runtime = StdRuntime::new();
    assert!(!runtime.has_work());

    let ran = Rc::new(RefCell::new(false));
    let flag = ran.clone();
    runtime
        .handle()
        .spawn_task(Box::new(move || *flag.borrow_mut() = true));

    assert!(runtime.signal().is_raised());
    assert_eq!(runtime.signal().requests(), 1);
    assert!(!*ran.borrow());

    assert_eq!(runtime.tick(), 1);
    assert!(*ran.borrow());
    assert!(!runtime.signal().is_raised());
    assert!(!runtime.has_work());
}

#[test]
fn requests_are_counted_while_the_signal_stays_raised() {
    let runtime = StdRuntime::new();
    let handle = runtime.handle();
    handle.spawn_task(Box::new(|| {}));
    handle.spawn_task(Box::new(|| {}));

    assert_eq!(runtime.signal().requests(), 2);
    assert!(runtime.signal().lower());
    assert!(!runtime.signal().lower(), "already lowered");
    assert!(runtime.has_work(), "tasks are still queued");
}

#[test]
fn settle_follows_tasks_spawned_by_tasks() {
    let runtime = StdRuntime::new();
    let handle = runtime.handle();
    let inner = handle.clone();
    handle.spawn_task(Box::new(move || inner.spawn_task(Box::new(|| {}))));

    let mut after = 0;
    let settled = runtime.settle(8, || {
        after += 1;
        Ok::<_, ()>(())
    });
    assert_eq!(settled, Ok(Settled::Idle { ticks: 2 }));
    assert_eq!(after, 2);
}

#[test]
fn settle_reports_a_busy_queue_and_stops_on_error() {
    fn respawn(handle: vdom_core::RuntimeHandle) {
        let next = handle.clone();
        handle.spawn_task(Box::new(move || respawn(next)));
    }

    let runtime = StdRuntime::new();
    respawn(runtime.handle());
    assert_eq!(runtime.settle(3, || Ok::<_, ()>(())), Ok(Settled::Busy));
    assert_eq!(runtime.settle(3, || Err("render failed")), Err("render failed"));
}

#[test]
fn std_runtime_requests_tick_and_rerenders_on_action() {
    let runtime = StdRuntime::new();
    let document = Rc::new(RefCell::new(MemoryDocument::new()));
    let body = document.borrow().root();

    let config = AppConfig::new(body, 0, |count: &i32, _| h("p", None, [*count]))
        .actions(ActionTree::new().with("up", |count: &mut i32, _: &[ActionValue]| *count += 1));
    let app = App::mount(config, document.clone(), runtime.handle()).expect("mount");

    assert!(runtime.has_work(), "mount should request a tick");
    runtime.tick();
    assert_eq!(document.borrow().inner_html(body), "<p>0</p>");

    app.dispatch("up", &[]).expect("dispatch");
    assert!(runtime.signal().is_raised(), "an action should request a tick");
    runtime.tick();
    assert_eq!(document.borrow().inner_html(body), "<p>1</p>");
    assert_eq!(document.borrow().child_count(body), Ok(1));
}
