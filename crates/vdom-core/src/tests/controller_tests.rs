use super::*;
use std::sync::Arc;

use crate::document::MemoryDocument;
use crate::event::Event;
use crate::runtime::{Runtime, TestScheduler};
use crate::vnode::{h, Attributes};

struct Harness {
    runtime: Runtime,
    scheduler: Arc<TestScheduler>,
    document: Rc<RefCell<MemoryDocument>>,
    mount: NodeId,
}

fn harness() -> Harness {
    let scheduler = Arc::new(TestScheduler::default());
    let runtime = Runtime::new(scheduler.clone());
    let mut document = MemoryDocument::new();
    let body = document.root();
    let mount = document.create_element("div").expect("div");
    document.set_attribute(mount, "id", "app").expect("id");
    document.append_child(body, mount).expect("attach");
    document.take_mutations();
    Harness {
        runtime,
        scheduler,
        document: Rc::new(RefCell::new(document)),
        mount,
    }
}

fn counter(state: &i32, actions: &Actions<i32>) -> VNode {
    let up = actions.clone();
    crate::h!(
        "div",
        None,
        crate::h!("p", None, *state),
        crate::h!(
            "button",
            Attributes::new().attr("id", "up").on("click", move |_| {
                let _ = up.call("up", &[]);
            }),
            "+"
        ),
    )
}

fn counter_actions() -> ActionTree<i32> {
    ActionTree::new()
        .with("up", |count: &mut i32, _: &[ActionValue]| *count += 1)
        .with("down", |count: &mut i32, _: &[ActionValue]| *count -= 1)
        .with("add", |count: &mut i32, args: &[ActionValue]| {
            let step = args.first().and_then(ActionValue::as_number).unwrap_or(0.0);
            *count += step as i32;
            *count
        })
}

fn mount_counter(env: &Harness) -> App<i32, MemoryDocument> {
    let config = AppConfig::new("#app", 0, counter).actions(counter_actions());
    App::mount(config, env.document.clone(), env.runtime.handle()).expect("mount")
}

fn click(document: &Rc<RefCell<MemoryDocument>>, selector: &str) {
    let (target, handlers) = {
        let document = document.borrow();
        let target = document.query_selector(selector).expect("target");
        (target, document.listeners(target, "click"))
    };
    for handler in handlers {
        handler.call(&Event::new("click", target));
    }
}

#[test]
fn first_render_is_deferred_to_the_next_tick() {
    let env = harness();
    let app = mount_counter(&env);

    assert_eq!(app.phase(), RenderPhase::Pending);
    assert_eq!(env.scheduler.ticks(), 1);
    assert_eq!(env.document.borrow().inner_html(env.mount), "");

    env.runtime.drain_tasks();
    assert_eq!(app.phase(), RenderPhase::Idle);
    assert_eq!(app.render_count(), 1);
    assert_eq!(
        env.document.borrow().inner_html(env.mount),
        r#"<div><p>0</p><button id="up">+</button></div>"#
    );
}

#[test]
fn click_updates_counter() {
    let env = harness();
    let app = mount_counter(&env);
    env.runtime.drain_tasks();

    click(&env.document, "#up");
    assert!(app.is_render_pending());
    env.runtime.drain_tasks();

    let document = env.document.borrow();
    let p = document.query_selector("p").expect("p");
    assert_eq!(document.text_content(p), "1");
}

#[test]
fn actions_in_one_tick_coalesce_into_one_render() {
    let env = harness();
    let app = mount_counter(&env);
    env.runtime.drain_tasks();
    let before = app.render_count();

    for _ in 0..3 {
        app.dispatch("up", &[]).expect("dispatch");
    }
    assert_eq!(env.runtime.drain_tasks(), 1);
    assert_eq!(app.render_count(), before + 1);

    let document = env.document.borrow();
    let p = document.query_selector("p").expect("p");
    assert_eq!(document.text_content(p), "3");
}

#[test]
fn increment_twice_then_decrement_reads_one() {
    let env = harness();
    let app = mount_counter(&env);
    env.runtime.drain_tasks();

    app.dispatch("up", &[]).expect("up");
    app.dispatch("up", &[]).expect("up");
    app.dispatch("down", &[]).expect("down");
    env.runtime.drain_tasks();

    let document = env.document.borrow();
    let p = document.query_selector("p").expect("p");
    let text = document.children(p)[0];
    assert_eq!(document.text(text), Some("1"));
}

#[test]
fn action_result_is_returned_unchanged() {
    let env = harness();
    let app = mount_counter(&env);

    let result = app.dispatch("add", &[ActionValue::from(5)]).expect("dispatch");
    assert_eq!(result, ActionValue::Number(5.0));
    assert_eq!(app.dispatch("up", &[]), Ok(ActionValue::Unit));
}

#[test]
fn unknown_action_is_an_error() {
    let env = harness();
    let app = mount_counter(&env);
    assert_eq!(
        app.dispatch("reset", &[]),
        Err(ControllerError::UnknownAction {
            name: "reset".to_owned()
        })
    );
}

#[test]
fn missing_mount_target_fails() {
    let env = harness();
    let config = AppConfig::new("#nowhere", 0, counter);
    let err = App::mount(config, env.document.clone(), env.runtime.handle())
        .err()
        .expect("mount must fail");
    assert_eq!(
        err,
        ControllerError::MountTargetNotFound {
            selector: "#nowhere".to_owned()
        }
    );
    assert!(!env.runtime.has_pending_tasks());
}

#[test]
fn mount_by_node_id() {
    let env = harness();
    let config = AppConfig::new(env.mount, 7, counter);
    let app = App::mount(config, env.document.clone(), env.runtime.handle()).expect("mount");
    env.runtime.drain_tasks();
    assert_eq!(app.mount_node(), env.mount);
    let root = app.root_node().expect("rendered root");
    assert_eq!(env.document.borrow().parent(root), Some(env.mount));
}

#[test]
fn existing_children_of_the_mount_are_left_alone() {
    let env = harness();
    let banner = {
        let mut document = env.document.borrow_mut();
        let banner = document.create_text("banner");
        document.append_child(env.mount, banner).expect("banner");
        banner
    };
    let app = mount_counter(&env);
    env.runtime.drain_tasks();
    app.dispatch("up", &[]).expect("dispatch");
    env.runtime.drain_tasks();

    let document = env.document.borrow();
    assert_eq!(document.children(env.mount)[0], banner);
    assert_eq!(document.child_at(env.mount, 1), Ok(app.root_node()));
    assert_eq!(
        document.inner_html(env.mount),
        r#"banner<div><p>1</p><button id="up">+</button></div>"#
    );
}

#[test]
fn focused_input_survives_rerender() {
    let env = harness();
    let view = |text: &String, actions: &Actions<String>| {
        let input = actions.clone();
        h(
            "div",
            None,
            [
                Child::from(h(
                    "input",
                    Attributes::new()
                        .attr("id", "field")
                        .attr("value", text.as_str())
                        .on("input", move |event: &Event| {
                            let value = event.value().unwrap_or_default().to_owned();
                            let _ = input.update(|text| *text = value);
                        }),
                    Vec::<Child>::new(),
                )),
                Child::from(h("p", None, [text.as_str()])),
            ],
        )
    };
    let app = App::mount(
        AppConfig::new("#app", String::new(), view),
        env.document.clone(),
        env.runtime.handle(),
    )
    .expect("mount");
    env.runtime.drain_tasks();

    let (input, handlers) = {
        let document = env.document.borrow();
        let input = document.query_selector("#field").expect("input");
        (input, document.listeners(input, "input"))
    };
    env.document
        .borrow_mut()
        .set_value(input, "hello")
        .expect("typing");
    for handler in handlers {
        handler.call(&Event::new("input", input).with_value("hello"));
    }
    env.runtime.drain_tasks();

    let document = env.document.borrow();
    assert_eq!(document.query_selector("#field"), Some(input));
    assert_eq!(document.element(input).unwrap().value(), Some("hello"));
    assert_eq!(document.text_content(app.root_node().unwrap()), "hello");
}

#[test]
fn actions_called_from_the_view_are_rejected() {
    let env = harness();
    let attempts = Rc::new(RefCell::new(Vec::new()));
    let sink = attempts.clone();
    let view = move |state: &i32, actions: &Actions<i32>| {
        if *state == 0 {
            sink.borrow_mut().push(actions.call("up", &[]));
        }
        h("p", None, [*state])
    };
    let _app = App::mount(
        AppConfig::new("#app", 0, view).actions(counter_actions()),
        env.document.clone(),
        env.runtime.handle(),
    )
    .expect("mount");

    assert_eq!(*attempts.borrow(), vec![Err(ControllerError::StateBusy)]);
}

#[test]
fn render_failure_moves_to_failed_phase() {
    let env = harness();
    let view = |broken: &bool, _: &Actions<bool>| {
        let tag = if *broken { "not a tag" } else { "p" };
        h(tag, None, ["x"])
    };
    let app = App::mount(
        AppConfig::new("#app", false, view)
            .actions(ActionTree::new().with("break", |broken: &mut bool, _: &[ActionValue]| {
                *broken = true
            })),
        env.document.clone(),
        env.runtime.handle(),
    )
    .expect("mount");
    env.runtime.drain_tasks();

    app.dispatch("break", &[]).expect("dispatch");
    env.runtime.drain_tasks();
    assert_eq!(app.phase(), RenderPhase::Failed);
    assert_eq!(
        app.take_render_error(),
        Some(NodeError::InvalidTag {
            tag: "not a tag".to_owned()
        })
    );

    app.dispatch("break", &[]).expect("dispatch");
    assert!(!env.runtime.has_pending_tasks(), "failed pipeline stays idle");
    assert_eq!(app.render_count(), 1);
}

#[test]
fn dropped_app_detaches_actions() {
    let env = harness();
    let app = mount_counter(&env);
    let actions = app.actions();
    drop(app);
    env.runtime.drain_tasks();
    assert_eq!(actions.call("up", &[]), Err(ControllerError::Detached));
}

#[test]
fn action_value_conversions() {
    assert_eq!(ActionValue::from(3).as_index(), Some(3));
    assert_eq!(ActionValue::from(1.5).as_index(), None);
    assert_eq!(ActionValue::from(-1).as_index(), None);
    assert_eq!(ActionValue::from("x").as_str(), Some("x"));
    assert_eq!(ActionValue::from(true).as_bool(), Some(true));
    assert_eq!(ActionValue::from(()), ActionValue::Unit);
}

#[test]
fn reading_state_does_not_schedule_a_render() {
    let env = harness();
    let app = mount_counter(&env);
    env.runtime.drain_tasks();
    app.dispatch("add", &[ActionValue::from(4)]).expect("dispatch");
    env.runtime.drain_tasks();

    let actions = app.actions();
    assert_eq!(actions.state(|count| *count), Ok(4));
    assert!(!env.runtime.has_pending_tasks());
    assert_eq!(app.phase(), RenderPhase::Idle);
}
