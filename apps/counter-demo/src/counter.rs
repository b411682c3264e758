use vdom_core::{h, ActionTree, ActionValue, Actions, Attributes, VNode};

#[derive(Debug, Default)]
pub struct CounterState {
    pub count: i64,
}

pub fn actions() -> ActionTree<CounterState> {
    ActionTree::new()
        .with("increment", |state: &mut CounterState, _: &[ActionValue]| {
            state.count += 1
        })
        .with("decrement", |state: &mut CounterState, _: &[ActionValue]| {
            state.count -= 1
        })
}

pub fn view(state: &CounterState, actions: &Actions<CounterState>) -> VNode {
    h!(
        "div",
        None,
        h!("p", None, state.count),
        button(actions, "increment", "count up"),
        button(actions, "decrement", "count down"),
    )
}

fn button(actions: &Actions<CounterState>, action: &'static str, label: &str) -> VNode {
    let actions = actions.clone();
    h(
        "button",
        Attributes::new().attr("type", "button").on("click", move |_| {
            if let Err(err) = actions.call(action, &[]) {
                log::error!("{action} failed: {err}");
            }
        }),
        [label],
    )
}

#[cfg(test)]
#[path = "tests/counter_tests.rs"]
mod tests;
