use vdom_core::{h, ActionTree, ActionValue, Actions, Attributes, Child, Event, VNode};

const MIN_TITLE_CHARS: usize = 3;
const MAX_TITLE_CHARS: usize = 20;

#[derive(Debug, Default)]
pub struct Form {
    pub input: String,
    pub has_error: bool,
}

#[derive(Debug)]
pub struct TodoState {
    pub tasks: Vec<String>,
    pub form: Form,
}

impl Default for TodoState {
    fn default() -> Self {
        Self {
            tasks: vec!["virtual dom".to_owned(), "understand it completely".to_owned()],
            form: Form::default(),
        }
    }
}

pub fn actions() -> ActionTree<TodoState> {
    ActionTree::new()
        .with("validate", |state: &mut TodoState, args: &[ActionValue]| {
            let input = args.first().and_then(ActionValue::as_str).unwrap_or_default();
            let len = input.chars().count();
            state.form.has_error = !(MIN_TITLE_CHARS..=MAX_TITLE_CHARS).contains(&len);
            !state.form.has_error
        })
        .with("createTask", |state: &mut TodoState, args: &[ActionValue]| {
            if let Some(title) = args.first().and_then(ActionValue::as_str) {
                state.tasks.push(title.to_owned());
                state.form.input.clear();
            }
        })
        .with("removeTask", |state: &mut TodoState, args: &[ActionValue]| {
            match args.first().and_then(ActionValue::as_index) {
                Some(index) if index < state.tasks.len() => {
                    state.tasks.remove(index);
                }
                _ => log::warn!("removeTask called with {args:?}"),
            }
        })
}

pub fn view(state: &TodoState, actions: &Actions<TodoState>) -> VNode {
    let display = if state.form.has_error { "block" } else { "none" };
    h!(
        "div",
        Attributes::new().attr("style", "padding: 20px;"),
        h!(
            "div",
            Attributes::new().attr("class", "field"),
            h!("label", Attributes::new().attr("class", "label"), "Task Title"),
            title_input(state, actions),
            create_button(actions),
            h!(
                "p",
                Attributes::new()
                    .attr("class", "notification")
                    .attr("style", format!("display: {display}")),
                "Enter 3 to 20 characters"
            ),
        ),
        h(
            "ul",
            Attributes::new().attr("class", "panel"),
            state
                .tasks
                .iter()
                .enumerate()
                .map(|(index, task)| task_row(actions, index, task)),
        ),
    )
}

fn title_input(state: &TodoState, actions: &Actions<TodoState>) -> VNode {
    let actions = actions.clone();
    h(
        "input",
        Attributes::new()
            .attr("type", "text")
            .attr("class", "input")
            .attr("style", "width: 200px;")
            .attr("value", state.form.input.as_str())
            .on("input", move |event: &Event| {
                let text = event.value().unwrap_or_default().to_owned();
                let stored = text.clone();
                let result = actions
                    .update(move |state| state.form.input = stored)
                    .and_then(|_| actions.call("validate", &[ActionValue::Text(text)]));
                if let Err(err) = result {
                    log::error!("input handler failed: {err}");
                }
            }),
        Vec::<Child>::new(),
    )
}

fn create_button(actions: &Actions<TodoState>) -> VNode {
    let actions = actions.clone();
    h(
        "button",
        Attributes::new()
            .attr("type", "button")
            .attr("class", "button is-primary")
            .attr("style", "margin-left: 10px;")
            .on("click", move |_| {
                let result = actions
                    .state(|state| ActionValue::Text(state.form.input.clone()))
                    .and_then(|input| {
                        let valid = actions.call("validate", &[input.clone()])?;
                        if valid.as_bool() == Some(true) {
                            actions.call("createTask", &[input])?;
                        }
                        Ok(())
                    });
                if let Err(err) = result {
                    log::error!("create handler failed: {err}");
                }
            }),
        ["create"],
    )
}

fn task_row(actions: &Actions<TodoState>, index: usize, task: &str) -> VNode {
    let actions = actions.clone();
    h!(
        "li",
        Attributes::new().attr("class", "panel-block"),
        h(
            "button",
            Attributes::new()
                .attr("type", "button")
                .attr("class", "delete")
                .attr("style", "margin-right: 10px;")
                .on("click", move |_| {
                    if let Err(err) = actions.call("removeTask", &[ActionValue::from(index)]) {
                        log::error!("remove handler failed: {err}");
                    }
                }),
            ["remove"],
        ),
        task,
    )
}

#[cfg(test)]
#[path = "tests/todo_tests.rs"]
mod tests;
