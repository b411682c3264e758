use super::*;
use vdom_app_shell::{default_document, AppShell};
use vdom_core::{AppConfig, Document, NodeId};

fn shell() -> AppShell<TodoState> {
    let config = AppConfig::new("#app", TodoState::default(), view).actions(actions());
    let mut shell = AppShell::new(default_document().unwrap(), config).unwrap();
    shell.run_until_idle().unwrap();
    shell
}

fn task_titles(shell: &AppShell<TodoState>) -> Vec<String> {
    let document = shell.document();
    document
        .query_selector_all("li")
        .into_iter()
        .map(|li| {
            let text = document.children(li)[1];
            document.text(text).unwrap().to_owned()
        })
        .collect()
}

fn notification_style(shell: &AppShell<TodoState>) -> String {
    let document = shell.document();
    let p = document.query_selector(".notification").unwrap();
    document
        .element(p)
        .unwrap()
        .attribute("style")
        .unwrap()
        .to_owned()
}

fn input_node(shell: &AppShell<TodoState>) -> NodeId {
    shell.document().query_selector(".input").unwrap()
}

#[test]
fn starts_with_two_tasks() {
    let shell = shell();
    assert_eq!(
        task_titles(&shell),
        vec!["virtual dom", "understand it completely"]
    );
    assert_eq!(notification_style(&shell), "display: none");
}

#[test]
fn validate_returns_a_boolean() {
    let shell = shell();
    assert_eq!(
        shell.dispatch("validate", &[ActionValue::from("ab")]).unwrap(),
        ActionValue::Bool(false)
    );
    assert_eq!(
        shell.dispatch("validate", &[ActionValue::from("abc")]).unwrap(),
        ActionValue::Bool(true)
    );
    assert_eq!(
        shell
            .dispatch("validate", &[ActionValue::from("x".repeat(21))])
            .unwrap(),
        ActionValue::Bool(false)
    );
}

#[test]
fn typing_a_short_title_shows_the_error() {
    let mut shell = shell();
    let input = input_node(&shell);

    shell.input(".input", "ab").unwrap();
    shell.run_until_idle().unwrap();
    assert_eq!(notification_style(&shell), "display: block");
    assert_eq!(input_node(&shell), input, "input keeps its identity");

    shell.input(".input", "abc").unwrap();
    shell.run_until_idle().unwrap();
    assert_eq!(notification_style(&shell), "display: none");
}

#[test]
fn create_appends_and_clears_the_field() {
    let mut shell = shell();
    let input = input_node(&shell);

    shell.input(".input", "write tests").unwrap();
    shell.run_until_idle().unwrap();
    shell.click(".button").unwrap();
    shell.run_until_idle().unwrap();

    assert_eq!(
        task_titles(&shell),
        vec!["virtual dom", "understand it completely", "write tests"]
    );
    let document = shell.document();
    assert_eq!(document.element(input).unwrap().value(), Some(""));
}

#[test]
fn invalid_title_is_not_created() {
    let mut shell = shell();
    shell.input(".input", "no").unwrap();
    shell.click(".button").unwrap();
    shell.run_until_idle().unwrap();

    assert_eq!(task_titles(&shell).len(), 2);
    assert_eq!(notification_style(&shell), "display: block");
}

#[test]
fn removing_the_first_task_shifts_rows() {
    let mut shell = shell();
    let rows = shell.document().query_selector_all("li");

    shell.click_nth(".delete", 0).unwrap();
    shell.run_until_idle().unwrap();

    assert_eq!(task_titles(&shell), vec!["understand it completely"]);
    let document = shell.document();
    assert_eq!(document.query_selector_all("li"), vec![rows[0]]);
    assert!(!document.contains(rows[1]));
}

#[test]
fn remove_out_of_range_is_ignored() {
    let mut shell = shell();
    shell
        .dispatch("removeTask", &[ActionValue::from(9)])
        .unwrap();
    shell.run_until_idle().unwrap();
    assert_eq!(task_titles(&shell).len(), 2);
}
