use std::io;
use std::process::ExitCode;

use vdom_app_shell::{default_document, AppShell};
use vdom_core::AppConfig;

mod todo;

fn main() -> ExitCode {
    env_logger::init();

    println!("=== Vdom-RS Todo Example ===");
    println!("Commands:");
    println!("  input .input <title>   -> type a task title (3 to 20 characters)");
    println!("  click .button          -> create the task");
    println!("  click .delete <n>      -> remove the n-th task");
    println!("  html | tree | quit");
    println!();

    let document = match default_document() {
        Ok(document) => document,
        Err(err) => {
            log::error!("failed to build document: {err}");
            return ExitCode::FAILURE;
        }
    };
    let config =
        AppConfig::new("#app", todo::TodoState::default(), todo::view).actions(todo::actions());
    let mut shell = match AppShell::new(document, config) {
        Ok(shell) => shell,
        Err(err) => {
            log::error!("failed to mount app: {err}");
            return ExitCode::FAILURE;
        }
    };

    let stdin = io::stdin();
    if let Err(err) = shell.run_script(stdin.lock(), io::stdout()) {
        log::error!("shell stopped: {err}");
        shell.log_debug_info();
        return ExitCode::FAILURE;
    }
    ExitCode::SUCCESS
}
