use std::io;
use std::process::ExitCode;

use vdom_app_shell::{default_document, AppShell};
use vdom_core::AppConfig;

mod counter;

fn main() -> ExitCode {
    env_logger::init();

    println!("=== Vdom-RS Counter Example ===");
    println!("Commands: click button [n], html, tree, quit");
    println!("  click button 0   -> count up");
    println!("  click button 1   -> count down");
    println!();

    let document = match default_document() {
        Ok(document) => document,
        Err(err) => {
            log::error!("failed to build document: {err}");
            return ExitCode::FAILURE;
        }
    };
    let config = AppConfig::new("#app", counter::CounterState::default(), counter::view)
        .actions(counter::actions());
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
