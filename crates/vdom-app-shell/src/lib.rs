use std::cell::{Ref, RefCell};
use std::io::{BufRead, Write};
use std::rc::Rc;

use vdom_core::{
    ActionValue, App, AppConfig, ControllerError, Event, MemoryDocument, NodeError, NodeId,
};
use vdom_runtime_std::StdRuntime;

mod command;

pub use command::ShellCommand;

/// Upper bound on ticks run by [`AppShell::run_until_idle`]; a render never
/// enqueues another task, so settling takes a handful at most.
const MAX_TICKS_PER_SETTLE: usize = 64;

#[derive(Debug, thiserror::Error)]
pub enum ShellError {
    #[error("no element matches `{selector}`")]
    NoMatch { selector: String },
    #[error("unrecognized command `{line}`")]
    Command { line: String },
    #[error("render failed: {0}")]
    Render(NodeError),
    #[error("document error: {0}")]
    Document(#[from] NodeError),
    #[error(transparent)]
    Controller(#[from] ControllerError),
    #[error(transparent)]
    Io(#[from] std::io::Error),
}

/// Host loop around one mounted [`App`] rendering into a [`MemoryDocument`].
pub struct AppShell<S: 'static> {
    runtime: StdRuntime,
    document: Rc<RefCell<MemoryDocument>>,
    app: App<S, MemoryDocument>,
}

impl<S: 'static> AppShell<S> {
    pub fn new(document: MemoryDocument, config: AppConfig<S>) -> Result<Self, ShellError> {
        let runtime = StdRuntime::new();
        let document = Rc::new(RefCell::new(document));
        let app = App::mount(config, Rc::clone(&document), runtime.handle())?;
        Ok(Self {
            runtime,
            document,
            app,
        })
    }

    pub fn should_render(&self) -> bool {
        self.runtime.has_work()
    }

    /// Runs one tick of deferred work. Surfaces a render failure raised
    /// during that tick.
    pub fn update(&mut self) -> Result<usize, ShellError> {
        let ran = self.runtime.tick();
        finish_tick(&self.document, &self.app)?;
        Ok(ran)
    }

    pub fn run_until_idle(&mut self) -> Result<(), ShellError> {
        let (document, app) = (&self.document, &self.app);
        self.runtime
            .settle(MAX_TICKS_PER_SETTLE, || finish_tick(document, app))?;
        self.document.borrow_mut().take_mutations();
        Ok(())
    }

    /// Tick requests raised so far; coalesced renders raise one per tick.
    pub fn tick_requests(&self) -> usize {
        self.runtime.signal().requests()
    }

    pub fn dispatch(&self, name: &str, args: &[ActionValue]) -> Result<ActionValue, ShellError> {
        Ok(self.app.dispatch(name, args)?)
    }

    /// Calls every `kind` listener of `target`. Returns how many ran.
    pub fn fire_event(&self, target: NodeId, kind: &str, value: Option<&str>) -> usize {
        let mut event = Event::new(kind, target);
        if let Some(value) = value {
            event = event.with_value(value);
        }
        MemoryDocument::dispatch_event(&self.document, &event)
    }

    pub fn click(&self, selector: &str) -> Result<(), ShellError> {
        self.click_nth(selector, 0)
    }

    /// Clicks the `index`-th element matching `selector`, in document order.
    pub fn click_nth(&self, selector: &str, index: usize) -> Result<(), ShellError> {
        let target = self.find_nth(selector, index)?;
        self.fire_event(target, "click", None);
        Ok(())
    }

    /// Types `text` into the input matching `selector`: the live value is
    /// replaced first, then `input` fires with it.
    pub fn input(&self, selector: &str, text: &str) -> Result<(), ShellError> {
        let target = self.find_nth(selector, 0)?;
        MemoryDocument::type_into(&self.document, target, text)?;
        Ok(())
    }

    /// Runs one parsed command and returns its printable output, if any.
    pub fn execute(&mut self, command: &ShellCommand) -> Result<Option<String>, ShellError> {
        match command {
            ShellCommand::Click { selector, index } => self.click_nth(selector, *index)?,
            ShellCommand::Input { selector, text } => self.input(selector, text)?,
            ShellCommand::Dispatch { action, args } => {
                let value = self.dispatch(action, args)?;
                self.run_until_idle()?;
                return Ok(Some(format!("{value:?}")));
            }
            ShellCommand::Html => return Ok(Some(self.html())),
            ShellCommand::Tree => {
                let document = self.document.borrow();
                return Ok(Some(document.dump_tree(self.app.root_node())));
            }
            ShellCommand::Quit => return Ok(None),
        }
        self.run_until_idle()?;
        Ok(None)
    }

    /// Reads commands line by line until `quit` or end of input. After every
    /// command the document settles and its HTML is written to `output`.
    /// Unparsable lines and unmatched selectors are reported and skipped.
    pub fn run_script(
        &mut self,
        input: impl BufRead,
        mut output: impl Write,
    ) -> Result<(), ShellError> {
        self.run_until_idle()?;
        writeln!(output, "{}", self.html())?;
        for line in input.lines() {
            let line = line?;
            let command = match ShellCommand::parse(&line) {
                Ok(Some(command)) => command,
                Ok(None) => continue,
                Err(err) => {
                    log::warn!("{err}");
                    writeln!(output, "error: {err}")?;
                    continue;
                }
            };
            if command == ShellCommand::Quit {
                break;
            }
            match self.execute(&command) {
                Ok(Some(text)) => writeln!(output, "{text}")?,
                Ok(None) => writeln!(output, "{}", self.html())?,
                Err(err @ ShellError::NoMatch { .. }) => {
                    log::warn!("{err}");
                    writeln!(output, "error: {err}")?;
                }
                Err(err) => return Err(err),
            }
        }
        Ok(())
    }

    /// HTML of the mount point's children.
    pub fn html(&self) -> String {
        self.document.borrow().inner_html(self.app.mount_node())
    }

    pub fn document(&self) -> Ref<'_, MemoryDocument> {
        self.document.borrow()
    }

    pub fn app(&self) -> &App<S, MemoryDocument> {
        &self.app
    }

    pub fn log_debug_info(&self) {
        println!("\n\n");
        println!("════════════════════════════════════════════════════════");
        println!("           DEBUG: CURRENT DOCUMENT STATE");
        println!("════════════════════════════════════════════════════════");
        println!(
            "phase: {:?}, renders: {}, tick requests: {}",
            self.app.phase(),
            self.app.render_count(),
            self.tick_requests()
        );
        match self.app.root_node() {
            Some(root) => print!("{}", self.document.borrow().dump_tree(Some(root))),
            None => println!("Nothing rendered yet"),
        }
        println!("════════════════════════════════════════════════════════");
        println!("\n\n");
    }

    fn find_nth(&self, selector: &str, index: usize) -> Result<NodeId, ShellError> {
        self.document
            .borrow()
            .query_selector_all(selector)
            .get(index)
            .copied()
            .ok_or_else(|| ShellError::NoMatch {
                selector: selector.to_owned(),
            })
    }
}

/// Surfaces a render failure from the last tick and drops the tick's
/// mutation log; the shell never replays it.
fn finish_tick<S: 'static>(
    document: &RefCell<MemoryDocument>,
    app: &App<S, MemoryDocument>,
) -> Result<(), ShellError> {
    let applied = document.borrow_mut().take_mutations().len();
    log::trace!("tick applied {applied} mutations");
    match app.take_render_error() {
        Some(err) => Err(ShellError::Render(err)),
        None => Ok(()),
    }
}

/// A document whose body holds a single `<div id="app">` mount point.
pub fn default_document() -> Result<MemoryDocument, NodeError> {
    MemoryDocument::with_mount_point("app").map(|(document, _)| document)
}
