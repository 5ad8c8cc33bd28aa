use std::io::{self, Write};
use std::path::{Path, PathBuf};
use std::sync::mpsc::{self, Receiver, RecvTimeoutError, Sender};
use std::thread;
use std::time::{Duration, Instant};

use crossterm::event::{KeyCode, KeyEvent, KeyEventKind, KeyModifiers, MouseEvent, MouseEventKind};
use tracing::{debug, info, warn};

use crate::catalog::{self, Script};
use crate::config::Settings;
use crate::executor::{self, ExecutionOutcome};
use crate::navigator::{Completion, Effect, NavInput, Navigator};
use crate::platform::{self, Platform};
use crate::terminal::{CommandTerminal, TerminalEffect};
use crate::ui::{Snapshot, Theme};

const TERMINAL_PAGE: usize = 5;
const SCRIPT_POLL: Duration = Duration::from_millis(100);

/// Result of a background job, posted back to the event loop.
#[derive(Debug)]
pub struct WorkerMessage {
    pub job: &'static str,
    pub elapsed: Duration,
    pub completion: Completion,
}

pub struct App {
    navigator: Navigator,
    terminal: CommandTerminal,
    settings: Settings,
    platform: Platform,
    root: PathBuf,
    scripts_root: PathBuf,
    theme: Theme,
    tx: Sender<WorkerMessage>,
    rx: Receiver<WorkerMessage>,
    pending_script: Option<Script>,
    pub should_quit: bool,
}

impl App {
    pub fn new(root: PathBuf, settings: Settings, platform: Platform, launch_dir: PathBuf) -> Self {
        Self::with_terminal(root, settings, platform, CommandTerminal::new(launch_dir))
    }

    pub fn with_terminal(
        root: PathBuf,
        settings: Settings,
        platform: Platform,
        terminal: CommandTerminal,
    ) -> Self {
        let (tx, rx) = mpsc::channel();
        let version = platform::read_version(&root);
        Self {
            navigator: Navigator::new(settings.title.clone(), version),
            terminal,
            theme: Theme::from_name(&settings.theme),
            scripts_root: platform.scripts_path(&root),
            settings,
            platform,
            root,
            tx,
            rx,
            pending_script: None,
            should_quit: false,
        }
    }

    pub fn start(&mut self) {
        info!(root = %self.scripts_root.display(), platform = self.platform.token(), "loading catalog");
        let effect = self.navigator.start();
        self.dispatch(effect);
    }

    pub fn navigator(&self) -> &Navigator {
        &self.navigator
    }

    pub fn terminal(&self) -> &CommandTerminal {
        &self.terminal
    }

    pub fn tick_rate(&self) -> Duration {
        self.settings.tick_rate()
    }

    pub fn snapshot(&self) -> Snapshot<'_> {
        Snapshot {
            navigator: &self.navigator,
            terminal: &self.terminal,
            theme: &self.theme,
            title: &self.settings.title,
            root: &self.root,
        }
    }

    pub fn handle_key(&mut self, key: KeyEvent) {
        if key.kind == KeyEventKind::Release {
            return;
        }
        let ctrl_c = key.modifiers.contains(KeyModifiers::CONTROL) && key.code == KeyCode::Char('c');
        if ctrl_c {
            let effect = self.navigator.handle_input(NavInput::Quit);
            self.dispatch(effect);
            return;
        }
        if self.terminal.is_active() {
            self.handle_terminal_key(key);
            return;
        }

        let input = match key.code {
            KeyCode::Char(':') => {
                self.terminal.activate();
                return;
            }
            KeyCode::Char('.') | KeyCode::Char('0') | KeyCode::Esc => NavInput::Back,
            KeyCode::Char('q') => NavInput::Quit,
            KeyCode::Char(c @ '1'..='9') => NavInput::QuickSelect((c as u8 - b'0') as usize),
            KeyCode::Up | KeyCode::Char('k') => NavInput::Up,
            KeyCode::Down | KeyCode::Char('j') => NavInput::Down,
            KeyCode::Enter => NavInput::Select,
            _ => return,
        };
        let effect = self.navigator.handle_input(input);
        self.dispatch(effect);
    }

    fn handle_terminal_key(&mut self, key: KeyEvent) {
        match key.code {
            KeyCode::Esc => self.terminal.deactivate(),
            KeyCode::Enter => {
                let text = self.terminal.take_input();
                let listing = self.navigator.listing();
                let effect = self.terminal.handle_command(&text, &listing);
                drop(listing);
                match effect {
                    TerminalEffect::None => {}
                    TerminalEffect::Select(index) => {
                        self.terminal.deactivate();
                        let effect = self.navigator.select(index);
                        self.dispatch(effect);
                    }
                    TerminalEffect::Quit => self.should_quit = true,
                }
            }
            KeyCode::Tab => self.terminal.autocomplete(),
            KeyCode::Backspace => self.terminal.backspace(),
            KeyCode::PageUp => self.terminal.scroll_up(TERMINAL_PAGE),
            KeyCode::PageDown => self.terminal.scroll_down(TERMINAL_PAGE),
            KeyCode::Char(c) => self.terminal.push_char(c),
            _ => {}
        }
    }

    pub fn handle_mouse(&mut self, mouse: MouseEvent) {
        let up = match mouse.kind {
            MouseEventKind::ScrollUp => true,
            MouseEventKind::ScrollDown => false,
            _ => return,
        };
        if self.terminal.is_active() {
            if up {
                self.terminal.scroll_up(1);
            } else {
                self.terminal.scroll_down(1);
            }
            return;
        }
        let effect = self
            .navigator
            .handle_input(if up { NavInput::Up } else { NavInput::Down });
        self.dispatch(effect);
    }

    fn dispatch(&mut self, effect: Effect) {
        match effect {
            Effect::None => {}
            Effect::Quit => self.should_quit = true,
            Effect::ScanCategories => {
                let root = self.scripts_root.clone();
                let platform = self.platform;
                self.spawn("scan categories", move || {
                    Completion::Categories(catalog::scan_categories(&root, platform))
                });
            }
            Effect::ScanFolder(path) => {
                let platform = self.platform;
                self.spawn("scan folder", move || {
                    let result = catalog::scan_entries(&path, platform);
                    Completion::Entries { path, result }
                });
            }
            Effect::Execute(script) => self.pending_script = Some(script),
        }
    }

    fn spawn<F>(&self, job: &'static str, work: F) -> thread::JoinHandle<()>
    where
        F: FnOnce() -> Completion + Send + 'static,
    {
        let tx = self.tx.clone();
        thread::spawn(move || {
            let started = Instant::now();
            let completion = work();
            let _ = tx.send(WorkerMessage {
                job,
                elapsed: started.elapsed(),
                completion,
            });
        })
    }

    /// Applies every finished job without blocking.
    pub fn drain_messages(&mut self) {
        while let Ok(message) = self.rx.try_recv() {
            self.apply(message);
        }
    }

    pub fn apply(&mut self, message: WorkerMessage) {
        debug!(job = message.job, elapsed_ms = message.elapsed.as_millis() as u64, "job finished");
        self.navigator.apply(message.completion);
    }

    pub fn take_pending_script(&mut self) -> Option<Script> {
        self.pending_script.take()
    }

    /// Runs `script` on a worker and blocks until it reports back. Catalog results that
    /// arrive meanwhile are applied; the script's own message is returned unapplied.
    pub fn run_script(&mut self, script: Script) -> WorkerMessage {
        let working_dir = self.terminal.run_dir().to_path_buf();
        let pause = self.settings.pause_after_run;
        info!(script = %script.path.display(), dir = %working_dir.display(), "running script");

        let handle = self.spawn("execute", move || {
            let outcome = executor::execute(&script, &working_dir);
            if pause {
                wait_for_enter(&outcome);
            }
            Completion::ScriptFinished(outcome)
        });

        let started = Instant::now();
        loop {
            match self.rx.recv_timeout(SCRIPT_POLL) {
                Ok(message @ WorkerMessage {
                    completion: Completion::ScriptFinished(_),
                    ..
                }) => return message,
                Ok(other) => self.apply(other),
                Err(RecvTimeoutError::Timeout) if !handle.is_finished() => {}
                Err(_) => {
                    if let Ok(message) = self.rx.try_recv() {
                        if matches!(message.completion, Completion::ScriptFinished(_)) {
                            return message;
                        }
                        self.apply(message);
                        continue;
                    }
                    warn!("script worker ended without reporting");
                    return WorkerMessage {
                        job: "execute",
                        elapsed: started.elapsed(),
                        completion: Completion::ScriptFinished(ExecutionOutcome {
                            exit_code: 1,
                            output: "script worker stopped unexpectedly".into(),
                        }),
                    };
                }
            }
        }
    }

    pub fn scripts_root(&self) -> &Path {
        &self.scripts_root
    }
}

fn wait_for_enter(outcome: &ExecutionOutcome) {
    let mut stdout = io::stdout();
    let _ = writeln!(
        stdout,
        "\nScript exited with code {}. Press Enter to return...",
        outcome.exit_code
    );
    let _ = stdout.flush();
    let _ = io::stdin().read_line(&mut String::new());
}
