//! The `:` command overlay.

use std::fs;
use std::path::{Component, Path, PathBuf, MAIN_SEPARATOR};

use tracing::debug;

use crate::catalog::ListEntry;
use crate::error::LauncherError;

/// Completion vocabulary, kept sorted.
pub const COMMANDS: &[&str] = &[
    "cd", "clear", "exit", "h", "help", "list", "ls", "pwd", "q", "quit", "search",
];

pub const ERROR_MARK: &str = "✗ ";

const HELP_TEXT: &[&str] = &[
    "Available commands:",
    "  help, h          Show this help",
    "  list, ls         List the categories or scripts in view",
    "  pwd              Show the run directory",
    "  cd [path]        Change the run directory (default: launch directory)",
    "  ls <path>        List files and folders",
    "  search <text>    Search the current view",
    "  clear            Clear the output",
    "  exit, quit, q    Quit the launcher",
    "  :1, :2, :3...    Jump to item N",
];

/// What the current view exposes to `list`, `search` and `:N`.
#[derive(Clone, Debug, Default)]
pub struct Listing<'a> {
    pub heading: String,
    pub entries: Vec<ListEntry<'a>>,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum TerminalEffect {
    None,
    /// Zero-based index into the current listing.
    Select(usize),
    Quit,
}

#[derive(Debug)]
pub struct CommandTerminal {
    active: bool,
    input: String,
    output: Vec<String>,
    scroll: usize,
    run_dir: PathBuf,
    launch_dir: PathBuf,
    home: Option<PathBuf>,
}

impl CommandTerminal {
    pub fn new(launch_dir: PathBuf) -> Self {
        Self::with_home(launch_dir, dirs::home_dir())
    }

    pub fn with_home(launch_dir: PathBuf, home: Option<PathBuf>) -> Self {
        Self {
            active: false,
            input: String::new(),
            output: Vec::new(),
            scroll: 0,
            run_dir: launch_dir.clone(),
            launch_dir,
            home,
        }
    }

    pub fn is_active(&self) -> bool {
        self.active
    }

    pub fn activate(&mut self) {
        self.active = true;
    }

    /// Closes the overlay and forgets its input and output.
    pub fn deactivate(&mut self) {
        self.active = false;
        self.input.clear();
        self.set_output(Vec::new());
    }

    pub fn input(&self) -> &str {
        &self.input
    }

    pub fn output(&self) -> &[String] {
        &self.output
    }

    pub fn run_dir(&self) -> &Path {
        &self.run_dir
    }

    pub fn launch_dir(&self) -> &Path {
        &self.launch_dir
    }

    pub fn push_char(&mut self, c: char) {
        self.input.push(c);
    }

    pub fn backspace(&mut self) {
        self.input.pop();
    }

    pub fn take_input(&mut self) -> String {
        std::mem::take(&mut self.input)
    }

    pub fn scroll(&self) -> usize {
        self.scroll
    }

    pub fn scroll_up(&mut self, lines: usize) {
        self.scroll = self.scroll.saturating_sub(lines);
    }

    pub fn scroll_down(&mut self, lines: usize) {
        let max = self.output.len().saturating_sub(1);
        self.scroll = (self.scroll + lines).min(max);
    }

    /// Output lines from the scroll offset on, at most `height` of them.
    pub fn visible_output(&self, height: usize) -> &[String] {
        let start = self.scroll.min(self.output.len());
        let end = (start + height).min(self.output.len());
        &self.output[start..end]
    }

    fn set_output(&mut self, lines: Vec<String>) {
        self.output = lines;
        self.scroll = 0;
    }

    fn set_error(&mut self, err: &LauncherError) {
        let lines = err
            .to_string()
            .lines()
            .enumerate()
            .map(|(i, line)| {
                if i == 0 {
                    format!("{ERROR_MARK}{line}")
                } else {
                    line.to_string()
                }
            })
            .collect();
        self.set_output(lines);
    }

    pub fn handle_command(&mut self, text: &str, listing: &Listing<'_>) -> TerminalEffect {
        let text = text.trim();
        let (command, arg) = match text.split_once(char::is_whitespace) {
            Some((command, arg)) => (command, arg.trim()),
            None => (text, ""),
        };
        debug!(command, arg, "terminal command");

        match command {
            "" | "clear" => self.set_output(Vec::new()),
            "help" | "h" => self.set_output(HELP_TEXT.iter().map(|s| s.to_string()).collect()),
            "list" => self.show_listing(listing),
            "ls" if arg.is_empty() => self.show_listing(listing),
            "ls" => self.list_directory(arg),
            "pwd" => self.set_output(vec![format!("Run directory: {}", self.run_dir.display())]),
            "cd" => self.change_dir(arg),
            "search" => self.search(arg, listing),
            "exit" | "quit" | "q" => return TerminalEffect::Quit,
            other => {
                if let Some(number) = other.strip_prefix(':') {
                    return self.jump(number, listing);
                }
                self.set_error(&LauncherError::UnknownCommand(other.to_string()));
            }
        }
        TerminalEffect::None
    }

    fn show_listing(&mut self, listing: &Listing<'_>) {
        let mut lines = vec![format!("{}: {}", listing.heading, listing.entries.len())];
        for (index, entry) in listing.entries.iter().enumerate() {
            lines.push(numbered_line(index, entry));
        }
        self.set_output(lines);
    }

    fn search(&mut self, query: &str, listing: &Listing<'_>) {
        if query.is_empty() {
            self.set_output(vec![format!("{ERROR_MARK}Usage: search <text>")]);
            return;
        }
        let mut lines = vec![format!("Searching: {query}")];
        lines.extend(
            listing
                .entries
                .iter()
                .enumerate()
                .filter(|(_, entry)| entry.matches(query))
                .map(|(index, entry)| numbered_line(index, entry)),
        );
        if lines.len() == 1 {
            lines.push("  (no matches)".into());
        }
        self.set_output(lines);
    }

    fn jump(&mut self, number: &str, listing: &Listing<'_>) -> TerminalEffect {
        match number.trim().parse::<usize>() {
            Ok(n) if n >= 1 && n <= listing.entries.len() => TerminalEffect::Select(n - 1),
            Ok(n) => {
                self.set_error(&LauncherError::InvalidItemIndex(n));
                TerminalEffect::None
            }
            Err(_) => {
                self.set_error(&LauncherError::UnknownCommand(format!(":{number}")));
                TerminalEffect::None
            }
        }
    }

    fn change_dir(&mut self, arg: &str) {
        match self.resolve_dir(arg) {
            Ok(dir) => {
                self.set_output(vec![
                    "Run directory changed:".to_string(),
                    format!("  {}", dir.display()),
                ]);
                self.run_dir = dir;
            }
            Err(err) => self.set_error(&err),
        }
    }

    /// `cd` target: launch directory by default, `~` expanded, relative paths against the
    /// run directory. The result must be an existing directory.
    pub fn resolve_dir(&self, arg: &str) -> Result<PathBuf, LauncherError> {
        let target = if arg.is_empty() {
            self.launch_dir.clone()
        } else {
            self.resolve_path(arg)
        };
        match fs::metadata(&target) {
            Ok(meta) if meta.is_dir() => Ok(target),
            Ok(_) => Err(LauncherError::path(target, "not a directory")),
            Err(_) => Err(LauncherError::path(target, "directory not found")),
        }
    }

    /// Lexically resolved absolute form of `arg`; does not touch the filesystem.
    pub fn resolve_path(&self, arg: &str) -> PathBuf {
        let expanded = self.expand_home(arg);
        let joined = if expanded.is_absolute() {
            expanded
        } else {
            self.run_dir.join(expanded)
        };
        normalize(&joined)
    }

    fn expand_home(&self, arg: &str) -> PathBuf {
        if let Some(home) = &self.home {
            if arg == "~" {
                return home.clone();
            }
            if let Some(rest) = arg.strip_prefix("~/").or_else(|| arg.strip_prefix("~\\")) {
                return home.join(rest);
            }
        }
        PathBuf::from(arg)
    }

    fn list_directory(&mut self, arg: &str) {
        let dir = self.resolve_path(arg);
        let entries = match fs::read_dir(&dir) {
            Ok(entries) => entries,
            Err(err) => {
                self.set_error(&LauncherError::path(dir, format!("cannot list ({err})")));
                return;
            }
        };

        let mut items: Vec<(String, bool)> = entries
            .flatten()
            .map(|entry| {
                let is_dir = entry.path().is_dir();
                (entry.file_name().to_string_lossy().into_owned(), is_dir)
            })
            .collect();
        items.sort();

        let mut lines = vec![format!("Contents of {}:", dir.display())];
        if items.is_empty() {
            lines.push("  (empty)".into());
        }
        lines.extend(items.into_iter().map(|(name, is_dir)| {
            if is_dir {
                format!("  [dir]  {name}/")
            } else {
                format!("  [file] {name}")
            }
        }));
        self.set_output(lines);
    }

    /// Tab completion of the input buffer.
    pub fn autocomplete(&mut self) {
        let trimmed = self.input.trim_start().to_string();
        if trimmed.trim().is_empty() || trimmed.starts_with(':') {
            return;
        }
        match trimmed.split_once(' ') {
            None => self.complete_command(&trimmed),
            Some((command @ ("cd" | "ls"), arg)) => {
                let arg = arg.trim();
                if !arg.is_empty() {
                    self.complete_path(command, arg);
                }
            }
            Some(_) => {}
        }
    }

    fn complete_command(&mut self, prefix: &str) {
        let matches: Vec<&str> = COMMANDS
            .iter()
            .copied()
            .filter(|command| command.starts_with(prefix))
            .collect();
        match matches.as_slice() {
            [] => {}
            [only] => self.input = format!("{only} "),
            many => {
                let common = longest_common_prefix(many);
                if common.chars().count() > prefix.chars().count() {
                    self.input = common;
                } else {
                    let mut lines = vec!["Suggestions:".to_string()];
                    lines.extend(many.iter().map(|m| format!("  {m}")));
                    self.set_output(lines);
                }
            }
        }
    }

    fn complete_path(&mut self, command: &str, arg: &str) {
        let arg = if arg == "~" { "~/" } else { arg };
        let ends_with_separator = arg.ends_with('/') || arg.ends_with('\\');
        let probe = self.resolve_path(arg);
        let file_name = probe
            .file_name()
            .map(|name| name.to_string_lossy().into_owned());

        let (search_dir, prefix, typed_base) = match (ends_with_separator, file_name) {
            (false, Some(name))
                if !arg.ends_with("..")
                    && arg != "."
                    && !arg.ends_with("/.")
                    && !arg.ends_with("\\.") =>
            {
                let base_len = arg.rfind(['/', '\\']).map(|i| i + 1).unwrap_or(0);
                (
                    probe.parent().map(Path::to_path_buf).unwrap_or_else(|| probe.clone()),
                    name,
                    arg[..base_len].to_string(),
                )
            }
            (true, _) => (probe, String::new(), arg.to_string()),
            _ => (probe, String::new(), format!("{arg}{MAIN_SEPARATOR}")),
        };

        let entries = match fs::read_dir(&search_dir) {
            Ok(entries) => entries,
            Err(err) => {
                self.set_error(&LauncherError::path(search_dir, format!("cannot complete ({err})")));
                return;
            }
        };

        let needle = prefix.to_lowercase();
        let mut matches: Vec<(String, bool)> = entries
            .flatten()
            .map(|entry| {
                let is_dir = entry.path().is_dir();
                (entry.file_name().to_string_lossy().into_owned(), is_dir)
            })
            .filter(|(name, _)| name.to_lowercase().starts_with(&needle))
            .collect();
        matches.sort();

        let (selected, is_dir) = match matches.as_slice() {
            [] => return,
            [(name, is_dir)] => (name.clone(), *is_dir),
            many => {
                let names: Vec<&str> = many.iter().map(|(name, _)| name.as_str()).collect();
                let common = longest_common_prefix(names.as_slice());
                if common.chars().count() <= prefix.chars().count() {
                    let mut lines = vec!["Suggestions:".to_string()];
                    lines.extend(many.iter().map(|(name, is_dir)| {
                        if *is_dir {
                            format!("  [dir]  {name}/")
                        } else {
                            format!("  [file] {name}")
                        }
                    }));
                    self.set_output(lines);
                    return;
                }
                (common, false)
            }
        };

        let separator = if is_dir {
            MAIN_SEPARATOR.to_string()
        } else {
            String::new()
        };
        self.input = format!("{command} {typed_base}{selected}{separator}");
    }
}

fn numbered_line(index: usize, entry: &ListEntry<'_>) -> String {
    let description = entry.display_description();
    if description.is_empty() {
        format!("  [{}] {}", index + 1, entry.display_title())
    } else {
        format!("  [{}] {}  {}", index + 1, entry.display_title(), description)
    }
}

pub fn longest_common_prefix<S: AsRef<str>>(items: &[S]) -> String {
    let Some(first) = items.first() else {
        return String::new();
    };
    let mut prefix: Vec<char> = first.as_ref().chars().collect();
    for item in &items[1..] {
        let shared = prefix
            .iter()
            .zip(item.as_ref().chars())
            .take_while(|(a, b)| **a == *b)
            .count();
        prefix.truncate(shared);
    }
    prefix.into_iter().collect()
}

/// Removes `.` and folds `..` without following symlinks.
fn normalize(path: &Path) -> PathBuf {
    let mut out = PathBuf::new();
    for component in path.components() {
        match component {
            Component::CurDir => {}
            Component::ParentDir => {
                if !out.pop() {
                    out.push(component);
                }
            }
            other => out.push(other),
        }
    }
    out
}
