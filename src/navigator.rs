//! View state machine: inputs return an [`Effect`], results come back as [`Completion`]s.

use std::path::{Path, PathBuf};

use tracing::{debug, warn};

use crate::catalog::{Category, ListEntry, Script};
use crate::error::LauncherError;
use crate::executor::ExecutionOutcome;
use crate::terminal::Listing;

/// Items past this index can only be reached with arrows or `:N`.
pub const QUICK_SELECT_MAX: usize = 9;

#[derive(Clone, Debug, PartialEq, Eq)]
pub enum NavigationState {
    CategoryView,
    ScriptView {
        category: Category,
        path: PathBuf,
    },
    ExecutingView {
        category: Category,
        path: PathBuf,
        script: Script,
    },
    ResultView {
        category: Category,
        path: PathBuf,
        script: Script,
        outcome: ExecutionOutcome,
    },
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum NavInput {
    Up,
    Down,
    Select,
    /// 1-based item number from the digit keys.
    QuickSelect(usize),
    Back,
    Quit,
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Effect {
    None,
    ScanCategories,
    ScanFolder(PathBuf),
    Execute(Script),
    Quit,
}

#[derive(Debug)]
pub enum Completion {
    Categories(Result<Vec<Category>, LauncherError>),
    Entries {
        path: PathBuf,
        result: Result<Vec<Script>, LauncherError>,
    },
    ScriptFinished(ExecutionOutcome),
}

#[derive(Debug)]
pub struct Navigator {
    state: NavigationState,
    categories: Vec<Category>,
    entries: Vec<Script>,
    selected: usize,
    /// Selection to restore for each listing we descended out of.
    selection_stack: Vec<usize>,
    pending_selection: Option<usize>,
    loading: bool,
    notice: Option<String>,
    title: String,
    version: Option<String>,
    /// Header text, rebuilt after each catalog reload.
    header: Option<String>,
    header_dismissed: bool,
}

impl Navigator {
    pub fn new(title: impl Into<String>, version: Option<String>) -> Self {
        Self {
            state: NavigationState::CategoryView,
            categories: Vec::new(),
            entries: Vec::new(),
            selected: 0,
            selection_stack: Vec::new(),
            pending_selection: None,
            loading: false,
            notice: None,
            title: title.into(),
            version,
            header: None,
            header_dismissed: false,
        }
    }

    /// Effect to run before the first frame.
    pub fn start(&mut self) -> Effect {
        self.loading = true;
        Effect::ScanCategories
    }

    pub fn state(&self) -> &NavigationState {
        &self.state
    }

    pub fn categories(&self) -> &[Category] {
        &self.categories
    }

    pub fn entries(&self) -> &[Script] {
        &self.entries
    }

    pub fn selected(&self) -> usize {
        self.selected
    }

    pub fn is_loading(&self) -> bool {
        self.loading
    }

    pub fn notice(&self) -> Option<&str> {
        self.notice.as_deref()
    }

    pub fn is_executing(&self) -> bool {
        matches!(self.state, NavigationState::ExecutingView { .. })
    }

    /// Header shown above the category list until the user first opens a category.
    pub fn header(&self) -> Option<&str> {
        if self.header_dismissed {
            None
        } else {
            self.header.as_deref()
        }
    }

    fn rebuild_header(&mut self) {
        self.header = if self.categories.is_empty() {
            None
        } else {
            Some(match &self.version {
                Some(version) => format!("{}  {version}", self.title),
                None => self.title.clone(),
            })
        };
    }

    pub fn current_len(&self) -> usize {
        match self.state {
            NavigationState::CategoryView => self.categories.len(),
            NavigationState::ScriptView { .. } => self.entries.len(),
            _ => 0,
        }
    }

    pub fn listing(&self) -> Listing<'_> {
        match &self.state {
            NavigationState::CategoryView => Listing {
                heading: "Categories".into(),
                entries: self.categories.iter().map(ListEntry::Category).collect(),
            },
            NavigationState::ScriptView { category, .. } => Listing {
                heading: format!("Scripts in {}", category.name),
                entries: self.entries.iter().map(ListEntry::Script).collect(),
            },
            _ => Listing::default(),
        }
    }

    /// `Home / category / nested...` for the current location.
    pub fn breadcrumb(&self) -> Vec<String> {
        let mut parts = vec!["Home".to_string()];
        let (category, path) = match &self.state {
            NavigationState::CategoryView => return parts,
            NavigationState::ScriptView { category, path }
            | NavigationState::ExecutingView { category, path, .. }
            | NavigationState::ResultView { category, path, .. } => (category, path),
        };
        parts.push(category.name.clone());
        if let Ok(rel) = path.strip_prefix(&category.path) {
            parts.extend(
                rel.components()
                    .map(|c| c.as_os_str().to_string_lossy().into_owned()),
            );
        }
        parts
    }

    pub fn handle_input(&mut self, input: NavInput) -> Effect {
        if self.is_executing() {
            return Effect::None;
        }
        match input {
            NavInput::Quit => Effect::Quit,
            NavInput::Up => {
                self.move_selection_up();
                Effect::None
            }
            NavInput::Down => {
                self.move_selection_down();
                Effect::None
            }
            NavInput::Select => {
                if matches!(self.state, NavigationState::ResultView { .. }) {
                    return self.back();
                }
                self.select(self.selected)
            }
            NavInput::QuickSelect(n) if (1..=QUICK_SELECT_MAX).contains(&n) => {
                if n <= self.current_len() {
                    self.select(n - 1)
                } else {
                    Effect::None
                }
            }
            NavInput::QuickSelect(_) => Effect::None,
            NavInput::Back => self.back(),
        }
    }

    fn move_selection_up(&mut self) {
        let len = self.current_len();
        if len == 0 {
            return;
        }
        self.selected = if self.selected == 0 {
            len - 1
        } else {
            self.selected - 1
        };
    }

    fn move_selection_down(&mut self) {
        let len = self.current_len();
        if len == 0 {
            return;
        }
        self.selected = (self.selected + 1) % len;
    }

    /// Applies the transition for choosing item `index` (0-based) of the current list.
    pub fn select(&mut self, index: usize) -> Effect {
        match &self.state {
            NavigationState::CategoryView => {
                let Some(category) = self.categories.get(index).cloned() else {
                    return Effect::None;
                };
                debug!(category = %category.name, "entering category");
                self.selection_stack.clear();
                self.selection_stack.push(index);
                self.header_dismissed = true;
                let path = category.path.clone();
                self.state = NavigationState::ScriptView {
                    category,
                    path: path.clone(),
                };
                self.enter_folder(path)
            }
            NavigationState::ScriptView { category, .. } => {
                let Some(script) = self.entries.get(index).cloned() else {
                    return Effect::None;
                };
                let category = category.clone();
                self.selected = index;
                if script.is_dir() {
                    self.selection_stack.push(index);
                    self.state = NavigationState::ScriptView {
                        category,
                        path: script.path.clone(),
                    };
                    return self.enter_folder(script.path);
                }
                let path = self.current_path().unwrap_or(&category.path).to_path_buf();
                self.state = NavigationState::ExecutingView {
                    category,
                    path,
                    script: script.clone(),
                };
                Effect::Execute(script)
            }
            _ => Effect::None,
        }
    }

    fn enter_folder(&mut self, path: PathBuf) -> Effect {
        self.entries.clear();
        self.selected = 0;
        self.loading = true;
        self.notice = None;
        Effect::ScanFolder(path)
    }

    fn current_path(&self) -> Option<&Path> {
        match &self.state {
            NavigationState::ScriptView { path, .. } => Some(path),
            _ => None,
        }
    }

    fn back(&mut self) -> Effect {
        match std::mem::replace(&mut self.state, NavigationState::CategoryView) {
            NavigationState::CategoryView => Effect::Quit,
            NavigationState::ScriptView { category, path } => {
                let parent = path
                    .parent()
                    .filter(|parent| path != category.path && parent.starts_with(&category.path))
                    .map(Path::to_path_buf);
                match parent {
                    Some(parent) => {
                        self.state = NavigationState::ScriptView {
                            category,
                            path: parent.clone(),
                        };
                        let restore = self.selection_stack.pop();
                        let effect = self.enter_folder(parent);
                        self.pending_selection = restore;
                        effect
                    }
                    None => {
                        self.entries.clear();
                        self.selected = self.selection_stack.first().copied().unwrap_or(0);
                        self.selection_stack.clear();
                        self.pending_selection = Some(self.selected);
                        self.loading = true;
                        Effect::ScanCategories
                    }
                }
            }
            NavigationState::ResultView { category, path, .. } => {
                self.state = NavigationState::ScriptView { category, path };
                Effect::None
            }
            executing @ NavigationState::ExecutingView { .. } => {
                self.state = executing;
                Effect::None
            }
        }
    }

    pub fn apply(&mut self, completion: Completion) {
        match completion {
            Completion::Categories(result) => {
                self.loading = false;
                match result {
                    Ok(categories) => {
                        self.categories = categories;
                        self.notice = None;
                    }
                    Err(err) => {
                        warn!("catalog unavailable: {err}");
                        self.categories.clear();
                        self.notice = Some(err.to_string());
                    }
                }
                self.rebuild_header();
                if matches!(self.state, NavigationState::CategoryView) {
                    self.restore_selection(self.categories.len());
                }
            }
            Completion::Entries { path, result } => {
                if self.current_path() != Some(path.as_path()) {
                    debug!(path = %path.display(), "dropping stale folder scan");
                    return;
                }
                self.loading = false;
                match result {
                    Ok(entries) => {
                        self.entries = entries;
                        self.notice = None;
                    }
                    Err(err) => {
                        warn!("folder unavailable: {err}");
                        self.entries.clear();
                        self.notice = Some(err.to_string());
                    }
                }
                self.restore_selection(self.entries.len());
            }
            Completion::ScriptFinished(outcome) => {
                let state = std::mem::replace(&mut self.state, NavigationState::CategoryView);
                self.state = match state {
                    NavigationState::ExecutingView {
                        category,
                        path,
                        script,
                    } => NavigationState::ResultView {
                        category,
                        path,
                        script,
                        outcome,
                    },
                    other => other,
                };
            }
        }
    }

    fn restore_selection(&mut self, len: usize) {
        let wanted = self.pending_selection.take().unwrap_or(self.selected);
        self.selected = if len == 0 { 0 } else { wanted.min(len - 1) };
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::catalog::DIR_EXTENSION;

    fn category(name: &str) -> Category {
        Category {
            name: name.into(),
            path: PathBuf::from("/root/scripts").join(name),
            icon: "📁".into(),
            description: String::new(),
            script_count: 1,
            dir_count: 1,
        }
    }

    fn entry(parent: &Path, name: &str, extension: &str) -> Script {
        Script {
            name: name.into(),
            path: parent.join(name),
            description: String::new(),
            extension: extension.into(),
            icon: None,
        }
    }

    fn loaded(categories: Vec<Category>) -> Navigator {
        let mut nav = Navigator::new("Launcher", Some("1.0".into()));
        assert_eq!(nav.start(), Effect::ScanCategories);
        nav.apply(Completion::Categories(Ok(categories)));
        nav
    }

    #[test]
    fn back_from_nested_folder_returns_to_category_root() {
        let a = category("a");
        let mut nav = loaded(vec![a.clone()]);

        assert_eq!(nav.handle_input(NavInput::Select), Effect::ScanFolder(a.path.clone()));
        let b = entry(&a.path, "b", DIR_EXTENSION);
        nav.apply(Completion::Entries {
            path: a.path.clone(),
            result: Ok(vec![b.clone(), entry(&a.path, "run.sh", ".sh")]),
        });

        assert_eq!(nav.handle_input(NavInput::QuickSelect(1)), Effect::ScanFolder(b.path.clone()));
        nav.apply(Completion::Entries {
            path: b.path.clone(),
            result: Ok(vec![entry(&b.path, "inner.sh", ".sh")]),
        });
        assert_eq!(nav.breadcrumb(), ["Home", "a", "b"]);

        assert_eq!(nav.handle_input(NavInput::Back), Effect::ScanFolder(a.path.clone()));
        assert_eq!(
            nav.state(),
            &NavigationState::ScriptView {
                category: a.clone(),
                path: a.path.clone()
            }
        );

        assert_eq!(nav.handle_input(NavInput::Back), Effect::ScanCategories);
        assert_eq!(nav.state(), &NavigationState::CategoryView);
        assert_eq!(nav.handle_input(NavInput::Back), Effect::Quit);
    }

    #[test]
    fn quick_select_only_reaches_existing_items() {
        let mut nav = loaded(vec![category("a"), category("b")]);
        assert_eq!(nav.handle_input(NavInput::QuickSelect(3)), Effect::None);
        assert_eq!(nav.handle_input(NavInput::QuickSelect(10)), Effect::None);
        assert_eq!(nav.state(), &NavigationState::CategoryView);
        assert!(matches!(
            nav.handle_input(NavInput::QuickSelect(2)),
            Effect::ScanFolder(path) if path.ends_with("b")
        ));
    }

    #[test]
    fn quick_select_ignores_items_past_nine() {
        let categories: Vec<_> = (0..12).map(|i| category(&format!("c{i:02}"))).collect();
        let mut nav = loaded(categories);
        assert_eq!(nav.handle_input(NavInput::QuickSelect(10)), Effect::None);
        assert!(matches!(nav.select(10), Effect::ScanFolder(_)));
    }

    #[test]
    fn script_run_goes_through_executing_and_result() {
        let a = category("a");
        let mut nav = loaded(vec![a.clone()]);
        nav.handle_input(NavInput::Select);
        let script = entry(&a.path, "run.sh", ".sh");
        nav.apply(Completion::Entries {
            path: a.path.clone(),
            result: Ok(vec![script.clone()]),
        });

        assert_eq!(nav.handle_input(NavInput::Select), Effect::Execute(script.clone()));
        assert!(nav.is_executing());
        assert_eq!(nav.handle_input(NavInput::Quit), Effect::None);
        assert_eq!(nav.handle_input(NavInput::Back), Effect::None);

        nav.apply(Completion::ScriptFinished(ExecutionOutcome {
            exit_code: 2,
            output: "bad".into(),
        }));
        assert!(matches!(
            nav.state(),
            NavigationState::ResultView { outcome, .. } if outcome.exit_code == 2
        ));

        assert_eq!(nav.handle_input(NavInput::Select), Effect::None);
        assert!(matches!(nav.state(), NavigationState::ScriptView { .. }));
        assert_eq!(nav.entries().len(), 1);
    }

    #[test]
    fn selection_wraps_and_is_restored_after_back() {
        let mut nav = loaded(vec![category("a"), category("b"), category("c")]);
        nav.handle_input(NavInput::Up);
        assert_eq!(nav.selected(), 2);
        nav.handle_input(NavInput::Down);
        assert_eq!(nav.selected(), 0);
        nav.handle_input(NavInput::Down);
        nav.handle_input(NavInput::Select);
        assert_eq!(nav.handle_input(NavInput::Back), Effect::ScanCategories);
        nav.apply(Completion::Categories(Ok(vec![
            category("a"),
            category("b"),
            category("c"),
        ])));
        assert_eq!(nav.selected(), 1);
    }

    #[test]
    fn stale_folder_scan_is_ignored() {
        let a = category("a");
        let mut nav = loaded(vec![a.clone()]);
        nav.handle_input(NavInput::Select);
        nav.apply(Completion::Entries {
            path: PathBuf::from("/elsewhere"),
            result: Ok(vec![entry(Path::new("/elsewhere"), "x.sh", ".sh")]),
        });
        assert!(nav.entries().is_empty());
        assert!(nav.is_loading());
    }

    #[test]
    fn scan_error_becomes_notice_and_empty_catalog() {
        let mut nav = Navigator::new("Launcher", None);
        nav.start();
        nav.apply(Completion::Categories(Err(LauncherError::scan(
            "/missing",
            std::io::Error::from(std::io::ErrorKind::NotFound),
        ))));
        assert!(nav.categories().is_empty());
        assert!(nav.notice().unwrap().contains("/missing"));
        assert_eq!(nav.header(), None);
        assert_eq!(nav.handle_input(NavInput::Select), Effect::None);
    }

    #[test]
    fn header_hidden_after_leaving_category_view() {
        let mut nav = loaded(vec![category("a")]);
        assert_eq!(nav.header(), Some("Launcher  1.0"));
        nav.handle_input(NavInput::Select);
        nav.handle_input(NavInput::Back);
        assert_eq!(nav.header(), None);
    }

    #[test]
    fn listing_matches_view() {
        let a = category("a");
        let mut nav = loaded(vec![a.clone()]);
        assert_eq!(nav.listing().heading, "Categories");
        nav.handle_input(NavInput::Select);
        nav.apply(Completion::Entries {
            path: a.path.clone(),
            result: Ok(vec![entry(&a.path, "run.sh", ".sh")]),
        });
        let listing = nav.listing();
        assert_eq!(listing.heading, "Scripts in a");
        assert_eq!(listing.entries.len(), 1);
    }
}
