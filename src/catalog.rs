//! Category and script discovery. Listings are sorted dirs first, then by name.

use std::fs::{self, File};
use std::io::{BufRead, BufReader};
use std::path::{Path, PathBuf};

use tracing::{debug, warn};

use crate::error::{LauncherError, Result};
use crate::platform::Platform;

/// Synthetic extension for sub-folders listed next to scripts.
pub const DIR_EXTENSION: &str = ".dir";
pub const DEFAULT_FOLDER_ICON: &str = "📁";
pub const DEFAULT_FOLDER_DESCRIPTION: &str = "Miscellaneous scripts";

const RESERVED_DIR: &str = "lib";
const EXAMPLE_PREFIX: &str = "example_";
const DESCRIPTION_SCAN_LINES: usize = 5;
const MAX_ICON_CHARS: usize = 6;
const MAX_CONTENT_DEPTH: usize = 8;

const DESCRIPTION_PREFIXES: &[&str] = &[
    "Script:",
    "Script para",
    "Descripción:",
    "Description:",
];

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Category {
    pub name: String,
    pub path: PathBuf,
    pub icon: String,
    pub description: String,
    pub script_count: usize,
    pub dir_count: usize,
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Script {
    pub name: String,
    pub path: PathBuf,
    pub description: String,
    pub extension: String,
    /// Only set for `.dir` entries.
    pub icon: Option<String>,
}

impl Script {
    pub fn is_dir(&self) -> bool {
        self.extension == DIR_EXTENSION
    }
}

/// A row of the current listing, whichever view it belongs to.
#[derive(Clone, Copy, Debug)]
pub enum ListEntry<'a> {
    Category(&'a Category),
    Script(&'a Script),
}

impl ListEntry<'_> {
    pub fn display_title(&self) -> String {
        match self {
            ListEntry::Category(category) => format!("{} {}/", category.icon, category.name),
            ListEntry::Script(script) if script.is_dir() => format!(
                "{} {}/",
                script.icon.as_deref().unwrap_or(DEFAULT_FOLDER_ICON),
                script.name
            ),
            ListEntry::Script(script) => script.name.clone(),
        }
    }

    pub fn display_description(&self) -> String {
        match self {
            ListEntry::Category(category) => format!(
                "{} ({} script(s))",
                category.description, category.script_count
            ),
            ListEntry::Script(script) => script.description.clone(),
        }
    }

    pub fn name(&self) -> &str {
        match self {
            ListEntry::Category(category) => &category.name,
            ListEntry::Script(script) => &script.name,
        }
    }

    pub fn description(&self) -> &str {
        match self {
            ListEntry::Category(category) => &category.description,
            ListEntry::Script(script) => &script.description,
        }
    }

    /// Case-insensitive substring match on name or description.
    pub fn matches(&self, query: &str) -> bool {
        let query = query.to_lowercase();
        self.name().to_lowercase().contains(&query)
            || self.description().to_lowercase().contains(&query)
    }
}

/// Lists the categories directly under `scripts_root`.
pub fn scan_categories(scripts_root: &Path, platform: Platform) -> Result<Vec<Category>> {
    let entries = fs::read_dir(scripts_root)
        .map_err(|err| LauncherError::scan(scripts_root, err))?;

    let mut categories = Vec::new();
    for entry in entries.flatten() {
        let path = entry.path();
        if !path.is_dir() {
            continue;
        }
        let Some(name) = entry_name(&path) else {
            continue;
        };
        if is_skipped_dir(&name) {
            continue;
        }

        let items = match scan_entries(&path, platform) {
            Ok(items) => items,
            Err(err) => {
                warn!(category = %name, "skipping unreadable category: {err}");
                continue;
            }
        };
        if items.is_empty() {
            continue;
        }

        let dir_count = items.iter().filter(|item| item.is_dir()).count();
        let meta = read_folder_meta(&path);
        categories.push(Category {
            name,
            script_count: items.len() - dir_count,
            dir_count,
            icon: meta.icon_or_default(),
            description: meta.description_or_default(),
            path,
        });
    }

    categories.sort_by(|a, b| a.name.cmp(&b.name));
    debug!(root = %scripts_root.display(), count = categories.len(), "scanned categories");
    Ok(categories)
}

/// Lists the scripts and navigable sub-folders of `folder`.
pub fn scan_entries(folder: &Path, platform: Platform) -> Result<Vec<Script>> {
    let entries = fs::read_dir(folder).map_err(|err| LauncherError::scan(folder, err))?;

    let mut scripts = Vec::new();
    for entry in entries.flatten() {
        let path = entry.path();
        let Some(name) = entry_name(&path) else {
            continue;
        };

        if path.is_dir() {
            if is_skipped_dir(&name) || !has_content(&path, platform, 0) {
                continue;
            }
            let meta = read_folder_meta(&path);
            scripts.push(Script {
                name,
                description: meta.description_or_default(),
                extension: DIR_EXTENSION.to_string(),
                icon: Some(meta.icon_or_default()),
                path,
            });
            continue;
        }

        if name.starts_with(EXAMPLE_PREFIX) {
            continue;
        }
        let Some(extension) = dotted_extension(&path) else {
            continue;
        };
        if !platform.accepts(&extension) {
            continue;
        }
        scripts.push(Script {
            description: script_description(&path),
            name,
            extension,
            icon: None,
            path,
        });
    }

    sort_entries(&mut scripts);
    debug!(folder = %folder.display(), count = scripts.len(), "scanned folder");
    Ok(scripts)
}

pub fn sort_entries(scripts: &mut [Script]) {
    scripts.sort_by(|a, b| {
        b.is_dir()
            .cmp(&a.is_dir())
            .then_with(|| a.name.cmp(&b.name))
    });
}

fn entry_name(path: &Path) -> Option<String> {
    path.file_name()
        .and_then(|name| name.to_str())
        .map(str::to_string)
}

fn is_skipped_dir(name: &str) -> bool {
    name.eq_ignore_ascii_case(RESERVED_DIR) || name.starts_with('.')
}

fn dotted_extension(path: &Path) -> Option<String> {
    path.extension()
        .and_then(|ext| ext.to_str())
        .map(|ext| format!(".{ext}"))
}

/// A folder is worth listing when it holds a script for `platform` somewhere below it.
fn has_content(folder: &Path, platform: Platform, depth: usize) -> bool {
    if depth > MAX_CONTENT_DEPTH {
        return false;
    }
    let Ok(entries) = fs::read_dir(folder) else {
        return false;
    };
    entries.flatten().any(|entry| {
        let path = entry.path();
        let Some(name) = entry_name(&path) else {
            return false;
        };
        if path.is_dir() {
            !is_skipped_dir(&name) && has_content(&path, platform, depth + 1)
        } else {
            !name.starts_with(EXAMPLE_PREFIX)
                && dotted_extension(&path)
                    .map(|ext| platform.accepts(&ext))
                    .unwrap_or(false)
        }
    })
}

#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct FolderMeta {
    pub icon: Option<String>,
    pub description: Option<String>,
}

impl FolderMeta {
    fn icon_or_default(&self) -> String {
        self.icon
            .clone()
            .unwrap_or_else(|| DEFAULT_FOLDER_ICON.to_string())
    }

    fn description_or_default(&self) -> String {
        self.description
            .clone()
            .unwrap_or_else(|| DEFAULT_FOLDER_DESCRIPTION.to_string())
    }
}

/// Icon and description from the first `readme*` file of `folder`, if any.
pub fn read_folder_meta(folder: &Path) -> FolderMeta {
    let Some(readme) = find_readme(folder) else {
        return FolderMeta::default();
    };
    match fs::read_to_string(&readme) {
        Ok(text) => parse_readme(&text),
        Err(err) => {
            warn!(path = %readme.display(), "cannot read readme: {err}");
            FolderMeta::default()
        }
    }
}

fn find_readme(folder: &Path) -> Option<PathBuf> {
    let mut candidates: Vec<PathBuf> = fs::read_dir(folder)
        .ok()?
        .flatten()
        .map(|entry| entry.path())
        .filter(|path| path.is_file())
        .filter(|path| {
            entry_name(path)
                .map(|name| name.to_lowercase().starts_with("readme"))
                .unwrap_or(false)
        })
        .collect();
    candidates.sort();
    candidates.into_iter().next()
}

pub fn parse_readme(text: &str) -> FolderMeta {
    let mut lines = text
        .lines()
        .map(|line| line.trim().trim_start_matches('#').trim())
        .filter(|line| !line.is_empty());

    let Some(first) = lines.next() else {
        return FolderMeta::default();
    };

    let (icon, rest) = match first.split_once(char::is_whitespace) {
        Some((token, rest)) if looks_like_icon(token) => (Some(token), rest.trim()),
        None if looks_like_icon(first) => (Some(first), ""),
        _ => (None, first),
    };

    let description = if icon.is_some() && !rest.is_empty() {
        Some(rest.to_string())
    } else {
        lines
            .next()
            .or((!rest.is_empty()).then_some(rest))
            .map(str::to_string)
    };

    FolderMeta {
        icon: icon.map(str::to_string),
        description,
    }
}

/// Short symbol tokens such as emoji; anything with a letter or digit is a word.
/// Punctuation is allowed but does not count as a symbol.
pub fn looks_like_icon(token: &str) -> bool {
    let token = token.trim();
    if token.is_empty() || token.chars().count() > MAX_ICON_CHARS {
        return false;
    }
    let mut has_symbol = false;
    for c in token.chars() {
        if c.is_alphanumeric() {
            return false;
        }
        if !is_punctuation(c) && !c.is_control() && !c.is_whitespace() {
            has_symbol = true;
        }
    }
    has_symbol
}

/// Unicode punctuation (the `P*` categories) for the blocks READMEs actually use.
/// ASCII math and currency signs such as `+` and `$` are symbols, not punctuation.
fn is_punctuation(c: char) -> bool {
    if c.is_ascii() {
        return c.is_ascii_punctuation()
            && !matches!(c, '$' | '+' | '<' | '=' | '>' | '^' | '`' | '|' | '~');
    }
    matches!(
        c,
        '\u{a1}' | '\u{a7}' | '\u{ab}' | '\u{b6}' | '\u{b7}' | '\u{bb}' | '\u{bf}'
            | '\u{2010}'..='\u{2027}'
            | '\u{2030}'..='\u{2043}'
            | '\u{2045}'..='\u{2051}'
            | '\u{2053}'..='\u{205e}'
            | '\u{2308}'..='\u{230b}'
            | '\u{2329}' | '\u{232a}'
            | '\u{2e00}'..='\u{2e4f}'
            | '\u{3001}'..='\u{3003}'
            | '\u{3008}'..='\u{3011}'
            | '\u{3014}'..='\u{301f}'
    )
}

/// Description from a leading comment of the script, else its humanised file stem.
pub fn script_description(path: &Path) -> String {
    if let Ok(file) = File::open(path) {
        let lines = BufReader::new(file)
            .lines()
            .map_while(|line| line.ok())
            .take(DESCRIPTION_SCAN_LINES);
        for line in lines {
            let line = line.trim();
            if line.is_empty() || line.starts_with("#!") {
                continue;
            }
            let Some(comment) = strip_comment_marker(line) else {
                continue;
            };
            let mut desc = comment.trim();
            for prefix in DESCRIPTION_PREFIXES {
                desc = desc.strip_prefix(prefix).unwrap_or(desc);
            }
            let desc = desc.trim();
            if !desc.is_empty() {
                return desc.to_string();
            }
        }
    }

    path.file_stem()
        .and_then(|stem| stem.to_str())
        .unwrap_or_default()
        .replace('_', " ")
}

fn strip_comment_marker(line: &str) -> Option<&str> {
    if let Some(rest) = line.strip_prefix("::") {
        return Some(rest);
    }
    if let Some(rest) = line.strip_prefix('#') {
        return Some(rest);
    }
    match line.get(..4) {
        Some(head) if head.eq_ignore_ascii_case("rem ") => line.get(4..),
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn readme_heading_with_emoji_sets_icon() {
        let meta = parse_readme("\n# 🚀 Build Tools\n\nCompile everything\n");
        assert_eq!(meta.icon.as_deref(), Some("🚀"));
        assert_eq!(meta.description.as_deref(), Some("Build Tools"));
    }

    #[test]
    fn readme_without_icon_uses_second_line() {
        let meta = parse_readme("# Build Tools\n\nCompile everything\n");
        assert_eq!(meta.icon, None);
        assert_eq!(meta.description.as_deref(), Some("Compile everything"));
    }

    #[test]
    fn readme_single_line_without_icon_keeps_heading() {
        let meta = parse_readme("## Deploy helpers");
        assert_eq!(meta.icon, None);
        assert_eq!(meta.description.as_deref(), Some("Deploy helpers"));
    }

    #[test]
    fn readme_lone_icon_takes_next_line() {
        let meta = parse_readme("# 🔧\nAssorted utilities");
        assert_eq!(meta.icon.as_deref(), Some("🔧"));
        assert_eq!(meta.description.as_deref(), Some("Assorted utilities"));
    }

    #[test]
    fn empty_readme_yields_nothing() {
        assert_eq!(parse_readme("\n   \n#\n"), FolderMeta::default());
    }

    #[test]
    fn icon_detection_rejects_words_and_plain_punctuation() {
        assert!(looks_like_icon("🚀"));
        assert!(looks_like_icon("🏗️"));
        assert!(!looks_like_icon("Build"));
        assert!(!looks_like_icon("v2"));
        assert!(!looks_like_icon("---"));
        assert!(looks_like_icon("+"));
        assert!(looks_like_icon("$"));
        assert!(!looks_like_icon("•"));
        assert!(!looks_like_icon("—"));
        assert!(!looks_like_icon("»"));
        assert!(looks_like_icon("•🚀"));
        assert!(!looks_like_icon("🚀🚀🚀🚀🚀🚀🚀"));
    }

    #[test]
    fn comment_markers() {
        assert_eq!(strip_comment_marker("# hi"), Some(" hi"));
        assert_eq!(strip_comment_marker(":: hi"), Some(" hi"));
        assert_eq!(strip_comment_marker("REM hi"), Some("hi"));
        assert_eq!(strip_comment_marker("echo hi"), None);
    }

    #[test]
    fn dir_entries_sort_first() {
        let make = |name: &str, ext: &str| Script {
            name: name.into(),
            path: PathBuf::from(name),
            description: String::new(),
            extension: ext.into(),
            icon: None,
        };
        let mut items = vec![
            make("b.sh", ".sh"),
            make("zeta", DIR_EXTENSION),
            make("a.sh", ".sh"),
            make("alpha", DIR_EXTENSION),
        ];
        sort_entries(&mut items);
        let names: Vec<_> = items.iter().map(|s| s.name.as_str()).collect();
        assert_eq!(names, ["alpha", "zeta", "a.sh", "b.sh"]);
    }
}
