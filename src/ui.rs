//! Drawing. Everything here reads state; nothing here changes it.

use std::fmt::Write as _;
use std::path::Path;

use ratatui::layout::{Constraint, Direction, Layout, Margin};
use ratatui::prelude::{Alignment, Rect};
use ratatui::style::{Color, Modifier, Style};
use ratatui::text::{Line, Span, Text};
use ratatui::widgets::{Block, Borders, Clear, List, ListItem, ListState, Paragraph, Wrap};
use ratatui::Frame;
use unicode_width::UnicodeWidthStr;

use crate::catalog::{self, ListEntry};
use crate::error::LauncherError;
use crate::navigator::{NavigationState, Navigator, QUICK_SELECT_MAX};
use crate::platform::Platform;
use crate::sanitize::sanitize_output;
use crate::terminal::{CommandTerminal, ERROR_MARK};

/// Read-only view of everything a frame needs.
pub struct Snapshot<'a> {
    pub navigator: &'a Navigator,
    pub terminal: &'a CommandTerminal,
    pub theme: &'a Theme,
    pub title: &'a str,
    pub root: &'a Path,
}

pub fn render(frame: &mut Frame, view: &Snapshot<'_>) {
    let theme = view.theme;
    let size = frame.size();
    frame.render_widget(
        Block::default().style(Style::default().bg(theme.background)),
        size,
    );

    let chunks = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Length(1),
            Constraint::Length(1),
            Constraint::Min(1),
            Constraint::Length(1),
            Constraint::Length(1),
        ])
        .split(size);

    let header_text = view.navigator.header().unwrap_or(view.title).to_string();
    let header = Paragraph::new(header_text)
        .alignment(Alignment::Center)
        .style(
            Style::default()
                .fg(theme.text)
                .bg(theme.primary)
                .add_modifier(Modifier::BOLD),
        );
    frame.render_widget(header, chunks[0]);

    let breadcrumb = Paragraph::new(breadcrumb_line(view)).style(Style::default().bg(theme.surface));
    frame.render_widget(breadcrumb, chunks[1]);

    let content_area = chunks[2];
    frame.render_widget(
        Block::default().style(Style::default().bg(theme.surface)),
        content_area,
    );
    let inner = content_area.inner(&Margin {
        vertical: 1,
        horizontal: 1,
    });

    let (list_area, terminal_area) = if view.terminal.is_active() {
        let terminal_height = (size.height / 3).clamp(6, 16);
        let split = Layout::default()
            .direction(Direction::Vertical)
            .constraints([Constraint::Min(3), Constraint::Length(terminal_height)])
            .split(inner);
        (split[0], Some(split[1]))
    } else {
        (inner, None)
    };

    match view.navigator.state() {
        NavigationState::CategoryView | NavigationState::ScriptView { .. } => {
            render_listing(frame, list_area, view)
        }
        NavigationState::ExecutingView { script, .. } => {
            let text = vec![
                Line::from(Span::styled(
                    format!("⚡ Running: {}", script.name),
                    Style::default().fg(theme.text).add_modifier(Modifier::BOLD),
                )),
                Line::from(""),
                Line::from(Span::styled(
                    "The script is running...",
                    Style::default().fg(theme.highlight),
                )),
            ];
            frame.render_widget(Paragraph::new(text), list_area);
        }
        NavigationState::ResultView {
            script, outcome, ..
        } => {
            let mut text = Vec::new();
            if outcome.succeeded() {
                text.push(Line::from(Span::styled(
                    format!("✓ {} completed successfully", script.name),
                    Style::default().fg(theme.success).add_modifier(Modifier::BOLD),
                )));
            } else {
                text.push(Line::from(Span::styled(
                    format!("✗ {} failed with code {}", script.name, outcome.exit_code),
                    Style::default().fg(theme.error).add_modifier(Modifier::BOLD),
                )));
            }
            let output = sanitize_output(&outcome.output);
            if !output.is_empty() {
                text.push(Line::from(""));
                text.push(Line::from(Span::styled(
                    "Error output:",
                    Style::default().fg(theme.error),
                )));
                text.extend(
                    output
                        .into_iter()
                        .map(|line| Line::from(Span::styled(line, Style::default().fg(theme.text)))),
                );
            }
            frame.render_widget(
                Paragraph::new(text).wrap(Wrap { trim: false }),
                list_area,
            );
        }
    }

    if let Some(area) = terminal_area {
        render_terminal(frame, area, view);
    }

    let shortcuts = Paragraph::new(shortcut_line(view))
        .alignment(Alignment::Center)
        .style(Style::default().bg(theme.highlight));
    frame.render_widget(shortcuts, chunks[3]);

    let status = Paragraph::new(status_text(view))
        .alignment(Alignment::Center)
        .style(
            Style::default()
                .bg(theme.primary)
                .fg(theme.text)
                .add_modifier(Modifier::BOLD),
        );
    frame.render_widget(status, chunks[4]);
}

fn breadcrumb_line(view: &Snapshot<'_>) -> Line<'static> {
    let parts = view.navigator.breadcrumb();
    let mut spans = Vec::new();
    for (index, part) in parts.into_iter().enumerate() {
        if index > 0 {
            spans.push(Span::styled(" › ", Style::default().fg(view.theme.highlight)));
        }
        spans.push(Span::styled(
            part,
            Style::default()
                .fg(view.theme.text)
                .add_modifier(Modifier::BOLD),
        ));
    }
    spans.push(Span::styled(
        format!("   {}", view.root.display()),
        Style::default().fg(view.theme.highlight),
    ));
    Line::from(spans)
}

fn render_listing(frame: &mut Frame, area: Rect, view: &Snapshot<'_>) {
    let theme = view.theme;
    let navigator = view.navigator;
    let listing = navigator.listing();

    let mut heading = Vec::new();
    if let NavigationState::ScriptView { category, path } = navigator.state() {
        let folder = path
            .file_name()
            .map(|name| name.to_string_lossy().into_owned())
            .unwrap_or_else(|| category.name.clone());
        heading.push(Line::from(Span::styled(
            format!("{}  {folder}", category.icon),
            Style::default().fg(theme.text).add_modifier(Modifier::BOLD),
        )));
        heading.push(Line::from(Span::styled(
            format!("{} item(s) available", listing.entries.len()),
            Style::default().fg(theme.highlight),
        )));
    } else {
        heading.push(Line::from(Span::styled(
            "Select a category",
            Style::default().fg(theme.text).add_modifier(Modifier::BOLD),
        )));
    }

    let message = if navigator.is_loading() {
        Some(("Loading...".to_string(), theme.highlight))
    } else if let Some(notice) = navigator.notice() {
        Some((format!("{ERROR_MARK}{notice}"), theme.error))
    } else if listing.entries.is_empty() {
        let text = if matches!(navigator.state(), NavigationState::CategoryView) {
            "No categories found"
        } else {
            "No items found in this folder"
        };
        Some((format!("{ERROR_MARK}{text}"), theme.error))
    } else {
        None
    };

    let split = Layout::default()
        .direction(Direction::Vertical)
        .constraints([Constraint::Length(heading.len() as u16 + 1), Constraint::Min(1)])
        .split(area);
    frame.render_widget(Paragraph::new(heading), split[0]);

    if let Some((text, color)) = message {
        frame.render_widget(
            Paragraph::new(Span::styled(text, Style::default().fg(color))),
            split[1],
        );
        return;
    }

    let width = split[1].width as usize;
    let items: Vec<ListItem> = listing
        .entries
        .iter()
        .enumerate()
        .map(|(index, entry)| {
            list_item(index, entry, index == navigator.selected(), width, theme)
        })
        .collect();
    let list = List::new(items);
    let mut state = ListState::default().with_selected(Some(navigator.selected()));
    frame.render_stateful_widget(list, split[1], &mut state);
}

fn list_item(
    index: usize,
    entry: &ListEntry<'_>,
    selected: bool,
    width: usize,
    theme: &Theme,
) -> ListItem<'static> {
    let prefix = if index < QUICK_SELECT_MAX {
        format!("  [{}] ", index + 1)
    } else {
        "      ".to_string()
    };
    let is_folder = match entry {
        ListEntry::Category(_) => true,
        ListEntry::Script(script) => script.is_dir(),
    };
    let title_style = if is_folder {
        Style::default().fg(theme.accent).add_modifier(Modifier::BOLD)
    } else {
        Style::default().fg(theme.text)
    };

    let mut title = Line::from(vec![
        Span::styled(prefix, Style::default().fg(theme.text)),
        Span::styled(entry.display_title(), title_style),
    ]);
    if selected {
        title = highlight_line_with_width(title, width, theme);
    }

    let mut lines = vec![title];
    let description = entry.display_description();
    if !description.is_empty() {
        lines.push(Line::from(Span::styled(
            format!("      {description}"),
            Style::default().fg(theme.highlight),
        )));
    }
    ListItem::new(Text::from(lines))
}

fn highlight_line_with_width(mut line: Line<'static>, width: usize, theme: &Theme) -> Line<'static> {
    let mut text_width = 0usize;
    let highlight_style = Style::default()
        .fg(theme.background)
        .bg(theme.highlight)
        .add_modifier(Modifier::BOLD);
    for span in &mut line.spans {
        span.style = highlight_style;
        text_width += UnicodeWidthStr::width(span.content.as_ref());
    }
    if width > text_width {
        line.spans
            .push(Span::styled(" ".repeat(width - text_width), highlight_style));
    }
    line
}

fn render_terminal(frame: &mut Frame, area: Rect, view: &Snapshot<'_>) {
    let theme = view.theme;
    let terminal = view.terminal;
    frame.render_widget(Clear, area);
    let block = Block::default()
        .title(" Command Terminal ")
        .borders(Borders::ALL)
        .style(Style::default().bg(theme.background).fg(theme.text));
    let inner = block.inner(area);
    frame.render_widget(block, area);

    let rows = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Length(1),
            Constraint::Min(1),
            Constraint::Length(1),
        ])
        .split(inner);

    let prompt = Line::from(vec![
        Span::styled("> ", Style::default().fg(theme.accent).add_modifier(Modifier::BOLD)),
        Span::raw(terminal.input().to_string()),
        Span::styled("█", Style::default().fg(theme.highlight)),
    ]);
    frame.render_widget(Paragraph::new(prompt), rows[0]);

    let output: Vec<Line> = terminal
        .visible_output(rows[1].height as usize)
        .iter()
        .map(|line| {
            let color = if line.starts_with(ERROR_MARK) {
                theme.error
            } else {
                theme.text
            };
            Line::from(Span::styled(line.clone(), Style::default().fg(color)))
        })
        .collect();
    frame.render_widget(Paragraph::new(output), rows[1]);

    let hint = Paragraph::new("tab: complete  enter: run  esc: close  PgUp/PgDn: scroll")
        .style(Style::default().fg(theme.highlight));
    frame.render_widget(hint, rows[2]);
}

struct Shortcut {
    key: &'static str,
    label: &'static str,
}

const LIST_SHORTCUTS: &[Shortcut] = &[
    Shortcut { key: "1-9", label: " Pick" },
    Shortcut { key: "↑↓/jk", label: " Move" },
    Shortcut { key: "↵", label: " Open/Run" },
    Shortcut { key: ":", label: " Terminal" },
    Shortcut { key: "./0/esc", label: " Back" },
    Shortcut { key: "q", label: " Quit" },
];

const RESULT_SHORTCUTS: &[Shortcut] = &[
    Shortcut { key: "↵/./0/esc", label: " Back" },
    Shortcut { key: "q", label: " Quit" },
];

fn shortcut_line(view: &Snapshot<'_>) -> Line<'static> {
    let theme = view.theme;
    let shortcuts: &[Shortcut] = match view.navigator.state() {
        NavigationState::CategoryView | NavigationState::ScriptView { .. } => LIST_SHORTCUTS,
        NavigationState::ResultView { .. } => RESULT_SHORTCUTS,
        NavigationState::ExecutingView { .. } => &[],
    };
    let key_style = Style::default()
        .fg(theme.accent)
        .bg(theme.highlight)
        .add_modifier(Modifier::BOLD);
    let label_style = Style::default().fg(theme.background).bg(theme.highlight);
    let mut spans = Vec::new();
    for (index, shortcut) in shortcuts.iter().enumerate() {
        if index > 0 {
            spans.push(Span::styled(" | ", label_style));
        }
        spans.push(Span::styled(shortcut.key, key_style));
        spans.push(Span::styled(shortcut.label, label_style));
    }
    Line::from(spans)
}

fn status_text(view: &Snapshot<'_>) -> String {
    let navigator = view.navigator;
    let total = navigator.current_len();
    let current = if total == 0 { 0 } else { navigator.selected() + 1 };
    format!(
        "Item {current}/{total} | Run dir: {} | Theme: {}",
        view.terminal.run_dir().display(),
        view.theme.name
    )
}

/// Plain-text catalog for `--list`.
pub fn catalog_report(scripts_root: &Path, platform: Platform) -> Result<String, LauncherError> {
    let categories = catalog::scan_categories(scripts_root, platform)?;
    let mut out = String::new();
    let mut total = 0usize;
    for category in &categories {
        let _ = writeln!(out, "\n{} {}", category.icon, category.name);
        let _ = writeln!(out, "{}\n", category.description);
        let entries = catalog::scan_entries(&category.path, platform).unwrap_or_default();
        for entry in &entries {
            let name = if entry.is_dir() {
                format!("{}/", entry.name)
            } else {
                entry.name.clone()
            };
            let _ = writeln!(out, "  • {name}");
            if !entry.description.is_empty() {
                let _ = writeln!(out, "    ── {}", entry.description);
            }
        }
        total += category.script_count;
    }
    let _ = writeln!(out, "\n{}", "─".repeat(60));
    let _ = writeln!(
        out,
        "Total: {total} scripts in {} categories",
        categories.len()
    );
    Ok(out)
}

#[derive(Clone, Debug)]
pub struct Theme {
    pub name: String,
    pub primary: Color,
    pub accent: Color,
    pub highlight: Color,
    pub background: Color,
    pub surface: Color,
    pub text: Color,
    pub success: Color,
    pub error: Color,
}

struct ThemeDefinition {
    name: &'static str,
    primary: &'static str,
    accent: &'static str,
    highlight: &'static str,
    background: &'static str,
    surface: &'static str,
    text: &'static str,
}

const THEME_PRESETS: &[(&str, ThemeDefinition)] = &[
    (
        "classic",
        ThemeDefinition {
            name: "Midnight Classic",
            primary: "#6FC6D4",
            accent: "#0F1A2B",
            highlight: "#9FE6EC",
            background: "#314A63",
            surface: "#416079",
            text: "#F2F8FF",
        },
    ),
    (
        "nord",
        ThemeDefinition {
            name: "Nord",
            primary: "#5E81AC",
            accent: "#D08770",
            highlight: "#76B3C5",
            background: "#3B4252",
            surface: "#4C566A",
            text: "#ECEFF4",
        },
    ),
    (
        "mist",
        ThemeDefinition {
            name: "Midnight Mist",
            primary: "#66C3CF",
            accent: "#0E1828",
            highlight: "#96DFE8",
            background: "#2C4156",
            surface: "#3B5A72",
            text: "#F4FBFF",
        },
    ),
];

impl Theme {
    /// Preset by key, falling back to Nord for unknown keys.
    pub fn from_name(key: &str) -> Self {
        THEME_PRESETS
            .iter()
            .find(|(preset, _)| preset.eq_ignore_ascii_case(key))
            .or_else(|| THEME_PRESETS.iter().find(|(preset, _)| *preset == "nord"))
            .map(|(_, def)| Theme::from_definition(def))
            .unwrap_or_else(Theme::fallback)
    }

    fn from_definition(def: &ThemeDefinition) -> Self {
        Theme {
            name: def.name.to_string(),
            primary: color_from_hex(def.primary).unwrap_or(Color::Blue),
            accent: color_from_hex(def.accent).unwrap_or(Color::Cyan),
            highlight: color_from_hex(def.highlight).unwrap_or(Color::Cyan),
            background: color_from_hex(def.background).unwrap_or(Color::Black),
            surface: color_from_hex(def.surface).unwrap_or(Color::DarkGray),
            text: color_from_hex(def.text).unwrap_or(Color::White),
            success: Color::LightGreen,
            error: Color::LightRed,
        }
    }

    fn fallback() -> Self {
        Theme {
            name: "Terminal".into(),
            primary: Color::Blue,
            accent: Color::Cyan,
            highlight: Color::Cyan,
            background: Color::Black,
            surface: Color::DarkGray,
            text: Color::White,
            success: Color::LightGreen,
            error: Color::LightRed,
        }
    }
}

fn color_from_hex(value: &str) -> Option<Color> {
    let hex = value.trim().trim_start_matches('#');
    if hex.len() != 6 {
        return None;
    }
    let r = u8::from_str_radix(hex.get(0..2)?, 16).ok()?;
    let g = u8::from_str_radix(hex.get(2..4)?, 16).ok()?;
    let b = u8::from_str_radix(hex.get(4..6)?, 16).ok()?;
    Some(Color::Rgb(r, g, b))
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;

    #[test]
    fn hex_colors_parse() {
        assert_eq!(color_from_hex("#5E81AC"), Some(Color::Rgb(0x5E, 0x81, 0xAC)));
        assert_eq!(color_from_hex("fff"), None);
        assert_eq!(color_from_hex("#zzzzzz"), None);
    }

    #[test]
    fn unknown_theme_falls_back_to_nord() {
        assert_eq!(Theme::from_name("Classic").name, "Midnight Classic");
        assert_eq!(Theme::from_name("solarized").name, "Nord");
    }

    #[test]
    fn report_lists_categories_and_totals() {
        let dir = tempfile::tempdir().unwrap();
        let build = dir.path().join("build");
        fs::create_dir_all(&build).unwrap();
        fs::write(build.join("README.md"), "# 🚀 Build Tools\n").unwrap();
        fs::write(build.join("compile.sh"), "#!/bin/bash\n# Description: Compile it\n").unwrap();

        let report = catalog_report(dir.path(), Platform::Unix).unwrap();
        assert!(report.contains("🚀 build"));
        assert!(report.contains("Build Tools"));
        assert!(report.contains("  • compile.sh"));
        assert!(report.contains("    ── Compile it"));
        assert!(report.contains("Total: 1 scripts in 1 categories"));
    }

    #[test]
    fn report_fails_on_missing_root() {
        let dir = tempfile::tempdir().unwrap();
        assert!(catalog_report(&dir.path().join("nope"), Platform::Unix).is_err());
    }
}
