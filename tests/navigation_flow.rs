use std::fs;
use std::path::{Path, PathBuf};

use script_launcher::catalog::{scan_categories, scan_entries};
use script_launcher::navigator::{Completion, Effect, NavInput, NavigationState, Navigator};
use script_launcher::platform::Platform;
use script_launcher::terminal::{CommandTerminal, TerminalEffect};

fn write(path: &Path, contents: &str) {
    fs::create_dir_all(path.parent().unwrap()).unwrap();
    fs::write(path, contents).unwrap();
}

/// Carries out scan effects synchronously and returns whatever is left.
fn run(nav: &mut Navigator, scripts_root: &Path, effect: Effect) -> Effect {
    match effect {
        Effect::ScanCategories => {
            nav.apply(Completion::Categories(scan_categories(scripts_root, Platform::Unix)));
            Effect::None
        }
        Effect::ScanFolder(path) => {
            let result = scan_entries(&path, Platform::Unix);
            nav.apply(Completion::Entries { path, result });
            Effect::None
        }
        other => other,
    }
}

fn tree() -> (tempfile::TempDir, PathBuf) {
    let dir = tempfile::tempdir().unwrap();
    let scripts = dir.path().join("scripts/linux");
    write(&scripts.join("a/b/deep.sh"), "# Deep script\n");
    write(&scripts.join("a/top.sh"), "# Top script\n");
    write(&scripts.join("z/other.sh"), "# Other\n");
    (dir, scripts)
}

#[test]
fn descend_and_back_out_of_nested_folder() {
    let (_dir, scripts) = tree();
    let mut nav = Navigator::new("Launcher", None);
    let effect = nav.start();
    run(&mut nav, &scripts, effect);
    assert_eq!(nav.categories().len(), 2);

    let effect = nav.handle_input(NavInput::QuickSelect(1));
    run(&mut nav, &scripts, effect);
    let names: Vec<_> = nav.entries().iter().map(|e| e.name.clone()).collect();
    assert_eq!(names, ["b", "top.sh"]);

    let effect = nav.handle_input(NavInput::Select);
    run(&mut nav, &scripts, effect);
    assert_eq!(nav.breadcrumb(), ["Home", "a", "b"]);
    assert_eq!(nav.entries()[0].name, "deep.sh");

    let effect = nav.handle_input(NavInput::Back);
    run(&mut nav, &scripts, effect);
    match nav.state() {
        NavigationState::ScriptView { path, .. } => assert_eq!(path, &scripts.join("a")),
        other => panic!("unexpected state {other:?}"),
    }
    assert_eq!(nav.selected(), 0);

    let effect = nav.handle_input(NavInput::Back);
    run(&mut nav, &scripts, effect);
    assert_eq!(nav.state(), &NavigationState::CategoryView);
    assert_eq!(nav.handle_input(NavInput::Back), Effect::Quit);
}

#[test]
fn selecting_a_script_requests_execution() {
    let (_dir, scripts) = tree();
    let mut nav = Navigator::new("Launcher", None);
    let effect = nav.start();
    run(&mut nav, &scripts, effect);
    let effect = nav.handle_input(NavInput::QuickSelect(1));
    run(&mut nav, &scripts, effect);

    match nav.handle_input(NavInput::QuickSelect(2)) {
        Effect::Execute(script) => assert_eq!(script.name, "top.sh"),
        other => panic!("unexpected effect {other:?}"),
    }
    assert!(nav.is_executing());
}

#[test]
fn terminal_search_and_jump_use_the_current_listing() {
    let (dir, scripts) = tree();
    let mut nav = Navigator::new("Launcher", None);
    let effect = nav.start();
    run(&mut nav, &scripts, effect);

    let mut terminal = CommandTerminal::with_home(dir.path().to_path_buf(), None);
    let listing = nav.listing();
    assert_eq!(terminal.handle_command("search z", &listing), TerminalEffect::None);
    assert_eq!(terminal.output()[0], "Searching: z");
    assert_eq!(terminal.output().len(), 2);

    assert_eq!(terminal.handle_command(":2", &listing), TerminalEffect::Select(1));
    drop(listing);

    let effect = nav.select(1);
    run(&mut nav, &scripts, effect);
    assert_eq!(nav.breadcrumb(), ["Home", "z"]);
}
