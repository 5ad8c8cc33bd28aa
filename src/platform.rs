use std::fs;
use std::path::{Path, PathBuf};

/// Script set served to the host. macOS shares the Unix scripts.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Platform {
    Unix,
    Windows,
}

impl Platform {
    pub fn detect() -> Self {
        Self::from_os(std::env::consts::OS)
    }

    pub fn from_os(os: &str) -> Self {
        if os.eq_ignore_ascii_case("windows") {
            Platform::Windows
        } else {
            Platform::Unix
        }
    }

    /// Directory token under `scripts/`.
    pub fn token(self) -> &'static str {
        match self {
            Platform::Unix => "linux",
            Platform::Windows => "win",
        }
    }

    pub fn script_extensions(self) -> &'static [&'static str] {
        match self {
            Platform::Unix => &[".sh"],
            Platform::Windows => &[".ps1", ".bat"],
        }
    }

    pub fn accepts(self, extension: &str) -> bool {
        self.script_extensions().contains(&extension)
    }

    pub fn scripts_path(self, root: &Path) -> PathBuf {
        root.join("scripts").join(self.token())
    }
}

/// First whitespace-delimited token of the first line of `<root>/VERSION.txt`.
pub fn read_version(root: &Path) -> Option<String> {
    let data = fs::read_to_string(root.join("VERSION.txt")).ok()?;
    data.lines()
        .next()
        .and_then(|line| line.split_whitespace().next())
        .map(str::to_string)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn macos_uses_unix_scripts() {
        assert_eq!(Platform::from_os("macos"), Platform::Unix);
        assert_eq!(Platform::from_os("linux"), Platform::Unix);
        assert_eq!(Platform::from_os("windows"), Platform::Windows);
    }

    #[test]
    fn extension_sets_are_disjoint() {
        assert!(Platform::Unix.accepts(".sh"));
        assert!(!Platform::Unix.accepts(".ps1"));
        assert!(Platform::Windows.accepts(".bat"));
        assert!(!Platform::Windows.accepts(".sh"));
    }

    #[test]
    fn scripts_path_uses_platform_token() {
        let root = Path::new("/opt/launcher");
        assert_eq!(
            Platform::Windows.scripts_path(root),
            Path::new("/opt/launcher/scripts/win")
        );
    }

    #[test]
    fn version_is_first_token() {
        let dir = tempfile::tempdir().unwrap();
        fs::write(dir.path().join("VERSION.txt"), "  v1.4.2 (stable)\nnotes\n").unwrap();
        assert_eq!(read_version(dir.path()).as_deref(), Some("v1.4.2"));

        fs::write(dir.path().join("VERSION.txt"), "\nv1.4.2\n").unwrap();
        assert_eq!(read_version(dir.path()), None);
    }

    #[test]
    fn missing_version_is_none() {
        let dir = tempfile::tempdir().unwrap();
        assert_eq!(read_version(dir.path()), None);
    }
}
