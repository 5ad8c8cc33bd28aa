//! Script execution. Stderr is echoed and captured; stdin and stdout are inherited.

use std::ffi::OsString;
use std::io::{self, Read, Write};
use std::path::Path;
use std::process::{Command, Stdio};

use tracing::{info, warn};

use crate::catalog::Script;
use crate::error::{LauncherError, Result};

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ProcessSpec {
    pub program: String,
    pub args: Vec<OsString>,
}

impl ProcessSpec {
    fn new(program: &str, flags: &[&str], script: &Path) -> Self {
        let mut args: Vec<OsString> = flags.iter().map(OsString::from).collect();
        args.push(script.as_os_str().to_os_string());
        Self {
            program: program.to_string(),
            args,
        }
    }
}

#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct ExecutionOutcome {
    pub exit_code: i32,
    pub output: String,
}

impl ExecutionOutcome {
    fn failure(message: impl Into<String>) -> Self {
        Self {
            exit_code: 1,
            output: message.into(),
        }
    }

    pub fn succeeded(&self) -> bool {
        self.exit_code == 0
    }
}

pub fn resolve_command(script: &Script) -> Result<ProcessSpec> {
    resolve_command_with(script, |program| which::which(program).is_ok())
}

/// Same as [`resolve_command`] with an explicit search-path probe.
pub fn resolve_command_with<F>(script: &Script, on_path: F) -> Result<ProcessSpec>
where
    F: Fn(&str) -> bool,
{
    match script.extension.as_str() {
        ".sh" => Ok(ProcessSpec::new("bash", &[], &script.path)),
        ".ps1" => {
            let program = if on_path("pwsh") { "pwsh" } else { "powershell" };
            Ok(ProcessSpec::new(
                program,
                &["-ExecutionPolicy", "Bypass", "-File"],
                &script.path,
            ))
        }
        ".bat" => Ok(ProcessSpec::new("cmd.exe", &["/c"], &script.path)),
        other => Err(LauncherError::UnsupportedScriptKind(other.to_string())),
    }
}

/// Runs `script` in `working_dir` and waits for it. Never fails: launch problems are
/// reported as exit code 1 with the error text as output.
pub fn execute(script: &Script, working_dir: &Path) -> ExecutionOutcome {
    let spec = match resolve_command(script) {
        Ok(spec) => spec,
        Err(err) => {
            warn!(script = %script.name, "{err}");
            return ExecutionOutcome::failure(err.to_string());
        }
    };
    match run(&spec, working_dir) {
        Ok(outcome) => {
            info!(script = %script.name, code = outcome.exit_code, "script finished");
            outcome
        }
        Err(err) => {
            warn!(script = %script.name, "{err}");
            ExecutionOutcome::failure(err.to_string())
        }
    }
}

fn run(spec: &ProcessSpec, working_dir: &Path) -> Result<ExecutionOutcome> {
    info!(program = %spec.program, dir = %working_dir.display(), "starting script");
    let launch_error = |source: io::Error| LauncherError::ProcessLaunch {
        program: spec.program.clone(),
        source,
    };

    let mut child = Command::new(&spec.program)
        .args(&spec.args)
        .current_dir(working_dir)
        .stdin(Stdio::inherit())
        .stdout(Stdio::inherit())
        .stderr(Stdio::piped())
        .spawn()
        .map_err(launch_error)?;

    let mut captured = Vec::new();
    if let Some(mut stderr) = child.stderr.take() {
        let mut terminal = io::stderr();
        let mut buf = [0u8; 1024];
        loop {
            match stderr.read(&mut buf) {
                Ok(0) => break,
                Ok(n) => {
                    captured.extend_from_slice(&buf[..n]);
                    let _ = terminal.write_all(&buf[..n]);
                }
                Err(err) if err.kind() == io::ErrorKind::Interrupted => continue,
                Err(_) => break,
            }
        }
    }

    let status = child.wait().map_err(launch_error)?;
    Ok(ExecutionOutcome {
        exit_code: status.code().unwrap_or(1),
        output: String::from_utf8_lossy(&captured).into_owned(),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::path::PathBuf;

    fn script(name: &str, extension: &str) -> Script {
        Script {
            name: name.into(),
            path: PathBuf::from("/scripts").join(name),
            description: String::new(),
            extension: extension.into(),
            icon: None,
        }
    }

    #[test]
    fn shell_scripts_run_through_bash() {
        let spec = resolve_command(&script("build.sh", ".sh")).unwrap();
        assert_eq!(spec.program, "bash");
        assert_eq!(spec.args, vec![OsString::from("/scripts/build.sh")]);
    }

    #[test]
    fn powershell_prefers_pwsh_when_available() {
        let target = script("setup.ps1", ".ps1");
        let with_pwsh = resolve_command_with(&target, |p| p == "pwsh").unwrap();
        assert_eq!(with_pwsh.program, "pwsh");
        assert_eq!(with_pwsh.args[..2], [OsString::from("-ExecutionPolicy"), OsString::from("Bypass")]);

        let legacy = resolve_command_with(&target, |_| false).unwrap();
        assert_eq!(legacy.program, "powershell");
        assert_eq!(legacy.args.last(), Some(&OsString::from("/scripts/setup.ps1")));
    }

    #[test]
    fn batch_files_use_cmd() {
        let spec = resolve_command(&script("run.bat", ".bat")).unwrap();
        assert_eq!(spec.program, "cmd.exe");
        assert_eq!(spec.args[0], OsString::from("/c"));
    }

    #[test]
    fn unknown_extension_fails_without_spawning() {
        let outcome = execute(&script("weird.xyz", ".xyz"), Path::new("/definitely/missing"));
        assert_eq!(outcome.exit_code, 1);
        assert!(outcome.output.contains(".xyz"));
    }

    #[cfg(unix)]
    #[test]
    fn exit_code_and_stderr_are_reported() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("fail.sh");
        std::fs::write(&path, "echo boom >&2\nexit 3\n").unwrap();
        let target = Script {
            path,
            ..script("fail.sh", ".sh")
        };
        let outcome = execute(&target, dir.path());
        assert_eq!(outcome.exit_code, 3);
        assert!(outcome.output.contains("boom"));
    }

    #[cfg(unix)]
    #[test]
    fn scripts_run_in_the_working_directory() {
        let dir = tempfile::tempdir().unwrap();
        let work = tempfile::tempdir().unwrap();
        let path = dir.path().join("touch.sh");
        std::fs::write(&path, "touch marker\n").unwrap();
        let target = Script {
            path,
            ..script("touch.sh", ".sh")
        };
        assert!(execute(&target, work.path()).succeeded());
        assert!(work.path().join("marker").exists());
    }

    #[test]
    fn invalid_working_directory_is_a_launch_failure() {
        let target = script("build.sh", ".sh");
        let outcome = execute(&target, Path::new("/definitely/not/here"));
        assert_eq!(outcome.exit_code, 1);
        assert!(!outcome.output.is_empty());
    }
}
