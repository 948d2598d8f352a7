use crate::command::{CommandFactory, ExecutableCommand, ExitCode};
use crate::env::Environment;
use crate::error::ShellError;
use crate::interpreter::Factory;
use crate::lexer::CommandLine;
use anyhow::{Context, Result};
use nix::errno::Errno;
use std::borrow::Cow;
use std::ffi::{OsStr, OsString};
use std::io::{ErrorKind, Write};
use std::os::unix::process::CommandExt;
use std::path::{Path, PathBuf};
use std::process::{Child, ExitStatus};
use tracing::debug;

/// Exit code reported when the program cannot be started.
const NOT_FOUND_EXIT_CODE: ExitCode = 1;

/// Command that is not a builtin.
pub struct ExternalCommand {
    name: OsString,
    executable: PathBuf,
    args: Vec<OsString>,
    background: bool,
}

impl ExternalCommand {
    pub fn new(name: OsString, executable: PathBuf, args: Vec<OsString>, background: bool) -> Self {
        Self {
            name,
            executable,
            args,
            background,
        }
    }
}

/// Stand-in for a program that could not be resolved.
struct NotFound {
    name: String,
}

impl ExecutableCommand for NotFound {
    fn execute(self: Box<Self>, stdout: &mut dyn Write, _env: &mut Environment) -> Result<ExitCode> {
        writeln!(stdout, "{}", ShellError::ProgramNotFound(self.name))?;
        Ok(NOT_FOUND_EXIT_CODE)
    }
}

impl CommandFactory for Factory<ExternalCommand> {
    fn try_create(
        &self,
        env: &Environment,
        line: &CommandLine<'_>,
    ) -> Option<Box<dyn ExecutableCommand>> {
        let name = line.program();
        let search_paths = env.get_var("PATH").unwrap_or_default();
        let resolved = find_command_path(OsStr::new(&search_paths), Path::new(name))
            .map(|found| found.into_owned());
        Some(match resolved {
            Some(executable) => Box::new(ExternalCommand::new(
                name.into(),
                executable,
                line.args()[1..].iter().map(|x| x.into()).collect(),
                line.is_background(),
            )),
            None => Box::new(NotFound {
                name: name.to_string(),
            }),
        })
    }
}

impl ExecutableCommand for ExternalCommand {
    fn execute(self: Box<Self>, stdout: &mut dyn Write, env: &mut Environment) -> Result<ExitCode> {
        let spawned = std::process::Command::new(&self.executable)
            .arg0(&self.name)
            .args(&self.args)
            .envs(env.vars.iter().map(|(k, v)| (k.as_str(), v.as_str())))
            .current_dir(&env.current_dir)
            .spawn();

        let child = match spawned {
            Ok(child) => child,
            Err(e) if matches!(e.kind(), ErrorKind::NotFound | ErrorKind::PermissionDenied) => {
                debug!(program = ?self.name, error = %e, "exec failed");
                let name = self.name.to_string_lossy().into_owned();
                writeln!(stdout, "{}", ShellError::ProgramNotFound(name))?;
                return Ok(NOT_FOUND_EXIT_CODE);
            }
            Err(e) => {
                return Err(e).with_context(|| {
                    format!("failed to spawn {}", self.executable.display())
                });
            }
        };

        if self.background {
            // The handle is dropped without waiting; the reaper collects the child.
            debug!(pid = child.id(), program = ?self.name, "started background job");
            return Ok(0);
        }
        debug!(pid = child.id(), program = ?self.name, "waiting for foreground job");
        wait_foreground(child)
    }
}

fn wait_foreground(mut child: Child) -> Result<ExitCode> {
    let pid = child.id();
    match child.wait() {
        Ok(exit_status) => Ok(exit_code(exit_status)),
        // The reaper got to the child first; its status is gone.
        Err(e) if e.raw_os_error() == Some(Errno::ECHILD as i32) => {
            debug!(pid, "foreground job already reaped");
            Ok(0)
        }
        Err(e) => Err(e).with_context(|| format!("failed to wait for process {}", pid)),
    }
}

fn exit_code(exit_status: ExitStatus) -> ExitCode {
    match exit_status.code() {
        Some(x) => x,
        None => terminated_by_signal(exit_status),
    }
}

fn terminated_by_signal(exit_status: ExitStatus) -> ExitCode {
    use std::os::unix::process::ExitStatusExt;
    if let Some(signal) = ExitStatusExt::signal(&exit_status) {
        128 + signal
    } else if ExitStatusExt::core_dumped(&exit_status) {
        255
    } else {
        -1
    }
}

/// Resolve a command path the way a typical shell would.
///
/// Behavior:
/// - Absolute path: returns it if it is an executable file.
/// - Relative with multiple components (e.g., `bin/sh`): same, relative to the current dir.
/// - `./foo`: returns it if it is an executable file in the current dir.
/// - Single path component (no separators): search each directory in `search_paths` (PATH)
///   and return the first executable match.
/// - Empty path: returns `None`.
///
/// Returns either a borrowed reference to the provided `path` or an owned `PathBuf`
/// when the result is discovered via PATH lookup.
pub fn find_command_path<'a>(search_paths: &OsStr, path: &'a Path) -> Option<Cow<'a, Path>> {
    if path.is_absolute() || path.starts_with("./") {
        return find_by_path(path).map(Cow::Borrowed);
    }

    let mut components = path.components();
    let first = components.next();
    let second = components.next();
    match (first, second) {
        (None, None) => None,
        (Some(x), None) => find_in_path(search_paths, x.as_os_str()).map(Cow::Owned),
        _ => find_by_path(path).map(Cow::Borrowed),
    }
}

fn find_in_path(search_paths: &OsStr, cmd: &OsStr) -> Option<PathBuf> {
    std::env::split_paths(search_paths)
        .map(|dir| dir.join(cmd))
        .find(|path| is_executable(path))
}

fn find_by_path(path: &Path) -> Option<&Path> {
    if is_executable(path) { Some(path) } else { None }
}

fn is_executable(path: &Path) -> bool {
    use std::os::unix::fs::PermissionsExt;
    match path.metadata() {
        Ok(meta) => meta.is_file() && meta.permissions().mode() & 0o111 != 0,
        Err(_) => false,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::lexer::tokenize;
    use std::fs;
    use std::num::NonZeroUsize;
    use std::os::unix::fs::PermissionsExt;
    use std::sync::{Mutex, MutexGuard, OnceLock};

    fn osstr(s: &str) -> &OsStr {
        OsStr::new(s)
    }

    fn lock_current_dir() -> MutexGuard<'static, ()> {
        static MUTEX: OnceLock<Mutex<()>> = OnceLock::new();
        MUTEX.get_or_init(|| Mutex::new(())).lock().unwrap()
    }

    fn touch_executable(path: &Path) {
        fs::write(path, "#!/bin/sh\nexit 0\n").expect("write script");
        fs::set_permissions(path, fs::Permissions::from_mode(0o755)).expect("chmod");
    }

    fn run_line(line: &str) -> (ExitCode, String) {
        let mut env = Environment::new(NonZeroUsize::new(10).unwrap());
        let parsed = tokenize(Some(line), 128).unwrap();
        let cmd = Factory::<ExternalCommand>::default()
            .try_create(&env, &parsed)
            .expect("external factory accepts any name");
        let mut out = Vec::new();
        let code = cmd.execute(&mut out, &mut env).unwrap();
        (code, String::from_utf8(out).unwrap())
    }

    #[test]
    fn absolute_existing_true() {
        let path = Path::new("/bin/sh");
        let res = find_command_path(osstr("/bin"), path);
        assert!(res.is_some(), "Expected to find /bin/sh via absolute path");
        assert_eq!(res.unwrap().as_ref(), path);
    }

    #[test]
    fn absolute_nonexisting() {
        let res = find_command_path(osstr("/bin"), Path::new("/bin/nonexisting"));
        assert!(res.is_none());
    }

    #[test]
    fn directory_is_not_a_command() {
        let res = find_command_path(osstr("/"), Path::new("tmp"));
        assert!(res.is_none(), "directories must not resolve");
    }

    #[test]
    fn single_component_found_in_path() {
        let res = find_command_path(osstr("/nonexisting-dir:/bin"), Path::new("sh"));
        let found = res.expect("Expected to find 'sh' in /bin via PATH search");
        assert_eq!(found.as_ref(), Path::new("/bin/sh"));
    }

    #[test]
    fn single_component_not_found_in_path() {
        let res = find_command_path(osstr("/bin"), Path::new("nonexisting"));
        assert!(res.is_none());
    }

    #[test]
    fn non_executable_file_is_skipped() {
        let tmp = std::env::temp_dir().join(format!("external_tests_{}_nx", std::process::id()));
        let _ = fs::remove_dir_all(&tmp);
        fs::create_dir_all(&tmp).expect("create temp dir");
        fs::write(tmp.join("plain"), "data").expect("write file");

        let res = find_command_path(tmp.as_os_str(), Path::new("plain"));
        assert!(res.is_none(), "non-executable files must not resolve");

        let _ = fs::remove_dir_all(tmp);
    }

    #[test]
    fn multiple_components_relative_existing() {
        let _lock = lock_current_dir();
        let cwd_before = std::env::current_dir().expect("cwd");
        let tmp_base =
            std::env::temp_dir().join(format!("external_tests_{}_mc", std::process::id()));
        let _ = fs::remove_dir_all(&tmp_base);
        fs::create_dir_all(tmp_base.join("bin")).expect("create temp bin dir");
        touch_executable(&tmp_base.join("bin").join("sh"));

        std::env::set_current_dir(&tmp_base).expect("set cwd");
        let res = find_command_path(osstr("/does/not/matter"), Path::new("bin/sh"));
        let dotted = find_command_path(osstr("/does/not/matter"), Path::new("./bin/sh"));
        // Restore cwd early to avoid interference even on failure
        std::env::set_current_dir(&cwd_before).ok();

        let found = res.expect("Expected to find relative 'bin/sh' in current dir");
        assert!(found.as_ref().ends_with("bin/sh"));
        assert_eq!(dotted.expect("dot prefix").as_ref(), Path::new("./bin/sh"));
        let _ = fs::remove_dir_all(tmp_base);
    }

    #[test]
    fn empty_path_is_none() {
        let res = find_command_path(osstr("/bin"), Path::new(""));
        assert!(res.is_none(), "Empty path should not resolve to anything");
    }

    #[test]
    fn foreground_reports_exit_code() {
        assert_eq!(run_line("true"), (0, String::new()));
        assert_eq!(run_line("false"), (1, String::new()));
    }

    #[test]
    fn foreground_passes_arguments() {
        let (code, out) = run_line("test a = a");
        assert_eq!(code, 0);
        assert!(out.is_empty());

        let (code, _) = run_line("test a = b");
        assert_eq!(code, 1);
    }

    #[test]
    fn unknown_program_prints_not_found() {
        let (code, out) = run_line("definitely-not-a-real-program-4711 --flag");
        assert_eq!(code, 1);
        assert_eq!(out, "definitely-not-a-real-program-4711:Command not found.\n");
    }

    #[test]
    fn background_returns_immediately() {
        let started = std::time::Instant::now();
        let (code, out) = run_line("sleep 5 &");
        assert_eq!(code, 0);
        assert!(out.is_empty());
        assert!(started.elapsed() < std::time::Duration::from_secs(5));
    }

    #[test]
    fn signal_death_maps_to_128_plus_signal() {
        use std::os::unix::process::ExitStatusExt;
        // SIGKILL, raw wait status encoding
        assert_eq!(exit_code(ExitStatus::from_raw(9)), 137);
        assert_eq!(exit_code(ExitStatus::from_raw(3 << 8)), 3);
    }
}
