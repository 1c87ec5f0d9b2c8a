//! Essentia streaming extractor: installation and invocation
//!
//! The extractor binary is installed once per process into a private
//! scratch directory together with a generated `profile.yaml`. Every run
//! then writes its JSON output next to it:
//!
//! ```text
//! <scratch>/streaming_extractor_music <input> <scratch>/acousticbrainzXXXX.json <scratch>/profile.yaml
//! ```
//!
//! The directory is removed by a single teardown hook registered with the
//! host's [`ShutdownHooks`].

use super::config::ExtractorConfig;
use super::error::{SubmitError, SubmitResult};
use super::workfiles::WorkingFiles;
use crate::lifecycle::ShutdownHooks;
use std::fs;
use std::io::{self, Read};
use std::path::{Path, PathBuf};
use std::process::{Command, Stdio};
use std::sync::{Arc, Mutex, Once};
use tempfile::TempDir;

#[cfg(windows)]
pub const EXTRACTOR_NAME: &str = "streaming_extractor_music.exe";
#[cfg(not(windows))]
pub const EXTRACTOR_NAME: &str = "streaming_extractor_music";

pub const PROFILE_NAME: &str = "profile.yaml";

/// Paths inside an installed extractor directory
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ExtractorPaths {
    pub dir: PathBuf,
    pub executable: PathBuf,
    pub profile: PathBuf,
}

struct Installation {
    dir: TempDir,
    paths: ExtractorPaths,
}

/// Result of one extractor invocation
#[derive(Debug, Clone)]
pub struct ExtractorRun {
    /// JSON document written by the extractor (registered for cleanup)
    pub output_path: PathBuf,

    /// Process exit code, `-1` if it was killed by a signal
    pub exit_code: i32,

    /// Merged stdout and stderr, for diagnostics only
    pub console: String,
}

impl ExtractorRun {
    pub fn success(&self) -> bool {
        self.exit_code == 0
    }
}

/// Process-wide extractor installation
///
/// Share one instance (behind an [`Arc`]) between all pipelines.
pub struct ExtractorHome {
    config: ExtractorConfig,
    installed: Mutex<Option<Installation>>,
    teardown_registered: Once,
}

impl ExtractorHome {
    pub fn new(config: ExtractorConfig) -> Self {
        Self {
            config,
            installed: Mutex::new(None),
            teardown_registered: Once::new(),
        }
    }

    /// Install the extractor and profile on first call, return the paths
    ///
    /// Concurrent callers block until the first installation finishes;
    /// a failed installation is retried by the next caller.
    pub fn ensure_installed(&self) -> SubmitResult<ExtractorPaths> {
        let mut installed = self
            .installed
            .lock()
            .map_err(|_| SubmitError::ExtractorUnavailable("installation lock poisoned".to_string()))?;

        if let Some(installation) = installed.as_ref() {
            return Ok(installation.paths.clone());
        }

        let installation = self.install()?;
        let paths = installation.paths.clone();
        *installed = Some(installation);
        Ok(paths)
    }

    /// Register the directory teardown with the host, at most once
    pub fn register_teardown(self: &Arc<Self>, hooks: &ShutdownHooks) {
        self.teardown_registered.call_once(|| {
            let home = Arc::clone(self);
            hooks.add_shutdown_hook(Box::new(move || home.teardown()));
        });
    }

    /// Remove the installation directory, if any
    pub fn teardown(&self) {
        let taken = match self.installed.lock() {
            Ok(mut installed) => installed.take(),
            Err(poisoned) => poisoned.into_inner().take(),
        };
        if let Some(installation) = taken {
            let dir = installation.paths.dir.clone();
            log::debug!("Deleting temporary AcousticBrainz binaries from {:?}", dir);
            if let Err(e) = installation.dir.close() {
                log::error!(
                    "Failure while deleting temporary AcousticBrainz binaries {:?}: {}",
                    dir,
                    e
                );
            }
        }
    }

    fn install(&self) -> SubmitResult<Installation> {
        log::debug!("Installing AcousticBrainz extractor from {:?}", self.config.binary);
        if !self.config.binary.is_file() {
            return Err(SubmitError::ExtractorUnavailable(format!(
                "{:?} is not a file",
                self.config.binary
            )));
        }

        let dir = tempfile::Builder::new().prefix("abzsubmit").tempdir()?;
        log::debug!("Executable directory: {:?}", dir.path());

        let executable = dir.path().join(EXTRACTOR_NAME);
        fs::copy(&self.config.binary, &executable)?;
        make_executable(&executable)?;

        let profile = dir.path().join(PROFILE_NAME);
        fs::write(&profile, profile_yaml(&self.config.build_sha))?;

        let paths = ExtractorPaths {
            dir: dir.path().to_path_buf(),
            executable,
            profile,
        };
        Ok(Installation { dir, paths })
    }

    /// Run the extractor on `input`
    ///
    /// The output path is registered with `files` before the process
    /// starts, so it is cleaned up even if the extractor leaves a partial
    /// file behind.
    pub fn run(&self, input: &Path, files: &mut WorkingFiles) -> SubmitResult<ExtractorRun> {
        let paths = self.ensure_installed()?;

        let output_path = tempfile::Builder::new()
            .prefix("acousticbrainz")
            .suffix(".json")
            .tempfile_in(&paths.dir)?
            .into_temp_path()
            .keep()
            .map_err(|e| SubmitError::Io(e.error))?;
        files.register(output_path.clone());

        log::debug!(
            "Running {:?} {:?} {:?} {:?}",
            paths.executable,
            input,
            output_path,
            paths.profile
        );

        // stdout and stderr share one pipe so the console keeps its order.
        let (mut reader, writer) = io::pipe()?;
        let mut command = Command::new(&paths.executable);
        command
            .arg(input)
            .arg(&output_path)
            .arg(&paths.profile)
            .current_dir(&paths.dir)
            .stdin(Stdio::null())
            .stdout(writer.try_clone()?)
            .stderr(writer);

        // No timeout; over-long tracks never get this far.
        let mut child = command.spawn()?;
        drop(command);

        let mut raw = Vec::new();
        let read = reader.read_to_end(&mut raw);
        let status = child.wait()?;
        read?;

        let console = String::from_utf8_lossy(&raw).into_owned();
        log::debug!("Output: {}", console);

        Ok(ExtractorRun {
            output_path,
            exit_code: status.code().unwrap_or(-1),
            console,
        })
    }
}

/// Profile for submission-grade extraction
///
/// AcousticBrainz only accepts documents produced with `requireMbid`.
pub fn profile_yaml(build_sha: &str) -> String {
    let mut yaml = String::new();
    yaml.push_str("requireMbid: true\n");
    yaml.push_str("indent: 0\n");
    yaml.push_str("mergeValues:\n");
    yaml.push_str("    metadata:\n");
    yaml.push_str("        version:\n");
    yaml.push_str(&format!("            essentia_build_sha: {}\n", build_sha));
    yaml
}

#[cfg(unix)]
fn make_executable(path: &Path) -> std::io::Result<()> {
    use std::os::unix::fs::PermissionsExt;
    fs::set_permissions(path, fs::Permissions::from_mode(0o755))
}

#[cfg(not(unix))]
fn make_executable(_path: &Path) -> std::io::Result<()> {
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_profile_yaml() {
        let yaml = profile_yaml("deadbeef");
        assert!(yaml.starts_with("requireMbid: true\n"));
        assert!(yaml.contains("indent: 0\n"));
        assert!(yaml.ends_with("            essentia_build_sha: deadbeef\n"));
    }

    #[test]
    fn test_missing_binary_is_unavailable() {
        let home = ExtractorHome::new(ExtractorConfig::new(PathBuf::from("/nonexistent/extractor")));
        assert!(matches!(
            home.ensure_installed(),
            Err(SubmitError::ExtractorUnavailable(_))
        ));
    }

    #[cfg(unix)]
    mod unix {
        use super::*;
        use std::io::Write;
        use tempfile::TempDir;

        fn write_script(path: &Path, body: &str) -> std::io::Result<()> {
            let mut file = fs::File::create(path)?;
            file.write_all(body.as_bytes())?;
            file.sync_all()
        }

        fn home_with_script(source: &TempDir, body: &str) -> Arc<ExtractorHome> {
            let binary = source.path().join("fake_extractor.sh");
            write_script(&binary, body).unwrap();
            Arc::new(ExtractorHome::new(
                ExtractorConfig::new(binary).with_build_sha("cafe"),
            ))
        }

        #[test]
        fn test_install_happens_once() {
            let source = TempDir::new().unwrap();
            let home = home_with_script(&source, "#!/bin/sh\nexit 0\n");

            let first = home.ensure_installed().unwrap();
            let second = home.ensure_installed().unwrap();
            assert_eq!(first, second);
            assert!(first.executable.is_file());
            assert_eq!(first.executable.file_name().unwrap(), EXTRACTOR_NAME);
            assert!(fs::read_to_string(&first.profile)
                .unwrap()
                .contains("essentia_build_sha: cafe"));

            home.teardown();
            assert!(!first.dir.exists());
        }

        #[test]
        fn test_concurrent_install_shares_directory() {
            let source = TempDir::new().unwrap();
            let home = home_with_script(&source, "#!/bin/sh\nexit 0\n");

            let dirs: Vec<PathBuf> = std::thread::scope(|scope| {
                let handles: Vec<_> = (0..4)
                    .map(|_| scope.spawn(|| home.ensure_installed().unwrap().dir))
                    .collect();
                handles.into_iter().map(|h| h.join().unwrap()).collect()
            });
            assert!(dirs.windows(2).all(|w| w[0] == w[1]));
            home.teardown();
        }

        #[test]
        fn test_teardown_hook_registered_once() {
            let source = TempDir::new().unwrap();
            let home = home_with_script(&source, "#!/bin/sh\nexit 0\n");
            let hooks = ShutdownHooks::new();

            home.register_teardown(&hooks);
            home.register_teardown(&hooks);
            assert_eq!(hooks.len(), 1);

            let dir = home.ensure_installed().unwrap().dir;
            hooks.run();
            assert!(!dir.exists());
        }

        #[test]
        fn test_run_passes_three_arguments_in_its_directory() {
            let source = TempDir::new().unwrap();
            let home = home_with_script(
                &source,
                "#!/bin/sh\necho \"args=$#\"\necho \"cwd=$(pwd)\" >&2\nprintf '{\"in\":\"%s\"}' \"$1\" > \"$2\"\ntest -f \"$3\" || exit 3\nexit 0\n",
            );
            let input = source.path().join("song.flac");
            fs::write(&input, b"audio").unwrap();

            let mut files = WorkingFiles::new();
            let run = home.run(&input, &mut files).unwrap();
            let dir = home.ensure_installed().unwrap().dir;

            assert!(run.success());
            assert!(run.console.contains("args=3"));
            let dir_name = dir.file_name().unwrap().to_string_lossy().to_string();
            assert!(run.console.contains("cwd="));
            assert!(run.console.contains(&dir_name));
            assert!(run.output_path.starts_with(&dir));
            assert_eq!(files.paths(), &[run.output_path.clone()]);
            let written = fs::read_to_string(&run.output_path).unwrap();
            assert!(written.contains("song.flac"));

            files.cleanup();
            assert!(!run.output_path.exists());
            home.teardown();
        }

        #[test]
        fn test_run_merges_stderr_into_stdout_in_order() {
            let source = TempDir::new().unwrap();
            let home = home_with_script(
                &source,
                "#!/bin/sh\necho one\necho two >&2\necho three\n",
            );

            let mut files = WorkingFiles::new();
            let run = home.run(Path::new("/music/song.flac"), &mut files).unwrap();

            assert!(run.success());
            assert_eq!(run.console, "one\ntwo\nthree\n");
            home.teardown();
        }

        #[test]
        fn test_run_reports_exit_code() {
            let source = TempDir::new().unwrap();
            let home = home_with_script(&source, "#!/bin/sh\necho boom >&2\nexit 1\n");

            let mut files = WorkingFiles::new();
            let run = home.run(Path::new("/music/song.flac"), &mut files).unwrap();

            assert!(!run.success());
            assert_eq!(run.exit_code, 1);
            assert!(run.console.contains("boom"));
            assert_eq!(files.len(), 1);
            home.teardown();
        }
    }
}
