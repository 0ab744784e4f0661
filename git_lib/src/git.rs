use std::{
    ffi::{OsStr, OsString},
    io::{self, Read, Write},
    panic,
    path::Path,
    process::{Child, Command, ExitStatus, Stdio},
    thread,
};
use thiserror::Error;

pub const DEFAULT_GIT_PROGRAM: &str = "git";

#[derive(Error, Debug)]
pub enum GitCmdError {
    #[error("could not start {program}: {source}")]
    Launch {
        program: String,
        #[source]
        source: io::Error,
    },

    #[error("failed waiting for {program}: {source}")]
    Wait {
        program: String,
        #[source]
        source: io::Error,
    },

    #[error("{program} clone failed: {status}")]
    Exit { program: String, status: ExitStatus },

    #[error("could not forward {stream} of {program}: {source}")]
    StreamForward {
        program: String,
        stream: &'static str,
        #[source]
        source: io::Error,
    },
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Git {
    program: OsString,
}

impl Default for Git {
    fn default() -> Self {
        Git::new(DEFAULT_GIT_PROGRAM)
    }
}

impl Git {
    pub fn new(program: impl Into<OsString>) -> Self {
        Git {
            program: program.into(),
        }
    }

    pub fn program(&self) -> &OsStr {
        &self.program
    }

    /// Runs `git clone <uri>` inside `dir`, forwarding git's output live.
    ///
    /// Both pipes are drained on their own thread while the child runs, so git
    /// never blocks on a full pipe.
    pub fn clone_into<O, E>(
        &self,
        uri: &str,
        dir: &Path,
        stdout: O,
        stderr: E,
    ) -> Result<(), GitCmdError>
    where
        O: Write + Send,
        E: Write + Send,
    {
        let mut cmd = Command::new(&self.program);
        cmd.arg("clone").arg(uri).current_dir(dir);
        log::debug!("running {:?} in {}", cmd, dir.display());

        let program = self.program.to_string_lossy().to_string();
        let child = pipe_io(&mut cmd)
            .spawn()
            .map_err(|source| GitCmdError::Launch {
                program: program.clone(),
                source,
            })?;

        let output = wait_forwarding(child, stdout, stderr);
        let status = output.status.map_err(|source| GitCmdError::Wait {
            program: program.clone(),
            source,
        })?;
        if !status.success() {
            return Err(GitCmdError::Exit { program, status });
        }

        for (stream, result) in [("stdout", output.stdout), ("stderr", output.stderr)] {
            result.map_err(|source| GitCmdError::StreamForward {
                program: program.clone(),
                stream,
                source,
            })?;
        }

        Ok(())
    }
}

pub fn pipe_io(cmd: &mut Command) -> &mut Command {
    cmd.stdin(Stdio::inherit())
        .stdout(Stdio::piped())
        .stderr(Stdio::piped())
}

struct ForwardedOutput {
    status: io::Result<ExitStatus>,
    stdout: io::Result<()>,
    stderr: io::Result<()>,
}

fn wait_forwarding<O, E>(mut child: Child, stdout: O, stderr: E) -> ForwardedOutput
where
    O: Write + Send,
    E: Write + Send,
{
    let child_stdout = child.stdout.take();
    let child_stderr = child.stderr.take();

    let (stdout_result, stderr_result) = thread::scope(|scope| {
        let out = scope.spawn(move || forward(child_stdout, stdout));
        let err = scope.spawn(move || forward(child_stderr, stderr));
        (
            out.join().unwrap_or_else(|e| panic::resume_unwind(e)),
            err.join().unwrap_or_else(|e| panic::resume_unwind(e)),
        )
    });

    ForwardedOutput {
        status: child.wait(),
        stdout: stdout_result,
        stderr: stderr_result,
    }
}

/// Copies `reader` into `writer` until EOF, flushing every chunk.
///
/// A failing writer does not stop the copy: the rest of the pipe is still read
/// and discarded so the child can run to completion.
fn forward<R, W>(reader: Option<R>, mut writer: W) -> io::Result<()>
where
    R: Read,
    W: Write,
{
    let Some(mut reader) = reader else {
        return Ok(());
    };

    let mut buf = [0u8; 8 * 1024];
    let mut write_err = None;
    loop {
        let n = match reader.read(&mut buf) {
            Ok(0) => break,
            Ok(n) => n,
            Err(e) if e.kind() == io::ErrorKind::Interrupted => continue,
            Err(e) => return Err(e),
        };
        if write_err.is_none() {
            if let Err(e) = writer.write_all(&buf[..n]).and_then(|()| writer.flush()) {
                write_err = Some(e);
            }
        }
    }

    write_err.map_or(Ok(()), Err)
}

#[cfg(test)]
pub(crate) mod tests {
    use assert_fs::{prelude::*, TempDir};
    use similar_asserts::assert_eq;
    use std::{fs, path::PathBuf};

    use super::*;

    /// Writes an executable shell script that stands in for git.
    #[cfg(unix)]
    pub(crate) fn fake_git(dir: &TempDir, body: &str) -> Git {
        use std::os::unix::fs::PermissionsExt;

        let script = dir.child("fake-git");
        script
            .write_str(&format!("#!/bin/sh\n{body}\n"))
            .expect("script should be written");
        fs::set_permissions(script.path(), fs::Permissions::from_mode(0o755))
            .expect("script should be executable");

        Git::new(script.path())
    }

    fn numbered_lines(count: usize) -> String {
        (1..=count).map(|n| format!("{n}\n")).collect()
    }

    #[cfg(unix)]
    #[test]
    fn test_clone_runs_in_dir_with_uri_as_given() {
        // Arrange
        let tmp_dir = TempDir::new().expect("temp dir should be created");
        let git = fake_git(&tmp_dir, r#"printf '%s\n' "$@" > args; pwd -P > cwd"#);
        let work_dir = tmp_dir.child("work");
        work_dir.create_dir_all().expect("should not fail");

        // Act
        git.clone_into(
            "git@github.com:alice/proj.git",
            work_dir.path(),
            io::sink(),
            io::sink(),
        )
        .expect("should not fail");

        // Assert
        work_dir
            .child("args")
            .assert("clone\ngit@github.com:alice/proj.git\n");
        let cwd = fs::read_to_string(work_dir.child("cwd").path()).expect("should not fail");
        assert_eq!(
            PathBuf::from(cwd.trim()),
            work_dir.path().canonicalize().expect("should not fail")
        );
    }

    #[cfg(unix)]
    #[test]
    fn test_clone_streams_large_output_in_order() {
        // Arrange
        let tmp_dir = TempDir::new().expect("temp dir should be created");
        let git = fake_git(&tmp_dir, "seq 1 50000 & seq 1 40000 >&2\nwait");
        let mut out = Vec::new();
        let mut err = Vec::new();

        // Act
        git.clone_into("https://h/a/b", tmp_dir.path(), &mut out, &mut err)
            .expect("should not fail");

        // Assert
        assert_eq!(String::from_utf8(out).expect("utf8"), numbered_lines(50000));
        assert_eq!(String::from_utf8(err).expect("utf8"), numbered_lines(40000));
    }

    #[cfg(unix)]
    #[test]
    fn test_clone_exit_failure() {
        // Arrange
        let tmp_dir = TempDir::new().expect("temp dir should be created");
        let git = fake_git(&tmp_dir, "echo 'fatal: repository not found' >&2\nexit 128");
        let mut err = Vec::new();

        // Act
        let result = git.clone_into("https://h/a/b", tmp_dir.path(), io::sink(), &mut err);

        // Assert
        match result {
            Err(GitCmdError::Exit { status, .. }) => assert_eq!(status.code(), Some(128)),
            other => panic!("expected exit failure, got {other:?}"),
        }
        assert_eq!(
            String::from_utf8(err).expect("utf8"),
            "fatal: repository not found\n".to_string()
        );
    }

    #[test]
    fn test_clone_launch_failure() {
        // Arrange
        let tmp_dir = TempDir::new().expect("temp dir should be created");
        let git = Git::new(tmp_dir.path().join("no-such-git"));

        // Act
        let result = git.clone_into("https://h/a/b", tmp_dir.path(), io::sink(), io::sink());

        // Assert
        assert!(matches!(result, Err(GitCmdError::Launch { .. })));
    }

    struct ClosedPipe;

    impl Write for ClosedPipe {
        fn write(&mut self, _buf: &[u8]) -> io::Result<usize> {
            Err(io::Error::from(io::ErrorKind::BrokenPipe))
        }

        fn flush(&mut self) -> io::Result<()> {
            Ok(())
        }
    }

    #[cfg(unix)]
    #[test]
    fn test_failing_writer_still_drains_child() {
        // Arrange
        let tmp_dir = TempDir::new().expect("temp dir should be created");
        let git = fake_git(&tmp_dir, "seq 1 50000");

        // Act
        let result = git.clone_into("https://h/a/b", tmp_dir.path(), ClosedPipe, io::sink());

        // Assert
        assert!(matches!(
            result,
            Err(GitCmdError::StreamForward {
                stream: "stdout",
                ..
            })
        ));
    }

    #[test]
    fn test_forward_without_pipe() {
        let mut out = Vec::new();
        forward(None::<io::Empty>, &mut out).expect("should not fail");
        assert!(out.is_empty());
    }

    #[test]
    fn test_default_program() {
        assert_eq!(Git::default().program(), OsStr::new("git"));
    }
}
