use std::ffi::OsString;
use std::io;
use std::path::Path;
use std::process::{Command, Stdio};

/// Exit status and captured output of a finished process.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CommandOutput {
    /// `None` when the process was terminated by a signal.
    pub exit_code: Option<i32>,
    /// Standard output followed by standard error.
    pub output: String,
}

impl CommandOutput {
    pub fn success(&self) -> bool {
        self.exit_code == Some(0)
    }
}

/// Launches external programs and waits for them to finish.
pub trait CommandRunner: Send + Sync {
    fn run(&self, program: &Path, args: &[OsString]) -> io::Result<CommandOutput>;
}

/// Runs programs as child processes of the current process.
#[derive(Debug, Clone, Copy, Default)]
pub struct SystemRunner;

impl CommandRunner for SystemRunner {
    fn run(&self, program: &Path, args: &[OsString]) -> io::Result<CommandOutput> {
        let mut command = Command::new(program);
        command
            .args(args)
            .stdin(Stdio::null())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped());

        #[cfg(windows)]
        {
            use std::os::windows::process::CommandExt;
            const CREATE_NO_WINDOW: u32 = 0x0800_0000;
            command.creation_flags(CREATE_NO_WINDOW);
        }

        let output = command.output()?;

        let mut combined = String::from_utf8_lossy(&output.stdout).into_owned();
        combined.push_str(&String::from_utf8_lossy(&output.stderr));

        Ok(CommandOutput {
            exit_code: output.status.code(),
            output: combined,
        })
    }
}

/// A single recorded invocation.
#[cfg(test)]
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RecordedRun {
    pub program: std::path::PathBuf,
    pub args: Vec<OsString>,
}

#[cfg(test)]
impl RecordedRun {
    pub fn arg_strings(&self) -> Vec<String> {
        self.args
            .iter()
            .map(|arg| arg.to_string_lossy().into_owned())
            .collect()
    }
}

/// Records invocations and replies with a canned result; used in tests.
#[cfg(test)]
#[derive(Clone)]
pub struct RecordingRunner {
    runs: std::sync::Arc<parking_lot::Mutex<Vec<RecordedRun>>>,
    reply: std::result::Result<CommandOutput, io::ErrorKind>,
}

#[cfg(test)]
impl RecordingRunner {
    pub fn succeeding() -> Self {
        Self::replying(Ok(CommandOutput {
            exit_code: Some(0),
            output: String::new(),
        }))
    }

    pub fn replying(reply: std::result::Result<CommandOutput, io::ErrorKind>) -> Self {
        Self {
            runs: Default::default(),
            reply,
        }
    }

    pub fn runs(&self) -> Vec<RecordedRun> {
        self.runs.lock().clone()
    }
}

#[cfg(test)]
impl CommandRunner for RecordingRunner {
    fn run(&self, program: &Path, args: &[OsString]) -> io::Result<CommandOutput> {
        self.runs.lock().push(RecordedRun {
            program: program.to_path_buf(),
            args: args.to_vec(),
        });
        self.reply.clone().map_err(io::Error::from)
    }
}
