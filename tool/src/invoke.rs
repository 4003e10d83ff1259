// invoke.rs — Code generator invocation and output capture
//
// The tool under test is an opaque subprocess: cleaned directive args on
// the command line, the test file on stdin, assembly on stdout. Blocking,
// no timeout, no retry; any failure is fatal for the current file.

use std::fmt;
use std::fs::File;
use std::path::{Path, PathBuf};
use std::process::{Command, Stdio};

/// Invocation failure for one directive.
#[derive(Debug)]
pub enum InvokeError {
    OpenInput {
        path: PathBuf,
        source: std::io::Error,
    },
    Spawn {
        binary: String,
        source: std::io::Error,
    },
    Failed {
        binary: String,
        status: std::process::ExitStatus,
        stderr: String,
    },
}

impl fmt::Display for InvokeError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            InvokeError::OpenInput { path, source } => {
                write!(f, "{}: {}", path.display(), source)
            }
            InvokeError::Spawn { binary, source } => {
                write!(f, "failed to run '{}': {}", binary, source)
            }
            InvokeError::Failed {
                binary,
                status,
                stderr,
            } => {
                write!(f, "'{}' exited with {}", binary, status)?;
                if !stderr.trim().is_empty() {
                    write!(f, ":\n{}", stderr.trim_end())?;
                }
                Ok(())
            }
        }
    }
}

impl std::error::Error for InvokeError {}

/// Run the code generator over the test file and capture its stdout, with
/// line endings normalized to `\n`.
pub fn capture_tool_output(
    binary: &str,
    args: &str,
    input: &Path,
) -> Result<String, InvokeError> {
    let input_file = File::open(input).map_err(|e| InvokeError::OpenInput {
        path: input.to_path_buf(),
        source: e,
    })?;

    let output = Command::new(binary)
        .args(args.split_whitespace())
        .stdin(Stdio::from(input_file))
        .output()
        .map_err(|e| InvokeError::Spawn {
            binary: binary.to_string(),
            source: e,
        })?;

    if !output.status.success() {
        return Err(InvokeError::Failed {
            binary: binary.to_string(),
            status: output.status,
            stderr: String::from_utf8_lossy(&output.stderr).into_owned(),
        });
    }

    Ok(String::from_utf8_lossy(&output.stdout).replace("\r\n", "\n"))
}
