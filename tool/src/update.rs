// update.rs — Per-file driver
//
// Runs the stages in order for one test file: RUN-line parsing → triple
// resolution → tool invocation → dictionary building → rewriting → write
// back in place. Any fatal error leaves the file unmodified.

use std::fmt;
use std::path::{Path, PathBuf};

use crate::extract::{build_function_dict, FuncDict};
use crate::invoke::{capture_tool_output, InvokeError};
use crate::rewrite::rewrite_lines;
use crate::run_lines::parse_run_lines;
use crate::target::{find_ir_triple, resolve_triple, Arch};

/// Caller-facing knobs, one instance per tool run.
#[derive(Debug, Clone)]
pub struct UpdateOptions {
    /// Code generator binary to invoke.
    pub llc_binary: String,
    /// Restrict regeneration to this function.
    pub function: Option<String>,
    /// Stage-by-stage progress on stderr.
    pub verbose: bool,
}

impl Default for UpdateOptions {
    fn default() -> Self {
        Self {
            llc_binary: "llc".to_string(),
            function: None,
            verbose: false,
        }
    }
}

/// Fatal per-file errors. The file is left unmodified; processing continues
/// with the next file.
#[derive(Debug)]
pub enum UpdateError {
    Read {
        path: PathBuf,
        source: std::io::Error,
    },
    UnsupportedTriple {
        triple: String,
    },
    Invoke(InvokeError),
    Write {
        path: PathBuf,
        source: std::io::Error,
    },
}

impl fmt::Display for UpdateError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            UpdateError::Read { path, source } => {
                write!(f, "cannot read {}: {}", path.display(), source)
            }
            UpdateError::UnsupportedTriple { triple } => {
                write!(f, "triple '{}' matches no supported architecture", triple)
            }
            UpdateError::Invoke(e) => write!(f, "{}", e),
            UpdateError::Write { path, source } => {
                write!(f, "cannot write {}: {}", path.display(), source)
            }
        }
    }
}

impl std::error::Error for UpdateError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            UpdateError::Read { source, .. } | UpdateError::Write { source, .. } => Some(source),
            UpdateError::Invoke(e) => Some(e),
            UpdateError::UnsupportedTriple { .. } => None,
        }
    }
}

impl From<InvokeError> for UpdateError {
    fn from(e: InvokeError) -> Self {
        UpdateError::Invoke(e)
    }
}

fn warn(message: &str) {
    eprintln!("recheck: warning: {}", message);
}

/// Regenerate the check blocks of one test file in place.
pub fn update_file(path: &Path, opts: &UpdateOptions) -> Result<(), UpdateError> {
    if opts.verbose {
        eprintln!("recheck: scanning for RUN lines in {}", path.display());
    }

    let content = std::fs::read_to_string(path).map_err(|e| UpdateError::Read {
        path: path.to_path_buf(),
        source: e,
    })?;
    let input_lines: Vec<String> = content.lines().map(String::from).collect();

    let parsed = parse_run_lines(&input_lines);
    for w in &parsed.warnings {
        warn(w);
    }
    if opts.verbose {
        eprintln!("recheck: found {} RUN directives", parsed.directives.len());
        for d in &parsed.directives {
            eprintln!("recheck:   llc {} | FileCheck {:?}", d.llc_args, d.prefixes);
        }
    }

    let ir_triple = find_ir_triple(&input_lines);

    let mut dict = FuncDict::new();
    for directive in &parsed.directives {
        let (triple, triple_warning) =
            resolve_triple(directive.triple.as_deref(), ir_triple.as_deref());
        if let Some(w) = triple_warning {
            warn(&w);
        }
        let arch = Arch::for_triple(&triple)
            .ok_or(UpdateError::UnsupportedTriple { triple })?;

        let raw_output = capture_tool_output(&opts.llc_binary, &directive.llc_args, path)?;
        for w in build_function_dict(
            &raw_output,
            arch,
            &directive.prefixes,
            &mut dict,
            opts.verbose,
        ) {
            warn(&w);
        }
    }

    let output_lines = rewrite_lines(
        &input_lines,
        &parsed.directives,
        &dict,
        opts.function.as_deref(),
    );

    if opts.verbose {
        eprintln!(
            "recheck: writing {} lines to {}",
            output_lines.len(),
            path.display()
        );
    }

    let mut rendered = output_lines.join("\n");
    rendered.push('\n');
    std::fs::write(path, rendered).map_err(|e| UpdateError::Write {
        path: path.to_path_buf(),
        source: e,
    })
}
