// run_lines.rs — RUN-directive extraction and parsing
//
// A RUN line is `; RUN: <command>`, optionally continued onto the next RUN
// line with a trailing `\`. Only two-stage `llc | FileCheck` pipelines
// produce checks; anything else is skipped with a warning.
//
// Directive order is load-bearing: it decides which prefix is authoritative
// on conflict and the order in which check blocks are emitted.

use std::sync::LazyLock;

use regex::Regex;

static RUN_LINE_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^\s*;\s*RUN:\s*(.*)$").unwrap());

static TRIPLE_ARG_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"-mtriple=([^ ]+)").unwrap());

static CHECK_PREFIX_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"--check-prefix=(\S+)").unwrap());

/// One parsed `llc | FileCheck` RUN directive.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RunDirective {
    /// Check prefixes from the FileCheck command; `["CHECK"]` if none given.
    pub prefixes: Vec<String>,
    /// llc arguments with the `< %s` / `%s` input placeholders stripped.
    pub llc_args: String,
    /// Explicit `-mtriple=` value, if any.
    pub triple: Option<String>,
}

/// Directives in file order, plus warnings for the ones that were skipped.
#[derive(Debug, Default)]
pub struct ParsedRunLines {
    pub directives: Vec<RunDirective>,
    pub warnings: Vec<String>,
}

/// Join physical RUN payloads into logical directives: a payload ending in
/// `\` absorbs the next one.
fn join_continuations(raw: Vec<String>) -> Vec<String> {
    let mut joined: Vec<String> = Vec::new();
    for payload in raw {
        match joined.last_mut() {
            Some(last) if last.ends_with('\\') => {
                let trimmed = last.trim_end_matches('\\').to_string();
                *last = format!("{} {}", trimmed, payload);
            }
            _ => joined.push(payload),
        }
    }
    joined
}

/// Extract and parse every RUN directive from the input lines.
pub fn parse_run_lines<S: AsRef<str>>(lines: &[S]) -> ParsedRunLines {
    let raw: Vec<String> = lines
        .iter()
        .filter_map(|l| {
            RUN_LINE_RE
                .captures(l.as_ref())
                .map(|c| c[1].to_string())
        })
        .collect();

    let mut parsed = ParsedRunLines::default();
    for logical in join_continuations(raw) {
        let (llc_cmd, filecheck_cmd) = match logical.split_once('|') {
            Some((left, right)) => (left.trim().to_string(), right.trim().to_string()),
            None => (logical.trim().to_string(), String::new()),
        };

        if !llc_cmd.starts_with("llc ") {
            parsed
                .warnings
                .push(format!("skipping non-llc RUN line: {}", logical));
            continue;
        }
        if !filecheck_cmd.starts_with("FileCheck ") {
            parsed
                .warnings
                .push(format!("skipping non-FileChecked RUN line: {}", logical));
            continue;
        }

        let triple = TRIPLE_ARG_RE
            .captures(&llc_cmd)
            .map(|c| c[1].to_string());

        let llc_args = llc_cmd["llc".len()..]
            .trim()
            .replace("< %s", "")
            .replace("%s", "")
            .trim()
            .to_string();

        let mut prefixes: Vec<String> = CHECK_PREFIX_RE
            .captures_iter(&filecheck_cmd)
            .map(|c| c[1].to_string())
            .collect();
        if prefixes.is_empty() {
            prefixes.push("CHECK".to_string());
        }

        parsed.directives.push(RunDirective {
            prefixes,
            llc_args,
            triple,
        });
    }
    parsed
}
