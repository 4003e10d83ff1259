// checks.rs — Check-block synthesis
//
// Emits `-LABEL` / exact / `-NEXT` lines for one function from the body
// dictionary, walking the directive list in file order. Within a single
// directive only the first prefix with a stable body contributes a block;
// the remaining prefixes of that directive are redundant by convention.

use std::sync::LazyLock;

use regex::Regex;

use crate::extract::{BodyEntry, FuncDict};
use crate::run_lines::RunDirective;

static CHECK_LINE_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^\s*;\s*([^:]+?)(?:-NEXT|-NOT|-DAG|-LABEL)?:").unwrap());

/// The check prefix of a comment line, if it is shaped like a check line.
/// `; CHECK-NEXT: ...` and `; CHECK: ...` both yield `CHECK`.
pub fn check_line_prefix(line: &str) -> Option<&str> {
    CHECK_LINE_RE
        .captures(line)
        .map(|c| c.get(1).unwrap().as_str())
}

/// Append the synthesized check block for `func` to `out`. Blocks for
/// distinct prefixes are separated by a lone `;` comment line. Absent and
/// conflicting dictionary entries are skipped silently.
pub fn add_checks(
    out: &mut Vec<String>,
    run_list: &[RunDirective],
    dict: &FuncDict,
    func: &str,
) {
    let mut printed: Vec<&str> = Vec::new();
    for directive in run_list {
        for prefix in &directive.prefixes {
            if printed.iter().any(|p| p == prefix) {
                continue;
            }
            let Some(BodyEntry::Stable(body)) = dict.get(prefix, func) else {
                continue;
            };
            if !printed.is_empty() {
                out.push(";".to_string());
            }
            printed.push(prefix.as_str());
            out.push(format!("; {}-LABEL: {}:", prefix, func));
            let mut body_lines = body.lines();
            if let Some(first) = body_lines.next() {
                out.push(format!("; {}:       {}", prefix, first));
            }
            for line in body_lines {
                out.push(format!("; {}-NEXT:  {}", prefix, line));
            }
            // Later prefixes of this directive would duplicate the block.
            break;
        }
    }
}
