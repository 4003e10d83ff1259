// scrub.rs — Canonicalization of captured assembly
//
// Applies per-architecture rewrite rules that erase detail known to be
// volatile across builds (stack offsets, RIP-relative symbols, literal-pool
// labels, shuffle mask encodings) so that regenerated checks do not break
// on unrelated instruction-selection changes.
//
// Rule order within each scrub function is fixed and significant.

use std::sync::LazyLock;

use regex::Regex;

/// Indentation width used when expanding tabs in captured assembly.
const TAB_WIDTH: usize = 2;

static SCRUB_TRAILING_WHITESPACE_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?m)[ \t]+$").unwrap());

static SCRUB_KILL_COMMENT_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?m)^ *#+ +kill:.*\n?").unwrap());

static SCRUB_X86_SHUFFLES_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?m)^(\s*\w+) [^#\n]+#+ ((?:[xyz]mm\d+|mem)( \{%k\d+\}( \{z\})?)? = .*)$")
        .unwrap()
});

static SCRUB_X86_SP_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\d+\(%(esp|rsp)\)").unwrap());

static SCRUB_X86_RIP_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"[.\w]+\(%rip\)").unwrap());

static SCRUB_X86_LCP_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\.LCPI[0-9]+_[0-9]+").unwrap());

static INTERIOR_WHITESPACE_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"[ \t]+").unwrap());

/// Collapse runs of intra-line whitespace to a single space, preserving
/// each line's leading indentation verbatim.
pub fn collapse_whitespace(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    for (i, line) in text.split('\n').enumerate() {
        if i > 0 {
            out.push('\n');
        }
        let body_start = line
            .find(|c: char| c != ' ' && c != '\t')
            .unwrap_or(line.len());
        out.push_str(&line[..body_start]);
        out.push_str(&INTERIOR_WHITESPACE_RE.replace_all(&line[body_start..], " "));
    }
    out
}

/// Expand tabs to spaces at fixed tab stops. The column count resets at
/// every newline, matching the usual terminal rendering.
pub fn expand_tabs(text: &str, width: usize) -> String {
    let mut out = String::with_capacity(text.len());
    let mut col = 0usize;
    for c in text.chars() {
        match c {
            '\t' => {
                let pad = width - col % width;
                out.extend(std::iter::repeat(' ').take(pad));
                col += pad;
            }
            '\n' => {
                out.push('\n');
                col = 0;
            }
            _ => {
                out.push(c);
                col += 1;
            }
        }
    }
    out
}

fn strip_trailing_whitespace(text: &str) -> String {
    SCRUB_TRAILING_WHITESPACE_RE.replace_all(text, "").into_owned()
}

fn strip_kill_comments(text: &str) -> String {
    SCRUB_KILL_COMMENT_RE.replace_all(text, "").into_owned()
}

/// Scrub an x86 (32/64-bit) function body.
pub fn scrub_asm_x86(asm: &str) -> String {
    let asm = collapse_whitespace(asm);
    let asm = expand_tabs(&asm, TAB_WIDTH);
    // Hide shuffle operands in favor of the self-describing asm comment.
    let asm = SCRUB_X86_SHUFFLES_RE.replace_all(&asm, "${1} {{.*#+}} ${2}");
    // Generically match the stack offset of a memory operand.
    let asm = SCRUB_X86_SP_RE.replace_all(&asm, "{{[0-9]+}}(%${1})");
    // Generically match a RIP-relative memory operand.
    let asm = SCRUB_X86_RIP_RE.replace_all(&asm, "{{.*}}(%rip)");
    // Generically match a literal-pool label.
    let asm = SCRUB_X86_LCP_RE.replace_all(&asm, r"{{\.LCPI.*}}");
    let asm = strip_kill_comments(&asm);
    strip_trailing_whitespace(&asm)
}

/// Scrub an ARM EABI function body.
pub fn scrub_asm_arm_eabi(asm: &str) -> String {
    let asm = collapse_whitespace(asm);
    let asm = expand_tabs(&asm, TAB_WIDTH);
    let asm = strip_kill_comments(&asm);
    strip_trailing_whitespace(&asm)
}

/// Scrub a little-endian PowerPC64 function body.
pub fn scrub_asm_powerpc64le(asm: &str) -> String {
    let asm = collapse_whitespace(asm);
    let asm = expand_tabs(&asm, TAB_WIDTH);
    strip_trailing_whitespace(&asm)
}
