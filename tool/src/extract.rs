// extract.rs — Function-body extraction and the per-file body dictionary
//
// The per-arch extraction patterns locate function blocks in raw tool
// output; the dictionary stores one scrubbed body per (prefix, function)
// and turns divergent rewrites into a permanent `Conflicting` sentinel.
//
// The header patterns cannot use a backreference to require that the label
// and the trailing `@name` comment agree, so both are captured and compared
// after the match.

use std::collections::HashMap;
use std::sync::LazyLock;

use regex::Regex;

use crate::target::Arch;

/// Functions named with this prefix exist to stress code size or compile
/// time; only the last line of their body is worth checking.
const STRESS_FUNC_PREFIX: &str = "stress";

static ASM_FUNCTION_X86_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(
        r"(?ms)^_?(?P<func>[^:\n]+):[ \t]*#+[ \t]*@(?P<cmt>[^\n]+)\n[^:]*?(?P<body>^##?[ \t]+[^:]+:.*?)\s*^\s*(?:[^:\n]+?:\s*\n\s*\.size|\.cfi_endproc|\.globl|\.comm|\.(?:sub)?section)",
    )
    .unwrap()
});

static ASM_FUNCTION_ARM_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(
        r"(?ms)^(?P<func>[0-9a-zA-Z_]+):\n\s+\.fnstart\n(?P<body>.*?)\n\.Lfunc_end[0-9]+:\n",
    )
    .unwrap()
});

static ASM_FUNCTION_PPC_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(
        r"(?ms)^_?(?P<func>[^:\n]+):[ \t]*#+[ \t]*@(?P<cmt>[^\n]+)\n\.Lfunc_begin[0-9]+:\n[ \t]+\.cfi_startproc\n(?:\.Lfunc_[gl]ep[0-9]+:\n(?:[ \t]+.*?\n)*)*(?P<body>.*?)\n(?:^[ \t]*(?:\.long[ \t]+[^\n]+|\.quad[ \t]+[^\n]+)\n)*\.Lfunc_end[0-9]+:\n",
    )
    .unwrap()
});

/// Locate function blocks in raw tool output. Returns (name, raw body)
/// pairs in output order.
pub fn extract_functions(raw_output: &str, arch: Arch) -> Vec<(String, String)> {
    let re: &Regex = match arch {
        Arch::X86 => &ASM_FUNCTION_X86_RE,
        Arch::ArmEabi => &ASM_FUNCTION_ARM_RE,
        Arch::Ppc64Le => &ASM_FUNCTION_PPC_RE,
    };
    re.captures_iter(raw_output)
        .filter_map(|caps| {
            let func = caps.name("func")?.as_str();
            // The label and the `@name` comment must name the same function.
            if let Some(cmt) = caps.name("cmt") {
                if cmt.as_str() != func {
                    return None;
                }
            }
            let body = caps.name("body")?.as_str();
            Some((func.to_string(), body.to_string()))
        })
        .collect()
}

/// Dictionary state for one (prefix, function) pair.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum BodyEntry {
    /// A canonical scrubbed body.
    Stable(String),
    /// Divergent bodies were seen; the pair is excluded from synthesis for
    /// the rest of the file and never overwritten.
    Conflicting,
}

/// Scrubbed bodies keyed by (check prefix, function name). Freshly built
/// per file; never shared across files.
#[derive(Debug, Default)]
pub struct FuncDict {
    entries: HashMap<(String, String), BodyEntry>,
}

impl FuncDict {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn get(&self, prefix: &str, func: &str) -> Option<&BodyEntry> {
        self.entries
            .get(&(prefix.to_string(), func.to_string()))
    }

    /// Record a scrubbed body under one prefix. A differing existing body
    /// becomes `Conflicting` permanently; the returned flag reports whether
    /// this insertion discovered a conflict.
    fn record(&mut self, prefix: &str, func: &str, body: &str) -> bool {
        let key = (prefix.to_string(), func.to_string());
        let conflicted = match self.entries.get(&key) {
            None => false,
            Some(BodyEntry::Stable(existing)) => existing != body,
            Some(BodyEntry::Conflicting) => return true,
        };
        if conflicted {
            self.entries.insert(key, BodyEntry::Conflicting);
            true
        } else {
            self.entries
                .entry(key)
                .or_insert_with(|| BodyEntry::Stable(body.to_string()));
            false
        }
    }
}

/// Extract, scrub, and merge every function of one directive's captured
/// output into the dictionary. Returns conflict warnings; only a conflict
/// under the directive's last prefix warns, because the trailing prefix is
/// the authoritative one and a silent omission there would hide a real
/// mismatch.
pub fn build_function_dict(
    raw_output: &str,
    arch: Arch,
    prefixes: &[String],
    dict: &mut FuncDict,
    verbose: bool,
) -> Vec<String> {
    let mut warnings = Vec::new();
    for (func, raw_body) in extract_functions(raw_output, arch) {
        let mut scrubbed = arch.scrub(&raw_body);
        if func.starts_with(STRESS_FUNC_PREFIX) {
            scrubbed = scrubbed.lines().last().unwrap_or("").to_string();
        }
        if verbose {
            eprintln!("recheck: processing function: {}", func);
            for l in scrubbed.lines() {
                eprintln!("  {}", l);
            }
        }
        for (i, prefix) in prefixes.iter().enumerate() {
            let conflicted = dict.record(prefix, &func, &scrubbed);
            if conflicted && i == prefixes.len() - 1 {
                warnings.push(format!(
                    "found conflicting asm under prefix '{}' for function '{}'",
                    prefix, func
                ));
            }
        }
    }
    warnings
}

#[cfg(test)]
mod tests {
    use super::*;

    const X86_OUTPUT: &str = "\t.text\n\
\t.globl\tfoo\n\
\t.align\t16, 0x90\n\
\t.type\tfoo,@function\n\
foo:                                    # @foo\n\
# BB#0:\n\
\tmovl\t%edi, %eax\n\
\tretq\n\
.Lfunc_end0:\n\
\t.size\tfoo, .Lfunc_end0-foo\n\
\n\
\t.globl\tbar\n\
\t.align\t16, 0x90\n\
\t.type\tbar,@function\n\
bar:                                    # @bar\n\
# BB#0:\n\
\txorl\t%eax, %eax\n\
\tretq\n\
.Lfunc_end1:\n\
\t.size\tbar, .Lfunc_end1-bar\n";

    const ARM_OUTPUT: &str = "\t.text\n\
\t.globl\tfoo\n\
foo:\n\
\t.fnstart\n\
@ BB#0:\n\
\tmov\tr0, r1\n\
\tbx\tlr\n\
.Lfunc_end0:\n\
\t.size\tfoo, .Lfunc_end0-foo\n\
\t.fnend\n";

    const PPC_OUTPUT: &str = "\t.text\n\
foo:                                    # @foo\n\
.Lfunc_begin0:\n\
\t.cfi_startproc\n\
.Lfunc_gep0:\n\
\taddis 2, 12, .TOC.-.Lfunc_gep0@ha\n\
\taddi 2, 2, .TOC.-.Lfunc_gep0@l\n\
# BB#0:\n\
\tadd 3, 4, 3\n\
\tblr\n\
\t.long\t0\n\
\t.quad\t0\n\
.Lfunc_end0:\n\
\t.size\tfoo, .Lfunc_end0-foo\n";

    #[test]
    fn x86_functions_are_extracted() {
        let funcs = extract_functions(X86_OUTPUT, Arch::X86);
        assert_eq!(funcs.len(), 2);
        assert_eq!(funcs[0].0, "foo");
        assert_eq!(funcs[0].1, "# BB#0:\n\tmovl\t%edi, %eax\n\tretq");
        assert_eq!(funcs[1].0, "bar");
        assert_eq!(funcs[1].1, "# BB#0:\n\txorl\t%eax, %eax\n\tretq");
    }

    #[test]
    fn x86_mismatched_comment_is_skipped() {
        let raw = "foo:                                    # @other\n\
# BB#0:\n\
\tretq\n\
.Lfunc_end0:\n\
\t.size\tfoo, .Lfunc_end0-foo\n";
        assert!(extract_functions(raw, Arch::X86).is_empty());
    }

    #[test]
    fn arm_function_is_extracted() {
        let funcs = extract_functions(ARM_OUTPUT, Arch::ArmEabi);
        assert_eq!(funcs.len(), 1);
        assert_eq!(funcs[0].0, "foo");
        assert_eq!(funcs[0].1, "@ BB#0:\n\tmov\tr0, r1\n\tbx\tlr");
    }

    #[test]
    fn ppc_prologue_labels_are_skipped() {
        let funcs = extract_functions(PPC_OUTPUT, Arch::Ppc64Le);
        assert_eq!(funcs.len(), 1);
        assert_eq!(funcs[0].0, "foo");
        assert_eq!(funcs[0].1, "# BB#0:\n\tadd 3, 4, 3\n\tblr");
    }

    #[test]
    fn dict_stores_scrubbed_bodies() {
        let mut dict = FuncDict::new();
        let prefixes = vec!["CHECK".to_string()];
        let warnings = build_function_dict(X86_OUTPUT, Arch::X86, &prefixes, &mut dict, false);
        assert!(warnings.is_empty());
        assert_eq!(
            dict.get("CHECK", "foo"),
            Some(&BodyEntry::Stable(
                "# BB#0:\n  movl %edi, %eax\n  retq".to_string()
            ))
        );
    }

    #[test]
    fn identical_rebuild_does_not_conflict() {
        let mut dict = FuncDict::new();
        let prefixes = vec!["CHECK".to_string()];
        build_function_dict(X86_OUTPUT, Arch::X86, &prefixes, &mut dict, false);
        let warnings = build_function_dict(X86_OUTPUT, Arch::X86, &prefixes, &mut dict, false);
        assert!(warnings.is_empty());
        assert!(matches!(
            dict.get("CHECK", "foo"),
            Some(BodyEntry::Stable(_))
        ));
    }

    #[test]
    fn divergent_bodies_conflict_and_last_prefix_warns() {
        let other = X86_OUTPUT.replace("movl\t%edi, %eax", "leal\t(%rdi), %eax");
        let mut dict = FuncDict::new();
        let prefixes = vec!["SHARED".to_string()];
        build_function_dict(X86_OUTPUT, Arch::X86, &prefixes, &mut dict, false);
        let warnings = build_function_dict(&other, Arch::X86, &prefixes, &mut dict, false);
        assert_eq!(dict.get("SHARED", "foo"), Some(&BodyEntry::Conflicting));
        // SHARED is the last (only) prefix of its directive, so it warns.
        assert_eq!(warnings.len(), 1);
        assert!(warnings[0].contains("SHARED"));
        assert!(warnings[0].contains("foo"));
    }

    #[test]
    fn conflict_under_non_last_prefix_is_silent() {
        let other = X86_OUTPUT.replace("movl\t%edi, %eax", "leal\t(%rdi), %eax");
        let mut dict = FuncDict::new();
        // Seed only the first prefix with a divergent body.
        build_function_dict(X86_OUTPUT, Arch::X86, &["A".to_string()], &mut dict, false);
        let prefixes = vec!["A".to_string(), "B".to_string()];
        let warnings = build_function_dict(&other, Arch::X86, &prefixes, &mut dict, false);
        // A conflicts silently (not last); B stores the new body cleanly.
        assert!(warnings.is_empty());
        assert_eq!(dict.get("A", "foo"), Some(&BodyEntry::Conflicting));
        assert!(matches!(dict.get("B", "foo"), Some(BodyEntry::Stable(_))));
    }

    #[test]
    fn conflicting_entry_is_never_overwritten() {
        let other = X86_OUTPUT.replace("movl\t%edi, %eax", "leal\t(%rdi), %eax");
        let mut dict = FuncDict::new();
        let prefixes = vec!["CHECK".to_string()];
        build_function_dict(X86_OUTPUT, Arch::X86, &prefixes, &mut dict, false);
        build_function_dict(&other, Arch::X86, &prefixes, &mut dict, false);
        // A later identical body does not resurrect the entry.
        build_function_dict(X86_OUTPUT, Arch::X86, &prefixes, &mut dict, false);
        assert_eq!(dict.get("CHECK", "foo"), Some(&BodyEntry::Conflicting));
    }

    #[test]
    fn stress_functions_keep_only_the_last_line() {
        let raw = X86_OUTPUT.replace("foo", "stress_wide");
        let funcs = extract_functions(&raw, Arch::X86);
        assert_eq!(funcs[0].0, "stress_wide");
        let mut dict = FuncDict::new();
        build_function_dict(&raw, Arch::X86, &["CHECK".to_string()], &mut dict, false);
        assert_eq!(
            dict.get("CHECK", "stress_wide"),
            Some(&BodyEntry::Stable("  retq".to_string()))
        );
    }
}
