// target.rs — Triple resolution and the architecture registry
//
// The registry is a closed table from triple prefix to architecture tag.
// Adding an architecture is a data addition here plus a scrub/extract pair
// in `scrub`/`extract`; everything else dispatches on the `Arch` tag.

use std::sync::LazyLock;

use regex::Regex;

use crate::scrub;

/// Supported code generator target families.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Arch {
    /// x86 family, 32- and 64-bit.
    X86,
    /// ARM with the EABI calling convention.
    ArmEabi,
    /// Little-endian PowerPC64.
    Ppc64Le,
}

/// Triple prefix → architecture. Longest/most specific entries first is not
/// required: every prefix sharing a stem maps to the same `Arch`.
const TRIPLE_PREFIXES: &[(&str, Arch)] = &[
    ("x86_64", Arch::X86),
    ("i686", Arch::X86),
    ("x86", Arch::X86),
    ("i386", Arch::X86),
    ("arm-eabi", Arch::ArmEabi),
    ("powerpc64le", Arch::Ppc64Le),
];

/// Fallback triple when neither the RUN line nor the file declares one.
pub const DEFAULT_TRIPLE: &str = "x86";

static TRIPLE_IR_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r#"^target\s+triple\s*=\s*"([^"]+)"$"#).unwrap());

impl Arch {
    /// Look up the architecture for a resolved triple. `None` means the
    /// triple matches no known prefix, which is fatal for the file.
    pub fn for_triple(triple: &str) -> Option<Arch> {
        TRIPLE_PREFIXES
            .iter()
            .find(|(prefix, _)| triple.starts_with(prefix))
            .map(|&(_, arch)| arch)
    }

    /// Apply this architecture's scrub rules to a raw function body.
    pub fn scrub(&self, asm: &str) -> String {
        match self {
            Arch::X86 => scrub::scrub_asm_x86(asm),
            Arch::ArmEabi => scrub::scrub_asm_arm_eabi(asm),
            Arch::Ppc64Le => scrub::scrub_asm_powerpc64le(asm),
        }
    }
}

/// Find a `target triple = "..."` declaration anywhere in the input file.
pub fn find_ir_triple<S: AsRef<str>>(lines: &[S]) -> Option<String> {
    lines.iter().find_map(|l| {
        TRIPLE_IR_RE
            .captures(l.as_ref())
            .map(|c| c[1].to_string())
    })
}

/// Resolve the triple for one directive: the `-mtriple=` argument wins, then
/// the in-file declaration, then the default (with a diagnostic).
pub fn resolve_triple(
    directive_triple: Option<&str>,
    ir_triple: Option<&str>,
) -> (String, Option<String>) {
    match directive_triple.or(ir_triple) {
        Some(t) => (t.to_string(), None),
        None => (
            DEFAULT_TRIPLE.to_string(),
            Some(format!("cannot find a triple, assuming '{}'", DEFAULT_TRIPLE)),
        ),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn x86_family_prefixes() {
        assert_eq!(Arch::for_triple("x86_64-unknown-linux-gnu"), Some(Arch::X86));
        assert_eq!(Arch::for_triple("i686-pc-linux"), Some(Arch::X86));
        assert_eq!(Arch::for_triple("i386-apple-darwin"), Some(Arch::X86));
        assert_eq!(Arch::for_triple("x86"), Some(Arch::X86));
    }

    #[test]
    fn arm_and_ppc_prefixes() {
        assert_eq!(Arch::for_triple("arm-eabi"), Some(Arch::ArmEabi));
        assert_eq!(
            Arch::for_triple("powerpc64le-unknown-linux-gnu"),
            Some(Arch::Ppc64Le)
        );
    }

    #[test]
    fn unknown_triple_is_rejected() {
        assert_eq!(Arch::for_triple("sparc-sun-solaris"), None);
        assert_eq!(Arch::for_triple("aarch64-linux-gnu"), None);
    }

    #[test]
    fn directive_triple_wins_over_ir_triple() {
        let (t, warn) = resolve_triple(Some("arm-eabi"), Some("x86_64-linux"));
        assert_eq!(t, "arm-eabi");
        assert!(warn.is_none());
    }

    #[test]
    fn ir_triple_used_when_directive_has_none() {
        let (t, warn) = resolve_triple(None, Some("powerpc64le-linux"));
        assert_eq!(t, "powerpc64le-linux");
        assert!(warn.is_none());
    }

    #[test]
    fn default_triple_carries_a_diagnostic() {
        let (t, warn) = resolve_triple(None, None);
        assert_eq!(t, "x86");
        assert!(warn.is_some());
    }

    #[test]
    fn ir_triple_declaration_is_found() {
        let lines = vec![
            "; some comment".to_string(),
            "target datalayout = \"e-m:e\"".to_string(),
            "target triple = \"x86_64-unknown-linux-gnu\"".to_string(),
        ];
        assert_eq!(
            find_ir_triple(&lines).as_deref(),
            Some("x86_64-unknown-linux-gnu")
        );
    }

    #[test]
    fn missing_ir_triple_declaration() {
        let lines = vec!["define i32 @f() {".to_string()];
        assert_eq!(find_ir_triple(&lines), None);
    }
}
