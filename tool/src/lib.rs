// recheck — FileCheck assertion regenerator for llc codegen tests
//
// Library root. One module per pipeline stage; `update` drives them
// per file, in order: run_lines → target → invoke → extract/scrub →
// checks → rewrite.

pub mod checks;
pub mod extract;
pub mod invoke;
pub mod rewrite;
pub mod run_lines;
pub mod scrub;
pub mod target;
pub mod update;
