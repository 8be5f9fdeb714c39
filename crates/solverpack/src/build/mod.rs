//! Building bindings from an extracted tree.

mod patch;
mod toolchain;

pub use patch::{apply_to_str, FileOverride, PatchOutcome, TextPatch};
pub use toolchain::{default_python, Toolchain};
