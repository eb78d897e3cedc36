//! Ambient configuration consumed by the core library, separate from
//! whatever parses `argv` (spec.md §6's CLI driver is an external
//! collaborator this repo does not include).
//!
//! `cranelift-codegen::settings` keeps the same split: the core crate
//! consumes a plain settings value, and a downstream binary is responsible
//! for turning command-line flags into one. That module's settings are
//! meta-generated from a `.rs` template describing dozens of target flags;
//! this crate's flag surface is small and fixed, so `CliOptions` is written
//! by hand instead.

/// Which code generator a client should hand a scheduled module to.
#[derive(Copy, Clone, PartialEq, Eq, Debug)]
pub enum CodegenKind {
    /// [`crate::codegen::DummyCodeGenerator`]: accepts any module, emits
    /// nothing.
    Dummy,
    /// A machine-code backend. Not implemented by this crate (spec.md §1
    /// lists "a particular LLVM or other machine-code backend" as out of
    /// scope); selecting it is a configuration-layer concern only.
    Llvm,
}

/// Flags threaded from an external CLI driver into this crate (spec.md §6's
/// flag table), as plain data rather than parsed from `argv` directly.
#[derive(Clone, Debug)]
pub struct CliOptions {
    /// Emit `log::trace!`-level diagnostics in addition to `debug!`.
    pub verbose: bool,
    /// Suppress ANSI color codes in any diagnostic output a caller renders.
    pub no_color: bool,
    /// Skip `Module::cleanup` after each pass, keeping collected nodes'
    /// slots around for post-mortem inspection.
    pub no_cleanup: bool,
    /// Which [`CodegenKind`] to run once scheduling completes.
    pub codegen: CodegenKind,
}

impl Default for CliOptions {
    fn default() -> Self {
        CliOptions {
            verbose: false,
            no_color: false,
            no_cleanup: false,
            codegen: CodegenKind::Dummy,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_select_the_dummy_backend_with_cleanup_enabled() {
        let opts = CliOptions::default();
        assert_eq!(opts.codegen, CodegenKind::Dummy);
        assert!(!opts.no_cleanup);
    }
}
