//! Code-generator interface (spec.md §6): the seam the core hands a
//! scheduled module across to a backend. No backend besides the no-op
//! dummy lives in this crate (spec.md §1: "a particular LLVM or other
//! machine-code backend" is out of scope); a real backend is an external
//! collaborator implementing [`CodeGenerator`], the way an out-of-tree ISA
//! implements `cranelift-codegen`'s `isa::TargetIsa` trait.
//!
//! Grounded on `original_source/include/fir/codegen.h`'s
//! `fir_codegen_create`/`_destroy`/`_run` C ABI and
//! `original_source/src/codegen/dummy/dummy.c`'s trivial implementation of
//! it; `destroy` has no analogue here since `Drop` replaces the explicit
//! `free`.

use crate::module::Module;
use crate::result::FirResult;
use std::path::Path;

/// A backend capable of turning a scheduled [`Module`] into output at
/// `output_path`.
///
/// Mirrors `cranelift-codegen::isa::TargetIsa`'s role: an ISA-independent
/// core hands a finished IR artifact to one of these, rather than the core
/// knowing about any particular target.
pub trait CodeGenerator {
    /// This backend's name, for diagnostics (`cranelift-codegen`'s
    /// `TargetIsa::name`).
    fn name(&self) -> &str;

    /// Generate code for `module`, writing output to `output_path`.
    ///
    /// The backend may further rewrite `module` in place (lowering
    /// constructs it can't emit directly) before producing output, per
    /// `codegen.h`'s own doc comment on `fir_codegen_run`.
    fn run(&mut self, module: &mut Module, output_path: &Path) -> FirResult<()>;
}

/// A backend that accepts any module and writes nothing, named for the
/// `FIR_CODEGEN_DUMMY` tag in `original_source/include/fir/codegen.h`.
///
/// Useful for exercising scheduling and cleanup end to end without a real
/// target.
#[derive(Clone, Debug, Default)]
pub struct DummyCodeGenerator;

impl DummyCodeGenerator {
    /// Create a dummy backend.
    pub fn new() -> DummyCodeGenerator {
        DummyCodeGenerator
    }
}

impl CodeGenerator for DummyCodeGenerator {
    fn name(&self) -> &str {
        "dummy"
    }

    fn run(&mut self, module: &mut Module, output_path: &Path) -> FirResult<()> {
        log::debug!(
            "dummy codegen: accepting module `{}` ({} nodes), writing nothing to {}",
            module.name(),
            module.node_count(),
            output_path.display()
        );
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::module::Module;
    use std::path::Path;

    #[test]
    fn dummy_backend_always_succeeds() {
        let mut m = Module::new("t");
        let mut dummy = DummyCodeGenerator::new();
        assert!(dummy.run(&mut m, Path::new("/dev/null")).is_ok());
        assert_eq!(dummy.name(), "dummy");
    }
}
