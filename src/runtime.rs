//! Top-level embedding surface: compile and run source text, optionally
//! with a debugger attached (§6).
//!
//! `Runtime` is the one-stop type an embedder reaches for; everything it
//! does is a thin, config-driven composition of `compiler::Compiler`,
//! `vm::VM`, `stdlib::install`, and `debugger::DebuggerSession`.

use crate::api::RuntimeConfig;
use crate::bytecode::Bytecode;
use crate::compiler::Compiler;
use crate::debugger::DebuggerSession;
use crate::diagnostic::Diagnostic;
use crate::lexer::Lexer;
use crate::parser::Parser;
use crate::value::{RuntimeError, Value};
use crate::vm::VM;

/// Errors that can prevent a `Runtime` from producing a result: either the
/// source failed to compile, or it ran and raised a runtime error.
#[derive(Debug, Clone)]
pub enum RuntimeOutcome {
    CompileError(Vec<Diagnostic>),
    RuntimeError(RuntimeError),
}

impl std::fmt::Display for RuntimeOutcome {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            RuntimeOutcome::CompileError(diags) => {
                write!(f, "compile error")?;
                if let Some(first) = diags.first() {
                    write!(f, ": {first}")?;
                }
                Ok(())
            }
            RuntimeOutcome::RuntimeError(e) => write!(f, "{e}"),
        }
    }
}

/// An embeddable instance of the language: owns a `RuntimeConfig` and knows
/// how to turn source text into a running (or debuggable) program.
pub struct Runtime {
    config: RuntimeConfig,
}

impl Runtime {
    pub fn new(config: RuntimeConfig) -> Self {
        Self { config }
    }

    /// Whether programs compiled by this runtime carry the Debug-Mode
    /// Compile Switch (§4.8).
    pub fn is_debug_mode(&self) -> bool {
        self.config.debug_mode
    }

    /// Compile `source` to bytecode without running it.
    pub fn compile(&self, source: &str) -> Result<Bytecode, Vec<Diagnostic>> {
        let (tokens, lex_errors) = Lexer::new(source).tokenize();
        if !lex_errors.is_empty() {
            return Err(lex_errors);
        }
        let program = Parser::new(tokens).parse()?;
        Compiler::with_debug_mode(self.config.debug_mode).compile(&program)
    }

    /// Compile and run `source` to completion, with no debugger attached.
    pub fn run(&self, source: &str) -> Result<Value, RuntimeOutcome> {
        let bytecode = self.compile(source).map_err(RuntimeOutcome::CompileError)?;
        let mut vm = self.new_vm(bytecode);
        vm.run().map_err(RuntimeOutcome::RuntimeError)
    }

    /// Compile `source` and return a `VM` ready to run it, with the standard
    /// library installed but execution not yet started. Used directly by
    /// embedders that want to drive `vm.run()`/`vm.run_with_hook()`
    /// themselves rather than going through `run`/`enable_debugger`.
    pub fn prepare(&self, source: &str) -> Result<VM, Vec<Diagnostic>> {
        let bytecode = self.compile(source)?;
        Ok(self.new_vm(bytecode))
    }

    /// Compile `source` with a debugger attached: the Debug-Mode Compile
    /// Switch is forced on regardless of `RuntimeConfig::debug_mode`, since
    /// a debugger with no named locals to show is not useful. Returns the
    /// `VM` and the `DebuggerSession` that drives it; the caller runs them
    /// together via `vm.run_with_hook(&mut session)`.
    pub fn enable_debugger(
        &self,
        file: impl Into<String>,
        source: &str,
    ) -> Result<(VM, DebuggerSession), Vec<Diagnostic>> {
        let (tokens, lex_errors) = Lexer::new(source).tokenize();
        if !lex_errors.is_empty() {
            return Err(lex_errors);
        }
        let program = Parser::new(tokens).parse()?;
        let bytecode = Compiler::with_debug_mode(true).compile(&program)?;

        let session = DebuggerSession::new(&bytecode, file, Some(source));
        let vm = self.new_vm_with_debug_mode(bytecode, true);
        Ok((vm, session))
    }

    fn new_vm(&self, bytecode: Bytecode) -> VM {
        self.new_vm_with_debug_mode(bytecode, self.config.debug_mode)
    }

    /// Build a `VM` with an explicit debug-mode flag, independent of
    /// `RuntimeConfig::debug_mode`. `enable_debugger` needs this: it forces
    /// debug mode on the compiler (and must force it equally on the VM,
    /// since frame-env construction is gated on the VM's own flag, not the
    /// config) regardless of what the ambient config says.
    fn new_vm_with_debug_mode(&self, bytecode: Bytecode, debug_mode: bool) -> VM {
        let mut vm = VM::new(bytecode, debug_mode);
        crate::stdlib::install(&mut vm, self.config.output.clone());
        vm
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn runs_simple_program() {
        let runtime = Runtime::new(RuntimeConfig::new());
        let result = runtime.run("1 + 2;").unwrap();
        assert_eq!(result, Value::Number(3.0));
    }

    #[test]
    fn reports_compile_errors() {
        let runtime = Runtime::new(RuntimeConfig::new());
        assert!(matches!(runtime.run("let;"), Err(RuntimeOutcome::CompileError(_))));
    }

    #[test]
    fn enable_debugger_forces_debug_mode_even_when_config_disables_it() {
        let runtime = Runtime::new(RuntimeConfig::new().with_debug_mode(false));
        let (vm, _session) = runtime.enable_debugger("test.th", "let x = 1;").unwrap();
        assert!(vm.is_debug_mode());
    }

    #[test]
    fn is_debug_mode_reflects_config() {
        let runtime = Runtime::new(RuntimeConfig::new().with_debug_mode(true));
        assert!(runtime.is_debug_mode());
    }
}
