use std::{
    fmt::{self, Write},
    format_args as f,
};

use log::debug;

use crate::ast::Boc;

const DEFAULT_CODE_CAPACITY: usize = 1024; // 1 KiB

/// Placeholder Go backend. Every unit lowers to the same `main` stub, which
/// only names the unit.
pub struct CodeGen {
    code: String,
}

impl CodeGen {
    pub fn with_capacity() -> CodeGen {
        CodeGen {
            code: String::with_capacity(DEFAULT_CODE_CAPACITY),
        }
    }

    pub fn gen(mut self, name: &str, boc: &Boc) -> String {
        self.gen_unit(name, boc);
        debug!("generated {} bytes for {name:?}", self.code.len());
        self.code
    }

    fn gen_unit(&mut self, name: &str, _boc: &Boc) {
        self.emit(f!("package main\n\n"));
        self.emit(f!("func main() {{\n"));
        self.emit(f!("\tprint(\"Hello {name} code generator\")\n"));
        self.emit(f!("}}\n"));
    }
}

/// Name of the Go file generated for a unit.
pub fn file_name(name: &str) -> String {
    format!("{name}.go")
}

// Utility functions.
impl CodeGen {
    fn emit(&mut self, f: fmt::Arguments<'_>) {
        self.code
            .write_fmt(f)
            .expect("code emit should be infallible");
    }
}
