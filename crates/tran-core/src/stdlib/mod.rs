//! Built-in classes available to every Tran program.

pub mod console;

use std::collections::HashMap;

use crate::error::Result;
use crate::value::{Heap, Value};

pub use console::ConsoleLibrary;

/// Sink for everything a program writes to its host.
pub trait Host {
    fn write(&mut self, text: &str);
}

/// Writes each value to stdout on its own line.
#[derive(Debug, Default)]
pub struct StdoutHost;

impl Host for StdoutHost {
    fn write(&mut self, text: &str) {
        println!("{}", text);
    }
}

/// Records writes instead of printing them.
#[derive(Debug, Default)]
pub struct CaptureHost {
    pub writes: Vec<String>,
}

impl CaptureHost {
    pub fn new() -> Self {
        Self::default()
    }
}

impl Host for CaptureHost {
    fn write(&mut self, text: &str) {
        self.writes.push(text.to_string());
    }
}

/// Signature of a built-in method.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BuiltinMethod {
    pub name: &'static str,
    pub shared: bool,
    /// Accepts any number of arguments of any kind
    pub variadic: bool,
}

impl BuiltinMethod {
    /// Whether a call with `arg_count` arguments matches this method.
    /// Non-variadic built-ins take no arguments.
    pub fn accepts(&self, arg_count: usize) -> bool {
        self.variadic || arg_count == 0
    }
}

/// What a library call can reach in the running interpreter.
pub struct LibraryEnv<'a> {
    pub heap: &'a Heap,
    pub host: &'a mut dyn Host,
}

/// A built-in class implemented in Rust.
pub trait Library {
    /// Class name the program uses to reach this library.
    fn name(&self) -> &str;

    fn methods(&self) -> &[BuiltinMethod];

    /// Call a method. Returns the method's return values in order.
    fn call(&mut self, method: &str, args: &[Value], env: &mut LibraryEnv<'_>) -> Result<Vec<Value>>;
}

/// Registry of built-in classes.
pub struct LibraryRegistry {
    libraries: HashMap<String, Box<dyn Library>>,
}

impl Default for LibraryRegistry {
    fn default() -> Self {
        Self::new()
    }
}

impl LibraryRegistry {
    /// Create a registry holding the built-in libraries.
    pub fn new() -> Self {
        let mut registry = Self {
            libraries: HashMap::new(),
        };
        registry.register(Box::new(ConsoleLibrary::new()));
        registry
    }

    pub fn register(&mut self, library: Box<dyn Library>) {
        self.libraries.insert(library.name().to_string(), library);
    }

    pub fn get(&self, name: &str) -> Option<&dyn Library> {
        self.libraries.get(name).map(|b| b.as_ref())
    }

    pub fn get_mut(&mut self, name: &str) -> Option<&mut Box<dyn Library>> {
        self.libraries.get_mut(name)
    }

    pub fn has(&self, name: &str) -> bool {
        self.libraries.contains_key(name)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_registry_has_console() {
        let registry = LibraryRegistry::new();
        assert!(registry.has("console"));
        assert!(!registry.has("Console"));
        let write = registry.get("console").unwrap().methods()[0];
        assert!(write.shared && write.variadic);
        assert!(write.accepts(5));
    }

    #[test]
    fn test_non_variadic_takes_no_arguments() {
        let method = BuiltinMethod {
            name: "flush",
            shared: true,
            variadic: false,
        };
        assert!(method.accepts(0));
        assert!(!method.accepts(1));
    }
}
