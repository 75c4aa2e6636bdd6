//! The `console` class: the program's only channel to its host.

use super::{BuiltinMethod, Library, LibraryEnv};
use crate::error::{Error, Result};
use crate::value::Value;

const METHODS: &[BuiltinMethod] = &[BuiltinMethod {
    name: "write",
    shared: true,
    variadic: true,
}];

/// Built-in `console` class.
#[derive(Debug, Default)]
pub struct ConsoleLibrary;

impl ConsoleLibrary {
    pub fn new() -> Self {
        Self
    }
}

impl Library for ConsoleLibrary {
    fn name(&self) -> &str {
        "console"
    }

    fn methods(&self) -> &[BuiltinMethod] {
        METHODS
    }

    fn call(&mut self, method: &str, args: &[Value], env: &mut LibraryEnv<'_>) -> Result<Vec<Value>> {
        match method {
            "write" => {
                for arg in args {
                    let text = arg.display(env.heap);
                    env.host.write(&text);
                }
                Ok(Vec::new())
            }
            _ => Err(Error::runtime(format!("console has no method '{}'", method))),
        }
    }
}
