//! Host I/O hooks.
//!
//! The evaluator never touches a console directly: `print` goes to the output
//! hook, diagnostics to the error hook and the `input()` built-in reads from
//! the input hook. Embedders swap any of them with the builder setters.

use std::io::{self, BufRead, Write};

type OutputHook = Box<dyn Fn(&str)>;
type InputHook = Box<dyn Fn() -> Option<String>>;

pub struct IoStream {
    on_output: OutputHook,
    on_error: OutputHook,
    on_input: InputHook,
}

impl IoStream {
    /// Standard output, standard error and line-buffered standard input.
    pub fn stdio() -> Self {
        IoStream {
            on_output: Box::new(|text: &str| {
                let mut out = io::stdout().lock();
                let _ = writeln!(out, "{}", text);
            }),
            on_error: Box::new(|text: &str| {
                let _ = writeln!(io::stderr().lock(), "{}", text);
            }),
            on_input: Box::new(read_stdin_line),
        }
    }

    /// Hooks that discard everything and read nothing.
    pub fn silent() -> Self {
        IoStream {
            on_output: Box::new(|_| {}),
            on_error: Box::new(|_| {}),
            on_input: Box::new(|| None),
        }
    }

    pub fn on_output<F: Fn(&str) + 'static>(mut self, hook: F) -> Self {
        self.on_output = Box::new(hook);
        self
    }

    pub fn on_error<F: Fn(&str) + 'static>(mut self, hook: F) -> Self {
        self.on_error = Box::new(hook);
        self
    }

    pub fn on_input<F: Fn() -> Option<String> + 'static>(mut self, hook: F) -> Self {
        self.on_input = Box::new(hook);
        self
    }

    pub fn output(&self, text: &str) {
        (self.on_output)(text)
    }

    pub fn error(&self, text: &str) {
        (self.on_error)(text)
    }

    /// Next input line without its terminator, or `None` at end of input.
    pub fn input(&self) -> Option<String> {
        (self.on_input)()
    }
}

impl Default for IoStream {
    fn default() -> Self {
        IoStream::stdio()
    }
}

fn read_stdin_line() -> Option<String> {
    let mut line = String::new();

    match io::stdin().lock().read_line(&mut line) {
        Ok(0) | Err(_) => None,
        Ok(_) => {
            let trimmed: &str = line.trim_end_matches(['\n', '\r']);
            Some(trimmed.to_owned())
        }
    }
}
