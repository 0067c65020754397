#![allow(dead_code)]

use std::cell::RefCell;
use std::rc::Rc;

use roux::error::Result;
use roux::io::IoStream;
use roux::runtime::Runtime;

pub type Lines = Rc<RefCell<Vec<String>>>;

/// A runtime whose output and error hooks append to shared buffers.
pub struct Harness {
    pub runtime: Runtime,
    pub output: Lines,
    pub errors: Lines,
}

impl Harness {
    pub fn new() -> Self {
        Self::with_input(Vec::new())
    }

    /// Like [`Harness::new`], with `lines` served one by one to `input()`.
    pub fn with_input(lines: Vec<&str>) -> Self {
        let output: Lines = Rc::new(RefCell::new(Vec::new()));
        let errors: Lines = Rc::new(RefCell::new(Vec::new()));
        let input: Rc<RefCell<Vec<String>>> = Rc::new(RefCell::new(
            lines.into_iter().rev().map(str::to_owned).collect(),
        ));

        let out = Rc::clone(&output);
        let err = Rc::clone(&errors);

        let io = IoStream::silent()
            .on_output(move |text| out.borrow_mut().push(text.to_owned()))
            .on_error(move |text| err.borrow_mut().push(text.to_owned()))
            .on_input(move || input.borrow_mut().pop());

        Harness {
            runtime: Runtime::with_io(io),
            output,
            errors,
        }
    }

    pub fn run(&mut self, source: &str) -> Result<()> {
        self.runtime.run(source)
    }

    pub fn output(&self) -> Vec<String> {
        self.output.borrow().clone()
    }

    pub fn errors(&self) -> Vec<String> {
        self.errors.borrow().clone()
    }
}

/// Runs `source` in a fresh runtime and returns everything it printed.
/// Panics if the run fails.
pub fn output_of(source: &str) -> Vec<String> {
    let mut harness = Harness::new();

    if let Err(e) = harness.run(source) {
        panic!("run failed: {}\nerrors: {:?}", e, harness.errors());
    }

    harness.output()
}
