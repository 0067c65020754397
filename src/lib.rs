pub mod ast;
pub mod ast_printer;
pub mod callable;
pub mod class;
pub mod environment;
pub mod error;
pub mod interpreter;
pub mod io;
pub mod parser;
pub mod reporter;
pub mod resolver;
pub mod runtime;
pub mod scanner;
pub mod stdlib;
pub mod token;
pub mod value;

pub use error::{Result, RouxError};
pub use io::IoStream;
pub use runtime::{LibraryBinder, Runtime, Target};
pub use value::Value;
