use std::fmt;
use std::ptr;
use std::rc::Rc;

use crate::callable::{Callable, NativeFunction};
use crate::class::{Class, Instance};
use crate::interpreter::Interpreter;

/// Every value a Roux program can observe.
#[derive(Clone)]
pub enum Value {
    Null,
    Bool(bool),
    Number(f64),
    Text(String),
    /// Native functions, declared functions, lambdas and bound methods.
    Callable(Rc<dyn Callable>),
    Class(Rc<Class>),
    Instance(Rc<Instance>),
}

impl Value {
    /// Wraps a host closure as a callable value.
    pub fn native<F>(name: &str, arity: usize, func: F) -> Self
    where
        F: Fn(&mut Interpreter, &[Value]) -> Result<Value, String> + 'static,
    {
        Value::Callable(Rc::new(NativeFunction::new(name, arity, func)))
    }

    /// `null` and `false` are falsey; everything else, `0` and `""` included,
    /// is truthy.
    pub fn is_truthy(&self) -> bool {
        !matches!(self, Value::Null | Value::Bool(false))
    }

    pub fn type_name(&self) -> &'static str {
        match self {
            Value::Null => "null",
            Value::Bool(_) => "boolean",
            Value::Number(_) => "number",
            Value::Text(_) => "text",
            Value::Callable(_) => "function",
            Value::Class(_) => "class",
            Value::Instance(_) => "instance",
        }
    }

    /// The callable capability of this value, if it has one. Classes are
    /// callable as constructors.
    pub fn as_callable(&self) -> Option<Rc<dyn Callable>> {
        match self {
            Value::Callable(callable) => Some(Rc::clone(callable)),
            Value::Class(class) => {
                let callable: Rc<dyn Callable> = Rc::clone(class) as Rc<dyn Callable>;
                Some(callable)
            }
            _ => None,
        }
    }

    pub fn as_number(&self) -> Option<f64> {
        match self {
            Value::Number(n) => Some(*n),
            _ => None,
        }
    }

    pub fn is_null(&self) -> bool {
        matches!(self, Value::Null)
    }
}

impl PartialEq for Value {
    /// `null` equals only `null`; same‑kind operands compare by value (by
    /// identity for functions, classes and instances); different kinds are
    /// never equal.
    fn eq(&self, other: &Self) -> bool {
        match (self, other) {
            (Value::Null, Value::Null) => true,
            (Value::Bool(a), Value::Bool(b)) => a == b,
            (Value::Number(a), Value::Number(b)) => a == b,
            (Value::Text(a), Value::Text(b)) => a == b,
            (Value::Callable(a), Value::Callable(b)) => ptr::addr_eq(Rc::as_ptr(a), Rc::as_ptr(b)),
            (Value::Class(a), Value::Class(b)) => Rc::ptr_eq(a, b),
            (Value::Instance(a), Value::Instance(b)) => Rc::ptr_eq(a, b),
            _ => false,
        }
    }
}

impl fmt::Display for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Value::Null => write!(f, "null"),

            Value::Bool(b) => write!(f, "{}", b),

            Value::Number(n) => {
                if n.fract() == 0.0 && n.abs() < i64::MAX as f64 {
                    let mut buf: itoa::Buffer = itoa::Buffer::new();
                    // `-0` prints as `0`.
                    write!(f, "{}", buf.format(*n as i64))
                } else {
                    write!(f, "{}", n)
                }
            }

            Value::Text(s) => write!(f, "{}", s),

            Value::Callable(callable) => write!(f, "{}", callable),

            Value::Class(class) => write!(f, "{}", class.name()),

            Value::Instance(instance) => write!(f, "{} instance", instance.class().name()),
        }
    }
}

impl fmt::Debug for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Value::Text(s) => write!(f, "{:?}", s),
            other => write!(f, "{}", other),
        }
    }
}

// ───────────────────── host → script conversions ─────────────────────
//
// Host values crossing the embedding boundary are widened into the script's
// value domain: every numeric type becomes an `f64`.

macro_rules! number_from {
    ($($t:ty),*) => {
        $(
            impl From<$t> for Value {
                fn from(n: $t) -> Self {
                    Value::Number(n as f64)
                }
            }
        )*
    };
}

number_from!(i8, i16, i32, i64, isize, u8, u16, u32, u64, usize, f32, f64);

impl From<bool> for Value {
    fn from(b: bool) -> Self {
        Value::Bool(b)
    }
}

impl From<&str> for Value {
    fn from(s: &str) -> Self {
        Value::Text(s.to_owned())
    }
}

impl From<String> for Value {
    fn from(s: String) -> Self {
        Value::Text(s)
    }
}

impl From<()> for Value {
    fn from(_: ()) -> Self {
        Value::Null
    }
}

impl<T: Into<Value>> From<Option<T>> for Value {
    fn from(value: Option<T>) -> Self {
        value.map(Into::into).unwrap_or(Value::Null)
    }
}

impl From<Rc<Instance>> for Value {
    fn from(instance: Rc<Instance>) -> Self {
        Value::Instance(instance)
    }
}

impl From<Rc<Class>> for Value {
    fn from(class: Rc<Class>) -> Self {
        Value::Class(class)
    }
}

impl From<NativeFunction> for Value {
    fn from(function: NativeFunction) -> Self {
        Value::Callable(Rc::new(function))
    }
}
