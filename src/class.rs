//! Classes and instances.
//!
//! A class owns an instance‑method table, a static‑method table and, for
//! host‑defined classes, a native constructor that seeds each new instance's
//! fields (typically with [`NativeFunction`]s closing over private state).
//! Calling a class creates a field‑less instance, runs the native constructor
//! if any, then binds and calls a script `construct` method if one exists. The
//! result is always the instance.

use std::cell::RefCell;
use std::collections::HashMap;
use std::fmt;
use std::rc::{Rc, Weak};

use log::debug;

use crate::callable::{Callable, Function, NativeFunction, CONSTRUCTOR};
use crate::error::{Result, RouxError};
use crate::interpreter::Interpreter;
use crate::value::Value;

/// Host hook run on every new instance of a native class.
pub type NativeInit = dyn Fn(&Rc<Instance>, &[Value]) -> std::result::Result<(), String>;

struct NativeConstructor {
    arity: usize,
    init: Box<NativeInit>,
}

/// A script or native class.
///
/// Script methods close over the frame the class name is defined in, and that
/// frame holds the class, so the pair forms an `Rc` cycle. A class declared
/// inside a block or function, along with that frame, is never freed: not
/// when the scope returns and not when the runtime is dropped.
pub struct Class {
    name: String,
    /// Handle to the `Rc` this class lives in, so calls can hand it to instances.
    this: Weak<Class>,
    methods: HashMap<String, Rc<Function>>,
    static_methods: HashMap<String, Value>,
    native: Option<NativeConstructor>,
}

impl Class {
    /// A script‑declared class.
    pub fn new(
        name: &str,
        methods: HashMap<String, Rc<Function>>,
        static_methods: HashMap<String, Value>,
    ) -> Rc<Class> {
        Rc::new_cyclic(|this| Class {
            name: name.to_owned(),
            this: this.clone(),
            methods,
            static_methods,
            native: None,
        })
    }

    /// A host‑defined class whose instances are prepared by `init`.
    pub fn native<F>(name: &str, arity: usize, statics: Vec<NativeFunction>, init: F) -> Rc<Class>
    where
        F: Fn(&Rc<Instance>, &[Value]) -> std::result::Result<(), String> + 'static,
    {
        let static_methods: HashMap<String, Value> = statics
            .into_iter()
            .map(|function| (function.name().to_owned(), Value::from(function)))
            .collect();

        Rc::new_cyclic(|this| Class {
            name: name.to_owned(),
            this: this.clone(),
            methods: HashMap::new(),
            static_methods,
            native: Some(NativeConstructor {
                arity,
                init: Box::new(init),
            }),
        })
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn find_method(&self, name: &str) -> Option<Rc<Function>> {
        self.methods.get(name).cloned()
    }

    pub fn find_static(&self, name: &str) -> Option<Value> {
        self.static_methods.get(name).cloned()
    }
}

impl Callable for Class {
    fn name(&self) -> &str {
        &self.name
    }

    /// The constructor's parameter count, or 0 without one.
    fn arity(&self) -> usize {
        if let Some(constructor) = self.find_method(CONSTRUCTOR) {
            return constructor.arity();
        }

        self.native.as_ref().map(|n| n.arity).unwrap_or(0)
    }

    fn call(&self, interpreter: &mut Interpreter, arguments: Vec<Value>) -> Result<Value> {
        let class: Rc<Class> = self
            .this
            .upgrade()
            .ok_or_else(|| RouxError::Native(format!("Class '{}' is no longer alive", self.name)))?;

        debug!("Instantiating {}", self.name);

        let instance: Rc<Instance> = Instance::new(class);

        if let Some(native) = &self.native {
            (native.init)(&instance, &arguments).map_err(RouxError::Native)?;
        }

        if let Some(constructor) = self.find_method(CONSTRUCTOR) {
            constructor.bind(&instance).call(interpreter, arguments)?;
        }

        Ok(Value::Instance(instance))
    }
}

impl fmt::Display for Class {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.name)
    }
}

/// An object: a class reference plus lazily populated fields.
pub struct Instance {
    class: Rc<Class>,
    fields: RefCell<HashMap<String, Value>>,
}

impl Instance {
    pub fn new(class: Rc<Class>) -> Rc<Instance> {
        Rc::new(Instance {
            class,
            fields: RefCell::new(HashMap::new()),
        })
    }

    pub fn class(&self) -> &Rc<Class> {
        &self.class
    }

    /// Property read: fields first, then static methods, then instance
    /// methods (bound to this instance).
    pub fn get(self: &Rc<Self>, name: &str) -> Option<Value> {
        if let Some(value) = self.fields.borrow().get(name) {
            return Some(value.clone());
        }

        if let Some(value) = self.class.find_static(name) {
            return Some(value);
        }

        self.class.find_method(name).map(|method| {
            let bound: Rc<dyn Callable> = Rc::new(method.bind(self));
            Value::Callable(bound)
        })
    }

    /// Property write: always creates or overwrites a field.
    pub fn set(&self, name: &str, value: Value) {
        self.fields.borrow_mut().insert(name.to_owned(), value);
    }
}
