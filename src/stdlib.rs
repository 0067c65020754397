//! Native classes available to every [`Runtime`](crate::runtime::Runtime).
//!
//! Each instance keeps its storage on the host side; the script only sees
//! native methods installed as fields, which close over that storage.
//!
//! | Class | Methods |
//! |-------|---------|
//! | `List` | `add(v)`, `at(i)`, `setAt(i, v)`, `removeAt(i)`, `count()` |
//! | `Map`  | `add(k, v)`, `at(k)`, `setAt(k, v)`, `contains(k)`, `remove(k)`, `count()` |
//!
//! Both support `xs[i]` through their `at` method.

use std::cell::RefCell;
use std::collections::HashMap;
use std::rc::Rc;

use log::debug;

use crate::callable::NativeFunction;
use crate::class::{Class, Instance};
use crate::interpreter::Interpreter;
use crate::runtime::{LibraryBinder, Runtime};
use crate::value::Value;

pub struct StandardLibrary;

impl LibraryBinder for StandardLibrary {
    fn bind(&self, runtime: &mut Runtime) {
        debug!("Binding standard library");

        runtime.define_value("List", list_class());
        runtime.define_value("Map", map_class());
    }
}

/// Installs a native method on `instance` as a field.
fn method<F>(instance: &Instance, name: &str, arity: usize, func: F)
where
    F: Fn(&mut Interpreter, &[Value]) -> Result<Value, String> + 'static,
{
    instance.set(name, Value::from(NativeFunction::new(name, arity, func)));
}

// ─────────────────────────────── List ───────────────────────────────

fn list_class() -> Rc<Class> {
    Class::native("List", 0, Vec::new(), |instance, _| {
        let items: Rc<RefCell<Vec<Value>>> = Rc::new(RefCell::new(Vec::new()));

        let store = Rc::clone(&items);
        method(instance, "add", 1, move |_, args| {
            store.borrow_mut().push(args[0].clone());
            Ok(Value::Null)
        });

        let store = Rc::clone(&items);
        method(instance, "at", 1, move |_, args| {
            let items = store.borrow();
            let i: usize = index(&args[0], items.len())?;
            Ok(items[i].clone())
        });

        let store = Rc::clone(&items);
        method(instance, "setAt", 2, move |_, args| {
            let mut items = store.borrow_mut();
            let i: usize = index(&args[0], items.len())?;
            items[i] = args[1].clone();
            Ok(args[1].clone())
        });

        let store = Rc::clone(&items);
        method(instance, "removeAt", 1, move |_, args| {
            let mut items = store.borrow_mut();
            let i: usize = index(&args[0], items.len())?;
            Ok(items.remove(i))
        });

        method(instance, "count", 0, move |_, _| Ok(Value::from(items.borrow().len())));

        Ok(())
    })
}

fn index(value: &Value, len: usize) -> Result<usize, String> {
    match value {
        Value::Number(n) if n.fract() == 0.0 && *n >= 0.0 && (*n as usize) < len => {
            Ok(*n as usize)
        }
        Value::Number(n) if n.fract() == 0.0 => Err(format!(
            "Index {} out of range for a list of {} items.",
            value, len
        )),
        _ => Err(format!("List index must be a whole number, got {}.", value)),
    }
}

// ─────────────────────────────── Map ───────────────────────────────

/// Hashable projection of the values allowed as map keys.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
enum MapKey {
    Null,
    Bool(bool),
    /// Bit pattern with `-0` folded into `0`.
    Number(u64),
    Text(String),
}

impl TryFrom<&Value> for MapKey {
    type Error = String;

    fn try_from(value: &Value) -> Result<Self, Self::Error> {
        match value {
            Value::Null => Ok(MapKey::Null),
            Value::Bool(b) => Ok(MapKey::Bool(*b)),
            Value::Number(n) => {
                let n: f64 = if *n == 0.0 { 0.0 } else { *n };
                Ok(MapKey::Number(n.to_bits()))
            }
            Value::Text(s) => Ok(MapKey::Text(s.clone())),
            other => Err(format!(
                "Map keys must be null, booleans, numbers or text, got {}.",
                other.type_name()
            )),
        }
    }
}

fn map_class() -> Rc<Class> {
    Class::native("Map", 0, Vec::new(), |instance, _| {
        let entries: Rc<RefCell<HashMap<MapKey, Value>>> = Rc::new(RefCell::new(HashMap::new()));

        let store = Rc::clone(&entries);
        method(instance, "add", 2, move |_, args| {
            let key = MapKey::try_from(&args[0])?;
            let mut entries = store.borrow_mut();

            if entries.contains_key(&key) {
                return Err(format!("Key {} already exists.", args[0]));
            }

            entries.insert(key, args[1].clone());
            Ok(Value::Null)
        });

        let store = Rc::clone(&entries);
        method(instance, "at", 1, move |_, args| {
            let key = MapKey::try_from(&args[0])?;
            store
                .borrow()
                .get(&key)
                .cloned()
                .ok_or_else(|| format!("Key {} not found.", args[0]))
        });

        let store = Rc::clone(&entries);
        method(instance, "setAt", 2, move |_, args| {
            let key = MapKey::try_from(&args[0])?;
            store.borrow_mut().insert(key, args[1].clone());
            Ok(args[1].clone())
        });

        let store = Rc::clone(&entries);
        method(instance, "contains", 1, move |_, args| {
            let key = MapKey::try_from(&args[0])?;
            Ok(Value::Bool(store.borrow().contains_key(&key)))
        });

        let store = Rc::clone(&entries);
        method(instance, "remove", 1, move |_, args| {
            let key = MapKey::try_from(&args[0])?;
            Ok(Value::from(store.borrow_mut().remove(&key)))
        });

        method(instance, "count", 0, move |_, _| Ok(Value::from(entries.borrow().len())));

        Ok(())
    })
}
