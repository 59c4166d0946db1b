// ABOUTME: Core namespace — built-in operations registered into the root environment

use crate::env::Environment;
use crate::error::LispError;
use crate::value::{Native, Value};
use std::cell::RefCell;
use std::rc::Rc;

pub mod arithmetic;
pub mod atoms;
pub mod comparison;
pub mod maps;
pub mod reflect;
pub mod sequences;
pub mod strings_io;

/// Binds `name` to a native function in `env`.
pub(crate) fn def(
    env: &Rc<Environment>,
    name: &str,
    f: impl Fn(&[Value]) -> Result<Value, LispError> + 'static,
) {
    let name: Rc<str> = name.into();
    env.set(
        name.clone(),
        Value::Native(Rc::new(Native {
            name,
            func: Box::new(f),
            meta: RefCell::new(Value::Nil),
        })),
    );
}

pub fn register_builtins(env: &Rc<Environment>) {
    arithmetic::register(env);
    comparison::register(env);
    sequences::register(env);
    maps::register(env);
    strings_io::register(env);
    atoms::register(env);
    reflect::register(env);
}
