// ABOUTME: Mutable reference cells

use super::def;
use crate::env::Environment;
use crate::error::LispError;
use crate::value::Value;
use std::cell::RefCell;
use std::rc::Rc;

fn atom(args: &[Value]) -> Result<Value, LispError> {
    Ok(Value::Atom(Rc::new(RefCell::new(args[0].clone()))))
}

fn is_atom(args: &[Value]) -> Result<Value, LispError> {
    Ok(Value::Boolean(matches!(args.first(), Some(Value::Atom(_)))))
}

fn deref(args: &[Value]) -> Result<Value, LispError> {
    match &args[0] {
        Value::Atom(a) => Ok(a.borrow().clone()),
        other => Err(LispError::host(format!(
            "deref: expected an atom, got {}",
            other.type_name()
        ))),
    }
}

fn reset(args: &[Value]) -> Result<Value, LispError> {
    let [atom, value] = args else {
        return Err(LispError::host("reset!: requires exactly 2 arguments"));
    };
    match atom {
        Value::Atom(a) => {
            *a.borrow_mut() = value.clone();
            Ok(value.clone())
        }
        other => Err(LispError::host(format!(
            "reset!: expected an atom, got {}",
            other.type_name()
        ))),
    }
}

pub fn register(env: &Rc<Environment>) {
    def(env, "atom", atom);
    def(env, "atom?", is_atom);
    def(env, "deref", deref);
    def(env, "reset!", reset);
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn atom_roundtrips_through_deref() {
        let a = atom(&[Value::Number(1)]).unwrap();
        assert!(matches!(is_atom(&[a.clone()]), Ok(Value::Boolean(true))));
        assert!(matches!(deref(&[a]), Ok(Value::Number(1))));
    }

    #[test]
    fn reset_replaces_contents_and_returns_new_value() {
        let a = atom(&[Value::Number(1)]).unwrap();
        let got = reset(&[a.clone(), Value::Number(2)]).unwrap();
        assert!(matches!(got, Value::Number(2)));
        assert!(matches!(deref(&[a]), Ok(Value::Number(2))));
    }

    #[test]
    fn deref_of_non_atom_is_an_error() {
        assert!(deref(&[Value::Number(1)]).is_err());
    }
}
