// ABOUTME: Hash-map construction and access

use super::def;
use crate::env::Environment;
use crate::error::LispError;
use crate::value::{LMap, MapKey, Value};
use std::rc::Rc;

fn as_map<'a>(v: &'a Value) -> Result<&'a LMap, LispError> {
    match v {
        Value::Map(m) => Ok(m),
        other => Err(LispError::host(format!(
            "expected a map, got {}",
            other.type_name()
        ))),
    }
}

fn hash_map(args: &[Value]) -> Result<Value, LispError> {
    if args.len() % 2 != 0 {
        return Err(LispError::host("hash-map: requires an even number of arguments"));
    }
    let mut m = LMap::new();
    for pair in args.chunks(2) {
        m.insert(MapKey::from_value(&pair[0])?, pair[1].clone());
    }
    Ok(Value::Map(Rc::new(m)))
}

fn is_map(args: &[Value]) -> Result<Value, LispError> {
    Ok(Value::Boolean(matches!(args.first(), Some(Value::Map(_)))))
}

fn assoc(args: &[Value]) -> Result<Value, LispError> {
    let [m, rest @ ..] = args else {
        return Err(LispError::host("assoc: requires at least 1 argument"));
    };
    if rest.len() % 2 != 0 {
        return Err(LispError::host("assoc: requires an even number of key/value arguments"));
    }
    let mut out = as_map(m)?.clone();
    for pair in rest.chunks(2) {
        out.insert(MapKey::from_value(&pair[0])?, pair[1].clone());
    }
    Ok(Value::Map(Rc::new(out)))
}

fn dissoc(args: &[Value]) -> Result<Value, LispError> {
    let [m, keys @ ..] = args else {
        return Err(LispError::host("dissoc: requires at least 1 argument"));
    };
    let mut out = as_map(m)?.clone();
    for k in keys {
        out.shift_remove(&MapKey::from_value(k)?);
    }
    Ok(Value::Map(Rc::new(out)))
}

fn get(args: &[Value]) -> Result<Value, LispError> {
    let [m, k] = args else {
        return Err(LispError::host("get: requires exactly 2 arguments"));
    };
    if matches!(m, Value::Nil) {
        return Ok(Value::Nil);
    }
    let key = MapKey::from_value(k)?;
    Ok(as_map(m)?.get(&key).cloned().unwrap_or(Value::Nil))
}

fn contains(args: &[Value]) -> Result<Value, LispError> {
    let [m, k] = args else {
        return Err(LispError::host("contains?: requires exactly 2 arguments"));
    };
    if matches!(m, Value::Nil) {
        return Ok(Value::Boolean(false));
    }
    let key = MapKey::from_value(k)?;
    Ok(Value::Boolean(as_map(m)?.contains_key(&key)))
}

fn keys(args: &[Value]) -> Result<Value, LispError> {
    Ok(Value::list(as_map(&args[0])?.keys().map(MapKey::to_value).collect()))
}

fn vals(args: &[Value]) -> Result<Value, LispError> {
    Ok(Value::list(as_map(&args[0])?.values().cloned().collect()))
}

pub fn register(env: &Rc<Environment>) {
    def(env, "hash-map", hash_map);
    def(env, "map?", is_map);
    def(env, "assoc", assoc);
    def(env, "dissoc", dissoc);
    def(env, "get", get);
    def(env, "contains?", contains);
    def(env, "keys", keys);
    def(env, "vals", vals);
}
