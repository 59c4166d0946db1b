// ABOUTME: Type predicates, metadata, and the apply/map/throw primitives

use super::def;
use crate::env::Environment;
use crate::error::LispError;
use crate::value::Value;
use std::rc::Rc;
use std::time::{SystemTime, UNIX_EPOCH};

fn symbol(args: &[Value]) -> Result<Value, LispError> {
    let Value::String(s) = &args[0] else {
        return Err(LispError::host("symbol: expected a string"));
    };
    Ok(Value::symbol(s.clone()))
}

fn is_symbol(args: &[Value]) -> Result<Value, LispError> {
    Ok(Value::Boolean(matches!(args.first(), Some(Value::Symbol(_)))))
}

fn keyword(args: &[Value]) -> Result<Value, LispError> {
    match &args[0] {
        Value::String(s) => Ok(Value::Keyword(s.clone())),
        Value::Keyword(k) => Ok(Value::Keyword(k.clone())),
        other => Err(LispError::host(format!(
            "keyword: expected a string, got {}",
            other.type_name()
        ))),
    }
}

fn is_keyword(args: &[Value]) -> Result<Value, LispError> {
    Ok(Value::Boolean(matches!(args.first(), Some(Value::Keyword(_)))))
}

fn is_nil(args: &[Value]) -> Result<Value, LispError> {
    Ok(Value::Boolean(matches!(args.first(), Some(Value::Nil))))
}

fn is_true(args: &[Value]) -> Result<Value, LispError> {
    Ok(Value::Boolean(matches!(args.first(), Some(Value::Boolean(true)))))
}

fn is_false(args: &[Value]) -> Result<Value, LispError> {
    Ok(Value::Boolean(matches!(args.first(), Some(Value::Boolean(false)))))
}

fn is_string(args: &[Value]) -> Result<Value, LispError> {
    Ok(Value::Boolean(matches!(args.first(), Some(Value::String(_)))))
}

fn is_number(args: &[Value]) -> Result<Value, LispError> {
    Ok(Value::Boolean(matches!(args.first(), Some(Value::Number(_)))))
}

fn is_fn(args: &[Value]) -> Result<Value, LispError> {
    Ok(Value::Boolean(match args.first() {
        Some(Value::Native(_)) => true,
        Some(Value::Function(l)) => !l.is_macro,
        _ => false,
    }))
}

fn is_macro(args: &[Value]) -> Result<Value, LispError> {
    Ok(Value::Boolean(
        matches!(args.first(), Some(Value::Function(l)) if l.is_macro),
    ))
}

fn throw(args: &[Value]) -> Result<Value, LispError> {
    Err(LispError::Throw(args[0].clone()))
}

fn apply(args: &[Value]) -> Result<Value, LispError> {
    let [f, middle @ .., last] = args else {
        return Err(LispError::host("apply: requires at least 2 arguments"));
    };
    let trailing = last
        .as_seq()
        .ok_or_else(|| LispError::host("apply: last argument must be a sequence"))?;
    let mut call_args = middle.to_vec();
    call_args.extend_from_slice(trailing);
    crate::eval::apply(f.clone(), &call_args)
}

fn map(args: &[Value]) -> Result<Value, LispError> {
    let [f, seq] = args else {
        return Err(LispError::host("map: requires exactly 2 arguments"));
    };
    let items = seq
        .as_seq()
        .ok_or_else(|| LispError::host("map: second argument must be a sequence"))?;
    items
        .iter()
        .map(|item| crate::eval::apply(f.clone(), std::slice::from_ref(item)))
        .collect::<Result<Vec<_>, _>>()
        .map(Value::list)
}

fn meta(args: &[Value]) -> Result<Value, LispError> {
    Ok(args[0].meta())
}

fn with_meta(args: &[Value]) -> Result<Value, LispError> {
    let [v, m] = args else {
        return Err(LispError::host("with-meta: requires exactly 2 arguments"));
    };
    v.with_meta(m.clone())
}

fn time_ms(_args: &[Value]) -> Result<Value, LispError> {
    let elapsed = SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map_err(|e| LispError::host(format!("time-ms: {e}")))?;
    Ok(Value::Number(elapsed.as_millis() as i64))
}

pub fn register(env: &Rc<Environment>) {
    def(env, "symbol", symbol);
    def(env, "symbol?", is_symbol);
    def(env, "keyword", keyword);
    def(env, "keyword?", is_keyword);
    def(env, "nil?", is_nil);
    def(env, "true?", is_true);
    def(env, "false?", is_false);
    def(env, "string?", is_string);
    def(env, "number?", is_number);
    def(env, "fn?", is_fn);
    def(env, "macro?", is_macro);
    def(env, "throw", throw);
    def(env, "apply", apply);
    def(env, "map", map);
    def(env, "meta", meta);
    def(env, "with-meta", with_meta);
    def(env, "time-ms", time_ms);
}
