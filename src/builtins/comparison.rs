// ABOUTME: Ordering and equality predicates

use super::def;
use crate::env::Environment;
use crate::error::LispError;
use crate::value::Value;
use std::cmp::Ordering;
use std::rc::Rc;

fn as_number(v: &Value) -> Result<i64, LispError> {
    match v {
        Value::Number(n) => Ok(*n),
        other => Err(LispError::host(format!(
            "expected a number, got {}",
            other.type_name()
        ))),
    }
}

/// Chains `cmp` pairwise over `args`, requiring at least two and all numeric.
fn chain(args: &[Value], ok: impl Fn(Ordering) -> bool) -> Result<Value, LispError> {
    if args.len() < 2 {
        return Err(LispError::host("comparison requires at least 2 arguments"));
    }
    for pair in args.windows(2) {
        let a = as_number(&pair[0])?;
        let b = as_number(&pair[1])?;
        if !ok(a.cmp(&b)) {
            return Ok(Value::Boolean(false));
        }
    }
    Ok(Value::Boolean(true))
}

fn lt(args: &[Value]) -> Result<Value, LispError> {
    chain(args, |o| o == Ordering::Less)
}

fn lte(args: &[Value]) -> Result<Value, LispError> {
    chain(args, |o| o != Ordering::Greater)
}

fn gt(args: &[Value]) -> Result<Value, LispError> {
    chain(args, |o| o == Ordering::Greater)
}

fn gte(args: &[Value]) -> Result<Value, LispError> {
    chain(args, |o| o != Ordering::Less)
}

fn eq(args: &[Value]) -> Result<Value, LispError> {
    if args.len() < 2 {
        return Err(LispError::host("=: requires at least 2 arguments"));
    }
    Ok(Value::Boolean(args.windows(2).all(|p| p[0].lisp_eq(&p[1]))))
}

pub fn register(env: &Rc<Environment>) {
    def(env, "<", lt);
    def(env, "<=", lte);
    def(env, ">", gt);
    def(env, ">=", gte);
    def(env, "=", eq);
}
