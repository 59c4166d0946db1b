// ABOUTME: Integer arithmetic operators

use super::def;
use crate::env::Environment;
use crate::error::LispError;
use crate::value::Value;
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

fn add(args: &[Value]) -> Result<Value, LispError> {
    let mut total = 0i64;
    for a in args {
        total += as_number(a)?;
    }
    Ok(Value::Number(total))
}

fn sub(args: &[Value]) -> Result<Value, LispError> {
    match args {
        [] => Err(LispError::host("-: requires at least 1 argument")),
        [a] => Ok(Value::Number(-as_number(a)?)),
        [first, rest @ ..] => {
            let mut total = as_number(first)?;
            for a in rest {
                total -= as_number(a)?;
            }
            Ok(Value::Number(total))
        }
    }
}

fn mul(args: &[Value]) -> Result<Value, LispError> {
    let mut total = 1i64;
    for a in args {
        total *= as_number(a)?;
    }
    Ok(Value::Number(total))
}

fn div(args: &[Value]) -> Result<Value, LispError> {
    match args {
        [_] | [] => Err(LispError::host("/: requires at least 2 arguments")),
        [first, rest @ ..] => {
            let mut total = as_number(first)?;
            for a in rest {
                let d = as_number(a)?;
                if d == 0 {
                    return Err(LispError::host("/: division by zero"));
                }
                total /= d;
            }
            Ok(Value::Number(total))
        }
    }
}

pub fn register(env: &Rc<Environment>) {
    def(env, "+", add);
    def(env, "-", sub);
    def(env, "*", mul);
    def(env, "/", div);
}
