// ABOUTME: List and vector operations shared by both sequence kinds

use super::def;
use crate::env::Environment;
use crate::error::LispError;
use crate::value::Value;
use std::rc::Rc;

fn as_seq<'a>(v: &'a Value) -> Result<&'a [Value], LispError> {
    v.as_seq()
        .ok_or_else(|| LispError::host(format!("expected a sequence, got {}", v.type_name())))
}

fn list(args: &[Value]) -> Result<Value, LispError> {
    Ok(Value::list(args.to_vec()))
}

fn is_list(args: &[Value]) -> Result<Value, LispError> {
    Ok(Value::Boolean(matches!(args.first(), Some(Value::List(_)))))
}

fn vector(args: &[Value]) -> Result<Value, LispError> {
    Ok(Value::vector(args.to_vec()))
}

fn is_vector(args: &[Value]) -> Result<Value, LispError> {
    Ok(Value::Boolean(matches!(args.first(), Some(Value::Vector(_)))))
}

fn is_sequential(args: &[Value]) -> Result<Value, LispError> {
    Ok(Value::Boolean(matches!(
        args.first(),
        Some(Value::List(_)) | Some(Value::Vector(_))
    )))
}

fn is_empty(args: &[Value]) -> Result<Value, LispError> {
    Ok(Value::Boolean(as_seq(&args[0])?.is_empty()))
}

fn count(args: &[Value]) -> Result<Value, LispError> {
    Ok(Value::Number(as_seq(&args[0])?.len() as i64))
}

fn cons(args: &[Value]) -> Result<Value, LispError> {
    let [head, tail] = args else {
        return Err(LispError::host("cons: requires exactly 2 arguments"));
    };
    let mut items = vec![head.clone()];
    items.extend_from_slice(as_seq(tail)?);
    Ok(Value::list(items))
}

fn concat(args: &[Value]) -> Result<Value, LispError> {
    let mut items = Vec::new();
    for a in args {
        items.extend_from_slice(as_seq(a)?);
    }
    Ok(Value::list(items))
}

fn nth(args: &[Value]) -> Result<Value, LispError> {
    let [seq, idx] = args else {
        return Err(LispError::host("nth: requires exactly 2 arguments"));
    };
    let items = as_seq(seq)?;
    let Value::Number(i) = idx else {
        return Err(LispError::host("nth: index must be a number"));
    };
    items
        .get(*i as usize)
        .cloned()
        .ok_or_else(|| LispError::host(format!("nth: index {i} out of bounds")))
}

fn first(args: &[Value]) -> Result<Value, LispError> {
    Ok(as_seq(&args[0])?.first().cloned().unwrap_or(Value::Nil))
}

fn rest(args: &[Value]) -> Result<Value, LispError> {
    let items = as_seq(&args[0])?;
    Ok(Value::list(items.iter().skip(1).cloned().collect()))
}

fn conj(args: &[Value]) -> Result<Value, LispError> {
    let [seq, rest @ ..] = args else {
        return Err(LispError::host("conj: requires at least 1 argument"));
    };
    match seq {
        Value::List(items) => {
            let mut out: Vec<Value> = items.as_ref().clone();
            for a in rest {
                out.insert(0, a.clone());
            }
            Ok(Value::list(out))
        }
        Value::Vector(items) => {
            let mut out: Vec<Value> = items.as_ref().clone();
            out.extend(rest.iter().cloned());
            Ok(Value::vector(out))
        }
        other => Err(LispError::host(format!(
            "conj: expected a list or vector, got {}",
            other.type_name()
        ))),
    }
}

fn seq(args: &[Value]) -> Result<Value, LispError> {
    match &args[0] {
        Value::Nil => Ok(Value::Nil),
        Value::List(items) if items.is_empty() => Ok(Value::Nil),
        Value::List(items) => Ok(Value::List(items.clone())),
        Value::Vector(items) if items.is_empty() => Ok(Value::Nil),
        Value::Vector(items) => Ok(Value::list(items.as_ref().clone())),
        Value::String(s) if s.is_empty() => Ok(Value::Nil),
        Value::String(s) => Ok(Value::list(s.chars().map(|c| Value::string(c.to_string())).collect())),
        other => Err(LispError::host(format!(
            "seq: expected a sequence or string, got {}",
            other.type_name()
        ))),
    }
}

fn vec(args: &[Value]) -> Result<Value, LispError> {
    Ok(Value::vector(as_seq(&args[0])?.to_vec()))
}

pub fn register(env: &Rc<Environment>) {
    def(env, "list", list);
    def(env, "list?", is_list);
    def(env, "vector", vector);
    def(env, "vector?", is_vector);
    def(env, "sequential?", is_sequential);
    def(env, "empty?", is_empty);
    def(env, "count", count);
    def(env, "cons", cons);
    def(env, "concat", concat);
    def(env, "nth", nth);
    def(env, "first", first);
    def(env, "rest", rest);
    def(env, "conj", conj);
    def(env, "seq", seq);
    def(env, "vec", vec);
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn count_treats_nil_as_empty() {
        assert!(matches!(count(&[Value::Nil]), Ok(Value::Number(0))));
    }

    #[test]
    fn cons_prepends_onto_either_sequence_kind() {
        let v = Value::vector(vec![Value::Number(2)]);
        let got = cons(&[Value::Number(1), v]).unwrap();
        assert!(got.lisp_eq(&Value::list(vec![Value::Number(1), Value::Number(2)])));
    }

    #[test]
    fn nth_out_of_bounds_is_an_error() {
        let l = Value::list(vec![Value::Number(1)]);
        assert!(nth(&[l, Value::Number(5)]).is_err());
    }

    #[test]
    fn first_and_rest_of_empty_are_nil_and_empty_list() {
        let empty = Value::list(vec![]);
        assert!(matches!(first(&[empty.clone()]), Ok(Value::Nil)));
        assert!(rest(&[empty]).unwrap().lisp_eq(&Value::list(vec![])));
    }

    #[test]
    fn conj_prepends_on_list_appends_on_vector() {
        let l = Value::list(vec![Value::Number(1), Value::Number(2)]);
        let got = conj(&[l, Value::Number(3), Value::Number(4)]).unwrap();
        assert!(got.lisp_eq(&Value::list(vec![
            Value::Number(4),
            Value::Number(3),
            Value::Number(1),
            Value::Number(2)
        ])));

        let v = Value::vector(vec![Value::Number(1), Value::Number(2)]);
        let got = conj(&[v, Value::Number(3)]).unwrap();
        assert!(matches!(got, Value::Vector(ref items) if items.len() == 3));
    }

    #[test]
    fn seq_splits_strings_into_single_character_strings() {
        let got = seq(&[Value::string("ab")]).unwrap();
        assert!(got.lisp_eq(&Value::list(vec![Value::string("a"), Value::string("b")])));
        assert!(matches!(seq(&[Value::string("")]), Ok(Value::Nil)));
    }
}
