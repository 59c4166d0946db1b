// ABOUTME: Pure AST-to-AST rewrite for quasiquote templates

use crate::value::Value;

/// True only for a list/vector of at least two elements headed by `head` —
/// the arity check matters here: a bare `(unquote)` or `(splice-unquote)`
/// parses fine but has no argument to pull out of `items[1]`.
fn is_form_headed(v: &Value, head: &str) -> bool {
    v.as_seq()
        .filter(|items| items.len() >= 2)
        .is_some_and(|items| matches!(&items[0], Value::Symbol(s) if &**s == head))
}

fn wrap1(name: &str, arg: Value) -> Value {
    Value::list(vec![Value::symbol(name), arg])
}

fn wrap2(name: &str, a: Value, b: Value) -> Value {
    Value::list(vec![Value::symbol(name), a, b])
}

/// Rewrites `ast` per the quasiquote template rules; the result is meant to
/// be evaluated normally, not returned as-is.
pub fn quasiquote(ast: &Value) -> Value {
    match ast {
        Value::List(items) => {
            if is_form_headed(ast, "unquote") {
                return items[1].clone();
            }
            let mut acc = Value::list(vec![]);
            for e in items.iter().rev() {
                if is_form_headed(e, "splice-unquote") {
                    let spliced = e.as_seq().unwrap()[1].clone();
                    acc = wrap2("concat", spliced, acc);
                } else {
                    acc = wrap2("cons", quasiquote(e), acc);
                }
            }
            acc
        }
        Value::Vector(items) => {
            let inner = Value::list(items.to_vec());
            wrap1("vec", quasiquote(&inner))
        }
        Value::Symbol(_) | Value::Map(_) => wrap1("quote", ast.clone()),
        other => other.clone(),
    }
}
