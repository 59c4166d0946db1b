// ABOUTME: Nested, lexically-scoped symbol tables with an outer-chain lookup

use crate::error::LispError;
use crate::value::Value;
use std::cell::RefCell;
use std::collections::HashMap;
use std::rc::Rc;

#[derive(Debug)]
pub struct Environment {
    bindings: RefCell<HashMap<Rc<str>, Value>>,
    outer: Option<Rc<Environment>>,
}

impl Environment {
    pub fn new(outer: Option<Rc<Environment>>) -> Rc<Self> {
        Rc::new(Environment {
            bindings: RefCell::new(HashMap::new()),
            outer,
        })
    }

    /// Zips `binds` against `exprs` positionally, introducing `&rest`
    /// variadic capture when a bare `&` symbol appears in `binds`: the
    /// following symbol binds to a `List` of every remaining expr, and
    /// binding stops there. Any other length mismatch is a syntax error.
    pub fn new_with_binds(
        outer: Rc<Environment>,
        binds: &[Value],
        exprs: &[Value],
    ) -> Result<Rc<Self>, LispError> {
        let env = Environment::new(Some(outer));
        let mut i = 0;
        while i < binds.len() {
            let name = bind_symbol(&binds[i])?;
            if &*name == "&" {
                let rest_sym = binds.get(i + 1).ok_or_else(|| {
                    LispError::syntax(0, "'&' in binds list must be followed by one symbol")
                })?;
                let rest_name = bind_symbol(rest_sym)?;
                let rest_vals = exprs.get(i..).map(<[Value]>::to_vec).unwrap_or_default();
                env.set(rest_name, Value::list(rest_vals));
                return Ok(env);
            }
            let val = exprs
                .get(i)
                .cloned()
                .ok_or_else(|| LispError::syntax(0, "wrong number of arguments"))?;
            env.set(name, val);
            i += 1;
        }
        if i != exprs.len() {
            return Err(LispError::syntax(0, "wrong number of arguments"));
        }
        Ok(env)
    }

    /// Binds `name` to `value` in THIS scope only; never walks the chain and
    /// never removes a binding.
    pub fn set(&self, name: Rc<str>, value: Value) {
        self.bindings.borrow_mut().insert(name, value);
    }

    /// Resolves `name` by walking the chain innermost-first; the first
    /// match wins.
    pub fn get(&self, name: &str) -> Result<Value, LispError> {
        self.try_get(name)
            .ok_or_else(|| LispError::SymbolNotFound(name.to_string()))
    }

    pub fn try_get(&self, name: &str) -> Option<Value> {
        if let Some(value) = self.bindings.borrow().get(name) {
            return Some(value.clone());
        }
        self.outer.as_ref().and_then(|parent| parent.try_get(name))
    }
}

fn bind_symbol(v: &Value) -> Result<Rc<str>, LispError> {
    v.as_symbol()
        .cloned()
        .ok_or_else(|| LispError::syntax(0, "binds list must contain only symbols"))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn define_and_get() {
        let env = Environment::new(None);
        env.set("x".into(), Value::Number(42));
        assert!(matches!(env.get("x"), Ok(Value::Number(42))));
    }

    #[test]
    fn undefined_symbol_errors() {
        let env = Environment::new(None);
        assert!(matches!(env.get("undefined"), Err(LispError::SymbolNotFound(_))));
    }

    #[test]
    fn shadowing_prefers_inner_scope() {
        let parent = Environment::new(None);
        parent.set("x".into(), Value::Number(42));
        let child = Environment::new(Some(parent));
        child.set("x".into(), Value::Number(100));
        assert!(matches!(child.get("x"), Ok(Value::Number(100))));
    }

    #[test]
    fn lookup_walks_outer_chain() {
        let grandparent = Environment::new(None);
        grandparent.set("a".into(), Value::Number(1));
        let parent = Environment::new(Some(grandparent));
        parent.set("b".into(), Value::Number(2));
        let child = Environment::new(Some(parent));
        child.set("c".into(), Value::Number(3));

        assert!(matches!(child.get("a"), Ok(Value::Number(1))));
        assert!(matches!(child.get("b"), Ok(Value::Number(2))));
        assert!(matches!(child.get("c"), Ok(Value::Number(3))));
    }

    #[test]
    fn variadic_binds_capture_remaining_exprs() {
        let outer = Environment::new(None);
        let binds = vec![Value::symbol("a"), Value::symbol("&"), Value::symbol("rest")];
        let exprs = vec![Value::Number(1), Value::Number(2), Value::Number(3)];
        let env = Environment::new_with_binds(outer, &binds, &exprs).unwrap();
        assert!(matches!(env.get("a"), Ok(Value::Number(1))));
        match env.get("rest") {
            Ok(Value::List(items)) => {
                assert!(Value::List(items).lisp_eq(&Value::list(vec![Value::Number(2), Value::Number(3)])));
            }
            other => panic!("expected rest list, got {other:?}"),
        }
    }

    #[test]
    fn binds_exprs_mismatch_is_syntax_error() {
        let outer = Environment::new(None);
        let binds = vec![Value::symbol("a"), Value::symbol("b")];
        let exprs = vec![Value::Number(1)];
        assert!(matches!(
            Environment::new_with_binds(outer, &binds, &exprs),
            Err(LispError::Syntax { .. })
        ));
    }
}
