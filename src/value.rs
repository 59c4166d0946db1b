// ABOUTME: Value types representing the runtime universe of the Lisp interpreter

use crate::env::Environment;
use crate::error::LispError;
use crate::printer::pr_str;
use indexmap::IndexMap;
use std::cell::RefCell;
use std::fmt;
use std::rc::Rc;

/// A key in a `HashMap` value. Strings and keywords are never equal to each
/// other even when their names match.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum MapKey {
    Str(Rc<str>),
    Kw(Rc<str>),
}

impl MapKey {
    pub fn name(&self) -> &str {
        match self {
            MapKey::Str(s) | MapKey::Kw(s) => s,
        }
    }

    pub fn from_value(v: &Value) -> Result<MapKey, LispError> {
        match v {
            Value::String(s) => Ok(MapKey::Str(s.clone())),
            Value::Keyword(k) => Ok(MapKey::Kw(k.clone())),
            other => Err(LispError::host(format!(
                "map keys must be strings or keywords, got {}",
                other.type_name()
            ))),
        }
    }

    pub fn to_value(&self) -> Value {
        match self {
            MapKey::Str(s) => Value::String(s.clone()),
            MapKey::Kw(k) => Value::Keyword(k.clone()),
        }
    }
}

pub type LMap = IndexMap<MapKey, Value>;

/// A user-defined function created by `fn*`.
///
/// `params` is the raw binds list (as read, `&` included) rather than a
/// pre-split `(params, variadic)` pair, so the `&`-splicing rule lives in
/// exactly one place: `Environment::new_with_binds`.
pub struct Lambda {
    pub params: Rc<Vec<Value>>,
    pub body: Rc<Value>,
    pub env: Rc<Environment>,
    pub is_macro: bool,
    pub name: RefCell<Option<Rc<str>>>,
    pub meta: RefCell<Value>,
}

impl Lambda {
    pub fn with_macro_flag(&self, is_macro: bool) -> Lambda {
        Lambda {
            params: self.params.clone(),
            body: self.body.clone(),
            env: self.env.clone(),
            is_macro,
            name: RefCell::new(self.name.borrow().clone()),
            meta: RefCell::new(self.meta.borrow().clone()),
        }
    }

    pub fn with_meta(&self, meta: Value) -> Lambda {
        Lambda {
            params: self.params.clone(),
            body: self.body.clone(),
            env: self.env.clone(),
            is_macro: self.is_macro,
            name: RefCell::new(self.name.borrow().clone()),
            meta: RefCell::new(meta),
        }
    }
}

impl fmt::Debug for Lambda {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Lambda")
            .field("params", &self.params)
            .field("is_macro", &self.is_macro)
            .field("name", &self.name.borrow())
            .finish()
    }
}

type NativeFn = dyn Fn(&[Value]) -> Result<Value, LispError>;

/// A host-provided builtin.
pub struct Native {
    pub name: Rc<str>,
    pub func: Box<NativeFn>,
    pub meta: RefCell<Value>,
}

impl fmt::Debug for Native {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Native").field("name", &self.name).finish()
    }
}

#[derive(Debug, Clone)]
pub enum Value {
    Nil,
    Boolean(bool),
    Number(i64),
    String(Rc<str>),
    Symbol(Rc<str>),
    Keyword(Rc<str>),
    List(Rc<Vec<Value>>),
    Vector(Rc<Vec<Value>>),
    Map(Rc<LMap>),
    Function(Rc<Lambda>),
    Native(Rc<Native>),
    Atom(Rc<RefCell<Value>>),
    /// Wraps a host-raised error as a language value; produced only by
    /// `try*` when the caught error did not originate from `throw`.
    Exception(Rc<str>),
}

impl Value {
    pub fn list(items: Vec<Value>) -> Value {
        Value::List(Rc::new(items))
    }

    pub fn vector(items: Vec<Value>) -> Value {
        Value::Vector(Rc::new(items))
    }

    pub fn symbol(name: impl Into<Rc<str>>) -> Value {
        Value::Symbol(name.into())
    }

    pub fn string(s: impl Into<Rc<str>>) -> Value {
        Value::String(s.into())
    }

    pub fn is_truthy(&self) -> bool {
        !matches!(self, Value::Nil | Value::Boolean(false))
    }

    /// Both `List` and `Vector` count as sequences for the purposes of
    /// quasiquote splicing, `seq`, `first`/`rest`/`nth`, and cross-type `=`.
    pub fn as_seq(&self) -> Option<&[Value]> {
        match self {
            Value::List(items) | Value::Vector(items) => Some(items),
            Value::Nil => Some(&[]),
            _ => None,
        }
    }

    pub fn as_symbol(&self) -> Option<&Rc<str>> {
        match self {
            Value::Symbol(s) => Some(s),
            _ => None,
        }
    }

    pub fn type_name(&self) -> &'static str {
        match self {
            Value::Nil => "nil",
            Value::Boolean(_) => "boolean",
            Value::Number(_) => "number",
            Value::String(_) => "string",
            Value::Symbol(_) => "symbol",
            Value::Keyword(_) => "keyword",
            Value::List(_) => "list",
            Value::Vector(_) => "vector",
            Value::Map(_) => "map",
            Value::Function(_) => "function",
            Value::Native(_) => "function",
            Value::Atom(_) => "atom",
            Value::Exception(_) => "exception",
        }
    }

    /// Value-structural equality: List and Vector are interchangeable,
    /// HashMaps compare by key set, Functions are never required equal.
    /// `Nil` is deliberately excluded from the sequence branch below — it
    /// equals only `Nil`, never `(list)`/`[]`, even though `as_seq` treats it
    /// as the empty sequence for `count`/`first`/`rest`/`cons`.
    pub fn lisp_eq(&self, other: &Value) -> bool {
        let both_seqs = matches!(self, Value::List(_) | Value::Vector(_))
            && matches!(other, Value::List(_) | Value::Vector(_));
        if both_seqs {
            let a = self.as_seq().expect("checked above");
            let b = other.as_seq().expect("checked above");
            return a.len() == b.len() && a.iter().zip(b).all(|(x, y)| x.lisp_eq(y));
        }
        match (self, other) {
            (Value::Nil, Value::Nil) => true,
            (Value::Boolean(a), Value::Boolean(b)) => a == b,
            (Value::Number(a), Value::Number(b)) => a == b,
            (Value::String(a), Value::String(b)) => a == b,
            (Value::Symbol(a), Value::Symbol(b)) => a == b,
            (Value::Keyword(a), Value::Keyword(b)) => a == b,
            (Value::Exception(a), Value::Exception(b)) => a == b,
            (Value::Map(a), Value::Map(b)) => {
                a.len() == b.len()
                    && a.iter()
                        .all(|(k, v)| b.get(k).is_some_and(|bv| v.lisp_eq(bv)))
            }
            (Value::Atom(a), Value::Atom(b)) => Rc::ptr_eq(a, b),
            (Value::Function(a), Value::Function(b)) => Rc::ptr_eq(a, b),
            (Value::Native(a), Value::Native(b)) => Rc::ptr_eq(a, b),
            _ => false,
        }
    }

    pub fn meta(&self) -> Value {
        match self {
            Value::Function(l) => l.meta.borrow().clone(),
            Value::Native(n) => n.meta.borrow().clone(),
            _ => Value::Nil,
        }
    }

    /// Returns a shallow clone of `self` carrying `meta`; valid only on
    /// Function/NativeFunction/List/Vector/HashMap.
    pub fn with_meta(&self, meta: Value) -> Result<Value, LispError> {
        match self {
            Value::Function(l) => Ok(Value::Function(Rc::new(l.with_meta(meta)))),
            Value::Native(n) => Ok(Value::Native(Rc::new(Native {
                name: n.name.clone(),
                func: clone_native_fn(n),
                meta: RefCell::new(meta),
            }))),
            Value::List(items) => Ok(Value::List(items.clone())),
            Value::Vector(items) => Ok(Value::Vector(items.clone())),
            Value::Map(m) => Ok(Value::Map(m.clone())),
            other => Err(LispError::host(format!(
                "with-meta: cannot attach metadata to a {}",
                other.type_name()
            ))),
        }
    }
}

/// `Native`'s boxed closure isn't `Clone`; `with-meta` only needs a new
/// metadata cell pointing at the *same* callable, so this re-boxes a thin
/// forwarding closure over a cloned `Rc<Native>` instead.
fn clone_native_fn(n: &Rc<Native>) -> Box<NativeFn> {
    let inner = n.clone();
    Box::new(move |args: &[Value]| (inner.func)(args))
}

impl fmt::Display for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", pr_str(self, false))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn list_and_vector_cross_equal() {
        let l = Value::list(vec![Value::Number(1), Value::Number(2)]);
        let v = Value::vector(vec![Value::Number(1), Value::Number(2)]);
        assert!(l.lisp_eq(&v));
    }

    #[test]
    fn nil_equals_only_nil() {
        assert!(Value::Nil.lisp_eq(&Value::Nil));
        assert!(!Value::Nil.lisp_eq(&Value::Boolean(false)));
    }

    #[test]
    fn maps_compare_order_independent() {
        let mut a = LMap::new();
        a.insert(MapKey::Kw("a".into()), Value::Number(1));
        a.insert(MapKey::Kw("b".into()), Value::Number(2));
        let mut b = LMap::new();
        b.insert(MapKey::Kw("b".into()), Value::Number(2));
        b.insert(MapKey::Kw("a".into()), Value::Number(1));
        assert!(Value::Map(Rc::new(a)).lisp_eq(&Value::Map(Rc::new(b))));
    }

    #[test]
    fn string_and_keyword_keys_never_equal() {
        assert_ne!(MapKey::Str("a".into()), MapKey::Kw("a".into()));
    }

    #[test]
    fn functions_are_reference_equal_only() {
        let env = Environment::new(None);
        let body = Rc::new(Value::Nil);
        let l1 = Rc::new(Lambda {
            params: Rc::new(vec![]),
            body: body.clone(),
            env: env.clone(),
            is_macro: false,
            name: RefCell::new(None),
            meta: RefCell::new(Value::Nil),
        });
        let l2 = Rc::new(Lambda {
            params: Rc::new(vec![]),
            body,
            env,
            is_macro: false,
            name: RefCell::new(None),
            meta: RefCell::new(Value::Nil),
        });
        assert!(!Value::Function(l1.clone()).lisp_eq(&Value::Function(l2)));
        assert!(Value::Function(l1.clone()).lisp_eq(&Value::Function(l1)));
    }
}
