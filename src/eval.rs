// ABOUTME: Evaluator — TCO loop, special-form dispatch, macro expansion, try*/catch*

use crate::env::Environment;
use crate::error::LispError;
use crate::printer::pr_str;
use crate::quasiquote::quasiquote;
use crate::value::{Lambda, LMap, Value};
use std::cell::RefCell;
use std::rc::Rc;

/// Evaluates `ast` in `env`. Implemented as an explicit loop that rebinds
/// `(ast, env)` for every tail position — `let*`, the last form of `do`, the
/// taken branch of `if`, a user function's body, a `try*` catch handler, and
/// a macro's fully-expanded replacement — so none of those grow the host
/// call stack with the number of tail steps.
pub fn eval(mut ast: Value, mut env: Rc<Environment>) -> Result<Value, LispError> {
    loop {
        if env.try_get("DEBUG-EVAL").is_some_and(|v| v.is_truthy()) {
            println!("EVAL: {}", pr_str(&ast, true));
        }

        match &ast {
            Value::Symbol(name) => return env.get(name),
            Value::Vector(items) => {
                let evaled = items
                    .iter()
                    .map(|v| eval(v.clone(), env.clone()))
                    .collect::<Result<Vec<_>, _>>()?;
                return Ok(Value::vector(evaled));
            }
            Value::Map(m) => {
                let mut out = LMap::new();
                for (k, v) in m.iter() {
                    out.insert(k.clone(), eval(v.clone(), env.clone())?);
                }
                return Ok(Value::Map(Rc::new(out)));
            }
            Value::List(items) if items.is_empty() => return Ok(ast.clone()),
            Value::List(items) => {
                if let Value::Symbol(head) = &items[0] {
                    match head.as_ref() {
                        "def!" => return eval_def(items, &env),
                        "defmacro!" => return eval_defmacro(items, &env),
                        "let*" => {
                            let (next_ast, next_env) = eval_let_star(items, &env)?;
                            ast = next_ast;
                            env = next_env;
                            continue;
                        }
                        "do" => {
                            ast = eval_do(items, &env)?;
                            continue;
                        }
                        "if" => {
                            ast = eval_if(items, &env)?;
                            continue;
                        }
                        "fn*" => return eval_fn_star(items, &env),
                        "quote" => return eval_quote(items),
                        "quasiquote" => {
                            if items.len() != 2 {
                                return Err(LispError::syntax(
                                    0,
                                    "quasiquote requires exactly 1 argument",
                                ));
                            }
                            ast = quasiquote(&items[1]);
                            continue;
                        }
                        "swap!" => return eval_swap(items, &env),
                        "try*" => match eval_try_star(items, &env)? {
                            Step::Done(v) => return Ok(v),
                            Step::Continue(next_ast, next_env) => {
                                ast = next_ast;
                                env = next_env;
                                continue;
                            }
                        },
                        _ => {}
                    }
                }

                let head_val = eval(items[0].clone(), env.clone())?;
                if let Value::Function(l) = &head_val {
                    if l.is_macro {
                        ast = apply_macro(l, &items[1..])?;
                        continue;
                    }
                }

                let mut args = Vec::with_capacity(items.len() - 1);
                for a in &items[1..] {
                    args.push(eval(a.clone(), env.clone())?);
                }
                match head_val {
                    Value::Native(n) => return (n.func)(&args),
                    Value::Function(l) => {
                        let new_env = Environment::new_with_binds(l.env.clone(), &l.params, &args)?;
                        ast = (*l.body).clone();
                        env = new_env;
                        continue;
                    }
                    other => {
                        return Err(LispError::host(format!(
                            "first element of list is not a function, got {}",
                            other.type_name()
                        )))
                    }
                }
            }
            _ => return Ok(ast.clone()),
        }
    }
}

/// Calls `func` with already-evaluated `args`; used by `swap!` and by the
/// `apply`/`map` builtins, which need to re-enter the evaluator for a
/// `Function` head without themselves becoming special forms.
pub fn apply(func: Value, args: &[Value]) -> Result<Value, LispError> {
    match func {
        Value::Native(n) => (n.func)(args),
        Value::Function(l) => {
            let new_env = Environment::new_with_binds(l.env.clone(), &l.params, args)?;
            eval((*l.body).clone(), new_env)
        }
        other => Err(LispError::host(format!(
            "value of type {} is not callable",
            other.type_name()
        ))),
    }
}

fn apply_macro(l: &Rc<Lambda>, args: &[Value]) -> Result<Value, LispError> {
    let new_env = Environment::new_with_binds(l.env.clone(), &l.params, args)?;
    eval((*l.body).clone(), new_env)
}

fn eval_def(items: &[Value], env: &Rc<Environment>) -> Result<Value, LispError> {
    if items.len() != 3 {
        return Err(LispError::syntax(0, "def! requires exactly 2 arguments"));
    }
    let name = items[1]
        .as_symbol()
        .cloned()
        .ok_or_else(|| LispError::syntax(0, "def!: first argument must be a symbol"))?;
    let value = eval(items[2].clone(), env.clone())?;
    if let Value::Function(l) = &value {
        *l.name.borrow_mut() = Some(name.clone());
    }
    env.set(name, value.clone());
    Ok(value)
}

fn eval_defmacro(items: &[Value], env: &Rc<Environment>) -> Result<Value, LispError> {
    if items.len() != 3 {
        return Err(LispError::syntax(0, "defmacro! requires exactly 2 arguments"));
    }
    let name = items[1]
        .as_symbol()
        .cloned()
        .ok_or_else(|| LispError::syntax(0, "defmacro!: first argument must be a symbol"))?;
    let value = eval(items[2].clone(), env.clone())?;
    let Value::Function(l) = value else {
        return Err(LispError::host(
            "defmacro!: right-hand side must evaluate to a function",
        ));
    };
    let macro_lambda = l.with_macro_flag(true);
    *macro_lambda.name.borrow_mut() = Some(name.clone());
    let macro_val = Value::Function(Rc::new(macro_lambda));
    env.set(name, macro_val.clone());
    Ok(macro_val)
}

fn eval_let_star(
    items: &[Value],
    env: &Rc<Environment>,
) -> Result<(Value, Rc<Environment>), LispError> {
    if items.len() != 3 {
        return Err(LispError::syntax(0, "let* requires exactly 2 arguments"));
    }
    let bindings = items[1]
        .as_seq()
        .ok_or_else(|| LispError::syntax(0, "let*: bindings must be a sequence"))?;
    if bindings.len() % 2 != 0 {
        return Err(LispError::syntax(
            0,
            "let*: bindings must have an even number of forms",
        ));
    }
    let child = Environment::new(Some(env.clone()));
    for pair in bindings.chunks(2) {
        let name = pair[0]
            .as_symbol()
            .cloned()
            .ok_or_else(|| LispError::syntax(0, "let*: binding name must be a symbol"))?;
        let value = eval(pair[1].clone(), child.clone())?;
        child.set(name, value);
    }
    Ok((items[2].clone(), child))
}

fn eval_do(items: &[Value], env: &Rc<Environment>) -> Result<Value, LispError> {
    if items.len() == 1 {
        return Ok(Value::Nil);
    }
    for form in &items[1..items.len() - 1] {
        eval(form.clone(), env.clone())?;
    }
    Ok(items[items.len() - 1].clone())
}

fn eval_if(items: &[Value], env: &Rc<Environment>) -> Result<Value, LispError> {
    if items.len() < 3 || items.len() > 4 {
        return Err(LispError::syntax(0, "if requires 2 or 3 arguments"));
    }
    let cond = eval(items[1].clone(), env.clone())?;
    if cond.is_truthy() {
        Ok(items[2].clone())
    } else if items.len() == 4 {
        Ok(items[3].clone())
    } else {
        Ok(Value::Nil)
    }
}

fn eval_fn_star(items: &[Value], env: &Rc<Environment>) -> Result<Value, LispError> {
    if items.len() != 3 {
        return Err(LispError::syntax(0, "fn* requires exactly 2 arguments"));
    }
    let params = items[1]
        .as_seq()
        .ok_or_else(|| LispError::syntax(0, "fn*: params must be a sequence"))?
        .to_vec();
    Ok(Value::Function(Rc::new(Lambda {
        params: Rc::new(params),
        body: Rc::new(items[2].clone()),
        env: env.clone(),
        is_macro: false,
        name: RefCell::new(None),
        meta: RefCell::new(Value::Nil),
    })))
}

fn eval_quote(items: &[Value]) -> Result<Value, LispError> {
    if items.len() != 2 {
        return Err(LispError::syntax(0, "quote requires exactly 1 argument"));
    }
    Ok(items[1].clone())
}

fn eval_swap(items: &[Value], env: &Rc<Environment>) -> Result<Value, LispError> {
    if items.len() < 3 {
        return Err(LispError::syntax(0, "swap! requires at least 2 arguments"));
    }
    let atom_val = eval(items[1].clone(), env.clone())?;
    let Value::Atom(cell) = atom_val else {
        return Err(LispError::host("swap!: first argument must be an atom"));
    };
    let func_val = eval(items[2].clone(), env.clone())?;
    let mut args = vec![cell.borrow().clone()];
    for a in &items[3..] {
        args.push(eval(a.clone(), env.clone())?);
    }
    let result = apply(func_val, &args)?;
    *cell.borrow_mut() = result.clone();
    Ok(result)
}

enum Step {
    Done(Value),
    Continue(Value, Rc<Environment>),
}

fn eval_try_star(items: &[Value], env: &Rc<Environment>) -> Result<Step, LispError> {
    if items.len() < 2 || items.len() > 3 {
        return Err(LispError::syntax(0, "try* requires 1 or 2 arguments"));
    }
    match eval(items[1].clone(), env.clone()) {
        Ok(value) => Ok(Step::Done(value)),
        Err(err) => {
            if items.len() != 3 {
                return Err(err);
            }
            let catch = items[2]
                .as_seq()
                .ok_or_else(|| LispError::syntax(0, "try*: second argument must be a list"))?;
            let is_catch_star =
                matches!(catch.first(), Some(Value::Symbol(s)) if &**s == "catch*");
            if catch.len() != 3 || !is_catch_star {
                return Err(LispError::syntax(
                    0,
                    "try*: second argument must be (catch* SYM HANDLER)",
                ));
            }
            let sym = catch[1]
                .as_symbol()
                .cloned()
                .ok_or_else(|| LispError::syntax(0, "try*: catch symbol must be a symbol"))?;
            let child = Environment::new(Some(env.clone()));
            child.set(sym, err.into_caught_value());
            Ok(Step::Continue(catch[2].clone(), child))
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::parser::read_str;

    fn run(src: &str, env: &Rc<Environment>) -> Result<Value, LispError> {
        eval(read_str(src).unwrap(), env.clone())
    }

    fn root() -> Rc<Environment> {
        let env = Environment::new(None);
        crate::builtins::register_builtins(&env);
        env
    }

    #[test]
    fn self_evaluating_values() {
        let env = root();
        assert!(matches!(run("42", &env), Ok(Value::Number(42))));
        assert!(matches!(run("\"hi\"", &env), Ok(Value::String(_))));
        assert!(matches!(run(":k", &env), Ok(Value::Keyword(_))));
        assert!(matches!(run("true", &env), Ok(Value::Boolean(true))));
    }

    #[test]
    fn symbol_lookup_and_not_found() {
        let env = root();
        env.set("x".into(), Value::Number(7));
        assert!(matches!(run("x", &env), Ok(Value::Number(7))));
        assert!(matches!(run("undefined", &env), Err(LispError::SymbolNotFound(_))));
    }

    #[test]
    fn def_and_let_star() {
        let env = root();
        run("(def! x 10)", &env).unwrap();
        assert!(matches!(run("x", &env), Ok(Value::Number(10))));
        let result = run("(let* (a 1 b (+ a 1)) (+ a b))", &env).unwrap();
        assert!(matches!(result, Value::Number(3)));
    }

    #[test]
    fn do_and_if() {
        let env = root();
        assert!(matches!(run("(do 1 2 3)", &env), Ok(Value::Number(3))));
        assert!(matches!(run("(do)", &env), Ok(Value::Nil)));
        assert!(matches!(run("(if true 1 2)", &env), Ok(Value::Number(1))));
        assert!(matches!(run("(if false 1 2)", &env), Ok(Value::Number(2))));
        assert!(matches!(run("(if false 1)", &env), Ok(Value::Nil)));
        assert!(matches!(run("(if nil 1 2)", &env), Ok(Value::Number(2))));
    }

    #[test]
    fn closures_capture_their_environment() {
        let env = root();
        run("(def! mk (fn* (a) (fn* (b) (+ a b))))", &env).unwrap();
        let result = run("((mk 10) 5)", &env).unwrap();
        assert!(matches!(result, Value::Number(15)));
    }

    #[test]
    fn variadic_binds_in_function_application() {
        let env = root();
        run("(def! f (fn* (a & rest) (cons a rest)))", &env).unwrap();
        let result = run("(f 1 2 3)", &env).unwrap();
        assert!(result.lisp_eq(&Value::list(vec![Value::Number(1), Value::Number(2), Value::Number(3)])));
    }

    #[test]
    fn tail_recursion_does_not_overflow() {
        let env = root();
        run(
            "(def! f (fn* (n) (if (= n 0) :done (f (- n 1)))))",
            &env,
        )
        .unwrap();
        let result = run("(f 10000)", &env).unwrap();
        assert!(matches!(result, Value::Keyword(ref k) if &**k == "done"));
    }

    #[test]
    fn quasiquote_unquote_and_splice() {
        let env = root();
        let result = run("`(1 ~(+ 1 1) 3)", &env).unwrap();
        assert!(result.lisp_eq(&Value::list(vec![
            Value::Number(1),
            Value::Number(2),
            Value::Number(3)
        ])));

        run("(def! xs (list 2 3))", &env).unwrap();
        let result = run("`(1 ~@xs 4)", &env).unwrap();
        assert!(result.lisp_eq(&Value::list(vec![
            Value::Number(1),
            Value::Number(2),
            Value::Number(3),
            Value::Number(4)
        ])));
    }

    #[test]
    fn atom_swap() {
        let env = root();
        run("(def! a (atom 1))", &env).unwrap();
        let swapped = run("(swap! a (fn* (x) (+ x 10)))", &env).unwrap();
        assert!(matches!(swapped, Value::Number(11)));
        assert!(matches!(run("(deref a)", &env), Ok(Value::Number(11))));
    }

    #[test]
    fn try_catch_of_thrown_value() {
        let env = root();
        let result = run(
            r#"(try* (throw "bad") (catch* e (str "caught " e)))"#,
            &env,
        )
        .unwrap();
        assert!(matches!(result, Value::String(ref s) if &**s == "caught bad"));
    }

    #[test]
    fn try_catch_of_host_error_wraps_exception() {
        let env = root();
        let result = run("(try* (+ 1 \"x\") (catch* e (nil? e)))", &env).unwrap();
        assert!(matches!(result, Value::Boolean(false)));
    }

    #[test]
    fn defmacro_and_expansion() {
        let env = root();
        run(
            "(defmacro! unless (fn* (pred a b) `(if ~pred ~b ~a)))",
            &env,
        )
        .unwrap();
        assert!(matches!(run("(unless false 7 8)", &env), Ok(Value::Number(7))));
        assert!(matches!(run("(unless true 7 8)", &env), Ok(Value::Number(8))));
    }

    #[test]
    fn macro_rhs_must_be_function() {
        let env = root();
        assert!(run("(defmacro! bad 5)", &env).is_err());
    }

    #[test]
    fn calling_a_non_function_errors() {
        let env = root();
        assert!(run("(5 1 2)", &env).is_err());
    }

    #[test]
    fn vectors_and_maps_evaluate_elementwise() {
        let env = root();
        env.set("x".into(), Value::Number(5));
        let v = run("[1 x 3]", &env).unwrap();
        assert!(v.lisp_eq(&Value::vector(vec![
            Value::Number(1),
            Value::Number(5),
            Value::Number(3)
        ])));
    }
}
