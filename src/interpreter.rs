// ABOUTME: Wires the core namespace and bootstrap prelude into a fresh root environment

use crate::builtins::{self, def};
use crate::env::Environment;
use crate::error::LispError;
use crate::eval::eval as eval_ast;
use crate::value::Value;
use std::rc::Rc;

const CORE_LISP: &str = include_str!("stdlib/core.lisp");

/// Builds a root environment with the core namespace and bootstrap prelude
/// loaded. `eval` is bound here, not in `builtins`, since it closes over the
/// very environment it is registered into.
pub fn new_root_env() -> Result<Rc<Environment>, LispError> {
    let env = Environment::new(None);
    builtins::register_builtins(&env);

    let eval_env = env.clone();
    def(&env, "eval", move |args: &[Value]| {
        eval_ast(args[0].clone(), eval_env.clone())
    });

    for form in crate::parser::read_all(CORE_LISP)? {
        eval_ast(form, env.clone())?;
    }

    Ok(env)
}
