// ABOUTME: CLI entry point — REPL and file-execution modes

mod builtins;
mod config;
mod env;
mod error;
mod eval;
mod interpreter;
mod parser;
mod printer;
mod quasiquote;
mod value;

use clap::Parser;
use env::Environment;
use error::LispError;
use eval::eval;
use printer::pr_str;
use rustyline::error::ReadlineError;
use rustyline::DefaultEditor;
use std::path::PathBuf;
use std::process::ExitCode;
use std::rc::Rc;
use value::Value;

/// A small Lisp interpreter
#[derive(Parser, Debug)]
#[command(name = "corelisp")]
#[command(version = config::VERSION)]
struct CliArgs {
    /// Script file to execute (if absent, starts the REPL)
    #[arg(value_name = "FILE")]
    script: Option<PathBuf>,

    /// Arguments passed to the script as *ARGV*
    #[arg(trailing_var_arg = true)]
    args: Vec<String>,
}

fn main() -> ExitCode {
    let cli = CliArgs::parse();
    let env = match interpreter::new_root_env() {
        Ok(env) => env,
        Err(e) => {
            eprintln!("Error: {e}");
            return ExitCode::FAILURE;
        }
    };

    match cli.script {
        Some(path) => run_file(&env, &path, &cli.args),
        None => {
            run_repl(&env);
            ExitCode::SUCCESS
        }
    }
}

fn run_file(env: &Rc<Environment>, path: &PathBuf, args: &[String]) -> ExitCode {
    let argv = Value::list(args.iter().map(|s| Value::string(s.as_str())).collect());
    env.set("*ARGV*".into(), argv);

    let load_form = format!("(load-file {:?})", path.display().to_string());
    let result = parser::read_str(&load_form).and_then(|ast| eval(ast, env.clone()));
    match result {
        Ok(_) => ExitCode::SUCCESS,
        Err(e) => {
            eprintln!("Error: {e}");
            ExitCode::FAILURE
        }
    }
}

fn run_repl(env: &Rc<Environment>) {
    println!("{}", config::WELCOME_BANNER);
    let mut rl = match DefaultEditor::new() {
        Ok(rl) => rl,
        Err(e) => {
            eprintln!("Error: failed to start the line editor: {e}");
            return;
        }
    };

    loop {
        match rl.readline(config::REPL_PROMPT) {
            Ok(line) => {
                let _ = rl.add_history_entry(line.as_str());
                match parser::read_str(&line).and_then(|ast| eval(ast, env.clone())) {
                    Ok(value) => println!("{}", pr_str(&value, true)),
                    Err(LispError::NoInput) => {}
                    Err(e) => eprintln!("Error: {e}"),
                }
            }
            Err(ReadlineError::Interrupted) => continue,
            Err(ReadlineError::Eof) => break,
            Err(e) => {
                eprintln!("Error: {e}");
                break;
            }
        }
    }
}
