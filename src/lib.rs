pub mod ast_printer;
pub mod class;
pub mod environment;
pub mod error;
pub mod expr;
pub mod function;
pub mod interpreter;
pub mod parser;
pub mod resolver;
pub mod scanner;
pub mod stmt;
pub mod token;
pub mod value;

use error::Reporter;
use interpreter::Interpreter;
use parser::Parser;
use resolver::Resolver;
use scanner::Scanner;
use stmt::Stmt;
use token::Token;

/// Exit code when any scanner, parser, or resolver error was reported.
pub const EXIT_STATIC_ERROR: i32 = 65;

/// Exit code when a runtime error escaped to the top level.
pub const EXIT_RUNTIME_ERROR: i32 = 70;

/// Run a complete program through the whole pipeline.
pub fn interpret(source: &str) -> i32 {
    let mut interpreter = Interpreter::new();

    run(source, &mut interpreter, false)
}

/// Run one line against a persistent interpreter (the REPL).  A trailing
/// bare expression has its value echoed to stdout.
pub fn interpret_line(source: &str, interpreter: &mut Interpreter) -> i32 {
    run(source, interpreter, true)
}

/// Source → tokens → statements → resolved statements → side effects.
/// Each stage runs to completion to surface as many diagnostics as it
/// can, but any error reported by a stage skips the stages after it.
fn run(source: &str, interpreter: &mut Interpreter, print_expressions: bool) -> i32 {
    let mut reporter = Reporter::new();

    let mut tokens: Vec<Token> = Vec::new();
    for result in Scanner::new(source) {
        match result {
            Ok(token) => tokens.push(token),
            Err(error) => reporter.report(&error),
        }
    }
    if reporter.had_error {
        return EXIT_STATIC_ERROR;
    }

    let statements: Vec<Stmt> = Parser::new(tokens, &mut reporter).parse();
    if reporter.had_error {
        return EXIT_STATIC_ERROR;
    }

    Resolver::new(interpreter, &mut reporter).resolve(&statements);
    if reporter.had_error {
        return EXIT_STATIC_ERROR;
    }

    match interpreter.interpret(&statements) {
        Ok(value) => {
            if print_expressions {
                if let Some(value) = value {
                    println!("{value}");
                }
            }

            0
        }

        Err(error) => {
            reporter.report(&error);

            EXIT_RUNTIME_ERROR
        }
    }
}
