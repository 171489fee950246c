#[cfg(test)]
mod parser_tests {
    use treelox as lox;

    use lox::ast_printer::AstPrinter;
    use lox::error::Reporter;
    use lox::expr::Expr;
    use lox::parser::Parser;
    use lox::scanner::Scanner;
    use lox::stmt::Stmt;
    use lox::token::{Token, TokenType};

    fn scan(source: &str) -> Vec<Token> {
        Scanner::new(source)
            .map(|result| result.expect("test source should scan cleanly"))
            .collect()
    }

    fn parse(source: &str) -> (Vec<Stmt>, Reporter) {
        let mut reporter = Reporter::new();
        let statements = Parser::new(scan(source), &mut reporter).parse();

        (statements, reporter)
    }

    fn parse_expression(source: &str) -> Expr {
        let (mut statements, reporter) = parse(source);

        assert!(
            !reporter.had_error,
            "unexpected parse errors: {:?}",
            reporter.diagnostics()
        );
        assert_eq!(statements.len(), 1);

        match statements.remove(0) {
            Stmt::Expression(expr) => expr,
            other => panic!("expected an expression statement, got {:?}", other),
        }
    }

    fn printed(source: &str) -> String {
        AstPrinter::print(&parse_expression(source))
    }

    fn diagnostics_contain(reporter: &Reporter, needle: &str) -> bool {
        reporter.diagnostics().iter().any(|d| d.contains(needle))
    }

    #[test]
    fn factor_binds_tighter_than_term() {
        assert_eq!(printed("1 + 2 * 3;"), "(+ 1.0 (* 2.0 3.0))");
    }

    #[test]
    fn grouping_overrides_precedence() {
        assert_eq!(printed("(1 + 2) * 3;"), "(* (group (+ 1.0 2.0)) 3.0)");
    }

    #[test]
    fn comparison_binds_tighter_than_equality() {
        assert_eq!(printed("1 < 2 == true;"), "(== (< 1.0 2.0) true)");
    }

    #[test]
    fn unary_operators_nest() {
        assert_eq!(printed("!!false;"), "(! (! false))");
        assert_eq!(printed("--1;"), "(- (- 1.0))");
    }

    #[test]
    fn ternary_is_right_associative() {
        assert_eq!(
            printed("1 ? 2 : 3 ? 4 : 5;"),
            "(?: 1.0 2.0 (?: 3.0 4.0 5.0))"
        );
    }

    #[test]
    fn comma_is_left_associative() {
        assert_eq!(printed("1, 2, 3;"), "(, (, 1.0 2.0) 3.0)");
    }

    #[test]
    fn assignment_is_right_associative() {
        assert_eq!(printed("a = b = 1;"), "(= a (= b 1.0))");
    }

    #[test]
    fn and_binds_tighter_than_or() {
        assert_eq!(printed("a or b and c;"), "(or a (and b c))");
    }

    #[test]
    fn calls_and_property_access_chain() {
        assert_eq!(
            printed("obj.inner.method(1, 2);"),
            "(call (. (. obj inner) method) 1.0 2.0)"
        );
    }

    #[test]
    fn property_assignment_lowers_to_set() {
        assert_eq!(printed("this.x = 1;"), "(= (. this x) 1.0)");
    }

    #[test]
    fn super_requires_a_method_name() {
        assert_eq!(printed("super.method();"), "(call (super method))");

        let (_, reporter) = parse("super;");
        assert!(diagnostics_contain(
            &reporter,
            "Expect '.' after 'super'."
        ));
    }

    #[test]
    fn for_loop_desugars_to_while() {
        let (statements, reporter) = parse("for (var i = 0; i < 3; i = i + 1) print i;");

        assert!(!reporter.had_error);
        assert_eq!(statements.len(), 1);

        let Stmt::Block(outer) = &statements[0] else {
            panic!("expected the initializer block, got {:?}", statements[0]);
        };
        assert!(matches!(outer[0], Stmt::Var { .. }));

        let Stmt::While { body, .. } = &outer[1] else {
            panic!("expected the desugared while, got {:?}", outer[1]);
        };

        let Stmt::Block(inner) = body.as_ref() else {
            panic!("expected the body+increment block, got {:?}", body);
        };
        assert!(matches!(inner[0], Stmt::Print(_)));
        assert!(matches!(inner[1], Stmt::Expression(Expr::Assign { .. })));
    }

    #[test]
    fn for_loop_without_clauses_gets_a_true_condition() {
        let (statements, reporter) = parse("for (;;) break;");

        assert!(!reporter.had_error);
        assert_eq!(statements.len(), 1);

        let Stmt::While { condition, body } = &statements[0] else {
            panic!("expected a bare while, got {:?}", statements[0]);
        };
        assert!(matches!(
            condition,
            Expr::Literal(Token {
                token_type: TokenType::TRUE,
                ..
            })
        ));
        assert!(matches!(body.as_ref(), Stmt::Break(_)));
    }

    #[test]
    fn class_declaration_with_superclass() {
        let (statements, reporter) = parse("class A < B { method() {} }");

        assert!(!reporter.had_error);
        assert_eq!(statements.len(), 1);

        let Stmt::Class {
            name,
            superclass,
            methods,
        } = &statements[0]
        else {
            panic!("expected a class declaration, got {:?}", statements[0]);
        };
        assert_eq!(name.lexeme, "A");
        assert!(matches!(superclass, Some(Expr::Variable { .. })));
        assert_eq!(methods.len(), 1);
        assert_eq!(methods[0].name.lexeme, "method");
    }

    #[test]
    fn invalid_assignment_target_is_reported_not_fatal() {
        let (statements, reporter) = parse("1 = 2;");

        assert!(reporter.had_error);
        assert!(diagnostics_contain(&reporter, "Invalid assignment target."));
        // The statement itself survives.
        assert_eq!(statements.len(), 1);
    }

    #[test]
    fn argument_count_is_capped_at_255() {
        let args_255 = vec!["0"; 255].join(", ");
        let (_, reporter) = parse(&format!("f({});", args_255));
        assert!(!reporter.had_error);

        let args_256 = vec!["0"; 256].join(", ");
        let (_, reporter) = parse(&format!("f({});", args_256));
        assert!(reporter.had_error);
        assert!(diagnostics_contain(
            &reporter,
            "Can't have more than 255 arguments."
        ));
    }

    #[test]
    fn parameter_count_is_capped_at_255() {
        let params: Vec<String> = (0..256).map(|i| format!("p{}", i)).collect();
        let (_, reporter) = parse(&format!("fun f({}) {{}}", params.join(", ")));

        assert!(reporter.had_error);
        assert!(diagnostics_contain(
            &reporter,
            "Can't have more than 255 parameters."
        ));
    }

    #[test]
    fn parser_synchronizes_after_an_error() {
        let (statements, reporter) = parse("var ; print 1;");

        assert!(reporter.had_error);
        assert!(diagnostics_contain(&reporter, "Expect variable name."));
        // The bad declaration is dropped; the statement after the
        // synchronization point survives.
        assert_eq!(statements.len(), 1);
        assert!(matches!(statements[0], Stmt::Print(_)));
    }

    #[test]
    fn error_at_eof_is_located_at_end() {
        let (_, reporter) = parse("(1 + 2");

        assert!(reporter.had_error);
        assert!(diagnostics_contain(&reporter, "at end"));
        assert!(diagnostics_contain(
            &reporter,
            "Expect ')' after expression."
        ));
    }

    #[test]
    fn break_and_continue_parse_inside_loops() {
        let (statements, reporter) = parse("while (true) { break; continue; }");

        assert!(!reporter.had_error);

        let Stmt::While { body, .. } = &statements[0] else {
            panic!("expected a while, got {:?}", statements[0]);
        };
        let Stmt::Block(inner) = body.as_ref() else {
            panic!("expected a block body, got {:?}", body);
        };
        assert!(matches!(inner[0], Stmt::Break(_)));
        assert!(matches!(inner[1], Stmt::Continue(_)));
    }

    #[test]
    fn return_value_is_optional() {
        let (statements, reporter) = parse("fun f() { return; } fun g() { return 1; }");

        assert!(!reporter.had_error);
        assert_eq!(statements.len(), 2);
    }
}
