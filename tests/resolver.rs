#[cfg(test)]
mod resolver_tests {
    use treelox as lox;

    use lox::error::Reporter;
    use lox::interpreter::Interpreter;
    use lox::parser::Parser;
    use lox::resolver::Resolver;
    use lox::scanner::Scanner;

    fn resolve(source: &str) -> Reporter {
        let tokens: Vec<_> = Scanner::new(source)
            .map(|result| result.expect("test source should scan cleanly"))
            .collect();

        let mut reporter = Reporter::new();
        let statements = Parser::new(tokens, &mut reporter).parse();
        assert!(
            !reporter.had_error,
            "unexpected parse errors: {:?}",
            reporter.diagnostics()
        );

        let mut interpreter = Interpreter::new();
        Resolver::new(&mut interpreter, &mut reporter).resolve(&statements);

        reporter
    }

    fn diagnostics_contain(reporter: &Reporter, needle: &str) -> bool {
        reporter.diagnostics().iter().any(|d| d.contains(needle))
    }

    #[test]
    fn top_level_return_is_an_error() {
        let reporter = resolve("return 1;");

        assert!(reporter.had_error);
        assert!(diagnostics_contain(
            &reporter,
            "Can't return from top-level code."
        ));
    }

    #[test]
    fn return_inside_a_function_is_fine() {
        let reporter = resolve("fun f() { return 1; }");

        assert!(!reporter.had_error);
    }

    #[test]
    fn reading_a_local_in_its_own_initializer_is_an_error() {
        let reporter = resolve("{ var a = a; }");

        assert!(reporter.had_error);
        assert!(diagnostics_contain(
            &reporter,
            "Can't read local variable in its own initializer."
        ));
    }

    #[test]
    fn global_self_initialization_is_left_for_the_runtime() {
        // The global scope is not tracked statically.
        let reporter = resolve("var a = a;");

        assert!(!reporter.had_error);
    }

    #[test]
    fn redeclaring_a_local_is_an_error() {
        let reporter = resolve("{ var a = 1; var a = 2; }");

        assert!(reporter.had_error);
        assert!(diagnostics_contain(
            &reporter,
            "Already a variable with this name in this scope."
        ));
    }

    #[test]
    fn redeclaring_a_global_is_allowed() {
        let reporter = resolve("var a = 1; var a = 2;");

        assert!(!reporter.had_error);
    }

    #[test]
    fn this_outside_a_class_is_an_error() {
        let reporter = resolve("print this;");

        assert!(reporter.had_error);
        assert!(diagnostics_contain(
            &reporter,
            "Can't use 'this' outside of a class."
        ));
    }

    #[test]
    fn this_inside_a_method_is_fine() {
        let reporter = resolve("class C { m() { return this; } }");

        assert!(!reporter.had_error);
    }

    #[test]
    fn returning_a_value_from_an_initializer_is_an_error() {
        let reporter = resolve("class C { init() { return 1; } }");

        assert!(reporter.had_error);
        assert!(diagnostics_contain(
            &reporter,
            "Can't return a value from an initializer."
        ));
    }

    #[test]
    fn bare_return_in_an_initializer_is_fine() {
        let reporter = resolve("class C { init() { return; } }");

        assert!(!reporter.had_error);
    }

    #[test]
    fn class_inheriting_from_itself_is_an_error() {
        let reporter = resolve("class A < A {}");

        assert!(reporter.had_error);
        assert!(diagnostics_contain(
            &reporter,
            "A class can't inherit from itself."
        ));
    }

    #[test]
    fn super_outside_a_class_is_an_error() {
        let reporter = resolve("fun f() { super.m(); }");

        assert!(reporter.had_error);
        assert!(diagnostics_contain(
            &reporter,
            "Can't use 'super' outside of a class."
        ));
    }

    #[test]
    fn super_without_a_superclass_is_an_error() {
        let reporter = resolve("class A { m() { super.m(); } }");

        assert!(reporter.had_error);
        assert!(diagnostics_contain(
            &reporter,
            "Can't use 'super' in a class with no superclass."
        ));
    }

    #[test]
    fn super_inside_a_subclass_method_is_fine() {
        let reporter = resolve("class A { m() {} } class B < A { m() { super.m(); } }");

        assert!(!reporter.had_error);
    }

    #[test]
    fn resolver_keeps_going_after_an_error() {
        let reporter = resolve("return 1; print this;");

        assert!(reporter.had_error);
        assert!(diagnostics_contain(
            &reporter,
            "Can't return from top-level code."
        ));
        assert!(diagnostics_contain(
            &reporter,
            "Can't use 'this' outside of a class."
        ));
    }

    #[test]
    fn closures_and_shadowing_resolve_clean() {
        let reporter = resolve(
            "var a = \"global\";\n\
             {\n\
               fun show() { print a; }\n\
               var b = \"local\";\n\
               show();\n\
             }",
        );

        assert!(!reporter.had_error);
    }
}
