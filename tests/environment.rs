#[cfg(test)]
mod environment_tests {
    use std::cell::RefCell;
    use std::rc::Rc;

    use treelox as lox;

    use lox::environment::Environment;
    use lox::value::Value;

    fn shared(environment: Environment) -> Rc<RefCell<Environment>> {
        Rc::new(RefCell::new(environment))
    }

    #[test]
    fn define_then_get() {
        let mut environment = Environment::new();
        environment.define("answer", Value::Number(42.0));

        assert_eq!(environment.get("answer", 1).unwrap(), Value::Number(42.0));
    }

    #[test]
    fn get_walks_the_enclosing_chain() {
        let global = shared(Environment::new());
        global.borrow_mut().define("a", Value::Number(1.0));

        let local = Environment::with_enclosing(global);

        assert_eq!(local.get("a", 1).unwrap(), Value::Number(1.0));
    }

    #[test]
    fn inner_definition_shadows_without_clobbering() {
        let global = shared(Environment::new());
        global.borrow_mut().define("a", Value::Number(1.0));

        let mut local = Environment::with_enclosing(global.clone());
        local.define("a", Value::Number(2.0));

        assert_eq!(local.get("a", 1).unwrap(), Value::Number(2.0));
        assert_eq!(global.borrow().get("a", 1).unwrap(), Value::Number(1.0));
    }

    #[test]
    fn assign_writes_through_to_the_defining_scope() {
        let global = shared(Environment::new());
        global.borrow_mut().define("a", Value::Number(1.0));

        let mut local = Environment::with_enclosing(global.clone());
        local.assign("a", Value::Number(5.0), 1).unwrap();

        assert_eq!(global.borrow().get("a", 1).unwrap(), Value::Number(5.0));
    }

    #[test]
    fn assign_to_an_undefined_name_fails() {
        let mut environment = Environment::new();

        let error = environment
            .assign("missing", Value::Nil, 3)
            .expect_err("assignment should fail");

        let rendered = error.to_string();
        assert!(rendered.contains("Undefined variable 'missing'."), "{rendered}");
        assert!(rendered.contains("[line 3]"), "{rendered}");
    }

    #[test]
    fn get_of_an_undefined_name_fails() {
        let environment = Environment::new();

        let error = environment.get("missing", 7).expect_err("get should fail");

        assert!(error.to_string().contains("Undefined variable 'missing'."));
    }

    #[test]
    fn redefinition_in_the_same_scope_replaces() {
        let mut environment = Environment::new();
        environment.define("a", Value::Number(1.0));
        environment.define("a", Value::String("two".to_string()));

        assert_eq!(
            environment.get("a", 1).unwrap(),
            Value::String("two".to_string())
        );
    }

    #[test]
    fn get_at_hops_exactly_the_given_distance() {
        let global = shared(Environment::new());
        global.borrow_mut().define("name", Value::String("outer".to_string()));

        let middle = shared(Environment::with_enclosing(global));
        middle
            .borrow_mut()
            .define("name", Value::String("middle".to_string()));

        let leaf = shared(Environment::with_enclosing(middle));

        assert_eq!(
            Environment::get_at(&leaf, 1, "name", 1).unwrap(),
            Value::String("middle".to_string())
        );
        assert_eq!(
            Environment::get_at(&leaf, 2, "name", 1).unwrap(),
            Value::String("outer".to_string())
        );
    }

    #[test]
    fn assign_at_targets_a_single_scope() {
        let global = shared(Environment::new());
        global.borrow_mut().define("name", Value::String("outer".to_string()));

        let middle = shared(Environment::with_enclosing(global.clone()));
        middle
            .borrow_mut()
            .define("name", Value::String("middle".to_string()));

        let leaf = shared(Environment::with_enclosing(middle.clone()));

        Environment::assign_at(&leaf, 2, "name", Value::String("updated".to_string()), 1).unwrap();

        // Only the scope two hops up changed.
        assert_eq!(
            global.borrow().get("name", 1).unwrap(),
            Value::String("updated".to_string())
        );
        assert_eq!(
            middle.borrow().get("name", 1).unwrap(),
            Value::String("middle".to_string())
        );
    }
}
