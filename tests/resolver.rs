mod common;

#[cfg(test)]
mod resolver_tests {
    use std::rc::Rc;

    use roux::error::RouxError;
    use roux::interpreter::Interpreter;
    use roux::io::IoStream;
    use roux::parser::Parser;
    use roux::resolver::Resolver;
    use roux::scanner::scan;

    use super::common::Harness;

    /// Runs `source`, expecting a resolution failure, and returns every
    /// diagnostic the runtime reported.
    fn rejected(source: &str) -> Vec<String> {
        let mut harness = Harness::new();

        match harness.run(source) {
            Err(RouxError::Resolve { .. }) => harness.errors(),
            other => panic!("expected a resolve error for {:?}, got {:?}", source, other),
        }
    }

    fn assert_rejected(source: &str, diagnostic: &str) {
        let errors = rejected(source);
        assert!(
            errors.iter().any(|e| e == diagnostic),
            "missing {:?} in {:?}",
            diagnostic,
            errors
        );
    }

    #[test]
    fn test_read_in_own_initializer() {
        assert_rejected(
            "var x = 1;\n{\n  var x = x;\n}",
            "[line 3] Error at 'x': Can't read local variable in its own initializer.",
        );
    }

    #[test]
    fn test_postfix_update_in_own_initializer() {
        assert_rejected(
            "fun f() {\n  var x = 1;\n  {\n    var x = x++;\n  }\n}",
            "[line 4] Error at 'x': Can't read local variable in its own initializer.",
        );
        assert_rejected(
            "{ var y = y--; }",
            "[line 1] Error at 'y': Can't read local variable in its own initializer.",
        );

        let mut harness = Harness::new();
        assert!(harness.run("print 1; { var z = z++; }").is_err());
        assert!(harness.output().is_empty());
    }

    #[test]
    fn test_global_self_reference_is_not_a_resolve_error() {
        let mut harness = Harness::new();
        let outcome = harness.run("var g = g;");

        // Globals are late bound: this fails at run time instead.
        assert!(matches!(outcome, Err(RouxError::Runtime { .. })));
    }

    #[test]
    fn test_redeclaration_in_same_scope() {
        assert_rejected(
            "{ var a = 1; var a = 2; print a; }",
            "[line 1] Error at 'a': Variable with this name is already declared in this scope.",
        );
    }

    #[test]
    fn test_shadowing_in_nested_scope_is_allowed() {
        let output = super::common::output_of("{ var a = 1; { var a = 2; print a; } print a; }");
        assert_eq!(output, vec!["2", "1"]);
    }

    #[test]
    fn test_return_outside_function() {
        assert_rejected(
            "return 1;",
            "[line 1] Error at 'return': Can't return from top-level code.",
        );
    }

    #[test]
    fn test_value_return_in_constructor() {
        assert_rejected(
            "class A { construct() { return 1; } }",
            "[line 1] Error at 'return': Can't return a value from a constructor.",
        );

        let output = super::common::output_of(
            "class A { construct() { this.ok = true; return; } } print A().ok;",
        );
        assert_eq!(output, vec!["true"]);
    }

    #[test]
    fn test_this_outside_class() {
        assert_rejected(
            "print this;",
            "[line 1] Error at 'this': Can't use 'this' outside of a class.",
        );
        assert_rejected(
            "fun f() { return this; }",
            "[line 1] Error at 'this': Can't use 'this' outside of a class.",
        );
    }

    #[test]
    fn test_this_inside_static_method() {
        assert_rejected(
            "class A { static make() { return this; } }",
            "[line 1] Error at 'this': Can't use 'this' inside a static method.",
        );
    }

    #[test]
    fn test_class_cannot_inherit_from_itself() {
        assert_rejected(
            "class A : A {}",
            "[line 1] Error at 'A': A class can't inherit from itself.",
        );
    }

    #[test]
    fn test_unused_local_warning() {
        let mut harness = Harness::new();

        assert!(harness.run("{\n  var b = 1;\n  var a = 2;\n}").is_ok());
        assert_eq!(
            harness.errors(),
            vec![
                "[line 2] Warning at 'b': Local variable is never used.",
                "[line 3] Warning at 'a': Local variable is never used.",
            ]
        );
        assert!(!harness.runtime.had_error());
    }

    #[test]
    fn test_unused_parameter_warning() {
        let mut harness = Harness::new();

        assert!(harness.run("fun f(a) { return 1; } print f(0);").is_ok());
        assert_eq!(harness.output(), vec!["1"]);
        assert_eq!(
            harness.errors(),
            vec!["[line 1] Warning at 'a': Local variable is never used."]
        );
    }

    #[test]
    fn test_globals_are_never_reported_unused() {
        let mut harness = Harness::new();

        assert!(harness.run("var unused = 1;").is_ok());
        assert!(harness.errors().is_empty());
    }

    #[test]
    fn test_unreachable_code_warning() {
        let mut harness = Harness::new();

        assert!(harness.run("fun f() {\n  return 1;\n  print 2;\n}\nprint f();").is_ok());
        assert_eq!(harness.output(), vec!["1"]);
        assert_eq!(
            harness.errors(),
            vec!["[line 2] Warning at 'return': Unreachable code detected"]
        );
    }

    #[test]
    fn test_unreachable_lint_only_checks_top_level_of_body() {
        let mut harness = Harness::new();

        let source = "fun g() { if (true) { return 1; print 2; } return 0; } print g();";
        assert!(harness.run(source).is_ok());
        assert_eq!(harness.output(), vec!["1"]);
        assert!(harness.errors().is_empty());
    }

    #[test]
    fn test_closures_bind_lexically() {
        let output = super::common::output_of(
            "var a = \"global\";
             {
               fun show() { print a; }
               show();
               var a = \"block\";
               show();
               print a;
             }",
        );

        assert_eq!(output, vec!["global", "global", "block"]);
    }

    #[test]
    fn test_resolver_api_directly() {
        let (tokens, _) = scan("{ var x = 1; fun f() { return x; } print f(); }");
        let statements = Parser::new(tokens)
            .parse()
            .unwrap_or_else(|e| panic!("{:?}", e));

        let mut interpreter = Interpreter::new(Rc::new(IoStream::silent()));

        let warnings = {
            let mut resolver = Resolver::new(&mut interpreter);
            assert!(resolver.resolve(&statements).is_ok());
            resolver.warnings()
        };

        assert!(warnings.is_empty());
        assert!(interpreter.interpret(&statements).is_ok());
    }

    #[test]
    fn test_resolve_error_stops_before_evaluation() {
        let mut harness = Harness::new();

        let outcome = harness.run("print 1; return;");
        assert!(outcome.is_err());
        assert!(harness.output().is_empty());
        assert!(harness.runtime.had_error());
        assert!(!harness.runtime.had_runtime_error());
    }
}
