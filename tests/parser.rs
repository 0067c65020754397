#[cfg(test)]
mod parser_tests {
    use roux::ast::{Expr, Stmt};
    use roux::ast_printer::AstPrinter;
    use roux::error::RouxError;
    use roux::parser::Parser;
    use roux::scanner::scan;

    fn print_expr(source: &str) -> String {
        let (tokens, errors) = scan(source);
        assert!(errors.is_empty(), "lex errors: {:?}", errors);

        match Parser::new(tokens).parse_expression() {
            Ok(expr) => AstPrinter::print(&expr),
            Err(errors) => panic!("parse errors for {:?}: {:?}", source, errors),
        }
    }

    fn parse_program(source: &str) -> Result<Vec<Stmt>, Vec<RouxError>> {
        let (tokens, _) = scan(source);
        Parser::new(tokens).parse()
    }

    fn parse_errors(source: &str) -> Vec<String> {
        match parse_program(source) {
            Ok(_) => panic!("expected parse errors for {:?}", source),
            Err(errors) => errors.iter().map(|e| e.to_string()).collect(),
        }
    }

    #[test]
    fn test_precedence_ladder() {
        assert_eq!(print_expr("1 + 2 * 3"), "(+ 1.0 (* 2.0 3.0))");
        assert_eq!(print_expr("-123 * (45.67)"), "(* (- 123.0) (group 45.67))");
        assert_eq!(print_expr("false == 2 < 1"), "(== false (< 2.0 1.0))");
        assert_eq!(print_expr("1 | 2 ^ 3 & 4"), "(| 1.0 (^ 2.0 (& 3.0 4.0)))");
        assert_eq!(print_expr("a or b and c"), "(or a (and b c))");
        assert_eq!(print_expr("7 % 4 - 1"), "(- (% 7.0 4.0) 1.0)");
    }

    #[test]
    fn test_ternary_is_right_associative() {
        assert_eq!(print_expr("a ? b : c ? d : e"), "(?: a b (?: c d e))");
    }

    #[test]
    fn test_comma_binds_loosest() {
        assert_eq!(print_expr("a = 1, b"), "(, (= a 1.0) b)");
    }

    #[test]
    fn test_compound_assignment_desugars() {
        assert_eq!(print_expr("x += 2"), "(= x (+ x 2.0))");
        assert_eq!(print_expr("x %= 3"), "(= x (% x 3.0))");
        assert_eq!(print_expr("p.n *= 2"), "(*= (. p n) 2.0)");
        assert_eq!(print_expr("get().n -= 1"), "(-= (. (call get) n) 1.0)");
    }

    #[test]
    fn test_increments() {
        assert_eq!(print_expr("++x"), "(= x (+ x 1.0))");
        assert_eq!(print_expr("--x"), "(= x (- x 1.0))");
        assert_eq!(print_expr("++p.n"), "(+= (. p n) 1.0)");
        assert_eq!(print_expr("x++"), "(post++ x)");
        assert_eq!(print_expr("x--"), "(post-- x)");
    }

    #[test]
    fn test_call_property_and_subscript_chains() {
        assert_eq!(print_expr("a.b(1, 2)[0]"), "([] (call (. a b) 1.0 2.0) 0.0)");
        assert_eq!(print_expr("this.x = null"), "(= (. this x) null)");
    }

    #[test]
    fn test_lambda_expression() {
        assert_eq!(print_expr("fun (a, b) { return a; }"), "(fun (a b) <1 statements>)");
    }

    #[test]
    fn test_trailing_semicolon_allowed_in_expression_mode() {
        assert_eq!(print_expr("1 + 1;"), "(+ 1.0 1.0)");
    }

    #[test]
    fn test_declarations() {
        let statements = parse_program(
            "var a = 1;
             fun add(x, y) { return x + y; }
             class Point : Base {
                 construct(x) { this.x = x; }
                 len() { return 0; }
                 static origin() { return Point(0); }
             }
             fun (n) { print n; };",
        )
        .unwrap_or_else(|e| panic!("{:?}", e));

        assert_eq!(statements.len(), 4);
        assert!(matches!(statements[0], Stmt::Var { .. }));

        match &statements[1] {
            Stmt::Function(decl) => {
                assert_eq!(decl.name.lexeme, "add");
                assert_eq!(decl.params.len(), 2);
            }
            other => panic!("expected function, got {:?}", other),
        }

        match &statements[2] {
            Stmt::Class {
                name,
                base,
                methods,
                static_methods,
            } => {
                assert_eq!(name.lexeme, "Point");
                assert!(base.is_some());
                assert_eq!(methods.len(), 2);
                assert_eq!(static_methods.len(), 1);
                assert_eq!(static_methods[0].name.lexeme, "origin");
            }
            other => panic!("expected class, got {:?}", other),
        }

        assert!(matches!(statements[3], Stmt::Expression(Expr::Lambda(_))));
    }

    #[test]
    fn test_errors_are_collected_across_statements() {
        let errors = parse_errors("var = 1;\nprint 2;\nvar 3;\n");

        assert_eq!(
            errors,
            vec![
                "[line 1] Error at '=': Expected variable name",
                "[line 3] Error at '3': Expected variable name",
            ]
        );
    }

    #[test]
    fn test_missing_semicolon_at_end() {
        let errors = parse_errors("print 1");
        assert_eq!(errors, vec!["[line 1] Error at end: Expected ';' after value"]);
    }

    #[test]
    fn test_invalid_assignment_target() {
        let errors = parse_errors("1 = 2;");
        assert_eq!(errors, vec!["[line 1] Error at '=': Invalid assignment target"]);
    }

    #[test]
    fn test_break_outside_loop() {
        let errors = parse_errors("break;");
        assert_eq!(
            errors,
            vec!["[line 1] Error at 'break': Must be inside a loop to use 'break'"]
        );

        assert!(parse_program("while (true) { if (true) break; else continue; }").is_ok());
    }

    #[test]
    fn test_loop_depth_resets_inside_functions() {
        let errors = parse_errors("while (true) { fun f() { continue; } }");
        assert_eq!(errors.len(), 1);
        assert!(errors[0].contains("Must be inside a loop to use 'continue'"));
    }

    #[test]
    fn test_parameter_limit_is_reported() {
        let params: Vec<String> = (0..256).map(|i| format!("p{}", i)).collect();
        let source = format!("fun f({}) {{}}", params.join(", "));

        let errors = parse_errors(&source);
        assert_eq!(errors.len(), 1);
        assert!(errors[0].contains("Can't have more than 255 parameters"));
    }

    #[test]
    fn test_node_ids_start_at_base() {
        let (tokens, _) = scan("a = b;");
        let mut parser = Parser::with_node_base(tokens, 100);
        let statements = parser.parse().unwrap_or_else(|e| panic!("{:?}", e));

        match &statements[0] {
            Stmt::Expression(Expr::Assign { id, value, .. }) => {
                assert!(*id >= 100);
                match value.as_ref() {
                    Expr::Variable { id, .. } => assert!(*id >= 100),
                    other => panic!("expected variable, got {:?}", other),
                }
            }
            other => panic!("expected assignment, got {:?}", other),
        }

        assert!(parser.next_node_id() >= 102);
    }
}
