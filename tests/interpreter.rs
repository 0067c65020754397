mod common;

#[cfg(test)]
mod interpreter_tests {
    use roux::error::RouxError;
    use roux::value::Value;

    use super::common::{output_of, Harness};

    /// Runs `source`, expecting a runtime failure, and returns the reported
    /// diagnostics.
    fn runtime_errors(source: &str) -> Vec<String> {
        let mut harness = Harness::new();

        match harness.run(source) {
            Err(RouxError::Runtime { .. }) => harness.errors(),
            other => panic!("expected a runtime error for {:?}, got {:?}", source, other),
        }
    }

    #[test]
    fn test_operator_precedence() {
        let output = output_of(
            "print 2 + 3 * 4 == 14;
             print 20 - 3 * 4 == 8;
             print (2 * (6 - (2 + 2))) == 4;
             print false == 2 < 1;",
        );

        assert_eq!(output, vec!["true", "true", "true", "true"]);
    }

    #[test]
    fn test_truthiness_and_equality() {
        let output = output_of(
            "print null == null;
             print !true;
             print 1 == 1;
             print 1 != 2;
             print 1 == \"1\";
             print null == false;
             print 0 ? \"yes\" : \"no\";
             print \"\" ? \"yes\" : \"no\";
             print null ? \"yes\" : \"no\";",
        );

        assert_eq!(
            output,
            vec!["true", "false", "true", "true", "false", "false", "yes", "yes", "no"]
        );
    }

    #[test]
    fn test_whitespace_insensitivity() {
        let mut harness = Harness::new();

        for source in ["1 - 1", "1 -1", "1- 1", "1-1"] {
            let value = harness
                .runtime
                .evaluate(source)
                .unwrap_or_else(|e| panic!("{}: {}", source, e));
            assert_eq!(value, Value::Number(0.0), "{}", source);
        }
    }

    #[test]
    fn test_arithmetic_and_number_display() {
        let output = output_of(
            "print 3;
             print 2.5;
             print 10 / 4;
             print 7 % 3;
             print -7 % 3;
             print 1 / 0;
             print -(2 + 1);",
        );

        assert_eq!(output, vec!["3", "2.5", "2.5", "1", "-1", "inf", "-3"]);
    }

    #[test]
    fn test_bitwise_operators() {
        let output = output_of("print 6 & 3; print 6 | 3; print 6 ^ 3; print 5.9 & 7;");
        assert_eq!(output, vec!["2", "7", "5", "5"]);
    }

    #[test]
    fn test_plus_coercion() {
        let output = output_of(
            "print \"a\" + \"b\";
             print \"a\" + 1;
             print 1 + \"a\";
             print \"x\" + true;
             print 2.5 + \"!\";",
        );

        assert_eq!(output, vec!["ab", "a1", "1a", "xtrue", "2.5!"]);

        assert_eq!(
            runtime_errors("print \"x\" + null;"),
            vec!["[line 1] Runtime error: Operands must be two numbers or two strings."]
        );
        assert_eq!(
            runtime_errors("print true + 1;"),
            vec!["[line 1] Runtime error: Operands must be two numbers or two strings."]
        );
    }

    #[test]
    fn test_operand_type_errors() {
        assert_eq!(
            runtime_errors("print -\"a\";"),
            vec!["[line 1] Runtime error: Operand must be a number."]
        );
        assert_eq!(
            runtime_errors("print 1 < \"a\";"),
            vec!["[line 1] Runtime error: Operands must be numbers."]
        );
        assert_eq!(
            runtime_errors("var s = \"a\"; s++;"),
            vec!["[line 1] Runtime error: Operand must be a number."]
        );
    }

    #[test]
    fn test_comma_and_ternary() {
        let output = output_of(
            "var a = 0;
             print (a = 1, a + 1);
             print a > 0 ? \"pos\" : a < 0 ? \"neg\" : \"zero\";",
        );

        assert_eq!(output, vec!["2", "pos"]);
    }

    #[test]
    fn test_logical_short_circuit() {
        let output = output_of(
            "var hits = 0;
             fun hit() { hits++; return true; }
             print false and hit();
             print true or hit();
             print null or \"fallback\";
             print 1 and 2;
             print hits;",
        );

        assert_eq!(output, vec!["false", "true", "fallback", "2", "0"]);
    }

    #[test]
    fn test_compound_assignment_matches_plain_assignment() {
        let output = output_of(
            "var x = 5; x += 1;
             var y = 5; y = y + 1;
             print x == y;
             x -= 2; x *= 3; x /= 4; x %= 2;
             print x;",
        );

        assert_eq!(output, vec!["true", "1"]);
    }

    #[test]
    fn test_increment_semantics() {
        let output = output_of(
            "var x = 1;
             print x++;
             print x;
             print ++x;
             print x;
             print x--;
             print --x;",
        );

        assert_eq!(output, vec!["1", "2", "3", "3", "3", "1"]);
    }

    #[test]
    fn test_increment_on_locals_and_fields() {
        let output = output_of(
            "{ var i = 0; i++; ++i; print i; }
             class C { construct() { this.n = 1; } }
             var c = C();
             ++c.n;
             c.n += 10;
             print c.n;",
        );

        assert_eq!(output, vec!["2", "12"]);
    }

    #[test]
    fn test_field_update_evaluates_object_once() {
        let output = output_of(
            "class O {}
             var o = O();
             o.x = 1;
             var calls = 0;
             fun get() { calls = calls + 1; return o; }
             get().x += 1;
             print calls;
             print o.x;
             ++get().x;
             print calls;
             print o.x;
             print get().x *= 2;
             print calls;",
        );

        assert_eq!(output, vec!["1", "2", "2", "3", "6", "3"]);
    }

    #[test]
    fn test_field_update_needs_an_existing_field() {
        assert_eq!(
            runtime_errors("class A {} var a = A(); a.n += 1;"),
            vec!["[line 1] Runtime error: Undefined property 'n'."]
        );
        assert_eq!(
            runtime_errors("var s = \"t\"; s.n -= 1;"),
            vec!["[line 1] Runtime error: Only instances have fields."]
        );
    }

    #[test]
    fn test_while_with_break_and_continue() {
        let output = output_of(
            "var i = 0;
             var sum = 0;
             while (i < 10) {
               i++;
               if (i % 2 == 0) continue;
               if (i > 7) break;
               sum += i;
             }
             print sum;
             print i;",
        );

        assert_eq!(output, vec!["16", "9"]);
    }

    #[test]
    fn test_nested_loops_break_innermost_only() {
        let output = output_of(
            "var i = 0;
             var count = 0;
             while (i < 3) {
               i++;
               var j = 0;
               while (true) {
                 j++;
                 if (j == 2) break;
               }
               count += j;
             }
             print count;",
        );

        assert_eq!(output, vec!["6"]);
    }

    #[test]
    fn test_return_from_inside_loop() {
        let output = output_of(
            "fun first(n) {
               var i = 0;
               while (true) {
                 if (i == n) return i;
                 i++;
               }
             }
             print first(3);
             fun nothing() {}
             print nothing();",
        );

        assert_eq!(output, vec!["3", "null"]);
    }

    #[test]
    fn test_recursion() {
        let output = output_of(
            "fun fib(n) { if (n < 2) return n; return fib(n - 1) + fib(n - 2); }
             print fib(15);",
        );

        assert_eq!(output, vec!["610"]);
    }

    #[test]
    fn test_closure_counter_persists() {
        let output = output_of(
            "fun make() {
               var count = 0;
               fun inc() {
                 count = count + 1;
                 return count;
               }
               return inc;
             }
             var counter = make();
             print counter();
             print counter();
             var other = make();
             print other();",
        );

        assert_eq!(output, vec!["1", "2", "1"]);
    }

    #[test]
    fn test_lambdas() {
        let output = output_of(
            "var add = fun (a, b) { return a + b; };
             print add(2, 3);
             fun apply(f, x) { return f(x); }
             print apply(fun (n) { return n * n; }, 7);
             print add;",
        );

        assert_eq!(output, vec!["5", "49", "<lambda fn>"]);
    }

    #[test]
    fn test_callable_display() {
        let output = output_of(
            "fun named() {}
             class Thing { method() {} }
             print named;
             print clock;
             print Thing;
             print Thing();
             print Thing().method;",
        );

        assert_eq!(
            output,
            vec!["<fn named>", "<fn clock>", "Thing", "Thing instance", "<fn method>"]
        );
    }

    #[test]
    fn test_constructor_yields_instance() {
        let output = output_of(
            "class Point {
               construct(x, y) {
                 this.x = x;
                 this.y = y;
               }
             }
             var p = Point(3, 4);
             print p.x + p.y;
             print p;
             print p.construct(9, 9) == p;
             print p.x;",
        );

        assert_eq!(output, vec!["7", "Point instance", "true", "9"]);
    }

    #[test]
    fn test_methods_bind_this() {
        let output = output_of(
            "class Counter {
               construct() { this.n = 0; }
               inc() { this.n += 1; return this; }
             }
             var c = Counter();
             c.inc().inc();
             print c.n;
             var m = c.inc;
             m();
             print c.n;",
        );

        assert_eq!(output, vec!["2", "3"]);
    }

    #[test]
    fn test_fields_shadow_methods() {
        let output = output_of(
            "class A { name() { return \"method\"; } }
             var a = A();
             print a.name();
             a.name = fun () { return \"field\"; };
             print a.name();",
        );

        assert_eq!(output, vec!["method", "field"]);
    }

    #[test]
    fn test_static_methods() {
        let output = output_of(
            "class Math {
               static square(x) { return x * x; }
               static twice(x) { return Math.square(x) * 2; }
             }
             print Math.square(3);
             print Math.twice(2);
             print Math().square(4);",
        );

        assert_eq!(output, vec!["9", "8", "16"]);
    }

    #[test]
    fn test_class_declared_in_block() {
        let output = output_of(
            "{
               class Node {
                 construct(v) { this.v = v; }
                 copy() { return Node(this.v); }
               }
               print Node(5).copy().v;
             }",
        );

        assert_eq!(output, vec!["5"]);
    }

    #[test]
    fn test_base_must_be_a_class() {
        assert!(output_of("class A {} class B : A {} print B();").contains(&"B instance".to_owned()));

        assert_eq!(
            runtime_errors("var n = 1; class C : n {}"),
            vec!["[line 1] Runtime error: Base class must be a class."]
        );
    }

    #[test]
    fn test_arity_errors() {
        assert_eq!(
            runtime_errors("fun f() {} f(1);"),
            vec!["[line 1] Runtime error: Expected 0 arguments but got 1."]
        );
        assert_eq!(
            runtime_errors("class P { construct(a, b) { this.sum = a + b; } } P(1);"),
            vec!["[line 1] Runtime error: Expected 2 arguments but got 1."]
        );
        assert_eq!(
            runtime_errors("class E {} E(1);"),
            vec!["[line 1] Runtime error: Expected 0 arguments but got 1."]
        );
    }

    #[test]
    fn test_call_and_property_errors() {
        assert_eq!(
            runtime_errors("\"x\"();"),
            vec!["[line 1] Runtime error: Can only call functions and classes."]
        );
        assert_eq!(
            runtime_errors("class A {} print A().nope;"),
            vec!["[line 1] Runtime error: Undefined property 'nope'."]
        );
        assert_eq!(
            runtime_errors("var s = \"t\"; s.x = 1;"),
            vec!["[line 1] Runtime error: Only instances have fields."]
        );
        assert_eq!(
            runtime_errors("print 3.x;"),
            vec!["[line 1] Runtime error: Only instances have properties."]
        );
    }

    #[test]
    fn test_undefined_variables() {
        assert_eq!(
            runtime_errors("print y;"),
            vec!["[line 1] Runtime error: Undefined variable 'y'."]
        );
        assert_eq!(
            runtime_errors("y = 1;"),
            vec!["[line 1] Runtime error: Undefined variable 'y'."]
        );
    }

    #[test]
    fn test_runtime_error_reports_its_line_and_stops() {
        let mut harness = Harness::new();

        let outcome = harness.run("print 1;\n\nprint missing;\nprint 2;");

        assert!(matches!(outcome, Err(RouxError::Runtime { line: 3, .. })));
        assert_eq!(harness.output(), vec!["1"]);
        assert_eq!(
            harness.errors(),
            vec!["[line 3] Runtime error: Undefined variable 'missing'."]
        );
        assert!(harness.runtime.had_runtime_error());
    }

    #[test]
    fn test_text_subscript() {
        assert_eq!(output_of("print \"hey\"[1];"), vec!["e"]);

        assert_eq!(
            runtime_errors("print \"hey\"[3];"),
            vec!["[line 1] Runtime error: Index out of range."]
        );
        assert_eq!(
            runtime_errors("print \"hey\"[0.5];"),
            vec!["[line 1] Runtime error: Index must be a whole number."]
        );
        assert_eq!(
            runtime_errors("print 3[0];"),
            vec!["[line 1] Runtime error: Only text and instances can be indexed."]
        );
    }

    #[test]
    fn test_instance_subscript_uses_at() {
        let output = output_of(
            "class Squares { at(i) { return i * i; } }
             print Squares()[4];",
        );

        assert_eq!(output, vec!["16"]);
    }

    #[test]
    fn test_input_builtin() {
        let mut harness = Harness::with_input(vec!["alice"]);

        let outcome = harness.run("var name = input(); print \"hi \" + name; print input();");

        assert!(outcome.is_ok());
        assert_eq!(harness.output(), vec!["hi alice", "null"]);
    }

    #[test]
    fn test_clock_builtin() {
        assert_eq!(output_of("print clock() > 0;"), vec!["true"]);
    }
}
