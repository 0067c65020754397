mod common;

#[cfg(test)]
mod stdlib_tests {
    use roux::error::RouxError;
    use roux::runtime::Target;
    use roux::value::Value;

    use super::common::{output_of, Harness};

    fn runtime_error(source: &str) -> String {
        let mut harness = Harness::new();

        match harness.run(source) {
            Err(e @ RouxError::Runtime { .. }) => e.to_string(),
            other => panic!("expected a runtime error for {:?}, got {:?}", source, other),
        }
    }

    #[test]
    fn test_list_methods() {
        let output = output_of(
            "var xs = List();
             xs.add(1);
             xs.add(\"two\");
             print xs.count();
             print xs.at(1);
             print xs[0];
             xs.setAt(0, 5);
             print xs[0];
             print xs.removeAt(0);
             print xs.count();
             print xs[0];
             print xs;",
        );

        assert_eq!(
            output,
            vec!["2", "two", "1", "5", "5", "1", "two", "List instance"]
        );
    }

    #[test]
    fn test_lists_do_not_share_storage() {
        let output = output_of(
            "var a = List();
             var b = List();
             a.add(1);
             a.add(2);
             print a.count();
             print b.count();",
        );

        assert_eq!(output, vec!["2", "0"]);
    }

    #[test]
    fn test_list_index_errors() {
        let message = runtime_error("var xs = List(); xs.add(1); print xs.at(3);");
        assert!(message.starts_with("[line 1] Runtime error: Index 3 out of range"), "{}", message);

        let message = runtime_error("var xs = List(); xs.add(1); print xs[0.5];");
        assert!(message.contains("whole number"), "{}", message);

        let message = runtime_error("var xs = List(); xs.removeAt(0);");
        assert!(message.contains("out of range"), "{}", message);
    }

    #[test]
    fn test_list_iteration_in_script() {
        let output = output_of(
            "var xs = List();
             var i = 0;
             while (i < 5) { xs.add(i * i); i++; }
             var sum = 0;
             i = 0;
             while (i < xs.count()) { sum += xs[i]; i++; }
             print sum;",
        );

        assert_eq!(output, vec!["30"]);
    }

    #[test]
    fn test_map_methods() {
        let output = output_of(
            "var m = Map();
             m.add(\"a\", 1);
             m.add(2, \"two\");
             m.add(null, \"nothing\");
             m.add(true, \"yes\");
             print m.count();
             print m.at(\"a\");
             print m[2];
             print m[null];
             print m.at(true);
             print m.contains(\"a\");
             print m.contains(\"b\");
             m.setAt(\"a\", 10);
             m.setAt(\"b\", 20);
             print m[\"a\"] + m[\"b\"];
             print m.remove(\"a\");
             print m.remove(\"a\");
             print m.count();",
        );

        assert_eq!(
            output,
            vec![
                "4", "1", "two", "nothing", "yes", "true", "false", "30", "10", "null", "4"
            ]
        );
    }

    #[test]
    fn test_map_number_keys_compare_by_value() {
        let output = output_of(
            "var m = Map();
             m.add(1, \"one\");
             print m.at(1.0);
             print m.at(2 - 1);
             m.add(0, \"zero\");
             print m.contains(-0);",
        );

        assert_eq!(output, vec!["one", "one", "true"]);
    }

    #[test]
    fn test_map_errors() {
        let message = runtime_error("var m = Map(); m.add(\"k\", 1); m.add(\"k\", 2);");
        assert!(message.contains("already exists"), "{}", message);

        let message = runtime_error("var m = Map(); print m.at(\"missing\");");
        assert!(message.contains("not found"), "{}", message);

        let message = runtime_error("var m = Map(); m.add(List(), 1);");
        assert!(message.contains("Map keys must be"), "{}", message);
    }

    #[test]
    fn test_collections_from_host() {
        let mut harness = Harness::new();

        let list = harness
            .runtime
            .create_instance("List", &[])
            .unwrap_or_else(|e| panic!("{}", e));

        let add = list.get("add").unwrap_or(Value::Null);
        let count = list.get("count").unwrap_or(Value::Null);

        for n in 0..3 {
            assert!(harness
                .runtime
                .call_function(Target::Value(add.clone()), &[Value::from(n)])
                .is_ok());
        }

        assert_eq!(
            harness.runtime.call_function(Target::Value(count), &[]).ok(),
            Some(Value::Number(3.0))
        );

        harness.runtime.define_value("items", list);
        assert!(harness.run("print items[2];").is_ok());
        assert_eq!(harness.output(), vec!["2"]);
    }
}
