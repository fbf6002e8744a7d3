use std::cell::RefCell;
use std::io::Write;
use std::rc::Rc;

use loxwalk::prelude::*;
use loxwalk::{Lox, LoxError};
use pretty_assertions::assert_eq;

/// A `print` sink the test can read back.
#[derive(Clone, Default)]
struct Capture(Rc<RefCell<Vec<u8>>>);

impl Capture {
    fn text(&self) -> String {
        String::from_utf8(self.0.borrow().clone()).unwrap()
    }
}

impl Write for Capture {
    fn write(&mut self, buf: &[u8]) -> std::io::Result<usize> {
        self.0.borrow_mut().extend_from_slice(buf);
        Ok(buf.len())
    }

    fn flush(&mut self) -> std::io::Result<()> {
        Ok(())
    }
}

fn run_with(config: Config, source: &str) -> (Result<(), LoxError>, String) {
    let out = Capture::default();
    let mut lox = Lox::with_config(config).with_output(out.clone());
    let result = lox.run(source);
    (result, out.text())
}

fn run(source: &str) -> (Result<(), LoxError>, String) {
    run_with(Config::default(), source)
}

fn output_of(source: &str) -> String {
    let (result, out) = run(source);
    assert!(result.is_ok(), "{result:?}");
    out
}

fn runtime_error_of(source: &str) -> RuntimeError {
    match run(source).0 {
        Err(LoxError::Runtime(e)) => e,
        other => panic!("expected a runtime error, got {other:?}"),
    }
}

#[test]
fn inner_block_shadows_without_mutating_outer() {
    let source = r#"
        var x = 1;
        {
            var x = 2;
            print x;
        }
        print x;
    "#;
    assert_eq!(output_of(source), "2\n1\n");
}

#[test]
fn block_locals_are_gone_after_the_block() {
    let e = runtime_error_of("{\n var inner = 1;\n}\nprint inner;");
    assert_eq!(e.kind, ErrorKind::UndefinedVariable("inner".to_owned()));
    assert_eq!(e.line, Some(4));
}

#[test]
fn assignment_updates_the_nearest_enclosing_binding() {
    let source = r#"
        var a = "global";
        {
            a = "assigned";
        }
        print a;
    "#;
    assert_eq!(output_of(source), "assigned\n");
    assert_eq!(
        runtime_error_of("undeclared = 1;").kind,
        ErrorKind::UndefinedVariable("undeclared".to_owned())
    );
}

#[test]
fn counters_keep_their_own_captured_state() {
    let source = r#"
        fun makeCounter() {
            var count = 0;
            fun counter() {
                count = count + 1;
                return count;
            }
            return counter;
        }

        var a = makeCounter();
        var b = makeCounter();
        print a();
        print a();
        print a();
        print b();
    "#;
    assert_eq!(output_of(source), "1\n2\n3\n1\n");
}

#[test]
fn closures_sharing_a_capture_see_each_others_writes() {
    let source = r#"
        var get;
        var set;
        fun pair() {
            var shared = "before";
            get = fun () { return shared; };
            set = fun (v) { shared = v; };
        }
        pair();
        set("after");
        print get();
    "#;
    assert_eq!(output_of(source), "after\n");
}

#[test]
fn and_or_skip_the_right_operand() {
    let source = r#"
        var log = [];
        fun sideEffect() {
            log.append(1);
            return true;
        }
        print false and sideEffect();
        print true or sideEffect();
        print len(log);
        print nil or sideEffect();
        print len(log);
    "#;
    assert_eq!(output_of(source), "false\ntrue\n0\ntrue\n1\n");
}

#[test]
fn return_inside_a_loop_leaves_the_function() {
    let source = r#"
        fun find() {
            for (var i = 1; i <= 5; i = i + 1) {
                print i;
                if (i == 2) return i * 10;
            }
            print "unreachable";
        }
        print find();
    "#;
    assert_eq!(output_of(source), "1\n2\n20\n");
}

#[test]
fn break_inside_a_function_only_ends_the_loop() {
    let source = r#"
        fun f() {
            var n = 0;
            while (true) {
                n = n + 1;
                if (n == 3) break;
            }
            return "after " + n;
        }
        print f();
    "#;
    assert_eq!(output_of(source), "after 3\n");
}

#[test]
fn break_only_ends_the_innermost_loop() {
    let source = r#"
        for (var i = 0; i < 2; i = i + 1) {
            while (true) break;
            print i;
        }
    "#;
    assert_eq!(output_of(source), "0\n1\n");
}

#[test]
fn continue_still_runs_the_increment() {
    let source = r#"
        for (var i = 0; i < 5; i = i + 1) {
            if (i % 2 == 0) continue;
            print i;
        }
    "#;
    assert_eq!(output_of(source), "1\n3\n");
}

#[test]
fn arity_is_enforced() {
    let source = "fun add(a, b) { return a + b; }\nprint add(1, 2);\n";
    assert_eq!(output_of(source), "3\n");

    let e = runtime_error_of("fun add(a, b) { return a + b; }\nadd(1);");
    assert_eq!(e.kind, ErrorKind::ArityMismatch { expected: 2, got: 1 });
    assert_eq!(e.line, Some(2));
    assert_eq!(e.to_string(), "[line 2] Expected 2 arguments but got 1.");

    let e = runtime_error_of("fun add(a, b) { return a + b; }\nadd(1, 2, 3);");
    assert_eq!(e.kind, ErrorKind::ArityMismatch { expected: 2, got: 3 });
}

#[test]
fn class_arity_comes_from_init() {
    let e = runtime_error_of("class P { init(x, y) {} }\nP(1);");
    assert_eq!(e.kind, ErrorKind::ArityMismatch { expected: 2, got: 1 });
    let e = runtime_error_of("class Q {}\nQ(1);");
    assert_eq!(e.kind, ErrorKind::ArityMismatch { expected: 0, got: 1 });
}

#[test]
fn variadic_builtins_take_any_count() {
    let source = "print max(1, 5, 2);\nprint list();\nprint list(1, 'a');";
    assert_eq!(output_of(source), "5\n[]\n[1, 'a']\n");

    let many = (0..200).map(|n| n.to_string()).collect::<Vec<_>>().join(", ");
    assert_eq!(output_of(&format!("print len(list({many}));")), "200\n");
}

#[test]
fn numeric_promotion() {
    let source = r#"
        print 1 + 1;
        print type(1 + 1);
        print 1 + 1.0;
        print type(1 + 1.0);
        print 1.0 + 1.0;
    "#;
    assert_eq!(output_of(source), "2\nint\n2.0\nfloat\n2.0\n");
}

#[test]
fn float_addition_is_associative_within_tolerance() {
    let out = output_of("print (0.1 + 0.2) + 0.3;\nprint 0.1 + (0.2 + 0.3);");
    let values: Vec<f64> = out.lines().map(|l| l.parse().unwrap()).collect();
    assert!((values[0] - values[1]).abs() < 1e-12);
}

#[test]
fn division_by_zero() {
    let e = runtime_error_of("print 1;\nprint 5 / 0;");
    assert_eq!(e.kind, ErrorKind::DivisionByZero);
    assert_eq!(e.line, Some(2));

    assert_eq!(output_of("print 5.0 / 0.0;\nprint -5.0 / 0.0;"), "inf\n-inf\n");
    assert_eq!(output_of("print 0.0 / 0.0;"), "NaN\n");
}

#[test]
fn a_runtime_error_stops_the_script() {
    let (result, out) = run("print 1;\nprint nope;\nprint 2;");
    assert!(matches!(result, Err(LoxError::Runtime(RuntimeError { line: Some(2), .. }))));
    assert_eq!(out, "1\n");
}

#[test]
fn recursion_gets_a_frame_per_call() {
    let source = r#"
        fun fib(n) {
            if (n < 2) return n;
            return fib(n - 1) + fib(n - 2);
        }
        print fib(20);
    "#;
    assert_eq!(output_of(source), "6765\n");
}

#[test]
fn runaway_recursion_is_a_stack_overflow() {
    let config = Config::new().with_max_call_depth(50);
    let (result, _) = run_with(config, "fun f(n) { return f(n + 1); }\nf(0);");
    match result {
        Err(LoxError::Runtime(e)) => assert_eq!(e.kind, ErrorKind::StackOverflow(50)),
        other => panic!("unexpected {other:?}"),
    }

    // The limit is on nesting, not on the total number of calls.
    let config = Config::new().with_max_call_depth(50);
    let source = r#"
        fun g() { return 1; }
        var s = 0;
        for (var i = 0; i < 200; i = i + 1) s = s + g();
        print s;
    "#;
    let (result, out) = run_with(config, source);
    assert!(result.is_ok());
    assert_eq!(out, "200\n");
}

#[test]
fn deep_but_permitted_recursion_does_not_overflow_the_host() {
    let config = Config::new().with_max_call_depth(20_000);
    let source = r#"
        fun depth(n) {
            if (n == 0) return 0;
            return 1 + depth(n - 1);
        }
        print depth(10000);
    "#;
    let (result, out) = run_with(config, source);
    assert!(result.is_ok(), "{result:?}");
    assert_eq!(out, "10000\n");
}

#[test]
fn c_style_for_shares_its_loop_variable() {
    let source = r#"
        var fs = [];
        for (var i = 0; i < 3; i = i + 1) {
            fs.append(fun () { return i; });
        }
        for (var f in fs) print f();
    "#;
    assert_eq!(output_of(source), "3\n3\n3\n");
}

#[test]
fn for_in_binds_a_fresh_variable_each_iteration() {
    let source = r#"
        var gs = [];
        for (var x in [1, 2, 3]) gs.append(fun () { return x; });
        for (var g in gs) print g();
        for (var c in "hi") print c;
        for (var k in {"a": 1, "b": 2}) print k;
    "#;
    assert_eq!(output_of(source), "1\n2\n3\nh\ni\na\nb\n");
}

#[test]
fn classes_methods_and_super() {
    let source = r#"
        class Counter {
            init(start) {
                this.n = start;
            }
            inc() {
                this.n = this.n + 1;
                return this;
            }
        }

        var c = Counter(5);
        print c.inc().inc().n;
        print c;
        print Counter;
        print c.init(1) == c;
        print c.n;

        class Loud < Counter {
            inc() {
                print "inc";
                return super.inc();
            }
        }
        print Loud(0).inc().n;
    "#;
    assert_eq!(output_of(source), "7\nCounter instance\nCounter\ntrue\n1\ninc\n1\n");
}

#[test]
fn bound_methods_remember_their_receiver() {
    let source = r#"
        class Person {
            init(name) { this.name = name; }
            greet() { return "hi " + this.name; }
        }
        var greet = Person("ada").greet;
        print greet();
    "#;
    assert_eq!(output_of(source), "hi ada\n");
}

#[test]
fn undefined_property() {
    let e = runtime_error_of("class A {}\nprint A().missing;");
    assert_eq!(e.kind, ErrorKind::UndefinedProperty("missing".to_owned()));
    assert_eq!(e.line, Some(2));
}

#[test]
fn lists_are_shared_and_mutable() {
    let source = r#"
        var a = [1, 2];
        var b = a;
        b.append(3);
        a[0] = "x";
        print a;
        print b.length;
        print b.pop();
        print a.contains(2);
        print a == ["x", 2];
    "#;
    assert_eq!(output_of(source), "[\"x\", 2, 3]\n3\n3\ntrue\ntrue\n");
}

#[test]
fn list_map_and_filter_call_back_into_the_script() {
    let source = r#"
        var xs = range(1, 5);
        print xs.map(fun (x) { return x * x; });
        print xs.filter(fun (x) { return x % 2 == 0; });
    "#;
    assert_eq!(output_of(source), "[1, 4, 9, 16]\n[2, 4]\n");

    let e = runtime_error_of("print [1].map(fun (a, b) { return a; });");
    assert_eq!(e.kind, ErrorKind::ArityMismatch { expected: 2, got: 1 });
    assert_eq!(e.line, Some(1));
}

#[test]
fn dicts() {
    let source = r#"
        var d = {"a": 1, 'b': 2};
        d["c"] = 3;
        print d;
        print d["zzz"];
        print d.keys();
        print d.remove("a");
        print d.length;
        print d.contains("b");
    "#;
    assert_eq!(
        output_of(source),
        "{\"a\": 1, 'b': 2, \"c\": 3}\nnil\n[\"a\", 'b', \"c\"]\n1\n2\ntrue\n"
    );
}

#[test]
fn dict_keyed_by_itself() {
    let source = r#"
        var d = {};
        var e = {};
        d[e] = 1;
        d[d] = 2;
        print d[d];
        print d.length;
    "#;
    assert_eq!(output_of(source), "2\n2\n");
}

#[test]
fn self_containing_collections_print_and_compare() {
    let source = r#"
        var xs = [];
        xs.append(xs);
        print xs;
        var ys = [];
        ys.append(ys);
        print xs == ys;
        var m = {};
        m["self"] = m;
        print m;
        print m == {"self": m};
    "#;
    assert_eq!(output_of(source), "[[...]]\ntrue\n{\"self\": {...}}\ntrue\n");
}

#[test]
fn runaway_nesting_is_a_compile_error() {
    let source = format!("print {}1{};", "(".repeat(100_000), ")".repeat(100_000));
    let (result, out) = run(&source);
    assert!(matches!(result, Err(LoxError::Compile(1))), "{result:?}");
    assert_eq!(out, "");

    let source = format!("print {}1{};", "(".repeat(500), ")".repeat(500));
    assert_eq!(output_of(&source), "1\n");
}

#[test]
fn index_errors() {
    let e = runtime_error_of("var xs = [1, 2];\nxs[2] = 0;");
    assert_eq!(e.kind, ErrorKind::IndexOutOfBounds { index: 2, length: 2 });
    assert_eq!(e.line, Some(2));
    assert!(matches!(runtime_error_of("print 1[0];").kind, ErrorKind::TypeMismatch(_)));
}

#[test]
fn values_display() {
    let source = r#"
        fun add(a, b) { return a + b; }
        print add;
        print clock;
        print fun () {};
        print nil;
        print 3.0;
        print "plain";
        print ["quoted", 'single'];
    "#;
    assert_eq!(
        output_of(source),
        "<fn add>\n<native fn clock>\n<fn>\nnil\n3.0\nplain\n[\"quoted\", 'single']\n"
    );
}

#[test]
fn state_survives_between_runs() {
    let out = Capture::default();
    let mut lox = Lox::new().with_output(out.clone());
    lox.run("var a = 1;").unwrap();
    assert!(lox.run("print nope;").is_err());
    lox.run("a = a + 1; print a;").unwrap();
    assert_eq!(out.text(), "2\n");
}

#[test]
fn static_errors_prevent_execution() {
    let (result, out) = run("print 1;\nbreak;");
    assert!(matches!(result, Err(LoxError::Compile(1))));
    assert_eq!(out, "");

    let (result, _) = run("print ;\nvar = 2;");
    assert!(matches!(result, Err(LoxError::Compile(2))));
}

fn parse(source: &str) -> Vec<Stmt> {
    let tokens = Scanner::new(source).scan_tokens().unwrap();
    Parser::new(tokens).parse().unwrap()
}

#[test]
fn escaping_signals_are_reported_not_propagated() {
    // Skips the static checks on purpose.
    let mut interpreter = Interpreter::new().with_output(Capture::default());

    let err = interpreter.interpret(&parse("fun f() { break; }\nf();")).unwrap_err();
    assert_eq!(err.kind, ErrorKind::ControlFlowEscape("break"));
    assert_eq!(err.line, Some(2));

    let err = interpreter.interpret(&parse("continue;")).unwrap_err();
    assert_eq!(err.kind, ErrorKind::ControlFlowEscape("continue"));

    let err = interpreter.interpret(&parse("return 1;")).unwrap_err();
    assert_eq!(err.kind, ErrorKind::ControlFlowEscape("return"));

    // The interpreter is still usable afterwards.
    assert!(interpreter.interpret(&parse("var ok = f;")).is_ok());
}

#[test]
fn dump_ast_prints_before_running() {
    let out = Capture::default();
    let mut lox = Lox::new().with_output(out.clone()).with_ast_dump(true);
    lox.run("print 1 + 2;").unwrap();
    assert_eq!(out.text(), "(print (+ 1 2))\n3\n");
}
