//! End-to-end evaluator tests: parse a program, run it, and assert the
//! resulting value (the value of the program's last statement) or the
//! surfaced error.

use rill_common::error::RuntimeErrorKind;
use rill_common::span::LineIndex;
use rill_eval::{Interpreter, Value};

fn eval(source: &str) -> Value {
    let program = rill_parser::parse(source).expect("program parses");
    Interpreter::new()
        .run(&program)
        .unwrap_or_else(|e| panic!("program failed: {}", e.message))
}

fn eval_err(source: &str) -> rill_common::error::RuntimeError {
    let program = rill_parser::parse(source).expect("program parses");
    Interpreter::new()
        .run(&program)
        .expect_err("program should fail")
}

fn assert_int(source: &str, expected: i64) {
    let value = eval(source);
    let Value::Int(actual) = value else {
        panic!("expected int result for {source:?}, got {value:?}");
    };
    assert_eq!(actual, expected, "source: {source}");
}

fn assert_text(source: &str, expected: &str) {
    assert_eq!(eval(source).to_text(), expected, "source: {source}");
}

fn assert_bool(source: &str, expected: bool) {
    let value = eval(source);
    let Value::Bool(actual) = value else {
        panic!("expected bool result for {source:?}, got {value:?}");
    };
    assert_eq!(actual, expected, "source: {source}");
}

// ── Arithmetic and operators ───────────────────────────────────────────

#[test]
fn arithmetic_precedence() {
    assert_int("2 + 3 * 4", 14);
    assert_int("(2 + 3) * 4", 20);
    assert_int("2 ** 3 ** 2", 512);
    // Unary sign binds tighter than the exponent.
    assert_int("-2 ** 2", 4);
    assert_int("10 % 3", 1);
}

#[test]
fn division_yields_floats_and_checks_zero() {
    let Value::Float(f) = eval("5 / 2") else {
        panic!("expected float");
    };
    assert_eq!(f, 2.5);

    let err = eval_err("1 / 0");
    assert_eq!(err.kind, RuntimeErrorKind::DivZero);
}

#[test]
fn comparison_chain_short_circuits() {
    assert_bool("1 < 2 < 3", true);
    assert_bool("1 < 2 < 2", false);
    assert_bool("3 > 2 >= 2", true);
    assert_bool("2 in ~ 1, 2, 3 !", true);
}

#[test]
fn logical_operators_return_operands() {
    assert_int("0 or 5", 5);
    assert_int("3 and 7", 7);
    assert_text("'' or 'fallback'", "fallback");
    assert_int("no and 9 or 4", 4);
}

#[test]
fn null_coalesce_and_ternary_like_check() {
    assert_int("none ?? 7", 7);
    assert_int("0 ?? 7", 0);
}

#[test]
fn text_concatenation_promotes_values() {
    assert_text("'n = ' + 3", "n = 3");
    assert_text("'ab' * 3", "ababab");
}

// ── Variables, scope, and immutability ─────────────────────────────────

#[test]
fn declarations_and_assignment() {
    assert_int("mut x = 1\nx = 5\nx", 5);
    assert_int("mut x = 1\nx += 2\nx *= 3\nx", 9);
}

#[test]
fn immutable_reassignment_is_rejected_with_position() {
    let source = "let x = 1\nx = 2";
    let err = eval_err(source);
    assert_eq!(err.kind, RuntimeErrorKind::Assign);
    let index = LineIndex::new(source);
    let (line, _) = index.line_col(err.span.expect("span").start);
    assert_eq!(line, 2);
}

#[test]
fn constant_reassignment_is_rejected() {
    let err = eval_err("const K = 1\nK = 2");
    assert_eq!(err.kind, RuntimeErrorKind::Assign);
}

#[test]
fn undefined_variable_is_a_name_error() {
    let err = eval_err("ghost + 1");
    assert_eq!(err.kind, RuntimeErrorKind::Name);
}

#[test]
fn inner_scopes_see_outer_bindings() {
    assert_int(
        "let base = 10\nconduit add(n) @ give base + n #\nadd(5)",
        15,
    );
}

#[test]
fn loop_scope_bindings_do_not_leak() {
    let err = eval_err("repeat item in ~ 1, 2 ! @ item #\nitem");
    assert_eq!(err.kind, RuntimeErrorKind::Name);
}

#[test]
fn type_hint_mismatch_is_a_type_error() {
    let err = eval_err("let x: num = 'hello'");
    assert_eq!(err.kind, RuntimeErrorKind::Type);
    assert_int("let x: num = 4\nx", 4);
}

#[test]
fn destructuring_declarations() {
    assert_int("let ~ a, b ! = ~ 1, 2 !\na + b", 3);
    assert_text(
        "let ~ first, ...rest ! = ~ 1, 2, 3 !\nstr(rest)",
        "[2, 3]",
    );
    assert_int("let @ x, y: why # = @ x: 4, y: 6 #\nx + why", 10);
    assert_text("let ~ a, b ! = ~ 1 !\nstr(b)", "none");
}

// ── Functions, closures, lambdas ───────────────────────────────────────

#[test]
fn explicit_and_auto_return() {
    assert_int("conduit f() @ give 3 #\nf()", 3);
    assert_int("conduit f() @ 1 + 2 #\nf()", 3);
    assert_text("conduit f() @ #\nstr(f())", "none");
}

#[test]
fn closure_captures_definition_scope() {
    assert_int(
        "conduit make() @ let x = 10\ngive () => x + 1 #\nlet f = make()\nf()",
        11,
    );
}

#[test]
fn closure_sees_later_mutation_of_captured_variable() {
    assert_int(
        "mut n = 1\nlet f = () => n\nn = 42\nf()",
        42,
    );
}

#[test]
fn parameters_defaults_and_rest() {
    assert_int("conduit f(a, b = 10) @ give a + b #\nf(1)", 11);
    assert_int("conduit f(a, b = 10) @ give a + b #\nf(1, 2)", 3);
    assert_text(
        "conduit f(first, ...rest) @ give str(rest) #\nf(1, 2, 3)",
        "[2, 3]",
    );
    // Missing parameters bind to none; extra arguments are discarded.
    assert_text("conduit f(a, b) @ give str(b) #\nf(1)", "none");
    assert_int("conduit f(a) @ give a #\nf(1, 2, 3)", 1);
}

#[test]
fn lambda_forms() {
    assert_int("let double = (x) => x * 2\ndouble(21)", 42);
    assert_int("let f = conduit(x) @ give x + 1 #\nf(1)", 2);
    assert_int("let g = () => @ let t = 4\nt * 2 #\ng()", 8);
}

#[test]
fn spread_arguments_flatten() {
    assert_int(
        "conduit add3(a, b, c) @ give a + b + c #\nlet xs = ~ 1, 2, 3 !\nadd3(...xs)",
        6,
    );
}

// ── Control flow ───────────────────────────────────────────────────────

#[test]
fn if_while_repeat() {
    assert_text("if 1 < 2 @ 'yes' # else @ 'no' #", "yes");
    assert_int("mut n = 0\nwhile n < 5 @ n += 1 #\nn", 5);
    assert_int("mut total = 0\nrepeat x in 1..4 @ total += x #\ntotal", 10);
    assert_int(
        "mut total = 0\nrepeat (i, x) in ~ 10, 20 ! @ total += i * x #\ntotal",
        20,
    );
}

#[test]
fn repeat_iterates_text_maps_and_empty_ranges() {
    assert_int("mut n = 0\nrepeat c in 'abc' @ n += 1 #\nn", 3);
    assert_text(
        "mut out = ''\nrepeat pair in @ a: 1, b: 2 # @ out += pair~0! #\nout",
        "ab",
    );
    // A range with start > end is empty.
    assert_int("mut n = 0\nrepeat x in 5..1 @ n += 1 #\nn", 0);
}

#[test]
fn break_and_continue() {
    assert_int(
        "mut total = 0\nrepeat x in 1..10 @ if x > 3 @ stop #\ntotal += x #\ntotal",
        6,
    );
    assert_int(
        "mut total = 0\nrepeat x in 1..5 @ if x % 2 == 0 @ next #\ntotal += x #\ntotal",
        9,
    );
}

#[test]
fn try_catch_finally() {
    assert_text(
        "mut out = ''\ntry @ fail 'boom' # catch e @ out = e # finally @ out += '!' #\nout",
        "boom!",
    );
    // No failure: catch skipped, finally still runs.
    assert_text(
        "mut out = 'ok'\ntry @ 1 # catch e @ out = 'caught' # finally @ out += '!' #\nout",
        "ok!",
    );
}

#[test]
fn catch_never_intercepts_control_signals() {
    // `give` inside try must return from the function, not hit catch.
    assert_int(
        "conduit f() @ try @ give 7 # catch e @ give 0 # #\nf()",
        7,
    );
    // `stop` inside try must break the loop.
    assert_int(
        "mut n = 0\nrepeat x in 1..5 @ try @ if x == 3 @ stop # # catch e @ n = 99 #\nn += 1 #\nn",
        2,
    );
}

#[test]
fn fail_surfaces_value_text() {
    let err = eval_err("fail `code $@40 + 4#`");
    assert_eq!(err.kind, RuntimeErrorKind::Runtime);
    assert_eq!(err.message, "code 44");
}

// ── Pattern matching ───────────────────────────────────────────────────

#[test]
fn check_with_guards() {
    let source = "\
let n = 7
check n @
    x when x < 5 => \"small\"
    x when x < 10 => \"mid\"
    _ => \"big\"
#";
    assert_text(source, "mid");
}

#[test]
fn check_patterns() {
    assert_text("check 5 @ 1..3 => 'low' ; 4..6 => 'high' ; _ => 'other' #", "high");
    assert_text("check 'hi' @ 'hi' => 'greeting' ; _ => 'other' #", "greeting");
    assert_int("check ~ 1, 2 ! @ ~ a, b ! => a + b ; _ => 0 #", 3);
    assert_int(
        "check @ kind: 'add', n: 4 # @ @ kind: 'add', n: x # => x ; _ => 0 #",
        4,
    );
    // No case matches: the result is none.
    assert_text("str(check 9 @ 1 => 'one' #)", "none");
}

#[test]
fn wildcard_matches_everything() {
    for subject in ["none", "yes", "0", "''", "~ ! ", "@ #"] {
        let source = format!("check {subject} @ _ => 'matched' #");
        assert_text(&source, "matched");
    }
}

#[test]
fn negative_literal_pattern_matches_by_equality() {
    assert_text("check -5 @ -5 => 'neg' ; _ => 'other' #", "neg");
}

#[test]
fn list_pattern_requires_matching_length() {
    assert_text(
        "check ~ 1, 2, 3 ! @ ~ a, b ! => 'two' ; _ => 'other' #",
        "other",
    );
}

// ── Collections ────────────────────────────────────────────────────────

#[test]
fn list_and_map_literals() {
    assert_text("str(~ 1, 'a', yes !)", "[1, 'a', yes]");
    assert_text("str(@ a: 1, b: 2 #)", "{a: 1, b: 2}");
    assert_text("let xs = ~ 2, 3 !\nstr(~ 1, ...xs, 4 !)", "[1, 2, 3, 4]");
    assert_text(
        "let base = @ a: 1 #\nstr(@ ...base, b: 2 #)",
        "{a: 1, b: 2}",
    );
    assert_int("let m = @ n: 41 #\nm.n + 1", 42);
}

#[test]
fn indexing_with_negatives_and_safety() {
    assert_int("~ 1, 2, 3 !~0!", 1);
    assert_int("~ 1, 2, 3 !~-1!", 3);
    assert_text("'hello'~1!", "e");

    let err = eval_err("~ 1, 2 !~5!");
    assert_eq!(err.kind, RuntimeErrorKind::Index);
    assert_text("str(~ 1, 2 !?~5!)", "none");

    let err = eval_err("let m = @ a: 1 #\nm~'b'!");
    assert_eq!(err.kind, RuntimeErrorKind::Key);
    assert_text("let m = @ a: 1 #\nstr(m?~'b'!)", "none");
}

#[test]
fn safe_member_access() {
    assert_text("let v = none\nstr(v?.anything)", "none");
    let err = eval_err("let v = none\nv.anything");
    assert_eq!(err.kind, RuntimeErrorKind::Type);
}

#[test]
fn index_assignment() {
    assert_text("let xs = ~ 1, 2 !\nxs~0! = 9\nstr(xs)", "[9, 2]");
    assert_text("let m = @ #\nm~'k'! = 1\nstr(m)", "{k: 1}");
    assert_text("let m = @ a: 1 #\nm.b = 2\nstr(m)", "{a: 1, b: 2}");
}

#[test]
fn host_method_surfaces() {
    assert_int("'héllo'.length", 5);
    assert_text("'abc'.upper()", "ABC");
    assert_text("' pad '.trim()", "pad");
    assert_text("'a,b'.split(',')~1!", "b");
    assert_bool("'hello'.startsWith('he')", true);
    assert_text("'7'.padStart(3, '0')", "007");

    assert_int("~ 1, 2 !.length", 2);
    assert_text("let xs = ~ 1 !\nxs.push(2)\nstr(xs)", "[1, 2]");
    assert_int("~ 3, 1, 2 !.sort()~0!", 1);
    assert_text("~ 1, 2 !.join('-')", "1-2");
    assert_text("str(~ ~ 1 !, 2 !.flat())", "[1, 2]");
}

#[test]
fn builtin_functions() {
    assert_int("len('abc')", 3);
    assert_int("len(~ 1, 2 !)", 2);
    assert_text("type(1)", "num");
    assert_text("type('x')", "text");
    assert_text("type(none)", "none");
    assert_text("str(range(3))", "[0, 1, 2]");
    assert_text("str(range(1, 4))", "[1, 2, 3]");
    assert_int("sum(~ 1, 2, 3 !)", 6);
    assert_int("min(3, 1, 2)", 1);
    assert_int("max(~ 3, 1, 2 !)", 3);
    assert_int("abs(-4)", 4);
    assert_int("floor(2.7)", 2);
    assert_int("ceil(2.1)", 3);
    assert_int("int('42')", 42);
    assert_bool("bool(~ !)", false);
    assert_int("reduce((acc, x) => acc + x, ~ 1, 2, 3 !, 10)", 16);
    assert_text("str(filter((x) => x % 2 == 0, ~ 1, 2, 3, 4 !))", "[2, 4]");
    assert_int("find(~ 3, 8, 5 !, (x) => x > 4)", 8);
    assert_bool("every(~ 2, 4 !, (x) => x % 2 == 0)", true);
    assert_bool("some(~ 1, 3 !, (x) => x % 2 == 0)", false);
}

// ── Pipelines ──────────────────────────────────────────────────────────

#[test]
fn pipeline_method_and_function_resolution() {
    let source = "\
conduit double(x) @ give x * 2 #
~ 1, 2, 3 ! -> map(double) -> sum";
    assert_int(source, 12);
}

#[test]
fn pipeline_prefers_methods_over_functions() {
    // `upper` exists both as a host method and a builtin; the method wins.
    assert_text("'abc' -> upper", "ABC");
    // `double` only exists in scope; the piped value lands last.
    assert_int("conduit double(x) @ give x * 2 #\n21 -> double", 42);
}

#[test]
fn pipeline_is_associative() {
    let chained = eval("conduit inc(x) @ give x + 1 #\nconduit double(x) @ give x * 2 #\n3 -> inc -> double");
    let grouped = eval("conduit inc(x) @ give x + 1 #\nconduit double(x) @ give x * 2 #\n(3 -> inc) -> double");
    assert!(rill_eval::value::values_equal(&chained, &grouped));
}

#[test]
fn pipeline_through_lambda_stage() {
    assert_int("5 -> (x) => x * 3", 15);
}

#[test]
fn pipeline_argument_order_appends_value_last() {
    assert_text(
        "conduit wrap(prefix, v) @ give prefix + v #\n'x' -> wrap('<')",
        "<x",
    );
}

#[test]
fn unknown_pipeline_stage_is_a_name_error() {
    let err = eval_err("1 -> nothing_here()");
    assert_eq!(err.kind, RuntimeErrorKind::Name);
}

// ── Classes ────────────────────────────────────────────────────────────

#[test]
fn class_with_inheritance_and_dispatch() {
    let source = "\
make A @
    conduit name() @ give \"A\" #
#
make B extend A @
    conduit greet() @ give me.name() + \"!\" #
#
B().greet()";
    assert_text(source, "A!");
}

#[test]
fn constructor_and_properties() {
    let source = "\
make Point @
    x = 0
    y = 0
    build(x, y) @
        me.x = x
        me.y = y
    #
    conduit total() @ give me.x + me.y #
#
Point(3, 4).total()";
    assert_int(source, 7);
}

#[test]
fn property_defaults_apply_without_constructor() {
    assert_int("make Counter @ n = 5 #\nCounter().n", 5);
}

#[test]
fn static_members() {
    let source = "\
make Config @
    static version = 3
    static conduit describe() @ give 'v' + Config::version #
#
Config::describe()";
    assert_text(source, "v3");
}

#[test]
fn method_overriding_uses_nearest_definition() {
    let source = "\
make A @ conduit who() @ give 'A' # #
make B extend A @ conduit who() @ give 'B' # #
B().who()";
    assert_text(source, "B");
}

#[test]
fn extending_a_non_class_fails() {
    let err = eval_err("let NotAClass = 1\nmake C extend NotAClass @ #");
    assert_eq!(err.kind, RuntimeErrorKind::Type);
}

#[test]
fn missing_member_is_a_name_error() {
    let err = eval_err("make A @ #\nA().nope");
    assert_eq!(err.kind, RuntimeErrorKind::Name);
}

// ── Templates and text forms ───────────────────────────────────────────

#[test]
fn template_strings_interpolate() {
    assert_text("let name = 'rill'\n`hi $@name#!`", "hi rill!");
    assert_text("`2 + 2 = $@2 + 2#`", "2 + 2 = 4");
    assert_text("let v = none\n`v = $@v#`", "v = none");
    // Nested block glyphs inside the interpolation.
    assert_text("`m: $@ @ a: 1 #.a #`", "m: 1");
}

#[test]
fn truthiness_table() {
    assert_bool("bool(none)", false);
    assert_bool("bool(0)", false);
    assert_bool("bool(0.0)", false);
    assert_bool("bool('')", false);
    assert_bool("bool(~ !)", false);
    assert_bool("bool(@ #)", false);
    assert_bool("bool('no')", true);
    assert_bool("bool(1)", true);
    assert_bool("bool((x) => x)", true);
}

#[test]
fn structural_equality_of_values() {
    assert_bool("~ 1, 2 ! == ~ 1, 2 !", true);
    assert_bool("@ a: 1 # == @ a: 1 #", true);
    assert_bool("@ a: 1 # == @ a: 2 #", false);
    assert_bool("none == none", true);
    assert_bool("1 == 1.0", true);
    assert_bool("'1' == 1", false);
}

// ── Generators, await, async pipeline ──────────────────────────────────

#[test]
fn generators_produce_yielded_stream() {
    let source = "\
conduit *firstThree() @
    yield 1
    yield 2
    yield 3
#
mut total = 0
repeat x in firstThree() @ total += x #
total";
    assert_int(source, 6);
}

#[test]
fn generator_next_and_exhaustion() {
    let source = "\
conduit *pair() @ yield 'a'\nyield 'b' #
let g = pair()
g.next() + g.next() + str(g.next())";
    assert_text(source, "abnone");
}

#[test]
fn generator_body_runs_lazily_per_request() {
    // Nothing runs at call time; each request resumes the body until the
    // next yield, so its side effects interleave with the caller's in
    // textual order.
    let source = "\
let log = ~ !
conduit *track() @
    push(log, 'a')
    yield 1
    push(log, 'b')
    yield 2
#
let g = track()
push(log, 'start')
g.next()
push(log, 'mid')
g.next()
str(log)";
    assert_text(source, "['start', 'a', 'mid', 'b']");
}

#[test]
fn infinite_generator_is_driven_on_demand() {
    let source = "\
conduit *naturals() @
    mut n = 0
    while yes @
        yield n
        n += 1
    #
#
let g = naturals()
g.next() + g.next() + g.next()";
    assert_int(source, 3);
}

#[test]
fn generator_failure_surfaces_at_the_request_that_hits_it() {
    let source = "\
conduit *risky() @
    yield 1
    fail 'late'
#
let g = risky()
let first = g.next()
mut caught = ''
try @ g.next() # catch e @ caught = e #
`$@first#/$@caught#`";
    assert_text(source, "1/late");
}

#[test]
fn await_passes_plain_values_through() {
    assert_int("wait 5", 5);
}

#[test]
fn tasks_drive_on_await() {
    let source = "\
grab async
let t = async.task(() => 21 * 2)
wait t";
    assert_int(source, 42);
}

#[test]
fn async_pipeline_awaits_stages() {
    let source = "\
grab async
conduit defer(x) @ give async.task(() => x + 1) #
1 ~> defer ~> defer";
    assert_int(source, 3);
}

// ── Modules ────────────────────────────────────────────────────────────

#[test]
fn import_namespace_item_and_wildcard() {
    let Value::Float(pi) = eval("grab math\nmath.pi") else {
        panic!("expected float");
    };
    assert!((pi - std::f64::consts::PI).abs() < 1e-12);

    assert_text("grab crypto.md5\nmd5('abc')", "900150983cd24fb0d6963f7d28e17f72");
    assert_bool("grab string.*\nisDigit('123')", true);
    assert_int("grab math as m\nint(m.clamp(99, 0, 10))", 10);
}

#[test]
fn unknown_module_and_item_fail_with_import_errors() {
    let err = eval_err("grab nosuchmodule");
    assert_eq!(err.kind, RuntimeErrorKind::Import);
    let err = eval_err("grab math.nosuchitem");
    assert_eq!(err.kind, RuntimeErrorKind::Import);
}

#[test]
fn json_module_round_trip() {
    let source = "\
grab json
let parsed = json.parse('{\"a\": [1, 2], \"b\": true}')
parsed.a~1! + int(parsed.b)";
    assert_int(source, 3);
}

#[test]
fn functional_module_composition() {
    let source = "\
grab functional
conduit inc(x) @ give x + 1 #
conduit double(x) @ give x * 2 #
let f = functional.compose(inc, double)
f(5)";
    assert_int(source, 11);
}

#[test]
fn collections_module_grouping() {
    let source = "\
grab collections
let groups = collections.groupBy((x) => x % 2, ~ 1, 2, 3, 4 !)
len(groups~1!)";
    assert_int(source, 2);
}

// ── User modules (file loader) ─────────────────────────────────────────

#[test]
fn user_modules_load_and_cache() {
    let dir = std::env::temp_dir().join(format!("rill-mod-test-{}", std::process::id()));
    std::fs::create_dir_all(&dir).unwrap();
    std::fs::write(
        dir.join("geometry.rill"),
        "share conduit area(w, h) @ give w * h #\nshare const SIDES = 4\n",
    )
    .unwrap();

    let program =
        rill_parser::parse("grab geometry\ngeometry.area(3, 5) + geometry.SIDES").unwrap();
    let mut interp = Interpreter::new();
    interp.set_module_base(dir.clone());
    let result = interp.run(&program).unwrap();
    let Value::Int(n) = result else {
        panic!("expected int");
    };
    assert_eq!(n, 19);

    std::fs::remove_dir_all(&dir).ok();
}

#[test]
fn cyclic_user_imports_fail() {
    let dir = std::env::temp_dir().join(format!("rill-cycle-test-{}", std::process::id()));
    std::fs::create_dir_all(&dir).unwrap();
    std::fs::write(dir.join("alpha.rill"), "grab beta\nshare const A = 1\n").unwrap();
    std::fs::write(dir.join("beta.rill"), "grab alpha\nshare const B = 2\n").unwrap();

    let program = rill_parser::parse("grab alpha").unwrap();
    let mut interp = Interpreter::new();
    interp.set_module_base(dir.clone());
    let err = interp.run(&program).unwrap_err();
    assert_eq!(err.kind, RuntimeErrorKind::Import);

    std::fs::remove_dir_all(&dir).ok();
}
