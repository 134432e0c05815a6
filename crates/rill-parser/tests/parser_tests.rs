//! Parser integration tests.
//!
//! Each test parses a source fragment and asserts the shape of the
//! resulting syntax tree: precedence, associativity, node structure, and
//! error positions.

use rill_common::span::LineIndex;
use rill_parser::ast::{
    AssignOp, BinOp, BindKind, CaseBody, ClassMember, CmpOp, DestructurePattern, ElseArm, Expr,
    ExprKind, LambdaBody, Lit, PatternKind, Stmt, StmtKind, TemplatePart, UnOp,
};
use rill_parser::{parse, SyntaxError};

fn program(source: &str) -> Vec<Stmt> {
    parse(source).expect("parses cleanly").body
}

fn first_expr(source: &str) -> Expr {
    let mut body = program(source);
    assert_eq!(body.len(), 1, "expected a single statement");
    match body.remove(0).kind {
        StmtKind::Expr(expr) => expr,
        other => panic!("expected expression statement, got {other:?}"),
    }
}

// ── Precedence and associativity ───────────────────────────────────────

#[test]
fn multiplication_binds_tighter_than_addition() {
    let expr = first_expr("2 + 3 * 4");
    let ExprKind::Binary { op: BinOp::Add, rhs, .. } = expr.kind else {
        panic!("expected top-level addition, got {:?}", expr.kind);
    };
    assert!(matches!(rhs.kind, ExprKind::Binary { op: BinOp::Mul, .. }));
}

#[test]
fn power_is_right_associative() {
    let expr = first_expr("2 ** 3 ** 2");
    let ExprKind::Binary { op: BinOp::Pow, lhs, rhs } = expr.kind else {
        panic!("expected power");
    };
    assert!(matches!(lhs.kind, ExprKind::Literal(Lit::Int(2))));
    assert!(matches!(rhs.kind, ExprKind::Binary { op: BinOp::Pow, .. }));
}

#[test]
fn unary_sign_binds_tighter_than_multiplication() {
    let expr = first_expr("-a * b");
    let ExprKind::Binary { op: BinOp::Mul, lhs, .. } = expr.kind else {
        panic!("expected multiplication");
    };
    assert!(matches!(lhs.kind, ExprKind::Unary { op: UnOp::Neg, .. }));
}

#[test]
fn assignment_is_right_associative() {
    let expr = first_expr("a = b = 1");
    let ExprKind::Assign { op: AssignOp::Assign, value, .. } = expr.kind else {
        panic!("expected assignment");
    };
    assert!(matches!(value.kind, ExprKind::Assign { .. }));
}

#[test]
fn compound_assignment_operators() {
    for (source, op) in [
        ("x += 1", AssignOp::Add),
        ("x -= 1", AssignOp::Sub),
        ("x *= 2", AssignOp::Mul),
        ("x /= 2", AssignOp::Div),
    ] {
        let expr = first_expr(source);
        let ExprKind::Assign { op: actual, .. } = expr.kind else {
            panic!("expected assignment for {source}");
        };
        assert_eq!(actual, op, "source: {source}");
    }
}

#[test]
fn single_comparison_is_binary() {
    let expr = first_expr("a < b");
    assert!(matches!(expr.kind, ExprKind::Binary { op: BinOp::Lt, .. }));
}

#[test]
fn chained_comparison_is_one_node() {
    let expr = first_expr("a < b < c");
    let ExprKind::Comparison { ops, operands } = expr.kind else {
        panic!("expected comparison chain, got {:?}", expr.kind);
    };
    assert_eq!(ops, vec![CmpOp::Lt, CmpOp::Lt]);
    assert_eq!(operands.len(), ops.len() + 1);
}

#[test]
fn in_is_a_comparison_operator() {
    let expr = first_expr("x in items");
    assert!(matches!(expr.kind, ExprKind::Binary { op: BinOp::In, .. }));
}

#[test]
fn logical_operators_nest_by_precedence() {
    // or binds looser than and: a or (b and c)
    let expr = first_expr("a or b and c");
    let ExprKind::Logical { op, rhs, .. } = expr.kind else {
        panic!("expected logical");
    };
    assert_eq!(op, rill_parser::ast::LogicOp::Or);
    assert!(matches!(rhs.kind, ExprKind::Logical { .. }));
}

#[test]
fn null_coalesce_parses() {
    let expr = first_expr("a ?? 0");
    assert!(matches!(expr.kind, ExprKind::NullCoalesce { .. }));
}

#[test]
fn range_operators() {
    for source in ["1..5", "1 to 5"] {
        let expr = first_expr(source);
        let ExprKind::Range { inclusive, .. } = expr.kind else {
            panic!("expected range for {source}");
        };
        assert!(inclusive, "source: {source}");
    }
}

// ── Pipelines ──────────────────────────────────────────────────────────

#[test]
fn pipeline_collects_ordered_stages() {
    let expr = first_expr("x -> f -> g(1)");
    let ExprKind::Pipeline { stages, is_async, .. } = expr.kind else {
        panic!("expected pipeline");
    };
    assert_eq!(stages.len(), 2);
    assert!(!is_async);
    assert!(matches!(stages[0].kind, ExprKind::Ident(_)));
    assert!(matches!(stages[1].kind, ExprKind::Call { .. }));
}

#[test]
fn async_pipeline_marks_chain() {
    let expr = first_expr("x ~> f -> g");
    let ExprKind::Pipeline { is_async, .. } = expr.kind else {
        panic!("expected pipeline");
    };
    assert!(is_async);
}

#[test]
fn pipeline_binds_looser_than_null_coalesce() {
    let expr = first_expr("x ?? y -> f");
    let ExprKind::Pipeline { seed, .. } = expr.kind else {
        panic!("expected pipeline at top level");
    };
    assert!(matches!(seed.kind, ExprKind::NullCoalesce { .. }));
}

// ── Postfix chain ──────────────────────────────────────────────────────

#[test]
fn postfix_chain_orders_left_to_right() {
    let expr = first_expr("a.b(1)~2!.c");
    // ((a.b)(1))[2].c
    let ExprKind::Member { object, property, safe } = expr.kind else {
        panic!("expected member at top");
    };
    assert_eq!(property, "c");
    assert!(!safe);
    let ExprKind::Index { object: inner, .. } = object.kind else {
        panic!("expected index below member");
    };
    assert!(matches!(inner.kind, ExprKind::Call { .. }));
}

#[test]
fn safe_member_and_safe_index() {
    let expr = first_expr("a?.b");
    assert!(matches!(expr.kind, ExprKind::Member { safe: true, .. }));

    let expr = first_expr("a?~0!");
    assert!(matches!(expr.kind, ExprKind::Index { safe: true, .. }));
}

#[test]
fn static_access() {
    let expr = first_expr("Config::version");
    let ExprKind::StaticMember { property, .. } = expr.kind else {
        panic!("expected static access");
    };
    assert_eq!(property, "version");
}

#[test]
fn call_with_spread_argument() {
    let expr = first_expr("f(1, ...rest)");
    let ExprKind::Call { args, .. } = expr.kind else {
        panic!("expected call");
    };
    assert_eq!(args.len(), 2);
    assert!(matches!(args[1].kind, ExprKind::Spread(_)));
}

// ── Literals ───────────────────────────────────────────────────────────

#[test]
fn number_bases() {
    assert!(matches!(
        first_expr("0xFF").kind,
        ExprKind::Literal(Lit::Int(255))
    ));
    assert!(matches!(
        first_expr("0b1010").kind,
        ExprKind::Literal(Lit::Int(10))
    ));
    assert!(matches!(
        first_expr("1_000").kind,
        ExprKind::Literal(Lit::Int(1000))
    ));
    let ExprKind::Literal(Lit::Float(f)) = first_expr("2.5e2").kind else {
        panic!("expected float");
    };
    assert!((f - 250.0).abs() < f64::EPSILON);
}

#[test]
fn keyword_literals() {
    assert!(matches!(
        first_expr("yes").kind,
        ExprKind::Literal(Lit::Bool(true))
    ));
    assert!(matches!(
        first_expr("no").kind,
        ExprKind::Literal(Lit::Bool(false))
    ));
    assert!(matches!(first_expr("none").kind, ExprKind::Literal(Lit::None)));
}

#[test]
fn list_literal_with_spread() {
    let expr = first_expr("~ 1, 2, ...xs !");
    let ExprKind::List(elements) = expr.kind else {
        panic!("expected list literal");
    };
    assert_eq!(elements.len(), 3);
    assert!(matches!(elements[2].kind, ExprKind::Spread(_)));
}

#[test]
fn map_literal_forms() {
    let expr = first_expr("@ a: 1, b, \"c d\": 2, ~ k !: 3, ...extra #");
    let ExprKind::MapLit(entries) = expr.kind else {
        panic!("expected map literal");
    };
    assert_eq!(entries.len(), 5);
    // Shorthand `b` expands to key "b" with an identifier value.
    assert!(matches!(entries[1].value.kind, ExprKind::Ident(ref n) if n == "b"));
    // The spread entry has no key.
    assert!(entries[4].key.is_none());
}

#[test]
fn template_string_parts() {
    let expr = first_expr("`sum: $@a + b# done`");
    let ExprKind::Template(parts) = expr.kind else {
        panic!("expected template");
    };
    assert_eq!(parts.len(), 3);
    assert!(matches!(&parts[0], TemplatePart::Text(t) if t == "sum: "));
    assert!(matches!(&parts[1], TemplatePart::Expr(e) if matches!(e.kind, ExprKind::Binary { .. })));
    assert!(matches!(&parts[2], TemplatePart::Text(t) if t == " done"));
}

// ── Lambdas ────────────────────────────────────────────────────────────

#[test]
fn parenthesised_lambda_params_detected() {
    let expr = first_expr("(x, y) => x + y");
    let ExprKind::Lambda(lambda) = expr.kind else {
        panic!("expected lambda");
    };
    assert_eq!(lambda.params.len(), 2);
    assert!(matches!(lambda.body, LambdaBody::Expr(_)));
}

#[test]
fn zero_param_lambda() {
    let expr = first_expr("() => 1");
    let ExprKind::Lambda(lambda) = expr.kind else {
        panic!("expected lambda");
    };
    assert!(lambda.params.is_empty());
}

#[test]
fn parenthesised_expression_is_not_a_lambda() {
    let expr = first_expr("(x)");
    assert!(matches!(expr.kind, ExprKind::Ident(_)));
}

#[test]
fn lambda_with_rest_and_default() {
    let expr = first_expr("(a = 1, ...rest) => a");
    let ExprKind::Lambda(lambda) = expr.kind else {
        panic!("expected lambda");
    };
    assert!(lambda.params[0].default.is_some());
    assert!(lambda.params[1].rest);
}

#[test]
fn anonymous_conduit_is_a_lambda() {
    let expr = first_expr("conduit(x) @ give x #");
    let ExprKind::Lambda(lambda) = expr.kind else {
        panic!("expected lambda");
    };
    assert!(matches!(lambda.body, LambdaBody::Block(_)));
}

// ── Statements ─────────────────────────────────────────────────────────

#[test]
fn variable_declarations() {
    let body = program("let a = 1\nmut b: num = 2\nconst C = 3");
    let StmtKind::VarDecl { kind, ref name, .. } = body[0].kind else {
        panic!("expected let");
    };
    assert_eq!(kind, BindKind::Let);
    assert_eq!(name, "a");

    let StmtKind::VarDecl { kind, ref type_hint, .. } = body[1].kind else {
        panic!("expected mut");
    };
    assert_eq!(kind, BindKind::Mut);
    assert_eq!(type_hint.as_deref(), Some("num"));

    assert!(matches!(
        body[2].kind,
        StmtKind::VarDecl { kind: BindKind::Const, .. }
    ));
}

#[test]
fn list_destructuring_declaration() {
    let body = program("let ~ a, b, ...rest ! = xs");
    let StmtKind::Destructure { pattern: DestructurePattern::List(ref bindings), .. } =
        body[0].kind
    else {
        panic!("expected list destructuring");
    };
    assert_eq!(bindings.len(), 3);
    assert!(bindings[2].rest);
}

#[test]
fn map_destructuring_declaration() {
    let body = program("let @ name, age: years # = person");
    let StmtKind::Destructure { pattern: DestructurePattern::Map(ref bindings), .. } =
        body[0].kind
    else {
        panic!("expected map destructuring");
    };
    assert_eq!(bindings[0].alias, "name");
    assert_eq!(bindings[1].key, "age");
    assert_eq!(bindings[1].alias, "years");
}

#[test]
fn function_declaration_with_defaults() {
    let body = program("conduit greet(name, punct = \"!\") @ give name + punct #");
    let StmtKind::FuncDecl(ref decl) = body[0].kind else {
        panic!("expected function declaration");
    };
    assert_eq!(decl.name, "greet");
    assert_eq!(decl.params.len(), 2);
    assert!(decl.params[1].default.is_some());
    assert!(!decl.is_async);
    assert!(!decl.is_generator);
}

#[test]
fn generator_and_async_declarations() {
    let body = program("conduit *counter() @ yield 1 #\nasync conduit fetch_all() @ give none #");
    let StmtKind::FuncDecl(ref gen) = body[0].kind else {
        panic!("expected generator");
    };
    assert!(gen.is_generator);
    let StmtKind::FuncDecl(ref async_fn) = body[1].kind else {
        panic!("expected async function");
    };
    assert!(async_fn.is_async);
}

#[test]
fn if_else_chain() {
    let body = program("if a @ 1 # else if b @ 2 # else @ 3 #");
    let StmtKind::If { ref else_branch, .. } = body[0].kind else {
        panic!("expected if");
    };
    let Some(ElseArm::If(ref chained)) = else_branch else {
        panic!("expected chained if");
    };
    let StmtKind::If { else_branch: ref last, .. } = chained.kind else {
        panic!("expected nested if");
    };
    assert!(matches!(last, Some(ElseArm::Block(_))));
}

#[test]
fn repeat_forms() {
    let body = program("repeat item in xs @ item #\nrepeat (i, item) in xs @ i #");
    let StmtKind::Repeat { ref binding, ref index_binding, .. } = body[0].kind else {
        panic!("expected repeat");
    };
    assert_eq!(binding, "item");
    assert!(index_binding.is_none());

    let StmtKind::Repeat { ref index_binding, .. } = body[1].kind else {
        panic!("expected repeat");
    };
    assert_eq!(index_binding.as_deref(), Some("i"));
}

#[test]
fn try_catch_finally() {
    let body = program("try @ risky() # catch e @ handle(e) # finally @ cleanup() #");
    let StmtKind::Try { ref catch, ref finally, .. } = body[0].kind else {
        panic!("expected try");
    };
    assert_eq!(catch.as_ref().unwrap().binding.as_deref(), Some("e"));
    assert!(finally.is_some());
}

#[test]
fn class_declaration_members() {
    let source = "\
make Point extend Base @
    x = 0
    static count = 0
    build(x) @ me.x = x #
    conduit norm() @ give me.x #
    static conduit origin() @ give Point(0) #
    get magnitude() @ give me.x #
#";
    let body = program(source);
    let StmtKind::ClassDecl(ref class) = body[0].kind else {
        panic!("expected class");
    };
    assert_eq!(class.name, "Point");
    assert_eq!(class.parent.as_deref(), Some("Base"));
    assert_eq!(class.members.len(), 6);
    assert!(matches!(class.members[2], ClassMember::Constructor(_)));
    let ClassMember::Method(ref stat) = class.members[4] else {
        panic!("expected static method");
    };
    assert!(stat.is_static);
    let ClassMember::Method(ref getter) = class.members[5] else {
        panic!("expected getter");
    };
    assert!(getter.accessor.is_some());
}

#[test]
fn import_forms() {
    let body = program("grab math\ngrab crypto.hash\ngrab string.*\ngrab http as web");
    let StmtKind::Import { ref module, ref items, wildcard, .. } = body[0].kind else {
        panic!("expected import");
    };
    assert_eq!(module, "math");
    assert!(items.is_empty());
    assert!(!wildcard);

    let StmtKind::Import { ref module, ref items, .. } = body[1].kind else {
        panic!("expected import");
    };
    assert_eq!(module, "crypto");
    assert_eq!(items, &["hash".to_string()]);

    let StmtKind::Import { wildcard, .. } = body[2].kind else {
        panic!("expected import");
    };
    assert!(wildcard);

    let StmtKind::Import { ref alias, .. } = body[3].kind else {
        panic!("expected import");
    };
    assert_eq!(alias.as_deref(), Some("web"));
}

#[test]
fn export_forms() {
    let body = program("share conduit f() @ give 1 #\nshare helper\nshare @ a, b #");
    assert!(matches!(body[0].kind, StmtKind::Export { decl: Some(_), .. }));
    let StmtKind::Export { ref names, .. } = body[1].kind else {
        panic!("expected export");
    };
    assert_eq!(names, &["helper".to_string()]);
    let StmtKind::Export { ref names, .. } = body[2].kind else {
        panic!("expected export");
    };
    assert_eq!(names.len(), 2);
}

// ── Check / patterns ───────────────────────────────────────────────────

#[test]
fn check_cases_with_guards() {
    let expr = first_expr("check n @ x when x < 5 => \"small\" ; 5..9 => \"mid\" ; _ => \"big\" #");
    let ExprKind::Check(check) = expr.kind else {
        panic!("expected check");
    };
    assert_eq!(check.cases.len(), 3);
    assert!(matches!(check.cases[0].pattern.kind, PatternKind::Binding(_)));
    assert!(check.cases[0].guard.is_some());
    assert!(matches!(check.cases[1].pattern.kind, PatternKind::Range { .. }));
    assert!(matches!(check.cases[2].pattern.kind, PatternKind::Wildcard));
}

#[test]
fn structural_patterns() {
    let expr = first_expr("check v @ ~ a, 2 ! => a ; @ kind: k # => k #");
    let ExprKind::Check(check) = expr.kind else {
        panic!("expected check");
    };
    let PatternKind::List(ref elements) = check.cases[0].pattern.kind else {
        panic!("expected list pattern");
    };
    assert!(matches!(elements[0].kind, PatternKind::Binding(_)));
    assert!(matches!(elements[1].kind, PatternKind::Literal(Lit::Int(2))));
    let PatternKind::Map(ref pairs) = check.cases[1].pattern.kind else {
        panic!("expected map pattern");
    };
    assert!(matches!(pairs[0].1.kind, PatternKind::Binding(_)));
}

#[test]
fn check_case_with_block_body() {
    let expr = first_expr("check n @ _ => @ let t = n * 2\nt # #");
    let ExprKind::Check(check) = expr.kind else {
        panic!("expected check");
    };
    assert!(matches!(check.cases[0].body, CaseBody::Block(_)));
}

// ── Errors ─────────────────────────────────────────────────────────────

#[test]
fn missing_block_close_is_an_error() {
    assert!(parse("if x @ 1").is_err());
}

#[test]
fn parse_error_carries_position() {
    let source = "let x = 1\nlet = 2";
    let err = parse(source).unwrap_err();
    let SyntaxError::Parse(parse_err) = err else {
        panic!("expected parse error");
    };
    let index = LineIndex::new(source);
    let (line, col) = index.line_col(parse_err.span.start);
    assert_eq!(line, 2);
    assert_eq!(col, 5);
}

#[test]
fn lex_error_is_surfaced() {
    assert!(matches!(parse("let ^ = 1"), Err(SyntaxError::Lex(_))));
}
