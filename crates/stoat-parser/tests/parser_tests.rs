//! Parser integration tests

use stoat_ast::{
    BinaryOp, Expression, MemberProperty, ObjectPropertyKind, StatementKind, UnaryOp,
};
use stoat_parser::parse;

fn first_expression(source: &str) -> Expression {
    let program = parse(source).expect("parses");
    match &program.body[0].kind {
        StatementKind::Expression(e) => e.clone(),
        other => panic!("expected expression statement, got {other:?}"),
    }
}

#[test]
fn parses_var_declaration_with_initializers() {
    let program = parse("var a = 1, b;").expect("parses");
    let StatementKind::VarDeclaration(decls) = &program.body[0].kind else {
        panic!("expected var declaration");
    };
    assert_eq!(decls.len(), 2);
    assert_eq!(decls[0].name, "a");
    assert!(decls[0].init.is_some());
    assert!(decls[1].init.is_none());
}

#[test]
fn parses_use_strict_directive() {
    assert!(parse("'use strict'; var x = 1;").expect("parses").strict);
    assert!(!parse("var x = 1; 'use strict';").expect("parses").strict);
    // A non-directive statement ends the prologue.
    assert!(!parse("var x = 1;").expect("parses").strict);
}

#[test]
fn parses_function_body_strictness() {
    let program = parse("function f() { 'use strict'; return 1; }").expect("parses");
    let StatementKind::FunctionDeclaration(f) = &program.body[0].kind else {
        panic!("expected function declaration");
    };
    assert!(f.strict);
    assert_eq!(f.name.as_deref(), Some("f"));
}

#[test]
fn parses_precedence() {
    let expr = first_expression("1 + 2 * 3;");
    let Expression::Binary { op: BinaryOp::Add, right, .. } = expr else {
        panic!("expected addition at the top");
    };
    assert!(matches!(*right, Expression::Binary { op: BinaryOp::Mul, .. }));
}

#[test]
fn parses_member_and_call_chain() {
    let expr = first_expression("a.b(c)[d];");
    let Expression::Member { object, property } = expr else {
        panic!("expected member at the top");
    };
    assert!(matches!(property, MemberProperty::Computed(_)));
    assert!(matches!(*object, Expression::Call { .. }));
}

#[test]
fn parses_new_with_arguments() {
    let expr = first_expression("new C(1, 2);");
    let Expression::New { args, .. } = expr else {
        panic!("expected new expression");
    };
    assert_eq!(args.len(), 2);
}

#[test]
fn parses_instanceof_and_in() {
    assert!(matches!(
        first_expression("a instanceof b;"),
        Expression::Binary { op: BinaryOp::InstanceOf, .. }
    ));
    assert!(matches!(
        first_expression("'x' in o;"),
        Expression::Binary { op: BinaryOp::In, .. }
    ));
}

#[test]
fn parses_delete_member() {
    let expr = first_expression("delete o.x;");
    let Expression::Unary { op: UnaryOp::Delete, operand } = expr else {
        panic!("expected delete");
    };
    assert!(matches!(*operand, Expression::Member { .. }));
}

#[test]
fn parses_object_literal_accessors() {
    let expr = first_expression("({ a: 1, get b() { return 2; }, set b(v) {} });");
    let Expression::Object(props) = expr else {
        panic!("expected object literal");
    };
    assert_eq!(props.len(), 3);
    assert!(matches!(props[0].kind, ObjectPropertyKind::Init(_)));
    assert!(matches!(props[1].kind, ObjectPropertyKind::Get(_)));
    assert!(matches!(props[2].kind, ObjectPropertyKind::Set(_)));
}

#[test]
fn get_still_works_as_plain_property_name() {
    let expr = first_expression("({ get: 1 });");
    let Expression::Object(props) = expr else {
        panic!("expected object literal");
    };
    assert!(matches!(props[0].kind, ObjectPropertyKind::Init(_)));
}

#[test]
fn semicolon_insertion_at_line_breaks() {
    let program = parse("var a = 1\nvar b = 2").expect("parses");
    assert_eq!(program.body.len(), 2);
}

#[test]
fn return_with_line_break_returns_undefined() {
    let program = parse("function f() { return\n1; }").expect("parses");
    let StatementKind::FunctionDeclaration(f) = &program.body[0].kind else {
        panic!("expected function declaration");
    };
    assert!(matches!(f.body[0].kind, StatementKind::Return(None)));
}

#[test]
fn rejects_malformed_input() {
    assert!(parse("var = 1;").is_err());
    assert!(parse("if (").is_err());
    assert!(parse("try {}").is_err());
    assert!(parse("function f(,) {}").is_err());
}

#[test]
fn reports_error_position() {
    let err = parse("var\n  = 1;").unwrap_err();
    assert_eq!(err.line, 2);
}

#[test]
fn parses_try_catch_finally() {
    let program = parse("try { f(); } catch (e) { g(e); } finally { h(); }").expect("parses");
    let StatementKind::Try { param, handler, finalizer, .. } = &program.body[0].kind else {
        panic!("expected try statement");
    };
    assert_eq!(param.as_deref(), Some("e"));
    assert!(handler.is_some());
    assert!(finalizer.is_some());
}

#[test]
fn parses_for_loop_with_var_init() {
    let program = parse("for (var i = 0; i < 10; i++) { f(i); }").expect("parses");
    let StatementKind::For { init, test, update, .. } = &program.body[0].kind else {
        panic!("expected for statement");
    };
    assert!(init.is_some());
    assert!(test.is_some());
    assert!(update.is_some());
}

#[test]
fn keywords_allowed_as_member_names() {
    let expr = first_expression("o.delete;");
    let Expression::Member { property, .. } = expr else {
        panic!("expected member");
    };
    assert!(matches!(property, MemberProperty::Dot(ref s) if s == "delete"));
}
