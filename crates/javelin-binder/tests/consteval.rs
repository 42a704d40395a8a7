//! Constant folding over whole compilations.

mod common;

use common::*;

use javelin_binder::{Const, ConstValue};
use javelin_core::{DiagnosticKind, PrimitiveKind, Span};
use javelin_tree as tree;
use javelin_tree::{BinOp, Expr, Lit, UnOp};
use pretty_assertions::assert_eq;

fn lit(value: Lit) -> Expr {
    Expr::Literal {
        value,
        span: Span::point(0),
    }
}

fn unary(op: UnOp, operand: Expr) -> Expr {
    Expr::Unary {
        op,
        operand: Box::new(operand),
        span: Span::point(0),
    }
}

fn cast(ty: tree::TyRef, expr: Expr) -> Expr {
    Expr::Cast {
        ty,
        expr: Box::new(expr),
        span: Span::point(0),
    }
}

fn conditional(cond: Expr, then: Expr, orelse: Expr) -> Expr {
    Expr::Conditional {
        cond: Box::new(cond),
        then: Box::new(then),
        orelse: Box::new(orelse),
        span: Span::point(0),
    }
}

fn holder(fields: Vec<tree::FieldDecl>) -> Vec<tree::CompUnit> {
    let mut decl = tree::TyDecl::new(tree::TyKind::Class, "Consts");
    decl.members = fields.into_iter().map(tree::MemberDecl::Field).collect();
    vec![unit("test/Consts.java", Some("test"), vec![decl])]
}

fn int_value(output: &javelin_binder::BoundOutput, name: &str) -> i32 {
    match field_value(output, "test/Consts", name) {
        Some(Const::Value(ConstValue::Int(value))) => value,
        other => panic!("{name}: expected int constant, got {other:?}"),
    }
}

#[test]
fn arithmetic_folds_with_precedence_encoded_in_the_tree() {
    let units = holder(vec![
        constant_field(
            int_ty(),
            "A",
            binary(
                BinOp::Add,
                Expr::int(1),
                binary(BinOp::Mul, Expr::int(2), Expr::int(3)),
            ),
        ),
        constant_field(
            int_ty(),
            "B",
            binary(BinOp::Shl, reference(&["A"]), Expr::int(2)),
        ),
        constant_field(
            int_ty(),
            "C",
            conditional(
                binary(BinOp::Lt, Expr::int(1), Expr::int(2)),
                Expr::int(10),
                Expr::int(20),
            ),
        ),
        constant_field(int_ty(), "D", unary(UnOp::BitNot, Expr::int(0))),
        constant_field(
            int_ty(),
            "E",
            binary(BinOp::UShr, unary(UnOp::Neg, Expr::int(1)), Expr::int(28)),
        ),
    ]);
    let output = run_ok(&units);
    assert_eq!(int_value(&output, "A"), 7);
    assert_eq!(int_value(&output, "B"), 28);
    assert_eq!(int_value(&output, "C"), 10);
    assert_eq!(int_value(&output, "D"), -1);
    assert_eq!(int_value(&output, "E"), 15);
}

#[test]
fn two_complement_wrap_around() {
    let units = holder(vec![
        constant_field(int_ty(), "MAX", Expr::int(i32::MAX)),
        constant_field(
            int_ty(),
            "WRAP",
            binary(BinOp::Add, reference(&["MAX"]), Expr::int(1)),
        ),
        constant_field(
            prim_ty(PrimitiveKind::Long),
            "LWRAP",
            binary(
                BinOp::Mul,
                lit(Lit::Long(i64::MAX)),
                lit(Lit::Long(2)),
            ),
        ),
    ]);
    let output = run_ok(&units);
    assert_eq!(int_value(&output, "WRAP"), i32::MIN);
    assert_eq!(
        field_value(&output, "test/Consts", "LWRAP"),
        Some(Const::Value(ConstValue::Long(-2)))
    );
}

#[test]
fn string_concatenation_folds_left_to_right() {
    let units = holder(vec![
        constant_field(int_ty(), "N", Expr::int(7)),
        constant_field(
            string_ty(),
            "S",
            binary(
                BinOp::Add,
                binary(
                    BinOp::Add,
                    binary(BinOp::Add, Expr::string("v="), reference(&["N"])),
                    lit(Lit::Char(b':' as u16)),
                ),
                lit(Lit::Bool(true)),
            ),
        ),
    ]);
    let output = run_ok(&units);
    assert_eq!(
        field_value(&output, "test/Consts", "S"),
        Some(Const::string("v=7:true"))
    );
}

#[test]
fn casts_narrow_and_saturate_like_the_jvm() {
    let units = holder(vec![
        constant_field(
            prim_ty(PrimitiveKind::Byte),
            "TRUNC",
            cast(prim_ty(PrimitiveKind::Byte), Expr::int(300)),
        ),
        constant_field(
            prim_ty(PrimitiveKind::Long),
            "FROM_DOUBLE",
            cast(prim_ty(PrimitiveKind::Long), lit(Lit::Double(1e10))),
        ),
        constant_field(
            int_ty(),
            "SATURATED",
            cast(int_ty(), lit(Lit::Double(1e300))),
        ),
        constant_field(
            int_ty(),
            "NAN_IS_ZERO",
            cast(int_ty(), lit(Lit::Double(f64::NAN))),
        ),
        constant_field(
            prim_ty(PrimitiveKind::Char),
            "CHAR_FROM_INT",
            cast(prim_ty(PrimitiveKind::Char), Expr::int(65)),
        ),
    ]);
    let output = run_ok(&units);
    assert_eq!(
        field_value(&output, "test/Consts", "TRUNC"),
        Some(Const::Value(ConstValue::Byte(44)))
    );
    assert_eq!(
        field_value(&output, "test/Consts", "FROM_DOUBLE"),
        Some(Const::Value(ConstValue::Long(10_000_000_000)))
    );
    assert_eq!(int_value(&output, "SATURATED"), i32::MAX);
    assert_eq!(int_value(&output, "NAN_IS_ZERO"), 0);
    assert_eq!(
        field_value(&output, "test/Consts", "CHAR_FROM_INT"),
        Some(Const::Value(ConstValue::Char(65)))
    );
}

#[test]
fn assignment_narrows_in_range_constants() {
    let units = holder(vec![
        constant_field(prim_ty(PrimitiveKind::Byte), "B", Expr::int(1)),
        constant_field(prim_ty(PrimitiveKind::Short), "S", Expr::int(300)),
        constant_field(prim_ty(PrimitiveKind::Double), "D", Expr::int(3)),
    ]);
    let output = run_ok(&units);
    assert_eq!(
        field_value(&output, "test/Consts", "B"),
        Some(Const::Value(ConstValue::Byte(1)))
    );
    assert_eq!(
        field_value(&output, "test/Consts", "S"),
        Some(Const::Value(ConstValue::Short(300)))
    );
    assert_eq!(
        field_value(&output, "test/Consts", "D"),
        Some(Const::Value(ConstValue::Double(3.0)))
    );
}

#[test]
fn out_of_range_narrowing_is_a_type_mismatch() {
    let units = holder(vec![constant_field(
        prim_ty(PrimitiveKind::Byte),
        "TOO_BIG",
        Expr::int(300),
    )]);
    let output = run(&units);
    assert!(output
        .diagnostics
        .iter()
        .any(|diagnostic| diagnostic.kind == DiagnosticKind::TypeMismatch));
    assert_eq!(field_value(&output, "test/Consts", "TOO_BIG"), None);
}

#[test]
fn reference_cycles_report_once_and_produce_zero() {
    let units = holder(vec![
        constant_field(int_ty(), "A", reference(&["B"])),
        constant_field(int_ty(), "B", reference(&["A"])),
        constant_field(string_ty(), "LOOP", reference(&["LOOP"])),
    ]);
    let output = run(&units);

    let cycles = output
        .diagnostics
        .iter()
        .filter(|diagnostic| diagnostic.kind == DiagnosticKind::BadConstantExpression)
        .count();
    assert!(cycles >= 2, "{:?}", output.diagnostics);

    assert_eq!(int_value(&output, "A"), 0);
    assert_eq!(int_value(&output, "B"), 0);
    assert_eq!(
        field_value(&output, "test/Consts", "LOOP"),
        Some(Const::string(""))
    );
}

#[test]
fn division_by_zero_is_reported() {
    let units = holder(vec![constant_field(
        int_ty(),
        "BAD",
        binary(BinOp::Div, Expr::int(1), Expr::int(0)),
    )]);
    let output = run(&units);
    assert!(output
        .diagnostics
        .iter()
        .any(|diagnostic| diagnostic.kind == DiagnosticKind::BadConstantExpression));
    assert_eq!(field_value(&output, "test/Consts", "BAD"), None);
}

#[test]
fn non_constant_fields_are_not_folded() {
    let units = holder(vec![
        // Not static.
        field_decl(
            &[tree::Modifier::Final],
            int_ty(),
            "INSTANCE",
            Some(Expr::int(1)),
        ),
        // Not primitive or string.
        constant_field(
            tree::TyRef::named(&["Object"]),
            "OBJ",
            Expr::string("boxed"),
        ),
    ]);
    let output = run(&units);
    assert_eq!(field_value(&output, "test/Consts", "INSTANCE"), None);
    assert_eq!(field_value(&output, "test/Consts", "OBJ"), None);
}

#[test]
fn boolean_logic_and_equality() {
    let units = holder(vec![
        constant_field(
            prim_ty(PrimitiveKind::Boolean),
            "AND",
            binary(BinOp::AndAnd, lit(Lit::Bool(true)), lit(Lit::Bool(false))),
        ),
        constant_field(
            prim_ty(PrimitiveKind::Boolean),
            "STRINGS",
            binary(BinOp::Eq, Expr::string("a"), Expr::string("a")),
        ),
        constant_field(
            prim_ty(PrimitiveKind::Boolean),
            "MIXED",
            binary(BinOp::Ne, Expr::int(1), lit(Lit::Long(2))),
        ),
        constant_field(
            prim_ty(PrimitiveKind::Boolean),
            "NOT",
            unary(UnOp::Not, lit(Lit::Bool(false))),
        ),
    ]);
    let output = run_ok(&units);
    for (name, expected) in [("AND", false), ("STRINGS", true), ("MIXED", true), ("NOT", true)] {
        assert_eq!(
            field_value(&output, "test/Consts", name),
            Some(Const::Value(ConstValue::Boolean(expected))),
            "{name}"
        );
    }
}

#[test]
fn class_literals_and_enum_references_stay_opaque() {
    let mut tag = tree::TyDecl::new(tree::TyKind::Annotation, "Tag");
    let mut cls = method_decl(tree::TyRef::named(&["Class"]), "cls", Vec::new());
    cls.has_body = false;
    let mut policy = method_decl(
        tree::TyRef::named(&["java", "lang", "annotation", "RetentionPolicy"]),
        "policy",
        Vec::new(),
    );
    policy.has_body = false;
    tag.members = vec![
        tree::MemberDecl::Method(cls),
        tree::MemberDecl::Method(policy),
    ];

    let mut used = tree::TyDecl::new(tree::TyKind::Class, "Used");
    used.annos = vec![anno(
        &["Tag"],
        vec![
            (
                Some("cls"),
                Expr::ClassLiteral {
                    ty: string_ty(),
                    span: Span::point(0),
                },
            ),
            (
                Some("policy"),
                reference(&["java", "lang", "annotation", "RetentionPolicy", "CLASS"]),
            ),
        ],
    )];

    let units = vec![unit("test/Tag.java", Some("test"), vec![tag, used])];
    let output = run_ok(&units);

    let bound = bound_class(&output, "test/Used");
    let values = &bound.annos[0].values;
    match &values[0].1 {
        Const::Class(ty) => {
            assert_eq!(ty.class_sym().unwrap().binary_name(), "java/lang/String");
        }
        other => panic!("expected class constant, got {other:?}"),
    }
    match &values[1].1 {
        Const::Enum(field) => {
            assert_eq!(
                field.owner.binary_name(),
                "java/lang/annotation/RetentionPolicy"
            );
            assert_eq!(field.name.as_str(), "CLASS");
        }
        other => panic!("expected enum constant, got {other:?}"),
    }
}
