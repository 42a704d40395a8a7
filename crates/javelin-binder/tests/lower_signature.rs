use javelin_binder::{
    type_signature, ArrayType, ClassSymbol, ClassType, PrimType, SimpleClassType, TyVarOwner,
    TyVarSymbol, TyVarType, Type, WildType,
};
use javelin_core::PrimitiveKind;
use pretty_assertions::assert_eq;

fn simple(name: &str, targs: Vec<Type>) -> SimpleClassType {
    SimpleClassType {
        sym: ClassSymbol::new(name),
        targs,
        annos: Vec::new(),
    }
}

#[test]
fn simple_class() {
    let ty = Type::Class(ClassType {
        classes: vec![simple("java/util/List", vec![])],
    });
    assert_eq!(type_signature(&ty), "Ljava/util/List;");
}

#[test]
fn inner() {
    let ty = Type::Class(ClassType {
        classes: vec![
            simple("test/Outer", vec![]),
            simple("test/Outer$Inner", vec![]),
        ],
    });
    assert_eq!(type_signature(&ty), "Ltest/Outer$Inner;");
}

#[test]
fn generic_enclosing() {
    let ty = Type::Class(ClassType {
        classes: vec![
            simple("test/Outer", vec![Type::object()]),
            simple("test/Outer$Inner", vec![Type::object()]),
        ],
    });
    assert_eq!(
        type_signature(&ty),
        "Ltest/Outer<Ljava/lang/Object;>.Inner<Ljava/lang/Object;>;"
    );
    // Display is only for debugging.
    assert_eq!(
        ty.to_string(),
        "test/Outer<java/lang/Object>.Inner<java/lang/Object>"
    );
}

#[test]
fn inner_default_package() {
    let ty = Type::Class(ClassType {
        classes: vec![simple("Outer", vec![]), simple("Outer$Inner", vec![])],
    });
    assert_eq!(type_signature(&ty), "LOuter$Inner;");
}

#[test]
fn wildcard() {
    let ty = Type::Class(ClassType {
        classes: vec![simple(
            "test/Test",
            vec![
                Type::Wild(WildType::Unbounded { annos: Vec::new() }),
                Type::Wild(WildType::Lower {
                    bound: Box::new(Type::object()),
                    annos: Vec::new(),
                }),
                Type::Wild(WildType::Upper {
                    bound: Box::new(Type::object()),
                    annos: Vec::new(),
                }),
            ],
        )],
    });
    assert_eq!(
        type_signature(&ty),
        "Ltest/Test<*-Ljava/lang/Object;+Ljava/lang/Object;>;"
    );
}

#[test]
fn ty_var() {
    let ty = Type::TyVar(TyVarType {
        sym: TyVarSymbol {
            owner: TyVarOwner::Class(ClassSymbol::object()),
            name: "X".into(),
        },
        annos: Vec::new(),
    });
    assert_eq!(type_signature(&ty), "TX;");
}

#[test]
fn primitive() {
    let ty = Type::Prim(PrimType {
        kind: PrimitiveKind::Boolean,
        annos: Vec::new(),
    });
    assert_eq!(type_signature(&ty), "Z");
}

#[test]
fn void_type() {
    assert_eq!(type_signature(&Type::Void), "V");
}

#[test]
fn array() {
    let ty = Type::array(Type::array(Type::array(Type::prim(
        PrimitiveKind::Boolean,
    ))));
    assert_eq!(type_signature(&ty), "[[[Z");
}

#[test]
fn static_nested_with_type_arguments_keeps_flat_name() {
    // A single collapsed part whose enclosing class contributes no type
    // parameters prints with the `$` form even when parameterized.
    let ty = Type::Class(ClassType {
        classes: vec![simple("java/util/Map$Entry", vec![Type::string(), Type::object()])],
    });
    assert_eq!(
        type_signature(&ty),
        "Ljava/util/Map$Entry<Ljava/lang/String;Ljava/lang/Object;>;"
    );
}

#[test]
fn emitted_signatures_reparse_to_the_same_text() {
    for ty in [
        Type::Class(ClassType {
            classes: vec![
                simple("test/Outer", vec![Type::object()]),
                simple("test/Outer$Inner", vec![Type::object()]),
            ],
        }),
        Type::array(Type::string()),
        Type::Class(ClassType {
            classes: vec![simple("test/Test", vec![Type::Wild(WildType::Unbounded { annos: Vec::new() })])],
        }),
    ] {
        let text = type_signature(&ty);
        let reparsed = javelin_classfile::sig::parse_type(&text).unwrap();
        assert_eq!(javelin_classfile::sig::write_type(&reparsed), text);
    }
}

#[test]
fn one_dimensional_array() {
    let ty = Type::Array(ArrayType {
        elem: Box::new(Type::prim(PrimitiveKind::Int)),
        annos: Vec::new(),
    });
    assert_eq!(type_signature(&ty), "[I");
}
