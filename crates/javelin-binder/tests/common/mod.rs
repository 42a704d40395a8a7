//! Shared fixtures: a stub JDK classpath and tree builders.

#![allow(dead_code)]

use javelin_binder::{
    bind, AnnoInfo, BoundOutput, ClassHeader, ClassKind, ClassSymbol, Const, EmitOptions,
    FieldInfo, FieldSymbol, MethodInfo, MethodSymbol, ModuleInfo, ModuleSymbol, SimpleEnv, Type,
    TypeBoundClass,
};
use javelin_core::{ClassFlags, FieldFlags, MethodFlags, Name, Span};
use javelin_tree as tree;

pub fn stub_header(kind: ClassKind, name: &str) -> ClassHeader {
    ClassHeader {
        kind,
        access: ClassFlags::PUBLIC,
        owner: None,
        type_params: Vec::new(),
        super_class: if name == "java/lang/Object" {
            None
        } else {
            Some(Type::object())
        },
        interfaces: Vec::new(),
        permits: Vec::new(),
        children: Vec::new(),
    }
}

pub fn stub_class(kind: ClassKind, name: &str) -> TypeBoundClass {
    TypeBoundClass {
        header: stub_header(kind, name),
        fields: Vec::new(),
        methods: Vec::new(),
        components: Vec::new(),
        annos: Vec::new(),
    }
}

fn enum_constant(owner: &ClassSymbol, name: &str) -> FieldInfo {
    FieldInfo {
        sym: FieldSymbol::new(owner.clone(), name),
        ty: Type::class(owner.clone()),
        access: FieldFlags::PUBLIC | FieldFlags::STATIC | FieldFlags::FINAL | FieldFlags::ENUM,
        annos: Vec::new(),
        init: None,
        value: None,
        span: Span::point(0),
    }
}

/// A classpath env with just enough of the JDK for the tests: the core
/// supertypes, `String`, the annotation machinery and a constant-bearing
/// `Integer`.
pub fn minimal_jdk() -> SimpleEnv<ClassSymbol, TypeBoundClass> {
    let mut env = SimpleEnv::new();
    for name in [
        "java/lang/Object",
        "java/lang/String",
        "java/lang/Enum",
        "java/lang/Record",
        "java/lang/Class",
        "java/lang/Exception",
        "java/io/IOException",
    ] {
        env.insert(ClassSymbol::new(name), stub_class(ClassKind::Class, name));
    }
    env.insert(
        ClassSymbol::new("java/lang/Deprecated"),
        stub_class(ClassKind::Annotation, "java/lang/Deprecated"),
    );
    for name in ["java/io/Serializable", "java/lang/Comparable"] {
        env.insert(ClassSymbol::new(name), stub_class(ClassKind::Interface, name));
    }

    let mut integer = stub_class(ClassKind::Class, "java/lang/Integer");
    integer.fields.push(FieldInfo {
        sym: FieldSymbol::new(ClassSymbol::new("java/lang/Integer"), "MAX_VALUE"),
        ty: Type::prim(javelin_core::PrimitiveKind::Int),
        access: FieldFlags::PUBLIC | FieldFlags::STATIC | FieldFlags::FINAL,
        annos: Vec::new(),
        init: None,
        value: Some(Const::int(i32::MAX)),
        span: Span::point(0),
    });
    env.insert(ClassSymbol::new("java/lang/Integer"), integer);

    env.insert(
        ClassSymbol::new("java/lang/annotation/Annotation"),
        stub_class(ClassKind::Interface, "java/lang/annotation/Annotation"),
    );

    let policy_sym = ClassSymbol::new("java/lang/annotation/RetentionPolicy");
    let mut policy = stub_class(ClassKind::Enum, policy_sym.binary_name());
    for constant in ["SOURCE", "CLASS", "RUNTIME"] {
        policy.fields.push(enum_constant(&policy_sym, constant));
    }
    env.insert(policy_sym.clone(), policy);

    let retention_sym = ClassSymbol::new("java/lang/annotation/Retention");
    let mut retention = stub_class(ClassKind::Annotation, retention_sym.binary_name());
    retention.methods.push(MethodInfo {
        sym: MethodSymbol::new(
            retention_sym.clone(),
            "value",
            "()Ljava/lang/annotation/RetentionPolicy;",
        ),
        access: MethodFlags::PUBLIC | MethodFlags::ABSTRACT,
        type_params: Vec::new(),
        ret: Type::class(policy_sym.clone()),
        params: Vec::new(),
        throws: Vec::new(),
        annos: Vec::new(),
        default_expr: None,
        default_value: None,
        span: Span::point(0),
    });
    // Retention is itself runtime-retained.
    retention.annos.push(AnnoInfo::evaluated(
        retention_sym.clone(),
        vec![(
            Name::from("value"),
            Const::Enum(FieldSymbol::new(policy_sym, "RUNTIME")),
        )],
    ));
    env.insert(retention_sym, retention);

    env
}

pub fn module_env() -> SimpleEnv<ModuleSymbol, ModuleInfo> {
    let mut env = SimpleEnv::new();
    env.insert(
        ModuleSymbol::java_base(),
        ModuleInfo::named("java.base", Some("17".to_owned())),
    );
    env
}

/// Runs the full pipeline over `units` against the stub JDK.
pub fn run(units: &[tree::CompUnit]) -> BoundOutput {
    let jdk = minimal_jdk();
    bind(units, &jdk, None, None, &EmitOptions::default()).expect("pipeline runs")
}

pub fn run_with_modules(units: &[tree::CompUnit]) -> BoundOutput {
    let jdk = minimal_jdk();
    let modules = module_env();
    bind(units, &jdk, None, Some(&modules), &EmitOptions::default()).expect("pipeline runs")
}

/// Asserts a clean compilation and returns the output.
pub fn run_ok(units: &[tree::CompUnit]) -> BoundOutput {
    let output = run(units);
    assert!(
        output.ok(),
        "unexpected diagnostics: {:?}",
        output.diagnostics
    );
    output
}

// === Tree builders ===========================================================

pub fn unit(file: &str, package: Option<&str>, decls: Vec<tree::TyDecl>) -> tree::CompUnit {
    let mut unit = tree::CompUnit::new(file);
    if let Some(package) = package {
        unit.package = Some(tree::PackageDecl {
            name: package.split('.').map(Name::from).collect(),
            annos: Vec::new(),
            span: Span::point(0),
        });
    }
    unit.decls = decls;
    unit
}

pub fn import(path: &[&str]) -> tree::Import {
    tree::Import {
        is_static: false,
        wildcard: false,
        path: path.iter().map(|segment| Name::from(*segment)).collect(),
        span: Span::point(0),
    }
}

pub fn import_on_demand(path: &[&str]) -> tree::Import {
    tree::Import {
        wildcard: true,
        ..import(path)
    }
}

pub fn int_ty() -> tree::TyRef {
    tree::TyRef::Prim {
        kind: javelin_core::PrimitiveKind::Int,
        annos: Vec::new(),
        span: Span::point(0),
    }
}

pub fn prim_ty(kind: javelin_core::PrimitiveKind) -> tree::TyRef {
    tree::TyRef::Prim {
        kind,
        annos: Vec::new(),
        span: Span::point(0),
    }
}

pub fn array_ty(elem: tree::TyRef) -> tree::TyRef {
    tree::TyRef::Array {
        elem: Box::new(elem),
        annos: Vec::new(),
        span: Span::point(0),
    }
}

pub fn string_ty() -> tree::TyRef {
    tree::TyRef::named(&["String"])
}

pub fn field_decl(
    mods: &[tree::Modifier],
    ty: tree::TyRef,
    name: &str,
    init: Option<tree::Expr>,
) -> tree::FieldDecl {
    tree::FieldDecl {
        mods: mods.to_vec(),
        annos: Vec::new(),
        ty,
        name: Name::from(name),
        init,
        span: Span::point(0),
    }
}

pub fn constant_field(ty: tree::TyRef, name: &str, init: tree::Expr) -> tree::FieldDecl {
    field_decl(
        &[tree::Modifier::Static, tree::Modifier::Final],
        ty,
        name,
        Some(init),
    )
}

pub fn method_decl(ret: tree::TyRef, name: &str, params: Vec<tree::ParamDecl>) -> tree::MethodDecl {
    tree::MethodDecl {
        mods: Vec::new(),
        annos: Vec::new(),
        type_params: Vec::new(),
        ret,
        name: Name::from(name),
        params,
        throws: Vec::new(),
        default: None,
        has_body: true,
        span: Span::point(0),
    }
}

pub fn param(ty: tree::TyRef, name: &str) -> tree::ParamDecl {
    tree::ParamDecl {
        mods: Vec::new(),
        annos: Vec::new(),
        ty,
        name: Name::from(name),
        variadic: false,
        span: Span::point(0),
    }
}

pub fn anno(path: &[&str], args: Vec<(Option<&str>, tree::Expr)>) -> tree::Anno {
    tree::Anno {
        name: path.iter().map(|segment| Name::from(*segment)).collect(),
        args: args
            .into_iter()
            .map(|(name, expr)| (name.map(Name::from), expr))
            .collect(),
        span: Span::point(0),
    }
}

pub fn binary(op: tree::BinOp, lhs: tree::Expr, rhs: tree::Expr) -> tree::Expr {
    tree::Expr::Binary {
        op,
        lhs: Box::new(lhs),
        rhs: Box::new(rhs),
        span: Span::point(0),
    }
}

pub fn reference(path: &[&str]) -> tree::Expr {
    tree::Expr::Ref {
        path: path.iter().map(|segment| Name::from(*segment)).collect(),
        span: Span::point(0),
    }
}

pub fn array_init(elements: Vec<tree::Expr>) -> tree::Expr {
    tree::Expr::ArrayInit {
        elements,
        span: Span::point(0),
    }
}

/// The bound class for `name`, panicking when it is missing.
pub fn bound_class<'o>(output: &'o BoundOutput, name: &str) -> &'o TypeBoundClass {
    output
        .bound
        .get(&ClassSymbol::new(name))
        .map(|class| class.as_ref())
        .unwrap_or_else(|| panic!("{name} was not bound"))
}

/// The folded constant of a field.
pub fn field_value(output: &BoundOutput, class: &str, field: &str) -> Option<Const> {
    bound_class(output, class)
        .field(field)
        .and_then(|field| field.value.clone())
}
