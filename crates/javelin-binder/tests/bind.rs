//! End-to-end pipeline tests: trees in, class-file bytes out.

mod common;

use common::*;

use javelin_binder::{
    bind, ClassKind, ClassSymbol, ClasspathBytes, Const, ConstValue, EmitOptions, Type,
};
use javelin_classfile::{parse_class_file, ClassFileVersion, ConstantValueData, ElementValueData};
use javelin_core::{DiagnosticKind, Name, Span};
use javelin_tree as tree;
use pretty_assertions::assert_eq;

/// `@interface Anno { int value(); int y() default 1; int[] z() default {1,2,3}; }`
fn anno_decl() -> tree::TyDecl {
    let mut decl = tree::TyDecl::new(tree::TyKind::Annotation, "Anno");
    let mut value = method_decl(int_ty(), "value", Vec::new());
    value.has_body = false;
    let mut y = method_decl(int_ty(), "y", Vec::new());
    y.has_body = false;
    y.default = Some(tree::Expr::int(1));
    let mut z = method_decl(array_ty(int_ty()), "z", Vec::new());
    z.has_body = false;
    z.default = Some(array_init(vec![
        tree::Expr::int(1),
        tree::Expr::int(2),
        tree::Expr::int(3),
    ]));
    decl.members = vec![
        tree::MemberDecl::Method(value),
        tree::MemberDecl::Method(y),
        tree::MemberDecl::Method(z),
    ];
    decl
}

#[test]
fn annotation_values_end_to_end() {
    let mut holder = tree::TyDecl::new(tree::TyKind::Class, "Holder");
    let constant = constant_field(int_ty(), "CONST", tree::Expr::int(1));

    let mut a = field_decl(&[], int_ty(), "a", None);
    a.annos = vec![anno(
        &["Anno"],
        vec![(None, tree::Expr::int(1)), (Some("z"), array_init(vec![]))],
    )];
    let mut b = field_decl(&[], int_ty(), "b", None);
    b.annos = vec![anno(
        &["Anno"],
        vec![
            (Some("value"), tree::Expr::int(1)),
            (
                Some("z"),
                array_init(vec![
                    tree::Expr::int(1),
                    tree::Expr::int(2),
                    tree::Expr::int(3),
                ]),
            ),
        ],
    )];
    let mut c = field_decl(&[], int_ty(), "c", None);
    c.annos = vec![anno(
        &["Anno"],
        vec![
            (Some("y"), tree::Expr::int(2)),
            (Some("value"), tree::Expr::int(1)),
            (Some("z"), reference(&["CONST"])),
        ],
    )];
    holder.members = vec![
        tree::MemberDecl::Field(constant),
        tree::MemberDecl::Field(a),
        tree::MemberDecl::Field(b),
        tree::MemberDecl::Field(c),
    ];

    let units = vec![unit("test/Holder.java", Some("test"), vec![anno_decl(), holder])];
    let output = run_ok(&units);

    let bytes = &output.classes["test/Holder"];
    let parsed = parse_class_file(bytes).unwrap().class;

    assert_eq!(parsed.fields.len(), 4);
    assert_eq!(
        parsed.fields[0].constant_value,
        Some(ConstantValueData::Int(1))
    );

    // `@Anno` has no retention, so the annotations are class-retained and
    // land in RuntimeInvisibleAnnotations.
    for field in &parsed.fields[1..] {
        assert_eq!(field.visible_annotations.len(), 0);
        assert_eq!(field.invisible_annotations.len(), 1);
        assert_eq!(field.invisible_annotations[0].type_descriptor, "Ltest/Anno;");
    }

    let a_anno = &parsed.fields[1].invisible_annotations[0];
    assert_eq!(
        a_anno.elements,
        vec![
            ("value".to_owned(), ElementValueData::Int(1)),
            ("z".to_owned(), ElementValueData::Array(vec![])),
        ]
    );

    let b_anno = &parsed.fields[2].invisible_annotations[0];
    assert_eq!(
        b_anno.elements,
        vec![
            ("value".to_owned(), ElementValueData::Int(1)),
            (
                "z".to_owned(),
                ElementValueData::Array(vec![
                    ElementValueData::Int(1),
                    ElementValueData::Int(2),
                    ElementValueData::Int(3),
                ])
            ),
        ]
    );

    // The scalar `z = CONST` coerces to a one-element array; defaults are
    // not materialized, so `y` only appears where written.
    let c_anno = &parsed.fields[3].invisible_annotations[0];
    assert_eq!(
        c_anno.elements,
        vec![
            ("y".to_owned(), ElementValueData::Int(2)),
            ("value".to_owned(), ElementValueData::Int(1)),
            (
                "z".to_owned(),
                ElementValueData::Array(vec![ElementValueData::Int(1)])
            ),
        ]
    );

    // The annotation declaration itself: element methods carry their
    // defaults, and nothing else does.
    let anno_bytes = &output.classes["test/Anno"];
    let anno_class = parse_class_file(anno_bytes).unwrap().class;
    assert_eq!(anno_class.access_flags & 0x2600, 0x2600); // interface abstract annotation
    assert_eq!(anno_class.interfaces, vec!["java/lang/annotation/Annotation"]);
    let value = anno_class.methods.iter().find(|m| m.name == "value").unwrap();
    assert_eq!(value.annotation_default, None);
    let y = anno_class.methods.iter().find(|m| m.name == "y").unwrap();
    assert_eq!(y.annotation_default, Some(ElementValueData::Int(1)));
    let z = anno_class.methods.iter().find(|m| m.name == "z").unwrap();
    assert_eq!(
        z.annotation_default,
        Some(ElementValueData::Array(vec![
            ElementValueData::Int(1),
            ElementValueData::Int(2),
            ElementValueData::Int(3),
        ]))
    );
}

#[test]
fn runtime_retention_makes_annotations_visible() {
    let mut marked = tree::TyDecl::new(tree::TyKind::Annotation, "Marked");
    marked.annos = vec![anno(
        &["java", "lang", "annotation", "Retention"],
        vec![(
            None,
            reference(&["java", "lang", "annotation", "RetentionPolicy", "RUNTIME"]),
        )],
    )];

    let mut used = tree::TyDecl::new(tree::TyKind::Class, "Used");
    used.annos = vec![anno(&["Marked"], vec![])];

    let units = vec![unit("test/Used.java", Some("test"), vec![marked, used])];
    let output = run_ok(&units);

    let parsed = parse_class_file(&output.classes["test/Used"]).unwrap().class;
    assert_eq!(parsed.visible_annotations.len(), 1);
    assert_eq!(parsed.visible_annotations[0].type_descriptor, "Ltest/Marked;");
    assert_eq!(parsed.invisible_annotations.len(), 0);
}

#[test]
fn output_is_deterministic() {
    let units = vec![unit(
        "test/Holder.java",
        Some("test"),
        vec![anno_decl(), {
            let mut holder = tree::TyDecl::new(tree::TyKind::Class, "Holder");
            holder.members = vec![tree::MemberDecl::Field(constant_field(
                int_ty(),
                "CONST",
                tree::Expr::int(7),
            ))];
            holder
        }],
    )];
    let first = run_ok(&units);
    let second = run_ok(&units);
    assert_eq!(first.classes, second.classes);
    assert_eq!(first.transitive, second.transitive);
}

#[test]
fn hierarchy_cycle_recovers_with_object_edge() {
    let mut a = tree::TyDecl::new(tree::TyKind::Class, "A");
    a.extends = Some(tree::TyRef::named(&["B"]));
    let mut b = tree::TyDecl::new(tree::TyKind::Class, "B");
    b.extends = Some(tree::TyRef::named(&["A"]));

    let units = vec![unit("test/AB.java", Some("test"), vec![a, b])];
    let output = run(&units);

    assert!(output
        .diagnostics
        .iter()
        .any(|diagnostic| diagnostic.kind == DiagnosticKind::CyclicHierarchy));

    // Both classes still lower; the offending edge became java/lang/Object.
    let a_parsed = parse_class_file(&output.classes["test/A"]).unwrap().class;
    let b_parsed = parse_class_file(&output.classes["test/B"]).unwrap().class;
    assert_eq!(a_parsed.super_class.as_deref(), Some("test/B"));
    assert_eq!(b_parsed.super_class.as_deref(), Some("java/lang/Object"));
}

#[test]
fn resolution_prefers_single_imports_over_same_package() {
    let mut jdk = minimal_jdk();
    jdk.insert(
        ClassSymbol::new("p/List"),
        stub_class(ClassKind::Class, "p/List"),
    );
    jdk.insert(
        ClassSymbol::new("java/util/List"),
        stub_class(ClassKind::Interface, "java/util/List"),
    );

    let mut with_import = unit("p/WithImport.java", Some("p"), vec![{
        let mut decl = tree::TyDecl::new(tree::TyKind::Class, "WithImport");
        decl.members = vec![tree::MemberDecl::Field(field_decl(
            &[],
            tree::TyRef::named(&["List"]),
            "f",
            None,
        ))];
        decl
    }]);
    with_import.imports = vec![import(&["java", "util", "List"])];

    let without_import = unit("p/WithoutImport.java", Some("p"), vec![{
        let mut decl = tree::TyDecl::new(tree::TyKind::Class, "WithoutImport");
        decl.members = vec![tree::MemberDecl::Field(field_decl(
            &[],
            tree::TyRef::named(&["List"]),
            "f",
            None,
        ))];
        decl
    }]);

    let units = vec![with_import, without_import];
    let output = bind(&units, &jdk, None, None, &EmitOptions::default()).unwrap();
    assert!(output.ok(), "{:?}", output.diagnostics);

    let imported = bound_class(&output, "p/WithImport").field("f").unwrap().ty.clone();
    assert_eq!(
        imported.class_sym().unwrap().binary_name(),
        "java/util/List"
    );
    let local = bound_class(&output, "p/WithoutImport").field("f").unwrap().ty.clone();
    assert_eq!(local.class_sym().unwrap().binary_name(), "p/List");
}

#[test]
fn same_package_beats_on_demand_imports() {
    let mut jdk = minimal_jdk();
    jdk.insert(
        ClassSymbol::new("p/List"),
        stub_class(ClassKind::Class, "p/List"),
    );
    jdk.insert(
        ClassSymbol::new("java/util/List"),
        stub_class(ClassKind::Interface, "java/util/List"),
    );

    let mut with_star = unit("p/WithStar.java", Some("p"), vec![{
        let mut decl = tree::TyDecl::new(tree::TyKind::Class, "WithStar");
        decl.members = vec![tree::MemberDecl::Field(field_decl(
            &[],
            tree::TyRef::named(&["List"]),
            "f",
            None,
        ))];
        decl
    }]);
    with_star.imports = vec![import_on_demand(&["java", "util"])];

    let units = vec![with_star];
    let output = bind(&units, &jdk, None, None, &EmitOptions::default()).unwrap();
    let ty = bound_class(&output, "p/WithStar").field("f").unwrap().ty.clone();
    assert_eq!(ty.class_sym().unwrap().binary_name(), "p/List");
}

#[test]
fn nested_classes_close_over_inner_classes_attribute() {
    let mut outer = tree::TyDecl::new(tree::TyKind::Class, "Outer");
    outer.members = vec![tree::MemberDecl::Type({
        let mut inner = tree::TyDecl::new(tree::TyKind::Class, "Inner");
        inner.mods = vec![tree::Modifier::Public, tree::Modifier::Static];
        inner
    })];

    let mut user = tree::TyDecl::new(tree::TyKind::Class, "Use");
    user.members = vec![tree::MemberDecl::Field(field_decl(
        &[],
        tree::TyRef::named(&["Outer", "Inner"]),
        "f",
        None,
    ))];

    let units = vec![unit("test/Outer.java", Some("test"), vec![outer, user])];
    let output = run_ok(&units);

    for name in ["test/Outer", "test/Outer$Inner", "test/Use"] {
        let parsed = parse_class_file(&output.classes[name]).unwrap();
        // Every nested class named by a Class pool entry appears in
        // InnerClasses exactly once.
        for class_name in &parsed.pool.class_names {
            if !class_name.contains('$') {
                continue;
            }
            let entries = parsed
                .class
                .inner_classes
                .iter()
                .filter(|entry| &entry.inner == class_name)
                .count();
            assert_eq!(entries, 1, "{name}: {class_name} in InnerClasses");
        }
    }

    let inner = parse_class_file(&output.classes["test/Outer$Inner"])
        .unwrap()
        .class;
    let entry = inner
        .inner_classes
        .iter()
        .find(|entry| entry.inner == "test/Outer$Inner")
        .unwrap();
    assert_eq!(entry.outer.as_deref(), Some("test/Outer"));
    assert_eq!(entry.inner_name.as_deref(), Some("Inner"));
    assert_eq!(entry.access_flags & 0x0008, 0x0008); // declared static
}

#[test]
fn nest_attributes_emitted_for_modern_targets() {
    let mut outer = tree::TyDecl::new(tree::TyKind::Class, "Outer");
    outer.members = vec![tree::MemberDecl::Type(tree::TyDecl::new(
        tree::TyKind::Class,
        "Inner",
    ))];

    let units = vec![unit("test/Outer.java", Some("test"), vec![outer])];
    let jdk = minimal_jdk();
    let opts = EmitOptions {
        version: ClassFileVersion {
            major: 61,
            minor: 0,
        },
        module_version: None,
    };
    let output = bind(&units, &jdk, None, None, &opts).unwrap();
    assert!(output.ok(), "{:?}", output.diagnostics);

    let outer_parsed = parse_class_file(&output.classes["test/Outer"]).unwrap().class;
    assert_eq!(outer_parsed.nest_members, vec!["test/Outer$Inner"]);
    let inner_parsed = parse_class_file(&output.classes["test/Outer$Inner"])
        .unwrap()
        .class;
    assert_eq!(inner_parsed.nest_host.as_deref(), Some("test/Outer"));
}

#[test]
fn varargs_methods_get_flag_and_array_parameter() {
    let mut decl = tree::TyDecl::new(tree::TyKind::Class, "Fmt");
    let mut format = method_decl(
        tree::TyRef::Void { span: Span::point(0) },
        "format",
        vec![{
            let mut p = param(string_ty(), "args");
            p.variadic = true;
            p
        }],
    );
    format.mods = vec![tree::Modifier::Public, tree::Modifier::Static];
    format.throws = vec![tree::TyRef::named(&["java", "io", "IOException"])];
    decl.members = vec![tree::MemberDecl::Method(format)];

    let units = vec![unit("test/Fmt.java", Some("test"), vec![decl])];
    let output = run_ok(&units);

    let parsed = parse_class_file(&output.classes["test/Fmt"]).unwrap().class;
    let method = &parsed.methods[0];
    assert_eq!(method.descriptor, "([Ljava/lang/String;)V");
    assert_eq!(method.access_flags & 0x0080, 0x0080);
    assert_eq!(method.parameters[0].name.as_deref(), Some("args"));
    assert_eq!(method.exceptions, vec!["java/io/IOException"]);
}

#[test]
fn records_emit_component_attributes() {
    let mut decl = tree::TyDecl::new(tree::TyKind::Record, "Point");
    decl.components = vec![
        tree::ComponentDecl {
            annos: Vec::new(),
            ty: int_ty(),
            name: Name::from("x"),
            span: Span::point(0),
        },
        tree::ComponentDecl {
            annos: Vec::new(),
            ty: string_ty(),
            name: Name::from("label"),
            span: Span::point(0),
        },
    ];

    let units = vec![unit("test/Point.java", Some("test"), vec![decl])];
    let jdk = minimal_jdk();
    let opts = EmitOptions {
        version: ClassFileVersion {
            major: 61,
            minor: 0,
        },
        module_version: None,
    };
    let output = bind(&units, &jdk, None, None, &opts).unwrap();
    assert!(output.ok(), "{:?}", output.diagnostics);

    let parsed = parse_class_file(&output.classes["test/Point"]).unwrap().class;
    assert_eq!(parsed.super_class.as_deref(), Some("java/lang/Record"));
    let components = parsed.record_components.as_ref().unwrap();
    assert_eq!(components.len(), 2);
    assert_eq!(components[0].name, "x");
    assert_eq!(components[0].descriptor, "I");
    assert_eq!(components[1].name, "label");
    assert_eq!(components[1].descriptor, "Ljava/lang/String;");
}

#[test]
fn deprecated_annotations_set_the_attribute() {
    let mut decl = tree::TyDecl::new(tree::TyKind::Class, "Old");
    decl.annos = vec![anno(&["Deprecated"], vec![])];

    let units = vec![unit("test/Old.java", Some("test"), vec![decl])];
    let output = run_ok(&units);

    let parsed = parse_class_file(&output.classes["test/Old"]).unwrap().class;
    assert!(parsed.deprecated);
    // The annotation itself is also emitted, with class retention.
    assert_eq!(
        parsed.invisible_annotations[0].type_descriptor,
        "Ljava/lang/Deprecated;"
    );
}

#[test]
fn enums_extend_parameterized_enum() {
    let mut decl = tree::TyDecl::new(tree::TyKind::Enum, "Color");
    decl.members = vec![
        tree::MemberDecl::EnumConstant(tree::EnumConstantDecl {
            annos: Vec::new(),
            name: Name::from("RED"),
            span: Span::point(0),
        }),
        tree::MemberDecl::EnumConstant(tree::EnumConstantDecl {
            annos: Vec::new(),
            name: Name::from("BLUE"),
            span: Span::point(0),
        }),
    ];

    let units = vec![unit("test/Color.java", Some("test"), vec![decl])];
    let output = run_ok(&units);

    let parsed = parse_class_file(&output.classes["test/Color"]).unwrap().class;
    assert_eq!(parsed.super_class.as_deref(), Some("java/lang/Enum"));
    assert_eq!(
        parsed.signature.as_deref(),
        Some("Ljava/lang/Enum<Ltest/Color;>;")
    );
    assert_eq!(parsed.access_flags & 0x4000, 0x4000);
    assert_eq!(parsed.fields.len(), 2);
    assert_eq!(parsed.fields[0].name, "RED");
    assert_eq!(parsed.fields[0].descriptor, "Ltest/Color;");
    assert_eq!(parsed.fields[0].access_flags, 0x4019);
}

#[test]
fn generic_classes_carry_signatures() {
    let mut decl = tree::TyDecl::new(tree::TyKind::Class, "Box");
    decl.type_params = vec![tree::TyParamDecl {
        name: Name::from("T"),
        annos: Vec::new(),
        bounds: Vec::new(),
        span: Span::point(0),
    }];
    let mut get = method_decl(tree::TyRef::named(&["T"]), "get", Vec::new());
    get.mods = vec![tree::Modifier::Public];
    decl.members = vec![
        tree::MemberDecl::Field(field_decl(&[], tree::TyRef::named(&["T"]), "value", None)),
        tree::MemberDecl::Method(get),
    ];

    let units = vec![unit("test/Box.java", Some("test"), vec![decl])];
    let output = run_ok(&units);

    let parsed = parse_class_file(&output.classes["test/Box"]).unwrap().class;
    assert_eq!(
        parsed.signature.as_deref(),
        Some("<T:Ljava/lang/Object;>Ljava/lang/Object;")
    );
    assert_eq!(parsed.fields[0].descriptor, "Ljava/lang/Object;");
    assert_eq!(parsed.fields[0].signature.as_deref(), Some("TT;"));
    assert_eq!(parsed.methods[0].descriptor, "()Ljava/lang/Object;");
    assert_eq!(parsed.methods[0].signature.as_deref(), Some("()TT;"));
}

#[test]
fn signature_attributes_reparse_to_identical_text() {
    let mut decl = tree::TyDecl::new(tree::TyKind::Class, "Pair");
    decl.type_params = vec![
        tree::TyParamDecl {
            name: Name::from("K"),
            annos: Vec::new(),
            bounds: vec![tree::TyRef::named(&["Comparable"])],
            span: Span::point(0),
        },
        tree::TyParamDecl {
            name: Name::from("V"),
            annos: Vec::new(),
            bounds: Vec::new(),
            span: Span::point(0),
        },
    ];
    decl.members = vec![tree::MemberDecl::Field(field_decl(
        &[],
        tree::TyRef::named(&["K"]),
        "key",
        None,
    ))];
    let mut with_import = unit("test/Pair.java", Some("test"), vec![decl]);
    with_import.imports = vec![import(&["java", "lang", "Comparable"])];

    let output = run_ok(&[with_import]);
    let parsed = parse_class_file(&output.classes["test/Pair"]).unwrap().class;

    for signature in [
        parsed.signature.as_deref(),
        parsed.fields[0].signature.as_deref(),
    ]
    .into_iter()
    .flatten()
    {
        if signature.starts_with('<') || signature.contains('(') {
            let reparsed = javelin_classfile::sig::parse_class_sig(signature).unwrap();
            assert_eq!(javelin_classfile::sig::write_class_sig(&reparsed), signature);
        } else {
            let reparsed = javelin_classfile::sig::parse_type(signature).unwrap();
            assert_eq!(javelin_classfile::sig::write_type(&reparsed), signature);
        }
    }
}

#[test]
fn module_info_synthesizes_mandated_java_base() {
    let mut module_unit = unit("module-info.java", None, Vec::new());
    module_unit.module = Some(tree::ModDecl {
        annos: Vec::new(),
        open: false,
        name: Name::from("com.example.app"),
        directives: vec![
            tree::ModDirective::Requires {
                mods: vec![tree::Modifier::Static, tree::Modifier::Transitive],
                module: Name::from("com.example.lib"),
                span: Span::point(0),
            },
            tree::ModDirective::Exports {
                package: Name::from("com.example.api"),
                to: Vec::new(),
                span: Span::point(0),
            },
        ],
        span: Span::point(0),
    });

    let output = run_with_modules(&[module_unit]);
    assert!(output.ok(), "{:?}", output.diagnostics);
    assert_eq!(output.modules.len(), 1);
    let module = &output.modules[0];

    let java_base: Vec<_> = module
        .requires
        .iter()
        .filter(|require| require.module.as_str() == "java.base")
        .collect();
    assert_eq!(java_base.len(), 1);
    assert!(java_base[0]
        .flags
        .contains(javelin_core::RequiresFlags::MANDATED));
    assert_eq!(java_base[0].version.as_deref(), Some("17"));

    let lib = module
        .requires
        .iter()
        .find(|require| require.module.as_str() == "com.example.lib")
        .unwrap();
    assert!(lib.flags.contains(javelin_core::RequiresFlags::TRANSITIVE));
    assert!(lib.flags.contains(javelin_core::RequiresFlags::STATIC_PHASE));

    assert_eq!(module.exports[0].package, "com/example/api");
    assert!(output.classes.contains_key("module-info"));
}

#[test]
fn explicit_java_base_is_not_duplicated() {
    let mut module_unit = unit("module-info.java", None, Vec::new());
    module_unit.module = Some(tree::ModDecl {
        annos: Vec::new(),
        open: true,
        name: Name::from("com.example.app"),
        directives: vec![tree::ModDirective::Requires {
            mods: Vec::new(),
            module: Name::from("java.base"),
            span: Span::point(0),
        }],
        span: Span::point(0),
    });

    let output = run_with_modules(&[module_unit]);
    let module = &output.modules[0];
    let java_base: Vec<_> = module
        .requires
        .iter()
        .filter(|require| require.module.as_str() == "java.base")
        .collect();
    assert_eq!(java_base.len(), 1);
    assert!(!java_base[0]
        .flags
        .contains(javelin_core::RequiresFlags::MANDATED));
    assert!(module.flags.contains(javelin_core::ModuleFlags::OPEN));
}

struct MarkerBytes;

impl ClasspathBytes for MarkerBytes {
    fn bytes(&self, sym: &ClassSymbol) -> Option<Vec<u8>> {
        Some(format!("bytes:{}", sym.binary_name()).into_bytes())
    }
}

#[test]
fn transitive_collector_copies_referenced_classpath_classes() {
    let mut decl = tree::TyDecl::new(tree::TyKind::Class, "Holder");
    decl.members = vec![tree::MemberDecl::Field(field_decl(
        &[],
        string_ty(),
        "s",
        None,
    ))];

    let units = vec![unit("test/Holder.java", Some("test"), vec![decl])];
    let jdk = minimal_jdk();
    let output = bind(&units, &jdk, Some(&MarkerBytes), None, &EmitOptions::default()).unwrap();
    assert!(output.ok(), "{:?}", output.diagnostics);

    assert!(output
        .referenced
        .contains(&ClassSymbol::new("java/lang/String")));
    assert_eq!(
        output.transitive["java/lang/String"],
        b"bytes:java/lang/String".to_vec()
    );
    // Source classes are never copied.
    assert!(!output.transitive.contains_key("test/Holder"));
}

#[test]
fn private_methods_are_elided_and_private_constants_kept() {
    let mut decl = tree::TyDecl::new(tree::TyKind::Class, "Hidden");
    let mut helper = method_decl(int_ty(), "helper", Vec::new());
    helper.mods = vec![tree::Modifier::Private];
    let secret = field_decl(
        &[
            tree::Modifier::Private,
            tree::Modifier::Static,
            tree::Modifier::Final,
        ],
        int_ty(),
        "SECRET",
        Some(tree::Expr::int(9)),
    );
    let plain = field_decl(&[tree::Modifier::Private], int_ty(), "plain", None);
    decl.members = vec![
        tree::MemberDecl::Method(helper),
        tree::MemberDecl::Field(secret),
        tree::MemberDecl::Field(plain),
    ];

    let units = vec![unit("test/Hidden.java", Some("test"), vec![decl])];
    let output = run_ok(&units);
    let parsed = parse_class_file(&output.classes["test/Hidden"]).unwrap().class;

    assert!(parsed.methods.is_empty());
    assert_eq!(parsed.fields.len(), 1);
    assert_eq!(parsed.fields[0].name, "SECRET");
    assert_eq!(
        parsed.fields[0].constant_value,
        Some(ConstantValueData::Int(9))
    );
}

#[test]
fn classpath_constants_resolve_in_initializers() {
    let mut decl = tree::TyDecl::new(tree::TyKind::Class, "Limits");
    decl.members = vec![tree::MemberDecl::Field(constant_field(
        int_ty(),
        "WRAPPED",
        binary(
            tree::BinOp::Add,
            reference(&["java", "lang", "Integer", "MAX_VALUE"]),
            tree::Expr::int(1),
        ),
    ))];

    let units = vec![unit("test/Limits.java", Some("test"), vec![decl])];
    let output = run_ok(&units);
    assert_eq!(
        field_value(&output, "test/Limits", "WRAPPED"),
        Some(Const::Value(ConstValue::Int(i32::MIN)))
    );
}

#[test]
fn unresolved_names_become_error_types_with_diagnostics() {
    let mut decl = tree::TyDecl::new(tree::TyKind::Class, "Broken");
    decl.members = vec![tree::MemberDecl::Field(field_decl(
        &[],
        tree::TyRef::named(&["NoSuchType"]),
        "f",
        None,
    ))];

    let units = vec![unit("test/Broken.java", Some("test"), vec![decl])];
    let output = run(&units);

    assert!(output
        .diagnostics
        .iter()
        .any(|diagnostic| diagnostic.kind == DiagnosticKind::SymbolNotFound));
    // The pipeline still produced a class with the field present.
    let field = bound_class(&output, "test/Broken").field("f").unwrap();
    assert_eq!(field.ty, Type::Error);
    assert!(output.classes.contains_key("test/Broken"));
}
