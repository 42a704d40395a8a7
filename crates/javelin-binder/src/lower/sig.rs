//! Lowering bound types to the signature grammar.
//!
//! A class-type chain prints expanded (`Louter<...>.Inner<...>;`) when any
//! part carries type arguments, and collapses to the flat `Louter$Inner;`
//! form otherwise. Signatures are omitted entirely for declarations that use
//! no generics and no parameterized or variable types.

use javelin_classfile::sig::{
    self, ClassSig, ClassTySig, MethodSig, SimpleClassTySig, TyArgSig, TyParamSig, TySig,
};
use javelin_core::Name;

use crate::binder::Binder;
use crate::bound::{ClassHeader, ClassKind, MethodInfo, TyVarInfo};
use crate::env::Env;
use crate::sym::{ClassSymbol, TyVarSymbol};
use crate::types::{ClassType, Type, WildType};

pub(crate) fn type_sig(ty: &Type) -> TySig {
    match ty {
        Type::Void => TySig::Void,
        Type::Prim(prim) => TySig::Prim(prim.kind),
        Type::TyVar(tyvar) => TySig::TyVar(tyvar.sym.name.clone()),
        Type::Array(array) => TySig::Array(Box::new(type_sig(&array.elem))),
        Type::Class(class) => TySig::Class(class_ty_sig(class)),
        // Bounds-only and sentinel forms; these never survive to a signature
        // position on their own.
        Type::Intersection(intersection) => match intersection.bounds.first() {
            Some(first) => type_sig(first),
            None => object_sig(),
        },
        Type::Wild(_) | Type::Error => object_sig(),
    }
}

fn object_sig() -> TySig {
    TySig::Class(ClassTySig {
        package: "java/lang".to_owned(),
        classes: vec![SimpleClassTySig {
            name: Name::from("Object"),
            targs: Vec::new(),
        }],
    })
}

pub(crate) fn class_ty_sig(class: &ClassType) -> ClassTySig {
    let expand = class.classes.iter().any(|part| !part.targs.is_empty());
    if !expand {
        // Collapse to the flat binary-name form.
        let innermost = class.sym();
        return ClassTySig {
            package: innermost.package().to_owned(),
            classes: vec![SimpleClassTySig {
                name: Name::from(name_after_package(innermost)),
                targs: Vec::new(),
            }],
        };
    }

    let first = &class.classes[0];
    let mut classes = vec![SimpleClassTySig {
        name: Name::from(name_after_package(&first.sym)),
        targs: targ_sigs(&first.targs),
    }];
    let mut prev = first.sym.binary_name().to_owned();
    for part in &class.classes[1..] {
        // Only the simple-name suffix of each subsequent part is written.
        let prefix = format!("{prev}$");
        let suffix = part
            .sym
            .binary_name()
            .strip_prefix(&prefix)
            .unwrap_or_else(|| part.sym.simple_name());
        classes.push(SimpleClassTySig {
            name: Name::from(suffix),
            targs: targ_sigs(&part.targs),
        });
        prev = part.sym.binary_name().to_owned();
    }
    ClassTySig {
        package: first.sym.package().to_owned(),
        classes,
    }
}

/// The binary name with the package prefix removed: `Outer$Inner` for
/// `test/Outer$Inner`.
fn name_after_package(sym: &ClassSymbol) -> &str {
    let name = sym.binary_name();
    match name.rfind('/') {
        Some(i) => &name[i + 1..],
        None => name,
    }
}

fn targ_sigs(targs: &[Type]) -> Vec<TyArgSig> {
    targs
        .iter()
        .map(|targ| match targ {
            Type::Wild(WildType::Unbounded { .. }) => TyArgSig::Unbounded,
            Type::Wild(WildType::Upper { bound, .. }) => TyArgSig::Upper(type_sig(bound)),
            Type::Wild(WildType::Lower { bound, .. }) => TyArgSig::Lower(type_sig(bound)),
            other => TyArgSig::Exact(type_sig(other)),
        })
        .collect()
}

/// Whether a type forces a `Signature` attribute: anything parameterized or
/// mentioning a type variable.
pub(crate) fn needs_sig(ty: &Type) -> bool {
    match ty {
        Type::TyVar(_) => true,
        Type::Wild(_) => true,
        Type::Class(class) => class.is_parameterized(),
        Type::Array(array) => needs_sig(&array.elem),
        Type::Intersection(intersection) => intersection.bounds.iter().any(needs_sig),
        Type::Prim(_) | Type::Void | Type::Error => false,
    }
}

fn tparam_sigs(binder: &Binder<'_>, tparams: &[(TyVarSymbol, TyVarInfo)]) -> Vec<TyParamSig> {
    tparams
        .iter()
        .map(|(sym, info)| {
            // An unbounded parameter is bounded by java/lang/Object.
            let mut class_bound = if info.upper_bound.bounds.is_empty() {
                Some(object_sig())
            } else {
                None
            };
            let mut interface_bounds = Vec::new();
            for (i, bound) in info.upper_bound.bounds.iter().enumerate() {
                // The first bound is the class bound unless it is an
                // interface; an interface-only list leaves the class bound
                // empty, producing the leading-colon form.
                if i == 0 && !is_interface_bound(binder, bound) {
                    class_bound = Some(type_sig(bound));
                } else {
                    interface_bounds.push(type_sig(bound));
                }
            }
            TyParamSig {
                name: sym.name.clone(),
                class_bound,
                interface_bounds,
            }
        })
        .collect()
}

fn is_interface_bound(binder: &Binder<'_>, bound: &Type) -> bool {
    match bound.class_sym() {
        Some(sym) => matches!(
            class_kind_of(binder, sym),
            Some(ClassKind::Interface) | Some(ClassKind::Annotation)
        ),
        // A type-variable first bound is written as the class bound.
        None => false,
    }
}

pub(crate) fn class_kind_of(binder: &Binder<'_>, sym: &ClassSymbol) -> Option<ClassKind> {
    if let Some(header) = binder.headers.get(sym) {
        return Some(header.kind);
    }
    binder.classpath.get(sym).map(|class| class.header.kind)
}

/// The `Signature` attribute of a class, or `None` when it declares no
/// generics and none of its supertypes are parameterized.
pub(crate) fn class_signature(binder: &Binder<'_>, header: &ClassHeader) -> Option<String> {
    let super_needs = header.super_class.as_ref().is_some_and(needs_sig);
    let iface_needs = header.interfaces.iter().any(needs_sig);
    if header.type_params.is_empty() && !super_needs && !iface_needs {
        return None;
    }
    let superclass = match &header.super_class {
        Some(Type::Class(class)) => class_ty_sig(class),
        _ => ClassTySig {
            package: "java/lang".to_owned(),
            classes: vec![SimpleClassTySig {
                name: Name::from("Object"),
                targs: Vec::new(),
            }],
        },
    };
    let interfaces = header
        .interfaces
        .iter()
        .filter_map(|iface| match iface {
            Type::Class(class) => Some(class_ty_sig(class)),
            _ => None,
        })
        .collect();
    let sig = ClassSig {
        tparams: tparam_sigs(binder, &header.type_params),
        superclass,
        interfaces,
    };
    Some(sig::write_class_sig(&sig))
}

/// The `Signature` attribute of a method, or `None` for fully erased
/// declarations.
pub(crate) fn method_signature(binder: &Binder<'_>, method: &MethodInfo) -> Option<String> {
    let any_generic = !method.type_params.is_empty()
        || needs_sig(&method.ret)
        || method.params.iter().any(|param| needs_sig(&param.ty))
        || method.throws.iter().any(needs_sig);
    if !any_generic {
        return None;
    }
    // Thrown types appear only when one of them is a type variable or
    // parameterized.
    let exceptions = if method.throws.iter().any(needs_sig) {
        method.throws.iter().map(type_sig).collect()
    } else {
        Vec::new()
    };
    let sig = MethodSig {
        tparams: tparam_sigs(binder, &method.type_params),
        params: method.params.iter().map(|param| type_sig(&param.ty)).collect(),
        ret: type_sig(&method.ret),
        exceptions,
    };
    Some(sig::write_method_sig(&sig))
}

/// The `Signature` attribute of a field or record component.
pub(crate) fn field_signature(ty: &Type) -> Option<String> {
    if !needs_sig(ty) {
        return None;
    }
    Some(sig::write_type(&type_sig(ty)))
}
