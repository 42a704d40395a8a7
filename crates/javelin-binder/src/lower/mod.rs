//! Lowering bound classes to class files.
//!
//! One [`ClassFile`] per bound class, no `Code` attributes ever. Annotation
//! visibility follows the annotation class's retention; the `InnerClasses`
//! attribute closes over every nested class referenced from the class's
//! signatures and annotations plus everything it nests.

pub(crate) mod sig;

use std::collections::{BTreeMap, BTreeSet, HashSet};

use javelin_classfile::{
    write_class_file, AnnotationData, ClassFile, ConstantValueData, ElementValueData, ExportData,
    FieldData, InnerClassData, MethodData, MethodParameterData, ModuleData, ProvideData,
    RecordComponentData, RequireData, TargetInfoData, TypeAnnotationData, TypePathStep,
};
use javelin_core::{ClassFlags, FieldFlags, MethodFlags};
use tracing::debug;

use crate::binder::Binder;
use crate::bound::{AnnoInfo, ClassKind, FieldInfo, MethodInfo, TyVarInfo, TypeBoundClass};
use crate::consts::{Const, ConstValue};
use crate::env::Env;
use crate::module::ModuleInfo;
use crate::sym::ClassSymbol;
use crate::types::Type;

/// Class-file major versions that gate newer attributes.
const MAJOR_NESTS: u16 = 55;
const MAJOR_RECORDS: u16 = 60;
const MAJOR_SEALED: u16 = 61;

pub(crate) fn lower_all(binder: &Binder<'_>) -> BTreeMap<String, Vec<u8>> {
    let mut out = BTreeMap::new();
    for sym in &binder.order {
        let Some(bound) = binder.bound.get(sym) else {
            continue;
        };
        let class_file = lower_class(binder, sym, &bound);
        out.insert(
            sym.binary_name().to_owned(),
            write_class_file(&class_file),
        );
    }
    for module in &binder.modules {
        let class_file = lower_module(binder, module);
        out.insert("module-info".to_owned(), write_class_file(&class_file));
    }
    debug!(classes = out.len(), "lowering complete");
    out
}

fn lower_class(binder: &Binder<'_>, sym: &ClassSymbol, bound: &TypeBoundClass) -> ClassFile {
    let header = &bound.header;
    let mut class_file = ClassFile {
        version: binder.opts.version,
        access_flags: class_file_access(header.access),
        this_class: sym.binary_name().to_owned(),
        ..ClassFile::default()
    };

    class_file.super_class = match &header.super_class {
        Some(Type::Class(class)) => Some(class.sym().binary_name().to_owned()),
        Some(_) => Some("java/lang/Object".to_owned()),
        None if sym.binary_name() == "java/lang/Object" => None,
        // Interfaces and annotations have no source superclass but their
        // class files name java/lang/Object.
        None => Some("java/lang/Object".to_owned()),
    };
    for iface in &header.interfaces {
        if let Some(iface_sym) = iface.class_sym() {
            class_file.interfaces.push(iface_sym.binary_name().to_owned());
        }
    }

    class_file.signature = sig::class_signature(binder, header);
    let (visible, invisible) = split_annos(binder, &bound.annos);
    class_file.visible_annotations = visible;
    class_file.invisible_annotations = invisible;
    class_file.deprecated = is_deprecated(&bound.annos);

    let mut type_annos = TypeAnnoCollector::new(binder);
    for (i, (_, info)) in header.type_params.iter().enumerate() {
        type_annos.tparam(i, info, true);
    }
    if let Some(super_class) = &header.super_class {
        type_annos.collect(super_class, TargetInfoData::Supertype(65535));
    }
    for (i, iface) in header.interfaces.iter().enumerate() {
        type_annos.collect(iface, TargetInfoData::Supertype(i as u16));
    }
    class_file.visible_type_annotations = type_annos.visible;
    class_file.invisible_type_annotations = type_annos.invisible;

    for field in &bound.fields {
        // Private members are elided where they are not observable; a
        // private constant can still be inlined by downstream compilations.
        let constant_value = field.value.as_ref().and_then(constant_value_data);
        if field.access.contains(FieldFlags::PRIVATE) && constant_value.is_none() {
            continue;
        }
        class_file.fields.push(lower_field(binder, field, constant_value));
    }
    for method in &bound.methods {
        if method.access.contains(MethodFlags::PRIVATE) {
            continue;
        }
        class_file.methods.push(lower_method(binder, method));
    }

    if header.kind == ClassKind::Record && binder.opts.version.major >= MAJOR_RECORDS {
        class_file.record_components = Some(
            bound
                .components
                .iter()
                .map(|component| {
                    let mut visited = HashSet::new();
                    let (visible, invisible) = split_annos(binder, &component.annos);
                    let mut type_annos = TypeAnnoCollector::new(binder);
                    type_annos.collect(&component.ty, TargetInfoData::FieldType);
                    RecordComponentData {
                        name: component.name.as_str().to_owned(),
                        descriptor: binder.erasure_of_type(&component.ty, &mut visited),
                        signature: sig::field_signature(&component.ty),
                        visible_annotations: visible,
                        invisible_annotations: invisible,
                        visible_type_annotations: type_annos.visible,
                        invisible_type_annotations: type_annos.invisible,
                    }
                })
                .collect(),
        );
    }

    if binder.opts.version.major >= MAJOR_SEALED {
        class_file.permitted_subclasses = header
            .permits
            .iter()
            .map(|permitted| permitted.binary_name().to_owned())
            .collect();
    }

    if binder.opts.version.major >= MAJOR_NESTS {
        if let Some(host) = nest_host(binder, sym) {
            class_file.nest_host = Some(host.binary_name().to_owned());
        } else {
            let mut members = Vec::new();
            nest_members(binder, sym, &mut members);
            class_file.nest_members = members
                .iter()
                .map(|member| member.binary_name().to_owned())
                .collect();
        }
    }

    class_file.inner_classes = inner_classes(binder, sym, bound);
    class_file
}

/// Class-file-level access flags: `protected` surfaces as public, and the
/// nested-only `private`/`protected`/`static` bits live in `InnerClasses`
/// rather than the class header.
fn class_file_access(access: ClassFlags) -> u16 {
    let mut access = access;
    if access.contains(ClassFlags::PROTECTED) {
        access = access.without(ClassFlags::PROTECTED) | ClassFlags::PUBLIC;
    }
    access
        .without(ClassFlags::PRIVATE)
        .without(ClassFlags::STATIC)
        .bits()
}

fn lower_field(
    binder: &Binder<'_>,
    field: &FieldInfo,
    constant_value: Option<ConstantValueData>,
) -> FieldData {
    let mut visited = HashSet::new();
    let (visible, invisible) = split_annos(binder, &field.annos);
    let mut type_annos = TypeAnnoCollector::new(binder);
    type_annos.collect(&field.ty, TargetInfoData::FieldType);
    FieldData {
        access_flags: field.access.bits(),
        name: field.sym.name.as_str().to_owned(),
        descriptor: binder.erasure_of_type(&field.ty, &mut visited),
        signature: sig::field_signature(&field.ty),
        constant_value,
        deprecated: is_deprecated(&field.annos),
        visible_annotations: visible,
        invisible_annotations: invisible,
        visible_type_annotations: type_annos.visible,
        invisible_type_annotations: type_annos.invisible,
    }
}

fn lower_method(binder: &Binder<'_>, method: &MethodInfo) -> MethodData {
    let (visible, invisible) = split_annos(binder, &method.annos);

    let mut exceptions = Vec::new();
    for thrown in &method.throws {
        if let Some(name) = erased_class_name(binder, thrown) {
            exceptions.push(name);
        }
    }

    let parameters = method
        .params
        .iter()
        .map(|param| MethodParameterData {
            name: Some(param.name.as_str().to_owned()),
            access_flags: param.access.bits(),
        })
        .collect();

    let mut visible_parameter_annotations = Vec::new();
    let mut invisible_parameter_annotations = Vec::new();
    for param in &method.params {
        let (param_visible, param_invisible) = split_annos(binder, &param.annos);
        visible_parameter_annotations.push(param_visible);
        invisible_parameter_annotations.push(param_invisible);
    }

    let mut type_annos = TypeAnnoCollector::new(binder);
    for (i, (_, info)) in method.type_params.iter().enumerate() {
        type_annos.tparam(i, info, false);
    }
    type_annos.collect(&method.ret, TargetInfoData::MethodReturn);
    for (i, param) in method.params.iter().enumerate() {
        type_annos.collect(&param.ty, TargetInfoData::FormalParameter(i as u8));
    }
    for (i, thrown) in method.throws.iter().enumerate() {
        type_annos.collect(thrown, TargetInfoData::Throws(i as u16));
    }

    MethodData {
        access_flags: method.access.bits(),
        name: method.sym.name.as_str().to_owned(),
        descriptor: method.sym.descriptor.clone(),
        signature: sig::method_signature(binder, method),
        exceptions,
        parameters,
        annotation_default: method
            .default_value
            .as_ref()
            .map(|value| element_value(binder, value)),
        deprecated: is_deprecated(&method.annos),
        visible_annotations: visible,
        invisible_annotations: invisible,
        visible_parameter_annotations,
        invisible_parameter_annotations,
        visible_type_annotations: type_annos.visible,
        invisible_type_annotations: type_annos.invisible,
    }
}

fn lower_module(binder: &Binder<'_>, module: &ModuleInfo) -> ClassFile {
    let (visible, invisible) = split_annos(binder, &module.annos);
    ClassFile {
        version: binder.opts.version,
        access_flags: ClassFlags::MODULE.bits(),
        this_class: "module-info".to_owned(),
        super_class: None,
        visible_annotations: visible,
        invisible_annotations: invisible,
        module: Some(ModuleData {
            name: module.name.as_str().to_owned(),
            flags: module.flags.bits(),
            version: module.version.clone(),
            requires: module
                .requires
                .iter()
                .map(|require| RequireData {
                    module: require.module.as_str().to_owned(),
                    flags: require.flags.bits(),
                    version: require.version.clone(),
                })
                .collect(),
            exports: module.exports.iter().map(export_data).collect(),
            opens: module.opens.iter().map(export_data).collect(),
            uses: module
                .uses
                .iter()
                .map(|service| service.binary_name().to_owned())
                .collect(),
            provides: module
                .provides
                .iter()
                .map(|provide| ProvideData {
                    service: provide.service.binary_name().to_owned(),
                    implementations: provide
                        .implementations
                        .iter()
                        .map(|implementation| implementation.binary_name().to_owned())
                        .collect(),
                })
                .collect(),
        }),
        ..ClassFile::default()
    }
}

fn export_data(export: &crate::module::ExportInfo) -> ExportData {
    ExportData {
        package: export.package.clone(),
        flags: javelin_core::ExportFlags::EMPTY.bits(),
        to: export.to.iter().map(|to| to.as_str().to_owned()).collect(),
    }
}

// === Annotations =============================================================

enum Visibility {
    Visible,
    Invisible,
    Skip,
}

/// Annotation visibility from the annotation class's retention: runtime is
/// visible, class (including unspecified) is invisible, source is elided.
fn anno_visibility(binder: &Binder<'_>, sym: &ClassSymbol) -> Visibility {
    let annos: Vec<AnnoInfo> = match binder.full_env().get(sym) {
        Some(class) => class.annos.clone(),
        None => Vec::new(),
    };
    for anno in &annos {
        if anno.sym.binary_name() != "java/lang/annotation/Retention" {
            continue;
        }
        if let Some(Const::Enum(policy)) = anno.value("value") {
            return match policy.name.as_str() {
                "RUNTIME" => Visibility::Visible,
                "SOURCE" => Visibility::Skip,
                _ => Visibility::Invisible,
            };
        }
    }
    Visibility::Invisible
}

fn split_annos(
    binder: &Binder<'_>,
    annos: &[AnnoInfo],
) -> (Vec<AnnotationData>, Vec<AnnotationData>) {
    let mut visible = Vec::new();
    let mut invisible = Vec::new();
    for anno in annos {
        match anno_visibility(binder, &anno.sym) {
            Visibility::Visible => visible.push(annotation_data(binder, anno)),
            Visibility::Invisible => invisible.push(annotation_data(binder, anno)),
            Visibility::Skip => {}
        }
    }
    (visible, invisible)
}

fn annotation_data(binder: &Binder<'_>, anno: &AnnoInfo) -> AnnotationData {
    AnnotationData {
        type_descriptor: format!("L{};", anno.sym.binary_name()),
        elements: anno
            .values
            .iter()
            .map(|(name, value)| (name.as_str().to_owned(), element_value(binder, value)))
            .collect(),
    }
}

fn element_value(binder: &Binder<'_>, value: &Const) -> ElementValueData {
    match value {
        Const::Value(ConstValue::Boolean(v)) => ElementValueData::Boolean(*v),
        Const::Value(ConstValue::Byte(v)) => ElementValueData::Byte(*v),
        Const::Value(ConstValue::Short(v)) => ElementValueData::Short(*v),
        Const::Value(ConstValue::Char(v)) => ElementValueData::Char(*v),
        Const::Value(ConstValue::Int(v)) => ElementValueData::Int(*v),
        Const::Value(ConstValue::Long(v)) => ElementValueData::Long(*v),
        Const::Value(ConstValue::Float(v)) => ElementValueData::Float(*v),
        Const::Value(ConstValue::Double(v)) => ElementValueData::Double(*v),
        Const::Value(ConstValue::String(v)) => ElementValueData::String(v.clone()),
        Const::Enum(field) => ElementValueData::Enum {
            type_descriptor: format!("L{};", field.owner.binary_name()),
            const_name: field.name.as_str().to_owned(),
        },
        Const::Class(ty) => {
            let mut visited = HashSet::new();
            ElementValueData::Class(binder.erasure_of_type(ty, &mut visited))
        }
        Const::Anno(anno) => ElementValueData::Annotation(Box::new(annotation_data(binder, anno))),
        Const::Array(values) => ElementValueData::Array(
            values
                .iter()
                .map(|value| element_value(binder, value))
                .collect(),
        ),
    }
}

fn is_deprecated(annos: &[AnnoInfo]) -> bool {
    annos
        .iter()
        .any(|anno| anno.sym.binary_name() == "java/lang/Deprecated")
}

// === Type annotations ========================================================

struct TypeAnnoCollector<'c, 'a> {
    binder: &'c Binder<'a>,
    visible: Vec<TypeAnnotationData>,
    invisible: Vec<TypeAnnotationData>,
}

impl<'c, 'a> TypeAnnoCollector<'c, 'a> {
    fn new(binder: &'c Binder<'a>) -> Self {
        Self {
            binder,
            visible: Vec::new(),
            invisible: Vec::new(),
        }
    }

    fn tparam(&mut self, index: usize, info: &TyVarInfo, on_class: bool) {
        let target = if on_class {
            TargetInfoData::ClassTypeParameter(index as u8)
        } else {
            TargetInfoData::MethodTypeParameter(index as u8)
        };
        for anno in &info.annos {
            self.push(anno, target, Vec::new());
        }
        // Bound indices count the implicit class bound at zero, so an
        // interface-only bound list starts at one.
        let skip_class_bound = match info.upper_bound.bounds.first() {
            Some(first) => first
                .class_sym()
                .and_then(|bound_sym| sig::class_kind_of(self.binder, bound_sym))
                .is_some_and(ClassKind::is_interface_like),
            None => false,
        };
        for (i, bound) in info.upper_bound.bounds.iter().enumerate() {
            let bound_index = (i + usize::from(skip_class_bound)) as u8;
            let target = if on_class {
                TargetInfoData::ClassTypeParameterBound {
                    parameter: index as u8,
                    bound: bound_index,
                }
            } else {
                TargetInfoData::MethodTypeParameterBound {
                    parameter: index as u8,
                    bound: bound_index,
                }
            };
            self.collect(bound, target);
        }
    }

    fn collect(&mut self, ty: &Type, target: TargetInfoData) {
        self.walk(ty, target, Vec::new());
    }

    fn walk(&mut self, ty: &Type, target: TargetInfoData, path: Vec<TypePathStep>) {
        match ty {
            Type::Class(class) => {
                for (depth, part) in class.classes.iter().enumerate() {
                    let mut part_path = path.clone();
                    for _ in 0..depth {
                        part_path.push(TypePathStep { kind: 1, index: 0 });
                    }
                    for anno in &part.annos {
                        self.push(anno, target, part_path.clone());
                    }
                    for (i, targ) in part.targs.iter().enumerate() {
                        let mut targ_path = part_path.clone();
                        targ_path.push(TypePathStep {
                            kind: 3,
                            index: i as u8,
                        });
                        self.walk(targ, target, targ_path);
                    }
                }
            }
            Type::Array(array) => {
                for anno in &array.annos {
                    self.push(anno, target, path.clone());
                }
                let mut elem_path = path;
                elem_path.push(TypePathStep { kind: 0, index: 0 });
                self.walk(&array.elem, target, elem_path);
            }
            Type::TyVar(tyvar) => {
                for anno in &tyvar.annos {
                    self.push(anno, target, path.clone());
                }
            }
            Type::Prim(prim) => {
                for anno in &prim.annos {
                    self.push(anno, target, path.clone());
                }
            }
            Type::Wild(wild) => {
                let (annos, bound) = match wild {
                    crate::types::WildType::Unbounded { annos } => (annos, None),
                    crate::types::WildType::Upper { bound, annos } => (annos, Some(bound)),
                    crate::types::WildType::Lower { bound, annos } => (annos, Some(bound)),
                };
                for anno in annos {
                    self.push(anno, target, path.clone());
                }
                if let Some(bound) = bound {
                    let mut bound_path = path;
                    bound_path.push(TypePathStep { kind: 2, index: 0 });
                    self.walk(bound, target, bound_path);
                }
            }
            Type::Intersection(intersection) => {
                for bound in &intersection.bounds {
                    self.walk(bound, target, path.clone());
                }
            }
            Type::Void | Type::Error => {}
        }
    }

    fn push(&mut self, anno: &AnnoInfo, target: TargetInfoData, path: Vec<TypePathStep>) {
        let data = TypeAnnotationData {
            target,
            path,
            annotation: annotation_data(self.binder, anno),
        };
        match anno_visibility(self.binder, &anno.sym) {
            Visibility::Visible => self.visible.push(data),
            Visibility::Invisible => self.invisible.push(data),
            Visibility::Skip => {}
        }
    }
}

// === Inner classes and nests =================================================

fn erased_class_name(binder: &Binder<'_>, ty: &Type) -> Option<String> {
    let mut visited = HashSet::new();
    let descriptor = binder.erasure_of_type(ty, &mut visited);
    descriptor
        .strip_prefix('L')
        .and_then(|rest| rest.strip_suffix(';'))
        .map(str::to_owned)
}

fn owner_of(binder: &Binder<'_>, sym: &ClassSymbol) -> Option<ClassSymbol> {
    if let Some(header) = binder.headers.get(sym) {
        return header.owner.clone();
    }
    binder
        .classpath
        .get(sym)
        .and_then(|class| class.header.owner.clone())
}

fn nest_host(binder: &Binder<'_>, sym: &ClassSymbol) -> Option<ClassSymbol> {
    let mut owner = owner_of(binder, sym)?;
    while let Some(outer) = owner_of(binder, &owner) {
        owner = outer;
    }
    Some(owner)
}

fn nest_members(binder: &Binder<'_>, sym: &ClassSymbol, out: &mut Vec<ClassSymbol>) {
    let Some(header) = binder.headers.get(sym) else {
        return;
    };
    for (_, child) in &header.children {
        out.push(child.clone());
        nest_members(binder, child, out);
    }
}

/// The `InnerClasses` closure: every nested class referenced by this class's
/// signatures and annotations, the enclosing chains of those, and everything
/// this class nests.
fn inner_classes(binder: &Binder<'_>, sym: &ClassSymbol, bound: &TypeBoundClass) -> Vec<InnerClassData> {
    let mut referenced = BTreeSet::new();
    referenced.insert(sym.clone());
    collect_class_syms(bound, &mut referenced);
    for (_, child) in &bound.header.children {
        referenced.insert(child.clone());
    }

    // Close over enclosing chains so `A$B$C` also lists `A$B`.
    let mut closure = BTreeSet::new();
    for referenced_sym in referenced {
        let mut cur = Some(referenced_sym);
        while let Some(c) = cur {
            cur = owner_of(binder, &c);
            if cur.is_some() {
                closure.insert(c);
            }
        }
    }

    closure
        .into_iter()
        .filter_map(|inner| {
            let owner = owner_of(binder, &inner)?;
            let access = declared_access(binder, &inner)?;
            Some(InnerClassData {
                inner: inner.binary_name().to_owned(),
                outer: Some(owner.binary_name().to_owned()),
                inner_name: Some(inner.simple_name().to_owned()),
                access_flags: access,
            })
        })
        .collect()
}

fn declared_access(binder: &Binder<'_>, sym: &ClassSymbol) -> Option<u16> {
    if let Some(header) = binder.headers.get(sym) {
        return Some(header.access.bits());
    }
    binder
        .classpath
        .get(sym)
        .map(|class| class.header.access.bits())
}

/// Every class symbol referenced from a bound class: supertypes, bounds,
/// member types, thrown types, annotations and constants.
pub(crate) fn collect_class_syms(bound: &TypeBoundClass, out: &mut BTreeSet<ClassSymbol>) {
    if let Some(super_class) = &bound.header.super_class {
        collect_type(super_class, out);
    }
    for iface in &bound.header.interfaces {
        collect_type(iface, out);
    }
    for (_, info) in &bound.header.type_params {
        collect_tyvar_info(info, out);
    }
    for permitted in &bound.header.permits {
        out.insert(permitted.clone());
    }
    for anno in &bound.annos {
        collect_anno(anno, out);
    }
    for field in &bound.fields {
        collect_type(&field.ty, out);
        for anno in &field.annos {
            collect_anno(anno, out);
        }
    }
    for method in &bound.methods {
        for (_, info) in &method.type_params {
            collect_tyvar_info(info, out);
        }
        collect_type(&method.ret, out);
        for param in &method.params {
            collect_type(&param.ty, out);
            for anno in &param.annos {
                collect_anno(anno, out);
            }
        }
        for thrown in &method.throws {
            collect_type(thrown, out);
        }
        for anno in &method.annos {
            collect_anno(anno, out);
        }
        if let Some(default) = &method.default_value {
            collect_const(default, out);
        }
    }
    for component in &bound.components {
        collect_type(&component.ty, out);
        for anno in &component.annos {
            collect_anno(anno, out);
        }
    }
}

fn collect_tyvar_info(info: &TyVarInfo, out: &mut BTreeSet<ClassSymbol>) {
    for bound in &info.upper_bound.bounds {
        collect_type(bound, out);
    }
    for anno in &info.annos {
        collect_anno(anno, out);
    }
}

fn collect_type(ty: &Type, out: &mut BTreeSet<ClassSymbol>) {
    match ty {
        Type::Class(class) => {
            for part in &class.classes {
                out.insert(part.sym.clone());
                for targ in &part.targs {
                    collect_type(targ, out);
                }
                for anno in &part.annos {
                    collect_anno(anno, out);
                }
            }
        }
        Type::Array(array) => collect_type(&array.elem, out),
        Type::Wild(crate::types::WildType::Upper { bound, .. })
        | Type::Wild(crate::types::WildType::Lower { bound, .. }) => collect_type(bound, out),
        Type::Intersection(intersection) => {
            for bound in &intersection.bounds {
                collect_type(bound, out);
            }
        }
        _ => {}
    }
}

fn collect_anno(anno: &AnnoInfo, out: &mut BTreeSet<ClassSymbol>) {
    out.insert(anno.sym.clone());
    for (_, value) in &anno.values {
        collect_const(value, out);
    }
}

fn collect_const(value: &Const, out: &mut BTreeSet<ClassSymbol>) {
    match value {
        Const::Enum(field) => {
            out.insert(field.owner.clone());
        }
        Const::Class(ty) => collect_type(ty, out),
        Const::Anno(anno) => collect_anno(anno, out),
        Const::Array(values) => {
            for value in values {
                collect_const(value, out);
            }
        }
        Const::Value(_) => {}
    }
}

fn constant_value_data(value: &Const) -> Option<ConstantValueData> {
    match value {
        Const::Value(ConstValue::Boolean(v)) => Some(ConstantValueData::Int(*v as i32)),
        Const::Value(ConstValue::Byte(v)) => Some(ConstantValueData::Int(*v as i32)),
        Const::Value(ConstValue::Short(v)) => Some(ConstantValueData::Int(*v as i32)),
        Const::Value(ConstValue::Char(v)) => Some(ConstantValueData::Int(*v as i32)),
        Const::Value(ConstValue::Int(v)) => Some(ConstantValueData::Int(*v)),
        Const::Value(ConstValue::Long(v)) => Some(ConstantValueData::Long(*v)),
        Const::Value(ConstValue::Float(v)) => Some(ConstantValueData::Float(*v)),
        Const::Value(ConstValue::Double(v)) => Some(ConstantValueData::Double(*v)),
        Const::Value(ConstValue::String(v)) => Some(ConstantValueData::String(v.clone())),
        _ => None,
    }
}
