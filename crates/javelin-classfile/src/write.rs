//! Serialization of the [`ClassFile`] model to bytes.
//!
//! The constant pool is populated by the body as it is written, so emission
//! order is fixed: class header, fields in order, methods in order, class
//! attributes. Two serializations of the same model produce identical bytes.

use crate::classfile::{
    AnnotationData, ClassFile, ConstantValueData, ElementValueData, FieldData, MethodData,
    ModuleData, RecordComponentData, TargetInfoData, TypeAnnotationData,
};
use crate::pool::ConstPool;
use crate::writer::ByteWriter;

pub const MAGIC: u32 = 0xCAFE_BABE;

/// Serializes a class file to bytes.
pub fn write_class_file(class: &ClassFile) -> Vec<u8> {
    write_class_file_with_pool(class).0
}

/// Serializes a class file and also returns the populated constant pool,
/// which tests use to check dedup and closure invariants.
pub fn write_class_file_with_pool(class: &ClassFile) -> (Vec<u8>, ConstPool) {
    let mut pool = ConstPool::new();
    let mut body = ByteWriter::new();
    write_body(&mut body, &mut pool, class);

    let mut out = ByteWriter::new();
    out.write_u4(MAGIC);
    out.write_u2(class.version.minor);
    out.write_u2(class.version.major);
    pool.write(&mut out);
    out.write_bytes(body.as_bytes());
    (out.into_bytes(), pool)
}

fn write_body(w: &mut ByteWriter, pool: &mut ConstPool, class: &ClassFile) {
    w.write_u2(class.access_flags);
    let this_class = pool.class(&class.this_class);
    w.write_u2(this_class);
    let super_class = match &class.super_class {
        Some(name) => pool.class(name),
        None => 0,
    };
    w.write_u2(super_class);

    w.write_u2(class.interfaces.len() as u16);
    for interface in &class.interfaces {
        let index = pool.class(interface);
        w.write_u2(index);
    }

    w.write_u2(class.fields.len() as u16);
    for field in &class.fields {
        write_field(w, pool, field);
    }

    w.write_u2(class.methods.len() as u16);
    for method in &class.methods {
        write_method(w, pool, method);
    }

    let count_slot = w.len();
    w.write_u2(0);
    let mut count = 0u16;

    if let Some(signature) = &class.signature {
        count += 1;
        write_signature(w, pool, signature);
    }
    if let Some(enclosing) = &class.enclosing_method {
        count += 1;
        let slot = attr(w, pool, "EnclosingMethod");
        let class_index = pool.class(&enclosing.class);
        w.write_u2(class_index);
        let method_index = match &enclosing.method {
            Some((name, descriptor)) => pool.name_and_type(name, descriptor),
            None => 0,
        };
        w.write_u2(method_index);
        w.end_length(slot);
    }
    if class.deprecated {
        count += 1;
        write_deprecated(w, pool);
    }
    if let Some(components) = &class.record_components {
        count += 1;
        let slot = attr(w, pool, "Record");
        w.write_u2(components.len() as u16);
        for component in components {
            write_record_component(w, pool, component);
        }
        w.end_length(slot);
    }
    if !class.permitted_subclasses.is_empty() {
        count += 1;
        let slot = attr(w, pool, "PermittedSubclasses");
        write_class_list(w, pool, &class.permitted_subclasses);
        w.end_length(slot);
    }
    if let Some(host) = &class.nest_host {
        count += 1;
        let slot = attr(w, pool, "NestHost");
        let index = pool.class(host);
        w.write_u2(index);
        w.end_length(slot);
    }
    if !class.nest_members.is_empty() {
        count += 1;
        let slot = attr(w, pool, "NestMembers");
        write_class_list(w, pool, &class.nest_members);
        w.end_length(slot);
    }
    count += write_annotations(w, pool, "RuntimeVisibleAnnotations", &class.visible_annotations);
    count += write_annotations(
        w,
        pool,
        "RuntimeInvisibleAnnotations",
        &class.invisible_annotations,
    );
    count += write_type_annotations(
        w,
        pool,
        "RuntimeVisibleTypeAnnotations",
        &class.visible_type_annotations,
    );
    count += write_type_annotations(
        w,
        pool,
        "RuntimeInvisibleTypeAnnotations",
        &class.invisible_type_annotations,
    );
    if let Some(module) = &class.module {
        count += 1;
        write_module(w, pool, module);
    }
    if !class.module_packages.is_empty() {
        count += 1;
        let slot = attr(w, pool, "ModulePackages");
        w.write_u2(class.module_packages.len() as u16);
        for package in &class.module_packages {
            let index = pool.package(package);
            w.write_u2(index);
        }
        w.end_length(slot);
    }
    if let Some(main_class) = &class.module_main_class {
        count += 1;
        let slot = attr(w, pool, "ModuleMainClass");
        let index = pool.class(main_class);
        w.write_u2(index);
        w.end_length(slot);
    }
    if !class.inner_classes.is_empty() {
        count += 1;
        let slot = attr(w, pool, "InnerClasses");
        w.write_u2(class.inner_classes.len() as u16);
        for inner in &class.inner_classes {
            let inner_index = pool.class(&inner.inner);
            let outer_index = match &inner.outer {
                Some(outer) => pool.class(outer),
                None => 0,
            };
            let name_index = match &inner.inner_name {
                Some(name) => pool.utf8(name),
                None => 0,
            };
            w.write_u2(inner_index);
            w.write_u2(outer_index);
            w.write_u2(name_index);
            w.write_u2(inner.access_flags);
        }
        w.end_length(slot);
    }

    patch_u2(w, count_slot, count);
}

fn write_field(w: &mut ByteWriter, pool: &mut ConstPool, field: &FieldData) {
    w.write_u2(field.access_flags);
    let name = pool.utf8(&field.name);
    w.write_u2(name);
    let descriptor = pool.utf8(&field.descriptor);
    w.write_u2(descriptor);

    let count_slot = w.len();
    w.write_u2(0);
    let mut count = 0u16;

    if let Some(value) = &field.constant_value {
        count += 1;
        let slot = attr(w, pool, "ConstantValue");
        let index = match value {
            ConstantValueData::Int(v) => pool.integer(*v),
            ConstantValueData::Long(v) => pool.long(*v),
            ConstantValueData::Float(v) => pool.float(*v),
            ConstantValueData::Double(v) => pool.double(*v),
            ConstantValueData::String(v) => pool.string(v),
        };
        w.write_u2(index);
        w.end_length(slot);
    }
    if let Some(signature) = &field.signature {
        count += 1;
        write_signature(w, pool, signature);
    }
    if field.deprecated {
        count += 1;
        write_deprecated(w, pool);
    }
    count += write_annotations(w, pool, "RuntimeVisibleAnnotations", &field.visible_annotations);
    count += write_annotations(
        w,
        pool,
        "RuntimeInvisibleAnnotations",
        &field.invisible_annotations,
    );
    count += write_type_annotations(
        w,
        pool,
        "RuntimeVisibleTypeAnnotations",
        &field.visible_type_annotations,
    );
    count += write_type_annotations(
        w,
        pool,
        "RuntimeInvisibleTypeAnnotations",
        &field.invisible_type_annotations,
    );

    patch_u2(w, count_slot, count);
}

fn write_method(w: &mut ByteWriter, pool: &mut ConstPool, method: &MethodData) {
    w.write_u2(method.access_flags);
    let name = pool.utf8(&method.name);
    w.write_u2(name);
    let descriptor = pool.utf8(&method.descriptor);
    w.write_u2(descriptor);

    let count_slot = w.len();
    w.write_u2(0);
    let mut count = 0u16;

    if !method.exceptions.is_empty() {
        count += 1;
        let slot = attr(w, pool, "Exceptions");
        write_class_list(w, pool, &method.exceptions);
        w.end_length(slot);
    }
    if let Some(signature) = &method.signature {
        count += 1;
        write_signature(w, pool, signature);
    }
    let emit_parameters = method
        .parameters
        .iter()
        .any(|p| p.name.is_some() || p.access_flags != 0);
    if emit_parameters {
        count += 1;
        let slot = attr(w, pool, "MethodParameters");
        w.write_u1(method.parameters.len() as u8);
        for parameter in &method.parameters {
            let name_index = match &parameter.name {
                Some(name) => pool.utf8(name),
                None => 0,
            };
            w.write_u2(name_index);
            w.write_u2(parameter.access_flags);
        }
        w.end_length(slot);
    }
    if let Some(default) = &method.annotation_default {
        count += 1;
        let slot = attr(w, pool, "AnnotationDefault");
        write_element_value(w, pool, default);
        w.end_length(slot);
    }
    if method.deprecated {
        count += 1;
        write_deprecated(w, pool);
    }
    count += write_annotations(w, pool, "RuntimeVisibleAnnotations", &method.visible_annotations);
    count += write_annotations(
        w,
        pool,
        "RuntimeInvisibleAnnotations",
        &method.invisible_annotations,
    );
    count += write_parameter_annotations(
        w,
        pool,
        "RuntimeVisibleParameterAnnotations",
        &method.visible_parameter_annotations,
    );
    count += write_parameter_annotations(
        w,
        pool,
        "RuntimeInvisibleParameterAnnotations",
        &method.invisible_parameter_annotations,
    );
    count += write_type_annotations(
        w,
        pool,
        "RuntimeVisibleTypeAnnotations",
        &method.visible_type_annotations,
    );
    count += write_type_annotations(
        w,
        pool,
        "RuntimeInvisibleTypeAnnotations",
        &method.invisible_type_annotations,
    );

    patch_u2(w, count_slot, count);
}

fn write_record_component(w: &mut ByteWriter, pool: &mut ConstPool, component: &RecordComponentData) {
    let name = pool.utf8(&component.name);
    w.write_u2(name);
    let descriptor = pool.utf8(&component.descriptor);
    w.write_u2(descriptor);

    let count_slot = w.len();
    w.write_u2(0);
    let mut count = 0u16;

    if let Some(signature) = &component.signature {
        count += 1;
        write_signature(w, pool, signature);
    }
    count += write_annotations(
        w,
        pool,
        "RuntimeVisibleAnnotations",
        &component.visible_annotations,
    );
    count += write_annotations(
        w,
        pool,
        "RuntimeInvisibleAnnotations",
        &component.invisible_annotations,
    );
    count += write_type_annotations(
        w,
        pool,
        "RuntimeVisibleTypeAnnotations",
        &component.visible_type_annotations,
    );
    count += write_type_annotations(
        w,
        pool,
        "RuntimeInvisibleTypeAnnotations",
        &component.invisible_type_annotations,
    );

    patch_u2(w, count_slot, count);
}

fn write_module(w: &mut ByteWriter, pool: &mut ConstPool, module: &ModuleData) {
    let slot = attr(w, pool, "Module");

    let name = pool.module(&module.name);
    w.write_u2(name);
    w.write_u2(module.flags);
    let version = match &module.version {
        Some(version) => pool.utf8(version),
        None => 0,
    };
    w.write_u2(version);

    w.write_u2(module.requires.len() as u16);
    for require in &module.requires {
        let module_index = pool.module(&require.module);
        w.write_u2(module_index);
        w.write_u2(require.flags);
        let version_index = match &require.version {
            Some(version) => pool.utf8(version),
            None => 0,
        };
        w.write_u2(version_index);
    }

    for directives in [&module.exports, &module.opens] {
        w.write_u2(directives.len() as u16);
        for directive in directives {
            let package_index = pool.package(&directive.package);
            w.write_u2(package_index);
            w.write_u2(directive.flags);
            w.write_u2(directive.to.len() as u16);
            for to in &directive.to {
                let to_index = pool.module(to);
                w.write_u2(to_index);
            }
        }
    }

    write_class_list(w, pool, &module.uses);

    w.write_u2(module.provides.len() as u16);
    for provide in &module.provides {
        let service_index = pool.class(&provide.service);
        w.write_u2(service_index);
        write_class_list(w, pool, &provide.implementations);
    }

    w.end_length(slot);
}

fn write_annotations(
    w: &mut ByteWriter,
    pool: &mut ConstPool,
    name: &str,
    annotations: &[AnnotationData],
) -> u16 {
    if annotations.is_empty() {
        return 0;
    }
    let slot = attr(w, pool, name);
    w.write_u2(annotations.len() as u16);
    for annotation in annotations {
        write_annotation(w, pool, annotation);
    }
    w.end_length(slot);
    1
}

fn write_parameter_annotations(
    w: &mut ByteWriter,
    pool: &mut ConstPool,
    name: &str,
    parameters: &[Vec<AnnotationData>],
) -> u16 {
    if parameters.iter().all(|annotations| annotations.is_empty()) {
        return 0;
    }
    let slot = attr(w, pool, name);
    w.write_u1(parameters.len() as u8);
    for annotations in parameters {
        w.write_u2(annotations.len() as u16);
        for annotation in annotations {
            write_annotation(w, pool, annotation);
        }
    }
    w.end_length(slot);
    1
}

fn write_type_annotations(
    w: &mut ByteWriter,
    pool: &mut ConstPool,
    name: &str,
    annotations: &[TypeAnnotationData],
) -> u16 {
    if annotations.is_empty() {
        return 0;
    }
    let slot = attr(w, pool, name);
    w.write_u2(annotations.len() as u16);
    for annotation in annotations {
        write_target_info(w, annotation.target);
        w.write_u1(annotation.path.len() as u8);
        for step in &annotation.path {
            w.write_u1(step.kind);
            w.write_u1(step.index);
        }
        write_annotation(w, pool, &annotation.annotation);
    }
    w.end_length(slot);
    1
}

fn write_target_info(w: &mut ByteWriter, target: TargetInfoData) {
    match target {
        TargetInfoData::ClassTypeParameter(index) => {
            w.write_u1(0x00);
            w.write_u1(index);
        }
        TargetInfoData::MethodTypeParameter(index) => {
            w.write_u1(0x01);
            w.write_u1(index);
        }
        TargetInfoData::Supertype(index) => {
            w.write_u1(0x10);
            w.write_u2(index);
        }
        TargetInfoData::ClassTypeParameterBound { parameter, bound } => {
            w.write_u1(0x11);
            w.write_u1(parameter);
            w.write_u1(bound);
        }
        TargetInfoData::MethodTypeParameterBound { parameter, bound } => {
            w.write_u1(0x12);
            w.write_u1(parameter);
            w.write_u1(bound);
        }
        TargetInfoData::FieldType => w.write_u1(0x13),
        TargetInfoData::MethodReturn => w.write_u1(0x14),
        TargetInfoData::FormalParameter(index) => {
            w.write_u1(0x16);
            w.write_u1(index);
        }
        TargetInfoData::Throws(index) => {
            w.write_u1(0x17);
            w.write_u2(index);
        }
    }
}

fn write_annotation(w: &mut ByteWriter, pool: &mut ConstPool, annotation: &AnnotationData) {
    let type_index = pool.utf8(&annotation.type_descriptor);
    w.write_u2(type_index);
    w.write_u2(annotation.elements.len() as u16);
    for (name, value) in &annotation.elements {
        let name_index = pool.utf8(name);
        w.write_u2(name_index);
        write_element_value(w, pool, value);
    }
}

fn write_element_value(w: &mut ByteWriter, pool: &mut ConstPool, value: &ElementValueData) {
    match value {
        ElementValueData::Byte(v) => {
            w.write_u1(b'B');
            let index = pool.integer(*v as i32);
            w.write_u2(index);
        }
        ElementValueData::Char(v) => {
            w.write_u1(b'C');
            let index = pool.integer(*v as i32);
            w.write_u2(index);
        }
        ElementValueData::Short(v) => {
            w.write_u1(b'S');
            let index = pool.integer(*v as i32);
            w.write_u2(index);
        }
        ElementValueData::Int(v) => {
            w.write_u1(b'I');
            let index = pool.integer(*v);
            w.write_u2(index);
        }
        ElementValueData::Long(v) => {
            w.write_u1(b'J');
            let index = pool.long(*v);
            w.write_u2(index);
        }
        ElementValueData::Float(v) => {
            w.write_u1(b'F');
            let index = pool.float(*v);
            w.write_u2(index);
        }
        ElementValueData::Double(v) => {
            w.write_u1(b'D');
            let index = pool.double(*v);
            w.write_u2(index);
        }
        ElementValueData::Boolean(v) => {
            w.write_u1(b'Z');
            let index = pool.integer(*v as i32);
            w.write_u2(index);
        }
        ElementValueData::String(v) => {
            w.write_u1(b's');
            let index = pool.utf8(v);
            w.write_u2(index);
        }
        ElementValueData::Enum {
            type_descriptor,
            const_name,
        } => {
            w.write_u1(b'e');
            let type_index = pool.utf8(type_descriptor);
            w.write_u2(type_index);
            let const_index = pool.utf8(const_name);
            w.write_u2(const_index);
        }
        ElementValueData::Class(descriptor) => {
            w.write_u1(b'c');
            let index = pool.utf8(descriptor);
            w.write_u2(index);
        }
        ElementValueData::Annotation(nested) => {
            w.write_u1(b'@');
            write_annotation(w, pool, nested);
        }
        ElementValueData::Array(values) => {
            w.write_u1(b'[');
            w.write_u2(values.len() as u16);
            for value in values {
                write_element_value(w, pool, value);
            }
        }
    }
}

fn write_signature(w: &mut ByteWriter, pool: &mut ConstPool, signature: &str) {
    let slot = attr(w, pool, "Signature");
    let index = pool.utf8(signature);
    w.write_u2(index);
    w.end_length(slot);
}

fn write_deprecated(w: &mut ByteWriter, pool: &mut ConstPool) {
    let slot = attr(w, pool, "Deprecated");
    w.end_length(slot);
}

fn write_class_list(w: &mut ByteWriter, pool: &mut ConstPool, names: &[String]) {
    w.write_u2(names.len() as u16);
    for name in names {
        let index = pool.class(name);
        w.write_u2(index);
    }
}

fn attr(w: &mut ByteWriter, pool: &mut ConstPool, name: &str) -> crate::writer::LengthSlot {
    let index = pool.utf8(name);
    w.write_u2(index);
    w.begin_length()
}

fn patch_u2(w: &mut ByteWriter, pos: usize, count: u16) {
    w.patch_u2(pos, count);
}
