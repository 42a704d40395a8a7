//! Parsing class files back into the writable model.
//!
//! Javelin itself only writes class files; this reader exists so tests and
//! tooling can check what was emitted — signatures round-trip, constant
//! pools stay deduplicated, attributes land where they should. Unknown
//! attributes are skipped. `Code` is unknown by definition here.

use crate::classfile::{
    AnnotationData, ClassFile, ClassFileVersion, ConstantValueData, ElementValueData,
    EnclosingMethodData, FieldData, InnerClassData, MethodData, MethodParameterData,
    RecordComponentData,
};
use crate::error::{Error, Result};
use crate::mutf8;

/// A parsed class plus a raw view of its constant pool.
#[derive(Debug)]
pub struct ParsedClass {
    pub class: ClassFile,
    pub pool: PoolSummary,
}

/// Raw `(tag, payload)` pairs in pool order, plus the internal names of all
/// `Class` entries. Enough to check the dedup and closure invariants.
#[derive(Debug)]
pub struct PoolSummary {
    pub entries: Vec<(u8, Vec<u8>)>,
    pub class_names: Vec<String>,
}

pub fn parse_class_file(bytes: &[u8]) -> Result<ParsedClass> {
    let mut reader = Reader::new(bytes);
    let magic = reader.read_u4()?;
    if magic != crate::write::MAGIC {
        return Err(Error::InvalidMagic(magic));
    }
    let minor = reader.read_u2()?;
    let major = reader.read_u2()?;
    let pool = Pool::parse(&mut reader)?;

    let mut class = ClassFile {
        version: ClassFileVersion { major, minor },
        ..ClassFile::default()
    };
    class.access_flags = reader.read_u2()?;
    class.this_class = pool.class_name(reader.read_u2()?)?;
    let super_index = reader.read_u2()?;
    class.super_class = if super_index == 0 {
        None
    } else {
        Some(pool.class_name(super_index)?)
    };

    let interfaces = reader.read_u2()? as usize;
    for _ in 0..interfaces {
        class.interfaces.push(pool.class_name(reader.read_u2()?)?);
    }

    let fields = reader.read_u2()? as usize;
    for _ in 0..fields {
        class.fields.push(parse_field(&mut reader, &pool)?);
    }
    let methods = reader.read_u2()? as usize;
    for _ in 0..methods {
        class.methods.push(parse_method(&mut reader, &pool)?);
    }

    parse_class_attributes(&mut reader, &pool, &mut class)?;
    reader.ensure_empty()?;

    Ok(ParsedClass {
        class,
        pool: pool.summary(),
    })
}

fn parse_field(reader: &mut Reader<'_>, pool: &Pool) -> Result<FieldData> {
    let access_flags = reader.read_u2()?;
    let name = pool.utf8(reader.read_u2()?)?;
    let descriptor = pool.utf8(reader.read_u2()?)?;
    let mut field = FieldData {
        access_flags,
        name,
        descriptor,
        signature: None,
        constant_value: None,
        deprecated: false,
        visible_annotations: Vec::new(),
        invisible_annotations: Vec::new(),
        visible_type_annotations: Vec::new(),
        invisible_type_annotations: Vec::new(),
    };
    each_attribute(reader, pool, |name, sub, pool| {
        match name {
            "ConstantValue" => field.constant_value = Some(pool.constant_value(sub.read_u2()?)?),
            "Signature" => field.signature = Some(pool.utf8(sub.read_u2()?)?),
            "Deprecated" => field.deprecated = true,
            "RuntimeVisibleAnnotations" => {
                field.visible_annotations = parse_annotations(sub, pool)?;
            }
            "RuntimeInvisibleAnnotations" => {
                field.invisible_annotations = parse_annotations(sub, pool)?;
            }
            _ => {}
        }
        Ok(())
    })?;
    Ok(field)
}

fn parse_method(reader: &mut Reader<'_>, pool: &Pool) -> Result<MethodData> {
    let access_flags = reader.read_u2()?;
    let name = pool.utf8(reader.read_u2()?)?;
    let descriptor = pool.utf8(reader.read_u2()?)?;
    let mut method = MethodData {
        access_flags,
        name,
        descriptor,
        signature: None,
        exceptions: Vec::new(),
        parameters: Vec::new(),
        annotation_default: None,
        deprecated: false,
        visible_annotations: Vec::new(),
        invisible_annotations: Vec::new(),
        visible_parameter_annotations: Vec::new(),
        invisible_parameter_annotations: Vec::new(),
        visible_type_annotations: Vec::new(),
        invisible_type_annotations: Vec::new(),
    };
    each_attribute(reader, pool, |name, sub, pool| {
        match name {
            "Exceptions" => {
                let count = sub.read_u2()? as usize;
                for _ in 0..count {
                    method.exceptions.push(pool.class_name(sub.read_u2()?)?);
                }
            }
            "Signature" => method.signature = Some(pool.utf8(sub.read_u2()?)?),
            "MethodParameters" => {
                let count = sub.read_u1()? as usize;
                for _ in 0..count {
                    let name_index = sub.read_u2()?;
                    let name = if name_index == 0 {
                        None
                    } else {
                        Some(pool.utf8(name_index)?)
                    };
                    method.parameters.push(MethodParameterData {
                        name,
                        access_flags: sub.read_u2()?,
                    });
                }
            }
            "AnnotationDefault" => {
                method.annotation_default = Some(parse_element_value(sub, pool)?);
            }
            "Deprecated" => method.deprecated = true,
            "RuntimeVisibleAnnotations" => {
                method.visible_annotations = parse_annotations(sub, pool)?;
            }
            "RuntimeInvisibleAnnotations" => {
                method.invisible_annotations = parse_annotations(sub, pool)?;
            }
            "RuntimeVisibleParameterAnnotations" => {
                method.visible_parameter_annotations = parse_parameter_annotations(sub, pool)?;
            }
            "RuntimeInvisibleParameterAnnotations" => {
                method.invisible_parameter_annotations = parse_parameter_annotations(sub, pool)?;
            }
            _ => {}
        }
        Ok(())
    })?;
    Ok(method)
}

fn parse_class_attributes(
    reader: &mut Reader<'_>,
    pool: &Pool,
    class: &mut ClassFile,
) -> Result<()> {
    each_attribute(reader, pool, |name, sub, pool| {
        match name {
            "Signature" => class.signature = Some(pool.utf8(sub.read_u2()?)?),
            "Deprecated" => class.deprecated = true,
            "EnclosingMethod" => {
                let class_name = pool.class_name(sub.read_u2()?)?;
                let method_index = sub.read_u2()?;
                let method = if method_index == 0 {
                    None
                } else {
                    Some(pool.name_and_type(method_index)?)
                };
                class.enclosing_method = Some(EnclosingMethodData {
                    class: class_name,
                    method,
                });
            }
            "InnerClasses" => {
                let count = sub.read_u2()? as usize;
                for _ in 0..count {
                    let inner = pool.class_name(sub.read_u2()?)?;
                    let outer_index = sub.read_u2()?;
                    let outer = if outer_index == 0 {
                        None
                    } else {
                        Some(pool.class_name(outer_index)?)
                    };
                    let name_index = sub.read_u2()?;
                    let inner_name = if name_index == 0 {
                        None
                    } else {
                        Some(pool.utf8(name_index)?)
                    };
                    class.inner_classes.push(InnerClassData {
                        inner,
                        outer,
                        inner_name,
                        access_flags: sub.read_u2()?,
                    });
                }
            }
            "Record" => {
                let count = sub.read_u2()? as usize;
                let mut components = Vec::with_capacity(count);
                for _ in 0..count {
                    components.push(parse_record_component(sub, pool)?);
                }
                class.record_components = Some(components);
            }
            "PermittedSubclasses" => {
                let count = sub.read_u2()? as usize;
                for _ in 0..count {
                    class
                        .permitted_subclasses
                        .push(pool.class_name(sub.read_u2()?)?);
                }
            }
            "NestHost" => class.nest_host = Some(pool.class_name(sub.read_u2()?)?),
            "NestMembers" => {
                let count = sub.read_u2()? as usize;
                for _ in 0..count {
                    class.nest_members.push(pool.class_name(sub.read_u2()?)?);
                }
            }
            "RuntimeVisibleAnnotations" => {
                class.visible_annotations = parse_annotations(sub, pool)?;
            }
            "RuntimeInvisibleAnnotations" => {
                class.invisible_annotations = parse_annotations(sub, pool)?;
            }
            _ => {}
        }
        Ok(())
    })
}

fn parse_record_component(reader: &mut Reader<'_>, pool: &Pool) -> Result<RecordComponentData> {
    let name = pool.utf8(reader.read_u2()?)?;
    let descriptor = pool.utf8(reader.read_u2()?)?;
    let mut component = RecordComponentData {
        name,
        descriptor,
        signature: None,
        visible_annotations: Vec::new(),
        invisible_annotations: Vec::new(),
        visible_type_annotations: Vec::new(),
        invisible_type_annotations: Vec::new(),
    };
    each_attribute(reader, pool, |name, sub, pool| {
        match name {
            "Signature" => component.signature = Some(pool.utf8(sub.read_u2()?)?),
            "RuntimeVisibleAnnotations" => {
                component.visible_annotations = parse_annotations(sub, pool)?;
            }
            "RuntimeInvisibleAnnotations" => {
                component.invisible_annotations = parse_annotations(sub, pool)?;
            }
            _ => {}
        }
        Ok(())
    })?;
    Ok(component)
}

fn parse_annotations(reader: &mut Reader<'_>, pool: &Pool) -> Result<Vec<AnnotationData>> {
    let count = reader.read_u2()? as usize;
    let mut annotations = Vec::with_capacity(count);
    for _ in 0..count {
        annotations.push(parse_annotation(reader, pool)?);
    }
    Ok(annotations)
}

fn parse_parameter_annotations(
    reader: &mut Reader<'_>,
    pool: &Pool,
) -> Result<Vec<Vec<AnnotationData>>> {
    let count = reader.read_u1()? as usize;
    let mut parameters = Vec::with_capacity(count);
    for _ in 0..count {
        parameters.push(parse_annotations(reader, pool)?);
    }
    Ok(parameters)
}

fn parse_annotation(reader: &mut Reader<'_>, pool: &Pool) -> Result<AnnotationData> {
    let type_descriptor = pool.utf8(reader.read_u2()?)?;
    let pairs = reader.read_u2()? as usize;
    let mut elements = Vec::with_capacity(pairs);
    for _ in 0..pairs {
        let name = pool.utf8(reader.read_u2()?)?;
        elements.push((name, parse_element_value(reader, pool)?));
    }
    Ok(AnnotationData {
        type_descriptor,
        elements,
    })
}

fn parse_element_value(reader: &mut Reader<'_>, pool: &Pool) -> Result<ElementValueData> {
    let tag = reader.read_u1()?;
    Ok(match tag {
        b'B' => ElementValueData::Byte(pool.integer(reader.read_u2()?)? as i8),
        b'C' => ElementValueData::Char(pool.integer(reader.read_u2()?)? as u16),
        b'S' => ElementValueData::Short(pool.integer(reader.read_u2()?)? as i16),
        b'I' => ElementValueData::Int(pool.integer(reader.read_u2()?)?),
        b'J' => ElementValueData::Long(pool.long(reader.read_u2()?)?),
        b'F' => ElementValueData::Float(pool.float(reader.read_u2()?)?),
        b'D' => ElementValueData::Double(pool.double(reader.read_u2()?)?),
        b'Z' => ElementValueData::Boolean(pool.integer(reader.read_u2()?)? != 0),
        b's' => ElementValueData::String(pool.utf8(reader.read_u2()?)?),
        b'e' => ElementValueData::Enum {
            type_descriptor: pool.utf8(reader.read_u2()?)?,
            const_name: pool.utf8(reader.read_u2()?)?,
        },
        b'c' => ElementValueData::Class(pool.utf8(reader.read_u2()?)?),
        b'@' => ElementValueData::Annotation(Box::new(parse_annotation(reader, pool)?)),
        b'[' => {
            let count = reader.read_u2()? as usize;
            let mut values = Vec::with_capacity(count);
            for _ in 0..count {
                values.push(parse_element_value(reader, pool)?);
            }
            ElementValueData::Array(values)
        }
        _ => return Err(Error::MalformedAttribute("element_value")),
    })
}

/// Runs a callback for each attribute of the current member, handing it a
/// sub-reader over the attribute payload.
fn each_attribute<F>(reader: &mut Reader<'_>, pool: &Pool, mut f: F) -> Result<()>
where
    F: FnMut(&str, &mut Reader<'_>, &Pool) -> Result<()>,
{
    let count = reader.read_u2()? as usize;
    for _ in 0..count {
        let name_index = reader.read_u2()?;
        let length = reader.read_u4()? as usize;
        let payload = reader.read_bytes(length)?;
        let name = pool.utf8(name_index)?;
        let mut sub = Reader::new(payload);
        f(&name, &mut sub, pool)?;
    }
    Ok(())
}

// === The constant pool, read side ===========================================

#[derive(Debug, Clone)]
enum PoolEntry {
    Utf8(String),
    Integer(i32),
    Float(f32),
    Long(i64),
    Double(f64),
    Class(u16),
    String(u16),
    NameAndType(u16, u16),
    Ref(u8, u16, u16),
    MethodHandle(u8, u16),
    MethodType(u16),
    Dynamic(u8, u16, u16),
    Module(u16),
    Package(u16),
}

struct Pool {
    entries: Vec<Option<(u8, PoolEntry, Vec<u8>)>>,
}

impl Pool {
    fn parse(reader: &mut Reader<'_>) -> Result<Self> {
        let count = reader.read_u2()? as usize;
        if count == 0 {
            return Err(Error::Other("constant_pool_count must be >= 1"));
        }
        let mut entries = vec![None; count];
        let mut i = 1usize;
        while i < count {
            let tag = reader.read_u1()?;
            let start = reader.pos();
            let entry = match tag {
                1 => {
                    let len = reader.read_u2()? as usize;
                    let bytes = reader.read_bytes(len)?;
                    PoolEntry::Utf8(mutf8::decode(bytes).map_err(|()| Error::InvalidModifiedUtf8)?)
                }
                3 => PoolEntry::Integer(reader.read_u4()? as i32),
                4 => PoolEntry::Float(f32::from_bits(reader.read_u4()?)),
                5 => PoolEntry::Long(reader.read_u8()? as i64),
                6 => PoolEntry::Double(f64::from_bits(reader.read_u8()?)),
                7 => PoolEntry::Class(reader.read_u2()?),
                8 => PoolEntry::String(reader.read_u2()?),
                9 | 10 | 11 => PoolEntry::Ref(tag, reader.read_u2()?, reader.read_u2()?),
                12 => PoolEntry::NameAndType(reader.read_u2()?, reader.read_u2()?),
                15 => PoolEntry::MethodHandle(reader.read_u1()?, reader.read_u2()?),
                16 => PoolEntry::MethodType(reader.read_u2()?),
                17 | 18 => PoolEntry::Dynamic(tag, reader.read_u2()?, reader.read_u2()?),
                19 => PoolEntry::Module(reader.read_u2()?),
                20 => PoolEntry::Package(reader.read_u2()?),
                other => return Err(Error::InvalidConstantPoolTag(other)),
            };
            let payload = reader.slice_from(start).to_vec();
            let double_width = matches!(entry, PoolEntry::Long(_) | PoolEntry::Double(_));
            entries[i] = Some((tag, entry, payload));
            i += if double_width { 2 } else { 1 };
            if double_width && i > count {
                return Err(Error::Other("malformed constant pool"));
            }
        }
        Ok(Self { entries })
    }

    fn get(&self, index: u16) -> Result<&PoolEntry> {
        self.entries
            .get(index as usize)
            .and_then(|slot| slot.as_ref())
            .map(|(_, entry, _)| entry)
            .ok_or(Error::InvalidConstantPoolIndex(index))
    }

    fn utf8(&self, index: u16) -> Result<String> {
        match self.get(index)? {
            PoolEntry::Utf8(text) => Ok(text.clone()),
            _ => Err(Error::ConstantPoolTypeMismatch {
                index,
                expected: "Utf8",
            }),
        }
    }

    fn class_name(&self, index: u16) -> Result<String> {
        match self.get(index)? {
            PoolEntry::Class(name) => self.utf8(*name),
            _ => Err(Error::ConstantPoolTypeMismatch {
                index,
                expected: "Class",
            }),
        }
    }

    fn name_and_type(&self, index: u16) -> Result<(String, String)> {
        match self.get(index)? {
            PoolEntry::NameAndType(name, descriptor) => {
                Ok((self.utf8(*name)?, self.utf8(*descriptor)?))
            }
            _ => Err(Error::ConstantPoolTypeMismatch {
                index,
                expected: "NameAndType",
            }),
        }
    }

    fn integer(&self, index: u16) -> Result<i32> {
        match self.get(index)? {
            PoolEntry::Integer(value) => Ok(*value),
            _ => Err(Error::ConstantPoolTypeMismatch {
                index,
                expected: "Integer",
            }),
        }
    }

    fn long(&self, index: u16) -> Result<i64> {
        match self.get(index)? {
            PoolEntry::Long(value) => Ok(*value),
            _ => Err(Error::ConstantPoolTypeMismatch {
                index,
                expected: "Long",
            }),
        }
    }

    fn float(&self, index: u16) -> Result<f32> {
        match self.get(index)? {
            PoolEntry::Float(value) => Ok(*value),
            _ => Err(Error::ConstantPoolTypeMismatch {
                index,
                expected: "Float",
            }),
        }
    }

    fn double(&self, index: u16) -> Result<f64> {
        match self.get(index)? {
            PoolEntry::Double(value) => Ok(*value),
            _ => Err(Error::ConstantPoolTypeMismatch {
                index,
                expected: "Double",
            }),
        }
    }

    fn constant_value(&self, index: u16) -> Result<ConstantValueData> {
        Ok(match self.get(index)? {
            PoolEntry::Integer(value) => ConstantValueData::Int(*value),
            PoolEntry::Long(value) => ConstantValueData::Long(*value),
            PoolEntry::Float(value) => ConstantValueData::Float(*value),
            PoolEntry::Double(value) => ConstantValueData::Double(*value),
            PoolEntry::String(utf8) => ConstantValueData::String(self.utf8(*utf8)?),
            _ => {
                return Err(Error::ConstantPoolTypeMismatch {
                    index,
                    expected: "loadable constant",
                })
            }
        })
    }

    fn summary(&self) -> PoolSummary {
        let mut entries = Vec::new();
        let mut class_names = Vec::new();
        for slot in self.entries.iter().flatten() {
            let (tag, entry, payload) = slot;
            entries.push((*tag, payload.clone()));
            if let PoolEntry::Class(name) = entry {
                if let Ok(name) = self.utf8(*name) {
                    class_names.push(name);
                }
            }
        }
        PoolSummary {
            entries,
            class_names,
        }
    }
}

// === Byte-level reader =======================================================

struct Reader<'a> {
    bytes: &'a [u8],
    pos: usize,
}

impl<'a> Reader<'a> {
    fn new(bytes: &'a [u8]) -> Self {
        Self { bytes, pos: 0 }
    }

    fn pos(&self) -> usize {
        self.pos
    }

    fn slice_from(&self, start: usize) -> &'a [u8] {
        &self.bytes[start..self.pos]
    }

    fn read_u1(&mut self) -> Result<u8> {
        let byte = *self.bytes.get(self.pos).ok_or(Error::UnexpectedEof)?;
        self.pos += 1;
        Ok(byte)
    }

    fn read_u2(&mut self) -> Result<u16> {
        Ok(u16::from_be_bytes(self.read_array::<2>()?))
    }

    fn read_u4(&mut self) -> Result<u32> {
        Ok(u32::from_be_bytes(self.read_array::<4>()?))
    }

    fn read_u8(&mut self) -> Result<u64> {
        Ok(u64::from_be_bytes(self.read_array::<8>()?))
    }

    fn read_bytes(&mut self, len: usize) -> Result<&'a [u8]> {
        let end = self.pos.checked_add(len).ok_or(Error::UnexpectedEof)?;
        if end > self.bytes.len() {
            return Err(Error::UnexpectedEof);
        }
        let slice = &self.bytes[self.pos..end];
        self.pos = end;
        Ok(slice)
    }

    fn ensure_empty(&self) -> Result<()> {
        if self.pos >= self.bytes.len() {
            Ok(())
        } else {
            Err(Error::Other("unexpected trailing bytes"))
        }
    }

    fn read_array<const N: usize>(&mut self) -> Result<[u8; N]> {
        let mut out = [0u8; N];
        out.copy_from_slice(self.read_bytes(N)?);
        Ok(out)
    }
}
