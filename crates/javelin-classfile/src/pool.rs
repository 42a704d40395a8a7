//! The constant pool builder.
//!
//! Entries are assigned indices in first-insertion order and deduplicated by
//! `(tag, payload)`: interning the same string twice yields the same `Utf8`
//! index, and a `Class` entry dedups through its underlying `Utf8`. `Long`
//! and `Double` entries occupy two index slots.

use std::collections::HashMap;

use crate::mutf8;
use crate::writer::ByteWriter;

/// One constant pool entry. Sub-references are stored as resolved indices so
/// structural equality is exactly `(tag, payload)` equality; `f32`/`f64`
/// payloads are stored as raw bits to keep equality byte-exact.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
enum Entry {
    Utf8(String),
    Integer(i32),
    Float(u32),
    Long(i64),
    Double(u64),
    Class(u16),
    String(u16),
    NameAndType(u16, u16),
    FieldRef(u16, u16),
    MethodRef(u16, u16),
    InterfaceMethodRef(u16, u16),
    MethodHandle(u8, u16),
    MethodType(u16),
    InvokeDynamic(u16, u16),
    Module(u16),
    Package(u16),
}

impl Entry {
    fn slots(&self) -> u16 {
        match self {
            Entry::Long(_) | Entry::Double(_) => 2,
            _ => 1,
        }
    }
}

#[derive(Debug, Default)]
pub struct ConstPool {
    entries: Vec<Entry>,
    indices: HashMap<Entry, u16>,
    /// Index the next entry will receive; the pool count is one past the
    /// highest used slot.
    next: u16,
}

impl ConstPool {
    pub fn new() -> Self {
        Self {
            entries: Vec::new(),
            indices: HashMap::new(),
            next: 1,
        }
    }

    fn insert(&mut self, entry: Entry) -> u16 {
        if let Some(&index) = self.indices.get(&entry) {
            return index;
        }
        let index = self.next;
        self.next += entry.slots();
        self.indices.insert(entry.clone(), index);
        self.entries.push(entry);
        index
    }

    pub fn utf8(&mut self, text: &str) -> u16 {
        self.insert(Entry::Utf8(text.to_owned()))
    }

    pub fn integer(&mut self, value: i32) -> u16 {
        self.insert(Entry::Integer(value))
    }

    pub fn float(&mut self, value: f32) -> u16 {
        self.insert(Entry::Float(value.to_bits()))
    }

    pub fn long(&mut self, value: i64) -> u16 {
        self.insert(Entry::Long(value))
    }

    pub fn double(&mut self, value: f64) -> u16 {
        self.insert(Entry::Double(value.to_bits()))
    }

    /// A `Class` entry for an internal name such as `java/lang/Object`.
    pub fn class(&mut self, internal_name: &str) -> u16 {
        let name = self.utf8(internal_name);
        self.insert(Entry::Class(name))
    }

    pub fn string(&mut self, value: &str) -> u16 {
        let utf8 = self.utf8(value);
        self.insert(Entry::String(utf8))
    }

    pub fn name_and_type(&mut self, name: &str, descriptor: &str) -> u16 {
        let name = self.utf8(name);
        let descriptor = self.utf8(descriptor);
        self.insert(Entry::NameAndType(name, descriptor))
    }

    pub fn field_ref(&mut self, class: &str, name: &str, descriptor: &str) -> u16 {
        let class = self.class(class);
        let nat = self.name_and_type(name, descriptor);
        self.insert(Entry::FieldRef(class, nat))
    }

    pub fn method_ref(&mut self, class: &str, name: &str, descriptor: &str) -> u16 {
        let class = self.class(class);
        let nat = self.name_and_type(name, descriptor);
        self.insert(Entry::MethodRef(class, nat))
    }

    pub fn interface_method_ref(&mut self, class: &str, name: &str, descriptor: &str) -> u16 {
        let class = self.class(class);
        let nat = self.name_and_type(name, descriptor);
        self.insert(Entry::InterfaceMethodRef(class, nat))
    }

    pub fn method_handle(&mut self, reference_kind: u8, reference: u16) -> u16 {
        self.insert(Entry::MethodHandle(reference_kind, reference))
    }

    pub fn method_type(&mut self, descriptor: &str) -> u16 {
        let descriptor = self.utf8(descriptor);
        self.insert(Entry::MethodType(descriptor))
    }

    pub fn invoke_dynamic(&mut self, bootstrap_method: u16, name: &str, descriptor: &str) -> u16 {
        let nat = self.name_and_type(name, descriptor);
        self.insert(Entry::InvokeDynamic(bootstrap_method, nat))
    }

    /// A `Module` entry for a dotted module name.
    pub fn module(&mut self, name: &str) -> u16 {
        let name = self.utf8(name);
        self.insert(Entry::Module(name))
    }

    /// A `Package` entry for an internal (slash-separated) package name.
    pub fn package(&mut self, internal_name: &str) -> u16 {
        let name = self.utf8(internal_name);
        self.insert(Entry::Package(name))
    }

    /// The `constant_pool_count` value: one past the highest used slot.
    pub fn count(&self) -> u16 {
        self.next
    }

    /// Internal names of every `Class` entry, in pool order.
    pub fn class_entries(&self) -> Vec<&str> {
        let mut utf8_by_index = HashMap::new();
        let mut index = 1u16;
        for entry in &self.entries {
            if let Entry::Utf8(text) = entry {
                utf8_by_index.insert(index, text.as_str());
            }
            index += entry.slots();
        }
        self.entries
            .iter()
            .filter_map(|entry| match entry {
                Entry::Class(name) => utf8_by_index.get(name).copied(),
                _ => None,
            })
            .collect()
    }

    pub fn write(&self, w: &mut ByteWriter) {
        w.write_u2(self.count());
        for entry in &self.entries {
            match entry {
                Entry::Utf8(text) => {
                    let encoded = mutf8::encode(text);
                    w.write_u1(1);
                    w.write_u2(encoded.len() as u16);
                    w.write_bytes(&encoded);
                }
                Entry::Integer(value) => {
                    w.write_u1(3);
                    w.write_u4(*value as u32);
                }
                Entry::Float(bits) => {
                    w.write_u1(4);
                    w.write_u4(*bits);
                }
                Entry::Long(value) => {
                    w.write_u1(5);
                    w.write_u8(*value as u64);
                }
                Entry::Double(bits) => {
                    w.write_u1(6);
                    w.write_u8(*bits);
                }
                Entry::Class(name) => {
                    w.write_u1(7);
                    w.write_u2(*name);
                }
                Entry::String(utf8) => {
                    w.write_u1(8);
                    w.write_u2(*utf8);
                }
                Entry::FieldRef(class, nat) => {
                    w.write_u1(9);
                    w.write_u2(*class);
                    w.write_u2(*nat);
                }
                Entry::MethodRef(class, nat) => {
                    w.write_u1(10);
                    w.write_u2(*class);
                    w.write_u2(*nat);
                }
                Entry::InterfaceMethodRef(class, nat) => {
                    w.write_u1(11);
                    w.write_u2(*class);
                    w.write_u2(*nat);
                }
                Entry::NameAndType(name, descriptor) => {
                    w.write_u1(12);
                    w.write_u2(*name);
                    w.write_u2(*descriptor);
                }
                Entry::MethodHandle(kind, reference) => {
                    w.write_u1(15);
                    w.write_u1(*kind);
                    w.write_u2(*reference);
                }
                Entry::MethodType(descriptor) => {
                    w.write_u1(16);
                    w.write_u2(*descriptor);
                }
                Entry::InvokeDynamic(bootstrap, nat) => {
                    w.write_u1(18);
                    w.write_u2(*bootstrap);
                    w.write_u2(*nat);
                }
                Entry::Module(name) => {
                    w.write_u1(19);
                    w.write_u2(*name);
                }
                Entry::Package(name) => {
                    w.write_u1(20);
                    w.write_u2(*name);
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn identical_strings_share_one_utf8_entry() {
        let mut pool = ConstPool::new();
        let a = pool.utf8("java/lang/Object");
        let b = pool.class("java/lang/Object");
        let c = pool.utf8("java/lang/Object");
        assert_eq!(a, 1);
        assert_eq!(b, 2);
        assert_eq!(a, c);
        assert_eq!(pool.count(), 3);
    }

    #[test]
    fn class_entries_dedup_through_utf8() {
        let mut pool = ConstPool::new();
        let a = pool.class("test/Foo");
        let b = pool.class("test/Foo");
        assert_eq!(a, b);
        assert_eq!(pool.class_entries(), vec!["test/Foo"]);
    }

    #[test]
    fn long_and_double_take_two_slots() {
        let mut pool = ConstPool::new();
        let long = pool.long(42);
        let after = pool.integer(1);
        assert_eq!(long, 1);
        assert_eq!(after, 3);
        let double = pool.double(1.5);
        assert_eq!(double, 4);
        assert_eq!(pool.count(), 6);
    }

    #[test]
    fn refs_share_substructure() {
        let mut pool = ConstPool::new();
        let field = pool.field_ref("test/Foo", "x", "I");
        let method = pool.method_ref("test/Foo", "x", "I");
        // Different tags are distinct entries even with equal payloads.
        assert_ne!(field, method);
        // Re-inserting either returns the original index.
        assert_eq!(pool.field_ref("test/Foo", "x", "I"), field);
        assert!(pool.interface_method_ref("test/Foo", "x", "I") > method);
        assert_eq!(pool.method_type("(I)V"), pool.method_type("(I)V"));
        assert_eq!(pool.method_handle(1, field), pool.method_handle(1, field));
        assert_eq!(
            pool.invoke_dynamic(0, "apply", "()V"),
            pool.invoke_dynamic(0, "apply", "()V")
        );
    }

    #[test]
    fn floats_dedup_by_bits() {
        let mut pool = ConstPool::new();
        assert_eq!(pool.float(0.0), pool.float(0.0));
        assert_ne!(pool.float(0.0), pool.float(-0.0));
        assert_eq!(pool.double(f64::NAN), pool.double(f64::NAN));
    }
}
