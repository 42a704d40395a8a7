//! Class-file writing for Javelin.
//!
//! This crate is the format layer: a writable [`ClassFile`] model, the
//! deduplicating [`ConstPool`] builder, byte-exact serialization of every
//! header-level attribute, and the generic signature grammar (model, writer
//! and parser). It knows nothing about binding; the binder lowers its bound
//! classes into this model.

pub mod classfile;
pub mod error;
pub mod mutf8;
pub mod pool;
pub mod read;
pub mod sig;
pub mod write;
pub mod writer;

pub use classfile::{
    AnnotationData, ClassFile, ClassFileVersion, ConstantValueData, ElementValueData,
    EnclosingMethodData, ExportData, FieldData, InnerClassData, MethodData, MethodParameterData,
    ModuleData, ProvideData, RecordComponentData, RequireData, TargetInfoData, TypeAnnotationData,
    TypePathStep,
};
pub use error::{Error, Result};
pub use pool::ConstPool;
pub use read::{parse_class_file, ParsedClass, PoolSummary};
pub use write::{write_class_file, write_class_file_with_pool, MAGIC};
pub use writer::ByteWriter;
