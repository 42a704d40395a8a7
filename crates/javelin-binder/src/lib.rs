//! Binding and lowering for Javelin.
//!
//! The pipeline takes parsed compilation units plus a classpath env and
//! produces API-only class files: package binding (symbol minting), hierarchy
//! binding with cycle detection, type-parameter binding, member binding,
//! constant evaluation, module binding, then lowering to bytes. Recoverable
//! problems become diagnostics and sentinel results; only violated internal
//! invariants abort the pipeline.
//!
//! ```no_run
//! use javelin_binder::{bind, ClassSymbol, EmitOptions, SimpleEnv, TypeBoundClass};
//! use javelin_tree::CompUnit;
//!
//! let units: Vec<CompUnit> = vec![/* parsed by a front end */];
//! let classpath: SimpleEnv<ClassSymbol, TypeBoundClass> = SimpleEnv::new();
//! let output = bind(&units, &classpath, None, None, &EmitOptions::default()).unwrap();
//! for (name, _bytes) in &output.classes {
//!     println!("{name}");
//! }
//! ```

mod binder;
pub mod bound;
pub mod consts;
mod consteval;
mod deps;
pub mod env;
pub mod lookup;
mod lower;
mod modbind;
pub mod module;
pub mod sym;
pub mod types;

use std::collections::{BTreeMap, BTreeSet};
use std::sync::Arc;

use javelin_classfile::ClassFileVersion;
use javelin_core::Diagnostic;
use javelin_tree as tree;
use tracing::debug;

pub use bound::{
    AnnoInfo, ClassHeader, ClassKind, FieldInfo, MethodInfo, ParamInfo, RecordComponentInfo,
    TyVarInfo, TypeBoundClass,
};
pub use consts::{Const, ConstValue};
pub use deps::ClasspathBytes;
pub use env::{CompoundEnv, Env, SimpleEnv};
pub use module::{ExportInfo, ModuleInfo, ProvideInfo, RequireInfo};
pub use sym::{ClassSymbol, FieldSymbol, MethodSymbol, ModuleSymbol, TyVarOwner, TyVarSymbol};
pub use types::{
    ArrayType, ClassType, IntersectionType, PrimType, SimpleClassType, TyVarType, Type, WildType,
};

/// Lowers a bound type to its generic signature string.
///
/// This is the signature-writer path the lowerer uses for every `Signature`
/// attribute, exposed directly for tooling and tests.
pub fn type_signature(ty: &Type) -> String {
    javelin_classfile::sig::write_type(&lower::sig::type_sig(ty))
}

/// Options for the emitted artifacts.
#[derive(Debug, Clone, Default)]
pub struct EmitOptions {
    pub version: ClassFileVersion,
    /// Version stamped on bound modules.
    pub module_version: Option<String>,
}

/// Everything one compilation produces.
#[derive(Debug)]
pub struct BoundOutput {
    /// Internal name to class-file bytes, deterministically ordered.
    pub classes: BTreeMap<String, Vec<u8>>,
    /// Verbatim copies of referenced classpath classes.
    pub transitive: BTreeMap<String, Vec<u8>>,
    /// Every classpath symbol the produced headers reference.
    pub referenced: BTreeSet<ClassSymbol>,
    /// The bound form of every source class.
    pub bound: BTreeMap<ClassSymbol, Arc<TypeBoundClass>>,
    /// Bound modules, in unit order.
    pub modules: Vec<ModuleInfo>,
    /// Recorded diagnostics. A compilation with any diagnostic has failed;
    /// callers must not publish its outputs.
    pub diagnostics: Vec<Diagnostic>,
}

impl BoundOutput {
    pub fn ok(&self) -> bool {
        self.diagnostics.is_empty()
    }
}

/// A violated structural invariant. Unlike diagnostics these abort the
/// pipeline immediately; they indicate a bug, not bad input.
#[derive(Debug, thiserror::Error)]
pub enum BinderError {
    #[error("internal assertion: {0}")]
    Internal(String),
}

/// Binds and lowers a set of compilation units against a classpath.
pub fn bind(
    units: &[tree::CompUnit],
    classpath: &dyn Env<ClassSymbol, TypeBoundClass>,
    classpath_bytes: Option<&dyn ClasspathBytes>,
    module_env: Option<&dyn Env<ModuleSymbol, ModuleInfo>>,
    opts: &EmitOptions,
) -> Result<BoundOutput, BinderError> {
    let mut binder = binder::Binder::new(units, classpath, module_env, opts);
    debug!(units = units.len(), "binding");

    binder.bind_packages();
    binder.check_hierarchy_cycles();
    binder.bind_headers();
    binder.bind_members();
    binder.bind_consts();
    binder.bind_modules();

    // Staging invariant: every minted symbol must have completed all three
    // stages before lowering begins.
    for sym in &binder.order {
        if binder.bound.get(sym).is_none() {
            return Err(BinderError::Internal(format!(
                "{sym} was minted but never fully bound"
            )));
        }
    }

    let classes = lower::lower_all(&binder);
    let (referenced, transitive) = deps::collect_transitive(&binder, classpath_bytes);

    let mut bound = BTreeMap::new();
    for sym in &binder.order {
        if let Some(class) = binder.bound.get(sym) {
            bound.insert(sym.clone(), class);
        }
    }

    let modules = std::mem::take(&mut binder.modules);
    let diagnostics = binder.sink.into_vec();
    Ok(BoundOutput {
        classes,
        transitive,
        referenced,
        bound,
        modules,
        diagnostics,
    })
}
