//! Bound-class representations.
//!
//! A class progresses through three monotonic stages: *header-bound*
//! (supertypes and type-parameter bounds), *member-bound* (fields, methods,
//! nested classes with resolved types), *const-bound* (constant fields folded
//! and annotation values evaluated). The binder's internal tables realize the
//! staging; [`TypeBoundClass`] is the completed form that leaves the binder
//! and is also the shape classpath environments supply for already-compiled
//! classes.

use javelin_core::{ClassFlags, FieldFlags, MethodFlags, Name, ParamFlags, Span};
use javelin_tree as tree;

use crate::consts::Const;
use crate::sym::{ClassSymbol, FieldSymbol, MethodSymbol, TyVarSymbol};
use crate::types::{IntersectionType, Type};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ClassKind {
    Class,
    Interface,
    Enum,
    Annotation,
    Record,
}

impl ClassKind {
    pub fn is_interface_like(self) -> bool {
        matches!(self, ClassKind::Interface | ClassKind::Annotation)
    }
}

/// A resolved annotation use.
///
/// Between member binding and constant binding the element values are not yet
/// evaluated; `tree` holds the argument expressions until the constant stage
/// rewrites them into `values` and drops the tree.
#[derive(Debug, Clone)]
pub struct AnnoInfo {
    pub sym: ClassSymbol,
    pub tree: Option<Box<tree::Anno>>,
    /// `(element name, value)` pairs in source order. Order is kept for
    /// debuggability and does not affect semantics.
    pub values: Vec<(Name, Const)>,
}

impl AnnoInfo {
    pub fn unevaluated(sym: ClassSymbol, tree: tree::Anno) -> Self {
        Self {
            sym,
            tree: Some(Box::new(tree)),
            values: Vec::new(),
        }
    }

    pub fn evaluated(sym: ClassSymbol, values: Vec<(Name, Const)>) -> Self {
        Self {
            sym,
            tree: None,
            values,
        }
    }

    pub fn value(&self, name: &str) -> Option<&Const> {
        self.values
            .iter()
            .find(|(element, _)| element.as_str() == name)
            .map(|(_, value)| value)
    }
}

// The retained tree is a transient evaluation input, not part of the
// annotation's identity.
impl PartialEq for AnnoInfo {
    fn eq(&self, other: &Self) -> bool {
        self.sym == other.sym && self.values == other.values
    }
}

/// Bounds and annotations of one type parameter.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct TyVarInfo {
    pub upper_bound: IntersectionType,
    pub annos: Vec<AnnoInfo>,
}

/// The header-bound portion of a class: everything needed to resolve names
/// *through* it without touching its members.
#[derive(Debug, Clone, PartialEq)]
pub struct ClassHeader {
    pub kind: ClassKind,
    pub access: ClassFlags,
    pub owner: Option<ClassSymbol>,
    /// Ordered type parameters with their bound info.
    pub type_params: Vec<(TyVarSymbol, TyVarInfo)>,
    /// `None` only for `java/lang/Object` (and interfaces, whose class-file
    /// superclass is filled in by the lowerer).
    pub super_class: Option<Type>,
    pub interfaces: Vec<Type>,
    pub permits: Vec<ClassSymbol>,
    /// Directly nested classes, in declared order.
    pub children: Vec<(Name, ClassSymbol)>,
}

impl ClassHeader {
    pub fn child(&self, name: &str) -> Option<&ClassSymbol> {
        self.children
            .iter()
            .find(|(child, _)| child.as_str() == name)
            .map(|(_, sym)| sym)
    }

    pub fn type_param(&self, name: &str) -> Option<&TyVarSymbol> {
        self.type_params
            .iter()
            .find(|(sym, _)| sym.name.as_str() == name)
            .map(|(sym, _)| sym)
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct FieldInfo {
    pub sym: FieldSymbol,
    pub ty: Type,
    pub access: FieldFlags,
    pub annos: Vec<AnnoInfo>,
    /// Constant initializer expression, held between member binding and
    /// constant evaluation. `static final` fields of primitive or string type
    /// get their folded result in `value`.
    pub init: Option<Box<tree::Expr>>,
    pub value: Option<Const>,
    pub span: Span,
}

#[derive(Debug, Clone, PartialEq)]
pub struct ParamInfo {
    pub name: Name,
    pub ty: Type,
    pub access: ParamFlags,
    pub annos: Vec<AnnoInfo>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct MethodInfo {
    pub sym: MethodSymbol,
    pub access: MethodFlags,
    pub type_params: Vec<(TyVarSymbol, TyVarInfo)>,
    pub ret: Type,
    pub params: Vec<ParamInfo>,
    pub throws: Vec<Type>,
    pub annos: Vec<AnnoInfo>,
    /// Default expression of an annotation element, until the constant stage
    /// folds it into `default_value`.
    pub default_expr: Option<Box<tree::Expr>>,
    pub default_value: Option<Const>,
    pub span: Span,
}

#[derive(Debug, Clone, PartialEq)]
pub struct RecordComponentInfo {
    pub name: Name,
    pub ty: Type,
    pub annos: Vec<AnnoInfo>,
}

/// A fully bound class.
#[derive(Debug, Clone, PartialEq)]
pub struct TypeBoundClass {
    pub header: ClassHeader,
    pub fields: Vec<FieldInfo>,
    pub methods: Vec<MethodInfo>,
    pub components: Vec<RecordComponentInfo>,
    pub annos: Vec<AnnoInfo>,
}

impl TypeBoundClass {
    pub fn field(&self, name: &str) -> Option<&FieldInfo> {
        self.fields
            .iter()
            .find(|field| field.sym.name.as_str() == name)
    }

    pub fn method(&self, name: &str) -> Option<&MethodInfo> {
        self.methods
            .iter()
            .find(|method| method.sym.name.as_str() == name)
    }
}
