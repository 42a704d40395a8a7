//! The parsed tree model consumed by the binder.
//!
//! Javelin does not parse source text; a front end produces these trees. The
//! model is deliberately flat — plain structs and closed enums with a `Span`
//! on every node — so the binder has a single match site per transformation.
//! Only declaration-level syntax is represented: method bodies never appear
//! here, and expressions are restricted to the constant grammar (literals,
//! operators, references, casts, array initializers, class literals and
//! annotation literals).

use javelin_core::{LineMap, Name, PrimitiveKind, Span};

/// One parsed source file.
#[derive(Debug, Clone, PartialEq)]
pub struct CompUnit {
    /// Path of the source file, used for diagnostics.
    pub file: Name,
    /// Line table of the original text, used to render diagnostic positions.
    pub line_map: LineMap,
    pub package: Option<PackageDecl>,
    pub imports: Vec<Import>,
    pub decls: Vec<TyDecl>,
    /// Present iff this unit is a `module-info`.
    pub module: Option<ModDecl>,
}

impl CompUnit {
    pub fn new(file: impl Into<Name>) -> Self {
        Self {
            file: file.into(),
            line_map: LineMap::empty(),
            package: None,
            imports: Vec::new(),
            decls: Vec::new(),
            module: None,
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct PackageDecl {
    /// Package name segments, e.g. `["com", "example"]`.
    pub name: Vec<Name>,
    pub annos: Vec<Anno>,
    pub span: Span,
}

#[derive(Debug, Clone, PartialEq)]
pub struct Import {
    pub is_static: bool,
    /// `import a.b.*;` as opposed to `import a.b.C;`.
    pub wildcard: bool,
    pub path: Vec<Name>,
    pub span: Span,
}

/// Source-level modifier keywords, prior to translation into access flags.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Modifier {
    Public,
    Protected,
    Private,
    Abstract,
    Static,
    Final,
    Sealed,
    NonSealed,
    Strictfp,
    Native,
    Synchronized,
    Transient,
    Volatile,
    Default,
    /// On a `requires` directive only.
    Transitive,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TyKind {
    Class,
    Interface,
    Enum,
    Annotation,
    Record,
}

/// A class, interface, enum, annotation or record declaration.
#[derive(Debug, Clone, PartialEq)]
pub struct TyDecl {
    pub kind: TyKind,
    pub name: Name,
    pub mods: Vec<Modifier>,
    pub annos: Vec<Anno>,
    pub type_params: Vec<TyParamDecl>,
    /// `extends` clause of a class or enum. Interface super-interfaces go in
    /// `implements`.
    pub extends: Option<TyRef>,
    pub implements: Vec<TyRef>,
    /// `permits` clause of a sealed declaration.
    pub permits: Vec<TyRef>,
    /// Record header components, in declared order.
    pub components: Vec<ComponentDecl>,
    /// Members in declared source order.
    pub members: Vec<MemberDecl>,
    pub span: Span,
}

impl TyDecl {
    pub fn new(kind: TyKind, name: impl Into<Name>) -> Self {
        Self {
            kind,
            name: name.into(),
            mods: Vec::new(),
            annos: Vec::new(),
            type_params: Vec::new(),
            extends: None,
            implements: Vec::new(),
            permits: Vec::new(),
            components: Vec::new(),
            members: Vec::new(),
            span: Span::point(0),
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum MemberDecl {
    Field(FieldDecl),
    Method(MethodDecl),
    /// An enum constant. Constructor arguments and constant class bodies are
    /// body-level syntax and do not appear in the tree.
    EnumConstant(EnumConstantDecl),
    Type(TyDecl),
}

#[derive(Debug, Clone, PartialEq)]
pub struct FieldDecl {
    pub mods: Vec<Modifier>,
    pub annos: Vec<Anno>,
    pub ty: TyRef,
    pub name: Name,
    /// Initializer expression, when it is part of the constant grammar. The
    /// binder only consults this for `static final` fields.
    pub init: Option<Expr>,
    pub span: Span,
}

#[derive(Debug, Clone, PartialEq)]
pub struct MethodDecl {
    pub mods: Vec<Modifier>,
    pub annos: Vec<Anno>,
    pub type_params: Vec<TyParamDecl>,
    pub ret: TyRef,
    pub name: Name,
    pub params: Vec<ParamDecl>,
    pub throws: Vec<TyRef>,
    /// Default value of an annotation element (`int y() default 1;`).
    pub default: Option<Expr>,
    /// Whether the declaration had a body in source. Bodies themselves are
    /// never represented.
    pub has_body: bool,
    pub span: Span,
}

#[derive(Debug, Clone, PartialEq)]
pub struct ParamDecl {
    pub mods: Vec<Modifier>,
    pub annos: Vec<Anno>,
    pub ty: TyRef,
    pub name: Name,
    /// The `...` marker; only valid on the last parameter.
    pub variadic: bool,
    pub span: Span,
}

#[derive(Debug, Clone, PartialEq)]
pub struct ComponentDecl {
    pub annos: Vec<Anno>,
    pub ty: TyRef,
    pub name: Name,
    pub span: Span,
}

#[derive(Debug, Clone, PartialEq)]
pub struct EnumConstantDecl {
    pub annos: Vec<Anno>,
    pub name: Name,
    pub span: Span,
}

#[derive(Debug, Clone, PartialEq)]
pub struct TyParamDecl {
    pub name: Name,
    pub annos: Vec<Anno>,
    /// `T extends A & B` bounds, in source order.
    pub bounds: Vec<TyRef>,
    pub span: Span,
}

/// A source type reference.
#[derive(Debug, Clone, PartialEq)]
pub enum TyRef {
    Prim {
        kind: PrimitiveKind,
        annos: Vec<Anno>,
        span: Span,
    },
    Void {
        span: Span,
    },
    /// A possibly qualified, possibly parameterized name such as
    /// `java.util.Map.Entry<K, V>`. Segments carry their own type arguments
    /// and annotations.
    Named {
        segments: Vec<TyRefSegment>,
        span: Span,
    },
    Array {
        elem: Box<TyRef>,
        annos: Vec<Anno>,
        span: Span,
    },
}

impl TyRef {
    pub fn span(&self) -> Span {
        match self {
            TyRef::Prim { span, .. }
            | TyRef::Void { span }
            | TyRef::Named { span, .. }
            | TyRef::Array { span, .. } => *span,
        }
    }

    /// An unannotated, unparameterized name reference.
    pub fn named(path: &[&str]) -> Self {
        let segments = path
            .iter()
            .map(|name| TyRefSegment {
                name: Name::from(*name),
                targs: Vec::new(),
                annos: Vec::new(),
            })
            .collect();
        TyRef::Named {
            segments,
            span: Span::point(0),
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct TyRefSegment {
    pub name: Name,
    pub targs: Vec<TyArg>,
    pub annos: Vec<Anno>,
}

#[derive(Debug, Clone, PartialEq)]
pub enum TyArg {
    Ty(TyRef),
    Wild {
        bound: WildBound,
        annos: Vec<Anno>,
        span: Span,
    },
}

#[derive(Debug, Clone, PartialEq)]
pub enum WildBound {
    None,
    Extends(TyRef),
    Super(TyRef),
}

/// An annotation use, e.g. `@Anno(value = 1)`.
#[derive(Debug, Clone, PartialEq)]
pub struct Anno {
    /// Possibly qualified annotation type name.
    pub name: Vec<Name>,
    /// `(element-name, value)` pairs; a `None` name is the positional `value`
    /// shorthand.
    pub args: Vec<(Option<Name>, Expr)>,
    pub span: Span,
}

impl Anno {
    pub fn new(path: &[&str]) -> Self {
        Self {
            name: path.iter().map(|name| Name::from(*name)).collect(),
            args: Vec::new(),
            span: Span::point(0),
        }
    }
}

/// The constant expression grammar.
#[derive(Debug, Clone, PartialEq)]
pub enum Expr {
    Literal {
        value: Lit,
        span: Span,
    },
    Unary {
        op: UnOp,
        operand: Box<Expr>,
        span: Span,
    },
    Binary {
        op: BinOp,
        lhs: Box<Expr>,
        rhs: Box<Expr>,
        span: Span,
    },
    Conditional {
        cond: Box<Expr>,
        then: Box<Expr>,
        orelse: Box<Expr>,
        span: Span,
    },
    Cast {
        ty: TyRef,
        expr: Box<Expr>,
        span: Span,
    },
    Paren {
        expr: Box<Expr>,
        span: Span,
    },
    /// A possibly qualified reference to a `static final` field or enum
    /// constant, e.g. `CONST` or `java.lang.Integer.MAX_VALUE`.
    Ref {
        path: Vec<Name>,
        span: Span,
    },
    /// `Foo.class`, `int[].class`, ...
    ClassLiteral {
        ty: TyRef,
        span: Span,
    },
    /// `{1, 2, 3}` in an annotation argument or constant initializer.
    ArrayInit {
        elements: Vec<Expr>,
        span: Span,
    },
    /// A nested annotation literal in an annotation argument.
    Anno(Anno),
}

impl Expr {
    pub fn span(&self) -> Span {
        match self {
            Expr::Literal { span, .. }
            | Expr::Unary { span, .. }
            | Expr::Binary { span, .. }
            | Expr::Conditional { span, .. }
            | Expr::Cast { span, .. }
            | Expr::Paren { span, .. }
            | Expr::Ref { span, .. }
            | Expr::ClassLiteral { span, .. }
            | Expr::ArrayInit { span, .. } => *span,
            Expr::Anno(anno) => anno.span,
        }
    }

    pub fn int(value: i32) -> Self {
        Expr::Literal {
            value: Lit::Int(value),
            span: Span::point(0),
        }
    }

    pub fn string(value: impl Into<String>) -> Self {
        Expr::Literal {
            value: Lit::String(value.into()),
            span: Span::point(0),
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum Lit {
    Bool(bool),
    /// A `char` literal as a UTF-16 code unit.
    Char(u16),
    Int(i32),
    Long(i64),
    Float(f32),
    Double(f64),
    String(String),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UnOp {
    /// Unary `+`.
    Plus,
    /// Unary `-`.
    Neg,
    /// Bitwise `~`.
    BitNot,
    /// Logical `!`.
    Not,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BinOp {
    Add,
    Sub,
    Mul,
    Div,
    Rem,
    Shl,
    Shr,
    UShr,
    Lt,
    Gt,
    Le,
    Ge,
    Eq,
    Ne,
    BitAnd,
    BitXor,
    BitOr,
    AndAnd,
    OrOr,
}

/// A `module-info` declaration.
#[derive(Debug, Clone, PartialEq)]
pub struct ModDecl {
    pub annos: Vec<Anno>,
    pub open: bool,
    /// Dotted module name, e.g. `com.example.app`.
    pub name: Name,
    pub directives: Vec<ModDirective>,
    pub span: Span,
}

#[derive(Debug, Clone, PartialEq)]
pub enum ModDirective {
    Requires {
        /// `transitive` and/or `static`.
        mods: Vec<Modifier>,
        module: Name,
        span: Span,
    },
    Exports {
        /// Dotted package name.
        package: Name,
        to: Vec<Name>,
        span: Span,
    },
    Opens {
        package: Name,
        to: Vec<Name>,
        span: Span,
    },
    Uses {
        /// Qualified service type name as simple-name segments.
        ty: Vec<Name>,
        span: Span,
    },
    Provides {
        ty: Vec<Name>,
        impls: Vec<Vec<Name>>,
        span: Span,
    },
}

impl ModDirective {
    pub fn span(&self) -> Span {
        match self {
            ModDirective::Requires { span, .. }
            | ModDirective::Exports { span, .. }
            | ModDirective::Opens { span, .. }
            | ModDirective::Uses { span, .. }
            | ModDirective::Provides { span, .. } => *span,
        }
    }
}
