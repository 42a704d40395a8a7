//! The bound type representation.

use std::fmt;

use javelin_core::PrimitiveKind;

use crate::bound::AnnoInfo;
use crate::sym::{ClassSymbol, TyVarSymbol};

/// A bound Java type. Closed union; transformations match once.
#[derive(Debug, Clone, PartialEq)]
pub enum Type {
    Class(ClassType),
    Array(ArrayType),
    TyVar(TyVarType),
    Prim(PrimType),
    Wild(WildType),
    Void,
    Intersection(IntersectionType),
    /// Sentinel for unresolved names. Propagates without crashing; later
    /// stages treat it as a type with no members.
    Error,
}

impl Type {
    pub fn object() -> Type {
        Type::class(ClassSymbol::object())
    }

    pub fn string() -> Type {
        Type::class(ClassSymbol::new("java/lang/String"))
    }

    /// An unparameterized, unannotated class type.
    pub fn class(sym: ClassSymbol) -> Type {
        Type::Class(ClassType {
            classes: vec![SimpleClassType {
                sym,
                targs: Vec::new(),
                annos: Vec::new(),
            }],
        })
    }

    pub fn prim(kind: PrimitiveKind) -> Type {
        Type::Prim(PrimType {
            kind,
            annos: Vec::new(),
        })
    }

    pub fn array(elem: Type) -> Type {
        Type::Array(ArrayType {
            elem: Box::new(elem),
            annos: Vec::new(),
        })
    }

    pub fn is_error(&self) -> bool {
        matches!(self, Type::Error)
    }

    /// The class symbol of a class type (its innermost part).
    pub fn class_sym(&self) -> Option<&ClassSymbol> {
        match self {
            Type::Class(class) => Some(class.sym()),
            _ => None,
        }
    }
}

/// A class type as a non-empty chain of simple parts, outermost enclosing
/// class first. Parts whose enclosing class has no type parameters may be
/// collapsed into the innermost part; the signature lowering re-expands the
/// chain when any enclosing part is parameterized.
#[derive(Debug, Clone, PartialEq)]
pub struct ClassType {
    pub classes: Vec<SimpleClassType>,
}

impl ClassType {
    /// The innermost part's symbol: the class this type refers to.
    pub fn sym(&self) -> &ClassSymbol {
        &self.classes.last().expect("class type has no parts").sym
    }

    pub fn is_parameterized(&self) -> bool {
        self.classes.iter().any(|part| !part.targs.is_empty())
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct SimpleClassType {
    pub sym: ClassSymbol,
    pub targs: Vec<Type>,
    pub annos: Vec<AnnoInfo>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct ArrayType {
    pub elem: Box<Type>,
    pub annos: Vec<AnnoInfo>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct TyVarType {
    pub sym: TyVarSymbol,
    pub annos: Vec<AnnoInfo>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct PrimType {
    pub kind: PrimitiveKind,
    pub annos: Vec<AnnoInfo>,
}

#[derive(Debug, Clone, PartialEq)]
pub enum WildType {
    Unbounded {
        annos: Vec<AnnoInfo>,
    },
    Upper {
        bound: Box<Type>,
        annos: Vec<AnnoInfo>,
    },
    Lower {
        bound: Box<Type>,
        annos: Vec<AnnoInfo>,
    },
}

/// An intersection of bounds. Only appears as a type-parameter bound; the
/// first element may be a type variable, the rest are class types.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct IntersectionType {
    pub bounds: Vec<Type>,
}

// The Display output is for debugging only and deliberately loose:
// `test/Outer<java/lang/Object>.Inner<java/lang/Object>`.
impl fmt::Display for Type {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Type::Class(class) => {
                let mut first = true;
                for part in &class.classes {
                    if first {
                        write!(f, "{}", part.sym.binary_name())?;
                    } else {
                        write!(f, ".{}", part.sym.simple_name())?;
                    }
                    first = false;
                    if !part.targs.is_empty() {
                        f.write_str("<")?;
                        for (i, targ) in part.targs.iter().enumerate() {
                            if i > 0 {
                                f.write_str(", ")?;
                            }
                            write!(f, "{targ}")?;
                        }
                        f.write_str(">")?;
                    }
                }
                Ok(())
            }
            Type::Array(array) => write!(f, "{}[]", array.elem),
            Type::TyVar(tyvar) => f.write_str(tyvar.sym.name.as_str()),
            Type::Prim(prim) => f.write_str(prim.kind.as_str()),
            Type::Wild(WildType::Unbounded { .. }) => f.write_str("?"),
            Type::Wild(WildType::Upper { bound, .. }) => write!(f, "? extends {bound}"),
            Type::Wild(WildType::Lower { bound, .. }) => write!(f, "? super {bound}"),
            Type::Void => f.write_str("void"),
            Type::Intersection(intersection) => {
                for (i, bound) in intersection.bounds.iter().enumerate() {
                    if i > 0 {
                        f.write_str(" & ")?;
                    }
                    write!(f, "{bound}")?;
                }
                Ok(())
            }
            Type::Error => f.write_str("<error>"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn display_is_debug_friendly() {
        let ty = Type::Class(ClassType {
            classes: vec![
                SimpleClassType {
                    sym: ClassSymbol::new("test/Outer"),
                    targs: vec![Type::object()],
                    annos: Vec::new(),
                },
                SimpleClassType {
                    sym: ClassSymbol::new("test/Outer$Inner"),
                    targs: vec![Type::object()],
                    annos: Vec::new(),
                },
            ],
        });
        assert_eq!(
            ty.to_string(),
            "test/Outer<java/lang/Object>.Inner<java/lang/Object>"
        );
    }
}
