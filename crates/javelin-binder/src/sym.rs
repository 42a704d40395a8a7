//! Symbols: stable identity keys for named entities.
//!
//! Symbols carry no resolved information. Everything a symbol *means* lives
//! in an [`Env`](crate::env::Env) keyed by it, which is how cyclic graphs
//! (hierarchies, bounds, constants) are represented without owning pointers.

use javelin_core::Name;

/// A class, keyed by its binary internal name: slash-separated packages,
/// `$`-separated nesting, e.g. `java/util/Map$Entry`.
#[derive(Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ClassSymbol(Name);

impl ClassSymbol {
    pub fn new(binary_name: impl Into<Name>) -> Self {
        Self(binary_name.into())
    }

    pub fn object() -> Self {
        Self::new("java/lang/Object")
    }

    pub fn binary_name(&self) -> &str {
        self.0.as_str()
    }

    /// The simple name: everything after the last `/` and `$`.
    pub fn simple_name(&self) -> &str {
        let name = self.0.as_str();
        let name = name.rsplit('/').next().unwrap_or(name);
        name.rsplit('$').next().unwrap_or(name)
    }

    /// The slash-separated package prefix, empty for the default package.
    pub fn package(&self) -> &str {
        match self.0.as_str().rfind('/') {
            Some(i) => &self.0.as_str()[..i],
            None => "",
        }
    }

    /// A child symbol for a nested class declared in this one.
    pub fn nested(&self, simple_name: &str) -> ClassSymbol {
        ClassSymbol::new(format!("{}${}", self.binary_name(), simple_name))
    }
}

impl std::fmt::Debug for ClassSymbol {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_tuple("ClassSymbol").field(&self.0.as_str()).finish()
    }
}

impl std::fmt::Display for ClassSymbol {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.binary_name())
    }
}

/// The declaration a type variable belongs to.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum TyVarOwner {
    Class(ClassSymbol),
    Method(MethodSymbol),
}

/// A type variable, keyed by owner and name.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct TyVarSymbol {
    pub owner: TyVarOwner,
    pub name: Name,
}

impl TyVarSymbol {
    pub fn class_owned(owner: ClassSymbol, name: impl Into<Name>) -> Self {
        Self {
            owner: TyVarOwner::Class(owner),
            name: name.into(),
        }
    }

    pub fn method_owned(owner: MethodSymbol, name: impl Into<Name>) -> Self {
        Self {
            owner: TyVarOwner::Method(owner),
            name: name.into(),
        }
    }
}

/// A field, keyed by owner class and name.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct FieldSymbol {
    pub owner: ClassSymbol,
    pub name: Name,
}

impl FieldSymbol {
    pub fn new(owner: ClassSymbol, name: impl Into<Name>) -> Self {
        Self {
            owner,
            name: name.into(),
        }
    }
}

/// A method, keyed by owner class, name and erased descriptor. The
/// descriptor disambiguates overloads and is stable under substitution.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct MethodSymbol {
    pub owner: ClassSymbol,
    pub name: Name,
    pub descriptor: String,
}

impl MethodSymbol {
    pub fn new(owner: ClassSymbol, name: impl Into<Name>, descriptor: impl Into<String>) -> Self {
        Self {
            owner,
            name: name.into(),
            descriptor: descriptor.into(),
        }
    }
}

/// A module, keyed by its dotted name.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ModuleSymbol(Name);

impl ModuleSymbol {
    pub fn new(name: impl Into<Name>) -> Self {
        Self(name.into())
    }

    pub fn java_base() -> Self {
        Self::new("java.base")
    }

    pub fn name(&self) -> &str {
        self.0.as_str()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn class_symbol_name_parts() {
        let sym = ClassSymbol::new("java/util/Map$Entry");
        assert_eq!(sym.binary_name(), "java/util/Map$Entry");
        assert_eq!(sym.simple_name(), "Entry");
        assert_eq!(sym.package(), "java/util");
        assert_eq!(sym.nested("Iter").binary_name(), "java/util/Map$Entry$Iter");

        let default_package = ClassSymbol::new("Outer");
        assert_eq!(default_package.package(), "");
        assert_eq!(default_package.simple_name(), "Outer");
    }

    #[test]
    fn symbols_compare_by_identity_data() {
        let a = FieldSymbol::new(ClassSymbol::new("test/Foo"), "CONST");
        let b = FieldSymbol::new(ClassSymbol::new("test/Foo"), "CONST");
        assert_eq!(a, b);

        let m1 = MethodSymbol::new(ClassSymbol::new("test/Foo"), "f", "(I)V");
        let m2 = MethodSymbol::new(ClassSymbol::new("test/Foo"), "f", "(J)V");
        assert_ne!(m1, m2);
    }
}
