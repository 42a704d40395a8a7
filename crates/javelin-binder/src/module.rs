//! The bound module model.

use javelin_core::{ModuleFlags, Name, RequiresFlags};

use crate::bound::AnnoInfo;
use crate::sym::ClassSymbol;

/// A bound `module-info`.
///
/// After binding, exactly one `requires` entry names `java.base`: the binder
/// synthesizes it with the mandated flag when source omits it.
#[derive(Debug, Clone, PartialEq)]
pub struct ModuleInfo {
    /// Dotted module name.
    pub name: Name,
    pub version: Option<String>,
    pub flags: ModuleFlags,
    pub annos: Vec<AnnoInfo>,
    pub requires: Vec<RequireInfo>,
    pub exports: Vec<ExportInfo>,
    pub opens: Vec<ExportInfo>,
    pub uses: Vec<ClassSymbol>,
    pub provides: Vec<ProvideInfo>,
}

impl ModuleInfo {
    /// A minimal module description, as a module env entry for modules only
    /// known by name and version (e.g. `java.base` from a JDK image).
    pub fn named(name: impl Into<Name>, version: Option<String>) -> Self {
        Self {
            name: name.into(),
            version,
            flags: ModuleFlags::EMPTY,
            annos: Vec::new(),
            requires: Vec::new(),
            exports: Vec::new(),
            opens: Vec::new(),
            uses: Vec::new(),
            provides: Vec::new(),
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct RequireInfo {
    pub module: Name,
    pub flags: RequiresFlags,
    /// Version of the required module, when the module env knows it.
    pub version: Option<String>,
}

/// An `exports` or `opens` directive.
#[derive(Debug, Clone, PartialEq)]
pub struct ExportInfo {
    /// Internal (slash-separated) package name.
    pub package: String,
    /// Qualified target modules; empty means unqualified.
    pub to: Vec<Name>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct ProvideInfo {
    pub service: ClassSymbol,
    pub implementations: Vec<ClassSymbol>,
}
