//! Binding pass for modules.

use javelin_core::{DiagnosticKind, ModuleFlags, Name, RequiresFlags};
use javelin_tree as tree;
use tracing::debug;

use crate::binder::{Binder, TypeCtx};
use crate::bound::AnnoInfo;
use crate::env::Env;
use crate::lookup::LookupKey;
use crate::module::{ExportInfo, ModuleInfo, ProvideInfo, RequireInfo};
use crate::sym::{ClassSymbol, ModuleSymbol};

impl Binder<'_> {
    pub fn bind_modules(&mut self) {
        let units = self.units;
        for (unit, comp_unit) in units.iter().enumerate() {
            let Some(decl) = &comp_unit.module else {
                continue;
            };
            let info = self.bind_module(unit, decl);
            debug!(module = %info.name, "bound module");
            self.modules.push(info);
        }
    }

    fn bind_module(&mut self, unit: usize, decl: &tree::ModDecl) -> ModuleInfo {
        // A module unit has no class context; resolution runs through the
        // unit scope only.
        let ctx = TypeCtx::class(ClassSymbol::new("module-info"), unit);

        let mut annos: Vec<AnnoInfo> = Vec::new();
        for anno in &decl.annos {
            let key = LookupKey::new(anno.name.clone());
            if let Some(sym) = self.resolve_class(&ctx, anno.span, &key) {
                let info = AnnoInfo::unevaluated(sym, anno.clone());
                annos.push(self.eval_anno(&ctx, info));
            }
        }

        let mut flags = ModuleFlags::EMPTY;
        if decl.open {
            flags |= ModuleFlags::OPEN;
        }

        let mut requires = Vec::new();
        let mut exports = Vec::new();
        let mut opens = Vec::new();
        let mut uses = Vec::new();
        let mut provides = Vec::new();
        let mut requires_java_base = false;
        for directive in &decl.directives {
            match directive {
                tree::ModDirective::Requires { mods, module, span } => {
                    requires_java_base |= module.as_str() == "java.base";
                    let mut require_flags = RequiresFlags::EMPTY;
                    for modifier in mods {
                        match modifier {
                            tree::Modifier::Transitive => {
                                require_flags |= RequiresFlags::TRANSITIVE;
                            }
                            // The `static` keyword on requires is the
                            // static-phase bit, not the member static bit.
                            tree::Modifier::Static => {
                                require_flags |= RequiresFlags::STATIC_PHASE;
                            }
                            other => {
                                self.diag(
                                    unit,
                                    *span,
                                    DiagnosticKind::IllegalModifier,
                                    format!("modifier {other:?} not allowed on requires"),
                                );
                            }
                        }
                    }
                    let version = self.module_version(module);
                    requires.push(RequireInfo {
                        module: module.clone(),
                        flags: require_flags,
                        version,
                    });
                }
                tree::ModDirective::Exports { package, to, .. } => {
                    exports.push(ExportInfo {
                        package: package.as_str().replace('.', "/"),
                        to: to.clone(),
                    });
                }
                tree::ModDirective::Opens { package, to, .. } => {
                    opens.push(ExportInfo {
                        package: package.as_str().replace('.', "/"),
                        to: to.clone(),
                    });
                }
                tree::ModDirective::Uses { ty, span } => {
                    if let Some(sym) =
                        self.resolve_class(&ctx, *span, &LookupKey::new(ty.clone()))
                    {
                        uses.push(sym);
                    }
                }
                tree::ModDirective::Provides { ty, impls, span } => {
                    let Some(service) =
                        self.resolve_class(&ctx, *span, &LookupKey::new(ty.clone()))
                    else {
                        continue;
                    };
                    let mut implementations = Vec::new();
                    for implementation in impls {
                        if let Some(sym) = self.resolve_class(
                            &ctx,
                            *span,
                            &LookupKey::new(implementation.clone()),
                        ) {
                            implementations.push(sym);
                        }
                    }
                    provides.push(ProvideInfo {
                        service,
                        implementations,
                    });
                }
            }
        }

        if !requires_java_base {
            // Everything requires java.base, explicitly or implicitly.
            let version = self.java_base_version(unit, decl);
            requires.insert(
                0,
                RequireInfo {
                    module: Name::from("java.base"),
                    flags: RequiresFlags::MANDATED,
                    version,
                },
            );
        }

        ModuleInfo {
            name: decl.name.clone(),
            version: self.opts.module_version.clone(),
            flags,
            annos,
            requires,
            exports,
            opens,
            uses,
            provides,
        }
    }

    fn module_version(&self, module: &Name) -> Option<String> {
        let env = self.module_env?;
        let info = env.get(&ModuleSymbol::new(module.clone()))?;
        info.version.clone()
    }

    fn java_base_version(&mut self, unit: usize, decl: &tree::ModDecl) -> Option<String> {
        match self.module_env {
            Some(env) => match env.get(&ModuleSymbol::java_base()) {
                Some(info) => info.version.clone(),
                None => {
                    self.diag(
                        unit,
                        decl.span,
                        DiagnosticKind::ModuleNotFound,
                        "java.base not found in the module environment",
                    );
                    None
                }
            },
            None => None,
        }
    }
}
