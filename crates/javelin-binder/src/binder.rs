//! The binding pipeline: package pass, hierarchy pass, type-parameter pass,
//! member pass.
//!
//! Stages are monotonic. The package pass mints every [`ClassSymbol`] up
//! front; the hierarchy pass resolves direct supertypes to symbols lazily
//! with an in-progress set for cycle detection; the header pass then binds
//! type parameters and full supertype types; the member pass binds fields,
//! methods and record components. Constant folding lives in `consteval`,
//! module binding in `modbind`, lowering in `lower`.

use std::collections::{HashMap, HashSet};
use std::sync::Arc;

use javelin_core::{
    ClassFlags, Diagnostic, DiagnosticKind, DiagnosticSink, FieldFlags, MethodFlags, Name,
    ParamFlags, PrimitiveKind, Span,
};
use javelin_tree as tree;
use tracing::debug;

use crate::bound::{
    AnnoInfo, ClassHeader, ClassKind, FieldInfo, MethodInfo, ParamInfo, RecordComponentInfo,
    TyVarInfo, TypeBoundClass,
};
use crate::consts::Const;
use crate::env::{Env, SimpleEnv};
use crate::lookup::{ImportIndex, LookupKey};
use crate::module::ModuleInfo;
use crate::sym::{ClassSymbol, FieldSymbol, MethodSymbol, ModuleSymbol, TyVarSymbol};
use crate::types::{
    ArrayType, ClassType, IntersectionType, PrimType, SimpleClassType, TyVarType, Type, WildType,
};
use crate::EmitOptions;

/// A source class registered by the package pass.
#[derive(Clone)]
pub(crate) struct SourceClass {
    pub unit: usize,
    pub decl: Arc<tree::TyDecl>,
    pub owner: Option<ClassSymbol>,
    pub kind: ClassKind,
    pub children: Vec<(Name, ClassSymbol)>,
}

/// Direct supertypes resolved to symbols only; enough to walk hierarchies
/// for member lookup before types are bound.
#[derive(Debug, Clone, Default)]
pub(crate) struct RawHeader {
    pub super_sym: Option<ClassSymbol>,
    pub iface_syms: Vec<ClassSymbol>,
}

/// The lexical position a type reference is resolved from.
#[derive(Clone)]
pub(crate) struct TypeCtx<'t> {
    pub sym: ClassSymbol,
    pub unit: usize,
    /// Type parameters of the method currently being bound, innermost scope.
    pub method_tparams: &'t [(Name, TyVarSymbol)],
}

impl<'t> TypeCtx<'t> {
    pub fn class(sym: ClassSymbol, unit: usize) -> TypeCtx<'static> {
        TypeCtx {
            sym,
            unit,
            method_tparams: &[],
        }
    }
}

pub(crate) struct Binder<'a> {
    pub units: &'a [tree::CompUnit],
    pub classpath: &'a dyn Env<ClassSymbol, TypeBoundClass>,
    pub module_env: Option<&'a dyn Env<ModuleSymbol, ModuleInfo>>,
    pub opts: &'a EmitOptions,
    pub sink: DiagnosticSink,

    // Package pass.
    pub source: HashMap<ClassSymbol, SourceClass>,
    /// All source classes, outer before inner, in unit and declaration order.
    pub order: Vec<ClassSymbol>,
    /// Top-level binary name to symbol.
    tli: HashMap<String, ClassSymbol>,
    pub(crate) imports: Vec<ImportIndex>,

    // Hierarchy pass.
    raw_headers: HashMap<ClassSymbol, RawHeader>,
    in_progress: HashSet<ClassSymbol>,
    reported_cycles: HashSet<ClassSymbol>,

    // Header pass.
    class_tparams: HashMap<ClassSymbol, Vec<(Name, TyVarSymbol)>>,
    pub tyvar_info: HashMap<TyVarSymbol, TyVarInfo>,
    pub headers: HashMap<ClassSymbol, ClassHeader>,

    // Member pass.
    pub member_bound: HashMap<ClassSymbol, TypeBoundClass>,

    // Constant pass (see `consteval`).
    pub const_memo: HashMap<FieldSymbol, Option<Const>>,
    pub const_in_progress: HashSet<FieldSymbol>,

    /// Completed classes.
    pub bound: SimpleEnv<ClassSymbol, TypeBoundClass>,
    /// Bound modules, in unit order.
    pub modules: Vec<ModuleInfo>,
}

impl<'a> Binder<'a> {
    pub fn new(
        units: &'a [tree::CompUnit],
        classpath: &'a dyn Env<ClassSymbol, TypeBoundClass>,
        module_env: Option<&'a dyn Env<ModuleSymbol, ModuleInfo>>,
        opts: &'a EmitOptions,
    ) -> Self {
        Self {
            units,
            classpath,
            module_env,
            opts,
            sink: DiagnosticSink::new(),
            source: HashMap::new(),
            order: Vec::new(),
            tli: HashMap::new(),
            imports: Vec::new(),
            raw_headers: HashMap::new(),
            in_progress: HashSet::new(),
            reported_cycles: HashSet::new(),
            class_tparams: HashMap::new(),
            tyvar_info: HashMap::new(),
            headers: HashMap::new(),
            member_bound: HashMap::new(),
            const_memo: HashMap::new(),
            const_in_progress: HashSet::new(),
            bound: SimpleEnv::new(),
            modules: Vec::new(),
        }
    }

    /// The compound view of everything bindable: completed source classes
    /// first, then the classpath.
    pub(crate) fn full_env(&self) -> crate::env::CompoundEnv<'_, ClassSymbol, TypeBoundClass> {
        crate::env::CompoundEnv::of(&self.bound).append(self.classpath)
    }

    pub fn diag(&mut self, unit: usize, span: Span, kind: DiagnosticKind, message: impl Into<String>) {
        let unit = &self.units[unit];
        let position = unit.line_map.line_column(span.start);
        self.sink
            .push(Diagnostic::new(unit.file.clone(), position, kind, message));
    }

    fn package_of(&self, unit: usize) -> String {
        match &self.units[unit].package {
            Some(package) => package
                .name
                .iter()
                .map(Name::as_str)
                .collect::<Vec<_>>()
                .join("/"),
            None => String::new(),
        }
    }

    // === Package pass ========================================================

    pub fn bind_packages(&mut self) {
        for (u, unit) in self.units.iter().enumerate() {
            self.imports.push(ImportIndex::from_unit(unit));
            self.check_duplicate_imports(u);
            let package = self.package_of(u);
            for decl in &unit.decls {
                let binary = if package.is_empty() {
                    decl.name.as_str().to_owned()
                } else {
                    format!("{}/{}", package, decl.name)
                };
                if self.tli.contains_key(&binary) {
                    self.diag(
                        u,
                        decl.span,
                        DiagnosticKind::DuplicateDeclaration,
                        format!("duplicate declaration of {binary}"),
                    );
                    continue;
                }
                let sym = ClassSymbol::new(binary.clone());
                self.tli.insert(binary, sym.clone());
                self.register_class(u, sym, None, decl.clone());
            }
        }
        debug!(classes = self.order.len(), "package pass complete");
    }

    fn check_duplicate_imports(&mut self, unit: usize) {
        let mut seen: HashMap<Name, Vec<Name>> = HashMap::new();
        for import in &self.units[unit].imports.clone() {
            if import.is_static || import.wildcard || import.path.is_empty() {
                continue;
            }
            let simple = import.path.last().expect("non-empty import path").clone();
            if let Some(prior) = seen.get(&simple) {
                if prior != &import.path {
                    self.diag(
                        unit,
                        import.span,
                        DiagnosticKind::AmbiguousName,
                        format!("conflicting single-type imports for {simple}"),
                    );
                }
                continue;
            }
            seen.insert(simple, import.path.clone());
        }
    }

    fn register_class(
        &mut self,
        unit: usize,
        sym: ClassSymbol,
        owner: Option<ClassSymbol>,
        decl: tree::TyDecl,
    ) {
        let kind = class_kind(decl.kind);
        let mut children = Vec::new();
        let mut nested = Vec::new();
        for member in &decl.members {
            if let tree::MemberDecl::Type(inner) = member {
                if children
                    .iter()
                    .any(|(name, _): &(Name, ClassSymbol)| *name == inner.name)
                {
                    self.diag(
                        unit,
                        inner.span,
                        DiagnosticKind::DuplicateDeclaration,
                        format!("duplicate nested declaration of {}", inner.name),
                    );
                    continue;
                }
                let child = sym.nested(inner.name.as_str());
                children.push((inner.name.clone(), child.clone()));
                nested.push((child, inner.clone()));
            }
        }
        self.order.push(sym.clone());
        self.source.insert(
            sym.clone(),
            SourceClass {
                unit,
                decl: Arc::new(decl),
                owner,
                kind,
                children,
            },
        );
        for (child, inner) in nested {
            self.register_class(unit, child, Some(sym.clone()), inner);
        }
    }

    // === Hierarchy pass ======================================================

    /// Direct supertype symbols of a source class, resolved on demand. A
    /// re-entrant request means name resolution walked back into a class
    /// whose hierarchy is still being computed: a cycle. The offending edge
    /// is dropped (callers substitute `java/lang/Object`) and the cycle
    /// reported once.
    pub(crate) fn raw_header(&mut self, sym: &ClassSymbol) -> Option<RawHeader> {
        if let Some(raw) = self.raw_headers.get(sym) {
            return Some(raw.clone());
        }
        let source = self.source.get(sym)?.clone();
        if self.in_progress.contains(sym) {
            self.report_cycle(sym, &source);
            return None;
        }
        self.in_progress.insert(sym.clone());

        let mut raw = RawHeader::default();
        match &source.decl.extends {
            Some(extends) => {
                raw.super_sym = self
                    .resolve_tyref_symbol(&source, sym, extends)
                    .or_else(|| Some(ClassSymbol::object()));
            }
            None => raw.super_sym = implicit_super(sym, source.kind),
        }
        for iface in &source.decl.implements {
            if let Some(resolved) = self.resolve_tyref_symbol(&source, sym, iface) {
                raw.iface_syms.push(resolved);
            }
        }
        if source.kind == ClassKind::Annotation {
            raw.iface_syms
                .push(ClassSymbol::new("java/lang/annotation/Annotation"));
        }

        self.in_progress.remove(sym);
        self.raw_headers.insert(sym.clone(), raw.clone());
        Some(raw)
    }

    fn report_cycle(&mut self, sym: &ClassSymbol, source: &SourceClass) {
        if self.reported_cycles.insert(sym.clone()) {
            self.diag(
                source.unit,
                source.decl.span,
                DiagnosticKind::CyclicHierarchy,
                format!("cyclic inheritance involving {sym}"),
            );
        }
    }

    /// Resolves the root symbol of a supertype reference. Only names are
    /// consumed here; type arguments wait for the header pass.
    fn resolve_tyref_symbol(
        &mut self,
        source: &SourceClass,
        sym: &ClassSymbol,
        tyref: &tree::TyRef,
    ) -> Option<ClassSymbol> {
        let tree::TyRef::Named { segments, span } = tyref else {
            self.diag(
                source.unit,
                tyref.span(),
                DiagnosticKind::CannotResolveToType,
                "supertype must be a class or interface type",
            );
            return None;
        };
        let key = LookupKey::new(segments.iter().map(|s| s.name.clone()).collect());
        if self.lexical_tparam_names(sym).contains(key.first()) {
            self.diag(
                source.unit,
                *span,
                DiagnosticKind::CannotResolveToType,
                format!("type parameter {} cannot be a supertype", key.first()),
            );
            return None;
        }
        let ctx = TypeCtx::class(sym.clone(), source.unit);
        match self.resolve_class_quiet(&ctx, &key) {
            Some(resolved) => Some(resolved),
            None => {
                self.diag(
                    source.unit,
                    *span,
                    DiagnosticKind::SymbolNotFound,
                    format!("symbol not found: {}", key.dotted()),
                );
                None
            }
        }
    }

    /// Type parameter names visible in a class's header scope, walking the
    /// lexical chain from the declaration trees (symbols may not be minted
    /// yet during the hierarchy pass).
    fn lexical_tparam_names(&self, sym: &ClassSymbol) -> HashSet<Name> {
        let mut names = HashSet::new();
        let mut cur = Some(sym.clone());
        while let Some(c) = cur {
            let Some(source) = self.source.get(&c) else {
                break;
            };
            for tparam in &source.decl.type_params {
                names.insert(tparam.name.clone());
            }
            if is_static_context(source) {
                break;
            }
            cur = source.owner.clone();
        }
        names
    }

    /// After every raw header exists, detect cycles left in the supertype
    /// graph itself (`A extends B`, `B extends A` resolves both names without
    /// re-entry). Each class participating in a back edge gets the offending
    /// edge replaced with `java/lang/Object`.
    pub fn check_hierarchy_cycles(&mut self) {
        let order = self.order.clone();
        for sym in &order {
            self.raw_header(sym);
        }
        let mut done = HashSet::new();
        for sym in order {
            let mut stack = Vec::new();
            self.cycle_dfs(&sym, &mut stack, &mut done);
        }
    }

    fn cycle_dfs(
        &mut self,
        sym: &ClassSymbol,
        stack: &mut Vec<ClassSymbol>,
        done: &mut HashSet<ClassSymbol>,
    ) {
        if done.contains(sym) || !self.source.contains_key(sym) {
            return;
        }
        stack.push(sym.clone());
        let raw = self.raw_headers.get(sym).cloned().unwrap_or_default();
        let mut fixed = raw.clone();
        let mut changed = false;
        if let Some(super_sym) = &raw.super_sym {
            if stack[..stack.len() - 1].contains(super_sym) || super_sym == sym {
                let source = self.source.get(sym).cloned();
                if let Some(source) = source {
                    self.report_cycle(sym, &source);
                }
                fixed.super_sym = Some(ClassSymbol::object());
                changed = true;
            } else {
                self.cycle_dfs(super_sym, stack, done);
            }
        }
        let mut kept = Vec::new();
        for iface in &raw.iface_syms {
            if stack[..stack.len() - 1].contains(iface) || iface == sym {
                let source = self.source.get(sym).cloned();
                if let Some(source) = source {
                    self.report_cycle(sym, &source);
                }
                changed = true;
            } else {
                self.cycle_dfs(iface, stack, done);
                kept.push(iface.clone());
            }
        }
        fixed.iface_syms = kept;
        if changed {
            self.raw_headers.insert(sym.clone(), fixed);
        }
        stack.pop();
        done.insert(sym.clone());
    }

    // === Name resolution =====================================================

    /// Existence probe for a binary name: source top-levels first, then the
    /// classpath env.
    fn lookup_binary(&self, binary: &str) -> Option<ClassSymbol> {
        if let Some(sym) = self.tli.get(binary) {
            return Some(sym.clone());
        }
        let sym = ClassSymbol::new(binary);
        if self.classpath.get(&sym).is_some() {
            return Some(sym);
        }
        None
    }

    /// Direct supertype symbols of any class, source or classpath.
    pub(crate) fn supertype_syms(&mut self, sym: &ClassSymbol) -> (Option<ClassSymbol>, Vec<ClassSymbol>) {
        if self.source.contains_key(sym) {
            match self.raw_header(sym) {
                Some(raw) => (raw.super_sym, raw.iface_syms),
                None => (None, Vec::new()),
            }
        } else if let Some(class) = self.classpath.get(sym) {
            let super_sym = class
                .header
                .super_class
                .as_ref()
                .and_then(Type::class_sym)
                .cloned();
            let ifaces = class
                .header
                .interfaces
                .iter()
                .filter_map(Type::class_sym)
                .cloned()
                .collect();
            (super_sym, ifaces)
        } else {
            (None, Vec::new())
        }
    }

    /// Resolves a nested class by simple name: own children first, then the
    /// declared supertype chain transitively. Same-named nested classes in
    /// subclasses shadow inherited ones by search order.
    pub(crate) fn resolve_member_type(
        &mut self,
        sym: &ClassSymbol,
        name: &str,
    ) -> Option<ClassSymbol> {
        let mut visited = HashSet::new();
        self.resolve_member_type_rec(sym, name, &mut visited)
    }

    fn resolve_member_type_rec(
        &mut self,
        sym: &ClassSymbol,
        name: &str,
        visited: &mut HashSet<ClassSymbol>,
    ) -> Option<ClassSymbol> {
        if !visited.insert(sym.clone()) {
            return None;
        }
        if let Some(source) = self.source.get(sym) {
            if let Some((_, child)) = source
                .children
                .iter()
                .find(|(child, _)| child.as_str() == name)
            {
                return Some(child.clone());
            }
        } else if let Some(class) = self.classpath.get(sym) {
            if let Some(child) = class.header.child(name) {
                return Some(child.clone());
            }
        }
        let (super_sym, ifaces) = self.supertype_syms(sym);
        if let Some(super_sym) = super_sym {
            if let Some(found) = self.resolve_member_type_rec(&super_sym, name, visited) {
                return Some(found);
            }
        }
        for iface in ifaces {
            if let Some(found) = self.resolve_member_type_rec(&iface, name, visited) {
                return Some(found);
            }
        }
        None
    }

    /// Canonical resolution of a dotted name with no lexical context: longest
    /// existing binary prefix, then nested classes for the rest. Used for
    /// import paths.
    pub(crate) fn resolve_canonical(&mut self, key: &LookupKey) -> Option<ClassSymbol> {
        for i in (1..=key.len()).rev() {
            if let Some(mut sym) = self.lookup_binary(&key.binary(i)) {
                for name in &key.names()[i..] {
                    sym = self.resolve_member_type(&sym, name.as_str())?;
                }
                return Some(sym);
            }
        }
        None
    }

    /// Compilation-unit scope: same-unit top levels, single imports, same
    /// package, on-demand imports, the implicit `java.lang.*`, then canonical
    /// qualified resolution. Returns the root and how many key segments it
    /// consumed.
    pub(crate) fn resolve_in_unit(
        &mut self,
        unit: usize,
        span: Span,
        key: &LookupKey,
    ) -> Option<(ClassSymbol, usize)> {
        let first = key.first().clone();

        for decl in &self.units[unit].decls {
            if decl.name == first {
                let package = self.package_of(unit);
                let binary = if package.is_empty() {
                    first.as_str().to_owned()
                } else {
                    format!("{package}/{first}")
                };
                return Some((ClassSymbol::new(binary), 1));
            }
        }

        if let Some(path) = self.imports[unit].singles.get(&first).cloned() {
            if let Some(sym) = self.resolve_canonical(&path) {
                return Some((sym, 1));
            }
        }

        let package = self.package_of(unit);
        let same_package = if package.is_empty() {
            first.as_str().to_owned()
        } else {
            format!("{package}/{first}")
        };
        if let Some(sym) = self.lookup_binary(&same_package) {
            return Some((sym, 1));
        }

        let mut candidates: Vec<ClassSymbol> = Vec::new();
        for on_demand in self.imports[unit].on_demand.clone() {
            let candidate = format!("{}/{}", on_demand.binary(on_demand.len()), first);
            if let Some(sym) = self.lookup_binary(&candidate) {
                if !candidates.contains(&sym) {
                    candidates.push(sym);
                }
                continue;
            }
            // A type-on-demand import: members of the named type.
            if let Some(owner) = self.resolve_canonical(&on_demand) {
                if let Some(sym) = self.resolve_member_type(&owner, first.as_str()) {
                    if !candidates.contains(&sym) {
                        candidates.push(sym);
                    }
                }
            }
        }
        if candidates.len() > 1 {
            self.diag(
                unit,
                span,
                DiagnosticKind::AmbiguousName,
                format!("{first} is ambiguous between on-demand imports"),
            );
        }
        if let Some(sym) = candidates.into_iter().next() {
            return Some((sym, 1));
        }

        if let Some(sym) = self.lookup_binary(&format!("java/lang/{first}")) {
            return Some((sym, 1));
        }

        for i in (1..=key.len()).rev() {
            if let Some(sym) = self.lookup_binary(&key.binary(i)) {
                return Some((sym, i));
            }
        }
        None
    }

    /// Full resolution order from inside a class: lexically enclosing members
    /// (including the enclosing classes' own names), then the unit scope.
    pub(crate) fn resolve_root(
        &mut self,
        ctx: &TypeCtx<'_>,
        span: Span,
        key: &LookupKey,
    ) -> Option<(ClassSymbol, usize)> {
        let first = key.first().clone();
        let mut cur = Some(ctx.sym.clone());
        while let Some(c) = cur {
            if c.simple_name() == first.as_str() {
                return Some((c, 1));
            }
            if let Some(found) = self.resolve_member_type(&c, first.as_str()) {
                return Some((found, 1));
            }
            cur = self.source.get(&c).and_then(|source| source.owner.clone());
        }
        self.resolve_in_unit(ctx.unit, span, key)
    }

    /// Resolves a dotted name to a class symbol, walking any trailing
    /// segments as nested classes. Quiet: callers decide whether failure is
    /// diagnosable.
    pub(crate) fn resolve_class_quiet(
        &mut self,
        ctx: &TypeCtx<'_>,
        key: &LookupKey,
    ) -> Option<ClassSymbol> {
        let (mut sym, consumed) = self.resolve_root(ctx, Span::point(0), key)?;
        for name in &key.names()[consumed..] {
            sym = self.resolve_member_type(&sym, name.as_str())?;
        }
        Some(sym)
    }

    /// Like [`resolve_class_quiet`](Self::resolve_class_quiet) but records
    /// `SymbolNotFound` on failure.
    pub(crate) fn resolve_class(
        &mut self,
        ctx: &TypeCtx<'_>,
        span: Span,
        key: &LookupKey,
    ) -> Option<ClassSymbol> {
        match self.resolve_class_quiet(ctx, key) {
            Some(sym) => Some(sym),
            None => {
                self.diag(
                    ctx.unit,
                    span,
                    DiagnosticKind::SymbolNotFound,
                    format!("symbol not found: {}", key.dotted()),
                );
                None
            }
        }
    }

    /// Resolves a simple name against type parameters in scope: the current
    /// method's, then the class chain's, stopping at static boundaries.
    pub(crate) fn resolve_tyvar(&self, ctx: &TypeCtx<'_>, name: &str) -> Option<TyVarSymbol> {
        for (tparam, sym) in ctx.method_tparams {
            if tparam.as_str() == name {
                return Some(sym.clone());
            }
        }
        let mut cur = Some(ctx.sym.clone());
        while let Some(c) = cur {
            if let Some(tparams) = self.class_tparams.get(&c) {
                for (tparam, sym) in tparams {
                    if tparam.as_str() == name {
                        return Some(sym.clone());
                    }
                }
            }
            let Some(source) = self.source.get(&c) else {
                break;
            };
            if is_static_context(source) {
                break;
            }
            cur = source.owner.clone();
        }
        None
    }

    // === Type binding ========================================================

    pub(crate) fn bind_annos(&mut self, ctx: &TypeCtx<'_>, annos: &[tree::Anno]) -> Vec<AnnoInfo> {
        let mut out = Vec::new();
        for anno in annos {
            let key = LookupKey::new(anno.name.clone());
            match self.resolve_class(ctx, anno.span, &key) {
                Some(sym) => out.push(AnnoInfo::unevaluated(sym, anno.clone())),
                None => {}
            }
        }
        out
    }

    pub(crate) fn bind_tyref(&mut self, ctx: &TypeCtx<'_>, tyref: &tree::TyRef) -> Type {
        match tyref {
            tree::TyRef::Prim { kind, annos, .. } => Type::Prim(PrimType {
                kind: *kind,
                annos: self.bind_annos(ctx, annos),
            }),
            tree::TyRef::Void { .. } => Type::Void,
            tree::TyRef::Array { elem, annos, .. } => Type::Array(ArrayType {
                elem: Box::new(self.bind_tyref(ctx, elem)),
                annos: self.bind_annos(ctx, annos),
            }),
            tree::TyRef::Named { segments, span } => self.bind_named(ctx, segments, *span),
        }
    }

    fn bind_named(
        &mut self,
        ctx: &TypeCtx<'_>,
        segments: &[tree::TyRefSegment],
        span: Span,
    ) -> Type {
        if let [segment] = segments {
            if let Some(tyvar) = self.resolve_tyvar(ctx, segment.name.as_str()) {
                if !segment.targs.is_empty() {
                    self.diag(
                        ctx.unit,
                        span,
                        DiagnosticKind::CannotResolveToType,
                        format!("type parameter {} cannot be parameterized", segment.name),
                    );
                }
                return Type::TyVar(TyVarType {
                    sym: tyvar,
                    annos: self.bind_annos(ctx, &segment.annos),
                });
            }
        } else if !segments.is_empty() {
            if self.resolve_tyvar(ctx, segments[0].name.as_str()).is_some() {
                self.diag(
                    ctx.unit,
                    span,
                    DiagnosticKind::CannotResolveToType,
                    format!("type parameter {} has no members", segments[0].name),
                );
                return Type::Error;
            }
        }

        let key = LookupKey::new(segments.iter().map(|s| s.name.clone()).collect());
        let Some((root, consumed)) = self.resolve_root(ctx, span, &key) else {
            self.diag(
                ctx.unit,
                span,
                DiagnosticKind::SymbolNotFound,
                format!("symbol not found: {}", key.dotted()),
            );
            return Type::Error;
        };
        for segment in &segments[..consumed - 1] {
            if !segment.targs.is_empty() {
                self.diag(
                    ctx.unit,
                    span,
                    DiagnosticKind::CannotResolveToType,
                    format!("package segment {} cannot be parameterized", segment.name),
                );
            }
        }

        let root_segment = &segments[consumed - 1];
        let mut parts = vec![SimpleClassType {
            sym: root.clone(),
            targs: self.bind_targs(ctx, &root_segment.targs),
            annos: self.bind_annos(ctx, &root_segment.annos),
        }];
        let mut sym = root;
        for segment in &segments[consumed..] {
            match self.resolve_member_type(&sym, segment.name.as_str()) {
                Some(next) => {
                    sym = next.clone();
                    parts.push(SimpleClassType {
                        sym: next,
                        targs: self.bind_targs(ctx, &segment.targs),
                        annos: self.bind_annos(ctx, &segment.annos),
                    });
                }
                None => {
                    self.diag(
                        ctx.unit,
                        span,
                        DiagnosticKind::SymbolNotFound,
                        format!("symbol not found: {}", segment.name),
                    );
                    return Type::Error;
                }
            }
        }
        Type::Class(ClassType { classes: parts })
    }

    fn bind_targs(&mut self, ctx: &TypeCtx<'_>, targs: &[tree::TyArg]) -> Vec<Type> {
        targs
            .iter()
            .map(|targ| match targ {
                tree::TyArg::Ty(tyref) => self.bind_tyref(ctx, tyref),
                tree::TyArg::Wild { bound, annos, .. } => {
                    let annos = self.bind_annos(ctx, annos);
                    match bound {
                        tree::WildBound::None => Type::Wild(WildType::Unbounded { annos }),
                        tree::WildBound::Extends(bound) => Type::Wild(WildType::Upper {
                            bound: Box::new(self.bind_tyref(ctx, bound)),
                            annos,
                        }),
                        tree::WildBound::Super(bound) => Type::Wild(WildType::Lower {
                            bound: Box::new(self.bind_tyref(ctx, bound)),
                            annos,
                        }),
                    }
                }
            })
            .collect()
    }

    // === Header pass =========================================================

    pub fn bind_headers(&mut self) {
        // Mint every class's type-parameter symbols before resolving any
        // bound, so F-bounded and forward references always find a symbol.
        let order = self.order.clone();
        for sym in &order {
            let source = self.source.get(sym).expect("registered class").clone();
            let mut tparams = Vec::new();
            for tparam in &source.decl.type_params {
                if tparams
                    .iter()
                    .any(|(name, _): &(Name, TyVarSymbol)| *name == tparam.name)
                {
                    self.diag(
                        source.unit,
                        tparam.span,
                        DiagnosticKind::DuplicateDeclaration,
                        format!("duplicate type parameter {}", tparam.name),
                    );
                    continue;
                }
                tparams.push((
                    tparam.name.clone(),
                    TyVarSymbol::class_owned(sym.clone(), tparam.name.clone()),
                ));
            }
            self.class_tparams.insert(sym.clone(), tparams);
        }

        for sym in &order {
            let source = self.source.get(sym).expect("registered class").clone();
            let header = self.bind_header(sym, &source);
            self.headers.insert(sym.clone(), header);
        }
        debug!(classes = order.len(), "header pass complete");
    }

    fn bind_header(&mut self, sym: &ClassSymbol, source: &SourceClass) -> ClassHeader {
        let ctx = TypeCtx::class(sym.clone(), source.unit);
        let minted = self.class_tparams.get(sym).cloned().unwrap_or_default();
        let mut type_params = Vec::new();
        for tparam in &source.decl.type_params {
            let Some((_, tyvar)) = minted.iter().find(|(name, _)| *name == tparam.name) else {
                continue;
            };
            let info = self.bind_tparam_info(&ctx, tparam);
            self.tyvar_info.insert(tyvar.clone(), info.clone());
            type_params.push((tyvar.clone(), info));
        }

        let mut super_class = match &source.decl.extends {
            Some(extends) => Some(self.bind_tyref(&ctx, extends)),
            None => implicit_super_type(sym, source.kind),
        };
        let mut interfaces: Vec<Type> = source
            .decl
            .implements
            .iter()
            .map(|iface| self.bind_tyref(&ctx, iface))
            .collect();
        if source.kind == ClassKind::Annotation {
            interfaces.push(Type::class(ClassSymbol::new(
                "java/lang/annotation/Annotation",
            )));
        }

        // The cycle check may have replaced supertype edges at the symbol
        // level; the typed header must agree with the checked graph.
        if let Some(raw) = self.raw_headers.get(sym) {
            if let (Some(Type::Class(bound_super)), Some(raw_super)) =
                (&super_class, &raw.super_sym)
            {
                if bound_super.sym() != raw_super {
                    super_class = Some(Type::class(raw_super.clone()));
                }
            }
            let kept = raw.iface_syms.clone();
            interfaces.retain(|iface| match iface.class_sym() {
                Some(iface_sym) => kept.contains(iface_sym),
                None => true,
            });
        }

        let mut permits = Vec::new();
        for permitted in &source.decl.permits {
            if let tree::TyRef::Named { segments, span } = permitted {
                let key = LookupKey::new(segments.iter().map(|s| s.name.clone()).collect());
                if let Some(resolved) = self.resolve_class(&ctx, *span, &key) {
                    permits.push(resolved);
                }
            }
        }

        let access = self.class_access(source);
        ClassHeader {
            kind: source.kind,
            access,
            owner: source.owner.clone(),
            type_params,
            super_class,
            interfaces,
            permits,
            children: source.children.clone(),
        }
    }

    fn bind_tparam_info(&mut self, ctx: &TypeCtx<'_>, tparam: &tree::TyParamDecl) -> TyVarInfo {
        let bounds = tparam
            .bounds
            .iter()
            .map(|bound| self.bind_tyref(ctx, bound))
            .filter(|bound| !bound.is_error())
            .collect();
        TyVarInfo {
            upper_bound: IntersectionType { bounds },
            annos: self.bind_annos(ctx, &tparam.annos),
        }
    }

    fn class_access(&mut self, source: &SourceClass) -> ClassFlags {
        let mut access = ClassFlags::EMPTY;
        let mut is_abstract = false;
        let mut is_final = false;
        for modifier in &source.decl.mods {
            match modifier {
                tree::Modifier::Public => access |= ClassFlags::PUBLIC,
                tree::Modifier::Protected => access |= ClassFlags::PROTECTED,
                tree::Modifier::Private => access |= ClassFlags::PRIVATE,
                tree::Modifier::Abstract => {
                    is_abstract = true;
                    access |= ClassFlags::ABSTRACT;
                }
                tree::Modifier::Static => access |= ClassFlags::STATIC,
                tree::Modifier::Final => {
                    is_final = true;
                    access |= ClassFlags::FINAL;
                }
                tree::Modifier::Sealed | tree::Modifier::NonSealed | tree::Modifier::Strictfp => {}
                other => {
                    self.diag(
                        source.unit,
                        source.decl.span,
                        DiagnosticKind::IllegalModifier,
                        format!("modifier {other:?} not allowed on a type declaration"),
                    );
                }
            }
        }
        if is_abstract && is_final {
            self.diag(
                source.unit,
                source.decl.span,
                DiagnosticKind::IllegalModifier,
                "a declaration cannot be both abstract and final",
            );
        }
        match source.kind {
            ClassKind::Class => access |= ClassFlags::SUPER,
            ClassKind::Interface => access |= ClassFlags::INTERFACE | ClassFlags::ABSTRACT,
            ClassKind::Annotation => {
                access |= ClassFlags::INTERFACE | ClassFlags::ABSTRACT | ClassFlags::ANNOTATION
            }
            ClassKind::Enum => access |= ClassFlags::ENUM | ClassFlags::FINAL | ClassFlags::SUPER,
            ClassKind::Record => access |= ClassFlags::FINAL | ClassFlags::SUPER,
        }
        // Nested interface-likes and members of interface-likes are
        // implicitly static; members of interfaces are implicitly public.
        if let Some(owner) = &source.owner {
            if source.kind != ClassKind::Class {
                access |= ClassFlags::STATIC;
            }
            if let Some(owner_source) = self.source.get(owner) {
                if owner_source.kind.is_interface_like() {
                    access |= ClassFlags::PUBLIC | ClassFlags::STATIC;
                }
            }
        }
        access
    }

    // === Member pass =========================================================

    pub fn bind_members(&mut self) {
        let order = self.order.clone();
        for sym in &order {
            let source = self.source.get(sym).expect("registered class").clone();
            let bound = self.bind_class_members(sym, &source);
            self.member_bound.insert(sym.clone(), bound);
        }
        debug!(classes = order.len(), "member pass complete");
    }

    fn bind_class_members(&mut self, sym: &ClassSymbol, source: &SourceClass) -> TypeBoundClass {
        let ctx = TypeCtx::class(sym.clone(), source.unit);
        let header = self
            .headers
            .get(sym)
            .expect("header bound before members")
            .clone();

        let mut fields: Vec<FieldInfo> = Vec::new();
        let mut methods: Vec<MethodInfo> = Vec::new();
        for member in &source.decl.members {
            match member {
                tree::MemberDecl::Field(field) => {
                    if fields.iter().any(|f| f.sym.name == field.name) {
                        self.diag(
                            source.unit,
                            field.span,
                            DiagnosticKind::DuplicateDeclaration,
                            format!("duplicate field {}", field.name),
                        );
                        continue;
                    }
                    fields.push(self.bind_field(&ctx, source, field));
                }
                tree::MemberDecl::EnumConstant(constant) => {
                    let annos = self.bind_annos(&ctx, &constant.annos);
                    fields.push(FieldInfo {
                        sym: FieldSymbol::new(sym.clone(), constant.name.clone()),
                        ty: Type::class(sym.clone()),
                        access: FieldFlags::PUBLIC
                            | FieldFlags::STATIC
                            | FieldFlags::FINAL
                            | FieldFlags::ENUM,
                        annos,
                        init: None,
                        value: None,
                        span: constant.span,
                    });
                }
                tree::MemberDecl::Method(method) => {
                    let bound = self.bind_method(&ctx, source, method);
                    if methods
                        .iter()
                        .any(|m| m.sym.name == bound.sym.name && m.sym.descriptor == bound.sym.descriptor)
                    {
                        self.diag(
                            source.unit,
                            method.span,
                            DiagnosticKind::DuplicateDeclaration,
                            format!("duplicate method {}{}", bound.sym.name, bound.sym.descriptor),
                        );
                        continue;
                    }
                    methods.push(bound);
                }
                tree::MemberDecl::Type(_) => {}
            }
        }

        let mut components = Vec::new();
        for component in &source.decl.components {
            components.push(RecordComponentInfo {
                name: component.name.clone(),
                ty: self.bind_tyref(&ctx, &component.ty),
                annos: self.bind_annos(&ctx, &component.annos),
            });
        }

        let annos = self.bind_annos(&ctx, &source.decl.annos);
        TypeBoundClass {
            header,
            fields,
            methods,
            components,
            annos,
        }
    }

    fn bind_field(
        &mut self,
        ctx: &TypeCtx<'_>,
        source: &SourceClass,
        field: &tree::FieldDecl,
    ) -> FieldInfo {
        let mut access = FieldFlags::EMPTY;
        for modifier in &field.mods {
            match modifier {
                tree::Modifier::Public => access |= FieldFlags::PUBLIC,
                tree::Modifier::Protected => access |= FieldFlags::PROTECTED,
                tree::Modifier::Private => access |= FieldFlags::PRIVATE,
                tree::Modifier::Static => access |= FieldFlags::STATIC,
                tree::Modifier::Final => access |= FieldFlags::FINAL,
                tree::Modifier::Volatile => access |= FieldFlags::VOLATILE,
                tree::Modifier::Transient => access |= FieldFlags::TRANSIENT,
                other => {
                    self.diag(
                        ctx.unit,
                        field.span,
                        DiagnosticKind::IllegalModifier,
                        format!("modifier {other:?} not allowed on a field"),
                    );
                }
            }
        }
        if source.kind.is_interface_like() {
            if access.contains(FieldFlags::PRIVATE) || access.contains(FieldFlags::PROTECTED) {
                self.diag(
                    ctx.unit,
                    field.span,
                    DiagnosticKind::IllegalModifier,
                    "interface fields are implicitly public",
                );
            }
            access = access
                .without(FieldFlags::PROTECTED)
                .without(FieldFlags::PRIVATE)
                | FieldFlags::PUBLIC
                | FieldFlags::STATIC
                | FieldFlags::FINAL;
        }
        FieldInfo {
            sym: FieldSymbol::new(ctx.sym.clone(), field.name.clone()),
            ty: self.bind_tyref(ctx, &field.ty),
            access,
            annos: self.bind_annos(ctx, &field.annos),
            init: field.init.clone().map(Box::new),
            value: None,
            span: field.span,
        }
    }

    fn bind_method(
        &mut self,
        ctx: &TypeCtx<'_>,
        source: &SourceClass,
        method: &tree::MethodDecl,
    ) -> MethodInfo {
        let descriptor = self.method_descriptor(ctx, method);
        let msym = MethodSymbol::new(ctx.sym.clone(), method.name.clone(), descriptor);

        let mut minted = Vec::new();
        for tparam in &method.type_params {
            minted.push((
                tparam.name.clone(),
                TyVarSymbol::method_owned(msym.clone(), tparam.name.clone()),
            ));
        }
        let method_ctx = TypeCtx {
            sym: ctx.sym.clone(),
            unit: ctx.unit,
            method_tparams: &minted,
        };

        let mut type_params = Vec::new();
        for (tparam, (_, tyvar)) in method.type_params.iter().zip(&minted) {
            let info = self.bind_tparam_info(&method_ctx, tparam);
            self.tyvar_info.insert(tyvar.clone(), info.clone());
            type_params.push((tyvar.clone(), info));
        }

        let ret = self.bind_tyref(&method_ctx, &method.ret);
        let mut params = Vec::new();
        let mut varargs = false;
        for param in &method.params {
            let mut ty = self.bind_tyref(&method_ctx, &param.ty);
            if param.variadic {
                varargs = true;
                ty = Type::array(ty);
            }
            let mut access = ParamFlags::EMPTY;
            if param.mods.contains(&tree::Modifier::Final) {
                access |= ParamFlags::FINAL;
            }
            params.push(ParamInfo {
                name: param.name.clone(),
                ty,
                access,
                annos: self.bind_annos(&method_ctx, &param.annos),
            });
        }
        let throws = method
            .throws
            .iter()
            .map(|thrown| self.bind_tyref(&method_ctx, thrown))
            .collect();

        let access = self.method_access(ctx, source, method, varargs);
        MethodInfo {
            sym: msym,
            access,
            type_params,
            ret,
            params,
            throws,
            annos: self.bind_annos(&method_ctx, &method.annos),
            default_expr: method.default.clone().map(Box::new),
            default_value: None,
            span: method.span,
        }
    }

    fn method_access(
        &mut self,
        ctx: &TypeCtx<'_>,
        source: &SourceClass,
        method: &tree::MethodDecl,
        varargs: bool,
    ) -> MethodFlags {
        let mut access = MethodFlags::EMPTY;
        let mut is_default = false;
        for modifier in &method.mods {
            match modifier {
                tree::Modifier::Public => access |= MethodFlags::PUBLIC,
                tree::Modifier::Protected => access |= MethodFlags::PROTECTED,
                tree::Modifier::Private => access |= MethodFlags::PRIVATE,
                tree::Modifier::Abstract => access |= MethodFlags::ABSTRACT,
                tree::Modifier::Static => access |= MethodFlags::STATIC,
                tree::Modifier::Final => access |= MethodFlags::FINAL,
                tree::Modifier::Synchronized => access |= MethodFlags::SYNCHRONIZED,
                tree::Modifier::Native => access |= MethodFlags::NATIVE,
                tree::Modifier::Strictfp => access |= MethodFlags::STRICT,
                tree::Modifier::Default => is_default = true,
                other => {
                    self.diag(
                        ctx.unit,
                        method.span,
                        DiagnosticKind::IllegalModifier,
                        format!("modifier {other:?} not allowed on a method"),
                    );
                }
            }
        }
        if varargs {
            access |= MethodFlags::VARARGS;
        }
        match source.kind {
            ClassKind::Annotation => access |= MethodFlags::PUBLIC | MethodFlags::ABSTRACT,
            ClassKind::Interface => {
                if !access.contains(MethodFlags::PRIVATE) {
                    access |= MethodFlags::PUBLIC;
                }
                if !method.has_body
                    && !is_default
                    && !access.contains(MethodFlags::STATIC)
                    && !access.contains(MethodFlags::PRIVATE)
                {
                    access |= MethodFlags::ABSTRACT;
                }
            }
            _ => {
                if access.contains(MethodFlags::ABSTRACT) && access.contains(MethodFlags::FINAL) {
                    self.diag(
                        ctx.unit,
                        method.span,
                        DiagnosticKind::IllegalModifier,
                        "a method cannot be both abstract and final",
                    );
                }
            }
        }
        access
    }

    // === Erased descriptors ==================================================

    /// The erased method descriptor, computed from the declaration tree so
    /// method symbols exist before the method's own type parameters are
    /// bound. Stable under later substitution by construction: erasure only
    /// consults declared first bounds.
    fn method_descriptor(&mut self, ctx: &TypeCtx<'_>, method: &tree::MethodDecl) -> String {
        let mut out = String::from("(");
        for param in &method.params {
            if param.variadic {
                out.push('[');
            }
            let mut visiting = HashSet::new();
            let erased = self.erase_tyref(ctx, method, &param.ty, &mut visiting);
            out.push_str(&erased);
        }
        out.push(')');
        let mut visiting = HashSet::new();
        let erased = self.erase_tyref(ctx, method, &method.ret, &mut visiting);
        out.push_str(&erased);
        out
    }

    fn erase_tyref(
        &mut self,
        ctx: &TypeCtx<'_>,
        method: &tree::MethodDecl,
        tyref: &tree::TyRef,
        visiting: &mut HashSet<Name>,
    ) -> String {
        match tyref {
            tree::TyRef::Prim { kind, .. } => prim_descriptor(*kind).to_owned(),
            tree::TyRef::Void { .. } => "V".to_owned(),
            tree::TyRef::Array { elem, .. } => {
                format!("[{}", self.erase_tyref(ctx, method, elem, visiting))
            }
            tree::TyRef::Named { segments, .. } => {
                if let [segment] = segments.as_slice() {
                    // The method's own type parameters are not minted yet;
                    // chase their first declared bound in the tree.
                    if let Some(tparam) = method
                        .type_params
                        .iter()
                        .find(|tparam| tparam.name == segment.name)
                    {
                        if !visiting.insert(segment.name.clone()) {
                            return "Ljava/lang/Object;".to_owned();
                        }
                        return match tparam.bounds.first() {
                            Some(bound) => {
                                let bound = bound.clone();
                                self.erase_tyref(ctx, method, &bound, visiting)
                            }
                            None => "Ljava/lang/Object;".to_owned(),
                        };
                    }
                    if let Some(tyvar) = self.resolve_tyvar(ctx, segment.name.as_str()) {
                        let mut visited = HashSet::new();
                        return self.erasure_of_tyvar(&tyvar, &mut visited);
                    }
                }
                let key = LookupKey::new(segments.iter().map(|s| s.name.clone()).collect());
                match self.resolve_class_quiet(ctx, &key) {
                    Some(sym) => format!("L{};", sym.binary_name()),
                    None => "Ljava/lang/Object;".to_owned(),
                }
            }
        }
    }

    /// Erasure of a bound type, as a descriptor.
    pub(crate) fn erasure_of_type(&self, ty: &Type, visited: &mut HashSet<TyVarSymbol>) -> String {
        match ty {
            Type::Class(class) => format!("L{};", class.sym().binary_name()),
            Type::Array(array) => format!("[{}", self.erasure_of_type(&array.elem, visited)),
            Type::Prim(prim) => prim_descriptor(prim.kind).to_owned(),
            Type::Void => "V".to_owned(),
            Type::TyVar(tyvar) => {
                let mut sym_visited = visited.clone();
                self.erasure_of_tyvar_inner(&tyvar.sym, &mut sym_visited)
            }
            Type::Intersection(intersection) => match intersection.bounds.first() {
                Some(first) => self.erasure_of_type(first, visited),
                None => "Ljava/lang/Object;".to_owned(),
            },
            Type::Wild(_) | Type::Error => "Ljava/lang/Object;".to_owned(),
        }
    }

    fn erasure_of_tyvar(&self, sym: &TyVarSymbol, visited: &mut HashSet<TyVarSymbol>) -> String {
        self.erasure_of_tyvar_inner(sym, visited)
    }

    /// The erasure of a type variable is the erasure of its first bound,
    /// chased transitively through type variables to the first class bound,
    /// falling back to `java/lang/Object`.
    fn erasure_of_tyvar_inner(
        &self,
        sym: &TyVarSymbol,
        visited: &mut HashSet<TyVarSymbol>,
    ) -> String {
        if !visited.insert(sym.clone()) {
            return "Ljava/lang/Object;".to_owned();
        }
        match self
            .tyvar_info
            .get(sym)
            .and_then(|info| info.upper_bound.bounds.first())
        {
            Some(first) => self.erasure_of_type(first, visited),
            None => "Ljava/lang/Object;".to_owned(),
        }
    }
}

pub(crate) fn class_kind(kind: tree::TyKind) -> ClassKind {
    match kind {
        tree::TyKind::Class => ClassKind::Class,
        tree::TyKind::Interface => ClassKind::Interface,
        tree::TyKind::Enum => ClassKind::Enum,
        tree::TyKind::Annotation => ClassKind::Annotation,
        tree::TyKind::Record => ClassKind::Record,
    }
}

fn is_static_context(source: &SourceClass) -> bool {
    source.kind != ClassKind::Class || source.decl.mods.contains(&tree::Modifier::Static)
}

fn implicit_super(sym: &ClassSymbol, kind: ClassKind) -> Option<ClassSymbol> {
    if sym.binary_name() == "java/lang/Object" {
        return None;
    }
    match kind {
        ClassKind::Class => Some(ClassSymbol::object()),
        ClassKind::Enum => Some(ClassSymbol::new("java/lang/Enum")),
        ClassKind::Record => Some(ClassSymbol::new("java/lang/Record")),
        ClassKind::Interface | ClassKind::Annotation => None,
    }
}

fn implicit_super_type(sym: &ClassSymbol, kind: ClassKind) -> Option<Type> {
    match kind {
        ClassKind::Enum => {
            // `enum E` extends `Enum<E>`.
            Some(Type::Class(ClassType {
                classes: vec![SimpleClassType {
                    sym: ClassSymbol::new("java/lang/Enum"),
                    targs: vec![Type::class(sym.clone())],
                    annos: Vec::new(),
                }],
            }))
        }
        _ => implicit_super(sym, kind).map(Type::class),
    }
}

pub(crate) fn prim_descriptor(kind: PrimitiveKind) -> &'static str {
    match kind {
        PrimitiveKind::Boolean => "Z",
        PrimitiveKind::Byte => "B",
        PrimitiveKind::Char => "C",
        PrimitiveKind::Short => "S",
        PrimitiveKind::Int => "I",
        PrimitiveKind::Long => "J",
        PrimitiveKind::Float => "F",
        PrimitiveKind::Double => "D",
    }
}
