//! The constant evaluator.
//!
//! Folds `static final` initializers of primitive or string type and
//! evaluates annotation argument expressions. Evaluation is pure and
//! deterministic for a given scope; field results are memoized per
//! [`FieldSymbol`] so webs of cross-field references evaluate in linear
//! time. Reference cycles report `BadConstantExpression` once and produce
//! the declared type's zero value.

use javelin_core::{DiagnosticKind, FieldFlags, Name, PrimitiveKind, Span};
use javelin_tree as tree;
use tracing::debug;

use crate::binder::{Binder, TypeCtx};
use crate::bound::{AnnoInfo, ClassHeader, FieldInfo, MethodInfo, TyVarInfo, TypeBoundClass};
use crate::consts::{Const, ConstValue};
use crate::lookup::LookupKey;
use crate::sym::{ClassSymbol, FieldSymbol};
use crate::types::{ClassType, Type, WildType};

impl Binder<'_> {
    // === The constant pass ===================================================

    pub fn bind_consts(&mut self) {
        let order = self.order.clone();
        for sym in &order {
            let bound = self
                .member_bound
                .get(sym)
                .expect("member bound before constants")
                .clone();
            let unit = self.source.get(sym).expect("registered class").unit;
            let ctx = TypeCtx::class(sym.clone(), unit);
            let bound = self.eval_class(&ctx, bound);
            self.bound.insert(sym.clone(), bound);
        }
        debug!(classes = order.len(), "constant pass complete");
    }

    fn eval_class(&mut self, ctx: &TypeCtx<'_>, mut bound: TypeBoundClass) -> TypeBoundClass {
        bound.header = self.eval_header(ctx, bound.header);
        bound.fields = std::mem::take(&mut bound.fields)
            .into_iter()
            .map(|field| self.eval_field(ctx, field))
            .collect();
        bound.methods = std::mem::take(&mut bound.methods)
            .into_iter()
            .map(|method| self.eval_method(ctx, method))
            .collect();
        for component in &mut bound.components {
            component.ty = self.eval_type(ctx, std::mem::replace(&mut component.ty, Type::Error));
            component.annos = self.eval_annos(ctx, std::mem::take(&mut component.annos));
        }
        bound.annos = self.eval_annos(ctx, std::mem::take(&mut bound.annos));
        bound
    }

    fn eval_header(&mut self, ctx: &TypeCtx<'_>, mut header: ClassHeader) -> ClassHeader {
        header.type_params = std::mem::take(&mut header.type_params)
            .into_iter()
            .map(|(sym, info)| {
                let info = self.eval_tyvar_info(ctx, info);
                (sym, info)
            })
            .collect();
        header.super_class = header
            .super_class
            .take()
            .map(|super_class| self.eval_type(ctx, super_class));
        header.interfaces = std::mem::take(&mut header.interfaces)
            .into_iter()
            .map(|iface| self.eval_type(ctx, iface))
            .collect();
        header
    }

    fn eval_tyvar_info(&mut self, ctx: &TypeCtx<'_>, mut info: TyVarInfo) -> TyVarInfo {
        info.upper_bound.bounds = std::mem::take(&mut info.upper_bound.bounds)
            .into_iter()
            .map(|bound| self.eval_type(ctx, bound))
            .collect();
        info.annos = self.eval_annos(ctx, std::mem::take(&mut info.annos));
        info
    }

    fn eval_field(&mut self, ctx: &TypeCtx<'_>, mut field: FieldInfo) -> FieldInfo {
        field.ty = self.eval_type(ctx, std::mem::replace(&mut field.ty, Type::Error));
        field.annos = self.eval_annos(ctx, std::mem::take(&mut field.annos));
        if is_constant_field(&field) {
            field.value = self.field_const_value(&field.sym);
        }
        field.init = None;
        field
    }

    fn eval_method(&mut self, ctx: &TypeCtx<'_>, mut method: MethodInfo) -> MethodInfo {
        method.type_params = std::mem::take(&mut method.type_params)
            .into_iter()
            .map(|(sym, info)| {
                let info = self.eval_tyvar_info(ctx, info);
                (sym, info)
            })
            .collect();
        method.ret = self.eval_type(ctx, std::mem::replace(&mut method.ret, Type::Error));
        for param in &mut method.params {
            param.ty = self.eval_type(ctx, std::mem::replace(&mut param.ty, Type::Error));
            param.annos = self.eval_annos(ctx, std::mem::take(&mut param.annos));
        }
        method.throws = std::mem::take(&mut method.throws)
            .into_iter()
            .map(|thrown| self.eval_type(ctx, thrown))
            .collect();
        method.annos = self.eval_annos(ctx, std::mem::take(&mut method.annos));
        if let Some(default) = method.default_expr.take() {
            let ret = method.ret.clone();
            method.default_value = self
                .eval_expr(ctx, &default)
                .and_then(|value| self.coerce_const(ctx, default.span(), value, &ret));
        }
        method
    }

    /// Re-evaluates every annotation embedded in a type.
    fn eval_type(&mut self, ctx: &TypeCtx<'_>, ty: Type) -> Type {
        match ty {
            Type::Class(mut class) => {
                for part in &mut class.classes {
                    part.annos = self.eval_annos(ctx, std::mem::take(&mut part.annos));
                    part.targs = std::mem::take(&mut part.targs)
                        .into_iter()
                        .map(|targ| self.eval_type(ctx, targ))
                        .collect();
                }
                Type::Class(class)
            }
            Type::Array(mut array) => {
                array.annos = self.eval_annos(ctx, std::mem::take(&mut array.annos));
                *array.elem = self.eval_type(ctx, std::mem::replace(&mut array.elem, Type::Error));
                Type::Array(array)
            }
            Type::TyVar(mut tyvar) => {
                tyvar.annos = self.eval_annos(ctx, std::mem::take(&mut tyvar.annos));
                Type::TyVar(tyvar)
            }
            Type::Prim(mut prim) => {
                prim.annos = self.eval_annos(ctx, std::mem::take(&mut prim.annos));
                Type::Prim(prim)
            }
            Type::Wild(wild) => Type::Wild(match wild {
                WildType::Unbounded { annos } => WildType::Unbounded {
                    annos: self.eval_annos(ctx, annos),
                },
                WildType::Upper { bound, annos } => WildType::Upper {
                    bound: Box::new(self.eval_type(ctx, *bound)),
                    annos: self.eval_annos(ctx, annos),
                },
                WildType::Lower { bound, annos } => WildType::Lower {
                    bound: Box::new(self.eval_type(ctx, *bound)),
                    annos: self.eval_annos(ctx, annos),
                },
            }),
            Type::Intersection(mut intersection) => {
                intersection.bounds = std::mem::take(&mut intersection.bounds)
                    .into_iter()
                    .map(|bound| self.eval_type(ctx, bound))
                    .collect();
                Type::Intersection(intersection)
            }
            other @ (Type::Void | Type::Error) => other,
        }
    }

    pub(crate) fn eval_annos(&mut self, ctx: &TypeCtx<'_>, annos: Vec<AnnoInfo>) -> Vec<AnnoInfo> {
        annos
            .into_iter()
            .map(|anno| self.eval_anno(ctx, anno))
            .collect()
    }

    // === Annotation evaluation ===============================================

    pub(crate) fn eval_anno(&mut self, ctx: &TypeCtx<'_>, anno: AnnoInfo) -> AnnoInfo {
        let Some(anno_tree) = anno.tree else {
            return anno;
        };
        let elements = self.annotation_elements(&anno.sym);
        let mut values: Vec<(Name, Const)> = Vec::new();
        for (element, expr) in &anno_tree.args {
            // The singular element named `value` may be written positionally.
            let element = element
                .clone()
                .unwrap_or_else(|| Name::from("value"));
            let Some(element_ty) = elements
                .iter()
                .find(|(name, _)| *name == element)
                .map(|(_, ty)| ty.clone())
            else {
                self.diag(
                    ctx.unit,
                    expr.span(),
                    DiagnosticKind::InvalidAnnotationArgument,
                    format!("no element {} in {}", element, anno.sym),
                );
                continue;
            };
            if values.iter().any(|(name, _)| *name == element) {
                self.diag(
                    ctx.unit,
                    expr.span(),
                    DiagnosticKind::InvalidAnnotationArgument,
                    format!("duplicate element {element}"),
                );
                continue;
            }
            let Some(value) = self.eval_expr(ctx, expr) else {
                continue;
            };
            let Some(value) = self.coerce_const(ctx, expr.span(), value, &element_ty) else {
                continue;
            };
            values.push((element, value));
        }
        AnnoInfo::evaluated(anno.sym, values)
    }

    /// Declared elements of an annotation type: its methods' names and
    /// return types.
    fn annotation_elements(&mut self, sym: &ClassSymbol) -> Vec<(Name, Type)> {
        if let Some(bound) = self.member_bound.get(sym) {
            return bound
                .methods
                .iter()
                .map(|method| (method.sym.name.clone(), method.ret.clone()))
                .collect();
        }
        if let Some(class) = self.classpath.get(sym) {
            return class
                .methods
                .iter()
                .map(|method| (method.sym.name.clone(), method.ret.clone()))
                .collect();
        }
        Vec::new()
    }

    // === Field constants =====================================================

    /// The folded value of a source `static final` field, memoized. Cycles
    /// report once and produce the declared type's zero value.
    pub(crate) fn field_const_value(&mut self, sym: &FieldSymbol) -> Option<Const> {
        if let Some(memoized) = self.const_memo.get(sym) {
            return memoized.clone();
        }
        let Some(owner) = self.member_bound.get(&sym.owner) else {
            return None;
        };
        let Some(field) = owner.field(sym.name.as_str()) else {
            return None;
        };
        let declared = field.ty.clone();
        let init = field.init.clone();
        let span = field.span;
        let unit = self.source.get(&sym.owner).map(|source| source.unit)?;

        if !self.const_in_progress.insert(sym.clone()) {
            self.diag(
                unit,
                span,
                DiagnosticKind::BadConstantExpression,
                format!("cycle in constant initializer of {}.{}", sym.owner, sym.name),
            );
            let zero = zero_of(&declared);
            self.const_memo.insert(sym.clone(), zero.clone());
            return zero;
        }

        let ctx = TypeCtx::class(sym.owner.clone(), unit);
        let value = init
            .and_then(|expr| self.eval_expr(&ctx, &expr))
            .and_then(|value| self.coerce_const(&ctx, span, value, &declared));

        self.const_in_progress.remove(sym);
        self.const_memo.insert(sym.clone(), value.clone());
        value
    }

    // === Expression evaluation ===============================================

    pub(crate) fn eval_expr(&mut self, ctx: &TypeCtx<'_>, expr: &tree::Expr) -> Option<Const> {
        match expr {
            tree::Expr::Literal { value, .. } => Some(Const::Value(literal_value(value))),
            tree::Expr::Paren { expr, .. } => self.eval_expr(ctx, expr),
            tree::Expr::Unary { op, operand, span } => {
                let value = self.eval_expr(ctx, operand)?;
                self.eval_unary(ctx, *span, *op, value)
            }
            tree::Expr::Binary { op, lhs, rhs, span } => {
                let lhs = self.eval_expr(ctx, lhs)?;
                let rhs = self.eval_expr(ctx, rhs)?;
                self.eval_binary(ctx, *span, *op, lhs, rhs)
            }
            tree::Expr::Conditional {
                cond, then, orelse, ..
            } => {
                let cond = self.eval_expr(ctx, cond)?;
                match cond {
                    Const::Value(ConstValue::Boolean(true)) => self.eval_expr(ctx, then),
                    Const::Value(ConstValue::Boolean(false)) => self.eval_expr(ctx, orelse),
                    _ => {
                        self.diag(
                            ctx.unit,
                            expr.span(),
                            DiagnosticKind::TypeMismatch,
                            "conditional guard must be a boolean constant",
                        );
                        None
                    }
                }
            }
            tree::Expr::Cast { ty, expr, span } => {
                let value = self.eval_expr(ctx, expr)?;
                self.eval_cast(ctx, *span, ty, value)
            }
            tree::Expr::Ref { path, span } => self.eval_ref(ctx, *span, path),
            tree::Expr::ClassLiteral { ty, .. } => {
                let bound = self.bind_tyref(ctx, ty);
                Some(Const::Class(bound))
            }
            tree::Expr::ArrayInit { elements, .. } => {
                let mut values = Vec::with_capacity(elements.len());
                for element in elements {
                    values.push(self.eval_expr(ctx, element)?);
                }
                Some(Const::Array(values))
            }
            tree::Expr::Anno(anno) => {
                let key = LookupKey::new(anno.name.clone());
                let sym = match self.resolve_class(ctx, anno.span, &key) {
                    Some(sym) => sym,
                    None => return None,
                };
                let info = AnnoInfo::unevaluated(sym, anno.clone());
                Some(Const::Anno(self.eval_anno(ctx, info)))
            }
        }
    }

    fn eval_unary(
        &mut self,
        ctx: &TypeCtx<'_>,
        span: Span,
        op: tree::UnOp,
        value: Const,
    ) -> Option<Const> {
        let Const::Value(value) = value else {
            self.diag(
                ctx.unit,
                span,
                DiagnosticKind::BadConstantExpression,
                "operand is not a primitive constant",
            );
            return None;
        };
        let result = match op {
            tree::UnOp::Plus => match promote_unary(value) {
                Some(value) => Some(value),
                None => None,
            },
            tree::UnOp::Neg => match promote_unary(value) {
                Some(ConstValue::Int(v)) => Some(ConstValue::Int(v.wrapping_neg())),
                Some(ConstValue::Long(v)) => Some(ConstValue::Long(v.wrapping_neg())),
                Some(ConstValue::Float(v)) => Some(ConstValue::Float(-v)),
                Some(ConstValue::Double(v)) => Some(ConstValue::Double(-v)),
                _ => None,
            },
            tree::UnOp::BitNot => match promote_unary(value) {
                Some(ConstValue::Int(v)) => Some(ConstValue::Int(!v)),
                Some(ConstValue::Long(v)) => Some(ConstValue::Long(!v)),
                _ => None,
            },
            tree::UnOp::Not => match value {
                ConstValue::Boolean(v) => Some(ConstValue::Boolean(!v)),
                _ => None,
            },
        };
        match result {
            Some(value) => Some(Const::Value(value)),
            None => {
                self.diag(
                    ctx.unit,
                    span,
                    DiagnosticKind::TypeMismatch,
                    "operand has the wrong type for this operator",
                );
                None
            }
        }
    }

    fn eval_binary(
        &mut self,
        ctx: &TypeCtx<'_>,
        span: Span,
        op: tree::BinOp,
        lhs: Const,
        rhs: Const,
    ) -> Option<Const> {
        let (Const::Value(lhs), Const::Value(rhs)) = (lhs, rhs) else {
            self.diag(
                ctx.unit,
                span,
                DiagnosticKind::BadConstantExpression,
                "operands are not primitive or string constants",
            );
            return None;
        };

        // String concatenation folds left to right with Java's conversion of
        // the non-string operand.
        if op == tree::BinOp::Add && (lhs.is_string() || rhs.is_string()) {
            return Some(Const::Value(ConstValue::String(format!("{lhs}{rhs}"))));
        }

        let result = match op {
            tree::BinOp::AndAnd | tree::BinOp::OrOr => match (lhs, rhs) {
                (ConstValue::Boolean(a), ConstValue::Boolean(b)) => {
                    Some(ConstValue::Boolean(if op == tree::BinOp::AndAnd {
                        a && b
                    } else {
                        a || b
                    }))
                }
                _ => None,
            },
            tree::BinOp::Shl | tree::BinOp::Shr | tree::BinOp::UShr => {
                self.eval_shift(op, lhs, rhs)
            }
            tree::BinOp::Eq | tree::BinOp::Ne => eval_equality(op, lhs, rhs),
            tree::BinOp::Lt | tree::BinOp::Gt | tree::BinOp::Le | tree::BinOp::Ge => {
                eval_comparison(op, lhs, rhs)
            }
            tree::BinOp::BitAnd | tree::BinOp::BitOr | tree::BinOp::BitXor => {
                eval_bitwise(op, lhs, rhs)
            }
            tree::BinOp::Add
            | tree::BinOp::Sub
            | tree::BinOp::Mul
            | tree::BinOp::Div
            | tree::BinOp::Rem => match self.eval_arithmetic(ctx, span, op, lhs, rhs) {
                ArithmeticResult::Value(value) => Some(value),
                ArithmeticResult::DivisionByZero => return None,
                ArithmeticResult::BadOperands => None,
            },
        };
        match result {
            Some(value) => Some(Const::Value(value)),
            None => {
                self.diag(
                    ctx.unit,
                    span,
                    DiagnosticKind::TypeMismatch,
                    "operands have the wrong types for this operator",
                );
                None
            }
        }
    }

    fn eval_arithmetic(
        &mut self,
        ctx: &TypeCtx<'_>,
        span: Span,
        op: tree::BinOp,
        lhs: ConstValue,
        rhs: ConstValue,
    ) -> ArithmeticResult {
        let Some((lhs, rhs)) = promote_pair(lhs, rhs) else {
            return ArithmeticResult::BadOperands;
        };
        let value = match (lhs, rhs) {
            (ConstValue::Int(a), ConstValue::Int(b)) => {
                if b == 0 && matches!(op, tree::BinOp::Div | tree::BinOp::Rem) {
                    self.diag(
                        ctx.unit,
                        span,
                        DiagnosticKind::BadConstantExpression,
                        "division by zero",
                    );
                    return ArithmeticResult::DivisionByZero;
                }
                ConstValue::Int(match op {
                    tree::BinOp::Add => a.wrapping_add(b),
                    tree::BinOp::Sub => a.wrapping_sub(b),
                    tree::BinOp::Mul => a.wrapping_mul(b),
                    tree::BinOp::Div => a.wrapping_div(b),
                    tree::BinOp::Rem => a.wrapping_rem(b),
                    _ => unreachable!("arithmetic operator"),
                })
            }
            (ConstValue::Long(a), ConstValue::Long(b)) => {
                if b == 0 && matches!(op, tree::BinOp::Div | tree::BinOp::Rem) {
                    self.diag(
                        ctx.unit,
                        span,
                        DiagnosticKind::BadConstantExpression,
                        "division by zero",
                    );
                    return ArithmeticResult::DivisionByZero;
                }
                ConstValue::Long(match op {
                    tree::BinOp::Add => a.wrapping_add(b),
                    tree::BinOp::Sub => a.wrapping_sub(b),
                    tree::BinOp::Mul => a.wrapping_mul(b),
                    tree::BinOp::Div => a.wrapping_div(b),
                    tree::BinOp::Rem => a.wrapping_rem(b),
                    _ => unreachable!("arithmetic operator"),
                })
            }
            (ConstValue::Float(a), ConstValue::Float(b)) => ConstValue::Float(match op {
                tree::BinOp::Add => a + b,
                tree::BinOp::Sub => a - b,
                tree::BinOp::Mul => a * b,
                tree::BinOp::Div => a / b,
                tree::BinOp::Rem => a % b,
                _ => unreachable!("arithmetic operator"),
            }),
            (ConstValue::Double(a), ConstValue::Double(b)) => ConstValue::Double(match op {
                tree::BinOp::Add => a + b,
                tree::BinOp::Sub => a - b,
                tree::BinOp::Mul => a * b,
                tree::BinOp::Div => a / b,
                tree::BinOp::Rem => a % b,
                _ => unreachable!("arithmetic operator"),
            }),
            _ => return ArithmeticResult::BadOperands,
        };
        ArithmeticResult::Value(value)
    }

    fn eval_shift(&mut self, op: tree::BinOp, lhs: ConstValue, rhs: ConstValue) -> Option<ConstValue> {
        // Shift operands promote independently; the distance is masked to the
        // promoted width of the left operand.
        let lhs = promote_unary(lhs)?;
        let distance = match promote_unary(rhs)? {
            ConstValue::Int(v) => v as i64,
            ConstValue::Long(v) => v,
            _ => return None,
        };
        Some(match lhs {
            ConstValue::Int(v) => {
                let distance = (distance & 0x1f) as u32;
                ConstValue::Int(match op {
                    tree::BinOp::Shl => v.wrapping_shl(distance),
                    tree::BinOp::Shr => v.wrapping_shr(distance),
                    tree::BinOp::UShr => ((v as u32) >> distance) as i32,
                    _ => unreachable!("shift operator"),
                })
            }
            ConstValue::Long(v) => {
                let distance = (distance & 0x3f) as u32;
                ConstValue::Long(match op {
                    tree::BinOp::Shl => v.wrapping_shl(distance),
                    tree::BinOp::Shr => v.wrapping_shr(distance),
                    tree::BinOp::UShr => ((v as u64) >> distance) as i64,
                    _ => unreachable!("shift operator"),
                })
            }
            _ => return None,
        })
    }

    fn eval_cast(
        &mut self,
        ctx: &TypeCtx<'_>,
        span: Span,
        ty: &tree::TyRef,
        value: Const,
    ) -> Option<Const> {
        match ty {
            tree::TyRef::Prim { kind, .. } => {
                let Const::Value(value) = value else {
                    self.diag(
                        ctx.unit,
                        span,
                        DiagnosticKind::TypeMismatch,
                        "cannot cast a non-primitive constant to a primitive type",
                    );
                    return None;
                };
                match cast_value(value, *kind) {
                    Some(cast) => Some(Const::Value(cast)),
                    None => {
                        self.diag(
                            ctx.unit,
                            span,
                            DiagnosticKind::TypeMismatch,
                            format!("constant cannot be cast to {kind}"),
                        );
                        None
                    }
                }
            }
            tree::TyRef::Named { .. } => {
                // Only casts to String keep an expression constant.
                let target = self.bind_tyref(ctx, ty);
                if target.class_sym().map(ClassSymbol::binary_name) == Some("java/lang/String") {
                    if matches!(value, Const::Value(ConstValue::String(_))) {
                        return Some(value);
                    }
                    self.diag(
                        ctx.unit,
                        span,
                        DiagnosticKind::TypeMismatch,
                        "cannot cast a non-string constant to String",
                    );
                    return None;
                }
                self.diag(
                    ctx.unit,
                    span,
                    DiagnosticKind::BadConstantExpression,
                    "cast target is not a primitive type or String",
                );
                None
            }
            _ => {
                self.diag(
                    ctx.unit,
                    span,
                    DiagnosticKind::BadConstantExpression,
                    "cast target is not a primitive type or String",
                );
                None
            }
        }
    }

    /// Resolves a possibly qualified reference to a `static final` field or
    /// enum constant and produces its value.
    fn eval_ref(&mut self, ctx: &TypeCtx<'_>, span: Span, path: &[Name]) -> Option<Const> {
        if let [name] = path {
            // Fields of the enclosing class chain, including inherited ones.
            let mut cur = Some(ctx.sym.clone());
            while let Some(c) = cur {
                if let Some(owner) = self.find_field_owner(&c, name.as_str()) {
                    return self.field_const(ctx, span, &owner, name);
                }
                cur = self.source.get(&c).and_then(|source| source.owner.clone());
            }
            // Static imports.
            if let Some(owner_key) = self.imports_static_single(ctx.unit, name) {
                if let Some(owner) = self.resolve_canonical(&owner_key) {
                    if let Some(owner) = self.find_field_owner(&owner, name.as_str()) {
                        return self.field_const(ctx, span, &owner, name);
                    }
                }
            }
            for key in self.imports_static_on_demand(ctx.unit) {
                if let Some(owner) = self.resolve_canonical(&key) {
                    if let Some(owner) = self.find_field_owner(&owner, name.as_str()) {
                        return self.field_const(ctx, span, &owner, name);
                    }
                }
            }
        } else if path.len() > 1 {
            let name = path.last().expect("non-empty reference path").clone();
            let key = LookupKey::new(path[..path.len() - 1].to_vec());
            if let Some(owner) = self.resolve_class_quiet(ctx, &key) {
                if let Some(owner) = self.find_field_owner(&owner, name.as_str()) {
                    return self.field_const(ctx, span, &owner, &name);
                }
            }
        }
        self.diag(
            ctx.unit,
            span,
            DiagnosticKind::SymbolNotFound,
            format!(
                "cannot resolve constant reference {}",
                path.iter().map(Name::as_str).collect::<Vec<_>>().join(".")
            ),
        );
        None
    }

    /// Finds the class in `sym`'s supertype chain that declares a field named
    /// `name`.
    fn find_field_owner(&mut self, sym: &ClassSymbol, name: &str) -> Option<ClassSymbol> {
        let mut visited = std::collections::HashSet::new();
        self.find_field_owner_rec(sym, name, &mut visited)
    }

    fn find_field_owner_rec(
        &mut self,
        sym: &ClassSymbol,
        name: &str,
        visited: &mut std::collections::HashSet<ClassSymbol>,
    ) -> Option<ClassSymbol> {
        if !visited.insert(sym.clone()) {
            return None;
        }
        let declares = if let Some(bound) = self.member_bound.get(sym) {
            bound.field(name).is_some()
        } else if let Some(class) = self.classpath.get(sym) {
            class.field(name).is_some()
        } else {
            false
        };
        if declares {
            return Some(sym.clone());
        }
        let (super_sym, ifaces) = self.supertype_syms(sym);
        if let Some(super_sym) = super_sym {
            if let Some(found) = self.find_field_owner_rec(&super_sym, name, visited) {
                return Some(found);
            }
        }
        for iface in ifaces {
            if let Some(found) = self.find_field_owner_rec(&iface, name, visited) {
                return Some(found);
            }
        }
        None
    }

    fn field_const(
        &mut self,
        ctx: &TypeCtx<'_>,
        span: Span,
        owner: &ClassSymbol,
        name: &Name,
    ) -> Option<Const> {
        if let Some(bound) = self.member_bound.get(owner) {
            let field = bound.field(name.as_str())?;
            if field.access.contains(FieldFlags::ENUM) {
                return Some(Const::Enum(field.sym.clone()));
            }
            let sym = field.sym.clone();
            let value = self.field_const_value(&sym);
            if value.is_none() {
                self.diag(
                    ctx.unit,
                    span,
                    DiagnosticKind::BadConstantExpression,
                    format!("{owner}.{name} is not a constant"),
                );
            }
            return value;
        }
        if let Some(class) = self.classpath.get(owner) {
            let field = class.field(name.as_str())?;
            if field.access.contains(FieldFlags::ENUM) {
                return Some(Const::Enum(field.sym.clone()));
            }
            if field.value.is_none() {
                self.diag(
                    ctx.unit,
                    span,
                    DiagnosticKind::BadConstantExpression,
                    format!("{owner}.{name} is not a constant"),
                );
            }
            return field.value.clone();
        }
        None
    }

    // === Coercion ============================================================

    /// Coerces an evaluated constant to a declared type: assignment
    /// conversion for primitives and strings, plus the annotation rule that
    /// a single value fills a one-element array.
    pub(crate) fn coerce_const(
        &mut self,
        ctx: &TypeCtx<'_>,
        span: Span,
        value: Const,
        target: &Type,
    ) -> Option<Const> {
        match target {
            Type::Prim(prim) => match value {
                Const::Value(value) => match assign_value(value, prim.kind) {
                    Some(value) => Some(Const::Value(value)),
                    None => {
                        self.diag(
                            ctx.unit,
                            span,
                            DiagnosticKind::TypeMismatch,
                            format!("constant is not assignable to {}", prim.kind),
                        );
                        None
                    }
                },
                _ => {
                    self.diag(
                        ctx.unit,
                        span,
                        DiagnosticKind::TypeMismatch,
                        format!("constant is not assignable to {}", prim.kind),
                    );
                    None
                }
            },
            Type::Array(array) => match value {
                Const::Array(values) => {
                    let mut coerced = Vec::with_capacity(values.len());
                    for value in values {
                        coerced.push(self.coerce_const(ctx, span, value, &array.elem)?);
                    }
                    Some(Const::Array(coerced))
                }
                // One-off language rule: a single value coerces to a
                // one-element array.
                single => {
                    let coerced = self.coerce_const(ctx, span, single, &array.elem)?;
                    Some(Const::Array(vec![coerced]))
                }
            },
            Type::Class(class) => self.coerce_to_class(ctx, span, value, class),
            Type::Error => Some(value),
            _ => {
                self.diag(
                    ctx.unit,
                    span,
                    DiagnosticKind::TypeMismatch,
                    "constant has no valid target type",
                );
                None
            }
        }
    }

    fn coerce_to_class(
        &mut self,
        ctx: &TypeCtx<'_>,
        span: Span,
        value: Const,
        class: &ClassType,
    ) -> Option<Const> {
        let target = class.sym().clone();
        let ok = match (&value, target.binary_name()) {
            (Const::Value(ConstValue::String(_)), "java/lang/String") => true,
            (Const::Class(_), "java/lang/Class") => true,
            // Enum constants are kept opaque; the declaring type is not
            // checked against constants with specialized class bodies.
            (Const::Enum(_), _) => true,
            (Const::Anno(anno), _) => anno.sym == target,
            _ => false,
        };
        if ok {
            Some(value)
        } else {
            self.diag(
                ctx.unit,
                span,
                DiagnosticKind::TypeMismatch,
                format!("constant is not assignable to {target}"),
            );
            None
        }
    }

    // Import table accessors, cloned to keep borrows short.

    fn imports_static_single(&self, unit: usize, name: &Name) -> Option<LookupKey> {
        self.imports[unit].static_singles.get(name).cloned()
    }

    fn imports_static_on_demand(&self, unit: usize) -> Vec<LookupKey> {
        self.imports[unit].static_on_demand.clone()
    }
}

enum ArithmeticResult {
    Value(ConstValue),
    DivisionByZero,
    BadOperands,
}

fn is_constant_field(field: &FieldInfo) -> bool {
    field.access.contains(FieldFlags::STATIC)
        && field.access.contains(FieldFlags::FINAL)
        && field.init.is_some()
        && is_prim_or_string(&field.ty)
}

fn is_prim_or_string(ty: &Type) -> bool {
    match ty {
        Type::Prim(_) => true,
        Type::Class(class) => class.sym().binary_name() == "java/lang/String",
        _ => false,
    }
}

fn zero_of(ty: &Type) -> Option<Const> {
    match ty {
        Type::Prim(prim) => Some(Const::Value(ConstValue::zero(prim.kind))),
        Type::Class(class) if class.sym().binary_name() == "java/lang/String" => {
            Some(Const::Value(ConstValue::String(String::new())))
        }
        _ => None,
    }
}

fn literal_value(lit: &tree::Lit) -> ConstValue {
    match lit {
        tree::Lit::Bool(v) => ConstValue::Boolean(*v),
        tree::Lit::Char(v) => ConstValue::Char(*v),
        tree::Lit::Int(v) => ConstValue::Int(*v),
        tree::Lit::Long(v) => ConstValue::Long(*v),
        tree::Lit::Float(v) => ConstValue::Float(*v),
        tree::Lit::Double(v) => ConstValue::Double(*v),
        tree::Lit::String(v) => ConstValue::String(v.clone()),
    }
}

/// Unary numeric promotion: byte, short and char promote to int.
fn promote_unary(value: ConstValue) -> Option<ConstValue> {
    Some(match value {
        ConstValue::Byte(v) => ConstValue::Int(v as i32),
        ConstValue::Short(v) => ConstValue::Int(v as i32),
        ConstValue::Char(v) => ConstValue::Int(v as i32),
        ConstValue::Int(_) | ConstValue::Long(_) | ConstValue::Float(_) | ConstValue::Double(_) => {
            value
        }
        ConstValue::Boolean(_) | ConstValue::String(_) => return None,
    })
}

/// Binary numeric promotion: both operands widen to the wider of int, long,
/// float, double.
fn promote_pair(lhs: ConstValue, rhs: ConstValue) -> Option<(ConstValue, ConstValue)> {
    let lhs = promote_unary(lhs)?;
    let rhs = promote_unary(rhs)?;
    fn rank(value: &ConstValue) -> u8 {
        match value {
            ConstValue::Int(_) => 0,
            ConstValue::Long(_) => 1,
            ConstValue::Float(_) => 2,
            ConstValue::Double(_) => 3,
            _ => u8::MAX,
        }
    }
    fn widen(value: ConstValue, to: u8) -> ConstValue {
        match (value, to) {
            (ConstValue::Int(v), 1) => ConstValue::Long(v as i64),
            (ConstValue::Int(v), 2) => ConstValue::Float(v as f32),
            (ConstValue::Int(v), 3) => ConstValue::Double(v as f64),
            (ConstValue::Long(v), 2) => ConstValue::Float(v as f32),
            (ConstValue::Long(v), 3) => ConstValue::Double(v as f64),
            (ConstValue::Float(v), 3) => ConstValue::Double(v as f64),
            (value, _) => value,
        }
    }
    let to = rank(&lhs).max(rank(&rhs));
    if to == u8::MAX {
        return None;
    }
    Some((widen(lhs, to), widen(rhs, to)))
}

fn eval_equality(op: tree::BinOp, lhs: ConstValue, rhs: ConstValue) -> Option<ConstValue> {
    let eq = match (&lhs, &rhs) {
        (ConstValue::Boolean(a), ConstValue::Boolean(b)) => a == b,
        (ConstValue::String(a), ConstValue::String(b)) => a == b,
        _ => match promote_pair(lhs, rhs)? {
            (ConstValue::Int(a), ConstValue::Int(b)) => a == b,
            (ConstValue::Long(a), ConstValue::Long(b)) => a == b,
            (ConstValue::Float(a), ConstValue::Float(b)) => a == b,
            (ConstValue::Double(a), ConstValue::Double(b)) => a == b,
            _ => return None,
        },
    };
    Some(ConstValue::Boolean(if op == tree::BinOp::Eq { eq } else { !eq }))
}

fn eval_comparison(op: tree::BinOp, lhs: ConstValue, rhs: ConstValue) -> Option<ConstValue> {
    fn compare<T: PartialOrd>(op: tree::BinOp, a: T, b: T) -> bool {
        match op {
            tree::BinOp::Lt => a < b,
            tree::BinOp::Gt => a > b,
            tree::BinOp::Le => a <= b,
            tree::BinOp::Ge => a >= b,
            _ => unreachable!("comparison operator"),
        }
    }
    let result = match promote_pair(lhs, rhs)? {
        (ConstValue::Int(a), ConstValue::Int(b)) => compare(op, a, b),
        (ConstValue::Long(a), ConstValue::Long(b)) => compare(op, a, b),
        (ConstValue::Float(a), ConstValue::Float(b)) => compare(op, a, b),
        (ConstValue::Double(a), ConstValue::Double(b)) => compare(op, a, b),
        _ => return None,
    };
    Some(ConstValue::Boolean(result))
}

fn eval_bitwise(op: tree::BinOp, lhs: ConstValue, rhs: ConstValue) -> Option<ConstValue> {
    if let (ConstValue::Boolean(a), ConstValue::Boolean(b)) = (&lhs, &rhs) {
        return Some(ConstValue::Boolean(match op {
            tree::BinOp::BitAnd => a & b,
            tree::BinOp::BitOr => a | b,
            tree::BinOp::BitXor => a ^ b,
            _ => unreachable!("bitwise operator"),
        }));
    }
    match promote_pair(lhs, rhs)? {
        (ConstValue::Int(a), ConstValue::Int(b)) => Some(ConstValue::Int(match op {
            tree::BinOp::BitAnd => a & b,
            tree::BinOp::BitOr => a | b,
            tree::BinOp::BitXor => a ^ b,
            _ => unreachable!("bitwise operator"),
        })),
        (ConstValue::Long(a), ConstValue::Long(b)) => Some(ConstValue::Long(match op {
            tree::BinOp::BitAnd => a & b,
            tree::BinOp::BitOr => a | b,
            tree::BinOp::BitXor => a ^ b,
            _ => unreachable!("bitwise operator"),
        })),
        _ => None,
    }
}

/// Assignment conversion of a constant to a primitive kind: identity,
/// widening, or narrowing of byte/short/char/int constants that fit.
fn assign_value(value: ConstValue, target: PrimitiveKind) -> Option<ConstValue> {
    if value.kind() == Some(target) {
        return Some(value);
    }
    let is_small_integral = matches!(
        value,
        ConstValue::Byte(_) | ConstValue::Short(_) | ConstValue::Char(_) | ConstValue::Int(_)
    );
    let integral = match &value {
        ConstValue::Byte(v) => Some(*v as i64),
        ConstValue::Short(v) => Some(*v as i64),
        ConstValue::Char(v) => Some(*v as i64),
        ConstValue::Int(v) => Some(*v as i64),
        ConstValue::Long(v) => Some(*v),
        _ => None,
    };
    match target {
        PrimitiveKind::Boolean | PrimitiveKind::Byte | PrimitiveKind::Short | PrimitiveKind::Char => {
            // Narrowing is only legal from byte/short/char/int constants in
            // range; booleans only from booleans (handled by identity above).
            if !is_small_integral {
                return None;
            }
            let v = integral?;
            match target {
                PrimitiveKind::Byte if (i8::MIN as i64..=i8::MAX as i64).contains(&v) => {
                    Some(ConstValue::Byte(v as i8))
                }
                PrimitiveKind::Short if (i16::MIN as i64..=i16::MAX as i64).contains(&v) => {
                    Some(ConstValue::Short(v as i16))
                }
                PrimitiveKind::Char if (0..=u16::MAX as i64).contains(&v) => {
                    Some(ConstValue::Char(v as u16))
                }
                _ => None,
            }
        }
        PrimitiveKind::Int => {
            if !is_small_integral {
                return None;
            }
            integral.map(|v| ConstValue::Int(v as i32))
        }
        PrimitiveKind::Long => integral.map(ConstValue::Long),
        PrimitiveKind::Float => match value {
            ConstValue::Float(v) => Some(ConstValue::Float(v)),
            _ => integral.map(|v| ConstValue::Float(v as f32)),
        },
        PrimitiveKind::Double => match value {
            ConstValue::Double(v) => Some(ConstValue::Double(v)),
            ConstValue::Float(v) => Some(ConstValue::Double(v as f64)),
            _ => integral.map(|v| ConstValue::Double(v as f64)),
        },
    }
}

/// Explicit cast conversion of a constant to a primitive kind, with Java's
/// truncation and saturation rules.
fn cast_value(value: ConstValue, target: PrimitiveKind) -> Option<ConstValue> {
    if value.kind() == Some(target) {
        return Some(value);
    }
    if target == PrimitiveKind::Boolean || matches!(value, ConstValue::Boolean(_)) {
        return None;
    }
    // Integral sources truncate; floating sources convert to int/long with
    // saturation first.
    enum Num {
        I(i64),
        F(f64),
    }
    let num = match value {
        ConstValue::Byte(v) => Num::I(v as i64),
        ConstValue::Short(v) => Num::I(v as i64),
        ConstValue::Char(v) => Num::I(v as i64),
        ConstValue::Int(v) => Num::I(v as i64),
        ConstValue::Long(v) => Num::I(v),
        ConstValue::Float(v) => Num::F(v as f64),
        ConstValue::Double(v) => Num::F(v),
        ConstValue::Boolean(_) | ConstValue::String(_) => return None,
    };
    Some(match target {
        PrimitiveKind::Byte => ConstValue::Byte(match num {
            Num::I(v) => v as i8,
            Num::F(v) => (v as i32) as i8,
        }),
        PrimitiveKind::Short => ConstValue::Short(match num {
            Num::I(v) => v as i16,
            Num::F(v) => (v as i32) as i16,
        }),
        PrimitiveKind::Char => ConstValue::Char(match num {
            Num::I(v) => v as u16,
            Num::F(v) => (v as i32) as u16,
        }),
        PrimitiveKind::Int => ConstValue::Int(match num {
            Num::I(v) => v as i32,
            Num::F(v) => v as i32,
        }),
        PrimitiveKind::Long => ConstValue::Long(match num {
            Num::I(v) => v,
            Num::F(v) => v as i64,
        }),
        PrimitiveKind::Float => ConstValue::Float(match num {
            Num::I(v) => v as f32,
            Num::F(v) => v as f32,
        }),
        PrimitiveKind::Double => ConstValue::Double(match num {
            Num::I(v) => v as f64,
            Num::F(v) => v as f64,
        }),
        PrimitiveKind::Boolean => unreachable!("boolean casts handled above"),
    })
}
