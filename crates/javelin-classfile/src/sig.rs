//! The generic signature grammar.
//!
//! A structured model of the `Signature` attribute grammar (`ClassSignature`,
//! `MethodSignature`, `ReferenceTypeSignature`), a writer that prints it, and
//! a recursive-descent parser that reads it back. Writing then parsing then
//! re-writing is the identity on every signature Javelin produces, which is
//! what the round-trip tests lean on.

use javelin_core::{Name, PrimitiveKind};

use crate::error::{Error, Result};

/// A type signature.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TySig {
    Void,
    Prim(PrimitiveKind),
    Class(ClassTySig),
    TyVar(Name),
    Array(Box<TySig>),
}

/// A class type signature: a package prefix plus one or more simple class
/// parts. A single part whose name contains `$` is the collapsed
/// `Louter$Inner;` form; multiple parts print as the expanded
/// `Louter<...>.Inner<...>;` form.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ClassTySig {
    /// Slash-separated package, empty for the default package.
    pub package: String,
    pub classes: Vec<SimpleClassTySig>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SimpleClassTySig {
    pub name: Name,
    pub targs: Vec<TyArgSig>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TyArgSig {
    /// `*`
    Unbounded,
    /// `+sig`
    Upper(TySig),
    /// `-sig`
    Lower(TySig),
    Exact(TySig),
}

/// `<name:classbound:ifacebound...>`; an absent class bound prints as the
/// leading-colon form.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TyParamSig {
    pub name: Name,
    pub class_bound: Option<TySig>,
    pub interface_bounds: Vec<TySig>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ClassSig {
    pub tparams: Vec<TyParamSig>,
    pub superclass: ClassTySig,
    pub interfaces: Vec<ClassTySig>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MethodSig {
    pub tparams: Vec<TyParamSig>,
    pub params: Vec<TySig>,
    pub ret: TySig,
    pub exceptions: Vec<TySig>,
}

// === Writer ==================================================================

pub fn write_type(sig: &TySig) -> String {
    let mut out = String::new();
    push_type(&mut out, sig);
    out
}

pub fn write_class_sig(sig: &ClassSig) -> String {
    let mut out = String::new();
    push_tparams(&mut out, &sig.tparams);
    push_class_ty(&mut out, &sig.superclass);
    for iface in &sig.interfaces {
        push_class_ty(&mut out, iface);
    }
    out
}

pub fn write_method_sig(sig: &MethodSig) -> String {
    let mut out = String::new();
    push_tparams(&mut out, &sig.tparams);
    out.push('(');
    for param in &sig.params {
        push_type(&mut out, param);
    }
    out.push(')');
    push_type(&mut out, &sig.ret);
    for exception in &sig.exceptions {
        out.push('^');
        push_type(&mut out, exception);
    }
    out
}

fn push_type(out: &mut String, sig: &TySig) {
    match sig {
        TySig::Void => out.push('V'),
        TySig::Prim(kind) => out.push(prim_char(*kind)),
        TySig::Class(class) => push_class_ty(out, class),
        TySig::TyVar(name) => {
            out.push('T');
            out.push_str(name.as_str());
            out.push(';');
        }
        TySig::Array(elem) => {
            out.push('[');
            push_type(out, elem);
        }
    }
}

fn push_class_ty(out: &mut String, sig: &ClassTySig) {
    out.push('L');
    if !sig.package.is_empty() {
        out.push_str(&sig.package);
        out.push('/');
    }
    let mut first = true;
    for class in &sig.classes {
        if !first {
            out.push('.');
        }
        first = false;
        out.push_str(class.name.as_str());
        if !class.targs.is_empty() {
            out.push('<');
            for targ in &class.targs {
                push_targ(out, targ);
            }
            out.push('>');
        }
    }
    out.push(';');
}

fn push_targ(out: &mut String, targ: &TyArgSig) {
    match targ {
        TyArgSig::Unbounded => out.push('*'),
        TyArgSig::Upper(sig) => {
            out.push('+');
            push_type(out, sig);
        }
        TyArgSig::Lower(sig) => {
            out.push('-');
            push_type(out, sig);
        }
        TyArgSig::Exact(sig) => push_type(out, sig),
    }
}

fn push_tparams(out: &mut String, tparams: &[TyParamSig]) {
    if tparams.is_empty() {
        return;
    }
    out.push('<');
    for tparam in tparams {
        out.push_str(tparam.name.as_str());
        out.push(':');
        if let Some(bound) = &tparam.class_bound {
            push_type(out, bound);
        }
        for bound in &tparam.interface_bounds {
            out.push(':');
            push_type(out, bound);
        }
    }
    out.push('>');
}

fn prim_char(kind: PrimitiveKind) -> char {
    match kind {
        PrimitiveKind::Boolean => 'Z',
        PrimitiveKind::Byte => 'B',
        PrimitiveKind::Char => 'C',
        PrimitiveKind::Short => 'S',
        PrimitiveKind::Int => 'I',
        PrimitiveKind::Long => 'J',
        PrimitiveKind::Float => 'F',
        PrimitiveKind::Double => 'D',
    }
}

// === Parser ==================================================================

pub fn parse_type(text: &str) -> Result<TySig> {
    let mut parser = SigParser::new(text);
    let sig = parser.type_sig()?;
    parser.finish()?;
    Ok(sig)
}

pub fn parse_class_sig(text: &str) -> Result<ClassSig> {
    let mut parser = SigParser::new(text);
    let tparams = parser.tparams()?;
    let superclass = parser.class_ty()?;
    let mut interfaces = Vec::new();
    while !parser.at_end() {
        interfaces.push(parser.class_ty()?);
    }
    Ok(ClassSig {
        tparams,
        superclass,
        interfaces,
    })
}

pub fn parse_method_sig(text: &str) -> Result<MethodSig> {
    let mut parser = SigParser::new(text);
    let tparams = parser.tparams()?;
    parser.expect(b'(')?;
    let mut params = Vec::new();
    while parser.peek()? != b')' {
        params.push(parser.type_sig()?);
    }
    parser.expect(b')')?;
    let ret = parser.type_sig()?;
    let mut exceptions = Vec::new();
    while !parser.at_end() {
        parser.expect(b'^')?;
        exceptions.push(parser.type_sig()?);
    }
    Ok(MethodSig {
        tparams,
        params,
        ret,
        exceptions,
    })
}

struct SigParser<'a> {
    text: &'a str,
    pos: usize,
}

impl<'a> SigParser<'a> {
    fn new(text: &'a str) -> Self {
        Self { text, pos: 0 }
    }

    fn at_end(&self) -> bool {
        self.pos >= self.text.len()
    }

    fn peek(&self) -> Result<u8> {
        self.text
            .as_bytes()
            .get(self.pos)
            .copied()
            .ok_or(Error::UnexpectedEof)
    }

    fn bump(&mut self) -> Result<u8> {
        let b = self.peek()?;
        self.pos += 1;
        Ok(b)
    }

    fn expect(&mut self, expected: u8) -> Result<u8> {
        let b = self.bump()?;
        if b != expected {
            return Err(Error::InvalidSignature(self.text.to_owned()));
        }
        Ok(b)
    }

    fn finish(&self) -> Result<()> {
        if self.at_end() {
            Ok(())
        } else {
            Err(Error::TrailingInput(self.text.to_owned()))
        }
    }

    /// An identifier: everything up to one of the grammar's delimiters.
    fn identifier(&mut self) -> Result<&'a str> {
        let start = self.pos;
        while let Ok(b) = self.peek() {
            if matches!(b, b';' | b':' | b'<' | b'>' | b'.' | b'/') {
                break;
            }
            self.pos += 1;
        }
        if self.pos == start {
            return Err(Error::InvalidSignature(self.text.to_owned()));
        }
        Ok(&self.text[start..self.pos])
    }

    fn type_sig(&mut self) -> Result<TySig> {
        match self.peek()? {
            b'V' => {
                self.pos += 1;
                Ok(TySig::Void)
            }
            b'Z' => self.prim(PrimitiveKind::Boolean),
            b'B' => self.prim(PrimitiveKind::Byte),
            b'C' => self.prim(PrimitiveKind::Char),
            b'S' => self.prim(PrimitiveKind::Short),
            b'I' => self.prim(PrimitiveKind::Int),
            b'J' => self.prim(PrimitiveKind::Long),
            b'F' => self.prim(PrimitiveKind::Float),
            b'D' => self.prim(PrimitiveKind::Double),
            b'[' => {
                self.pos += 1;
                Ok(TySig::Array(Box::new(self.type_sig()?)))
            }
            b'T' => {
                self.pos += 1;
                let name = self.identifier()?;
                self.expect(b';')?;
                Ok(TySig::TyVar(Name::from(name)))
            }
            b'L' => Ok(TySig::Class(self.class_ty()?)),
            _ => Err(Error::InvalidSignature(self.text.to_owned())),
        }
    }

    fn prim(&mut self, kind: PrimitiveKind) -> Result<TySig> {
        self.pos += 1;
        Ok(TySig::Prim(kind))
    }

    fn class_ty(&mut self) -> Result<ClassTySig> {
        self.expect(b'L')?;
        // Package segments and the first simple name are both
        // slash-separated; the last segment before `<`, `.` or `;` is the
        // class name.
        let mut package = String::new();
        let mut name = self.identifier()?;
        while self.peek()? == b'/' {
            self.pos += 1;
            if !package.is_empty() {
                package.push('/');
            }
            package.push_str(name);
            name = self.identifier()?;
        }
        let mut classes = vec![SimpleClassTySig {
            name: Name::from(name),
            targs: self.targs()?,
        }];
        while self.peek()? == b'.' {
            self.pos += 1;
            let name = self.identifier()?;
            classes.push(SimpleClassTySig {
                name: Name::from(name),
                targs: self.targs()?,
            });
        }
        self.expect(b';')?;
        Ok(ClassTySig { package, classes })
    }

    fn targs(&mut self) -> Result<Vec<TyArgSig>> {
        if self.at_end() || self.peek()? != b'<' {
            return Ok(Vec::new());
        }
        self.pos += 1;
        let mut targs = Vec::new();
        while self.peek()? != b'>' {
            targs.push(match self.peek()? {
                b'*' => {
                    self.pos += 1;
                    TyArgSig::Unbounded
                }
                b'+' => {
                    self.pos += 1;
                    TyArgSig::Upper(self.type_sig()?)
                }
                b'-' => {
                    self.pos += 1;
                    TyArgSig::Lower(self.type_sig()?)
                }
                _ => TyArgSig::Exact(self.type_sig()?),
            });
        }
        self.expect(b'>')?;
        Ok(targs)
    }

    fn tparams(&mut self) -> Result<Vec<TyParamSig>> {
        if self.at_end() || self.peek()? != b'<' {
            return Ok(Vec::new());
        }
        self.pos += 1;
        let mut tparams = Vec::new();
        while self.peek()? != b'>' {
            let name = Name::from(self.identifier()?);
            self.expect(b':')?;
            let class_bound = if matches!(self.peek()?, b':') {
                None
            } else {
                Some(self.type_sig()?)
            };
            let mut interface_bounds = Vec::new();
            while self.peek()? == b':' {
                self.pos += 1;
                interface_bounds.push(self.type_sig()?);
            }
            tparams.push(TyParamSig {
                name,
                class_bound,
                interface_bounds,
            });
        }
        self.expect(b'>')?;
        Ok(tparams)
    }
}

#[cfg(test)]
mod tests {
    use pretty_assertions::assert_eq;

    use super::*;

    fn roundtrip_type(text: &str) {
        let sig = parse_type(text).unwrap();
        assert_eq!(write_type(&sig), text);
    }

    #[test]
    fn types_round_trip() {
        roundtrip_type("Ljava/util/List;");
        roundtrip_type("Ltest/Outer$Inner;");
        roundtrip_type("Ltest/Outer<Ljava/lang/Object;>.Inner<Ljava/lang/Object;>;");
        roundtrip_type("Ltest/Test<*-Ljava/lang/Object;+Ljava/lang/Object;>;");
        roundtrip_type("TX;");
        roundtrip_type("[[[Z");
        roundtrip_type("LOuter$Inner;");
        roundtrip_type("Ljava/util/Map<TK;TV;>;");
    }

    #[test]
    fn default_package_has_empty_prefix() {
        let sig = parse_type("LOuter$Inner;").unwrap();
        match &sig {
            TySig::Class(class) => {
                assert_eq!(class.package, "");
                assert_eq!(class.classes.len(), 1);
                assert_eq!(class.classes[0].name.as_str(), "Outer$Inner");
            }
            other => panic!("expected class signature, got {other:?}"),
        }
    }

    #[test]
    fn class_sigs_round_trip() {
        for text in [
            "Ljava/lang/Object;",
            "<T:Ljava/lang/Object;>Ljava/lang/Object;Ljava/util/List<TT;>;",
            "<T:Ljava/lang/Object;:Ljava/lang/Comparable<TT;>;>Ljava/lang/Object;",
            "<T::Ljava/io/Serializable;>Ljava/lang/Object;",
        ] {
            let sig = parse_class_sig(text).unwrap();
            assert_eq!(write_class_sig(&sig), text);
        }
    }

    #[test]
    fn method_sigs_round_trip() {
        for text in [
            "()V",
            "(I)Ljava/lang/String;",
            "<T:Ljava/lang/Number;>(TT;)TT;",
            "<X:Ljava/lang/Object;>()V^TX;",
            "(Ljava/util/List<*>;)V^Ljava/io/IOException;",
        ] {
            let sig = parse_method_sig(text).unwrap();
            assert_eq!(write_method_sig(&sig), text);
        }
    }

    #[test]
    fn interface_only_bound_keeps_leading_colon() {
        let sig = parse_class_sig("<T::Ljava/io/Serializable;>Ljava/lang/Object;").unwrap();
        assert_eq!(sig.tparams[0].class_bound, None);
        assert_eq!(sig.tparams[0].interface_bounds.len(), 1);
    }

    #[test]
    fn malformed_signatures_are_rejected() {
        assert!(parse_type("Q").is_err());
        assert!(parse_type("Ljava/util/List").is_err());
        assert!(parse_type("Ljava/util/List;I").is_err());
        assert!(parse_method_sig("(I").is_err());
    }
}
