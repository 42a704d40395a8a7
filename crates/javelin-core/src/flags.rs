//! Access and modifier flags.
//!
//! Each declaration target gets its own `u16` bit-set newtype because the JVM
//! reuses bit values with different meanings per target: `0x0040` is
//! `ACC_VOLATILE` on a field, `ACC_BRIDGE` on a method and
//! `ACC_STATIC_PHASE` on a `requires` directive. Keeping the enumerations
//! distinct makes those collisions unrepresentable at the type level.

macro_rules! define_flags {
    (
        $(#[$meta:meta])*
        $name:ident {
            $($flag:ident = $value:expr;)*
        }
    ) => {
        $(#[$meta])*
        #[derive(Clone, Copy, Default, PartialEq, Eq, Hash)]
        pub struct $name(u16);

        impl $name {
            pub const EMPTY: $name = $name(0);
            $(pub const $flag: $name = $name($value);)*

            #[inline]
            pub const fn from_bits(bits: u16) -> Self {
                Self(bits)
            }

            #[inline]
            pub const fn bits(self) -> u16 {
                self.0
            }

            #[inline]
            pub const fn contains(self, other: Self) -> bool {
                self.0 & other.0 == other.0
            }

            #[inline]
            pub const fn union(self, other: Self) -> Self {
                Self(self.0 | other.0)
            }

            #[inline]
            pub const fn without(self, other: Self) -> Self {
                Self(self.0 & !other.0)
            }

            #[inline]
            pub const fn is_empty(self) -> bool {
                self.0 == 0
            }
        }

        impl std::ops::BitOr for $name {
            type Output = Self;

            fn bitor(self, rhs: Self) -> Self {
                self.union(rhs)
            }
        }

        impl std::ops::BitOrAssign for $name {
            fn bitor_assign(&mut self, rhs: Self) {
                self.0 |= rhs.0;
            }
        }

        impl std::fmt::Debug for $name {
            fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
                write!(f, "{}(", stringify!($name))?;
                let mut first = true;
                $(
                    if self.contains(Self::$flag) {
                        if !first {
                            f.write_str(" | ")?;
                        }
                        f.write_str(stringify!($flag))?;
                        first = false;
                    }
                )*
                if first {
                    f.write_str("0")?;
                }
                f.write_str(")")
            }
        }
    };
}

define_flags! {
    /// Flags on a class, interface, enum, annotation or record declaration.
    ClassFlags {
        PUBLIC = 0x0001;
        PRIVATE = 0x0002;
        PROTECTED = 0x0004;
        STATIC = 0x0008;
        FINAL = 0x0010;
        SUPER = 0x0020;
        INTERFACE = 0x0200;
        ABSTRACT = 0x0400;
        SYNTHETIC = 0x1000;
        ANNOTATION = 0x2000;
        ENUM = 0x4000;
        MODULE = 0x8000;
    }
}

define_flags! {
    /// Flags on a field declaration.
    FieldFlags {
        PUBLIC = 0x0001;
        PRIVATE = 0x0002;
        PROTECTED = 0x0004;
        STATIC = 0x0008;
        FINAL = 0x0010;
        VOLATILE = 0x0040;
        TRANSIENT = 0x0080;
        SYNTHETIC = 0x1000;
        ENUM = 0x4000;
    }
}

define_flags! {
    /// Flags on a method declaration.
    MethodFlags {
        PUBLIC = 0x0001;
        PRIVATE = 0x0002;
        PROTECTED = 0x0004;
        STATIC = 0x0008;
        FINAL = 0x0010;
        SYNCHRONIZED = 0x0020;
        BRIDGE = 0x0040;
        VARARGS = 0x0080;
        NATIVE = 0x0100;
        ABSTRACT = 0x0400;
        STRICT = 0x0800;
        SYNTHETIC = 0x1000;
    }
}

define_flags! {
    /// Flags on a formal method parameter (`MethodParameters` attribute).
    ParamFlags {
        FINAL = 0x0010;
        SYNTHETIC = 0x1000;
        MANDATED = 0x8000;
    }
}

define_flags! {
    /// Flags on a module declaration.
    ModuleFlags {
        OPEN = 0x0020;
        SYNTHETIC = 0x1000;
        MANDATED = 0x8000;
    }
}

define_flags! {
    /// Flags on a `requires` directive.
    ///
    /// The `static` source keyword maps to `STATIC_PHASE` (`0x0040`), not the
    /// member `ACC_STATIC` bit.
    RequiresFlags {
        TRANSITIVE = 0x0020;
        STATIC_PHASE = 0x0040;
        SYNTHETIC = 0x1000;
        MANDATED = 0x8000;
    }
}

define_flags! {
    /// Flags on an `exports` or `opens` directive.
    ExportFlags {
        SYNTHETIC = 0x1000;
        MANDATED = 0x8000;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn union_and_contains() {
        let flags = FieldFlags::PUBLIC | FieldFlags::STATIC | FieldFlags::FINAL;
        assert!(flags.contains(FieldFlags::STATIC));
        assert!(!flags.contains(FieldFlags::PRIVATE));
        assert_eq!(flags.bits(), 0x0019);
        assert_eq!(flags.without(FieldFlags::STATIC).bits(), 0x0011);
    }

    #[test]
    fn static_phase_is_not_member_static() {
        // Same source keyword, different bit per target.
        assert_ne!(RequiresFlags::STATIC_PHASE.bits(), FieldFlags::STATIC.bits());
        assert_eq!(RequiresFlags::STATIC_PHASE.bits(), 0x0040);
    }

    #[test]
    fn debug_lists_flag_names() {
        let flags = MethodFlags::PUBLIC | MethodFlags::VARARGS;
        assert_eq!(format!("{flags:?}"), "MethodFlags(PUBLIC | VARARGS)");
        assert_eq!(format!("{:?}", MethodFlags::EMPTY), "MethodFlags(0)");
    }
}
