/// Declares a transparent numeric id newtype with `From` conversions both ways
/// and a `Debug` impl using the given format.
#[macro_export]
macro_rules! custom_type {
    ($(#[$meta:meta])* $name:ident, $target:ty, $fmt:literal) => {
        $(#[$meta])*
        #[repr(transparent)]
        #[derive(Clone, Copy, Default, PartialEq, Eq, PartialOrd, Ord, Hash)]
        pub struct $name($target);

        impl $name {
            pub const fn new(raw: $target) -> Self {
                Self(raw)
            }

            pub const fn raw(&self) -> $target {
                self.0
            }
        }

        impl core::fmt::Debug for $name {
            fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
                write!(f, $fmt, self.0)
            }
        }

        impl core::fmt::Display for $name {
            fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
                write!(f, $fmt, self.0)
            }
        }

        impl From<$target> for $name {
            fn from(value: $target) -> Self {
                Self(value)
            }
        }

        impl From<$name> for $target {
            fn from(value: $name) -> Self {
                value.0
            }
        }
    };
}
