//! Label alphabets for trials and sub-trial timepoints.
//!
//! Both alphabets are bit sets over a `u64`. Individual labels occupy a single
//! bit and named composites are unions of them, so a query such as
//! `ActionLabels::MISS_LEFT | ActionLabels::MISS_RIGHT` matches every miss trial.

/// Generates a bit-set newtype with named primitive bits and composites.
macro_rules! label_set {
    (
        $(#[$meta:meta])*
        pub struct $name:ident {
            primitives {
                $( $(#[$pdoc:meta])* $prim:ident = $bit:literal, $pname:literal; )*
            }
            composites {
                $( $(#[$cdoc:meta])* $comp:ident = $( $part:ident )|+ , $cname:literal; )*
            }
        }
    ) => {
        $(#[$meta])*
        #[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash)]
        pub struct $name(u64);

        impl $name {
            $( $(#[$pdoc])* pub const $prim: Self = Self(1 << $bit); )*
            $( $(#[$cdoc])* pub const $comp: Self = Self(0 $( | Self::$part.0 )+); )*

            /// Every single-bit label with its name, in bit order.
            pub const PRIMITIVES: &'static [(&'static str, Self)] = &[
                $( ($pname, Self::$prim), )*
            ];

            /// Every named union of primitives.
            pub const COMPOSITES: &'static [(&'static str, Self)] = &[
                $( ($cname, Self::$comp), )*
            ];

            /// The empty set.
            pub const fn empty() -> Self {
                Self(0)
            }

            /// Wrap raw bits as stored in a label array cell.
            pub const fn from_bits(bits: u64) -> Self {
                Self(bits)
            }

            /// Raw bits for storage.
            pub const fn bits(self) -> u64 {
                self.0
            }

            pub const fn is_empty(self) -> bool {
                self.0 == 0
            }

            /// True if every bit of `other` is set in `self`.
            pub const fn contains(self, other: Self) -> bool {
                self.0 & other.0 == other.0
            }

            /// True if `self` and `other` share at least one bit.
            pub const fn intersects(self, other: Self) -> bool {
                self.0 & other.0 != 0
            }

            /// Look up a primitive or composite by its snake_case name.
            pub fn from_name(name: &str) -> Option<Self> {
                Self::PRIMITIVES
                    .iter()
                    .chain(Self::COMPOSITES.iter())
                    .find(|(n, _)| *n == name)
                    .map(|(_, v)| *v)
            }

            /// Names of the primitives set in `self`.
            pub fn names(self) -> Vec<&'static str> {
                Self::PRIMITIVES
                    .iter()
                    .filter(|(_, v)| self.contains(*v))
                    .map(|(n, _)| *n)
                    .collect()
            }
        }

        impl std::ops::BitOr for $name {
            type Output = Self;

            fn bitor(self, rhs: Self) -> Self {
                Self(self.0 | rhs.0)
            }
        }

        impl std::ops::BitOrAssign for $name {
            fn bitor_assign(&mut self, rhs: Self) {
                self.0 |= rhs.0;
            }
        }

        impl std::ops::BitAnd for $name {
            type Output = Self;

            fn bitand(self, rhs: Self) -> Self {
                Self(self.0 & rhs.0)
            }
        }

        impl std::fmt::Display for $name {
            fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
                let names = self.names();
                if names.is_empty() {
                    write!(f, "none")
                } else {
                    write!(f, "{}", names.join("|"))
                }
            }
        }
    };
}

pub mod actions;
pub mod events;

pub use actions::ActionLabels;
pub use events::Events;
