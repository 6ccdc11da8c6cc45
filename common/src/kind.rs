//! Macros for defining kind enums.

/// Macro for defining a kind enum coded as a single [`u8`].
///
/// The generated enum is displayed and parsed in `snake_case`, and maps to
/// and from its [`u8`] code one-to-one.
///
/// # Example
///
/// ```rust
/// common::define_kind! {
///     #[doc = "Shape kind."]
///     enum Kind {
///         #[doc = "A cube"]
///         Cube = 1,
///
///         #[doc = "A sphere"]
///         Sphere = 2,
///     }
/// }
///
/// assert_eq!(Kind::from_u8(2), Some(Kind::Sphere));
/// assert_eq!(Kind::from_u8(3), None);
/// assert_eq!(Kind::Cube.to_string(), "cube");
/// ```
#[expect(clippy::module_name_repetitions, reason = "more readable")]
#[macro_export]
macro_rules! define_kind {
    (
        #[doc = $doc:literal]
        enum $name:ident {
            $(
                #[doc = $variant_doc:literal]
                $variant:ident = $value:expr
            ),* $(,)?
        }
    ) => {
        #[derive(
            Clone,
            Copy,
            Debug,
            $crate::private::strum::Display,
            $crate::private::strum::EnumString,
            Eq,
            Hash,
            PartialEq,
        )]
        #[doc = $doc]
        #[repr(u8)]
        #[strum(serialize_all = "snake_case")]
        pub enum $name {
            $(
                 #[doc = $variant_doc]
                 $variant = $value,
            )*
        }

        impl $name {
            /// All the variants, in the order of their declaration.
            pub const ALL: &'static [Self] = &[$(Self::$variant),*];

            /// Converts this into its [`u8`] representation.
            #[must_use]
            pub const fn u8(self) -> u8 {
                self as u8
            }

            /// Converts the provided [`u8`] code back into a variant.
            ///
            /// [`None`] is returned if the `code` is not known.
            #[must_use]
            pub const fn from_u8(code: u8) -> Option<Self> {
                match code {
                    $(
                        v if v == Self::$variant.u8() => Some(Self::$variant),
                    )*
                    _ => None,
                }
            }
        }
    };
}
