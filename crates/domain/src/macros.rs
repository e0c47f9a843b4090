//! Macro for implementing Display and FromStr for label-valued enums
//!
//! Several enums end up as metric label values or configuration strings
//! (`EntityClass`, `LogFormat`). This macro gives them one spelling for both
//! directions, with case-insensitive parsing.
//!
//! # Example
//!
//! ```rust
//! use virtstat_domain::impl_str_conversions;
//!
//! #[derive(Debug, Clone, Copy, PartialEq, Eq)]
//! pub enum Scope {
//!     Listing,
//!     Entity,
//! }
//!
//! impl_str_conversions!(Scope {
//!     Listing => "listing",
//!     Entity => "entity",
//! });
//!
//! assert_eq!(Scope::Listing.to_string(), "listing");
//! ```

/// Implements Display and FromStr for a fieldless enum
///
/// # Arguments
///
/// * `$enum_name` - The name of the enum type
/// * `$variant => $str` - Mapping of enum variants to their lowercase string
///   representations
#[macro_export]
macro_rules! impl_str_conversions {
    ($enum_name:ident { $($variant:ident => $str:expr),+ $(,)? }) => {
        impl ::std::fmt::Display for $enum_name {
            fn fmt(&self, f: &mut ::std::fmt::Formatter<'_>) -> ::std::fmt::Result {
                match self {
                    $(Self::$variant => f.write_str($str),)+
                }
            }
        }

        impl ::std::str::FromStr for $enum_name {
            type Err = ::std::string::String;

            fn from_str(s: &str) -> ::std::result::Result<Self, Self::Err> {
                match s.to_lowercase().as_str() {
                    $($str => ::std::result::Result::Ok(Self::$variant),)+
                    _ => ::std::result::Result::Err(::std::format!(
                        "Invalid {}: {}",
                        ::std::stringify!($enum_name),
                        s
                    )),
                }
            }
        }
    };
}
