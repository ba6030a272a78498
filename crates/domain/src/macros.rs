//! Macro for implementing Display and FromStr for stored status enums
//!
//! Ledger and audit enums are persisted as lowercase strings. The macro keeps
//! the string mapping in a single place and parses case-insensitively, so rows
//! written by older versions (or by hand) still load.
//!
//! # Example
//!
//! ```rust
//! use pdpsync_domain::impl_domain_status_conversions;
//!
//! #[derive(Debug, Clone, Copy, PartialEq, Eq)]
//! pub enum Delivery {
//!     Queued,
//!     Delivered,
//! }
//!
//! impl_domain_status_conversions!(Delivery {
//!     Queued => "queued",
//!     Delivered => "delivered",
//! });
//!
//! assert_eq!(Delivery::Queued.to_string(), "queued");
//! assert_eq!("DELIVERED".parse::<Delivery>(), Ok(Delivery::Delivered));
//! ```

/// Implements Display and FromStr traits for status enums
///
/// `$str` must be lowercase; parsing lowercases its input before matching.
#[macro_export]
macro_rules! impl_domain_status_conversions {
    ($enum_name:ident { $($variant:ident => $str:expr),+ $(,)? }) => {
        impl std::fmt::Display for $enum_name {
            fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
                match self {
                    $(Self::$variant => f.write_str($str),)+
                }
            }
        }

        impl std::str::FromStr for $enum_name {
            type Err = String;

            fn from_str(s: &str) -> ::std::result::Result<Self, Self::Err> {
                match s.to_lowercase().as_str() {
                    $($str => Ok(Self::$variant),)+
                    _ => Err(format!("Invalid {}: {}", stringify!($enum_name), s)),
                }
            }
        }
    };
}
