/// Declares a closed set of string-valued options with its canonical spelling.
macro_rules! wire_enum {
    ($(#[$meta:meta])* $vis:vis enum $name:ident { $($(#[$vmeta:meta])* $variant:ident => $wire:literal),+ $(,)? }) => {
        $(#[$meta])*
        #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, serde::Serialize, serde::Deserialize)]
        $vis enum $name {
            $($(#[$vmeta])* #[serde(rename = $wire)] $variant),+
        }

        impl $name {
            pub const ALL: &'static [$name] = &[$($name::$variant),+];

            pub fn as_str(&self) -> &'static str {
                match self {
                    $($name::$variant => $wire),+
                }
            }

            /// Case-insensitive lookup of the canonical spelling
            pub fn parse(value: &str) -> Option<Self> {
                Self::ALL
                    .iter()
                    .copied()
                    .find(|candidate| candidate.as_str().eq_ignore_ascii_case(value))
            }

            pub fn names() -> Vec<&'static str> {
                Self::ALL.iter().map(|variant| variant.as_str()).collect()
            }
        }

        impl std::fmt::Display for $name {
            fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
                f.write_str(self.as_str())
            }
        }
    };
}

pub mod authentication_flow;
pub mod client_scope;
pub mod common;
pub mod component;
pub mod config_schema;
pub mod default_roles;
pub mod identity_provider_mapper;
pub mod ldap_federation;
pub mod ldap_mapper;
pub mod realm;

pub use authentication_flow::*;
pub use client_scope::*;
pub use common::*;
pub use component::*;
pub use config_schema::*;
pub use default_roles::*;
pub use identity_provider_mapper::*;
pub use ldap_federation::*;
pub use ldap_mapper::*;
pub use realm::*;
