//! Named IDs for commodities and components.
use anyhow::{Context, Result};
use indexmap::IndexSet;
use std::borrow::Borrow;
use std::hash::Hash;

/// Define a cheaply cloned, string-backed ID type which can be looked up by `&str`
macro_rules! define_id_type {
    ($name:ident) => {
        #[derive(
            Clone,
            Debug,
            PartialEq,
            Eq,
            std::hash::Hash,
            derive_more::Display,
            serde::Deserialize,
            serde::Serialize,
        )]
        #[doc = concat!("A string-backed ID (`", stringify!($name), "`)")]
        pub struct $name(pub std::rc::Rc<str>);

        impl $name {
            /// Create an ID from a string slice
            pub fn new(id: &str) -> Self {
                Self(id.into())
            }

            /// The ID's name
            pub fn as_str(&self) -> &str {
                &self.0
            }
        }

        impl std::borrow::Borrow<str> for $name {
            fn borrow(&self) -> &str {
                &self.0
            }
        }

        impl From<&str> for $name {
            fn from(id: &str) -> Self {
                Self::new(id)
            }
        }

        impl From<String> for $name {
            fn from(id: String) -> Self {
                Self(id.into())
            }
        }
    };
}
pub(crate) use define_id_type;

#[cfg(test)]
define_id_type!(GenericID);

/// Resolve IDs read from input files against the IDs already known
pub trait IDCollection<ID> {
    /// The stored copy of `id`, or an error if it is unknown
    fn get_id_by_str(&self, id: &str) -> Result<ID>;
}

impl<ID> IDCollection<ID> for IndexSet<ID>
where
    ID: Eq + Hash + Borrow<str> + Clone,
{
    fn get_id_by_str(&self, id: &str) -> Result<ID> {
        self.get(id)
            .cloned()
            .with_context(|| format!("Unknown ID {id} found"))
    }
}
