//! Order-preserving map decoding.
//!
//! JSON objects in the RPC schema carry meaning in their member order (endpoint
//! match order, topic segment order), and repeated keys must survive decoding so
//! that the first declaration can win. Decoding into a map type loses both.

use std::fmt;
use std::marker::PhantomData;

use serde::de::{MapAccess, Visitor};
use serde::{Deserialize, Deserializer};

/// A JSON object decoded as its entries, in document order, duplicates kept.
#[derive(Debug, Clone)]
pub(crate) struct OrderedEntries<T>(pub(crate) Vec<(String, T)>);

impl<T> Default for OrderedEntries<T> {
    fn default() -> Self { Self(Vec::new()) }
}

impl<'de, T: Deserialize<'de>> Deserialize<'de> for OrderedEntries<T> {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        struct EntriesVisitor<T>(PhantomData<T>);

        impl<'de, T: Deserialize<'de>> Visitor<'de> for EntriesVisitor<T> {
            type Value = OrderedEntries<T>;

            fn expecting(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                f.write_str("an object")
            }

            fn visit_map<A: MapAccess<'de>>(self, mut map: A) -> Result<Self::Value, A::Error> {
                let mut entries = Vec::with_capacity(map.size_hint().unwrap_or(0));
                while let Some((key, value)) = map.next_entry::<String, T>()? {
                    entries.push((key, value));
                }
                Ok(OrderedEntries(entries))
            }
        }

        deserializer.deserialize_map(EntriesVisitor(PhantomData))
    }
}
