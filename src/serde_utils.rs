//! Serde helpers shared by the input DTOs.

use serde::{Deserialize, Deserializer};
use std::fmt;
use std::marker::PhantomData;

/// Deserialize a nullable field of a partial update.
///
/// Absent means "leave unchanged" (`None`), `null` means "clear"
/// (`Some(None)`), anything else sets the value (`Some(Some(v))`). Pair it
/// with `#[serde(default)]` so absent fields hit the default.
///
/// ```ignore
/// #[derive(Deserialize)]
/// struct IssueUpdate {
///     #[serde(default, deserialize_with = "crate::serde_utils::double_option")]
///     assignee_id: Option<Option<i64>>,
/// }
/// ```
pub fn double_option<'de, T, D>(de: D) -> Result<Option<Option<T>>, D::Error>
where
    T: Deserialize<'de>,
    D: Deserializer<'de>,
{
    struct DoubleOptionVisitor<T> {
        _inner: PhantomData<T>,
    }

    impl<'de, T: Deserialize<'de>> serde::de::Visitor<'de> for DoubleOptionVisitor<T> {
        type Value = Option<Option<T>>;

        fn expecting(&self, formatter: &mut fmt::Formatter) -> fmt::Result {
            formatter.write_str("option")
        }

        fn visit_none<E>(self) -> Result<Self::Value, E>
        where
            E: serde::de::Error,
        {
            Ok(Some(None))
        }

        fn visit_some<D>(self, deserializer: D) -> Result<Self::Value, D::Error>
        where
            D: Deserializer<'de>,
        {
            T::deserialize(deserializer).map(|val| Some(Some(val)))
        }
    }

    de.deserialize_option(DoubleOptionVisitor {
        _inner: PhantomData,
    })
}
