//! Deserialization shared by the status enums.
//!
//! Status values arrive either as their name (`"SHIPPED"`, `"shipped"`) or
//! as the numeric code stored in the database (`3`).

use std::fmt;
use std::marker::PhantomData;

use serde::Deserializer;
use serde::de::{self, Visitor};

pub(crate) trait Coded: Sized {
    const EXPECTING: &'static str;

    fn from_code(code: i64) -> Option<Self>;

    fn from_name(name: &str) -> Option<Self>;
}

pub(crate) fn deserialize<'de, D, T>(deserializer: D) -> Result<T, D::Error>
where
    D: Deserializer<'de>,
    T: Coded,
{
    deserializer.deserialize_any(CodedVisitor(PhantomData))
}

struct CodedVisitor<T>(PhantomData<T>);

impl<T: Coded> Visitor<'_> for CodedVisitor<T> {
    type Value = T;

    fn expecting(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(T::EXPECTING)
    }

    fn visit_str<E: de::Error>(self, v: &str) -> Result<T, E> {
        T::from_name(v).ok_or_else(|| E::invalid_value(de::Unexpected::Str(v), &self))
    }

    fn visit_i64<E: de::Error>(self, v: i64) -> Result<T, E> {
        T::from_code(v).ok_or_else(|| E::invalid_value(de::Unexpected::Signed(v), &self))
    }

    fn visit_u64<E: de::Error>(self, v: u64) -> Result<T, E> {
        i64::try_from(v)
            .ok()
            .and_then(T::from_code)
            .ok_or_else(|| E::invalid_value(de::Unexpected::Unsigned(v), &self))
    }
}
