//! # Event Arguments
//!
//! [`Argument`] is the payload type passed across the plugin/engine boundary.
//! It holds at most one of five alternatives:
//!
//! | Alternative      | Rust type        | Textual form                 |
//! |------------------|------------------|------------------------------|
//! | integer          | `i32`            | decimal                      |
//! | float            | `f32`            | fixed, six fractional digits |
//! | object id        | [`ObjectId`]     | lowercase hex, no prefix     |
//! | text             | `String`         | verbatim                     |
//! | effect handle    | [`EffectHandle`] | `EffectID:<id>`              |
//!
//! Non-finite floats render as `nan`, `-nan`, `inf` and `-inf`.
//!
//! Typed access goes through [`ArgumentValue`], which is sealed and
//! implemented for exactly these five types, so asking for any other type is
//! a compile error.
//!
//! ```rust
//! use plugin_events::{Argument, ObjectId};
//!
//! let mut arg = Argument::default();
//! *arg.get_or_insert_with(|| 0i32) += 5;
//! assert_eq!(arg.get::<i32>(), Some(&5));
//! assert_eq!(arg.to_string(), "5");
//!
//! arg.set(ObjectId(0x1f));
//! assert_eq!(arg.get::<i32>(), None);
//! assert_eq!(arg.to_string(), "1f");
//! ```

use serde::{Deserialize, Serialize};
use std::fmt;

/// Ordered list of arguments handed to a callback.
pub type ArgumentStack = Vec<Argument>;

/// Opaque engine object identifier.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ObjectId(pub u32);

impl ObjectId {
    /// The engine's "no object" sentinel.
    pub const INVALID: ObjectId = ObjectId(0x7F00_0000);

    pub fn is_valid(self) -> bool {
        self != Self::INVALID
    }
}

impl Default for ObjectId {
    fn default() -> Self {
        Self::INVALID
    }
}

impl fmt::Display for ObjectId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:x}", self.0)
    }
}

/// Canonical textual form of an object identifier.
pub fn object_id_to_string(id: ObjectId) -> String {
    id.to_string()
}

/// Reference to an engine-side effect. Only the identifier is visible here.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct EffectHandle {
    pub id: u64,
}

impl EffectHandle {
    pub fn new(id: u64) -> Self {
        Self { id }
    }
}

/// Which alternative an [`Argument`] currently holds.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ArgumentKind {
    Int,
    Float,
    Object,
    String,
    Effect,
}

/// Tagged union carried by events and returned by callbacks.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Argument {
    #[default]
    Empty,
    Int(i32),
    Float(f32),
    Object(ObjectId),
    String(String),
    Effect(EffectHandle),
}

impl Argument {
    /// Returns the populated value of type `T`, if that alternative is held.
    pub fn get<T: ArgumentValue>(&self) -> Option<&T> {
        T::extract(self)
    }

    /// Mutable access to the `T` alternative, if it is held.
    pub fn get_mut<T: ArgumentValue>(&mut self) -> Option<&mut T> {
        T::extract_mut(self)
    }

    /// Returns the `T` slot, populating it with `init()` first when another
    /// alternative (or nothing) is held.
    pub fn get_or_insert_with<T: ArgumentValue>(&mut self, init: impl FnOnce() -> T) -> &mut T {
        T::slot(self, init)
    }

    /// Replaces whatever is held with `value`.
    pub fn set<T: ArgumentValue>(&mut self, value: T) {
        *self = value.into_argument();
    }

    /// Moves the `T` alternative out, leaving the argument empty. Leaves the
    /// argument untouched when a different alternative is held.
    pub fn take<T: ArgumentValue>(&mut self) -> Option<T> {
        match T::from_argument(std::mem::take(self)) {
            Ok(value) => Some(value),
            Err(other) => {
                *self = other;
                None
            }
        }
    }

    pub fn is_empty(&self) -> bool {
        matches!(self, Argument::Empty)
    }

    pub fn kind(&self) -> Option<ArgumentKind> {
        match self {
            Argument::Empty => None,
            Argument::Int(_) => Some(ArgumentKind::Int),
            Argument::Float(_) => Some(ArgumentKind::Float),
            Argument::Object(_) => Some(ArgumentKind::Object),
            Argument::String(_) => Some(ArgumentKind::String),
            Argument::Effect(_) => Some(ArgumentKind::Effect),
        }
    }
}

// Variant order matches the fixed int, float, object, text, effect precedence.
impl fmt::Display for Argument {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Argument::Int(value) => write!(f, "{}", value),
            Argument::Float(value) if value.is_nan() => {
                f.write_str(if value.is_sign_negative() { "-nan" } else { "nan" })
            }
            Argument::Float(value) => write!(f, "{:.6}", value),
            Argument::Object(id) => f.write_str(&object_id_to_string(*id)),
            Argument::String(text) => f.write_str(text),
            Argument::Effect(effect) => write!(f, "EffectID:{}", effect.id),
            Argument::Empty => Ok(()),
        }
    }
}

mod sealed {
    pub trait Sealed {}
}

/// Types that can occupy an [`Argument`]. Sealed: implemented for `i32`,
/// `f32`, [`ObjectId`], `String` and [`EffectHandle`] only.
pub trait ArgumentValue: sealed::Sealed + Sized + Default {
    const KIND: ArgumentKind;

    fn extract(arg: &Argument) -> Option<&Self>;
    fn extract_mut(arg: &mut Argument) -> Option<&mut Self>;
    fn slot(arg: &mut Argument, init: impl FnOnce() -> Self) -> &mut Self;
    fn into_argument(self) -> Argument;
    fn from_argument(arg: Argument) -> Result<Self, Argument>;
}

macro_rules! argument_value {
    ($ty:ty, $variant:ident) => {
        impl sealed::Sealed for $ty {}

        impl ArgumentValue for $ty {
            const KIND: ArgumentKind = ArgumentKind::$variant;

            fn extract(arg: &Argument) -> Option<&Self> {
                match arg {
                    Argument::$variant(value) => Some(value),
                    _ => None,
                }
            }

            fn extract_mut(arg: &mut Argument) -> Option<&mut Self> {
                match arg {
                    Argument::$variant(value) => Some(value),
                    _ => None,
                }
            }

            fn slot(arg: &mut Argument, init: impl FnOnce() -> Self) -> &mut Self {
                if !matches!(arg, Argument::$variant(_)) {
                    *arg = Argument::$variant(init());
                }
                match arg {
                    Argument::$variant(value) => value,
                    _ => Self::slot(arg, Self::default),
                }
            }

            fn into_argument(self) -> Argument {
                Argument::$variant(self)
            }

            fn from_argument(arg: Argument) -> Result<Self, Argument> {
                match arg {
                    Argument::$variant(value) => Ok(value),
                    other => Err(other),
                }
            }
        }

        impl From<$ty> for Argument {
            fn from(value: $ty) -> Self {
                Argument::$variant(value)
            }
        }
    };
}

argument_value!(i32, Int);
argument_value!(f32, Float);
argument_value!(ObjectId, Object);
argument_value!(String, String);
argument_value!(EffectHandle, Effect);

impl From<&str> for Argument {
    fn from(value: &str) -> Self {
        Argument::String(value.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_empty_argument_formats_as_empty_string() {
        let arg = Argument::default();
        assert!(arg.is_empty());
        assert_eq!(arg.kind(), None);
        assert_eq!(arg.to_string(), "");
    }

    #[test]
    fn test_each_alternative_formats() {
        assert_eq!(Argument::Int(-42).to_string(), "-42");
        assert_eq!(Argument::Float(1.5).to_string(), "1.500000");
        assert_eq!(Argument::Object(ObjectId(0x7f000000)).to_string(), "7f000000");
        assert_eq!(Argument::from("hello world").to_string(), "hello world");
        assert_eq!(Argument::Effect(EffectHandle::new(1234)).to_string(), "EffectID:1234");
    }

    #[test]
    fn test_float_special_values() {
        assert_eq!(Argument::Float(f32::from_bits(0x7fc0_0000)).to_string(), "nan");
        assert_eq!(Argument::Float(f32::from_bits(0xffc0_0000)).to_string(), "-nan");
        assert_eq!(Argument::Float(f32::INFINITY).to_string(), "inf");
        assert_eq!(Argument::Float(f32::NEG_INFINITY).to_string(), "-inf");
        assert_eq!(Argument::Float(-0.0).to_string(), "-0.000000");
    }

    #[test]
    fn test_object_id_uses_identifier_form() {
        let arg = Argument::from(ObjectId(255));
        let text = arg.to_string();
        assert_eq!(text, object_id_to_string(ObjectId(255)));
        assert_eq!(text, "ff");
        assert!(!text.is_empty());
    }

    #[test]
    fn test_typed_access_only_matches_held_alternative() {
        let arg = Argument::from(7i32);
        assert_eq!(arg.get::<i32>(), Some(&7));
        assert_eq!(arg.get::<f32>(), None);
        assert_eq!(arg.get::<String>(), None);
        assert_eq!(arg.get::<ObjectId>(), None);
        assert_eq!(arg.get::<EffectHandle>(), None);
        assert_eq!(arg.kind(), Some(<i32 as ArgumentValue>::KIND));
    }

    #[test]
    fn test_slot_populates_and_reads() {
        let mut arg = Argument::default();
        arg.get_or_insert_with(String::new).push_str("abc");
        arg.get_or_insert_with(String::new).push('d');
        assert_eq!(arg.get::<String>().map(String::as_str), Some("abcd"));

        // Switching alternative replaces the previous value
        *arg.get_or_insert_with(|| 0.0f32) = 2.25;
        assert_eq!(arg.get::<String>(), None);
        assert_eq!(arg.get::<f32>(), Some(&2.25));
    }

    #[test]
    fn test_slot_keeps_held_value_and_replaces_others() {
        let mut arg = Argument::from(ObjectId(0x44));
        *arg.get_or_insert_with(|| ObjectId(1)) = ObjectId(0x45);
        assert_eq!(arg.get::<ObjectId>(), Some(&ObjectId(0x45)));

        let effect = arg.get_or_insert_with(|| EffectHandle::new(8));
        assert_eq!(effect.id, 8);
        assert_eq!(arg.kind(), Some(ArgumentKind::Effect));

        assert_eq!(ObjectId::default(), ObjectId::INVALID);
    }

    #[test]
    fn test_get_mut_and_set() {
        let mut arg = Argument::from(1i32);
        if let Some(value) = arg.get_mut::<i32>() {
            *value = 10;
        }
        assert_eq!(arg.to_string(), "10");

        arg.set(EffectHandle::new(9));
        assert_eq!(arg.kind(), Some(ArgumentKind::Effect));
        assert_eq!(arg.get::<i32>(), None);
    }

    #[test]
    fn test_take_empties_only_matching_alternative() {
        let mut arg = Argument::from("text");
        assert_eq!(arg.take::<i32>(), None);
        assert_eq!(arg.get::<String>().map(String::as_str), Some("text"));

        assert_eq!(arg.take::<String>(), Some("text".to_string()));
        assert!(arg.is_empty());
    }

    #[test]
    fn test_invalid_object_sentinel() {
        assert!(!ObjectId::INVALID.is_valid());
        assert!(ObjectId(1).is_valid());
        assert_eq!(object_id_to_string(ObjectId::INVALID), "7f000000");
    }

    #[test]
    fn test_argument_json_shape() {
        let json = serde_json::to_value(Argument::Effect(EffectHandle::new(3))).unwrap();
        assert_eq!(json, serde_json::json!({ "effect": { "id": 3 } }));

        let parsed: Argument = serde_json::from_value(serde_json::json!({ "object": 16 })).unwrap();
        assert_eq!(parsed, Argument::Object(ObjectId(16)));

        let empty: Argument = serde_json::from_value(serde_json::json!("empty")).unwrap();
        assert!(empty.is_empty());
    }
}
