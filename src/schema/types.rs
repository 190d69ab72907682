//! JSON type tags.

use std::fmt::{self, Display};

use serde_json::Value;

/// The JSON type of a value.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ValueType {
    Null,
    Boolean,
    Number,
    String,
    Array,
    Object,
}

impl ValueType {
    const ALL: [ValueType; 6] = [
        ValueType::Null,
        ValueType::Boolean,
        ValueType::Number,
        ValueType::String,
        ValueType::Array,
        ValueType::Object,
    ];

    /// Returns the type of `value`.
    pub fn of(value: &Value) -> Self {
        match value {
            Value::Null => ValueType::Null,
            Value::Bool(_) => ValueType::Boolean,
            Value::Number(_) => ValueType::Number,
            Value::String(_) => ValueType::String,
            Value::Array(_) => ValueType::Array,
            Value::Object(_) => ValueType::Object,
        }
    }

    /// Returns the name used in `invalid_type` issues.
    pub fn name(&self) -> &'static str {
        match self {
            ValueType::Null => "null",
            ValueType::Boolean => "boolean",
            ValueType::Number => "number",
            ValueType::String => "string",
            ValueType::Array => "array",
            ValueType::Object => "object",
        }
    }

    fn bit(self) -> u8 {
        1 << (self as u8)
    }
}

impl Display for ValueType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// Received-type name for `value`, as used in `invalid_type` issues.
pub fn type_name(value: &Value) -> &'static str {
    ValueType::of(value).name()
}

/// A set of JSON types.
///
/// Validators report the types they could possibly accept through
/// [`SchemaLike::accepts`](crate::SchemaLike::accepts). The set may be larger
/// than what actually passes, never smaller.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct TypeSet(u8);

impl TypeSet {
    /// Every JSON type.
    pub const ALL: TypeSet = TypeSet(0b11_1111);
    /// No JSON type.
    pub const EMPTY: TypeSet = TypeSet(0);

    /// A set holding only `ty`.
    pub fn only(ty: ValueType) -> Self {
        TypeSet(ty.bit())
    }

    /// A set holding each of `types`.
    pub fn of(types: &[ValueType]) -> Self {
        types.iter().fold(Self::EMPTY, |set, ty| set.with(*ty))
    }

    /// A set holding the types of `values`.
    pub fn of_values<'a>(values: impl IntoIterator<Item = &'a Value>) -> Self {
        values
            .into_iter()
            .fold(Self::EMPTY, |set, value| set.with(ValueType::of(value)))
    }

    /// Returns this set with `ty` added.
    pub fn with(self, ty: ValueType) -> Self {
        TypeSet(self.0 | ty.bit())
    }

    /// Returns true if `ty` is in the set.
    pub fn contains(&self, ty: ValueType) -> bool {
        self.0 & ty.bit() != 0
    }

    /// Returns true if the type of `value` is in the set.
    pub fn admits(&self, value: &Value) -> bool {
        self.contains(ValueType::of(value))
    }

    pub fn union(self, other: TypeSet) -> Self {
        TypeSet(self.0 | other.0)
    }

    pub fn intersect(self, other: TypeSet) -> Self {
        TypeSet(self.0 & other.0)
    }

    pub fn is_empty(&self) -> bool {
        self.0 == 0
    }

    /// Iterates the member types in a fixed order.
    pub fn iter(&self) -> impl Iterator<Item = ValueType> {
        let set = *self;
        ValueType::ALL.into_iter().filter(move |ty| set.contains(*ty))
    }
}

impl Display for TypeSet {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if *self == TypeSet::ALL {
            return f.write_str("unknown");
        }
        if self.is_empty() {
            return f.write_str("never");
        }
        let names: Vec<&str> = self.iter().map(|ty| ty.name()).collect();
        f.write_str(&names.join(" | "))
    }
}
