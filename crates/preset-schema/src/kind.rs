//! Value kinds of schema entries.

use serde::{Deserialize, Serialize};

/// Closed set of property value kinds.
///
/// Whether a property holds one value or a list is tracked separately
/// (`SchemaEntry::vector`), so `Float` covers both `0.4` and `["0.4", "0.6"]`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ValueKind {
    String,
    Int,
    Float,
    /// Percentage such as `15%`
    Percent,
    /// Absolute value or a percentage of some other setting
    FloatOrPercent,
    Bool,
    /// One of a fixed set of choices
    Enum,
    /// 2D point written as `XxY`
    Point,
    /// `{name, sub_path}` pair pointing at another preset file
    NameAndSubpath,
}

/// Editor widget kind for a value kind.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum InputKind {
    Dropdown,
    Boolean,
    Number,
    Text,
    NameAndPath,
}

impl ValueKind {
    pub fn input_kind(&self) -> InputKind {
        match self {
            ValueKind::Enum => InputKind::Dropdown,
            ValueKind::Bool => InputKind::Boolean,
            ValueKind::Int | ValueKind::Float => InputKind::Number,
            ValueKind::NameAndSubpath => InputKind::NameAndPath,
            ValueKind::String
            | ValueKind::Percent
            | ValueKind::FloatOrPercent
            | ValueKind::Point => InputKind::Text,
        }
    }
}
