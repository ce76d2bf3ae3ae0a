use serde::{Deserialize, Deserializer, Serialize};
use std::fmt;

/// Horizontal alignment of a column. `Hidden` columns are never drawn.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub enum Align {
    #[default]
    Default,
    Left,
    Right,
    Center,
    Hidden,
}

impl From<String> for Align {
    fn from(value: String) -> Self {
        match value.trim().to_ascii_uppercase().as_str() {
            "L" | "LEFT" => Align::Left,
            "R" | "RIGHT" => Align::Right,
            "C" | "CENTER" | "CENTRE" => Align::Center,
            "H" | "HIDDEN" => Align::Hidden,
            _ => Align::Default,
        }
    }
}

impl From<Align> for String {
    fn from(value: Align) -> Self {
        match value {
            Align::Default => "",
            Align::Left => "L",
            Align::Right => "R",
            Align::Center => "C",
            Align::Hidden => "H",
        }
        .to_string()
    }
}

/// Roll-up computed for a column in the totals row
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub enum ColumnOp {
    #[default]
    None,
    Count,
    Sum,
    Average,
}

impl From<String> for ColumnOp {
    fn from(value: String) -> Self {
        match value.trim().to_ascii_lowercase().as_str() {
            "c" | "count" => ColumnOp::Count,
            "s" | "sum" => ColumnOp::Sum,
            "a" | "avg" | "average" => ColumnOp::Average,
            _ => ColumnOp::None,
        }
    }
}

impl From<ColumnOp> for String {
    fn from(value: ColumnOp) -> Self {
        match value {
            ColumnOp::None => "",
            ColumnOp::Count => "c",
            ColumnOp::Sum => "s",
            ColumnOp::Average => "a",
        }
        .to_string()
    }
}

/// Column definition. `name` is the identity used by field-restricted
/// searches; the position of a field changes when columns are moved.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct Field {
    pub name: String,
    pub label: String,
    #[serde(alias = "pic", deserialize_with = "empty_as_none")]
    pub picture: Option<String>,
    pub align: Align,
    pub css: String,
    #[serde(alias = "colops", alias = "col_op")]
    pub col_op: ColumnOp,
}

impl Field {
    pub fn new(name: impl Into<String>) -> Self {
        let name = name.into();
        Self {
            label: name.clone(),
            name,
            ..Default::default()
        }
    }

    pub fn with_label(mut self, label: impl Into<String>) -> Self {
        self.label = label.into();
        self
    }

    pub fn with_align(mut self, align: Align) -> Self {
        self.align = align;
        self
    }

    pub fn with_col_op(mut self, col_op: ColumnOp) -> Self {
        self.col_op = col_op;
        self
    }

    pub fn with_picture(mut self, picture: impl Into<String>) -> Self {
        self.picture = Some(picture.into());
        self
    }

    /// Header text, falling back to the name when no label was supplied
    pub fn display_label(&self) -> &str {
        if self.label.is_empty() {
            &self.name
        } else {
            &self.label
        }
    }
}

impl fmt::Display for Field {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.display_label())
    }
}

fn empty_as_none<'de, D>(deserializer: D) -> Result<Option<String>, D::Error>
where
    D: Deserializer<'de>,
{
    let value = Option::<String>::deserialize(deserializer)?;
    Ok(value.filter(|s| !s.trim().is_empty()))
}
