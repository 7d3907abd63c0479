use serde::{Deserialize, Serialize};
use std::fmt;
use uuid::Uuid;

/// Region label used when an item arrives without one
pub const UNNAMED_REGION: &str = "未命名区域";

/// A single UI requirement extracted from (or added to) a screenshot breakdown
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct RequirementItem {
    /// Stable identity, assigned once when the item is created
    pub id: Uuid,

    /// Screen area the item belongs to
    pub region: String,

    /// Label shown on screen (field name, button text, column header)
    pub function_name: String,

    #[serde(default)]
    pub description: String,

    #[serde(default)]
    pub interaction: String,

    #[serde(default)]
    pub validation: String,

    /// Impact scope of the function
    #[serde(default)]
    pub scope: String,
}

impl RequirementItem {
    /// Creates a new item with a fresh id and the given region and function name
    pub fn new(region: impl Into<String>, function_name: impl Into<String>) -> Self {
        let region = region.into();
        Self {
            id: Uuid::new_v4(),
            region: if region.trim().is_empty() {
                UNNAMED_REGION.to_string()
            } else {
                region
            },
            function_name: function_name.into(),
            description: String::new(),
            interaction: String::new(),
            validation: String::new(),
            scope: String::new(),
        }
    }

    /// Creates an empty row tagged with `region`
    pub fn blank(region: impl Into<String>) -> Self {
        Self::new(region, String::new())
    }

    /// The label this item is grouped under
    pub fn region_label(&self) -> &str {
        region_label(&self.region)
    }

    /// Reads one text field
    pub fn field(&self, field: ItemField) -> &str {
        match field {
            ItemField::Region => &self.region,
            ItemField::FunctionName => &self.function_name,
            ItemField::Description => &self.description,
            ItemField::Interaction => &self.interaction,
            ItemField::Validation => &self.validation,
            ItemField::Scope => &self.scope,
        }
    }

    /// Mutable access to one text field
    pub fn field_mut(&mut self, field: ItemField) -> &mut String {
        match field {
            ItemField::Region => &mut self.region,
            ItemField::FunctionName => &mut self.function_name,
            ItemField::Description => &mut self.description,
            ItemField::Interaction => &mut self.interaction,
            ItemField::Validation => &mut self.validation,
            ItemField::Scope => &mut self.scope,
        }
    }
}

/// Normalizes a raw region string to the label it is grouped under
pub fn region_label(region: &str) -> &str {
    if region.trim().is_empty() {
        UNNAMED_REGION
    } else {
        region
    }
}

/// The text fields of a requirement item
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "camelCase")]
pub enum ItemField {
    Region,
    FunctionName,
    Description,
    Interaction,
    Validation,
    Scope,
}

impl ItemField {
    /// The five columns shown in a region table, in display and export order
    pub const COLUMNS: [ItemField; 5] = [
        ItemField::FunctionName,
        ItemField::Description,
        ItemField::Interaction,
        ItemField::Validation,
        ItemField::Scope,
    ];

    /// Column header used in tables and exports
    pub fn header(&self) -> &'static str {
        match self {
            ItemField::Region => "区域",
            ItemField::FunctionName => "功能",
            ItemField::Description => "描述",
            ItemField::Interaction => "交互",
            ItemField::Validation => "校验",
            ItemField::Scope => "影响范围",
        }
    }
}

impl fmt::Display for ItemField {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ItemField::Region => write!(f, "region"),
            ItemField::FunctionName => write!(f, "functionName"),
            ItemField::Description => write!(f, "description"),
            ItemField::Interaction => write!(f, "interaction"),
            ItemField::Validation => write!(f, "validation"),
            ItemField::Scope => write!(f, "scope"),
        }
    }
}
