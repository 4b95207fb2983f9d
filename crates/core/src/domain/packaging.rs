use std::fmt;

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

#[derive(Clone, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct BagTypeId(pub String);

#[derive(Clone, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct BagSizeId(pub String);

#[derive(Clone, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct MaterialId(pub String);

#[derive(Clone, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct ProcessId(pub String);

macro_rules! impl_id {
    ($($name:ident),+) => {
        $(
            impl $name {
                pub fn new(value: impl Into<String>) -> Self {
                    Self(value.into())
                }

                pub fn as_str(&self) -> &str {
                    &self.0
                }
            }

            impl fmt::Display for $name {
                fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                    f.write_str(&self.0)
                }
            }

            impl From<&str> for $name {
                fn from(value: &str) -> Self {
                    Self(value.to_owned())
                }
            }
        )+
    };
}

impl_id!(BagTypeId, BagSizeId, MaterialId, ProcessId);

/// Size id whose dimensions are supplied by the caller instead of the catalog.
pub const CUSTOM_SIZE_ID: &str = "custom";

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct BagType {
    pub id: BagTypeId,
    pub name: String,
    pub name_en: String,
    #[serde(default)]
    pub description: String,
    /// Applied to material cost to reflect fabrication complexity.
    pub multiplier: Decimal,
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct BagSize {
    pub id: BagSizeId,
    pub label: String,
    pub label_en: String,
    pub width_mm: u32,
    pub height_mm: u32,
    pub gusset_mm: u32,
    #[serde(default)]
    pub volume_label: String,
    /// Square metres; zero for the custom size.
    pub surface_area: Decimal,
}

impl BagSize {
    pub fn is_custom(&self) -> bool {
        self.id.as_str() == CUSTOM_SIZE_ID
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum BarrierLevel {
    Low,
    Medium,
    High,
    Ultra,
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Material {
    pub id: MaterialId,
    pub name: String,
    pub layers: String,
    #[serde(default)]
    pub description: String,
    pub cost_per_sqm: Decimal,
    pub barrier: BarrierLevel,
    #[serde(default)]
    pub is_eco: bool,
    #[serde(default)]
    pub is_matte: bool,
    #[serde(default)]
    pub is_transparent: bool,
    #[serde(default)]
    pub suitable_for: Vec<String>,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CostType {
    PerUnit,
    PerOrder,
    PerSqm,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ProcessCategory {
    Printing,
    Finish,
    Feature,
    Accessory,
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProcessOption {
    pub id: ProcessId,
    pub name: String,
    pub name_en: String,
    #[serde(default)]
    pub description: String,
    pub cost_type: CostType,
    pub cost: Decimal,
    #[serde(default)]
    pub is_default: bool,
    pub category: ProcessCategory,
}

/// Inclusive quantity range mapped to a price multiplier.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct QuantityTier {
    pub min: u32,
    pub max: u32,
    pub discount: Decimal,
    #[serde(default)]
    pub label: String,
}

impl QuantityTier {
    pub fn contains(&self, quantity: u32) -> bool {
        (self.min..=self.max).contains(&quantity)
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PrintingMethod {
    Digital,
    Flexo,
    Gravure,
}

impl PrintingMethod {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Digital => "digital",
            Self::Flexo => "flexo",
            Self::Gravure => "gravure",
        }
    }

    /// Digital wins over flexo; gravure is assumed when neither is selected.
    pub fn from_selection<'a>(processes: impl IntoIterator<Item = &'a ProcessId>) -> Self {
        let mut method = Self::Gravure;
        for process in processes {
            match process.as_str() {
                "digital" => return Self::Digital,
                "flexo" => method = Self::Flexo,
                _ => {}
            }
        }
        method
    }
}

impl fmt::Display for PrintingMethod {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}
