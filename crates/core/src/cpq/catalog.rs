use std::collections::HashSet;
use std::fs;
use std::path::Path;

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::domain::packaging::{
    BagSize, BagSizeId, BagType, BagTypeId, BarrierLevel, CostType, Material, MaterialId,
    PrintingMethod, ProcessCategory, ProcessId, ProcessOption, QuantityTier, CUSTOM_SIZE_ID,
};
use crate::errors::CatalogError;

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct MoqTable {
    pub gravure: u32,
    pub flexo: u32,
    pub digital: u32,
}

/// Raw reference data as authored; becomes a [`CatalogRegistry`] once validated.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct CatalogData {
    pub bag_types: Vec<BagType>,
    pub bag_sizes: Vec<BagSize>,
    pub materials: Vec<Material>,
    pub processes: Vec<ProcessOption>,
    pub tiers: Vec<QuantityTier>,
    pub moq: MoqTable,
    /// Discount applied when the quantity is above the last tier.
    pub overflow_discount: Decimal,
}

/// Immutable lookup over validated catalog data. Built once and shared.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct CatalogRegistry {
    data: CatalogData,
}

impl CatalogRegistry {
    pub fn new(data: CatalogData) -> Result<Self, CatalogError> {
        validate_catalog(&data)?;
        Ok(Self { data })
    }

    pub fn builtin() -> Self {
        Self { data: builtin_data() }
    }

    pub fn from_toml_str(raw: &str) -> Result<Self, CatalogError> {
        let data = toml::from_str::<CatalogData>(raw)?;
        Self::new(data)
    }

    pub fn from_path(path: &Path) -> Result<Self, CatalogError> {
        let raw = fs::read_to_string(path)
            .map_err(|source| CatalogError::ReadFile { path: path.to_path_buf(), source })?;
        Self::from_toml_str(&raw)
    }

    pub fn data(&self) -> &CatalogData {
        &self.data
    }

    pub fn bag_type(&self, id: &BagTypeId) -> Option<&BagType> {
        self.data.bag_types.iter().find(|bag_type| &bag_type.id == id)
    }

    pub fn bag_size(&self, id: &BagSizeId) -> Option<&BagSize> {
        self.data.bag_sizes.iter().find(|size| &size.id == id)
    }

    pub fn material(&self, id: &MaterialId) -> Option<&Material> {
        self.data.materials.iter().find(|material| &material.id == id)
    }

    pub fn process(&self, id: &ProcessId) -> Option<&ProcessOption> {
        self.data.processes.iter().find(|process| &process.id == id)
    }

    pub fn bag_types(&self) -> &[BagType] {
        &self.data.bag_types
    }

    pub fn bag_sizes(&self) -> &[BagSize] {
        &self.data.bag_sizes
    }

    pub fn materials(&self) -> &[Material] {
        &self.data.materials
    }

    pub fn processes(&self) -> &[ProcessOption] {
        &self.data.processes
    }

    pub fn processes_in(&self, category: ProcessCategory) -> impl Iterator<Item = &ProcessOption> {
        self.data.processes.iter().filter(move |process| process.category == category)
    }

    pub fn tiers(&self) -> &[QuantityTier] {
        &self.data.tiers
    }

    pub fn overflow_discount(&self) -> Decimal {
        self.data.overflow_discount
    }

    pub fn moq_for(&self, method: PrintingMethod) -> u32 {
        match method {
            PrintingMethod::Gravure => self.data.moq.gravure,
            PrintingMethod::Flexo => self.data.moq.flexo,
            PrintingMethod::Digital => self.data.moq.digital,
        }
    }

    pub fn has_bag_type(&self, id: &str) -> bool {
        self.data.bag_types.iter().any(|bag_type| bag_type.id.as_str() == id)
    }

    pub fn has_material(&self, id: &str) -> bool {
        self.data.materials.iter().any(|material| material.id.as_str() == id)
    }

    pub fn has_process(&self, id: &str) -> bool {
        self.data.processes.iter().any(|process| process.id.as_str() == id)
    }
}

impl Default for CatalogRegistry {
    fn default() -> Self {
        Self::builtin()
    }
}

fn validate_catalog(data: &CatalogData) -> Result<(), CatalogError> {
    if data.bag_types.is_empty() {
        return Err(CatalogError::EmptyFamily("bag types"));
    }
    if data.bag_sizes.is_empty() {
        return Err(CatalogError::EmptyFamily("bag sizes"));
    }
    if data.materials.is_empty() {
        return Err(CatalogError::EmptyFamily("materials"));
    }
    if data.tiers.is_empty() {
        return Err(CatalogError::EmptyFamily("quantity tiers"));
    }

    ensure_unique("bag type", data.bag_types.iter().map(|item| item.id.as_str()))?;
    ensure_unique("bag size", data.bag_sizes.iter().map(|item| item.id.as_str()))?;
    ensure_unique("material", data.materials.iter().map(|item| item.id.as_str()))?;
    ensure_unique("process", data.processes.iter().map(|item| item.id.as_str()))?;

    if !data.bag_sizes.iter().any(BagSize::is_custom) {
        return Err(CatalogError::MissingCustomSize);
    }

    for bag_type in &data.bag_types {
        ensure_non_negative("bag type", bag_type.id.as_str(), "multiplier", bag_type.multiplier)?;
    }
    for size in &data.bag_sizes {
        ensure_non_negative("bag size", size.id.as_str(), "surface area", size.surface_area)?;
    }
    for material in &data.materials {
        ensure_non_negative("material", material.id.as_str(), "cost", material.cost_per_sqm)?;
    }
    for process in &data.processes {
        ensure_non_negative("process", process.id.as_str(), "cost", process.cost)?;
    }

    validate_tiers(&data.tiers, data.overflow_discount)?;

    for (method, value) in [
        (PrintingMethod::Gravure, data.moq.gravure),
        (PrintingMethod::Flexo, data.moq.flexo),
        (PrintingMethod::Digital, data.moq.digital),
    ] {
        if value == 0 {
            return Err(CatalogError::MissingMoq(method.as_str()));
        }
    }

    Ok(())
}

fn validate_tiers(tiers: &[QuantityTier], overflow_discount: Decimal) -> Result<(), CatalogError> {
    let mut previous: Option<&QuantityTier> = None;
    for tier in tiers {
        if tier.min == 0 || tier.min > tier.max {
            return Err(CatalogError::InvalidTiers(format!(
                "tier {}..={} must have 1 <= min <= max",
                tier.min, tier.max
            )));
        }
        if tier.discount <= Decimal::ZERO {
            return Err(CatalogError::InvalidTiers(format!(
                "tier starting at {} must have a positive discount",
                tier.min
            )));
        }
        if let Some(previous) = previous {
            if previous.max.checked_add(1) != Some(tier.min) {
                return Err(CatalogError::InvalidTiers(format!(
                    "tier starting at {} does not continue from {}",
                    tier.min, previous.max
                )));
            }
            if tier.discount > previous.discount {
                return Err(CatalogError::InvalidTiers(format!(
                    "discount rises from {} to {} at quantity {}",
                    previous.discount, tier.discount, tier.min
                )));
            }
        }
        previous = Some(tier);
    }

    if let Some(last) = previous {
        if overflow_discount <= Decimal::ZERO || overflow_discount > last.discount {
            return Err(CatalogError::InvalidTiers(format!(
                "overflow discount {overflow_discount} must be positive and not above {}",
                last.discount
            )));
        }
    }

    Ok(())
}

fn ensure_unique<'a>(
    family: &'static str,
    ids: impl Iterator<Item = &'a str>,
) -> Result<(), CatalogError> {
    let mut seen = HashSet::new();
    for id in ids {
        if !seen.insert(id) {
            return Err(CatalogError::DuplicateId { family, id: id.to_owned() });
        }
    }
    Ok(())
}

fn ensure_non_negative(
    family: &'static str,
    id: &str,
    field: &'static str,
    value: Decimal,
) -> Result<(), CatalogError> {
    if value < Decimal::ZERO {
        return Err(CatalogError::NegativeValue { family, id: id.to_owned(), field });
    }
    Ok(())
}

/// Storefront entry points mapped to configurator defaults.
#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct QuoteDefaults {
    pub bag_type: Option<BagTypeId>,
    pub content: &'static str,
}

const CONTENT_OPTIONS: [(&str, &str); 7] = [
    ("coffee", "Coffee"),
    ("tea", "Tea"),
    ("snacks", "Snacks"),
    ("pet-food", "Pet Food"),
    ("protein", "Protein Powder"),
    ("liquid", "Liquid"),
    ("dried-fruit", "Dried Fruit"),
];

impl QuoteDefaults {
    pub fn for_product(product_id: Option<&str>) -> Self {
        let preset = match product_id {
            Some("stand-up-pouch") => Some(("stand-up", "coffee")),
            Some("gusset-bag") => Some(("gusseted", "snacks")),
            Some("flat-pouch") => Some(("flat-pouch", "coffee")),
            Some("flat-bottom-bag") => Some(("flat-bottom", "pet-food")),
            _ => None,
        };

        match preset {
            Some((bag_type, content)) => Self { bag_type: Some(BagTypeId::new(bag_type)), content },
            None => Self { bag_type: None, content: "coffee" },
        }
    }

    /// Display name of the preset's product content, e.g. `Pet Food`.
    pub fn content_label(&self) -> &'static str {
        CONTENT_OPTIONS
            .iter()
            .find(|(id, _)| *id == self.content)
            .map_or(self.content, |(_, label)| *label)
    }
}

fn dec(units: i64, scale: u32) -> Decimal {
    Decimal::new(units, scale)
}

fn bag_type(id: &str, name: &str, name_en: &str, description: &str, multiplier: Decimal) -> BagType {
    BagType {
        id: BagTypeId::new(id),
        name: name.to_owned(),
        name_en: name_en.to_owned(),
        description: description.to_owned(),
        multiplier,
    }
}

fn bag_size(
    id: &str,
    label: &str,
    label_en: &str,
    (width_mm, height_mm, gusset_mm): (u32, u32, u32),
    volume_label: &str,
    surface_area: Decimal,
) -> BagSize {
    BagSize {
        id: BagSizeId::new(id),
        label: label.to_owned(),
        label_en: label_en.to_owned(),
        width_mm,
        height_mm,
        gusset_mm,
        volume_label: volume_label.to_owned(),
        surface_area,
    }
}

struct MaterialFlags {
    eco: bool,
    matte: bool,
    transparent: bool,
}

fn material(
    id: &str,
    name: &str,
    layers: &str,
    description: &str,
    cost_per_sqm: i64,
    barrier: BarrierLevel,
    flags: MaterialFlags,
    suitable_for: &[&str],
) -> Material {
    Material {
        id: MaterialId::new(id),
        name: name.to_owned(),
        layers: layers.to_owned(),
        description: description.to_owned(),
        cost_per_sqm: Decimal::from(cost_per_sqm),
        barrier,
        is_eco: flags.eco,
        is_matte: flags.matte,
        is_transparent: flags.transparent,
        suitable_for: suitable_for.iter().map(|item| (*item).to_owned()).collect(),
    }
}

fn process(
    id: &str,
    name: &str,
    name_en: &str,
    description: &str,
    cost_type: CostType,
    cost: Decimal,
    category: ProcessCategory,
) -> ProcessOption {
    ProcessOption {
        id: ProcessId::new(id),
        name: name.to_owned(),
        name_en: name_en.to_owned(),
        description: description.to_owned(),
        cost_type,
        cost,
        is_default: matches!(id, "gravure" | "corner-square"),
        category,
    }
}

fn tier(min: u32, max: u32, discount: Decimal, label: &str) -> QuantityTier {
    QuantityTier { min, max, discount, label: label.to_owned() }
}

#[rustfmt::skip]
fn builtin_data() -> CatalogData {
    use CostType::{PerOrder, PerSqm, PerUnit};
    use ProcessCategory::{Accessory, Feature, Finish, Printing};

    let flags = |eco, matte, transparent| MaterialFlags { eco, matte, transparent };

    CatalogData {
        bag_types: vec![
            bag_type("stand-up", "自立袋", "Stand Up Pouch", "Self-standing with bottom gusset", dec(10, 1)),
            bag_type("gusseted", "风琴袋", "Gusseted Bag", "Side gussets for extra capacity", dec(11, 1)),
            bag_type("flat-pouch", "平口袋", "Flat Pouch", "Center back seal, flat front", dec(88, 2)),
            bag_type("flat-bottom", "平底袋", "Flat Bottom Bag", "Stable flat base", dec(128, 2)),
        ],
        bag_sizes: vec![
            bag_size("xs", "50g 小", "2 oz", (100, 150, 60), "约50g", dec(24, 3)),
            bag_size("sm", "100g 中小", "4 oz", (120, 180, 70), "约100g", dec(34, 3)),
            bag_size("md", "250g 中", "8 oz", (140, 200, 80), "约250g", dec(44, 3)),
            bag_size("lg", "500g 大", "16 oz", (160, 240, 90), "约500g", dec(58, 3)),
            bag_size("xl", "1kg 加大", "32 oz", (200, 300, 100), "约1kg", dec(90, 3)),
            bag_size("2kg", "2kg 特大", "64 oz", (240, 350, 120), "约2kg", dec(126, 3)),
            bag_size(CUSTOM_SIZE_ID, "自定义", "Custom", (0, 0, 0), "自定义", Decimal::ZERO),
        ],
        materials: vec![
            material("pet-pe", "PET / PE", "PET + PE Laminate", "Standard clear laminate", 8, BarrierLevel::Low, flags(false, false, true), &["snacks", "candy"]),
            material("pet-al-pe", "PET / AL / PE", "PET + Aluminum Foil + PE", "Aluminum foil high-barrier", 15, BarrierLevel::Ultra, flags(false, false, false), &["coffee", "tea"]),
            material("kraft-pe", "Kraft / PE", "Kraft Paper + PE", "Natural kraft paper look", 10, BarrierLevel::Low, flags(false, true, false), &["coffee", "tea"]),
            material("pla-pbat", "PLA / PBAT", "PLA + PBAT Biodegradable", "Fully biodegradable", 20, BarrierLevel::Low, flags(true, true, false), &["organic food"]),
            material("kraft-pla", "Kraft / PLA", "Kraft Paper + PLA", "Eco-meets-natural", 17, BarrierLevel::Low, flags(true, true, false), &["organic food"]),
            material("silver", "Silver", "Silver Metalized Film + PE", "Silver metallic finish", 11, BarrierLevel::Medium, flags(false, false, false), &["coffee", "snacks", "premium"]),
            material("bopp-cpp", "BOPP / CPP", "BOPP + CPP", "General-purpose film", 7, BarrierLevel::Low, flags(false, false, true), &["bread", "biscuits"]),
        ],
        processes: vec![
            process("gravure", "凹版印刷", "Gravure Print", "Large-run printing", PerOrder, dec(500, 0), Printing),
            process("flexo", "柔版印刷", "Flexo Print", "Mid-volume", PerOrder, dec(280, 0), Printing),
            process("digital", "数码印刷", "Digital Print", "Short runs, no plate", PerUnit, dec(5, 2), Printing),
            process("gloss-lamination", "亮光覆膜", "Gloss Lamination", "Glossy finish", PerSqm, dec(15, 1), Finish),
            process("matte-lamination", "哑光覆膜", "Matte Lamination", "Matte finish", PerSqm, dec(18, 1), Finish),
            process("spot-uv", "局部光油", "Spot UV", "Selective gloss", PerSqm, dec(25, 1), Finish),
            process("soft-touch", "肤感膜", "Soft Touch", "Soft touch finish", PerSqm, dec(18, 1), Finish),
            process("holographic", "镭射", "Holographic", "Holographic finish", PerSqm, dec(2, 0), Finish),
            process("zipper", "普通自封", "Press-to-close", "Resealable", PerUnit, dec(12, 3), Feature),
            process("zipper-pocket", "易撕拉链", "Pocket Zipper", "Easy-open zipper", PerUnit, dec(15, 3), Feature),
            process("zipper-child", "防儿童开启", "Child Resistant", "Child resistant zipper", PerUnit, dec(20, 3), Feature),
            process("valve", "单向排气阀", "One-way Degassing Valve", "One-way valve", PerUnit, dec(18, 3), Feature),
            process("tear-notch", "双侧易撕口", "Both Sides", "Easy-open", PerUnit, dec(3, 3), Feature),
            process("tear-notch-left", "左侧易撕口", "Left Only", "Left side tear", PerUnit, dec(3, 3), Feature),
            process("hang-hole-euro", "飞机孔", "Euro Hole", "Peg display", PerUnit, dec(2, 3), Feature),
            process("hang-hole-round", "圆孔", "Round Hole", "Round hang hole", PerUnit, dec(2, 3), Feature),
            process("corner-square", "直角", "Square", "Square corners", PerUnit, Decimal::ZERO, Feature),
            process("round-corner", "圆角", "Rounded", "Rounded corners", PerUnit, dec(5, 3), Feature),
            process("clear-window", "透明窗口", "Clear Window", "Viewing window", PerUnit, dec(10, 3), Feature),
            process("spout-corner", "角落吸嘴", "Corner Spout", "Pour spout", PerUnit, dec(40, 3), Accessory),
            process("spout-center", "中间吸嘴", "Center Spout", "Center spout", PerUnit, dec(40, 3), Accessory),
            process("tin-tie", "铁丝扎口", "Tin Tie", "Metal closure", PerUnit, dec(8, 3), Accessory),
        ],
        tiers: vec![
            tier(10, 99, dec(15, 1), "10–99"),
            tier(100, 499, dec(12, 1), "100–499"),
            tier(500, 999, dec(10, 1), "500–999"),
            tier(1_000, 2_499, dec(88, 2), "1,000–2,499"),
            tier(2_500, 4_999, dec(75, 2), "2,500–4,999"),
            tier(5_000, 9_999, dec(65, 2), "5,000–9,999"),
            tier(10_000, 24_999, dec(55, 2), "10,000–24,999"),
            tier(25_000, 49_999, dec(48, 2), "25,000–49,999"),
            tier(50_000, 100_000, dec(42, 2), "50,000–100,000"),
        ],
        moq: MoqTable { gravure: 3_000, flexo: 1_000, digital: 100 },
        overflow_discount: dec(38, 2),
    }
}
