use std::collections::BTreeSet;

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::cpq::catalog::CatalogRegistry;
use crate::domain::packaging::{BagTypeId, Material, MaterialId, ProcessId};
use crate::domain::quote::QuoteInput;
use crate::errors::CatalogError;

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct ConstraintViolation {
    pub code: String,
    pub message: String,
    pub suggestion: Option<String>,
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct ConstraintResult {
    pub valid: bool,
    pub violations: Vec<ConstraintViolation>,
}

impl Default for ConstraintResult {
    fn default() -> Self {
        Self { valid: true, violations: Vec::new() }
    }
}

/// Two option sets that can never be selected together. Selecting from either
/// side clears the other.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct ExclusionRule {
    pub code: String,
    pub left: Vec<ProcessId>,
    pub right: Vec<ProcessId>,
}

impl ExclusionRule {
    fn partners_of(&self, process: &ProcessId) -> impl Iterator<Item = &ProcessId> {
        let in_left = self.left.contains(process);
        let in_right = self.right.contains(process);
        let left = self.left.iter().filter(move |_| in_right);
        let right = self.right.iter().filter(move |_| in_left);
        left.chain(right)
    }
}

/// Single-select option family. Choosing a member replaces the others.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct ExclusiveGroup {
    pub code: String,
    pub label: String,
    pub members: Vec<ProcessId>,
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct BagTypeAllowList {
    pub code: String,
    pub process: ProcessId,
    pub bag_types: Vec<BagTypeId>,
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct MaterialRestriction {
    pub code: String,
    pub materials: Vec<MaterialId>,
    pub processes: Vec<ProcessId>,
}

/// Options that cannot be produced on some materials; selecting one moves the
/// configuration to the first compatible material in catalog order.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct MaterialSwitch {
    pub code: String,
    pub triggers: Vec<ProcessId>,
    pub excluded_materials: Vec<MaterialId>,
}

/// Declarative manufacturing rules. New rules are table entries, not new branches.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ConstraintRules {
    #[serde(default)]
    pub exclusions: Vec<ExclusionRule>,
    #[serde(default)]
    pub groups: Vec<ExclusiveGroup>,
    #[serde(default)]
    pub bag_type_allow_lists: Vec<BagTypeAllowList>,
    #[serde(default)]
    pub material_restrictions: Vec<MaterialRestriction>,
    #[serde(default)]
    pub material_switches: Vec<MaterialSwitch>,
}

pub trait ConstraintEngine: Send + Sync {
    fn validate(&self, input: &QuoteInput) -> ConstraintResult;
}

impl ConstraintEngine for ConstraintRules {
    fn validate(&self, input: &QuoteInput) -> ConstraintResult {
        validate_configuration_input(self, input)
    }
}

fn ids<T: From<&'static str>>(values: &[&'static str]) -> Vec<T> {
    values.iter().map(|value| T::from(*value)).collect()
}

const SPOUTS: [&str; 2] = ["spout-corner", "spout-center"];
const ZIPPERS: [&str; 3] = ["zipper", "zipper-pocket", "zipper-child"];
const KRAFT: [&str; 2] = ["kraft-pe", "kraft-pla"];

impl ConstraintRules {
    /// The storefront's manufacturing rules over the builtin catalog ids.
    pub fn standard() -> Self {
        let exclusion = |code: &str, left: &[&'static str], right: &[&'static str]| ExclusionRule {
            code: code.to_owned(),
            left: ids(left),
            right: ids(right),
        };
        let group = |code: &str, label: &str, members: &[&'static str]| ExclusiveGroup {
            code: code.to_owned(),
            label: label.to_owned(),
            members: ids(members),
        };

        Self {
            exclusions: vec![
                exclusion("SPOUT_ZIPPER", &SPOUTS, &ZIPPERS),
                exclusion("SPOUT_VALVE", &SPOUTS, &["valve"]),
                exclusion("SPOUT_TIN_TIE", &SPOUTS, &["tin-tie"]),
                exclusion("TIN_TIE_ZIPPER", &["tin-tie"], &ZIPPERS),
            ],
            groups: vec![
                group("printing", "Printing method", &["gravure", "flexo", "digital"]),
                group(
                    "finish",
                    "Surface finish",
                    &[
                        "gloss-lamination",
                        "matte-lamination",
                        "spot-uv",
                        "soft-touch",
                        "holographic",
                    ],
                ),
                group("zipper", "Zipper type", &ZIPPERS),
                group("tear_notch", "Tear notch", &["tear-notch", "tear-notch-left"]),
                group("hang_hole", "Hang hole", &["hang-hole-euro", "hang-hole-round"]),
                group("corner", "Corner style", &["corner-square", "round-corner"]),
                group("spout", "Spout", &SPOUTS),
            ],
            bag_type_allow_lists: vec![BagTypeAllowList {
                code: "TIN_TIE_BAG_TYPE".to_owned(),
                process: ProcessId::new("tin-tie"),
                bag_types: ids(&["gusseted", "flat-bottom"]),
            }],
            material_restrictions: vec![MaterialRestriction {
                code: "KRAFT_FINISH".to_owned(),
                materials: ids(&KRAFT),
                processes: ids(&[
                    "clear-window",
                    "gloss-lamination",
                    "spot-uv",
                    "soft-touch",
                    "holographic",
                ]),
            }],
            material_switches: vec![MaterialSwitch {
                code: "SPOUT_KRAFT".to_owned(),
                triggers: ids(&SPOUTS),
                excluded_materials: ids(&KRAFT),
            }],
        }
    }

    /// Every id a rule mentions must exist in `catalog`.
    pub fn check_against(&self, catalog: &CatalogRegistry) -> Result<(), CatalogError> {
        let unknown = |rule: &str, id: &str| CatalogError::UnknownRuleReference {
            rule: rule.to_owned(),
            id: id.to_owned(),
        };
        let check_processes = |rule: &str, processes: &[ProcessId]| {
            processes
                .iter()
                .find(|process| !catalog.has_process(process.as_str()))
                .map_or(Ok(()), |process| Err(unknown(rule, process.as_str())))
        };
        let check_materials = |rule: &str, materials: &[MaterialId]| {
            materials
                .iter()
                .find(|material| !catalog.has_material(material.as_str()))
                .map_or(Ok(()), |material| Err(unknown(rule, material.as_str())))
        };

        for rule in &self.exclusions {
            check_processes(&rule.code, &rule.left)?;
            check_processes(&rule.code, &rule.right)?;
        }
        for group in &self.groups {
            check_processes(&group.code, &group.members)?;
        }
        for rule in &self.bag_type_allow_lists {
            check_processes(&rule.code, std::slice::from_ref(&rule.process))?;
            if let Some(bag_type) =
                rule.bag_types.iter().find(|bag_type| !catalog.has_bag_type(bag_type.as_str()))
            {
                return Err(unknown(&rule.code, bag_type.as_str()));
            }
        }
        for rule in &self.material_restrictions {
            check_processes(&rule.code, &rule.processes)?;
            check_materials(&rule.code, &rule.materials)?;
        }
        for rule in &self.material_switches {
            check_processes(&rule.code, &rule.triggers)?;
            check_materials(&rule.code, &rule.excluded_materials)?;
        }

        Ok(())
    }

    /// All ordered pairs excluded by the table, each present in both directions.
    pub fn mirrored_pairs(&self) -> BTreeSet<(ProcessId, ProcessId)> {
        let mut pairs = BTreeSet::new();
        for rule in &self.exclusions {
            for left in &rule.left {
                for right in &rule.right {
                    pairs.insert((left.clone(), right.clone()));
                    pairs.insert((right.clone(), left.clone()));
                }
            }
        }
        pairs
    }

    pub fn conflicts_with(&self, first: &ProcessId, second: &ProcessId) -> bool {
        self.exclusions.iter().any(|rule| rule.partners_of(first).any(|partner| partner == second))
    }

    pub fn group(&self, code: &str) -> Option<&ExclusiveGroup> {
        self.groups.iter().find(|group| group.code == code)
    }

    pub fn group_of(&self, process: &ProcessId) -> Option<&ExclusiveGroup> {
        self.groups.iter().find(|group| group.members.contains(process))
    }

    /// Restrictions that depend only on bag type and material. Unlike
    /// exclusions these cannot be resolved by clearing other options.
    pub fn blocked_reason(
        &self,
        process: &ProcessId,
        bag_type: &BagTypeId,
        material: &MaterialId,
    ) -> Option<ConstraintViolation> {
        if let Some(rule) = self
            .bag_type_allow_lists
            .iter()
            .find(|rule| &rule.process == process && !rule.bag_types.contains(bag_type))
        {
            return Some(ConstraintViolation {
                code: rule.code.clone(),
                message: format!("`{process}` is not available for bag type `{bag_type}`"),
                suggestion: Some(format!(
                    "Choose one of: {}",
                    rule.bag_types.iter().map(BagTypeId::as_str).collect::<Vec<_>>().join(", ")
                )),
            });
        }

        if let Some(rule) = self.material_restrictions.iter().find(|rule| {
            rule.materials.contains(material) && rule.processes.contains(process)
        }) {
            return Some(ConstraintViolation {
                code: rule.code.clone(),
                message: format!("`{process}` cannot be produced on material `{material}`"),
                suggestion: Some("Pick a matte finish or a different material".to_owned()),
            });
        }

        None
    }

    /// Whether a UI or validation layer should refuse `process` in the current state.
    pub fn is_option_disabled(
        &self,
        process: &ProcessId,
        bag_type: &BagTypeId,
        material: &MaterialId,
        current: &BTreeSet<ProcessId>,
    ) -> bool {
        let excluded = self
            .exclusions
            .iter()
            .any(|rule| rule.partners_of(process).any(|partner| current.contains(partner)));

        excluded || self.blocked_reason(process, bag_type, material).is_some()
    }

    /// Ids that must be removed, atomically, when `selected` is added.
    pub fn resolve_clear_set(&self, selected: &ProcessId) -> BTreeSet<ProcessId> {
        let mut clear: BTreeSet<ProcessId> = self
            .exclusions
            .iter()
            .flat_map(|rule| rule.partners_of(selected))
            .cloned()
            .collect();

        for group in self.groups.iter().filter(|group| group.members.contains(selected)) {
            clear.extend(group.members.iter().filter(|member| *member != selected).cloned());
        }

        clear.remove(selected);
        clear
    }

    pub fn material_allowed(&self, material: &MaterialId, processes: &BTreeSet<ProcessId>) -> bool {
        !self.material_switches.iter().any(|rule| {
            rule.excluded_materials.contains(material)
                && rule.triggers.iter().any(|trigger| processes.contains(trigger))
        })
    }

    /// Materials that may be offered alongside `processes`, in catalog order.
    pub fn filter_materials<'a>(
        &self,
        materials: &'a [Material],
        processes: &BTreeSet<ProcessId>,
    ) -> Vec<&'a Material> {
        materials.iter().filter(|material| self.material_allowed(&material.id, processes)).collect()
    }

    /// `current` when it is compatible, otherwise the first compatible material.
    pub fn default_material_for(
        &self,
        materials: &[Material],
        processes: &BTreeSet<ProcessId>,
        current: &MaterialId,
    ) -> MaterialId {
        if self.material_allowed(current, processes) {
            return current.clone();
        }
        self.filter_materials(materials, processes)
            .first()
            .map(|material| material.id.clone())
            .unwrap_or_else(|| current.clone())
    }
}

pub fn validate_configuration_input(
    rules: &ConstraintRules,
    input: &QuoteInput,
) -> ConstraintResult {
    let mut result = ConstraintResult::default();
    let selected = &input.processes;

    for rule in &rules.exclusions {
        let left = rule.left.iter().find(|id| selected.contains(*id));
        let right = rule.right.iter().find(|id| selected.contains(*id));
        if let (Some(left), Some(right)) = (left, right) {
            result.violations.push(ConstraintViolation {
                code: format!("{}_CONFLICT", rule.code),
                message: format!("`{left}` cannot be combined with `{right}`"),
                suggestion: Some(format!("Remove either `{left}` or `{right}`")),
            });
        }
    }

    for group in &rules.groups {
        let chosen: Vec<&str> = group
            .members
            .iter()
            .filter(|member| selected.contains(*member))
            .map(ProcessId::as_str)
            .collect();
        if chosen.len() > 1 {
            result.violations.push(ConstraintViolation {
                code: "EXCLUSIVE_GROUP_CONFLICT".to_owned(),
                message: format!("{} allows one option, got {}", group.label, chosen.join(", ")),
                suggestion: Some(format!("Keep a single {} option", group.label.to_lowercase())),
            });
        }
    }

    for process in selected {
        if let Some(violation) = rules.blocked_reason(process, &input.bag_type, &input.material) {
            result.violations.push(violation);
        }
    }

    for rule in &rules.material_switches {
        let triggered = rule.triggers.iter().find(|trigger| selected.contains(*trigger));
        if let Some(trigger) = triggered {
            if rule.excluded_materials.contains(&input.material) {
                result.violations.push(ConstraintViolation {
                    code: rule.code.clone(),
                    message: format!(
                        "`{trigger}` cannot be fitted to material `{}`",
                        input.material
                    ),
                    suggestion: Some("Switch to a non-kraft material".to_owned()),
                });
            }
        }
    }

    if !result.violations.is_empty() {
        result.valid = false;
    }

    result
}

/// Interactive configurator state: the part of a quote the option rules act on.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Selection {
    pub bag_type: BagTypeId,
    pub material: MaterialId,
    #[serde(default)]
    pub processes: BTreeSet<ProcessId>,
}

#[derive(Clone, Debug, Error, PartialEq, Eq)]
pub enum SelectionError {
    #[error("unknown process option `{0}`")]
    UnknownProcess(ProcessId),
    #[error("unknown material `{0}`")]
    UnknownMaterial(MaterialId),
    #[error("unknown bag type `{0}`")]
    UnknownBagType(BagTypeId),
    #[error("unknown option group `{0}`")]
    UnknownGroup(String),
    #[error("`{process}` is not a member of option group `{group}`")]
    NotInGroup { group: String, process: ProcessId },
    #[error("option is unavailable: {}", .0.message)]
    Blocked(ConstraintViolation),
    #[error("material `{0}` is not available with the selected options")]
    MaterialUnavailable(MaterialId),
}

/// Applies the rule table to selection changes so the state never holds a
/// conflicting pair.
#[derive(Clone, Copy, Debug)]
pub struct Configurator<'a> {
    catalog: &'a CatalogRegistry,
    rules: &'a ConstraintRules,
}

impl<'a> Configurator<'a> {
    pub fn new(catalog: &'a CatalogRegistry, rules: &'a ConstraintRules) -> Self {
        Self { catalog, rules }
    }

    pub fn select(
        &self,
        selection: &Selection,
        process: &ProcessId,
    ) -> Result<Selection, SelectionError> {
        if self.catalog.process(process).is_none() {
            return Err(SelectionError::UnknownProcess(process.clone()));
        }
        if let Some(violation) =
            self.rules.blocked_reason(process, &selection.bag_type, &selection.material)
        {
            return Err(SelectionError::Blocked(violation));
        }

        let mut next = selection.clone();
        for cleared in self.rules.resolve_clear_set(process) {
            next.processes.remove(&cleared);
        }
        next.processes.insert(process.clone());
        next.material = self.rules.default_material_for(
            self.catalog.materials(),
            &next.processes,
            &next.material,
        );
        self.prune_blocked(&mut next);

        Ok(next)
    }

    pub fn deselect(&self, selection: &Selection, process: &ProcessId) -> Selection {
        let mut next = selection.clone();
        next.processes.remove(process);
        next
    }

    pub fn toggle(
        &self,
        selection: &Selection,
        process: &ProcessId,
    ) -> Result<Selection, SelectionError> {
        if selection.processes.contains(process) {
            return Ok(self.deselect(selection, process));
        }
        self.select(selection, process)
    }

    /// Sets a single-select group. `None` clears every member.
    pub fn select_group(
        &self,
        selection: &Selection,
        group_code: &str,
        choice: Option<&ProcessId>,
    ) -> Result<Selection, SelectionError> {
        let group = self
            .rules
            .group(group_code)
            .ok_or_else(|| SelectionError::UnknownGroup(group_code.to_owned()))?;

        let Some(process) = choice else {
            let mut next = selection.clone();
            next.processes.retain(|id| !group.members.contains(id));
            return Ok(next);
        };

        if !group.members.contains(process) {
            return Err(SelectionError::NotInGroup {
                group: group_code.to_owned(),
                process: process.clone(),
            });
        }
        self.select(selection, process)
    }

    /// Changes material, dropping options the new material cannot carry.
    pub fn set_material(
        &self,
        selection: &Selection,
        material: &MaterialId,
    ) -> Result<Selection, SelectionError> {
        if self.catalog.material(material).is_none() {
            return Err(SelectionError::UnknownMaterial(material.clone()));
        }
        if !self.rules.material_allowed(material, &selection.processes) {
            return Err(SelectionError::MaterialUnavailable(material.clone()));
        }

        let mut next = selection.clone();
        next.material = material.clone();
        self.prune_blocked(&mut next);
        Ok(next)
    }

    /// Changes bag type, dropping options the new bag type does not allow.
    pub fn set_bag_type(
        &self,
        selection: &Selection,
        bag_type: &BagTypeId,
    ) -> Result<Selection, SelectionError> {
        if self.catalog.bag_type(bag_type).is_none() {
            return Err(SelectionError::UnknownBagType(bag_type.clone()));
        }

        let mut next = selection.clone();
        next.bag_type = bag_type.clone();
        self.prune_blocked(&mut next);
        Ok(next)
    }

    /// Rebuilds a caller-supplied selection from scratch by replaying its bag type, material
    /// and options through the same rules as interactive changes. Options are replayed in id
    /// order, so a later conflicting option replaces an earlier one.
    pub fn normalize(&self, selection: &Selection) -> Result<Selection, SelectionError> {
        let empty = Selection {
            bag_type: selection.bag_type.clone(),
            material: selection.material.clone(),
            processes: BTreeSet::new(),
        };
        let mut next = self.set_bag_type(&empty, &selection.bag_type)?;
        next = self.set_material(&next, &selection.material)?;
        for process in &selection.processes {
            next = self.select(&next, process)?;
        }
        Ok(next)
    }

    pub fn available_materials(&self, selection: &Selection) -> Vec<&'a Material> {
        self.rules.filter_materials(self.catalog.materials(), &selection.processes)
    }

    pub fn disabled_options(&self, selection: &Selection) -> Vec<ProcessId> {
        self.catalog
            .processes()
            .iter()
            .map(|process| &process.id)
            .filter(|id| {
                !selection.processes.contains(*id)
                    && self.rules.is_option_disabled(
                        id,
                        &selection.bag_type,
                        &selection.material,
                        &selection.processes,
                    )
            })
            .cloned()
            .collect()
    }

    fn prune_blocked(&self, selection: &mut Selection) {
        let bag_type = selection.bag_type.clone();
        let material = selection.material.clone();
        selection
            .processes
            .retain(|id| self.rules.blocked_reason(id, &bag_type, &material).is_none());
    }
}

#[cfg(test)]
mod tests {
    use std::collections::BTreeSet;

    use super::{
        validate_configuration_input, ConstraintRules, Configurator, Selection, SelectionError,
    };
    use crate::cpq::catalog::CatalogRegistry;
    use crate::domain::packaging::{BagTypeId, MaterialId, ProcessId};
    use crate::domain::quote::QuoteInput;

    fn pid(id: &str) -> ProcessId {
        ProcessId::new(id)
    }

    fn selection(bag_type: &str, material: &str, processes: &[&str]) -> Selection {
        Selection {
            bag_type: BagTypeId::new(bag_type),
            material: MaterialId::new(material),
            processes: processes.iter().map(|id| pid(id)).collect(),
        }
    }

    fn set(ids: &[&str]) -> BTreeSet<ProcessId> {
        ids.iter().map(|id| pid(id)).collect()
    }

    #[test]
    fn standard_rules_reference_only_catalog_ids() {
        ConstraintRules::standard()
            .check_against(&CatalogRegistry::builtin())
            .expect("standard rules match builtin catalog");
    }

    #[test]
    fn exclusion_table_is_symmetric() {
        let rules = ConstraintRules::standard();
        let pairs = rules.mirrored_pairs();
        assert!(!pairs.is_empty());

        for (first, second) in &pairs {
            assert!(pairs.contains(&(second.clone(), first.clone())));
            assert!(rules.conflicts_with(first, second));
            assert!(rules.conflicts_with(second, first));
            assert!(rules.resolve_clear_set(first).contains(second));
            assert!(rules.resolve_clear_set(second).contains(first));
        }
    }

    #[test]
    fn spout_then_zipper_keeps_only_the_zipper() {
        let catalog = CatalogRegistry::builtin();
        let rules = ConstraintRules::standard();
        let configurator = Configurator::new(&catalog, &rules);

        let start = selection("stand-up", "pet-pe", &["gravure"]);
        let with_spout = configurator.select(&start, &pid("spout-corner")).expect("spout");
        let with_zipper = configurator.select(&with_spout, &pid("zipper")).expect("zipper");

        assert_eq!(with_zipper.processes, set(&["gravure", "zipper"]));
    }

    #[test]
    fn zipper_then_spout_keeps_only_the_spout() {
        let catalog = CatalogRegistry::builtin();
        let rules = ConstraintRules::standard();
        let configurator = Configurator::new(&catalog, &rules);

        let start = selection("stand-up", "pet-pe", &["gravure"]);
        let with_zipper = configurator.select(&start, &pid("zipper-pocket")).expect("zipper");
        let with_spout = configurator.select(&with_zipper, &pid("spout-center")).expect("spout");

        assert_eq!(with_spout.processes, set(&["gravure", "spout-center"]));
    }

    #[test]
    fn spout_disables_zipper_valve_and_tin_tie() {
        let rules = ConstraintRules::standard();
        let current = set(&["spout-corner"]);
        let gusseted = BagTypeId::new("gusseted");
        let film = MaterialId::new("pet-pe");

        for id in ["zipper", "zipper-pocket", "zipper-child", "valve", "tin-tie"] {
            assert!(rules.is_option_disabled(&pid(id), &gusseted, &film, &current), "{id}");
        }
        assert!(!rules.is_option_disabled(&pid("tear-notch"), &gusseted, &film, &current));

        let zipped = set(&["zipper"]);
        assert!(rules.is_option_disabled(&pid("spout-center"), &gusseted, &film, &zipped));
        assert!(rules.is_option_disabled(&pid("tin-tie"), &gusseted, &film, &zipped));
        let valved = set(&["valve"]);
        assert!(rules.is_option_disabled(&pid("spout-corner"), &gusseted, &film, &valved));
    }

    #[test]
    fn tin_tie_requires_an_allowed_bag_type() {
        let rules = ConstraintRules::standard();
        let film = MaterialId::new("pet-pe");
        let none = BTreeSet::new();

        let tin_tie = pid("tin-tie");

        assert!(rules.is_option_disabled(&tin_tie, &BagTypeId::new("stand-up"), &film, &none));
        assert!(!rules.is_option_disabled(&tin_tie, &BagTypeId::new("gusseted"), &film, &none));
        assert!(!rules.is_option_disabled(&tin_tie, &BagTypeId::new("flat-bottom"), &film, &none));
    }

    #[test]
    fn kraft_disables_window_and_glossy_finishes_only() {
        let rules = ConstraintRules::standard();
        let bag = BagTypeId::new("stand-up");
        let kraft = MaterialId::new("kraft-pla");
        let none = BTreeSet::new();

        for id in ["clear-window", "gloss-lamination", "spot-uv", "soft-touch", "holographic"] {
            assert!(rules.is_option_disabled(&pid(id), &bag, &kraft, &none), "{id}");
        }
        assert!(!rules.is_option_disabled(&pid("matte-lamination"), &bag, &kraft, &none));
        let silver = MaterialId::new("silver");
        assert!(!rules.is_option_disabled(&pid("gloss-lamination"), &bag, &silver, &none));
    }

    #[test]
    fn spout_on_kraft_switches_to_first_non_kraft_material() {
        let catalog = CatalogRegistry::builtin();
        let rules = ConstraintRules::standard();
        let configurator = Configurator::new(&catalog, &rules);

        let start = selection("stand-up", "kraft-pe", &["gravure"]);
        let next = configurator.select(&start, &pid("spout-corner")).expect("spout");

        assert_eq!(next.material, MaterialId::new("pet-pe"));
        assert!(validate_configuration_input(
            &rules,
            &QuoteInput {
                processes: next.processes.clone(),
                ..QuoteInput::new("stand-up", "md", next.material.as_str(), 1000, 1)
            }
        )
        .valid);
    }

    #[test]
    fn kraft_is_not_offered_while_a_spout_is_selected() {
        let catalog = CatalogRegistry::builtin();
        let rules = ConstraintRules::standard();
        let configurator = Configurator::new(&catalog, &rules);

        let spouted = selection("stand-up", "pet-pe", &["spout-center"]);
        let offered: Vec<&str> =
            configurator.available_materials(&spouted).iter().map(|m| m.id.as_str()).collect();
        assert!(!offered.contains(&"kraft-pe"));
        assert!(!offered.contains(&"kraft-pla"));
        assert_eq!(offered.len(), catalog.materials().len() - 2);

        let error = configurator
            .set_material(&spouted, &MaterialId::new("kraft-pla"))
            .expect_err("kraft must be refused");
        assert_eq!(error, SelectionError::MaterialUnavailable(MaterialId::new("kraft-pla")));
    }

    #[test]
    fn exclusive_group_replaces_and_none_clears() {
        let catalog = CatalogRegistry::builtin();
        let rules = ConstraintRules::standard();
        let configurator = Configurator::new(&catalog, &rules);

        let start = selection("stand-up", "pet-pe", &["gravure", "tear-notch"]);
        let digital = configurator.select(&start, &pid("digital")).expect("digital");
        assert_eq!(digital.processes, set(&["digital", "tear-notch"]));

        let left_notch = configurator
            .select_group(&digital, "tear_notch", Some(&pid("tear-notch-left")))
            .expect("left notch");
        assert_eq!(left_notch.processes, set(&["digital", "tear-notch-left"]));

        let cleared = configurator.select_group(&left_notch, "tear_notch", None).expect("none");
        assert_eq!(cleared.processes, set(&["digital"]));

        assert!(matches!(
            configurator.select_group(&cleared, "tear_notch", Some(&pid("zipper"))),
            Err(SelectionError::NotInGroup { .. })
        ));
        assert!(matches!(
            configurator.select_group(&cleared, "lids", None),
            Err(SelectionError::UnknownGroup(_))
        ));
    }

    #[test]
    fn blocked_options_are_refused_and_pruned_on_change() {
        let catalog = CatalogRegistry::builtin();
        let rules = ConstraintRules::standard();
        let configurator = Configurator::new(&catalog, &rules);

        let stand_up = selection("stand-up", "pet-pe", &[]);
        assert!(matches!(
            configurator.select(&stand_up, &pid("tin-tie")),
            Err(SelectionError::Blocked(ref violation)) if violation.code == "TIN_TIE_BAG_TYPE"
        ));

        let glossy = selection("gusseted", "pet-pe", &["gloss-lamination", "tin-tie"]);
        let kraft =
            configurator.set_material(&glossy, &MaterialId::new("kraft-pe")).expect("kraft");
        assert_eq!(kraft.processes, set(&["tin-tie"]));

        let back_to_stand_up =
            configurator.set_bag_type(&kraft, &BagTypeId::new("stand-up")).expect("bag type");
        assert!(back_to_stand_up.processes.is_empty());
    }

    #[test]
    fn applying_any_clear_set_leaves_no_conflicting_pair() {
        let catalog = CatalogRegistry::builtin();
        let rules = ConstraintRules::standard();
        let configurator = Configurator::new(&catalog, &rules);
        let base = selection("gusseted", "pet-pe", &[]);

        for first in catalog.processes() {
            let Ok(after_first) = configurator.select(&base, &first.id) else {
                continue;
            };
            for second in catalog.processes() {
                let Ok(after_second) = configurator.select(&after_first, &second.id) else {
                    continue;
                };
                assert!(after_second.processes.contains(&second.id));

                let input = QuoteInput {
                    processes: after_second.processes.clone(),
                    ..QuoteInput::new("gusseted", "md", after_second.material.as_str(), 1000, 1)
                };
                let result = validate_configuration_input(&rules, &input);
                assert!(result.valid, "{} then {}: {:?}", first.id, second.id, result.violations);
            }
        }
    }

    #[test]
    fn disabled_options_lists_conflicts_for_the_current_state() {
        let catalog = CatalogRegistry::builtin();
        let rules = ConstraintRules::standard();
        let configurator = Configurator::new(&catalog, &rules);

        let state = selection("stand-up", "kraft-pe", &["zipper"]);
        let disabled = configurator.disabled_options(&state);
        for id in ["spout-corner", "spout-center", "tin-tie", "clear-window", "spot-uv"] {
            assert!(disabled.contains(&pid(id)), "{id}");
        }
        assert!(!disabled.contains(&pid("valve")));
    }

    #[test]
    fn validation_reports_each_kind_of_violation() {
        let rules = ConstraintRules::standard();
        let input = QuoteInput {
            processes: set(&["spout-corner", "zipper", "gravure", "flexo", "tin-tie", "spot-uv"]),
            ..QuoteInput::new("stand-up", "md", "kraft-pe", 1000, 1)
        };

        let result = validate_configuration_input(&rules, &input);
        assert!(!result.valid);
        let codes: Vec<&str> = result.violations.iter().map(|v| v.code.as_str()).collect();
        for code in [
            "SPOUT_ZIPPER_CONFLICT",
            "SPOUT_TIN_TIE_CONFLICT",
            "TIN_TIE_ZIPPER_CONFLICT",
            "EXCLUSIVE_GROUP_CONFLICT",
            "TIN_TIE_BAG_TYPE",
            "KRAFT_FINISH",
            "SPOUT_KRAFT",
        ] {
            assert!(codes.contains(&code), "missing {code} in {codes:?}");
        }
    }

    #[test]
    fn normalize_resolves_conflicts_carried_in_the_input() {
        let catalog = CatalogRegistry::builtin();
        let rules = ConstraintRules::standard();
        let configurator = Configurator::new(&catalog, &rules);

        let carried = selection("stand-up", "kraft-pe", &["spout-corner", "zipper"]);
        let normalized = configurator.normalize(&carried).expect("normalize");
        let next = configurator.select(&normalized, &pid("tear-notch")).expect("tear notch");

        assert_eq!(next.processes, set(&["tear-notch", "zipper"]));
        assert_ne!(next.material, MaterialId::new("kraft-pe"));
        let input = QuoteInput {
            processes: next.processes.clone(),
            ..QuoteInput::new("stand-up", "md", next.material.as_str(), 1000, 1)
        };
        assert!(validate_configuration_input(&rules, &input).valid);
    }

    #[test]
    fn normalize_refuses_options_the_material_blocks() {
        let catalog = CatalogRegistry::builtin();
        let rules = ConstraintRules::standard();
        let configurator = Configurator::new(&catalog, &rules);

        let carried = selection("stand-up", "kraft-pe", &["gloss-lamination", "zipper"]);
        assert!(matches!(
            configurator.normalize(&carried),
            Err(SelectionError::Blocked(ref violation)) if violation.code == "KRAFT_FINISH"
        ));

        let unknown = selection("tote", "pet-pe", &[]);
        assert_eq!(
            configurator.normalize(&unknown),
            Err(SelectionError::UnknownBagType(BagTypeId::new("tote")))
        );
    }
}
