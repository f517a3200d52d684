//! Multipart blockstate selection.
//!
//! Condition evaluation lives on [`MultipartCondition`]; this collects the
//! parts that apply, in declared order.

pub use crate::resource_pack::blockstate::MultipartCondition;

use super::state_resolver::{pick_one, VariantPicker};
use crate::region::Properties;
use crate::resource_pack::{ModelVariant, MultipartCase};

/// Alternative lists of every applicable case, in order. A case that
/// applies several times contributes one list per application.
pub fn multipart_candidates<'c>(cases: &'c [MultipartCase], properties: &Properties) -> Vec<&'c [ModelVariant]> {
    let mut slots = Vec::new();
    for case in cases {
        for _ in 0..case.applications(properties) {
            slots.push(case.apply.variants());
        }
    }
    slots
}

/// Collect one applied variant per slot of [`multipart_candidates`].
pub fn select_multipart(
    cases: &[MultipartCase],
    properties: &Properties,
    picker: &dyn VariantPicker,
) -> Vec<ModelVariant> {
    multipart_candidates(cases, properties)
        .into_iter()
        .filter_map(|alternatives| pick_one(alternatives, picker).cloned())
        .collect()
}
