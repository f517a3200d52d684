//! Block state to model variant resolution.

use super::multipart::multipart_candidates;
use crate::error::{ResolveError, Result};
use crate::identifier::Identifier;
use crate::region::Properties;
use crate::resource_pack::{BlockstateDefinition, ModelVariant, VariantRule};
use parking_lot::Mutex;
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};

/// Chooses one of several alternative variants.
pub trait VariantPicker: Send + Sync {
    /// Index in `0..len`. Only called with `len >= 1`.
    fn pick(&self, len: usize) -> usize;
}

/// Uniform choice from the thread-local generator.
#[derive(Debug, Clone, Copy, Default)]
pub struct RandomPicker;

impl VariantPicker for RandomPicker {
    fn pick(&self, len: usize) -> usize {
        if len <= 1 {
            return 0;
        }
        rand::thread_rng().gen_range(0..len)
    }
}

/// Uniform choice from a seeded generator, reproducible across runs.
#[derive(Debug)]
pub struct SeededPicker {
    rng: Mutex<StdRng>,
}

impl SeededPicker {
    pub fn new(seed: u64) -> Self {
        Self {
            rng: Mutex::new(StdRng::seed_from_u64(seed)),
        }
    }
}

impl VariantPicker for SeededPicker {
    fn pick(&self, len: usize) -> usize {
        if len <= 1 {
            return 0;
        }
        self.rng.lock().gen_range(0..len)
    }
}

/// Always the first alternative.
#[derive(Debug, Clone, Copy, Default)]
pub struct FirstPicker;

impl VariantPicker for FirstPicker {
    fn pick(&self, _len: usize) -> usize {
        0
    }
}

/// Pick one entry of an alternative list, `None` when it is empty.
pub(crate) fn pick_one<'v, T>(alternatives: &'v [T], picker: &dyn VariantPicker) -> Option<&'v T> {
    match alternatives.len() {
        0 => None,
        1 => alternatives.first(),
        n => alternatives.get(picker.pick(n).min(n - 1)),
    }
}

/// Resolves block states to model variants.
pub struct StateResolver<'a> {
    picker: &'a dyn VariantPicker,
}

impl<'a> StateResolver<'a> {
    pub fn new(picker: &'a dyn VariantPicker) -> Self {
        Self { picker }
    }

    /// Alternative lists for every model slot a block state fills.
    ///
    /// Variants: the first rule in declared order whose predicate holds
    /// fills one slot. Multipart: every applicable case in order, one slot
    /// per application.
    pub fn candidates<'d>(
        &self,
        block: &Identifier,
        definition: &'d BlockstateDefinition,
        properties: &Properties,
    ) -> Result<Vec<&'d [ModelVariant]>> {
        match definition {
            BlockstateDefinition::Variants(rules) => rules
                .iter()
                .find(|rule| rule.matches(properties))
                .map(|rule: &VariantRule| vec![rule.variants.as_slice()])
                .ok_or_else(|| ResolveError::NoMatchingVariant {
                    block: block.to_string(),
                    properties: properties.to_string(),
                }),
            BlockstateDefinition::Multipart(cases) => Ok(multipart_candidates(cases, properties)),
        }
    }

    /// Select the model variants a block state uses, one alternative per slot.
    pub fn select(
        &self,
        block: &Identifier,
        definition: &BlockstateDefinition,
        properties: &Properties,
    ) -> Result<Vec<ModelVariant>> {
        Ok(self
            .candidates(block, definition, properties)?
            .into_iter()
            .filter_map(|alternatives| pick_one(alternatives, self.picker).cloned())
            .collect())
    }
}
