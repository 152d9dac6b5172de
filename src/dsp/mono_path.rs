//! Per-channel signal path
//!
//! Low Cut -> Peak -> High Cut, held as a fixed ordered list of named roles.
//! Stereo uses two independent paths fed with the same coefficients.

use super::{CascadeChain, CoefficientSet, CutCoefficients, FilterStage};
use serde::{Deserialize, Serialize};
use std::fmt;

/// Position of an element in the mono path
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum StageRole {
    LowCut,
    Peak,
    HighCut,
}

impl StageRole {
    /// Processing order
    pub const ALL: [StageRole; 3] = [StageRole::LowCut, StageRole::Peak, StageRole::HighCut];

    fn index(self) -> usize {
        match self {
            StageRole::LowCut => 0,
            StageRole::Peak => 1,
            StageRole::HighCut => 2,
        }
    }
}

impl fmt::Display for StageRole {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            StageRole::LowCut => write!(f, "Low Cut"),
            StageRole::Peak => write!(f, "Peak"),
            StageRole::HighCut => write!(f, "High Cut"),
        }
    }
}

#[derive(Debug, Clone)]
enum PathElement {
    Cascade(CascadeChain),
    Single(FilterStage),
}

impl PathElement {
    #[inline]
    fn process(&mut self, sample: f32) -> f32 {
        match self {
            PathElement::Cascade(chain) => chain.process(sample),
            PathElement::Single(stage) => stage.process(sample),
        }
    }

    fn magnitude_at(&self, frequency: f64, sample_rate: f64) -> f64 {
        match self {
            PathElement::Cascade(chain) => chain.magnitude_at(frequency, sample_rate),
            PathElement::Single(stage) => stage.magnitude_at(frequency, sample_rate),
        }
    }

    fn reset(&mut self) {
        match self {
            PathElement::Cascade(chain) => chain.reset(),
            PathElement::Single(stage) => stage.reset(),
        }
    }
}

#[derive(Debug, Clone)]
struct PathSlot {
    role: StageRole,
    enabled: bool,
    element: PathElement,
}

/// Full filter path for one channel
#[derive(Debug, Clone)]
pub struct MonoPath {
    slots: [PathSlot; 3],
    sample_rate: f64,
    block_size: usize,
}

impl Default for MonoPath {
    fn default() -> Self {
        Self::new()
    }
}

impl MonoPath {
    pub fn new() -> Self {
        let slot = |role, element| PathSlot {
            role,
            enabled: true,
            element,
        };
        Self {
            slots: [
                slot(StageRole::LowCut, PathElement::Cascade(CascadeChain::new())),
                slot(StageRole::Peak, PathElement::Single(FilterStage::new())),
                slot(StageRole::HighCut, PathElement::Cascade(CascadeChain::new())),
            ],
            sample_rate: 0.0,
            block_size: 0,
        }
    }

    /// Prepare for a (re)started stream
    ///
    /// Clears all filter history; calling it twice with the same arguments
    /// leaves the path in the same state as calling it once.
    pub fn prepare(&mut self, sample_rate: f64, block_size: usize) {
        self.sample_rate = sample_rate;
        self.block_size = block_size;
        for slot in &mut self.slots {
            slot.element.reset();
        }
    }

    pub fn sample_rate(&self) -> f64 {
        self.sample_rate
    }

    pub fn block_size(&self) -> usize {
        self.block_size
    }

    /// Filter a block of samples in place
    pub fn process(&mut self, block: &mut [f32]) {
        for sample in block.iter_mut() {
            *sample = self.process_sample(*sample);
        }
    }

    #[inline]
    pub fn process_sample(&mut self, sample: f32) -> f32 {
        let mut out = sample;
        for slot in &mut self.slots {
            if slot.enabled {
                out = slot.element.process(out);
            }
        }
        out
    }

    /// Replace every coefficient set of the path in one call
    pub fn update_coefficients(
        &mut self,
        peak: &CoefficientSet,
        low_cut: &CutCoefficients,
        low_cut_active: usize,
        high_cut: &CutCoefficients,
        high_cut_active: usize,
    ) {
        for slot in &mut self.slots {
            match (slot.role, &mut slot.element) {
                (StageRole::LowCut, PathElement::Cascade(chain)) => {
                    chain.configure(low_cut, low_cut_active)
                }
                (StageRole::HighCut, PathElement::Cascade(chain)) => {
                    chain.configure(high_cut, high_cut_active)
                }
                (StageRole::Peak, PathElement::Single(stage)) => stage.set_coefficients(*peak),
                _ => unreachable!("role/element pairing is fixed in MonoPath::new"),
            }
        }
    }

    /// Enable or bypass a whole role
    pub fn set_role_enabled(&mut self, role: StageRole, enabled: bool) {
        self.slots[role.index()].enabled = enabled;
    }

    pub fn is_role_enabled(&self, role: StageRole) -> bool {
        self.slots[role.index()].enabled
    }

    /// Cascade behind a cut role
    pub fn cascade(&self, role: StageRole) -> Option<&CascadeChain> {
        match &self.slots[role.index()].element {
            PathElement::Cascade(chain) => Some(chain),
            PathElement::Single(_) => None,
        }
    }

    /// The peak stage
    pub fn peak_stage(&self) -> &FilterStage {
        match &self.slots[StageRole::Peak.index()].element {
            PathElement::Single(stage) => stage,
            PathElement::Cascade(_) => unreachable!("peak slot always holds a single stage"),
        }
    }

    /// Linear magnitude of the enabled roles at `frequency`
    pub fn magnitude_at(&self, frequency: f64, sample_rate: f64) -> f64 {
        self.slots
            .iter()
            .filter(|slot| slot.enabled)
            .map(|slot| slot.element.magnitude_at(frequency, sample_rate))
            .product()
    }

    /// Roles in processing order with their enable flags
    pub fn roles(&self) -> impl Iterator<Item = (StageRole, bool)> + '_ {
        self.slots.iter().map(|slot| (slot.role, slot.enabled))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::dsp::coefficients::{butterworth_high_pass, butterworth_low_pass, peak};
    use approx::assert_relative_eq;

    const FS: f64 = 48000.0;

    fn configured_path() -> MonoPath {
        let mut path = MonoPath::new();
        path.prepare(FS, 512);
        path.update_coefficients(
            &peak(1000.0, 1.0, 2.0, FS).unwrap(),
            &butterworth_high_pass(100.0, FS, 4).unwrap(),
            2,
            &butterworth_low_pass(8000.0, FS, 2).unwrap(),
            1,
        );
        path
    }

    #[test]
    fn test_roles_in_processing_order() {
        let path = MonoPath::new();
        let roles: Vec<StageRole> = path.roles().map(|(role, _)| role).collect();
        assert_eq!(roles, StageRole::ALL.to_vec());
    }

    #[test]
    fn test_unconfigured_path_is_identity() {
        let mut path = MonoPath::new();
        path.prepare(FS, 4);
        let mut block = [0.25, -0.5, 1.0, 0.0];
        path.process(&mut block);
        assert_eq!(block, [0.25, -0.5, 1.0, 0.0]);
    }

    #[test]
    fn test_update_coefficients_reaches_every_role() {
        let path = configured_path();
        assert_eq!(path.cascade(StageRole::LowCut).unwrap().active_count(), 2);
        assert_eq!(path.cascade(StageRole::HighCut).unwrap().active_count(), 1);
        assert!(path.cascade(StageRole::Peak).is_none());
        assert!(!path.peak_stage().coefficients().is_identity());
    }

    #[test]
    fn test_magnitude_is_product_of_roles() {
        let path = configured_path();
        let f = 1000.0;
        let expected = path.cascade(StageRole::LowCut).unwrap().magnitude_at(f, FS)
            * path.peak_stage().magnitude_at(f, FS)
            * path.cascade(StageRole::HighCut).unwrap().magnitude_at(f, FS);
        assert_relative_eq!(path.magnitude_at(f, FS), expected, epsilon = 1e-12);
    }

    #[test]
    fn test_disabled_role_drops_out() {
        let mut path = configured_path();
        path.set_role_enabled(StageRole::Peak, false);
        assert!(!path.is_role_enabled(StageRole::Peak));

        let with_cuts_only = path.cascade(StageRole::LowCut).unwrap().magnitude_at(1000.0, FS)
            * path.cascade(StageRole::HighCut).unwrap().magnitude_at(1000.0, FS);
        assert_relative_eq!(path.magnitude_at(1000.0, FS), with_cuts_only, epsilon = 1e-12);
    }

    #[test]
    fn test_all_roles_disabled_is_identity() {
        let mut path = configured_path();
        for role in StageRole::ALL {
            path.set_role_enabled(role, false);
        }
        let mut block = [0.3, -0.7, 0.9];
        path.process(&mut block);
        assert_eq!(block, [0.3, -0.7, 0.9]);
    }

    #[test]
    fn test_prepare_resets_history() {
        let mut path = configured_path();
        let mut noise: Vec<f32> = (0..512).map(|i| ((i * 7919) % 97) as f32 / 97.0 - 0.5).collect();
        path.process(&mut noise);

        path.prepare(FS, 512);
        let mut fresh = configured_path();

        let mut a = vec![1.0; 64];
        let mut b = vec![1.0; 64];
        path.process(&mut a);
        fresh.process(&mut b);
        assert_eq!(a, b);
    }

    #[test]
    fn test_prepare_records_stream_format() {
        let mut path = MonoPath::new();
        path.prepare(44100.0, 256);
        assert_eq!(path.sample_rate(), 44100.0);
        assert_eq!(path.block_size(), 256);
        assert_eq!(path.cascade(StageRole::LowCut).unwrap().active_count(), 1);
    }
}
