//! Channel impairments: scripted per-frame actions plus seeded random noise.

use rand::rngs::StdRng;
use rand::Rng;
use serde::Deserialize;
use std::collections::VecDeque;
use tracing::debug;

/// Probabilistic impairment profile applied once the script runs out.
#[derive(Debug, Clone, Deserialize)]
pub struct SimProfile {
    pub loss_rate: f64,
    pub corrupt_rate: f64,
    pub seed: u64,
}

impl Default for SimProfile {
    fn default() -> Self {
        Self {
            loss_rate: 0.0,
            corrupt_rate: 0.0,
            seed: 0,
        }
    }
}

/// What the link does to one transmitted frame.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum FaultAction {
    /// Forward unmodified.
    Pass,
    /// The frame never materialises on the far side.
    Drop,
    /// Flip one bit of the byte at `offset` (wrapped into range).
    CorruptByte { offset: usize },
    /// Deliver the frame twice.
    Duplicate,
    /// Deliver the frame as two separate reads split at `offset`.
    SplitAt { offset: usize },
}

/// Ordered script of actions, one per transmitted frame, applied in the
/// direction this plan is attached to.
#[derive(Debug, Default)]
pub struct FaultPlan {
    script: VecDeque<FaultAction>,
}

impl FaultPlan {
    pub fn scripted(actions: impl IntoIterator<Item = FaultAction>) -> Self {
        Self {
            script: actions.into_iter().collect(),
        }
    }

    /// Turn one outgoing frame into the chunks that actually reach the far
    /// side. Scripted actions take priority; afterwards the probabilistic
    /// profile applies.
    pub fn apply(&mut self, frame: &[u8], profile: &SimProfile, rng: &mut StdRng) -> Vec<Vec<u8>> {
        let action = match self.script.pop_front() {
            Some(action) => action,
            None => self.roll(frame.len(), profile, rng),
        };
        match action {
            FaultAction::Pass => vec![frame.to_vec()],
            FaultAction::Drop => {
                debug!("frame lost in channel");
                Vec::new()
            }
            FaultAction::CorruptByte { offset } => {
                let mut damaged = frame.to_vec();
                if !damaged.is_empty() {
                    let at = offset % damaged.len();
                    damaged[at] ^= 0x01;
                    debug!("frame corrupted at byte {}", at);
                }
                vec![damaged]
            }
            FaultAction::Duplicate => {
                debug!("frame duplicated in channel");
                vec![frame.to_vec(), frame.to_vec()]
            }
            FaultAction::SplitAt { offset } => {
                let at = offset.min(frame.len());
                vec![frame[..at].to_vec(), frame[at..].to_vec()]
            }
        }
    }

    fn roll(&self, frame_len: usize, profile: &SimProfile, rng: &mut StdRng) -> FaultAction {
        if rng.random::<f64>() < profile.loss_rate {
            return FaultAction::Drop;
        }
        if rng.random::<f64>() < profile.corrupt_rate {
            let offset = if frame_len == 0 {
                0
            } else {
                rng.random_range(0..frame_len)
            };
            return FaultAction::CorruptByte { offset };
        }
        FaultAction::Pass
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::SeedableRng;

    fn rng() -> StdRng {
        StdRng::seed_from_u64(0)
    }

    #[test]
    fn empty_plan_with_clean_profile_passes_frames_through() {
        let mut plan = FaultPlan::default();
        let chunks = plan.apply(b"frame", &SimProfile::default(), &mut rng());
        assert_eq!(chunks, vec![b"frame".to_vec()]);
    }

    #[test]
    fn scripted_actions_apply_in_order_then_fall_back() {
        let mut plan = FaultPlan::scripted([FaultAction::Drop, FaultAction::Duplicate]);
        let profile = SimProfile::default();
        let mut rng = rng();
        assert!(plan.apply(b"one", &profile, &mut rng).is_empty());
        assert_eq!(plan.apply(b"two", &profile, &mut rng).len(), 2);
        assert_eq!(plan.apply(b"three", &profile, &mut rng).len(), 1);
    }

    #[test]
    fn corrupt_byte_flips_exactly_one_bit() {
        let mut plan = FaultPlan::scripted([FaultAction::CorruptByte { offset: 2 }]);
        let chunks = plan.apply(b"abcdef", &SimProfile::default(), &mut rng());
        let damaged = &chunks[0];
        assert_ne!(damaged.as_slice(), b"abcdef");
        let differing: Vec<usize> = (0..6).filter(|&i| damaged[i] != b"abcdef"[i]).collect();
        assert_eq!(differing, vec![2]);
    }

    #[test]
    fn split_produces_two_chunks_that_reassemble() {
        let mut plan = FaultPlan::scripted([FaultAction::SplitAt { offset: 3 }]);
        let chunks = plan.apply(b"abcdef", &SimProfile::default(), &mut rng());
        assert_eq!(chunks.len(), 2);
        let mut joined = chunks[0].clone();
        joined.extend_from_slice(&chunks[1]);
        assert_eq!(joined, b"abcdef");
    }

    #[test]
    fn certain_loss_drops_everything() {
        let profile = SimProfile {
            loss_rate: 1.0,
            ..Default::default()
        };
        let mut plan = FaultPlan::default();
        let mut rng = rng();
        for _ in 0..10 {
            assert!(plan.apply(b"frame", &profile, &mut rng).is_empty());
        }
    }
}
