//! TOML-described fault scenarios for repeatable exchanges.

use serde::Deserialize;

use rdt_lab_engine::RdtConfig;

use crate::fault::{FaultAction, FaultPlan, SimProfile};
use crate::link::LinkEnd;

/// A named, repeatable channel-impairment setup.
///
/// `data_faults` script what happens to the sender's data frames,
/// `reply_faults` what happens to the receiver's control replies.
#[derive(Debug, Clone, Deserialize)]
pub struct FaultScenario {
    pub name: String,
    pub description: String,
    #[serde(default)]
    pub profile: ProfileOverride,
    #[serde(default)]
    pub data_faults: Vec<FaultAction>,
    #[serde(default)]
    pub reply_faults: Vec<FaultAction>,
    #[serde(default)]
    pub config: Option<RdtConfig>,
}

/// Partial profile, merged over the defaults.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct ProfileOverride {
    pub loss_rate: Option<f64>,
    pub corrupt_rate: Option<f64>,
    pub seed: Option<u64>,
}

impl ProfileOverride {
    pub fn apply_to(&self, profile: &mut SimProfile) {
        if let Some(v) = self.loss_rate {
            profile.loss_rate = v;
        }
        if let Some(v) = self.corrupt_rate {
            profile.corrupt_rate = v;
        }
        if let Some(v) = self.seed {
            profile.seed = v;
        }
    }
}

impl FaultScenario {
    pub fn from_toml(text: &str) -> Result<Self, toml::de::Error> {
        toml::from_str(text)
    }

    /// Install this scenario's faults onto a data link: `sender_end` is the
    /// end the data frames leave from, `receiver_end` the end the control
    /// replies leave from.
    pub fn install(&self, sender_end: &mut LinkEnd, receiver_end: &mut LinkEnd) {
        let mut profile = SimProfile::default();
        self.profile.apply_to(&mut profile);
        sender_end.set_profile(profile.clone());
        receiver_end.set_profile(profile);
        sender_end.set_faults(FaultPlan::scripted(self.data_faults.iter().cloned()));
        receiver_end.set_faults(FaultPlan::scripted(self.reply_faults.iter().cloned()));
    }
}
