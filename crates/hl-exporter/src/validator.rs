//! Validator summary records and the per-cycle stake aggregates.

use serde::{Deserialize, Deserializer};

/// One entry of the `validatorSummaries` response.
///
/// The upstream sends `null` for some fields (notably `unjailableAfter` on
/// validators that were never jailed); those decode to the field's zero value
/// instead of failing the whole cycle.
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct ValidatorSummary {
    #[serde(deserialize_with = "null_as_default")]
    pub validator: String,
    #[serde(deserialize_with = "null_as_default")]
    pub signer: String,
    #[serde(deserialize_with = "null_as_default")]
    pub name: String,
    #[serde(deserialize_with = "null_as_default")]
    pub description: String,
    #[serde(deserialize_with = "null_as_default")]
    pub n_recent_blocks: i64,
    #[serde(deserialize_with = "null_as_default")]
    pub stake: f64,
    #[serde(deserialize_with = "null_as_default")]
    pub is_jailed: bool,
    pub unjailable_after: Option<i64>,
    #[serde(deserialize_with = "null_as_default")]
    pub is_active: bool,
}

impl ValidatorSummary {
    /// 1.0 when jailed, 0.0 otherwise.
    pub fn jailed_status(&self) -> f64 {
        if self.is_jailed {
            1.0
        } else {
            0.0
        }
    }

    /// 1.0 when active, 0.0 otherwise.
    pub fn active_status(&self) -> f64 {
        if self.is_active {
            1.0
        } else {
            0.0
        }
    }
}

fn null_as_default<'de, D, T>(deserializer: D) -> Result<T, D::Error>
where
    D: Deserializer<'de>,
    T: Default + Deserialize<'de>,
{
    Ok(Option::<T>::deserialize(deserializer)?.unwrap_or_default())
}

/// Decode a response body into summaries, in array order.
pub fn decode_summaries(body: &[u8]) -> Result<Vec<ValidatorSummary>, serde_json::Error> {
    serde_json::from_slice(body)
}

/// Stake totals over one cycle's summaries.
///
/// Every summary lands on exactly one side of the jailed/not-jailed split and
/// exactly one side of the active/inactive split, so both splits sum to
/// `total_stake`. Each sum is accumulated separately in f64: the splits match
/// the total exactly for integral stakes, and within
/// [`partition_tolerance`](Self::partition_tolerance) otherwise.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct AggregateStats {
    pub total_stake: f64,
    pub jailed_stake: f64,
    pub not_jailed_stake: f64,
    pub active_stake: f64,
    pub inactive_stake: f64,
    pub validator_count: usize,
}

impl AggregateStats {
    pub fn from_summaries(summaries: &[ValidatorSummary]) -> Self {
        summaries.iter().fold(Self::default(), |mut stats, summary| {
            stats.record(summary);
            stats
        })
    }

    /// Add one summary's stake to the running totals.
    pub fn record(&mut self, summary: &ValidatorSummary) {
        self.total_stake += summary.stake;

        if summary.is_jailed {
            self.jailed_stake += summary.stake;
        } else {
            self.not_jailed_stake += summary.stake;
        }

        if summary.is_active {
            self.active_stake += summary.stake;
        } else {
            self.inactive_stake += summary.stake;
        }

        self.validator_count += 1;
    }

    /// Largest rounding gap allowed between a split's two halves and
    /// `total_stake`.
    pub fn partition_tolerance(&self) -> f64 {
        (self.validator_count as f64 + 2.0) * f64::EPSILON * self.total_stake
    }
}
