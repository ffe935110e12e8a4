//! Metrics sink: where the monitor publishes validator state.
//!
//! The monitor only ever writes through [`MetricsSink`]. [`PrometheusSink`]
//! backs it with a dedicated [`Registry`] that the `/metrics` route renders.

use prometheus::{
    Encoder, Gauge, GaugeVec, Histogram, HistogramOpts, IntCounterVec, IntGauge, IntGaugeVec,
    Opts, Registry, TextEncoder,
};

const VALIDATOR_LABELS: &[&str] = &["validator", "signer", "name"];

/// Write-only view of the metrics backend.
///
/// Per-validator setters are keyed by `(validator, signer, name)`; setting the
/// same key again overwrites the previous value.
pub trait MetricsSink: Send + Sync + 'static {
    fn set_validator_stake(&self, validator: &str, signer: &str, name: &str, stake: f64);
    fn set_validator_jailed_status(&self, validator: &str, signer: &str, name: &str, status: f64);
    fn set_validator_active_status(&self, validator: &str, signer: &str, name: &str, status: f64);

    fn set_validator_recent_blocks(
        &self,
        _validator: &str,
        _signer: &str,
        _name: &str,
        _blocks: i64,
    ) {
    }

    fn set_total_stake(&self, value: f64);
    fn set_jailed_stake(&self, value: f64);
    fn set_not_jailed_stake(&self, value: f64);
    fn set_active_stake(&self, value: f64);
    fn set_inactive_stake(&self, value: f64);
    fn set_validator_count(&self, count: i64);

    /// Record the outcome of one monitor cycle. `result` is `"success"` or
    /// the failed step's kind.
    fn record_cycle(&self, _result: &str, _elapsed_secs: f64) {}
}

/// Prometheus-backed [`MetricsSink`].
pub struct PrometheusSink {
    registry: Registry,
    validator_stake: GaugeVec,
    validator_jailed: GaugeVec,
    validator_active: GaugeVec,
    validator_recent_blocks: IntGaugeVec,
    total_stake: Gauge,
    jailed_stake: Gauge,
    not_jailed_stake: Gauge,
    active_stake: Gauge,
    inactive_stake: Gauge,
    validator_count: IntGauge,
    cycles: IntCounterVec,
    cycle_duration: Histogram,
    last_success: IntGauge,
}

impl PrometheusSink {
    /// Create the sink and register every collector with a fresh registry.
    pub fn new() -> Result<Self, prometheus::Error> {
        let registry = Registry::new();

        let validator_stake = GaugeVec::new(
            Opts::new("hl_validator_stake", "Stake delegated to each validator"),
            VALIDATOR_LABELS,
        )?;
        let validator_jailed = GaugeVec::new(
            Opts::new(
                "hl_validator_jailed_status",
                "Whether the validator is jailed (1) or not (0)",
            ),
            VALIDATOR_LABELS,
        )?;
        let validator_active = GaugeVec::new(
            Opts::new(
                "hl_validator_active_status",
                "Whether the validator is active (1) or not (0)",
            ),
            VALIDATOR_LABELS,
        )?;
        let validator_recent_blocks = IntGaugeVec::new(
            Opts::new(
                "hl_validator_recent_blocks",
                "Blocks recently proposed by the validator",
            ),
            VALIDATOR_LABELS,
        )?;

        let total_stake = Gauge::new("hl_total_stake", "Total stake across all validators")?;
        let jailed_stake = Gauge::new("hl_jailed_stake", "Stake held by jailed validators")?;
        let not_jailed_stake = Gauge::new(
            "hl_not_jailed_stake",
            "Stake held by validators that are not jailed",
        )?;
        let active_stake = Gauge::new("hl_active_stake", "Stake held by active validators")?;
        let inactive_stake =
            Gauge::new("hl_inactive_stake", "Stake held by inactive validators")?;
        let validator_count =
            IntGauge::new("hl_validator_count", "Number of validators reported")?;

        let cycles = IntCounterVec::new(
            Opts::new(
                "hl_validator_monitor_cycles_total",
                "Validator monitor cycles by result",
            ),
            &["result"],
        )?;
        let cycle_duration = Histogram::with_opts(
            HistogramOpts::new(
                "hl_validator_monitor_cycle_duration_seconds",
                "Duration of validator monitor cycles",
            )
            .buckets(vec![0.05, 0.1, 0.25, 0.5, 1.0, 2.5, 5.0, 10.0]),
        )?;
        let last_success = IntGauge::new(
            "hl_validator_monitor_last_success_timestamp",
            "Unix time of the last successful validator monitor cycle",
        )?;

        registry.register(Box::new(validator_stake.clone()))?;
        registry.register(Box::new(validator_jailed.clone()))?;
        registry.register(Box::new(validator_active.clone()))?;
        registry.register(Box::new(validator_recent_blocks.clone()))?;
        registry.register(Box::new(total_stake.clone()))?;
        registry.register(Box::new(jailed_stake.clone()))?;
        registry.register(Box::new(not_jailed_stake.clone()))?;
        registry.register(Box::new(active_stake.clone()))?;
        registry.register(Box::new(inactive_stake.clone()))?;
        registry.register(Box::new(validator_count.clone()))?;
        registry.register(Box::new(cycles.clone()))?;
        registry.register(Box::new(cycle_duration.clone()))?;
        registry.register(Box::new(last_success.clone()))?;

        Ok(Self {
            registry,
            validator_stake,
            validator_jailed,
            validator_active,
            validator_recent_blocks,
            total_stake,
            jailed_stake,
            not_jailed_stake,
            active_stake,
            inactive_stake,
            validator_count,
            cycles,
            cycle_duration,
            last_success,
        })
    }

    /// Unix time of the last successful cycle, if any.
    pub fn last_success_timestamp(&self) -> Option<i64> {
        match self.last_success.get() {
            0 => None,
            ts => Some(ts),
        }
    }

    /// Render the registry in the Prometheus text exposition format.
    pub fn metrics_output(&self) -> String {
        let encoder = TextEncoder::new();
        let metric_families = self.registry.gather();
        let mut buffer = Vec::new();
        if let Err(e) = encoder.encode(&metric_families, &mut buffer) {
            tracing::error!(error = %e, "failed to encode metrics");
            return String::new();
        }
        String::from_utf8(buffer).unwrap_or_default()
    }
}

impl MetricsSink for PrometheusSink {
    fn set_validator_stake(&self, validator: &str, signer: &str, name: &str, stake: f64) {
        self.validator_stake
            .with_label_values(&[validator, signer, name])
            .set(stake);
    }

    fn set_validator_jailed_status(&self, validator: &str, signer: &str, name: &str, status: f64) {
        self.validator_jailed
            .with_label_values(&[validator, signer, name])
            .set(status);
    }

    fn set_validator_active_status(&self, validator: &str, signer: &str, name: &str, status: f64) {
        self.validator_active
            .with_label_values(&[validator, signer, name])
            .set(status);
    }

    fn set_validator_recent_blocks(&self, validator: &str, signer: &str, name: &str, blocks: i64) {
        self.validator_recent_blocks
            .with_label_values(&[validator, signer, name])
            .set(blocks);
    }

    fn set_total_stake(&self, value: f64) {
        self.total_stake.set(value);
    }

    fn set_jailed_stake(&self, value: f64) {
        self.jailed_stake.set(value);
    }

    fn set_not_jailed_stake(&self, value: f64) {
        self.not_jailed_stake.set(value);
    }

    fn set_active_stake(&self, value: f64) {
        self.active_stake.set(value);
    }

    fn set_inactive_stake(&self, value: f64) {
        self.inactive_stake.set(value);
    }

    fn set_validator_count(&self, count: i64) {
        self.validator_count.set(count);
    }

    fn record_cycle(&self, result: &str, elapsed_secs: f64) {
        self.cycles.with_label_values(&[result]).inc();
        self.cycle_duration.observe(elapsed_secs);
        if result == "success" {
            self.last_success.set(chrono::Utc::now().timestamp());
        }
    }
}
