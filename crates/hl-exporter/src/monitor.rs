//! The validator monitor: periodic poll → decode → aggregate → publish.
//!
//! [`ValidatorMonitor::spawn`] runs one cycle per tick on a background task
//! until the cancellation token fires. Cycles never overlap: the loop only
//! goes back to waiting once the current cycle has returned, and ticks missed
//! in the meantime are skipped rather than queued.

use std::sync::Arc;
use std::time::Duration;

use tokio::sync::mpsc::{self, error::TrySendError};
use tokio::task::JoinHandle;
use tokio::time::{self, Instant, MissedTickBehavior};
use tokio_util::sync::CancellationToken;

use crate::client::ValidatorApiClient;
use crate::config::ExporterConfig;
use crate::error::MonitorError;
use crate::metrics::MetricsSink;
use crate::validator::{AggregateStats, ValidatorSummary};

/// Runs [`update_validator_metrics`] on a fixed cadence.
pub struct ValidatorMonitor {
    client: ValidatorApiClient,
    sink: Arc<dyn MetricsSink>,
    interval: Duration,
}

impl ValidatorMonitor {
    pub fn new(client: ValidatorApiClient, sink: Arc<dyn MetricsSink>, interval: Duration) -> Self {
        Self {
            client,
            sink,
            interval,
        }
    }

    pub fn from_config(config: &ExporterConfig, sink: Arc<dyn MetricsSink>) -> Self {
        Self::new(
            ValidatorApiClient::from_config(config),
            sink,
            config.poll_interval,
        )
    }

    /// Spawn the monitor loop as a background tokio task.
    ///
    /// Failed cycles are logged and forwarded to `errors` without blocking;
    /// an error that does not fit in the channel is dropped with a warning.
    pub fn spawn(
        self,
        cancel: CancellationToken,
        errors: mpsc::Sender<MonitorError>,
    ) -> JoinHandle<()> {
        tokio::spawn(async move {
            self.run(cancel, errors).await;
        })
    }

    /// Run until `cancel` fires. The first cycle starts one full interval
    /// after the call.
    pub async fn run(&self, cancel: CancellationToken, errors: mpsc::Sender<MonitorError>) {
        let mut ticker = time::interval_at(Instant::now() + self.interval, self.interval);
        ticker.set_missed_tick_behavior(MissedTickBehavior::Skip);

        tracing::info!(
            interval_secs = self.interval.as_secs(),
            url = %self.client.api_url(),
            "Validator monitor started"
        );

        loop {
            tokio::select! {
                biased;
                _ = cancel.cancelled() => break,
                _ = ticker.tick() => {
                    if let Err(e) = self.run_cycle(&cancel).await {
                        if e.is_cancelled() {
                            tracing::info!(kind = e.kind(), "Validator monitor cycle cancelled");
                        } else {
                            tracing::error!(kind = e.kind(), error = %e, "Validator monitor error");
                        }
                        forward_error(&errors, e);
                    }
                }
            }
        }

        tracing::info!("Validator monitor stopped");
    }

    /// Execute one cycle and record its outcome on the sink.
    pub async fn run_cycle(
        &self,
        cancel: &CancellationToken,
    ) -> Result<AggregateStats, MonitorError> {
        let started = std::time::Instant::now();
        let result = update_validator_metrics(&self.client, self.sink.as_ref(), cancel).await;
        let outcome = match &result {
            Ok(_) => "success",
            Err(e) => e.kind(),
        };
        self.sink
            .record_cycle(outcome, started.elapsed().as_secs_f64());
        result
    }
}

fn forward_error(errors: &mpsc::Sender<MonitorError>, error: MonitorError) {
    match errors.try_send(error) {
        Ok(()) => {}
        Err(TrySendError::Full(e)) => {
            tracing::warn!(kind = e.kind(), "Error channel full — dropping monitor error");
        }
        Err(TrySendError::Closed(e)) => {
            tracing::warn!(kind = e.kind(), "Error channel closed — dropping monitor error");
        }
    }
}

/// One full cycle: fetch summaries, publish each validator in array order,
/// then publish the aggregates.
///
/// Nothing is published unless the fetch and decode both succeed.
pub async fn update_validator_metrics(
    client: &ValidatorApiClient,
    sink: &dyn MetricsSink,
    cancel: &CancellationToken,
) -> Result<AggregateStats, MonitorError> {
    let summaries = client.fetch_summaries(cancel).await?;

    let stats = AggregateStats::from_summaries(&summaries);
    for summary in &summaries {
        publish_validator(sink, summary);
    }
    publish_aggregates(sink, &stats);

    tracing::info!(
        validators = stats.validator_count,
        total_stake = stats.total_stake,
        jailed_stake = stats.jailed_stake,
        not_jailed_stake = stats.not_jailed_stake,
        active_stake = stats.active_stake,
        inactive_stake = stats.inactive_stake,
        "Updated validator metrics"
    );

    Ok(stats)
}

fn publish_validator(sink: &dyn MetricsSink, summary: &ValidatorSummary) {
    let (validator, signer, name) = (
        summary.validator.as_str(),
        summary.signer.as_str(),
        summary.name.as_str(),
    );
    sink.set_validator_stake(validator, signer, name, summary.stake);
    sink.set_validator_jailed_status(validator, signer, name, summary.jailed_status());
    sink.set_validator_active_status(validator, signer, name, summary.active_status());
    sink.set_validator_recent_blocks(validator, signer, name, summary.n_recent_blocks);
}

fn publish_aggregates(sink: &dyn MetricsSink, stats: &AggregateStats) {
    sink.set_total_stake(stats.total_stake);
    sink.set_jailed_stake(stats.jailed_stake);
    sink.set_not_jailed_stake(stats.not_jailed_stake);
    sink.set_active_stake(stats.active_stake);
    sink.set_inactive_stake(stats.inactive_stake);
    sink.set_validator_count(i64::try_from(stats.validator_count).unwrap_or(i64::MAX));
}
