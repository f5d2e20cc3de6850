use std::{sync::Arc, time::Duration};

use {
    anyhow::{Context, Result, bail},
    tracing::{debug, instrument},
};

use crate::{
    catalog::{Catalog, EndpointRef},
    error::{FetchError, FetchResult},
    grouping::{self, ResultGroup},
    probe::{HttpProbe, Probe},
    race::{Race, Stop, StopPolicy},
    target::ConfidenceTarget,
};

/// Manager races every endpoint of its [Catalog] against each other
/// and reports the answers grouped by value.
pub struct Manager<P = HttpProbe> {
    catalog: Catalog,
    probe: Arc<P>,
    probe_timeout: Duration,
}

impl Manager<HttpProbe> {
    /// Manager over every built-in provider, querying them over HTTP.
    pub fn builtin() -> Result<Self> {
        Self::new(Catalog::builtin(), HttpProbe::new()?)
    }
}

impl<P: Probe> Manager<P> {
    pub const DEFAULT_PROBE_TIMEOUT: Duration = Duration::from_secs(5);

    pub fn new(catalog: Catalog, probe: P) -> Result<Self> {
        if catalog.is_empty() {
            bail!("non-empty catalog of endpoints is required")
        }

        Ok(Self {
            catalog,
            probe: Arc::new(probe),
            probe_timeout: Self::DEFAULT_PROBE_TIMEOUT,
        })
    }

    /// Overrides the timeout each single probe is given.
    pub fn with_probe_timeout(mut self, probe_timeout: Duration) -> Self {
        self.probe_timeout = probe_timeout;
        self
    }

    pub fn catalog(&self) -> &Catalog {
        &self.catalog
    }

    pub fn probe_timeout(&self) -> Duration {
        self.probe_timeout
    }

    // Queries every endpoint concurrently and returns as soon as `target`
    // successes arrived, the target can no longer be reached,
    // every probe completed or `timeout` elapsed.
    //
    // Successes collected so far always win over both failure kinds.
    // Probes still running on return are aborted, not awaited.
    #[instrument(name = "fetch", skip(self), fields(endpoints = self.catalog.len()))]
    pub async fn fetch(&self, target: ConfidenceTarget, timeout: Duration) -> FetchResult {
        let policy = StopPolicy::new(target, self.catalog.len());
        let mut race = Race::dispatch(&self.catalog, &self.probe, self.probe_timeout);

        let (successes, stop) = race.collect(policy, timeout).await;
        race.cancel();

        debug!(
            %stop,
            collected = successes.len(),
            stragglers = race.pending(),
            "race is over"
        );

        settle(target, successes, stop)
    }

    /// Same as [Self::fetch], but a race without a single success
    /// is an error carrying the [FetchError].
    pub async fn fetch_strict(
        &self,
        target: ConfidenceTarget,
        timeout: Duration,
    ) -> Result<Vec<ResultGroup>> {
        self.fetch(target, timeout)
            .await
            .with_context(|| format!("cannot determine public address, confidence: {}", target))
    }
}

fn settle(target: ConfidenceTarget, successes: Vec<(EndpointRef, String)>, stop: Stop) -> FetchResult {
    if !successes.is_empty() {
        return Ok(grouping::group(successes));
    }

    match (stop, target) {
        (Stop::Elapsed, _) => Err(FetchError::Timeout),
        (_, ConfidenceTarget::All) => Ok(Vec::new()),
        (_, ConfidenceTarget::Exactly(_)) => Err(FetchError::NoSuccessfulResponse),
    }
}
