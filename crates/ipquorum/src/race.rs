use {
    crate::{
        catalog::{Catalog, EndpointRef},
        probe::{Probe, ProbeError, ProbeOutcome},
        target::ConfidenceTarget,
    },
    derive_more::{Debug, Display},
    std::{collections::HashMap, sync::Arc, time::Duration},
    strum_macros::EnumIs,
    tokio::{
        task::{Id, JoinError, JoinSet},
        time::sleep,
    },
    tracing::{debug, warn},
};

/// Why a race stopped collecting outcomes.
#[derive(Clone, Copy, PartialEq, Eq, Debug, Display, EnumIs)]
pub(crate) enum Stop {
    /// The wanted number of successes was collected.
    #[display("target reached")]
    Reached,
    /// Even if every pending probe succeeds, the target can't be reached.
    #[display("target unreachable")]
    Unreachable,
    /// Every probe has completed.
    #[display("all probes completed")]
    Drained,
    /// The call-level deadline fired.
    #[display("deadline elapsed")]
    Elapsed,
}

#[derive(Clone, Copy, PartialEq, Eq, Debug)]
pub(crate) struct StopPolicy {
    wanted: usize,
    early_exit: bool,
}

impl StopPolicy {
    pub(crate) fn new(target: ConfidenceTarget, catalog_size: usize) -> Self {
        match target {
            ConfidenceTarget::Exactly(k) if k.get() < catalog_size => Self {
                wanted: k.get(),
                early_exit: true,
            },
            // A target the catalog can't reach degrades to waiting for all.
            _ => Self {
                wanted: target.effective(catalog_size),
                early_exit: false,
            },
        }
    }

    pub(crate) fn check(&self, collected: usize, pending: usize) -> Option<Stop> {
        if collected >= self.wanted {
            return Some(Stop::Reached);
        }
        if pending == 0 {
            return Some(Stop::Drained);
        }
        if self.early_exit && collected + pending < self.wanted {
            return Some(Stop::Unreachable);
        }
        None
    }
}

/// One in-flight fan-out: a task per catalog entry feeding a single consumer.
pub(crate) struct Race {
    units: JoinSet<ProbeOutcome>,
    origins: HashMap<Id, EndpointRef>,
}

impl Race {
    pub(crate) fn dispatch<P: Probe>(catalog: &Catalog, probe: &Arc<P>, timeout: Duration) -> Self {
        let mut units = JoinSet::new();
        let mut origins = HashMap::with_capacity(catalog.len());

        for entry in catalog {
            let probe = Arc::clone(probe);
            let entry = entry.clone();
            let endpoint = entry.endpoint().clone();

            let handle = units.spawn(async move { probe.probe(entry, timeout).await });
            origins.insert(handle.id(), endpoint);
        }

        Self { units, origins }
    }

    /// Probes dispatched but not yet consumed.
    pub(crate) fn pending(&self) -> usize {
        self.units.len()
    }

    /// Waits for the next probe to complete, in arrival order.
    pub(crate) async fn next(&mut self) -> Option<ProbeOutcome> {
        let joined = self.units.join_next_with_id().await?;
        Some(self.settle(joined))
    }

    // Turns whatever the task produced into an outcome,
    // including tasks that panicked or were aborted.
    fn settle(&mut self, joined: Result<(Id, ProbeOutcome), JoinError>) -> ProbeOutcome {
        let err = match joined {
            Ok((id, outcome)) => {
                self.origins.remove(&id);
                return outcome;
            }
            Err(err) => err,
        };

        let endpoint = self
            .origins
            .remove(&err.id())
            .unwrap_or_else(|| EndpointRef::new(format!("task {}", err.id())));

        let cause = match err.is_panic() {
            true => ProbeError::Panicked,
            false => ProbeError::Cancelled,
        };

        if cause.is_panicked() {
            warn!(%endpoint, "probe panicked");
        }

        ProbeOutcome::Failure { endpoint, cause }
    }

    /// Consumes outcomes until `policy` says stop or `timeout` elapses.
    /// Returns the successes in the order they were collected.
    pub(crate) async fn collect(
        &mut self,
        policy: StopPolicy,
        timeout: Duration,
    ) -> (Vec<(EndpointRef, String)>, Stop) {
        let deadline = sleep(timeout);
        tokio::pin!(deadline);

        let mut successes = Vec::new();

        loop {
            if let Some(stop) = policy.check(successes.len(), self.pending()) {
                return (successes, stop);
            }

            tokio::select! {
                biased;

                Some(outcome) = self.next() => match outcome {
                    ProbeOutcome::Success { endpoint, value } => {
                        debug!(%endpoint, %value, "probe succeeded");
                        successes.push((endpoint, value));
                    }
                    ProbeOutcome::Failure { endpoint, cause } => {
                        debug!(%endpoint, %cause, "probe failed");
                    }
                },

                _ = &mut deadline => return (successes, Stop::Elapsed),
            }
        }
    }

    /// Signals every unfinished probe to abort without waiting for it.
    /// Safe to call any number of times.
    pub(crate) fn cancel(&mut self) {
        self.units.abort_all();
    }
}

#[cfg(test)]
mod tests {
    use {
        super::*,
        crate::catalog::CatalogEntry,
        std::sync::atomic::{AtomicUsize, Ordering},
    };

    struct Slow {
        finished: Arc<AtomicUsize>,
    }

    impl Probe for Slow {
        async fn probe(&self, entry: CatalogEntry, _: Duration) -> ProbeOutcome {
            let delay = match entry.endpoint().as_str() {
                "fast" => 1,
                _ => 10_000,
            };
            sleep(Duration::from_millis(delay)).await;
            self.finished.fetch_add(1, Ordering::SeqCst);

            ProbeOutcome::Success {
                endpoint: entry.endpoint().clone(),
                value: "1.2.3.4".into(),
            }
        }
    }

    struct Exploding;

    impl Probe for Exploding {
        async fn probe(&self, _: CatalogEntry, _: Duration) -> ProbeOutcome {
            panic!("probe blew up")
        }
    }

    fn policy(target: usize, size: usize) -> StopPolicy {
        StopPolicy::new(ConfidenceTarget::exactly(target).unwrap(), size)
    }

    #[test]
    fn reached_before_drained() {
        assert_eq!(policy(2, 5).check(2, 3), Some(Stop::Reached));
        assert_eq!(policy(2, 5).check(1, 3), None);
    }

    #[test]
    fn unreachable_is_separate_from_reached() {
        // 1 collected, 1 pending, 3 wanted.
        assert_eq!(policy(3, 5).check(1, 1), Some(Stop::Unreachable));
        assert_eq!(policy(3, 5).check(1, 2), None);
        assert_eq!(policy(3, 5).check(0, 0), Some(Stop::Drained));
    }

    #[test]
    fn oversized_target_waits_for_all() {
        let p = policy(10, 4);
        assert_eq!(p.check(1, 1), None);
        assert_eq!(p.check(1, 0), Some(Stop::Drained));
        assert_eq!(p.check(4, 0), Some(Stop::Reached));

        let all = StopPolicy::new(ConfidenceTarget::All, 4);
        assert_eq!(all, p);
    }

    #[tokio::test(start_paused = true)]
    async fn cancel_is_idempotent() {
        let finished = Arc::new(AtomicUsize::new(0));
        let probe = Arc::new(Slow {
            finished: finished.clone(),
        });
        let catalog: Catalog = ["fast", "slow-1", "slow-2"]
            .into_iter()
            .map(CatalogEntry::raw)
            .collect();

        let mut race = Race::dispatch(&catalog, &probe, Duration::from_secs(1));
        assert_eq!(race.pending(), 3);

        let first = race.next().await.unwrap();
        assert_eq!(first.endpoint().as_str(), "fast");

        race.cancel();
        race.cancel();

        // Aborted stragglers are joined as cancelled, never as outcomes.
        while let Some(outcome) = race.next().await {
            assert!(outcome.is_failure());
        }
        race.cancel();

        sleep(Duration::from_secs(60)).await;
        assert_eq!(finished.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn panic_becomes_failure() {
        let catalog: Catalog = [CatalogEntry::raw("boom")].into_iter().collect();
        let mut race = Race::dispatch(&catalog, &Arc::new(Exploding), Duration::from_secs(1));

        let outcome = race.next().await.unwrap();
        assert_eq!(
            outcome,
            ProbeOutcome::Failure {
                endpoint: EndpointRef::new("boom"),
                cause: ProbeError::Panicked,
            }
        );
        assert!(race.next().await.is_none());
    }
}
