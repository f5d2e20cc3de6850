use {
    crate::{Executable, args, build_info::ENV_PREFIX},
    anyhow::{Error, Result, bail},
    clap::Args as ClapArgs,
    const_format::concatcp,
    humantime::{Duration as DisplayedDuration, parse_duration},
    ipquorum::Manager,
    std::time::Duration as StdDuration,
    tokio::{
        signal,
        time::{Instant, sleep},
    },
    tracing::{debug, info, warn},
};

/// The list of options for the "watch" command.
#[derive(ClapArgs)]
pub struct Args {
    #[command(flatten)]
    race: args::OfRace,

    #[command(flatten)]
    catalog: args::OfCatalog,

    /// How often the race must happen (must be 30s or more)
    #[arg(
        short,
        long,
        value_parser = Self::parse_flag_interval,
        default_value_t = DisplayedDuration::from(Self::DEF_INTERVAL),
        env(concatcp!(ENV_PREFIX, "INTERVAL")),
        hide_env=true,
    )]
    interval: DisplayedDuration,
}

impl Args {
    const DEF_INTERVAL: StdDuration = StdDuration::from_secs(60);
    const MIN_INTERVAL: StdDuration = StdDuration::from_secs(30);

    // Parser for "--interval" flag.
    fn parse_flag_interval(s: &str) -> Result<DisplayedDuration> {
        match parse_duration(s).map_err(Error::msg)? {
            v if v >= Self::MIN_INTERVAL => Ok(v.into()),
            v => {
                let want_at_least: DisplayedDuration = Self::MIN_INTERVAL.into();
                let have: DisplayedDuration = v.into();
                bail!("must be {} or greater, get: {}", want_at_least, have)
            }
        }
    }

    // A single round: races the endpoints and reports whether the head answer,
    // the one first seen, differs from the `current` one.
    async fn job(&self, manager: &Manager, current: &mut Option<String>) {
        let groups = match manager.fetch(self.race.confidence, *self.race.timeout).await {
            Ok(groups) => groups,
            Err(err) => {
                warn!(%err, "the round has failed");
                return;
            }
        };

        let Some(head) = groups.first() else {
            warn!("no endpoint answered");
            return;
        };

        if groups.len() > 1 {
            warn!(
                answers = groups.len(),
                head = head.value().as_str(),
                "endpoints disagree on the public address"
            );
        }

        match current.as_deref() == Some(head.value().as_str()) {
            true => debug!(address = head.value().as_str(), "public address is unchanged"),
            false => {
                info!(
                    address = head.value().as_str(),
                    previous = current.as_deref().unwrap_or("none"),
                    confirmations = head.confirmations(),
                    "public address has changed"
                );
                *current = Some(head.value().clone());
            }
        }
    }
}

impl Executable for Args {
    // The preparation for [run], that warns about risky parameters.
    fn setup(self) -> Result<Self> {
        self.race.setup();

        assert!(*self.interval >= Self::MIN_INTERVAL);

        if *self.interval < Self::DEF_INTERVAL {
            warn!(
                given_interval = self.interval.to_string(),
                safe_min_interval = DisplayedDuration::from(Self::DEF_INTERVAL).to_string(),
                concat!(
                    "specified interval could be too short, ",
                    "many providers discourage you from using <= 1m one per IP per machine",
                ),
            )
        }

        Ok(self)
    }

    // The "main" function for the "watch" command.
    // Races the endpoints every interval until interrupted.
    #[tokio::main]
    async fn run(self, _global: &args::Global) -> Result<()> {
        info!("watching the public address");

        let manager = self.race.manager(self.catalog.build()?)?;
        let mut current = None;

        loop {
            let now = Instant::now();
            debug!("the time has come, racing the endpoints...");

            self.job(&manager, &mut current).await;

            let elapsed = now.elapsed();
            let sleep_for = self.interval.saturating_sub(elapsed);

            debug!(
                elapsed = DisplayedDuration::from(elapsed).to_string(),
                sleep_for = DisplayedDuration::from(sleep_for).to_string(),
                "the round has been completed",
            );

            tokio::select! {
                _ = sleep(sleep_for) => {}
                _ = signal::ctrl_c() => {
                    info!("interrupted, bye");
                    return Ok(());
                }
            }
        }
    }
}
