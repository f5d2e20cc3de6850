use {
    crate::{Executable, args, build_info::ENV_PREFIX},
    anyhow::Result,
    clap::{Args as ClapArgs, ValueEnum},
    const_format::concatcp,
    ipquorum::ResultGroup,
    tracing::{debug, warn},
};

/// The list of options for the "fetch" command.
#[derive(ClapArgs)]
pub struct Args {
    #[command(flatten)]
    race: args::OfRace,

    #[command(flatten)]
    catalog: args::OfCatalog,

    /// How the answers are printed
    #[arg(
        long,
        value_enum,
        default_value_t = Format::Text,
        env(concatcp!(ENV_PREFIX, "FORMAT")),
        hide_env=true,
    )]
    format: Format,

    /// Exit with an error if no endpoint answered
    #[arg(
        long,
        env(concatcp!(ENV_PREFIX, "STRICT")),
        hide_env=true,
    )]
    strict: bool,
}

#[derive(Clone, Copy, ValueEnum)]
enum Format {
    /// One line per distinct answer, the first one seen first
    Text,
    /// JSON array of {value, origins}
    Json,
}

impl Args {
    fn print(&self, groups: &[ResultGroup]) -> Result<()> {
        match self.format {
            Format::Text => groups.iter().for_each(|group| println!("{}", group)),
            Format::Json => println!("{}", serde_json::to_string_pretty(groups)?),
        }
        Ok(())
    }
}

impl Executable for Args {
    fn setup(self) -> Result<Self> {
        self.race.setup();
        Ok(self)
    }

    // The "main" function for the "fetch" command.
    // Races the endpoints once and prints whatever they answered.
    #[tokio::main]
    async fn run(self, _global: &args::Global) -> Result<()> {
        let manager = self.race.manager(self.catalog.build()?)?;
        let (target, timeout) = (self.race.confidence, *self.race.timeout);

        debug!(endpoints = manager.catalog().len(), %target, "racing the endpoints");

        let groups = match self.strict {
            true => manager.fetch_strict(target, timeout).await?,
            false => manager.fetch(target, timeout).await.unwrap_or_else(|err| {
                warn!(%err, "public address is unknown");
                Vec::new()
            }),
        };

        self.print(&groups)
    }
}
