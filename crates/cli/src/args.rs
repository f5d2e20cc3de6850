use {
    crate::build_info::ENV_PREFIX,
    anyhow::{Error, Result, bail},
    clap::{
        Args as ClapArgs,
        builder::{PossibleValuesParser, TypedValueParser},
    },
    const_format::concatcp,
    humantime::{Duration as DisplayedDuration, parse_duration},
    ipquorum::{Catalog, CatalogEntry, ConfidenceTarget, HttpProbe, Manager, Provider},
    std::time::Duration as StdDuration,
    strum::VariantNames,
    tracing::warn,
};

// Creds: https://github.com/clap-rs/clap/discussions/4264
macro_rules! clap_enum_variants {
    ($e: ty) => {{
        use TypedValueParser;
        use VariantNames;
        let parser = PossibleValuesParser::new(<$e as VariantNames>::VARIANTS);
        parser.try_map(|s| s.parse::<$e>())
    }};
}

// The global application options.
#[derive(ClapArgs)]
pub struct Global {
    /// Enable verbose output (up to 2 levels)
    #[arg(global=true, short, long, action=clap::ArgAction::Count)]
    pub verbose: u8,
}

/// How a single race is run.
#[derive(Clone, ClapArgs)]
pub struct OfRace {
    /// How many endpoints must answer before the race stops ("all" waits for every one)
    #[arg(
        short,
        long,
        value_name("N|all"),
        default_value = "3",
        env(concatcp!(ENV_PREFIX, "CONFIDENCE")),
        hide_env=true,
    )]
    pub confidence: ConfidenceTarget,

    /// The upper bound for the whole race
    #[arg(
        short,
        long,
        value_parser = parse_flag_timeout,
        default_value_t = DisplayedDuration::from(OfRace::DEF_TIMEOUT),
        env(concatcp!(ENV_PREFIX, "TIMEOUT")),
        hide_env=true,
    )]
    pub timeout: DisplayedDuration,

    /// The upper bound for a single endpoint request
    #[arg(
        long,
        value_parser = parse_flag_timeout,
        default_value_t = DisplayedDuration::from(OfRace::DEF_PROBE_TIMEOUT),
        env(concatcp!(ENV_PREFIX, "PROBE_TIMEOUT")),
        hide_env=true,
    )]
    pub probe_timeout: DisplayedDuration,
}

impl OfRace {
    const DEF_TIMEOUT: StdDuration = StdDuration::from_secs(10);
    const DEF_PROBE_TIMEOUT: StdDuration = StdDuration::from_secs(5);

    pub fn setup(&self) {
        if *self.probe_timeout > *self.timeout {
            warn!(
                timeout = self.timeout.to_string(),
                probe_timeout = self.probe_timeout.to_string(),
                "probe timeout exceeds the race timeout, slow endpoints will be cut off by the latter",
            )
        }
    }

    // Builds the [Manager] that races the given catalog over HTTP.
    pub fn manager(&self, catalog: Catalog) -> Result<Manager> {
        Ok(Manager::new(catalog, HttpProbe::new()?)?.with_probe_timeout(*self.probe_timeout))
    }
}

/// Which endpoints are queried.
#[derive(Clone, ClapArgs)]
pub struct OfCatalog {
    /// The list of built-in providers that should be disabled (assuming enabled all)
    #[arg(
        long,
        value_name("PROVIDER"),
        value_parser = clap_enum_variants!(Provider),
        value_delimiter = ',',
        env(concatcp!(ENV_PREFIX, "DISABLE")),
        hide_env=true,
    )]
    pub disable: Vec<Provider>,

    /// Extra endpoint to query: "URL" for a plain text body, "URL#field" for a JSON one
    #[arg(
        long,
        value_name("URL[#FIELD]"),
        value_delimiter = ',',
        env(concatcp!(ENV_PREFIX, "ENDPOINT")),
        hide_env=true,
    )]
    pub endpoint: Vec<CatalogEntry>,

    /// Query only the endpoints given by "--endpoint"
    #[arg(long, requires = "endpoint")]
    pub only_custom: bool,
}

impl OfCatalog {
    // Computes the catalog based on all providers, "disable" and extra endpoints.
    pub fn build(&self) -> Result<Catalog> {
        let mut catalog = match self.only_custom {
            true => Catalog::default(),
            false => Catalog::builtin_except(&self.disable),
        };
        catalog.extend(self.endpoint.iter().cloned());

        if catalog.is_empty() {
            bail!("every endpoint is disabled, nothing to query")
        }

        Ok(catalog)
    }
}

// Parser for the duration flags, that must be non-zero.
pub fn parse_flag_timeout(s: &str) -> Result<DisplayedDuration> {
    match parse_duration(s).map_err(Error::msg)? {
        v if v.is_zero() => bail!("must be greater than zero"),
        v => Ok(v.into()),
    }
}
