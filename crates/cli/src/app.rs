use {
    crate::{
        args,
        build_info::{self, ENV_PREFIX},
        cmd_fetch, cmd_list, cmd_watch,
    },
    anyhow::{Context, Error, Result},
    clap::{Parser as ClapParser, Subcommand as ClapSubcommand},
    const_format::concatcp,
    std::process::exit,
    tracing::error,
    tracing_subscriber::{EnvFilter, filter::LevelFilter, fmt::time::OffsetTime},
};

// The application itself.
#[derive(ClapParser)]
#[command(version = build_info::version(), about, long_about = None)]
struct App {
    #[command(subcommand)]
    command: Command,

    #[command(flatten)]
    global: args::Global,
}

#[derive(ClapSubcommand)]
pub enum Command {
    /// Race the lookup endpoints once and print the answers
    Fetch(cmd_fetch::Args),
    /// Keep racing the lookup endpoints and report address changes
    Watch(cmd_watch::Args),
    /// Print the endpoints a race would query
    List(cmd_list::Args),
}

// The interface must been implemented for the type to be treated as CLI command.
//
// For now it implements by the specific CLI command's options type,
// thus representing the CLI command abstraction themself.
pub trait Executable: Sized {
    fn setup(self) -> Result<Self>;
    fn run(self, global: &args::Global) -> Result<()>;
}

// ========================================================================== //

impl App {
    const ENV_LOG: &'static str = concatcp!(ENV_PREFIX, "LOG");

    fn setup_logging(&self) -> Result<()> {
        const LTF_KITCHEN: &str =
            "[hour padding:none repr:12]:[minute padding:zero] [period case:upper]";

        let parsed_time_format = time::format_description::parse(LTF_KITCHEN)
            .with_context(|| "BUG: Cannot parse static time format")?;

        // The local offset can't be obtained in every environment,
        // UTC timestamps are still better than none.
        let traces_timer = OffsetTime::new(
            time::UtcOffset::current_local_offset().unwrap_or(time::UtcOffset::UTC),
            parsed_time_format,
        );

        let max_log_level = match self.global.verbose {
            0 => LevelFilter::INFO,
            1 => LevelFilter::DEBUG,
            _ => LevelFilter::TRACE,
        };

        let filter = EnvFilter::builder()
            .with_default_directive(max_log_level.into())
            .with_env_var(Self::ENV_LOG)
            .from_env_lossy();

        tracing_subscriber::fmt()
            .compact()
            .with_timer(traces_timer)
            .with_ansi(true)
            .with_env_filter(filter)
            .with_writer(std::io::stderr)
            .try_init()
            .map_err(Error::msg)
    }
}

// ========================================================================== //

// The entry point that initializes logging, parses CLI and ENV parameters
// and executes the requested command along with the global app parameters.
pub fn exec() {
    let app = App::parse();

    if let Err(err) = app.setup_logging() {
        eprintln!("cannot initialize logging: {:#}", err);
        exit(1);
    }

    if let Err(err) = match app.command {
        Command::Fetch(cmd_args) => cmd_args.setup().and_then(|cmd| cmd.run(&app.global)),
        Command::Watch(cmd_args) => cmd_args.setup().and_then(|cmd| cmd.run(&app.global)),
        Command::List(cmd_args) => cmd_args.setup().and_then(|cmd| cmd.run(&app.global)),
    } {
        let err = format!("{}, because {}", err, err.root_cause());
        error!(err = err, "critical error");
        exit(1);
    }
}
