use {
    crate::{Executable, args},
    anyhow::Result,
    clap::Args as ClapArgs,
};

/// The list of options for the "list" command.
#[derive(ClapArgs)]
pub struct Args {
    #[command(flatten)]
    catalog: args::OfCatalog,
}

impl Executable for Args {
    fn setup(self) -> Result<Self> {
        Ok(self)
    }

    fn run(self, _global: &args::Global) -> Result<()> {
        self.catalog
            .build()?
            .iter()
            .for_each(|entry| println!("{}", entry));

        Ok(())
    }
}
