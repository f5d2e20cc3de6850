use {
    anyhow::Result,
    vergen::{BuildBuilder, Emitter},
    vergen_gitcl::GitclBuilder,
};

fn main() -> Result<()> {
    // https://crates.io/crates/vergen
    // https://crates.io/crates/vergen-gitcl
    //
    // Outside of a git checkout vergen emits placeholder values,
    // build_info falls back to "unknown" for anything missing.

    let build = BuildBuilder::default().build_date(true).build()?;

    let gitcl = GitclBuilder::default()
        .all()
        .describe(true, true, None)
        .build()?;

    Emitter::default()
        .add_instructions(&gitcl)?
        .add_instructions(&build)?
        .emit()?;

    Ok(())
}
