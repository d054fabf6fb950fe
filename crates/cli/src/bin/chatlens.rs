//! chatlens CLI binary entrypoint.

fn main() -> anyhow::Result<()> {
    chatlens_cli::app::run()?;
    Ok(())
}
