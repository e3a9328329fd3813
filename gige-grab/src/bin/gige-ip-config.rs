use anyhow::{Context, Result};
use clap::Parser;

use gige_grab::{Backend, ip_config};

/// Force automatic IP addresses on all GigE cameras and store them in the
/// cameras' persistent registers.
#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
struct Cli {
    /// Camera backend
    #[arg(long, value_enum, default_value_t)]
    backend: Backend,

    /// List cameras and read their registers without changing anything
    #[arg(long)]
    dry_run: bool,
}

fn main() -> Result<()> {
    let cli = Cli::parse();
    gige_grab::logging::init_logging(None)?;

    match cli.backend {
        Backend::Flycap2 => {
            let mut module = ci2_flycap2::new_module()?;
            ip_config::run(&mut module, cli.dry_run)
        }
        Backend::Sim => {
            let mut module = ci2_sim::new_module()?;
            ip_config::run(&mut module, cli.dry_run)
        }
    }
    .with_context(|| format!("configuring camera IP addresses ({})", cli.backend))?;
    Ok(())
}
