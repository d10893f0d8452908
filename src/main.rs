use clap::Parser;
use miette::Result;

use darkroom::cli::{init_tracing, Cli, Commands};
use darkroom::output::Printer;

fn main() -> Result<()> {
    let cli = Cli::parse();
    let config = cli.load_config()?;
    init_tracing(config.verbose);

    let vars = cli.vars(&config);
    let printer = Printer::new();

    match cli.command {
        Commands::Run(args) => darkroom::cli::run::run(args, &config, &vars, &printer)?,
        Commands::Convert(args) => darkroom::cli::convert::run(args, &config, &vars, &printer)?,
        Commands::Fmt(args) => darkroom::cli::fmt::run(args, &config, &vars, &printer)?,
        Commands::List(args) => darkroom::cli::list::run(args, &config, &printer)?,
        Commands::Completions(args) => darkroom::cli::completions::run(args)?,
    }

    Ok(())
}
