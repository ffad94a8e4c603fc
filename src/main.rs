use std::process;

use clap::Parser;
use flowcell_qc::cli::{Args, Commands};
use flowcell_qc::pipelines::{mark, merge, plot, populate, stats, widen};

fn main() {
    let args = Args::parse();

    let result = match args.command {
        Commands::Populate {
            input,
            output,
            config,
            overwrite,
        } => populate::populate(&input, &output, config.as_deref(), overwrite),
        Commands::Merge {
            input,
            output,
            config,
            overwrite,
        } => merge::merge(&input, &output, config.as_deref(), overwrite),
        Commands::Widen {
            input,
            output,
            target,
            config,
            overwrite,
        } => widen::widen(&input, &output, target, config.as_deref(), overwrite),
        Commands::Stats {
            input,
            output,
            config,
        } => stats::stats(&input, output.as_deref(), config.as_deref()),
        Commands::Mark {
            input,
            output,
            config,
            overwrite,
        } => mark::mark(&input, &output, config.as_deref(), overwrite),
        Commands::Plot {
            input,
            output,
            config,
        } => plot::plot(&input, &output, config.as_deref()),
    };

    if let Err(e) = result {
        eprintln!("\x1b[1;91mError:\x1b[0m {}", e);
        process::exit(1);
    }
}
