use clap::builder::styling::{AnsiColor, Color};
use clap::builder::styling::{Style, Styles};
use clap::{ColorChoice, Parser, Subcommand};

pub const BANNER: &str = "\x1b[0;96m█▀▀ █   █▀█ █ █ █   █▀▀ █▀▀ █   █       █▀█ █▀▀\x1b[0m\n\
                      \x1b[0;92m█▀  █▄▄ █▄█ ▀▄▀▄▀   █▄▄ ██▄ █▄▄ █▄▄  ▀▀  ▀▀█ █▄▄\x1b[0m\n\
                      \x1b[0;93mSpatial read QC per lane, tile and micro-tile\x1b[0m\n";

#[derive(Parser, Debug, Clone)]
#[command(
    name = "flowcell-qc",
    version = env!("CARGO_PKG_VERSION"),
    about = BANNER,
    color = ColorChoice::Always,
    styles = get_styles(),
)]
pub struct Args {
    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand, Debug, Clone)]
pub enum Commands {
    /// Bucket the reads of a FASTQ file into micro-tiles and write a dump
    #[command(alias = "p")]
    Populate {
        /// Input FASTQ file, plain or .gz
        #[arg(short, long)]
        input: String,

        /// Output dump path (.gz for gzip)
        #[arg(short, long)]
        output: String,

        /// JSON config file
        #[arg(short, long)]
        config: Option<String>,

        /// Overwrite an existing output file
        #[arg(long, default_value_t = false)]
        overwrite: bool,
    },

    /// Merge dumps built on the same grid
    #[command(alias = "m")]
    Merge {
        /// Input dumps
        #[arg(short, long, num_args = 1.., required = true)]
        input: Vec<String>,

        /// Output dump path
        #[arg(short, long)]
        output: String,

        /// JSON config file
        #[arg(short, long)]
        config: Option<String>,

        /// Overwrite an existing output file
        #[arg(long, default_value_t = false)]
        overwrite: bool,
    },

    /// Coarsen the grid of a dump until micro-tiles reach a target read count
    #[command(alias = "w")]
    Widen {
        /// Input dump
        #[arg(short, long)]
        input: String,

        /// Output dump path
        #[arg(short, long)]
        output: String,

        /// Target average reads per micro-tile, overrides the config value
        #[arg(short, long)]
        target: Option<u64>,

        /// JSON config file
        #[arg(short, long)]
        config: Option<String>,

        /// Overwrite an existing output file
        #[arg(long, default_value_t = false)]
        overwrite: bool,
    },

    /// Print the flow-cell summary of a dump as JSON
    #[command(alias = "s")]
    Stats {
        /// Input dump
        #[arg(short, long)]
        input: String,

        /// Write the report here instead of stdout
        #[arg(short, long)]
        output: Option<String>,

        /// JSON config file
        #[arg(short, long)]
        config: Option<String>,
    },

    /// Flag outlier micro-tiles for discard
    Mark {
        /// Input dump
        #[arg(short, long)]
        input: String,

        /// Output dump path
        #[arg(short, long)]
        output: String,

        /// JSON config file with the discard policy
        #[arg(short, long)]
        config: Option<String>,

        /// Overwrite an existing output file
        #[arg(long, default_value_t = false)]
        overwrite: bool,
    },

    /// Draw one average-quality heatmap per lane
    Plot {
        /// Input dump
        #[arg(short, long)]
        input: String,

        /// Output directory for the PNG files
        #[arg(short, long)]
        output: String,

        /// JSON config file
        #[arg(short, long)]
        config: Option<String>,
    },
}

pub fn get_styles() -> Styles {
    Styles::styled()
        .usage(
            Style::new()
                .bold()
                .underline()
                .fg_color(Some(Color::Ansi(AnsiColor::Yellow))),
        )
        .header(
            Style::new()
                .bold()
                .underline()
                .fg_color(Some(Color::Ansi(AnsiColor::Yellow))),
        )
        .literal(Style::new().fg_color(Some(Color::Ansi(AnsiColor::Green))))
        .invalid(
            Style::new()
                .bold()
                .fg_color(Some(Color::Ansi(AnsiColor::Red))),
        )
        .error(
            Style::new()
                .bold()
                .fg_color(Some(Color::Ansi(AnsiColor::Red))),
        )
        .valid(
            Style::new()
                .bold()
                .underline()
                .fg_color(Some(Color::Ansi(AnsiColor::Green))),
        )
        .placeholder(Style::new().fg_color(Some(Color::Ansi(AnsiColor::White))))
}
