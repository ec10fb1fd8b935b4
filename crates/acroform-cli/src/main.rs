mod cli;
mod fields_cmd;
mod fill_cmd;
mod page_range;
mod shared;
mod text_cmd;

use clap::Parser;
use cli::Cli;
use tracing_subscriber::EnvFilter;

/// Log to stderr so stdout stays machine-readable.
///
/// `-v` flags take precedence over `RUST_LOG`; without either only
/// warnings are shown.
fn init_logging(verbose: u8) {
    let filter = match verbose {
        0 => EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn")),
        1 => EnvFilter::new("debug"),
        _ => EnvFilter::new("trace"),
    };
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(false)
        .init();
}

fn main() {
    let cli = Cli::parse();
    init_logging(cli.verbose);

    let result = match cli.command {
        cli::Commands::Fields {
            ref file,
            ref pages,
            ref format,
            label_search_left,
        } => fields_cmd::run(file, pages.as_deref(), format, label_search_left),
        cli::Commands::Fill {
            ref file,
            ref output,
            ref set,
            ref values,
            flatten,
        } => fill_cmd::run(file, output, set, values.as_deref(), flatten),
        cli::Commands::Text {
            ref file,
            ref pages,
            ref format,
        } => text_cmd::run(file, pages.as_deref(), format),
    };

    if let Err(code) = result {
        std::process::exit(code);
    }
}
