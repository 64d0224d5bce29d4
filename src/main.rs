use all_the_highlights::config::CliArgs;
use all_the_highlights::pipeline;
use clap::Parser;
use tracing_subscriber::EnvFilter;

fn main() {
    let cli = CliArgs::parse();
    init_tracing(cli.json_logs);

    match pipeline::run(cli) {
        Ok(summary) => {
            tracing::info!(
                books = summary.rendered,
                fetched = summary.fetched,
                output = %summary.output_path.display(),
                "wrote highlights page"
            );
        }
        Err(e) => {
            tracing::error!(error = %e, "export failed");
            std::process::exit(1);
        }
    }
}

fn init_tracing(json: bool) {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    let builder = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr);

    if json {
        builder.json().init();
    } else {
        builder.init();
    }
}
