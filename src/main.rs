use std::env;

use reftracker::config;
use reftracker::runtime::modes::{self, Mode};
use reftracker::system::logging::init_logging;

#[actix_web::main]
async fn main() -> std::io::Result<()> {
    let args: Vec<String> = env::args().collect();
    dotenvy::dotenv().ok();

    // Config before anything else; both modes read it.
    config::init_config();

    match modes::detect_mode(&args) {
        Mode::Cli => {
            // CLI output goes straight to stdout, tracing stays quiet.
            if let Err(e) = modes::run_cli().await {
                eprintln!("{}", e.format_colored());
                std::process::exit(1);
            }
        }
        Mode::Server => {
            let app_config = config::get_config();
            // Guard must live until exit so buffered log lines get flushed.
            let _guard = init_logging(&app_config.logging);

            if let Err(e) = modes::run_server().await {
                tracing::error!("Server exited with error: {:#}", e);
                std::process::exit(1);
            }
        }
    }

    Ok(())
}
