use std::process::ExitCode;

use portalfx::window::{self, DEFAULT_REQUEST_SECONDS};
use portalfx::PortalConfig;

const USAGE: &str = "usage: portalfx [portal|hologram|hud|mascot|<config.json>] [request-seconds]";

fn main() -> ExitCode {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("warn")).init();

    let mut args = std::env::args().skip(1);
    let target = args.next().unwrap_or_else(|| "portal".to_string());
    if target == "-h" || target == "--help" {
        println!("{USAGE}");
        return ExitCode::SUCCESS;
    }

    let config = match PortalConfig::preset(&target) {
        Some(config) => config,
        None => match PortalConfig::from_json_file(&target) {
            Ok(config) => config,
            Err(e) => {
                eprintln!("{target}: {e}\n{USAGE}");
                return ExitCode::FAILURE;
            }
        },
    };

    let request_seconds = match args.next().map(|s| s.parse::<f32>()) {
        None => DEFAULT_REQUEST_SECONDS,
        Some(Ok(s)) if s.is_finite() && s > 0.0 => s,
        Some(_) => {
            eprintln!("request-seconds must be a positive number\n{USAGE}");
            return ExitCode::FAILURE;
        }
    };

    log::info!("starting {} for {}s per request", target, request_seconds);
    match window::run(config, request_seconds) {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            eprintln!("portalfx: {e}");
            ExitCode::FAILURE
        }
    }
}
