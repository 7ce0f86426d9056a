use std::process;

use tracing::error;

use common::config::{NetConfig, SimConfig};

fn main() {
    let net_config = match NetConfig::from_env() {
        Ok(config) => config,
        Err(e) => {
            eprintln!("Error: {}.", e);
            process::exit(1);
        }
    };
    common::logging::init(&net_config.log_level);

    if let Err(e) = client::run::run_client(&net_config, SimConfig::default()) {
        error!("{}", e);
        if let client::RunError::Disconnected(reason) = &e {
            if reason.contains("protocol") || reason.contains("version") {
                error!("client and host versions do not match");
            }
        }
        process::exit(1);
    }
}
