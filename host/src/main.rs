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

    if let Err(e) = host::run::run_host(&net_config, SimConfig::default()) {
        error!("{}", e);
        if let host::RunError::Bind { source, .. } = &e {
            if source.kind() == std::io::ErrorKind::AddrInUse {
                error!("is another host already running?");
            }
        }
        process::exit(1);
    }
}
