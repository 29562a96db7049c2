//! Environment presence check.

use nearby_site::config::{REQUIRED_ENV_VARS, env_presence};

/// Print whether each known variable is set. Values are never printed.
///
/// Returns the names of required variables that are missing.
pub fn check() -> Vec<&'static str> {
    dotenvy::dotenv().ok();

    let mut missing = Vec::new();
    for (key, present) in env_presence() {
        let required = REQUIRED_ENV_VARS.contains(&key);
        if required && !present {
            missing.push(key);
        }

        #[allow(clippy::print_stdout)]
        {
            let marker = if present { "set" } else { "missing" };
            let kind = if required { "required" } else { "optional" };
            println!("{key:<28} {marker:<8} ({kind})");
        }
    }
    missing
}
