//! Configuration validation functions.

use super::Config;

/// Validate configuration security. In production, the admin endpoint must
/// be protected by a non-trivial password.
pub fn validate_config_security(config: &Config) -> anyhow::Result<()> {
    let is_prod = is_production_mode();

    match &config.admin_password {
        Some(password) if password.len() < 16 => {
            eprintln!(
                "\nWARNING: admin_password is very short ({} chars).\n\
                 Recommended: at least 32 characters.\n\
                 Generate a strong password: openssl rand -hex 32\n",
                password.len()
            );
        }
        None if is_prod => {
            eprintln!(
                "\nNOTE: no admin_password configured; the admin snapshot endpoint is disabled.\n\
                 To enable it: export ADMIN_PASSWORD=\"$(openssl rand -hex 32)\"\n"
            );
        }
        _ => {}
    }

    Ok(())
}

/// Detect if we're running in production mode.
pub fn is_production_mode() -> bool {
    use std::env;

    if let Ok(mode) = env::var("ENVIRONMENT") {
        return mode.eq_ignore_ascii_case("production") || mode.eq_ignore_ascii_case("prod");
    }

    env::var("PRODUCTION").is_ok() || env::var("PROD").is_ok()
}
