//! Map validated CLI arguments to the action to run.

use crate::cli::actions::{Action, server::Args};
use crate::cli::commands::{
    ARG_ACCESS_WINDOW_MINUTES, ARG_ENVIRONMENT, ARG_PORT, ARG_RENEWAL_WINDOW_DAYS,
    ARG_REQUEST_TIMEOUT_SECONDS, ARG_VALIDATOR_URL,
};
use crate::config::Environment;
use anyhow::{Context, Result, anyhow};
use url::Url;

/// Map validated CLI matches to a server action.
///
/// # Errors
/// Returns an error if an argument is missing or cannot be parsed.
pub fn handler(matches: &clap::ArgMatches) -> Result<Action> {
    let port = matches.get_one::<u16>(ARG_PORT).copied().unwrap_or(8080);

    let validator_url = matches
        .get_one::<String>(ARG_VALIDATOR_URL)
        .context("missing required argument: --validator-url")?;
    let validator_url = Url::parse(validator_url).context("invalid TOLLGATE_VALIDATOR_URL")?;

    let environment = matches
        .get_one::<String>(ARG_ENVIRONMENT)
        .map_or(Ok(Environment::default()), |value| value.parse::<Environment>())
        .map_err(|e| anyhow!(e))?;

    let number = |name: &str| -> Result<u64> {
        matches
            .get_one::<u64>(name)
            .copied()
            .with_context(|| format!("missing required argument: --{name}"))
    };

    Ok(Action::Server(Args {
        port,
        validator_url,
        environment,
        access_window_minutes: number(ARG_ACCESS_WINDOW_MINUTES)?,
        renewal_window_days: number(ARG_RENEWAL_WINDOW_DAYS)?,
        request_timeout_seconds: number(ARG_REQUEST_TIMEOUT_SECONDS)?,
    }))
}

#[cfg(test)]
mod tests {
    use super::*;

    const VARS: [&str; 6] = [
        "TOLLGATE_PORT",
        "TOLLGATE_VALIDATOR_URL",
        "TOLLGATE_ENV",
        "TOLLGATE_ACCESS_WINDOW_MINUTES",
        "TOLLGATE_RENEWAL_WINDOW_DAYS",
        "TOLLGATE_REQUEST_TIMEOUT_SECONDS",
    ];

    fn server_args(args: Vec<&str>) -> Result<Args> {
        let matches = crate::cli::commands::new().get_matches_from(args);
        match handler(&matches)? {
            Action::Server(args) => Ok(args),
        }
    }

    #[test]
    fn defaults() {
        temp_env::with_vars_unset(VARS, || {
            let args = server_args(vec!["tollgate"]);
            assert!(args.is_ok());
            if let Ok(args) = args {
                assert_eq!(args.port, 8080);
                assert_eq!(args.validator_url.as_str(), "https://dummyjson.com/");
                assert_eq!(args.environment, Environment::Development);
                assert_eq!(args.access_window_minutes, 30);
                assert_eq!(args.renewal_window_days, 7);
                assert_eq!(args.request_timeout_seconds, 10);
            }
        });
    }

    #[test]
    fn reads_environment_variables() {
        temp_env::with_vars(
            [
                ("TOLLGATE_PORT", Some("9090")),
                ("TOLLGATE_VALIDATOR_URL", Some("http://127.0.0.1:4000/")),
                ("TOLLGATE_ENV", Some("production")),
                ("TOLLGATE_ACCESS_WINDOW_MINUTES", Some("15")),
                ("TOLLGATE_RENEWAL_WINDOW_DAYS", None),
                ("TOLLGATE_REQUEST_TIMEOUT_SECONDS", None),
            ],
            || {
                let args = server_args(vec!["tollgate"]);
                assert!(args.is_ok());
                if let Ok(args) = args {
                    assert_eq!(args.port, 9090);
                    assert_eq!(args.validator_url.as_str(), "http://127.0.0.1:4000/");
                    assert_eq!(args.environment, Environment::Production);
                    assert_eq!(args.access_window_minutes, 15);
                    assert_eq!(args.renewal_window_days, 7);
                }
            },
        );
    }

    #[test]
    fn flags_override_environment() {
        temp_env::with_vars([("TOLLGATE_PORT", Some("9090")), ("TOLLGATE_ENV", Some("prod"))], || {
            let args = server_args(vec!["tollgate", "--port", "7000", "-e", "dev"]);
            assert!(args.is_ok());
            if let Ok(args) = args {
                assert_eq!(args.port, 7000);
                assert_eq!(args.environment, Environment::Development);
            }
        });
    }

    #[test]
    fn invalid_validator_url() {
        temp_env::with_vars_unset(VARS, || {
            let result = server_args(vec!["tollgate", "--validator-url", "not a url"]);
            assert!(result.is_err());
            if let Err(err) = result {
                assert!(err.to_string().contains("invalid TOLLGATE_VALIDATOR_URL"));
            }
        });
    }
}
