pub mod logging;

use clap::{
    Arg, ColorChoice, Command,
    builder::styling::{AnsiColor, Effects, Styles},
};

pub const ARG_PORT: &str = "port";
pub const ARG_VALIDATOR_URL: &str = "validator-url";
pub const ARG_ENVIRONMENT: &str = "environment";
pub const ARG_ACCESS_WINDOW_MINUTES: &str = "access-window-minutes";
pub const ARG_RENEWAL_WINDOW_DAYS: &str = "renewal-window-days";
pub const ARG_REQUEST_TIMEOUT_SECONDS: &str = "request-timeout-seconds";

#[must_use]
pub fn new() -> Command {
    let styles = Styles::styled()
        .header(AnsiColor::Yellow.on_default() | Effects::BOLD)
        .usage(AnsiColor::Green.on_default() | Effects::BOLD)
        .literal(AnsiColor::Blue.on_default() | Effects::BOLD)
        .placeholder(AnsiColor::Green.on_default());

    let long_version: &'static str = Box::leak(
        format!("{} - {}", env!("CARGO_PKG_VERSION"), crate::GIT_COMMIT_HASH).into_boxed_str(),
    );

    let command = Command::new("tollgate")
        .about("Session gateway for cookie-held credentials")
        .version(env!("CARGO_PKG_VERSION"))
        .long_version(long_version)
        .color(ColorChoice::Auto)
        .styles(styles)
        .arg(
            Arg::new(ARG_PORT)
                .short('p')
                .long("port")
                .help("Port to listen on")
                .default_value("8080")
                .env("TOLLGATE_PORT")
                .value_parser(clap::value_parser!(u16)),
        )
        .arg(
            Arg::new(ARG_VALIDATOR_URL)
                .long("validator-url")
                .help("Base URL of the credential validator, example: https://dummyjson.com")
                .default_value("https://dummyjson.com")
                .env("TOLLGATE_VALIDATOR_URL"),
        )
        .arg(
            Arg::new(ARG_ENVIRONMENT)
                .short('e')
                .long("environment")
                .help("Deployment environment, production marks cookies Secure")
                .default_value("development")
                .env("TOLLGATE_ENV")
                .value_parser(["development", "dev", "production", "prod"]),
        )
        .arg(
            Arg::new(ARG_ACCESS_WINDOW_MINUTES)
                .long("access-window-minutes")
                .help("Lifetime of the access secret and its cookie, in minutes")
                .default_value("30")
                .env("TOLLGATE_ACCESS_WINDOW_MINUTES")
                .value_parser(clap::value_parser!(u64).range(1..)),
        )
        .arg(
            Arg::new(ARG_RENEWAL_WINDOW_DAYS)
                .long("renewal-window-days")
                .help("Lifetime of the renewal secret cookie, in days")
                .default_value("7")
                .env("TOLLGATE_RENEWAL_WINDOW_DAYS")
                .value_parser(clap::value_parser!(u64).range(1..)),
        )
        .arg(
            Arg::new(ARG_REQUEST_TIMEOUT_SECONDS)
                .long("request-timeout-seconds")
                .help("Timeout for calls to the credential validator, in seconds")
                .default_value("10")
                .env("TOLLGATE_REQUEST_TIMEOUT_SECONDS")
                .value_parser(clap::value_parser!(u64).range(1..)),
        );

    logging::with_args(command)
}
