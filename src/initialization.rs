use std::env;
use std::fs;
use std::io::ErrorKind;
use std::time::Duration;
use argh::FromArgs;
use log::info;
use serde::Deserialize;
use serde_with::{serde_as, DurationSeconds};
use crate::errors::ConfigError;
use crate::logging::setup_logger;

const DEFAULT_CONFIG_PATH: &str = "config.toml";

/// What the process was asked to do
///
#[derive(Debug, Copy, Clone, PartialEq)]
pub enum Command {
    Run,
    Diagnose,
    SetWebhook,
}

/// Meghdoot, a Telegram bot sending farmers weather advisories for their location
#[derive(FromArgs, Debug, PartialEq)]
struct Args {
    /// path to the configuration file, defaults to $MEGHDOOT_CONFIG or ./config.toml
    #[argh(option, short = 'c')]
    config: Option<String>,

    #[argh(subcommand)]
    command: Option<SubCommand>,
}

#[derive(FromArgs, Debug, PartialEq)]
#[argh(subcommand)]
enum SubCommand {
    Run(RunArgs),
    Diagnose(DiagnoseArgs),
    SetWebhook(SetWebhookArgs),
}

/// run the bot in the configured transport mode (default)
#[derive(FromArgs, Debug, PartialEq)]
#[argh(subcommand, name = "run")]
struct RunArgs {}

/// check the token, bot identity, webhook registration and webhook host
#[derive(FromArgs, Debug, PartialEq)]
#[argh(subcommand, name = "diagnose")]
struct DiagnoseArgs {}

/// register the configured public url as webhook and verify it
#[derive(FromArgs, Debug, PartialEq)]
#[argh(subcommand, name = "set-webhook")]
struct SetWebhookArgs {}

impl Args {
    fn command(&self) -> Command {
        match self.command {
            None | Some(SubCommand::Run(_)) => Command::Run,
            Some(SubCommand::Diagnose(_)) => Command::Diagnose,
            Some(SubCommand::SetWebhook(_)) => Command::SetWebhook,
        }
    }
}

#[derive(Deserialize, Debug, Copy, Clone, PartialEq)]
#[serde(rename_all = "lowercase")]
pub enum TransportMode {
    Polling,
    Webhook,
}

#[derive(Deserialize)]
#[serde(default)]
pub struct General {
    pub log_path: Option<String>,
    pub log_level: String,
    pub log_to_stdout: bool,
}

impl Default for General {
    fn default() -> Self {
        Self { log_path: None, log_level: "info".to_string(), log_to_stdout: true }
    }
}

#[serde_as]
#[derive(Deserialize)]
#[serde(default)]
pub struct TelegramParameters {
    pub token: String,
    pub api_url: String,
    #[serde_as(as = "DurationSeconds<u64>")]
    pub request_timeout: Duration,
    #[serde_as(as = "DurationSeconds<u64>")]
    pub connect_timeout: Duration,
    #[serde_as(as = "DurationSeconds<u64>")]
    pub poll_timeout: Duration,
    pub proxy: Option<String>,
}

impl Default for TelegramParameters {
    fn default() -> Self {
        Self {
            token: String::new(),
            api_url: "https://api.telegram.org".to_string(),
            request_timeout: Duration::from_secs(30),
            connect_timeout: Duration::from_secs(30),
            poll_timeout: Duration::from_secs(30),
            proxy: None,
        }
    }
}

#[derive(Deserialize)]
#[serde(default)]
pub struct Transport {
    pub mode: TransportMode,
}

impl Default for Transport {
    fn default() -> Self {
        Self { mode: TransportMode::Polling }
    }
}

#[derive(Deserialize)]
#[serde(default)]
pub struct WebServerParameters {
    pub bind_address: String,
    pub bind_port: u16,
    pub public_url: Option<String>,
    pub webhook_secret: Option<String>,
}

impl Default for WebServerParameters {
    fn default() -> Self {
        Self {
            bind_address: "0.0.0.0".to_string(),
            bind_port: 5000,
            public_url: None,
            webhook_secret: None,
        }
    }
}

#[serde_as]
#[derive(Deserialize)]
#[serde(default)]
pub struct WeatherParameters {
    pub api_url: String,
    pub forecast_days: u8,
    #[serde_as(as = "DurationSeconds<u64>")]
    pub timeout: Duration,
}

impl Default for WeatherParameters {
    fn default() -> Self {
        Self {
            api_url: "https://api.open-meteo.com/v1/forecast".to_string(),
            forecast_days: 7,
            timeout: Duration::from_secs(10),
        }
    }
}

#[serde_as]
#[derive(Deserialize)]
#[serde(default)]
pub struct GeocodingParameters {
    pub enabled: bool,
    pub api_url: String,
    pub user_agent: String,
    #[serde_as(as = "DurationSeconds<u64>")]
    pub timeout: Duration,
}

impl Default for GeocodingParameters {
    fn default() -> Self {
        Self {
            enabled: true,
            api_url: "https://nominatim.openstreetmap.org/reverse".to_string(),
            user_agent: "MeghdootBot/1.0".to_string(),
            timeout: Duration::from_secs(5),
        }
    }
}

#[derive(Deserialize, Default)]
#[serde(default)]
pub struct Config {
    pub general: General,
    pub telegram: TelegramParameters,
    pub transport: Transport,
    pub web_server: WebServerParameters,
    pub weather: WeatherParameters,
    pub geocoding: GeocodingParameters,
}

/// Reads command line, configuration file and environment, then sets up logging
///
/// The configuration file is given by `--config <path>`, else by the `MEGHDOOT_CONFIG`
/// environment variable, else it is `config.toml` in the working directory. Only that
/// last one may be missing, the defaults and environment then make up the configuration.
///
pub fn config() -> Result<(Command, Config), ConfigError> {
    let args: Args = argh::from_env();
    let command = args.command();
    let (config_path, explicit) = config_path(args.config, env::var("MEGHDOOT_CONFIG").ok());

    let loaded = read_config(&config_path, explicit)?;
    let from_file = loaded.is_some();
    let mut config = loaded.unwrap_or_default();
    apply_env_overrides(&mut config, |key| env::var(key).ok())?;
    validate(&config)?;

    setup_logger(&config.general)?;
    if from_file {
        info!("configuration loaded from {}", config_path);
    } else {
        info!("no {} found, configuration taken from defaults and environment", config_path);
    }

    Ok((command, config))
}

/// Picks the configuration file, returns it along with whether it was asked for explicitly
///
/// # Arguments
///
/// * 'flag' - path given on the command line
/// * 'env_path' - path given by the `MEGHDOOT_CONFIG` environment variable
fn config_path(flag: Option<String>, env_path: Option<String>) -> (String, bool) {
    match flag.or(env_path.filter(|p| !p.is_empty())) {
        Some(path) => (path, true),
        None => (DEFAULT_CONFIG_PATH.to_string(), false),
    }
}

/// Reads and parses a configuration file, `None` if the default file does not exist
///
/// # Arguments
///
/// * 'path' - path to the configuration file
/// * 'explicit' - whether the path was asked for, a missing file is then an error
fn read_config(path: &str, explicit: bool) -> Result<Option<Config>, ConfigError> {
    match fs::read_to_string(path) {
        Ok(toml) => Ok(Some(toml::from_str(&toml)?)),
        Err(e) if !explicit && e.kind() == ErrorKind::NotFound => Ok(None),
        Err(e) => Err(ConfigError(format!("failed to read {}: {}", path, e))),
    }
}

/// Applies the environment variables a hosted deployment provides
///
/// # Arguments
///
/// * 'config' - configuration to update
/// * 'lookup' - environment lookup
fn apply_env_overrides<F>(config: &mut Config, lookup: F) -> Result<(), ConfigError>
where
    F: Fn(&str) -> Option<String>,
{
    if let Some(token) = lookup("TELEGRAM_TOKEN").filter(|t| !t.is_empty()) {
        config.telegram.token = token;
    }
    if let Some(port) = lookup("PORT") {
        config.web_server.bind_port = port.parse()
            .map_err(|_| ConfigError(format!("PORT is not a valid port: {}", port)))?;
    }
    if let Some(url) = lookup("RAILWAY_STATIC_URL").filter(|u| !u.is_empty()) {
        config.web_server.public_url = Some(url);
    }

    Ok(())
}

fn validate(config: &Config) -> Result<(), ConfigError> {
    if config.telegram.token.trim().is_empty() {
        return Err("telegram token missing, set [telegram] token or TELEGRAM_TOKEN".into());
    }
    if !(1..=16).contains(&config.weather.forecast_days) {
        return Err("[weather] forecast_days must be between 1 and 16".into());
    }
    if let Some(secret) = &config.web_server.webhook_secret {
        let valid_chars = secret.chars().all(|c| c.is_ascii_alphanumeric() || c == '_' || c == '-');
        if secret.is_empty() || secret.len() > 256 || !valid_chars {
            return Err("[web_server] webhook_secret must be 1-256 characters of A-Z, a-z, 0-9, _ and -".into());
        }
    }

    Ok(())
}
