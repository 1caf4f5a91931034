//! Configuration validation utilities.

use super::error::{ConfigError, ConfigResult};
use super::schema::{APP_TYPES, BotConfig, LogOutput, LoggingConfig, TurnErrorConfig, UnfurlConfig};

/// Validates the entire configuration.
///
/// Log levels are checked when the configuration is deserialized, so only
/// constraints between fields are checked here.
pub fn validate_config(config: &UnfurlConfig) -> ConfigResult<()> {
    validate_bot_config(&config.bot)?;
    validate_logging_config(&config.logging)?;
    validate_turn_error_config(&config.turn_error)?;
    Ok(())
}

fn validate_bot_config(bot: &BotConfig) -> ConfigResult<()> {
    if !APP_TYPES.contains(&bot.app_type.as_str()) {
        return Err(ConfigError::validation(format!(
            "Invalid app type: {}. Valid values are: {:?}",
            bot.app_type, APP_TYPES
        )));
    }

    if bot.app_type == "SingleTenant" && bot.tenant_id.as_deref().is_none_or(str::is_empty) {
        return Err(ConfigError::missing_field("bot.tenant_id"));
    }

    Ok(())
}

fn validate_logging_config(logging: &LoggingConfig) -> ConfigResult<()> {
    if logging.output == LogOutput::File && logging.file_path.is_none() {
        return Err(ConfigError::missing_field("logging.file_path"));
    }

    for module in logging.filters.keys() {
        if module.is_empty() || module.contains(char::is_whitespace) || module.contains('=') {
            return Err(ConfigError::validation(format!(
                "Invalid log filter target: '{module}'"
            )));
        }
    }

    Ok(())
}

fn validate_turn_error_config(turn_error: &TurnErrorConfig) -> ConfigResult<()> {
    if turn_error.user_message.trim().is_empty() {
        return Err(ConfigError::validation(
            "Turn error user message cannot be empty",
        ));
    }
    Ok(())
}
