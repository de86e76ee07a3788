use super::{
    cors_config, openai_config::OpenAIConfig, server_config::ServerConfig,
    suggestion_config::SuggestionConfig,
};
use poem::middleware::Cors;

pub struct AppConfig {
    pub server: ServerConfig,
    pub cors: Cors,
    pub openai: OpenAIConfig,
    pub suggestion: SuggestionConfig,
}

impl AppConfig {
    pub fn from_env() -> Self {
        Self {
            server: ServerConfig::from_env(),
            cors: cors_config::init_cors(),
            openai: OpenAIConfig::from_env(),
            suggestion: SuggestionConfig::from_env(),
        }
    }
}
