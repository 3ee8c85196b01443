use serde::Deserialize;
use std::env;

#[derive(Debug, Clone, Deserialize)]
pub struct Config {
    pub host: String,
    pub port: u16,
    pub environment: Environment,
    pub log_format: LogFormat,
    // Synthesis provider
    pub synthesis_api_url: String,
    pub synthesis_api_key: Option<String>,
    pub chunk_max_chars: usize,
    // Storage tiers
    pub audio_cache_dir: String,
    pub s3_bucket: Option<String>,
    pub aws_region: String,
    // Retention
    pub job_retention_hours: u64,
    pub export_retention_secs: u64,
}

#[derive(Debug, Clone, Deserialize, PartialEq)]
#[serde(rename_all = "lowercase")]
pub enum Environment {
    Development,
    Production,
}

#[derive(Debug, Clone, Deserialize, PartialEq)]
#[serde(rename_all = "lowercase")]
pub enum LogFormat {
    Pretty,
    Json,
}

impl Config {
    pub fn from_env() -> anyhow::Result<Self> {
        dotenvy::dotenv().ok();

        let config = Config {
            host: env::var("HOST").unwrap_or_else(|_| "0.0.0.0".to_string()),
            port: env::var("PORT")
                .unwrap_or_else(|_| "8080".to_string())
                .parse()?,
            environment: match env::var("ENVIRONMENT").as_deref() {
                Ok("production") => Environment::Production,
                _ => Environment::Development,
            },
            log_format: match env::var("LOG_FORMAT").as_deref() {
                Ok("json") => LogFormat::Json,
                _ => LogFormat::Pretty,
            },
            synthesis_api_url: env::var("SYNTHESIS_API_URL")
                .unwrap_or_else(|_| "https://texttospeech.googleapis.com/v1/text:synthesize".to_string()),
            synthesis_api_key: env::var("SYNTHESIS_API_KEY").ok(),
            chunk_max_chars: env::var("CHUNK_MAX_CHARS")
                .unwrap_or_else(|_| "4800".to_string())
                .parse()?,
            audio_cache_dir: env::var("AUDIO_CACHE_DIR")
                .unwrap_or_else(|_| "./audio-cache".to_string()),
            s3_bucket: env::var("S3_BUCKET").ok(),
            aws_region: env::var("AWS_REGION").unwrap_or_else(|_| "eu-west-1".to_string()),
            job_retention_hours: env::var("JOB_RETENTION_HOURS")
                .unwrap_or_else(|_| "24".to_string())
                .parse()?,
            export_retention_secs: env::var("EXPORT_RETENTION_SECS")
                .unwrap_or_else(|_| "600".to_string())
                .parse()?,
        };

        Ok(config)
    }

    pub fn is_development(&self) -> bool {
        self.environment == Environment::Development
    }
}
