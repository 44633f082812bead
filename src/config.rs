use std::path::PathBuf;

use anyhow::{anyhow, Result};

const DEFAULT_PORT: u16 = 3000;
const DEFAULT_MAX_TOKENS: u32 = 300;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ProviderKind {
    OpenAi,
    Gemini,
}

#[derive(Debug, Clone)]
pub struct OpenAiConfig {
    pub api_key: String,
    pub base_url: String,
    pub vision_model: String,
    pub image_model: String,
    pub max_tokens: u32,
}

#[derive(Debug, Clone)]
pub struct GeminiConfig {
    pub api_key: String,
    pub base_url: String,
    pub vision_model: String,
    pub image_model: String,
    pub max_tokens: u32,
}

#[derive(Debug, Clone)]
pub enum BackendConfig {
    Local,
    Supabase { url: String, anon_key: String },
}

#[derive(Debug, Clone)]
pub enum ProviderConfig {
    OpenAi(OpenAiConfig),
    Gemini(GeminiConfig),
}

#[derive(Debug, Clone)]
pub struct Config {
    pub provider: ProviderConfig,
    pub backend: BackendConfig,
    pub data_dir: PathBuf,
    pub public_url: String,
    pub port: u16,
    pub secret_key: Option<String>,
}

impl Config {
    pub fn from_env() -> Result<Self> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Builds the configuration from any key lookup; blank values count as unset.
    pub fn from_lookup<F>(lookup: F) -> Result<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let get = |key: &str| {
            lookup(key)
                .map(|value| value.trim().to_string())
                .filter(|value| !value.is_empty())
        };

        let port = get("MCP_PORT")
            .and_then(|value| value.parse::<u16>().ok())
            .unwrap_or(DEFAULT_PORT);
        let max_tokens = get("INK_MAX_TOKENS")
            .and_then(|value| value.parse::<u32>().ok())
            .unwrap_or(DEFAULT_MAX_TOKENS);

        let kind = match get("INK_PROVIDER").as_deref().map(str::to_ascii_lowercase).as_deref() {
            None | Some("openai") => ProviderKind::OpenAi,
            Some("gemini") | Some("google") => ProviderKind::Gemini,
            Some(other) => return Err(anyhow!("unknown INK_PROVIDER: {other}")),
        };
        let provider = match kind {
            ProviderKind::OpenAi => ProviderConfig::OpenAi(OpenAiConfig {
                api_key: get("OPENAI_API_KEY").ok_or_else(|| anyhow!("missing OPENAI_API_KEY"))?,
                base_url: get("OPENAI_BASE_URL")
                    .unwrap_or_else(|| "https://api.openai.com/v1".to_string()),
                vision_model: get("OPENAI_VISION_MODEL").unwrap_or_else(|| "gpt-4o".to_string()),
                image_model: get("OPENAI_IMAGE_MODEL").unwrap_or_else(|| "dall-e-3".to_string()),
                max_tokens,
            }),
            ProviderKind::Gemini => ProviderConfig::Gemini(GeminiConfig {
                api_key: get("GOOGLE_API_KEY").ok_or_else(|| anyhow!("missing GOOGLE_API_KEY"))?,
                base_url: get("GEMINI_BASE_URL").unwrap_or_else(|| {
                    "https://generativelanguage.googleapis.com/v1beta".to_string()
                }),
                vision_model: get("GEMINI_VISION_MODEL")
                    .unwrap_or_else(|| "gemini-2.0-flash".to_string()),
                image_model: get("GEMINI_IMAGE_MODEL")
                    .unwrap_or_else(|| "imagen-3.0-generate-002".to_string()),
                max_tokens,
            }),
        };

        let backend = match (get("SUPABASE_URL"), get("SUPABASE_ANON_KEY")) {
            (Some(url), Some(anon_key)) => BackendConfig::Supabase { url, anon_key },
            (Some(_), None) => {
                return Err(anyhow!("SUPABASE_URL is set but SUPABASE_ANON_KEY is missing"));
            }
            _ => BackendConfig::Local,
        };

        let data_dir = get("INK_DATA_DIR").map(PathBuf::from).unwrap_or_else(|| {
            let mut base = dirs::data_dir().unwrap_or_else(|| PathBuf::from("."));
            base.push("ink-it");
            base
        });
        let public_url = get("INK_PUBLIC_URL")
            .map(|value| value.trim_end_matches('/').to_string())
            .unwrap_or_else(|| format!("http://localhost:{port}"));

        Ok(Self {
            provider,
            backend,
            data_dir,
            public_url,
            port,
            secret_key: get("SECRET_KEY"),
        })
    }

    pub fn provider_kind(&self) -> ProviderKind {
        match self.provider {
            ProviderConfig::OpenAi(_) => ProviderKind::OpenAi,
            ProviderConfig::Gemini(_) => ProviderKind::Gemini,
        }
    }

    pub fn files_url(&self) -> String {
        format!("{}/files", self.public_url)
    }

    pub fn scoped_path(&self, path: &str) -> String {
        match self.secret_key.as_deref() {
            Some(secret) => format!("/{secret}{path}"),
            None => path.to_string(),
        }
    }
}

#[cfg(test)]
mod tests {
    use std::collections::HashMap;

    use super::*;

    fn config(pairs: &[(&str, &str)]) -> Result<Config> {
        let vars: HashMap<String, String> = pairs
            .iter()
            .map(|(key, value)| (key.to_string(), value.to_string()))
            .collect();
        Config::from_lookup(|key| vars.get(key).cloned())
    }

    #[test]
    fn openai_is_the_default_provider() {
        let config =
            config(&[("OPENAI_API_KEY", "sk-test"), ("INK_DATA_DIR", "/tmp/ink")]).unwrap();
        match &config.provider {
            ProviderConfig::OpenAi(openai) => {
                assert_eq!(openai.vision_model, "gpt-4o");
                assert_eq!(openai.image_model, "dall-e-3");
                assert_eq!(openai.max_tokens, 300);
            }
            other => panic!("unexpected provider {other:?}"),
        }
        assert!(matches!(config.backend, BackendConfig::Local));
        assert_eq!(config.port, 3000);
        assert_eq!(config.files_url(), "http://localhost:3000/files");
    }

    #[test]
    fn missing_key_for_selected_provider_is_an_error() {
        assert!(config(&[("INK_PROVIDER", "gemini"), ("OPENAI_API_KEY", "sk")]).is_err());
        assert!(config(&[]).is_err());
        assert!(config(&[("INK_PROVIDER", "stability"), ("OPENAI_API_KEY", "sk")]).is_err());
    }

    #[test]
    fn supabase_requires_both_values() {
        let config_ok = config(&[
            ("OPENAI_API_KEY", "sk"),
            ("SUPABASE_URL", "https://demo.supabase.co"),
            ("SUPABASE_ANON_KEY", "anon"),
        ])
        .unwrap();
        assert!(matches!(config_ok.backend, BackendConfig::Supabase { .. }));
        assert!(config(&[("OPENAI_API_KEY", "sk"), ("SUPABASE_URL", "https://x")]).is_err());
    }

    #[test]
    fn secret_key_scopes_paths() {
        let vars = [("OPENAI_API_KEY", "sk"), ("SECRET_KEY", "abc"), ("MCP_PORT", "8080")];
        let config = config(&vars).unwrap();
        assert_eq!(config.scoped_path("/mcp"), "/abc/mcp");
        assert_eq!(config.public_url, "http://localhost:8080");
    }
}
