//! Application configuration. API credentials, models, stage limits, paths.

use crate::domain::DomainError;
use serde::Deserialize;

pub const DEFAULT_AI_API_URL: &str = "https://api.openai.com/v1";
pub const DEFAULT_PLANNER_MODEL: &str = "o3-2025-04-16";
pub const DEFAULT_WRITER_MODEL: &str = "o4-mini-2025-04-16";
pub const DEFAULT_SEED: i64 = 42;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SearchApi {
    Tavily,
    Exa,
}

#[derive(Debug, Deserialize, Default, Clone)]
pub struct AppConfig {
    // ─────────────────────────────────────────────────────────────────────────
    // LLM provider
    // ─────────────────────────────────────────────────────────────────────────
    /// API key. Read from BIOMATHFORGE_AI_API_KEY, falling back to OPENAI_API_KEY.
    #[serde(default)]
    pub ai_api_key: Option<String>,

    /// Base URL of an OpenAI-compatible API (chat, files, batches live below it).
    #[serde(default)]
    pub ai_api_url: Option<String>,

    /// Model for network-level work (generation, integration, repair, finalization).
    #[serde(default)]
    pub planner_model: Option<String>,

    /// Model for corrections, search queries, and section writing.
    #[serde(default)]
    pub writer_model: Option<String>,

    #[serde(default)]
    pub seed: Option<i64>,

    // ─────────────────────────────────────────────────────────────────────────
    // Web search
    // ─────────────────────────────────────────────────────────────────────────
    /// "tavily" (default) or "exa".
    #[serde(default)]
    pub search_api: Option<String>,

    /// Read from BIOMATHFORGE_TAVILY_API_KEY or TAVILY_API_KEY.
    #[serde(default)]
    pub tavily_api_key: Option<String>,

    /// Read from BIOMATHFORGE_EXA_API_KEY or EXA_API_KEY.
    #[serde(default)]
    pub exa_api_key: Option<String>,

    #[serde(default)]
    pub search_max_results: Option<usize>,

    /// Raw page content kept per source in the search digest.
    #[serde(default)]
    pub max_chars_per_source: Option<usize>,

    // ─────────────────────────────────────────────────────────────────────────
    // Stage limits
    // ─────────────────────────────────────────────────────────────────────────
    #[serde(default)]
    pub analysis_queries: Option<usize>,
    #[serde(default)]
    pub enhancement_queries: Option<usize>,
    #[serde(default)]
    pub max_refinements: Option<usize>,
    #[serde(default)]
    pub max_rows: Option<usize>,
    #[serde(default)]
    pub use_batch_api: Option<bool>,
    #[serde(default)]
    pub batch_poll_secs: Option<u64>,
    /// Pause between individual generation requests.
    #[serde(default)]
    pub request_delay_ms: Option<u64>,
    #[serde(default)]
    pub max_format_iterations: Option<usize>,
    #[serde(default)]
    pub max_connectivity_iterations: Option<usize>,

    // ─────────────────────────────────────────────────────────────────────────
    // Paths
    // ─────────────────────────────────────────────────────────────────────────
    #[serde(default)]
    pub output_dir: Option<String>,
    /// When set, logs are also written to `<log_dir>/biomathforge_<YYYYMMDD>.log`.
    #[serde(default)]
    pub log_dir: Option<String>,
    /// YAML/TOML/JSON file with prompt overrides (name -> template).
    #[serde(default)]
    pub prompts_file: Option<String>,
    #[serde(default)]
    pub save_intermediate: Option<bool>,
}

impl AppConfig {
    /// Environment (and `.env`), plus the file named by BIOMATHFORGE_CONFIG.
    pub fn load() -> Result<Self, DomainError> {
        dotenv::dotenv().ok();
        Self::load_with_file(std::env::var("BIOMATHFORGE_CONFIG").ok().as_deref())
    }

    pub fn load_with_file(path: Option<&str>) -> Result<Self, DomainError> {
        let mut c = config::Config::builder();
        c = c.add_source(config::Environment::with_prefix("BIOMATHFORGE").try_parsing(true));
        if let Some(path) = path {
            c = c.add_source(config::File::with_name(path));
        }
        c.build()
            .and_then(|built| built.try_deserialize())
            .map_err(|e| DomainError::Config(e.to_string()))
    }

    /// API key from config, then OPENAI_API_KEY.
    pub fn ai_api_key(&self) -> Option<String> {
        self.ai_api_key
            .clone()
            .or_else(|| std::env::var("OPENAI_API_KEY").ok())
            .filter(|k| !k.trim().is_empty())
    }

    pub fn ai_api_url_or_default(&self) -> String {
        self.ai_api_url
            .clone()
            .unwrap_or_else(|| DEFAULT_AI_API_URL.to_string())
            .trim_end_matches('/')
            .to_string()
    }

    pub fn planner_model_or_default(&self) -> String {
        self.planner_model
            .clone()
            .unwrap_or_else(|| DEFAULT_PLANNER_MODEL.to_string())
    }

    pub fn writer_model_or_default(&self) -> String {
        self.writer_model
            .clone()
            .unwrap_or_else(|| DEFAULT_WRITER_MODEL.to_string())
    }

    pub fn seed_or_default(&self) -> i64 {
        self.seed.unwrap_or(DEFAULT_SEED)
    }

    /// Unknown values fall back to Tavily.
    pub fn search_api_or_default(&self) -> SearchApi {
        match self.search_api.as_deref().map(str::to_ascii_lowercase).as_deref() {
            Some("exa") => SearchApi::Exa,
            _ => SearchApi::Tavily,
        }
    }

    pub fn tavily_api_key(&self) -> Option<String> {
        self.tavily_api_key
            .clone()
            .or_else(|| std::env::var("TAVILY_API_KEY").ok())
            .filter(|k| !k.trim().is_empty())
    }

    pub fn exa_api_key(&self) -> Option<String> {
        self.exa_api_key
            .clone()
            .or_else(|| std::env::var("EXA_API_KEY").ok())
            .filter(|k| !k.trim().is_empty())
    }

    /// Key for the selected search provider.
    pub fn search_api_key(&self) -> Option<String> {
        match self.search_api_or_default() {
            SearchApi::Tavily => self.tavily_api_key(),
            SearchApi::Exa => self.exa_api_key(),
        }
    }

    pub fn search_max_results_or_default(&self) -> usize {
        self.search_max_results.unwrap_or(5)
    }

    pub fn max_chars_per_source_or_default(&self) -> usize {
        self.max_chars_per_source.unwrap_or(4000)
    }

    /// Search queries per pathway-analysis section. Defaults to 4.
    pub fn analysis_queries_or_default(&self) -> usize {
        self.analysis_queries.unwrap_or(4)
    }

    /// Search queries for feedback/crosstalk enhancement. Defaults to 6.
    pub fn enhancement_queries_or_default(&self) -> usize {
        self.enhancement_queries.unwrap_or(6)
    }

    pub fn max_refinements_or_default(&self) -> usize {
        self.max_refinements.unwrap_or(3)
    }

    pub fn max_rows_or_default(&self) -> usize {
        self.max_rows.unwrap_or(30)
    }

    pub fn use_batch_api_or_default(&self) -> bool {
        self.use_batch_api.unwrap_or(true)
    }

    pub fn batch_poll_secs_or_default(&self) -> u64 {
        self.batch_poll_secs.unwrap_or(300)
    }

    pub fn request_delay_ms_or_default(&self) -> u64 {
        self.request_delay_ms.unwrap_or(100)
    }

    pub fn max_format_iterations_or_default(&self) -> usize {
        self.max_format_iterations.unwrap_or(3)
    }

    pub fn max_connectivity_iterations_or_default(&self) -> usize {
        self.max_connectivity_iterations.unwrap_or(10)
    }

    pub fn output_dir_or_default(&self) -> String {
        self.output_dir.clone().unwrap_or_else(|| "./output".to_string())
    }

    pub fn save_intermediate_or_default(&self) -> bool {
        self.save_intermediate.unwrap_or(true)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let cfg = AppConfig::default();
        assert_eq!(cfg.ai_api_url_or_default(), DEFAULT_AI_API_URL);
        assert_eq!(cfg.planner_model_or_default(), DEFAULT_PLANNER_MODEL);
        assert_eq!(cfg.writer_model_or_default(), DEFAULT_WRITER_MODEL);
        assert_eq!(cfg.seed_or_default(), 42);
        assert_eq!(cfg.analysis_queries_or_default(), 4);
        assert_eq!(cfg.enhancement_queries_or_default(), 6);
        assert_eq!(cfg.max_connectivity_iterations_or_default(), 10);
        assert!(cfg.use_batch_api_or_default());
    }

    #[test]
    fn test_search_api_selection() {
        let mut cfg = AppConfig::default();
        assert_eq!(cfg.search_api_or_default(), SearchApi::Tavily);
        cfg.search_api = Some("EXA".to_string());
        assert_eq!(cfg.search_api_or_default(), SearchApi::Exa);
        cfg.search_api = Some("duckduckgo".to_string());
        assert_eq!(cfg.search_api_or_default(), SearchApi::Tavily);
    }

    #[test]
    fn test_missing_config_file_is_a_config_error() {
        let res = AppConfig::load_with_file(Some("/nonexistent/biomathforge_settings"));
        assert!(matches!(res, Err(DomainError::Config(_))));
    }

    #[test]
    fn test_config_file_values_are_read() {
        let mut file = tempfile::Builder::new().suffix(".toml").tempfile().unwrap();
        std::io::Write::write_all(&mut file, b"planner_model = \"gpt-test\"\nmax_rows = 7\n").unwrap();
        let path = file.path().to_string_lossy().to_string();
        let cfg = AppConfig::load_with_file(Some(&path)).unwrap();
        assert_eq!(cfg.planner_model_or_default(), "gpt-test");
        assert_eq!(cfg.max_rows_or_default(), 7);
    }

    #[test]
    fn test_api_url_trailing_slash_trimmed() {
        let cfg = AppConfig {
            ai_api_url: Some("http://localhost:11434/v1/".to_string()),
            ..Default::default()
        };
        assert_eq!(cfg.ai_api_url_or_default(), "http://localhost:11434/v1");
    }
}
