//! Wiring & DI. Entry point: bootstrap adapters, inject into services, run UI.
//! No business logic here.

use biomathforge::adapters::ai::OpenAiAdapter;
use biomathforge::adapters::persistence::FsArtifactStore;
use biomathforge::adapters::search::{ExaSearchAdapter, MockSearchAdapter, TavilySearchAdapter};
use biomathforge::adapters::ui::tui::TuiInputPort;
use biomathforge::ports::{ArtifactPort, InputPort, LlmPort, SearchPort};
use biomathforge::shared::config::{AppConfig, SearchApi};
use biomathforge::shared::logging;
use biomathforge::shared::prompts::PromptManager;
use biomathforge::usecases::{
    EnhancementOptions, EnhancementService, EquationValidator, FinalizationOptions,
    FinalizationService, GenerationOptions, GenerationService, IntegrationOptions,
    IntegrationService, PathwayAnalysisService, PathwayOptions, PipelineOptions, PipelineService,
};
use dotenv::dotenv;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Duration;
use tracing::{info, warn};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cwd = std::env::current_dir().unwrap_or_else(|_| PathBuf::from("."));
    let env_loaded = dotenv();

    let cfg = AppConfig::load().map_err(|e| anyhow::anyhow!("{}", e))?;
    let log_file = logging::init(cfg.log_dir.as_deref().map(Path::new))?;

    match &env_loaded {
        Ok(path) => info!(path = %path.display(), "loaded .env"),
        Err(_) => info!(cwd = %cwd.display(), "no .env found (check CWD)"),
    }
    if let Some(path) = &log_file {
        info!(path = %path.display(), "logging to file");
    }

    biomathforge::adapters::ui::init_ui();

    // --- LLM provider ---
    let Some(api_key) = cfg.ai_api_key() else {
        anyhow::bail!("Set BIOMATHFORGE_AI_API_KEY or OPENAI_API_KEY (env or .env)");
    };
    info!(
        url = %cfg.ai_api_url_or_default(),
        planner = %cfg.planner_model_or_default(),
        writer = %cfg.writer_model_or_default(),
        "LLM provider configured"
    );
    let llm: Arc<dyn LlmPort> = Arc::new(
        OpenAiAdapter::new(
            cfg.ai_api_url_or_default(),
            api_key,
            cfg.planner_model_or_default(),
            cfg.writer_model_or_default(),
            cfg.seed_or_default(),
        )
        .with_poll_interval(Duration::from_secs(cfg.batch_poll_secs_or_default())),
    );

    // --- Web search ---
    let max_results = cfg.search_max_results_or_default();
    let max_chars = cfg.max_chars_per_source_or_default();
    let search: Arc<dyn SearchPort> = match (cfg.search_api_or_default(), cfg.search_api_key()) {
        (SearchApi::Tavily, Some(key)) => {
            info!(max_results, "web search via Tavily");
            Arc::new(TavilySearchAdapter::new(key, max_results, max_chars))
        }
        (SearchApi::Exa, Some(key)) => {
            info!(max_results, "web search via Exa");
            Arc::new(ExaSearchAdapter::new(key, max_results, max_chars))
        }
        (api, None) => {
            warn!(?api, "search API key not set, pathway analysis and enhancement run without web context");
            Arc::new(MockSearchAdapter::new("No results."))
        }
    };

    // --- Prompts ---
    let mut prompts = PromptManager::new();
    if let Some(path) = cfg.prompts_file.as_deref() {
        prompts
            .update_from_file(path)
            .map_err(|e| anyhow::anyhow!("{}", e))?;
        info!(path, "prompt overrides loaded");
    }
    let prompts = Arc::new(prompts);

    // --- Run directory ---
    let store = FsArtifactStore::for_run(cfg.output_dir_or_default(), chrono::Local::now());
    info!(path = %store.dir().display(), "run output directory");
    let artifacts: Arc<dyn ArtifactPort> = Arc::new(store);

    // --- Services ---
    let max_format_iterations = cfg.max_format_iterations_or_default();
    let save_intermediate = cfg.save_intermediate_or_default();
    let validator = Arc::new(
        EquationValidator::new(Arc::clone(&llm), Arc::clone(&prompts))
            .with_max_format_iterations(max_format_iterations),
    );
    let generation = Arc::new(GenerationService::new(
        Arc::clone(&llm),
        Arc::clone(&prompts),
        Arc::clone(&validator),
        GenerationOptions {
            max_rows: cfg.max_rows_or_default(),
            use_batch_api: cfg.use_batch_api_or_default(),
            validate_format: true,
            max_iterations: max_format_iterations,
            request_delay: Duration::from_millis(cfg.request_delay_ms_or_default()),
        },
    ));
    let pathway = Arc::new(PathwayAnalysisService::new(
        Arc::clone(&llm),
        Arc::clone(&search),
        Arc::clone(&prompts),
        Arc::clone(&artifacts),
        PathwayOptions {
            number_of_queries: cfg.analysis_queries_or_default(),
            max_refinements: cfg.max_refinements_or_default(),
        },
    ));
    let integration = Arc::new(IntegrationService::new(
        Arc::clone(&llm),
        Arc::clone(&prompts),
        Arc::clone(&validator),
        Arc::clone(&artifacts),
        IntegrationOptions {
            max_format_iterations,
            max_connectivity_iterations: cfg.max_connectivity_iterations_or_default(),
            save_intermediate,
        },
    ));
    let enhancement = Arc::new(EnhancementService::new(
        Arc::clone(&llm),
        Arc::clone(&search),
        Arc::clone(&prompts),
        EnhancementOptions {
            number_of_queries: cfg.enhancement_queries_or_default(),
        },
    ));
    let finalization = Arc::new(FinalizationService::new(
        Arc::clone(&llm),
        Arc::clone(&prompts),
        Arc::clone(&validator),
        Arc::clone(&artifacts),
        FinalizationOptions {
            max_format_iterations,
            save_intermediate,
        },
    ));
    let pipeline = Arc::new(PipelineService::new(
        Arc::clone(&generation),
        Arc::clone(&pathway),
        Arc::clone(&integration),
        Arc::clone(&enhancement),
        Arc::clone(&finalization),
        Arc::clone(&artifacts),
        PipelineOptions::default(),
    ));

    let input_port: Arc<dyn InputPort> = Arc::new(TuiInputPort::new(
        pipeline,
        generation,
        pathway,
        integration,
        enhancement,
        finalization,
        artifacts,
    ));

    input_port
        .run()
        .await
        .map_err(|e| anyhow::anyhow!("{}", e))?;

    Ok(())
}
