use std::sync::Arc;

use logger::TracingLogger;
use openai::client::OpenAIClient;
use openai::completion::SuggestionCompletionOpenAI;

use business::application::suggestion::generate::GenerateSuggestionUseCaseImpl;
use business::domain::clock::SystemClock;
use business::domain::logger::Logger;
use business::domain::scheduling::ScheduledTask;
use business::domain::suggestion::services::SuggestionCompletionService;

use crate::config::app_config::AppConfig;

pub struct DependencyContainer {
    pub health_api: crate::api::health::routes::Api,
    pub suggestion_api: crate::api::suggestion::routes::SuggestionApi,
    pub background: BackgroundTasks,
}

/// Scheduled cache sweep and queue drain, plus the pipeline they serve.
pub struct BackgroundTasks {
    tasks: Vec<ScheduledTask>,
    use_case: Arc<GenerateSuggestionUseCaseImpl>,
    logger: Arc<dyn Logger>,
}

impl BackgroundTasks {
    /// Stops the periodic tasks, then fails whatever is still queued so no
    /// caller is left waiting.
    pub async fn stop(self) {
        for task in self.tasks {
            let name = task.name();
            task.stop().await;
            self.logger.debug(&format!("Stopped background task {}", name));
        }
        self.use_case.shutdown();
        self.logger.info("Suggestion pipeline shut down");
    }
}

impl DependencyContainer {
    pub async fn new(config: &AppConfig) -> anyhow::Result<Self> {
        let logger: Arc<dyn Logger> = Arc::new(TracingLogger::new("suggestions"));
        let clock = Arc::new(SystemClock);

        // Infrastructure adapters
        let openai_client = OpenAIClient::new(
            config.openai.api_key.clone(),
            config.openai.base_url.clone(),
            config.openai.model.clone(),
            config.openai.timeout,
        );
        let completion: Arc<dyn SuggestionCompletionService> =
            Arc::new(SuggestionCompletionOpenAI::new(openai_client));
        let ai_enabled = completion.is_configured();
        if !ai_enabled {
            logger.warn("OPENAI_API_KEY is not set, all suggestions will be rule-based");
        }

        // Suggestion use case
        let generate_suggestion_use_case = Arc::new(GenerateSuggestionUseCaseImpl::new(
            completion,
            config.suggestion.settings.clone(),
            clock,
            logger.clone(),
        ));

        let tasks = generate_suggestion_use_case
            .background_tasks()
            .into_iter()
            .map(ScheduledTask::start)
            .collect();

        let health_api = crate::api::health::routes::Api::new(ai_enabled);
        let suggestion_api =
            crate::api::suggestion::routes::SuggestionApi::new(generate_suggestion_use_case.clone());

        Ok(Self {
            health_api,
            suggestion_api,
            background: BackgroundTasks {
                tasks,
                use_case: generate_suggestion_use_case,
                logger,
            },
        })
    }
}
