//! Process settings from flags, environment and `.env`.

use std::time::Duration;

use actors::CoordinatorConfig;
use api::AppConfig;
use clap::Parser;
use db::DbConfig;
use llm::ChatConfig;

#[derive(Debug, Clone, Parser)]
#[command(name = "combinario", about = "Item combination game server")]
pub struct Settings {
    /// Database endpoint: `mem://`, `rocksdb://path` or `ws://host:port`.
    #[arg(long, env = "DB_URL", default_value = "mem://")]
    pub db_url: String,

    #[arg(long, env = "DB_NAMESPACE", default_value = "combinario")]
    pub db_namespace: String,

    #[arg(long, env = "DB_NAME", default_value = "main")]
    pub db_name: String,

    /// Root user for remote databases. Needs `DB_PASSWORD` as well.
    #[arg(long, env = "DB_USER")]
    pub db_user: Option<String>,

    #[arg(long, env = "DB_PASSWORD", hide_env_values = true)]
    pub db_password: Option<String>,

    /// OpenAI-compatible API root, up to and including `/v1`.
    #[arg(long, env = "LLM_BASE_URL", default_value = "http://localhost:8000/v1")]
    pub llm_base_url: String,

    #[arg(long, env = "LLM_MODEL", default_value = "llama-3.1-8b-instruct")]
    pub llm_model: String,

    #[arg(long, env = "OPENAI_API_KEY", default_value = "EMPTY", hide_env_values = true)]
    pub openai_api_key: String,

    #[arg(long, env = "MAX_TOKENS", default_value_t = 20)]
    pub max_tokens: u32,

    #[arg(long, env = "MODEL_TEMPERATURE", default_value_t = 0.7)]
    pub model_temperature: f32,

    /// Number of generation workers.
    #[arg(long, env = "WORKERS", default_value_t = 4)]
    pub workers: usize,

    #[arg(long, env = "JOB_TIMEOUT_SECS", default_value_t = 60)]
    pub job_timeout_secs: u64,

    /// How long finished jobs can be polled.
    #[arg(long, env = "JOB_RETENTION_SECS", default_value_t = 3600)]
    pub job_retention_secs: u64,

    /// Refuse new generation jobs once this many are waiting.
    #[arg(long, env = "MAX_PENDING_JOBS")]
    pub max_pending_jobs: Option<usize>,

    #[arg(long, env = "LISTEN_ADDR", default_value = "0.0.0.0:8000")]
    pub listen_addr: String,

    /// Insert the base elements on startup.
    #[arg(long, env = "SEED", default_value_t = true, action = clap::ArgAction::Set)]
    pub seed: bool,

    /// Log at debug level unless `RUST_LOG` says otherwise.
    #[arg(long, env = "DEBUG_MODE", default_value_t = false)]
    pub debug_mode: bool,

    /// Emit logs as JSON lines.
    #[arg(long, env = "JSON_LOGS", default_value_t = false)]
    pub json_logs: bool,
}

impl Settings {
    pub fn app_config(&self) -> anyhow::Result<AppConfig> {
        let mut db = DbConfig::endpoint(&self.db_url)
            .with_namespace(&self.db_namespace)
            .with_database(&self.db_name);
        match (&self.db_user, &self.db_password) {
            (Some(user), Some(password)) => db = db.with_credentials(user, password),
            (None, None) => {}
            _ => anyhow::bail!("DB_USER and DB_PASSWORD must be set together"),
        }

        if !(0.0..=2.0).contains(&self.model_temperature) {
            anyhow::bail!(
                "MODEL_TEMPERATURE must be between 0 and 2 (got {})",
                self.model_temperature
            );
        }
        let chat = ChatConfig::default()
            .with_base_url(&self.llm_base_url)
            .with_model(&self.llm_model)
            .with_api_key(&self.openai_api_key)
            .with_sampling(self.max_tokens, self.model_temperature);

        if self.workers == 0 {
            anyhow::bail!("WORKERS must be at least 1");
        }
        let coordinator = CoordinatorConfig::default()
            .with_workers(self.workers)
            .with_job_timeout(self.job_timeout_secs)
            .with_retention(Duration::from_secs(self.job_retention_secs))
            .with_max_pending(self.max_pending_jobs);

        Ok(AppConfig {
            db,
            chat,
            coordinator,
            seed: self.seed,
        })
    }
}
