use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;

use tokio_util::sync::CancellationToken;
use warp::Filter;

use crate::config::Config;
use crate::logging::LogConfig;
use crate::providers::{ChatStreamProvider, GeminiProvider, OpenAiProvider, PromptProvider};
use crate::server::handle_rejection;
use crate::server::routes::create_routes;

pub struct RelayServer {
    pub config: Config,
    pub stream_provider: Arc<dyn ChatStreamProvider>,
    pub prompt_provider: Arc<dyn PromptProvider>,
    /// Root of every per-request token; cancelled on shutdown.
    pub shutdown: CancellationToken,
}

impl RelayServer {
    pub fn new(config: Config) -> Result<Self, Box<dyn std::error::Error>> {
        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(config.request_timeout_seconds))
            .pool_max_idle_per_host(32)
            .pool_idle_timeout(Duration::from_secs(90))
            .tcp_keepalive(Duration::from_secs(60))
            .build()?;

        let stream_provider = Arc::new(OpenAiProvider::new(
            client.clone(),
            &config.openai_base_url,
            config.openai_api_key.clone(),
            &config.openai_model,
        ));
        let prompt_provider = Arc::new(GeminiProvider::new(
            client,
            &config.gemini_base_url,
            config.gemini_api_key.clone(),
            &config.gemini_model,
        ));

        Ok(Self::with_providers(config, stream_provider, prompt_provider))
    }

    pub fn with_providers(
        config: Config,
        stream_provider: Arc<dyn ChatStreamProvider>,
        prompt_provider: Arc<dyn PromptProvider>,
    ) -> Self {
        Self {
            config,
            stream_provider,
            prompt_provider,
            shutdown: CancellationToken::new(),
        }
    }

    pub async fn run(self) -> Result<(), Box<dyn std::error::Error>> {
        let addr: SocketAddr = self.config.listen.parse()?;
        let server = Arc::new(self);

        let routes = create_routes(server.clone()).recover(handle_rejection);

        let cors = warp::cors()
            .allow_any_origin()
            .allow_headers(vec!["Content-Type", "Accept", "Origin", "X-Requested-With"])
            .allow_methods(vec!["GET", "POST", "OPTIONS"]);

        let routes_with_cors = routes.with(cors);

        if LogConfig::get().debug_enabled {
            log::info!("starting chat relay on {} (debug mode)", addr);
        } else {
            log::info!("starting chat relay on {}", addr);
        }
        log_provider(
            "stream",
            server.stream_provider.name(),
            server.stream_provider.model(),
            server.stream_provider.has_credentials(),
        );
        log_provider(
            "buffered",
            server.prompt_provider.name(),
            server.prompt_provider.model(),
            server.prompt_provider.has_credentials(),
        );

        tokio::select! {
            _ = warp::serve(routes_with_cors).run(addr) => {}
            result = tokio::signal::ctrl_c() => {
                result?;
                log::info!("shutdown requested, cancelling in-flight requests");
                server.shutdown.cancel();
            }
        }

        Ok(())
    }
}

fn log_provider(route: &str, name: &str, model: &str, has_credentials: bool) {
    if has_credentials {
        log::info!("{} chat: {} ({})", route, name, model);
    } else {
        log::warn!(
            "{} chat: {} ({}) has no api key, requests will fail",
            route,
            name,
            model
        );
    }
}
