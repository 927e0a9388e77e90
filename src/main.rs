use std::sync::Arc;

use futures::StreamExt;
use secrecy::SecretString;

use fare_scout::affiliate::LinkBuilder;
use fare_scout::channels::cli::CliTransport;
use fare_scout::channels::telegram::TelegramTransport;
use fare_scout::channels::ChatTransport;
use fare_scout::config::AppConfig;
use fare_scout::flow::{Event, FlowEngine};
use fare_scout::leads::{LeadSink, LogLeadSink, TelegramLeadSink};
use fare_scout::providers::aviasales::AviasalesAdapter;
use fare_scout::providers::travelpayouts::TravelpayoutsAdapter;
use fare_scout::providers::ProviderAdapter;
use fare_scout::search::SearchOrchestrator;
use fare_scout::session::SessionStore;
use fare_scout::tier::DisabledPayments;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Initialize tracing
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info")),
        )
        .with_target(false)
        .init();

    let config = AppConfig::from_env()?;

    let client = reqwest::Client::builder()
        .timeout(config.provider_timeout + std::time::Duration::from_secs(40))
        .build()?;

    // ── Providers ────────────────────────────────────────────────────────
    let mut adapters: Vec<Arc<dyn ProviderAdapter>> = Vec::new();
    if let Ok(token) = std::env::var("TRAVELPAYOUTS_TOKEN") {
        adapters.push(Arc::new(TravelpayoutsAdapter::new(
            client.clone(),
            SecretString::from(token),
            &config,
        )));
    }
    if let Ok(token) = std::env::var("AVIASALES_TOKEN") {
        adapters.push(Arc::new(AviasalesAdapter::new(
            client.clone(),
            SecretString::from(token),
            &config,
        )));
    }
    if adapters.is_empty() {
        tracing::warn!(
            "no provider tokens set (TRAVELPAYOUTS_TOKEN, AVIASALES_TOKEN); every search will come back empty"
        );
    }
    eprintln!("✈️  Fare Scout v{}", env!("CARGO_PKG_VERSION"));
    eprintln!("   Providers: {}", adapters.len());

    let orchestrator = SearchOrchestrator::new(adapters);

    // ── Sessions ─────────────────────────────────────────────────────────
    let sessions = Arc::new(SessionStore::new());
    {
        let sessions = Arc::clone(&sessions);
        let ttl = config.session_idle_timeout;
        tokio::spawn(async move {
            let mut tick = tokio::time::interval(std::time::Duration::from_secs(300));
            loop {
                tick.tick().await;
                let pruned = sessions.prune_idle(ttl).await;
                if pruned > 0 {
                    tracing::debug!(pruned, "pruned idle sessions");
                }
            }
        });
    }

    let links = LinkBuilder::new(
        config.affiliate_marker.clone(),
        config.affiliate_sub_id.clone(),
        config.currency.clone(),
        config.locale.clone(),
    );

    let bot_token = std::env::var("BOT_TOKEN").ok();

    // ── Leads ────────────────────────────────────────────────────────────
    let leads: Arc<dyn LeadSink> = match (
        &bot_token,
        std::env::var("MANAGERS_CHAT_ID")
            .ok()
            .and_then(|v| v.parse::<i64>().ok()),
    ) {
        (Some(token), Some(chat_id)) => {
            eprintln!("   Leads: telegram chat {chat_id}");
            Arc::new(TelegramLeadSink::new(client.clone(), token.clone(), chat_id))
        }
        _ => {
            eprintln!("   Leads: log only (set BOT_TOKEN and MANAGERS_CHAT_ID to forward)");
            Arc::new(LogLeadSink)
        }
    };

    let gate = Arc::new(DisabledPayments::new(
        config.service_fee_amount,
        config.currency.clone(),
    ));

    let engine = Arc::new(FlowEngine::new(
        orchestrator,
        sessions,
        links,
        gate,
        leads,
        config,
    ));

    // ── Transport ────────────────────────────────────────────────────────
    let transport: Arc<dyn ChatTransport> = match bot_token {
        Some(token) => {
            eprintln!("   Transport: telegram\n");
            Arc::new(TelegramTransport::new(token, client))
        }
        None => {
            eprintln!("   Transport: cli (set BOT_TOKEN for Telegram)\n");
            Arc::new(CliTransport::new())
        }
    };

    if let Err(e) = transport.health_check().await {
        tracing::error!("transport health check failed: {e}");
        return Err(e.into());
    }

    let mut events = transport.start().await?;
    tracing::info!(transport = transport.name(), "event loop started");

    while let Some(incoming) = events.next().await {
        let engine = Arc::clone(&engine);
        let transport = Arc::clone(&transport);
        tokio::spawn(async move {
            // Searches take a while; let the user see we are on it.
            if matches!(incoming.event, Event::DateChosen(_)) {
                if let Err(e) = transport.notify_busy(&incoming).await {
                    tracing::debug!("notify_busy failed: {e}");
                }
            }
            let reply = engine.handle(&incoming.user, incoming.event.clone()).await;
            if reply.is_silent() {
                return;
            }
            if let Err(e) = transport.deliver(&incoming, reply).await {
                tracing::warn!(user = %incoming.user.id, "failed to deliver reply: {e}");
            }
        });
    }

    tracing::info!("event stream ended, shutting down");
    Ok(())
}
