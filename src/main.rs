//! Lottery console entrypoint: bootstraps an activity session from an access
//! key and hydrates the person and prize caches.

use std::{env, sync::Arc};

use anyhow::Context;
use tokio::time::sleep;
use tracing::{error, info, warn};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use lottery_console::{
    config::AppConfig,
    dao::{
        activity_api::http::{HttpActivityApi, HttpApiConfig},
        kv::FileKvStore,
        session_store::SessionStore,
    },
    services::session_service::{self, BootstrapOutcome},
    state::{ConsoleState, SharedState},
};

const ACCESS_KEY_ENV: &str = "LOTTERY_ACCESS_KEY";

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    init_tracing();

    let config = AppConfig::load();
    let session = SessionStore::new(Arc::new(FileKvStore::new(config.session_file.clone())));
    let api = HttpActivityApi::new(
        HttpApiConfig::new(config.api_base_url.clone()).with_timeout(config.request_timeout),
        session.clone(),
    )
    .context("building activity API client")?;

    let state = ConsoleState::new(config, session, Arc::new(api));
    let access_key = env::args()
        .nth(1)
        .or_else(|| env::var(ACCESS_KEY_ENV).ok())
        .filter(|key| !key.is_empty());

    match session_service::bootstrap(&state, access_key.as_deref()).await {
        Ok(BootstrapOutcome::Ready { scope_id, summary }) => {
            info!(
                scope_id,
                persons = summary.persons,
                winners = summary.winners,
                prizes = summary.prizes,
                "console ready"
            );
            log_overview(&state).await;
            Ok(())
        }
        Ok(BootstrapOutcome::NotApplicable) => {
            info!("no access key supplied; bootstrap not applicable");
            match session_service::resume(&state).await {
                Ok(Some(summary)) => {
                    info!(
                        persons = summary.persons,
                        prizes = summary.prizes,
                        "resumed stored session"
                    );
                    log_overview(&state).await;
                    Ok(())
                }
                Ok(None) => {
                    warn!("no stored session; pass an access key or set {ACCESS_KEY_ENV}");
                    Ok(())
                }
                Err(err) => Err(err).context("resuming stored session"),
            }
        }
        Err(err) => {
            let delay = state.config().redirect_delay;
            error!(error = %err, ?delay, "bootstrap failed; redirecting to the home view");
            sleep(delay).await;
            info!("redirected to the home view");
            Err(err).context("bootstrapping console session")
        }
    }
}

/// Log one line per cached prize plus roster totals.
async fn log_overview(state: &SharedState) {
    {
        let roster = state.persons().await;
        info!(
            total = roster.len(),
            signed_in = roster.signed_in().count(),
            winners = roster.winners().count(),
            "roster"
        );
    }

    let board = state.prizes().await;
    for prize in board.iter() {
        info!(
            prize_id = prize.id,
            name = %prize.name,
            total = prize.total_count,
            used = prize.used_count,
            exhausted = prize.exhausted,
            buckets = prize.allocation.buckets.len(),
            "prize"
        );
    }
}

/// Configure tracing subscribers so logs include spans by default.
fn init_tracing() {
    let env_filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| "info,lottery_console=debug".into());
    tracing_subscriber::registry()
        .with(env_filter)
        .with(tracing_subscriber::fmt::layer())
        .init();
}
