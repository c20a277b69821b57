//! # shinbun
//!
//! Slack channel digest: syncs the configured channels into SQLite, asks a
//! completion model for a newspaper-style summary, prints it and mails it.

#![deny(unsafe_code)]

mod mailer;
mod since;

use std::path::PathBuf;
use std::sync::Arc;

use anyhow::{Context, Result};
use chrono::{TimeDelta, Utc};
use clap::Parser;
use secrecy::SecretString;
use tracing::{info, warn};

use shinbun_core::{ChatApi, Delivery, Focus, SyncStore};
use shinbun_engine::{
    AssemblerConfig, ChannelResolver, DigestRunner, FetchConfig, HistoryFetcher, PromptAssembler,
    RateLimitPolicy, ResolverConfig, SyncPipeline, WatermarkStore,
};
use shinbun_llm::{OpenAiConfig, OpenAiDigestClient, ReliableConfig, ReliableDigestClient};
use shinbun_settings::{load_settings, load_settings_from_path, ChannelGroup, RunMode, Settings};
use shinbun_slack::{SlackClient, SlackConfig};
use shinbun_store::{Database, SqliteSyncStore};
use shinbun_telemetry::{init_telemetry, LogFormat, TelemetryConfig};

use crate::mailer::{SmtpConfig, SmtpDelivery, StdoutDelivery};

/// Summarize recent Slack activity.
#[derive(Parser, Debug)]
#[command(name = "shinbun", about = "Slack channel digest")]
struct Cli {
    /// Digest focus: `default` or `support`. Also picks the channel list.
    #[arg(long, default_value = "default")]
    focus: String,

    /// Fetch from this point instead of the stored watermark:
    /// `YYYY-MM-DD` or a duration such as `24h`, `7d`, `1h30m`.
    #[arg(long, value_name = "DATE|DURATION")]
    from_date: Option<String>,

    /// Print every visible channel and exit.
    #[arg(long)]
    list_channels: bool,

    /// Print the digest without mailing it.
    #[arg(long)]
    dry_run: bool,

    /// Settings file (defaults to `~/.shinbun/settings.json`).
    #[arg(long)]
    config: Option<PathBuf>,

    /// SQLite database path (overrides settings).
    #[arg(long)]
    db: Option<PathBuf>,

    /// Log line format on stderr.
    #[arg(long, default_value = "json")]
    log_format: LogFormat,
}

fn channel_group(focus: &str) -> ChannelGroup {
    match Focus::from_name(focus) {
        Some(Focus::Support) => ChannelGroup::Support,
        Some(Focus::Default) => ChannelGroup::Default,
        None => {
            warn!(focus, "unknown focus, using default channels");
            ChannelGroup::Default
        }
    }
}

fn rate_limit(settings: &Settings) -> RateLimitPolicy {
    RateLimitPolicy {
        backoff: settings.sync.rate_limit_backoff(),
        max_retries: settings.sync.max_rate_limit_retries,
    }
}

fn build_pipeline(
    settings: &Settings,
    api: Arc<dyn ChatApi>,
    store: Arc<dyn SyncStore>,
) -> Result<SyncPipeline> {
    let sync = &settings.sync;
    let resolver = ChannelResolver::new(
        Arc::clone(&api),
        Arc::clone(&store),
        ResolverConfig {
            page_size: sync.directory_page_size,
            page_delay: sync.directory_page_delay(),
            rate_limit: rate_limit(settings),
        },
    );
    let fetcher = HistoryFetcher::new(
        api,
        FetchConfig {
            page_size: sync.history_page_size,
            page_delay: sync.page_delay(),
            rate_limit: rate_limit(settings),
        },
    );
    let lookback = TimeDelta::try_days(i64::from(sync.default_lookback_days))
        .context("sync.defaultLookbackDays is out of range")?;
    let history_window = TimeDelta::try_days(i64::from(sync.history_window_days))
        .context("sync.historyWindowDays is out of range")?;
    let watermarks = WatermarkStore::new(Arc::clone(&store), lookback);
    Ok(SyncPipeline::new(resolver, fetcher, watermarks, store, history_window))
}

async fn list_channels(pipeline: &SyncPipeline) -> Result<()> {
    let channels = pipeline
        .resolver()
        .list_all()
        .await
        .context("failed to list channels")?;
    println!("Available channels ({}):", channels.len());
    for c in &channels {
        let kind = if c.is_private { "Private" } else { "Public" };
        println!("- {} (ID: {}, Type: {})", c.name, c.id, kind);
    }
    Ok(())
}

fn digest_client(settings: &Settings) -> Result<ReliableDigestClient<OpenAiDigestClient>> {
    let openai = &settings.openai;
    let api_key = openai.api_key.clone().context("openai.apiKey is not set")?;
    let client = OpenAiDigestClient::new(OpenAiConfig {
        api_key: SecretString::from(api_key),
        base_url: openai.base_url.clone(),
        model: openai.model.clone(),
        temperature: openai.temperature,
        max_tokens: openai.max_tokens,
    })
    .context("failed to build OpenAI client")?;
    Ok(ReliableDigestClient::new(
        client,
        ReliableConfig {
            max_retries: openai.max_retries,
            ..ReliableConfig::default()
        },
    ))
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    init_telemetry(&TelemetryConfig {
        format: cli.log_format,
        ..TelemetryConfig::default()
    })
    .context("failed to initialise logging")?;

    let settings = match &cli.config {
        Some(path) => load_settings_from_path(path),
        None => load_settings(),
    }
    .context("failed to load settings")?;

    let group = channel_group(&cli.focus);
    let mode = if cli.list_channels {
        RunMode::ListChannels
    } else {
        RunMode::Digest(group)
    };
    settings.validate_for(mode).context("incomplete settings")?;

    let since_override = cli
        .from_date
        .as_deref()
        .map(|s| since::parse_from_date(s, Utc::now()))
        .transpose()?;

    let db_path = match cli.db.clone() {
        Some(path) => path,
        None => settings
            .database
            .resolved_path()
            .context("failed to resolve database path")?,
    };
    let db = Database::open(&db_path)
        .with_context(|| format!("failed to open database {}", db_path.display()))?;
    let store = Arc::new(SqliteSyncStore::new(db));

    let token = settings.slack.bot_token.clone().context("slack.botToken is not set")?;
    let slack = SlackClient::new(SlackConfig {
        token: SecretString::from(token),
        api_base: settings.slack.api_base.clone(),
    })
    .context("failed to build Slack client")?;

    let pipeline = build_pipeline(&settings, Arc::new(slack), store)?;

    if cli.list_channels {
        return list_channels(&pipeline).await;
    }

    let channels = settings.channels.group(group).to_vec();
    info!(focus = %cli.focus, channels = channels.len(), since = ?since_override, "starting sync");
    let report = pipeline.sync_channels(&channels, since_override).await;
    for skipped in &report.skipped {
        warn!(channel = %skipped.name, error = %skipped.error, "channel was not synced");
    }
    info!(
        processed = report.processed.len(),
        skipped = report.skipped.len(),
        saved = report.saved(),
        "sync complete"
    );

    if report.messages.is_empty() {
        println!("No new messages found");
        return Ok(());
    }

    let client = Arc::new(digest_client(&settings)?);
    let runner = DigestRunner::new(
        PromptAssembler::new(AssemblerConfig {
            token_budget: settings.digest.token_budget,
        }),
        client.clone(),
    );
    let digest = runner
        .run(&report.messages, &cli.focus, Utc::now())
        .await
        .context("failed to generate digest")?;
    info!(
        generated = digest.generated,
        model_retries = client.total_retries(),
        "digest ready"
    );

    println!("{}", digest.body);

    if !digest.generated {
        info!("nothing was summarized, skipping delivery");
        return Ok(());
    }

    let delivery: Box<dyn Delivery> = if cli.dry_run {
        Box::new(StdoutDelivery)
    } else {
        Box::new(SmtpDelivery::new(SmtpConfig::from(&settings.email)))
    };
    runner
        .deliver(&digest, delivery.as_ref())
        .await
        .context("failed to deliver digest")?;
    Ok(())
}
