use std::fs;
use std::io::IsTerminal;
use std::sync::Arc;

use quarry_host::QueryHost;
use quarry_storage::fixture::HistoryFixture;
use quarry_storage::{InMemoryBackend, Store};
use quarry_vm::test_utils::ScriptedRuntime;
use tracing::{Level, info, warn};
use tracing_subscriber::{EnvFilter, filter::Directive, fmt, layer::SubscriberExt, util::SubscriberInitExt};

use crate::cli::{LogColor, Options};

pub fn init_tracing(opts: &Options) {
    let log_filter = EnvFilter::builder()
        .with_default_directive(Directive::from(opts.log_level))
        .from_env_lossy();

    let use_color = match opts.log_color {
        LogColor::Always => true,
        LogColor::Never => false,
        LogColor::Auto => std::io::stdout().is_terminal(),
    };
    let include_target = matches!(opts.log_level, Level::DEBUG | Level::TRACE);

    let fmt_layer = fmt::layer()
        .with_target(include_target)
        .with_ansi(use_color);

    tracing_subscriber::registry()
        .with(log_filter)
        .with(fmt_layer)
        .init();
}

pub fn init_store(opts: &Options) -> Result<Store, Box<dyn std::error::Error>> {
    let backend = InMemoryBackend::new();
    if let Some(path) = &opts.fixture {
        let text = fs::read_to_string(path)?;
        let fixture: HistoryFixture = serde_json::from_str(&text)?;
        fixture.load_into(&backend)?;
        info!(
            path = %path.display(),
            blocks = fixture.blocks.len(),
            action_traces = fixture.action_traces.len(),
            accounts = fixture.accounts.len(),
            "loaded history fixture"
        );
    } else {
        warn!("no fixture provided; serving an empty history (every request will fail)");
    }
    Ok(Store::new(backend))
}

pub fn init_query_host(opts: &Options, store: Store) -> Arc<QueryHost> {
    // Dev runtime: with no interpreter linked, every module behaves as the
    // canonical echo-query guest (input blob -> query_database -> output).
    // Wire a real GuestRuntime here to execute the on-disk modules.
    let runtime = Arc::new(ScriptedRuntime::echo_query());
    Arc::new(QueryHost::new(
        store,
        runtime,
        opts.wasm_dir.clone(),
        opts.console,
    ))
}
