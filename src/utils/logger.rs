use tracing_subscriber::{fmt, layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum LogFormat {
    /// 互動終端機用的精簡格式
    #[default]
    Compact,
    /// 給排程或無人值守的執行使用
    Json,
}

/// Directive used when `RUST_LOG` is not set. Other crates only log
/// warnings unless `verbose` is on.
pub fn default_directive(verbose: bool) -> &'static str {
    if verbose {
        "redalt_sync=debug,info"
    } else {
        "redalt_sync=info,warn"
    }
}

pub fn init_logger(verbose: bool, format: LogFormat) {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(default_directive(verbose)));

    let layer = fmt::layer()
        .with_target(false)
        .with_thread_ids(false)
        .with_file(false)
        .with_line_number(false);

    let registry = tracing_subscriber::registry().with(filter);
    match format {
        LogFormat::Compact => registry.with(layer.compact()).init(),
        LogFormat::Json => registry.with(layer.json()).init(),
    }
}
