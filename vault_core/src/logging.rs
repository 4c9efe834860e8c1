// Logger setup for hosts and test harnesses.
//
// The core only writes through the `log` facade. Replans log at debug,
// search expansions and collision hits at trace, dubious level data at warn.
// A host without a logger of its own passes `CoreConfig::log_filter` to
// `init`. Directives from `RUST_LOG` are applied after the configured ones,
// so they win for any target both name.
//
// Timestamps are left out: two replays of the same level then produce the
// same log text, which makes desync reports diffable.

use env_logger::Builder;

/// Environment variable layered over the configured filter.
pub const FILTER_ENV: &str = "RUST_LOG";

/// Logger builder for `filter`, in env_logger directive syntax
/// (`"info,vault_core::pathfinder=trace"`).
pub fn builder(filter: &str) -> Builder {
    let mut builder = Builder::new();
    builder
        .parse_filters(filter)
        .format_timestamp(None)
        .format_module_path(true);
    if let Ok(overrides) = std::env::var(FILTER_ENV) {
        builder.parse_filters(&overrides);
    }
    builder
}

/// Install the global logger. Returns `false` if one was already installed.
pub fn init(filter: &str) -> bool {
    builder(filter).try_init().is_ok()
}
