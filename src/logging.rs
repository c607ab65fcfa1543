use std::sync::Once;


/// `env_filter` uses `env_logger` filter syntax, e.g. "info" or "gl_tutorials=debug".
/// Falls back to `RUST_LOG`, then to info level.
#[derive(Debug, Clone)]
pub struct LoggingConfig {
	pub env_filter: Option<String>,
	pub write_style: env_logger::WriteStyle,
}

impl Default for LoggingConfig {
	fn default() -> Self {
		LoggingConfig {
			env_filter: None,
			write_style: env_logger::WriteStyle::Auto,
		}
	}
}


static INIT: Once = Once::new();

/// Installs the global logger. Later calls are ignored.
pub fn init_logging(config: LoggingConfig) {
	INIT.call_once(|| {
		let mut builder = env_logger::Builder::new();

		if let Some(filter) = config.env_filter {
			builder.parse_filters(&filter);
		} else if let Ok(filter) = std::env::var("RUST_LOG") {
			builder.parse_filters(&filter);
		} else {
			builder.filter_level(log::LevelFilter::Info);
		}

		builder.write_style(config.write_style);

		// Another logger may already be installed
		if builder.try_init().is_ok() {
			log::debug!("logging initialised");
		}
	});
}
