//! Tracing subscriber setup for the command-line front end
//!
//! The library only emits events; this module is the one place a
//! subscriber gets installed.

use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter, Registry};

/// Output format for tracing events
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TracingFormat {
    /// Coloured compact output (default for the CLI)
    Console,
    /// Compact output without ANSI colours, for CI logs
    Compact,
    /// One JSON object per event
    #[cfg(feature = "tracing-json")]
    Json,
}

/// Tracing configuration builder
#[derive(Debug, Clone)]
pub struct TracingConfig {
    /// Verbosity level (number of `-v` flags)
    pub verbosity: u8,
    pub format: TracingFormat,
    /// Explicit filter directive, overrides `verbosity`
    pub env_filter: Option<String>,
}

impl Default for TracingConfig {
    fn default() -> Self {
        Self {
            verbosity: 0,
            format: TracingFormat::Console,
            env_filter: None,
        }
    }
}

impl TracingConfig {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    #[must_use]
    pub fn with_verbosity(mut self, verbosity: u8) -> Self {
        self.verbosity = verbosity;
        self
    }

    #[must_use]
    pub fn with_format(mut self, format: TracingFormat) -> Self {
        self.format = format;
        self
    }

    #[must_use]
    pub fn with_env_filter<S: Into<String>>(mut self, filter: S) -> Self {
        self.env_filter = Some(filter.into());
        self
    }

    /// Filter directive for the configured verbosity
    #[must_use]
    pub fn verbosity_to_filter(&self) -> &'static str {
        match self.verbosity {
            0 => "warn,media_cascade=info",
            1 => "info,media_cascade=debug",
            _ => "debug,media_cascade=trace",
        }
    }

    /// Install the global subscriber
    ///
    /// # Errors
    /// - Invalid filter directive
    /// - A global subscriber is already installed
    pub fn init(self) -> anyhow::Result<()> {
        use tracing_subscriber::fmt;

        let filter = match &self.env_filter {
            Some(directive) => EnvFilter::try_new(directive)?,
            None => EnvFilter::try_new(self.verbosity_to_filter())?,
        };
        let registry = Registry::default().with(filter);

        match self.format {
            TracingFormat::Console => {
                let layer = fmt::layer()
                    .with_ansi(true)
                    .with_target(false)
                    .with_writer(std::io::stderr)
                    .compact();
                registry.with(layer).try_init()?;
            },
            TracingFormat::Compact => {
                let layer = fmt::layer()
                    .with_ansi(false)
                    .with_target(false)
                    .with_writer(std::io::stderr)
                    .compact();
                registry.with(layer).try_init()?;
            },
            #[cfg(feature = "tracing-json")]
            TracingFormat::Json => {
                let layer = fmt::layer()
                    .json()
                    .with_current_span(true)
                    .with_span_list(true)
                    .with_writer(std::io::stderr);
                registry.with(layer).try_init()?;
            },
        }

        Ok(())
    }
}

/// Initialize tracing with CLI defaults
///
/// `RUST_LOG`, when set, takes precedence over the verbosity flags.
///
/// # Errors
/// Same as [`TracingConfig::init`].
pub fn init_cli_tracing(verbosity: u8) -> anyhow::Result<()> {
    let mut config = TracingConfig::new().with_verbosity(verbosity);
    if let Ok(directive) = std::env::var(EnvFilter::DEFAULT_ENV) {
        if !directive.trim().is_empty() {
            config = config.with_env_filter(directive);
        }
    }
    config.init()
}

/// Span helpers for the CLI commands
pub mod spans {
    use tracing::{Level, Span};

    pub fn transform(operation: &str, input: &std::path::Path) -> Span {
        tracing::span!(
            Level::INFO,
            "transform",
            operation = %operation,
            input = %input.display()
        )
    }

    pub fn download(url: &str) -> Span {
        tracing::span!(Level::INFO, "download", url = %url)
    }
}
