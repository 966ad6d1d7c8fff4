use std::io::{self, Write};

use tracing_subscriber::{
    fmt::{self, MakeWriter, format::FmtSpan},
    layer::SubscriberExt,
    util::SubscriberInitExt,
    EnvFilter,
};

use crate::config::{LogLevel, LoggingConfig};
use crate::infrastructure::sanitizer::sanitize_str;

/// Initialize the global subscriber. Output goes to stderr through the
/// sanitizer; stdout is reserved for the MCP transport.
pub fn init_logging(config: &LoggingConfig) {
    let parsed = config.level.parse::<LogLevel>();
    let level = parsed.clone().unwrap_or_default();

    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(level.as_filter()));
    let writer = SanitizingMakeWriter::new(io::stderr);

    if config.structured {
        tracing_subscriber::registry()
            .with(filter)
            .with(
                fmt::layer()
                    .json()
                    .with_writer(writer)
                    .with_span_events(FmtSpan::CLOSE),
            )
            .init();
    } else {
        tracing_subscriber::registry()
            .with(filter)
            .with(
                fmt::layer()
                    .pretty()
                    .with_ansi(false)
                    .with_target(true)
                    .with_writer(writer),
            )
            .init();
    }

    if let Err(reason) = parsed {
        tracing::warn!(%reason, "Falling back to log level INFO");
    }

    tracing::info!(
        level = %level,
        structured = config.structured,
        "Logging initialized"
    );
}

/// [`MakeWriter`] that masks sensitive spans in every formatted event
#[derive(Debug, Clone)]
pub struct SanitizingMakeWriter<M> {
    inner: M,
}

impl<M> SanitizingMakeWriter<M> {
    pub fn new(inner: M) -> Self {
        Self { inner }
    }
}

impl<'a, M> MakeWriter<'a> for SanitizingMakeWriter<M>
where
    M: MakeWriter<'a>,
{
    type Writer = SanitizingWriter<M::Writer>;

    fn make_writer(&'a self) -> Self::Writer {
        SanitizingWriter::new(self.inner.make_writer())
    }
}

/// Buffers one formatted event and writes its sanitized form on flush or drop
pub struct SanitizingWriter<W: Write> {
    inner: W,
    buffer: Vec<u8>,
}

impl<W: Write> SanitizingWriter<W> {
    pub fn new(inner: W) -> Self {
        Self {
            inner,
            buffer: Vec::new(),
        }
    }

    fn drain(&mut self) -> io::Result<()> {
        if self.buffer.is_empty() {
            return Ok(());
        }

        let text = String::from_utf8_lossy(&self.buffer);
        let sanitized = sanitize_str(&text);
        self.inner.write_all(sanitized.as_bytes())?;
        self.buffer.clear();

        Ok(())
    }
}

impl<W: Write> Write for SanitizingWriter<W> {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        self.buffer.extend_from_slice(buf);
        Ok(buf.len())
    }

    fn flush(&mut self) -> io::Result<()> {
        self.drain()?;
        self.inner.flush()
    }
}

impl<W: Write> Drop for SanitizingWriter<W> {
    fn drop(&mut self) {
        let _ = self.flush();
    }
}
