//! Trace Printer - Debug output of exported spans
//!
//! Not intended for production use at high throughput.
//!
//! # Example Output
//!
//! ```text
//! # text
//! shop/checkout http GET /user/1234 route=/user/:id status=200 pid=4242 1.250ms
//!
//! # counter
//! exported 128 spans (+32)
//! ```

use std::io::{self, Write};
use std::time::Duration;

use tokio::time::{Interval, MissedTickBehavior};
use tokio_util::sync::CancellationToken;
use vigil_config::{PrinterConfig, PrinterMode};
use vigil_pipeline::Subscription;
use vigil_protocol::{Span, SpanBatch};

/// Prints spans from a subscription to a writer
pub struct TracePrinter<W = io::Stdout> {
    mode: PrinterMode,
    interval: Duration,
    out: W,
    spans: u64,
    reported: u64,
}

impl TracePrinter<io::Stdout> {
    /// Printer writing to stdout
    pub fn stdout(config: &PrinterConfig) -> Self {
        Self::with_writer(config, io::stdout())
    }
}

impl<W: Write + Send + 'static> TracePrinter<W> {
    pub fn with_writer(config: &PrinterConfig, out: W) -> Self {
        Self {
            mode: config.mode,
            interval: config.interval,
            out,
            spans: 0,
            reported: 0,
        }
    }

    pub fn mode(&self) -> PrinterMode {
        self.mode
    }

    /// Spans seen so far
    pub fn spans(&self) -> u64 {
        self.spans
    }

    /// Print a batch according to the mode
    pub fn print(&mut self, batch: &SpanBatch) -> io::Result<()> {
        self.spans += batch.len() as u64;
        match self.mode {
            PrinterMode::Disabled | PrinterMode::Counter => Ok(()),
            PrinterMode::Text => {
                for span in batch {
                    writeln!(self.out, "{}", format_text(span))?;
                }
                self.out.flush()
            }
            PrinterMode::Json => {
                for span in batch {
                    serde_json::to_writer(&mut self.out, span)?;
                    self.out.write_all(b"\n")?;
                }
                self.out.flush()
            }
        }
    }

    /// Write the counter line if spans arrived since the last one
    pub fn report(&mut self) -> io::Result<()> {
        if self.spans == self.reported {
            return Ok(());
        }
        writeln!(
            self.out,
            "exported {} spans (+{})",
            self.spans,
            self.spans - self.reported
        )?;
        self.reported = self.spans;
        self.out.flush()
    }

    /// Print until cancelled or the subscription closes
    pub async fn run(mut self, mut input: Subscription<SpanBatch>, cancel: CancellationToken) -> W {
        tracing::info!(mode = self.mode.as_str(), input = input.topic(), "trace printer starting");

        let counting = self.mode == PrinterMode::Counter;
        let mut ticker = counting.then(|| {
            let mut ticker = tokio::time::interval(self.interval);
            ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);
            ticker
        });

        loop {
            tokio::select! {
                biased;
                _ = cancel.cancelled() => break,
                _ = next_tick(&mut ticker) => {
                    if let Err(e) = self.report() {
                        tracing::warn!(error = %e, "trace printer output failed");
                        break;
                    }
                }
                batch = input.recv() => match batch {
                    Some(batch) => {
                        if let Err(e) = self.print(&batch) {
                            tracing::warn!(error = %e, "trace printer output failed");
                            break;
                        }
                    }
                    None => break,
                },
            }
        }

        if counting && let Err(e) = self.report() {
            tracing::debug!(error = %e, "final counter report failed");
        }
        tracing::info!(spans = self.spans, "trace printer stopped");
        self.out
    }
}

/// Next tick of the counter ticker; never resolves without one
async fn next_tick(ticker: &mut Option<Interval>) {
    match ticker {
        Some(ticker) => {
            ticker.tick().await;
        }
        None => std::future::pending().await,
    }
}

/// One-line human-readable rendering of a span
pub fn format_text(span: &Span) -> String {
    let mut line = String::with_capacity(96);
    if span.service.name.is_empty() {
        line.push('-');
    } else {
        line.push_str(&span.service.to_string());
    }
    line.push(' ');
    line.push_str(span.kind.as_str());
    if !span.method.is_empty() {
        line.push(' ');
        line.push_str(&span.method);
    }
    line.push(' ');
    line.push_str(&span.path);
    if !span.route.is_empty() {
        line.push_str(" route=");
        line.push_str(&span.route);
    }
    if span.status != 0 {
        line.push_str(&format!(" status={}", span.status));
    }
    if span.pid != 0 {
        line.push_str(&format!(" pid={}", span.pid));
    }
    let duration = span.duration_ns();
    if duration > 0 {
        line.push_str(&format!(" {:.3}ms", duration as f64 / 1_000_000.0));
    }
    line
}

#[cfg(test)]
#[path = "printer_test.rs"]
mod tests;
