//! JSON Lines telemetry replay and recording.
//!
//! One [`TelemetryFrame`] per line. Blank lines are skipped; a malformed
//! line is reported with its 1-based line number and does not stop the
//! iterator.

use std::fs::File;
use std::io::{BufRead, BufReader, BufWriter, Write};
use std::path::Path;
use std::sync::Arc;

use contracts::GapError;
use tracing::{debug, warn};

use crate::frame::TelemetryFrame;
use crate::counters::IngestionMetrics;

/// Iterator over the frames of a recording
pub struct TelemetryReplay<R> {
    lines: std::io::Lines<R>,
    line_no: usize,
    metrics: Arc<IngestionMetrics>,
}

impl TelemetryReplay<BufReader<File>> {
    /// Open a recording on disk
    pub fn open(path: &Path) -> Result<Self, GapError> {
        let file = File::open(path)?;
        debug!(path = %path.display(), "opened telemetry recording");
        Ok(Self::from_reader(BufReader::new(file)))
    }
}

impl<R: BufRead> TelemetryReplay<R> {
    pub fn from_reader(reader: R) -> Self {
        Self {
            lines: reader.lines(),
            line_no: 0,
            metrics: Arc::new(IngestionMetrics::new()),
        }
    }

    /// Share counters with the caller
    pub fn with_metrics(mut self, metrics: Arc<IngestionMetrics>) -> Self {
        self.metrics = metrics;
        self
    }

    pub fn metrics(&self) -> &Arc<IngestionMetrics> {
        &self.metrics
    }

    /// Line number of the last line read
    pub fn line_no(&self) -> usize {
        self.line_no
    }
}

impl<R: BufRead> Iterator for TelemetryReplay<R> {
    type Item = Result<TelemetryFrame, GapError>;

    fn next(&mut self) -> Option<Self::Item> {
        loop {
            let line = match self.lines.next()? {
                Ok(line) => line,
                Err(e) => return Some(Err(GapError::Io(e))),
            };
            self.line_no += 1;

            if line.trim().is_empty() {
                self.metrics.record_blank_line();
                continue;
            }

            return Some(match serde_json::from_str::<TelemetryFrame>(&line) {
                Ok(frame) => {
                    self.metrics.record_read();
                    Ok(frame)
                }
                Err(e) => {
                    self.metrics.record_parse_error();
                    warn!(line = self.line_no, error = %e, "malformed telemetry frame");
                    Err(GapError::telemetry_parse(self.line_no, e.to_string()))
                }
            });
        }
    }
}

/// Writes frames as JSON Lines
pub struct TelemetryRecorder<W: Write> {
    writer: W,
    metrics: Arc<IngestionMetrics>,
}

impl TelemetryRecorder<BufWriter<File>> {
    /// Create (or truncate) a recording on disk
    pub fn create(path: &Path) -> Result<Self, GapError> {
        let file = File::create(path)?;
        debug!(path = %path.display(), "created telemetry recording");
        Ok(Self::new(BufWriter::new(file)))
    }
}

impl<W: Write> TelemetryRecorder<W> {
    pub fn new(writer: W) -> Self {
        Self {
            writer,
            metrics: Arc::new(IngestionMetrics::new()),
        }
    }

    pub fn with_metrics(mut self, metrics: Arc<IngestionMetrics>) -> Self {
        self.metrics = metrics;
        self
    }

    /// Append one frame
    pub fn record(&mut self, frame: &TelemetryFrame) -> Result<(), GapError> {
        serde_json::to_writer(&mut self.writer, frame).map_err(|e| GapError::TelemetryWrite {
            message: e.to_string(),
        })?;
        self.writer.write_all(b"\n")?;
        self.metrics.record_written();
        Ok(())
    }

    pub fn flush(&mut self) -> Result<(), GapError> {
        self.writer.flush()?;
        Ok(())
    }

    pub fn frames_written(&self) -> u64 {
        self.metrics.snapshot().frames_written
    }

    /// Flush and return the underlying writer
    pub fn into_inner(mut self) -> Result<W, GapError> {
        self.writer.flush()?;
        Ok(self.writer)
    }
}
