#![forbid(unsafe_code)]

//! JSONL report of a harness session.
//!
//! One JSON object per line, each with a sequence number, the run id, and
//! an `event` tag:
//!
//! | `event` | Emitted |
//! |---------|---------|
//! | `session.start` | once, when the reporter is attached |
//! | `pass` | after every annotation pass |
//! | `annotation` | once per annotation added by a pass |
//! | `teardown` | once, with the records nobody matched |

use std::fs::File;
use std::io::{BufWriter, Write};
use std::path::Path;

use serde::Serialize;

use locshot_a11y::{AnnotationElement, NodeId};
use locshot_i18n::LocalizationRecord;

use crate::annotate::AnnotationPass;
use crate::error::Result;
use crate::session::TeardownReport;

#[derive(Debug, Serialize)]
#[serde(tag = "event")]
pub enum ReportEvent<'a> {
    #[serde(rename = "session.start")]
    SessionStart {
        store_capacity: usize,
        expire_after_passes: Option<u32>,
        lookup_method: &'a str,
    },
    #[serde(rename = "pass")]
    Pass {
        pass: u64,
        visited: usize,
        skipped: usize,
        candidates: usize,
        annotations: usize,
        expired: usize,
        pending: usize,
    },
    #[serde(rename = "annotation")]
    Annotation {
        pass: u64,
        parent: NodeId,
        node: NodeId,
        #[serde(flatten)]
        element: &'a AnnotationElement,
    },
    #[serde(rename = "teardown")]
    Teardown {
        passes: u64,
        matched: usize,
        dropped: u64,
        expired: u64,
        unmatched: &'a [LocalizationRecord],
    },
}

#[derive(Serialize)]
struct Line<'a> {
    seq: u64,
    run_id: &'a str,
    #[serde(flatten)]
    event: &'a ReportEvent<'a>,
}

/// Writes [`ReportEvent`]s as JSON lines.
pub struct JsonlReporter<W: Write> {
    writer: W,
    run_id: String,
    seq: u64,
}

impl JsonlReporter<BufWriter<File>> {
    /// Create (or truncate) `path`.
    pub fn create(path: impl AsRef<Path>, run_id: impl Into<String>) -> Result<Self> {
        Ok(Self::new(BufWriter::new(File::create(path)?), run_id))
    }
}

impl<W: Write> JsonlReporter<W> {
    pub fn new(writer: W, run_id: impl Into<String>) -> Self {
        Self {
            writer,
            run_id: run_id.into(),
            seq: 0,
        }
    }

    pub fn run_id(&self) -> &str {
        &self.run_id
    }

    /// Number of lines written so far.
    pub fn emitted(&self) -> u64 {
        self.seq
    }

    pub fn emit(&mut self, event: &ReportEvent<'_>) -> Result<()> {
        let line = Line {
            seq: self.seq,
            run_id: &self.run_id,
            event,
        };
        serde_json::to_writer(&mut self.writer, &line)?;
        self.writer.write_all(b"\n")?;
        self.seq += 1;
        Ok(())
    }

    /// A `pass` line followed by one `annotation` line per annotation.
    pub fn emit_pass(&mut self, index: u64, pass: &AnnotationPass, pending: usize) -> Result<()> {
        self.emit(&ReportEvent::Pass {
            pass: index,
            visited: pass.visited,
            skipped: pass.skipped,
            candidates: pass.candidates,
            annotations: pass.annotations.len(),
            expired: pass.expired,
            pending,
        })?;
        for placed in &pass.annotations {
            self.emit(&ReportEvent::Annotation {
                pass: index,
                parent: placed.parent,
                node: placed.node,
                element: &placed.element,
            })?;
        }
        Ok(())
    }

    pub fn emit_teardown(&mut self, report: &TeardownReport) -> Result<()> {
        self.emit(&ReportEvent::Teardown {
            passes: report.passes,
            matched: report.matched.len(),
            dropped: report.dropped,
            expired: report.expired,
            unmatched: &report.unmatched,
        })?;
        self.flush()
    }

    pub fn flush(&mut self) -> Result<()> {
        self.writer.flush()?;
        Ok(())
    }

    pub fn into_inner(self) -> W {
        self.writer
    }
}

impl<W: Write> std::fmt::Debug for JsonlReporter<W> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("JsonlReporter")
            .field("run_id", &self.run_id)
            .field("seq", &self.seq)
            .finish()
    }
}
