//! Document session: load once, expose a ready flag.
//!
//! A load failure leaves the session permanently not-ready; no partial
//! state leaks out and the host is free to show an indefinite placeholder.

use pdf_reader_engine::{DocumentHandle, OpenSource, PdfEngine};

pub struct DocumentSession {
    doc: Option<DocumentHandle>,
    page_count: u32,
}

impl DocumentSession {
    pub fn open(engine: &mut dyn PdfEngine, source: OpenSource) -> Self {
        let loaded = engine
            .load(source)
            .and_then(|doc| engine.page_count(doc).map(|count| (doc, count)));

        match loaded {
            Ok((doc, page_count)) => Self {
                doc: Some(doc),
                page_count,
            },
            Err(err) => {
                tracing::warn!(error = %err, "document load failed; session stays not-ready");
                Self {
                    doc: None,
                    page_count: 0,
                }
            }
        }
    }

    pub fn is_ready(&self) -> bool {
        self.doc.is_some()
    }

    pub fn handle(&self) -> Option<DocumentHandle> {
        self.doc
    }

    /// Zero until the document is ready.
    pub fn page_count(&self) -> u32 {
        self.page_count
    }
}
