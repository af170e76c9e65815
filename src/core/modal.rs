//! Preview modal state machine
//!
//! `Closed --open(doc)--> Open(markup | binary) --close()--> Closed`.
//! Markup previews finish asynchronously; each open hands out a ticket and a
//! fetched result is only injected when its ticket is still current.

use super::catalog::{DocumentKind, DocumentRecord};
use super::markup::MarkupBlock;

/// Literal shown when a markdown preview cannot be fetched
pub const MARKUP_LOAD_ERROR: &str = "无法加载 Markdown 文档。";

/// Identifies one markup fetch issued by `open`
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct MarkupTicket(u64);

/// Surface that displays binary documents natively
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ViewerSurface {
    /// What the viewer points at; `None` halts any rendering
    pub target: Option<String>,
    pub visible: bool,
}

/// Area holding converted markup
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub enum ContentArea {
    #[default]
    Hidden,
    /// Fetch in flight
    Loading,
    Rendered(Vec<MarkupBlock>),
    Failed(String),
}

/// Follow-up work requested by `open`
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PreviewRequest {
    /// Fetch the markup text for the given ticket
    FetchMarkup { ticket: MarkupTicket, file: String },
    /// Binary document is ready in the viewer
    ShowBinary { file: String },
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ModalState {
    /// Visibility and assistive hidden state are this one flag
    visible: bool,
    current: Option<DocumentRecord>,
    viewer: ViewerSurface,
    content: ContentArea,
    scroll_locked: bool,
    next_ticket: u64,
    pending: Option<MarkupTicket>,
}

impl ModalState {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn is_open(&self) -> bool {
        self.visible
    }

    /// Assistive-technology hidden flag, always the inverse of visibility
    #[allow(dead_code)]
    pub fn aria_hidden(&self) -> bool {
        !self.visible
    }

    pub fn current_document(&self) -> Option<&DocumentRecord> {
        self.current.as_ref()
    }

    pub fn viewer(&self) -> &ViewerSurface {
        &self.viewer
    }

    pub fn content(&self) -> &ContentArea {
        &self.content
    }

    /// Whether scrolling behind the modal is suspended
    pub fn scroll_locked(&self) -> bool {
        self.scroll_locked
    }

    /// Open (or re-target) the modal on `doc`
    pub fn open(&mut self, doc: DocumentRecord) -> PreviewRequest {
        let file = doc.file.clone();
        let request = match doc.kind() {
            DocumentKind::Markup => {
                self.viewer = ViewerSurface::default();
                self.content = ContentArea::Loading;

                self.next_ticket += 1;
                let ticket = MarkupTicket(self.next_ticket);
                self.pending = Some(ticket);
                PreviewRequest::FetchMarkup { ticket, file }
            }
            DocumentKind::Binary => {
                self.viewer = ViewerSurface {
                    target: Some(file.clone()),
                    visible: true,
                };
                self.content = ContentArea::Hidden;
                self.pending = None;
                PreviewRequest::ShowBinary { file }
            }
        };

        self.current = Some(doc);
        self.visible = true;
        self.scroll_locked = true;
        request
    }

    /// Inject a fetched markup result. Returns false when the result is stale
    /// (the modal closed or moved on to another document meanwhile).
    pub fn complete_markup(
        &mut self,
        ticket: MarkupTicket,
        result: Result<Vec<MarkupBlock>, String>,
    ) -> bool {
        if !self.visible || self.pending != Some(ticket) {
            return false;
        }

        self.pending = None;
        self.content = match result {
            Ok(blocks) => ContentArea::Rendered(blocks),
            Err(_) => ContentArea::Failed(MARKUP_LOAD_ERROR.to_string()),
        };
        true
    }

    /// Hide the modal and release everything it held. Closing a closed
    /// modal changes nothing.
    pub fn close(&mut self) -> bool {
        if !self.visible {
            return false;
        }

        self.visible = false;
        self.current = None;
        self.viewer = ViewerSurface::default();
        self.content = ContentArea::Hidden;
        self.scroll_locked = false;
        self.pending = None;
        true
    }
}
