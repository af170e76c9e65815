//! Background asset fetching
//!
//! Fetches run on a small tokio runtime and report back over a channel that
//! the UI thread drains once per frame. Every request is fire-and-forget.

use std::sync::mpsc::{self, Receiver, Sender};
use std::sync::Arc;

use anyhow::{Context, Result};

use crate::browser::BrowserEvent;
use crate::core::assets::AssetSource;
use crate::core::modal::MarkupTicket;

/// Called after a result is queued so the UI can wake up
pub type Notify = Arc<dyn Fn() + Send + Sync>;

pub struct Fetcher {
    runtime: tokio::runtime::Runtime,
    source: Arc<dyn AssetSource>,
    catalog_path: String,
    event_tx: Sender<BrowserEvent>,
    event_rx: Receiver<BrowserEvent>,
    notify: Notify,
}

impl Fetcher {
    pub fn new(
        source: Arc<dyn AssetSource>,
        catalog_path: impl Into<String>,
        notify: Notify,
    ) -> Result<Self> {
        let runtime = tokio::runtime::Builder::new_multi_thread()
            .worker_threads(1)
            .thread_name("docshelf-fetch")
            .build()
            .context("Failed to start fetch runtime")?;

        let (event_tx, event_rx) = mpsc::channel();

        Ok(Self {
            runtime,
            source,
            catalog_path: catalog_path.into(),
            event_tx,
            event_rx,
            notify,
        })
    }

    pub fn source(&self) -> &Arc<dyn AssetSource> {
        &self.source
    }

    /// Fetch the catalog payload
    pub fn fetch_catalog(&self) {
        tracing::info!("Fetching catalog: {}", self.catalog_path);
        let path = self.catalog_path.clone();
        self.spawn(move |source| {
            BrowserEvent::CatalogFetched(source.fetch_text(&path).map_err(|e| e.to_string()))
        });
    }

    /// Fetch a markdown document for a preview ticket
    pub fn fetch_markup(&self, ticket: MarkupTicket, file: String) {
        tracing::debug!("Fetching markdown {} for {:?}", file, ticket);
        self.spawn(move |source| BrowserEvent::MarkupFetched {
            ticket,
            result: source.fetch_text(&file).map_err(|e| e.to_string()),
        });
    }

    fn spawn<F>(&self, job: F)
    where
        F: FnOnce(&dyn AssetSource) -> BrowserEvent + Send + 'static,
    {
        let source = Arc::clone(&self.source);
        let event_tx = self.event_tx.clone();
        let notify = Arc::clone(&self.notify);

        self.runtime.spawn_blocking(move || {
            let event = job(&*source);
            if event_tx.send(event).is_err() {
                tracing::debug!("Fetch finished after the receiver closed");
                return;
            }
            notify();
        });
    }

    /// Take every result that has arrived so far
    pub fn drain(&self) -> Vec<BrowserEvent> {
        self.event_rx.try_iter().collect()
    }

    /// Block until the next result arrives
    #[cfg(test)]
    pub fn recv_timeout(&self, timeout: std::time::Duration) -> Option<BrowserEvent> {
        self.event_rx.recv_timeout(timeout).ok()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::time::Duration;

    use crate::browser::{Browser, Command, Effect};
    use crate::core::assets::tests::serve_once;
    use crate::core::assets::FsAssetSource;
    use crate::core::catalog::DocumentRecord;
    use crate::core::debounce::ManualClock;
    use crate::core::markup::{CommonMarkConverter, MarkupBlock};
    use crate::core::modal::{ContentArea, ModalState, PreviewRequest};

    const TIMEOUT: Duration = Duration::from_secs(5);

    fn fetcher(root: &std::path::Path, wakeups: Arc<AtomicUsize>) -> Fetcher {
        let notify: Notify = Arc::new(move || {
            wakeups.fetch_add(1, Ordering::SeqCst);
        });
        Fetcher::new(Arc::new(FsAssetSource::new(root)), "data/docs.json", notify).unwrap()
    }

    #[test]
    fn test_catalog_fetch_reports_payload() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::create_dir_all(dir.path().join("data")).unwrap();
        std::fs::write(dir.path().join("data/docs.json"), "[]").unwrap();

        let wakeups = Arc::new(AtomicUsize::new(0));
        let fetcher = fetcher(dir.path(), Arc::clone(&wakeups));
        fetcher.fetch_catalog();

        assert_eq!(
            fetcher.recv_timeout(TIMEOUT),
            Some(BrowserEvent::CatalogFetched(Ok("[]".to_string())))
        );
        // The wakeup follows the send, give it a moment
        for _ in 0..50 {
            if wakeups.load(Ordering::SeqCst) == 1 {
                break;
            }
            std::thread::sleep(Duration::from_millis(10));
        }
        assert_eq!(wakeups.load(Ordering::SeqCst), 1);
    }

    #[test]
    fn test_missing_catalog_reports_error() {
        let dir = tempfile::tempdir().unwrap();
        let fetcher = fetcher(dir.path(), Arc::new(AtomicUsize::new(0)));
        fetcher.fetch_catalog();

        match fetcher.recv_timeout(TIMEOUT) {
            Some(BrowserEvent::CatalogFetched(Err(message))) => {
                assert!(message.contains("docs.json"))
            }
            other => panic!("unexpected event: {:?}", other),
        }
    }

    #[test]
    fn test_markup_fetch_carries_ticket() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(dir.path().join("n.md"), "# Notes").unwrap();

        let mut modal = ModalState::new();
        let PreviewRequest::FetchMarkup { ticket, file } =
            modal.open(DocumentRecord::new("Notes", "Eng", "2024-02-01", "n.md"))
        else {
            panic!("expected markup request");
        };

        let fetcher = fetcher(dir.path(), Arc::new(AtomicUsize::new(0)));
        fetcher.fetch_markup(ticket, file);

        assert_eq!(
            fetcher.recv_timeout(TIMEOUT),
            Some(BrowserEvent::MarkupFetched {
                ticket,
                result: Ok("# Notes".to_string()),
            })
        );
        assert!(fetcher.drain().is_empty());
    }

    fn open_markdown(browser: &mut Browser<ManualClock>, fetcher: &Fetcher) {
        let Some(Effect::FetchMarkup { ticket, file }) = browser.dispatch(Command::OpenDocument(0))
        else {
            panic!("expected markup fetch");
        };
        fetcher.fetch_markup(ticket, file);
        let event = fetcher.recv_timeout(TIMEOUT).expect("markup result");
        browser.handle_event(event);
    }

    fn loaded_browser(file: &str) -> Browser<ManualClock> {
        let mut browser = Browser::with_clock(ManualClock::new(), Box::new(CommonMarkConverter));
        browser.start();
        let payload = format!(
            r#"[{{"title": "Notes", "category": "Eng", "date": "2024-02-01", "file": "{}"}}]"#,
            file
        );
        browser.handle_event(BrowserEvent::CatalogFetched(Ok(payload)));
        browser
    }

    #[test]
    fn test_remote_markdown_reaches_rendered_content() {
        let base = serve_once("200 OK", "# Remote notes\n".as_bytes());
        let dir = tempfile::tempdir().unwrap();
        let fetcher = fetcher(dir.path(), Arc::new(AtomicUsize::new(0)));
        let mut browser = loaded_browser(&format!("{}/notes.md", base));

        open_markdown(&mut browser, &fetcher);

        assert!(browser.modal().is_open());
        let ContentArea::Rendered(blocks) = browser.modal().content() else {
            panic!("expected rendered content, got {:?}", browser.modal().content());
        };
        assert!(matches!(blocks[0], MarkupBlock::Heading { level: 1, .. }));
    }

    #[test]
    fn test_non_utf8_markdown_still_renders() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(dir.path().join("g.md"), b"# \xb1\xea\xcc\xe2\n").unwrap();
        let fetcher = fetcher(dir.path(), Arc::new(AtomicUsize::new(0)));
        let mut browser = loaded_browser("g.md");

        open_markdown(&mut browser, &fetcher);

        let ContentArea::Rendered(blocks) = browser.modal().content() else {
            panic!("expected rendered content, got {:?}", browser.modal().content());
        };
        assert!(matches!(blocks[0], MarkupBlock::Heading { level: 1, .. }));
    }
}
