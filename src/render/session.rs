//! Page sessions
//!
//! A `PageSession` owns one browser tab for the duration of a single render
//! operation. Callers close it explicitly with [`PageSession::close`]; if the
//! owning future is dropped first (request cancelled, panic) the `Drop` impl
//! schedules the close on the runtime so the tab never outlives the request.

use std::ops::Deref;

use super::backend::PageBackend;

pub struct PageSession {
    page: Option<Box<dyn PageBackend>>,
    runtime: Option<tokio::runtime::Handle>,
}

impl PageSession {
    pub fn new(page: Box<dyn PageBackend>) -> Self {
        Self {
            page: Some(page),
            runtime: tokio::runtime::Handle::try_current().ok(),
        }
    }

    /// Close the tab, consuming the session. Failures are only logged.
    pub async fn close(mut self) {
        if let Some(page) = self.page.take() {
            if let Err(e) = page.close().await {
                tracing::warn!(error = %e, "Failed to close page session");
            } else {
                tracing::trace!("Page session closed");
            }
        }
    }
}

impl Deref for PageSession {
    type Target = dyn PageBackend;

    fn deref(&self) -> &Self::Target {
        // Only `close` and `drop` take the page out, and both consume the session.
        match self.page.as_deref() {
            Some(page) => page,
            None => unreachable!("page session used after close"),
        }
    }
}

impl Drop for PageSession {
    fn drop(&mut self) {
        let Some(page) = self.page.take() else {
            return;
        };
        match &self.runtime {
            Some(handle) => {
                handle.spawn(async move {
                    if let Err(e) = page.close().await {
                        tracing::warn!(error = %e, "Deferred page close failed");
                    }
                });
            }
            None => tracing::warn!("Page session dropped outside a runtime; tab left to the browser"),
        }
    }
}
