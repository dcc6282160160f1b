//! Latest-wins guard for asynchronous image previews
//!
//! A form session may start several compressions (the user re-selects a
//! file before the first finishes, or abandons the form). Each start takes
//! a ticket; only a result carrying the most recent ticket is applied.
//! `reset` ends the session and invalidates every outstanding ticket.

use crate::services::{EncodedImage, MediaError};

/// Identifies one compression request
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PreviewTicket(u64);

/// What happened to an offered result
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PreviewUpdate {
    /// Result belonged to the latest request and is now the preview
    Applied,
    /// A newer request was issued (or the session was reset); discarded
    Stale,
}

/// Preview slot for one form session
#[derive(Debug, Default)]
pub struct ImagePreview {
    latest: u64,
    current: Option<EncodedImage>,
}

impl ImagePreview {
    pub fn new() -> Self {
        Self::default()
    }

    /// Start a new request; supersedes every earlier ticket
    pub fn issue(&mut self) -> PreviewTicket {
        self.latest += 1;
        PreviewTicket(self.latest)
    }

    pub fn is_current(&self, ticket: PreviewTicket) -> bool {
        ticket.0 == self.latest
    }

    /// Offer a finished compression
    ///
    /// Stale results are dropped, errors included. A current error clears
    /// the preview and is handed back for reporting.
    pub fn offer(
        &mut self,
        ticket: PreviewTicket,
        result: Result<EncodedImage, MediaError>,
    ) -> Result<PreviewUpdate, MediaError> {
        if !self.is_current(ticket) {
            tracing::debug!(ticket = ticket.0, latest = self.latest, "Discarding stale preview");
            return Ok(PreviewUpdate::Stale);
        }

        match result {
            Ok(image) => {
                self.current = Some(image);
                Ok(PreviewUpdate::Applied)
            }
            Err(e) => {
                self.current = None;
                Err(e)
            }
        }
    }

    pub fn current(&self) -> Option<&EncodedImage> {
        self.current.as_ref()
    }

    /// Take the preview for submission, ending the session
    pub fn take(&mut self) -> Option<EncodedImage> {
        self.latest += 1;
        self.current.take()
    }

    /// Abandon the session: clear the preview and invalidate all tickets
    pub fn reset(&mut self) {
        self.latest += 1;
        self.current = None;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn image(tag: &str) -> EncodedImage {
        EncodedImage {
            data_url: format!("data:image/jpeg;base64,{}", tag),
            width: 1,
            height: 1,
        }
    }

    #[test]
    fn test_latest_result_applies() {
        let mut preview = ImagePreview::new();
        let ticket = preview.issue();
        assert_eq!(preview.offer(ticket, Ok(image("a"))).unwrap(), PreviewUpdate::Applied);
        assert_eq!(preview.current().unwrap().data_url, "data:image/jpeg;base64,a");
    }

    #[test]
    fn test_late_result_for_older_request_is_discarded() {
        let mut preview = ImagePreview::new();
        let first = preview.issue();
        let second = preview.issue();

        assert_eq!(preview.offer(second, Ok(image("new"))).unwrap(), PreviewUpdate::Applied);
        assert_eq!(preview.offer(first, Ok(image("old"))).unwrap(), PreviewUpdate::Stale);
        assert_eq!(preview.current().unwrap().data_url, "data:image/jpeg;base64,new");
    }

    #[test]
    fn test_stale_error_is_swallowed() {
        let mut preview = ImagePreview::new();
        let first = preview.issue();
        let _second = preview.issue();

        let result = preview.offer(first, Err(MediaError::CorruptImage("bad".to_string())));
        assert_eq!(result.unwrap(), PreviewUpdate::Stale);
    }

    #[test]
    fn test_current_error_clears_preview() {
        let mut preview = ImagePreview::new();
        let first = preview.issue();
        preview.offer(first, Ok(image("a"))).unwrap();

        let second = preview.issue();
        let result = preview.offer(second, Err(MediaError::Unreadable("gone".to_string())));
        assert!(matches!(result, Err(MediaError::Unreadable(_))));
        assert!(preview.current().is_none());
    }

    #[test]
    fn test_reset_invalidates_outstanding_tickets() {
        let mut preview = ImagePreview::new();
        let ticket = preview.issue();
        preview.reset();

        assert!(!preview.is_current(ticket));
        assert_eq!(preview.offer(ticket, Ok(image("late"))).unwrap(), PreviewUpdate::Stale);
        assert!(preview.current().is_none());
    }

    #[test]
    fn test_take_ends_session() {
        let mut preview = ImagePreview::new();
        let ticket = preview.issue();
        preview.offer(ticket, Ok(image("a"))).unwrap();

        assert!(preview.take().is_some());
        assert!(preview.current().is_none());
        assert_eq!(preview.offer(ticket, Ok(image("b"))).unwrap(), PreviewUpdate::Stale);
    }
}
