use log::info;

use crate::document::StyledDocument;
use crate::error::SessionError;
use crate::modification::Modification;
use crate::style::diff;
use crate::style::snapshot::StyleSnapshot;

/// A live recording: the baseline snapshot taken when recording started.
///
/// Stopping consumes the session, so a baseline can never be reused or overlap another.
#[derive(Debug)]
pub struct RecordingSession {
    baseline: StyleSnapshot,
}

impl RecordingSession {
    pub fn start<D: StyledDocument + ?Sized>(document: &D) -> Self {
        let baseline = StyleSnapshot::capture(document);
        info!(
            "recording started on {} ({} rules)",
            document.url(),
            baseline.len()
        );
        RecordingSession { baseline }
    }

    pub fn baseline(&self) -> &StyleSnapshot {
        &self.baseline
    }

    /// Captures the document again and turns everything new into a modification.
    ///
    /// The modification is created even when nothing changed; its `changes` are then empty.
    pub fn stop<D: StyledDocument + ?Sized>(self, document: &D) -> Modification {
        let current = StyleSnapshot::capture(document);
        let blocks = diff::new_rules(&self.baseline, &current);
        info!(
            "recording stopped on {}: {} new rule(s)",
            document.url(),
            blocks.len()
        );
        Modification::new(document.url(), blocks.join("\n"))
    }
}

/// The two-state recorder for hosts that drive start and stop from separate events.
#[derive(Debug, Default)]
pub struct StyleRecorder {
    session: Option<RecordingSession>,
}

impl StyleRecorder {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn is_recording(&self) -> bool {
        self.session.is_some()
    }

    pub fn start_recording<D: StyledDocument + ?Sized>(
        &mut self,
        document: &D,
    ) -> Result<(), SessionError> {
        if self.session.is_some() {
            return Err(SessionError::AlreadyRecording);
        }
        self.session = Some(RecordingSession::start(document));
        Ok(())
    }

    pub fn stop_recording<D: StyledDocument + ?Sized>(
        &mut self,
        document: &D,
    ) -> Result<Modification, SessionError> {
        let session = self.session.take().ok_or(SessionError::NotRecording)?;
        Ok(session.stop(document))
    }
}
