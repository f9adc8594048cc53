use crate::models::{AnalysisResult, ConversationSet, OperationStep, Profile};
use parking_lot::RwLock;
use std::sync::Arc;
use thiserror::Error;

#[derive(Debug, Error, PartialEq, Eq)]
pub enum SessionError {
    #[error("Another operation is already in progress: {0:?}")]
    Busy(OperationStep),
}

/// Progress of the current (or last) long-running operation
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Progress {
    pub in_progress: bool,
    pub step: Option<OperationStep>,
    pub message: Option<String>,
}

#[derive(Debug, Default)]
struct Session {
    profiles: Option<Arc<Vec<Profile>>>,
    conversations: Option<Arc<ConversationSet>>,
    analysis: Option<Arc<AnalysisResult>>,
    progress: Progress,
}

/// Read-only view of the session at one point in time
#[derive(Debug, Clone, Default)]
pub struct SessionSnapshot {
    pub profiles: Option<Arc<Vec<Profile>>>,
    pub conversations: Option<Arc<ConversationSet>>,
    pub analysis: Option<Arc<AnalysisResult>>,
    pub progress: Progress,
}

/// In-memory state shared by all request handlers
///
/// Data is swapped in whole behind `Arc`s so readers never hold the lock
/// while serializing. Only one operation may mutate the session at a time.
#[derive(Debug, Default)]
pub struct SessionStore {
    inner: RwLock<Session>,
}

impl SessionStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Claim the operation gate for `step`
    pub fn try_begin(
        &self,
        step: OperationStep,
        message: impl Into<String>,
    ) -> Result<OperationGuard<'_>, SessionError> {
        let mut session = self.inner.write();

        if session.progress.in_progress {
            let running = session.progress.step.unwrap_or(step);
            return Err(SessionError::Busy(running));
        }

        session.progress = Progress {
            in_progress: true,
            step: Some(step),
            message: Some(message.into()),
        };

        tracing::debug!("Started {:?}", step);

        Ok(OperationGuard {
            store: self,
            step,
            finished: false,
        })
    }

    pub fn snapshot(&self) -> SessionSnapshot {
        let session = self.inner.read();
        SessionSnapshot {
            profiles: session.profiles.clone(),
            conversations: session.conversations.clone(),
            analysis: session.analysis.clone(),
            progress: session.progress.clone(),
        }
    }

    pub fn progress(&self) -> Progress {
        self.inner.read().progress.clone()
    }

    pub fn profiles(&self) -> Option<Arc<Vec<Profile>>> {
        self.inner.read().profiles.clone()
    }

    pub fn conversations(&self) -> Option<Arc<ConversationSet>> {
        self.inner.read().conversations.clone()
    }

    pub fn analysis(&self) -> Option<Arc<AnalysisResult>> {
        self.inner.read().analysis.clone()
    }

    /// Drop all data; refused while an operation is running
    pub fn reset(&self) -> Result<(), SessionError> {
        let mut session = self.inner.write();

        if session.progress.in_progress {
            let running = session
                .progress
                .step
                .unwrap_or(OperationStep::GenerateProfiles);
            return Err(SessionError::Busy(running));
        }

        *session = Session {
            progress: Progress {
                in_progress: false,
                step: None,
                message: Some("Application reset".to_string()),
            },
            ..Session::default()
        };

        tracing::info!("Session reset");
        Ok(())
    }
}

/// Exclusive right to mutate the session, released on drop
#[must_use = "the operation ends as soon as the guard is dropped"]
pub struct OperationGuard<'a> {
    store: &'a SessionStore,
    step: OperationStep,
    finished: bool,
}

impl OperationGuard<'_> {
    pub fn step(&self) -> OperationStep {
        self.step
    }

    /// Update the progress message shown by the status route
    pub fn report(&self, message: impl Into<String>) {
        self.store.inner.write().progress.message = Some(message.into());
    }

    /// Store new profiles; everything derived from the old ones is discarded
    pub fn set_profiles(&self, profiles: Vec<Profile>) -> Arc<Vec<Profile>> {
        let profiles = Arc::new(profiles);
        let mut session = self.store.inner.write();
        session.profiles = Some(profiles.clone());
        session.conversations = None;
        session.analysis = None;
        profiles
    }

    /// Store new conversations; the previous analysis is discarded
    pub fn set_conversations(&self, conversations: ConversationSet) -> Arc<ConversationSet> {
        let conversations = Arc::new(conversations);
        let mut session = self.store.inner.write();
        session.conversations = Some(conversations.clone());
        session.analysis = None;
        conversations
    }

    pub fn set_analysis(&self, analysis: AnalysisResult) -> Arc<AnalysisResult> {
        let analysis = Arc::new(analysis);
        self.store.inner.write().analysis = Some(analysis.clone());
        analysis
    }

    pub fn finish(mut self, message: impl Into<String>) {
        self.release(message.into());
    }

    pub fn fail(mut self, message: impl Into<String>) {
        let message = message.into();
        tracing::warn!("{:?} failed: {}", self.step, message);
        self.release(message);
    }

    fn release(&mut self, message: String) {
        let mut session = self.store.inner.write();
        session.progress.in_progress = false;
        session.progress.message = Some(message);
        self.finished = true;
        tracing::debug!("Finished {:?}", self.step);
    }
}

impl Drop for OperationGuard<'_> {
    fn drop(&mut self) {
        if !self.finished {
            self.release(format!("{:?} was interrupted", self.step));
        }
    }
}
