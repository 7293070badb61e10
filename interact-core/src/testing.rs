//! In-memory host doubles for unit tests.

use std::{
    any::Any,
    sync::{
        Arc,
        atomic::{AtomicBool, Ordering},
    },
};

use async_trait::async_trait;
use parking_lot::Mutex;

use crate::{
    error::DisableError,
    event::{ComponentDisabler, InteractionEvent, MessageLocation, SharedEvent},
};

/// Event that records its ephemeral replies.
#[derive(Debug)]
pub struct RecordingEvent {
    component_id: String,
    acknowledged: AtomicBool,
    replies: Mutex<Vec<String>>,
}

impl RecordingEvent {
    pub fn new(component_id: impl Into<String>) -> Arc<Self> {
        Arc::new(Self {
            component_id: component_id.into(),
            acknowledged: AtomicBool::new(false),
            replies: Mutex::new(Vec::new()),
        })
    }

    /// Event the handler side already replied to or deferred.
    pub fn acknowledged(component_id: impl Into<String>) -> Arc<Self> {
        let event = Self::new(component_id);
        event.acknowledged.store(true, Ordering::Release);
        event
    }

    pub fn shared(self: &Arc<Self>) -> SharedEvent {
        Arc::clone(self) as SharedEvent
    }

    pub fn replies(&self) -> Vec<String> {
        self.replies.lock().clone()
    }

    pub fn acknowledge(&self) {
        self.acknowledged.store(true, Ordering::Release);
    }
}

#[async_trait]
impl InteractionEvent for RecordingEvent {
    fn component_id(&self) -> &str {
        &self.component_id
    }

    fn is_acknowledged(&self) -> bool {
        self.acknowledged.load(Ordering::Acquire)
    }

    async fn reply_ephemeral(&self, content: &str) -> anyhow::Result<()> {
        self.replies.lock().push(content.to_string());
        self.acknowledge();
        Ok(())
    }

    fn as_any(&self) -> &dyn Any {
        self
    }
}

/// Disabler that records every location it was asked to disable.
#[derive(Debug, Default)]
pub struct RecordingDisabler {
    calls: Mutex<Vec<MessageLocation>>,
    fail: bool,
}

impl RecordingDisabler {
    pub fn failing() -> Self {
        Self {
            calls: Mutex::new(Vec::new()),
            fail: true,
        }
    }

    pub fn calls(&self) -> Vec<MessageLocation> {
        self.calls.lock().clone()
    }
}

#[async_trait]
impl ComponentDisabler for RecordingDisabler {
    async fn disable_at(&self, location: MessageLocation) -> Result<(), DisableError> {
        self.calls.lock().push(location);
        if self.fail {
            Err(DisableError::MessageNotFound(location.message_id))
        } else {
            Ok(())
        }
    }
}
