//! Contracts with the hosting gateway: inbound interaction events and the
//! component-disable side effect.

use std::{any::Any, fmt, sync::Arc};

use async_trait::async_trait;

use crate::error::DisableError;

/// An inbound component interaction delivered by the gateway.
///
/// Implemented by the host around its own event type; handlers that need the
/// concrete type downcast through [`InteractionEvent::as_any`].
#[async_trait]
pub trait InteractionEvent: Send + Sync + fmt::Debug {
    /// Raw custom id of the clicked button, select menu or submitted modal.
    fn component_id(&self) -> &str;

    /// Whether the interaction has already been replied to or deferred.
    fn is_acknowledged(&self) -> bool;

    /// Reply visible only to the interacting user.
    async fn reply_ephemeral(&self, content: &str) -> anyhow::Result<()>;

    fn as_any(&self) -> &dyn Any;
}

pub type SharedEvent = Arc<dyn InteractionEvent>;

/// Channel and message carrying the components of a callback.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct MessageLocation {
    pub channel_id: u64,
    pub message_id: u64,
}

impl MessageLocation {
    /// `None` when either id is zero, the "no reference" value used by builders.
    #[must_use]
    pub const fn new(channel_id: u64, message_id: u64) -> Option<Self> {
        if channel_id == 0 || message_id == 0 {
            None
        } else {
            Some(Self {
                channel_id,
                message_id,
            })
        }
    }
}

impl fmt::Display for MessageLocation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}/{}", self.channel_id, self.message_id)
    }
}

/// Host side effect run when a callback with a message location is evicted:
/// disable every component on that message.
#[async_trait]
pub trait ComponentDisabler: Send + Sync {
    async fn disable_at(&self, location: MessageLocation) -> Result<(), DisableError>;
}
