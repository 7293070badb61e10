//! Per-dispatch view handed to a callback alongside the event.

use std::sync::{
    Arc,
    atomic::{AtomicBool, Ordering},
};

use compact_str::CompactString;
use smallvec::SmallVec;

use component_id::{ComponentId, DELIMITER, split_segments};

use super::{
    entry::{Attributes, CallbackEntry},
    store::CallbackStore,
};

pub struct CallbackContext {
    component_id: ComponentId,
    callback_id: CompactString,
    entry: Arc<CallbackEntry>,
    store: CallbackStore,
    valid: AtomicBool,
}

impl CallbackContext {
    pub(crate) fn new(
        component_id: ComponentId,
        entry: Arc<CallbackEntry>,
        store: CallbackStore,
    ) -> Self {
        Self {
            callback_id: component_id.identity().into(),
            component_id,
            entry,
            store,
            valid: AtomicBool::new(true),
        }
    }

    /// Wire form of the interacted component's id.
    #[must_use]
    pub fn component_id(&self) -> String {
        self.component_id.to_string()
    }

    #[must_use]
    pub fn callback_id(&self) -> &str {
        &self.callback_id
    }

    #[must_use]
    pub fn payload(&self) -> Option<&str> {
        self.component_id.payload()
    }

    /// Payload split on `delimiter`; empty when there is no payload.
    #[must_use]
    pub fn payload_parts(&self, delimiter: &str) -> SmallVec<[&str; 4]> {
        self.payload()
            .map(|data| split_segments(data, delimiter))
            .unwrap_or_default()
    }

    /// Payload split on the wire delimiter.
    #[must_use]
    pub fn payload_segments(&self) -> SmallVec<[&str; 4]> {
        let mut buf = [0_u8; 4];
        self.payload_parts(DELIMITER.encode_utf8(&mut buf))
    }

    #[must_use]
    pub fn attributes(&self) -> &Attributes {
        self.entry.attributes()
    }

    #[must_use]
    pub fn attribute<T: std::any::Any>(&self, key: &str) -> Option<&T> {
        self.entry.attributes().get(key)
    }

    #[must_use]
    pub fn attribute_or<'a, T: std::any::Any>(&'a self, key: &str, default: &'a T) -> &'a T {
        self.attribute(key).unwrap_or(default)
    }

    /// Remove the callback so later interactions see it as expired.
    ///
    /// Returns whether this call removed it; repeated calls are no-ops.
    pub async fn invalidate(&self) -> bool {
        if self.valid.swap(false, Ordering::AcqRel) {
            self.store.remove(&self.callback_id).await
        } else {
            false
        }
    }

    #[must_use]
    pub fn is_valid(&self) -> bool {
        self.valid.load(Ordering::Acquire) && self.entry.has_remaining_invocations()
    }

    /// `None` when the callback is bounded only by its TTL.
    #[must_use]
    pub fn remaining_invocations(&self) -> Option<u32> {
        self.entry.remaining_invocations()
    }
}

impl std::fmt::Debug for CallbackContext {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CallbackContext")
            .field("component_id", &self.component_id)
            .field("valid", &self.valid.load(Ordering::Relaxed))
            .finish_non_exhaustive()
    }
}
