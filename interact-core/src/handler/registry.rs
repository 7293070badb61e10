//! HandlerRegistry: durable handlers keyed by component kind
//!
//! - exact table per kind (`DashMap`), replaced bindings logged
//! - ordered prefix list per kind, copy-on-write through `ArcSwap`
//! - lookup only for stateless ids: exact first, then the first
//!   registered prefix that matches

use std::sync::Arc;

use arc_swap::ArcSwap;
use compact_str::CompactString;
use dashmap::DashMap;
use tracing::{debug, info, warn};

use component_id::{ComponentId, ComponentKind};

use super::{
    binding::{HandlerBinding, HandlerSource, HandlerSpec},
    extract::ParamSpec,
};

const KIND_COUNT: usize = ComponentKind::ALL.len();

type ExactTable = DashMap<CompactString, Arc<HandlerBinding>>;
type PatternList = ArcSwap<Vec<Arc<HandlerBinding>>>;

/// Owner label for handlers registered without a source.
pub const ANONYMOUS_OWNER: &str = "anonymous";

pub struct HandlerRegistry {
    exact: [ExactTable; KIND_COUNT],
    patterns: [PatternList; KIND_COUNT],
}

impl Default for HandlerRegistry {
    fn default() -> Self {
        Self::new()
    }
}

impl HandlerRegistry {
    pub fn new() -> Self {
        Self {
            exact: std::array::from_fn(|_| DashMap::new()),
            patterns: std::array::from_fn(|_| ArcSwap::from_pointee(Vec::new())),
        }
    }

    /// Register one handler outside any source.
    pub fn register(&self, spec: HandlerSpec) -> usize {
        self.register_owned(ANONYMOUS_OWNER, spec)
    }

    /// Register every handler a source declares; returns the binding count.
    pub fn register_handlers<S: HandlerSource>(&self, source: Arc<S>) -> usize {
        let owner: CompactString = source.source_name().into();
        let count: usize = source
            .handlers()
            .into_iter()
            .map(|spec| self.register_owned(&owner, spec))
            .sum();

        info!(
            marker = "HANDLER_REGISTRY",
            operation_type = "source_registered",
            source = %owner,
            bindings = count,
            "Registered handler source"
        );

        count
    }

    fn register_owned(&self, owner: &str, spec: HandlerSpec) -> usize {
        let params: Arc<[ParamSpec]> = Arc::from(spec.params.as_slice());
        let kinds = spec.target.kinds();

        for &kind in kinds {
            let binding = Arc::new(HandlerBinding::new(owner, &spec, kind, Arc::clone(&params)));

            if spec.pattern {
                self.patterns[kind.index()].rcu(|current| {
                    let mut next = Vec::with_capacity(current.len() + 1);
                    next.extend(current.iter().cloned());
                    next.push(Arc::clone(&binding));
                    next
                });
            } else if let Some(previous) =
                self.exact[kind.index()].insert(spec.value.clone(), Arc::clone(&binding))
            {
                warn!(
                    kind = ?kind,
                    value = %spec.value,
                    previous = %previous.handler_name(),
                    replacement = %binding.handler_name(),
                    "Handler replaced an existing binding"
                );
            }

            debug!(
                marker = "HANDLER_REGISTRY",
                operation_type = "binding_registered",
                kind = ?kind,
                value = %spec.value,
                pattern = spec.pattern,
                handler = %binding.handler_name(),
                "Registered handler"
            );
        }

        kinds.len()
    }

    /// Binding for a stateless id, `None` for anything else.
    pub fn find_handler(&self, id: &ComponentId) -> Option<Arc<HandlerBinding>> {
        if !id.is_stateless() || !id.is_valid() {
            return None;
        }

        let slot = id.kind().index();
        let identity = id.identity();

        if let Some(binding) = self.exact[slot].get(identity) {
            return Some(Arc::clone(binding.value()));
        }

        self.patterns[slot]
            .load()
            .iter()
            .find(|binding| binding.matches(identity))
            .cloned()
    }

    /// Total bindings across all kinds.
    pub fn handler_count(&self) -> usize {
        let exact: usize = self.exact.iter().map(DashMap::len).sum();
        let patterns: usize = self.patterns.iter().map(|list| list.load().len()).sum();
        exact + patterns
    }

    pub fn clear(&self) {
        for table in &self.exact {
            table.clear();
        }
        for list in &self.patterns {
            list.store(Arc::new(Vec::new()));
        }
        info!("Handler registry cleared");
    }
}

impl std::fmt::Debug for HandlerRegistry {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("HandlerRegistry")
            .field("handler_count", &self.handler_count())
            .finish_non_exhaustive()
    }
}
