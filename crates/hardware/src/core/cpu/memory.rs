//! Memory-Side Commit.
//!
//! This module applies the memory stage's requests once the hazard decision for the
//! cycle is known. It performs the following:
//! 1. **Completion Routing:** Hands each finished controller transaction to its owner,
//!    the data cache's miss handler or the uncached port.
//! 2. **Access Commit:** Updates replacement state on hits, merges store hits, and starts
//!    misses and uncached transactions.
//! 3. **Orphan Tracking:** An uncached transaction whose instruction was flushed still
//!    completes in the controller; its response is discarded instead of being matched
//!    against a later access.

use tracing::{debug, warn};

use super::Cpu;
use crate::core::pipeline::stages::MemAction;
use crate::soc::memory::controller::{Completion, Request};

/// The memory stage's single uncached transaction.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct UncachedPort {
    /// A transaction is in flight in the controller.
    pub pending: bool,
    /// Completed transaction not yet consumed by the memory stage.
    pub response: Option<Completion>,
    /// The in-flight transaction belongs to a flushed instruction.
    pub orphaned: bool,
}

impl UncachedPort {
    /// Returns `true` from issue until the memory stage consumes the response.
    pub const fn is_active(&self) -> bool {
        self.pending || self.response.is_some()
    }

    /// Accepts a completion from the controller.
    pub fn deliver(&mut self, completion: Completion) {
        self.pending = false;
        if self.orphaned {
            debug!(addr = format_args!("{:#x}", completion.request.addr()), "orphaned response dropped");
            self.orphaned = false;
        } else {
            self.response = Some(completion);
        }
    }

    /// Detaches the port from a flushed instruction.
    pub fn abandon(&mut self) {
        self.orphaned = self.pending;
        self.response = None;
    }
}

impl Cpu {
    /// Issues a transaction, logging a structural conflict instead of panicking.
    pub(crate) fn issue(&mut self, request: Request) -> bool {
        match self.controller.issue(request) {
            Ok(()) => true,
            Err(fault) => {
                warn!(%fault, "memory controller rejected a request");
                false
            }
        }
    }

    /// Advances the controller one cycle and routes its completion.
    pub(crate) fn tick_controller(&mut self) {
        let Some(completion) = self.controller.tick() else {
            return;
        };
        match completion.request {
            Request::Fill { .. } | Request::WriteBack { .. } => {
                if matches!(completion.request, Request::WriteBack { .. }) {
                    self.stats.dcache_writebacks += 1;
                }
                let Some(cache) = self.cache.as_mut() else {
                    warn!(request = ?completion.request, "line completion with no cache");
                    return;
                };
                match cache.complete(completion) {
                    Ok(Some(next)) => {
                        if !self.issue(next) {
                            if let Some(cache) = self.cache.as_mut() {
                                cache.abort_miss();
                            }
                        }
                    }
                    Ok(None) => {}
                    Err(fault) => warn!(%fault, "cache miss failed"),
                }
            }
            Request::Read { .. } | Request::Write { .. } => self.uncached.deliver(completion),
        }
    }

    /// Commits the memory stage's action.
    ///
    /// # Arguments
    ///
    /// * `action` - What the stage requested this cycle.
    /// * `killed` - The stage's instruction was flushed; drop the action.
    pub(crate) fn commit_memory(&mut self, action: MemAction, killed: bool) {
        if killed {
            self.uncached.abandon();
            self.mem_missed = false;
            return;
        }
        match action {
            MemAction::None => {}
            MemAction::Touch { set, way } => {
                if let Some(cache) = self.cache.as_mut() {
                    cache.touch(set, way);
                }
                self.count_hit();
            }
            MemAction::Store {
                set,
                way,
                addr,
                width,
                value,
            } => {
                if let Some(cache) = self.cache.as_mut() {
                    cache.write(set, way, addr, width, value);
                }
                self.count_hit();
            }
            MemAction::Miss(addr) => {
                let Some(request) = self.cache.as_mut().map(|cache| cache.start_miss(addr)) else {
                    return;
                };
                if self.issue(request) {
                    self.stats.dcache_misses += 1;
                    self.mem_missed = true;
                } else if let Some(cache) = self.cache.as_mut() {
                    cache.abort_miss();
                }
            }
            MemAction::Issue(request) => {
                self.uncached.pending = self.issue(request);
            }
            MemAction::Consume => self.uncached.response = None,
            MemAction::ClearFault => {
                if let Some(cache) = self.cache.as_mut() {
                    cache.clear_fault();
                }
            }
        }
    }

    fn count_hit(&mut self) {
        if !self.mem_missed {
            self.stats.dcache_hits += 1;
        }
    }

    /// Marks the end of the memory stage's current access.
    pub(crate) const fn retire_access(&mut self) {
        self.mem_missed = false;
    }
}
