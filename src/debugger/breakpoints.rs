//! Breakpoint storage and lookup.
//!
//! Source-position → PC resolution (on `verify`), PC → breakpoint fast
//! lookup (`offset_index`), and enable/disable toggling. No conditional
//! breakpoints or log points — just enable/disable, per the debugging
//! subsystem's scope.

use std::collections::HashMap;

use crate::debugger::protocol::{Breakpoint, BreakpointId, SourceLocation};

/// A registered breakpoint plus its enabled/disabled state.
#[derive(Debug, Clone)]
pub struct BreakpointEntry {
    /// The protocol-level breakpoint (id, location, verified, offset).
    pub breakpoint: Breakpoint,
    /// Whether this breakpoint is enabled (can be toggled without removing).
    pub enabled: bool,
}

impl BreakpointEntry {
    /// Create a new enabled breakpoint entry.
    pub fn new(breakpoint: Breakpoint) -> Self {
        Self {
            breakpoint,
            enabled: true,
        }
    }

    /// Returns whether this breakpoint should fire: enabled and verified.
    pub fn check(&self) -> ShouldFire {
        if self.enabled && self.breakpoint.verified {
            ShouldFire::Pause
        } else {
            ShouldFire::Skip
        }
    }
}

/// The result of checking whether a breakpoint should fire.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ShouldFire {
    /// The breakpoint should pause execution.
    Pause,
    /// The breakpoint should be skipped (disabled or unverified).
    Skip,
}

/// Manages all breakpoints: storage by ID, plus a reverse PC → ID index for
/// the Pause Predicate's hot-path lookup.
#[derive(Debug, Default)]
pub struct BreakpointManager {
    entries: HashMap<BreakpointId, BreakpointEntry>,
    next_id: BreakpointId,
    offset_index: HashMap<usize, Vec<BreakpointId>>,
}

impl BreakpointManager {
    /// Create a new empty breakpoint manager.
    pub fn new() -> Self {
        Self {
            entries: HashMap::new(),
            next_id: 1,
            offset_index: HashMap::new(),
        }
    }

    /// Add a breakpoint and return its ID. Unverified until `verify` binds
    /// it to an instruction offset.
    pub fn add(&mut self, location: SourceLocation) -> BreakpointId {
        let id = self.next_id;
        self.next_id += 1;
        let bp = Breakpoint::new(id, location);
        self.entries.insert(id, BreakpointEntry::new(bp));
        id
    }

    /// Verify (bind) a breakpoint to an instruction offset.
    pub fn verify(&mut self, id: BreakpointId, offset: usize) -> bool {
        if let Some(entry) = self.entries.get_mut(&id) {
            entry.breakpoint.verified = true;
            entry.breakpoint.instruction_offset = Some(offset);
            self.offset_index.entry(offset).or_default().push(id);
            true
        } else {
            false
        }
    }

    /// Remove a breakpoint by ID.
    pub fn remove(&mut self, id: BreakpointId) -> Option<BreakpointEntry> {
        if let Some(entry) = self.entries.remove(&id) {
            if let Some(offset) = entry.breakpoint.instruction_offset {
                if let Some(ids) = self.offset_index.get_mut(&offset) {
                    ids.retain(|&bid| bid != id);
                    if ids.is_empty() {
                        self.offset_index.remove(&offset);
                    }
                }
            }
            Some(entry)
        } else {
            None
        }
    }

    /// Remove all breakpoints.
    pub fn clear(&mut self) {
        self.entries.clear();
        self.offset_index.clear();
    }

    /// Enable a breakpoint by ID.
    pub fn enable(&mut self, id: BreakpointId) -> bool {
        if let Some(entry) = self.entries.get_mut(&id) {
            entry.enabled = true;
            true
        } else {
            false
        }
    }

    /// Disable a breakpoint by ID (keeps it registered but won't fire).
    pub fn disable(&mut self, id: BreakpointId) -> bool {
        if let Some(entry) = self.entries.get_mut(&id) {
            entry.enabled = false;
            true
        } else {
            false
        }
    }

    /// Get a breakpoint entry by ID.
    pub fn get(&self, id: BreakpointId) -> Option<&BreakpointEntry> {
        self.entries.get(&id)
    }

    /// Get a mutable breakpoint entry by ID.
    pub fn get_mut(&mut self, id: BreakpointId) -> Option<&mut BreakpointEntry> {
        self.entries.get_mut(&id)
    }

    /// Check if any breakpoint exists at the given offset.
    pub fn has_breakpoint_at(&self, offset: usize) -> bool {
        self.offset_index.contains_key(&offset)
    }

    /// Check all breakpoints at the given offset. Returns whether to pause.
    pub fn check_offset(&mut self, offset: usize) -> ShouldFire {
        self.check_offset_verbose(offset).0
    }

    /// Like [`check_offset`](Self::check_offset), but also returns which
    /// breakpoint's ID caused a `Pause`, for `PauseReason::Breakpoint`.
    pub fn check_offset_verbose(&mut self, offset: usize) -> (ShouldFire, Option<BreakpointId>) {
        let ids = match self.offset_index.get(&offset) {
            Some(ids) => ids.clone(),
            None => return (ShouldFire::Skip, None),
        };

        for id in ids {
            if let Some(entry) = self.entries.get(&id) {
                if entry.check() == ShouldFire::Pause {
                    return (ShouldFire::Pause, Some(id));
                }
            }
        }

        (ShouldFire::Skip, None)
    }

    /// Total number of breakpoints.
    pub fn count(&self) -> usize {
        self.entries.len()
    }

    /// Number of enabled breakpoints.
    pub fn enabled_count(&self) -> usize {
        self.entries.values().filter(|e| e.enabled).count()
    }

    /// Get all entries sorted by ID.
    pub fn all_entries(&self) -> Vec<&BreakpointEntry> {
        let mut entries: Vec<&BreakpointEntry> = self.entries.values().collect();
        entries.sort_by_key(|e| e.breakpoint.id);
        entries
    }

    /// Get all protocol-level breakpoints sorted by ID.
    pub fn all_breakpoints(&self) -> Vec<Breakpoint> {
        self.all_entries()
            .iter()
            .map(|e| e.breakpoint.clone())
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn loc() -> SourceLocation {
        SourceLocation::new("test.th", 1, 1)
    }

    #[test]
    fn unverified_breakpoint_never_fires() {
        let mut mgr = BreakpointManager::new();
        mgr.add(loc());
        assert_eq!(mgr.check_offset(0), ShouldFire::Skip);
    }

    #[test]
    fn verified_breakpoint_fires_at_its_offset() {
        let mut mgr = BreakpointManager::new();
        let id = mgr.add(loc());
        mgr.verify(id, 5);
        assert_eq!(mgr.check_offset(5), ShouldFire::Pause);
        assert_eq!(mgr.check_offset(6), ShouldFire::Skip);
    }

    #[test]
    fn disabled_breakpoint_does_not_fire() {
        let mut mgr = BreakpointManager::new();
        let id = mgr.add(loc());
        mgr.verify(id, 5);
        mgr.disable(id);
        assert_eq!(mgr.check_offset(5), ShouldFire::Skip);
        mgr.enable(id);
        assert_eq!(mgr.check_offset(5), ShouldFire::Pause);
    }

    #[test]
    fn remove_clears_the_offset_index() {
        let mut mgr = BreakpointManager::new();
        let id = mgr.add(loc());
        mgr.verify(id, 5);
        mgr.remove(id);
        assert_eq!(mgr.check_offset(5), ShouldFire::Skip);
        assert!(!mgr.has_breakpoint_at(5));
    }
}
