//! Class hierarchy traversal
//!
//! The heritage of a class is a fixed depth-first preorder walk: the class
//! itself, then each direct superclass in declaration order followed by that
//! superclass's own ancestors. A class reachable along several paths (diamond
//! inheritance) is visited at its first position only.
//!
//! The heritage is computed once when the class is built. Traversals use a
//! [`HierIter`], a cursor over that cached slice; the cursor lives on the
//! caller's stack, so nested and re-entrant walks never share state.

use rustc_hash::FxHashSet;

use super::{ClassId, ClassRegistry};

/// Compute the heritage of a class with the given direct superclasses
///
/// Every superclass must already be registered.
pub fn linearize(id: ClassId, supers: &[ClassId], registry: &ClassRegistry) -> Vec<ClassId> {
    let mut order = vec![id];
    let mut seen = FxHashSet::default();
    seen.insert(id);

    let mut pending: Vec<ClassId> = supers.iter().rev().copied().collect();
    while let Some(next) = pending.pop() {
        if !seen.insert(next) {
            continue;
        }
        order.push(next);
        if let Some(class) = registry.get(next) {
            pending.extend(class.supers.iter().rev().copied());
        }
    }
    order
}

/// Cursor over a class heritage
#[derive(Debug, Clone)]
pub struct HierIter<'a> {
    heritage: &'a [ClassId],
    pos: usize,
}

impl<'a> HierIter<'a> {
    /// Start a walk at the most-derived class
    pub fn new(heritage: &'a [ClassId]) -> Self {
        Self { heritage, pos: 0 }
    }

    /// Return the next class, or `None` when the walk is over
    pub fn advance(&mut self) -> Option<ClassId> {
        let next = self.heritage.get(self.pos).copied()?;
        self.pos += 1;
        Some(next)
    }

    /// Advance until `target` has been returned
    ///
    /// Returns `false`, leaving the cursor exhausted, if `target` is not in
    /// the heritage.
    pub fn skip_past(&mut self, target: ClassId) -> bool {
        while let Some(class_id) = self.advance() {
            if class_id == target {
                return true;
            }
        }
        false
    }

    /// Classes not yet visited
    pub fn remaining(&self) -> &'a [ClassId] {
        &self.heritage[self.pos.min(self.heritage.len())..]
    }
}

impl Iterator for HierIter<'_> {
    type Item = ClassId;

    fn next(&mut self) -> Option<ClassId> {
        self.advance()
    }
}
