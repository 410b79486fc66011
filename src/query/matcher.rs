//! Evaluating bound queries against tag id sets
//!
//! Both evaluation modes share one tree walk. The walk carries a
//! [`MatchState`]: the bracket slots consumed so far and the provenance list
//! of the slots those groups matched. A sub-expression that evaluates to
//! false leaves the state exactly as it found it.

use serde::Serialize;

use super::ast::{Binding, Node, PseudoTag};
use crate::tagset::TagIdSet;

/// Outcome of a detailed match
///
/// With `used_groups`, `slots` lists the picture slots consumed by the
/// query's `[...]` operators in the order they matched. Without it, `slots`
/// lists every slot the whole query matched on its own; an empty list on a
/// successful match means the query only matched across slots.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct MatchResult {
    pub matched: bool,
    pub used_groups: bool,
    pub slots: Vec<usize>,
}

/// Bitset of consumed slot indices
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SlotMask {
    words: Vec<u64>,
}

impl SlotMask {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    #[must_use]
    pub fn contains(&self, slot: usize) -> bool {
        self.words
            .get(slot / 64)
            .is_some_and(|word| word & (1 << (slot % 64)) != 0)
    }

    pub fn insert(&mut self, slot: usize) {
        let word = slot / 64;
        if self.words.len() <= word {
            self.words.resize(word + 1, 0);
        }
        self.words[word] |= 1 << (slot % 64);
    }
}

/// Walk state for one top-level evaluation
#[derive(Debug)]
struct MatchState<'t> {
    tags: &'t TagIdSet,
    consumed: SlotMask,
    provenance: Vec<usize>,
}

struct Snapshot {
    consumed: SlotMask,
    provenance: usize,
}

impl<'t> MatchState<'t> {
    fn new(tags: &'t TagIdSet) -> Self {
        Self {
            tags,
            consumed: SlotMask::new(),
            provenance: Vec::new(),
        }
    }

    fn snapshot(&self) -> Snapshot {
        Snapshot {
            consumed: self.consumed.clone(),
            provenance: self.provenance.len(),
        }
    }

    fn restore(&mut self, snapshot: Snapshot) {
        self.consumed = snapshot.consumed;
        self.provenance.truncate(snapshot.provenance);
    }

    fn eval(&mut self, node: &Node, slot: Option<usize>) -> bool {
        match node {
            Node::Leaf(leaf) => self.leaf(leaf.binding(), slot),
            Node::And(left, right) => {
                let snapshot = self.snapshot();
                if self.eval(left, slot) && self.eval(right, slot) {
                    true
                } else {
                    self.restore(snapshot);
                    false
                }
            }
            Node::Or(left, right) => self.eval(left, slot) || self.eval(right, slot),
            Node::Not(inner) => {
                let snapshot = self.snapshot();
                let matched = self.eval(inner, slot);
                self.restore(snapshot);
                !matched
            }
            // Groups pick their own slot, whatever restriction the caller had
            Node::Group(inner) => {
                for candidate in 1..self.tags.slot_count() {
                    if self.consumed.contains(candidate) {
                        continue;
                    }
                    let snapshot = self.snapshot();
                    if self.eval(inner, Some(candidate)) {
                        self.consumed.insert(candidate);
                        self.provenance.push(candidate);
                        return true;
                    }
                    self.restore(snapshot);
                }
                false
            }
        }
    }

    fn leaf(&self, binding: Binding, slot: Option<usize>) -> bool {
        match binding {
            Binding::Tag(id) => match slot {
                Some(slot) => self.tags.contains(slot, id),
                None => self.tags.contains_anywhere(id),
            },
            Binding::Pseudo(PseudoTag::Any) => true,
            Binding::Pseudo(PseudoTag::New) => match slot {
                Some(slot) => self.tags.tags(slot).is_empty(),
                None => self.tags.total_count() == 0,
            },
            Binding::Pseudo(PseudoTag::Unknown) | Binding::Unresolved | Binding::Unbound => false,
        }
    }
}

/// Boolean match, optionally restricted to one slot
#[must_use]
pub fn matches(root: &Node, tags: &TagIdSet, slot: Option<usize>) -> bool {
    MatchState::new(tags).eval(root, slot)
}

/// Detailed match with slot provenance
#[must_use]
pub fn query(root: &Node, tags: &TagIdSet) -> MatchResult {
    if root.uses_groups() {
        let mut state = MatchState::new(tags);
        let matched = state.eval(root, None);
        return MatchResult {
            matched,
            used_groups: true,
            slots: if matched { state.provenance } else { Vec::new() },
        };
    }

    let slots: Vec<usize> = (0..tags.slot_count())
        .filter(|&slot| matches(root, tags, Some(slot)))
        .collect();
    if !slots.is_empty() {
        return MatchResult {
            matched: true,
            used_groups: false,
            slots,
        };
    }

    MatchResult {
        matched: tags.slot_count() > 1 && matches(root, tags, None),
        used_groups: false,
        slots: Vec::new(),
    }
}
