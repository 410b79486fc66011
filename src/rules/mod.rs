//! Tag implication engine
//!
//! A rule pairs a trigger query with a consequence tag set: every picture the
//! trigger matches also receives the consequence tags. Rules are applied in
//! `order` and repeatedly until a full pass adds nothing, so chains like
//! `kitten --> cat` and `cat --> pet` resolve in one call.
//!
//! Where consequence tags land depends on how the trigger matched:
//!
//! - Trigger uses `[...]`: ungrouped consequence tags go to slot 0, the
//!   consequence's groups go to the slots the trigger's groups matched, in
//!   order
//! - Trigger matched within specific slots and the consequence has no
//!   groups: the tags go into each of those slots
//! - Otherwise (cross-slot match or grouped consequence): ungrouped tags go
//!   to slot 0 and each consequence group becomes a new slot, once per
//!   [`Implications::apply`] call

pub mod error;
pub mod file;

pub use error::{RuleError, RuleFileError};
pub use file::{RuleExpression, RuleFile, load_rule_file, parse_rule_file};

use bincode::{Decode, Encode};
use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;
use tracing::{debug, warn};

use crate::query::{MatchResult, Query};
use crate::tags::TagRegistry;
use crate::tagset::{TagIdSet, TagSet};

/// A persisted rule, as text
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, Encode, Decode)]
pub struct RuleRow {
    pub trigger: String,
    pub consequence: String,
    pub order: u32,
}

/// A loaded, bound rule
#[derive(Debug, Clone)]
pub struct TagImplication {
    trigger: Query,
    consequence: TagIdSet,
    order: u32,
}

impl TagImplication {
    /// Build from an already bound trigger and resolved consequence
    #[must_use]
    pub const fn new(trigger: Query, consequence: TagIdSet, order: u32) -> Self {
        Self {
            trigger,
            consequence,
            order,
        }
    }

    /// Parse and bind a stored rule, registering any tags it mentions
    ///
    /// # Errors
    /// Returns `RuleError` if the trigger does not parse, a tag cannot be
    /// created, or the consequence is empty
    pub fn from_row<R: TagRegistry + ?Sized>(row: &RuleRow, registry: &mut R) -> Result<Self, RuleError> {
        let mut trigger = Query::parse(&row.trigger).map_err(|source| RuleError::Trigger {
            order: row.order,
            trigger: row.trigger.clone(),
            source,
        })?;
        trigger
            .bind_or_create(registry)
            .map_err(|source| RuleError::Binding {
                order: row.order,
                source,
            })?;

        let tagset = TagSet::parse(&row.consequence);
        if tagset.is_empty() {
            return Err(RuleError::EmptyConsequence {
                order: row.order,
                consequence: row.consequence.clone(),
            });
        }
        let consequence =
            TagIdSet::resolve(&tagset, registry).map_err(|source| RuleError::Binding {
                order: row.order,
                source,
            })?;

        Ok(Self::new(trigger, consequence, row.order))
    }

    #[must_use]
    pub const fn trigger(&self) -> &Query {
        &self.trigger
    }

    #[must_use]
    pub const fn consequence(&self) -> &TagIdSet {
        &self.consequence
    }

    #[must_use]
    pub const fn order(&self) -> u32 {
        self.order
    }

    /// Match the trigger and insert the consequence; returns whether it fired
    ///
    /// `appended` holds the consequence groups this rule has already added as
    /// new slots during the current application; those are not added again.
    fn fire(&self, tags: &mut TagIdSet, appended: &mut BTreeSet<usize>) -> bool {
        let result = self.trigger.query(tags);
        if result.matched {
            insert_consequence(tags, &result, &self.consequence, appended);
        }
        result.matched
    }
}

fn insert_consequence(
    tags: &mut TagIdSet,
    result: &MatchResult,
    consequence: &TagIdSet,
    appended: &mut BTreeSet<usize>,
) {
    if result.used_groups {
        tags.insert_tags(consequence.tags(0), 0);
        for (group, &slot) in result.slots.iter().take(consequence.groups()).enumerate() {
            tags.insert_tags(consequence.tags(group + 1), slot);
        }
    } else if result.slots.is_empty() || consequence.groups() > 0 {
        tags.insert_tags(consequence.tags(0), 0);
        for group in 1..consequence.slot_count() {
            if appended.insert(group) {
                tags.insert_group(consequence.tags(group));
            }
        }
    } else {
        for &slot in &result.slots {
            tags.insert_tags(consequence.tags(0), slot);
        }
    }
}

/// The active rule set of a session
#[derive(Debug, Default)]
pub struct Implications {
    rules: Vec<TagImplication>,
    dropped: Vec<RuleError>,
}

impl Implications {
    /// Load stored rules in `order`, binding them in creation mode
    ///
    /// Rules that fail to load are logged and left out; they never stop the
    /// remaining rules from loading.
    pub fn load<I, R>(rows: I, registry: &mut R) -> Self
    where
        I: IntoIterator<Item = RuleRow>,
        R: TagRegistry + ?Sized,
    {
        let mut rows: Vec<RuleRow> = rows.into_iter().collect();
        rows.sort_by_key(|row| row.order);

        let mut implications = Self::default();
        for row in &rows {
            match TagImplication::from_row(row, registry) {
                Ok(rule) => implications.rules.push(rule),
                Err(e) => {
                    warn!(order = row.order, trigger = %row.trigger, "Dropping rule: {e}");
                    implications.dropped.push(e);
                }
            }
        }
        debug!(
            loaded = implications.rules.len(),
            dropped = implications.dropped.len(),
            "Loaded implication rules"
        );
        implications
    }

    #[must_use]
    pub fn rules(&self) -> &[TagImplication] {
        &self.rules
    }

    /// Rules left out at load time, with the reason
    #[must_use]
    pub fn dropped(&self) -> &[RuleError] {
        &self.dropped
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.rules.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.rules.is_empty()
    }

    /// Apply every rule until a full pass adds no tag
    ///
    /// Later rules in a pass see tags inserted by earlier ones. A consequence
    /// group that becomes a new slot is added at most once per call, which
    /// bounds the slot list. Returns the number of passes made, the final
    /// unproductive one included.
    pub fn apply(&self, tags: &mut TagIdSet) -> usize {
        let mut appended = vec![BTreeSet::new(); self.rules.len()];
        let mut rounds = 0;
        loop {
            rounds += 1;
            let before = tags.total_count();
            for (rule, seen) in self.rules.iter().zip(&mut appended) {
                rule.fire(tags, seen);
            }
            if tags.total_count() <= before {
                break;
            }
        }
        debug!(
            picture = ?tags.picture(),
            rounds,
            total = tags.total_count(),
            "Applied implication rules"
        );
        rounds
    }
}

/// Apply `rules` to `tags` until nothing more can be inferred
pub fn apply_rules(rules: &Implications, tags: &mut TagIdSet) -> usize {
    rules.apply(tags)
}
