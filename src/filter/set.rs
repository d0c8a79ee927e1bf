use log::{debug, info};
use parking_lot::{Mutex, RwLock};
use serde::Serialize;
use std::sync::Arc;

use crate::filter::rule::{FilterRule, RuleDraft, RuleError, RuleId};
use crate::filter::validator::FieldSpec;
use crate::models::packet::{BusPacket, Field};
use crate::utils::error::{AppError, AppResult};

/// An immutable snapshot of committed rules. A packet passes when any
/// rule matches, or when there are no rules at all.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct CommittedSet {
    /// Bumped on every successful commit
    pub generation: u64,
    pub rules: Vec<FilterRule>,
}

impl CommittedSet {
    pub fn is_empty(&self) -> bool {
        self.rules.is_empty()
    }

    pub fn matches(&self, packet: &BusPacket) -> bool {
        self.rules.is_empty() || self.rules.iter().any(|rule| rule.matches(packet))
    }
}

/// Owns the rule drafts being edited and the committed filter set
pub struct FilterSetManager {
    schema: &'static [FieldSpec],

    /// Drafts in the order they were added
    drafts: Mutex<Vec<RuleDraft>>,

    /// Last successfully committed set; swapped whole on commit
    committed: RwLock<Arc<CommittedSet>>,
}

impl FilterSetManager {
    pub fn new(schema: &'static [FieldSpec]) -> Self {
        Self {
            schema,
            drafts: Mutex::new(Vec::new()),
            committed: RwLock::new(Arc::new(CommittedSet::default())),
        }
    }

    pub fn schema(&self) -> &'static [FieldSpec] {
        self.schema
    }

    /// Add an empty draft and return its id
    pub fn add_rule(&self) -> RuleId {
        let draft = RuleDraft::new(self.schema);
        let id = draft.id;
        self.drafts.lock().push(draft);
        debug!("Added filter rule {}", id);
        id
    }

    /// Replace the raw input of one field of a draft
    pub fn set_input(&self, rule: RuleId, field: Field, text: &str) -> AppResult<()> {
        self.set_inputs(rule, &[(field, text)])
    }

    /// Replace the raw inputs of several fields of a draft. Either every
    /// input is written or, on error, none is.
    pub fn set_inputs(&self, rule: RuleId, inputs: &[(Field, &str)]) -> AppResult<()> {
        if let Some((field, _)) = inputs
            .iter()
            .find(|(field, _)| !self.schema.iter().any(|spec| spec.field == *field))
        {
            return Err(AppError::FieldNotInSchema(*field));
        }

        let mut drafts = self.drafts.lock();
        let draft = drafts
            .iter_mut()
            .find(|d| d.id == rule)
            .ok_or(AppError::RuleNotFound(rule))?;
        for (field, text) in inputs {
            let input = draft
                .input_mut(*field)
                .ok_or(AppError::FieldNotInSchema(*field))?;
            input.text = text.to_string();
            input.invalid = false;
        }
        Ok(())
    }

    /// Remove a draft. Returns whether any filtering remains configured
    /// (drafts or committed rules); `false` means the caller should treat
    /// filtering as inactive.
    pub fn remove_rule(&self, rule: RuleId) -> AppResult<bool> {
        let mut drafts = self.drafts.lock();
        let index = drafts
            .iter()
            .position(|d| d.id == rule)
            .ok_or(AppError::RuleNotFound(rule))?;
        drafts.remove(index);
        debug!("Removed filter rule {}", rule);
        Ok(!drafts.is_empty() || !self.committed().is_empty())
    }

    /// Current drafts, including their normalized text and invalid marks
    pub fn drafts(&self) -> Vec<RuleDraft> {
        self.drafts.lock().clone()
    }

    pub fn has_drafts(&self) -> bool {
        !self.drafts.lock().is_empty()
    }

    /// Validate every draft and, only if all are valid, publish them as
    /// the new committed set. On failure the previous set stays in place
    /// and the first error of each failing draft is returned in order.
    pub fn commit(&self) -> Result<Arc<CommittedSet>, Vec<RuleError>> {
        let mut drafts = self.drafts.lock();
        let mut rules = Vec::with_capacity(drafts.len());
        let mut errors = Vec::new();

        for draft in drafts.iter_mut() {
            match draft.validate(self.schema) {
                Ok(rule) => rules.push(rule),
                Err(e) => errors.push(e),
            }
        }

        if !errors.is_empty() {
            info!(
                "Rejected filter commit: {} of {} rules invalid",
                errors.len(),
                drafts.len()
            );
            return Err(errors);
        }

        let mut committed = self.committed.write();
        let next = Arc::new(CommittedSet {
            generation: committed.generation + 1,
            rules,
        });
        *committed = next.clone();
        info!(
            "Committed filter set generation {} with {} rules",
            next.generation,
            next.rules.len()
        );
        Ok(next)
    }

    /// Snapshot of the committed set
    pub fn committed(&self) -> Arc<CommittedSet> {
        self.committed.read().clone()
    }

    /// Check a packet against the committed set
    pub fn matches(&self, packet: &BusPacket) -> bool {
        self.committed().matches(packet)
    }
}
