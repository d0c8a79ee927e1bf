use serde::Serialize;
use uuid::Uuid;

use crate::filter::validator::{FieldSpec, ValidationError};
use crate::models::packet::{BusPacket, Field, FieldValue};

/// Identifier of a filter rule
pub type RuleId = Uuid;

/// One field-level equality test; `None` matches any value
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct FilterCondition {
    pub field: Field,
    pub value: Option<FieldValue>,
}

impl FilterCondition {
    pub fn is_wildcard(&self) -> bool {
        self.value.is_none()
    }

    pub fn matches(&self, packet: &BusPacket) -> bool {
        match &self.value {
            None => true,
            Some(expected) => self.field.value_of(packet).as_ref() == Some(expected),
        }
    }
}

/// A validated rule: every condition must hold
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct FilterRule {
    pub id: RuleId,
    pub conditions: Vec<FilterCondition>,
}

impl FilterRule {
    pub fn matches(&self, packet: &BusPacket) -> bool {
        self.conditions.iter().all(|c| c.matches(packet))
    }
}

/// Which input a validation error refers to
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct FieldLocation {
    pub rule: RuleId,
    pub field: Field,
}

/// First validation failure of a rule
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct RuleError {
    pub location: FieldLocation,
    pub error: ValidationError,
}

/// Raw user input for one field of a draft
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct FieldInput {
    pub field: Field,
    pub text: String,
    pub invalid: bool,
}

/// A rule as the user is editing it; not used for matching until
/// committed
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct RuleDraft {
    pub id: RuleId,
    pub inputs: Vec<FieldInput>,
}

impl RuleDraft {
    /// Empty draft with one blank input per schema field
    pub fn new(schema: &[FieldSpec]) -> Self {
        Self {
            id: Uuid::new_v4(),
            inputs: schema
                .iter()
                .map(|spec| FieldInput {
                    field: spec.field,
                    text: String::new(),
                    invalid: false,
                })
                .collect(),
        }
    }

    pub fn input_mut(&mut self, field: Field) -> Option<&mut FieldInput> {
        self.inputs.iter_mut().find(|input| input.field == field)
    }

    /// Validate the inputs in field order, stopping at the first failure.
    ///
    /// Inputs that pass are rewritten to their canonical text. A draft
    /// with nothing filled in fails with `EmptyRule` at its first
    /// non-text field.
    pub fn validate(&mut self, schema: &[FieldSpec]) -> Result<FilterRule, RuleError> {
        let mut conditions = Vec::with_capacity(schema.len());
        let mut first_numeric = None;

        for input in &mut self.inputs {
            input.invalid = false;
        }

        for spec in schema {
            if first_numeric.is_none() && !spec.kind.is_text() {
                first_numeric = Some(spec.field);
            }

            let location = FieldLocation {
                rule: self.id,
                field: spec.field,
            };
            let input = match self.input_mut(spec.field) {
                Some(input) => input,
                None => {
                    conditions.push(FilterCondition {
                        field: spec.field,
                        value: None,
                    });
                    continue;
                }
            };

            match spec.validate(&input.text) {
                Ok(validated) => {
                    input.text = validated.normalized;
                    conditions.push(FilterCondition {
                        field: spec.field,
                        value: validated.value,
                    });
                }
                Err(error) => {
                    input.invalid = true;
                    return Err(RuleError { location, error });
                }
            }
        }

        if conditions.iter().all(FilterCondition::is_wildcard) {
            let field = first_numeric
                .or_else(|| schema.first().map(|spec| spec.field))
                .unwrap_or(Field::SourceSubnetId);
            if let Some(input) = self.input_mut(field) {
                input.invalid = true;
            }
            return Err(RuleError {
                location: FieldLocation {
                    rule: self.id,
                    field,
                },
                error: ValidationError::EmptyRule,
            });
        }

        Ok(FilterRule {
            id: self.id,
            conditions,
        })
    }
}
