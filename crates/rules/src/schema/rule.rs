//! Eligibility rule document and its validated form.

use chrono::NaiveDate;
use eligibility_core::Attribute;
use serde::{Deserialize, Serialize};

use crate::error::RuleConfigError;

use super::{Action, Condition, ConditionValue, LogicOperator, Operator, RuleMetadata};

pub const API_VERSION: &str = "v1";
pub const RULE_KIND: &str = "EligibilityRule";

fn default_api_version() -> String {
    API_VERSION.to_string()
}

fn default_kind() -> String {
    RULE_KIND.to_string()
}

// ── Effective window ────────────────────────────────────────────────

/// Inclusive date window in which a rule applies. Missing bounds are open.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct EffectiveRange {
    #[serde(default)]
    pub start: Option<NaiveDate>,
    #[serde(default)]
    pub end: Option<NaiveDate>,
}

impl EffectiveRange {
    pub fn between(start: NaiveDate, end: NaiveDate) -> Self {
        Self {
            start: Some(start),
            end: Some(end),
        }
    }

    pub fn contains(&self, date: NaiveDate) -> bool {
        self.start.map_or(true, |s| date >= s) && self.end.map_or(true, |e| date <= e)
    }
}

// ── Raw document ────────────────────────────────────────────────────

/// A rule as authored in YAML, before validation.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(deny_unknown_fields)]
pub struct RuleDocument {
    #[serde(rename = "apiVersion", default = "default_api_version")]
    pub api_version: String,
    #[serde(default = "default_kind")]
    pub kind: String,
    pub metadata: RuleMetadata,
    /// Lower value = higher precedence.
    pub priority: i32,
    #[serde(default)]
    pub effective: EffectiveRange,
    #[serde(default)]
    pub logic: LogicOperator,
    #[serde(default)]
    pub conditions: Vec<Condition>,
    #[serde(default)]
    pub actions: Vec<Action>,
}

// ── Validated rule ──────────────────────────────────────────────────

/// A validated eligibility rule.
///
/// Only obtainable through [`EligibilityRule::new`] (or deserialization,
/// which routes through it), so every instance has at least one condition,
/// at least one action, well-formed conditions, and a sane effective window.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(try_from = "RuleDocument", into = "RuleDocument")]
pub struct EligibilityRule {
    metadata: RuleMetadata,
    priority: i32,
    effective: EffectiveRange,
    logic: LogicOperator,
    conditions: Vec<Condition>,
    actions: Vec<Action>,
}

impl EligibilityRule {
    /// Validate a document into a rule.
    pub fn new(doc: RuleDocument) -> Result<Self, RuleConfigError> {
        if doc.api_version != API_VERSION {
            return Err(RuleConfigError::UnsupportedApiVersion(doc.api_version));
        }
        if doc.kind != RULE_KIND {
            return Err(RuleConfigError::UnknownKind(doc.kind));
        }

        let rule_id = doc.metadata.id.trim().to_string();
        if rule_id.is_empty() {
            return Err(RuleConfigError::EmptyId);
        }
        if doc.conditions.is_empty() {
            return Err(RuleConfigError::EmptyConditions { rule_id });
        }
        if doc.actions.is_empty() {
            return Err(RuleConfigError::EmptyActions { rule_id });
        }
        if let (Some(start), Some(end)) = (doc.effective.start, doc.effective.end) {
            if end < start {
                return Err(RuleConfigError::InvalidEffectiveRange {
                    rule_id,
                    start,
                    end,
                });
            }
        }

        let conditions = doc
            .conditions
            .into_iter()
            .enumerate()
            .map(|(index, c)| {
                c.validated().map_err(|e| RuleConfigError::Condition {
                    rule_id: rule_id.clone(),
                    index,
                    source: Box::new(e),
                })
            })
            .collect::<Result<Vec<_>, _>>()?;

        for (index, action) in doc.actions.iter().enumerate() {
            action.check().map_err(|message| RuleConfigError::Action {
                rule_id: rule_id.clone(),
                index,
                message,
            })?;
        }

        let mut metadata = doc.metadata;
        metadata.id = rule_id;

        Ok(Self {
            metadata,
            priority: doc.priority,
            effective: doc.effective,
            logic: doc.logic,
            conditions,
            actions: doc.actions,
        })
    }

    /// Start building a rule in code.
    pub fn builder(id: impl Into<String>, name: impl Into<String>) -> RuleBuilder {
        RuleBuilder::new(id, name)
    }

    pub fn id(&self) -> &str {
        &self.metadata.id
    }

    pub fn name(&self) -> &str {
        &self.metadata.name
    }

    pub fn metadata(&self) -> &RuleMetadata {
        &self.metadata
    }

    pub fn priority(&self) -> i32 {
        self.priority
    }

    pub fn is_active(&self) -> bool {
        self.metadata.enabled
    }

    pub fn effective(&self) -> &EffectiveRange {
        &self.effective
    }

    pub fn logic(&self) -> LogicOperator {
        self.logic
    }

    pub fn conditions(&self) -> &[Condition] {
        &self.conditions
    }

    pub fn actions(&self) -> &[Action] {
        &self.actions
    }
}

impl TryFrom<RuleDocument> for EligibilityRule {
    type Error = RuleConfigError;

    fn try_from(doc: RuleDocument) -> Result<Self, Self::Error> {
        EligibilityRule::new(doc)
    }
}

impl From<EligibilityRule> for RuleDocument {
    fn from(rule: EligibilityRule) -> Self {
        RuleDocument {
            api_version: default_api_version(),
            kind: default_kind(),
            metadata: rule.metadata,
            priority: rule.priority,
            effective: rule.effective,
            logic: rule.logic,
            conditions: rule.conditions,
            actions: rule.actions,
        }
    }
}

// ── Builder ─────────────────────────────────────────────────────────

/// Programmatic construction; `build()` runs the same validation as YAML.
#[derive(Debug, Clone)]
pub struct RuleBuilder {
    doc: RuleDocument,
}

impl RuleBuilder {
    pub fn new(id: impl Into<String>, name: impl Into<String>) -> Self {
        Self {
            doc: RuleDocument {
                api_version: default_api_version(),
                kind: default_kind(),
                metadata: RuleMetadata::new(id, name),
                priority: 0,
                effective: EffectiveRange::default(),
                logic: LogicOperator::And,
                conditions: Vec::new(),
                actions: Vec::new(),
            },
        }
    }

    pub fn priority(mut self, priority: i32) -> Self {
        self.doc.priority = priority;
        self
    }

    pub fn active(mut self, active: bool) -> Self {
        self.doc.metadata.enabled = active;
        self
    }

    pub fn effective(mut self, range: EffectiveRange) -> Self {
        self.doc.effective = range;
        self
    }

    pub fn logic(mut self, logic: LogicOperator) -> Self {
        self.doc.logic = logic;
        self
    }

    pub fn condition(
        mut self,
        parameter: Attribute,
        operator: Operator,
        value: ConditionValue,
    ) -> Self {
        self.doc.conditions.push(Condition {
            parameter,
            operator,
            value,
        });
        self
    }

    pub fn action(mut self, action: Action) -> Self {
        self.doc.actions.push(action);
        self
    }

    pub fn build(self) -> Result<EligibilityRule, RuleConfigError> {
        EligibilityRule::new(self.doc)
    }
}
