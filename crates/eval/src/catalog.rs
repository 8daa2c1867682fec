//! Rule catalogs: the read-only lookup the engine consumes, and the
//! `Resolution` document that carries a catalog together with its
//! approval metadata.

use std::collections::{BTreeMap, BTreeSet};

use saep_domain::DomainError;
use serde::{Deserialize, Serialize, Serializer};
use time::macros::format_description;
use time::Date;

use crate::rule::Rule;

/// Source of rule definitions by code. The engine only ever reads from it.
pub trait RuleCatalog {
    fn rule(&self, code: &str) -> Option<&Rule>;
}

impl RuleCatalog for [Rule] {
    fn rule(&self, code: &str) -> Option<&Rule> {
        self.iter().find(|r| r.code == code)
    }
}

impl RuleCatalog for Vec<Rule> {
    fn rule(&self, code: &str) -> Option<&Rule> {
        self.as_slice().rule(code)
    }
}

// ──────────────────────────────────────────────
// Errors
// ──────────────────────────────────────────────

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum CatalogError {
    #[error(transparent)]
    Required(#[from] DomainError),

    #[error("invalid approval date '{value}', expected YYYY-MM-DD")]
    InvalidDate { value: String },

    #[error("rule #{index} has a blank {field}")]
    BlankRuleField { index: usize, field: &'static str },

    #[error("duplicate rule code: {code}")]
    DuplicateRuleCode { code: String },

    #[error("rule '{rule}' branches to unknown rule '{target}'")]
    UnknownBranch { rule: String, target: String },

    #[error("conditional branches form a cycle through rule '{code}'")]
    CyclicBranch { code: String },
}

// ──────────────────────────────────────────────
// Resolution
// ──────────────────────────────────────────────

/// An approved set of scoring rules (resolução).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(try_from = "RawResolution")]
pub struct Resolution {
    id: String,
    name: String,
    description: String,
    #[serde(serialize_with = "serialize_date")]
    approved_on: Date,
    rules: Vec<Rule>,
}

#[derive(Deserialize)]
struct RawResolution {
    #[serde(default)]
    id: String,
    #[serde(default)]
    name: String,
    #[serde(default)]
    description: String,
    #[serde(default)]
    approved_on: Option<String>,
    #[serde(default)]
    rules: Vec<Rule>,
}

impl TryFrom<RawResolution> for Resolution {
    type Error = CatalogError;

    fn try_from(raw: RawResolution) -> Result<Self, Self::Error> {
        let approved_on = raw.approved_on.as_deref().map(parse_date).transpose()?;
        Resolution::new(raw.id, raw.name, raw.description, approved_on, raw.rules)
    }
}

fn parse_date(value: &str) -> Result<Date, CatalogError> {
    Date::parse(value, format_description!("[year]-[month]-[day]")).map_err(|_| {
        CatalogError::InvalidDate {
            value: value.to_string(),
        }
    })
}

fn serialize_date<S: Serializer>(date: &Date, serializer: S) -> Result<S::Ok, S::Error> {
    let text = date
        .format(format_description!("[year]-[month]-[day]"))
        .map_err(serde::ser::Error::custom)?;
    serializer.serialize_str(&text)
}

fn required(field: &'static str) -> CatalogError {
    CatalogError::Required(DomainError::RequiredFieldMissing { field })
}

impl Resolution {
    /// Fails with `RequiredFieldMissing` when the name or description is
    /// blank, the approval date is absent, or there are no rules.
    pub fn new(
        id: impl Into<String>,
        name: impl Into<String>,
        description: impl Into<String>,
        approved_on: Option<Date>,
        rules: Vec<Rule>,
    ) -> Result<Self, CatalogError> {
        let name = name.into();
        if name.trim().is_empty() {
            return Err(required("nome"));
        }
        let description = description.into();
        if description.trim().is_empty() {
            return Err(required("descricao"));
        }
        let approved_on = approved_on.ok_or_else(|| required("dataAprovacao"))?;
        if rules.is_empty() {
            return Err(required("regras"));
        }
        Ok(Resolution {
            id: id.into(),
            name,
            description,
            approved_on,
            rules,
        })
    }

    pub fn id(&self) -> &str {
        &self.id
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn description(&self) -> &str {
        &self.description
    }

    pub fn approved_on(&self) -> Date {
        self.approved_on
    }

    /// Rules in catalog order.
    pub fn rules(&self) -> &[Rule] {
        &self.rules
    }

    /// Rules whose record count is restricted to `kind`. A report kind
    /// still referenced here must not be deleted.
    pub fn rules_using_report_kind<'a>(&'a self, kind: &'a str) -> Vec<&'a Rule> {
        self.rules
            .iter()
            .filter(|r| r.report_kind() == Some(kind))
            .collect()
    }

    /// Checks the catalog's structure and returns every problem found.
    pub fn validate(&self) -> Result<(), Vec<CatalogError>> {
        let mut errors = Vec::new();

        let mut seen = BTreeSet::new();
        let mut reported = BTreeSet::new();
        for (index, rule) in self.rules.iter().enumerate() {
            if rule.code.trim().is_empty() {
                errors.push(CatalogError::BlankRuleField {
                    index,
                    field: "code",
                });
                continue;
            }
            if rule.variable.trim().is_empty() {
                errors.push(CatalogError::BlankRuleField {
                    index,
                    field: "variable",
                });
            }
            if !seen.insert(rule.code.as_str()) && reported.insert(rule.code.as_str()) {
                errors.push(CatalogError::DuplicateRuleCode {
                    code: rule.code.clone(),
                });
            }
        }

        for rule in &self.rules {
            for target in rule.branch_targets() {
                if !seen.contains(target) {
                    errors.push(CatalogError::UnknownBranch {
                        rule: rule.code.clone(),
                        target: target.to_string(),
                    });
                }
            }
        }

        for code in branch_cycles(&self.rules) {
            errors.push(CatalogError::CyclicBranch { code });
        }

        if errors.is_empty() {
            Ok(())
        } else {
            Err(errors)
        }
    }
}

impl RuleCatalog for Resolution {
    fn rule(&self, code: &str) -> Option<&Rule> {
        self.rules.rule(code)
    }
}

// ──────────────────────────────────────────────
// Cycle detection
// ──────────────────────────────────────────────

#[derive(Clone, Copy, PartialEq, Eq)]
enum Mark {
    Visiting,
    Done,
}

/// Codes at which a depth-first walk of the branch graph closes a cycle.
fn branch_cycles(rules: &[Rule]) -> Vec<String> {
    let mut edges: BTreeMap<&str, Vec<&str>> = BTreeMap::new();
    for rule in rules {
        edges
            .entry(rule.code.as_str())
            .or_default()
            .extend(rule.branch_targets());
    }

    let mut marks = BTreeMap::new();
    let mut cycles = BTreeSet::new();
    for rule in rules {
        visit(rule.code.as_str(), &edges, &mut marks, &mut cycles);
    }
    cycles.into_iter().collect()
}

fn visit<'a>(
    code: &'a str,
    edges: &BTreeMap<&'a str, Vec<&'a str>>,
    marks: &mut BTreeMap<&'a str, Mark>,
    cycles: &mut BTreeSet<String>,
) {
    match marks.get(code) {
        Some(Mark::Done) => return,
        Some(Mark::Visiting) => {
            cycles.insert(code.to_string());
            return;
        }
        None => {}
    }
    marks.insert(code, Mark::Visiting);
    if let Some(targets) = edges.get(code) {
        for target in targets {
            if edges.contains_key(target) {
                visit(target, edges, marks, cycles);
            }
        }
    }
    marks.insert(code, Mark::Done);
}
