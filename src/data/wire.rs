//! Wire format of the `/api/v1/evaluate` endpoint.
//!
//! Request: the list of expressions to evaluate and a "situation" (rule name →
//! value string). Response: one evaluated node per expression, in order.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use crate::domain::TaxMode;

pub const EXPR_EMPLOYER_COST: &str = "salarié . coût total employeur";
pub const EXPR_GROSS: &str = "salarié . contrat . salaire brut";
pub const EXPR_NET: &str = "salarié . rémunération . net . à payer avant impôt";
pub const EXPR_NET_AFTER_TAX: &str = "salarié . rémunération . net . payé après impôt";
pub const EXPR_TAX: &str = "impôt . montant";

/// Expressions requested for every sample. Response nodes follow this order.
pub const EXPRESSIONS: [&str; 5] = [
    EXPR_EMPLOYER_COST,
    EXPR_GROSS,
    EXPR_NET,
    EXPR_NET_AFTER_TAX,
    EXPR_TAX,
];

const SITUATION_GROSS: &str = "salarié . contrat . salaire brut";
const SITUATION_PART_TIME: &str = "salarié . contrat . temps de travail . temps partiel";
const SITUATION_QUOTITE: &str = "salarié . contrat . temps de travail . quotité";
const SITUATION_EXECUTIVE: &str = "salarié . contrat . statut cadre";
const SITUATION_CUSTOM_RATE_ON: &str = "impôt . méthode de calcul . taux personnalisé";
const SITUATION_CUSTOM_RATE: &str = "impôt . taux personnalisé";

const UNIT_EURO: &str = "€";
const UNIT_MONTH: &str = "mois";

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct EvaluateRequest {
    pub expressions: Vec<String>,
    pub situation: BTreeMap<String, String>,
}

impl EvaluateRequest {
    pub fn new(situation: BTreeMap<String, String>) -> Self {
        Self {
            expressions: EXPRESSIONS.iter().map(|s| s.to_string()).collect(),
            situation,
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct EvaluateResponse {
    pub evaluate: Vec<EvaluatedNode>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct EvaluatedNode {
    #[serde(rename = "nodeValue", default)]
    pub node_value: Option<f64>,
    #[serde(default)]
    pub unit: Option<NodeUnit>,
}

impl EvaluatedNode {
    /// Value converted to an annual figure, if any.
    pub fn annual_value(&self) -> Option<f64> {
        self.node_value.map(|v| to_annual(v, self.unit.as_ref()))
    }
}

#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
pub struct NodeUnit {
    #[serde(default)]
    pub numerators: Vec<String>,
    #[serde(default)]
    pub denominators: Vec<String>,
}

impl NodeUnit {
    pub fn is_euro_per_month(&self) -> bool {
        self.numerators.len() == 1
            && self.numerators[0] == UNIT_EURO
            && self.denominators.len() == 1
            && self.denominators[0] == UNIT_MONTH
    }
}

/// Convert a €/month value to €/year; anything else is returned unchanged.
pub fn to_annual(value: f64, unit: Option<&NodeUnit>) -> f64 {
    match unit {
        Some(u) if u.is_euro_per_month() => value * 12.0,
        _ => value,
    }
}

/// Part-time quotient: inputs below the full-time reference are modelled as
/// part-time work rather than as invalid salaries.
pub fn part_time_quotient(gross: f64, reference_salary: f64) -> f64 {
    (gross / reference_salary).min(1.0)
}

/// Build the synthetic employment situation for one gross annual salary.
pub fn build_situation(gross: i64, reference_salary: f64, tax_mode: TaxMode) -> BTreeMap<String, String> {
    let quotite = part_time_quotient(gross as f64, reference_salary);
    let part_time = if quotite < 1.0 { "oui" } else { "non" };

    let mut situation = BTreeMap::new();
    situation.insert(SITUATION_GROSS.to_string(), format!("{gross} €/an"));
    situation.insert(SITUATION_PART_TIME.to_string(), part_time.to_string());
    situation.insert(SITUATION_QUOTITE.to_string(), format!("{:.4} %", quotite * 100.0));
    situation.insert(SITUATION_EXECUTIVE.to_string(), "non".to_string());

    if let TaxMode::CustomRate(pct) = tax_mode {
        situation.insert(SITUATION_CUSTOM_RATE_ON.to_string(), "oui".to_string());
        situation.insert(SITUATION_CUSTOM_RATE.to_string(), format!("{pct} %"));
    }

    situation
}
