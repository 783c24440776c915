//! Agent pool selection.
//!
//! Storage supplies the agents that are currently free and approved. The predicates in this module narrow that
//! set down according to the merchant's business category and the allocation policy's priority type.
use log::*;

use crate::db_types::{Agent, Merchant, PriorityType};

/// Agents with this work tag only serve Fish and Meat merchants, and only they do.
pub const FISH_AND_MEAT_TAG: &str = "Fish & Meat";

const RESTRICTED_CATEGORIES: [&str; 2] = ["fish", "meat"];

/// The tag constraint a pool is subject to.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TagRule {
    /// Only agents tagged "Fish & Meat"
    RequireFishAndMeat,
    /// Every agent except those tagged "Fish & Meat"
    ExcludeFishAndMeat,
}

impl TagRule {
    pub fn for_category(category: Option<&str>) -> Self {
        let restricted = category
            .map(|c| RESTRICTED_CATEGORIES.iter().any(|r| c.trim().eq_ignore_ascii_case(r)))
            .unwrap_or(false);
        if restricted {
            TagRule::RequireFishAndMeat
        } else {
            TagRule::ExcludeFishAndMeat
        }
    }

    pub fn admits(&self, agent: &Agent) -> bool {
        let tagged = agent.tag.as_deref().map(|t| t == FISH_AND_MEAT_TAG).unwrap_or(false);
        match self {
            TagRule::RequireFishAndMeat => tagged,
            TagRule::ExcludeFishAndMeat => !tagged,
        }
    }
}

/// The salary-structure constraint a pool is subject to.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SalaryRule {
    Any,
    /// Only agents on this salary structure
    Structure(String),
    /// Salaried agents were requested but the salary structure could not be resolved. Nobody qualifies.
    Unresolved,
}

impl SalaryRule {
    /// `monthly_salaried_rule_id` is the id of the "Monthly-salaried" agent pricing rule, if one exists.
    pub fn for_priority(priority: PriorityType, monthly_salaried_rule_id: Option<String>) -> Self {
        match (priority, monthly_salaried_rule_id) {
            (PriorityType::Default, _) => SalaryRule::Any,
            (PriorityType::MonthlySalaried, Some(id)) => SalaryRule::Structure(id),
            (PriorityType::MonthlySalaried, None) => SalaryRule::Unresolved,
        }
    }

    pub fn admits(&self, agent: &Agent) -> bool {
        match self {
            SalaryRule::Any => true,
            SalaryRule::Structure(id) => agent.salary_structure_id.as_deref() == Some(id.as_str()),
            SalaryRule::Unresolved => false,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PoolCriteria {
    pub tags: TagRule,
    pub salary: SalaryRule,
}

impl PoolCriteria {
    pub fn new(merchant: Option<&Merchant>, priority: PriorityType, monthly_salaried_rule_id: Option<String>) -> Self {
        let tags = TagRule::for_category(merchant.and_then(|m| m.business_category.as_deref()));
        let salary = SalaryRule::for_priority(priority, monthly_salaried_rule_id);
        Self { tags, salary }
    }

    pub fn admits(&self, agent: &Agent) -> bool {
        agent.is_available() && self.tags.admits(agent) && self.salary.admits(agent)
    }

    /// Filters `candidates` down to the eligible pool. The order of the candidates is preserved.
    pub fn select(&self, candidates: Vec<Agent>) -> Vec<Agent> {
        if self.salary == SalaryRule::Unresolved {
            warn!("🛵️ Salaried agents were requested, but there is no Monthly-salaried pricing rule. The pool is empty.");
            return Vec::new();
        }
        let total = candidates.len();
        let pool = candidates.into_iter().filter(|a| self.admits(a)).collect::<Vec<_>>();
        trace!("🛵️ {} of {total} candidate agents are eligible under {self:?}", pool.len());
        pool
    }
}
