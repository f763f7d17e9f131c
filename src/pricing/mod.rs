// src/pricing/mod.rs
// Price quotation derived from operator-configured base prices.

use serde::{Deserialize, Serialize};

use crate::store::config::ConfigStore;

/// Fallback when no base price has been configured for a project type.
pub const DEFAULT_BASE_PRICE: i64 = 5000;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ProjectType {
    Web,
    Mobile,
    Ai,
}

impl ProjectType {
    pub fn as_str(&self) -> &'static str {
        match self {
            ProjectType::Web => "web",
            ProjectType::Mobile => "mobile",
            ProjectType::Ai => "ai",
        }
    }

    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "web" => Some(ProjectType::Web),
            "mobile" => Some(ProjectType::Mobile),
            "ai" => Some(ProjectType::Ai),
            _ => None,
        }
    }
}

/// Operator-set base prices per project type, stored under the
/// `base_prices` config key.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BasePrices {
    pub web: i64,
    pub mobile: i64,
    pub ai: i64,
}

impl BasePrices {
    pub fn price_for(&self, project_type: ProjectType) -> i64 {
        match project_type {
            ProjectType::Web => self.web,
            ProjectType::Mobile => self.mobile,
            ProjectType::Ai => self.ai,
        }
    }
}

/// What the proposal page displays for a lead.
#[derive(Debug, Clone, Serialize)]
pub struct Quote {
    pub project_type: ProjectType,
    pub base_price: i64,
    pub delivery_weeks_min: u8,
    pub delivery_weeks_max: u8,
}

/// Delivery-time estimate in weeks, by project type.
pub fn delivery_estimate(project_type: ProjectType) -> (u8, u8) {
    match project_type {
        ProjectType::Ai => (4, 6),
        _ => (3, 5),
    }
}

/// Build a quote from the current configuration. Missing or unreadable
/// configuration falls back to the default base price.
pub async fn quote(config: &ConfigStore, project_type: ProjectType) -> Quote {
    let base_price = config
        .base_prices()
        .await
        .ok()
        .flatten()
        .map(|prices| prices.price_for(project_type))
        .unwrap_or(DEFAULT_BASE_PRICE);

    let (delivery_weeks_min, delivery_weeks_max) = delivery_estimate(project_type);
    Quote {
        project_type,
        base_price,
        delivery_weeks_min,
        delivery_weeks_max,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parse_accepts_known_types_only() {
        assert_eq!(ProjectType::parse("web"), Some(ProjectType::Web));
        assert_eq!(ProjectType::parse("mobile"), Some(ProjectType::Mobile));
        assert_eq!(ProjectType::parse("ai"), Some(ProjectType::Ai));
        assert_eq!(ProjectType::parse("desktop"), None);
    }

    #[test]
    fn price_for_selects_matching_field() {
        let prices = BasePrices {
            web: 8000,
            mobile: 12000,
            ai: 20000,
        };
        assert_eq!(prices.price_for(ProjectType::Web), 8000);
        assert_eq!(prices.price_for(ProjectType::Mobile), 12000);
        assert_eq!(prices.price_for(ProjectType::Ai), 20000);
    }

    #[test]
    fn ai_projects_quote_longer_delivery() {
        assert_eq!(delivery_estimate(ProjectType::Ai), (4, 6));
        assert_eq!(delivery_estimate(ProjectType::Web), (3, 5));
        assert_eq!(delivery_estimate(ProjectType::Mobile), (3, 5));
    }
}
