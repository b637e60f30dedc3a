use ratatui::style::Color;

/// One swatch on the legend card
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct RiskTier {
    pub label: &'static str,
    pub color: Color,
}

impl RiskTier {
    /// Tier used to tint a marker with the given score
    pub fn for_score(score: f64) -> RiskTier {
        if score >= 4.0 {
            RISK_TIERS[0]
        } else if score >= 2.0 {
            RISK_TIERS[1]
        } else {
            RISK_TIERS[2]
        }
    }
}

pub const LEGEND_TITLE: &str = "Risk Levels";

/// Highest first
pub const RISK_TIERS: [RiskTier; 3] = [
    RiskTier {
        label: "High Risk",
        color: Color::Rgb(239, 68, 68),
    },
    RiskTier {
        label: "Medium Risk",
        color: Color::Rgb(249, 115, 22),
    },
    RiskTier {
        label: "Low Risk",
        color: Color::Rgb(234, 179, 8),
    },
];

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_tier_for_score() {
        assert_eq!(RiskTier::for_score(5.0).label, "High Risk");
        assert_eq!(RiskTier::for_score(2.0).label, "Medium Risk");
        assert_eq!(RiskTier::for_score(-1.0).label, "Low Risk");
        assert_eq!(RiskTier::for_score(40.0).label, "High Risk");
    }
}
