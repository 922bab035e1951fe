//! Triage classifications and legal priority types.
//!
//! The clinical scoring algorithm that assigns a severity label lives
//! outside this engine; we only consume its result as an enum value and
//! rank queue entries by it. The five levels follow the Manchester triage
//! scale, most severe first.

use serde::{Deserialize, Serialize};

/// Rank assigned to entries that have not been triaged yet.
///
/// Unclassified patients sort after every classified level rather than
/// blocking enqueue entirely: triage happens after reception in the intake
/// workflow, so reception queues routinely hold not-yet-classified patients.
pub const UNCLASSIFIED_RANK: u8 = 6;

/// Externally assigned triage severity label.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RiskClassification {
    /// Immediate care required.
    Emergency,
    /// Care within minutes.
    VeryUrgent,
    /// Care within the hour.
    Urgent,
    /// Can wait, reassess periodically.
    LessUrgent,
    /// Non-urgent presentation.
    NonUrgent,
}

impl RiskClassification {
    /// Ordering rank: most severe maps to 1, least severe to 5.
    pub fn rank(self) -> u8 {
        match self {
            RiskClassification::Emergency => 1,
            RiskClassification::VeryUrgent => 2,
            RiskClassification::Urgent => 3,
            RiskClassification::LessUrgent => 4,
            RiskClassification::NonUrgent => 5,
        }
    }

    /// Rank for an optional classification; absent ranks last.
    pub fn rank_or_unclassified(value: Option<RiskClassification>) -> u8 {
        value.map_or(UNCLASSIFIED_RANK, RiskClassification::rank)
    }
}

impl std::fmt::Display for RiskClassification {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let label = match self {
            RiskClassification::Emergency => "Emergency",
            RiskClassification::VeryUrgent => "Very Urgent",
            RiskClassification::Urgent => "Urgent",
            RiskClassification::LessUrgent => "Less Urgent",
            RiskClassification::NonUrgent => "Non Urgent",
        };
        write!(f, "{label}")
    }
}

impl std::str::FromStr for RiskClassification {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().replace([' ', '-'], "_").as_str() {
            "emergency" => Ok(RiskClassification::Emergency),
            "very_urgent" => Ok(RiskClassification::VeryUrgent),
            "urgent" => Ok(RiskClassification::Urgent),
            "less_urgent" => Ok(RiskClassification::LessUrgent),
            "non_urgent" => Ok(RiskClassification::NonUrgent),
            other => Err(format!(
                "invalid risk classification '{other}'; expected one of: \
                 emergency, very_urgent, urgent, less_urgent, non_urgent"
            )),
        }
    }
}

/// Legal priority category granting queue-order preference.
///
/// Set at first enqueue and retained across transfers; a membership with
/// any priority type set is a priority entry.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PriorityType {
    Elderly,
    Pregnant,
    Infant,
    Disabled,
}

impl std::fmt::Display for PriorityType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let label = match self {
            PriorityType::Elderly => "Elderly",
            PriorityType::Pregnant => "Pregnant",
            PriorityType::Infant => "Infant",
            PriorityType::Disabled => "Disabled",
        };
        write!(f, "{label}")
    }
}

impl std::str::FromStr for PriorityType {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "elderly" => Ok(PriorityType::Elderly),
            "pregnant" => Ok(PriorityType::Pregnant),
            "infant" => Ok(PriorityType::Infant),
            "disabled" => Ok(PriorityType::Disabled),
            other => Err(format!(
                "invalid priority type '{other}'; expected one of: \
                 elderly, pregnant, infant, disabled"
            )),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_ranks_most_severe_first() {
        let ordered = [
            RiskClassification::Emergency,
            RiskClassification::VeryUrgent,
            RiskClassification::Urgent,
            RiskClassification::LessUrgent,
            RiskClassification::NonUrgent,
        ];
        for (idx, class) in ordered.iter().enumerate() {
            assert_eq!(class.rank(), idx as u8 + 1);
        }
    }

    #[test]
    fn test_unclassified_ranks_last() {
        assert_eq!(RiskClassification::rank_or_unclassified(None), 6);
        assert!(
            RiskClassification::rank_or_unclassified(Some(RiskClassification::NonUrgent))
                < RiskClassification::rank_or_unclassified(None)
        );
    }

    #[test]
    fn test_parses_mixed_case_and_spaces() {
        assert_eq!(
            "Very Urgent".parse::<RiskClassification>().unwrap(),
            RiskClassification::VeryUrgent
        );
        assert_eq!(
            "non-urgent".parse::<RiskClassification>().unwrap(),
            RiskClassification::NonUrgent
        );
        assert!("critical".parse::<RiskClassification>().is_err());
    }

    #[test]
    fn test_priority_type_parses() {
        assert_eq!(
            "Elderly".parse::<PriorityType>().unwrap(),
            PriorityType::Elderly
        );
        assert!("vip".parse::<PriorityType>().is_err());
    }
}
