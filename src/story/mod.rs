//! Stories: the unit of work driven through the gate sequence.
//!
//! A story document lives under the configured story root as JSON or YAML.
//! [`StoryRepository`] finds it, [`schema::validate`] checks it against the
//! active schema version and produces a read-only [`Story`].

mod repository;
pub mod schema;

pub use repository::{STORY_EXTENSIONS, StoryRepository};

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Ordered criticality scale. `A` demands the most rigor, `E` the least.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum Criticality {
    A,
    B,
    C,
    D,
    E,
}

impl Criticality {
    /// Verification rigor expected at this level, rendered into gate prompts.
    pub fn rigor(self) -> &'static str {
        match self {
            Criticality::A => {
                "Mission critical: require explicit evidence for every checklist item and treat any doubt as FAIL"
            }
            Criticality::B => {
                "High: require evidence for every acceptance criterion and review edge cases"
            }
            Criticality::C => "Standard: verify every acceptance criterion and the main edge cases",
            Criticality::D => "Low: verify the primary acceptance criteria",
            Criticality::E => "Minimal: a smoke-level check is sufficient",
        }
    }
}

impl fmt::Display for Criticality {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let letter = match self {
            Criticality::A => "A",
            Criticality::B => "B",
            Criticality::C => "C",
            Criticality::D => "D",
            Criticality::E => "E",
        };
        f.write_str(letter)
    }
}

impl FromStr for Criticality {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_uppercase().as_str() {
            "A" => Ok(Criticality::A),
            "B" => Ok(Criticality::B),
            "C" => Ok(Criticality::C),
            "D" => Ok(Criticality::D),
            "E" => Ok(Criticality::E),
            _ => Err(format!("'{}' is not a criticality level (expected A-E)", s)),
        }
    }
}

/// Technical domain of a story. Drives role resolution for implementation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Domain {
    Frontend,
    Backend,
    Fullstack,
    Infra,
    #[default]
    Unspecified,
}

impl Domain {
    /// Lenient classification; unknown labels become `Unspecified`.
    pub fn classify(label: &str) -> Domain {
        match label.trim().to_lowercase().as_str() {
            "frontend" | "fe" | "ui" | "web" => Domain::Frontend,
            "backend" | "be" | "api" | "server" => Domain::Backend,
            "fullstack" | "full-stack" => Domain::Fullstack,
            "infra" | "infrastructure" | "ops" | "devops" => Domain::Infra,
            _ => Domain::Unspecified,
        }
    }
}

impl fmt::Display for Domain {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let label = match self {
            Domain::Frontend => "frontend",
            Domain::Backend => "backend",
            Domain::Fullstack => "fullstack",
            Domain::Infra => "infra",
            Domain::Unspecified => "unspecified",
        };
        f.write_str(label)
    }
}

/// A single acceptance criterion in WHEN/IF/THEN form.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AcceptanceCriterion {
    pub id: String,
    /// Type tag, e.g. "functional" or "performance".
    #[serde(rename = "type")]
    pub kind: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub trigger: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub condition: Option<String>,
    pub behavior: String,
}

/// A validated story. Read-only for the duration of a run.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Story {
    pub id: String,
    pub title: String,
    pub epic: String,
    #[serde(default)]
    pub domain: Domain,
    #[serde(default)]
    pub wave: u32,
    pub criticality: Criticality,
    pub status: String,
    pub acceptance_criteria: Vec<AcceptanceCriterion>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_criticality_ordering() {
        assert!(Criticality::A < Criticality::B);
        assert!(Criticality::D < Criticality::E);
    }

    #[test]
    fn test_criticality_parse_is_case_insensitive() {
        assert_eq!("c".parse::<Criticality>().unwrap(), Criticality::C);
        assert_eq!(" A ".parse::<Criticality>().unwrap(), Criticality::A);
        assert!("F".parse::<Criticality>().is_err());
        assert!("".parse::<Criticality>().is_err());
    }

    #[test]
    fn test_domain_classify() {
        assert_eq!(Domain::classify("Frontend"), Domain::Frontend);
        assert_eq!(Domain::classify("api"), Domain::Backend);
        assert_eq!(Domain::classify("devops"), Domain::Infra);
        assert_eq!(Domain::classify("payments"), Domain::Unspecified);
    }
}
