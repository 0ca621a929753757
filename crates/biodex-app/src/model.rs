// Copyright 2026 Phillip Cloud
// Licensed under the Apache License, Version 2.0

use serde::{Deserialize, Serialize};
use time::OffsetDateTime;

use crate::ids::*;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Kingdom {
    Animalia,
    Plantae,
    Fungi,
    Protista,
    Archaea,
    Bacteria,
}

impl Kingdom {
    pub const ALL: [Self; 6] = [
        Self::Animalia,
        Self::Plantae,
        Self::Fungi,
        Self::Protista,
        Self::Archaea,
        Self::Bacteria,
    ];

    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Animalia => "Animalia",
            Self::Plantae => "Plantae",
            Self::Fungi => "Fungi",
            Self::Protista => "Protista",
            Self::Archaea => "Archaea",
            Self::Bacteria => "Bacteria",
        }
    }

    /// Exact, case-sensitive match against the stored spelling.
    pub fn parse(value: &str) -> Option<Self> {
        match value {
            "Animalia" => Some(Self::Animalia),
            "Plantae" => Some(Self::Plantae),
            "Fungi" => Some(Self::Fungi),
            "Protista" => Some(Self::Protista),
            "Archaea" => Some(Self::Archaea),
            "Bacteria" => Some(Self::Bacteria),
            _ => None,
        }
    }

    pub fn position(self) -> usize {
        Self::ALL
            .iter()
            .position(|kingdom| *kingdom == self)
            .unwrap_or(0)
    }

    pub fn rotate(self, delta: isize) -> Self {
        let len = Self::ALL.len() as isize;
        let next = (self.position() as isize + delta).rem_euclid(len) as usize;
        Self::ALL[next]
    }
}

impl Default for Kingdom {
    fn default() -> Self {
        Self::ALL[0]
    }
}

/// One row of the remote `species` table, already checked at the store
/// boundary. `kingdom` is `None` when the stored value is missing or unknown.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Species {
    pub id: SpeciesId,
    pub scientific_name: String,
    pub common_name: Option<String>,
    pub kingdom: Option<Kingdom>,
    pub total_population: Option<i64>,
    pub image: Option<String>,
    pub description: Option<String>,
    pub author: UserId,
    pub created_at: Option<OffsetDateTime>,
}

impl Species {
    pub fn display_name(&self) -> String {
        match self.common_name.as_deref() {
            Some(common) if !common.is_empty() => {
                format!("{} ({common})", self.scientific_name)
            }
            _ => self.scientific_name.clone(),
        }
    }
}

/// Normalized values for the six editable columns. Every update sends all of
/// them; `None` goes over the wire as `null`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SpeciesUpdate {
    pub scientific_name: String,
    pub common_name: Option<String>,
    pub kingdom: Kingdom,
    pub total_population: Option<i64>,
    pub image: Option<String>,
    pub description: Option<String>,
}

impl SpeciesUpdate {
    pub fn apply_to(&self, species: &mut Species) {
        species.scientific_name = self.scientific_name.clone();
        species.common_name = self.common_name.clone();
        species.kingdom = Some(self.kingdom);
        species.total_population = self.total_population;
        species.image = self.image.clone();
        species.description = self.description.clone();
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum SpeciesField {
    ScientificName,
    CommonName,
    Kingdom,
    TotalPopulation,
    Image,
    Description,
}

impl SpeciesField {
    pub const ALL: [Self; 6] = [
        Self::ScientificName,
        Self::CommonName,
        Self::Kingdom,
        Self::TotalPopulation,
        Self::Image,
        Self::Description,
    ];

    /// Column name in the remote table.
    pub const fn column(self) -> &'static str {
        match self {
            Self::ScientificName => "scientific_name",
            Self::CommonName => "common_name",
            Self::Kingdom => "kingdom",
            Self::TotalPopulation => "total_population",
            Self::Image => "image",
            Self::Description => "description",
        }
    }

    pub const fn label(self) -> &'static str {
        match self {
            Self::ScientificName => "scientific name",
            Self::CommonName => "common name",
            Self::Kingdom => "kingdom",
            Self::TotalPopulation => "total population",
            Self::Image => "image url",
            Self::Description => "description",
        }
    }

    pub const fn is_choice(self) -> bool {
        matches!(self, Self::Kingdom)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Severity {
    Info,
    Success,
    Error,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Notification {
    pub title: String,
    pub description: Option<String>,
    pub severity: Severity,
}

impl Notification {
    pub fn info(title: impl Into<String>) -> Self {
        Self {
            title: title.into(),
            description: None,
            severity: Severity::Info,
        }
    }

    pub fn success(title: impl Into<String>, description: impl Into<String>) -> Self {
        Self {
            title: title.into(),
            description: Some(description.into()),
            severity: Severity::Success,
        }
    }

    pub fn error(title: impl Into<String>, description: impl Into<String>) -> Self {
        Self {
            title: title.into(),
            description: Some(description.into()),
            severity: Severity::Error,
        }
    }

    pub fn render(&self) -> String {
        match self.description.as_deref() {
            Some(description) if !description.is_empty() => {
                format!("{}: {description}", self.title)
            }
            _ => self.title.clone(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::{Kingdom, Notification, Severity};

    #[test]
    fn kingdom_parse_is_case_sensitive() {
        assert_eq!(Kingdom::parse("Fungi"), Some(Kingdom::Fungi));
        assert_eq!(Kingdom::parse("fungi"), None);
        assert_eq!(Kingdom::parse("Chromista"), None);
    }

    #[test]
    fn kingdom_round_trips_through_as_str() {
        for kingdom in Kingdom::ALL {
            assert_eq!(Kingdom::parse(kingdom.as_str()), Some(kingdom));
        }
    }

    #[test]
    fn kingdom_rotation_wraps() {
        assert_eq!(Kingdom::Bacteria.rotate(1), Kingdom::Animalia);
        assert_eq!(Kingdom::Animalia.rotate(-1), Kingdom::Bacteria);
        assert_eq!(Kingdom::default(), Kingdom::Animalia);
    }

    #[test]
    fn notification_render_joins_title_and_description() {
        let note = Notification::error("Error fetching species", "network error");
        assert_eq!(note.severity, Severity::Error);
        assert_eq!(note.render(), "Error fetching species: network error");
        assert_eq!(Notification::info("No species selected").render(), "No species selected");
    }
}
