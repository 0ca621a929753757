// Copyright 2026 Phillip Cloud
// Licensed under the Apache License, Version 2.0

use std::fmt;
use url::Url;

use crate::{Kingdom, Species, SpeciesField, SpeciesUpdate};

/// Raw, editable text for every field of the species form. Values are kept
/// exactly as typed; normalization happens in [`SpeciesFormInput::validate`].
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct SpeciesFormInput {
    pub scientific_name: String,
    pub common_name: String,
    pub kingdom: String,
    pub total_population: String,
    pub image: String,
    pub description: String,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FieldProblem {
    Required,
    UnknownKingdom,
    NotAnInteger,
    NotPositive,
    InvalidUrl,
}

impl FieldProblem {
    pub const fn message(self) -> &'static str {
        match self {
            Self::Required => "is required",
            Self::UnknownKingdom => {
                "must be one of Animalia, Plantae, Fungi, Protista, Archaea, Bacteria"
            }
            Self::NotAnInteger => "must be a whole number",
            Self::NotPositive => "must be at least 1",
            Self::InvalidUrl => "must be a valid URL",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FieldError {
    pub field: SpeciesField,
    pub problem: FieldProblem,
}

impl fmt::Display for FieldError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} {}", self.field.label(), self.problem.message())
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct FieldErrors(Vec<FieldError>);

impl FieldErrors {
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn iter(&self) -> impl Iterator<Item = &FieldError> {
        self.0.iter()
    }

    pub fn for_field(&self, field: SpeciesField) -> Option<FieldProblem> {
        self.0
            .iter()
            .find(|error| error.field == field)
            .map(|error| error.problem)
    }

    pub fn clear_field(&mut self, field: SpeciesField) {
        self.0.retain(|error| error.field != field);
    }

    fn push(&mut self, field: SpeciesField, problem: FieldProblem) {
        self.0.push(FieldError { field, problem });
    }
}

impl fmt::Display for FieldErrors {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut first = true;
        for error in &self.0 {
            if !first {
                f.write_str("; ")?;
            }
            write!(f, "{error}")?;
            first = false;
        }
        Ok(())
    }
}

impl std::error::Error for FieldErrors {}

impl SpeciesFormInput {
    /// Form values for an existing record: absent optionals become empty
    /// text and a missing kingdom falls back to the first choice.
    pub fn from_species(species: &Species) -> Self {
        Self {
            scientific_name: species.scientific_name.clone(),
            common_name: species.common_name.clone().unwrap_or_default(),
            kingdom: species.kingdom.unwrap_or_default().as_str().to_owned(),
            total_population: species
                .total_population
                .map(|population| population.to_string())
                .unwrap_or_default(),
            image: species.image.clone().unwrap_or_default(),
            description: species.description.clone().unwrap_or_default(),
        }
    }

    pub fn value(&self, field: SpeciesField) -> &str {
        match field {
            SpeciesField::ScientificName => &self.scientific_name,
            SpeciesField::CommonName => &self.common_name,
            SpeciesField::Kingdom => &self.kingdom,
            SpeciesField::TotalPopulation => &self.total_population,
            SpeciesField::Image => &self.image,
            SpeciesField::Description => &self.description,
        }
    }

    pub fn value_mut(&mut self, field: SpeciesField) -> &mut String {
        match field {
            SpeciesField::ScientificName => &mut self.scientific_name,
            SpeciesField::CommonName => &mut self.common_name,
            SpeciesField::Kingdom => &mut self.kingdom,
            SpeciesField::TotalPopulation => &mut self.total_population,
            SpeciesField::Image => &mut self.image,
            SpeciesField::Description => &mut self.description,
        }
    }

    pub fn validate(&self) -> Result<SpeciesUpdate, FieldErrors> {
        let mut errors = FieldErrors::default();

        let scientific_name = self.scientific_name.trim();
        if scientific_name.is_empty() {
            errors.push(SpeciesField::ScientificName, FieldProblem::Required);
        }

        let kingdom = Kingdom::parse(&self.kingdom);
        if kingdom.is_none() {
            errors.push(SpeciesField::Kingdom, FieldProblem::UnknownKingdom);
        }

        let total_population = match parse_population(&self.total_population) {
            Ok(value) => value,
            Err(problem) => {
                errors.push(SpeciesField::TotalPopulation, problem);
                None
            }
        };

        let image = normalize_optional(&self.image);
        if let Some(image) = image.as_deref()
            && Url::parse(image).is_err()
        {
            errors.push(SpeciesField::Image, FieldProblem::InvalidUrl);
        }

        let Some(kingdom) = kingdom else {
            return Err(errors);
        };
        if !errors.is_empty() {
            return Err(errors);
        }

        Ok(SpeciesUpdate {
            scientific_name: scientific_name.to_owned(),
            common_name: normalize_optional(&self.common_name),
            kingdom,
            total_population,
            image,
            description: normalize_optional(&self.description),
        })
    }
}

pub fn normalize_optional(raw: &str) -> Option<String> {
    let trimmed = raw.trim();
    if trimmed.is_empty() {
        None
    } else {
        Some(trimmed.to_owned())
    }
}

fn parse_population(raw: &str) -> Result<Option<i64>, FieldProblem> {
    let Some(trimmed) = normalize_optional(raw) else {
        return Ok(None);
    };
    let value = trimmed
        .parse::<i64>()
        .map_err(|_| FieldProblem::NotAnInteger)?;
    if value < 1 {
        return Err(FieldProblem::NotPositive);
    }
    Ok(Some(value))
}

#[cfg(test)]
mod tests {
    use super::{FieldProblem, SpeciesFormInput};
    use crate::{Kingdom, Species, SpeciesField, SpeciesId, UserId};

    fn valid_input() -> SpeciesFormInput {
        SpeciesFormInput {
            scientific_name: "Panthera leo".to_owned(),
            common_name: "Lion".to_owned(),
            kingdom: "Animalia".to_owned(),
            total_population: "23000".to_owned(),
            image: "https://example.com/lion.jpg".to_owned(),
            description: "Large cat".to_owned(),
        }
    }

    #[test]
    fn valid_input_is_trimmed() {
        let input = SpeciesFormInput {
            scientific_name: "  Panthera leo ".to_owned(),
            common_name: "\tLion\n".to_owned(),
            description: "  Large cat  ".to_owned(),
            total_population: " 23000 ".to_owned(),
            ..valid_input()
        };
        let update = input.validate().expect("input should validate");
        assert_eq!(update.scientific_name, "Panthera leo");
        assert_eq!(update.common_name.as_deref(), Some("Lion"));
        assert_eq!(update.description.as_deref(), Some("Large cat"));
        assert_eq!(update.total_population, Some(23_000));
        assert_eq!(update.kingdom, Kingdom::Animalia);
    }

    #[test]
    fn blank_optional_fields_become_absent() {
        let input = SpeciesFormInput {
            common_name: "   ".to_owned(),
            image: String::new(),
            description: " \n ".to_owned(),
            total_population: "  ".to_owned(),
            ..valid_input()
        };
        let update = input.validate().expect("input should validate");
        assert_eq!(update.common_name, None);
        assert_eq!(update.image, None);
        assert_eq!(update.description, None);
        assert_eq!(update.total_population, None);
    }

    #[test]
    fn whitespace_scientific_name_is_required() {
        let input = SpeciesFormInput {
            scientific_name: "   ".to_owned(),
            ..valid_input()
        };
        let errors = input.validate().expect_err("blank name should fail");
        assert_eq!(
            errors.for_field(SpeciesField::ScientificName),
            Some(FieldProblem::Required)
        );
    }

    #[test]
    fn population_must_be_positive_integer() {
        for (raw, problem) in [
            ("0", FieldProblem::NotPositive),
            ("-4", FieldProblem::NotPositive),
            ("12.5", FieldProblem::NotAnInteger),
            ("many", FieldProblem::NotAnInteger),
        ] {
            let input = SpeciesFormInput {
                total_population: raw.to_owned(),
                ..valid_input()
            };
            let errors = input.validate().expect_err("bad population should fail");
            assert_eq!(
                errors.for_field(SpeciesField::TotalPopulation),
                Some(problem),
                "input {raw:?}"
            );
        }

        let one = SpeciesFormInput {
            total_population: "1".to_owned(),
            ..valid_input()
        };
        assert_eq!(one.validate().expect("1 is allowed").total_population, Some(1));
    }

    #[test]
    fn kingdom_outside_fixed_set_is_rejected() {
        let input = SpeciesFormInput {
            kingdom: "Chromista".to_owned(),
            ..valid_input()
        };
        let errors = input.validate().expect_err("unknown kingdom should fail");
        assert_eq!(
            errors.for_field(SpeciesField::Kingdom),
            Some(FieldProblem::UnknownKingdom)
        );
    }

    #[test]
    fn image_must_be_a_url_when_present() {
        let input = SpeciesFormInput {
            image: "not-a-url".to_owned(),
            ..valid_input()
        };
        let errors = input.validate().expect_err("bad url should fail");
        assert_eq!(errors.for_field(SpeciesField::Image), Some(FieldProblem::InvalidUrl));
        assert_eq!(errors.to_string(), "image url must be a valid URL");
    }

    #[test]
    fn every_failing_field_is_reported() {
        let input = SpeciesFormInput {
            scientific_name: String::new(),
            kingdom: "animalia".to_owned(),
            total_population: "0".to_owned(),
            image: "nope".to_owned(),
            ..valid_input()
        };
        let errors = input.validate().expect_err("input should fail");
        assert_eq!(errors.len(), 4);
    }

    #[test]
    fn from_species_fills_blanks_and_defaults_kingdom() {
        let species = Species {
            id: SpeciesId::new(3),
            scientific_name: "Amanita muscaria".to_owned(),
            common_name: None,
            kingdom: None,
            total_population: None,
            image: None,
            description: None,
            author: UserId::parse("user-1").expect("valid user"),
            created_at: None,
        };
        let input = SpeciesFormInput::from_species(&species);
        assert_eq!(input.common_name, "");
        assert_eq!(input.kingdom, "Animalia");
        assert_eq!(input.total_population, "");

        let update = input.validate().expect("round trip should validate");
        assert_eq!(update.common_name, None);
    }
}
