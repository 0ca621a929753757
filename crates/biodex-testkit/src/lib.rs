// Copyright 2026 Phillip Cloud
// Licensed under the Apache License, Version 2.0

use biodex_app::{Kingdom, Species, SpeciesId, UserId};
use time::macros::datetime;
use time::{Duration, OffsetDateTime};

/// (scientific name, common name, kingdom) triples the faker draws from.
const CATALOG: [(&str, &str, Kingdom); 24] = [
    ("Panthera leo", "Lion", Kingdom::Animalia),
    ("Ursus arctos", "Brown bear", Kingdom::Animalia),
    ("Vulpes vulpes", "Red fox", Kingdom::Animalia),
    ("Haliaeetus leucocephalus", "Bald eagle", Kingdom::Animalia),
    ("Danaus plexippus", "Monarch butterfly", Kingdom::Animalia),
    ("Octopus vulgaris", "Common octopus", Kingdom::Animalia),
    ("Quercus robur", "English oak", Kingdom::Plantae),
    ("Sequoiadendron giganteum", "Giant sequoia", Kingdom::Plantae),
    ("Helianthus annuus", "Sunflower", Kingdom::Plantae),
    ("Nymphaea alba", "White water lily", Kingdom::Plantae),
    ("Drosera rotundifolia", "Round-leaved sundew", Kingdom::Plantae),
    ("Amanita muscaria", "Fly agaric", Kingdom::Fungi),
    ("Cantharellus cibarius", "Golden chanterelle", Kingdom::Fungi),
    ("Pleurotus ostreatus", "Oyster mushroom", Kingdom::Fungi),
    ("Saccharomyces cerevisiae", "Brewer's yeast", Kingdom::Fungi),
    ("Amoeba proteus", "", Kingdom::Protista),
    ("Paramecium caudatum", "", Kingdom::Protista),
    ("Euglena gracilis", "", Kingdom::Protista),
    ("Methanobrevibacter smithii", "", Kingdom::Archaea),
    ("Halobacterium salinarum", "", Kingdom::Archaea),
    ("Sulfolobus acidocaldarius", "", Kingdom::Archaea),
    ("Escherichia coli", "E. coli", Kingdom::Bacteria),
    ("Bacillus subtilis", "Hay bacillus", Kingdom::Bacteria),
    ("Lactobacillus acidophilus", "", Kingdom::Bacteria),
];

const HABITATS: [&str; 12] = [
    "temperate forest",
    "grassland",
    "wetland",
    "alpine meadow",
    "coastal shelf",
    "river delta",
    "hot spring",
    "salt flat",
    "leaf litter",
    "human gut",
    "savanna",
    "boreal forest",
];

const TRAITS: [&str; 12] = [
    "solitary",
    "colonial",
    "nocturnal",
    "migratory",
    "slow growing",
    "drought tolerant",
    "symbiotic",
    "thermophilic",
    "long lived",
    "fast spreading",
    "seasonal",
    "widely studied",
];

#[derive(Debug, Clone)]
struct DeterministicRng {
    state: u64,
}

impl DeterministicRng {
    fn new(seed: u64) -> Self {
        let mut state = seed ^ 0x9E37_79B9_7F4A_7C15;
        if state == 0 {
            state = 0xA409_3822_299F_31D0;
        }
        Self { state }
    }

    fn next_u64(&mut self) -> u64 {
        self.state = self
            .state
            .wrapping_mul(6_364_136_223_846_793_005)
            .wrapping_add(1_442_695_040_888_963_407);

        let mut x = self.state;
        x ^= x >> 13;
        x ^= x << 7;
        x ^= x >> 17;
        x
    }

    fn int_n(&mut self, n: usize) -> usize {
        if n <= 1 {
            return 0;
        }
        (self.next_u64() % (n as u64)) as usize
    }

    fn chance(&mut self, percent: u64) -> bool {
        self.next_u64() % 100 < percent
    }
}

/// Seeded generator of plausible species rows for demos and tests.
#[derive(Debug, Clone)]
pub struct SpeciesFaker {
    rng: DeterministicRng,
}

impl SpeciesFaker {
    pub fn new(seed: u64) -> Self {
        let normalized = if seed == 0 { 1 } else { seed };
        Self {
            rng: DeterministicRng::new(normalized),
        }
    }

    /// One record per catalog entry (up to `count`), in a shuffled order,
    /// with optional fields left out at random.
    pub fn species_for(&mut self, author: &UserId, count: usize) -> Vec<Species> {
        let mut order = (0..CATALOG.len()).collect::<Vec<_>>();
        for index in (1..order.len()).rev() {
            let swap = self.rng.int_n(index + 1);
            order.swap(index, swap);
        }

        order
            .into_iter()
            .take(count)
            .enumerate()
            .map(|(position, catalog_index)| {
                let (scientific, common, kingdom) = CATALOG[catalog_index];
                let id = SpeciesId::new(position as i64 + 1);
                self.species(id, scientific, common, kingdom, author)
            })
            .collect()
    }

    fn species(
        &mut self,
        id: SpeciesId,
        scientific: &str,
        common: &str,
        kingdom: Kingdom,
        author: &UserId,
    ) -> Species {
        let common_name = (!common.is_empty()).then(|| common.to_owned());
        let total_population = self
            .rng
            .chance(70)
            .then(|| 1 + (self.rng.next_u64() % 5_000_000) as i64);
        let image = self.rng.chance(50).then(|| {
            format!(
                "https://images.example.org/species/{}.jpg",
                scientific.to_ascii_lowercase().replace(' ', "-")
            )
        });
        let description = self.rng.chance(80).then(|| self.description());
        // A few rows carry no kingdom so the form default gets exercised.
        let kingdom = (!self.rng.chance(8)).then_some(kingdom);
        let created_at =
            reference_now() + Duration::hours((self.rng.next_u64() % (24 * 365)) as i64);

        Species {
            id,
            scientific_name: scientific.to_owned(),
            common_name,
            kingdom,
            total_population,
            image,
            description,
            author: author.clone(),
            created_at: Some(created_at),
        }
    }

    fn description(&mut self) -> String {
        let trait_name = TRAITS[self.rng.int_n(TRAITS.len())];
        let habitat = HABITATS[self.rng.int_n(HABITATS.len())];
        let mut sentence = format!("{trait_name} species found in {habitat}.");
        if let Some(first) = sentence.get_mut(0..1) {
            first.make_ascii_uppercase();
        }
        sentence
    }
}

/// Demo dataset: a dozen rows for `author` plus a few owned by someone else,
/// so author scoping is visible.
pub fn demo_species(author: &UserId) -> Vec<Species> {
    let mut faker = SpeciesFaker::new(7);
    let mut rows = faker.species_for(author, 12);

    let Ok(other) = UserId::parse("someone-else") else {
        return rows;
    };
    let next_id = rows.len() as i64 + 1;
    rows.extend(
        SpeciesFaker::new(11)
            .species_for(&other, 4)
            .into_iter()
            .enumerate()
            .map(|(offset, mut species)| {
                species.id = SpeciesId::new(next_id + offset as i64);
                species
            }),
    );
    rows
}

/// Fully populated record with predictable values.
pub fn sample_species(id: i64, scientific_name: &str, author: &UserId) -> Species {
    Species {
        id: SpeciesId::new(id),
        scientific_name: scientific_name.to_owned(),
        common_name: Some(format!("{scientific_name} (common)")),
        kingdom: Some(Kingdom::Animalia),
        total_population: Some(1_000),
        image: Some("https://images.example.org/species/sample.jpg".to_owned()),
        description: Some("Sample record".to_owned()),
        author: author.clone(),
        created_at: Some(reference_now()),
    }
}

/// `sample_species` with every optional column absent.
pub fn sparse_species(id: i64, scientific_name: &str, author: &UserId) -> Species {
    Species {
        common_name: None,
        kingdom: None,
        total_population: None,
        image: None,
        description: None,
        created_at: None,
        ..sample_species(id, scientific_name, author)
    }
}

fn reference_now() -> OffsetDateTime {
    datetime!(2026-01-01 0:00 UTC)
}
