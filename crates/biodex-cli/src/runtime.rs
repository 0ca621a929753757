// Copyright 2026 Phillip Cloud
// Licensed under the Apache License, Version 2.0

use anyhow::Result;
use biodex_app::{Species, SpeciesId, SpeciesUpdate, UserId};
use biodex_store::SpeciesStore;
use log::info;

/// Bridges the UI to whichever store the CLI opened.
pub struct StoreRuntime<'a> {
    store: &'a dyn SpeciesStore,
    saved: Vec<SpeciesId>,
}

impl<'a> StoreRuntime<'a> {
    pub fn new(store: &'a dyn SpeciesStore) -> Self {
        Self {
            store,
            saved: Vec::new(),
        }
    }

    pub fn saved(&self) -> &[SpeciesId] {
        &self.saved
    }
}

impl biodex_tui::SpeciesRuntime for StoreRuntime<'_> {
    fn list_species(&mut self, author: &UserId) -> Result<Vec<Species>> {
        self.store.list_authored(author)
    }

    fn update_species(&mut self, id: SpeciesId, update: &SpeciesUpdate) -> Result<()> {
        self.store.update_species(id, update)
    }

    fn species_saved(&mut self, id: SpeciesId) -> Result<()> {
        info!("species {id} saved this session");
        self.saved.push(id);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::StoreRuntime;
    use anyhow::Result;
    use biodex_app::{SpeciesFormInput, SpeciesId, UserId};
    use biodex_store::MemoryStore;
    use biodex_testkit::{sample_species, sparse_species};
    use biodex_tui::SpeciesRuntime;

    #[test]
    fn list_is_scoped_to_the_requested_author() -> Result<()> {
        let alice = UserId::parse("alice")?;
        let bob = UserId::parse("bob")?;
        let store = MemoryStore::new(vec![
            sample_species(1, "Canis lupus", &alice),
            sample_species(2, "Felis catus", &bob),
        ]);

        let mut runtime = StoreRuntime::new(&store);
        let rows = runtime.list_species(&alice)?;
        assert_eq!(rows.len(), 1);
        assert_eq!(rows[0].scientific_name, "Canis lupus");
        Ok(())
    }

    #[test]
    fn update_writes_through_and_saved_hook_records_id() -> Result<()> {
        let alice = UserId::parse("alice")?;
        let store = MemoryStore::new(vec![sparse_species(4, "Euglena gracilis", &alice)]);
        let mut runtime = StoreRuntime::new(&store);

        let mut form = SpeciesFormInput::from_species(&store.rows()[0]);
        form.common_name = "  ".to_owned();
        form.total_population = "12".to_owned();
        let update = form.validate()?;

        runtime.update_species(SpeciesId::new(4), &update)?;
        runtime.species_saved(SpeciesId::new(4))?;

        let row = &store.rows()[0];
        assert_eq!(row.common_name, None);
        assert_eq!(row.total_population, Some(12));
        assert_eq!(store.write_count(), 1);
        assert_eq!(runtime.saved(), &[SpeciesId::new(4)]);
        Ok(())
    }

    #[test]
    fn store_errors_pass_through_unchanged() -> Result<()> {
        let alice = UserId::parse("alice")?;
        let store = MemoryStore::default().with_read_error("network error");
        let mut runtime = StoreRuntime::new(&store);

        let error = runtime
            .list_species(&alice)
            .expect_err("injected read error should surface");
        assert_eq!(error.to_string(), "network error");
        Ok(())
    }
}
