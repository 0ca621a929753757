// Copyright 2026 Phillip Cloud
// Licensed under the Apache License, Version 2.0

use anyhow::{Result, anyhow, bail};
use biodex_app::{Species, SpeciesId, SpeciesUpdate, UserId};
use log::debug;
use std::sync::{Mutex, MutexGuard};

use crate::SpeciesStore;

/// In-process store used by `--demo` and tests. Failures can be injected to
/// exercise the error paths without a server.
#[derive(Debug, Default)]
pub struct MemoryStore {
    rows: Mutex<Vec<Species>>,
    writes: Mutex<Vec<(SpeciesId, SpeciesUpdate)>>,
    read_error: Option<String>,
    write_error: Option<String>,
}

impl MemoryStore {
    pub fn new(rows: Vec<Species>) -> Self {
        Self {
            rows: Mutex::new(rows),
            ..Self::default()
        }
    }

    pub fn with_read_error(mut self, message: impl Into<String>) -> Self {
        self.read_error = Some(message.into());
        self
    }

    pub fn with_write_error(mut self, message: impl Into<String>) -> Self {
        self.write_error = Some(message.into());
        self
    }

    pub fn rows(&self) -> Vec<Species> {
        lock(&self.rows).clone()
    }

    pub fn write_count(&self) -> usize {
        lock(&self.writes).len()
    }

    pub fn last_write(&self) -> Option<(SpeciesId, SpeciesUpdate)> {
        lock(&self.writes).last().cloned()
    }
}

impl SpeciesStore for MemoryStore {
    fn list_authored(&self, author: &UserId) -> Result<Vec<Species>> {
        if let Some(message) = &self.read_error {
            return Err(anyhow!("{message}"));
        }
        let mut rows = lock(&self.rows)
            .iter()
            .filter(|species| &species.author == author)
            .cloned()
            .collect::<Vec<_>>();
        rows.sort_by(|a, b| {
            a.scientific_name
                .cmp(&b.scientific_name)
                .then(a.id.cmp(&b.id))
        });
        Ok(rows)
    }

    fn update_species(&self, id: SpeciesId, update: &SpeciesUpdate) -> Result<()> {
        lock(&self.writes).push((id, update.clone()));
        if let Some(message) = &self.write_error {
            return Err(anyhow!("{message}"));
        }

        let mut rows = lock(&self.rows);
        let Some(row) = rows.iter_mut().find(|species| species.id == id) else {
            bail!("species {id} not found or not editable -- reload the list and retry");
        };
        update.apply_to(row);
        debug!("memory store updated species {id}");
        Ok(())
    }
}

fn lock<T>(mutex: &Mutex<T>) -> MutexGuard<'_, T> {
    match mutex.lock() {
        Ok(guard) => guard,
        Err(poisoned) => poisoned.into_inner(),
    }
}
