// Copyright 2026 Phillip Cloud
// Licensed under the Apache License, Version 2.0

mod memory;

use anyhow::{Context, Result, anyhow, bail};
use biodex_app::{Kingdom, Species, SpeciesId, SpeciesUpdate, UserId, normalize_optional};
use log::{debug, info, warn};
use reqwest::StatusCode;
use reqwest::blocking::{Client as HttpClient, RequestBuilder};
use serde::Deserialize;
use std::time::Duration;
use time::OffsetDateTime;
use time::format_description::well_known::Rfc3339;
use url::Url;

pub use memory::MemoryStore;

pub const DEFAULT_TABLE: &str = "species";

/// Read/write access to the hosted species table.
pub trait SpeciesStore {
    /// Every record whose `author` is `author`, ordered by scientific name.
    fn list_authored(&self, author: &UserId) -> Result<Vec<Species>>;

    /// Replace the six editable columns of one record.
    fn update_species(&self, id: SpeciesId, update: &SpeciesUpdate) -> Result<()>;

    /// Reachability and credential check used by `--check`.
    fn check(&self) -> Result<()> {
        Ok(())
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RestOptions {
    pub base_url: String,
    pub api_key: String,
    pub access_token: Option<String>,
    pub table: String,
    pub timeout: Duration,
}

/// PostgREST client for the species table.
#[derive(Debug, Clone)]
pub struct RestStore {
    base_url: String,
    table_url: Url,
    api_key: String,
    access_token: Option<String>,
    timeout: Duration,
    http: HttpClient,
}

impl RestStore {
    pub fn new(options: RestOptions) -> Result<Self> {
        let base_url = options.base_url.trim().trim_end_matches('/').to_owned();
        if base_url.is_empty() {
            bail!("store.base_url must not be empty");
        }
        if options.api_key.trim().is_empty() {
            bail!("store.api_key must not be empty -- set [store].api_key or BIODEX_API_KEY");
        }
        let table = options.table.trim();
        if table.is_empty() || !table.chars().all(|c| c.is_ascii_alphanumeric() || c == '_') {
            bail!("store.table {table:?} must be a plain table name like \"species\"");
        }

        let table_url = Url::parse(&format!("{base_url}/rest/v1/{table}"))
            .with_context(|| format!("invalid store.base_url {base_url:?}"))?;

        let http = HttpClient::builder()
            .timeout(options.timeout)
            .build()
            .context("build HTTP client")?;

        Ok(Self {
            base_url,
            table_url,
            api_key: options.api_key.trim().to_owned(),
            access_token: options
                .access_token
                .as_deref()
                .and_then(normalize_optional),
            timeout: options.timeout,
            http,
        })
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    pub fn timeout(&self) -> Duration {
        self.timeout
    }

    fn authorize(&self, request: RequestBuilder) -> RequestBuilder {
        let token = self.access_token.as_deref().unwrap_or(&self.api_key);
        request
            .header("apikey", &self.api_key)
            .bearer_auth(token)
    }

    fn list_url(&self, author: &UserId) -> Url {
        let mut url = self.table_url.clone();
        url.query_pairs_mut()
            .append_pair("select", "*")
            .append_pair("author", &format!("eq.{author}"))
            .append_pair("order", "scientific_name.asc");
        url
    }

    fn update_url(&self, id: SpeciesId) -> Url {
        let mut url = self.table_url.clone();
        url.query_pairs_mut()
            .append_pair("id", &format!("eq.{id}"))
            .append_pair("select", "id");
        url
    }
}

impl SpeciesStore for RestStore {
    fn list_authored(&self, author: &UserId) -> Result<Vec<Species>> {
        let url = self.list_url(author);
        debug!("fetching species for author {author}");
        let response = self
            .authorize(self.http.get(url))
            .send()
            .map_err(|error| connection_error(&self.base_url, error))?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().unwrap_or_default();
            return Err(clean_error_response(status, &body));
        }

        let rows: Vec<SpeciesRow> = response.json().context("decode species rows")?;
        let species = rows
            .into_iter()
            .map(SpeciesRow::into_species)
            .collect::<Result<Vec<_>>>()?;
        info!("loaded {} species for author {author}", species.len());
        Ok(species)
    }

    fn update_species(&self, id: SpeciesId, update: &SpeciesUpdate) -> Result<()> {
        let url = self.update_url(id);
        debug!("updating species {id}");
        let response = self
            .authorize(self.http.patch(url))
            .header("Prefer", "return=representation")
            .json(update)
            .send()
            .map_err(|error| connection_error(&self.base_url, error))?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().unwrap_or_default();
            return Err(clean_error_response(status, &body));
        }

        let touched: Vec<UpdatedRow> = response.json().context("decode update response")?;
        if !touched.iter().any(|row| row.id == id.get()) {
            bail!("species {id} not found or not editable -- reload the list and retry");
        }
        info!("updated species {id}");
        Ok(())
    }

    fn check(&self) -> Result<()> {
        let mut url = self.table_url.clone();
        url.query_pairs_mut()
            .append_pair("select", "id")
            .append_pair("limit", "1");
        let response = self
            .authorize(self.http.get(url))
            .send()
            .map_err(|error| connection_error(&self.base_url, error))?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().unwrap_or_default();
            return Err(clean_error_response(status, &body));
        }
        Ok(())
    }
}

/// Row shape as returned by the REST endpoint. Everything except `id` is
/// optional here and checked in [`SpeciesRow::into_species`].
#[derive(Debug, Clone, Deserialize)]
struct SpeciesRow {
    id: i64,
    scientific_name: Option<String>,
    common_name: Option<String>,
    kingdom: Option<String>,
    total_population: Option<i64>,
    image: Option<String>,
    description: Option<String>,
    author: Option<String>,
    created_at: Option<String>,
}

impl SpeciesRow {
    fn into_species(self) -> Result<Species> {
        let author = self
            .author
            .as_deref()
            .ok_or_else(|| anyhow!("species row {} has no author", self.id))
            .and_then(UserId::parse)
            .with_context(|| format!("decode author of species row {}", self.id))?;

        let kingdom = match self.kingdom.as_deref() {
            None => None,
            Some(raw) => {
                let parsed = Kingdom::parse(raw);
                if parsed.is_none() {
                    warn!("species row {} has unknown kingdom {raw:?}", self.id);
                }
                parsed
            }
        };

        let created_at = self.created_at.as_deref().and_then(|raw| {
            OffsetDateTime::parse(raw, &Rfc3339)
                .inspect_err(|error| {
                    warn!("species row {} has bad created_at {raw:?}: {error}", self.id);
                })
                .ok()
        });

        Ok(Species {
            id: SpeciesId::new(self.id),
            scientific_name: self
                .scientific_name
                .map(|name| name.trim().to_owned())
                .unwrap_or_default(),
            common_name: self.common_name.as_deref().and_then(normalize_optional),
            kingdom,
            total_population: self.total_population,
            image: self.image.as_deref().and_then(normalize_optional),
            description: self.description.as_deref().and_then(normalize_optional),
            author,
            created_at,
        })
    }
}

#[derive(Debug, Deserialize)]
struct UpdatedRow {
    id: i64,
}

#[derive(Debug, Deserialize)]
struct ErrorEnvelope {
    message: Option<String>,
    msg: Option<String>,
    error_description: Option<String>,
    hint: Option<String>,
}

fn connection_error(base_url: &str, error: reqwest::Error) -> anyhow::Error {
    if error.is_timeout() {
        return anyhow!("request to {base_url} timed out -- raise [store].timeout or retry");
    }
    anyhow!("cannot reach {base_url} -- check [store].base_url and your network ({error})")
}

fn clean_error_response(status: StatusCode, body: &str) -> anyhow::Error {
    if let Ok(parsed) = serde_json::from_str::<ErrorEnvelope>(body) {
        let message = parsed
            .message
            .or(parsed.msg)
            .or(parsed.error_description)
            .filter(|message| !message.is_empty());
        if let Some(message) = message {
            return match parsed.hint.filter(|hint| !hint.is_empty()) {
                Some(hint) => anyhow!("{message} (hint: {hint})"),
                None => anyhow!("{message}"),
            };
        }
    }

    let trimmed = body.trim();
    if !trimmed.is_empty() && trimmed.len() < 100 && !trimmed.contains('{') {
        return anyhow!("server error ({}): {trimmed}", status.as_u16());
    }

    anyhow!("server returned {}", status.as_u16())
}
