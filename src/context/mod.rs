//! Hierarchical context: discovered directories, merged configuration and the
//! entity knowledge base.
//!
//! A [`ContextInstance`] is built once from a starting directory and then
//! queried synchronously. Writes go through [`ContextInstance::save_entity`]
//! and [`ContextInstance::remove_entity`].

mod discovery;
pub mod entity;
pub mod finder;
mod store;

pub use discovery::{discover, DiscoveredDir};
pub use entity::{
    slugify, Classification, Company, ContextType, Entity, EntityKind, EntityType, Identity,
    IgnoredTerm, Person, Project, ProjectRouting, Term,
};
pub use finder::{find, find_with_threshold, levenshtein, similarity, MatchType};
pub use store::{Collection, EntityStore, Origin, SaveMode, Stored};

use crate::config::{self, Settings};
use crate::error::Result;
use crate::storage::Storage;
use serde_yaml::Value;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tracing::{info, instrument};

/// Fully loaded context for one starting directory.
pub struct ContextInstance {
    storage: Arc<dyn Storage>,
    start_dir: PathBuf,
    base: Value,
    discovered: Vec<DiscoveredDir>,
    config: Value,
    settings: Settings,
    store: EntityStore,
}

impl ContextInstance {
    /// Discover, merge and load the context visible from `start_dir`.
    ///
    /// `base` is the lowest-precedence configuration document (usually the
    /// user-level file); its `discovery` section decides what to look for.
    #[instrument(skip(storage, base), fields(start_dir = %start_dir.display()))]
    pub async fn build(storage: Arc<dyn Storage>, start_dir: &Path, base: Value) -> Result<Self> {
        let discovery = Settings::from_value(base.clone())?.discovery;

        let discovered = discover(
            storage.as_ref(),
            start_dir,
            &discovery.marker,
            discovery.max_levels,
        )
        .await;

        let merged = config::merge(
            storage.as_ref(),
            &discovered,
            &discovery.config_file,
            &discovery.context_dir,
            base.clone(),
        )
        .await?;

        let mut settings = Settings::from_value(merged.config.clone())?;
        // Discovery already happened; keep the values that drove it.
        settings.discovery = discovery;

        let store = EntityStore::load(storage.clone(), merged.context_dirs).await?;

        info!(
            "Context ready: {} marker directories, {} context directories, {} entities",
            discovered.len(),
            store.context_dirs().len(),
            store.len()
        );

        Ok(Self {
            storage,
            start_dir: start_dir.to_path_buf(),
            base,
            discovered,
            config: merged.config,
            settings,
            store,
        })
    }

    /// Rebuild from disk with the same starting directory and base configuration.
    pub async fn reload(&mut self) -> Result<()> {
        let start_dir = self.start_dir.clone();
        *self = Self::build(self.storage.clone(), &start_dir, self.base.clone()).await?;
        Ok(())
    }

    /// Whether any context directory was found.
    pub fn has_context(&self) -> bool {
        !self.store.context_dirs().is_empty()
    }

    /// Marker directories found, nearest first.
    pub fn discovered_dirs(&self) -> &[DiscoveredDir] {
        &self.discovered
    }

    /// Knowledge directories in use, nearest first.
    pub fn context_dirs(&self) -> &[PathBuf] {
        self.store.context_dirs()
    }

    /// The typed, merged settings.
    pub fn settings(&self) -> &Settings {
        &self.settings
    }

    /// The merged configuration document, including keys outside the schema.
    pub fn raw_config(&self) -> &Value {
        &self.config
    }

    pub fn store(&self) -> &EntityStore {
        &self.store
    }

    /// All entities of one type.
    pub fn all<T: Stored>(&self) -> &[T] {
        self.store.all::<T>()
    }

    /// An entity of one type by exact id.
    pub fn get<T: Stored>(&self, id: &str) -> Option<&T> {
        self.store.get::<T>(id)
    }

    /// Typo-tolerant lookup among entities of one type.
    pub fn find<T: Stored>(&self, query: &str) -> Result<&T> {
        find_with_threshold(self.store.all::<T>(), query, self.settings.finder.threshold)
    }

    pub fn people(&self) -> &[Person] {
        self.all()
    }

    pub fn projects(&self) -> &[Project] {
        self.all()
    }

    pub fn companies(&self) -> &[Company] {
        self.all()
    }

    pub fn terms(&self) -> &[Term] {
        self.all()
    }

    pub fn ignored_terms(&self) -> &[IgnoredTerm] {
        self.all()
    }

    pub fn person(&self, id: &str) -> Option<&Person> {
        self.get(id)
    }

    pub fn project(&self, id: &str) -> Option<&Project> {
        self.get(id)
    }

    pub fn company(&self, id: &str) -> Option<&Company> {
        self.get(id)
    }

    pub fn term(&self, id: &str) -> Option<&Term> {
        self.get(id)
    }

    pub fn ignored_term(&self, id: &str) -> Option<&IgnoredTerm> {
        self.get(id)
    }

    pub fn find_person(&self, query: &str) -> Result<&Person> {
        self.find(query)
    }

    pub fn find_project(&self, query: &str) -> Result<&Project> {
        self.find(query)
    }

    pub fn find_company(&self, query: &str) -> Result<&Company> {
        self.find(query)
    }

    pub fn find_term(&self, query: &str) -> Result<&Term> {
        self.find(query)
    }

    pub fn find_ignored_term(&self, query: &str) -> Result<&IgnoredTerm> {
        self.find(query)
    }

    /// Where an entity's winning definition lives.
    pub fn origin(&self, entity_type: EntityType, id: &str) -> Option<&Origin> {
        match entity_type {
            EntityType::Person => self.store.origin::<Person>(id),
            EntityType::Project => self.store.origin::<Project>(id),
            EntityType::Company => self.store.origin::<Company>(id),
            EntityType::Term => self.store.origin::<Term>(id),
            EntityType::Ignored => self.store.origin::<IgnoredTerm>(id),
        }
    }

    /// Case-insensitive substring search over every entity; `""` lists everything.
    pub fn search(&self, query: &str) -> Vec<Entity> {
        self.store.search(query)
    }

    /// Find any entity by typo-tolerant lookup, optionally restricted to one type.
    pub fn find_any(&self, entity_type: Option<EntityType>, query: &str) -> Result<Entity> {
        let threshold = self.settings.finder.threshold;
        match entity_type {
            Some(EntityType::Person) => self.find::<Person>(query).cloned().map(Entity::Person),
            Some(EntityType::Project) => self.find::<Project>(query).cloned().map(Entity::Project),
            Some(EntityType::Company) => self.find::<Company>(query).cloned().map(Entity::Company),
            Some(EntityType::Term) => self.find::<Term>(query).cloned().map(Entity::Term),
            Some(EntityType::Ignored) => {
                self.find::<IgnoredTerm>(query).cloned().map(Entity::Ignored)
            }
            None => {
                let everything = self.search("");
                find_with_threshold(&everything, query, threshold).cloned()
            }
        }
    }

    /// Persist an entity in the most specific context directory.
    pub async fn save_entity(&mut self, entity: Entity, mode: SaveMode) -> Result<PathBuf> {
        self.store.save(entity, mode).await
    }

    /// Remove an entity defined in the most specific context directory.
    pub async fn remove_entity(&mut self, entity_type: EntityType, id: &str) -> Result<PathBuf> {
        self.store.remove(entity_type, id).await
    }
}
