//! Entity store: loading, merging and persisting knowledge base entities.
//!
//! Context directories are given nearest first. Their entity files are read
//! concurrently, then applied farthest first into a map keyed by id, so the
//! most specific directory wins whenever two directories define the same id.

use super::entity::{
    Company, Entity, EntityKind, EntityType, Identity, IgnoredTerm, Person, Project, Term,
};
use crate::error::{ProtokollError, Result};
use crate::storage::Storage;
use futures::future::try_join_all;
use serde_yaml::Value;
use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tracing::{debug, info, instrument, warn};

/// Whether a save creates a new entity or replaces an existing one.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SaveMode {
    /// Fails if the id already exists.
    Create,
    /// Fails if the id does not exist.
    Replace,
}

/// Where the winning definition of an entity came from.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Origin {
    /// Backing file.
    pub path: PathBuf,
    /// Index of the context directory, 0 = most specific.
    pub rank: usize,
}

/// The merged entities of one type.
///
/// Ordered by the rank of each entity's winning definition, then by file path.
#[derive(Debug, Clone)]
pub struct Collection<T> {
    items: Vec<T>,
    origins: Vec<Origin>,
    index: HashMap<String, usize>,
}

impl<T: Identity> Collection<T> {
    fn new() -> Self {
        Self {
            items: Vec::new(),
            origins: Vec::new(),
            index: HashMap::new(),
        }
    }

    /// Build from definitions listed in application order (farthest first).
    fn from_definitions(definitions: impl IntoIterator<Item = (T, Origin)>) -> Self {
        let mut by_id: HashMap<String, (T, Origin)> = HashMap::new();
        for (entity, origin) in definitions {
            let id = entity.id().to_string();
            if let Some((_, shadowed)) = by_id.get(&id) {
                if shadowed.rank == origin.rank {
                    warn!(
                        "Duplicate id '{}' in {} and {}",
                        id,
                        shadowed.path.display(),
                        origin.path.display()
                    );
                } else {
                    debug!(
                        "'{}' from {} overrides {}",
                        id,
                        origin.path.display(),
                        shadowed.path.display()
                    );
                }
            }
            by_id.insert(id, (entity, origin));
        }

        let mut collection = Self::new();
        collection.rebuild(by_id.into_values().collect());
        collection
    }

    fn rebuild(&mut self, mut definitions: Vec<(T, Origin)>) {
        definitions.sort_by(|a, b| {
            a.1.rank
                .cmp(&b.1.rank)
                .then_with(|| a.1.path.cmp(&b.1.path))
        });

        self.items.clear();
        self.origins.clear();
        self.index.clear();
        for (i, (entity, origin)) in definitions.into_iter().enumerate() {
            self.index.insert(entity.id().to_string(), i);
            self.items.push(entity);
            self.origins.push(origin);
        }
    }

    fn take_definitions(&mut self) -> Vec<(T, Origin)> {
        self.index.clear();
        std::mem::take(&mut self.items)
            .into_iter()
            .zip(std::mem::take(&mut self.origins))
            .collect()
    }

    fn upsert(&mut self, entity: T, origin: Origin) {
        let mut definitions = self.take_definitions();
        definitions.retain(|(e, _)| e.id() != entity.id());
        definitions.push((entity, origin));
        self.rebuild(definitions);
    }

    /// All entities, in collection order.
    pub fn all(&self) -> &[T] {
        &self.items
    }

    /// Look up an entity by exact id.
    pub fn get(&self, id: &str) -> Option<&T> {
        self.index.get(id).map(|&i| &self.items[i])
    }

    /// Where the entity with this id was defined.
    pub fn origin(&self, id: &str) -> Option<&Origin> {
        self.index.get(id).map(|&i| &self.origins[i])
    }

    pub fn len(&self) -> usize {
        self.items.len()
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }
}

/// An entity type the store keeps a collection for.
pub trait Stored: EntityKind {
    fn collection(store: &EntityStore) -> &Collection<Self>;
    fn collection_mut(store: &mut EntityStore) -> &mut Collection<Self>;
}

macro_rules! impl_stored {
    ($ty:ty, $field:ident) => {
        impl Stored for $ty {
            fn collection(store: &EntityStore) -> &Collection<Self> {
                &store.$field
            }

            fn collection_mut(store: &mut EntityStore) -> &mut Collection<Self> {
                &mut store.$field
            }
        }
    };
}

impl_stored!(Person, people);
impl_stored!(Project, projects);
impl_stored!(Company, companies);
impl_stored!(Term, terms);
impl_stored!(IgnoredTerm, ignored);

/// In-memory view of every entity across the context hierarchy.
pub struct EntityStore {
    storage: Arc<dyn Storage>,
    context_dirs: Vec<PathBuf>,
    people: Collection<Person>,
    projects: Collection<Project>,
    companies: Collection<Company>,
    terms: Collection<Term>,
    ignored: Collection<IgnoredTerm>,
}

impl EntityStore {
    /// Load every entity under `context_dirs` (nearest first).
    #[instrument(skip(storage))]
    pub async fn load(storage: Arc<dyn Storage>, context_dirs: Vec<PathBuf>) -> Result<Self> {
        let (people, projects, companies, terms, ignored) = {
            let s = storage.as_ref();
            let dirs = context_dirs.as_slice();
            tokio::try_join!(
                load_collection::<Person>(s, dirs),
                load_collection::<Project>(s, dirs),
                load_collection::<Company>(s, dirs),
                load_collection::<Term>(s, dirs),
                load_collection::<IgnoredTerm>(s, dirs),
            )?
        };

        info!(
            "Loaded {} people, {} projects, {} companies, {} terms, {} ignored from {} context directories",
            people.len(),
            projects.len(),
            companies.len(),
            terms.len(),
            ignored.len(),
            context_dirs.len()
        );

        Ok(Self {
            storage,
            context_dirs,
            people,
            projects,
            companies,
            terms,
            ignored,
        })
    }

    /// Context directories this store reads from, nearest first.
    pub fn context_dirs(&self) -> &[PathBuf] {
        &self.context_dirs
    }

    /// All entities of one type.
    pub fn all<T: Stored>(&self) -> &[T] {
        T::collection(self).all()
    }

    /// An entity of one type by exact id.
    pub fn get<T: Stored>(&self, id: &str) -> Option<&T> {
        T::collection(self).get(id)
    }

    /// Where an entity's current definition lives.
    pub fn origin<T: Stored>(&self, id: &str) -> Option<&Origin> {
        T::collection(self).origin(id)
    }

    /// Entities of every type whose id, name or sounds-like variants contain `query`.
    ///
    /// Case-insensitive. An empty query returns every entity.
    pub fn search(&self, query: &str) -> Vec<Entity> {
        let needle = query.trim().to_lowercase();
        let mut results = Vec::new();
        collect_matches(self.all::<Person>(), &needle, &mut results);
        collect_matches(self.all::<Project>(), &needle, &mut results);
        collect_matches(self.all::<Company>(), &needle, &mut results);
        collect_matches(self.all::<Term>(), &needle, &mut results);
        collect_matches(self.all::<IgnoredTerm>(), &needle, &mut results);
        results
    }

    /// Total number of entities across all types.
    pub fn len(&self) -> usize {
        self.people.len()
            + self.projects.len()
            + self.companies.len()
            + self.terms.len()
            + self.ignored.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Persist an entity into the most specific context directory.
    ///
    /// Returns the path written.
    pub async fn save(&mut self, entity: Entity, mode: SaveMode) -> Result<PathBuf> {
        match entity {
            Entity::Person(e) => self.save_kind(e, mode).await,
            Entity::Project(e) => self.save_kind(e, mode).await,
            Entity::Company(e) => self.save_kind(e, mode).await,
            Entity::Term(e) => self.save_kind(e, mode).await,
            Entity::Ignored(e) => self.save_kind(e, mode).await,
        }
    }

    /// Delete an entity's file from the most specific context directory.
    ///
    /// Returns the path removed.
    pub async fn remove(&mut self, entity_type: EntityType, id: &str) -> Result<PathBuf> {
        match entity_type {
            EntityType::Person => self.remove_kind::<Person>(id).await,
            EntityType::Project => self.remove_kind::<Project>(id).await,
            EntityType::Company => self.remove_kind::<Company>(id).await,
            EntityType::Term => self.remove_kind::<Term>(id).await,
            EntityType::Ignored => self.remove_kind::<IgnoredTerm>(id).await,
        }
    }

    async fn save_kind<T: Stored>(&mut self, entity: T, mode: SaveMode) -> Result<PathBuf> {
        let id = entity.id().to_string();
        validate_id(&id)?;

        let target_dir = self.context_dirs.first().ok_or(ProtokollError::NoContext)?;
        let existing = T::collection(self).origin(&id).cloned();

        match (mode, &existing) {
            (SaveMode::Create, Some(_)) => {
                return Err(ProtokollError::AlreadyExists {
                    entity_type: T::TYPE,
                    id,
                })
            }
            (SaveMode::Replace, None) => {
                return Err(not_found(&id, T::collection(self).all()));
            }
            _ => {}
        }

        let path = match &existing {
            Some(origin) if origin.rank == 0 => origin.path.clone(),
            _ => target_dir.join(T::TYPE.dir_name()).join(format!("{}.yaml", id)),
        };

        let owned_by_entity = existing.as_ref().is_some_and(|o| o.path == path);
        if !owned_by_entity && self.storage.is_file(&path).await {
            return Err(ProtokollError::InvalidInput(format!(
                "{} already exists and holds a different entity",
                path.display()
            )));
        }

        let yaml = serde_yaml::to_string(&entity)?;
        self.storage.write(&path, &yaml).await?;
        info!("Saved {} '{}' to {}", T::TYPE, id, path.display());

        T::collection_mut(self).upsert(entity, Origin { path: path.clone(), rank: 0 });
        Ok(path)
    }

    async fn remove_kind<T: Stored>(&mut self, id: &str) -> Result<PathBuf> {
        let origin = T::collection(self)
            .origin(id)
            .cloned()
            .ok_or_else(|| not_found(id, T::collection(self).all()))?;

        if origin.rank != 0 {
            return Err(ProtokollError::InvalidInput(format!(
                "{} '{}' is defined in {}; remove it there",
                T::TYPE,
                id,
                origin.path.display()
            )));
        }

        self.storage.remove_file(&origin.path).await?;
        info!("Removed {} '{}' ({})", T::TYPE, id, origin.path.display());

        // An ancestor may define the same id; reloading lets it show through again.
        let reloaded = load_collection::<T>(self.storage.as_ref(), &self.context_dirs).await?;
        *T::collection_mut(self) = reloaded;

        Ok(origin.path)
    }
}

fn collect_matches<T: EntityKind>(entities: &[T], needle: &str, out: &mut Vec<Entity>) {
    for entity in entities {
        if matches_query(entity, needle) {
            out.push(entity.clone().into_entity());
        }
    }
}

fn matches_query(entity: &impl Identity, needle: &str) -> bool {
    needle.is_empty()
        || entity.id().to_lowercase().contains(needle)
        || entity.name().to_lowercase().contains(needle)
        || entity
            .sounds_like()
            .iter()
            .any(|variant| variant.to_lowercase().contains(needle))
}

fn not_found<T: Identity>(id: &str, entities: &[T]) -> ProtokollError {
    ProtokollError::EntityNotFound {
        query: id.to_string(),
        candidates: entities
            .iter()
            .map(|e| (e.id().to_string(), e.name().to_string()))
            .collect(),
    }
}

fn validate_id(id: &str) -> Result<()> {
    if id.trim().is_empty() {
        return Err(ProtokollError::InvalidInput("Entity id must not be empty".to_string()));
    }
    if id == "." || id == ".." || id.contains(['/', '\\']) {
        return Err(ProtokollError::InvalidInput(format!(
            "Entity id '{}' cannot be used as a file name",
            id
        )));
    }
    Ok(())
}

fn is_entity_file(path: &Path) -> bool {
    let hidden = path
        .file_name()
        .and_then(|n| n.to_str())
        .map(|n| n.starts_with('.'))
        .unwrap_or(true);
    let yaml = path
        .extension()
        .and_then(|ext| ext.to_str())
        .map(|ext| matches!(ext.to_lowercase().as_str(), "yaml" | "yml"))
        .unwrap_or(false);
    !hidden && yaml
}

async fn load_collection<T: EntityKind>(
    storage: &dyn Storage,
    context_dirs: &[PathBuf],
) -> Result<Collection<T>> {
    let mut files = Vec::new();
    for (rank, dir) in context_dirs.iter().enumerate() {
        for path in storage.list_files(&dir.join(T::TYPE.dir_name())).await? {
            if is_entity_file(&path) {
                files.push(Origin { path, rank });
            }
        }
    }

    let loaded = try_join_all(files.into_iter().map(|origin| async move {
        let entity = read_entity::<T>(storage, &origin.path).await?;
        Ok::<_, ProtokollError>(entity.map(|e| (e, origin)))
    }))
    .await?;

    let mut definitions: Vec<(T, Origin)> = loaded.into_iter().flatten().collect();
    // Farthest first; the sort is stable so file order holds within a directory.
    definitions.sort_by(|a, b| b.1.rank.cmp(&a.1.rank));

    Ok(Collection::from_definitions(definitions))
}

async fn read_entity<T: EntityKind>(storage: &dyn Storage, path: &Path) -> Result<Option<T>> {
    let Some(content) = storage.read_optional(path).await? else {
        return Ok(None);
    };

    let mut value: Value =
        serde_yaml::from_str(&content).map_err(|e| ProtokollError::parse(path, e))?;

    let Value::Mapping(map) = &mut value else {
        return Err(ProtokollError::parse(path, "expected a mapping of entity fields"));
    };

    if !map.contains_key("id") {
        if let Some(stem) = path.file_stem().and_then(|s| s.to_str()) {
            map.insert(Value::from("id"), Value::from(stem));
        }
    }

    serde_yaml::from_value(value)
        .map(Some)
        .map_err(|e| ProtokollError::parse(path, e))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::storage::LocalStorage;
    use tempfile::TempDir;

    struct Fixture {
        _root: TempDir,
        near: PathBuf,
        far: PathBuf,
        storage: Arc<dyn Storage>,
    }

    async fn fixture() -> Fixture {
        let root = tempfile::tempdir().unwrap();
        let near = root.path().join("team").join(".protokoll").join("context");
        let far = root.path().join(".protokoll").join("context");
        let storage: Arc<dyn Storage> = Arc::new(LocalStorage::new());
        storage.create_dir_all(&near).await.unwrap();
        storage.create_dir_all(&far).await.unwrap();
        Fixture {
            _root: root,
            near,
            far,
            storage,
        }
    }

    async fn write(storage: &Arc<dyn Storage>, path: PathBuf, content: &str) {
        storage.write(&path, content).await.unwrap();
    }

    impl Fixture {
        async fn load(&self) -> EntityStore {
            EntityStore::load(self.storage.clone(), vec![self.near.clone(), self.far.clone()])
                .await
                .unwrap()
        }
    }

    #[tokio::test]
    async fn test_nearest_definition_wins() {
        let fx = fixture().await;
        write(&fx.storage, fx.far.join("people/jane.yaml"), "id: jane\nname: Jane Far\n").await;
        write(&fx.storage, fx.far.join("people/bob.yaml"), "id: bob\nname: Bob\n").await;
        write(&fx.storage, fx.near.join("people/jane.yaml"), "id: jane\nname: Jane Near\n").await;

        let store = fx.load().await;

        let people = store.all::<Person>();
        assert_eq!(people.len(), 2);
        // Nearest definitions come first.
        assert_eq!(people[0].id, "jane");
        assert_eq!(people[0].name, "Jane Near");
        assert_eq!(store.get::<Person>("bob").unwrap().name, "Bob");
        assert_eq!(store.origin::<Person>("jane").unwrap().rank, 0);
    }

    #[tokio::test]
    async fn test_missing_id_defaults_to_file_stem() {
        let fx = fixture().await;
        write(&fx.storage, fx.near.join("companies/acme.yml"), "name: Acme Corp\n").await;
        write(&fx.storage, fx.near.join("companies/.hidden.yaml"), "name: Hidden\n").await;
        write(&fx.storage, fx.near.join("companies/notes.txt"), "not an entity").await;

        let store = fx.load().await;

        assert_eq!(store.all::<Company>().len(), 1);
        assert_eq!(store.get::<Company>("acme").unwrap().name, "Acme Corp");
    }

    #[tokio::test]
    async fn test_malformed_entity_reports_path() {
        let fx = fixture().await;
        write(&fx.storage, fx.far.join("terms/bad.yaml"), "id: [unclosed\n").await;

        let err = EntityStore::load(fx.storage.clone(), vec![fx.near.clone(), fx.far.clone()])
            .await
            .err()
            .unwrap();
        match err {
            ProtokollError::Parse { path, .. } => assert!(path.ends_with("terms/bad.yaml")),
            other => panic!("unexpected error: {other}"),
        }
    }

    #[tokio::test]
    async fn test_search_across_types() {
        let fx = fixture().await;
        write(
            &fx.storage,
            fx.near.join("people/priya.yaml"),
            "id: priya\nname: Priya Patel\nsounds_like: [pria]\n",
        )
        .await;
        write(&fx.storage, fx.near.join("companies/patelco.yaml"), "id: patelco\nname: PatelCo\n").await;
        write(&fx.storage, fx.far.join("terms/k8s.yaml"), "id: k8s\nname: Kubernetes\n").await;

        let store = fx.load().await;

        let hits = store.search("PATEL");
        assert_eq!(hits.len(), 2);
        assert_eq!(hits[0].entity_type(), EntityType::Person);
        assert_eq!(hits[1].entity_type(), EntityType::Company);

        assert_eq!(store.search("pria").len(), 1);
        assert_eq!(store.search("").len(), 3);
        assert_eq!(store.len(), 3);
    }

    #[tokio::test]
    async fn test_save_then_reload_round_trip() {
        let fx = fixture().await;
        let mut store = fx.load().await;

        let mut entity = Entity::new(
            EntityType::Project,
            "walmart".to_string(),
            "Walmart".to_string(),
            vec!["wall mart".to_string()],
        );
        if let Entity::Project(project) = &mut entity {
            project.classification.explicit_phrases = vec!["walmart".to_string()];
            project.classification.topics = vec!["retail".to_string()];
            project.routing.destination = Some("~/work/walmart".to_string());
            project.routing.auto_tags = vec!["client".to_string()];
        }

        let path = store.save(entity.clone(), SaveMode::Create).await.unwrap();
        assert_eq!(path, fx.near.join("projects").join("walmart.yaml"));

        let reloaded = fx.load().await;
        let project = reloaded.get::<Project>("walmart").unwrap();
        assert_eq!(&project.clone().into_entity(), &entity);
    }

    #[tokio::test]
    async fn test_create_duplicate_fails_and_replace_succeeds() {
        let fx = fixture().await;
        write(&fx.storage, fx.near.join("people/jane.yaml"), "id: jane\nname: Jane\n").await;
        let mut store = fx.load().await;

        let updated = Entity::new(EntityType::Person, "jane".into(), "Jane Doe".into(), vec![]);
        let err = store.save(updated.clone(), SaveMode::Create).await.unwrap_err();
        assert!(matches!(err, ProtokollError::AlreadyExists { .. }));

        store.save(updated, SaveMode::Replace).await.unwrap();
        assert_eq!(store.get::<Person>("jane").unwrap().name, "Jane Doe");

        let missing = Entity::new(EntityType::Person, "nobody".into(), "Nobody".into(), vec![]);
        let err = store.save(missing, SaveMode::Replace).await.unwrap_err();
        assert!(matches!(err, ProtokollError::EntityNotFound { .. }));
    }

    #[tokio::test]
    async fn test_edit_of_ancestor_entity_shadows_it() {
        let fx = fixture().await;
        write(&fx.storage, fx.far.join("people/jane.yaml"), "id: jane\nname: Jane\n").await;
        let mut store = fx.load().await;

        let edited = Entity::new(EntityType::Person, "jane".into(), "Jane Edited".into(), vec![]);
        let path = store.save(edited, SaveMode::Replace).await.unwrap();

        assert_eq!(path, fx.near.join("people").join("jane.yaml"));
        let ancestor = fx.storage.read_optional(&fx.far.join("people/jane.yaml")).await.unwrap();
        assert_eq!(ancestor.as_deref(), Some("id: jane\nname: Jane\n"));
        assert_eq!(fx.load().await.get::<Person>("jane").unwrap().name, "Jane Edited");
    }

    #[tokio::test]
    async fn test_replace_keeps_existing_file_name() {
        let fx = fixture().await;
        write(&fx.storage, fx.near.join("people/j-smith.yaml"), "id: jane\nname: Jane\n").await;
        let mut store = fx.load().await;

        let edited = Entity::new(EntityType::Person, "jane".into(), "Jane S".into(), vec![]);
        let path = store.save(edited, SaveMode::Replace).await.unwrap();

        assert_eq!(path, fx.near.join("people").join("j-smith.yaml"));
        assert!(!fx.storage.is_file(&fx.near.join("people/jane.yaml")).await);
    }

    #[tokio::test]
    async fn test_save_without_context_dir() {
        let storage: Arc<dyn Storage> = Arc::new(LocalStorage::new());
        let mut store = EntityStore::load(storage, vec![]).await.unwrap();
        assert!(store.is_empty());

        let entity = Entity::new(EntityType::Term, "k8s".into(), "Kubernetes".into(), vec![]);
        let err = store.save(entity, SaveMode::Create).await.unwrap_err();
        assert!(matches!(err, ProtokollError::NoContext));
    }

    #[tokio::test]
    async fn test_rejects_unsafe_ids() {
        let fx = fixture().await;
        let mut store = fx.load().await;

        let entity = Entity::new(EntityType::Term, "../escape".into(), "Escape".into(), vec![]);
        let err = store.save(entity, SaveMode::Create).await.unwrap_err();
        assert!(matches!(err, ProtokollError::InvalidInput(_)));
    }

    #[tokio::test]
    async fn test_remove_reveals_ancestor_definition() {
        let fx = fixture().await;
        write(&fx.storage, fx.far.join("people/jane.yaml"), "id: jane\nname: Jane Far\n").await;
        write(&fx.storage, fx.near.join("people/jane.yaml"), "id: jane\nname: Jane Near\n").await;
        let mut store = fx.load().await;

        store.remove(EntityType::Person, "jane").await.unwrap();
        assert_eq!(store.get::<Person>("jane").unwrap().name, "Jane Far");

        let err = store.remove(EntityType::Person, "jane").await.unwrap_err();
        assert!(matches!(err, ProtokollError::InvalidInput(_)));
    }
}
