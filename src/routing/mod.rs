//! Signal-based routing of transcripts to project destinations.

mod destination;
mod signals;

pub use destination::RouteDestination;
pub use signals::{confidence, RoutingSignal, SignalType};

use crate::config::{ConflictResolution, RoutingSettings};
use crate::context::{Company, ContextInstance, Person, Project};
use chrono::NaiveDateTime;
use serde::Serialize;
use signals::ProjectProfile;
use std::path::{Path, PathBuf};
use tracing::{debug, info, instrument, warn};

/// Input to a routing decision.
#[derive(Debug, Clone)]
pub struct RoutingContext {
    pub transcript_text: String,
    /// When the audio was recorded.
    pub audio_date: NaiveDateTime,
    pub source_file: PathBuf,
    /// Content hash of the source audio.
    pub hash: String,
}

/// Outcome of routing one transcript.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RouteDecision {
    pub destination: RouteDestination,
    /// The winning project, or `None` for the default destination.
    pub project_id: Option<String>,
    pub confidence: f64,
    pub signals: Vec<RoutingSignal>,
    pub reasoning: String,
}

impl RouteDecision {
    /// Where the transcript should be written.
    ///
    /// The subject falls back to the source file stem.
    pub fn output_path(&self, ctx: &RoutingContext, subject: Option<&str>) -> PathBuf {
        let stem = ctx
            .source_file
            .file_stem()
            .and_then(|s| s.to_str())
            .filter(|s| !s.is_empty());
        self.destination
            .output_path(ctx.audio_date, &ctx.hash, subject.or(stem))
    }
}

/// Routing engine over a fixed set of projects.
pub struct RoutingInstance {
    settings: RoutingSettings,
    profiles: Vec<ProjectProfile>,
}

impl RoutingInstance {
    /// Prepare routing for the projects of a loaded context.
    pub fn new(settings: &RoutingSettings, context: &ContextInstance) -> Self {
        Self::from_parts(
            settings.clone(),
            context.projects(),
            context.people(),
            context.companies(),
        )
    }

    /// Prepare routing from explicit collections.
    ///
    /// Inactive projects are dropped. The remaining ones are ordered by
    /// `priority`, then in the order given.
    pub fn from_parts(
        settings: RoutingSettings,
        projects: &[Project],
        people: &[Person],
        companies: &[Company],
    ) -> Self {
        let active: Vec<&Project> = projects.iter().filter(|p| p.active).collect();

        for id in &settings.priority {
            if !active.iter().any(|p| &p.id == id) {
                warn!("Routing priority lists unknown or inactive project '{}'", id);
            }
        }

        let mut ordered: Vec<&Project> = Vec::with_capacity(active.len());
        for id in &settings.priority {
            if let Some(project) = active.iter().find(|p| &p.id == id) {
                if !ordered.iter().any(|p| p.id == project.id) {
                    ordered.push(*project);
                }
            }
        }
        for project in &active {
            if !ordered.iter().any(|p| p.id == project.id) {
                ordered.push(*project);
            }
        }

        let profiles = ordered
            .into_iter()
            .map(|p| ProjectProfile::new(p, people, companies))
            .collect::<Vec<_>>();

        debug!("Routing prepared for {} active projects", profiles.len());

        Self { settings, profiles }
    }

    /// Project ids in evaluation order.
    pub fn project_order(&self) -> Vec<&str> {
        self.profiles.iter().map(|p| p.project.id.as_str()).collect()
    }

    /// Decide where a transcript belongs.
    #[instrument(skip(self, ctx), fields(source = %ctx.source_file.display()))]
    pub fn route(&self, ctx: &RoutingContext) -> RouteDecision {
        let text = ctx.transcript_text.to_lowercase();
        let weights = &self.settings.weights;
        let min_confidence = self.settings.min_confidence;

        let mut best: Option<(&ProjectProfile, f64, Vec<RoutingSignal>)> = None;
        let mut near_miss: Option<(&str, f64)> = None;

        for profile in &self.profiles {
            let signals = profile.signals(&text, weights);
            if signals.is_empty() {
                continue;
            }
            let score = confidence(&signals);
            debug!(
                "Project '{}' scored {:.2} from {} signals",
                profile.project.id,
                score,
                signals.len()
            );

            if score < min_confidence {
                if near_miss.map_or(true, |(_, s)| score > s) {
                    near_miss = Some((profile.project.id.as_str(), score));
                }
                continue;
            }

            let replace = match (&best, self.settings.conflict_resolution) {
                (None, _) => true,
                (Some((_, current, _)), ConflictResolution::Primary) => score > *current,
            };
            if replace {
                best = Some((profile, score, signals));
            }
        }

        match best {
            Some((profile, score, signals)) => {
                let project = &profile.project;
                let reasoning = format!(
                    "Matched project '{}' with confidence {:.2}: {}",
                    project.id,
                    score,
                    describe(&signals)
                );
                info!("{}", reasoning);
                RouteDecision {
                    destination: RouteDestination::for_project(
                        &project.routing,
                        &self.settings.default,
                    ),
                    project_id: Some(project.id.clone()),
                    confidence: score,
                    signals,
                    reasoning,
                }
            }
            None => {
                let reasoning = match near_miss {
                    Some((id, score)) => format!(
                        "No project reached the minimum confidence of {:.2} (closest: '{}' at {:.2}); using default destination",
                        min_confidence, id, score
                    ),
                    None => "No project signals found; using default destination".to_string(),
                };
                info!("{}", reasoning);
                RouteDecision {
                    destination: RouteDestination::from_settings(&self.settings.default),
                    project_id: None,
                    confidence: 0.0,
                    signals: Vec::new(),
                    reasoning,
                }
            }
        }
    }

    /// Route and compose the output path in one step.
    pub fn route_to_path(&self, ctx: &RoutingContext, subject: Option<&str>) -> (RouteDecision, PathBuf) {
        let decision = self.route(ctx);
        let path = decision.output_path(ctx, subject);
        (decision, path)
    }
}

fn describe(signals: &[RoutingSignal]) -> String {
    signals
        .iter()
        .map(|s| format!("{} '{}' ({:.2})", s.signal_type, s.value, s.weight))
        .collect::<Vec<_>>()
        .join(", ")
}

impl RoutingContext {
    /// Context for a transcript without a content hash.
    pub fn for_text(text: impl Into<String>, source_file: &Path, audio_date: NaiveDateTime) -> Self {
        Self {
            transcript_text: text.into(),
            audio_date,
            source_file: source_file.to_path_buf(),
            hash: String::new(),
        }
    }
}
