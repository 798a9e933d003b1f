//! Evidence collection for project routing.
//!
//! Every test is a case-insensitive substring match against the transcript.
//! Phrases are lowercased once when a profile is built.

use crate::config::SignalWeights;
use crate::context::{Company, Person, Project};
use serde::Serialize;
use std::collections::HashSet;
use tracing::debug;

/// Kind of evidence behind a routing signal.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum SignalType {
    /// One of the project's explicit phrases.
    Explicit,
    /// One of the project's sounds-like variants.
    SoundsLike,
    /// A topic keyword.
    Topic,
    /// An associated person was mentioned.
    Person,
    /// An associated company was mentioned.
    Company,
}

impl std::fmt::Display for SignalType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            SignalType::Explicit => write!(f, "explicit phrase"),
            SignalType::SoundsLike => write!(f, "sounds-like"),
            SignalType::Topic => write!(f, "topic"),
            SignalType::Person => write!(f, "person"),
            SignalType::Company => write!(f, "company"),
        }
    }
}

/// One unit of evidence that a transcript belongs to a project.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RoutingSignal {
    #[serde(rename = "type")]
    pub signal_type: SignalType,
    /// The phrase that matched, as configured.
    pub value: String,
    pub weight: f64,
    /// Id of the entity that supplied the phrase.
    pub source: String,
}

/// A phrase kept in its configured form and lowercased for matching.
#[derive(Debug, Clone)]
struct Phrase {
    original: String,
    lower: String,
}

impl Phrase {
    fn collect<'a>(values: impl IntoIterator<Item = &'a String>) -> Vec<Phrase> {
        let mut seen = HashSet::new();
        values
            .into_iter()
            .map(|v| v.trim())
            .filter(|v| !v.is_empty())
            .filter(|v| seen.insert(v.to_lowercase()))
            .map(|v| Phrase {
                original: v.to_string(),
                lower: v.to_lowercase(),
            })
            .collect()
    }

    fn first_match<'a>(phrases: &'a [Phrase], text: &str) -> Option<&'a Phrase> {
        phrases.iter().find(|p| text.contains(&p.lower))
    }
}

/// Names by which an associated person or company can be mentioned.
#[derive(Debug, Clone)]
struct Mention {
    id: String,
    phrases: Vec<Phrase>,
}

/// A project with its matching phrases prepared.
#[derive(Debug, Clone)]
pub(crate) struct ProjectProfile {
    pub(crate) project: Project,
    explicit: Vec<Phrase>,
    sounds_like: Vec<Phrase>,
    topics: Vec<Phrase>,
    people: Vec<Mention>,
    companies: Vec<Mention>,
}

impl ProjectProfile {
    pub(crate) fn new(project: &Project, people: &[Person], companies: &[Company]) -> Self {
        let classification = &project.classification;

        let people = classification
            .associated_people
            .iter()
            .filter_map(|id| match people.iter().find(|p| &p.id == id) {
                Some(person) => Some(Mention {
                    id: person.id.clone(),
                    phrases: Phrase::collect(
                        std::iter::once(&person.name).chain(person.sounds_like.iter()),
                    ),
                }),
                None => {
                    debug!("Project '{}' references unknown person '{}'", project.id, id);
                    None
                }
            })
            .collect();

        let companies = classification
            .associated_companies
            .iter()
            .filter_map(|id| match companies.iter().find(|c| &c.id == id) {
                Some(company) => Some(Mention {
                    id: company.id.clone(),
                    phrases: Phrase::collect(
                        std::iter::once(&company.name)
                            .chain(company.full_name.iter())
                            .chain(company.sounds_like.iter()),
                    ),
                }),
                None => {
                    debug!("Project '{}' references unknown company '{}'", project.id, id);
                    None
                }
            })
            .collect();

        Self {
            project: project.clone(),
            explicit: Phrase::collect(&classification.explicit_phrases),
            sounds_like: Phrase::collect(&project.sounds_like),
            topics: Phrase::collect(&classification.topics),
            people,
            companies,
        }
    }

    /// Collect every signal this project finds in `text` (already lowercased).
    pub(crate) fn signals(&self, text: &str, weights: &SignalWeights) -> Vec<RoutingSignal> {
        let id = &self.project.id;
        let mut signals = Vec::new();

        if let Some(phrase) = Phrase::first_match(&self.explicit, text) {
            signals.push(signal(SignalType::Explicit, phrase, weights.explicit, id));
        }

        if let Some(phrase) = Phrase::first_match(&self.sounds_like, text) {
            signals.push(signal(SignalType::SoundsLike, phrase, weights.sounds_like, id));
        }

        for topic in self.topics.iter().filter(|t| text.contains(&t.lower)) {
            signals.push(signal(SignalType::Topic, topic, weights.topic, id));
        }

        for person in &self.people {
            if let Some(phrase) = Phrase::first_match(&person.phrases, text) {
                signals.push(signal(SignalType::Person, phrase, weights.person, &person.id));
            }
        }

        for company in &self.companies {
            if let Some(phrase) = Phrase::first_match(&company.phrases, text) {
                signals.push(signal(SignalType::Company, phrase, weights.company, &company.id));
            }
        }

        signals
    }
}

fn signal(signal_type: SignalType, phrase: &Phrase, weight: f64, source: &str) -> RoutingSignal {
    RoutingSignal {
        signal_type,
        value: phrase.original.clone(),
        weight: weight.clamp(0.0, 1.0),
        source: source.to_string(),
    }
}

/// Sum of signal weights, capped at 1.0.
pub fn confidence(signals: &[RoutingSignal]) -> f64 {
    signals.iter().map(|s| s.weight).sum::<f64>().min(1.0)
}
