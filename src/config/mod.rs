//! Configuration module for Protokoll.
//!
//! Handles the declared settings schema and the merging of configuration
//! documents found along the directory hierarchy.

mod merge;
mod settings;

pub use merge::{deep_merge, merge, MergedConfig};
pub use settings::{
    ConflictResolution, DestinationSettings, DiscoverySettings, FilenameOption, FinderSettings,
    GeneralSettings, RoutingSettings, Settings, SignalWeights, Structure,
};
