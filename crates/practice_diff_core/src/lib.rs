pub mod domain;
pub mod policy;
pub mod ports;
pub mod reconcile;
pub mod titles;

pub use domain::{AccessToken, Assignment, EntityId, RemainingRights, Student, SuggestedStory};
pub use policy::drop_most_recent;
pub use ports::{
    BundleProvider, BundleSource, FailureKind, PortError, PortResult, StudentDirectory,
    TitleLookup,
};
pub use reconcile::{
    assemble_bundle, Bundle, Comparison, FailureReport, Reconciler, Section, SourceKind,
    SourceOutcome, SourceView,
};
pub use titles::{resolve_title, resolve_titles};
