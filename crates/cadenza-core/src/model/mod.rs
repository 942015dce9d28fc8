pub mod event;
pub mod features;
pub mod ids;
pub mod identity;

pub use event::{parse_timestamp, StreamEvent};
pub use features::{AudioFeature, FeatureSet};
pub use identity::TrackIdentity;
pub use ids::TrackId;
