//! Resolving history identities to catalog identifiers.

use std::collections::{BTreeSet, HashMap};
use std::fmt;
use std::sync::Arc;

use cadenza_core::{StreamEvent, TrackId, TrackIdentity};

use crate::catalog::{CatalogService, TrackQuery};
use crate::error::PipelineResult;

/// Distinct (artist, track) identities in `events`, sorted.
///
/// The sorted order fixes the order identities are resolved in, which in
/// turn fixes the outcome of identifier collisions.
pub fn unique_identities(events: &[StreamEvent]) -> BTreeSet<TrackIdentity> {
    events.iter().map(StreamEvent::identity).collect()
}

/// Why an identity could not be resolved.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LookupFailure {
    /// The catalog had no match for the query.
    NoMatch(TrackIdentity),
    /// The catalog call failed for this identity alone.
    Failed {
        identity: TrackIdentity,
        reason: String,
    },
    /// A later identity resolved to the same identifier and replaced this one.
    Superseded {
        identity: TrackIdentity,
        id: TrackId,
    },
}

impl LookupFailure {
    #[must_use]
    pub fn identity(&self) -> &TrackIdentity {
        match self {
            Self::NoMatch(identity)
            | Self::Failed { identity, .. }
            | Self::Superseded { identity, .. } => identity,
        }
    }

    #[must_use]
    pub fn reason(&self) -> String {
        match self {
            Self::NoMatch(_) => "no match".to_string(),
            Self::Failed { reason, .. } => reason.clone(),
            Self::Superseded { id, .. } => format!("superseded on {id}"),
        }
    }
}

impl fmt::Display for LookupFailure {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} ({})", self.identity(), self.reason())
    }
}

/// One resolved identifier and the identity it was found for.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResolvedTrack {
    pub id: TrackId,
    pub identity: TrackIdentity,
}

/// Ordered identifier → identity mapping with a reverse index.
///
/// Iteration order is insertion order and serves as the canonical row order
/// for every table derived from it.
///
/// When a second identity resolves to an identifier already present, the
/// later identity replaces the earlier one in place: the identifier keeps
/// its original position and the displaced identity becomes unresolved.
#[derive(Debug, Clone, Default)]
pub struct ResolvedTracks {
    entries: Vec<ResolvedTrack>,
    by_id: HashMap<TrackId, usize>,
    /// artist → track → position, so lookups can borrow event fields.
    by_identity: HashMap<String, HashMap<String, usize>>,
}

impl ResolvedTracks {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Record `identity` under `id`.
    ///
    /// Returns the identity displaced by an identifier collision, if any.
    pub fn insert(&mut self, id: TrackId, identity: TrackIdentity) -> Option<TrackIdentity> {
        if let Some(old_pos) = self.position(&identity.artist, &identity.track) {
            // Re-resolving an identity moves it off its previous identifier.
            if self.entries[old_pos].id == id {
                return None;
            }
            self.remove_at(old_pos);
        }

        if let Some(&pos) = self.by_id.get(&id) {
            let displaced = std::mem::replace(&mut self.entries[pos].identity, identity.clone());
            self.unindex(&displaced);
            self.index(&identity, pos);
            return Some(displaced);
        }

        let pos = self.entries.len();
        self.by_id.insert(id.clone(), pos);
        self.index(&identity, pos);
        self.entries.push(ResolvedTrack { id, identity });
        None
    }

    fn position(&self, artist: &str, track: &str) -> Option<usize> {
        self.by_identity.get(artist)?.get(track).copied()
    }

    fn index(&mut self, identity: &TrackIdentity, pos: usize) {
        self.by_identity
            .entry(identity.artist.clone())
            .or_default()
            .insert(identity.track.clone(), pos);
    }

    fn unindex(&mut self, identity: &TrackIdentity) {
        if let Some(tracks) = self.by_identity.get_mut(&identity.artist) {
            tracks.remove(&identity.track);
            if tracks.is_empty() {
                self.by_identity.remove(&identity.artist);
            }
        }
    }

    fn remove_at(&mut self, pos: usize) {
        let removed = self.entries.remove(pos);
        self.by_id.remove(&removed.id);
        self.unindex(&removed.identity);
        for i in pos..self.entries.len() {
            let entry = self.entries[i].clone();
            self.by_id.insert(entry.id, i);
            self.index(&entry.identity, i);
        }
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Identity recorded for `id`.
    #[must_use]
    pub fn identity_of(&self, id: &TrackId) -> Option<&TrackIdentity> {
        self.by_id.get(id).map(|&pos| &self.entries[pos].identity)
    }

    /// Identifier `identity` resolved to.
    #[must_use]
    pub fn id_of(&self, identity: &TrackIdentity) -> Option<&TrackId> {
        self.id_for(&identity.artist, &identity.track)
    }

    /// Identifier for an (artist, track) pair, without building an identity.
    #[must_use]
    pub fn id_for(&self, artist: &str, track: &str) -> Option<&TrackId> {
        self.position(artist, track).map(|pos| &self.entries[pos].id)
    }

    /// Identifier for the identity of `event`.
    #[must_use]
    pub fn id_for_event(&self, event: &StreamEvent) -> Option<&TrackId> {
        self.id_for(&event.artist_name, &event.track_name)
    }

    pub fn iter(&self) -> impl Iterator<Item = &ResolvedTrack> {
        self.entries.iter()
    }

    /// Identifiers in canonical order.
    pub fn ids(&self) -> impl Iterator<Item = &TrackId> {
        self.entries.iter().map(|entry| &entry.id)
    }
}

impl FromIterator<(TrackId, TrackIdentity)> for ResolvedTracks {
    fn from_iter<I: IntoIterator<Item = (TrackId, TrackIdentity)>>(iter: I) -> Self {
        let mut resolved = Self::new();
        for (id, identity) in iter {
            resolved.insert(id, identity);
        }
        resolved
    }
}

/// Outcome of resolving a set of identities.
#[derive(Debug, Clone, Default)]
pub struct Resolution {
    pub resolved: ResolvedTracks,
    pub failures: Vec<LookupFailure>,
}

/// Resolves identities through the catalog's text search.
#[derive(Debug, Clone)]
pub struct IdentityResolver {
    catalog: Arc<dyn CatalogService>,
}

impl IdentityResolver {
    pub fn new(catalog: Arc<dyn CatalogService>) -> Self {
        Self { catalog }
    }

    /// Resolve a single identity.
    ///
    /// Fatal catalog errors (credentials, or an outage that outlived
    /// retries) are returned as the outer error; everything else is a
    /// per-item [`LookupFailure`].
    pub async fn resolve_one(
        &self,
        identity: &TrackIdentity,
    ) -> PipelineResult<Result<TrackId, LookupFailure>> {
        let query = TrackQuery::from_identity(identity);

        match self.catalog.search_track(&query).await {
            Ok(Some(id)) => Ok(Ok(id)),
            Ok(None) => Ok(Err(LookupFailure::NoMatch(identity.clone()))),
            Err(e) if e.is_fatal() => Err(e.into()),
            Err(e) => Ok(Err(LookupFailure::Failed {
                identity: identity.clone(),
                reason: e.to_string(),
            })),
        }
    }

    /// Resolve every identity, one search each, in the set's order.
    pub async fn resolve(&self, identities: &BTreeSet<TrackIdentity>) -> PipelineResult<Resolution> {
        let mut resolution = Resolution::default();

        for identity in identities {
            match self.resolve_one(identity).await? {
                Ok(id) => {
                    log::debug!("Resolved {} -> {}", identity, id);
                    if let Some(displaced) = resolution.resolved.insert(id.clone(), identity.clone())
                    {
                        log::warn!(
                            "{} and {} both resolved to {}; keeping {}",
                            displaced,
                            identity,
                            id,
                            identity
                        );
                        resolution
                            .failures
                            .push(LookupFailure::Superseded { identity: displaced, id });
                    }
                }
                Err(failure) => {
                    log::warn!("Could not resolve {}", failure);
                    resolution.failures.push(failure);
                }
            }
        }

        log::info!(
            "Resolved {} of {} identities ({} unresolved)",
            resolution.resolved.len(),
            identities.len(),
            resolution.failures.len()
        );
        Ok(resolution)
    }
}
