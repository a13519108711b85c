//! Member resolution and UUID deduplication.
//!
//! Every candidate file is expanded into Mach-O members (one per fat slice,
//! or the whole file), then folded into a [`ResolutionSet`] holding one
//! member per UUID. When two members share a UUID the set prefers the one
//! from a `.dSYM` bundle, and otherwise the larger one.
//!
//! The "larger wins" rule assumes more bytes means more symbol information.
//! That does not hold for every dSYM/binary pair, so treat it as a heuristic.

use std::path::Path;
use std::sync::Arc;

use indexmap::IndexMap;
use macho_uuid_formats::{FatArchive, FileReader, MachoMember, ParseError, Reader};
use rayon::prelude::*;
use tracing::{debug, warn};
use uuid::Uuid;

use crate::locate::locate_symbol_files;
use crate::Error;

/// Outcome of offering a member to a [`ResolutionSet`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Resolution {
    /// First member seen for its UUID.
    Inserted,
    /// Replaced the member previously held for its UUID.
    Replaced,
    /// Discarded in favor of the member already held.
    Kept,
    /// The member has no UUID and cannot be keyed.
    NoUuid,
}

/// One Mach-O member per UUID, in first-seen order.
#[derive(Debug, Default)]
pub struct ResolutionSet {
    members: IndexMap<Uuid, MachoMember>,
}

impl ResolutionSet {
    pub fn new() -> Self {
        Self::default()
    }

    /// Offers `member` to the set, applying the tie-break policy against any
    /// member already held for the same UUID.
    pub fn insert(&mut self, member: MachoMember) -> Result<Resolution, ParseError> {
        let Some(uuid) = member.uuid()? else {
            return Ok(Resolution::NoUuid);
        };

        let Some(existing) = self.members.get_mut(&uuid) else {
            self.members.insert(uuid, member);
            return Ok(Resolution::Inserted);
        };

        if prefers(&member, existing) {
            debug!(
                %uuid,
                kept = ?member.path(),
                dropped = ?existing.path(),
                "replacing duplicate member"
            );
            *existing = member;
            Ok(Resolution::Replaced)
        } else {
            debug!(
                %uuid,
                kept = ?existing.path(),
                dropped = ?member.path(),
                "discarding duplicate member"
            );
            Ok(Resolution::Kept)
        }
    }

    /// Number of distinct UUIDs.
    pub fn len(&self) -> usize {
        self.members.len()
    }

    pub fn is_empty(&self) -> bool {
        self.members.is_empty()
    }

    /// Returns the member held for `uuid`.
    pub fn get(&self, uuid: &Uuid) -> Option<&MachoMember> {
        self.members.get(uuid)
    }

    /// Iterates UUIDs and their members in first-seen order.
    pub fn iter(&self) -> impl Iterator<Item = (&Uuid, &MachoMember)> {
        self.members.iter()
    }

    pub fn into_members(self) -> Vec<MachoMember> {
        self.members.into_values().collect()
    }
}

/// Returns true if `incoming` should replace `existing`.
fn prefers(incoming: &MachoMember, existing: &MachoMember) -> bool {
    if is_dsym(incoming) {
        return true;
    }
    if is_dsym(existing) {
        return false;
    }
    incoming.size() > existing.size()
}

/// Returns true if the member was read from inside a `.dSYM` bundle.
pub fn is_dsym(member: &MachoMember) -> bool {
    member.path().is_some_and(|path| {
        path.to_string_lossy()
            .to_ascii_lowercase()
            .contains(".dsym")
    })
}

/// Expands one candidate file into its Mach-O members.
///
/// A fat archive yields its valid slices; anything else is a single
/// standalone member whose UUID must decode.
pub fn expand_candidate(path: &Path) -> Result<Vec<MachoMember>, Error> {
    let reader: Arc<dyn Reader> = Arc::new(FileReader::new(path));

    if FatArchive::is_fat(reader.as_ref()) {
        let members = FatArchive::new(reader, Some(path.to_path_buf()))
            .into_members()
            .map_err(|err| Error::parse(path, err))?;
        debug!(path = %path.display(), slices = members.len(), "expanded fat archive");
        return Ok(members);
    }

    let member = MachoMember::standalone(reader, Some(path.to_path_buf()))
        .map_err(|err| Error::io(path, err))?;
    member.uuid().map_err(|err| Error::parse(path, err))?;
    Ok(vec![member])
}

/// Resolves `path` into one Mach-O member per UUID.
///
/// Candidates are decoded in parallel; the dedup fold runs afterwards in
/// candidate order so the result does not depend on scheduling.
pub fn resolve_macho_files(path: impl AsRef<Path>) -> Result<Vec<MachoMember>, Error> {
    let candidates = locate_symbol_files(path)?;

    let expanded = candidates
        .par_iter()
        .map(|candidate| expand_candidate(candidate))
        .collect::<Result<Vec<_>, _>>()?;

    let mut set = ResolutionSet::new();
    for member in expanded.into_iter().flatten() {
        let path = member.path().map(Path::to_path_buf);
        let resolution = set.insert(member).map_err(|err| {
            Error::parse(path.clone().unwrap_or_default(), err)
        })?;
        if resolution == Resolution::NoUuid {
            warn!(path = ?path, "skipping Mach-O file without a UUID");
        }
    }

    Ok(set.into_members())
}
