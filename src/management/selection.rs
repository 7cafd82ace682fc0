use std::collections::BTreeSet;

use crate::types::Track;

/// How a selected playlist's tracks are chosen.
///
/// `All` also covers tracks the catalog gains after the selection was made,
/// which is why it is not collapsed into a set of uris.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Selection {
    All,
    /// Never empty: removing the last uri removes the whole entry.
    Partial(BTreeSet<String>),
}

impl Selection {
    pub fn includes(&self, uri: &str) -> bool {
        match self {
            Selection::All => true,
            Selection::Partial(uris) => uris.contains(uri),
        }
    }
}

/// A selection gesture as given on the command line.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SelectionOp {
    SelectAll(String),
    Toggle(String),
    ToggleTrack { playlist_id: String, uri: String },
}

impl SelectionOp {
    pub fn playlist_id(&self) -> &str {
        match self {
            SelectionOp::SelectAll(id) | SelectionOp::Toggle(id) => id,
            SelectionOp::ToggleTrack { playlist_id, .. } => playlist_id,
        }
    }
}

/// Per-playlist selection, iterated in insertion order.
///
/// An entry that changes mode keeps its position; one that is removed and
/// selected again moves to the end.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SelectionModel {
    entries: Vec<(String, Selection)>,
}

impl SelectionModel {
    pub fn new() -> Self {
        Self::default()
    }

    /// Coarse gesture: select every track, or drop the entry whatever its mode.
    pub fn toggle_collection(&mut self, playlist_id: &str) {
        if self.remove(playlist_id).is_none() {
            self.set(playlist_id, Selection::All);
        }
    }

    pub fn select_all_explicit(&mut self, playlist_id: &str) {
        self.set(playlist_id, Selection::All);
    }

    /// Toggles one track.
    ///
    /// `known_members` must be the playlist's fully drained listing: leaving
    /// `All` materializes its complement, and tracks missing from the list
    /// would silently drop out of the selection.
    pub fn toggle_member(&mut self, playlist_id: &str, member_uri: &str, known_members: &[Track]) {
        let next = match self.get(playlist_id) {
            None => Some(BTreeSet::from([member_uri.to_string()])),
            Some(Selection::All) => Some(
                known_members
                    .iter()
                    .filter(|track| track.uri != member_uri)
                    .map(|track| track.uri.clone())
                    .collect(),
            ),
            Some(Selection::Partial(uris)) => {
                let mut uris = uris.clone();
                if !uris.remove(member_uri) {
                    uris.insert(member_uri.to_string());
                }
                Some(uris)
            }
        };

        match next {
            Some(uris) if !uris.is_empty() => self.set(playlist_id, Selection::Partial(uris)),
            _ => {
                self.remove(playlist_id);
            }
        }
    }

    /// Bulk gesture over the playlist index: clears the model when every
    /// listed playlist is already selected, otherwise selects them all.
    pub fn toggle_every<'a, I>(&mut self, playlist_ids: I)
    where
        I: IntoIterator<Item = &'a str>,
    {
        let ids: Vec<&str> = playlist_ids.into_iter().collect();
        if !ids.is_empty() && ids.iter().all(|id| self.is_selected(id)) {
            self.clear();
            return;
        }
        for id in ids {
            self.select_all_explicit(id);
        }
    }

    pub fn is_member_selected(&self, playlist_id: &str, uri: &str) -> bool {
        self.get(playlist_id)
            .is_some_and(|selection| selection.includes(uri))
    }

    pub fn is_selected(&self, playlist_id: &str) -> bool {
        self.get(playlist_id).is_some()
    }

    pub fn get(&self, playlist_id: &str) -> Option<&Selection> {
        self.entries
            .iter()
            .find(|(id, _)| id == playlist_id)
            .map(|(_, selection)| selection)
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &Selection)> {
        self.entries
            .iter()
            .map(|(id, selection)| (id.as_str(), selection))
    }

    /// Short summary for listings, e.g. "Selected All" or "3 Songs".
    pub fn label(&self, playlist_id: &str) -> Option<String> {
        self.get(playlist_id).map(|selection| match selection {
            Selection::All => "Selected All".to_string(),
            Selection::Partial(uris) => format!("{} Songs", uris.len()),
        })
    }

    pub fn clear(&mut self) {
        self.entries.clear();
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    fn set(&mut self, playlist_id: &str, selection: Selection) {
        match self.entries.iter_mut().find(|(id, _)| id == playlist_id) {
            Some((_, current)) => *current = selection,
            None => self.entries.push((playlist_id.to_string(), selection)),
        }
    }

    fn remove(&mut self, playlist_id: &str) -> Option<Selection> {
        let index = self.entries.iter().position(|(id, _)| id == playlist_id)?;
        Some(self.entries.remove(index).1)
    }
}
