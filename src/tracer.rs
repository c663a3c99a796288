/// Resolves a catalog entry down to the playable videos beneath it.
///
/// The walk is an explicit stack of frames rather than recursion: catalog
/// trees come from the server and may be arbitrarily deep or cyclic. Output
/// order is depth-first in listing order.
use std::{collections::HashSet, sync::Arc};

use crate::{
    catalog::CatalogClient,
    models::{CatalogEntry, EntryKind, MediaServer},
};

#[derive(Debug, Default, PartialEq, Eq)]
pub struct Trace {
    pub leaves: Vec<CatalogEntry>,
    /// The depth limit was hit; `leaves` holds what was found before that.
    pub overflowed: bool,
}

#[derive(Debug, Clone)]
pub struct FolderTracer {
    catalog: Arc<dyn CatalogClient>,
    max_depth: usize,
}

struct Frame {
    entry: CatalogEntry,
    pending: std::vec::IntoIter<CatalogEntry>,
    depth: usize,
    /// Set once any child was descended into or collected as a video.
    matched: bool,
}

impl FolderTracer {
    pub fn new(catalog: Arc<dyn CatalogClient>, max_depth: usize) -> Self {
        Self { catalog, max_depth }
    }

    /// Leaves beneath `entry`. A folder with nothing recognisable inside
    /// resolves to itself; a folder that cannot be fetched resolves to nothing.
    pub async fn resolve(&self, entry: &CatalogEntry, server: &MediaServer) -> Vec<CatalogEntry> {
        self.trace(entry, server).await.leaves
    }

    pub async fn trace(&self, entry: &CatalogEntry, server: &MediaServer) -> Trace {
        if entry.is_video() {
            return Trace {
                leaves: vec![entry.clone()],
                overflowed: false,
            };
        }

        let mut leaves = Vec::new();
        let mut visited = HashSet::from([entry.href.clone()]);

        let Some(root) = self.open(entry.clone(), 0, server).await else {
            return Trace::default();
        };
        let mut stack = vec![root];

        while let Some(frame) = stack.last_mut() {
            let Some(child) = frame.pending.next() else {
                if let Some(done) = stack.pop() {
                    if !done.matched {
                        leaves.push(done.entry);
                    }
                }
                continue;
            };

            if child.href == frame.entry.href {
                continue;
            }

            match child.kind {
                EntryKind::Folder {
                    child_count: Some(_),
                } => {
                    if !visited.insert(child.href.clone()) {
                        tracing::debug!(
                            "Already traced {} under {}, skipping",
                            child.href,
                            frame.entry.href
                        );
                        continue;
                    }
                    frame.matched = true;

                    let depth = frame.depth + 1;
                    if depth > self.max_depth {
                        tracing::warn!(
                            "Folder {:?} nests deeper than {} levels, stopping with {} leaves",
                            entry.name,
                            self.max_depth,
                            leaves.len()
                        );
                        return Trace {
                            leaves,
                            overflowed: true,
                        };
                    }

                    if let Some(next) = self.open(child, depth, server).await {
                        stack.push(next);
                    }
                }
                EntryKind::Video => {
                    frame.matched = true;
                    leaves.push(child);
                }
                EntryKind::Folder { child_count: None } => {
                    tracing::warn!(
                        "Unrecognized entry {:?} ({}) under {}, skipping",
                        child.name,
                        child.href,
                        frame.entry.href
                    );
                }
            }
        }

        Trace {
            leaves,
            overflowed: false,
        }
    }

    async fn open(&self, entry: CatalogEntry, depth: usize, server: &MediaServer) -> Option<Frame> {
        match self.catalog.fetch_children(&entry, server).await {
            Ok(children) => Some(Frame {
                entry,
                pending: children.into_iter(),
                depth,
                matched: false,
            }),
            Err(e) => {
                tracing::warn!("Could not list {:?}: {e}", entry.name);
                None
            }
        }
    }
}
