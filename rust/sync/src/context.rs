// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Identity state owned by a single reconciliation run.

use std::fmt::Debug;
use std::hash::Hash;

use rustc_hash::{FxHashMap, FxHashSet};

/// Maps GIDs to native handles for the duration of one run.
///
/// `existing` holds what a scan found before the run, `created` what this
/// run built. A GID found on several elements is banned: it is never put
/// into `existing` again during the run.
#[derive(Debug, Clone)]
pub struct ReconciliationContext<H> {
    existing: FxHashMap<String, H>,
    banned: FxHashSet<String>,
    created: FxHashMap<String, H>,
    scale: f64,
}

impl<H: Clone + Eq + Hash + Debug> ReconciliationContext<H> {
    /// Empty context, used when the run does not update.
    pub fn new(scale: f64) -> Self {
        Self {
            existing: FxHashMap::default(),
            banned: FxHashSet::default(),
            created: FxHashMap::default(),
            scale,
        }
    }

    /// Builds `existing` from scan results, banning ambiguous GIDs.
    pub fn from_scan(scan: impl IntoIterator<Item = (String, H)>, scale: f64) -> Self {
        let mut context = Self::new(scale);
        for (gid, handle) in scan {
            context.insert_existing(gid, handle);
        }
        context
    }

    /// Adds one scanned element.
    ///
    /// Returns false when the GID is empty, already banned, or collides with
    /// another element (which bans it). Seeing the same element twice is
    /// not a collision.
    pub fn insert_existing(&mut self, gid: String, handle: H) -> bool {
        if gid.trim().is_empty() || self.banned.contains(&gid) {
            return false;
        }

        match self.existing.get(&gid) {
            Some(known) if *known == handle => false,
            Some(known) => {
                tracing::warn!(
                    gid = %gid,
                    first = ?known,
                    second = ?handle,
                    "GID tagged on more than one element, banning it for this run"
                );
                self.existing.remove(&gid);
                self.banned.insert(gid);
                false
            }
            None => {
                self.existing.insert(gid, handle);
                true
            }
        }
    }

    /// Records a handle built this run. First write wins; empty GIDs are
    /// never recorded.
    pub fn record_created(&mut self, gid: &str, handle: H) -> bool {
        if gid.trim().is_empty() || self.created.contains_key(gid) {
            return false;
        }
        self.created.insert(gid.to_string(), handle);
        true
    }

    /// Looks up a reference target: this run's elements first, then the
    /// scanned ones.
    pub fn resolve_reference(&self, gid: &str) -> Option<&H> {
        if gid.trim().is_empty() {
            return None;
        }
        self.created.get(gid).or_else(|| self.existing.get(gid))
    }

    pub fn existing(&self, gid: &str) -> Option<&H> {
        self.existing.get(gid)
    }

    pub fn created(&self, gid: &str) -> Option<&H> {
        self.created.get(gid)
    }

    pub fn is_banned(&self, gid: &str) -> bool {
        self.banned.contains(gid)
    }

    /// Banned GIDs, sorted.
    pub fn banned(&self) -> Vec<String> {
        let mut banned: Vec<String> = self.banned.iter().cloned().collect();
        banned.sort();
        banned
    }

    pub fn existing_entries(&self) -> impl Iterator<Item = (&str, &H)> {
        self.existing.iter().map(|(gid, h)| (gid.as_str(), h))
    }

    pub fn created_entries(&self) -> impl Iterator<Item = (&str, &H)> {
        self.created.iter().map(|(gid, h)| (gid.as_str(), h))
    }

    pub fn existing_len(&self) -> usize {
        self.existing.len()
    }

    pub fn created_len(&self) -> usize {
        self.created.len()
    }

    pub fn scale(&self) -> f64 {
        self.scale
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn duplicate_gid_is_banned() {
        let ctx = ReconciliationContext::from_scan(
            vec![
                ("a".to_string(), 1u64),
                ("dup".to_string(), 2),
                ("dup".to_string(), 3),
                ("dup".to_string(), 4),
            ],
            1.0,
        );

        assert_eq!(ctx.existing("a"), Some(&1));
        assert_eq!(ctx.existing("dup"), None);
        assert!(ctx.is_banned("dup"));
        assert_eq!(ctx.banned(), vec!["dup".to_string()]);
    }

    #[test]
    fn same_element_twice_is_not_ambiguous() {
        let ctx = ReconciliationContext::from_scan(
            vec![("a".to_string(), 1u64), ("a".to_string(), 1)],
            1.0,
        );
        assert_eq!(ctx.existing("a"), Some(&1));
        assert!(!ctx.is_banned("a"));
    }

    #[test]
    fn empty_gids_are_ignored() {
        let mut ctx = ReconciliationContext::from_scan(vec![(" ".to_string(), 1u64)], 1.0);
        assert_eq!(ctx.existing_len(), 0);
        assert!(!ctx.record_created("", 5));
        assert_eq!(ctx.created_len(), 0);
    }

    #[test]
    fn first_created_write_wins() {
        let mut ctx = ReconciliationContext::new(1.0);
        assert!(ctx.record_created("a", 1u64));
        assert!(!ctx.record_created("a", 2));
        assert_eq!(ctx.created("a"), Some(&1));
    }

    #[test]
    fn references_prefer_created() {
        let mut ctx = ReconciliationContext::from_scan(
            vec![("wall".to_string(), 1u64), ("floor".to_string(), 2)],
            1.0,
        );
        ctx.record_created("wall", 10);

        assert_eq!(ctx.resolve_reference("wall"), Some(&10));
        assert_eq!(ctx.resolve_reference("floor"), Some(&2));
        assert_eq!(ctx.resolve_reference("roof"), None);
        assert_eq!(ctx.resolve_reference(""), None);
    }
}
