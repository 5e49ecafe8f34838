//! Variable merge.
//!
//! Compares two name→value mappings and combines them under a policy. Push
//! uses the plain [`Classification`] to decide which remote calls to make;
//! pull uses [`merge`] to fold remote values into the local file.

use std::collections::{BTreeMap, BTreeSet};

/// How incoming values are reconciled with existing local ones.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum MergePolicy {
    /// Incoming replaces existing entirely.
    #[default]
    OverrideAll,
    /// Existing values win; only names new upstream are added.
    KeepAll,
    /// Ask per changed or removed name, in name order.
    PerKeyConfirm,
}

/// What happened to one name in a merge.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum KeyStatus {
    /// Present only upstream; now present locally.
    Added,
    /// Absent upstream; dropped locally.
    Removed,
    /// Upstream value taken over a different local one.
    Changed,
    /// Local value kept although upstream differs or lacks it.
    Kept,
}

/// A name whose two sides differ, as shown to a confirm callback.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct KeyChange<'a> {
    pub name: &'a str,
    /// Current local value, `None` if the name is new upstream.
    pub existing: Option<&'a str>,
    /// Upstream value, `None` if the name was removed upstream.
    pub incoming: Option<&'a str>,
}

impl KeyChange<'_> {
    /// Whether taking the incoming side deletes the name.
    pub fn is_removal(&self) -> bool {
        self.incoming.is_none()
    }
}

/// Added, changed and removed names going from `existing` to `incoming`.
///
/// All lists are sorted by name. Names with equal values on both sides
/// appear in none of them.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Classification {
    added: Vec<String>,
    changed: Vec<String>,
    removed: Vec<String>,
}

impl Classification {
    /// Compute the difference between two mappings.
    pub fn diff(existing: &BTreeMap<String, String>, incoming: &BTreeMap<String, String>) -> Self {
        let mut out = Self::default();

        for (name, value) in incoming {
            match existing.get(name) {
                None => out.added.push(name.clone()),
                Some(old) if old != value => out.changed.push(name.clone()),
                Some(_) => {}
            }
        }

        out.removed = existing
            .keys()
            .filter(|name| !incoming.contains_key(*name))
            .cloned()
            .collect();

        out
    }

    pub fn added(&self) -> &[String] {
        &self.added
    }

    pub fn changed(&self) -> &[String] {
        &self.changed
    }

    pub fn removed(&self) -> &[String] {
        &self.removed
    }

    /// Whether both sides hold identical mappings.
    pub fn is_empty(&self) -> bool {
        self.added.is_empty() && self.changed.is_empty() && self.removed.is_empty()
    }
}

/// Outcome of a merge.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Merge {
    /// The merged mapping
    pub merged: BTreeMap<String, String>,
    /// Per-name outcome for every name whose sides differed, in name order
    pub entries: Vec<(String, KeyStatus)>,
}

impl Merge {
    /// Names with the given outcome.
    pub fn names(&self, status: KeyStatus) -> Vec<String> {
        self.entries
            .iter()
            .filter(|(_, s)| *s == status)
            .map(|(name, _)| name.clone())
            .collect()
    }
}

/// Merge `incoming` into `existing` under `policy`.
///
/// `confirm` is only called for [`MergePolicy::PerKeyConfirm`], once per
/// changed or removed name in byte-wise name order, and returns whether to
/// take the incoming side. Names new upstream are always added.
pub fn merge(
    existing: &BTreeMap<String, String>,
    incoming: &BTreeMap<String, String>,
    policy: MergePolicy,
    confirm: &mut dyn FnMut(&KeyChange<'_>) -> bool,
) -> Merge {
    let diff = Classification::diff(existing, incoming);
    let mut merged = existing.clone();
    let mut entries = Vec::new();

    for name in diff.added() {
        merged.insert(name.clone(), incoming[name].clone());
        entries.push((name.clone(), KeyStatus::Added));
    }

    // Changed and removed names interleaved in name order.
    let contested: BTreeSet<&String> = diff.changed().iter().chain(diff.removed()).collect();

    for name in contested {
        let change = KeyChange {
            name,
            existing: existing.get(name).map(String::as_str),
            incoming: incoming.get(name).map(String::as_str),
        };

        let take_incoming = match policy {
            MergePolicy::OverrideAll => true,
            MergePolicy::KeepAll => false,
            MergePolicy::PerKeyConfirm => confirm(&change),
        };

        let status = match (take_incoming, change.incoming) {
            (false, _) => KeyStatus::Kept,
            (true, Some(value)) => {
                merged.insert(name.clone(), value.to_string());
                KeyStatus::Changed
            }
            (true, None) => {
                merged.remove(name);
                KeyStatus::Removed
            }
        };
        entries.push((name.clone(), status));
    }

    entries.sort_by(|a, b| a.0.cmp(&b.0));
    Merge { merged, entries }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn map(pairs: &[(&str, &str)]) -> BTreeMap<String, String> {
        pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect()
    }

    fn never(_: &KeyChange<'_>) -> bool {
        panic!("confirm must not be called")
    }

    #[test]
    fn test_diff() {
        let existing = map(&[("A", "1"), ("B", "2"), ("C", "3")]);
        let incoming = map(&[("A", "1"), ("B", "x"), ("D", "4")]);

        let diff = Classification::diff(&existing, &incoming);
        assert_eq!(diff.added(), ["D"]);
        assert_eq!(diff.changed(), ["B"]);
        assert_eq!(diff.removed(), ["C"]);
        assert!(Classification::diff(&existing, &existing).is_empty());
    }

    #[test]
    fn test_override_all_equals_incoming() {
        let existing = map(&[("A", "1"), ("B", "2"), ("C", "3")]);
        let incoming = map(&[("A", "1"), ("B", "x"), ("D", "4")]);

        let result = merge(&existing, &incoming, MergePolicy::OverrideAll, &mut never);
        assert_eq!(result.merged, incoming);
        assert_eq!(
            result.entries,
            vec![
                ("B".to_string(), KeyStatus::Changed),
                ("C".to_string(), KeyStatus::Removed),
                ("D".to_string(), KeyStatus::Added),
            ]
        );
    }

    #[test]
    fn test_keep_all_only_adds() {
        let existing = map(&[("A", "1"), ("B", "2"), ("C", "3")]);
        let incoming = map(&[("B", "x"), ("D", "4")]);

        let result = merge(&existing, &incoming, MergePolicy::KeepAll, &mut never);
        assert_eq!(
            result.merged,
            map(&[("A", "1"), ("B", "2"), ("C", "3"), ("D", "4")])
        );
        assert_eq!(result.names(KeyStatus::Kept), vec!["A", "B", "C"]);
        assert_eq!(result.names(KeyStatus::Added), vec!["D"]);
    }

    #[test]
    fn test_per_key_confirm_asks_in_name_order() {
        let existing = map(&[("Z", "1"), ("M", "2"), ("B", "3")]);
        let incoming = map(&[("Z", "x"), ("M", "y"), ("N", "new")]);

        let mut asked = Vec::new();
        let result = merge(
            &existing,
            &incoming,
            MergePolicy::PerKeyConfirm,
            &mut |change: &KeyChange<'_>| {
                asked.push(change.name.to_string());
                // take upstream for M and the removal of B, keep Z
                change.name != "Z"
            },
        );

        assert_eq!(asked, vec!["B", "M", "Z"]);
        assert_eq!(
            result.merged,
            map(&[("M", "y"), ("N", "new"), ("Z", "1")])
        );
        assert_eq!(result.names(KeyStatus::Removed), vec!["B"]);
        assert_eq!(result.names(KeyStatus::Changed), vec!["M"]);
        assert_eq!(result.names(KeyStatus::Kept), vec!["Z"]);
        assert_eq!(result.names(KeyStatus::Added), vec!["N"]);
    }

    #[test]
    fn test_confirm_sees_both_sides() {
        let existing = map(&[("A", "old")]);
        let incoming = BTreeMap::new();

        let mut seen = None;
        merge(
            &existing,
            &incoming,
            MergePolicy::PerKeyConfirm,
            &mut |change: &KeyChange<'_>| {
                seen = Some((change.existing.map(str::to_string), change.is_removal()));
                false
            },
        );
        assert_eq!(seen, Some((Some("old".to_string()), true)));
    }

    #[test]
    fn test_identical_inputs_produce_no_entries() {
        let existing = map(&[("A", "1")]);
        let result = merge(&existing, &existing, MergePolicy::PerKeyConfirm, &mut never);
        assert_eq!(result.merged, existing);
        assert!(result.entries.is_empty());
    }
}
