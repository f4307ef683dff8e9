//! Folding of sibling prefixes into a bounded number of coarser prefixes.
//!
//! When a folder has more children than the crawl is allowed to fan out to,
//! the children are merged into groups named by their longest common prefix.
//! Each group is then listed flatly as one unit of work.
//!
//! Merging is greedy: the two adjacent groups (in sorted order) sharing the
//! longest common prefix are merged first, earliest pair wins ties. After a
//! merge, neighbours whose name is a prefix of the new name (or the other way
//! round) are absorbed as well, so that every input starts with exactly one
//! group name and flat listings of different groups never overlap.

use serde::{Deserialize, Serialize};
use std::cmp::Reverse;
use std::collections::{BTreeMap, BinaryHeap};

/// Longest string that is a prefix of every element.
///
/// Returns an empty string for an empty input and the element itself for a
/// single-element input.
pub fn longest_common_prefix<S: AsRef<str>>(strings: &[S]) -> String {
    let Some((first, rest)) = strings.split_first() else {
        return String::new();
    };

    let mut prefix = first.as_ref();
    for s in rest {
        prefix = &prefix[..common_prefix_len(prefix, s.as_ref())];
        if prefix.is_empty() {
            break;
        }
    }

    prefix.to_string()
}

/// Byte length of the common prefix of `a` and `b`, always on a char boundary.
fn common_prefix_len(a: &str, b: &str) -> usize {
    a.char_indices()
        .zip(b.chars())
        .find(|((_, ca), cb)| ca != cb)
        .map(|((i, _), _)| i)
        .unwrap_or_else(|| a.len().min(b.len()))
}

fn is_prefix_related(a: &str, b: &str) -> bool {
    a.starts_with(b) || b.starts_with(a)
}

/// Fold `siblings` into at most `cap` group prefixes.
///
/// The result is sorted. Every sibling starts with exactly one returned
/// prefix. Inputs that already fit under the cap come back sorted and
/// deduplicated. A `cap` of zero is treated as one.
pub fn group_prefixes<S: AsRef<str>>(siblings: &[S], cap: usize) -> Vec<String> {
    GroupedPrefixSet::build(siblings, cap).group_names()
}

/// A group of contiguous (in sort order) sibling prefixes.
#[derive(Debug, Clone)]
struct Group {
    name: String,
    /// One past the last member index.
    end: usize,
    /// Bumped on every merge so stale heap entries can be recognised.
    generation: u64,
}

/// Candidate merge of two adjacent groups, ordered by shared prefix length
/// and then by earliest position.
#[derive(Debug, PartialEq, Eq, PartialOrd, Ord)]
struct Candidate {
    shared: usize,
    left: Reverse<usize>,
    left_generation: u64,
    right: usize,
    right_generation: u64,
}

/// Sibling prefixes together with the group each one was folded into.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct GroupedPrefixSet {
    /// Sorted, deduplicated original prefixes
    pub members: Vec<String>,

    /// Group names, sorted
    pub groups: Vec<String>,

    /// For each member, the index of its group in `groups`
    pub assignment: Vec<usize>,
}

impl GroupedPrefixSet {
    /// Fold `siblings` into at most `cap` groups.
    pub fn build<S: AsRef<str>>(siblings: &[S], cap: usize) -> Self {
        let cap = cap.max(1);
        let mut members: Vec<String> = siblings.iter().map(|s| s.as_ref().to_string()).collect();
        members.sort();
        members.dedup();

        // Groups keyed by the index of their first member.
        let mut groups: BTreeMap<usize, Group> = members
            .iter()
            .enumerate()
            .map(|(i, m)| {
                (
                    i,
                    Group {
                        name: m.clone(),
                        end: i + 1,
                        generation: 0,
                    },
                )
            })
            .collect();

        // Distinct siblings may still be prefixes of each other; fold those first.
        let mut start = 0;
        while start < members.len() {
            let end = absorb_related(&mut groups, start);
            start = end;
        }

        let mut heap = BinaryHeap::new();
        let starts: Vec<usize> = groups.keys().copied().collect();
        for pair in starts.windows(2) {
            heap.push(candidate(&groups, pair[0], pair[1]));
        }

        while groups.len() > cap {
            let Some(best) = heap.pop() else { break };
            let Reverse(left) = best.left;

            let valid = matches!(
                (groups.get(&left), groups.get(&best.right)),
                (Some(l), Some(r))
                    if l.generation == best.left_generation
                        && r.generation == best.right_generation
            );
            if !valid {
                continue;
            }

            merge_right(&mut groups, left);
            absorb_related(&mut groups, left);

            let left = *groups
                .range(..=left)
                .next_back()
                .map(|(start, _)| start)
                .unwrap_or(&left);
            if let Some((&prev, _)) = groups.range(..left).next_back() {
                heap.push(candidate(&groups, prev, left));
            }
            if let Some((&next, _)) = groups.range(left + 1..).next() {
                heap.push(candidate(&groups, left, next));
            }
        }

        let mut assignment = vec![0; members.len()];
        let mut names = Vec::with_capacity(groups.len());
        for (index, (start, group)) in groups.iter().enumerate() {
            assignment[*start..group.end].fill(index);
            names.push(group.name.clone());
        }

        Self {
            members,
            groups: names,
            assignment,
        }
    }

    /// The group names.
    pub fn group_names(self) -> Vec<String> {
        self.groups
    }

    /// Members folded into the group at `index`.
    pub fn members_of(&self, index: usize) -> impl Iterator<Item = &str> {
        self.members
            .iter()
            .zip(&self.assignment)
            .filter(move |(_, g)| **g == index)
            .map(|(m, _)| m.as_str())
    }
}

fn candidate(groups: &BTreeMap<usize, Group>, left: usize, right: usize) -> Candidate {
    let l = &groups[&left];
    let r = &groups[&right];
    Candidate {
        shared: common_prefix_len(&l.name, &r.name),
        left: Reverse(left),
        left_generation: l.generation,
        right,
        right_generation: r.generation,
    }
}

/// Merge the group starting at `left` with its right neighbour.
fn merge_right(groups: &mut BTreeMap<usize, Group>, left: usize) -> bool {
    let Some(right) = groups.range(left + 1..).next().map(|(k, _)| *k) else {
        return false;
    };
    let Some(r) = groups.remove(&right) else {
        return false;
    };
    if let Some(l) = groups.get_mut(&left) {
        let shared = common_prefix_len(&l.name, &r.name);
        l.name.truncate(shared);
        l.end = r.end;
        l.generation = l.generation.max(r.generation) + 1;
    }
    true
}

/// Absorb neighbours of the group at `start` while their names are prefixes
/// of its name or vice versa. Returns the end index of the resulting group.
fn absorb_related(groups: &mut BTreeMap<usize, Group>, start: usize) -> usize {
    let mut start = start;
    loop {
        let name = groups[&start].name.clone();

        let next = groups
            .range(start + 1..)
            .next()
            .filter(|(_, g)| is_prefix_related(&name, &g.name))
            .map(|(k, _)| *k);
        if next.is_some() {
            merge_right(groups, start);
            continue;
        }

        let prev = groups
            .range(..start)
            .next_back()
            .filter(|(_, g)| is_prefix_related(&name, &g.name))
            .map(|(k, _)| *k);
        if let Some(prev) = prev {
            merge_right(groups, prev);
            start = prev;
            continue;
        }

        return groups[&start].end;
    }
}
