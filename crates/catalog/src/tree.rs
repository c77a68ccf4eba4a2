// Copyright (c) 2025 woxQAQ
//
// Licensed under the MIT License or Apache License 2.0
// See LICENSE files for details

//! # Nesting reconstruction
//!
//! Argument views describe composite parameters as a flat list where each
//! row carries its depth (`DATA_LEVEL`). A record parameter at level 0 is
//! followed by its fields at level 1, their fields at level 2, and so on.
//! [`build_tree`] turns that list back into nested [`ArgumentNode`]s.
//!
//! ```text
//! 0 P_EMP          ->  P_EMP
//! 1   ID                 ├ ID
//! 1   ADDRESS            └ ADDRESS
//! 2     CITY                 └ CITY
//! 0 P_FLAG         ->  P_FLAG
//! ```

use serde::Serialize;
use tracing::warn;

/// One flat input record
#[derive(Debug, Clone, PartialEq)]
pub struct FlatRow<T> {
    pub data_level: u32,
    pub name: Option<String>,
    pub payload: T,
}

impl<T> FlatRow<T> {
    pub fn new(data_level: u32, name: Option<&str>, payload: T) -> Self {
        Self {
            data_level,
            name: name.map(str::to_string),
            payload,
        }
    }
}

/// A reconstructed node with its nested fields
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ArgumentNode<T> {
    pub name: Option<String>,
    pub data_level: u32,
    pub payload: T,
    pub children: Vec<ArgumentNode<T>>,
}

impl<T> ArgumentNode<T> {
    pub fn is_leaf(&self) -> bool {
        self.children.is_empty()
    }

    /// Direct child by exact name
    pub fn child(&self, name: &str) -> Option<&ArgumentNode<T>> {
        self.children
            .iter()
            .find(|child| child.name.as_deref() == Some(name))
    }

    /// Number of nodes in this subtree, including this one
    pub fn node_count(&self) -> usize {
        1 + self.children.iter().map(ArgumentNode::node_count).sum::<usize>()
    }
}

/// Where a row ended up during the forward pass
#[derive(Clone, Copy)]
enum Slot {
    Dropped,
    Root,
    Child(usize),
}

/// Rebuild the nesting of `rows`, returning the level-0 nodes in input order.
///
/// A row at level `L` is a child of the most recent row at level `L - 1`.
/// Rows whose level has no open parent (a leading level-1 row, or a jump of
/// more than one level) are logged and dropped together with anything nested
/// under them.
pub fn build_tree<T: Clone>(rows: &[FlatRow<T>]) -> Vec<ArgumentNode<T>> {
    // stack[k] is the index of the last accepted row at level k
    let mut stack: Vec<usize> = Vec::new();
    let mut slots = Vec::with_capacity(rows.len());

    for (index, row) in rows.iter().enumerate() {
        let level = row.data_level as usize;
        if stack.len() < level {
            warn!(
                "Dropping argument {:?} at level {}: no enclosing level {}",
                row.name,
                level,
                level - 1
            );
            slots.push(Slot::Dropped);
            continue;
        }
        stack.truncate(level);
        slots.push(match stack.last() {
            Some(&parent) => Slot::Child(parent),
            None => Slot::Root,
        });
        stack.push(index);
    }

    // Parents always precede their children, so a reverse pass sees every
    // child before its parent
    let mut pending: Vec<Vec<ArgumentNode<T>>> = rows.iter().map(|_| Vec::new()).collect();
    let mut roots = Vec::new();
    for (index, row) in rows.iter().enumerate().rev() {
        let slot = slots[index];
        if matches!(slot, Slot::Dropped) {
            continue;
        }
        let mut children = std::mem::take(&mut pending[index]);
        children.reverse();
        let node = ArgumentNode {
            name: row.name.clone(),
            data_level: row.data_level,
            payload: row.payload.clone(),
            children,
        };
        match slot {
            Slot::Child(parent) => pending[parent].push(node),
            _ => roots.push(node),
        }
    }
    roots.reverse();
    roots
}

#[cfg(test)]
mod tests {
    use super::*;

    fn row(level: u32, name: &str) -> FlatRow<()> {
        FlatRow::new(level, Some(name), ())
    }

    fn names<T>(nodes: &[ArgumentNode<T>]) -> Vec<&str> {
        nodes.iter().filter_map(|n| n.name.as_deref()).collect()
    }

    #[test]
    fn test_two_levels() {
        let tree = build_tree(&[row(0, "p1"), row(1, "f1"), row(1, "f2"), row(0, "p2")]);
        assert_eq!(names(&tree), vec!["p1", "p2"]);
        assert_eq!(names(&tree[0].children), vec!["f1", "f2"]);
        assert!(tree[1].is_leaf());
    }

    #[test]
    fn test_orphan_level_is_dropped() {
        assert!(build_tree(&[row(1, "x")]).is_empty());
    }

    #[test]
    fn test_jump_drops_subtree() {
        let tree = build_tree(&[row(0, "p"), row(2, "deep"), row(3, "deeper"), row(1, "f")]);
        assert_eq!(tree.len(), 1);
        assert_eq!(names(&tree[0].children), vec!["f"]);
        assert_eq!(tree[0].node_count(), 2);
    }

    #[test]
    fn test_deep_nesting_and_level_reset() {
        let tree = build_tree(&[
            row(0, "p_emp"),
            row(1, "id"),
            row(1, "address"),
            row(2, "city"),
            row(2, "zip"),
            row(1, "name"),
            row(0, "p_flag"),
        ]);
        assert_eq!(names(&tree), vec!["p_emp", "p_flag"]);
        let emp = &tree[0];
        assert_eq!(names(&emp.children), vec!["id", "address", "name"]);
        let address = emp.child("address").unwrap();
        assert_eq!(names(&address.children), vec!["city", "zip"]);
        assert!(emp.child("name").unwrap().is_leaf());
        assert_eq!(emp.node_count(), 6);
    }

    #[test]
    fn test_payload_and_unnamed_rows() {
        let rows = vec![FlatRow::new(0, None, 10u32), FlatRow::new(1, Some("f"), 11)];
        let tree = build_tree(&rows);
        assert_eq!(tree[0].name, None);
        assert_eq!(tree[0].payload, 10);
        assert_eq!(tree[0].children[0].payload, 11);
    }

    #[test]
    fn test_empty_input() {
        assert!(build_tree::<()>(&[]).is_empty());
    }
}
