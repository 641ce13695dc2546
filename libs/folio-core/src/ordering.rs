//! Integer order keys for a sibling set: the blocks of one page, or the
//! pages sharing one parent. Iterating a set by ascending key reproduces its
//! visual order and no two siblings ever share a key.

use super::{FolioError, FolioResult};
use std::collections::HashSet;

pub trait Sibling {
    fn id(&self) -> &str;
    fn order_key(&self) -> i64;
    fn set_order_key(&mut self, key: i64);
}

/// Where an insertion lands. When `renumbered` is set there was no free key
/// between the neighbours and the whole set is rewritten densely, so `key`
/// equals `index`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Placement {
    pub index: usize,
    pub key: i64,
    pub renumbered: bool,
}

/// A key strictly between `prev` and `next`, never below zero.
pub fn key_between(prev: Option<i64>, next: Option<i64>) -> Option<i64> {
    match (prev, next) {
        (None, None) => Some(0),
        (Some(prev), None) => prev.checked_add(1),
        (None, Some(next)) => (next >= 1).then(|| next - 1),
        (Some(prev), Some(next)) => match next.checked_sub(prev) {
            Some(gap) if gap >= 2 => Some(prev + gap / 2),
            _ => None,
        },
    }
}

pub fn sort_siblings<T: Sibling>(siblings: &mut [T]) {
    siblings.sort_by_key(|sibling| sibling.order_key());
}

/// Rewrite keys as `0, 1, 2, ...`; returns how many keys changed.
pub fn renumber<T: Sibling>(siblings: &mut [T]) -> usize {
    let mut changed = 0;
    for (index, sibling) in siblings.iter_mut().enumerate() {
        let key = index as i64;
        if sibling.order_key() != key {
            sibling.set_order_key(key);
            changed += 1;
        }
    }
    changed
}

/// Compute the placement of an item inserted right after `anchor` (or at the
/// front when `anchor` is `None`) without touching the set.
pub fn plan_insert_after<T: Sibling>(siblings: &[T], anchor: Option<usize>) -> FolioResult<Placement> {
    let index = match anchor {
        Some(anchor) if anchor >= siblings.len() => {
            return Err(FolioError::PositionOutOfRange {
                index: anchor,
                len: siblings.len(),
            })
        }
        Some(anchor) => anchor + 1,
        None => 0,
    };

    let prev = index.checked_sub(1).map(|i| siblings[i].order_key());
    let next = siblings.get(index).map(|s| s.order_key());

    Ok(match key_between(prev, next) {
        Some(key) => Placement {
            index,
            key,
            renumbered: false,
        },
        None => Placement {
            index,
            key: index as i64,
            renumbered: true,
        },
    })
}

pub fn insert_after<T: Sibling>(siblings: &mut Vec<T>, anchor: Option<usize>, mut item: T) -> FolioResult<Placement> {
    let placement = plan_insert_after(siblings, anchor)?;

    item.set_order_key(placement.key);
    siblings.insert(placement.index, item);
    if placement.renumbered {
        renumber(siblings);
    }

    Ok(placement)
}

/// Place an item that already carries a key. Later siblings whose keys would
/// collide are bumped forward just enough to stay strictly increasing.
pub fn insert_by_key<T: Sibling>(siblings: &mut Vec<T>, item: T) -> usize {
    let index = siblings.partition_point(|s| s.order_key() < item.order_key());
    siblings.insert(index, item);

    for i in index + 1..siblings.len() {
        let floor = siblings[i - 1].order_key();
        if siblings[i].order_key() > floor {
            break;
        }
        siblings[i].set_order_key(floor + 1);
    }

    index
}

pub fn remove<T: Sibling>(siblings: &mut Vec<T>, index: usize) -> FolioResult<T> {
    if index >= siblings.len() {
        return Err(FolioError::PositionOutOfRange {
            index,
            len: siblings.len(),
        });
    }
    Ok(siblings.remove(index))
}

/// Move the item at `from` so it ends up at index `to`, then renumber. Items
/// outside `from..=to` keep their relative order; with dense keys only the
/// moved span receives new keys.
pub fn move_item<T: Sibling>(siblings: &mut Vec<T>, from: usize, to: usize) -> FolioResult<usize> {
    let len = siblings.len();
    for index in [from, to] {
        if index >= len {
            return Err(FolioError::PositionOutOfRange { index, len });
        }
    }

    let item = siblings.remove(from);
    siblings.insert(to, item);

    Ok(renumber(siblings))
}

/// Full-replace reorder: `ids` must be a permutation of the set's ids. On a
/// mismatch nothing is changed.
pub fn apply_order<T: Sibling, S: AsRef<str>>(siblings: &mut Vec<T>, ids: &[S]) -> FolioResult<()> {
    if ids.len() != siblings.len() {
        return Err(FolioError::OrderMismatch(format!(
            "expected {} ids, got {}",
            siblings.len(),
            ids.len()
        )));
    }

    let mut seen = HashSet::with_capacity(ids.len());
    let mut positions = Vec::with_capacity(ids.len());
    for id in ids {
        let id = id.as_ref();
        if !seen.insert(id) {
            return Err(FolioError::OrderMismatch(format!("duplicate id {id}")));
        }
        match siblings.iter().position(|s| s.id() == id) {
            Some(position) => positions.push(position),
            None => return Err(FolioError::OrderMismatch(format!("unknown id {id}"))),
        }
    }

    let mut slots: Vec<Option<T>> = siblings.drain(..).map(Some).collect();
    siblings.extend(positions.into_iter().filter_map(|position| slots[position].take()));
    renumber(siblings);

    Ok(())
}
