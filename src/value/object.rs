use crate::error::Error;
use crate::util::Log;
use crate::value::Value;
use once_cell::sync::OnceCell;
use std::collections::hash_map::RandomState;
use std::hash::{BuildHasher, Hasher};

const MIN_CAP: usize = 8;

static HASH_SEED: OnceCell<u64> = OnceCell::new();

/// Override the process-wide hash seed. Meaningful only before the first
/// [`Object`] is built; mutation after first use yields unspecified probing
/// behavior (it cannot corrupt memory, only make previously inserted keys
/// temporarily unreachable under the new seed).
pub fn set_hash_seed(seed: u64) {
    let _ = HASH_SEED.set(seed);
}

fn hash_seed() -> u64 {
    *HASH_SEED.get_or_init(|| RandomState::new().build_hasher().finish())
}

fn hash_key(key: &[u8]) -> u64 {
    let mut h = hash_seed();
    for &byte in key {
        h = h.wrapping_mul(100_003) ^ (byte as u64);
    }
    h
}

#[derive(Debug, Clone)]
enum Slot {
    Empty,
    Tombstone,
    Live { hash: u64, key: Vec<u8>, value: Value },
}

/// An open-addressed mapping from UTF-8 byte-string keys to [`Value`].
///
/// Capacity is always a power of two (minimum 8) so probing can use
/// mask-and-add; load factor is kept below 2/3 by doubling on insert.
/// Lookup stops at an `Empty` slot or an exact `Live` match; `Tombstone`
/// slots are passed through during probing and reclaimed only on the next
/// growth.
#[derive(Debug, Clone, Default)]
pub struct Object {
    slots: Vec<Slot>,
    len: usize,
}

impl Object {
    pub fn new() -> Self {
        Self {
            slots: Vec::new(),
            len: 0,
        }
    }

    pub fn len(&self) -> usize {
        self.len
    }

    pub fn is_empty(&self) -> bool {
        self.len == 0
    }

    fn mask(&self) -> u64 {
        (self.slots.len() - 1) as u64
    }

    /// Probe starting at `hash`, returning the index of either an `Empty`
    /// slot or the exact `Live` match for `key`.
    fn lookup(slots: &[Slot], mask: u64, hash: u64, key: &[u8]) -> usize {
        let mut i = hash;
        let mut perturb = hash;
        loop {
            let idx = (i & mask) as usize;
            match &slots[idx] {
                Slot::Empty => return idx,
                Slot::Live {
                    hash: h,
                    key: k,
                    ..
                } if *h == hash && k.as_slice() == key => return idx,
                _ => {}
            }
            perturb >>= 5;
            i = i.wrapping_add(perturb).wrapping_add(1);
        }
    }

    fn grow(&mut self, log: &Log<&'static str>) -> Result<(), Error> {
        let old_cap = self.slots.len();
        let new_cap = if old_cap == 0 { MIN_CAP } else { old_cap * 2 };

        let mut new_slots = Vec::new();
        new_slots
            .try_reserve_exact(new_cap)
            .map_err(|_| Error::Alloc)?;
        new_slots.resize_with(new_cap, || Slot::Empty);
        let mask = (new_cap - 1) as u64;

        for slot in self.slots.drain(..) {
            if let Slot::Live { hash, key, value } = slot {
                let idx = Self::lookup(&new_slots, mask, hash, &key);
                new_slots[idx] = Slot::Live { hash, key, value };
            }
        }

        log.trace_rehash(old_cap, new_cap);
        self.slots = new_slots;
        Ok(())
    }

    pub fn get(&self, key: &[u8]) -> Option<&Value> {
        if self.slots.is_empty() {
            return None;
        }
        let hash = hash_key(key);
        let idx = Self::lookup(&self.slots, self.mask(), hash, key);
        match &self.slots[idx] {
            Slot::Live { value, .. } => Some(value),
            _ => None,
        }
    }

    pub fn get_mut(&mut self, key: &[u8]) -> Option<&mut Value> {
        if self.slots.is_empty() {
            return None;
        }
        let hash = hash_key(key);
        let idx = Self::lookup(&self.slots, self.mask(), hash, key);
        match &mut self.slots[idx] {
            Slot::Live { value, .. } => Some(value),
            _ => None,
        }
    }

    /// Insert or (if `replace`) reset an existing entry to `Null`, returning
    /// the slot index on success. `Ok(None)` means the key already exists
    /// and `replace` was false.
    pub(crate) fn set_indexed(
        &mut self,
        key: &[u8],
        replace: bool,
        log: &Log<&'static str>,
    ) -> Result<Option<usize>, Error> {
        if self.slots.is_empty() {
            self.grow(log)?;
        }

        let hash = hash_key(key);
        let mut idx = Self::lookup(&self.slots, self.mask(), hash, key);

        if self.len + self.len / 2 > self.slots.len() {
            self.grow(log)?;
            idx = Self::lookup(&self.slots, self.mask(), hash, key);
        }

        let exists = matches!(self.slots[idx], Slot::Live { .. });
        if exists && !replace {
            return Ok(None);
        }

        let mut owned_key = Vec::new();
        owned_key.try_reserve_exact(key.len()).map_err(|_| Error::Alloc)?;
        owned_key.extend_from_slice(key);

        if !exists {
            self.len += 1;
        }
        self.slots[idx] = Slot::Live {
            hash,
            key: owned_key,
            value: Value::Null,
        };
        Ok(Some(idx))
    }

    pub fn set(&mut self, key: &[u8], replace: bool) -> Result<Option<&mut Value>, Error> {
        match self.set_indexed(key, replace, &Log::None)? {
            Some(idx) => Ok(Some(self.slot_value_mut(idx))),
            None => Ok(None),
        }
    }

    pub(crate) fn slot_value_mut(&mut self, idx: usize) -> &mut Value {
        match &mut self.slots[idx] {
            Slot::Live { value, .. } => value,
            _ => unreachable!("path referenced a non-live object slot"),
        }
    }

    pub fn delete(&mut self, key: &[u8]) -> bool {
        if self.slots.is_empty() {
            return false;
        }
        let hash = hash_key(key);
        let idx = Self::lookup(&self.slots, self.mask(), hash, key);
        if matches!(self.slots[idx], Slot::Live { .. }) {
            self.slots[idx] = Slot::Tombstone;
            self.len -= 1;
            true
        } else {
            false
        }
    }

    pub fn iter(&self) -> Iter<'_> {
        Iter {
            slots: self.slots.iter(),
        }
    }
}

pub struct Iter<'a> {
    slots: std::slice::Iter<'a, Slot>,
}

impl<'a> Iterator for Iter<'a> {
    type Item = (&'a [u8], &'a Value);

    fn next(&mut self) -> Option<Self::Item> {
        for slot in self.slots.by_ref() {
            if let Slot::Live { key, value, .. } = slot {
                return Some((key.as_slice(), value));
            }
        }
        None
    }
}

impl<'a> IntoIterator for &'a Object {
    type Item = (&'a [u8], &'a Value);
    type IntoIter = Iter<'a>;

    fn into_iter(self) -> Iter<'a> {
        self.iter()
    }
}

impl PartialEq for Object {
    fn eq(&self, other: &Self) -> bool {
        self.len() == other.len() && self.iter().all(|(k, v)| other.get(k) == Some(v))
    }
}
