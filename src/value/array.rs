use crate::error::Error;
use crate::value::Value;

/// An ordered sequence of [`Value`], growing geometrically (doubling) from
/// a minimum capacity of 8, mirroring `json5_value_append_item`.
#[derive(Debug, Clone, Default)]
pub struct Array(Vec<Value>);

impl Array {
    pub fn new() -> Self {
        Self(Vec::new())
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn get(&self, idx: usize) -> Option<&Value> {
        self.0.get(idx)
    }

    pub fn get_mut(&mut self, idx: usize) -> Option<&mut Value> {
        self.0.get_mut(idx)
    }

    pub fn iter(&self) -> std::slice::Iter<'_, Value> {
        self.0.iter()
    }

    pub fn as_slice(&self) -> &[Value] {
        &self.0
    }

    /// Append a fresh `Null` slot and return a mutable reference to it.
    /// The reference is invalidated by any later mutation of this array
    /// that could reallocate its backing storage.
    pub fn append_item(&mut self) -> Result<&mut Value, Error> {
        if self.0.len() == self.0.capacity() {
            let new_cap = if self.0.capacity() == 0 {
                8
            } else {
                self.0.capacity() * 2
            };
            self.0
                .try_reserve_exact(new_cap - self.0.len())
                .map_err(|_| Error::Alloc)?;
        }
        self.0.push(Value::Null);
        Ok(self.0.last_mut().expect("just pushed"))
    }
}

impl PartialEq for Array {
    fn eq(&self, other: &Self) -> bool {
        self.0 == other.0
    }
}

impl From<Vec<Value>> for Array {
    fn from(items: Vec<Value>) -> Self {
        Self(items)
    }
}

impl<'a> IntoIterator for &'a Array {
    type Item = &'a Value;
    type IntoIter = std::slice::Iter<'a, Value>;

    fn into_iter(self) -> Self::IntoIter {
        self.0.iter()
    }
}
