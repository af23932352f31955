use bytes::Bytes;
use std::collections::{HashMap, VecDeque};
use std::io::Cursor;
use std::sync::{Arc, Mutex, MutexGuard};
use std::time::{Duration, Instant};

use crate::frame::Frame;

/// The structure bound to a live key. Keeping this a sum type means a key can
/// never be present in two stores at once; rename, delete, type and snapshot
/// all act on a single map.
#[derive(Debug, Clone, PartialEq)]
pub enum Value {
    String(Bytes),
    List(VecDeque<Bytes>),
    Hash(HashMap<String, Bytes>),
}

impl Value {
    pub fn type_name(&self) -> &'static str {
        match self {
            Value::String(_) => "string",
            Value::List(_) => "list",
            Value::Hash(_) => "hash",
        }
    }
}

/// Shared handle to the keyspace. Cloning is shallow; all clones serialize
/// their operations through one mutex, which is what makes multi-step
/// commands (rename, snapshot) atomic with respect to each other.
#[derive(Clone)]
pub struct Store {
    state: Arc<Mutex<State>>,
}

impl Store {
    pub fn new() -> Store {
        Store {
            state: Arc::new(Mutex::new(State::default())),
        }
    }

    /// Acquire the keyspace. Callers must not hold the guard across I/O.
    pub fn lock(&self) -> MutexGuard<'_, State> {
        self.state.lock().unwrap()
    }
}

impl Default for Store {
    fn default() -> Self {
        Self::new()
    }
}

#[derive(Debug, Default)]
pub struct State {
    entries: HashMap<String, Value>,
    // Keys without a deadline never appear here; a key absent from `entries`
    // never does either.
    deadlines: HashMap<String, Instant>,
}

impl State {
    /// Drop the key now if its deadline has passed. Runs at the top of every
    /// keyed operation so expired keys are indistinguishable from absent ones.
    fn evict_if_expired(&mut self, key: &str) {
        if let Some(deadline) = self.deadlines.get(key) {
            if Instant::now() >= *deadline {
                self.entries.remove(key);
                self.deadlines.remove(key);
            }
        }
    }

    /// Sweep every expired key; used by whole-keyspace operations.
    fn purge_expired(&mut self) {
        let now = Instant::now();
        let expired: Vec<String> = self
            .deadlines
            .iter()
            .filter(|(_, deadline)| now >= **deadline)
            .map(|(key, _)| key.clone())
            .collect();

        for key in expired {
            self.entries.remove(&key);
            self.deadlines.remove(&key);
        }
    }

    fn remove_key(&mut self, key: &str) {
        self.entries.remove(key);
        self.deadlines.remove(key);
    }

    pub fn flush_all(&mut self) {
        self.entries.clear();
        self.deadlines.clear();
    }

    pub fn keys(&mut self) -> Vec<String> {
        self.purge_expired();
        self.entries.keys().cloned().collect()
    }

    pub fn key_type(&mut self, key: &str) -> &'static str {
        self.evict_if_expired(key);
        match self.entries.get(key) {
            Some(value) => value.type_name(),
            None => "none",
        }
    }

    pub fn del(&mut self, key: &str) -> bool {
        self.evict_if_expired(key);
        let existed = self.entries.remove(key).is_some();
        self.deadlines.remove(key);
        existed
    }

    pub fn expire(&mut self, key: &str, seconds: u64) -> bool {
        self.evict_if_expired(key);
        if !self.entries.contains_key(key) {
            return false;
        }
        self.deadlines
            .insert(key.to_string(), Instant::now() + Duration::from_secs(seconds));
        true
    }

    /// Move `old` to `new`, overwriting whatever `new` held. The deadline
    /// travels with the key; a stale deadline on `new` dies with its value.
    pub fn rename(&mut self, old: &str, new: &str) -> bool {
        self.evict_if_expired(old);
        self.evict_if_expired(new);

        let Some(value) = self.entries.remove(old) else {
            return false;
        };
        self.entries.insert(new.to_string(), value);

        match self.deadlines.remove(old) {
            Some(deadline) => {
                self.deadlines.insert(new.to_string(), deadline);
            }
            None => {
                self.deadlines.remove(new);
            }
        }
        true
    }

    pub fn set(&mut self, key: String, value: Bytes) {
        self.deadlines.remove(&key);
        self.entries.insert(key, Value::String(value));
    }

    pub fn get(&mut self, key: &str) -> Option<Bytes> {
        self.evict_if_expired(key);
        match self.entries.get(key) {
            Some(Value::String(value)) => Some(value.clone()),
            _ => None,
        }
    }

    pub fn llen(&mut self, key: &str) -> usize {
        self.evict_if_expired(key);
        match self.entries.get(key) {
            Some(Value::List(list)) => list.len(),
            _ => 0,
        }
    }

    pub fn lpush(&mut self, key: &str, values: Vec<Bytes>) -> usize {
        let list = self.upsert_list(key);
        for value in values {
            list.push_front(value);
        }
        list.len()
    }

    pub fn rpush(&mut self, key: &str, values: Vec<Bytes>) -> usize {
        let list = self.upsert_list(key);
        for value in values {
            list.push_back(value);
        }
        list.len()
    }

    pub fn lpop(&mut self, key: &str) -> Option<Bytes> {
        self.evict_if_expired(key);
        let Some(Value::List(list)) = self.entries.get_mut(key) else {
            return None;
        };
        let popped = list.pop_front();
        if list.is_empty() {
            self.remove_key(key);
        }
        popped
    }

    pub fn rpop(&mut self, key: &str) -> Option<Bytes> {
        self.evict_if_expired(key);
        let Some(Value::List(list)) = self.entries.get_mut(key) else {
            return None;
        };
        let popped = list.pop_back();
        if list.is_empty() {
            self.remove_key(key);
        }
        popped
    }

    /// Remove occurrences of `value`: the first `count` scanning from the
    /// head when `count > 0`, the last `|count|` scanning from the tail when
    /// `count < 0`, and all of them when `count == 0`.
    pub fn lrem(&mut self, key: &str, count: i64, value: &Bytes) -> usize {
        self.evict_if_expired(key);
        let Some(Value::List(list)) = self.entries.get_mut(key) else {
            return 0;
        };

        let mut removed = 0;
        if count == 0 {
            let before = list.len();
            list.retain(|element| element != value);
            removed = before - list.len();
        } else if count > 0 {
            let limit = count as usize;
            let mut index = 0;
            while index < list.len() && removed < limit {
                if list[index] == *value {
                    list.remove(index);
                    removed += 1;
                } else {
                    index += 1;
                }
            }
        } else {
            let limit = count.unsigned_abs() as usize;
            let mut index = list.len();
            while index > 0 && removed < limit {
                index -= 1;
                if list[index] == *value {
                    list.remove(index);
                    removed += 1;
                }
            }
        }

        if list.is_empty() {
            self.remove_key(key);
        }
        removed
    }

    pub fn lindex(&mut self, key: &str, index: i64) -> Option<Bytes> {
        self.evict_if_expired(key);
        let Some(Value::List(list)) = self.entries.get(key) else {
            return None;
        };
        normalize_index(index, list.len()).and_then(|index| list.get(index).cloned())
    }

    pub fn lset(&mut self, key: &str, index: i64, value: Bytes) -> bool {
        self.evict_if_expired(key);
        let Some(Value::List(list)) = self.entries.get_mut(key) else {
            return false;
        };
        let Some(index) = normalize_index(index, list.len()) else {
            return false;
        };
        list[index] = value;
        true
    }

    /// Returns true when the field was newly created, false when an existing
    /// field was overwritten.
    pub fn hset(&mut self, key: &str, field: String, value: Bytes) -> bool {
        self.upsert_hash(key).insert(field, value).is_none()
    }

    pub fn hget(&mut self, key: &str, field: &str) -> Option<Bytes> {
        self.evict_if_expired(key);
        match self.entries.get(key) {
            Some(Value::Hash(hash)) => hash.get(field).cloned(),
            _ => None,
        }
    }

    pub fn hexists(&mut self, key: &str, field: &str) -> bool {
        self.evict_if_expired(key);
        match self.entries.get(key) {
            Some(Value::Hash(hash)) => hash.contains_key(field),
            _ => false,
        }
    }

    pub fn hdel(&mut self, key: &str, field: &str) -> bool {
        self.evict_if_expired(key);
        let Some(Value::Hash(hash)) = self.entries.get_mut(key) else {
            return false;
        };
        let removed = hash.remove(field).is_some();
        if hash.is_empty() {
            self.remove_key(key);
        }
        removed
    }

    pub fn hgetall(&mut self, key: &str) -> Vec<(String, Bytes)> {
        self.evict_if_expired(key);
        match self.entries.get(key) {
            Some(Value::Hash(hash)) => hash
                .iter()
                .map(|(field, value)| (field.clone(), value.clone()))
                .collect(),
            _ => Vec::new(),
        }
    }

    pub fn hkeys(&mut self, key: &str) -> Vec<String> {
        self.evict_if_expired(key);
        match self.entries.get(key) {
            Some(Value::Hash(hash)) => hash.keys().cloned().collect(),
            _ => Vec::new(),
        }
    }

    pub fn hvals(&mut self, key: &str) -> Vec<Bytes> {
        self.evict_if_expired(key);
        match self.entries.get(key) {
            Some(Value::Hash(hash)) => hash.values().cloned().collect(),
            _ => Vec::new(),
        }
    }

    pub fn hlen(&mut self, key: &str) -> usize {
        self.evict_if_expired(key);
        match self.entries.get(key) {
            Some(Value::Hash(hash)) => hash.len(),
            _ => 0,
        }
    }

    /// Serialize the live keyspace to the snapshot encoding: one RESP array
    /// per key, tagged `K`, `L` or `H`. Reusing bulk strings keeps arbitrary
    /// bytes in keys, elements and fields intact, unlike a
    /// whitespace-separated text format. Deadlines are not captured.
    pub fn snapshot(&mut self) -> Vec<u8> {
        self.purge_expired();

        let mut out = Vec::new();
        for (key, value) in &self.entries {
            let mut record = Vec::new();
            match value {
                Value::String(data) => {
                    record.push(bulk("K"));
                    record.push(bulk(key));
                    record.push(Frame::Bulk(data.clone()));
                }
                Value::List(list) => {
                    record.push(bulk("L"));
                    record.push(bulk(key));
                    record.extend(list.iter().map(|element| Frame::Bulk(element.clone())));
                }
                Value::Hash(hash) => {
                    record.push(bulk("H"));
                    record.push(bulk(key));
                    for (field, data) in hash {
                        record.push(bulk(field));
                        record.push(Frame::Bulk(data.clone()));
                    }
                }
            }
            out.extend(Frame::Array(record).serialize());
        }
        out
    }

    /// Replace the whole keyspace with the records in `bytes`. Deadlines do
    /// not survive a restore. The new keyspace is decoded in full before
    /// anything is replaced, so a corrupt record never leaves a half-loaded
    /// state behind.
    pub fn restore(&mut self, bytes: &[u8]) -> crate::Result<()> {
        let mut entries = HashMap::new();

        let mut cursor = Cursor::new(bytes);
        while (cursor.position() as usize) < bytes.len() {
            let frame = Frame::parse(&mut cursor)
                .map_err(|err| format!("corrupt snapshot record: {}", err))?;
            let (key, value) = decode_record(frame)?;
            entries.insert(key, value);
        }

        self.entries = entries;
        self.deadlines.clear();
        Ok(())
    }

    fn upsert_list(&mut self, key: &str) -> &mut VecDeque<Bytes> {
        self.evict_if_expired(key);
        let slot = self
            .entries
            .entry(key.to_string())
            .or_insert_with(|| Value::List(VecDeque::new()));
        if !matches!(slot, Value::List(_)) {
            // A key bound to another variant counts as absent; replacing the
            // value re-creates the key, so a stale deadline dies here too.
            *slot = Value::List(VecDeque::new());
            self.deadlines.remove(key);
        }
        match slot {
            Value::List(list) => list,
            _ => unreachable!(),
        }
    }

    fn upsert_hash(&mut self, key: &str) -> &mut HashMap<String, Bytes> {
        self.evict_if_expired(key);
        let slot = self
            .entries
            .entry(key.to_string())
            .or_insert_with(|| Value::Hash(HashMap::new()));
        if !matches!(slot, Value::Hash(_)) {
            *slot = Value::Hash(HashMap::new());
            self.deadlines.remove(key);
        }
        match slot {
            Value::Hash(hash) => hash,
            _ => unreachable!(),
        }
    }
}

fn decode_record(frame: Frame) -> crate::Result<(String, Value)> {
    let Frame::Array(tokens) = frame else {
        return Err("snapshot record is not an array".into());
    };
    let mut tokens = tokens.into_iter();

    let (Some(Frame::Bulk(tag)), Some(Frame::Bulk(key))) = (tokens.next(), tokens.next()) else {
        return Err("snapshot record is missing its tag or key".into());
    };
    let key = String::from_utf8(key.to_vec()).map_err(|_| "snapshot record key is not UTF-8")?;

    let value = match &tag[..] {
        b"K" => {
            let Some(Frame::Bulk(value)) = tokens.next() else {
                return Err("string record is missing its value".into());
            };
            Value::String(value)
        }
        b"L" => {
            let mut list = VecDeque::new();
            for token in tokens {
                let Frame::Bulk(element) = token else {
                    return Err("list record holds a non-bulk element".into());
                };
                list.push_back(element);
            }
            if list.is_empty() {
                return Err("list record holds no elements".into());
            }
            Value::List(list)
        }
        b"H" => {
            let mut hash = HashMap::new();
            loop {
                let field = match tokens.next() {
                    Some(Frame::Bulk(field)) => field,
                    Some(_) => return Err("hash record holds a non-bulk field".into()),
                    None => break,
                };
                let Some(Frame::Bulk(value)) = tokens.next() else {
                    return Err("hash record holds an unpaired field".into());
                };
                let field = String::from_utf8(field.to_vec())
                    .map_err(|_| "hash record field is not UTF-8")?;
                hash.insert(field, value);
            }
            if hash.is_empty() {
                return Err("hash record holds no fields".into());
            }
            Value::Hash(hash)
        }
        _ => {
            return Err(format!(
                "unknown snapshot record tag {:?}",
                String::from_utf8_lossy(&tag)
            )
            .into())
        }
    };

    Ok((key, value))
}

fn normalize_index(index: i64, len: usize) -> Option<usize> {
    let index = if index < 0 { len as i64 + index } else { index };
    if index < 0 || index >= len as i64 {
        return None;
    }
    Some(index as usize)
}

fn bulk(text: &str) -> Frame {
    Frame::Bulk(Bytes::copy_from_slice(text.as_bytes()))
}
