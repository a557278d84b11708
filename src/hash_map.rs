use alloc::sync::Arc;
use core::fmt::Debug;

use crate::config::Config;
use crate::dict::Dict;
use crate::error::DictError;
use crate::error::Result;
use crate::hashing::KeyHasher;
use crate::iter::Iter;
use crate::iter::Keys;
use crate::iter::Values;
use crate::key::DictKey;
use crate::stats::StatsSnapshot;

/// A hash map built on [`Dict`] that hashes its own keys.
///
/// `HashMap<K, V>` computes each key's hash through [`DictKey::hash_key`]
/// with a shared [`KeyHasher`], then forwards to the dictionary. Maps built
/// from the same hasher agree on every hash.
///
/// # Examples
///
/// ```rust
/// use tabdict::Config;
/// use tabdict::HashMap;
///
/// let mut map = HashMap::with_config(&Config::default().seed(9)).unwrap();
/// map.insert("spam".to_string(), 1).unwrap();
/// assert_eq!(map.get(&"spam".to_string()).unwrap(), Some(1));
/// ```
pub struct HashMap<K, V> {
    dict: Dict<K, V>,
    hasher: Arc<KeyHasher>,
}

impl<K, V> Debug for HashMap<K, V>
where
    K: Clone + Debug,
    V: Clone + Debug,
{
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        Debug::fmt(&self.dict, f)
    }
}

impl<K: DictKey, V> HashMap<K, V> {
    /// Creates an empty map with a hasher seeded from the OS.
    ///
    /// # Examples
    ///
    /// ```rust
    /// use tabdict::HashMap;
    ///
    /// let map: HashMap<i64, &str> = HashMap::new().unwrap();
    /// assert!(map.is_empty());
    /// ```
    pub fn new() -> Result<Self> {
        Self::with_config(&Config::default())
    }

    /// Creates an empty map with its own hasher built from `config`.
    pub fn with_config(config: &Config) -> Result<Self> {
        let hasher = Arc::new(KeyHasher::new(config)?);
        Self::with_hasher(hasher, config)
    }

    /// Creates an empty map sharing an existing hasher.
    ///
    /// Only the table settings of `config` are used; hashing comes from
    /// `hasher`.
    ///
    /// # Examples
    ///
    /// ```rust
    /// use std::sync::Arc;
    ///
    /// use tabdict::Config;
    /// use tabdict::HashMap;
    /// use tabdict::KeyHasher;
    ///
    /// let config = Config::default().seed(3);
    /// let hasher = Arc::new(KeyHasher::new(&config).unwrap());
    /// let a: HashMap<String, i32> = HashMap::with_hasher(hasher.clone(), &config).unwrap();
    /// let b: HashMap<String, i32> = HashMap::with_hasher(hasher, &config).unwrap();
    /// assert!(Arc::ptr_eq(a.hasher(), b.hasher()));
    /// ```
    pub fn with_hasher(hasher: Arc<KeyHasher>, config: &Config) -> Result<Self> {
        Ok(Self {
            dict: Dict::with_config(config)?,
            hasher,
        })
    }

    /// Creates an empty map that holds `capacity` entries without growing.
    ///
    /// # Examples
    ///
    /// ```rust
    /// use tabdict::Config;
    /// use tabdict::HashMap;
    ///
    /// let map: HashMap<i64, i64> = HashMap::with_capacity_and_config(100, &Config::default()).unwrap();
    /// assert!(map.size() >= 150);
    /// ```
    pub fn with_capacity_and_config(capacity: usize, config: &Config) -> Result<Self> {
        let map = Self::with_config(config)?;
        map.dict.reserve(capacity)?;
        Ok(map)
    }

    /// The hashing context shared by this map.
    pub fn hasher(&self) -> &Arc<KeyHasher> {
        &self.hasher
    }

    /// The underlying dictionary.
    pub fn dict(&self) -> &Dict<K, V> {
        &self.dict
    }

    /// Hash `key` with this map's hasher.
    pub fn hash_of(&self, key: &K) -> Result<u64> {
        key.hash_key(&self.hasher).map_err(DictError::Unhashable)
    }

    /// Returns the number of entries in the map.
    pub fn len(&self) -> usize {
        self.dict.len()
    }

    /// Returns `true` if the map contains no entries.
    pub fn is_empty(&self) -> bool {
        self.dict.is_empty()
    }

    /// Number of slots in the underlying table.
    pub fn size(&self) -> usize {
        self.dict.size()
    }

    /// Inserts a key-value pair into the map.
    ///
    /// If the map did not have this key present, `None` is returned.
    /// If the map did have this key present, the value is updated, and the old
    /// value is returned.
    ///
    /// # Examples
    ///
    /// ```rust
    /// use tabdict::HashMap;
    ///
    /// let mut map = HashMap::new().unwrap();
    /// assert_eq!(map.insert(37i64, "a").unwrap(), None);
    /// assert_eq!(map.insert(37, "b").unwrap(), Some("a"));
    /// assert_eq!(map.get(&37).unwrap(), Some("b"));
    /// ```
    pub fn insert(&mut self, key: K, value: V) -> Result<Option<V>> {
        let hash = self.hash_of(&key)?;
        self.dict.set(key, hash, value)
    }

    /// Returns `true` if the map contains a value for the specified key.
    pub fn contains_key(&self, key: &K) -> Result<bool> {
        self.dict.contains(key, self.hash_of(key)?)
    }

    /// Removes a key from the map, returning the value at the key if the key
    /// was previously in the map.
    ///
    /// # Examples
    ///
    /// ```rust
    /// use tabdict::HashMap;
    ///
    /// let mut map = HashMap::new().unwrap();
    /// map.insert(1i64, "a").unwrap();
    /// assert_eq!(map.remove(&1).unwrap(), Some("a"));
    /// assert_eq!(map.remove(&1).unwrap(), None);
    /// ```
    pub fn remove(&mut self, key: &K) -> Result<Option<V>> {
        let hash = self.hash_of(key)?;
        self.dict.remove(key, hash)
    }

    /// Removes a key from the map, returning the stored key and value if the
    /// key was previously in the map.
    pub fn remove_entry(&mut self, key: &K) -> Result<Option<(K, V)>> {
        let hash = self.hash_of(key)?;
        match self.dict.remove_entry(key, hash) {
            Ok(pair) => Ok(Some(pair)),
            Err(DictError::KeyNotFound) => Ok(None),
            Err(e) => Err(e),
        }
    }

    /// Clears the map, removing all key-value pairs.
    pub fn clear(&mut self) {
        self.dict.clear();
    }

    /// Reserves room for at least `additional` more entries.
    pub fn reserve(&mut self, additional: usize) -> Result<()> {
        self.dict.reserve(additional)
    }

    /// Drops every tombstone without changing the table size.
    pub fn compact(&mut self) -> Result<()> {
        self.dict.compact()
    }

    /// Shrinks the table to the smallest size that fits the entries.
    ///
    /// # Examples
    ///
    /// ```rust
    /// use tabdict::Config;
    /// use tabdict::HashMap;
    ///
    /// let mut map = HashMap::with_capacity_and_config(100, &Config::default()).unwrap();
    /// map.insert(1i64, "one").unwrap();
    /// map.insert(2, "two").unwrap();
    /// map.shrink_to_fit().unwrap();
    /// assert_eq!(map.size(), 8);
    /// assert_eq!(map.len(), 2);
    /// ```
    pub fn shrink_to_fit(&mut self) -> Result<()> {
        self.dict.shrink_to_fit()
    }

    /// Lookup counters of the underlying dictionary.
    pub fn stats(&self) -> StatsSnapshot {
        self.dict.stats()
    }
}

impl<K: DictKey, V: Clone> HashMap<K, V> {
    /// Returns a clone of the value corresponding to the key.
    ///
    /// # Examples
    ///
    /// ```rust
    /// use tabdict::HashMap;
    ///
    /// let mut map = HashMap::new().unwrap();
    /// map.insert(1i64, "a").unwrap();
    /// assert_eq!(map.get(&1).unwrap(), Some("a"));
    /// assert_eq!(map.get(&2).unwrap(), None);
    /// ```
    pub fn get(&self, key: &K) -> Result<Option<V>> {
        self.dict.get(key, self.hash_of(key)?)
    }

    /// Like [`get`](HashMap::get), but an absent key is an error.
    pub fn get_required(&self, key: &K) -> Result<V> {
        self.dict.get_required(key, self.hash_of(key)?)
    }

    /// An iterator visiting all key-value pairs in slot order.
    pub fn iter(&self) -> Iter<'_, K, V> {
        self.dict.iter()
    }

    /// An iterator visiting all keys in slot order.
    pub fn keys(&self) -> Keys<'_, K, V> {
        self.dict.keys()
    }

    /// An iterator visiting all values in slot order.
    pub fn values(&self) -> Values<'_, K, V> {
        self.dict.values()
    }
}

impl<'a, K: DictKey, V: Clone> IntoIterator for &'a HashMap<K, V> {
    type Item = Result<(K, V)>;
    type IntoIter = Iter<'a, K, V>;

    fn into_iter(self) -> Self::IntoIter {
        self.iter()
    }
}

#[cfg(test)]
mod tests {
    use alloc::format;
    use alloc::string::String;
    use alloc::string::ToString;
    use alloc::vec::Vec;
    use core::fmt;

    use super::*;
    use crate::config::HashKind;
    use crate::config::ProbeKind;
    use crate::error::KeyError;
    use crate::key::Key;
    use crate::slot_table::LookupKind;

    fn seeded<K: DictKey, V>() -> HashMap<K, V> {
        HashMap::with_config(&Config::default().seed(0xabcd)).unwrap()
    }

    #[test]
    fn test_insert_and_get() {
        let mut map = seeded();
        assert_eq!(map.insert("one".to_string(), 1).unwrap(), None);
        assert_eq!(map.insert("two".to_string(), 2).unwrap(), None);
        assert_eq!(map.insert("one".to_string(), 11).unwrap(), Some(1));

        assert_eq!(map.get(&"one".to_string()).unwrap(), Some(11));
        assert_eq!(map.get(&"two".to_string()).unwrap(), Some(2));
        assert_eq!(map.get(&"three".to_string()).unwrap(), None);
        assert_eq!(map.len(), 2);
        assert_eq!(map.dict().lookup_kind(), LookupKind::Bytes);
    }

    #[test]
    fn test_contains_key() {
        let mut map = seeded();
        map.insert(1i64, "a").unwrap();
        assert!(map.contains_key(&1).unwrap());
        assert!(!map.contains_key(&2).unwrap());
    }

    #[test]
    fn test_remove() {
        let mut map = seeded();
        map.insert(1i64, "a").unwrap();
        map.insert(2, "b").unwrap();

        assert_eq!(map.remove(&1).unwrap(), Some("a"));
        assert_eq!(map.remove(&1).unwrap(), None);
        assert_eq!(map.remove_entry(&2).unwrap(), Some((2, "b")));
        assert_eq!(map.remove_entry(&2).unwrap(), None);
        assert!(map.is_empty());
        assert!(matches!(
            map.get_required(&2),
            Err(DictError::KeyNotFound)
        ));
    }

    #[test]
    fn test_clear() {
        let mut map = seeded();
        for i in 0..100i64 {
            map.insert(i, i).unwrap();
        }
        map.clear();
        assert!(map.is_empty());
        assert_eq!(map.size(), 8);
        assert_eq!(map.get(&5).unwrap(), None);
    }

    #[test]
    fn test_iterators() {
        let mut map = seeded();
        for i in 0..20i64 {
            map.insert(i, i * i).unwrap();
        }

        let mut pairs: Vec<(i64, i64)> = (&map).into_iter().map(|r| r.unwrap()).collect();
        pairs.sort();
        assert_eq!(pairs.len(), 20);
        assert_eq!(pairs[4], (4, 16));

        let mut keys: Vec<i64> = map.keys().map(|r| r.unwrap()).collect();
        keys.sort();
        assert_eq!(keys, (0..20).collect::<Vec<_>>());

        let total: i64 = map.values().map(|r| r.unwrap()).sum();
        assert_eq!(total, (0..20).map(|i| i * i).sum());
    }

    #[test]
    fn test_compact_and_shrink() {
        let mut map = seeded();
        for i in 0..1000i64 {
            map.insert(i, i).unwrap();
        }
        for i in 0..990 {
            map.remove(&i).unwrap();
        }
        let size = map.size();
        map.compact().unwrap();
        assert_eq!(map.size(), size);
        assert_eq!(map.dict().fill(), 10);

        map.shrink_to_fit().unwrap();
        assert_eq!(map.size(), 16);
        for i in 990..1000 {
            assert_eq!(map.get(&i).unwrap(), Some(i));
        }
    }

    #[test]
    fn test_string_keys_every_strategy() {
        for hash in [HashKind::Polynomial, HashKind::Tabulation] {
            for probe in [ProbeKind::Perturbation, ProbeKind::Linear] {
                let config = Config::default().hash(hash).probe(probe).seed(5);
                let mut map = HashMap::with_config(&config).unwrap();
                for i in 0..1000 {
                    map.insert(format!("6.{i}"), i).unwrap();
                }
                for i in 0..1000 {
                    assert_eq!(map.get(&format!("6.{i}")).unwrap(), Some(i));
                }
                assert_eq!(map.len(), 1000);
            }
        }
    }

    #[test]
    fn test_shared_hasher_agrees() {
        let config = Config::default().hash(HashKind::Tabulation).seed(1);
        let hasher = Arc::new(KeyHasher::new(&config).unwrap());
        let a: HashMap<String, i32> = HashMap::with_hasher(hasher.clone(), &config).unwrap();
        let b: HashMap<String, i32> = HashMap::with_hasher(hasher, &config).unwrap();
        let key = "6.851".to_string();
        assert_eq!(a.hash_of(&key).unwrap(), b.hash_of(&key).unwrap());
    }

    #[test]
    fn test_mixed_keys() {
        let mut map = seeded();
        map.insert(Key::from("x"), 1).unwrap();
        map.insert(Key::from(1), 2).unwrap();
        map.insert(Key::tuple([Key::from(1), Key::from("x")]), 3)
            .unwrap();
        assert_eq!(map.dict().lookup_kind(), LookupKind::General);
        assert_eq!(map.get(&Key::from("x")).unwrap(), Some(1));
        assert_eq!(map.get(&Key::from(1)).unwrap(), Some(2));
        assert_eq!(
            map.get(&Key::tuple([Key::from(1), Key::from("x")])).unwrap(),
            Some(3)
        );
    }

    #[derive(Debug)]
    struct NoHash;

    impl fmt::Display for NoHash {
        fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
            f.write_str("unhashable")
        }
    }

    impl core::error::Error for NoHash {}

    #[derive(Clone, Debug)]
    struct Unhashable;

    impl DictKey for Unhashable {
        fn key_eq(&self, _other: &Self) -> core::result::Result<bool, KeyError> {
            Ok(true)
        }

        fn hash_key(&self, _hasher: &KeyHasher) -> core::result::Result<u64, KeyError> {
            Err(KeyError::new(NoHash))
        }
    }

    #[test]
    fn test_unhashable_key() {
        let mut map: HashMap<Unhashable, i32> = seeded();
        let err = map.insert(Unhashable, 1).unwrap_err();
        assert!(matches!(err, DictError::Unhashable(_)));
        assert_eq!(err.to_string(), "key is not hashable: unhashable");
        assert!(map.is_empty());
    }

    #[test]
    fn test_debug() {
        let mut map = seeded();
        map.insert(3i64, "c").unwrap();
        assert_eq!(format!("{map:?}"), "{3: \"c\"}");
    }
}
