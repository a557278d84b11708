//! Keys the dictionary can store.
//!
//! The table itself only ever asks a key three things: its exact bytes (to
//! decide whether the string fast path applies), whether it is the very same
//! object as another key, and whether it compares equal to another key.
//! Hashing goes through [`DictKey::hash_key`] with an explicit
//! [`KeyHasher`].

use alloc::rc::Rc;
use alloc::string::String;
use alloc::vec::Vec;

use crate::error::KeyError;
use crate::hashing::KeyHasher;

/// A key storable in a [`Dict`](crate::Dict).
///
/// Cloning a key is expected to be cheap (a handle copy); the general lookup
/// clones the stored key before comparing so that the comparison runs without
/// any borrow of the table held.
pub trait DictKey: Clone {
    /// The key's bytes if it is an exact immutable byte string.
    ///
    /// Keys returning `Some` are compared by raw bytes on the fast path and
    /// their [`key_eq`](DictKey::key_eq) is never called there. A key whose
    /// equality is richer than byte equality must return `None`.
    fn exact_bytes(&self) -> Option<&[u8]> {
        None
    }

    /// Identity check run before [`key_eq`](DictKey::key_eq).
    fn is_same(&self, _other: &Self) -> bool {
        false
    }

    /// Full equality. May fail, and may call back into the dictionary.
    fn key_eq(&self, other: &Self) -> Result<bool, KeyError>;

    /// Hash of the key under `hasher`.
    fn hash_key(&self, hasher: &KeyHasher) -> Result<u64, KeyError>;
}

macro_rules! byte_string_key {
    ($ty:ty, $this:ident => $bytes:expr, $same:expr) => {
        impl DictKey for $ty {
            #[inline]
            fn exact_bytes(&self) -> Option<&[u8]> {
                let $this = self;
                Some($bytes)
            }

            #[inline]
            fn is_same(&self, other: &Self) -> bool {
                $same(self, other)
            }

            #[inline]
            fn key_eq(&self, other: &Self) -> Result<bool, KeyError> {
                Ok(self.exact_bytes() == other.exact_bytes())
            }

            #[inline]
            fn hash_key(&self, hasher: &KeyHasher) -> Result<u64, KeyError> {
                let $this = self;
                Ok(hasher.hash_bytes($bytes))
            }
        }
    };
}

byte_string_key!(String, s => s.as_bytes(), |_: &String, _: &String| false);
byte_string_key!(Vec<u8>, v => v.as_slice(), |_: &Vec<u8>, _: &Vec<u8>| false);
byte_string_key!(&'static str, s => s.as_bytes(), |a: &&'static str, b: &&'static str| {
    core::ptr::eq(*a, *b)
});
byte_string_key!(Rc<str>, s => s.as_bytes(), Rc::ptr_eq);
byte_string_key!(Rc<[u8]>, s => &s[..], Rc::ptr_eq);

impl DictKey for i64 {
    #[inline]
    fn key_eq(&self, other: &Self) -> Result<bool, KeyError> {
        Ok(self == other)
    }

    #[inline]
    fn hash_key(&self, hasher: &KeyHasher) -> Result<u64, KeyError> {
        Ok(hasher.hash_int(*self))
    }
}

impl DictKey for u64 {
    #[inline]
    fn key_eq(&self, other: &Self) -> Result<bool, KeyError> {
        Ok(self == other)
    }

    #[inline]
    fn hash_key(&self, hasher: &KeyHasher) -> Result<u64, KeyError> {
        Ok(hasher.hash_int(*self as i64))
    }
}

/// A small dynamic key: byte strings, integers, and tuples of keys.
///
/// # Examples
///
/// ```rust
/// use tabdict::DictKey;
/// use tabdict::Key;
///
/// let a = Key::from("spam");
/// let b = Key::tuple([Key::from(1), Key::from("spam")]);
/// assert!(a.exact_bytes().is_some());
/// assert!(b.exact_bytes().is_none());
/// assert!(a.key_eq(&Key::from("spam")).unwrap());
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum Key {
    /// Immutable byte string.
    Bytes(Rc<[u8]>),
    /// Machine integer.
    Int(i64),
    /// Fixed sequence of keys.
    Tuple(Rc<[Key]>),
}

impl Key {
    /// Build a tuple key.
    pub fn tuple(items: impl IntoIterator<Item = Key>) -> Self {
        Key::Tuple(items.into_iter().collect::<Vec<_>>().into())
    }
}

impl From<&str> for Key {
    fn from(value: &str) -> Self {
        Key::Bytes(Rc::from(value.as_bytes()))
    }
}

impl From<&[u8]> for Key {
    fn from(value: &[u8]) -> Self {
        Key::Bytes(Rc::from(value))
    }
}

impl From<i64> for Key {
    fn from(value: i64) -> Self {
        Key::Int(value)
    }
}

impl DictKey for Key {
    #[inline]
    fn exact_bytes(&self) -> Option<&[u8]> {
        match self {
            Key::Bytes(bytes) => Some(bytes),
            _ => None,
        }
    }

    fn is_same(&self, other: &Self) -> bool {
        match (self, other) {
            (Key::Bytes(a), Key::Bytes(b)) => Rc::ptr_eq(a, b),
            (Key::Tuple(a), Key::Tuple(b)) => Rc::ptr_eq(a, b),
            _ => false,
        }
    }

    fn key_eq(&self, other: &Self) -> Result<bool, KeyError> {
        match (self, other) {
            (Key::Bytes(a), Key::Bytes(b)) => Ok(a == b),
            (Key::Int(a), Key::Int(b)) => Ok(a == b),
            (Key::Tuple(a), Key::Tuple(b)) => {
                if a.len() != b.len() {
                    return Ok(false);
                }
                for (x, y) in a.iter().zip(b.iter()) {
                    if !x.is_same(y) && !x.key_eq(y)? {
                        return Ok(false);
                    }
                }
                Ok(true)
            }
            _ => Ok(false),
        }
    }

    fn hash_key(&self, hasher: &KeyHasher) -> Result<u64, KeyError> {
        match self {
            Key::Bytes(bytes) => Ok(hasher.hash_bytes(bytes)),
            Key::Int(value) => Ok(hasher.hash_int(*value)),
            Key::Tuple(items) => {
                let mut hashes = Vec::with_capacity(items.len());
                for item in items.iter() {
                    hashes.push(item.hash_key(hasher)?);
                }
                Ok(hasher.hash_object(&hashes[..]))
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use alloc::string::ToString;

    use super::*;
    use crate::config::Config;

    fn hasher() -> KeyHasher {
        KeyHasher::new(&Config::default().seed(17)).unwrap()
    }

    #[test]
    fn byte_strings_take_fast_path() {
        assert_eq!("abc".to_string().exact_bytes(), Some(&b"abc"[..]));
        assert_eq!(b"abc".to_vec().exact_bytes(), Some(&b"abc"[..]));
        assert_eq!(Rc::<str>::from("abc").exact_bytes(), Some(&b"abc"[..]));
        assert_eq!(Key::from("abc").exact_bytes(), Some(&b"abc"[..]));
        assert_eq!(5i64.exact_bytes(), None);
        assert_eq!(Key::from(5).exact_bytes(), None);
    }

    #[test]
    fn equal_bytes_hash_equally_across_types() {
        let h = hasher();
        let expected = h.hash_bytes(b"spam");
        assert_eq!("spam".to_string().hash_key(&h).unwrap(), expected);
        assert_eq!(b"spam".to_vec().hash_key(&h).unwrap(), expected);
        assert_eq!("spam".hash_key(&h).unwrap(), expected);
        assert_eq!(Key::from("spam").hash_key(&h).unwrap(), expected);
    }

    #[test]
    fn rc_identity() {
        let a: Rc<str> = Rc::from("x");
        let b = a.clone();
        let c: Rc<str> = Rc::from("x");
        assert!(a.is_same(&b));
        assert!(!a.is_same(&c));
        assert!(a.key_eq(&c).unwrap());
    }

    #[test]
    fn tuple_equality_and_hash() {
        let h = hasher();
        let a = Key::tuple([Key::from(1), Key::from("a")]);
        let b = Key::tuple([Key::from(1), Key::from("a")]);
        let c = Key::tuple([Key::from("a"), Key::from(1)]);
        assert!(a.key_eq(&b).unwrap());
        assert!(!a.key_eq(&c).unwrap());
        assert_eq!(a.hash_key(&h).unwrap(), b.hash_key(&h).unwrap());
        assert_ne!(a.hash_key(&h).unwrap(), c.hash_key(&h).unwrap());
        assert!(!Key::from(1).key_eq(&Key::from("1")).unwrap());
    }

    #[test]
    fn ints_hash_to_themselves() {
        let h = hasher();
        assert_eq!(Key::from(12).hash_key(&h).unwrap(), 12);
        assert_eq!(12u64.hash_key(&h).unwrap(), 12);
        assert_eq!(12i64.hash_key(&h).unwrap(), 12);
    }
}
