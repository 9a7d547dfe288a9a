//! Arrays serialize as plain sequences.

use std::fmt;
use std::marker::PhantomData;

use serde::de::{SeqAccess, Visitor};
use serde::{Deserialize, Deserializer, Serialize, Serializer};

use crate::Array;

// Cap on pre-allocation from an untrusted length hint.
const MAX_PREALLOCATE: usize = 4096;

impl<T: Serialize> Serialize for Array<T> {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_seq(self.iter())
    }
}

impl<'de, T: Deserialize<'de>> Deserialize<'de> for Array<T> {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        deserializer.deserialize_seq(ArrayVisitor(PhantomData))
    }
}

struct ArrayVisitor<T>(PhantomData<T>);

impl<'de, T: Deserialize<'de>> Visitor<'de> for ArrayVisitor<T> {
    type Value = Array<T>;

    fn expecting(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("a sequence")
    }

    fn visit_seq<A: SeqAccess<'de>>(self, mut seq: A) -> Result<Array<T>, A::Error> {
        let hint = seq.size_hint().unwrap_or(0).min(MAX_PREALLOCATE);
        let mut items = Array::with_capacity(hint);
        while let Some(item) = seq.next_element()? {
            items.add(item);
        }
        Ok(items)
    }
}

#[cfg(test)]
mod tests {
    use crate::Array;

    #[test]
    fn serializes_as_json_list() {
        let extensions = crate::array!["VK_KHR_surface".to_owned(), "VK_KHR_swapchain".to_owned()];
        let json = serde_json::to_string(&extensions).unwrap();
        assert_eq!(json, r#"["VK_KHR_surface","VK_KHR_swapchain"]"#);

        let back: Array<String> = serde_json::from_str(&json).unwrap();
        assert_eq!(back, extensions);
    }

    #[test]
    fn rejects_non_sequences() {
        assert!(serde_json::from_str::<Array<u32>>(r#"{"a": 1}"#).is_err());
    }
}
