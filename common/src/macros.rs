/// Declares a string identifier newtype backed by `Arc<str>`.
///
/// Clones are cheap, ordering is lexicographic on the underlying bytes and the
/// value serializes as a plain string.
#[macro_export]
macro_rules! str_id_type {
    ($name:ident) => {
        #[derive(
            Clone,
            PartialEq,
            Eq,
            Ord,
            PartialOrd,
            Debug,
            Hash,
            ::serde::Serialize,
            ::serde::Deserialize,
        )]
        #[serde(transparent)]
        #[repr(transparent)]
        pub struct $name(std::sync::Arc<str>);

        impl $name {
            pub fn new(id: &str) -> $name {
                $name(std::sync::Arc::from(id))
            }
            pub fn as_str(&self) -> &str {
                &self.0
            }
            pub fn is_empty(&self) -> bool {
                self.0.is_empty()
            }
        }

        impl From<&str> for $name {
            fn from(id: &str) -> $name {
                $name::new(id)
            }
        }

        impl From<String> for $name {
            fn from(id: String) -> $name {
                $name(std::sync::Arc::from(id))
            }
        }

        impl AsRef<str> for $name {
            fn as_ref(&self) -> &str {
                &self.0
            }
        }

        impl std::borrow::Borrow<str> for $name {
            fn borrow(&self) -> &str {
                &self.0
            }
        }

        impl std::fmt::Display for $name {
            fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
                f.write_str(&self.0)
            }
        }
    };
}

#[cfg(test)]
mod tests {
    str_id_type!(TestId);

    #[test]
    fn ids_order_lexicographically() {
        let mut ids = vec![TestId::from("b10"), TestId::from("a"), TestId::from("b2")];
        ids.sort();
        let ids: Vec<&str> = ids.iter().map(TestId::as_str).collect();
        assert_eq!(ids, vec!["a", "b10", "b2"]);
    }

    #[test]
    fn clones_share_storage() {
        let id = TestId::from(String::from("S1"));
        let clone = id.clone();
        assert!(std::sync::Arc::ptr_eq(&id.0, &clone.0));
        assert_eq!(clone.to_string(), "S1");
    }

    #[test]
    fn borrow_as_str_for_lookups() {
        let mut map = std::collections::HashMap::new();
        map.insert(TestId::from("S1"), 5);
        assert_eq!(map.get("S1"), Some(&5));
    }
}
