/// Declares a transparent newtype around a primitive id.
///
/// The generated type derives the usual value traits, serializes as its
/// inner value, derefs to it and converts to and from it.
#[macro_export]
macro_rules! strong_type {
    ($name:ident, $inner:ty) => {
        #[derive(
            Clone,
            Copy,
            PartialEq,
            Eq,
            Hash,
            PartialOrd,
            Ord,
            Default,
            serde::Serialize,
            serde::Deserialize,
        )]
        #[serde(transparent)]
        #[repr(transparent)]
        pub struct $name(pub $inner);

        impl ::std::ops::Deref for $name {
            type Target = $inner;

            #[inline]
            fn deref(&self) -> &Self::Target {
                &self.0
            }
        }

        impl ::std::fmt::Debug for $name {
            fn fmt(&self, f: &mut ::std::fmt::Formatter<'_>) -> ::std::fmt::Result {
                write!(f, "{}({})", stringify!($name), self.0)
            }
        }

        impl ::std::fmt::Display for $name {
            fn fmt(&self, f: &mut ::std::fmt::Formatter<'_>) -> ::std::fmt::Result {
                ::std::fmt::Display::fmt(&self.0, f)
            }
        }

        impl From<$inner> for $name {
            #[inline]
            fn from(val: $inner) -> Self {
                Self(val)
            }
        }

        impl From<$name> for $inner {
            #[inline]
            fn from(val: $name) -> Self {
                val.0
            }
        }
    };
}

#[cfg(test)]
mod tests {
    use std::collections::HashSet;

    strong_type!(SampleId, u32);

    #[test]
    fn test_deref_and_conversions() {
        let id: SampleId = 9u32.into();
        assert_eq!(*id, 9);
        let raw: u32 = id.into();
        assert_eq!(raw, 9);
    }

    #[test]
    fn test_display_debug() {
        assert_eq!(SampleId(7).to_string(), "7");
        assert_eq!(format!("{:?}", SampleId(7)), "SampleId(7)");
    }

    #[test]
    fn test_hash_dedup() {
        let set: HashSet<_> = [SampleId(1), SampleId(2), SampleId(1)].into_iter().collect();
        assert_eq!(set.len(), 2);
    }

    #[test]
    fn test_serde_transparent() {
        assert_eq!(serde_json::to_string(&SampleId(42)).unwrap(), "42");
        let back: SampleId = serde_json::from_str("42").unwrap();
        assert_eq!(back, SampleId(42));
    }
}
