//! Newtype UUIDs for type-safe entity references.
//!
//! atVenu identifies every node by a prefixed UUID string
//! (e.g. `show_32d732ba-3ad3-44bf-bba6-eb0c15e77bc5`). Use the `define_uuid!`
//! macro to create wrappers that prevent accidentally passing a tour UUID
//! where a show UUID is expected.

/// Macro to define a type-safe UUID wrapper.
///
/// Creates a newtype wrapper around `String` with:
/// - `Serialize`/`Deserialize` with `#[serde(transparent)]`
/// - `Debug`, `Clone`, `PartialEq`, `Eq`, `Hash`, `PartialOrd`, `Ord`
/// - Conversion methods: `new()`, `as_str()`, `into_inner()`
/// - `From<String>`, `From<&str>` and `Display` implementations
///
/// # Example
///
/// ```rust
/// # use atvenu_export_core::define_uuid;
/// define_uuid!(VenueUuid);
/// define_uuid!(StandUuid);
///
/// let venue = VenueUuid::new("venue_1");
/// let stand = StandUuid::new("venue_1");
///
/// assert_eq!(venue.as_str(), stand.as_str());
/// // These are different types, so this won't compile:
/// // let _: VenueUuid = stand;
/// ```
#[macro_export]
macro_rules! define_uuid {
    ($name:ident) => {
        #[derive(
            Debug,
            Clone,
            PartialEq,
            Eq,
            Hash,
            PartialOrd,
            Ord,
            ::serde::Serialize,
            ::serde::Deserialize
        )]
        #[serde(transparent)]
        pub struct $name(String);

        impl $name {
            /// Create a new UUID wrapper.
            #[must_use]
            pub fn new(uuid: impl Into<String>) -> Self {
                Self(uuid.into())
            }

            /// Get the UUID as a string slice.
            #[must_use]
            pub fn as_str(&self) -> &str {
                &self.0
            }

            /// Convert into the inner string.
            #[must_use]
            pub fn into_inner(self) -> String {
                self.0
            }
        }

        impl ::core::fmt::Display for $name {
            fn fmt(&self, f: &mut ::core::fmt::Formatter<'_>) -> ::core::fmt::Result {
                f.write_str(&self.0)
            }
        }

        impl From<String> for $name {
            fn from(uuid: String) -> Self {
                Self(uuid)
            }
        }

        impl From<&str> for $name {
            fn from(uuid: &str) -> Self {
                Self(uuid.to_owned())
            }
        }

        impl From<$name> for String {
            fn from(uuid: $name) -> Self {
                uuid.0
            }
        }
    };
}

define_uuid!(AccountUuid);
define_uuid!(TourUuid);
define_uuid!(ShowUuid);
define_uuid!(MerchItemUuid);
define_uuid!(MerchVariantUuid);
