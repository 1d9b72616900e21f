//! Newtype IDs for type-safe entity references.
//!
//! Use the `define_id!` macro to create type-safe ID wrappers that prevent
//! accidentally mixing IDs from different entity types.
//!
//! Every ID wraps a UUID and rejects the nil UUID. The nil UUID is reserved
//! as the "no variant" slot of [`WishlistKey`](crate::WishlistKey), so a real
//! identifier can never collide with it.

/// Errors that can occur when parsing an ID.
#[derive(thiserror::Error, Debug, Clone, PartialEq, Eq)]
pub enum IdError {
    /// The input is the nil UUID.
    #[error("identifier cannot be the nil UUID")]
    Nil,
    /// The input is not a UUID.
    #[error("invalid identifier: {0}")]
    Malformed(String),
}

/// Macro to define a type-safe ID wrapper.
///
/// Creates a newtype wrapper around `Uuid` with:
/// - `Serialize`/`Deserialize` as a plain UUID string (nil rejected on input)
/// - `Debug`, `Clone`, `Copy`, `PartialEq`, `Eq`, `Hash`, `PartialOrd`, `Ord`
/// - Constructors: `generate()`, `from_uuid()`, `parse()`
/// - `TryFrom<Uuid>`, `FromStr`, and `Into<Uuid>` implementations
/// - `sqlx` `Type`, `Encode`, and `Decode` implementations (with `postgres` feature)
///
/// # Example
///
/// ```rust
/// # use niaga_customer_core::define_id;
/// define_id!(CartId);
/// define_id!(OrderId);
///
/// let cart_id = CartId::generate();
/// let order_id = OrderId::generate();
///
/// // These are different types, so this won't compile:
/// // let _: CartId = order_id;
/// ```
#[macro_export]
macro_rules! define_id {
    ($name:ident) => {
        #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
        pub struct $name(::uuid::Uuid);

        impl $name {
            /// Generate a new random (v4) ID.
            #[must_use]
            pub fn generate() -> Self {
                Self(::uuid::Uuid::new_v4())
            }

            /// Wrap an existing UUID.
            ///
            /// # Errors
            ///
            /// Returns `IdError::Nil` for the nil UUID.
            pub fn from_uuid(id: ::uuid::Uuid) -> ::core::result::Result<Self, $crate::IdError> {
                if id.is_nil() {
                    return Err($crate::IdError::Nil);
                }
                Ok(Self(id))
            }

            /// Parse an ID from its hyphenated string form.
            ///
            /// # Errors
            ///
            /// Returns `IdError::Malformed` if the input is not a UUID and
            /// `IdError::Nil` for the nil UUID.
            pub fn parse(s: &str) -> ::core::result::Result<Self, $crate::IdError> {
                let id = ::uuid::Uuid::parse_str(s.trim())
                    .map_err(|e| $crate::IdError::Malformed(e.to_string()))?;
                Self::from_uuid(id)
            }

            /// Get the underlying UUID.
            #[must_use]
            pub const fn as_uuid(&self) -> ::uuid::Uuid {
                self.0
            }
        }

        impl ::core::fmt::Display for $name {
            fn fmt(&self, f: &mut ::core::fmt::Formatter<'_>) -> ::core::fmt::Result {
                write!(f, "{}", self.0)
            }
        }

        impl ::core::str::FromStr for $name {
            type Err = $crate::IdError;

            fn from_str(s: &str) -> ::core::result::Result<Self, Self::Err> {
                Self::parse(s)
            }
        }

        impl TryFrom<::uuid::Uuid> for $name {
            type Error = $crate::IdError;

            fn try_from(id: ::uuid::Uuid) -> ::core::result::Result<Self, Self::Error> {
                Self::from_uuid(id)
            }
        }

        impl From<$name> for ::uuid::Uuid {
            fn from(id: $name) -> Self {
                id.0
            }
        }

        impl ::serde::Serialize for $name {
            fn serialize<S: ::serde::Serializer>(
                &self,
                serializer: S,
            ) -> ::core::result::Result<S::Ok, S::Error> {
                ::serde::Serialize::serialize(&self.0, serializer)
            }
        }

        impl<'de> ::serde::Deserialize<'de> for $name {
            fn deserialize<D: ::serde::Deserializer<'de>>(
                deserializer: D,
            ) -> ::core::result::Result<Self, D::Error> {
                let id = <::uuid::Uuid as ::serde::Deserialize>::deserialize(deserializer)?;
                Self::from_uuid(id).map_err(::serde::de::Error::custom)
            }
        }

        #[cfg(feature = "postgres")]
        impl ::sqlx::Type<::sqlx::Postgres> for $name {
            fn type_info() -> ::sqlx::postgres::PgTypeInfo {
                <::uuid::Uuid as ::sqlx::Type<::sqlx::Postgres>>::type_info()
            }

            fn compatible(ty: &::sqlx::postgres::PgTypeInfo) -> bool {
                <::uuid::Uuid as ::sqlx::Type<::sqlx::Postgres>>::compatible(ty)
            }
        }

        #[cfg(feature = "postgres")]
        impl<'r> ::sqlx::Decode<'r, ::sqlx::Postgres> for $name {
            fn decode(
                value: ::sqlx::postgres::PgValueRef<'r>,
            ) -> ::core::result::Result<Self, ::sqlx::error::BoxDynError> {
                let id = <::uuid::Uuid as ::sqlx::Decode<::sqlx::Postgres>>::decode(value)?;
                Ok(Self::from_uuid(id)?)
            }
        }

        #[cfg(feature = "postgres")]
        impl ::sqlx::Encode<'_, ::sqlx::Postgres> for $name {
            fn encode_by_ref(
                &self,
                buf: &mut ::sqlx::postgres::PgArgumentBuffer,
            ) -> ::std::result::Result<::sqlx::encode::IsNull, ::sqlx::error::BoxDynError> {
                <::uuid::Uuid as ::sqlx::Encode<::sqlx::Postgres>>::encode_by_ref(&self.0, buf)
            }
        }
    };
}

// Customer-owned entities
define_id!(CustomerId);
define_id!(AddressId);
define_id!(MeasurementId);
define_id!(WishlistItemId);
define_id!(SubscriptionId);

// Catalog references (owned by the product service)
define_id!(ProductId);
define_id!(VariantId);

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    const SAMPLE: &str = "6f1c2a3e-0b4d-4a8e-9f10-2b3c4d5e6f70";

    #[test]
    fn test_parse_valid() {
        let id = ProductId::parse(SAMPLE).unwrap();
        assert_eq!(id.to_string(), SAMPLE);
    }

    #[test]
    fn test_parse_trims_whitespace() {
        assert!(ProductId::parse(&format!("  {SAMPLE}\n")).is_ok());
    }

    #[test]
    fn test_parse_rejects_nil() {
        assert_eq!(
            VariantId::parse("00000000-0000-0000-0000-000000000000"),
            Err(IdError::Nil)
        );
    }

    #[test]
    fn test_parse_rejects_garbage() {
        assert!(matches!(
            CustomerId::parse("not-a-uuid"),
            Err(IdError::Malformed(_))
        ));
        assert!(matches!(CustomerId::parse(""), Err(IdError::Malformed(_))));
    }

    #[test]
    fn test_generate_is_unique_and_not_nil() {
        let a = AddressId::generate();
        let b = AddressId::generate();
        assert_ne!(a, b);
        assert!(!a.as_uuid().is_nil());
    }

    #[test]
    fn test_serde_is_plain_uuid_string() {
        let id = SubscriptionId::parse(SAMPLE).unwrap();
        let json = serde_json::to_string(&id).unwrap();
        assert_eq!(json, format!("\"{SAMPLE}\""));

        let parsed: SubscriptionId = serde_json::from_str(&json).unwrap();
        assert_eq!(parsed, id);
    }

    #[test]
    fn test_deserialize_rejects_nil() {
        let result: Result<VariantId, _> =
            serde_json::from_str("\"00000000-0000-0000-0000-000000000000\"");
        assert!(result.is_err());
    }
}
