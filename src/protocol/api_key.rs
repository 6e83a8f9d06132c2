//! ApiKey tags the body of a request (and, implicitly, its response).
//!
//! Only the two APIs this producer speaks are named; anything else observed on the wire
//! is preserved as [`ApiKey::Unknown`] rather than rejected outright.

#[derive(Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Clone, Copy)]
#[cfg_attr(test, derive(proptest_derive::Arbitrary))]
pub enum ApiKey {
    Produce,
    Metadata,
    Unknown(i16),
}

impl From<i16> for ApiKey {
    fn from(key: i16) -> Self {
        match key {
            0 => Self::Produce,
            3 => Self::Metadata,
            _ => Self::Unknown(key),
        }
    }
}

impl From<ApiKey> for i16 {
    fn from(key: ApiKey) -> Self {
        match key {
            ApiKey::Produce => 0,
            ApiKey::Metadata => 3,
            ApiKey::Unknown(code) => code,
        }
    }
}
