use crate::error::ReconcileError;
use chrono::{DateTime, NaiveDateTime, Utc};
use rand::Rng;
use serde::{Deserialize, Serialize, Serializer};
use std::fmt;
use std::str::FromStr;

const TIMESTAMP_FORMAT: &str = "%Y%m%d%H%M%S";
const TIMESTAMP_LEN: usize = 14;
const SUFFIX_LEN: usize = 4;
const SUFFIX_ALPHABET: &[u8] = b"ABCDEFGHIJKLMNOPQRSTUVWXYZ0123456789";

/// The social-protection product a payment is made for.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum TransactionKind {
    Cnps,
    Cmu,
}

impl TransactionKind {
    pub const ALL: [TransactionKind; 2] = [TransactionKind::Cnps, TransactionKind::Cmu];

    pub fn as_str(&self) -> &'static str {
        match self {
            TransactionKind::Cnps => "CNPS",
            TransactionKind::Cmu => "CMU",
        }
    }

    /// Returns the kind whose `{KIND}-` prefix starts `id`, if any.
    ///
    /// Only the prefix is inspected. Callback routing relies on this being
    /// lenient: a well-prefixed ID with a malformed tail is still treated as
    /// belonging to a known namespace.
    pub fn from_id_prefix(id: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|kind| {
            id.strip_prefix(kind.as_str())
                .is_some_and(|rest| rest.starts_with('-'))
        })
    }
}

impl fmt::Display for TransactionKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for TransactionKind {
    type Err = ReconcileError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::ALL
            .into_iter()
            .find(|kind| kind.as_str().eq_ignore_ascii_case(s.trim()))
            .ok_or_else(|| ReconcileError::ValidationError(format!("Unknown transaction kind `{s}`")))
    }
}

/// Client-side transaction identifier: `{KIND}-{YYYYMMDDHHMMSS}-{XXXX}`.
///
/// The kind is fixed by the prefix, so it is kept alongside the raw string.
/// Ordering follows the raw string.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ClientTransactionId {
    raw: String,
    kind: TransactionKind,
}

impl ClientTransactionId {
    /// Builds a fresh identifier for `kind` stamped with `now`.
    pub fn generate<R: Rng + ?Sized>(kind: TransactionKind, now: DateTime<Utc>, rng: &mut R) -> Self {
        let suffix: String = (0..SUFFIX_LEN)
            .map(|_| SUFFIX_ALPHABET[rng.gen_range(0..SUFFIX_ALPHABET.len())] as char)
            .collect();
        Self {
            raw: format!("{}-{}-{}", kind, now.format(TIMESTAMP_FORMAT), suffix),
            kind,
        }
    }

    /// Strictly validates the full identifier format.
    pub fn parse(raw: &str) -> Result<Self, ReconcileError> {
        let invalid = |reason: &str| {
            ReconcileError::ValidationError(format!("Invalid transaction id `{raw}`: {reason}"))
        };

        let kind = TransactionKind::from_id_prefix(raw).ok_or_else(|| invalid("unknown prefix"))?;
        let rest = &raw[kind.as_str().len() + 1..];
        let (timestamp, suffix) = rest
            .split_once('-')
            .ok_or_else(|| invalid("missing suffix"))?;

        if timestamp.len() != TIMESTAMP_LEN || !timestamp.bytes().all(|b| b.is_ascii_digit()) {
            return Err(invalid("timestamp must be 14 digits"));
        }
        NaiveDateTime::parse_from_str(timestamp, TIMESTAMP_FORMAT)
            .map_err(|_| invalid("timestamp is not a valid date"))?;

        if suffix.len() != SUFFIX_LEN || !suffix.bytes().all(|b| b.is_ascii_alphanumeric()) {
            return Err(invalid("suffix must be 4 alphanumeric characters"));
        }

        Ok(Self {
            raw: raw.to_string(),
            kind,
        })
    }

    pub fn kind(&self) -> TransactionKind {
        self.kind
    }

    pub fn as_str(&self) -> &str {
        &self.raw
    }
}

impl fmt::Display for ClientTransactionId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.raw)
    }
}

impl FromStr for ClientTransactionId {
    type Err = ReconcileError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse(s)
    }
}

impl Serialize for ClientTransactionId {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&self.raw)
    }
}

impl<'de> Deserialize<'de> for ClientTransactionId {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: serde::Deserializer<'de>,
    {
        let raw = String::deserialize(deserializer)?;
        Self::parse(&raw).map_err(serde::de::Error::custom)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;
    use rand::SeedableRng;
    use rand::rngs::StdRng;

    #[test]
    fn test_generate_matches_format() {
        let now = Utc.with_ymd_and_hms(2024, 3, 9, 14, 5, 7).unwrap();
        let mut rng = StdRng::seed_from_u64(7);
        let id = ClientTransactionId::generate(TransactionKind::Cnps, now, &mut rng);

        assert!(id.as_str().starts_with("CNPS-20240309140507-"));
        assert_eq!(id.as_str().len(), "CNPS-20240309140507-XXXX".len());
        assert!(ClientTransactionId::parse(id.as_str()).is_ok());
        assert_eq!(id.kind(), TransactionKind::Cnps);
    }

    #[test]
    fn test_generate_cmu_prefix() {
        let mut rng = StdRng::seed_from_u64(1);
        let id = ClientTransactionId::generate(TransactionKind::Cmu, Utc::now(), &mut rng);
        assert!(id.as_str().starts_with("CMU-"));
    }

    #[test]
    fn test_parse_rejects_bad_ids() {
        for raw in [
            "CNPS-2024030914050-AB12",
            "CNPS-20241309140507-AB12",
            "CNPS-20240309140507-AB1",
            "CNPS-20240309140507-AB!2",
            "CNPS20240309140507-AB12",
            "AMU-20240309140507-AB12",
            "",
        ] {
            assert!(ClientTransactionId::parse(raw).is_err(), "{raw} should be rejected");
        }
    }

    #[test]
    fn test_prefix_detection() {
        assert_eq!(
            TransactionKind::from_id_prefix("CNPS-whatever"),
            Some(TransactionKind::Cnps)
        );
        assert_eq!(TransactionKind::from_id_prefix("CMU-1"), Some(TransactionKind::Cmu));
        assert_eq!(TransactionKind::from_id_prefix("CMUX-1"), None);
        assert_eq!(TransactionKind::from_id_prefix("cnps-1"), None);
        assert_eq!(TransactionKind::from_id_prefix("PAY-1"), None);
    }

    #[test]
    fn test_id_serializes_as_plain_string() {
        let id = ClientTransactionId::parse("CMU-20240309140507-AB12").unwrap();
        let json = serde_json::to_string(&id).unwrap();
        assert_eq!(json, "\"CMU-20240309140507-AB12\"");

        let back: ClientTransactionId = serde_json::from_str(&json).unwrap();
        assert_eq!(back, id);
        assert_eq!(back.kind(), TransactionKind::Cmu);
    }

    #[test]
    fn test_kind_from_str_is_case_insensitive() {
        assert_eq!("cnps".parse::<TransactionKind>().unwrap(), TransactionKind::Cnps);
        assert_eq!("CMU".parse::<TransactionKind>().unwrap(), TransactionKind::Cmu);
        assert!("amu".parse::<TransactionKind>().is_err());
    }
}
