use super::amount::Amount;
use super::transaction::TerminalStatus;
use serde::Deserialize;

/// Payment status notification as posted by the InTouch gateway.
///
/// Every field is required; a body missing any of them is malformed.
#[derive(Debug, Deserialize, PartialEq, Clone)]
#[serde(rename_all = "camelCase")]
pub struct CallbackPayload {
    pub id_from_client: String,
    #[serde(rename = "idFromGU")]
    pub id_from_gu: String,
    pub status: String,
    pub message: String,
    pub amount: Amount,
    pub fees: Amount,
}

impl CallbackPayload {
    /// Parses a raw webhook body.
    pub fn from_slice(body: &[u8]) -> serde_json::Result<Self> {
        serde_json::from_slice(body)
    }
}

/// Gateway status vocabulary.
#[derive(Debug, PartialEq, Eq, Clone)]
pub enum GatewayStatus {
    Successful,
    Failed,
    Other(String),
}

impl GatewayStatus {
    pub fn parse(raw: &str) -> Self {
        match raw {
            "SUCCESSFUL" => GatewayStatus::Successful,
            "FAILED" => GatewayStatus::Failed,
            other => GatewayStatus::Other(other.to_string()),
        }
    }

    /// `None` for statuses that do not end the transaction.
    pub fn terminal(&self) -> Option<TerminalStatus> {
        match self {
            GatewayStatus::Successful => Some(TerminalStatus::Completed),
            GatewayStatus::Failed => Some(TerminalStatus::Failed),
            GatewayStatus::Other(_) => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    #[test]
    fn test_payload_field_names() {
        let body = br#"{
            "idFromClient": "CNPS-20240101000000-AB12",
            "idFromGU": "GU-99",
            "status": "SUCCESSFUL",
            "message": "Transaction reussie",
            "amount": 5000,
            "fees": 50
        }"#;
        let payload = CallbackPayload::from_slice(body).unwrap();
        assert_eq!(payload.id_from_client, "CNPS-20240101000000-AB12");
        assert_eq!(payload.id_from_gu, "GU-99");
        assert_eq!(payload.amount, Amount::new(dec!(5000)).unwrap());
    }

    #[test]
    fn test_payload_missing_field_rejected() {
        let body = br#"{"idFromClient": "CNPS-1", "idFromGU": "GU", "status": "FAILED", "amount": 1, "fees": 0}"#;
        assert!(CallbackPayload::from_slice(body).is_err());
    }

    #[test]
    fn test_payload_wrong_type_rejected() {
        let body = br#"{"idFromClient": 12, "idFromGU": "GU", "status": "FAILED", "message": "", "amount": 1, "fees": 0}"#;
        assert!(CallbackPayload::from_slice(body).is_err());
    }

    #[test]
    fn test_status_mapping() {
        assert_eq!(
            GatewayStatus::parse("SUCCESSFUL").terminal(),
            Some(TerminalStatus::Completed)
        );
        assert_eq!(GatewayStatus::parse("FAILED").terminal(), Some(TerminalStatus::Failed));
        assert_eq!(GatewayStatus::parse("INITIATED").terminal(), None);
        assert_eq!(GatewayStatus::parse("successful").terminal(), None);
    }
}
