// Stateless continuation tokens. Everything a follow-up call needs is sealed
// into an opaque string handed back to the caller; the engine keeps nothing
// between invocations. Only the durable subset travels: scope, VPC, key pair,
// security group, optional notification thread. Servers and target groups are
// re-resolved by name within the scope on each call.

use base64::engine::general_purpose::STANDARD as BASE64;
use base64::Engine;
use serde::{Deserialize, Serialize};

use crate::provider::api::VpcInfo;
use crate::provider::ProvisionError;
use crate::resources::{GroupRecord, KeyRecord};

/// Seal/open primitive for token bytes. The production implementation wraps
/// an authenticated cipher and lives outside this crate; `PlainCipher` below
/// is for development and tests only.
pub trait Cipher: Send + Sync {
    fn seal(&self, plaintext: &[u8]) -> Result<String, ProvisionError>;
    fn open(&self, sealed: &str) -> Result<Vec<u8>, ProvisionError>;
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TokenPayload {
    pub scope: String,
    pub vpc: VpcInfo,
    pub key: KeyRecord,
    pub security_group: GroupRecord,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub thread_id: Option<String>,
}

pub fn seal(payload: &TokenPayload, cipher: &dyn Cipher) -> Result<String, ProvisionError> {
    let bytes = serde_json::to_vec(payload)
        .map_err(|err| ProvisionError::Token(format!("encode payload: {err}")))?;
    cipher.seal(&bytes)
}

/// Open a token and verify it belongs to `expected_scope`. A scope mismatch
/// is a caller error: fatal, non-retryable, and no rollback since nothing
/// was provisioned yet.
pub fn open(
    sealed: &str,
    expected_scope: &str,
    cipher: &dyn Cipher,
) -> Result<TokenPayload, ProvisionError> {
    let bytes = cipher.open(sealed)?;
    let payload: TokenPayload = serde_json::from_slice(&bytes)
        .map_err(|err| ProvisionError::Token(format!("decode payload: {err}")))?;
    if payload.scope != expected_scope {
        return Err(ProvisionError::Validation(format!(
            "continuation token is for scope {}, not {expected_scope}",
            payload.scope
        )));
    }
    Ok(payload)
}

/// Base64-only stand-in cipher. Opaque to the eye, not to an attacker; used
/// by the dry-run binary and the test suite.
#[derive(Debug, Default, Clone, Copy)]
pub struct PlainCipher;

impl Cipher for PlainCipher {
    fn seal(&self, plaintext: &[u8]) -> Result<String, ProvisionError> {
        Ok(BASE64.encode(plaintext))
    }

    fn open(&self, sealed: &str) -> Result<Vec<u8>, ProvisionError> {
        BASE64
            .decode(sealed)
            .map_err(|err| ProvisionError::Token(format!("unseal: {err}")))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn payload(scope: &str) -> TokenPayload {
        TokenPayload {
            scope: scope.to_string(),
            vpc: VpcInfo {
                id: "vpc-default".to_string(),
            },
            key: KeyRecord {
                id: "key-1".to_string(),
                name: format!("{scope}-key"),
                pem_name: format!("{scope}-key.pem"),
                fingerprint: "fp:key-1".to_string(),
                material: "material".to_string(),
            },
            security_group: GroupRecord {
                name: format!("{scope}-sg"),
                id: "sg-1".to_string(),
            },
            thread_id: None,
        }
    }

    #[test]
    fn round_trips_through_the_cipher() {
        let original = payload("demo-prod");
        let sealed = seal(&original, &PlainCipher).unwrap();
        let opened = open(&sealed, "demo-prod", &PlainCipher).unwrap();
        assert_eq!(opened, original);
    }

    #[test]
    fn scope_mismatch_is_a_validation_error() {
        let sealed = seal(&payload("demo-prod"), &PlainCipher).unwrap();
        let err = open(&sealed, "other-scope", &PlainCipher).unwrap_err();
        assert!(matches!(err, ProvisionError::Validation(_)));
        assert!(err.is_validation());
    }

    #[test]
    fn garbage_token_is_a_token_error() {
        let err = open("not base64 at all!!!", "demo-prod", &PlainCipher).unwrap_err();
        assert!(matches!(err, ProvisionError::Token(_)));
    }

    #[test]
    fn thread_id_is_omitted_from_the_wire_when_absent() {
        let bytes = serde_json::to_vec(&payload("demo-prod")).unwrap();
        let text = String::from_utf8(bytes).unwrap();
        assert!(!text.contains("thread_id"));
    }
}
