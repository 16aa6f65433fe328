//! RSA encryption of the API key and session tokens.
//!
//! The vendor publishes a base64 encoded RSA public key. Every bearer token sent
//! to the API is a secret encrypted with that key using PKCS#1 v1.5 padding and
//! base64 encoded again. The padding is randomized, so two encryptions of the
//! same secret never produce the same token.

use crate::error::AuthError;
use data::Credentials;
use derive_more::Display;
use openssl::base64;
use openssl::pkey::Public;
use openssl::rsa::{Padding, Rsa};
use std::fmt;

/// Base64 ciphertext used as the `Authorization: Bearer` value.
#[derive(Debug, Clone, PartialEq, Eq, Display)]
pub struct EncryptedKey(String);

impl EncryptedKey {
    pub fn as_str(&self) -> &str {
        &self.0
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

/// Decode and import a base64 encoded RSA public key.
///
/// Accepts DER `SubjectPublicKeyInfo` (what the vendor portal hands out), DER
/// PKCS#1 `RSAPublicKey`, or PEM of either.
pub fn import_public_key(public_key: &str) -> Result<Rsa<Public>, AuthError> {
    let der = base64::decode_block(public_key.trim()).map_err(AuthError::KeyDecode)?;
    Rsa::public_key_from_der(&der)
        .or_else(|_| Rsa::public_key_from_der_pkcs1(&der))
        .or_else(|_| Rsa::public_key_from_pem(&der))
        .or_else(|_| Rsa::public_key_from_pem_pkcs1(&der))
        .map_err(AuthError::KeyImport)
}

/// Encrypt `plaintext` with the base64 encoded RSA `public_key`.
pub fn encrypt(plaintext: &str, public_key: &str) -> Result<EncryptedKey, AuthError> {
    let rsa = import_public_key(public_key)?;
    encrypt_with(&rsa, plaintext)
}

fn encrypt_with(rsa: &Rsa<Public>, plaintext: &str) -> Result<EncryptedKey, AuthError> {
    let mut buf = vec![0u8; rsa.size() as usize];
    let len = rsa
        .public_encrypt(plaintext.as_bytes(), &mut buf, Padding::PKCS1)
        .map_err(AuthError::Encrypt)?;
    Ok(EncryptedKey(base64::encode_block(&buf[..len])))
}

/// Holds the imported public key and the API key it protects.
#[derive(Clone)]
pub struct KeyEncryptor {
    rsa: Rsa<Public>,
    api_key: String,
}

impl KeyEncryptor {
    pub fn new(credentials: &Credentials) -> Result<Self, AuthError> {
        Ok(Self {
            rsa: import_public_key(credentials.public_key())?,
            api_key: credentials.api_key().clone(),
        })
    }

    /// Bearer token for `getSession/`.
    pub fn encrypt_api_key(&self) -> Result<EncryptedKey, AuthError> {
        encrypt_with(&self.rsa, &self.api_key)
    }

    /// Bearer token for transaction calls.
    pub fn encrypt_session_token(&self, session_id: &str) -> Result<EncryptedKey, AuthError> {
        encrypt_with(&self.rsa, session_id)
    }
}

impl fmt::Debug for KeyEncryptor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("KeyEncryptor")
            .field("key_bits", &(self.rsa.size() * 8))
            .finish_non_exhaustive()
    }
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;
    use openssl::ec::{EcGroup, EcKey};
    use openssl::nid::Nid;
    use openssl::pkey::{PKey, Private};

    /// Key pair for tests: the private half decrypts what the client sends.
    pub(crate) struct TestKeys {
        pub private: Rsa<Private>,
        pub public_b64: String,
    }

    impl TestKeys {
        pub(crate) fn generate() -> Self {
            let private = Rsa::generate(2048).expect("Failed to generate rsa key");
            let der = private
                .public_key_to_der()
                .expect("Failed to export public key");
            Self {
                public_b64: base64::encode_block(&der),
                private,
            }
        }

        pub(crate) fn decrypt(&self, token: &str) -> String {
            let ciphertext = base64::decode_block(token).expect("token is not base64");
            let mut buf = vec![0u8; self.private.size() as usize];
            let len = self
                .private
                .private_decrypt(&ciphertext, &mut buf, Padding::PKCS1)
                .expect("Failed to decrypt token");
            String::from_utf8(buf[..len].to_vec()).expect("plaintext is not utf-8")
        }
    }

    #[test]
    fn test_encrypt_roundtrip_through_private_key() {
        let keys = TestKeys::generate();
        let token = encrypt("my-api-key", &keys.public_b64).unwrap();

        assert!(!token.is_empty());
        assert_eq!(keys.decrypt(token.as_str()), "my-api-key");
    }

    #[test]
    fn test_ciphertext_is_randomized() {
        let keys = TestKeys::generate();
        let first = encrypt("same", &keys.public_b64).unwrap();
        let second = encrypt("same", &keys.public_b64).unwrap();

        assert_ne!(first, second);
        assert_eq!(keys.decrypt(first.as_str()), keys.decrypt(second.as_str()));
    }

    #[test]
    fn test_pkcs1_and_pem_keys_are_accepted() {
        let keys = TestKeys::generate();
        let pkcs1 = base64::encode_block(&keys.private.public_key_to_der_pkcs1().unwrap());
        let pem = base64::encode_block(&keys.private.public_key_to_pem().unwrap());

        for public_key in [pkcs1, pem] {
            let token = encrypt("secret", &public_key).unwrap();
            assert_eq!(keys.decrypt(token.as_str()), "secret");
        }
    }

    #[test]
    fn test_bad_base64() {
        let err = encrypt("secret", "this is not base64!").unwrap_err();
        assert!(matches!(err, AuthError::KeyDecode(_)));
    }

    #[test]
    fn test_not_a_key() {
        let garbage = base64::encode_block(b"definitely not a DER encoded key");
        let err = encrypt("secret", &garbage).unwrap_err();
        assert!(matches!(err, AuthError::KeyImport(_)));
    }

    #[test]
    fn test_wrong_key_type() {
        let group = EcGroup::from_curve_name(Nid::X9_62_PRIME256V1).unwrap();
        let ec = PKey::from_ec_key(EcKey::generate(&group).unwrap()).unwrap();
        let der = base64::encode_block(&ec.public_key_to_der().unwrap());

        let err = encrypt("secret", &der).unwrap_err();
        assert!(matches!(err, AuthError::KeyImport(_)));
    }

    #[test]
    fn test_plaintext_too_long_for_key() {
        let keys = TestKeys::generate();
        // 2048 bit key leaves 245 bytes for PKCS#1 v1.5 plaintext
        let long = "x".repeat(300);
        let err = encrypt(&long, &keys.public_b64).unwrap_err();
        assert!(matches!(err, AuthError::Encrypt(_)));
    }

    #[test]
    fn test_encryptor_named_operations() {
        let keys = TestKeys::generate();
        let credentials = Credentials::new(keys.public_b64.clone(), "api-key-123").unwrap();
        let encryptor = KeyEncryptor::new(&credentials).unwrap();

        let api = encryptor.encrypt_api_key().unwrap();
        let session = encryptor.encrypt_session_token("session-456").unwrap();

        assert_eq!(keys.decrypt(api.as_str()), "api-key-123");
        assert_eq!(keys.decrypt(session.as_str()), "session-456");
        assert!(!format!("{encryptor:?}").contains("api-key-123"));
    }
}
