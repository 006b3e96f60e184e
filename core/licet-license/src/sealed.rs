//! The on-disk license file.
//!
//! The signed certificate document is encrypted under a key derived from the
//! store passphrase, so the file neither reveals its content nor survives
//! any change to its bytes. Reading also requires the file to be exactly the
//! codec's rendering of what it decodes to.

use std::fs;
use std::path::Path;

use licet_cert::{Passphrase, SealedCertificate};
use licet_keystore::{EncryptedData, KdfParams, Salt, decrypt, derive_key, encrypt};
use licet_persist::{Codec, PersistError};
use serde::{Deserialize, Serialize};
use zeroize::Zeroizing;

use crate::error::{LicenseError, LicenseResult};

#[derive(Debug, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub(crate) struct LicenseFile {
    kdf: KdfParams,
    salt: Salt,
    certificate: EncryptedData,
}

impl LicenseFile {
    /// Encrypts `certificate` under `passphrase` with a fresh salt.
    pub(crate) fn seal(
        codec: &Codec,
        certificate: &SealedCertificate,
        passphrase: &Passphrase,
        kdf: &KdfParams,
    ) -> LicenseResult<Self> {
        let plaintext = Zeroizing::new(codec.encode_to_bytes(certificate)?);
        let salt = Salt::random();
        let key =
            derive_key(passphrase, &salt, kdf).map_err(|e| LicenseError::Crypto(Box::new(e)))?;
        let certificate =
            encrypt(&key, &plaintext).map_err(|e| LicenseError::Crypto(Box::new(e)))?;
        Ok(Self {
            kdf: kdf.clone(),
            salt,
            certificate,
        })
    }

    /// Reads the license file at `path`.
    ///
    /// A missing or unreadable file is `Persist`; anything that does not
    /// decode, or decodes from bytes other than its own encoding, is
    /// `Integrity`.
    pub(crate) fn read(codec: &Codec, path: &Path) -> LicenseResult<Self> {
        let bytes = fs::read(path)
            .map_err(|e| LicenseError::Persist(PersistError::Decode(Box::new(e))))?;
        let file: Self = codec
            .decode_from_bytes(&bytes)
            .map_err(|e| LicenseError::Integrity(format!("license file does not decode: {e}")))?;

        match codec.encode_to_bytes(&file) {
            Ok(canonical) if canonical == bytes => Ok(file),
            _ => Err(LicenseError::Integrity("license file has been altered".into())),
        }
    }

    /// Decrypts the certificate with `passphrase`.
    pub(crate) fn open(
        &self,
        codec: &Codec,
        passphrase: &Passphrase,
    ) -> LicenseResult<SealedCertificate> {
        let key = derive_key(passphrase, &self.salt, &self.kdf)
            .map_err(|e| LicenseError::Integrity(format!("license file key parameters: {e}")))?;
        let plaintext = Zeroizing::new(decrypt(&key, &self.certificate).map_err(|_| {
            LicenseError::Integrity("license file does not open with this store passphrase".into())
        })?);
        codec
            .decode_from_bytes(&plaintext)
            .map_err(|e| LicenseError::Integrity(format!("sealed certificate does not decode: {e}")))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn fast() -> KdfParams {
        KdfParams {
            memory_cost: 1024,
            time_cost: 1,
            parallelism: 1,
        }
    }

    fn certificate() -> SealedCertificate {
        serde_json::from_value(serde_json::json!({
            "encoded": "{\"subject\":\"license\"}",
            "signature": "c2lnbmF0dXJl",
            "signature_algorithm": "Ed25519",
            "signature_encoding": "base64"
        }))
        .unwrap()
    }

    #[test]
    fn seal_then_open_returns_the_certificate() {
        let codec = Codec::new();
        let file = LicenseFile::seal(&codec, &certificate(), &"pw".into(), &fast()).unwrap();
        assert_eq!(file.open(&codec, &"pw".into()).unwrap(), certificate());
    }

    #[test]
    fn other_passphrase_is_an_integrity_failure() {
        let codec = Codec::new();
        let file = LicenseFile::seal(&codec, &certificate(), &"pw".into(), &fast()).unwrap();
        assert!(file.open(&codec, &"other".into()).unwrap_err().is_integrity());
    }

    #[test]
    fn sealed_file_hides_the_certificate() {
        let codec = Codec::new();
        let file = LicenseFile::seal(&codec, &certificate(), &"pw".into(), &fast()).unwrap();
        let text = codec.encode_to_string(&file).unwrap();
        assert!(!text.contains("subject"));
        assert!(!text.contains("Ed25519"));
    }

    #[test]
    fn unusable_kdf_parameters_are_an_integrity_failure() {
        let codec = Codec::new();
        let mut file = LicenseFile::seal(&codec, &certificate(), &"pw".into(), &fast()).unwrap();
        file.kdf.time_cost = 0;
        assert!(file.open(&codec, &"pw".into()).unwrap_err().is_integrity());
    }

    #[test]
    fn reformatted_file_is_rejected() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("license.lic");
        let codec = Codec::new();
        let file = LicenseFile::seal(&codec, &certificate(), &"pw".into(), &fast()).unwrap();
        codec.encode_to_file(&file, &path).unwrap();
        LicenseFile::read(&codec, &path).unwrap();

        let value: serde_json::Value = serde_json::from_slice(&fs::read(&path).unwrap()).unwrap();
        fs::write(&path, serde_json::to_vec(&value).unwrap()).unwrap();

        assert!(LicenseFile::read(&codec, &path).unwrap_err().is_integrity());
    }
}
