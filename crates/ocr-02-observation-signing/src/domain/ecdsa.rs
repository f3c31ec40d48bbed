//! # Report Signatures (secp256k1)
//!
//! Reports are signed with each oracle's on-chain key and checked by
//! recovering the signer address, the same way the receiving contract does.
//!
//! ## Security Notes
//!
//! - **Malleability Prevention (EIP-2)**: high-S signatures are rejected and
//!   locally produced signatures are always normalised to low S.
//! - Uses the k256 crate for all curve operations.

use super::entities::EcdsaSignature;
use super::errors::{SigningError, SigningResult};
use k256::ecdsa::{RecoveryId, Signature, SigningKey, VerifyingKey};
use shared_types::{keccak256, Address, Hash};
use zeroize::Zeroize;

/// Sign a 32-byte digest, normalising to low S.
pub fn sign_digest(key: &SigningKey, digest: &Hash) -> SigningResult<EcdsaSignature> {
    let (sig, recid) = key
        .sign_prehash_recoverable(digest)
        .map_err(|e| SigningError::SigningFailed(e.to_string()))?;

    // Negating S flips the parity of the recovered point
    let (sig, recid) = match sig.normalize_s() {
        Some(normalized) => (
            normalized,
            RecoveryId::new(!recid.is_y_odd(), recid.is_x_reduced()),
        ),
        None => (sig, recid),
    };

    let bytes = sig.to_bytes();
    let mut r = [0u8; 32];
    let mut s = [0u8; 32];
    r.copy_from_slice(&bytes[..32]);
    s.copy_from_slice(&bytes[32..]);

    Ok(EcdsaSignature {
        r,
        s,
        v: recid.to_byte() + 27,
    })
}

/// Recover the signer's address from a signature over `digest`.
pub fn recover_address(digest: &Hash, signature: &EcdsaSignature) -> SigningResult<Address> {
    let recovery_id = parse_recovery_id(signature.v)?;

    let mut sig_bytes = [0u8; 64];
    sig_bytes[..32].copy_from_slice(&signature.r);
    sig_bytes[32..].copy_from_slice(&signature.s);
    let parsed = Signature::from_slice(&sig_bytes);
    sig_bytes.zeroize();
    let sig = parsed.map_err(|_| SigningError::InvalidSignature)?;

    if sig.normalize_s().is_some() {
        return Err(SigningError::MalleableSignature);
    }

    let recovered = VerifyingKey::recover_from_prehash(digest, &sig, recovery_id)
        .map_err(|_| SigningError::InvalidSignature)?;

    Ok(address_from_pubkey(&recovered))
}

/// Check that `signature` over `digest` was produced by `expected`.
pub fn verify_report_signature(
    digest: &Hash,
    signature: &EcdsaSignature,
    expected: &Address,
) -> SigningResult<()> {
    let actual = recover_address(digest, signature)?;
    if &actual != expected {
        return Err(SigningError::SignerMismatch {
            expected: *expected,
            actual,
        });
    }
    Ok(())
}

/// Derive Ethereum address from public key.
pub fn address_from_pubkey(public_key: &VerifyingKey) -> Address {
    let encoded = public_key.to_encoded_point(false);

    // Keccak256 of the uncompressed key without the 0x04 prefix
    let hash = keccak256(&encoded.as_bytes()[1..]);

    let mut address = [0u8; 20];
    address.copy_from_slice(&hash[12..]);
    address
}

/// Parse recovery ID from v value.
fn parse_recovery_id(v: u8) -> SigningResult<RecoveryId> {
    let normalized = match v {
        0 | 1 => v,
        27 | 28 => v - 27,
        _ => return Err(SigningError::InvalidRecoveryId(v)),
    };
    RecoveryId::from_byte(normalized).ok_or(SigningError::InvalidRecoveryId(v))
}

#[cfg(test)]
mod tests {
    use super::*;

    /// secp256k1 curve order n
    const SECP256K1_ORDER: [u8; 32] = [
        0xFF, 0xFF, 0xFF, 0xFF, 0xFF, 0xFF, 0xFF, 0xFF, 0xFF, 0xFF, 0xFF, 0xFF, 0xFF, 0xFF, 0xFF,
        0xFE, 0xBA, 0xAE, 0xDC, 0xE6, 0xAF, 0x48, 0xA0, 0x3B, 0xBF, 0xD2, 0x5E, 0x8C, 0xD0, 0x36,
        0x41, 0x41,
    ];

    /// n - s, big-endian
    fn invert_s(s: &[u8; 32]) -> [u8; 32] {
        let mut out = [0u8; 32];
        let mut borrow = 0i16;
        for i in (0..32).rev() {
            let mut diff = SECP256K1_ORDER[i] as i16 - s[i] as i16 - borrow;
            if diff < 0 {
                diff += 256;
                borrow = 1;
            } else {
                borrow = 0;
            }
            out[i] = diff as u8;
        }
        out
    }

    fn keypair() -> (SigningKey, Address) {
        let key = SigningKey::random(&mut rand::thread_rng());
        let address = address_from_pubkey(key.verifying_key());
        (key, address)
    }

    #[test]
    fn test_sign_and_recover() {
        let (key, address) = keypair();
        let digest = keccak256(b"report");
        let sig = sign_digest(&key, &digest).unwrap();

        assert!(sig.v == 27 || sig.v == 28);
        assert_eq!(recover_address(&digest, &sig).unwrap(), address);
        assert!(verify_report_signature(&digest, &sig, &address).is_ok());
    }

    #[test]
    fn test_signer_mismatch() {
        let (key, _) = keypair();
        let (_, other) = keypair();
        let digest = keccak256(b"report");
        let sig = sign_digest(&key, &digest).unwrap();

        assert!(matches!(
            verify_report_signature(&digest, &sig, &other),
            Err(SigningError::SignerMismatch { .. })
        ));
    }

    #[test]
    fn test_different_digest_recovers_other_address() {
        let (key, address) = keypair();
        let sig = sign_digest(&key, &keccak256(b"report A")).unwrap();

        match recover_address(&keccak256(b"report B"), &sig) {
            Ok(recovered) => assert_ne!(recovered, address),
            Err(e) => assert_eq!(e, SigningError::InvalidSignature),
        }
    }

    #[test]
    fn test_high_s_rejected() {
        let (key, _) = keypair();
        let digest = keccak256(b"report");
        let sig = sign_digest(&key, &digest).unwrap();

        let mut malleable = sig;
        malleable.s = invert_s(&sig.s);
        malleable.v = if sig.v == 27 { 28 } else { 27 };

        assert_eq!(
            recover_address(&digest, &malleable),
            Err(SigningError::MalleableSignature)
        );
    }

    #[test]
    fn test_invalid_recovery_id() {
        let (key, _) = keypair();
        let digest = keccak256(b"report");
        let mut sig = sign_digest(&key, &digest).unwrap();
        sig.v = 5;
        assert_eq!(
            recover_address(&digest, &sig),
            Err(SigningError::InvalidRecoveryId(5))
        );
    }

    #[test]
    fn test_zero_signature_rejected() {
        let digest = keccak256(b"report");
        let sig = EcdsaSignature {
            r: [0u8; 32],
            s: [0u8; 32],
            v: 27,
        };
        assert!(recover_address(&digest, &sig).is_err());
    }
}
