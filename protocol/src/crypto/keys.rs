//! # Key Management
//!
//! Ed25519 keypairs, signatures, and addresses for Strata identities.
//!
//! Every actor on the network — client, relay, validator — is an Ed25519
//! keypair. Outputs are locked to an [`Address`], the last 20 bytes of a
//! public key. There is no script system: spending an output means proving
//! you hold the key whose address matches, nothing more.
//!
//! ## Why Ed25519?
//!
//! - Deterministic signatures (no k-value footguns like ECDSA).
//! - 128-bit security level in 32+32 bytes. Compact and sufficient.
//! - Fast verification — important when you're checking every input of
//!   every transaction of every block.
//!
//! ## Security considerations
//!
//! - We use OS-level RNG (`OsRng`) for key generation. If your OS RNG is
//!   broken, you have bigger problems than Strata.
//! - Seed bytes are never logged. If you add logging to this module,
//!   you will be asked to leave.

use ed25519_dalek::{
    Signature as DalekSignature, Signer, SigningKey, Verifier, VerifyingKey,
};
use rand::rngs::OsRng;
use serde::{Deserialize, Serialize};
use std::fmt;
use thiserror::Error;

use crate::config::{
    ADDRESS_LENGTH, KEYPAIR_LENGTH, PUBLIC_KEY_LENGTH, SEED_LENGTH, SIGNATURE_LENGTH,
};

/// Errors raised by malformed key material.
///
/// Length checks are strict everywhere: a 31-byte seed is not "close
/// enough", it is an error. These messages are intentionally vague about
/// *content* — leaking key material through error strings is a classic
/// footgun.
#[derive(Debug, Error)]
pub enum KeyError {
    #[error("invalid seed: expected {SEED_LENGTH} bytes")]
    InvalidSeed,

    #[error("invalid public key: expected {PUBLIC_KEY_LENGTH} bytes encoding a valid point")]
    InvalidPublicKey,

    #[error("invalid signature: expected {SIGNATURE_LENGTH} bytes")]
    InvalidSignature,

    #[error("invalid address: expected {ADDRESS_LENGTH} bytes")]
    InvalidAddress,

    #[error("keypair bytes are inconsistent: public half does not match the seed")]
    KeypairMismatch,
}

// ---------------------------------------------------------------------------
// StrataKeypair
// ---------------------------------------------------------------------------

/// A Strata identity keypair wrapping an Ed25519 signing key.
///
/// The signing key is the crown jewel — every coin locked to this identity's
/// address is exactly one `sign()` call away from moving.
///
/// `StrataKeypair` intentionally does NOT implement `Serialize`. Exporting a
/// private key should be a deliberate, conscious act, not something that
/// happens because someone shoved a keypair into a debug dump. Use
/// [`to_keypair_bytes`](Self::to_keypair_bytes) explicitly.
///
/// # Examples
///
/// ```
/// use strata_protocol::crypto::keys::StrataKeypair;
///
/// let kp = StrataKeypair::generate();
/// let sig = kp.sign(b"send 100 to alice");
/// assert!(kp.public_key().verify(b"send 100 to alice", &sig));
/// ```
pub struct StrataKeypair {
    signing_key: SigningKey,
}

impl StrataKeypair {
    /// Generate a fresh keypair from the OS cryptographic RNG.
    pub fn generate() -> Self {
        let signing_key = SigningKey::generate(&mut OsRng);
        Self { signing_key }
    }

    /// Construct a keypair deterministically from a 32-byte seed.
    ///
    /// Same seed, same keypair, on every platform and every build. This is
    /// what the genesis founder key and every test fixture rely on.
    ///
    /// **Warning**: a weak seed is a weak key. Outside of tests and the
    /// genesis constant, seeds come from a CSPRNG or not at all.
    pub fn from_seed(seed: &[u8; SEED_LENGTH]) -> Self {
        Self {
            signing_key: SigningKey::from_bytes(seed),
        }
    }

    /// Construct a keypair from a seed of unchecked length.
    ///
    /// Strict: anything but exactly 32 bytes is rejected.
    pub fn try_from_seed_slice(slice: &[u8]) -> Result<Self, KeyError> {
        let seed: &[u8; SEED_LENGTH] = slice.try_into().map_err(|_| KeyError::InvalidSeed)?;
        Ok(Self::from_seed(seed))
    }

    /// Construct a keypair from a hex-encoded 32-byte seed.
    ///
    /// Convenience for config files and CLI flags. Please don't put raw hex
    /// seeds in production config files — but for devnet, we're not going to
    /// pretend you won't do it anyway.
    pub fn from_hex(hex_str: &str) -> Result<Self, KeyError> {
        let bytes = hex::decode(hex_str).map_err(|_| KeyError::InvalidSeed)?;
        Self::try_from_seed_slice(&bytes)
    }

    /// The public half of this keypair, safe to share with the world.
    pub fn public_key(&self) -> StrataPublicKey {
        StrataPublicKey {
            bytes: self.signing_key.verifying_key().to_bytes(),
        }
    }

    /// The address derived from this keypair's public key.
    pub fn address(&self) -> Address {
        self.public_key().address()
    }

    /// Sign a message.
    ///
    /// Ed25519 signatures are deterministic — the same (key, message) pair
    /// always produces the same signature. No nonce management, no RNG at
    /// signing time, no sleepless nights.
    pub fn sign(&self, message: &[u8]) -> StrataSignature {
        let sig = self.signing_key.sign(message);
        StrataSignature {
            bytes: sig.to_bytes().to_vec(),
        }
    }

    /// The raw 32-byte seed. **Handle with extreme care.**
    pub fn seed_bytes(&self) -> [u8; SEED_LENGTH] {
        self.signing_key.to_bytes()
    }

    /// Export the expanded 64-byte keypair representation: seed followed by
    /// the derived public key.
    pub fn to_keypair_bytes(&self) -> [u8; KEYPAIR_LENGTH] {
        self.signing_key.to_keypair_bytes()
    }

    /// Reconstruct a keypair from its expanded 64-byte representation.
    ///
    /// The public half is re-derived from the seed and compared against the
    /// stored half; a mismatch means the bytes were corrupted or hand-rolled,
    /// and we refuse to sign with a key we can't vouch for.
    pub fn from_keypair_bytes(bytes: &[u8; KEYPAIR_LENGTH]) -> Result<Self, KeyError> {
        let seed: [u8; SEED_LENGTH] = bytes[..SEED_LENGTH]
            .try_into()
            .map_err(|_| KeyError::InvalidSeed)?;
        let keypair = Self::from_seed(&seed);
        if keypair.public_key().as_bytes() != &bytes[SEED_LENGTH..] {
            return Err(KeyError::KeypairMismatch);
        }
        Ok(keypair)
    }
}

impl Clone for StrataKeypair {
    /// Cloning a keypair is allowed but should make you uncomfortable.
    /// Every copy of a private key is another thing to protect.
    fn clone(&self) -> Self {
        Self {
            signing_key: SigningKey::from_bytes(&self.signing_key.to_bytes()),
        }
    }
}

impl fmt::Debug for StrataKeypair {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        // Never print seed material in debug output. Not even "partially".
        write!(f, "StrataKeypair(pub={})", self.public_key().to_hex())
    }
}

impl PartialEq for StrataKeypair {
    /// Two keypairs are equal if their public keys match. Comparing secret
    /// material in a non-constant-time way is a bad habit, and for identity
    /// purposes the public key is what matters.
    fn eq(&self, other: &Self) -> bool {
        self.public_key() == other.public_key()
    }
}

impl Eq for StrataKeypair {}

// ---------------------------------------------------------------------------
// StrataPublicKey
// ---------------------------------------------------------------------------

/// The public half of a Strata identity. 32 bytes, safe to broadcast.
#[derive(Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct StrataPublicKey {
    bytes: [u8; PUBLIC_KEY_LENGTH],
}

impl StrataPublicKey {
    /// Wrap raw 32-byte key material without point validation.
    ///
    /// Used where the bytes came from a trusted source (our own keypair).
    /// Untrusted input goes through [`try_from_slice`](Self::try_from_slice).
    pub fn from_bytes(bytes: [u8; PUBLIC_KEY_LENGTH]) -> Self {
        Self { bytes }
    }

    /// Parse a public key from an untrusted byte slice.
    ///
    /// Validates both the length and that the bytes decode to a valid
    /// Ed25519 point. Some 32-byte strings aren't points on the curve, and
    /// accepting them buys nothing but weird failure modes later.
    pub fn try_from_slice(slice: &[u8]) -> Result<Self, KeyError> {
        let bytes: [u8; PUBLIC_KEY_LENGTH] =
            slice.try_into().map_err(|_| KeyError::InvalidPublicKey)?;
        VerifyingKey::from_bytes(&bytes).map_err(|_| KeyError::InvalidPublicKey)?;
        Ok(Self { bytes })
    }

    /// The raw key bytes.
    pub fn as_bytes(&self) -> &[u8; PUBLIC_KEY_LENGTH] {
        &self.bytes
    }

    /// Verify a signature over a message.
    ///
    /// Returns a plain boolean rather than a `Result` — callers on the
    /// validation path want a yes/no answer, not a taxonomy of the ways a
    /// forgery can fail. An empty or wrong-length signature is simply `false`.
    pub fn verify(&self, message: &[u8], signature: &StrataSignature) -> bool {
        let Ok(verifying_key) = VerifyingKey::from_bytes(&self.bytes) else {
            return false;
        };
        let sig_bytes: [u8; SIGNATURE_LENGTH] = match signature.bytes.as_slice().try_into() {
            Ok(b) => b,
            Err(_) => return false,
        };
        let dalek_sig = DalekSignature::from_bytes(&sig_bytes);
        verifying_key.verify(message, &dalek_sig).is_ok()
    }

    /// The address of this key: its last 20 bytes.
    pub fn address(&self) -> Address {
        let mut value = [0u8; ADDRESS_LENGTH];
        value.copy_from_slice(&self.bytes[PUBLIC_KEY_LENGTH - ADDRESS_LENGTH..]);
        Address { value }
    }

    /// Hex-encoded representation. 64 characters.
    pub fn to_hex(&self) -> String {
        hex::encode(self.bytes)
    }
}

impl fmt::Display for StrataPublicKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.to_hex())
    }
}

impl fmt::Debug for StrataPublicKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "StrataPublicKey({})", &self.to_hex()[..16])
    }
}

// ---------------------------------------------------------------------------
// StrataSignature
// ---------------------------------------------------------------------------

/// An Ed25519 signature over a message. 64 bytes — except inside a
/// transaction input *during hashing*, where the signature slot is the
/// empty byte string (see the transaction module for why).
///
/// Stored as `Vec<u8>` so that the cleared state is representable. A
/// signature that isn't exactly 64 bytes never verifies — no panics, no
/// undefined behavior, just `false`.
#[derive(Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StrataSignature {
    bytes: Vec<u8>,
}

impl StrataSignature {
    /// Wrap a raw 64-byte signature.
    pub fn from_bytes(bytes: [u8; SIGNATURE_LENGTH]) -> Self {
        Self {
            bytes: bytes.to_vec(),
        }
    }

    /// Parse a signature from an untrusted slice. Strict 64-byte check.
    pub fn try_from_slice(slice: &[u8]) -> Result<Self, KeyError> {
        if slice.len() != SIGNATURE_LENGTH {
            return Err(KeyError::InvalidSignature);
        }
        Ok(Self {
            bytes: slice.to_vec(),
        })
    }

    /// The cleared signature: an empty byte string. This is what occupies
    /// an input's signature slot while the transaction hash is computed.
    pub fn empty() -> Self {
        Self { bytes: Vec::new() }
    }

    /// `true` for the cleared state.
    pub fn is_empty(&self) -> bool {
        self.bytes.is_empty()
    }

    /// The raw signature bytes (64, or 0 when cleared).
    pub fn as_bytes(&self) -> &[u8] {
        &self.bytes
    }

    /// Hex-encoded signature. 128 characters for a real signature.
    pub fn to_hex(&self) -> String {
        hex::encode(&self.bytes)
    }
}

impl fmt::Debug for StrataSignature {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.bytes.is_empty() {
            write!(f, "StrataSignature(empty)")
        } else {
            let hex_str = self.to_hex();
            write!(f, "StrataSignature({}...{})", &hex_str[..8], &hex_str[120..])
        }
    }
}

// ---------------------------------------------------------------------------
// Address
// ---------------------------------------------------------------------------

/// A 20-byte output lock: the tail of a public key.
///
/// Outputs are spendable by whoever presents a public key whose address
/// equals the output's, together with a valid signature. Raw byte equality,
/// no scripts, no checksums — the hex string users pass around *is* the
/// address.
#[derive(Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Address {
    value: [u8; ADDRESS_LENGTH],
}

impl Address {
    /// Wrap raw 20-byte address material.
    pub fn from_bytes(value: [u8; ADDRESS_LENGTH]) -> Self {
        Self { value }
    }

    /// Parse an address from an untrusted slice. Strict 20-byte check.
    pub fn try_from_slice(slice: &[u8]) -> Result<Self, KeyError> {
        let value: [u8; ADDRESS_LENGTH] =
            slice.try_into().map_err(|_| KeyError::InvalidAddress)?;
        Ok(Self { value })
    }

    /// Parse a lowercase-hex address string. 40 characters.
    pub fn from_hex(s: &str) -> Result<Self, KeyError> {
        let bytes = hex::decode(s).map_err(|_| KeyError::InvalidAddress)?;
        Self::try_from_slice(&bytes)
    }

    /// The raw address bytes.
    pub fn as_bytes(&self) -> &[u8; ADDRESS_LENGTH] {
        &self.value
    }

    /// Hex-encoded address. 40 characters.
    pub fn to_hex(&self) -> String {
        hex::encode(self.value)
    }
}

impl fmt::Display for Address {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.to_hex())
    }
}

impl fmt::Debug for Address {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Address({})", self.to_hex())
    }
}
