use crate::*;
use aes_gcm::aead::{generic_array::GenericArray, Aead, NewAead};
use aes_gcm::Aes256Gcm;
use chrono::{DateTime, Utc};
use digest::Digest;
use hkdf::Hkdf;
use rand::{thread_rng, Rng};
use serde::{de, Deserialize, Deserializer, Serialize, Serializer};
use sha2::Sha256;
use std::convert::TryInto;
use std::str::FromStr;
use uuid::Uuid;

/// Prefix distinguishing receipt hashes from other hex-encoded material
pub const RECEIPT_HASH_PREFIX: &str = "VOTE-";

pub const SECRET_LENGTH: usize = 32;

const SEAL_NONCE_LENGTH: usize = 12;

/// Receipt hash
///
/// A 256-bit digest handed to the voter as their receipt token. It is salted
/// with the current time and a random nonce, so knowing the voter, election
/// and candidate identifiers is not enough to precompute or replay it.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ReceiptHash([u8; 32]);

impl ReceiptHash {
    pub fn from_bytes(bytes: [u8; 32]) -> Self {
        ReceiptHash(bytes)
    }

    pub fn as_bytes(&self) -> &[u8; 32] {
        &self.0
    }

    /// The synthetic transaction seeded into the genesis block
    pub fn genesis() -> Self {
        let digest: [u8; 32] = Sha256::digest(b"voteledger-genesis-block").into();
        ReceiptHash(digest)
    }
}

impl std::fmt::Display for ReceiptHash {
    fn fmt(&self, f: &mut std::fmt::Formatter) -> std::fmt::Result {
        write!(f, "{}{}", RECEIPT_HASH_PREFIX, hex::encode(&self.0))
    }
}

impl FromStr for ReceiptHash {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let hex_part = s
            .strip_prefix(RECEIPT_HASH_PREFIX)
            .ok_or(Error::MalformedReceipt("missing receipt prefix"))?;

        let bytes =
            hex::decode(hex_part).map_err(|_| Error::MalformedReceipt("invalid hexadecimal"))?;

        let bytes: [u8; 32] = bytes
            .try_into()
            .map_err(|_| Error::MalformedReceipt("wrong length"))?;

        Ok(ReceiptHash(bytes))
    }
}

impl Serialize for ReceiptHash {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        serializer.serialize_str(&self.to_string())
    }
}

impl<'de> Deserialize<'de> for ReceiptHash {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        let s = String::deserialize(deserializer)?;
        std::str::FromStr::from_str(&s).map_err(de::Error::custom)
    }
}

/// Derive a fresh receipt hash for a vote
///
/// Two calls with identical inputs produce different hashes: the digest is
/// salted with the current time and a random nonce. The hash is a receipt
/// token, not a content fingerprint.
pub fn derive_receipt_hash(
    voter_id: &str,
    election_id: &Uuid,
    candidate_id: &Uuid,
) -> ReceiptHash {
    let mut csprng = rand::rngs::OsRng {};
    let nonce: [u8; 16] = csprng.gen();

    let mut hasher = Sha256::new();
    hasher.update(voter_id.as_bytes());
    hasher.update(election_id.as_bytes());
    hasher.update(candidate_id.as_bytes());
    hasher.update(&Utc::now().timestamp_nanos().to_be_bytes());
    hasher.update(&nonce);

    ReceiptHash(hasher.finalize().into())
}

/// Process-wide sealing secret, injected into the vote caster and the
/// receipt verifier at construction time.
#[derive(Clone)]
pub struct ReceiptSecret([u8; SECRET_LENGTH]);

impl ReceiptSecret {
    pub fn from_bytes(bytes: [u8; SECRET_LENGTH]) -> Self {
        ReceiptSecret(bytes)
    }

    pub fn from_hex(s: &str) -> Result<Self, Error> {
        let bytes = hex::decode(s).map_err(|_| Error::InvalidSecret)?;
        let bytes: [u8; SECRET_LENGTH] = bytes.try_into().map_err(|_| Error::InvalidSecret)?;
        Ok(ReceiptSecret(bytes))
    }

    pub fn generate() -> Self {
        let mut csprng = rand::rngs::OsRng {};
        let bytes: [u8; SECRET_LENGTH] = csprng.gen();
        ReceiptSecret(bytes)
    }

    fn aes_key(&self) -> [u8; 32] {
        hkdf_sha256(&self.0)
    }
}

impl std::fmt::Debug for ReceiptSecret {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        // Never expose key material
        f.debug_struct("ReceiptSecret").finish()
    }
}

/// The plaintext sealed inside a vote record
#[derive(Serialize, Deserialize, Clone, Debug, PartialEq)]
pub struct VoteDetails {
    pub candidate_id: Uuid,
    pub cast_at: DateTime<Utc>,
    pub session_id: Uuid,
}

/// Nonce-prefixed AES-256-GCM ciphertext of a [`VoteDetails`]
///
/// The textual form is `hex(nonce):hex(ciphertext)`.
#[derive(Clone, Debug, PartialEq)]
pub struct SealedDetails {
    nonce: [u8; SEAL_NONCE_LENGTH],
    ciphertext: Vec<u8>,
}

impl std::fmt::Display for SealedDetails {
    fn fmt(&self, f: &mut std::fmt::Formatter) -> std::fmt::Result {
        write!(f, "{}:{}", hex::encode(&self.nonce), hex::encode(&self.ciphertext))
    }
}

impl FromStr for SealedDetails {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let (nonce, ciphertext) = s.split_once(':').ok_or(Error::DecryptionError)?;

        let nonce = hex::decode(nonce).map_err(|_| Error::DecryptionError)?;
        let nonce: [u8; SEAL_NONCE_LENGTH] =
            nonce.try_into().map_err(|_| Error::DecryptionError)?;
        let ciphertext = hex::decode(ciphertext).map_err(|_| Error::DecryptionError)?;

        Ok(SealedDetails { nonce, ciphertext })
    }
}

impl Serialize for SealedDetails {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        serializer.serialize_str(&self.to_string())
    }
}

impl<'de> Deserialize<'de> for SealedDetails {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        let s = String::deserialize(deserializer)?;
        std::str::FromStr::from_str(&s).map_err(de::Error::custom)
    }
}

/// Seal vote details under the process secret
pub fn seal_details(secret: &ReceiptSecret, details: &VoteDetails) -> SealedDetails {
    let plaintext =
        serde_json::to_vec(details).expect("voteledger: unexpected error packing vote details");

    let key = secret.aes_key();
    let aead = Aes256Gcm::new(GenericArray::from_slice(&key));

    let mut nonce = [0u8; SEAL_NONCE_LENGTH];
    thread_rng().fill(&mut nonce);

    let ciphertext = aead
        .encrypt(GenericArray::from_slice(&nonce), plaintext.as_slice())
        .expect("voteledger: sealing failure!");

    SealedDetails { nonce, ciphertext }
}

/// Open sealed vote details
///
/// Fails with [`Error::DecryptionError`] on a wrong key or corrupted bytes.
pub fn open_details(secret: &ReceiptSecret, sealed: &SealedDetails) -> Result<VoteDetails, Error> {
    let key = secret.aes_key();
    let aead = Aes256Gcm::new(GenericArray::from_slice(&key));

    let plaintext = aead
        .decrypt(
            GenericArray::from_slice(&sealed.nonce),
            sealed.ciphertext.as_slice(),
        )
        .map_err(|_| Error::DecryptionError)?;

    serde_json::from_slice(&plaintext).map_err(|_| Error::DecryptionError)
}

/// Open a sealed blob in its textual form; `None` or empty input is an
/// explicit no-op, not an error.
pub fn open_optional(
    secret: &ReceiptSecret,
    sealed: Option<&str>,
) -> Result<Option<VoteDetails>, Error> {
    match sealed {
        None => Ok(None),
        Some("") => Ok(None),
        Some(s) => {
            let sealed: SealedDetails = s.parse()?;
            Ok(Some(open_details(secret, &sealed)?))
        }
    }
}

fn hkdf_sha256(master: &[u8]) -> [u8; 32] {
    let h = Hkdf::<Sha256>::new(None, master);
    let mut out = [0u8; 32];
    h.expand(&[], &mut out).unwrap();
    out
}

#[cfg(test)]
mod tests {

    use super::*;

    fn some_details() -> VoteDetails {
        VoteDetails {
            candidate_id: Uuid::new_v4(),
            cast_at: Utc::now(),
            session_id: Uuid::new_v4(),
        }
    }

    #[test]
    fn test_receipt_hash_salting() {
        let voter = "voter-1";
        let election = Uuid::new_v4();
        let candidate = Uuid::new_v4();

        let first = derive_receipt_hash(voter, &election, &candidate);
        let second = derive_receipt_hash(voter, &election, &candidate);

        // Identical logical inputs must still produce distinct tokens
        assert_ne!(first, second);
    }

    #[test]
    fn test_receipt_hash_string_round_trip() {
        let hash = derive_receipt_hash("voter-1", &Uuid::new_v4(), &Uuid::new_v4());

        let stringed = hash.to_string();
        assert!(stringed.starts_with(RECEIPT_HASH_PREFIX));
        assert_eq!(stringed.len(), RECEIPT_HASH_PREFIX.len() + 64);

        let from_string = ReceiptHash::from_str(&stringed).unwrap();
        assert_eq!(hash, from_string);
    }

    #[test]
    fn test_receipt_hash_malformed() {
        let hash = derive_receipt_hash("voter-1", &Uuid::new_v4(), &Uuid::new_v4());
        let stringed = hash.to_string();

        // Missing prefix
        assert!(ReceiptHash::from_str(stringed.trim_start_matches(RECEIPT_HASH_PREFIX)).is_err());

        // Bad hex
        let mangled = format!("{}zz{}", RECEIPT_HASH_PREFIX, &stringed[7..]);
        assert!(ReceiptHash::from_str(&mangled).is_err());

        // Wrong length
        let truncated = &stringed[..stringed.len() - 2];
        assert!(ReceiptHash::from_str(truncated).is_err());
    }

    #[test]
    fn test_seal_open_round_trip() {
        let secret = ReceiptSecret::generate();
        let details = some_details();

        let sealed = seal_details(&secret, &details);
        let opened = open_details(&secret, &sealed).unwrap();

        assert_eq!(details, opened);
    }

    #[test]
    fn test_open_with_wrong_secret() {
        let secret = ReceiptSecret::generate();
        let sealed = seal_details(&secret, &some_details());

        let wrong = ReceiptSecret::generate();
        assert!(matches!(
            open_details(&wrong, &sealed),
            Err(Error::DecryptionError)
        ));
    }

    #[test]
    fn test_open_tampered_ciphertext() {
        let secret = ReceiptSecret::generate();
        let sealed = seal_details(&secret, &some_details());

        let mut stringed = sealed.to_string();
        // Flip a ciphertext nibble
        let flipped = if stringed.ends_with('0') { '1' } else { '0' };
        stringed.pop();
        stringed.push(flipped);

        let tampered: SealedDetails = stringed.parse().unwrap();
        assert!(matches!(
            open_details(&secret, &tampered),
            Err(Error::DecryptionError)
        ));
    }

    #[test]
    fn test_sealed_details_malformed() {
        // No delimiter
        assert!(SealedDetails::from_str("deadbeef").is_err());

        // Bad hex on either side
        assert!(SealedDetails::from_str("zz:deadbeef").is_err());
        assert!(SealedDetails::from_str("000102030405060708090a0b:zz").is_err());

        // Nonce of the wrong length
        assert!(SealedDetails::from_str("0001:deadbeef").is_err());
    }

    #[test]
    fn test_open_optional_empty_input() {
        let secret = ReceiptSecret::generate();

        assert!(open_optional(&secret, None).unwrap().is_none());
        assert!(open_optional(&secret, Some("")).unwrap().is_none());

        let details = some_details();
        let sealed = seal_details(&secret, &details).to_string();
        let opened = open_optional(&secret, Some(&sealed)).unwrap();
        assert_eq!(opened, Some(details));
    }

    #[test]
    fn test_secret_from_hex() {
        let secret = ReceiptSecret::generate();
        let restored = ReceiptSecret::from_hex(&hex::encode(&secret.0)).unwrap();
        assert_eq!(secret.0, restored.0);

        assert!(ReceiptSecret::from_hex("deadbeef").is_err());
        assert!(ReceiptSecret::from_hex("not hex at all").is_err());
    }

    #[test]
    fn test_secret_debug_does_not_leak() {
        let secret = ReceiptSecret::generate();
        let debugged = format!("{:?}", secret);
        assert!(!debugged.contains(&hex::encode(&secret.0)));
    }
}
