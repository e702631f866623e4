use crate::*;
use chrono::{DateTime, Utc};
use image::Luma;
use qrcode::QrCode;
use std::str::FromStr;
use uuid::Uuid;

pub const BARCODE_DIGITS: usize = 13;

const BARCODE_MODULUS: u64 = 10_000_000_000_000;

/// The decodable payload of a transported receipt
#[derive(Serialize, Deserialize, Clone, Debug, PartialEq)]
pub struct ReceiptRecord {
    pub hash: ReceiptHash,
    pub timestamp: DateTime<Utc>,
    pub election_id: Uuid,
}

impl ReceiptRecord {
    pub fn for_vote(vote: &Vote) -> Self {
        ReceiptRecord {
            hash: vote.receipt_hash,
            timestamp: vote.cast_at,
            election_id: vote.election_id,
        }
    }
}

/// Transport formats a receipt can be decoded from
#[derive(Serialize, Deserialize, Copy, Clone, Debug, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum ReceiptFormat {
    Base64,
    Url,
}

impl FromStr for ReceiptFormat {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "base64" => Ok(ReceiptFormat::Base64),
            "url" => Ok(ReceiptFormat::Url),
            other => Err(Error::UnknownReceiptFormat(other.to_owned())),
        }
    }
}

impl std::fmt::Display for ReceiptFormat {
    fn fmt(&self, f: &mut std::fmt::Formatter) -> std::fmt::Result {
        let name = match self {
            ReceiptFormat::Base64 => "base64",
            ReceiptFormat::Url => "url",
        };
        write!(f, "{}", name)
    }
}

pub fn encode_receipt_to_base64(record: &ReceiptRecord) -> String {
    let json =
        serde_json::to_vec(record).expect("voteledger: unexpected error packing receipt record");
    base64::encode(&json)
}

pub fn decode_receipt_from_base64(encoded: &str) -> Result<ReceiptRecord, Error> {
    let bytes = base64::decode(encoded.trim())?;
    Ok(serde_json::from_slice(&bytes)?)
}

/// Encode an arbitrary JSON-serializable structure into a URL-safe string
/// (no `+`, `/` or `=`)
pub fn encode_for_url(value: &serde_json::Value) -> String {
    let json =
        serde_json::to_vec(value).expect("voteledger: unexpected error packing URL payload");
    base64::encode_config(&json, base64::URL_SAFE_NO_PAD)
}

pub fn decode_from_url(encoded: &str) -> Result<serde_json::Value, Error> {
    let bytes = base64::decode_config(encoded, base64::URL_SAFE_NO_PAD)?;
    Ok(serde_json::from_slice(&bytes)?)
}

/// Render the receipt hash as a PNG QR code, returned as a data URI
pub fn generate_receipt_qr(hash: &ReceiptHash) -> Result<String, Error> {
    let code = QrCode::new(hash.to_string().as_bytes())?;
    let img = code.render::<Luma<u8>>().min_dimensions(240, 240).build();

    let mut png = Vec::new();
    let encoder = image::png::PngEncoder::new(&mut png);
    encoder.encode(img.as_raw(), img.width(), img.height(), image::ColorType::L8)?;

    Ok(format!("data:image/png;base64,{}", base64::encode(&png)))
}

/// Compress the receipt hash into a 13-digit numeric string
///
/// Deterministic so voters can re-derive it for human entry. Uniqueness is
/// probabilistic; collisions are tolerated, not prevented.
pub fn encode_to_barcode(hash: &ReceiptHash) -> String {
    let mut word = [0u8; 8];
    word.copy_from_slice(&hash.as_bytes()[..8]);
    format!(
        "{:01$}",
        u64::from_be_bytes(word) % BARCODE_MODULUS,
        BARCODE_DIGITS
    )
}

/// The receipt bundle returned to a voter after a successful cast
///
/// Derived on demand from the committed vote; never persisted, so no stored
/// row links a transport form to the voter's choice.
#[derive(Serialize, Deserialize, Clone, Debug)]
pub struct ReceiptBundle {
    pub hash: ReceiptHash,
    pub base64: String,
    pub qr_code: String,
    pub barcode: String,
}

impl ReceiptBundle {
    pub fn for_vote(vote: &Vote) -> Result<Self, Error> {
        let record = ReceiptRecord::for_vote(vote);
        Ok(ReceiptBundle {
            hash: vote.receipt_hash,
            base64: encode_receipt_to_base64(&record),
            qr_code: generate_receipt_qr(&vote.receipt_hash)?,
            barcode: encode_to_barcode(&vote.receipt_hash),
        })
    }
}

#[cfg(test)]
mod tests {

    use super::*;

    fn some_record() -> ReceiptRecord {
        ReceiptRecord {
            hash: derive_receipt_hash("voter-1", &Uuid::new_v4(), &Uuid::new_v4()),
            timestamp: Utc::now(),
            election_id: Uuid::new_v4(),
        }
    }

    #[test]
    fn test_base64_round_trip() {
        let record = some_record();

        let encoded = encode_receipt_to_base64(&record);
        let decoded = decode_receipt_from_base64(&encoded).unwrap();

        assert_eq!(record.hash, decoded.hash);
        assert_eq!(record.election_id, decoded.election_id);
        // Timestamps decode to an equivalent instant
        assert_eq!(record.timestamp, decoded.timestamp);
    }

    #[test]
    fn test_base64_rejects_garbage() {
        assert!(decode_receipt_from_base64("!!! not base64 !!!").is_err());

        // Valid base64 of something that is not a receipt record
        let blob = base64::encode(b"{\"unrelated\": true}");
        assert!(decode_receipt_from_base64(&blob).is_err());
    }

    #[test]
    fn test_url_round_trip() {
        let value = serde_json::json!({
            "hash": "VOTE-0000",
            "nested": {
                "constituency": "North Ward",
                "turnout": [1, 2, 3],
            },
            "note": "Bürgermeisterwahl — результат 投票",
        });

        let encoded = encode_for_url(&value);
        assert!(!encoded.contains('+'));
        assert!(!encoded.contains('/'));
        assert!(!encoded.contains('='));

        let decoded = decode_from_url(&encoded).unwrap();
        assert_eq!(value, decoded);
    }

    #[test]
    fn test_barcode_deterministic() {
        let hash = derive_receipt_hash("voter-1", &Uuid::new_v4(), &Uuid::new_v4());

        let barcode = encode_to_barcode(&hash);
        assert_eq!(barcode.len(), BARCODE_DIGITS);
        assert!(barcode.chars().all(|c| c.is_ascii_digit()));

        // Repeated calls always agree
        assert_eq!(barcode, encode_to_barcode(&hash));
    }

    #[test]
    fn test_qr_data_uri() {
        let first = derive_receipt_hash("voter-1", &Uuid::new_v4(), &Uuid::new_v4());
        let second = derive_receipt_hash("voter-2", &Uuid::new_v4(), &Uuid::new_v4());

        let first_qr = generate_receipt_qr(&first).unwrap();
        let second_qr = generate_receipt_qr(&second).unwrap();

        assert!(first_qr.starts_with("data:image/png;base64,"));
        assert_ne!(first_qr, second_qr);
    }

    #[test]
    fn test_receipt_format_closed_set() {
        assert_eq!(ReceiptFormat::from_str("base64").unwrap(), ReceiptFormat::Base64);
        assert_eq!(ReceiptFormat::from_str("URL").unwrap(), ReceiptFormat::Url);

        assert!(matches!(
            ReceiptFormat::from_str("carrier-pigeon"),
            Err(Error::UnknownReceiptFormat(_))
        ));
    }
}
