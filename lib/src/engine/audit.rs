// lib/src/engine/audit.rs

use std::fmt::Display;

use sha2::{Digest, Sha256};

use models::VitalRecord;

/// Tamper-evidence digest binding a record's identity, time and heart rate:
/// uppercase hex SHA-256 of `"{id}-{timestamp}-{heart_rate}"`. No secret is
/// involved, so this is not an authenticator.
pub fn fingerprint(record_id: &str, timestamp_iso: &str, heart_rate: impl Display) -> String {
    let input = format!("{}-{}-{}", record_id, timestamp_iso, heart_rate);
    hex::encode_upper(Sha256::digest(input.as_bytes()))
}

pub fn fingerprint_record(record: &VitalRecord) -> String {
    fingerprint(&record.id.to_string(), &record.timestamp_iso(), record.heart_rate())
}

#[cfg(test)]
mod tests {
    use super::*;

    const TS: &str = "2024-01-01T00:00:00.000000+00:00";

    #[test]
    fn matches_known_digest() {
        assert_eq!(
            fingerprint("rec-1", TS, 75.0),
            "6FCDC03AE5017511B53CE89770559BFBB95D26B7AA45DF445790E88E26C78D09"
        );
    }

    #[test]
    fn is_deterministic_uppercase_hex() {
        let a = fingerprint("rec-1", TS, 75);
        let b = fingerprint("rec-1", TS, 75);
        assert_eq!(a, b);
        assert_eq!(a.len(), 64);
        assert!(a.chars().all(|c| c.is_ascii_digit() || ('A'..='F').contains(&c)));
    }

    #[test]
    fn each_input_changes_the_digest() {
        let base = fingerprint("rec-1", TS, 75);
        assert_ne!(base, fingerprint("rec-2", TS, 75));
        assert_ne!(base, fingerprint("rec-1", "2024-01-01T00:00:00.000001+00:00", 75));
        assert_ne!(base, fingerprint("rec-1", TS, 76));
    }
}
