// lib/src/storage_engine/storage_utils.rs

use bincode::{config, serde::{decode_from_slice, encode_to_vec}};

use models::{PatientId, VitalRecord};

use crate::errors::{ClinicalError, Result};

/// Separates the patient id from the ordering suffix. Never occurs in UTF-8.
const KEY_SEPARATOR: u8 = 0xFF;

/// Helper to serialize a VitalRecord to bytes using bincode.
pub fn serialize_record(record: &VitalRecord) -> Result<Vec<u8>> {
    encode_to_vec(record, config::standard())
        .map_err(|e| ClinicalError::SerializationError(e.to_string()))
}

/// Helper to deserialize bytes to a VitalRecord using bincode.
pub fn deserialize_record(bytes: &[u8]) -> Result<VitalRecord> {
    decode_from_slice(bytes, config::standard())
        .map(|(val, _)| val) // decode_from_slice returns (value, bytes_read)
        .map_err(|e| ClinicalError::SerializationError(e.to_string()))
}

/// Prefix shared by every key of one patient.
pub fn patient_prefix(patient_id: &PatientId) -> Vec<u8> {
    let mut prefix = Vec::with_capacity(patient_id.len() + 1);
    prefix.extend_from_slice(patient_id.as_bytes());
    prefix.push(KEY_SEPARATOR);
    prefix
}

/// `patient ‖ 0xFF ‖ timestamp-nanos (order-preserving) ‖ sequence`, so a
/// reverse prefix scan yields a patient's records newest first and records
/// written within the same nanosecond keep insertion order.
pub fn record_key(record: &VitalRecord, sequence: u64) -> Result<Vec<u8>> {
    let nanos = record.timestamp.timestamp_nanos_opt().ok_or_else(|| {
        ClinicalError::InvalidData(format!("timestamp {} is outside the storable range", record.timestamp))
    })?;
    let ordered = (nanos as u64) ^ (1u64 << 63);

    let mut key = patient_prefix(&record.patient_id);
    key.extend_from_slice(&ordered.to_be_bytes());
    key.extend_from_slice(&sequence.to_be_bytes());
    Ok(key)
}

pub fn encode_count(count: u64) -> Vec<u8> {
    count.to_be_bytes().to_vec()
}

pub fn decode_count(bytes: &[u8]) -> u64 {
    bytes.try_into().map(u64::from_be_bytes).unwrap_or(0)
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{TimeZone, Utc};
    use models::VitalInput;
    use uuid::Uuid;

    fn record_at(pid: &str, secs: i64) -> VitalRecord {
        let input = VitalInput { patient_id: pid.to_string(), ecg_bpm: Some(80.0), ..Default::default() };
        VitalRecord::from_input(input, Uuid::new_v4(), Utc.timestamp_opt(secs, 0).unwrap()).unwrap()
    }

    #[test]
    fn record_survives_bincode() {
        let record = record_at("patient_001", 1_700_000_000);
        let bytes = serialize_record(&record).unwrap();
        assert_eq!(deserialize_record(&bytes).unwrap(), record);
    }

    #[test]
    fn keys_sort_by_time_then_sequence() {
        let early = record_key(&record_at("p", 1_000), 9).unwrap();
        let late = record_key(&record_at("p", 2_000), 1).unwrap();
        let late_second = record_key(&record_at("p", 2_000), 2).unwrap();
        assert!(early < late);
        assert!(late < late_second);
    }

    #[test]
    fn pre_epoch_timestamps_still_sort_first() {
        let before = record_key(&record_at("p", -10), 0).unwrap();
        let after = record_key(&record_at("p", 10), 0).unwrap();
        assert!(before < after);
    }

    #[test]
    fn prefixes_do_not_overlap_between_patients() {
        let key = record_key(&record_at("patient_0011", 5), 0).unwrap();
        assert!(!key.starts_with(&patient_prefix(&PatientId::new("patient_001").unwrap())));
    }

    #[test]
    fn count_codec_tolerates_short_values() {
        assert_eq!(decode_count(&encode_count(1234)), 1234);
        assert_eq!(decode_count(&[1, 2]), 0);
    }
}
