//! PCM16LE helpers shared by the binary-frame side of the transport.
//!
//! The control channel (`control.rs`) rides text frames; audio rides binary
//! frames of little-endian 16-bit signed samples with no framing header of
//! its own — the WebSocket message boundary is the frame boundary.

use thiserror::Error;

#[derive(Debug, Error)]
pub enum PcmError {
    #[error("pcm16 buffer length {0} is not 2-byte aligned")]
    Unaligned(usize),
}

pub fn validate_alignment(bytes: &[u8]) -> Result<(), PcmError> {
    if bytes.len() % 2 != 0 {
        return Err(PcmError::Unaligned(bytes.len()));
    }
    Ok(())
}

pub fn samples_to_bytes(samples: &[i16]) -> Vec<u8> {
    let mut out = Vec::with_capacity(samples.len() * 2);
    for sample in samples {
        out.extend_from_slice(&sample.to_le_bytes());
    }
    out
}

pub fn bytes_to_samples(bytes: &[u8]) -> Result<Vec<i16>, PcmError> {
    validate_alignment(bytes)?;
    Ok(bytes
        .chunks_exact(2)
        .map(|pair| i16::from_le_bytes([pair[0], pair[1]]))
        .collect())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_round_trip() {
        let samples: Vec<i16> = vec![0, 1, -1, i16::MAX, i16::MIN, 1234];
        let bytes = samples_to_bytes(&samples);
        let back = bytes_to_samples(&bytes).unwrap();
        assert_eq!(samples, back);
    }

    #[test]
    fn test_unaligned_buffer_rejected() {
        let bytes = vec![0u8, 1, 2];
        assert!(matches!(bytes_to_samples(&bytes), Err(PcmError::Unaligned(3))));
    }

    #[test]
    fn test_empty_buffer_is_valid() {
        assert!(bytes_to_samples(&[]).unwrap().is_empty());
    }
}
