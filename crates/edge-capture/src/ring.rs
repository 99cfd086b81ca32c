//! Lock-free SPSC ring buffer carrying raw f32 samples from the `cpal`
//! audio callback thread to the async capture loop. The callback thread
//! must never block or allocate on the hot path; pushes here are wait-free.

use ringbuf::{
    traits::{Consumer, Observer, Producer, Split},
    HeapRb,
};

/// ~10 seconds of 16 kHz mono audio; generous enough that the consumer
/// never starves the producer under normal scheduling jitter.
const DEFAULT_CAPACITY: usize = 160_000;

pub struct AudioProducer {
    inner: ringbuf::HeapProd<f32>,
}

pub struct AudioConsumer {
    inner: ringbuf::HeapCons<f32>,
}

pub fn audio_ring_buffer(capacity: Option<usize>) -> (AudioProducer, AudioConsumer) {
    let cap = capacity.unwrap_or(DEFAULT_CAPACITY);
    let rb = HeapRb::<f32>::new(cap);
    let (prod, cons) = rb.split();
    (AudioProducer { inner: prod }, AudioConsumer { inner: cons })
}

impl AudioProducer {
    /// Push samples, returning the number actually written. A short write
    /// means the buffer was full and the consumer is falling behind; the
    /// caller drops the rest rather than blocking the audio thread.
    pub fn push_slice(&mut self, samples: &[f32]) -> usize {
        self.inner.push_slice(samples)
    }
}

// The ringbuf producer/consumer halves are `!Send` only because `ringbuf`
// can't prove a single owner at the type level; cpal hands the callback
// exactly one thread for its lifetime, so this holds in practice.
unsafe impl Send for AudioProducer {}

impl AudioConsumer {
    pub fn pop_slice(&mut self, buf: &mut [f32]) -> usize {
        self.inner.pop_slice(buf)
    }

    pub fn available(&self) -> usize {
        self.inner.occupied_len()
    }

    pub fn drain_all(&mut self) -> Vec<f32> {
        let n = self.available();
        if n == 0 {
            return Vec::new();
        }
        let mut buf = vec![0.0f32; n];
        let read = self.pop_slice(&mut buf);
        buf.truncate(read);
        buf
    }
}

unsafe impl Send for AudioConsumer {}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_push_pop_round_trip() {
        let (mut prod, mut cons) = audio_ring_buffer(Some(8));
        assert_eq!(prod.push_slice(&[1.0, 2.0, 3.0]), 3);
        let mut buf = [0.0f32; 3];
        assert_eq!(cons.pop_slice(&mut buf), 3);
        assert_eq!(buf, [1.0, 2.0, 3.0]);
    }

    #[test]
    fn test_push_truncates_when_full() {
        let (mut prod, _cons) = audio_ring_buffer(Some(4));
        let written = prod.push_slice(&[1.0, 2.0, 3.0, 4.0, 5.0, 6.0]);
        assert_eq!(written, 4);
    }

    #[test]
    fn test_drain_all_empty() {
        let (_prod, mut cons) = audio_ring_buffer(Some(4));
        assert!(cons.drain_all().is_empty());
    }
}
