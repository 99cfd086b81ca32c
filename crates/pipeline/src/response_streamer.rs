//! Consumes incremental text (LLM token fragments, or a single complete
//! agent string) and produces voice-friendly chunks for the TTS bridge,
//! optimising for time-to-first-audio rather than whole-response latency.

use tokio::sync::mpsc;
use tokio_util::sync::CancellationToken;

#[derive(Debug, Clone)]
pub struct ResponseStreamerConfig {
    /// Flush the buffer once it holds this many words without having hit a
    /// sentence terminator yet.
    pub max_words_without_terminator: usize,
    /// Voice-friendly cap applied only to a complete, fully-known response
    /// (the agent path): stop after this many sentences...
    pub cap_sentences: usize,
    /// ...or this many words, whichever comes first.
    pub cap_words: usize,
}

impl Default for ResponseStreamerConfig {
    fn default() -> Self {
        Self { max_words_without_terminator: 20, cap_sentences: 3, cap_words: 50 }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResponseChunk {
    pub text: String,
}

pub struct ResponseStreamer {
    config: ResponseStreamerConfig,
}

impl ResponseStreamer {
    pub fn new(config: ResponseStreamerConfig) -> Self {
        Self { config }
    }

    /// Drains `fragments` (LLM token/word fragments) and sends flushed
    /// chunks to `out`. Stops early if `out` is dropped (the session
    /// cancelled downstream) or if `cancel` fires — in which case any
    /// partially-buffered text is dropped rather than flushed, per the
    /// barge-in contract.
    pub async fn stream_tokens(
        &self,
        mut fragments: mpsc::Receiver<String>,
        out: mpsc::Sender<ResponseChunk>,
        cancel: CancellationToken,
    ) {
        let mut buffer = String::new();

        loop {
            let fragment = tokio::select! {
                biased;
                _ = cancel.cancelled() => return,
                fragment = fragments.recv() => fragment,
            };
            let Some(fragment) = fragment else { break };
            buffer.push_str(&fragment);

            if let Some(flush_at) = self.flush_point(&buffer) {
                let chunk = buffer[..flush_at].trim().to_string();
                buffer = buffer[flush_at..].to_string();
                if !chunk.is_empty() && out.send(ResponseChunk { text: strip_markdown(&chunk) }).await.is_err() {
                    return;
                }
            }
        }

        let remaining = buffer.trim();
        if !remaining.is_empty() {
            let _ = out.send(ResponseChunk { text: strip_markdown(remaining) }).await;
        }
    }

    /// Returns the byte offset to flush the buffer at, if the flush
    /// condition (sentence terminator, or word-count cap) currently holds.
    fn flush_point(&self, buffer: &str) -> Option<usize> {
        if let Some(idx) = last_sentence_terminator_followed_by_boundary(buffer) {
            return Some(idx + 1);
        }
        if buffer.split_whitespace().count() >= self.config.max_words_without_terminator {
            return Some(buffer.len());
        }
        None
    }

    /// Applies the voice-friendly cap to a complete, already-known response
    /// (the agent path). Never used on the token-stream path.
    pub fn cap_for_voice(&self, text: &str) -> String {
        let stripped = strip_markdown(text);
        let mut sentences = Vec::new();
        let mut word_count = 0usize;

        for sentence in split_into_sentences(&stripped) {
            let words_in_sentence = sentence.split_whitespace().count();
            if sentences.len() >= self.config.cap_sentences {
                break;
            }
            if word_count + words_in_sentence > self.config.cap_words && !sentences.is_empty() {
                break;
            }
            word_count += words_in_sentence;
            sentences.push(sentence);
        }

        sentences.join(" ")
    }
}

fn last_sentence_terminator_followed_by_boundary(buffer: &str) -> Option<usize> {
    let chars: Vec<char> = buffer.chars().collect();
    for (i, c) in chars.iter().enumerate() {
        if matches!(c, '.' | '!' | '?') {
            let followed_by_boundary = chars.get(i + 1).map_or(true, |c| c.is_whitespace());
            if followed_by_boundary {
                return Some(i);
            }
        }
    }
    None
}

fn split_into_sentences(text: &str) -> Vec<String> {
    let mut sentences = Vec::new();
    let mut start = 0usize;
    let chars: Vec<char> = text.chars().collect();
    for (i, c) in chars.iter().enumerate() {
        if matches!(c, '.' | '!' | '?') && chars.get(i + 1).map_or(true, |c| c.is_whitespace()) {
            let sentence: String = chars[start..=i].iter().collect();
            let trimmed = sentence.trim();
            if !trimmed.is_empty() {
                sentences.push(trimmed.to_string());
            }
            start = i + 1;
        }
    }
    if start < chars.len() {
        let remainder: String = chars[start..].iter().collect();
        let trimmed = remainder.trim();
        if !trimmed.is_empty() {
            sentences.push(trimmed.to_string());
        }
    }
    sentences
}

fn strip_markdown(text: &str) -> String {
    text.chars()
        .filter(|c| !matches!(c, '*' | '#' | '`'))
        .collect::<String>()
        .lines()
        .map(|line| line.trim_start_matches(['-', '•']).trim())
        .collect::<Vec<_>>()
        .join(" ")
        .split_whitespace()
        .collect::<Vec<_>>()
        .join(" ")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_flush_on_sentence_terminator() {
        let streamer = ResponseStreamer::new(ResponseStreamerConfig::default());
        let (tx, rx) = mpsc::channel(8);
        let (out_tx, mut out_rx) = mpsc::channel(8);

        tx.send("Hello there. ".into()).await.unwrap();
        tx.send("How are you?".into()).await.unwrap();
        drop(tx);

        streamer.stream_tokens(rx, out_tx, CancellationToken::new()).await;

        let first = out_rx.recv().await.unwrap();
        assert_eq!(first.text, "Hello there.");
        let second = out_rx.recv().await.unwrap();
        assert_eq!(second.text, "How are you?");
    }

    #[tokio::test]
    async fn test_flush_on_word_cap_without_terminator() {
        let config = ResponseStreamerConfig { max_words_without_terminator: 3, ..Default::default() };
        let streamer = ResponseStreamer::new(config);
        let (tx, rx) = mpsc::channel(8);
        let (out_tx, mut out_rx) = mpsc::channel(8);

        tx.send("one two three four five".into()).await.unwrap();
        drop(tx);

        streamer.stream_tokens(rx, out_tx, CancellationToken::new()).await;
        let chunk = out_rx.recv().await.unwrap();
        assert_eq!(chunk.text, "one two three four five");
    }

    #[tokio::test]
    async fn test_cancel_drops_buffered_text() {
        let streamer = ResponseStreamer::new(ResponseStreamerConfig::default());
        let (tx, rx) = mpsc::channel(8);
        let (out_tx, mut out_rx) = mpsc::channel(8);
        let cancel = CancellationToken::new();

        tx.send("partial response with no terminator".into()).await.unwrap();
        cancel.cancel();

        streamer.stream_tokens(rx, out_tx, cancel).await;
        assert!(out_rx.recv().await.is_none());
    }

    #[test]
    fn test_cap_for_voice_limits_sentences() {
        let streamer = ResponseStreamer::new(ResponseStreamerConfig { cap_sentences: 2, cap_words: 100, ..Default::default() });
        let text = "One. Two. Three. Four.";
        assert_eq!(streamer.cap_for_voice(text), "One. Two.");
    }

    #[test]
    fn test_cap_for_voice_strips_markdown() {
        let streamer = ResponseStreamer::new(ResponseStreamerConfig::default());
        let text = "**Bold** statement with `code` and # heading.";
        let capped = streamer.cap_for_voice(text);
        assert!(!capped.contains('*'));
        assert!(!capped.contains('#'));
        assert!(!capped.contains('`'));
    }
}
