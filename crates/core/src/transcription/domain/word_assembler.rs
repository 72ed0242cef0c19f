use super::transcript::SegmentWord;

/// A decoded token with its timing, in seconds.
///
/// Text is kept as raw bytes: whisper.cpp may split one UTF-8 character
/// across several tokens.
#[derive(Clone, Debug, PartialEq)]
pub struct TimedToken {
    pub bytes: Vec<u8>,
    pub start: f64,
    pub end: f64,
    pub probability: f32,
}

/// Special tokens look like `[_BEG_]`, `[_TT_150]` or `<|endoftext|>`.
pub fn is_special_token(bytes: &[u8]) -> bool {
    let trimmed = match bytes.iter().position(|b| !b.is_ascii_whitespace()) {
        Some(first) => &bytes[first..],
        None => return false,
    };
    trimmed.starts_with(b"[_") || trimmed.starts_with(b"<|")
}

struct PendingWord {
    bytes: Vec<u8>,
    start: f64,
    end: f64,
    probability_sum: f32,
    tokens: usize,
}

impl PendingWord {
    fn finish(self) -> SegmentWord {
        SegmentWord {
            word: String::from_utf8_lossy(&self.bytes).into_owned(),
            start: self.start,
            end: self.end,
            probability: self.probability_sum / self.tokens as f32,
        }
    }
}

/// Groups BPE tokens into words.
///
/// A token starting with whitespace opens a new word; other tokens extend
/// the current one. Word probability is the mean over its tokens.
pub fn assemble_words(tokens: &[TimedToken]) -> Vec<SegmentWord> {
    let mut words = Vec::new();
    let mut current: Option<PendingWord> = None;

    for token in tokens {
        if token.bytes.is_empty() || is_special_token(&token.bytes) {
            continue;
        }

        let starts_word = token.bytes[0].is_ascii_whitespace();
        match current.as_mut() {
            Some(word) if !starts_word => {
                word.bytes.extend_from_slice(&token.bytes);
                word.end = word.end.max(token.end);
                word.probability_sum += token.probability;
                word.tokens += 1;
            }
            _ => {
                if let Some(done) = current.take() {
                    words.push(done.finish());
                }
                current = Some(PendingWord {
                    bytes: token.bytes.clone(),
                    start: token.start,
                    end: token.end,
                    probability_sum: token.probability,
                    tokens: 1,
                });
            }
        }
    }

    if let Some(done) = current {
        words.push(done.finish());
    }

    words.retain(|w| !w.word.trim().is_empty());
    words
}
