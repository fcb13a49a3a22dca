//! Line reassembly across chunk boundaries
//!
//! Network reads split the body at arbitrary byte offsets, so a line (or a
//! multi-byte character) can straddle two chunks. `LineReassembler` carries
//! the unfinished tail of each chunk over to the next one.

/// Buffers raw chunks and yields complete lines.
#[derive(Debug, Default)]
pub struct LineReassembler {
    /// Text after the last line terminator seen so far
    pending: String,
    /// Trailing bytes of an incomplete UTF-8 sequence
    utf8_tail: Vec<u8>,
}

impl LineReassembler {
    pub fn new() -> Self {
        Self::default()
    }

    /// Feed a text chunk, returning every line it completes.
    ///
    /// Returned lines carry no terminator; a trailing `\r` is removed so
    /// CRLF-framed streams decode the same as LF-framed ones.
    pub fn feed(&mut self, chunk: &str) -> Vec<String> {
        self.pending.push_str(chunk);

        let Some(last_newline) = self.pending.rfind('\n') else {
            return Vec::new();
        };

        let rest = self.pending.split_off(last_newline + 1);
        let complete = std::mem::replace(&mut self.pending, rest);

        complete[..complete.len() - 1]
            .split('\n')
            .map(|line| line.strip_suffix('\r').unwrap_or(line).to_string())
            .collect()
    }

    /// Feed a raw byte chunk, decoding UTF-8 incrementally.
    pub fn feed_bytes(&mut self, chunk: &[u8]) -> Vec<String> {
        let text = self.decode_utf8(chunk);
        self.feed(&text)
    }

    /// Drain whatever is left at end of stream.
    ///
    /// A non-empty pending buffer means the stream ended without a final
    /// terminator; it is returned as one last line.
    pub fn flush(&mut self) -> Vec<String> {
        if !self.utf8_tail.is_empty() {
            let tail = std::mem::take(&mut self.utf8_tail);
            self.pending.push_str(&String::from_utf8_lossy(&tail));
        }

        if self.pending.is_empty() {
            return Vec::new();
        }

        let line = std::mem::take(&mut self.pending);
        let line = line.strip_suffix('\r').map(str::to_string).unwrap_or(line);
        vec![line]
    }

    /// Bytes and characters buffered but not yet returned as a line.
    pub fn pending_len(&self) -> usize {
        self.pending.len() + self.utf8_tail.len()
    }

    /// Decode as much of `chunk` as forms complete characters. An incomplete
    /// sequence at the end is held back; invalid sequences become U+FFFD.
    fn decode_utf8(&mut self, chunk: &[u8]) -> String {
        let mut bytes = std::mem::take(&mut self.utf8_tail);
        bytes.extend_from_slice(chunk);

        let mut out = String::with_capacity(bytes.len());
        let mut rest: &[u8] = &bytes;

        loop {
            match std::str::from_utf8(rest) {
                Ok(valid) => {
                    out.push_str(valid);
                    break;
                }
                Err(err) => {
                    let (valid, after) = rest.split_at(err.valid_up_to());
                    out.push_str(&String::from_utf8_lossy(valid));
                    match err.error_len() {
                        Some(len) => {
                            out.push(char::REPLACEMENT_CHARACTER);
                            rest = &after[len..];
                        }
                        None => {
                            self.utf8_tail = after.to_vec();
                            break;
                        }
                    }
                }
            }
        }

        out
    }
}
