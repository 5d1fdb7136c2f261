use super::{Chunks, ChunksError};

const DATA_PREFIX: &[u8] = b"data: ";

/// A type for reading server-sent event payloads from a chunk stream.
///
/// Only `data: ` records are recognized. Records may be split across
/// network reads at any byte, including inside a multi-byte character, so
/// the unparsed input is kept as raw bytes until a full line is present.
pub struct Sse {
    buf: Vec<u8>,
    chunks: Chunks,
}

impl Sse {
    #[inline]
    pub fn new(chunks: Chunks) -> Self {
        Self {
            buf: Vec::new(),
            chunks,
        }
    }

    /// Returns the payload of the next record, or `None` once the stream
    /// is exhausted. An incomplete trailing record is discarded.
    pub async fn next_event(&mut self) -> Result<Option<String>, ChunksError> {
        loop {
            // Drain what is already buffered before reading more.
            if let Some(payload) = self.try_parse_event() {
                return Ok(Some(payload));
            }

            let Some(bytes) = self.chunks.next_chunk().await? else {
                if !self.buf.is_empty() {
                    trace!("dropping {} unterminated bytes", self.buf.len());
                }
                return Ok(None);
            };
            self.buf.extend_from_slice(&bytes);
        }
    }

    fn try_parse_event(&mut self) -> Option<String> {
        loop {
            let Some(start) = find(&self.buf, DATA_PREFIX) else {
                // Comments and other fields: keep only the unterminated tail,
                // it may be the beginning of a `data: ` line.
                if let Some(eol) = self.buf.iter().rposition(|b| *b == b'\n') {
                    self.buf.drain(..=eol);
                }
                return None;
            };

            let payload_start = start + DATA_PREFIX.len();
            let eol = self.buf[payload_start..]
                .iter()
                .position(|b| *b == b'\n')?
                + payload_start;

            let payload = String::from_utf8_lossy(&self.buf[payload_start..eol])
                .trim()
                .to_owned();
            self.buf.drain(..=eol);

            if !payload.is_empty() {
                return Some(payload);
            }
        }
    }
}

#[inline]
fn find(haystack: &[u8], needle: &[u8]) -> Option<usize> {
    haystack
        .windows(needle.len())
        .position(|window| window == needle)
}

#[cfg(test)]
mod tests {
    use bytes::Bytes;

    use super::*;

    fn sse_from(chunks: &[&'static [u8]]) -> Sse {
        let chunks = chunks.iter().copied().map(Bytes::from_static).collect();
        Sse::new(Chunks::from_vec_deque(chunks))
    }

    #[tokio::test]
    async fn test_normal_events() {
        let mut sse = sse_from(&[b"data: hello\n\n", b"data: bye\n\n"]);
        assert_eq!(sse.next_event().await.unwrap().unwrap(), "hello");
        assert_eq!(sse.next_event().await.unwrap().unwrap(), "bye");
        assert_eq!(sse.next_event().await.unwrap(), None);
    }

    #[tokio::test]
    async fn test_split_records() {
        let mut sse =
            sse_from(&[b"da", b"ta:", b" hel", b"lo\n", b"\ndata: [DONE]\n\n"]);
        assert_eq!(sse.next_event().await.unwrap().unwrap(), "hello");
        assert_eq!(sse.next_event().await.unwrap().unwrap(), "[DONE]");
        assert_eq!(sse.next_event().await.unwrap(), None);
    }

    #[tokio::test]
    async fn test_many_records_in_one_read() {
        let mut sse = sse_from(&[b"data: a\n\ndata: b\n\ndata: c\n\n"]);
        assert_eq!(sse.next_event().await.unwrap().unwrap(), "a");
        assert_eq!(sse.next_event().await.unwrap().unwrap(), "b");
        assert_eq!(sse.next_event().await.unwrap().unwrap(), "c");
        assert_eq!(sse.next_event().await.unwrap(), None);
    }

    #[tokio::test]
    async fn test_split_multibyte_character() {
        let text = "data: caf\u{e9}\n\n".as_bytes();
        // Split in the middle of the two-byte `é`.
        let (head, tail) = text.split_at(10);
        let chunks = [Bytes::copy_from_slice(head), Bytes::copy_from_slice(tail)];
        let mut sse = Sse::new(Chunks::from_vec_deque(chunks.into()));
        assert_eq!(sse.next_event().await.unwrap().unwrap(), "caf\u{e9}");
    }

    #[tokio::test]
    async fn test_comments_are_ignored() {
        let mut sse = sse_from(&[
            b": OPENROUTER PROCESSING\n\n",
            b"event: ping\n\n",
            b"data: hello\n\n",
        ]);
        assert_eq!(sse.next_event().await.unwrap().unwrap(), "hello");
        assert_eq!(sse.next_event().await.unwrap(), None);
    }

    #[tokio::test]
    async fn test_incomplete_record_waits_for_newline() {
        let mut sse = sse_from(&[b"data: hello"]);
        assert_eq!(sse.next_event().await.unwrap(), None);

        let mut sse = sse_from(&[b"data: hello", b"\n"]);
        assert_eq!(sse.next_event().await.unwrap().unwrap(), "hello");
    }

    #[tokio::test]
    async fn test_transport_error() {
        let chunks = Chunks::from_results(
            vec![
                Ok(Bytes::from_static(b"data: hello\n\n")),
                Err(ChunksError("connection reset".to_owned())),
            ]
            .into(),
        );
        let mut sse = Sse::new(chunks);
        assert_eq!(sse.next_event().await.unwrap().unwrap(), "hello");
        assert_eq!(
            sse.next_event().await.unwrap_err(),
            ChunksError("connection reset".to_owned())
        );
    }
}
