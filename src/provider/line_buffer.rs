//! Newline framing for CLI stdout.

/// Accumulates raw stdout bytes and yields complete lines.
///
/// Lines are split on `\n` before UTF-8 decoding so multi-byte characters
/// straddling a read boundary survive intact. A trailing `\r` is stripped.
#[derive(Debug, Default)]
pub struct LineBuffer {
    pending: Vec<u8>,
}

impl LineBuffer {
    pub fn new() -> Self {
        Self::default()
    }

    /// Append bytes and drain every complete line
    pub fn push(&mut self, bytes: &[u8]) -> Vec<String> {
        self.pending.extend_from_slice(bytes);

        let mut lines = Vec::new();
        while let Some(pos) = self.pending.iter().position(|b| *b == b'\n') {
            let raw: Vec<u8> = self.pending.drain(..=pos).collect();
            lines.push(decode(&raw[..raw.len() - 1]));
        }
        lines
    }

    /// Flush whatever is left once the stream closed
    pub fn finish(&mut self) -> Option<String> {
        if self.pending.is_empty() {
            return None;
        }
        let raw = std::mem::take(&mut self.pending);
        Some(decode(&raw))
    }
}

fn decode(raw: &[u8]) -> String {
    let raw = raw.strip_suffix(b"\r").unwrap_or(raw);
    String::from_utf8_lossy(raw).into_owned()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn splits_across_reads() {
        let mut buf = LineBuffer::new();
        assert!(buf.push(b"{\"a\":").is_empty());
        assert_eq!(buf.push(b"1}\n{\"b\""), vec!["{\"a\":1}".to_string()]);
        assert_eq!(buf.push(b":2}\n"), vec!["{\"b\":2}".to_string()]);
        assert!(buf.finish().is_none());
    }

    #[test]
    fn flushes_unterminated_tail() {
        let mut buf = LineBuffer::new();
        assert_eq!(buf.push(b"one\r\ntwo"), vec!["one".to_string()]);
        assert_eq!(buf.finish().as_deref(), Some("two"));
        assert!(buf.finish().is_none());
    }

    #[test]
    fn keeps_split_multibyte_chars() {
        let bytes = "héllo\n".as_bytes();
        let mut buf = LineBuffer::new();
        assert!(buf.push(&bytes[..2]).is_empty());
        assert_eq!(buf.push(&bytes[2..]), vec!["héllo".to_string()]);
    }

    #[test]
    fn empty_lines_are_kept() {
        let mut buf = LineBuffer::new();
        assert_eq!(buf.push(b"\n\n"), vec![String::new(), String::new()]);
    }
}
