//! Wire envelope codec.
//!
//! Every unit on the wire is `<decimal length>|<base64 text>`, where the
//! length counts the bytes of the base64 text rather than the decoded
//! payload. Decoding is incremental: the reactor feeds whatever bytes a
//! non-blocking read produced and pulls out complete frames, so a partial
//! frame simply stays buffered until more bytes arrive.

use base64::{Engine, engine::general_purpose::STANDARD};
use thiserror::Error;

/// Separator between the length prefix and the base64 body.
pub const DELIMITER: u8 = b'|';

/// Header bytes tolerated before a missing delimiter counts as malformed.
pub const DEFAULT_MAX_HEADER_LEN: usize = 20;

/// Largest accepted base64 body, in bytes.
pub const DEFAULT_MAX_FRAME_LEN: usize = 16 * 1024 * 1024;

/// Receive buffer capacity kept once the buffer is empty.
const RETAINED_CAPACITY: usize = 16 * 1024;

/// Errors produced while decoding the envelope.
///
/// None of them leaves the decoder in an unusable state: the offending
/// bytes are discarded and decoding can continue with the next frame.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum FrameFormatError {
    /// The length prefix contains something other than ASCII digits.
    #[error("frame length prefix is not a decimal number: {0:?}")]
    NonNumericLength(String),

    /// Too many header bytes arrived without a delimiter.
    #[error("frame header exceeds {max} bytes without a delimiter")]
    HeaderTooLong { max: usize },

    /// The declared body length is above the configured limit.
    #[error("frame of {len} bytes exceeds the {max} byte limit")]
    FrameTooLarge { len: usize, max: usize },

    /// The body is not valid base64.
    #[error("frame body is not valid base64: {0}")]
    InvalidBase64(#[from] base64::DecodeError),
}

/// Encode a payload into one wire envelope.
pub fn encode(payload: &[u8]) -> Vec<u8> {
    let body = STANDARD.encode(payload);
    let mut frame = Vec::with_capacity(body.len() + 12);
    frame.extend_from_slice(body.len().to_string().as_bytes());
    frame.push(DELIMITER);
    frame.extend_from_slice(body.as_bytes());
    frame
}

/// Incremental envelope decoder owning a connection's receive buffer.
#[derive(Debug)]
pub struct FrameDecoder {
    buffer: Vec<u8>,
    /// Bytes of an oversized frame still to be thrown away as they arrive.
    skip: usize,
    max_header_len: usize,
    max_frame_len: usize,
}

impl Default for FrameDecoder {
    fn default() -> Self {
        Self::new()
    }
}

impl FrameDecoder {
    /// Create a decoder with the default limits.
    pub fn new() -> Self {
        Self::with_limits(DEFAULT_MAX_HEADER_LEN, DEFAULT_MAX_FRAME_LEN)
    }

    /// Create a decoder with explicit header and body limits.
    pub fn with_limits(max_header_len: usize, max_frame_len: usize) -> Self {
        Self {
            buffer: Vec::new(),
            skip: 0,
            max_header_len,
            max_frame_len,
        }
    }

    /// Append freshly read bytes to the receive buffer.
    pub fn feed(&mut self, mut bytes: &[u8]) {
        if self.skip > 0 {
            let skipped = self.skip.min(bytes.len());
            self.skip -= skipped;
            bytes = &bytes[skipped..];
        }
        self.buffer.extend_from_slice(bytes);
    }

    /// Number of bytes buffered but not yet consumed by a frame.
    pub fn buffered_len(&self) -> usize {
        self.buffer.len()
    }

    /// Decode the next complete frame.
    ///
    /// Returns `Ok(None)` when the buffer does not hold a complete frame yet.
    /// An empty payload (`0|`) is returned as `Ok(Some(vec![]))`.
    pub fn decode_next(&mut self) -> Result<Option<Vec<u8>>, FrameFormatError> {
        let result = self.decode_frame();
        // Give back the memory of a large frame once it has been consumed.
        if self.buffer.is_empty() && self.buffer.capacity() > RETAINED_CAPACITY {
            self.buffer.shrink_to(RETAINED_CAPACITY);
        }
        result
    }

    fn decode_frame(&mut self) -> Result<Option<Vec<u8>>, FrameFormatError> {
        let Some(header_end) = self.buffer.iter().position(|&b| b == DELIMITER) else {
            if self.buffer.len() > self.max_header_len {
                self.buffer.clear();
                return Err(FrameFormatError::HeaderTooLong {
                    max: self.max_header_len,
                });
            }
            return Ok(None);
        };

        if header_end > self.max_header_len {
            self.buffer.drain(..=header_end);
            return Err(FrameFormatError::HeaderTooLong {
                max: self.max_header_len,
            });
        }

        let Some(len) = parse_length(&self.buffer[..header_end]) else {
            let header = String::from_utf8_lossy(&self.buffer[..header_end]).into_owned();
            self.buffer.drain(..=header_end);
            return Err(FrameFormatError::NonNumericLength(header));
        };

        if len > self.max_frame_len {
            self.buffer.drain(..=header_end);
            let available = len.min(self.buffer.len());
            self.buffer.drain(..available);
            self.skip = len - available;
            return Err(FrameFormatError::FrameTooLarge {
                len,
                max: self.max_frame_len,
            });
        }

        let frame_end = header_end + 1 + len;
        if self.buffer.len() < frame_end {
            return Ok(None);
        }

        let decoded = STANDARD.decode(&self.buffer[header_end + 1..frame_end]);
        self.buffer.drain(..frame_end);
        Ok(Some(decoded?))
    }
}

fn parse_length(header: &[u8]) -> Option<usize> {
    if header.is_empty() || !header.iter().all(u8::is_ascii_digit) {
        return None;
    }
    std::str::from_utf8(header).ok()?.parse().ok()
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    fn decode_all(decoder: &mut FrameDecoder) -> Vec<Result<Vec<u8>, FrameFormatError>> {
        let mut frames = Vec::new();
        loop {
            match decoder.decode_next() {
                Ok(Some(frame)) => frames.push(Ok(frame)),
                Ok(None) => break,
                Err(e) => frames.push(Err(e)),
            }
        }
        frames
    }

    #[test]
    fn test_encode_produces_length_prefixed_base64() {
        // テスト項目: 長さプレフィックス付きの base64 エンベロープが生成される
        // given (前提条件):
        let payload = b"Alice";

        // when (操作):
        let frame = encode(payload);

        // then (期待する結果):
        assert_eq!(frame, b"8|QWxpY2U=".to_vec());
    }

    #[test]
    fn test_empty_payload_is_a_frame() {
        // テスト項目: 長さ 0 のフレームは「データなし」ではなく空フレームとして扱われる
        // given (前提条件):
        let mut decoder = FrameDecoder::new();

        // when (操作):
        let before = decoder.decode_next();
        decoder.feed(&encode(b""));
        let after = decoder.decode_next();

        // then (期待する結果):
        assert_eq!(before, Ok(None));
        assert_eq!(after, Ok(Some(Vec::new())));
    }

    #[test]
    fn test_partial_frame_waits_for_more_bytes() {
        // テスト項目: 途中までのフレームはエラーにならず、残りが届いた時点でデコードされる
        // given (前提条件):
        let frame = encode(b"hello world");
        let (head, tail) = frame.split_at(5);
        let mut decoder = FrameDecoder::new();

        // when (操作):
        decoder.feed(head);
        let first = decoder.decode_next();
        decoder.feed(tail);
        let second = decoder.decode_next();

        // then (期待する結果):
        assert_eq!(first, Ok(None));
        assert_eq!(second, Ok(Some(b"hello world".to_vec())));
        assert_eq!(decoder.buffered_len(), 0);
    }

    #[test]
    fn test_non_numeric_length_is_rejected_and_stream_recovers() {
        // テスト項目: 数値でない長さは FrameFormatError になり、後続フレームは読める
        // given (前提条件):
        let mut decoder = FrameDecoder::new();
        decoder.feed(b"abc|");
        decoder.feed(&encode(b"next"));

        // when (操作):
        let frames = decode_all(&mut decoder);

        // then (期待する結果):
        assert_eq!(
            frames,
            vec![
                Err(FrameFormatError::NonNumericLength("abc".to_string())),
                Ok(b"next".to_vec()),
            ]
        );
    }

    #[test]
    fn test_empty_length_prefix_is_non_numeric() {
        // テスト項目: 長さが空の場合も数値でないとして扱われる
        // given (前提条件):
        let mut decoder = FrameDecoder::new();
        decoder.feed(b"|QQ==");

        // when (操作):
        let result = decoder.decode_next();

        // then (期待する結果):
        assert_eq!(
            result,
            Err(FrameFormatError::NonNumericLength(String::new()))
        );
    }

    #[test]
    fn test_header_without_delimiter_is_bounded() {
        // テスト項目: 区切り文字なしでヘッダが上限を超えるとエラーになりバッファが破棄される
        // given (前提条件):
        let mut decoder = FrameDecoder::with_limits(4, 1024);
        decoder.feed(b"12345");

        // when (操作):
        let result = decoder.decode_next();

        // then (期待する結果):
        assert_eq!(result, Err(FrameFormatError::HeaderTooLong { max: 4 }));
        assert_eq!(decoder.buffered_len(), 0);
    }

    #[test]
    fn test_invalid_base64_consumes_the_frame() {
        // テスト項目: base64 として不正な本文はエラーになり、フレーム全体が消費される
        // given (前提条件):
        let mut decoder = FrameDecoder::new();
        decoder.feed(b"4|!!!!");
        decoder.feed(&encode(b"ok"));

        // when (操作):
        let frames = decode_all(&mut decoder);

        // then (期待する結果):
        assert_eq!(frames.len(), 2);
        assert!(matches!(frames[0], Err(FrameFormatError::InvalidBase64(_))));
        assert_eq!(frames[1], Ok(b"ok".to_vec()));
    }

    #[test]
    fn test_oversized_frame_is_skipped_across_feeds() {
        // テスト項目: 上限を超えるフレームは読み飛ばされ、分割して届いても後続フレームは読める
        // given (前提条件):
        let mut decoder = FrameDecoder::with_limits(20, 8);
        let oversized = encode(&[7u8; 30]);
        let (head, tail) = oversized.split_at(10);

        // when (操作):
        decoder.feed(head);
        let first = decoder.decode_next();
        decoder.feed(tail);
        decoder.feed(&encode(b"hi"));
        let second = decoder.decode_next();

        // then (期待する結果):
        assert_eq!(first, Err(FrameFormatError::FrameTooLarge { len: 40, max: 8 }));
        assert_eq!(second, Ok(Some(b"hi".to_vec())));
    }

    #[test]
    fn test_large_frame_memory_is_released() {
        // テスト項目: 大きなフレームを読み終えて空になった受信バッファは容量を手放す
        // given (前提条件):
        let mut decoder = FrameDecoder::new();
        let payload = vec![0xabu8; 1024 * 1024];
        decoder.feed(&encode(&payload));
        assert!(decoder.buffer.capacity() > RETAINED_CAPACITY);

        // when (操作):
        let frame = decoder.decode_next();

        // then (期待する結果):
        assert_eq!(frame, Ok(Some(payload)));
        assert_eq!(decoder.buffered_len(), 0);
        assert!(decoder.buffer.capacity() <= RETAINED_CAPACITY);
    }

    proptest! {
        #[test]
        fn prop_round_trip(payload in proptest::collection::vec(any::<u8>(), 0..2048)) {
            let mut decoder = FrameDecoder::new();
            decoder.feed(&encode(&payload));
            prop_assert_eq!(decoder.decode_next(), Ok(Some(payload)));
            prop_assert_eq!(decoder.buffered_len(), 0);
        }

        #[test]
        fn prop_byte_by_byte_feed_preserves_order(
            payloads in proptest::collection::vec(proptest::collection::vec(any::<u8>(), 0..64), 1..8)
        ) {
            let mut decoder = FrameDecoder::new();
            let mut decoded = Vec::new();
            for payload in &payloads {
                for byte in encode(payload) {
                    decoder.feed(&[byte]);
                    if let Some(frame) = decoder.decode_next().unwrap() {
                        decoded.push(frame);
                    }
                }
            }
            prop_assert_eq!(decoded, payloads);
        }
    }
}
