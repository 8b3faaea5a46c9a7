use std::io::Read;

use base64::Engine as _;
use flate2::read::ZlibDecoder;
use foundation::color::{ColorParseError, Rgb};

use crate::protocol::ColorsReply;

/// Hex digits per packed colour code.
pub const CODE_WIDTH: usize = 6;

#[derive(Debug, thiserror::Error)]
pub enum DecodeError {
    #[error("colour reply carries neither colours nor a compressed stream")]
    Missing,
    #[error("invalid base64 colour stream: {0}")]
    Base64(#[from] base64::DecodeError),
    #[error("failed to inflate colour stream: {0}")]
    Inflate(#[from] std::io::Error),
    #[error("colour stream length {0} is not a multiple of {}", CODE_WIDTH)]
    Length(usize),
    #[error("bad colour code at index {index}: {source}")]
    Color {
        index: usize,
        #[source]
        source: ColorParseError,
    },
}

/// Per-point colours from a reply, preferring the literal array.
pub fn decode_colors(reply: &ColorsReply) -> Result<Vec<Rgb>, DecodeError> {
    if let Some(codes) = &reply.colors {
        return codes
            .iter()
            .enumerate()
            .map(|(index, code)| {
                Rgb::from_hex(code).map_err(|source| DecodeError::Color { index, source })
            })
            .collect();
    }
    match &reply.compressed_colors {
        Some(stream) => decompress_colors(stream),
        None => Err(DecodeError::Missing),
    }
}

/// base64 -> zlib inflate -> fixed-width hex codes.
pub fn decompress_colors(stream: &str) -> Result<Vec<Rgb>, DecodeError> {
    let bytes = base64::engine::general_purpose::STANDARD.decode(stream.trim())?;
    let mut text = String::new();
    ZlibDecoder::new(bytes.as_slice()).read_to_string(&mut text)?;
    let text = text.trim();
    if text.len() % CODE_WIDTH != 0 {
        return Err(DecodeError::Length(text.len()));
    }
    text.as_bytes()
        .chunks(CODE_WIDTH)
        .enumerate()
        .map(|(index, chunk)| {
            let code = std::str::from_utf8(chunk).map_err(|_| DecodeError::Color {
                index,
                source: ColorParseError::BadDigit(String::from_utf8_lossy(chunk).into_owned()),
            })?;
            Rgb::from_hex(code).map_err(|source| DecodeError::Color { index, source })
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::{DecodeError, decode_colors, decompress_colors};
    use crate::protocol::ColorsReply;
    use base64::Engine as _;
    use flate2::Compression;
    use flate2::write::ZlibEncoder;
    use foundation::color::Rgb;
    use pretty_assertions::assert_eq;
    use std::io::Write;

    fn compress(text: &str) -> String {
        let mut enc = ZlibEncoder::new(Vec::new(), Compression::default());
        enc.write_all(text.as_bytes()).expect("write");
        let bytes = enc.finish().expect("finish");
        base64::engine::general_purpose::STANDARD.encode(bytes)
    }

    #[test]
    fn decompresses_packed_codes() {
        let colors = decompress_colors(&compress("ff0000bdbdbd00ff00")).expect("decode");
        assert_eq!(
            colors,
            vec![Rgb::new(255, 0, 0), Rgb::new(0xbd, 0xbd, 0xbd), Rgb::new(0, 255, 0)]
        );
    }

    #[test]
    fn ragged_stream_is_rejected() {
        let err = decompress_colors(&compress("ff0000bd")).expect_err("ragged");
        assert!(matches!(err, DecodeError::Length(8)));
    }

    #[test]
    fn garbage_base64_is_rejected() {
        assert!(matches!(decompress_colors("***"), Err(DecodeError::Base64(_))));
    }

    #[test]
    fn literal_colors_take_precedence() {
        let reply = ColorsReply {
            colors: Some(vec!["#010203".into()]),
            compressed_colors: Some(compress("ffffff")),
            ..ColorsReply::default()
        };
        assert_eq!(decode_colors(&reply).expect("decode"), vec![Rgb::new(1, 2, 3)]);
    }

    #[test]
    fn bad_literal_reports_index() {
        let reply = ColorsReply {
            colors: Some(vec!["#010203".into(), "nope".into()]),
            ..ColorsReply::default()
        };
        assert!(matches!(decode_colors(&reply), Err(DecodeError::Color { index: 1, .. })));
    }

    #[test]
    fn empty_reply_is_missing() {
        assert!(matches!(decode_colors(&ColorsReply::default()), Err(DecodeError::Missing)));
    }
}
