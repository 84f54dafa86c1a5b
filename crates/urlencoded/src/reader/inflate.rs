use crate::error::BodyError;
use bytes::Bytes;
use flate2::read::{GzDecoder, ZlibDecoder};
use std::io::Read;
use tracing::trace;

/// Content codings a body may be sent with.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum ContentDecoder {
    Identity,
    /// `gzip` and `x-gzip`
    Gzip,
    /// zlib wrapped deflate
    Deflate,
    Br,
    Zstd,
}

impl ContentDecoder {
    /// Selects a decoder for a lower-cased `Content-Encoding` value.
    pub(crate) fn select(encoding: &str) -> Option<Self> {
        match encoding {
            "identity" => Some(Self::Identity),
            "gzip" | "x-gzip" => Some(Self::Gzip),
            "deflate" => Some(Self::Deflate),
            "br" => Some(Self::Br),
            "zstd" => Some(Self::Zstd),
            _ => None,
        }
    }

    pub(crate) fn name(&self) -> &'static str {
        match self {
            ContentDecoder::Identity => "identity",
            ContentDecoder::Gzip => "gzip",
            ContentDecoder::Deflate => "deflate",
            ContentDecoder::Br => "br",
            ContentDecoder::Zstd => "zstd",
        }
    }

    /// Decodes `raw`, failing once the output exceeds `limit` bytes.
    pub(crate) fn decode(self, raw: Bytes, limit: usize) -> Result<Bytes, BodyError> {
        if self == ContentDecoder::Identity {
            return Ok(raw);
        }

        let input = raw.as_ref();
        let decoded = match self {
            ContentDecoder::Identity => Ok(raw.to_vec()),
            ContentDecoder::Gzip => read_limited(GzDecoder::new(input), limit),
            ContentDecoder::Deflate => read_limited(ZlibDecoder::new(input), limit),
            ContentDecoder::Br => read_limited(brotli::Decompressor::new(input, 4096), limit),
            ContentDecoder::Zstd => zstd::stream::read::Decoder::with_buffer(input).and_then(|d| read_limited(d, limit)),
        };

        match decoded {
            Ok(buf) if buf.len() > limit => Err(BodyError::too_large(None, limit)),
            Ok(buf) => {
                trace!(encoding = self.name(), raw = raw.len(), decoded = buf.len(), "inflated body");
                Ok(Bytes::from(buf))
            }
            Err(e) => Err(BodyError::decode(self.name(), e)),
        }
    }
}

// reads one byte past the limit so an oversized output is detectable
fn read_limited<R: Read>(reader: R, limit: usize) -> std::io::Result<Vec<u8>> {
    let mut buf = Vec::new();
    reader.take(limit as u64 + 1).read_to_end(&mut buf)?;
    Ok(buf)
}

#[cfg(test)]
mod tests {
    use super::*;
    use flate2::Compression;
    use flate2::write::{GzEncoder, ZlibEncoder};
    use std::io::Write;

    const BODY: &[u8] = b"name=hello&zip=world";

    fn gzip(data: &[u8]) -> Bytes {
        let mut encoder = GzEncoder::new(Vec::new(), Compression::default());
        encoder.write_all(data).unwrap();
        Bytes::from(encoder.finish().unwrap())
    }

    #[test]
    fn select() {
        assert_eq!(ContentDecoder::select("x-gzip"), Some(ContentDecoder::Gzip));
        assert_eq!(ContentDecoder::select("identity"), Some(ContentDecoder::Identity));
        assert_eq!(ContentDecoder::select("compress"), None);
    }

    #[test]
    fn gzip_roundtrip() {
        let decoded = ContentDecoder::Gzip.decode(gzip(BODY), 1024).unwrap();
        assert_eq!(decoded.as_ref(), BODY);
    }

    #[test]
    fn deflate_and_zstd() {
        let mut encoder = ZlibEncoder::new(Vec::new(), Compression::default());
        encoder.write_all(BODY).unwrap();
        let deflated = Bytes::from(encoder.finish().unwrap());
        assert_eq!(ContentDecoder::Deflate.decode(deflated, 1024).unwrap().as_ref(), BODY);

        let zstd = Bytes::from(zstd::encode_all(BODY, 3).unwrap());
        assert_eq!(ContentDecoder::Zstd.decode(zstd, 1024).unwrap().as_ref(), BODY);
    }

    #[test]
    fn br() {
        let mut compressed = Vec::new();
        {
            let mut writer = brotli::CompressorWriter::new(&mut compressed, 4096, 5, 22);
            writer.write_all(BODY).unwrap();
        }
        assert_eq!(ContentDecoder::Br.decode(Bytes::from(compressed), 1024).unwrap().as_ref(), BODY);
    }

    #[test]
    fn inflated_size_is_limited() {
        let bomb = gzip(&vec![b'a'; 64 * 1024]);
        assert!(bomb.len() < 1024);

        let err = ContentDecoder::Gzip.decode(bomb, 1024).unwrap_err();
        assert_eq!(err.kind(), "entity.too.large");
    }

    #[test]
    fn corrupt_input() {
        let err = ContentDecoder::Gzip.decode(Bytes::from_static(b"not gzip at all"), 1024).unwrap_err();
        assert_eq!(err.kind(), "content.decode.failed");
        assert_eq!(err.status(), http::StatusCode::BAD_REQUEST);
    }
}
