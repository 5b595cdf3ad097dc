//! Media type detection for the image forwarded to the analysis backend.

const SIGNATURES: &[(&[u8], &str)] = &[
    (&[0xFF, 0xD8, 0xFF], "image/jpeg"),
    (&[0x89, b'P', b'N', b'G', 0x0D, 0x0A, 0x1A, 0x0A], "image/png"),
    (b"GIF87a", "image/gif"),
    (b"GIF89a", "image/gif"),
    (b"BM", "image/bmp"),
];

/// Media type recognized from the leading bytes, if any.
pub fn sniff_image_type(bytes: &[u8]) -> Option<&'static str> {
    if bytes.len() >= 12 && &bytes[..4] == b"RIFF" && &bytes[8..12] == b"WEBP" {
        return Some("image/webp");
    }

    SIGNATURES
        .iter()
        .find(|(magic, _)| bytes.starts_with(magic))
        .map(|(_, media_type)| *media_type)
}

/// Type label sent upstream: sniffed from the bytes, else the declared type.
pub fn upload_media_type(bytes: &[u8], declared: &str) -> String {
    if let Some(sniffed) = sniff_image_type(bytes) {
        return sniffed.to_string();
    }

    match declared.parse::<mime::Mime>() {
        Ok(parsed) if parsed.type_() == mime::IMAGE => {
            if parsed.subtype().as_str() == "jpg" {
                mime::IMAGE_JPEG.to_string()
            } else {
                parsed.essence_str().to_string()
            }
        }
        _ => mime::APPLICATION_OCTET_STREAM.to_string(),
    }
}
