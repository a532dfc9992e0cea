use crate::error::TextureError;

/// Container family, identified by magic bytes.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
#[non_exhaustive]
pub enum TextureFormat {
    /// PlayStation Portable GIM.
    Gim,
    /// GameCube / Wii GVR.
    Gvr,
}

impl TextureFormat {
    pub fn extension(self) -> &'static str {
        match self {
            TextureFormat::Gim => "gim",
            TextureFormat::Gvr => "gvr",
        }
    }
}

/// Identify the container by its magic bytes. Nothing else is validated.
pub fn probe(data: &[u8]) -> Option<TextureFormat> {
    if is_gim(data) {
        Some(TextureFormat::Gim)
    } else if is_gvr(data) {
        Some(TextureFormat::Gvr)
    } else {
        None
    }
}

/// True if `data` starts with the GIM preamble.
pub fn is_gim(data: &[u8]) -> bool {
    data.len() >= 16 && data.starts_with(b"MIG.00.1PSP\0")
}

/// True if `data` starts with `GVRT`, or a global index block followed by `GVRT`.
pub fn is_gvr(data: &[u8]) -> bool {
    match data.get(..4) {
        Some(b"GVRT") => true,
        Some(b"GBIX" | b"GCIX") => data.get(16..20) == Some(&b"GVRT"[..]),
        _ => false,
    }
}

/// Container header summary, read without decoding pixels.
#[derive(Clone, Debug, PartialEq, Eq)]
#[non_exhaustive]
pub struct TextureInfo {
    pub format: TextureFormat,
    pub width: u32,
    pub height: u32,
    /// Raw pixel/data format id, whether or not a codec exists for it.
    pub data_format: u16,
    /// Palette format id, if the container names one.
    pub palette_format: Option<u16>,
    /// Whether decoding pixels needs a separate palette file.
    pub needs_external_palette: bool,
}

impl TextureInfo {
    /// Parse container headers. GIM files are walked in full so the
    /// end-of-file check applies; no pixel data is touched.
    pub fn from_bytes(data: &[u8]) -> Result<Self, TextureError> {
        match probe(data) {
            #[cfg(feature = "gim")]
            Some(TextureFormat::Gim) => {
                let t = crate::gim::parse(data, None)?;
                Ok(Self {
                    format: TextureFormat::Gim,
                    width: t.width(),
                    height: t.height(),
                    data_format: t.pixel_format_id(),
                    palette_format: t.palette_format_id(),
                    needs_external_palette: false,
                })
            }
            #[cfg(feature = "gvr")]
            Some(TextureFormat::Gvr) => {
                let t = crate::gvr::parse(data, None, None)?;
                let indexed = crate::gvr::format::resolve(t.data_format_id())
                    .is_some_and(|c| c.is_indexed());
                Ok(Self {
                    format: TextureFormat::Gvr,
                    width: t.width(),
                    height: t.height(),
                    data_format: t.data_format_id().into(),
                    palette_format: indexed.then(|| t.pixel_format_id().into()),
                    needs_external_palette: indexed && t.needs_external_palette(),
                })
            }
            #[allow(unreachable_patterns)]
            Some(other) => Err(TextureError::UnsupportedFormat(alloc::format!(
                "{other:?} support is not compiled in"
            ))),
            None => Err(TextureError::UnrecognizedFormat),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn probe_by_magic() {
        let mut gim = alloc::vec![0u8; 16];
        gim[..12].copy_from_slice(b"MIG.00.1PSP\0");
        assert_eq!(probe(&gim), Some(TextureFormat::Gim));
        assert_eq!(probe(&gim[..12]), None);

        assert_eq!(probe(b"GVRT\0\0\0\0"), Some(TextureFormat::Gvr));
        let mut gbix = alloc::vec![0u8; 20];
        gbix[..4].copy_from_slice(b"GCIX");
        gbix[16..20].copy_from_slice(b"GVRT");
        assert_eq!(probe(&gbix), Some(TextureFormat::Gvr));
        gbix[16..20].copy_from_slice(b"XXXX");
        assert_eq!(probe(&gbix), None);

        assert_eq!(probe(b"\x89PNG\r\n\x1a\n"), None);
        assert_eq!(probe(&[]), None);
    }

    #[test]
    fn unrecognized_bytes() {
        assert_eq!(
            TextureInfo::from_bytes(b"not a texture"),
            Err(TextureError::UnrecognizedFormat)
        );
    }
}
