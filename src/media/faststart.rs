//! MP4 top-level box inspection.
//!
//! A file is "fast-start" when its `moov` box (the sample index) appears
//! before its `mdat` box (the sample data), so a player can begin playback
//! from a partial download.

use std::io::{self, SeekFrom};
use std::path::Path;

use tokio::io::{AsyncRead, AsyncReadExt, AsyncSeek, AsyncSeekExt};

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BoxHeader {
    pub kind: [u8; 4],
    pub offset: u64,
    pub size: u64,
}

impl BoxHeader {
    pub fn is(&self, kind: &[u8; 4]) -> bool {
        &self.kind == kind
    }
}

/// Walk the top-level boxes of an ISO-BMFF stream without reading payloads.
pub async fn top_level_boxes<R>(reader: &mut R) -> io::Result<Vec<BoxHeader>>
where
    R: AsyncRead + AsyncSeek + Unpin,
{
    let end = reader.seek(SeekFrom::End(0)).await?;
    let mut boxes = Vec::new();
    let mut offset = 0u64;

    while end - offset >= 8 {
        reader.seek(SeekFrom::Start(offset)).await?;

        let mut header = [0u8; 8];
        reader.read_exact(&mut header).await?;
        let size32 = u32::from_be_bytes([header[0], header[1], header[2], header[3]]);
        let kind = [header[4], header[5], header[6], header[7]];

        let (size, header_len) = match size32 {
            // box runs to end of file
            0 => (end - offset, 8),
            1 => {
                let mut large = [0u8; 8];
                reader.read_exact(&mut large).await?;
                (u64::from_be_bytes(large), 16)
            }
            n => (u64::from(n), 8),
        };

        if size < header_len || size > end - offset {
            return Err(io::Error::new(
                io::ErrorKind::InvalidData,
                format!(
                    "malformed '{}' box at offset {}",
                    String::from_utf8_lossy(&kind),
                    offset
                ),
            ));
        }

        boxes.push(BoxHeader { kind, offset, size });
        offset += size;
    }

    Ok(boxes)
}

/// True when a `moov` box exists and no `mdat` box comes before it.
pub fn moov_precedes_mdat(boxes: &[BoxHeader]) -> bool {
    let moov = boxes.iter().position(|b| b.is(b"moov"));
    let mdat = boxes.iter().position(|b| b.is(b"mdat"));

    match (moov, mdat) {
        (Some(moov), Some(mdat)) => moov < mdat,
        (Some(_), None) => true,
        _ => false,
    }
}

pub async fn is_fast_start(path: &Path) -> io::Result<bool> {
    let mut file = tokio::fs::File::open(path).await?;
    let boxes = top_level_boxes(&mut file).await?;
    Ok(moov_precedes_mdat(&boxes))
}
