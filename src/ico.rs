use byteorder::{LittleEndian, ReadBytesExt, WriteBytesExt};
use std::io::{self, Error, ErrorKind, Read, Seek, SeekFrom, Write};

use super::pngio::check_square_png;
use super::resize::RenderedBitmap;

/// The length of the ICONDIR header, in bytes:
const ICON_DIR_HEADER_LENGTH: u32 = 6;

/// The length of one ICONDIRENTRY, in bytes:
const ICON_DIR_ENTRY_LENGTH: u32 = 16;

/// Resource type number for icons (as opposed to cursors, which are 2).
const RESOURCE_TYPE_ICON: u16 = 1;

const MIN_EDGE: u32 = 1;
const MAX_EDGE: u32 = 256;

/// One image in an ICO file, stored as PNG data.
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct IconDirEntry {
    edge: u32,
    color_planes: u16,
    bits_per_pixel: u16,
    data: Vec<u8>,
}

impl IconDirEntry {
    /// Creates an entry from a rendered bitmap.  Returns an encoding error if
    /// the bitmap is empty, is not a square PNG of its declared edge length,
    /// or is outside the sizes an ICO directory can describe.
    pub fn from_bitmap(bitmap: RenderedBitmap) -> crate::Result<IconDirEntry> {
        let RenderedBitmap { edge, png } = bitmap;
        if png.is_empty() {
            encoding_error!("bitmap for {}x{} is empty", edge, edge);
        }
        if edge < MIN_EDGE || edge > MAX_EDGE {
            encoding_error!("ICO entries must be between {} and {} pixels \
                             (was {})",
                            MIN_EDGE,
                            MAX_EDGE,
                            edge);
        }
        check_square_png(&png, edge)?;
        Ok(IconDirEntry {
            edge,
            color_planes: 1,
            bits_per_pixel: 32,
            data: png,
        })
    }

    /// Returns the edge length of the image, in pixels.
    pub fn edge(&self) -> u32 {
        self.edge
    }

    /// Returns the PNG data for this entry.
    pub fn data(&self) -> &[u8] {
        &self.data
    }
}

/// The contents of a single ICO file.
#[derive(Clone, Debug, Default)]
pub struct IconDir {
    entries: Vec<IconDirEntry>,
}

impl IconDir {
    /// Builds a directory from rendered bitmaps, keeping their order.
    /// Returns an encoding error if there are no bitmaps or any of them is
    /// malformed.
    pub fn from_bitmaps<I>(bitmaps: I) -> crate::Result<IconDir>
        where I: IntoIterator<Item = RenderedBitmap>
    {
        let entries = bitmaps.into_iter()
            .map(IconDirEntry::from_bitmap)
            .collect::<crate::Result<Vec<_>>>()?;
        if entries.is_empty() {
            encoding_error!("an ICO file needs at least one entry");
        }
        if entries.len() > u16::MAX as usize {
            encoding_error!("too many ICO entries (was {}, but max is {})",
                            entries.len(),
                            u16::MAX);
        }
        Ok(IconDir { entries })
    }

    /// Encodes rendered bitmaps straight into the bytes of an ICO file.
    pub fn encode<I>(bitmaps: I) -> crate::Result<Vec<u8>>
        where I: IntoIterator<Item = RenderedBitmap>
    {
        let dir = IconDir::from_bitmaps(bitmaps)?;
        let mut output = Vec::with_capacity(dir.total_length() as usize);
        dir.write(&mut output)?;
        debug_assert_eq!(output.len(), dir.total_length() as usize);
        Ok(output)
    }

    /// Returns the entries in this directory.
    pub fn entries(&self) -> &[IconDirEntry] {
        &self.entries
    }

    /// Returns the `(size, offset)` of every entry's payload, in directory
    /// order.  Offsets are absolute positions within the encoded file.
    pub fn layout(&self) -> Vec<(u32, u32)> {
        let mut offset = ICON_DIR_HEADER_LENGTH +
                         ICON_DIR_ENTRY_LENGTH * (self.entries.len() as u32);
        let mut spans = Vec::with_capacity(self.entries.len());
        for entry in &self.entries {
            let size = entry.data.len() as u32;
            spans.push((size, offset));
            offset += size;
        }
        spans
    }

    /// Returns the encoded length of the file, in bytes.
    pub fn total_length(&self) -> u32 {
        let payloads: u32 =
            self.entries.iter().map(|entry| entry.data.len() as u32).sum();
        ICON_DIR_HEADER_LENGTH +
        ICON_DIR_ENTRY_LENGTH * (self.entries.len() as u32) + payloads
    }

    /// Reads an ICO file.  Only PNG-encoded icon entries are accepted.
    pub fn read<R: Read + Seek>(mut reader: R) -> io::Result<IconDir> {
        let reserved = reader.read_u16::<LittleEndian>()?;
        if reserved != 0 {
            return Err(invalid_data(format!("invalid reserved field value \
                                             in ICONDIR (was {}, but must \
                                             be 0)",
                                            reserved)));
        }
        let restype = reader.read_u16::<LittleEndian>()?;
        if restype != RESOURCE_TYPE_ICON {
            return Err(invalid_data(format!("invalid resource type ({})",
                                            restype)));
        }
        let num_entries = reader.read_u16::<LittleEndian>()? as usize;
        let mut entries = Vec::<IconDirEntry>::with_capacity(num_entries);
        let mut spans = Vec::<(u32, u32)>::with_capacity(num_entries);
        for _ in 0..num_entries {
            let width = reader.read_u8()?;
            let height = reader.read_u8()?;
            let _num_colors = reader.read_u8()?;
            let _reserved = reader.read_u8()?;
            let color_planes = reader.read_u16::<LittleEndian>()?;
            let bits_per_pixel = reader.read_u16::<LittleEndian>()?;
            let data_size = reader.read_u32::<LittleEndian>()?;
            let data_offset = reader.read_u32::<LittleEndian>()?;
            if width != height {
                return Err(invalid_data(format!("ICO entry is not square \
                                                 ({}x{})",
                                                width,
                                                height)));
            }
            spans.push((data_size, data_offset));
            entries.push(IconDirEntry {
                edge: if width == 0 { 256 } else { u32::from(width) },
                color_planes,
                bits_per_pixel,
                data: Vec::new(),
            });
        }
        for (entry, &(data_size, data_offset)) in entries.iter_mut()
            .zip(spans.iter()) {
            reader.seek(SeekFrom::Start(u64::from(data_offset)))?;
            let mut data = Vec::new();
            reader.by_ref()
                .take(u64::from(data_size))
                .read_to_end(&mut data)?;
            if data.len() != data_size as usize {
                return Err(Error::new(ErrorKind::UnexpectedEof,
                                      "ICO entry data is truncated"));
            }
            entry.data = data;
        }
        Ok(IconDir { entries })
    }

    /// Writes the ICO file.  The directory is laid out first, once every
    /// payload size is known, then the payloads follow in the same order.
    pub fn write<W: Write>(&self, mut writer: W) -> io::Result<()> {
        let layout = self.layout();
        writer.write_u16::<LittleEndian>(0)?; // reserved
        writer.write_u16::<LittleEndian>(RESOURCE_TYPE_ICON)?;
        writer.write_u16::<LittleEndian>(self.entries.len() as u16)?;
        for (entry, &(data_size, data_offset)) in self.entries
            .iter()
            .zip(layout.iter()) {
            // Edges of 256 are stored as zero.
            let edge = if entry.edge >= 256 { 0 } else { entry.edge as u8 };
            writer.write_u8(edge)?;
            writer.write_u8(edge)?;
            writer.write_u8(0)?; // no palette
            writer.write_u8(0)?; // reserved
            writer.write_u16::<LittleEndian>(entry.color_planes)?;
            writer.write_u16::<LittleEndian>(entry.bits_per_pixel)?;
            writer.write_u32::<LittleEndian>(data_size)?;
            writer.write_u32::<LittleEndian>(data_offset)?;
        }
        for entry in &self.entries {
            writer.write_all(&entry.data)?;
        }
        Ok(())
    }
}

fn invalid_data(msg: String) -> Error {
    Error::new(ErrorKind::InvalidData, msg)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::icontype::ICO_SIZES;
    use crate::pngio::blank_png;
    use crate::Error as CrateError;
    use std::io::Cursor;

    fn bitmap(edge: u32) -> RenderedBitmap {
        RenderedBitmap::new(edge, blank_png(edge, edge))
    }

    #[test]
    fn header_and_offsets() {
        let small = bitmap(16);
        let large = bitmap(256);
        let (small_len, large_len) = (small.png.len() as u32,
                                      large.png.len() as u32);
        let data = IconDir::encode(vec![small, large]).expect("encode failed");
        assert_eq!(data.len() as u32, 6 + 2 * 16 + small_len + large_len);
        assert_eq!(&data[0..6], &[0, 0, 1, 0, 2, 0]);
        // First entry.
        assert_eq!(data[6], 16);
        assert_eq!(data[7], 16);
        assert_eq!(&data[10..12], &1u16.to_le_bytes());
        assert_eq!(&data[12..14], &32u16.to_le_bytes());
        assert_eq!(&data[14..18], &small_len.to_le_bytes());
        assert_eq!(&data[18..22], &38u32.to_le_bytes());
        // Second entry, 256 stored as zero.
        assert_eq!(data[22], 0);
        assert_eq!(data[23], 0);
        assert_eq!(&data[30..34], &large_len.to_le_bytes());
        assert_eq!(&data[34..38], &(38 + small_len).to_le_bytes());
    }

    #[test]
    fn read_recovers_payloads() {
        let bitmaps: Vec<RenderedBitmap> =
            ICO_SIZES.iter().map(|&edge| bitmap(edge)).collect();
        let data = IconDir::encode(bitmaps.clone()).expect("encode failed");
        let dir = IconDir::read(Cursor::new(data)).expect("read failed");
        assert_eq!(dir.entries().len(), ICO_SIZES.len());
        for (entry, bitmap) in dir.entries().iter().zip(bitmaps.iter()) {
            assert_eq!(entry.edge(), bitmap.edge);
            assert_eq!(entry.data(), &bitmap.png[..]);
        }
    }

    #[test]
    fn read_rejects_truncated_payload() {
        // One 16x16 entry claiming 0xffffffff bytes at offset 22.
        let mut data = vec![0, 0, 1, 0, 1, 0, 16, 16, 0, 0, 1, 0, 32, 0];
        data.extend_from_slice(&[0xff, 0xff, 0xff, 0xff, 22, 0, 0, 0]);
        data.extend_from_slice(b"tiny");
        let err = IconDir::read(Cursor::new(data)).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::UnexpectedEof);
    }

    #[test]
    fn rejects_empty_set() {
        let result = IconDir::encode(Vec::new());
        assert!(matches!(result, Err(CrateError::Encoding(_))));
    }

    #[test]
    fn rejects_empty_bitmap() {
        let result = IconDir::encode(vec![RenderedBitmap::new(16, Vec::new())]);
        assert!(matches!(result, Err(CrateError::Encoding(_))));
    }

    #[test]
    fn rejects_non_square_bitmap() {
        let result =
            IconDir::encode(vec![RenderedBitmap::new(32, blank_png(32, 16))]);
        assert!(matches!(result, Err(CrateError::Encoding(_))));
    }

    #[test]
    fn rejects_oversized_bitmap() {
        let result = IconDir::encode(vec![bitmap(512)]);
        assert!(matches!(result, Err(CrateError::Encoding(_))));
    }
}
