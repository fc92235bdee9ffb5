use byteorder::{BigEndian, ReadBytesExt, WriteBytesExt};
use std::io::{self, Error, ErrorKind, Read, Write};

use super::element::IconElement;
use super::icontype::{IconType, OSType};

/// The first four bytes of an ICNS file:
const ICNS_MAGIC_LITERAL: &[u8; 4] = b"icns";

/// The length of an icon family header, in bytes:
const ICON_FAMILY_HEADER_LENGTH: u32 = 8;

/// A set of icons stored in a single ICNS file.
#[derive(Clone, Debug, Default)]
pub struct IconFamily {
    /// The icon elements stored in the ICNS file.
    pub elements: Vec<IconElement>,
}

impl IconFamily {
    /// Creates a new, empty icon family.
    pub fn new() -> IconFamily {
        IconFamily { elements: Vec::new() }
    }

    /// Builds an icon family from `(tag, png)` pairs, keeping the caller's
    /// order.  Returns an encoding error if there are no entries, if a tag
    /// is not one of the supported PNG icon types, or if a PNG does not have
    /// the dimensions its tag calls for.
    pub fn from_pngs<I>(entries: I) -> crate::Result<IconFamily>
        where I: IntoIterator<Item = (OSType, Vec<u8>)>
    {
        let mut family = IconFamily::new();
        for (ostype, png) in entries {
            let icon_type = match IconType::from_ostype(ostype) {
                Some(icon_type) => icon_type,
                None => encoding_error!("unsupported OSType: {}", ostype),
            };
            family.add_png_with_type(icon_type, png)?;
        }
        if family.is_empty() {
            encoding_error!("an icon family needs at least one element");
        }
        Ok(family)
    }

    /// Encodes `(tag, png)` pairs straight into the bytes of an ICNS file.
    pub fn encode<I>(entries: I) -> crate::Result<Vec<u8>>
        where I: IntoIterator<Item = (OSType, Vec<u8>)>
    {
        let family = IconFamily::from_pngs(entries)?;
        let mut output = Vec::with_capacity(family.total_length() as usize);
        family.write(&mut output)?;
        debug_assert_eq!(output.len(), family.total_length() as usize);
        Ok(output)
    }

    /// Returns true if the icon family contains no elements.
    pub fn is_empty(&self) -> bool {
        self.elements.is_empty()
    }

    /// Appends a PNG image as an element of the given icon type.
    pub fn add_png_with_type(&mut self,
                             icon_type: IconType,
                             png: Vec<u8>)
                             -> crate::Result<()> {
        self.elements
            .push(IconElement::encode_png_with_type(icon_type, png)?);
        Ok(())
    }

    /// Returns the icon types present in the family, in element order.
    pub fn available_icons(&self) -> Vec<IconType> {
        self.elements.iter().filter_map(IconElement::icon_type).collect()
    }

    /// Returns the PNG data stored for the given icon type, if present.
    pub fn png_with_type(&self, icon_type: IconType) -> Option<&[u8]> {
        let ostype = icon_type.ostype();
        self.elements
            .iter()
            .find(|el| el.ostype() == ostype)
            .map(IconElement::data)
    }

    /// Reads an icon family from an ICNS file.
    pub fn read<R: Read>(mut reader: R) -> io::Result<IconFamily> {
        let mut magic = [0u8; 4];
        reader.read_exact(&mut magic)?;
        if magic != *ICNS_MAGIC_LITERAL {
            let msg = "not an icns file (wrong magic literal)";
            return Err(Error::new(ErrorKind::InvalidData, msg));
        }
        let file_length = reader.read_u32::<BigEndian>()?;
        let mut file_position: u32 = ICON_FAMILY_HEADER_LENGTH;
        let mut family = IconFamily::new();
        while file_position < file_length {
            let element = IconElement::read(reader.by_ref())?;
            file_position += element.total_length();
            family.elements.push(element);
        }
        if file_position != file_length {
            let msg = "element lengths overrun the icns file length";
            return Err(Error::new(ErrorKind::InvalidData, msg));
        }
        Ok(family)
    }

    /// Writes the icon family to an ICNS file.
    pub fn write<W: Write>(&self, mut writer: W) -> io::Result<()> {
        writer.write_all(ICNS_MAGIC_LITERAL)?;
        writer.write_u32::<BigEndian>(self.total_length())?;
        for element in &self.elements {
            element.write(writer.by_ref())?;
        }
        Ok(())
    }

    /// Returns the encoded length of the file, in bytes, including the
    /// length of the header.
    pub fn total_length(&self) -> u32 {
        let mut length = ICON_FAMILY_HEADER_LENGTH;
        for element in &self.elements {
            length += element.total_length();
        }
        length
    }
}
