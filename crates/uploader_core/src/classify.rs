//! IOF XML kind detection and upload payload preparation.

use std::{
    ffi::OsStr,
    fs::File,
    io::{BufReader, Read},
    path::Path,
};

use flate2::{bufread::ZlibEncoder, Compression};
use quick_xml::{events::Event, reader::Reader};
use shared::domain::XmlFileKind;

pub fn has_xml_extension(path: &Path) -> bool {
    path.extension() == Some(OsStr::new("xml"))
}

/// Reads up to the first start element and maps it to a document kind.
pub fn detect_kind(path: &Path) -> std::io::Result<Option<XmlFileKind>> {
    let file = File::open(path)?;
    let mut reader = Reader::from_reader(BufReader::new(file));
    let mut buf = Vec::new();
    loop {
        match reader.read_event_into(&mut buf) {
            Ok(Event::Start(e)) => return Ok(XmlFileKind::from_root_element(e.name().as_ref())),
            Ok(Event::Eof) | Err(_) => return Ok(None),
            Ok(_) => {}
        }
        buf.clear();
    }
}

pub fn compress_file(path: &Path) -> std::io::Result<Vec<u8>> {
    let file = File::open(path)?;
    let mut encoder = ZlibEncoder::new(BufReader::new(file), Compression::fast());
    let mut compressed = Vec::new();
    encoder.read_to_end(&mut compressed)?;
    Ok(compressed)
}
