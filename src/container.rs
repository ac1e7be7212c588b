use crate::error::{Result, SbwtError};
use crate::header::{CodecId, ContainerHeader, FLAG_TAG, TAG_SIZE};
use std::fs::File;
use std::io::{BufReader, BufWriter, ErrorKind, Read, Write};
use std::path::Path;

/// One compressed block: header, optional integrity tag, encoded payload
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Container {
    pub header: ContainerHeader,
    pub tag: Option<[u8; TAG_SIZE]>,
    pub payload: Vec<u8>,
}

impl Container {
    /// Build a container, keeping header flags and lengths consistent
    pub fn new(
        codec: CodecId,
        original_length: u32,
        primary_index: u32,
        tag: Option<[u8; TAG_SIZE]>,
        payload: Vec<u8>,
    ) -> Result<Self> {
        let payload_length = u32::try_from(payload.len()).map_err(|_| {
            SbwtError::InvalidFormat(format!("Payload of {} bytes too large", payload.len()))
        })?;
        let mut header = ContainerHeader::new(codec, original_length, primary_index, payload_length);
        if tag.is_some() {
            header.flags |= FLAG_TAG;
        }
        Ok(Self {
            header,
            tag,
            payload,
        })
    }

    pub fn codec(&self) -> CodecId {
        self.header.codec
    }

    pub fn original_length(&self) -> usize {
        self.header.original_length as usize
    }

    /// Total serialized size in bytes
    pub fn encoded_len(&self) -> usize {
        ContainerHeader::SIZE + self.header.body_len()
    }

    pub fn to_bytes(&self) -> Vec<u8> {
        let mut buf = Vec::with_capacity(self.encoded_len());
        buf.extend_from_slice(&self.header.to_bytes());
        if let Some(tag) = &self.tag {
            buf.extend_from_slice(tag);
        }
        buf.extend_from_slice(&self.payload);
        buf
    }

    /// Parse one container that must span all of `data`
    pub fn from_bytes(data: &[u8]) -> Result<Self> {
        let (container, consumed) = Self::parse_prefix(data)?;
        if consumed != data.len() {
            return Err(SbwtError::InvalidFormat(format!(
                "{} trailing bytes after container",
                data.len() - consumed
            )));
        }
        Ok(container)
    }

    /// Parse the container at the front of `data`, returning it and the
    /// number of bytes consumed
    pub fn parse_prefix(data: &[u8]) -> Result<(Self, usize)> {
        let header = ContainerHeader::from_bytes(data)?;
        let end = ContainerHeader::SIZE + header.body_len();
        let body = data
            .get(ContainerHeader::SIZE..end)
            .ok_or_else(|| SbwtError::InvalidFormat("Truncated container body".into()))?;
        Ok((Self::from_parts(header, body), end))
    }

    /// Read the next container from a stream; `None` at a clean end of stream
    pub fn read_from<R: Read>(reader: &mut R) -> Result<Option<Self>> {
        let mut header_bytes = [0u8; ContainerHeader::SIZE];
        let mut filled = 0;
        while filled < header_bytes.len() {
            match reader.read(&mut header_bytes[filled..]) {
                Ok(0) => break,
                Ok(n) => filled += n,
                Err(e) if e.kind() == ErrorKind::Interrupted => continue,
                Err(e) => return Err(e.into()),
            }
        }
        if filled == 0 {
            return Ok(None);
        }
        if filled < header_bytes.len() {
            return Err(SbwtError::InvalidFormat("Truncated container header".into()));
        }

        let header = ContainerHeader::from_bytes(&header_bytes)?;
        // Grow with the bytes actually present, not the length the header claims
        let body_len = header.body_len();
        let mut body = Vec::new();
        reader.by_ref().take(body_len as u64).read_to_end(&mut body)?;
        if body.len() < body_len {
            return Err(SbwtError::InvalidFormat("Truncated container body".into()));
        }
        Ok(Some(Self::from_parts(header, &body)))
    }

    pub fn write_to<W: Write>(&self, writer: &mut W) -> Result<()> {
        writer.write_all(&self.header.to_bytes())?;
        if let Some(tag) = &self.tag {
            writer.write_all(tag)?;
        }
        writer.write_all(&self.payload)?;
        Ok(())
    }

    /// Split a body of exactly `header.body_len()` bytes
    fn from_parts(header: ContainerHeader, body: &[u8]) -> Self {
        let (tag, payload) = if header.has_tag() {
            let mut tag = [0u8; TAG_SIZE];
            tag.copy_from_slice(&body[..TAG_SIZE]);
            (Some(tag), &body[TAG_SIZE..])
        } else {
            (None, body)
        };
        Self {
            header,
            tag,
            payload: payload.to_vec(),
        }
    }
}

/// Parse an in-memory archive: one or more containers back to back
pub fn parse_archive(data: &[u8]) -> Result<Vec<Container>> {
    if data.is_empty() {
        return Err(SbwtError::InvalidFormat("Empty archive".into()));
    }
    let mut containers = Vec::new();
    let mut offset = 0;
    while offset < data.len() {
        let (container, consumed) = Container::parse_prefix(&data[offset..])?;
        containers.push(container);
        offset += consumed;
    }
    Ok(containers)
}

/// Read an archive file from disk
pub fn read_archive(path: &Path) -> Result<Vec<Container>> {
    let file = File::open(path)?;
    let mut reader = BufReader::new(file);

    let mut containers = Vec::new();
    while let Some(container) = Container::read_from(&mut reader)? {
        containers.push(container);
    }
    if containers.is_empty() {
        return Err(SbwtError::InvalidFormat("Empty archive".into()));
    }
    Ok(containers)
}

/// Write an archive file to disk (creates new file or overwrites)
pub fn write_archive(path: &Path, containers: &[Container]) -> Result<()> {
    let file = File::create(path)?;
    let mut writer = BufWriter::new(file);
    for container in containers {
        container.write_to(&mut writer)?;
    }
    writer.flush()?;
    Ok(())
}
