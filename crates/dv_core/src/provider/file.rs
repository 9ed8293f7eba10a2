//! Document IO: JSON and the compressed cache format, plus the file-backed
//! provider.
//!
//! Cache layout: 4-byte magic, format version (u32 LE), SHA-256 of the
//! compressed body, then the LZ4 size-prepended, named-MessagePack document.
//! The checksum covers the compressed body, so corruption is caught before
//! decompression runs.

use std::fs;
use std::path::Path;

use lz4_flex::{compress_prepend_size, decompress_size_prepended};
use rmp_serde::{from_slice, to_vec_named};
use sha2::{Digest, Sha256};

use crate::error::ProviderError;
use crate::provider::document::DemoDocument;
use crate::provider::{RoundDataProvider, RoundPayload};

pub const CACHE_MAGIC: [u8; 4] = *b"DVRC";
pub const CACHE_FORMAT_VERSION: u32 = 1;

const HEADER_LEN: usize = 4 + 4 + 32;

/// Serialize a document into the cache byte format.
pub fn encode_document_cache(doc: &DemoDocument) -> Result<Vec<u8>, ProviderError> {
    let body = compress_prepend_size(&to_vec_named(doc)?);
    let checksum = Sha256::digest(&body);

    let mut out = Vec::with_capacity(HEADER_LEN + body.len());
    out.extend_from_slice(&CACHE_MAGIC);
    out.extend_from_slice(&CACHE_FORMAT_VERSION.to_le_bytes());
    out.extend_from_slice(&checksum);
    out.extend_from_slice(&body);
    Ok(out)
}

/// Parse cache bytes back into a document, verifying version and checksum.
pub fn decode_document_cache(bytes: &[u8]) -> Result<DemoDocument, ProviderError> {
    if bytes.len() < HEADER_LEN || bytes[..4] != CACHE_MAGIC {
        return Err(ProviderError::BadMagic);
    }

    let version = u32::from_le_bytes([bytes[4], bytes[5], bytes[6], bytes[7]]);
    if version != CACHE_FORMAT_VERSION {
        return Err(ProviderError::VersionMismatch { found: version, expected: CACHE_FORMAT_VERSION });
    }

    let body = &bytes[HEADER_LEN..];
    let checksum = Sha256::digest(body);
    if checksum.as_slice() != &bytes[8..HEADER_LEN] {
        return Err(ProviderError::ChecksumMismatch);
    }

    let raw = decompress_size_prepended(body).map_err(|_| ProviderError::Decompression)?;
    Ok(from_slice(&raw)?)
}

pub fn save_document_cache<P: AsRef<Path>>(
    path: P,
    doc: &DemoDocument,
) -> Result<(), ProviderError> {
    let bytes = encode_document_cache(doc)?;
    fs::write(&path, bytes)?;
    log::info!("wrote document cache to {}", path.as_ref().display());
    Ok(())
}

pub fn load_document_cache<P: AsRef<Path>>(path: P) -> Result<DemoDocument, ProviderError> {
    let bytes = fs::read(path)?;
    decode_document_cache(&bytes)
}

pub fn save_document_json<P: AsRef<Path>>(
    path: P,
    doc: &DemoDocument,
) -> Result<(), ProviderError> {
    let data = serde_json::to_string_pretty(doc)?;
    fs::write(path, data)?;
    Ok(())
}

pub fn load_document_json<P: AsRef<Path>>(path: P) -> Result<DemoDocument, ProviderError> {
    let data = fs::read_to_string(path)?;
    Ok(serde_json::from_str(&data)?)
}

/// Load a document from either format, sniffing the cache magic.
pub fn load_document<P: AsRef<Path>>(path: P) -> Result<DemoDocument, ProviderError> {
    let bytes = fs::read(&path)?;
    if bytes.len() >= 4 && bytes[..4] == CACHE_MAGIC {
        decode_document_cache(&bytes)
    } else {
        Ok(serde_json::from_slice(&bytes)?)
    }
}

/// Round-data provider over a parsed-demo document loaded from disk.
#[derive(Debug, Clone)]
pub struct FileProvider {
    document: DemoDocument,
    default_stride: u32,
}

impl FileProvider {
    pub fn open<P: AsRef<Path>>(path: P) -> Result<FileProvider, ProviderError> {
        Ok(FileProvider::from_document(load_document(path)?))
    }

    pub fn from_document(document: DemoDocument) -> FileProvider {
        FileProvider { document, default_stride: 1 }
    }

    pub fn with_default_stride(mut self, stride: u32) -> FileProvider {
        self.default_stride = stride.max(1);
        self
    }

    pub fn document(&self) -> &DemoDocument {
        &self.document
    }
}

impl RoundDataProvider for FileProvider {
    fn fetch_round(&self, round_number: u32, stride: u32) -> Result<RoundPayload, ProviderError> {
        let stride = if stride == 0 { self.default_stride } else { stride };
        self.document.slice_round(round_number, stride)
    }
}
