// On-disk artifact store: one self-describing file per key.
//
// Entry layout: `u32` big-endian header length, JSON header, payload bytes.
// Each put publishes the whole entry with a single rename.

use std::io::ErrorKind;
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicU64, Ordering};

use anyhow::{anyhow, bail, Context, Result};
use async_trait::async_trait;
use bytes::Bytes;
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};
use tokio::fs;
use tracing::{debug, warn};

use super::traits::{ArtifactBytes, ArtifactStore};
use crate::catalog::ArtifactKey;
use crate::config::CACHE_NAME;

const HEADER_LEN_BYTES: usize = 4;

#[derive(Debug, Serialize, Deserialize)]
struct EntryHeader {
    key: String,
    content_type: String,
    len: u64,
}

fn encode_entry(key: &ArtifactKey, artifact: &ArtifactBytes) -> Result<Vec<u8>> {
    let header = serde_json::to_vec(&EntryHeader {
        key: key.as_str().to_string(),
        content_type: artifact.content_type.clone(),
        len: artifact.len() as u64,
    })?;
    let header_len = u32::try_from(header.len()).context("entry header too large")?;

    let mut raw = Vec::with_capacity(HEADER_LEN_BYTES + header.len() + artifact.len());
    raw.extend_from_slice(&header_len.to_be_bytes());
    raw.extend_from_slice(&header);
    raw.extend_from_slice(&artifact.data);
    Ok(raw)
}

fn decode_entry(raw: Vec<u8>) -> Result<(EntryHeader, Bytes)> {
    let mut raw = Bytes::from(raw);
    if raw.len() < HEADER_LEN_BYTES {
        bail!("entry truncated: {} bytes", raw.len());
    }
    let prefix = raw.split_to(HEADER_LEN_BYTES);
    let header_len = u32::from_be_bytes([prefix[0], prefix[1], prefix[2], prefix[3]]) as usize;
    if raw.len() < header_len {
        bail!("entry header truncated: want {} have {}", header_len, raw.len());
    }
    let header: EntryHeader = serde_json::from_slice(&raw.split_to(header_len))?;
    if raw.len() as u64 != header.len {
        bail!("entry payload length {} != {}", raw.len(), header.len);
    }
    Ok((header, raw))
}

pub struct DiskStore {
    dir: PathBuf,
    tmp_seq: AtomicU64,
}

impl DiskStore {
    /// Open (creating if needed) the cache directory `CACHE_NAME` under `root`.
    pub fn open(root: &Path) -> Result<Self> {
        let dir = root.join(CACHE_NAME);
        std::fs::create_dir_all(&dir)
            .with_context(|| format!("create cache dir {}", dir.display()))?;
        Ok(Self {
            dir,
            tmp_seq: AtomicU64::new(0),
        })
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    /// Entry path for `key`. File names are the SHA-256 of the key.
    fn entry_path(&self, key: &ArtifactKey) -> PathBuf {
        let digest = hex::encode(Sha256::digest(key.as_str().as_bytes()));
        self.dir.join(format!("{}.entry", digest))
    }

    /// Write `data` next to `dest` and rename it into place.
    async fn write_atomic(&self, dest: &Path, data: &[u8]) -> Result<()> {
        let seq = self.tmp_seq.fetch_add(1, Ordering::Relaxed);
        let tmp = dest.with_extension(format!("{}.tmp", seq));
        fs::write(&tmp, data)
            .await
            .with_context(|| format!("write {}", tmp.display()))?;
        if let Err(e) = fs::rename(&tmp, dest).await {
            let _ = fs::remove_file(&tmp).await;
            return Err(anyhow!("rename {} failed: {}", dest.display(), e));
        }
        Ok(())
    }
}

#[async_trait]
impl ArtifactStore for DiskStore {
    async fn get(&self, key: &ArtifactKey) -> Result<Option<ArtifactBytes>> {
        let path = self.entry_path(key);

        let raw = match fs::read(&path).await {
            Ok(raw) => raw,
            Err(e) if e.kind() == ErrorKind::NotFound => return Ok(None),
            Err(e) => return Err(e).with_context(|| format!("read {}", path.display())),
        };
        let (header, data) =
            decode_entry(raw).with_context(|| format!("decode {}", path.display()))?;
        if header.key != key.as_str() {
            warn!("disk store digest collision: wanted={} found={}", key, header.key);
            return Ok(None);
        }

        Ok(Some(ArtifactBytes::new(data, header.content_type)))
    }

    async fn put(&self, key: &ArtifactKey, artifact: ArtifactBytes) -> Result<()> {
        let raw = encode_entry(key, &artifact)?;
        self.write_atomic(&self.entry_path(key), &raw).await?;

        debug!("disk store put key={} bytes={}", key, artifact.len());
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::catalog::CommodityId;

    #[tokio::test]
    async fn test_disk_store_miss_then_hit() {
        let dir = tempfile::tempdir().unwrap();
        let store = DiskStore::open(dir.path()).unwrap();
        let key = ArtifactKey::for_commodity("http://host/b", &CommodityId::new("noix"));

        assert!(store.get(&key).await.unwrap().is_none());

        store
            .put(&key, ArtifactBytes::new(vec![7u8; 64], "audio/wav"))
            .await
            .unwrap();

        let hit = store.get(&key).await.unwrap().unwrap();
        assert_eq!(hit.len(), 64);
        assert_eq!(hit.content_type, "audio/wav");
    }

    #[test]
    fn test_entry_path_is_stable() {
        let dir = tempfile::tempdir().unwrap();
        let store = DiskStore::open(dir.path()).unwrap();
        let key = ArtifactKey::for_commodity("http://host/b", &CommodityId::new("noix"));

        let a = store.entry_path(&key);
        let b = store.entry_path(&key);
        assert_eq!(a, b);
        assert!(a.starts_with(dir.path().join(CACHE_NAME)));
    }

    #[test]
    fn test_decode_rejects_truncated_entries() {
        let key = ArtifactKey::for_commodity("http://host/b", &CommodityId::new("noix"));
        let raw = encode_entry(&key, &ArtifactBytes::audio(vec![3u8; 32])).unwrap();

        let (header, data) = decode_entry(raw.clone()).unwrap();
        assert_eq!(header.key, key.as_str());
        assert_eq!(data.len(), 32);

        assert!(decode_entry(raw[..raw.len() - 1].to_vec()).is_err());
        assert!(decode_entry(raw[..HEADER_LEN_BYTES + 2].to_vec()).is_err());
        assert!(decode_entry(vec![0u8; 2]).is_err());
    }
}
