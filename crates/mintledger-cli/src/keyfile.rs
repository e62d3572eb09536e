//! Keypair files.
//!
//! A keypair file is JSON holding the hex public key and the hex 32-byte
//! secret seed. The public key is checked against the seed on load.

use std::fs;
use std::path::Path;

use anyhow::{bail, Context, Result};
use mintledger::Keypair;
use serde::{Deserialize, Serialize};

#[derive(Debug, Serialize, Deserialize)]
struct KeypairFile {
    public_key: String,
    secret_seed: String,
}

/// Load a keypair from `path`.
pub fn load_keypair(path: &Path) -> Result<Keypair> {
    let contents = fs::read_to_string(path)
        .with_context(|| format!("failed to read keypair file {}", path.display()))?;
    let file: KeypairFile = serde_json::from_str(&contents)
        .with_context(|| format!("malformed keypair file {}", path.display()))?;

    let seed: [u8; 32] = hex::decode(&file.secret_seed)
        .context("secret seed is not hex")?
        .try_into()
        .map_err(|_| anyhow::anyhow!("secret seed must be 32 bytes"))?;
    let keypair = Keypair::from_seed(&seed);

    if keypair.principal().to_hex() != file.public_key {
        bail!(
            "public key in {} does not match its secret seed",
            path.display()
        );
    }
    Ok(keypair)
}

/// Write `keypair` to `path`. Refuses to overwrite an existing file.
pub fn save_keypair(path: &Path, keypair: &Keypair) -> Result<()> {
    if path.exists() {
        bail!("refusing to overwrite existing file {}", path.display());
    }
    let file = KeypairFile {
        public_key: keypair.principal().to_hex(),
        secret_seed: hex::encode(keypair.seed()),
    };
    let json = serde_json::to_string_pretty(&file)?;
    fs::write(path, json)
        .with_context(|| format!("failed to write keypair file {}", path.display()))?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_save_then_load() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("id.json");
        let keypair = Keypair::generate();

        save_keypair(&path, &keypair).unwrap();
        let loaded = load_keypair(&path).unwrap();
        assert_eq!(loaded.principal(), keypair.principal());
    }

    #[test]
    fn test_refuses_overwrite() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("id.json");
        save_keypair(&path, &Keypair::generate()).unwrap();
        assert!(save_keypair(&path, &Keypair::generate()).is_err());
    }

    #[test]
    fn test_mismatched_public_key_rejected() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("id.json");
        let json = serde_json::json!({
            "public_key": Keypair::from_seed(&[1; 32]).principal().to_hex(),
            "secret_seed": hex::encode([2u8; 32]),
        });
        fs::write(&path, json.to_string()).unwrap();

        assert!(load_keypair(&path).is_err());
    }

    #[test]
    fn test_missing_file() {
        assert!(load_keypair(Path::new("/nonexistent/path/keypair.json")).is_err());
    }
}
