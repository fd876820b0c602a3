//! Simple file-backed [`SessionStore`], the durable analog of origin-scoped browser
//! storage for native shells.

// std
use std::{
	fs::{self, File},
	io::Write,
	path::{Path, PathBuf},
};
// self
use crate::{
	_prelude::*,
	store::{PendingAuthRequest, SessionStore, StoreError},
	token::TokenPair,
};

#[derive(Clone, Debug, Default, Serialize, Deserialize)]
struct Snapshot {
	tokens: Option<TokenPair>,
	pending: Option<PendingAuthRequest>,
	return_url: Option<String>,
}

/// Persists session state to a JSON file after each mutation.
#[derive(Clone, Debug)]
pub struct FileStore {
	path: PathBuf,
	inner: Arc<RwLock<Snapshot>>,
}
impl FileStore {
	/// Opens (or creates) a store at the provided path, eagerly loading existing data.
	pub fn open(path: impl Into<PathBuf>) -> Result<Self, StoreError> {
		let path = path.into();

		Self::ensure_parent_exists(&path)?;

		let snapshot = if path.exists() { Self::load_snapshot(&path)? } else { Snapshot::default() };

		Ok(Self { path, inner: Arc::new(RwLock::new(snapshot)) })
	}

	fn load_snapshot(path: &Path) -> Result<Snapshot, StoreError> {
		let metadata = path.metadata().map_err(|e| StoreError::Backend {
			message: format!("Failed to inspect {}: {e}", path.display()),
		})?;

		if metadata.len() == 0 {
			return Ok(Snapshot::default());
		}

		let bytes = fs::read(path).map_err(|e| StoreError::Backend {
			message: format!("Failed to read {}: {e}", path.display()),
		})?;

		serde_json::from_slice(&bytes).map_err(|e| StoreError::Serialization {
			message: format!("Failed to parse {}: {e}", path.display()),
		})
	}

	fn ensure_parent_exists(path: &Path) -> Result<(), StoreError> {
		if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
			fs::create_dir_all(parent).map_err(|e| StoreError::Backend {
				message: format!("Failed to create store directory {}: {e}", parent.display()),
			})?;
		}

		Ok(())
	}

	fn persist_locked(&self, snapshot: &Snapshot) -> Result<(), StoreError> {
		Self::ensure_parent_exists(&self.path)?;

		let serialized =
			serde_json::to_vec_pretty(snapshot).map_err(|e| StoreError::Serialization {
				message: format!("Failed to serialize store snapshot: {e}"),
			})?;
		let mut tmp_path = self.path.clone();

		tmp_path.set_extension("tmp");

		{
			let mut file = File::create(&tmp_path).map_err(|e| StoreError::Backend {
				message: format!("Failed to create {}: {e}", tmp_path.display()),
			})?;

			file.write_all(&serialized).map_err(|e| StoreError::Backend {
				message: format!("Failed to write {}: {e}", tmp_path.display()),
			})?;
			file.sync_all().map_err(|e| StoreError::Backend {
				message: format!("Failed to sync {}: {e}", tmp_path.display()),
			})?;
		}

		fs::rename(&tmp_path, &self.path).map_err(|e| StoreError::Backend {
			message: format!("Failed to replace {}: {e}", self.path.display()),
		})
	}

	fn mutate<T>(&self, apply: impl FnOnce(&mut Snapshot) -> T) -> Result<T, StoreError> {
		let mut guard = self.inner.write();
		let value = apply(&mut guard);

		self.persist_locked(&guard)?;

		Ok(value)
	}
}
impl SessionStore for FileStore {
	fn load_tokens(&self) -> Result<Option<TokenPair>, StoreError> {
		Ok(self.inner.read().tokens.clone())
	}

	fn save_tokens(&self, tokens: &TokenPair) -> Result<(), StoreError> {
		self.mutate(|snapshot| snapshot.tokens = Some(tokens.clone()))
	}

	fn clear_tokens(&self) -> Result<(), StoreError> {
		self.mutate(|snapshot| snapshot.tokens = None)
	}

	fn save_pending(&self, pending: &PendingAuthRequest) -> Result<(), StoreError> {
		self.mutate(|snapshot| snapshot.pending = Some(pending.clone()))
	}

	fn take_pending(&self) -> Result<Option<PendingAuthRequest>, StoreError> {
		self.mutate(|snapshot| snapshot.pending.take())
	}

	fn save_return_url(&self, url: &str) -> Result<(), StoreError> {
		self.mutate(|snapshot| snapshot.return_url = Some(url.to_owned()))
	}

	fn take_return_url(&self) -> Result<Option<String>, StoreError> {
		self.mutate(|snapshot| snapshot.return_url.take())
	}
}
