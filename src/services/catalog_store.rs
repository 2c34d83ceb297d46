use std::fs;
use std::path::{Path, PathBuf};

use serde_json::Value as JsonValue;
use subtle::ConstantTimeEq;

use crate::error::{Error, Result};
use crate::models::vacancy::Vacancy;
use crate::services::catalog_service;

/// Persistent home of the vacancy catalog on the organizer's machine.
pub trait CatalogStore {
    fn load(&self) -> Result<Vec<Vacancy>>;
    fn save(&self, vacancies: &[Vacancy]) -> Result<()>;
}

/// Catalog kept as a JSON array in a single file.
pub struct FileCatalogStore {
    path: PathBuf,
}

impl FileCatalogStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }
}

impl CatalogStore for FileCatalogStore {
    /// A missing or unreadable catalog is treated as empty.
    fn load(&self) -> Result<Vec<Vacancy>> {
        let raw = match fs::read_to_string(&self.path) {
            Ok(raw) => raw,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(Vec::new()),
            Err(e) => return Err(e.into()),
        };
        match serde_json::from_str::<Vec<Vacancy>>(&raw) {
            Ok(vacancies) => Ok(vacancies),
            Err(e) => {
                tracing::warn!(path = %self.path.display(), error = %e, "Ignoring unreadable catalog");
                Ok(Vec::new())
            }
        }
    }

    fn save(&self, vacancies: &[Vacancy]) -> Result<()> {
        ensure_parent(&self.path)?;
        fs::write(&self.path, serde_json::to_string_pretty(vacancies)?)?;
        Ok(())
    }
}

fn ensure_parent(path: &Path) -> Result<()> {
    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        fs::create_dir_all(parent)?;
    }
    Ok(())
}

/// Organizer sign-in flag. This is a convenience gate for the catalog tools and
/// offers no protection against anyone who can edit the flag file.
pub struct AdminSession {
    flag_path: PathBuf,
    passcode: String,
}

impl AdminSession {
    pub fn new(flag_path: impl Into<PathBuf>, passcode: &str) -> Self {
        Self {
            flag_path: flag_path.into(),
            passcode: passcode.to_string(),
        }
    }

    pub fn is_active(&self) -> bool {
        fs::read_to_string(&self.flag_path)
            .map(|flag| flag.trim() == "1")
            .unwrap_or(false)
    }

    /// Returns `false` without changing state when the passcode does not match.
    pub fn activate(&self, passcode: &str) -> Result<bool> {
        let matches: bool = passcode
            .trim()
            .as_bytes()
            .ct_eq(self.passcode.as_bytes())
            .into();
        if !matches {
            return Ok(false);
        }
        ensure_parent(&self.flag_path)?;
        fs::write(&self.flag_path, "1")?;
        Ok(true)
    }

    pub fn deactivate(&self) -> Result<()> {
        match fs::remove_file(&self.flag_path) {
            Ok(()) => Ok(()),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(()),
            Err(e) => Err(e.into()),
        }
    }
}

/// Catalog operations with the store and session injected. Reads are open to
/// everyone; edits need an active organizer session.
pub struct Catalog<S: CatalogStore> {
    store: S,
    session: AdminSession,
}

impl<S: CatalogStore> Catalog<S> {
    pub fn new(store: S, session: AdminSession) -> Self {
        Self { store, session }
    }

    pub fn session(&self) -> &AdminSession {
        &self.session
    }

    pub fn vacancies(&self) -> Result<Vec<Vacancy>> {
        self.store.load()
    }

    pub fn find(&self, id: &str) -> Result<Option<Vacancy>> {
        Ok(self.store.load()?.into_iter().find(|v| v.id == id))
    }

    fn require_admin(&self) -> Result<()> {
        if self.session.is_active() {
            Ok(())
        } else {
            Err(Error::Unauthorized)
        }
    }

    /// Normalizes `raw` and puts it at the top of the catalog.
    pub fn add(&self, raw: &JsonValue) -> Result<Vacancy> {
        self.require_admin()?;
        let vacancy = catalog_service::normalize(raw);
        let mut vacancies = self.store.load()?;
        vacancies.insert(0, vacancy.clone());
        self.store.save(&vacancies)?;
        Ok(vacancy)
    }

    /// Returns whether a vacancy with `id` existed.
    pub fn delete(&self, id: &str) -> Result<bool> {
        self.require_admin()?;
        let mut vacancies = self.store.load()?;
        let before = vacancies.len();
        vacancies.retain(|v| v.id != id);
        let removed = vacancies.len() != before;
        if removed {
            self.store.save(&vacancies)?;
        }
        Ok(removed)
    }

    /// Swaps the whole catalog for an imported one.
    pub fn replace(&self, vacancies: &[Vacancy]) -> Result<()> {
        self.require_admin()?;
        self.store.save(vacancies)
    }
}
