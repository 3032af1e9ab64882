//! Browser-side adapters for session persistence.

use bloom_engine::{KeyValueStore, SessionError, SessionGateway, SessionSummary};
use wasm_bindgen::JsValue;

fn js_error(err: JsValue) -> String {
    err.as_string().unwrap_or_else(|| format!("{:?}", err))
}

/// `window.localStorage`, used to stage sessions while offline or signed out.
pub struct LocalStorageStore {
    storage: web_sys::Storage,
}

impl LocalStorageStore {
    /// None when storage is unavailable (private mode, sandboxed iframe).
    pub fn open() -> Option<Self> {
        let storage = web_sys::window()?.local_storage().ok().flatten()?;
        Some(Self { storage })
    }
}

impl KeyValueStore for LocalStorageStore {
    fn get(&self, key: &str) -> Result<Option<String>, SessionError> {
        self.storage
            .get_item(key)
            .map_err(|e| SessionError::Storage(js_error(e)))
    }

    fn set(&mut self, key: &str, value: &str) -> Result<(), SessionError> {
        self.storage
            .set_item(key, value)
            .map_err(|e| SessionError::Storage(js_error(e)))
    }

    fn remove(&mut self, key: &str) -> Result<(), SessionError> {
        self.storage
            .remove_item(key)
            .map_err(|e| SessionError::Storage(js_error(e)))
    }
}

/// Forwards each summary to a host callback that talks to the hosted backend.
///
/// The callback receives the summary as a JSON string and returns `true` once
/// the insert is queued, `false` when nobody is signed in; throwing means the
/// backend is unreachable.
pub struct CallbackGateway {
    callback: js_sys::Function,
}

impl CallbackGateway {
    pub fn new(callback: js_sys::Function) -> Self {
        Self { callback }
    }
}

impl SessionGateway for CallbackGateway {
    fn save(&mut self, summary: &SessionSummary) -> Result<(), SessionError> {
        let json = serde_json::to_string(summary)?;
        match self.callback.call1(&JsValue::NULL, &JsValue::from_str(&json)) {
            Ok(accepted) if accepted.as_bool() == Some(false) => Err(SessionError::Unauthenticated),
            Ok(_) => Ok(()),
            Err(err) => Err(SessionError::Unreachable(js_error(err))),
        }
    }
}
