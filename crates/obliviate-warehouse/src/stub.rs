use crate::api::Http;
use async_trait::async_trait;
use std::collections::HashMap;
use std::sync::Mutex;

/// Canned provider: answers the paths it knows, fails every other call, and remembers what
/// was asked of it.
#[derive(Default)]
pub(crate) struct StubHttp {
    bodies: HashMap<String, String>,
    requested: Mutex<Vec<String>>,
}

impl StubHttp {
    pub(crate) fn new() -> Self {
        Self::default()
    }

    pub(crate) fn with(mut self, path: &str, body: &str) -> Self {
        self.bodies.insert(path.to_string(), body.to_string());
        self
    }

    pub(crate) fn requested(&self) -> Vec<String> {
        self.requested.lock().expect("requested paths").clone()
    }
}

#[async_trait]
impl Http for StubHttp {
    async fn get(&self, path: &str) -> Option<String> {
        self.requested
            .lock()
            .expect("requested paths")
            .push(path.to_string());
        self.bodies.get(path).cloned()
    }
}
