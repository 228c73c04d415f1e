use super::ObjectStorage;
use crate::{Error, Result};
use async_trait::async_trait;
use std::collections::{HashMap, HashSet};
use std::sync::{Arc, Mutex};

/// In-memory bucket that records every put and can be told to reject keys.
#[derive(Clone, Default)]
pub struct MockStorage {
    objects: Arc<Mutex<HashMap<String, Vec<u8>>>>,
    content_types: Arc<Mutex<HashMap<String, String>>>,
    failing_keys: Arc<Mutex<HashSet<String>>>,
    put_count: Arc<Mutex<usize>>,
}

impl MockStorage {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_failure_for(self, key: impl Into<String>) -> Self {
        self.failing_keys.lock().unwrap().insert(key.into());
        self
    }

    pub fn get_put_count(&self) -> usize {
        *self.put_count.lock().unwrap()
    }

    pub fn get_objects(&self) -> HashMap<String, Vec<u8>> {
        self.objects.lock().unwrap().clone()
    }

    pub fn get_content_type(&self, key: &str) -> Option<String> {
        self.content_types.lock().unwrap().get(key).cloned()
    }
}

#[async_trait]
impl ObjectStorage for MockStorage {
    async fn put_object(&self, key: &str, data: &[u8], content_type: &str) -> Result<String> {
        *self.put_count.lock().unwrap() += 1;

        if self.failing_keys.lock().unwrap().contains(key) {
            return Err(Error::Storage(format!("Mock rejection for {}", key)));
        }

        self.objects
            .lock()
            .unwrap()
            .insert(key.to_string(), data.to_vec());
        self.content_types
            .lock()
            .unwrap()
            .insert(key.to_string(), content_type.to_string());
        Ok(key.to_string())
    }
}
