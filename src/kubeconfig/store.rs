// src/kubeconfig/store.rs
use std::collections::HashMap;
use std::fs;
use std::path::Path;

use tracing::{debug, info, warn};

use super::types::{ClusterEntry, ContextEntry, KubeConfigDocument, UserEntry};
use crate::error::{Error, Result};

/// Read-only index over a parsed kubeconfig.
///
/// Built once at startup and shared behind an `Arc`; nothing mutates it after
/// [`ConfigStore::load`].
#[derive(Debug, Default)]
pub struct ConfigStore {
    contexts: Vec<ContextEntry>,
    context_index: HashMap<String, usize>,
    clusters: HashMap<String, ClusterEntry>,
    users: HashMap<String, UserEntry>,
    current_context: Option<String>,
}

impl ConfigStore {
    pub fn load(document: &[u8]) -> Result<Self> {
        if document.iter().all(u8::is_ascii_whitespace) {
            return Ok(Self::default());
        }

        // A document that is just `~` or `null` has nothing in it.
        let Some(raw) = serde_yaml::from_slice::<Option<KubeConfigDocument>>(document)? else {
            return Ok(Self::default());
        };
        let mut store = Self {
            current_context: Some(raw.current_context).filter(|c| !c.is_empty()),
            ..Self::default()
        };

        // Duplicate names keep their first occurrence.
        for context in raw.contexts {
            let entry = ContextEntry::from(context);
            if store.context_index.contains_key(&entry.name) {
                debug!(context = %entry.name, "Ignoring duplicate context");
                continue;
            }
            store
                .context_index
                .insert(entry.name.clone(), store.contexts.len());
            store.contexts.push(entry);
        }
        for cluster in raw.clusters {
            let entry = ClusterEntry::from(cluster);
            store.clusters.entry(entry.name.clone()).or_insert(entry);
        }
        for user in raw.users {
            let entry = UserEntry::from(user);
            store.users.entry(entry.name.clone()).or_insert(entry);
        }

        Ok(store)
    }

    /// Loads the kubeconfig at `path`.
    ///
    /// A missing or unreadable file is not an error: it yields `Ok(None)` and
    /// the service runs without contexts. A file that exists but does not
    /// parse is returned as [`Error::Parse`].
    pub fn load_from_file(path: &Path) -> Result<Option<Self>> {
        let bytes = match fs::read(path) {
            Ok(bytes) => bytes,
            Err(e) => {
                warn!(
                    path = %path.display(),
                    error = %e,
                    "Failed to read kubeconfig file, proceeding without kubeconfig"
                );
                return Ok(None);
            }
        };

        let store = Self::load(&bytes)?;
        info!(
            path = %path.display(),
            contexts = store.contexts.len(),
            clusters = store.clusters.len(),
            users = store.users.len(),
            "Loaded kubeconfig"
        );
        Ok(Some(store))
    }

    /// Follows a context's references to its cluster and user.
    pub fn resolve(&self, context_name: &str) -> Result<(&ClusterEntry, &UserEntry)> {
        let context = self
            .context(context_name)
            .ok_or_else(|| Error::not_found("context", context_name))?;
        let cluster = self
            .clusters
            .get(&context.cluster_ref)
            .ok_or_else(|| Error::not_found("cluster", &context.cluster_ref))?;
        let user = self
            .users
            .get(&context.user_ref)
            .ok_or_else(|| Error::not_found("user", &context.user_ref))?;
        Ok((cluster, user))
    }

    pub fn context(&self, name: &str) -> Option<&ContextEntry> {
        self.context_index.get(name).map(|&i| &self.contexts[i])
    }

    /// Contexts in document order.
    pub fn contexts(&self) -> &[ContextEntry] {
        &self.contexts
    }

    pub fn current_context(&self) -> Option<&str> {
        self.current_context.as_deref()
    }

    pub fn is_empty(&self) -> bool {
        self.contexts.is_empty()
    }
}
