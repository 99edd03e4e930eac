//! Mock backend for testing.

use async_trait::async_trait;
use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::RwLock;

use crate::backend::{Backend, BackendError, TransformOptions};
use crate::format::BackendId;

/// What the mock does for a given input file.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum MockBehavior {
    /// Write `converted:` followed by the input bytes.
    Succeed,
    /// Fail with a backend error carrying this message.
    Fail(String),
    /// Report success but leave a zero-byte output.
    EmptyOutput,
    /// Never finish.
    Hang,
    /// Report the input as encrypted and accept only this password.
    RequirePassword(String),
    /// Panic inside `transform`.
    Panic,
}

/// A recorded transform call for test assertions.
#[derive(Debug, Clone)]
pub struct RecordedTransform {
    pub input: PathBuf,
    pub output: PathBuf,
    pub password: Option<String>,
}

/// Mock implementation of the Backend trait.
///
/// Behaviour is chosen per input file name, falling back to a default
/// (`Succeed` unless changed).
///
/// # Example
///
/// ```rust,ignore
/// let backend = MockBackend::new();
/// backend.set_behavior("corrupt.txt", MockBehavior::Fail("bad header".into())).await;
/// let backends = BackendSet::uniform(Arc::new(backend));
/// ```
#[derive(Debug)]
pub struct MockBackend {
    id: BackendId,
    behaviors: Arc<RwLock<HashMap<String, MockBehavior>>>,
    default_behavior: Arc<RwLock<MockBehavior>>,
    transforms: Arc<RwLock<Vec<RecordedTransform>>>,
    /// If set, the next transform fails with this error.
    next_error: Arc<RwLock<Option<BackendError>>>,
    delay_ms: Arc<RwLock<u64>>,
    active: AtomicUsize,
    peak: AtomicUsize,
}

impl Default for MockBackend {
    fn default() -> Self {
        Self::new()
    }
}

impl MockBackend {
    pub fn new() -> Self {
        Self::with_id(BackendId::Pandoc)
    }

    pub fn with_id(id: BackendId) -> Self {
        Self {
            id,
            behaviors: Arc::new(RwLock::new(HashMap::new())),
            default_behavior: Arc::new(RwLock::new(MockBehavior::Succeed)),
            transforms: Arc::new(RwLock::new(Vec::new())),
            next_error: Arc::new(RwLock::new(None)),
            delay_ms: Arc::new(RwLock::new(0)),
            active: AtomicUsize::new(0),
            peak: AtomicUsize::new(0),
        }
    }

    /// Sets the behaviour for inputs with this file name.
    pub async fn set_behavior(&self, file_name: &str, behavior: MockBehavior) {
        self.behaviors
            .write()
            .await
            .insert(file_name.to_string(), behavior);
    }

    pub async fn set_default_behavior(&self, behavior: MockBehavior) {
        *self.default_behavior.write().await = behavior;
    }

    /// Configure the next transform to fail with the given error.
    pub async fn set_next_error(&self, error: BackendError) {
        *self.next_error.write().await = Some(error);
    }

    /// Simulated work per transform.
    pub async fn set_delay(&self, delay: Duration) {
        *self.delay_ms.write().await = delay.as_millis() as u64;
    }

    pub async fn recorded_transforms(&self) -> Vec<RecordedTransform> {
        self.transforms.read().await.clone()
    }

    pub async fn transform_count(&self) -> usize {
        self.transforms.read().await.len()
    }

    /// Highest number of transforms that were running at once.
    pub fn peak_concurrency(&self) -> usize {
        self.peak.load(Ordering::SeqCst)
    }

    async fn behavior_for(&self, input: &Path) -> MockBehavior {
        let name = input
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_default();
        match self.behaviors.read().await.get(&name) {
            Some(behavior) => behavior.clone(),
            None => self.default_behavior.read().await.clone(),
        }
    }

    async fn write_converted(input: &Path, output: &Path) -> Result<(), BackendError> {
        let mut bytes = b"converted:".to_vec();
        bytes.extend(tokio::fs::read(input).await?);
        tokio::fs::write(output, bytes).await?;
        Ok(())
    }

    async fn run(
        &self,
        behavior: MockBehavior,
        input: &Path,
        output: &Path,
        options: &TransformOptions,
    ) -> Result<(), BackendError> {
        if let Some(err) = self.next_error.write().await.take() {
            return Err(err);
        }

        let delay = *self.delay_ms.read().await;
        if delay > 0 {
            tokio::time::sleep(Duration::from_millis(delay)).await;
        }

        match behavior {
            MockBehavior::Succeed => Self::write_converted(input, output).await,
            MockBehavior::Fail(reason) => Err(BackendError::failed(reason, None)),
            MockBehavior::EmptyOutput => {
                tokio::fs::write(output, b"").await?;
                Ok(())
            }
            MockBehavior::Hang => {
                std::future::pending::<()>().await;
                Ok(())
            }
            MockBehavior::RequirePassword(expected) => match options.password.as_deref() {
                None => Err(BackendError::PasswordRequired {
                    path: input.to_path_buf(),
                }),
                Some(p) if p == expected => Self::write_converted(input, output).await,
                Some(_) => Err(BackendError::InvalidPassword {
                    path: input.to_path_buf(),
                }),
            },
            MockBehavior::Panic => panic!("mock backend panicked on {}", input.display()),
        }
    }
}

#[async_trait]
impl Backend for MockBackend {
    fn id(&self) -> BackendId {
        self.id
    }

    fn name(&self) -> &str {
        "mock"
    }

    async fn requires_password(&self, input: &Path) -> Result<bool, BackendError> {
        Ok(matches!(
            self.behavior_for(input).await,
            MockBehavior::RequirePassword(_)
        ))
    }

    async fn transform(
        &self,
        input: &Path,
        output: &Path,
        options: &TransformOptions,
    ) -> Result<(), BackendError> {
        self.transforms.write().await.push(RecordedTransform {
            input: input.to_path_buf(),
            output: output.to_path_buf(),
            password: options.password.clone(),
        });

        let now = self.active.fetch_add(1, Ordering::SeqCst) + 1;
        self.peak.fetch_max(now, Ordering::SeqCst);

        let behavior = self.behavior_for(input).await;
        let result = self.run(behavior, input, output, options).await;

        self.active.fetch_sub(1, Ordering::SeqCst);
        result
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[tokio::test]
    async fn test_behaviour_by_file_name() {
        let dir = TempDir::new().unwrap();
        let good = dir.path().join("good.txt");
        let bad = dir.path().join("bad.txt");
        std::fs::write(&good, b"hello").unwrap();
        std::fs::write(&bad, b"oops").unwrap();

        let backend = MockBackend::new();
        backend
            .set_behavior("bad.txt", MockBehavior::Fail("corrupt".into()))
            .await;
        let options = TransformOptions::new(dir.path());

        let out = dir.path().join("good.md");
        backend.transform(&good, &out, &options).await.unwrap();
        assert_eq!(std::fs::read(&out).unwrap(), b"converted:hello");

        let err = backend
            .transform(&bad, &dir.path().join("bad.md"), &options)
            .await
            .unwrap_err();
        assert!(err.to_string().contains("corrupt"));
        assert_eq!(backend.transform_count().await, 2);
    }

    #[tokio::test]
    async fn test_password_behaviour() {
        let dir = TempDir::new().unwrap();
        let input = dir.path().join("locked.zip");
        std::fs::write(&input, b"zip").unwrap();

        let backend = MockBackend::new();
        backend
            .set_behavior("locked.zip", MockBehavior::RequirePassword("pw".into()))
            .await;
        assert!(backend.requires_password(&input).await.unwrap());

        let out = dir.path().join("out.7z");
        let wrong = TransformOptions::new(dir.path()).with_password(Some("nope".into()));
        assert!(matches!(
            backend.transform(&input, &out, &wrong).await,
            Err(BackendError::InvalidPassword { .. })
        ));

        let right = TransformOptions::new(dir.path()).with_password(Some("pw".into()));
        backend.transform(&input, &out, &right).await.unwrap();
        assert!(out.exists());
    }
}
