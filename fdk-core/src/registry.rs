//! Driver registry
//!
//! Maps a driver name to the builder that constructs it. Backends register
//! once at start-up; callers then construct drivers by name at runtime.

use parking_lot::Mutex;
use std::collections::HashMap;
use std::sync::Arc;

use crate::{
    config::DriverConfig,
    driver::Driver,
    error::{FdkError, FdkResult},
};

/// Builds a ready-to-use driver from its configuration.
pub type Builder = Arc<dyn Fn(&DriverConfig) -> FdkResult<Box<dyn Driver>> + Send + Sync>;

/// Registry of driver builders, keyed by exact, case-sensitive name.
#[derive(Default)]
pub struct DriverRegistry {
    builders: Mutex<HashMap<String, Builder>>,
}

impl DriverRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register `builder` under `name`.
    ///
    /// # Panics
    ///
    /// Panics if `name` is already registered. Two backends claiming the same
    /// name is a build mistake and the process must not run with it.
    pub fn register<F>(&self, name: &str, builder: F)
    where
        F: Fn(&DriverConfig) -> FdkResult<Box<dyn Driver>> + Send + Sync + 'static,
    {
        if let Err(e) = self.try_register(name, builder) {
            panic!("{e}");
        }
    }

    /// Register `builder` under `name`, reporting a duplicate instead of
    /// panicking.
    pub fn try_register<F>(&self, name: &str, builder: F) -> FdkResult<()>
    where
        F: Fn(&DriverConfig) -> FdkResult<Box<dyn Driver>> + Send + Sync + 'static,
    {
        let mut builders = self.builders.lock();
        if builders.contains_key(name) {
            return Err(FdkError::DuplicateRegistration(name.to_string()));
        }
        builders.insert(name.to_string(), Arc::new(builder));
        drop(builders);

        tracing::info!(driver = name, "registered driver");
        Ok(())
    }

    /// Construct the driver registered as `name`.
    ///
    /// The builder's result is returned untouched.
    pub fn new_driver(&self, name: &str, config: &DriverConfig) -> FdkResult<Box<dyn Driver>> {
        // The lock only covers the lookup; builders may block.
        let builder = self.builders.lock().get(name).cloned();
        let builder = builder.ok_or_else(|| FdkError::UnknownDriver(name.to_string()))?;

        tracing::debug!(driver = name, keys = config.len(), "constructing driver");
        builder(config)
    }

    pub fn contains(&self, name: &str) -> bool {
        self.builders.lock().contains_key(name)
    }

    /// Registered names, sorted.
    pub fn names(&self) -> Vec<String> {
        let mut names: Vec<String> = self.builders.lock().keys().cloned().collect();
        names.sort();
        names
    }
}

impl std::fmt::Debug for DriverRegistry {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("DriverRegistry")
            .field("names", &self.names())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{driver::ByteStream, file::File};
    use async_trait::async_trait;
    use bytes::Bytes;
    use std::sync::atomic::{AtomicUsize, Ordering};

    struct NullDriver {
        tag: &'static str,
    }

    #[async_trait]
    impl Driver for NullDriver {
        async fn exists(&self, _path: &str) -> bool {
            false
        }
        async fn read(&self, path: &str) -> FdkResult<ByteStream> {
            Err(FdkError::Unsupported(format!("{}: read {path}", self.tag)))
        }
        async fn list(&self, path: &str) -> FdkResult<Vec<File>> {
            Err(FdkError::Unsupported(format!("{}: list {path}", self.tag)))
        }
        async fn write(&self, path: &str, _data: Bytes) -> FdkResult<()> {
            Err(FdkError::Unsupported(format!("{}: write {path}", self.tag)))
        }
        async fn update(&self, path: &str, _data: Bytes) -> FdkResult<()> {
            Err(FdkError::Unsupported(format!("{}: update {path}", self.tag)))
        }
        async fn create_dir(&self, path: &str) -> FdkResult<()> {
            Err(FdkError::Unsupported(format!("{}: create_dir {path}", self.tag)))
        }
        async fn delete_dir(&self, path: &str) -> FdkResult<()> {
            Err(FdkError::Unsupported(format!("{}: delete_dir {path}", self.tag)))
        }
        async fn delete(&self, path: &str) -> FdkResult<()> {
            Err(FdkError::Unsupported(format!("{}: delete {path}", self.tag)))
        }
        async fn rename(&self, path: &str, _new_path: &str) -> FdkResult<()> {
            Err(FdkError::Unsupported(format!("{}: rename {path}", self.tag)))
        }
        async fn copy(&self, path: &str, _new_path: &str) -> FdkResult<()> {
            Err(FdkError::Unsupported(format!("{}: copy {path}", self.tag)))
        }
    }

    fn null_builder(
        tag: &'static str,
    ) -> impl Fn(&DriverConfig) -> FdkResult<Box<dyn Driver>> + Send + Sync + 'static {
        move |_: &DriverConfig| Ok(Box::new(NullDriver { tag }) as Box<dyn Driver>)
    }

    fn unsupported_message(err: FdkError) -> String {
        match err {
            FdkError::Unsupported(msg) => msg,
            other => panic!("unexpected error: {other:?}"),
        }
    }

    #[tokio::test]
    async fn test_new_driver_uses_registered_builder() {
        let registry = DriverRegistry::new();
        registry.register("one", null_builder("one"));
        registry.register("two", null_builder("two"));

        let one = registry.new_driver("one", &DriverConfig::new()).unwrap();
        let two = registry.new_driver("two", &DriverConfig::new()).unwrap();

        assert_eq!(unsupported_message(one.delete("x").await.unwrap_err()), "one: delete x");
        assert_eq!(unsupported_message(two.delete("x").await.unwrap_err()), "two: delete x");
    }

    #[test]
    fn test_builder_receives_config() {
        let seen: Arc<Mutex<Option<DriverConfig>>> = Arc::new(Mutex::new(None));
        let registry = DriverRegistry::new();
        let sink = seen.clone();
        registry.register("spy", move |config| {
            *sink.lock() = Some(config.clone());
            Ok(Box::new(NullDriver { tag: "spy" }) as Box<dyn Driver>)
        });

        let config = DriverConfig::new().with("token", "abc");
        registry.new_driver("spy", &config).unwrap();
        assert_eq!(seen.lock().as_ref(), Some(&config));
    }

    #[test]
    fn test_builder_error_returned_verbatim() {
        let registry = DriverRegistry::new();
        registry.register("broken", |_| Err(FdkError::AuthFailed("token revoked".into())));

        match registry.new_driver("broken", &DriverConfig::new()) {
            Err(FdkError::AuthFailed(msg)) => assert_eq!(msg, "token revoked"),
            Err(other) => panic!("unexpected error: {other:?}"),
            Ok(_) => panic!("expected builder error"),
        }
    }

    #[test]
    fn test_unknown_driver_never_invokes_builder() {
        let calls = Arc::new(AtomicUsize::new(0));
        let registry = DriverRegistry::new();
        let counter = calls.clone();
        registry.register("known", move |_| {
            counter.fetch_add(1, Ordering::SeqCst);
            Ok(Box::new(NullDriver { tag: "known" }) as Box<dyn Driver>)
        });

        match registry.new_driver("nonexistent-name", &DriverConfig::new()) {
            Err(FdkError::UnknownDriver(name)) => assert_eq!(name, "nonexistent-name"),
            Err(other) => panic!("unexpected error: {other:?}"),
            Ok(_) => panic!("expected UnknownDriver"),
        }
        assert_eq!(calls.load(Ordering::SeqCst), 0);
    }

    #[test]
    fn test_lookup_is_case_sensitive() {
        let registry = DriverRegistry::new();
        registry.register("local", null_builder("local"));
        assert!(matches!(
            registry.new_driver("Local", &DriverConfig::new()),
            Err(FdkError::UnknownDriver(_))
        ));
    }

    #[test]
    #[should_panic(expected = "Driver 'dup' is already registered")]
    fn test_duplicate_register_panics() {
        let registry = DriverRegistry::new();
        registry.register("dup", null_builder("first"));
        registry.register("dup", null_builder("second"));
    }

    #[test]
    fn test_try_register_reports_duplicate() {
        let registry = DriverRegistry::new();
        registry.try_register("dup", null_builder("first")).unwrap();
        let err = registry.try_register("dup", null_builder("second")).unwrap_err();
        assert!(matches!(err, FdkError::DuplicateRegistration(name) if name == "dup"));
    }

    #[test]
    fn test_builder_missing_key() {
        let registry = DriverRegistry::new();
        registry.register("mem", |config| {
            config.require("mem", "root")?;
            Ok(Box::new(NullDriver { tag: "mem" }) as Box<dyn Driver>)
        });

        match registry.new_driver("mem", &DriverConfig::new()) {
            Err(FdkError::Construction { message, .. }) => assert!(message.contains("root")),
            Err(other) => panic!("unexpected error: {other:?}"),
            Ok(_) => panic!("expected construction error"),
        }
        assert!(registry
            .new_driver("mem", &DriverConfig::new().with("root", "/x"))
            .is_ok());
    }

    #[test]
    fn test_concurrent_distinct_registrations() {
        let registry = DriverRegistry::new();
        let names: Vec<String> = (0..32).map(|i| format!("driver-{i}")).collect();

        std::thread::scope(|s| {
            for name in &names {
                let registry = &registry;
                s.spawn(move || registry.register(name, null_builder("concurrent")));
            }
        });

        for name in &names {
            assert!(registry.new_driver(name, &DriverConfig::new()).is_ok(), "{name}");
        }
        assert_eq!(registry.names().len(), names.len());
    }

    #[test]
    fn test_concurrent_same_name_has_one_winner() {
        let registry = DriverRegistry::new();
        let failures = AtomicUsize::new(0);

        std::thread::scope(|s| {
            for _ in 0..8 {
                s.spawn(|| {
                    if registry.try_register("contested", null_builder("c")).is_err() {
                        failures.fetch_add(1, Ordering::SeqCst);
                    }
                });
            }
        });

        assert_eq!(failures.load(Ordering::SeqCst), 7);
        assert!(registry.contains("contested"));
    }

    #[test]
    fn test_names_sorted() {
        let registry = DriverRegistry::new();
        registry.register("memory", null_builder("m"));
        registry.register("dropbox", null_builder("d"));
        registry.register("local", null_builder("l"));
        assert_eq!(registry.names(), ["dropbox", "local", "memory"]);
    }
}
