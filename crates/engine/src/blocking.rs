//! [`BlockingDecrypter`]: synchronous `decrypt` for callers that cannot await.
//!
//! The adapter owns a private current-thread runtime and drives each call on
//! a scoped worker thread. The caller's own runtime, if any, is never
//! re-entered, so a call from inside async code blocks that thread but
//! cannot deadlock.

use std::future::Future;
use std::io;
use std::thread;

use tokio::runtime::{Builder, Runtime};

use common::{ObjError, PlainObject};

use crate::aws::KmsSettings;
use crate::cipher::{KmsCipher, RemoteCipher};
use crate::transform::ObjectTransformer;

/// Blocking wrapper around [`ObjectTransformer::decrypt`].
pub struct BlockingDecrypter<C> {
    // `None` only while dropping.
    runtime: Option<Runtime>,
    transformer: ObjectTransformer<C>,
}

impl BlockingDecrypter<KmsCipher> {
    /// Build a KMS-backed decrypter from `settings`.
    ///
    /// # Errors
    ///
    /// Returns an error if the private runtime cannot be started.
    pub fn connect(settings: &KmsSettings) -> io::Result<Self> {
        let runtime = new_runtime()?;
        let cipher = run_on_worker(&runtime, || KmsCipher::connect(settings));
        Ok(Self {
            runtime: Some(runtime),
            transformer: ObjectTransformer::new(cipher),
        })
    }
}

impl<C: RemoteCipher> BlockingDecrypter<C> {
    /// Wrap an existing transformer.
    ///
    /// # Errors
    ///
    /// Returns an error if the private runtime cannot be started.
    pub fn new(transformer: ObjectTransformer<C>) -> io::Result<Self> {
        Ok(Self {
            runtime: Some(new_runtime()?),
            transformer,
        })
    }

    /// Decrypt `obj`, blocking the calling thread until every remote call has
    /// completed.
    ///
    /// Success and failure are exactly those of [`ObjectTransformer::decrypt`].
    pub fn decrypt(&self, obj: &PlainObject) -> Result<PlainObject, ObjError> {
        match &self.runtime {
            Some(runtime) => run_on_worker(runtime, || self.transformer.decrypt(obj)),
            None => unreachable!("runtime is only taken on drop"),
        }
    }
}

impl<C> Drop for BlockingDecrypter<C> {
    fn drop(&mut self) {
        // A plain drop panics when it happens inside an async context.
        if let Some(runtime) = self.runtime.take() {
            runtime.shutdown_background();
        }
    }
}

fn new_runtime() -> io::Result<Runtime> {
    Builder::new_current_thread().enable_all().build()
}

/// Build a future with `make` and drive it to completion on `runtime` from a
/// dedicated thread, re-raising any panic on the caller's thread.
fn run_on_worker<T, F>(runtime: &Runtime, make: impl FnOnce() -> F + Send) -> T
where
    F: Future<Output = T>,
    T: Send,
{
    thread::scope(|scope| match scope.spawn(|| runtime.block_on(make())).join() {
        Ok(out) => out,
        Err(panic) => std::panic::resume_unwind(panic),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::transform::tests::{object, FakeKms};
    use base64::{engine::general_purpose::STANDARD, Engine as _};
    use serde_json::{json, Value};

    fn encrypted_fixture() -> PlainObject {
        object(json!({
            "a": 1,
            "_encrypted": {"b": STANDARD.encode("key-1:\"x\"")},
        }))
    }

    #[test]
    fn decrypts_synchronously() {
        let decrypter = BlockingDecrypter::new(ObjectTransformer::new(FakeKms)).unwrap();

        let out = decrypter.decrypt(&encrypted_fixture()).unwrap();

        assert_eq!(Value::Object(out), json!({"a": 1, "b": "x"}));
    }

    #[test]
    fn errors_are_returned_not_panicked() {
        let decrypter = BlockingDecrypter::new(ObjectTransformer::new(FakeKms)).unwrap();

        let err = decrypter.decrypt(&object(json!({"a": 1}))).unwrap_err();

        assert!(matches!(err, ObjError::MalformedEnvelope(_)));
    }

    #[test]
    fn reusable_across_calls() {
        let decrypter = BlockingDecrypter::new(ObjectTransformer::new(FakeKms)).unwrap();
        for _ in 0..3 {
            assert!(decrypter.decrypt(&encrypted_fixture()).is_ok());
        }
    }

    #[tokio::test]
    async fn callable_and_droppable_inside_a_runtime() {
        let decrypter = BlockingDecrypter::new(ObjectTransformer::new(FakeKms)).unwrap();

        let out = decrypter.decrypt(&encrypted_fixture()).unwrap();
        drop(decrypter);

        assert_eq!(out["b"], json!("x"));
    }
}
