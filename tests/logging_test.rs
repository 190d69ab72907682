//! Checks the diagnostics emitted while validating.

use std::io;
use std::sync::{Arc, Mutex};

use inquest::{Schema, SchemaExt};
use serde_json::json;
use tracing_subscriber::EnvFilter;

#[derive(Clone, Default)]
struct Capture(Arc<Mutex<Vec<u8>>>);

impl Capture {
    fn contents(&self) -> String {
        String::from_utf8_lossy(&self.0.lock().unwrap()).into_owned()
    }
}

impl io::Write for Capture {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        self.0.lock().unwrap().extend_from_slice(buf);
        Ok(buf.len())
    }

    fn flush(&mut self) -> io::Result<()> {
        Ok(())
    }
}

fn captured<F: FnOnce()>(filter: &str, f: F) -> String {
    let capture = Capture::default();
    let writer = capture.clone();
    let subscriber = tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::new(filter))
        .with_ansi(false)
        .with_writer(move || writer.clone())
        .finish();

    tracing::subscriber::with_default(subscriber, f);
    capture.contents()
}

#[test]
fn test_panicking_callback_is_logged_as_warning() {
    let schema = Schema::string().map(|_| panic!("exploded"));

    let output = captured("inquest=warn", || {
        let errors = schema.parse(&json!("x")).unwrap_err();
        assert_eq!(errors.first().code(), "transform");
    });

    assert!(output.contains("WARN"), "missing warning in {output:?}");
    assert!(output.contains("user callback panicked"));
    assert!(output.contains("exploded"));
}

#[test]
fn test_failed_parse_is_traced() {
    let output = captured("inquest=trace", || {
        let _ = Schema::number().parse(&json!("1"));
    });

    assert!(output.contains("validation failed"));
    assert!(output.contains("issues=1"));
}

#[test]
fn test_quiet_at_default_level() {
    let output = captured("inquest=info", || {
        let _ = Schema::object()
            .field("a", Schema::string())
            .parse(&json!({"a": 1}));
    });

    assert!(output.is_empty(), "unexpected output {output:?}");
}
