use std::fs;
use std::path::Path;
use std::sync::Arc;

use crate::{ConfigurableBackend, Severity};

/// Capability the config reader drives while parsing. Generic over the
/// backend type so the same parser builds production backends for the
/// configurator and bare doubles in tests.
pub trait ConfigConsumer<B: ?Sized> {
    /// Called with every line outside a block; a recognized section header
    /// yields a fresh backend, anything else `None`.
    fn create(&mut self, header: &str) -> Option<Arc<B>>;

    /// Accept a backend whose block closed while initialized.
    fn add(&mut self, backend: Arc<B>);

    /// Apply a `MODULE:` directive to a backend under construction.
    fn set_severity_threshold(&mut self, backend: &Arc<B>, module: &str, severity: Severity)
        -> bool;
}

/// Parse a line-oriented backend configuration file:
///
/// ```text
/// FILE (
/// PATH: /var/log/example.log
/// MODULE: WARNING
/// MODULE: some.module TRACE
/// )
/// ```
///
/// A block is accepted only if the backend reports `is_initialized()` when
/// the closing `)` arrives; an uninitialized block, or a block still open at
/// end of file, fails the whole parse. Malformed key/value lines are
/// skipped. Returns true only if at least one block was accepted and none
/// failed; an unreadable file parses as invalid.
pub fn parse_config_file<B, C>(path: &Path, consumer: &mut C) -> bool
where
    B: ConfigurableBackend + ?Sized,
    C: ConfigConsumer<B>,
{
    let contents = match fs::read_to_string(path) {
        Ok(contents) => contents,
        Err(_) => return false,
    };

    let mut valid = false;
    let mut lines = contents.lines();
    while let Some(line) = lines.next() {
        let Some(backend) = consumer.create(line.trim()) else {
            continue;
        };

        let mut closed = false;
        for line in lines.by_ref() {
            let line = line.trim();
            if line == ")" {
                if !backend.is_initialized() {
                    return false;
                }
                consumer.add(Arc::clone(&backend));
                valid = true;
                closed = true;
                break;
            }

            let tokens: Vec<&str> = line.split(':').map(str::trim).filter(|t| !t.is_empty()).collect();
            if tokens.len() != 2 {
                continue;
            }
            let (key, value) = (tokens[0], tokens[1]);
            if key == "MODULE" {
                let directive: Vec<&str> = value.split_whitespace().collect();
                match directive.as_slice() {
                    [severity] => {
                        consumer.set_severity_threshold(
                            &backend,
                            "",
                            Severity::from_config_token(severity),
                        );
                    }
                    [module, severity] => {
                        consumer.set_severity_threshold(
                            &backend,
                            module,
                            Severity::from_config_token(severity),
                        );
                    }
                    _ => {}
                }
            } else {
                backend.set_property(key, value);
            }
        }

        // File ended inside an open block.
        if !closed {
            return false;
        }
    }

    valid
}
