//! Route tracing output to the browser console.

use std::io;
use tracing_subscriber::fmt::MakeWriter;
use tracing_subscriber::EnvFilter;
use wasm_bindgen::prelude::*;

/// Install a console subscriber.
///
/// `filter` uses `RUST_LOG` syntax, e.g. `"photopage_core=debug"`. Calling
/// this more than once keeps the first subscriber.
#[wasm_bindgen(js_name = initLogging)]
pub fn init_logging(filter: &str) -> Result<(), JsValue> {
    let filter = EnvFilter::try_new(filter)
        .map_err(|e| JsValue::from_str(&format!("Invalid log filter: {}", e)))?;

    let installed = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(ConsoleMakeWriter)
        .without_time()
        .try_init()
        .is_ok();
    if installed {
        tracing::debug!("Console logging installed");
    }
    Ok(())
}

#[derive(Debug, Clone, Copy)]
struct ConsoleMakeWriter;

impl<'a> MakeWriter<'a> for ConsoleMakeWriter {
    type Writer = ConsoleWriter;

    fn make_writer(&'a self) -> Self::Writer {
        ConsoleWriter::default()
    }
}

/// Buffers one formatted event and logs it on drop.
#[derive(Debug, Default)]
struct ConsoleWriter {
    buf: Vec<u8>,
}

impl io::Write for ConsoleWriter {
    fn write(&mut self, data: &[u8]) -> io::Result<usize> {
        self.buf.extend_from_slice(data);
        Ok(data.len())
    }

    fn flush(&mut self) -> io::Result<()> {
        Ok(())
    }
}

impl Drop for ConsoleWriter {
    fn drop(&mut self) {
        let line = String::from_utf8_lossy(&self.buf);
        let line = line.trim_end();
        if !line.is_empty() {
            web_sys::console::log_1(&JsValue::from_str(line));
        }
    }
}
