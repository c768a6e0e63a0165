use std::io::{self, Read};

use tracing::debug;

use dcf_model_core::ParameterBundle;

use super::file::parse_bundle;

/// Parameter bundle piped on stdin. `None` when stdin is a terminal or
/// nothing was piped.
pub fn read_stdin_bundle() -> Result<Option<ParameterBundle>, Box<dyn std::error::Error>> {
    if atty::is(atty::Stream::Stdin) {
        return Ok(None);
    }

    let mut buffer = String::new();
    io::stdin().read_to_string(&mut buffer)?;
    if buffer.trim().is_empty() {
        return Ok(None);
    }

    debug!(bytes = buffer.len(), "reading parameter bundle from stdin");
    let bundle = parse_bundle(&buffer).map_err(|e| format!("stdin: {e}"))?;
    Ok(Some(bundle))
}
