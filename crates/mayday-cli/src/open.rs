//! Platform link opening.

use std::process::{Command, Stdio};

use mayday::sos::LinkOpener;
use url::Url;

/// Opens each link in the system browser, one window per contact.
#[derive(Debug, Default, Clone, Copy)]
pub struct BrowserOpener;

#[cfg(target_os = "macos")]
const OPEN_COMMAND: &str = "open";

#[cfg(not(target_os = "macos"))]
const OPEN_COMMAND: &str = "xdg-open";

impl LinkOpener for BrowserOpener {
    fn open(&self, url: &Url) -> std::io::Result<()> {
        // Fire-and-forget: the browser process outlives this invocation.
        Command::new(OPEN_COMMAND)
            .arg(url.as_str())
            .stdout(Stdio::null())
            .stderr(Stdio::null())
            .spawn()
            .map(|_| ())
    }
}

/// Prints each link to stdout instead of opening it (`--dry-run`).
#[derive(Debug, Default, Clone, Copy)]
pub struct PrintOpener;

impl LinkOpener for PrintOpener {
    fn open(&self, url: &Url) -> std::io::Result<()> {
        println!("{url}");
        Ok(())
    }
}
