use std::env;
use std::ffi::OsStr;
use std::fs::{self, OpenOptions};
use std::io::{BufWriter, Write};
use std::path::{Path, PathBuf};

use super::error::IpsecError;
use super::layout;

/// `$HOME/.wireshark/esp_sa`, else `%APPDATA%/Wireshark/esp_sa`.
pub fn esp_sa_path_from(home: Option<&OsStr>, appdata: Option<&OsStr>) -> Option<PathBuf> {
    if let Some(home) = home.filter(|value| !value.is_empty()) {
        return Some(
            Path::new(home)
                .join(layout::ESP_SA_HOME_DIR)
                .join(layout::ESP_SA_FILE),
        );
    }
    appdata.filter(|value| !value.is_empty()).map(|appdata| {
        Path::new(appdata)
            .join(layout::ESP_SA_APPDATA_DIR)
            .join(layout::ESP_SA_FILE)
    })
}

/// Wireshark's per-user esp_sa location for this environment, if any.
pub fn resolve_esp_sa_path() -> Option<PathBuf> {
    let home = env::var_os("HOME");
    let appdata = env::var_os("APPDATA");
    esp_sa_path_from(home.as_deref(), appdata.as_deref())
}

/// Append `rows` to the esp_sa file, creating it and its directory when
/// missing. Nothing is touched when `rows` is empty.
pub fn append_rows(path: &Path, rows: &[String]) -> Result<(), IpsecError> {
    if rows.is_empty() {
        return Ok(());
    }
    if let Some(parent) = path.parent().filter(|parent| !parent.as_os_str().is_empty()) {
        fs::create_dir_all(parent)?;
    }
    let file = OpenOptions::new().create(true).append(true).open(path)?;
    let mut writer = BufWriter::new(file);
    for row in rows {
        writeln!(writer, "{row}")?;
    }
    writer.flush()?;
    Ok(())
}
