use std::fs::{self, File};
use std::io::{BufWriter, Write};
use std::path::{Path, PathBuf};

use log::debug;

use super::block::section_header_block;
use super::error::WriterError;
use super::layout;

/// Where the writer currently is in its output-file lineage.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OutputFileState {
    pub current_path: PathBuf,
    pub packets_in_current_file: u64,
    /// 1-based number of the file currently open.
    pub file_sequence: u32,
    pub max_packets_per_file: Option<u64>,
}

/// Writes sections of pre-encoded blocks to one or more pcapng files.
///
/// The target file is created immediately. When `max_packets_per_file` is
/// set and a batch does not fit, the current file is closed, the first file
/// is renamed to `<base>.part001<suffix>` and writing continues in
/// `<base>.part002<suffix>` and so on, where `<suffix>` is `.pcapng` when the
/// target name ends with it and empty otherwise.
pub struct PcapNgWriter {
    directory: PathBuf,
    base: String,
    suffix: &'static str,
    section_header: Vec<u8>,
    state: OutputFileState,
    file: Option<BufWriter<File>>,
    files: Vec<PathBuf>,
    /// Interface block bytes already written in the open section, `None`
    /// when the current file has no open section.
    section_interfaces: Option<usize>,
    sections_written: u64,
    packets_written: u64,
}

impl PcapNgWriter {
    /// # Errors
    /// `WriterError::InvalidCapacity` for `Some(0)`, `WriterError::Io` when
    /// the target cannot be created.
    pub fn create(
        path: &Path,
        max_packets_per_file: Option<u64>,
        application: &str,
    ) -> Result<Self, WriterError> {
        if max_packets_per_file == Some(0) {
            return Err(WriterError::InvalidCapacity);
        }
        let section_header = section_header_block(application)?;
        let (directory, base, suffix) = split_target(path);

        let file = BufWriter::new(File::create(path)?);
        debug!("opened output file {}", path.display());
        Ok(Self {
            directory,
            base,
            suffix,
            section_header,
            state: OutputFileState {
                current_path: path.to_path_buf(),
                packets_in_current_file: 0,
                file_sequence: 1,
                max_packets_per_file,
            },
            file: Some(file),
            files: vec![path.to_path_buf()],
            section_interfaces: None,
            sections_written: 0,
            packets_written: 0,
        })
    }

    /// Write `packet_blocks` as one or more sections, each preceded by a
    /// Section Header Block and `interface_blocks`.
    ///
    /// An empty batch writes nothing. Packet order is preserved across
    /// rotations.
    pub fn write_packets(
        &mut self,
        interface_blocks: &[u8],
        packet_blocks: &[Vec<u8>],
    ) -> Result<(), WriterError> {
        let mut index = 0;
        while index < packet_blocks.len() {
            let remaining = packet_blocks.len() - index;
            let free = match self.state.max_packets_per_file {
                None => remaining,
                Some(max) => {
                    if self.state.packets_in_current_file >= max {
                        self.rotate()?;
                    }
                    (max - self.state.packets_in_current_file) as usize
                }
            };
            let chunk = &packet_blocks[index..index + free.min(remaining)];

            let file = self.file.as_mut().ok_or(WriterError::Closed)?;
            file.write_all(&self.section_header)?;
            file.write_all(interface_blocks)?;
            for block in chunk {
                file.write_all(block)?;
            }
            self.section_interfaces = Some(interface_blocks.len());
            self.sections_written += 1;
            self.state.packets_in_current_file += chunk.len() as u64;
            self.packets_written += chunk.len() as u64;
            index += chunk.len();
        }
        Ok(())
    }

    /// Append one Enhanced Packet Block to the open section.
    ///
    /// `interface_blocks` is the full, append-only interface list: only the
    /// blocks not yet written in this section are emitted before the packet.
    /// A section is opened when none is (at the start and after a rotation).
    pub fn append_packet(
        &mut self,
        interface_blocks: &[u8],
        packet_block: &[u8],
    ) -> Result<(), WriterError> {
        if let Some(max) = self.state.max_packets_per_file {
            if self.state.packets_in_current_file >= max {
                self.rotate()?;
            }
        }
        let file = self.file.as_mut().ok_or(WriterError::Closed)?;
        match self.section_interfaces {
            Some(sent) => file.write_all(interface_blocks.get(sent..).unwrap_or_default())?,
            None => {
                file.write_all(&self.section_header)?;
                file.write_all(interface_blocks)?;
                self.sections_written += 1;
            }
        }
        file.write_all(packet_block)?;
        self.section_interfaces = Some(interface_blocks.len());
        self.state.packets_in_current_file += 1;
        self.packets_written += 1;
        Ok(())
    }

    pub fn state(&self) -> &OutputFileState {
        &self.state
    }

    pub fn packets_written(&self) -> u64 {
        self.packets_written
    }

    /// Flush and close the current file, returning every file produced in
    /// sequence order.
    ///
    /// A writer that never wrote a section leaves a lone Section Header Block
    /// so the output is still a valid capture.
    pub fn finish(mut self) -> Result<Vec<PathBuf>, WriterError> {
        let mut file = self.file.take().ok_or(WriterError::Closed)?;
        if self.sections_written == 0 {
            file.write_all(&self.section_header)?;
        }
        file.flush()?;
        debug!(
            "closed {} after {} packets",
            self.state.current_path.display(),
            self.packets_written
        );
        Ok(self.files)
    }

    fn rotate(&mut self) -> Result<(), WriterError> {
        if let Some(mut file) = self.file.take() {
            file.flush()?;
        }
        if self.state.file_sequence == 1 {
            let renamed = self.part_path(1);
            debug!(
                "renaming {} to {}",
                self.state.current_path.display(),
                renamed.display()
            );
            fs::rename(&self.state.current_path, &renamed)?;
            self.files[0] = renamed;
        }

        self.state.file_sequence += 1;
        let next = self.part_path(self.state.file_sequence);
        debug!("opening output file {}", next.display());
        self.file = Some(BufWriter::new(File::create(&next)?));
        self.files.push(next.clone());
        self.state.current_path = next;
        self.state.packets_in_current_file = 0;
        self.section_interfaces = None;
        Ok(())
    }

    fn part_path(&self, sequence: u32) -> PathBuf {
        self.directory
            .join(format!("{}.part{:03}{}", self.base, sequence, self.suffix))
    }
}

/// `(directory, base, suffix)` of a target path; the suffix is `.pcapng`
/// when the name ends with it and empty otherwise.
fn split_target(path: &Path) -> (PathBuf, String, &'static str) {
    let file_name = path
        .file_name()
        .map(|name| name.to_string_lossy().into_owned())
        .unwrap_or_default();
    let (base, suffix) = match file_name.strip_suffix(layout::PCAPNG_SUFFIX) {
        Some(base) => (base.to_string(), layout::PCAPNG_SUFFIX),
        None => (file_name, ""),
    };
    let directory = path.parent().map(Path::to_path_buf).unwrap_or_default();
    (directory, base, suffix)
}

/// Split-output files (`<base>.partNNN<suffix>`) already present next to
/// `path`, sorted by name.
///
/// # Errors
/// `WriterError::Io` when the directory exists but cannot be listed.
pub fn existing_parts(path: &Path) -> Result<Vec<PathBuf>, WriterError> {
    let (directory, base, suffix) = split_target(path);
    let listing = if directory.as_os_str().is_empty() {
        fs::read_dir(".")
    } else {
        fs::read_dir(&directory)
    };
    let entries = match listing {
        Ok(entries) => entries,
        Err(err) if err.kind() == std::io::ErrorKind::NotFound => return Ok(Vec::new()),
        Err(err) => return Err(err.into()),
    };

    let prefix = format!("{base}.part");
    let mut parts = Vec::new();
    for entry in entries {
        let entry = entry?;
        let name = entry.file_name();
        let Some(sequence) = name
            .to_str()
            .and_then(|name| name.strip_prefix(&prefix))
            .and_then(|rest| rest.strip_suffix(suffix))
        else {
            continue;
        };
        if sequence.len() >= 3 && sequence.bytes().all(|b| b.is_ascii_digit()) {
            parts.push(directory.join(name));
        }
    }
    parts.sort();
    Ok(parts)
}
