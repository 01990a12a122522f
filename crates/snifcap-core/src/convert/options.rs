use std::collections::{HashMap, HashSet};

use crate::dump::Dialect;
use crate::pcapng::LinkType;
use crate::pcapng::layout::DEFAULT_APPLICATION;

/// Knobs of one conversion run.
#[derive(Debug, Clone)]
pub struct ConvertOptions {
    pub dialect: Dialect,
    /// Split ASCII columns glued to the last hex group.
    pub normalize_lines: bool,
    /// Abort on the first undecodable packet line instead of skipping it.
    pub stop_on_error: bool,
    /// Split output into `<base>.partNNN<suffix>` files of at most this many packets.
    pub max_packets_per_file: Option<u64>,
    /// Assembled packets per section; `None` writes a single section.
    pub section_size: Option<usize>,
    pub skip: u64,
    pub limit: Option<u64>,
    /// Drop Ethernet/IPv4 packets shorter than their IPv4 total length.
    pub check_packet_size: bool,
    /// When non-empty, only these interfaces are converted.
    pub include: HashSet<String>,
    pub exclude: HashSet<String>,
    /// Link type per interface name, Ethernet when absent.
    pub link_types: HashMap<String, LinkType>,
    /// Append the dump line number to every packet comment.
    pub include_packet_line: bool,
    pub report_progress: bool,
    /// `shb_userappl` value written to every section.
    pub application: String,
    pub overwrite: bool,
}

impl Default for ConvertOptions {
    fn default() -> Self {
        Self {
            dialect: Dialect::Compatible,
            normalize_lines: true,
            stop_on_error: false,
            max_packets_per_file: None,
            section_size: None,
            skip: 0,
            limit: None,
            check_packet_size: true,
            include: HashSet::new(),
            exclude: HashSet::new(),
            link_types: HashMap::new(),
            include_packet_line: false,
            report_progress: false,
            application: DEFAULT_APPLICATION.to_string(),
            overwrite: true,
        }
    }
}

impl ConvertOptions {
    pub fn link_type(&self, interface: &str) -> LinkType {
        self.link_types.get(interface).copied().unwrap_or_default()
    }

    pub fn accepts_interface(&self, interface: &str) -> bool {
        if !self.include.is_empty() && !self.include.contains(interface) {
            return false;
        }
        !self.exclude.contains(interface)
    }
}
