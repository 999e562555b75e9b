//! Process information produced by discovery

use serde::{Deserialize, Serialize};

/// Relevant information about a running process
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProcessInfo {
    /// Process ID
    pub pid: u32,
    /// Parent process ID (0 if unknown)
    pub ppid: u32,
    /// Full executable path, empty if unreadable
    pub exe_path: String,
    /// TCP ports the process listens on
    pub open_ports: Vec<u16>,
}

impl ProcessInfo {
    /// Create process info with no open ports
    pub fn new(pid: u32, ppid: u32, exe_path: impl Into<String>) -> Self {
        Self {
            pid,
            ppid,
            exe_path: exe_path.into(),
            open_ports: Vec::new(),
        }
    }

    /// Set the open ports
    pub fn with_ports(mut self, ports: Vec<u16>) -> Self {
        self.open_ports = ports;
        self
    }

    /// Executable file name (last path component)
    pub fn exe_name(&self) -> &str {
        self.exe_path
            .rsplit('/')
            .next()
            .unwrap_or(self.exe_path.as_str())
    }
}
