//! Listening TCP ports per process
//!
//! On Linux the listening sockets of the agent's network namespace are
//! read from `/proc/net/tcp{,6}` and joined by inode with each process's
//! socket file descriptors. Elsewhere no ports are reported.

#[cfg(target_os = "linux")]
mod imp {
    use std::collections::HashMap;

    use procfs::net::TcpState;
    use procfs::process::{FDTarget, Process};

    use crate::error::{DiscoveryError, Result};

    /// Socket inode → listening port
    #[derive(Debug, Default)]
    pub struct PortTable {
        listening: HashMap<u64, u16>,
    }

    impl PortTable {
        pub fn load() -> Result<Self> {
            let me = Process::myself().map_err(DiscoveryError::socket_table)?;
            let mut entries = me.tcp().map_err(DiscoveryError::socket_table)?;
            // IPv6 may be disabled
            entries.extend(me.tcp6().unwrap_or_default());

            let listening = entries
                .into_iter()
                .filter(|e| matches!(e.state, TcpState::Listen))
                .map(|e| (e.inode, e.local_address.port()))
                .collect();
            Ok(Self { listening })
        }

        pub fn ports_of(&self, pid: u32) -> Result<Vec<u16>> {
            let process =
                Process::new(pid as i32).map_err(|e| DiscoveryError::sockets(pid, e))?;
            let fds = process.fd().map_err(|e| DiscoveryError::sockets(pid, e))?;

            let mut ports: Vec<u16> = fds
                .filter_map(|fd| fd.ok())
                .filter_map(|fd| match fd.target {
                    FDTarget::Socket(inode) => self.listening.get(&inode).copied(),
                    _ => None,
                })
                .collect();
            ports.sort_unstable();
            ports.dedup();
            Ok(ports)
        }

        pub fn len(&self) -> usize {
            self.listening.len()
        }

        pub fn is_empty(&self) -> bool {
            self.listening.is_empty()
        }
    }
}

#[cfg(not(target_os = "linux"))]
mod imp {
    use crate::error::Result;

    #[derive(Debug, Default)]
    pub struct PortTable;

    impl PortTable {
        pub fn load() -> Result<Self> {
            Ok(Self)
        }

        pub fn ports_of(&self, _pid: u32) -> Result<Vec<u16>> {
            Ok(Vec::new())
        }

        pub fn len(&self) -> usize {
            0
        }

        pub fn is_empty(&self) -> bool {
            true
        }
    }
}

pub use imp::PortTable;
