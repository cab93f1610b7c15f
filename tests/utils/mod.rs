// Trace directory fixtures shared by the integration tests

#![allow(dead_code)]

use std::fs;
use std::path::Path;
use tempfile::TempDir;

/// Per-thread log under construction
pub struct ThreadLog {
    pid: u32,
    tid: u32,
    lines: Vec<String>,
}

impl ThreadLog {
    pub fn new(pid: u32, tid: u32) -> Self {
        Self {
            pid,
            tid,
            lines: Vec::new(),
        }
    }

    /// Append `<op> <turn> <args>`
    pub fn op(mut self, name: &str, turn: u64, args: &str) -> Self {
        if args.is_empty() {
            self.lines.push(format!("{} {}", name, turn));
        } else {
            self.lines.push(format!("{} {} {}", name, turn, args));
        }
        self
    }

    /// Append a raw line verbatim
    pub fn raw(mut self, line: &str) -> Self {
        self.lines.push(line.to_string());
        self
    }

    pub fn file_name(&self) -> String {
        format!("tid-{}-{}.txt", self.pid, self.tid)
    }

    pub fn contents(&self) -> String {
        let mut text = String::from("op turn args\n");
        for line in &self.lines {
            text.push_str(line);
            text.push('\n');
        }
        text
    }
}

/// Write the logs into a fresh temporary trace directory
pub fn trace_dir(logs: &[ThreadLog]) -> TempDir {
    let dir = TempDir::new().unwrap();
    for log in logs {
        write_log(dir.path(), log);
    }
    dir
}

pub fn write_log(dir: &Path, log: &ThreadLog) {
    fs::write(dir.join(log.file_name()), log.contents()).unwrap();
}

/// Two threads handing a mutex back and forth, plus the idle thread
pub fn mutex_handoff() -> Vec<ThreadLog> {
    vec![
        ThreadLog::new(0, 1).op("tern_idle", 2, "").op("tern_idle", 6, ""),
        ThreadLog::new(0, 2)
            .op("pthread_mutex_lock", 1, "0x601040")
            .op("pthread_mutex_unlock", 3, "0x601040"),
        ThreadLog::new(0, 3)
            .op("pthread_mutex_lock", 4, "0x601040")
            .op("pthread_mutex_unlock", 5, "0x601040"),
    ]
}

/// Server process 10 and client process 20 exchanging 10 bytes over port 9000
pub fn client_server() -> Vec<ThreadLog> {
    vec![
        ThreadLog::new(10, 2)
            .op("accept_first", 1, "5 9000 9000")
            .op("accept_second", 3, "5 9000 9000")
            .op("read_first", 6, "0x400 5 0x6")
            .op("read_second", 7, "0x400 5 0x6")
            .op("read_first", 8, "0x400 5 0x4")
            .op("read_second", 9, "0x400 5 0x4"),
        ThreadLog::new(20, 2)
            .op("connect_first", 2, "3 9000 41000 0")
            .op("connect_second", 4, "3 9000 41000 0")
            .op("write", 5, "0x400 3 0xa"),
    ]
}
