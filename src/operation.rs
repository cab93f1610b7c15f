//! Normalized operation records
//!
//! Every recorded operation is mapped onto a closed vocabulary of kinds
//! ([`OpKind`]). Kinds that drive dependency inference carry strongly typed
//! arguments ([`Op`]) decoded once during normalization, so extractors never
//! look at raw argument text.
//!
//! # Argument layouts
//!
//! ```text
//! M_L / M_UL      (mutex)
//! B_I             (barrier) (count, hex)
//! B_W_F / B_W_S   (barrier)
//! P_C             (child thread) (return value)
//! BEGIN / END     (thread)
//! P_J             (child thread)
//! ACC_F / ACC_S   (fd) (listen port) (local port)
//! CONN_F / CONN_S (fd) (listen port) (local port) (return value)
//! WRITE / READ_S  (signature) (fd) (size, hex)
//! ```

use crate::error::{AnalysisError, Result};
use std::fmt;

/// Canonical operation kinds
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum OpKind {
    MutexLock,
    MutexUnlock,
    MutexInit,
    BarrierInit,
    BarrierArriveFirst,
    BarrierArriveSecond,
    ThreadBegin,
    ThreadCreate,
    ThreadEnd,
    ThreadJoin,
    AcceptFirst,
    AcceptSecond,
    ConnectFirst,
    ConnectSecond,
    Write,
    ReadFirst,
    ReadSecond,
    Idle,
    CondSignal,
    Opaque,
}

/// Raw operation name → canonical kind
const RAW_NAMES: &[(&str, OpKind)] = &[
    ("pthread_mutex_lock", OpKind::MutexLock),
    ("pthread_mutex_unlock", OpKind::MutexUnlock),
    ("pthread_mutex_init", OpKind::MutexInit),
    ("pthread_barrier_init", OpKind::BarrierInit),
    ("pthread_barrier_wait_first", OpKind::BarrierArriveFirst),
    ("pthread_barrier_wait_second", OpKind::BarrierArriveSecond),
    ("tern_thread_begin", OpKind::ThreadBegin),
    ("pthread_create", OpKind::ThreadCreate),
    ("tern_thread_end", OpKind::ThreadEnd),
    ("pthread_join", OpKind::ThreadJoin),
    ("accept_first", OpKind::AcceptFirst),
    ("accept_second", OpKind::AcceptSecond),
    ("connect_first", OpKind::ConnectFirst),
    ("connect_second", OpKind::ConnectSecond),
    ("write", OpKind::Write),
    ("read_first", OpKind::ReadFirst),
    ("read_second", OpKind::ReadSecond),
    ("tern_idle", OpKind::Idle),
    ("pthread_cond_signal", OpKind::CondSignal),
    ("unknown", OpKind::Opaque),
];

impl OpKind {
    /// Look up a raw recorded operation name
    ///
    /// Returns `None` for names outside the recognized vocabulary. The raw
    /// name `unknown` is recognized and maps to [`OpKind::Opaque`].
    pub fn from_raw_name(name: &str) -> Option<Self> {
        RAW_NAMES
            .iter()
            .find(|(raw, _)| *raw == name)
            .map(|(_, kind)| *kind)
    }

    /// Short code written to the graph artifact
    pub fn code(self) -> &'static str {
        match self {
            OpKind::MutexLock => "M_L",
            OpKind::MutexUnlock => "M_UL",
            OpKind::MutexInit => "M_I",
            OpKind::BarrierInit => "B_I",
            OpKind::BarrierArriveFirst => "B_W_F",
            OpKind::BarrierArriveSecond => "B_W_S",
            OpKind::ThreadBegin => "BEGIN",
            OpKind::ThreadCreate => "P_C",
            OpKind::ThreadEnd => "END",
            OpKind::ThreadJoin => "P_J",
            OpKind::AcceptFirst => "ACC_F",
            OpKind::AcceptSecond => "ACC_S",
            OpKind::ConnectFirst => "CONN_F",
            OpKind::ConnectSecond => "CONN_S",
            OpKind::Write => "WRITE",
            OpKind::ReadFirst => "READ_F",
            OpKind::ReadSecond => "READ_S",
            OpKind::Idle => "IDLE",
            OpKind::CondSignal => "P_C_S",
            OpKind::Opaque => "unknown",
        }
    }
}

impl fmt::Display for OpKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.code())
    }
}

/// Socket endpoint arguments of accept/connect
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SocketArgs {
    pub fd: String,
    pub listen_port: String,
    pub local_port: String,
    /// Return value, only recorded for connect
    pub ret: Option<String>,
}

/// Stream transfer arguments of write/read
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TransferArgs {
    pub signature: String,
    pub fd: String,
    pub size: u64,
}

/// Operation with its decoded arguments
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Op {
    MutexLock { mutex: String },
    MutexUnlock { mutex: String },
    BarrierInit { barrier: String, count: usize },
    BarrierArriveFirst { barrier: String },
    BarrierArriveSecond { barrier: String },
    ThreadBegin { thread: String },
    ThreadCreate { thread: String, ret: String },
    ThreadEnd { thread: String },
    ThreadJoin { thread: String },
    AcceptFirst(SocketArgs),
    AcceptSecond(SocketArgs),
    ConnectFirst(SocketArgs),
    ConnectSecond(SocketArgs),
    Write(TransferArgs),
    ReadSecond(TransferArgs),
    /// Recognized kind that never contributes edges (READ_F, IDLE, M_I, P_C_S)
    Marker(OpKind),
    /// Name outside the recognized vocabulary
    Opaque { name: String },
}

impl Op {
    /// Decode the arguments of a recognized kind
    ///
    /// `id` is only used to identify the operation in error reports.
    pub fn decode(kind: OpKind, args: &str, id: usize) -> Result<Self> {
        let tokens: Vec<&str> = args.split_whitespace().collect();
        let malformed = || AnalysisError::MalformedArgs {
            id,
            kind: kind.code(),
            args: args.to_string(),
        };

        let op = match (kind, tokens.as_slice()) {
            (OpKind::MutexLock, [_, ..]) => Op::MutexLock {
                mutex: tokens.join(" "),
            },
            (OpKind::MutexUnlock, [_, ..]) => Op::MutexUnlock {
                mutex: tokens.join(" "),
            },
            (OpKind::BarrierInit, [barrier, count]) => Op::BarrierInit {
                barrier: barrier.to_string(),
                count: parse_hex(count).ok_or_else(malformed)? as usize,
            },
            (OpKind::BarrierArriveFirst, [_, ..]) => Op::BarrierArriveFirst {
                barrier: tokens.join(" "),
            },
            (OpKind::BarrierArriveSecond, [_, ..]) => Op::BarrierArriveSecond {
                barrier: tokens.join(" "),
            },
            (OpKind::ThreadBegin, [thread, ..]) => Op::ThreadBegin {
                thread: thread.to_string(),
            },
            (OpKind::ThreadCreate, [thread, ret]) => Op::ThreadCreate {
                thread: thread.to_string(),
                ret: ret.to_string(),
            },
            (OpKind::ThreadEnd, [thread, ..]) => Op::ThreadEnd {
                thread: thread.to_string(),
            },
            (OpKind::ThreadJoin, [thread, ..]) => Op::ThreadJoin {
                thread: thread.to_string(),
            },
            (OpKind::AcceptFirst, [fd, listen, local]) => {
                Op::AcceptFirst(SocketArgs::new(fd, listen, local, None))
            }
            (OpKind::AcceptSecond, [fd, listen, local]) => {
                Op::AcceptSecond(SocketArgs::new(fd, listen, local, None))
            }
            (OpKind::ConnectFirst, [fd, listen, local, ret]) => {
                Op::ConnectFirst(SocketArgs::new(fd, listen, local, Some(*ret)))
            }
            (OpKind::ConnectSecond, [fd, listen, local, ret]) => {
                Op::ConnectSecond(SocketArgs::new(fd, listen, local, Some(*ret)))
            }
            (OpKind::Write, [sig, fd, size]) => Op::Write(TransferArgs {
                signature: sig.to_string(),
                fd: fd.to_string(),
                size: parse_hex(size).ok_or_else(malformed)?,
            }),
            (OpKind::ReadSecond, [sig, fd, size]) => Op::ReadSecond(TransferArgs {
                signature: sig.to_string(),
                fd: fd.to_string(),
                size: parse_hex(size).ok_or_else(malformed)?,
            }),
            (
                OpKind::ReadFirst | OpKind::Idle | OpKind::MutexInit | OpKind::CondSignal,
                _,
            ) => Op::Marker(kind),
            (OpKind::Opaque, _) => Op::Opaque {
                name: "unknown".to_string(),
            },
            _ => return Err(malformed()),
        };
        Ok(op)
    }

    pub fn kind(&self) -> OpKind {
        match self {
            Op::MutexLock { .. } => OpKind::MutexLock,
            Op::MutexUnlock { .. } => OpKind::MutexUnlock,
            Op::BarrierInit { .. } => OpKind::BarrierInit,
            Op::BarrierArriveFirst { .. } => OpKind::BarrierArriveFirst,
            Op::BarrierArriveSecond { .. } => OpKind::BarrierArriveSecond,
            Op::ThreadBegin { .. } => OpKind::ThreadBegin,
            Op::ThreadCreate { .. } => OpKind::ThreadCreate,
            Op::ThreadEnd { .. } => OpKind::ThreadEnd,
            Op::ThreadJoin { .. } => OpKind::ThreadJoin,
            Op::AcceptFirst(_) => OpKind::AcceptFirst,
            Op::AcceptSecond(_) => OpKind::AcceptSecond,
            Op::ConnectFirst(_) => OpKind::ConnectFirst,
            Op::ConnectSecond(_) => OpKind::ConnectSecond,
            Op::Write(_) => OpKind::Write,
            Op::ReadSecond(_) => OpKind::ReadSecond,
            Op::Marker(kind) => *kind,
            Op::Opaque { .. } => OpKind::Opaque,
        }
    }
}

impl SocketArgs {
    fn new(fd: &str, listen_port: &str, local_port: &str, ret: Option<&str>) -> Self {
        Self {
            fd: fd.to_string(),
            listen_port: listen_port.to_string(),
            local_port: local_port.to_string(),
            ret: ret.map(str::to_string),
        }
    }
}

/// Parse a hexadecimal number, with or without a `0x` prefix
pub fn parse_hex(token: &str) -> Option<u64> {
    let digits = token
        .strip_prefix("0x")
        .or_else(|| token.strip_prefix("0X"))
        .unwrap_or(token);
    u64::from_str_radix(digits, 16).ok()
}

/// A normalized operation in the global order
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Operation {
    /// Dense 0-based position in the global order
    pub id: usize,
    pub pid: u32,
    pub tid: u32,
    /// Sequence number assigned by the recording layer
    pub turn: u64,
    pub op: Op,
    /// Raw argument text as recorded
    pub args: String,
    /// Optional free text carried to the graph artifact
    pub info: Option<String>,
}

impl Operation {
    pub fn kind(&self) -> OpKind {
        self.op.kind()
    }

    /// Key that scopes a resource name to this operation's process
    pub fn scoped(&self, name: &str) -> String {
        format!("{}_{}", self.pid, name)
    }
}
