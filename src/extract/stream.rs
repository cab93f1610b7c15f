//! Byte-stream causality over sockets
//!
//! Connections are matched per listening port in FIFO order: the second
//! phase of an accept pairs with the oldest pending connect on the port, and
//! the second phase of a connect with the oldest pending accept. Each match
//! records the peer of the local descriptor.
//!
//! Writes on a connected descriptor queue segments for its peer. A completed
//! read consumes bytes from the head of the peer's queue, one edge per
//! segment touched, so one write can feed several reads and one read can
//! drain several writes:
//!
//! ```text
//!   WRITE(20, 10 bytes) ──"consumed 6 bytes"──► READ_S(30, 6 bytes)
//!          └────────────"consumed 4 bytes"──► READ_S(31, 4 bytes)
//! ```
//!
//! Descriptor reuse within a process is not modelled, and repeated
//! connections on the same port are only matched correctly when they do not
//! overlap.

use super::{Edge, EdgeSource, Extractor};
use crate::error::{AnalysisError, Result};
use crate::operation::{Op, Operation, SocketArgs, TransferArgs};
use std::collections::{HashMap, VecDeque};
use std::fmt;

#[derive(Debug, Default, Clone, Copy)]
pub struct StreamExtractor;

/// A file descriptor scoped to its process
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
struct FdKey {
    pid: u32,
    fd: String,
}

impl FdKey {
    fn of(op: &Operation, fd: &str) -> Self {
        Self {
            pid: op.pid,
            fd: fd.to_string(),
        }
    }
}

impl fmt::Display for FdKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}_{}", self.pid, self.fd)
    }
}

/// First phase of an accept or connect waiting for its partner
#[derive(Debug, Clone)]
struct PendingEnd {
    id: usize,
    fd: FdKey,
}

#[derive(Debug, Default)]
struct PortQueues {
    connects: VecDeque<PendingEnd>,
    accepts: VecDeque<PendingEnd>,
}

/// Unread bytes of one write
#[derive(Debug)]
struct Segment {
    remaining: u64,
    writer: usize,
}

#[derive(Debug, Default)]
struct StreamState {
    ports: HashMap<String, PortQueues>,
    peers: HashMap<FdKey, FdKey>,
    outgoing: HashMap<FdKey, VecDeque<Segment>>,
    edges: Vec<Edge>,
}

impl StreamState {
    fn port(&mut self, listen_port: &str) -> &mut PortQueues {
        self.ports.entry(listen_port.to_string()).or_default()
    }

    fn accept_second(&mut self, op: &Operation, args: &SocketArgs) -> Result<()> {
        let local = FdKey::of(op, &args.fd);
        let connect = self
            .port(&args.listen_port)
            .connects
            .pop_front()
            .ok_or_else(|| {
                AnalysisError::protocol(
                    op.id,
                    format!("accept on port {} with no pending connect", args.listen_port),
                )
            })?;

        let label = format!(
            "listenPort = {}, accFD = {}, connFD = {}",
            args.listen_port, local, connect.fd
        );
        self.peers.insert(local, connect.fd);
        self.edges
            .push(Edge::new(connect.id, op.id, label, EdgeSource::Stream));
        Ok(())
    }

    fn connect_second(&mut self, op: &Operation, args: &SocketArgs) -> Result<()> {
        let local = FdKey::of(op, &args.fd);
        let accept = self
            .port(&args.listen_port)
            .accepts
            .pop_front()
            .ok_or_else(|| {
                AnalysisError::protocol(
                    op.id,
                    format!("connect to port {} with no pending accept", args.listen_port),
                )
            })?;

        let label = format!(
            "listenPort = {}, accFD = {}, connFD = {}",
            args.listen_port, accept.fd, local
        );
        self.peers.insert(local, accept.fd);
        self.edges
            .push(Edge::new(accept.id, op.id, label, EdgeSource::Stream));
        Ok(())
    }

    fn write(&mut self, op: &Operation, args: &TransferArgs) {
        let local = FdKey::of(op, &args.fd);
        if !self.peers.contains_key(&local) {
            tracing::debug!("write {} on unconnected fd {} ignored", op.id, local);
            return;
        }
        if args.size == 0 {
            return;
        }
        self.outgoing.entry(local).or_default().push_back(Segment {
            remaining: args.size,
            writer: op.id,
        });
    }

    fn read_second(&mut self, op: &Operation, args: &TransferArgs) -> Result<()> {
        let local = FdKey::of(op, &args.fd);
        let Some(remote) = self.peers.get(&local) else {
            tracing::debug!("read {} on unconnected fd {} ignored", op.id, local);
            return Ok(());
        };

        let queue = self.outgoing.entry(remote.clone()).or_default();
        let mut wanted = args.size;
        while wanted > 0 {
            let segment = queue.front_mut().ok_or_else(|| {
                AnalysisError::protocol(
                    op.id,
                    format!(
                        "read of {} bytes on fd {} has {} bytes unaccounted for by peer writes",
                        args.size, local, wanted
                    ),
                )
            })?;

            let consumed = wanted.min(segment.remaining);
            self.edges.push(Edge::new(
                segment.writer,
                op.id,
                format!("consumed {} bytes", consumed),
                EdgeSource::Stream,
            ));
            segment.remaining -= consumed;
            wanted -= consumed;
            if segment.remaining == 0 {
                queue.pop_front();
            }
        }
        Ok(())
    }
}

impl Extractor for StreamExtractor {
    fn source(&self) -> EdgeSource {
        EdgeSource::Stream
    }

    fn extract(&self, operations: &[Operation]) -> Result<Vec<Edge>> {
        let mut state = StreamState::default();

        for op in operations {
            match &op.op {
                Op::ConnectFirst(args) => {
                    let pending = PendingEnd {
                        id: op.id,
                        fd: FdKey::of(op, &args.fd),
                    };
                    state.port(&args.listen_port).connects.push_back(pending);
                }
                Op::AcceptFirst(args) => {
                    let pending = PendingEnd {
                        id: op.id,
                        fd: FdKey::of(op, &args.fd),
                    };
                    state.port(&args.listen_port).accepts.push_back(pending);
                }
                Op::AcceptSecond(args) => state.accept_second(op, args)?,
                Op::ConnectSecond(args) => state.connect_second(op, args)?,
                Op::Write(args) => state.write(op, args),
                Op::ReadSecond(args) => state.read_second(op, args)?,
                _ => {}
            }
        }

        Ok(state.edges)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::extract::tests::{connected_pair, op, ops};

    #[test]
    fn test_accept_connect_handshake_edges() {
        let trace = ops(connected_pair());
        let edges = StreamExtractor.extract(&trace).unwrap();
        let pairs: Vec<(usize, usize)> = edges.iter().map(|e| (e.from, e.to)).collect();
        // CONN_F(1) -> ACC_S(2), ACC_F(0) -> CONN_S(3)
        assert_eq!(pairs, vec![(1, 2), (0, 3)]);
        assert_eq!(
            edges[0].label,
            "listenPort = 8080, accFD = 1_4, connFD = 2_3"
        );
        assert_eq!(
            edges[1].label,
            "listenPort = 8080, accFD = 1_4, connFD = 2_3"
        );
    }

    #[test]
    fn test_one_read_spans_several_writes() {
        let mut entries = connected_pair();
        entries.push(op(2, 1, "write", "s 3 4"));
        entries.push(op(2, 1, "write", "s 3 6"));
        entries.push(op(1, 1, "read_first", "s 4 a"));
        entries.push(op(1, 1, "read_second", "s 4 a"));
        let trace = ops(entries);

        let edges = StreamExtractor.extract(&trace).unwrap();
        let reads: Vec<(usize, usize, &str)> = edges[2..]
            .iter()
            .map(|e| (e.from, e.to, e.label.as_str()))
            .collect();
        assert_eq!(
            reads,
            vec![(4, 7, "consumed 4 bytes"), (5, 7, "consumed 6 bytes")]
        );
    }

    #[test]
    fn test_partial_segment_carries_to_next_read() {
        let mut entries = connected_pair();
        entries.push(op(1, 1, "write", "s 4 8"));
        entries.push(op(2, 1, "read_second", "s 3 3"));
        entries.push(op(2, 1, "read_second", "s 3 5"));
        let trace = ops(entries);

        let edges = StreamExtractor.extract(&trace).unwrap();
        let reads: Vec<(usize, usize, &str)> = edges[2..]
            .iter()
            .map(|e| (e.from, e.to, e.label.as_str()))
            .collect();
        assert_eq!(
            reads,
            vec![(4, 5, "consumed 3 bytes"), (4, 6, "consumed 5 bytes")]
        );
    }

    #[test]
    fn test_unconnected_fds_are_ignored() {
        let trace = ops(vec![
            op(1, 1, "write", "s 9 10"),
            op(2, 1, "read_second", "s 9 10"),
        ]);
        assert!(StreamExtractor.extract(&trace).unwrap().is_empty());
    }

    #[test]
    fn test_accept_without_connect_is_fatal() {
        let trace = ops(vec![
            op(1, 1, "accept_first", "4 8080 8080"),
            op(1, 1, "accept_second", "4 8080 8080"),
        ]);
        let err = StreamExtractor.extract(&trace).unwrap_err();
        assert!(matches!(err, AnalysisError::Protocol { id: 1, .. }));
    }

    #[test]
    fn test_read_beyond_written_bytes_is_fatal() {
        let mut entries = connected_pair();
        entries.push(op(2, 1, "write", "s 3 2"));
        entries.push(op(1, 1, "read_second", "s 4 5"));
        let trace = ops(entries);
        assert!(StreamExtractor.extract(&trace).is_err());
    }

    #[test]
    fn test_connections_matched_fifo_per_port() {
        let trace = ops(vec![
            op(2, 1, "connect_first", "3 80 5001 0"),
            op(3, 1, "connect_first", "3 80 5002 0"),
            op(1, 1, "accept_second", "4 80 80"),
            op(1, 1, "accept_second", "5 80 80"),
        ]);
        let edges = StreamExtractor.extract(&trace).unwrap();
        assert_eq!(edges[0].from, 0);
        assert_eq!(edges[0].label, "listenPort = 80, accFD = 1_4, connFD = 2_3");
        assert_eq!(edges[1].from, 1);
        assert_eq!(edges[1].label, "listenPort = 80, accFD = 1_5, connFD = 3_3");
    }
}
