//! Request handling
//!
//! Translates decoded requests into commit log calls and wraps the result
//! in a reply addressed back to the sender.

use std::sync::Arc;
use std::sync::OnceLock;
use std::sync::atomic::{AtomicU64, Ordering};

use klog_store::{CommitLog, PollRequest};
use serde_json::Value;
use tracing::{debug, debug_span, info, warn};

use crate::protocol::{Message, ReplyBody, Request, Response};

/// Identity assigned by the `init` request
///
/// Recorded on every request span once known.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NodeIdentity {
    pub node_id: String,
    pub node_ids: Vec<String>,
}

/// Serves requests against a shared commit log
pub struct Handler {
    log: Arc<dyn CommitLog>,
    identity: OnceLock<NodeIdentity>,
    next_msg_id: AtomicU64,
}

impl Handler {
    pub fn new(log: Arc<dyn CommitLog>) -> Self {
        Self {
            log,
            identity: OnceLock::new(),
            next_msg_id: AtomicU64::new(1),
        }
    }

    /// Identity received in `init`, if any
    pub fn identity(&self) -> Option<&NodeIdentity> {
        self.identity.get()
    }

    /// Handle one raw input line, returning the serialized reply.
    ///
    /// Lines that are not message envelopes cannot be answered and yield
    /// `None`.
    pub fn handle_line(&self, line: &str) -> Option<String> {
        let message: Message<Value> = match serde_json::from_str(line) {
            Ok(message) => message,
            Err(e) => {
                warn!(error = %e, "Dropping undecodable message");
                return None;
            }
        };

        let reply = self.handle(message);
        match serde_json::to_string(&reply) {
            Ok(line) => Some(line),
            Err(e) => {
                warn!(error = %e, "Failed to encode reply");
                None
            }
        }
    }

    /// Handle one message and build its reply.
    pub fn handle(&self, message: Message<Value>) -> Message<ReplyBody> {
        let in_reply_to = message.body.get("msg_id").and_then(Value::as_u64);
        let node = self.identity().map_or("-", |identity| identity.node_id.as_str());
        let _span = debug_span!("request", node, src = %message.src, in_reply_to).entered();

        let response = match Request::decode(message.body) {
            Ok(request) => self.dispatch(request),
            Err(e) => {
                warn!(src = %message.src, error = %e, "Rejecting request");
                Response::from(&e)
            }
        };

        Message {
            src: message.dest,
            dest: message.src,
            body: ReplyBody {
                response,
                msg_id: Some(self.next_msg_id.fetch_add(1, Ordering::Relaxed)),
                in_reply_to,
            },
        }
    }

    fn dispatch(&self, request: Request) -> Response {
        match request {
            Request::Init { node_id, node_ids } => {
                let identity = NodeIdentity {
                    node_id: node_id.clone(),
                    node_ids,
                };
                match self.identity.set(identity) {
                    Ok(()) => info!(%node_id, "Node initialized"),
                    Err(_) => warn!(%node_id, "Node already initialized, ignoring init"),
                }
                Response::InitOk
            }
            Request::Send { key, msg } => {
                let offset = self.log.append(&key, msg);
                debug!(%key, offset, "Appended");
                Response::SendOk { offset }
            }
            Request::Poll { offsets } => {
                let msgs = self.log.poll(&PollRequest::from_offsets(offsets));
                debug!(keys = msgs.len(), "Polled");
                Response::PollOk { msgs }
            }
            Request::CommitOffsets { offsets } => {
                self.log.commit_offsets(&offsets);
                debug!(keys = offsets.len(), "Committed offsets");
                Response::CommitOffsetsOk
            }
            Request::ListCommittedOffsets { keys } => {
                let offsets = self.log.list_committed_offsets(&keys);
                Response::ListCommittedOffsetsOk { offsets }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use std::collections::HashMap;

    use klog_store::{Entry, InMemoryCommitLog};
    use serde_json::json;

    use super::*;

    fn handler() -> Handler {
        Handler::new(Arc::new(InMemoryCommitLog::new()))
    }

    fn request(body: Value) -> Message<Value> {
        Message {
            src: "c1".to_string(),
            dest: "n1".to_string(),
            body,
        }
    }

    #[test]
    fn reply_swaps_addresses_and_correlates() {
        let handler = handler();

        let reply = handler.handle(request(
            json!({"type": "send", "key": "k", "msg": 1, "msg_id": 9}),
        ));

        assert_eq!(reply.src, "n1");
        assert_eq!(reply.dest, "c1");
        assert_eq!(reply.body.in_reply_to, Some(9));
        assert_eq!(reply.body.response, Response::SendOk { offset: 1000 });
    }

    #[test]
    fn reply_msg_ids_increase() {
        let handler = handler();

        let first = handler.handle(request(json!({"type": "poll"})));
        let second = handler.handle(request(json!({"type": "poll"})));

        assert!(second.body.msg_id > first.body.msg_id);
    }

    #[test]
    fn init_records_identity_once() {
        let handler = handler();

        let reply = handler.handle(request(
            json!({"type": "init", "node_id": "n1", "node_ids": ["n1", "n2"]}),
        ));
        assert_eq!(reply.body.response, Response::InitOk);

        handler.handle(request(json!({"type": "init", "node_id": "n9"})));

        let identity = handler.identity().unwrap();
        assert_eq!(identity.node_id, "n1");
        assert_eq!(identity.node_ids, vec!["n1", "n2"]);
    }

    #[test]
    fn poll_and_commit_through_handler() {
        let handler = handler();
        handler.handle(request(json!({"type": "send", "key": "x", "msg": 5})));
        handler.handle(request(json!({"type": "send", "key": "x", "msg": 6})));

        let reply = handler.handle(request(json!({"type": "poll", "offsets": {"x": 1001}})));
        assert_eq!(
            reply.body.response,
            Response::PollOk {
                msgs: HashMap::from([("x".to_string(), vec![Entry::new(1001, 6)])])
            }
        );

        handler.handle(request(json!({"type": "commit_offsets", "offsets": {"x": 1001}})));
        let reply = handler.handle(request(
            json!({"type": "list_committed_offsets", "keys": ["x", "y"]}),
        ));
        assert_eq!(
            reply.body.response,
            Response::ListCommittedOffsetsOk {
                offsets: HashMap::from([("x".to_string(), 1001)])
            }
        );
    }

    #[test]
    fn malformed_request_gets_error_reply() {
        let handler = handler();

        let reply = handler.handle(request(json!({"type": "send", "key": "k", "msg_id": 4})));

        assert_eq!(reply.body.in_reply_to, Some(4));
        assert!(matches!(
            reply.body.response,
            Response::Error { code: crate::error::MALFORMED_REQUEST, .. }
        ));
    }

    #[test]
    fn handle_line_drops_garbage() {
        let handler = handler();
        assert!(handler.handle_line("not json").is_none());
        assert!(handler.handle_line(r#"{"body": {}}"#).is_none());
    }
}
