use crate::outbox::{Inbound, Outbox};
use crate::protocol::{Query, Reply};

/// Synchronous stand-in for the data-access collaborator.
///
/// Hosts that answer queries inline (tests, offline tools) implement this and
/// use [`serve`] to round-trip everything an outbox has queued.
pub trait DataSource {
    fn fetch(&mut self, query: &Query) -> Reply;
}

/// Answers every queued query in order and returns the replies for delivery.
pub fn serve<S: DataSource + ?Sized>(outbox: &mut Outbox, source: &mut S) -> Vec<Inbound> {
    outbox
        .drain()
        .into_iter()
        .map(|out| Inbound {
            token: out.token,
            reply: source.fetch(&out.query),
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::{DataSource, serve};
    use crate::outbox::Outbox;
    use crate::protocol::{Query, Reply};

    struct Offline;

    impl DataSource for Offline {
        fn fetch(&mut self, _query: &Query) -> Reply {
            Reply::TransportFailed {
                message: "offline".into(),
            }
        }
    }

    #[test]
    fn serve_answers_each_queued_query() {
        let mut out = Outbox::new();
        let token = out.submit(Query::ActiveTrajectory {
            embedding: "umap".into(),
        });
        let replies = serve(&mut out, &mut Offline);
        assert_eq!(replies.len(), 1);
        assert_eq!(replies[0].token, token);
        assert!(out.accept(replies[0].clone()).is_some());
    }
}
