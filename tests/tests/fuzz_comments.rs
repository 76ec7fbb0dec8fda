use std::{collections::HashMap, panic::AssertUnwindSafe};

use lectern_api::{CommentId, CommentOrdering};
use lectern_client::{pages::CommentThread, CommentNode, Error, MAX_REPLY_DEPTH};
use lectern_mock_server::MockServer;
use tests::Fixture;

macro_rules! do_tokio_test {
    ( $name:ident, $typ:ty, $fn:expr ) => {
        #[test]
        fn $name() {
            let runtime = AssertUnwindSafe(
                tokio::runtime::Builder::new_current_thread()
                    .enable_all()
                    .build()
                    .expect("failed initializing tokio runtime"),
            );
            bolero::check!()
                .with_type::<$typ>()
                .cloned()
                .for_each(move |v| {
                    let () = runtime.block_on($fn(v));
                })
        }
    };
}

#[derive(Clone, Debug, bolero::generator::TypeGenerator)]
enum FuzzOp {
    Post,
    Reply(usize),
    Edit(usize),
    Delete(usize),
    Reload,
    FlipOrdering,
}

/// Maps an arbitrary fuzzer-provided index into the shown comments
fn pick(thread: &CommentThread<MockServer>, idx: usize) -> Option<CommentId> {
    let shown = thread
        .state()
        .ready()?
        .iter()
        .flat_map(|r| r.walk())
        .map(|(_, n)| n.id())
        .collect::<Vec<_>>();
    match shown.len() {
        0 => None,
        len => Some(shown[idx % len]),
    }
}

/// Number of stored comments whose whole ancestry is still stored
fn reachable(f: &Fixture) -> usize {
    let parents = f
        .server
        .test_comments(f.lectures[0].id)
        .into_iter()
        .map(|c| (c.id, c.parent))
        .collect::<HashMap<_, _>>();
    parents
        .keys()
        .filter(|id| {
            let mut cur = **id;
            loop {
                match parents.get(&cur) {
                    None => return false,
                    Some(None) => return true,
                    Some(Some(p)) => cur = *p,
                }
            }
        })
        .count()
}

fn check_node(node: &CommentNode, depth: usize) {
    assert!(depth <= MAX_REPLY_DEPTH, "comment {} nested too deep", node.id());
    for c in &node.children {
        assert_eq!(c.comment.parent, Some(node.id()));
        check_node(c, depth + 1);
    }
}

async fn execute(thread: &mut CommentThread<MockServer>, op: FuzzOp, n: usize) {
    let res = match op {
        FuzzOp::Post => thread.post(&format!("comment {n}")).await.map(|_| ()),
        FuzzOp::Reply(idx) => match pick(thread, idx) {
            Some(parent) => {
                let depth = thread.depth_of(parent);
                let res = thread.reply(parent, &format!("reply {n}")).await;
                if let Err(Error::Invalid(_)) = &res {
                    assert_eq!(depth, Some(MAX_REPLY_DEPTH));
                }
                res.map(|_| ())
            }
            None => Ok(()),
        },
        FuzzOp::Edit(idx) => match pick(thread, idx) {
            Some(id) => thread.edit(id, &format!("edit {n}")).await.map(|_| ()),
            None => Ok(()),
        },
        FuzzOp::Delete(idx) => match pick(thread, idx) {
            Some(id) => thread.delete(id).await,
            None => Ok(()),
        },
        FuzzOp::Reload => {
            thread.load().await;
            Ok(())
        }
        FuzzOp::FlipOrdering => {
            let flipped = match thread.ordering() {
                CommentOrdering::NewestFirst => CommentOrdering::OldestFirst,
                CommentOrdering::OldestFirst => CommentOrdering::NewestFirst,
            };
            thread.set_ordering(flipped).await;
            Ok(())
        }
    };
    match res {
        Ok(()) | Err(Error::Invalid(_)) => (),
        Err(e) => panic!("unexpected error {e:?}"),
    }
}

do_tokio_test!(
    comment_thread_matches_server,
    Vec<FuzzOp>,
    |ops: Vec<FuzzOp>| async move {
        let f = Fixture::new();
        let mut thread = CommentThread::new(f.as_student().await, f.lectures[0].id);
        thread.load().await;
        for (n, op) in ops.into_iter().enumerate() {
            execute(&mut thread, op, n).await;
            if let Some(roots) = thread.state().ready() {
                for r in roots {
                    check_node(r, 0);
                }
            }
            assert!(thread.state().error().is_none());
            assert_eq!(thread.count(), reachable(&f));
        }
    }
);
