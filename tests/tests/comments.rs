use lectern_api::{CommentOrdering, Error as ApiError};
use lectern_client::{pages::CommentThread, Error, Loadable};
use tests::Fixture;

fn contents(thread: &CommentThread<impl lectern_client::Backend>) -> Vec<(usize, String)> {
    thread
        .state()
        .ready()
        .map(|roots| {
            roots
                .iter()
                .flat_map(|r| r.walk())
                .map(|(depth, n)| (depth, n.comment.content.clone()))
                .collect()
        })
        .unwrap_or_default()
}

#[tokio::test]
async fn empty_thread() {
    let f = Fixture::new();
    let mut thread = CommentThread::new(f.anonymous(), f.lectures[0].id);
    assert!(thread.state().is_loading());
    assert_eq!(*thread.load().await, Loadable::Empty);
    assert_eq!(thread.count(), 0);
}

#[tokio::test]
async fn replies_nest_up_to_the_limit() {
    let f = Fixture::new();
    let mut thread = CommentThread::new(f.as_student().await, f.lectures[0].id);
    thread.load().await;

    let root = thread.post("  What is a borrow?  ").await.unwrap();
    assert_eq!(root.content, "What is a borrow?");
    let reply = thread.reply(root.id, "A reference").await.unwrap();
    let nested = thread.reply(reply.id, "Thanks!").await.unwrap();
    assert_eq!(
        contents(&thread),
        vec![
            (0, String::from("What is a borrow?")),
            (1, String::from("A reference")),
            (2, String::from("Thanks!")),
        ]
    );
    assert_eq!(thread.count(), 3);
    assert_eq!(thread.depth_of(nested.id), Some(2));

    let creates = f.server.calls("create_comment");
    let err = thread.reply(nested.id, "Too deep").await.unwrap_err();
    match err {
        Error::Invalid(errs) => assert!(errs.get("parent").is_some()),
        e => panic!("unexpected error {e:?}"),
    }
    assert_eq!(f.server.calls("create_comment"), creates);
}

#[tokio::test]
async fn blank_comments_are_rejected_locally() {
    let f = Fixture::new();
    let mut thread = CommentThread::new(f.as_student().await, f.lectures[0].id);
    thread.load().await;
    let err = thread.post("   \n ").await.unwrap_err();
    assert!(matches!(err, Error::Invalid(_)));
    assert_eq!(f.server.calls("create_comment"), 0);
}

#[tokio::test]
async fn failed_post_keeps_the_thread() {
    let f = Fixture::new();
    let mut thread = CommentThread::new(f.as_student().await, f.lectures[0].id);
    thread.load().await;
    thread.post("first").await.unwrap();
    let before = thread.state().clone();
    let fetches = f.server.calls("list_comments");

    f.server
        .fail_next("create_comment", ApiError::Unknown(String::from("boom")));
    assert!(thread.post("second").await.is_err());
    assert_eq!(*thread.state(), before);
    assert_eq!(f.server.calls("list_comments"), fetches);
}

#[tokio::test]
async fn failed_refetch_leaves_stale_thread() {
    let f = Fixture::new();
    let mut thread = CommentThread::new(f.as_student().await, f.lectures[0].id);
    thread.load().await;
    thread.post("first").await.unwrap();

    f.server
        .fail_next("list_comments", ApiError::Unknown(String::from("boom")));
    thread.post("second").await.unwrap();
    assert_eq!(contents(&thread), vec![(0, String::from("first"))]);
    assert_eq!(thread.state().error(), None);

    thread.load().await;
    assert_eq!(thread.count(), 2);
}

#[tokio::test]
async fn deleting_a_parent_hides_its_replies() {
    let f = Fixture::new();
    let mut thread = CommentThread::new(f.as_student().await, f.lectures[0].id);
    thread.load().await;
    let root = thread.post("question").await.unwrap();
    thread.reply(root.id, "answer").await.unwrap();
    thread.post("another question").await.unwrap();
    assert_eq!(thread.count(), 3);

    thread.delete(root.id).await.unwrap();
    assert_eq!(contents(&thread), vec![(0, String::from("another question"))]);
    // the reply is still stored, just not reachable
    assert_eq!(f.server.test_comments(f.lectures[0].id).len(), 2);
}

#[tokio::test]
async fn ordering() {
    let f = Fixture::new();
    let mut thread = CommentThread::new(f.as_student().await, f.lectures[0].id);
    thread.load().await;
    thread.post("older").await.unwrap();
    thread.post("newer").await.unwrap();
    assert_eq!(thread.ordering(), CommentOrdering::NewestFirst);
    assert_eq!(
        contents(&thread),
        vec![(0, String::from("newer")), (0, String::from("older"))]
    );

    thread.set_ordering(CommentOrdering::OldestFirst).await;
    assert_eq!(
        contents(&thread),
        vec![(0, String::from("older")), (0, String::from("newer"))]
    );
}

#[tokio::test]
async fn only_authors_edit() {
    let f = Fixture::new();
    let mut mine = CommentThread::new(f.as_student().await, f.lectures[0].id);
    mine.load().await;
    let comment = mine.post("typo'd").await.unwrap();

    let mut theirs = CommentThread::new(f.as_instructor().await, f.lectures[0].id);
    theirs.load().await;
    let before = theirs.state().clone();
    let err = theirs.edit(comment.id, "vandalized").await.unwrap_err();
    assert_eq!(err.api(), Some(&ApiError::PermissionDenied));
    assert_eq!(*theirs.state(), before);

    mine.edit(comment.id, "fixed").await.unwrap();
    assert_eq!(contents(&mine), vec![(0, String::from("fixed"))]);
}

#[tokio::test]
async fn failed_load_shows_screen_message() {
    let f = Fixture::new();
    f.server
        .fail_next("list_comments", ApiError::Unknown(String::from("boom")));
    let mut thread = CommentThread::new(f.anonymous(), f.lectures[0].id);
    thread.load().await;
    assert_eq!(thread.state().error(), Some("Failed to load comments"));
}
