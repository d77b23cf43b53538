use super::*;
use async_trait::async_trait;
use shared::{
    domain::{Album, AlbumId, Post, PostId, User, UserId},
    protocol::PostTitleEcho,
};
use std::collections::HashSet;
use tokio::sync::Notify;

use crate::row::{DeleteAffordance, UpdateAffordance};

enum UpdateReply {
    EchoRequest,
    Title(String),
    Fail,
}

struct StubFeedApi {
    users: Vec<User>,
    albums: Vec<Album>,
    posts: Vec<Post>,
    failing_list: Option<Resource>,
    update_reply: UpdateReply,
    delete_fails: bool,
    update_gate: Option<Arc<Notify>>,
    delete_gate: Option<Arc<Notify>>,
    patches: Mutex<Vec<(PostId, String)>>,
    deletes: Mutex<Vec<PostId>>,
}

impl StubFeedApi {
    fn with_pools(users: Vec<User>, albums: Vec<Album>, posts: Vec<Post>) -> Self {
        Self {
            users,
            albums,
            posts,
            failing_list: None,
            update_reply: UpdateReply::EchoRequest,
            delete_fails: false,
            update_gate: None,
            delete_gate: None,
            patches: Mutex::new(Vec::new()),
            deletes: Mutex::new(Vec::new()),
        }
    }

    /// The single-member scenario: user 1 "Al", album 5 "Trip", post 9 "Hello".
    fn single() -> Self {
        Self::with_pools(
            vec![user(1, "Al")],
            vec![album(5, "Trip")],
            vec![post(9, "Hello")],
        )
    }

    fn large() -> Self {
        Self::with_pools(
            (1..=10).map(|id| user(id, &format!("user {id}"))).collect(),
            (1..=100).map(|id| album(id, &format!("album {id}"))).collect(),
            (1..=100).map(|id| post(id, &format!("post {id}"))).collect(),
        )
    }

    fn failing_list(mut self, resource: Resource) -> Self {
        self.failing_list = Some(resource);
        self
    }

    fn update_reply(mut self, reply: UpdateReply) -> Self {
        self.update_reply = reply;
        self
    }

    fn delete_fails(mut self) -> Self {
        self.delete_fails = true;
        self
    }

    fn update_gate(mut self, gate: Arc<Notify>) -> Self {
        self.update_gate = Some(gate);
        self
    }

    fn delete_gate(mut self, gate: Arc<Notify>) -> Self {
        self.delete_gate = Some(gate);
        self
    }

    fn list<T: Clone>(&self, resource: Resource, pool: &[T]) -> Result<Vec<T>> {
        if self.failing_list == Some(resource) {
            return Err(FeedError::Unavailable(format!("{resource} offline")));
        }
        Ok(pool.to_vec())
    }
}

#[async_trait]
impl FeedApi for StubFeedApi {
    async fn list_users(&self) -> Result<Vec<User>> {
        self.list(Resource::Users, &self.users)
    }

    async fn list_albums(&self) -> Result<Vec<Album>> {
        self.list(Resource::Albums, &self.albums)
    }

    async fn list_posts(&self) -> Result<Vec<Post>> {
        self.list(Resource::Posts, &self.posts)
    }

    async fn update_post_title(&self, post_id: PostId, title: &str) -> Result<PostTitleEcho> {
        self.patches.lock().await.push((post_id, title.to_string()));
        if let Some(gate) = &self.update_gate {
            gate.notified().await;
        }
        match &self.update_reply {
            UpdateReply::EchoRequest => Ok(PostTitleEcho {
                id: Some(post_id),
                title: Some(title.to_string()),
            }),
            UpdateReply::Title(title) => Ok(PostTitleEcho {
                id: Some(post_id),
                title: Some(title.clone()),
            }),
            UpdateReply::Fail => Err(FeedError::Unavailable("connection reset".into())),
        }
    }

    async fn delete_post(&self, post_id: PostId) -> Result<()> {
        self.deletes.lock().await.push(post_id);
        if let Some(gate) = &self.delete_gate {
            gate.notified().await;
        }
        if self.delete_fails {
            return Err(FeedError::Unavailable("connection reset".into()));
        }
        Ok(())
    }
}

fn user(id: i64, name: &str) -> User {
    User {
        id: UserId(id),
        name: name.to_string(),
        username: None,
        email: None,
    }
}

fn album(id: i64, title: &str) -> Album {
    Album {
        id: AlbumId(id),
        title: title.to_string(),
        user_id: None,
    }
}

fn post(id: i64, title: &str) -> Post {
    Post {
        id: PostId(id),
        title: title.to_string(),
        user_id: None,
        body: None,
    }
}

fn controller(api: StubFeedApi) -> (PageController, Arc<StubFeedApi>) {
    let api = Arc::new(api);
    let controller = PageController::new(
        api.clone(),
        PageConfig {
            sample_seed: Some(11),
            ..PageConfig::default()
        },
    );
    (controller, api)
}

async fn loaded(api: StubFeedApi) -> (PageController, Arc<StubFeedApi>, Vec<Row>) {
    let (controller, api) = controller(api);
    let rows = controller.load_and_render().await.expect("render");
    (controller, api, rows)
}

/// Lets spawned tasks run up to their next real suspension point.
async fn settle() {
    for _ in 0..16 {
        tokio::task::yield_now().await;
    }
}

#[tokio::test]
async fn renders_thirty_rows_and_removes_placeholder() {
    let (controller, _api) = controller(StubFeedApi::large());
    assert!(controller.is_loading().await);

    let rows = controller.load_and_render().await.expect("render");

    assert!(!controller.is_loading().await);
    assert_eq!(rows.len(), 30);
    assert_eq!(controller.rows().await, rows);
    for (index, row) in rows.iter().enumerate() {
        assert_eq!(row.key().index, index);
        assert_eq!(row.title_field(), row.post().title);
        assert_eq!(row.update(), None);
        assert!(!row.shows_confirmation());
        assert_eq!(row.delete(), DeleteAffordance::Idle);
        assert_eq!(row.delete().label(), "delete");
    }
}

#[tokio::test]
async fn single_member_pools_render_identical_rows() {
    let (_controller, _api, rows) = loaded(StubFeedApi::single()).await;

    assert_eq!(rows.len(), 30);
    for row in &rows {
        assert_eq!(row.title_field(), "Hello");
        assert_eq!(row.title_field_id(), "9");
        assert_eq!(row.album().title, "Trip");
        assert_eq!(row.album_label_id(), "album5");
        assert_eq!(row.user().name, "Al");
        assert_eq!(row.user_label_id(), "user1");
        assert_eq!(row.delete_label_id(), "9");
    }
    let keys: HashSet<RowKey> = rows.iter().map(Row::key).collect();
    assert_eq!(keys.len(), 30, "row keys must be unique even for repeated posts");
}

#[tokio::test]
async fn seeded_pages_render_the_same_rows() {
    let (_first, _api, first_rows) = loaded(StubFeedApi::large()).await;
    let (_second, _api, second_rows) = loaded(StubFeedApi::large()).await;
    assert_eq!(first_rows, second_rows);
}

#[tokio::test]
async fn initial_load_failure_renders_nothing() {
    let (controller, _api) = controller(StubFeedApi::large().failing_list(Resource::Albums));

    let err = controller.load_and_render().await.expect_err("must fail");

    assert!(
        matches!(err, FeedError::Load { resource: Resource::Albums, .. }),
        "unexpected error: {err}"
    );
    assert!(controller.is_loading().await);
    assert!(controller.rows().await.is_empty());
}

#[tokio::test]
async fn empty_collection_keeps_placeholder() {
    let (controller, _api) = controller(StubFeedApi::with_pools(
        vec![user(1, "Al")],
        vec![album(5, "Trip")],
        Vec::new(),
    ));

    let err = controller.load_and_render().await.expect_err("no posts");

    assert!(matches!(err, FeedError::EmptyCollection(Resource::Posts)));
    assert!(controller.is_loading().await);
}

#[tokio::test]
async fn repeated_edits_insert_a_single_update_affordance() {
    let (controller, _api, rows) = loaded(StubFeedApi::single()).await;
    let key = rows[3].key();
    let mut events = controller.subscribe_events();

    for value in ["Hello!", "Hello!!", "Hello!!!"] {
        controller.on_post_edited(key, value).await.expect("edit");
    }

    let row = controller.row(key).await.expect("row");
    assert_eq!(row.update(), Some(UpdateAffordance::Idle));
    assert_eq!(row.update().map(UpdateAffordance::label), Some("update"));
    assert_eq!(row.title_field(), "Hello!!!");

    let mut changed = 0;
    while let Ok(event) = events.try_recv() {
        if let PageEvent::RowChanged(row) = event {
            assert_eq!(row.key(), key);
            assert_eq!(row.update(), Some(UpdateAffordance::Idle));
            changed += 1;
        }
    }
    assert_eq!(changed, 3);

    let untouched = controller.row(rows[4].key()).await.expect("row");
    assert_eq!(untouched.update(), None);
}

#[tokio::test]
async fn update_click_without_affordance_is_ignored() {
    let (controller, api, rows) = loaded(StubFeedApi::single()).await;

    let outcome = controller
        .on_update_clicked(rows[0].key())
        .await
        .expect("click");

    assert_eq!(outcome, UpdateOutcome::Ignored);
    assert!(api.patches.lock().await.is_empty());
}

#[tokio::test(start_paused = true)]
async fn matching_echo_shows_confirmation_for_three_seconds() {
    let (controller, api, rows) = loaded(StubFeedApi::single()).await;
    let key = rows[0].key();
    controller.on_post_edited(key, "Hello2").await.expect("edit");

    let outcome = controller.on_update_clicked(key).await.expect("click");

    assert_eq!(outcome, UpdateOutcome::Confirmed);
    assert_eq!(
        api.patches.lock().await.as_slice(),
        &[(PostId(9), "Hello2".to_string())]
    );
    let row = controller.row(key).await.expect("row");
    assert_eq!(row.update(), None);
    assert!(row.shows_confirmation());

    tokio::time::sleep(Duration::from_millis(2999)).await;
    settle().await;
    assert!(controller.row(key).await.expect("row").shows_confirmation());

    tokio::time::sleep(Duration::from_millis(2)).await;
    settle().await;
    let row = controller.row(key).await.expect("row");
    assert!(!row.shows_confirmation());
    assert_eq!(row.update(), None);
    assert_eq!(row.title_field(), "Hello2");
}

#[tokio::test]
async fn patch_carries_title_at_click_time_and_compares_current_field() {
    let gate = Arc::new(Notify::new());
    let (controller, api, rows) =
        loaded(StubFeedApi::single().update_gate(gate.clone())).await;
    let key = rows[0].key();
    controller.on_post_edited(key, "Hello2").await.expect("edit");

    let click = tokio::spawn({
        let controller = controller.clone();
        async move { controller.on_update_clicked(key).await }
    });
    settle().await;

    let in_flight = controller.row(key).await.expect("row");
    assert_eq!(in_flight.update(), Some(UpdateAffordance::InProgress));
    assert_eq!(in_flight.update().map(UpdateAffordance::label), Some("updating..."));

    // Typing while the PATCH is in flight does not add a second affordance.
    controller.on_post_edited(key, "Hello3").await.expect("edit");
    gate.notify_one();
    let outcome = click.await.expect("join").expect("click");

    assert_eq!(
        api.patches.lock().await.as_slice(),
        &[(PostId(9), "Hello2".to_string())]
    );
    assert_eq!(
        outcome,
        UpdateOutcome::EchoMismatch {
            echoed: Some("Hello2".to_string())
        }
    );
    let row = controller.row(key).await.expect("row");
    assert_eq!(row.update(), Some(UpdateAffordance::InProgress));
    assert!(!row.shows_confirmation());
}

#[tokio::test]
async fn mismatched_echo_leaves_affordance_untouched() {
    let (controller, api, rows) =
        loaded(StubFeedApi::single().update_reply(UpdateReply::Title("Other".into()))).await;
    let key = rows[0].key();
    controller.on_post_edited(key, "Hello2").await.expect("edit");

    let outcome = controller.on_update_clicked(key).await.expect("click");

    assert_eq!(
        outcome,
        UpdateOutcome::EchoMismatch {
            echoed: Some("Other".to_string())
        }
    );
    let row = controller.row(key).await.expect("row");
    assert_eq!(row.update(), Some(UpdateAffordance::InProgress));
    assert!(!row.shows_confirmation());
    assert_eq!(
        controller.on_update_clicked(key).await.expect("click"),
        UpdateOutcome::Ignored
    );
    assert_eq!(api.patches.lock().await.len(), 1);
}

#[tokio::test]
async fn failed_update_leaves_affordance_stuck() {
    let (controller, api, rows) =
        loaded(StubFeedApi::single().update_reply(UpdateReply::Fail)).await;
    let key = rows[0].key();
    controller.on_post_edited(key, "Hello2").await.expect("edit");

    let outcome = controller.on_update_clicked(key).await.expect("click");

    assert_eq!(outcome, UpdateOutcome::Failed);
    let row = controller.row(key).await.expect("row");
    assert_eq!(row.update(), Some(UpdateAffordance::Stuck));
    assert_eq!(row.update().map(UpdateAffordance::label), Some("updating..."));

    // No path back to idle: further edits and clicks change nothing.
    controller.on_post_edited(key, "Hello3").await.expect("edit");
    assert_eq!(
        controller.on_update_clicked(key).await.expect("click"),
        UpdateOutcome::Ignored
    );
    let row = controller.row(key).await.expect("row");
    assert_eq!(row.update(), Some(UpdateAffordance::Stuck));
    assert_eq!(row.title_field(), "Hello3");
    assert_eq!(api.patches.lock().await.len(), 1);
}

#[tokio::test]
async fn delete_removes_only_that_row() {
    let (controller, api, rows) = loaded(StubFeedApi::large()).await;
    let key = rows[7].key();
    let mut events = controller.subscribe_events();

    let outcome = controller.on_delete_clicked(key).await.expect("click");

    assert_eq!(outcome, DeleteOutcome::Removed);
    assert_eq!(api.deletes.lock().await.as_slice(), &[key.post_id]);
    assert!(controller.row(key).await.is_none());
    let remaining = controller.rows().await;
    assert_eq!(remaining.len(), 29);
    assert!(remaining.iter().all(|row| row.key() != key));

    let mut removed = false;
    while let Ok(event) = events.try_recv() {
        if let PageEvent::RowRemoved(removed_key) = event {
            assert_eq!(removed_key, key);
            removed = true;
        }
    }
    assert!(removed);
}

#[tokio::test]
async fn failed_delete_restores_label_and_stays_clickable() {
    let (controller, api, rows) = loaded(StubFeedApi::single().delete_fails()).await;
    let key = rows[0].key();

    let outcome = controller.on_delete_clicked(key).await.expect("click");

    assert_eq!(outcome, DeleteOutcome::Failed);
    let row = controller.row(key).await.expect("row still rendered");
    assert_eq!(row.delete(), DeleteAffordance::Idle);
    assert_eq!(row.delete().label(), "delete");
    assert_eq!(controller.rows().await.len(), 30);

    assert_eq!(
        controller.on_delete_clicked(key).await.expect("retry"),
        DeleteOutcome::Failed
    );
    assert_eq!(api.deletes.lock().await.len(), 2);
}

#[tokio::test]
async fn delete_click_while_in_flight_is_ignored() {
    let gate = Arc::new(Notify::new());
    let (controller, api, rows) = loaded(StubFeedApi::single().delete_gate(gate.clone())).await;
    let key = rows[0].key();

    let click = tokio::spawn({
        let controller = controller.clone();
        async move { controller.on_delete_clicked(key).await }
    });
    settle().await;

    let row = controller.row(key).await.expect("row");
    assert_eq!(row.delete(), DeleteAffordance::InProgress);
    assert_eq!(row.delete().label(), "deleting...");
    assert_eq!(
        controller.on_delete_clicked(key).await.expect("second click"),
        DeleteOutcome::Ignored
    );

    gate.notify_one();
    assert_eq!(click.await.expect("join").expect("click"), DeleteOutcome::Removed);
    assert_eq!(api.deletes.lock().await.len(), 1);
}

#[tokio::test(start_paused = true)]
async fn confirmation_timer_is_a_noop_for_deleted_rows() {
    let (controller, _api, rows) = loaded(StubFeedApi::single()).await;
    let key = rows[0].key();
    controller.on_post_edited(key, "Hello2").await.expect("edit");
    assert_eq!(
        controller.on_update_clicked(key).await.expect("click"),
        UpdateOutcome::Confirmed
    );
    let mut events = controller.subscribe_events();

    assert_eq!(
        controller.on_delete_clicked(key).await.expect("delete"),
        DeleteOutcome::Removed
    );
    tokio::time::sleep(Duration::from_millis(3001)).await;
    settle().await;

    assert!(controller.row(key).await.is_none());
    assert_eq!(controller.rows().await.len(), 29);
    let mut last = None;
    while let Ok(event) = events.try_recv() {
        last = Some(event);
    }
    assert!(matches!(last, Some(PageEvent::RowRemoved(removed)) if removed == key));
}

#[tokio::test]
async fn unknown_row_is_an_error() {
    let (controller, _api, _rows) = loaded(StubFeedApi::single()).await;
    let key = RowKey {
        index: 99,
        post_id: PostId(9),
    };

    let err = controller.on_update_clicked(key).await.expect_err("unknown");
    assert!(matches!(err, FeedError::UnknownRow(missing) if missing == key));
    assert!(controller.on_delete_clicked(key).await.is_err());
    assert!(controller.on_post_edited(key, "x").await.is_err());
}
