use std::{
    sync::{Arc, Weak},
    time::Duration,
};

use futures::TryFutureExt;
use indexmap::IndexMap;
use rand::{rngs::StdRng, SeedableRng};
use shared::domain::Resource;
use tokio::sync::{broadcast, Mutex};
use tracing::{debug, error, info};

use crate::{
    api::FeedApi,
    config::{ClientSettings, DEFAULT_CONFIRMATION_DELAY_MS, DEFAULT_ROW_COUNT},
    error::{FeedError, Result},
    row::{Row, RowKey},
    sampling::compose_rows,
};

const EVENT_CHANNEL_CAPACITY: usize = 256;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PageConfig {
    pub row_count: usize,
    pub confirmation_delay: Duration,
    pub sample_seed: Option<u64>,
}

impl Default for PageConfig {
    fn default() -> Self {
        Self {
            row_count: DEFAULT_ROW_COUNT,
            confirmation_delay: Duration::from_millis(DEFAULT_CONFIRMATION_DELAY_MS),
            sample_seed: None,
        }
    }
}

impl From<&ClientSettings> for PageConfig {
    fn from(settings: &ClientSettings) -> Self {
        Self {
            row_count: settings.row_count,
            confirmation_delay: settings.confirmation_delay(),
            sample_seed: settings.sample_seed,
        }
    }
}

#[derive(Debug, Clone)]
pub enum PageEvent {
    Rendered(Vec<Row>),
    RowChanged(Row),
    RowRemoved(RowKey),
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum UpdateOutcome {
    /// Echo matched the field; a confirmation replaced the affordance.
    Confirmed,
    /// Request succeeded but the echoed title differs from the field.
    EchoMismatch { echoed: Option<String> },
    /// Request failed; the affordance is now stuck.
    Failed,
    /// The affordance was absent or not idle; nothing was sent.
    Ignored,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DeleteOutcome {
    Removed,
    Failed,
    Ignored,
}

type RowCell = Arc<Mutex<Row>>;

struct PageState {
    loading: bool,
    rows: IndexMap<RowKey, RowCell>,
    rng: StdRng,
}

/// Owns the rendered rows and drives their affordances. Cheap to clone; all
/// clones share one page.
#[derive(Clone)]
pub struct PageController {
    api: Arc<dyn FeedApi>,
    config: PageConfig,
    state: Arc<Mutex<PageState>>,
    events: broadcast::Sender<PageEvent>,
}

impl PageController {
    pub fn new(api: Arc<dyn FeedApi>, config: PageConfig) -> Self {
        let rng = match config.sample_seed {
            Some(seed) => StdRng::seed_from_u64(seed),
            None => StdRng::from_os_rng(),
        };
        let (events, _) = broadcast::channel(EVENT_CHANNEL_CAPACITY);
        Self {
            api,
            config,
            state: Arc::new(Mutex::new(PageState {
                loading: true,
                rows: IndexMap::new(),
                rng,
            })),
            events,
        }
    }

    pub fn config(&self) -> &PageConfig {
        &self.config
    }

    pub fn subscribe_events(&self) -> broadcast::Receiver<PageEvent> {
        self.events.subscribe()
    }

    /// True until the first successful render removes the placeholder.
    pub async fn is_loading(&self) -> bool {
        self.state.lock().await.loading
    }

    pub async fn rows(&self) -> Vec<Row> {
        let cells: Vec<RowCell> = self.state.lock().await.rows.values().cloned().collect();
        let mut rows = Vec::with_capacity(cells.len());
        for cell in cells {
            rows.push(cell.lock().await.clone());
        }
        rows
    }

    pub async fn row(&self, key: RowKey) -> Option<Row> {
        let cell = self.state.lock().await.rows.get(&key).cloned()?;
        let row = cell.lock().await.clone();
        Some(row)
    }

    /// Fetches all three collections concurrently and renders rows once every
    /// request has succeeded. On error nothing is rendered and the page stays
    /// in its loading state.
    pub async fn load_and_render(&self) -> Result<Vec<Row>> {
        info!("loading users, albums and posts");
        let (users, albums, posts) = futures::try_join!(
            self.api
                .list_users()
                .map_err(|err| FeedError::load(Resource::Users, err)),
            self.api
                .list_albums()
                .map_err(|err| FeedError::load(Resource::Albums, err)),
            self.api
                .list_posts()
                .map_err(|err| FeedError::load(Resource::Posts, err)),
        )?;
        debug!(
            users = users.len(),
            albums = albums.len(),
            posts = posts.len(),
            "collections loaded"
        );

        let mut state = self.state.lock().await;
        let seeds = compose_rows(
            &users,
            &albums,
            &posts,
            self.config.row_count,
            &mut state.rng,
        )?;

        state.loading = false;
        state.rows.clear();
        let mut rendered = Vec::with_capacity(seeds.len());
        for (index, seed) in seeds.into_iter().enumerate() {
            let row = Row::new(index, seed.user, seed.album, seed.post);
            rendered.push(row.clone());
            state.rows.insert(row.key(), Arc::new(Mutex::new(row)));
        }
        drop(state);

        info!(rows = rendered.len(), "board rendered");
        self.emit(PageEvent::Rendered(rendered.clone()));
        Ok(rendered)
    }

    /// Records a new title field value, inserting the update affordance if
    /// the row does not show one yet.
    pub async fn on_post_edited(&self, key: RowKey, value: impl Into<String>) -> Result<Row> {
        let cell = self.row_cell(key).await?;
        let mut row = cell.lock().await;
        if row.edit_title(value.into()) {
            debug!(row = %key, "update affordance inserted");
        }
        let snapshot = row.clone();
        drop(row);
        self.emit(PageEvent::RowChanged(snapshot.clone()));
        Ok(snapshot)
    }

    pub async fn on_update_clicked(&self, key: RowKey) -> Result<UpdateOutcome> {
        let cell = self.row_cell(key).await?;
        let title = {
            let mut row = cell.lock().await;
            let Some(title) = row.begin_update() else {
                return Ok(UpdateOutcome::Ignored);
            };
            self.emit(PageEvent::RowChanged(row.clone()));
            title
        };

        let result = self.api.update_post_title(key.post_id, &title).await;

        let mut row = cell.lock().await;
        let outcome = match result {
            Ok(echo) if echo.confirms(row.title_field()) => {
                let ticket = row.confirm_update();
                if !row.is_detached() {
                    self.schedule_confirmation_dismissal(Arc::downgrade(&cell), ticket);
                }
                info!(row = %key, "post title updated");
                UpdateOutcome::Confirmed
            }
            Ok(echo) => {
                debug!(row = %key, echoed = ?echo.title, "title echo does not match field");
                return Ok(UpdateOutcome::EchoMismatch { echoed: echo.title });
            }
            Err(err) => {
                error!(row = %key, post_id = %key.post_id, "fetch error: {err}");
                row.mark_update_stuck();
                UpdateOutcome::Failed
            }
        };
        if !row.is_detached() {
            self.emit(PageEvent::RowChanged(row.clone()));
        }
        Ok(outcome)
    }

    pub async fn on_delete_clicked(&self, key: RowKey) -> Result<DeleteOutcome> {
        let cell = self.row_cell(key).await?;
        {
            let mut row = cell.lock().await;
            if !row.begin_delete() {
                return Ok(DeleteOutcome::Ignored);
            }
            self.emit(PageEvent::RowChanged(row.clone()));
        }

        match self.api.delete_post(key.post_id).await {
            Ok(()) => {
                cell.lock().await.detach();
                self.state.lock().await.rows.shift_remove(&key);
                info!(row = %key, "row deleted");
                self.emit(PageEvent::RowRemoved(key));
                Ok(DeleteOutcome::Removed)
            }
            Err(err) => {
                error!(row = %key, post_id = %key.post_id, "fetch error: {err}");
                let mut row = cell.lock().await;
                row.revert_delete();
                self.emit(PageEvent::RowChanged(row.clone()));
                Ok(DeleteOutcome::Failed)
            }
        }
    }

    async fn row_cell(&self, key: RowKey) -> Result<RowCell> {
        self.state
            .lock()
            .await
            .rows
            .get(&key)
            .cloned()
            .ok_or(FeedError::UnknownRow(key))
    }

    /// The timer only holds a weak handle; a row deleted in the meantime is
    /// left alone.
    fn schedule_confirmation_dismissal(&self, row: Weak<Mutex<Row>>, ticket: u64) {
        let delay = self.config.confirmation_delay;
        let events = self.events.clone();
        tokio::spawn(async move {
            tokio::time::sleep(delay).await;
            let Some(cell) = row.upgrade() else {
                debug!("row released before its confirmation expired");
                return;
            };
            let mut row = cell.lock().await;
            if row.is_detached() {
                return;
            }
            if row.dismiss_confirmation(ticket) {
                let _ = events.send(PageEvent::RowChanged(row.clone()));
            }
        });
    }

    fn emit(&self, event: PageEvent) {
        // Err only means nobody is subscribed.
        let _ = self.events.send(event);
    }
}

#[cfg(test)]
#[path = "tests/page_tests.rs"]
mod tests;
