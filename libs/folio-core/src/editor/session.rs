use super::{Caret, Debouncer, EditorConfig, EditorEngine, EditorKey, Effect, Flusher, Notification};
use crate::{debug, warn, Block, BlockContent, BlockPatch, BlockType, DocumentStore, FolioError, FolioResult, Page};
use futures::future::BoxFuture;
use std::{collections::VecDeque, sync::Arc};
use tokio::{
    sync::mpsc::{unbounded_channel, UnboundedReceiver, UnboundedSender},
    task::JoinHandle,
};

/// What a debounced write targets.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum PendingKey {
    Block(String),
    Title(String),
}

/// One open page bound to a store. Wraps [`EditorEngine`] and carries out
/// its effects: content and title edits go through a per-key debouncer,
/// structural changes are written right away.
///
/// Store failures never surface as `Err` here. They are reported through
/// [`EditorSession::notifications`] and local state is left untouched.
pub struct EditorSession<S: DocumentStore + 'static> {
    store: Arc<S>,
    engine: EditorEngine,
    writes: Debouncer<PendingKey, String>,
    notifier: UnboundedSender<Notification>,
    inbox: UnboundedReceiver<Notification>,
}

impl<S: DocumentStore + 'static> EditorSession<S> {
    pub async fn open(store: Arc<S>, page_id: &str, config: EditorConfig) -> FolioResult<Self> {
        let page = store.get_page(page_id).await?;
        let blocks = store.list_blocks(page_id).await?;
        let (notifier, inbox) = unbounded_channel();

        let flusher: Flusher<PendingKey, String> = Arc::new({
            let store = store.clone();
            let notifier = notifier.clone();
            move |key: PendingKey, value: String| -> BoxFuture<'static, ()> {
                let store = store.clone();
                let notifier = notifier.clone();
                Box::pin(async move {
                    let (operation, result) = match &key {
                        PendingKey::Block(block_id) => (
                            "update_block",
                            store.update_block(block_id, BlockPatch::content(value)).await,
                        ),
                        PendingKey::Title(page_id) => ("rename_page", store.rename_page(page_id, &value).await),
                    };
                    match result {
                        Ok(()) => debug!("flushed {key:?}"),
                        Err(e) => {
                            warn!("failed to flush {key:?}: {e}");
                            // the session may already be gone
                            let _ = notifier.send(Notification::new(operation, &e));
                        }
                    }
                })
            }
        });

        Ok(Self {
            store,
            engine: EditorEngine::new(page, blocks),
            writes: Debouncer::new(config.debounce, flusher)?,
            notifier,
            inbox,
        })
    }

    pub fn engine(&self) -> &EditorEngine {
        &self.engine
    }

    pub fn page(&self) -> &Page {
        self.engine.page()
    }

    pub fn blocks(&self) -> &[Block] {
        self.engine.blocks()
    }

    pub fn is_pending(&self, key: &PendingKey) -> bool {
        self.writes.is_pending(key)
    }

    /// Failures reported since the last call.
    pub fn notifications(&mut self) -> Vec<Notification> {
        let mut notifications = Vec::new();
        while let Ok(notification) = self.inbox.try_recv() {
            notifications.push(notification);
        }
        notifications
    }

    fn notify(&self, operation: &'static str, error: FolioError) {
        warn!("{operation} failed: {error}");
        let _ = self.notifier.send(Notification::new(operation, &error));
    }

    /// Run effects in order. Returns the handles of flushes spawned along
    /// the way; interactive callers let them run detached.
    async fn apply(&mut self, effects: Vec<Effect>) -> Vec<JoinHandle<()>> {
        let mut queue = VecDeque::from(effects);
        let mut flushes = Vec::new();

        while let Some(effect) = queue.pop_front() {
            match effect {
                Effect::QueueContent { block_id, content } => {
                    self.writes.schedule(PendingKey::Block(block_id), content);
                }
                Effect::FlushContent { block_id } => {
                    flushes.extend(self.writes.flush(&PendingKey::Block(block_id)));
                }
                Effect::DiscardContent { block_id } => {
                    self.writes.cancel(&PendingKey::Block(block_id));
                }
                Effect::QueueTitle { page_id, title } => {
                    self.writes.schedule(PendingKey::Title(page_id), title);
                }
                Effect::FlushAll => flushes.extend(self.writes.flush_all()),
                Effect::UpdateBlock { block_id, patch } => {
                    if let Err(e) = self.store.update_block(&block_id, patch).await {
                        self.notify("update_block", e);
                    }
                }
                Effect::CreateBlock {
                    after,
                    block_type,
                    sort_position,
                } => {
                    let page_id = self.engine.page().id.clone();
                    match self.store.create_block(&page_id, block_type, sort_position).await {
                        Ok(block) => match self.engine.insert_created(after.as_deref(), block) {
                            Ok(more) => queue.extend(more),
                            Err(e) => self.notify("create_block", e),
                        },
                        Err(e) => self.notify("create_block", e),
                    }
                }
                Effect::DeleteBlock { block_id } => {
                    if let Err(e) = self.store.delete_block(&block_id).await {
                        self.notify("delete_block", e);
                    }
                }
                Effect::ReorderBlocks { page_id, ordered_ids } => {
                    if let Err(e) = self.store.reorder_blocks(&page_id, &ordered_ids).await {
                        self.notify("reorder_blocks", e);
                    }
                }
            }
        }

        flushes
    }

    async fn run(&mut self, effects: FolioResult<Vec<Effect>>) -> FolioResult {
        self.apply(effects?).await;
        Ok(())
    }

    pub async fn focus(&mut self, block_id: &str, caret: Caret) -> FolioResult {
        let effects = self.engine.focus_block(block_id, caret);
        self.run(effects).await
    }

    pub async fn blur(&mut self) {
        let effects = self.engine.blur();
        self.apply(effects).await;
    }

    pub async fn input(&mut self, block_id: &str, content: &str) -> FolioResult {
        let effects = self.engine.input(block_id, content);
        self.run(effects).await
    }

    pub async fn edit_content(&mut self, block_id: &str, content: &BlockContent) -> FolioResult {
        let effects = self.engine.edit_content(block_id, content);
        self.run(effects).await
    }

    pub async fn key(&mut self, key: EditorKey) -> FolioResult {
        let effects = self.engine.key(key);
        self.run(effects).await
    }

    pub async fn select_command(&mut self, candidate: usize) -> FolioResult {
        let effects = self.engine.select_command(candidate);
        self.run(effects).await
    }

    pub async fn add_block(&mut self, after: Option<&str>, block_type: BlockType) -> FolioResult {
        let effects = self.engine.add_block(after, block_type);
        self.run(effects).await
    }

    pub async fn move_block(&mut self, from: usize, to: usize) -> FolioResult {
        let effects = self.engine.move_block(from, to);
        self.run(effects).await
    }

    pub async fn toggle_todo(&mut self, block_id: &str) -> FolioResult {
        let effects = self.engine.toggle_todo(block_id);
        self.run(effects).await
    }

    pub async fn edit_title(&mut self, title: &str) -> FolioResult {
        let effects = self.engine.edit_title(title);
        self.run(effects).await
    }

    /// Write everything buffered and wait for the writes to finish.
    pub async fn flush(&mut self) {
        let flushes = self.writes.flush_all();
        join(flushes).await;
    }

    /// Refetch the page and its blocks. Pending writes are flushed first so
    /// the fetch sees them.
    pub async fn reload(&mut self) -> FolioResult {
        self.flush().await;
        let page_id = self.engine.page().id.clone();
        let page = self.store.get_page(&page_id).await?;
        let blocks = self.store.list_blocks(&page_id).await?;
        self.engine.reload(page, blocks);
        Ok(())
    }

    /// Leave the page. Every pending write is flushed and awaited; failures
    /// not yet collected are returned.
    pub async fn close(mut self) -> Vec<Notification> {
        let effects = self.engine.teardown();
        let flushes = self.apply(effects).await;
        join(flushes).await;
        self.notifications()
    }
}

async fn join(flushes: Vec<JoinHandle<()>>) {
    for flush in flushes {
        if let Err(e) = flush.await {
            warn!("flush task failed: {e}");
        }
    }
}
