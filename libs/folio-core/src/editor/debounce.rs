use crate::{debug, FolioError, FolioResult};
use futures::future::BoxFuture;
use parking_lot::Mutex;
use std::{collections::HashMap, hash::Hash, sync::Arc, time::Duration};
use tokio::{
    runtime::Handle,
    sync::oneshot,
    task::JoinHandle,
    time::sleep,
};

/// Writes one pending value to its destination.
pub type Flusher<K, V> = Arc<dyn Fn(K, V) -> BoxFuture<'static, ()> + Send + Sync>;

struct Pending<V> {
    value: V,
    generation: u64,
    timer: Option<JoinHandle<()>>,
}

struct Slots<K, V> {
    entries: HashMap<K, Pending<V>>,
    /// Completion signal of the newest write started for each key.
    tails: HashMap<K, (u64, oneshot::Receiver<()>)>,
    generation: u64,
}

struct Shared<K, V> {
    runtime: Handle,
    flusher: Flusher<K, V>,
    slots: Mutex<Slots<K, V>>,
}

impl<K, V> Shared<K, V>
where
    K: Clone + Eq + Hash + Send + 'static,
    V: Send + 'static,
{
    /// Hand a value to the flusher. Writes of one key run one at a time, in
    /// the order they are started here, so an older value can never land
    /// after a newer one.
    fn start_write(self: &Arc<Self>, slots: &mut Slots<K, V>, key: K, value: V) -> JoinHandle<()> {
        slots.generation += 1;
        let generation = slots.generation;
        let (done, tail) = oneshot::channel::<()>();
        let previous = slots
            .tails
            .insert(key.clone(), (generation, tail))
            .map(|(_, previous)| previous);

        let shared = self.clone();
        self.runtime.spawn(async move {
            if let Some(previous) = previous {
                // resolves once the earlier write is done, whatever its outcome
                let _ = previous.await;
            }
            (shared.flusher)(key.clone(), value).await;
            {
                let mut slots = shared.slots.lock();
                if slots.tails.get(&key).map(|(g, _)| *g) == Some(generation) {
                    slots.tails.remove(&key);
                }
            }
            drop(done);
        })
    }
}

/// Per-key coalescing of writes. Each key holds at most one pending value;
/// scheduling a new one restarts that key's timer. A flush, once started, is
/// never cancelled: `cancel` and rescheduling only affect values that have
/// not been handed to the flusher yet. Flushes of the same key are
/// serialized, flushes of different keys run concurrently.
///
/// Dropping the debouncer flushes everything still pending.
pub struct Debouncer<K, V>
where
    K: Clone + Eq + Hash + Send + 'static,
    V: Send + 'static,
{
    delay: Duration,
    shared: Arc<Shared<K, V>>,
}

impl<K, V> Debouncer<K, V>
where
    K: Clone + Eq + Hash + Send + 'static,
    V: Send + 'static,
{
    /// Must be called from within a tokio runtime; timers and flushes are
    /// spawned on it.
    pub fn new(delay: Duration, flusher: Flusher<K, V>) -> FolioResult<Self> {
        let runtime = Handle::try_current().map_err(|e| FolioError::External(e.to_string()))?;
        Ok(Self {
            delay,
            shared: Arc::new(Shared {
                runtime,
                flusher,
                slots: Mutex::new(Slots {
                    entries: HashMap::new(),
                    tails: HashMap::new(),
                    generation: 0,
                }),
            }),
        })
    }

    pub fn delay(&self) -> Duration {
        self.delay
    }

    pub fn is_pending(&self, key: &K) -> bool {
        self.shared.slots.lock().entries.contains_key(key)
    }

    pub fn pending_len(&self) -> usize {
        self.shared.slots.lock().entries.len()
    }

    pub fn schedule(&self, key: K, value: V) {
        let generation = {
            let mut slots = self.shared.slots.lock();
            slots.generation += 1;
            let generation = slots.generation;
            let previous = slots.entries.insert(
                key.clone(),
                Pending {
                    value,
                    generation,
                    timer: None,
                },
            );
            if let Some(timer) = previous.and_then(|p| p.timer) {
                timer.abort();
            }
            generation
        };

        let timer = self.shared.runtime.spawn({
            let shared = self.shared.clone();
            let key = key.clone();
            let delay = self.delay;
            async move {
                sleep(delay).await;
                let mut slots = shared.slots.lock();
                if slots.entries.get(&key).map(|p| p.generation) == Some(generation) {
                    if let Some(pending) = slots.entries.remove(&key) {
                        debug!("debounce window elapsed, flushing");
                        shared.start_write(&mut slots, key, pending.value);
                    }
                }
            }
        });

        let mut slots = self.shared.slots.lock();
        // a timer whose entry is gone has already started its write
        if let Some(pending) = slots.entries.get_mut(&key).filter(|p| p.generation == generation) {
            pending.timer = Some(timer);
        }
    }

    /// Flush the key now, bypassing its timer. The write still waits for
    /// earlier writes of the same key.
    pub fn flush(&self, key: &K) -> Option<JoinHandle<()>> {
        let mut slots = self.shared.slots.lock();
        let pending = slots.entries.remove(key)?;
        Some(self.write(&mut slots, key.clone(), pending))
    }

    /// Drop the key's pending value without writing it.
    pub fn cancel(&self, key: &K) -> Option<V> {
        let pending = self.shared.slots.lock().entries.remove(key)?;
        if let Some(timer) = pending.timer {
            timer.abort();
        }
        Some(pending.value)
    }

    pub fn flush_all(&self) -> Vec<JoinHandle<()>> {
        let mut slots = self.shared.slots.lock();
        let drained = slots.entries.drain().collect::<Vec<_>>();
        drained
            .into_iter()
            .map(|(key, pending)| self.write(&mut slots, key, pending))
            .collect()
    }

    fn write(&self, slots: &mut Slots<K, V>, key: K, pending: Pending<V>) -> JoinHandle<()> {
        let Pending { value, timer, .. } = pending;
        if let Some(timer) = timer {
            timer.abort();
        }
        self.shared.start_write(slots, key, value)
    }
}

impl<K, V> Drop for Debouncer<K, V>
where
    K: Clone + Eq + Hash + Send + 'static,
    V: Send + 'static,
{
    fn drop(&mut self) {
        let handles = self.flush_all();
        if !handles.is_empty() {
            debug!("flushed {} pending writes on drop", handles.len());
        }
    }
}
