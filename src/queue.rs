use std::{
    collections::VecDeque,
    sync::{Arc, Mutex, MutexGuard, PoisonError},
};

/// Callback receiving each dequeued item.
pub type ProcessedCallback<E> = Arc<dyn Fn(E) + Send + Sync>;

#[derive(Debug)]
struct QueueState<E> {
    can_run: bool,
    processing: bool,
    pending: VecDeque<E>,
}

/// Ordered, gated, single-consumer buffer.
///
/// Items pushed before [`run`](EventQueue::run) are held back; once the gate
/// is open every pushed item is handed, in strict FIFO order, to the callback
/// registered with [`on_processed`](EventQueue::on_processed).
///
/// Draining happens synchronously inside `push`/`run` on whichever thread
/// finds the queue idle. A push that lands while another thread is draining
/// only appends; the draining thread picks the item up before going idle.
/// The callback must therefore return quickly and must not wait for the queue
/// to process another item.
///
/// ```
/// use std::sync::{Arc, Mutex};
/// use trackify::EventQueue;
///
/// let seen = Arc::new(Mutex::new(Vec::new()));
/// let queue = EventQueue::new();
/// let sink = seen.clone();
/// queue.on_processed(move |n: u32| sink.lock().unwrap().push(n));
///
/// queue.push(1);
/// queue.push(2);
/// assert!(seen.lock().unwrap().is_empty());
///
/// queue.run();
/// assert_eq!(*seen.lock().unwrap(), vec![1, 2]);
/// ```
pub struct EventQueue<E> {
    state: Mutex<QueueState<E>>,
    callback: Mutex<Option<ProcessedCallback<E>>>,
}

impl<E: Send + 'static> EventQueue<E> {
    pub fn new() -> Self {
        Self {
            state: Mutex::new(QueueState {
                can_run: false,
                processing: false,
                pending: VecDeque::new(),
            }),
            callback: Mutex::new(None),
        }
    }

    /// Registers the drain callback, replacing any previous one.
    pub fn on_processed<F>(&self, callback: F)
    where
        F: Fn(E) + Send + Sync + 'static,
    {
        *self.callback.lock().unwrap_or_else(PoisonError::into_inner) = Some(Arc::new(callback));
    }

    /// Appends an item and drains if the gate is open.
    pub fn push(&self, item: E) {
        self.state().pending.push_back(item);
        self.process();
    }

    /// Opens the gate for good and drains the backlog. Idempotent.
    pub fn run(&self) {
        self.state().can_run = true;
        self.process();
    }

    /// Number of items waiting to be drained.
    pub fn len(&self) -> usize {
        self.state().pending.len()
    }

    pub fn is_empty(&self) -> bool {
        self.state().pending.is_empty()
    }

    /// Whether the gate has been opened.
    pub fn is_running(&self) -> bool {
        self.state().can_run
    }

    pub fn is_processing(&self) -> bool {
        self.state().processing
    }

    fn state(&self) -> MutexGuard<'_, QueueState<E>> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }

    fn callback(&self) -> Option<ProcessedCallback<E>> {
        self.callback
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }

    fn process(&self) {
        {
            let mut state = self.state();
            if state.pending.is_empty() || !state.can_run || state.processing {
                return;
            }
            state.processing = true;
        }

        let guard = ProcessingGuard {
            state: &self.state,
            armed: true,
        };

        loop {
            // Popping and going idle share one critical section, so a concurrent
            // push either lands before the pop or sees `processing == false`.
            let next = {
                let mut state = self.state();
                let next = state.pending.pop_front();
                if next.is_none() {
                    state.processing = false;
                }
                next
            };

            let Some(item) = next else {
                guard.disarm();
                return;
            };

            match self.callback() {
                Some(callback) => callback(item),
                None => tracing::warn!("Queue has no processing callback, item dropped"),
            }
        }
    }
}

impl<E: Send + 'static> Default for EventQueue<E> {
    fn default() -> Self {
        Self::new()
    }
}

impl<E> std::fmt::Debug for EventQueue<E> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let state = self.state.lock().unwrap_or_else(PoisonError::into_inner);
        f.debug_struct("EventQueue")
            .field("can_run", &state.can_run)
            .field("processing", &state.processing)
            .field("pending", &state.pending.len())
            .finish()
    }
}

/// Clears `processing` when the drain loop unwinds.
struct ProcessingGuard<'a, E> {
    state: &'a Mutex<QueueState<E>>,
    armed: bool,
}

impl<E> ProcessingGuard<'_, E> {
    fn disarm(mut self) {
        self.armed = false;
    }
}

impl<E> Drop for ProcessingGuard<'_, E> {
    fn drop(&mut self) {
        if self.armed {
            self.state
                .lock()
                .unwrap_or_else(PoisonError::into_inner)
                .processing = false;
        }
    }
}
