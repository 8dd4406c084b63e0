use super::entity::EntityId;

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct TimerId(u64);

#[derive(Debug, Clone, PartialEq)]
pub struct Fired<T> {
    pub id: TimerId,
    pub owner: EntityId,
    pub payload: T,
}

#[derive(Debug, Clone)]
struct PendingTimer<T> {
    id: TimerId,
    owner: EntityId,
    due_ms: u64,
    payload: T,
}

/// Owned, cancellable replacement for fire-and-forget delayed callbacks.
///
/// Entries are keyed by the entity they act on so every timer for a
/// disposed entity can be dropped at once. Entries due on the same tick
/// fire in due-time order, then in scheduling order, each exactly once.
#[derive(Debug, Clone)]
pub struct TimerQueue<T> {
    now_ms: u64,
    next_id: u64,
    pending: Vec<PendingTimer<T>>,
}

impl<T> Default for TimerQueue<T> {
    fn default() -> Self {
        Self {
            now_ms: 0,
            next_id: 0,
            pending: Vec::new(),
        }
    }
}

impl<T> TimerQueue<T> {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn now_ms(&self) -> u64 {
        self.now_ms
    }

    pub fn len(&self) -> usize {
        self.pending.len()
    }

    pub fn is_empty(&self) -> bool {
        self.pending.is_empty()
    }

    pub fn schedule(&mut self, owner: EntityId, delay_ms: u64, payload: T) -> TimerId {
        let id = TimerId(self.next_id);
        self.next_id = self.next_id.saturating_add(1);
        self.pending.push(PendingTimer {
            id,
            owner,
            due_ms: self.now_ms.saturating_add(delay_ms),
            payload,
        });
        id
    }

    pub fn cancel(&mut self, id: TimerId) -> bool {
        let before = self.pending.len();
        self.pending.retain(|timer| timer.id != id);
        self.pending.len() != before
    }

    pub fn cancel_owner(&mut self, owner: EntityId) -> usize {
        let before = self.pending.len();
        self.pending.retain(|timer| timer.owner != owner);
        before - self.pending.len()
    }

    pub fn clear(&mut self) {
        self.pending.clear();
    }

    /// Moves the clock forward and returns every entry that came due.
    pub fn advance(&mut self, dt_ms: u64) -> Vec<Fired<T>> {
        self.now_ms = self.now_ms.saturating_add(dt_ms);
        let now_ms = self.now_ms;
        let (mut due, pending): (Vec<_>, Vec<_>) = std::mem::take(&mut self.pending)
            .into_iter()
            .partition(|timer| timer.due_ms <= now_ms);
        self.pending = pending;
        due.sort_by_key(|timer| (timer.due_ms, timer.id));
        due.into_iter()
            .map(|timer| Fired {
                id: timer.id,
                owner: timer.owner,
                payload: timer.payload,
            })
            .collect()
    }
}
