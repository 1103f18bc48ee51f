use serenity::all::GuildId;
use std::{
    collections::{HashMap, HashSet},
    sync::{Arc, Mutex, MutexGuard},
    time::Duration,
};
use tokio::time::Instant;

/// Per-guild expiry times during which no voice connection may be made.
///
/// Entries are never removed, an expired entry simply stops suppressing anything.
#[derive(Default)]
pub struct Cooldowns(HashMap<GuildId, Instant>);

impl Cooldowns {
    pub fn new() -> Self {
        Self(HashMap::new())
    }

    /// Suppress the guild for `duration` from now, replacing any previous cooldown.
    pub fn set(&mut self, guild_id: GuildId, duration: Duration) {
        self.0.insert(guild_id, Instant::now() + duration);
    }

    pub fn is_active(&self, guild_id: GuildId) -> bool {
        matches!(self.0.get(&guild_id), Some(expiry) if *expiry > Instant::now())
    }
}

/// Guilds with a reconnect task in flight, at most one per guild.
#[derive(Clone, Default)]
pub struct PendingReconnects(Arc<Mutex<HashSet<GuildId>>>);

impl PendingReconnects {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn contains(&self, guild_id: GuildId) -> bool {
        self.lock().contains(&guild_id)
    }

    #[cfg(test)]
    pub fn len(&self) -> usize {
        self.lock().len()
    }

    /// Atomically claim the guild and, if it wasn't already claimed, start its task.
    ///
    /// `spawn` receives a guard which releases the claim when dropped; the task must hold it until
    /// it is done.  Returns false, without calling `spawn`, if the guild already has a task.
    pub fn try_start<F>(&self, guild_id: GuildId, spawn: F) -> bool
    where
        F: FnOnce(PendingGuard),
    {
        if !self.lock().insert(guild_id) {
            return false;
        }

        // The lock must be released here: a runtime that is shutting down drops the task, and
        // with it the guard, before `spawn` returns.
        spawn(PendingGuard {
            pending: self.clone(),
            guild_id,
        });
        true
    }

    fn lock(&self) -> MutexGuard<'_, HashSet<GuildId>> {
        // A panic elsewhere can't leave the set half-updated, so keep going with it.
        self.0.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }
}

/// Clears a guild's pending marker on drop, including when the task panics or is never run.
pub struct PendingGuard {
    pending: PendingReconnects,
    guild_id: GuildId,
}

impl Drop for PendingGuard {
    fn drop(&mut self) {
        self.pending.lock().remove(&self.guild_id);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test(start_paused = true)]
    async fn cooldown_expires_by_time() {
        let guild = GuildId::new(123);
        let mut cooldowns = Cooldowns::new();
        assert!(!cooldowns.is_active(guild));

        cooldowns.set(guild, Duration::from_secs(300));
        assert!(cooldowns.is_active(guild));

        tokio::time::advance(Duration::from_secs(299)).await;
        assert!(cooldowns.is_active(guild));

        tokio::time::advance(Duration::from_secs(1)).await;
        assert!(!cooldowns.is_active(guild));
    }

    #[tokio::test(start_paused = true)]
    async fn cooldown_is_per_guild_and_overwritten() {
        let mut cooldowns = Cooldowns::new();
        cooldowns.set(GuildId::new(1), Duration::from_secs(10));
        assert!(!cooldowns.is_active(GuildId::new(2)));

        cooldowns.set(GuildId::new(1), Duration::from_secs(1));
        tokio::time::advance(Duration::from_secs(2)).await;
        assert!(!cooldowns.is_active(GuildId::new(1)));
    }

    #[tokio::test(start_paused = true)]
    async fn second_start_is_refused_until_first_finishes() {
        let guild = GuildId::new(1);
        let pending = PendingReconnects::new();

        let started = pending.try_start(guild, |guard| {
            tokio::spawn(async move {
                let _guard = guard;
                tokio::time::sleep(Duration::from_secs(2)).await;
            });
        });
        assert!(started);
        assert!(pending.contains(guild));

        let started_again = pending.try_start(guild, |_| unreachable!());
        assert!(!started_again);
        assert_eq!(pending.len(), 1);

        tokio::time::sleep(Duration::from_secs(3)).await;
        assert!(!pending.contains(guild));
    }

    #[tokio::test]
    async fn panicking_task_clears_marker() {
        let guild = GuildId::new(1);
        let pending = PendingReconnects::new();

        pending.try_start(guild, |guard| {
            tokio::spawn(async move {
                let _guard = guard;
                panic!("reconnect blew up");
            });
        });

        // Let the task run and unwind.
        while pending.contains(guild) {
            tokio::task::yield_now().await;
        }
        assert_eq!(pending.len(), 0);
    }

    #[test]
    fn start_on_shut_down_runtime_clears_marker() {
        let runtime = tokio::runtime::Builder::new_current_thread()
            .build()
            .unwrap();
        let handle = runtime.handle().clone();
        drop(runtime);

        let guild = GuildId::new(1);
        let pending = PendingReconnects::new();
        let (done, result) = std::sync::mpsc::channel();
        {
            let pending = pending.clone();
            std::thread::spawn(move || {
                let _entered = handle.enter();
                // The runtime drops the task, and its guard, inside `spawn`.
                let started = pending.try_start(guild, |guard| {
                    tokio::spawn(async move {
                        let _guard = guard;
                    });
                });
                let _ = done.send(started);
            });
        }

        let started = result
            .recv_timeout(Duration::from_secs(5))
            .expect("try_start did not return");
        assert!(started);
        assert!(!pending.contains(guild));
    }
}
