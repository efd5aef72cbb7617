use dashmap::DashMap;
use serenity::model::id::GuildId;
use std::sync::Arc;
use tokio::sync::{Mutex, OwnedMutexGuard};

/// Registro de sesiones por guild.
///
/// Cada operación sobre el mapa es atómica por sí misma. Las secuencias que
/// cruzan puntos de espera (conectar y luego registrar) se serializan con
/// [`SessionStore::lock`].
pub struct SessionStore<S> {
    sessions: DashMap<GuildId, S>,
    /// Un candado por guild vista, reutilizado en cada operación. No se borra
    /// al quitar la sesión: quien espera en él debe seguir serializado con el
    /// siguiente. El mapa crece como mucho hasta el número de guilds del bot.
    locks: DashMap<GuildId, Arc<Mutex<()>>>,
}

impl<S: Clone> SessionStore<S> {
    pub fn new() -> Self {
        Self {
            sessions: DashMap::new(),
            locks: DashMap::new(),
        }
    }

    pub fn get(&self, guild_id: GuildId) -> Option<S> {
        self.sessions.get(&guild_id).map(|s| s.clone())
    }

    /// Inserta o reemplaza la sesión, devolviendo la anterior si existía.
    pub fn upsert(&self, guild_id: GuildId, session: S) -> Option<S> {
        self.sessions.insert(guild_id, session)
    }

    pub fn remove(&self, guild_id: GuildId) -> Option<S> {
        self.sessions.remove(&guild_id).map(|(_, s)| s)
    }

    pub fn contains(&self, guild_id: GuildId) -> bool {
        self.sessions.contains_key(&guild_id)
    }

    pub fn len(&self) -> usize {
        self.sessions.len()
    }

    /// Toma el candado de ciclo de vida de una guild.
    pub async fn lock(&self, guild_id: GuildId) -> OwnedMutexGuard<()> {
        // El Arc se clona antes de esperar: no se retiene la shard del DashMap.
        let lock = self.locks.entry(guild_id).or_default().clone();
        lock.lock_owned().await
    }
}

impl<S: Clone> Default for SessionStore<S> {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;

    #[test]
    fn upsert_returns_previous_entry() {
        let store = SessionStore::new();
        let guild = GuildId::new(1);

        assert_eq!(store.upsert(guild, "a"), None);
        assert_eq!(store.upsert(guild, "b"), Some("a"));
        assert_eq!(store.get(guild), Some("b"));
        assert_eq!(store.len(), 1);
    }

    #[test]
    fn remove_is_idempotent() {
        let store = SessionStore::new();
        let guild = GuildId::new(7);
        store.upsert(guild, 1u8);

        assert_eq!(store.remove(guild), Some(1));
        assert_eq!(store.remove(guild), None);
        assert!(!store.contains(guild));
    }

    #[test]
    fn guilds_are_isolated() {
        let store = SessionStore::new();
        store.upsert(GuildId::new(1), "uno");
        store.upsert(GuildId::new(2), "dos");

        store.remove(GuildId::new(1));
        assert_eq!(store.get(GuildId::new(2)), Some("dos"));
    }

    #[tokio::test]
    async fn lock_serializes_same_guild() {
        let store = Arc::new(SessionStore::<u8>::new());
        let guild = GuildId::new(3);

        let guard = store.lock(guild).await;

        let contender = {
            let store = store.clone();
            tokio::spawn(async move {
                let _guard = store.lock(guild).await;
            })
        };

        tokio::time::sleep(Duration::from_millis(20)).await;
        assert!(!contender.is_finished());

        drop(guard);
        contender.await.unwrap();
    }

    #[tokio::test]
    async fn lock_does_not_block_other_guilds() {
        let store = SessionStore::<u8>::new();
        let _first = store.lock(GuildId::new(1)).await;

        let second = tokio::time::timeout(Duration::from_millis(100), store.lock(GuildId::new(2))).await;
        assert!(second.is_ok());
    }

    #[tokio::test]
    async fn locks_are_reused_per_guild() {
        let store = SessionStore::<u8>::new();

        for _ in 0..50 {
            let _guard = store.lock(GuildId::new(1)).await;
            store.upsert(GuildId::new(1), 1);
            store.remove(GuildId::new(1));
        }
        let _other = store.lock(GuildId::new(2)).await;

        assert_eq!(store.locks.len(), 2);
    }
}
