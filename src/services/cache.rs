use chrono::{DateTime, Duration, Utc};
use std::collections::HashMap;
use std::sync::Arc;
use tokio::sync::RwLock;

const DEFAULT_MAX_ITEMS: usize = 1000;

/// Cache chave-valor em memória com TTL.
///
/// A expiração é preguiçosa: entradas vencidas são descartadas na leitura,
/// por comparação com o relógio de parede. Quando uma inserção excede a
/// capacidade, os 20% mais antigos por ordem de inserção são removidos
/// (fatia da frente da lista de chaves, não LRU).
#[derive(Debug, Clone)]
pub struct MemoryCache<V: Clone> {
    inner: Arc<RwLock<CacheInner<V>>>,
    max_items: usize,
}

#[derive(Debug)]
struct CacheInner<V> {
    entries: HashMap<String, CacheEntry<V>>,
    insertion_order: Vec<String>,
}

#[derive(Debug, Clone)]
struct CacheEntry<V> {
    value: V,
    expires_at: DateTime<Utc>,
}

impl<V: Clone> MemoryCache<V> {
    pub fn new() -> Self {
        Self::with_capacity(DEFAULT_MAX_ITEMS)
    }

    pub fn with_capacity(max_items: usize) -> Self {
        Self {
            inner: Arc::new(RwLock::new(CacheInner {
                entries: HashMap::new(),
                insertion_order: Vec::new(),
            })),
            max_items,
        }
    }

    pub async fn get(&self, key: &str) -> Option<V> {
        let mut guard = self.inner.write().await;
        let CacheInner { entries, insertion_order } = &mut *guard;

        match entries.get(key) {
            Some(entry) if entry.expires_at > Utc::now() => Some(entry.value.clone()),
            Some(_) => {
                entries.remove(key);
                insertion_order.retain(|k| k != key);
                None
            }
            None => None,
        }
    }

    pub async fn set(&self, key: String, value: V, ttl_secs: i64) {
        let mut guard = self.inner.write().await;
        let CacheInner { entries, insertion_order } = &mut *guard;

        if !entries.contains_key(&key) && entries.len() >= self.max_items {
            // Remove os 20% mais antigos por ordem de inserção
            let evict = (self.max_items / 5).max(1).min(insertion_order.len());
            for old_key in insertion_order.drain(..evict) {
                entries.remove(&old_key);
            }
        }

        if !entries.contains_key(&key) {
            insertion_order.push(key.clone());
        }
        entries.insert(
            key,
            CacheEntry {
                value,
                expires_at: Utc::now() + Duration::seconds(ttl_secs),
            },
        );
    }

    pub async fn delete(&self, key: &str) {
        let mut guard = self.inner.write().await;
        let CacheInner { entries, insertion_order } = &mut *guard;
        entries.remove(key);
        insertion_order.retain(|k| k != key);
    }

    /// Remove todas as entradas já vencidas.
    pub async fn cleanup(&self) {
        let mut guard = self.inner.write().await;
        let CacheInner { entries, insertion_order } = &mut *guard;
        let now = Utc::now();
        entries.retain(|_, entry| entry.expires_at > now);
        insertion_order.retain(|k| entries.contains_key(k));
    }

    pub async fn len(&self) -> usize {
        self.inner.read().await.entries.len()
    }
}

impl<V: Clone> Default for MemoryCache<V> {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_set_then_get_before_ttl() {
        let cache: MemoryCache<String> = MemoryCache::new();
        cache.set("k".to_string(), "v".to_string(), 300).await;
        assert_eq!(cache.get("k").await, Some("v".to_string()));
        assert_eq!(cache.len().await, 1);
    }

    #[tokio::test]
    async fn test_expired_entry_is_absent() {
        let cache: MemoryCache<String> = MemoryCache::new();
        // TTL zero: expira no instante da inserção
        cache.set("k".to_string(), "v".to_string(), 0).await;
        assert_eq!(cache.get("k").await, None);
        // A leitura descarta a entrada vencida
        assert_eq!(cache.len().await, 0);
    }

    #[tokio::test]
    async fn test_delete() {
        let cache: MemoryCache<i32> = MemoryCache::new();
        cache.set("k".to_string(), 1, 300).await;
        cache.delete("k").await;
        assert_eq!(cache.get("k").await, None);
    }

    #[tokio::test]
    async fn test_capacity_evicts_oldest_20_percent() {
        let cache: MemoryCache<usize> = MemoryCache::with_capacity(10);
        for i in 0..10 {
            cache.set(format!("k{}", i), i, 300).await;
        }
        // A 11ª inserção descarta as duas chaves mais antigas (k0 e k1)
        cache.set("k10".to_string(), 10, 300).await;
        assert_eq!(cache.get("k0").await, None);
        assert_eq!(cache.get("k1").await, None);
        assert_eq!(cache.get("k2").await, Some(2));
        assert_eq!(cache.get("k10").await, Some(10));
        assert_eq!(cache.len().await, 9);
    }

    #[tokio::test]
    async fn test_overwrite_does_not_evict() {
        let cache: MemoryCache<usize> = MemoryCache::with_capacity(10);
        for i in 0..10 {
            cache.set(format!("k{}", i), i, 300).await;
        }
        // Atualizar uma chave existente não dispara a limpeza por capacidade
        cache.set("k5".to_string(), 50, 300).await;
        assert_eq!(cache.get("k0").await, Some(0));
        assert_eq!(cache.get("k5").await, Some(50));
        assert_eq!(cache.len().await, 10);
    }

    #[tokio::test]
    async fn test_cleanup_removes_expired() {
        let cache: MemoryCache<i32> = MemoryCache::new();
        cache.set("vivo".to_string(), 1, 300).await;
        cache.set("morto".to_string(), 2, 0).await;
        cache.cleanup().await;
        assert_eq!(cache.len().await, 1);
        assert_eq!(cache.get("vivo").await, Some(1));
    }
}
