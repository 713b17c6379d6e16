use std::future::Future;
use std::time::Duration;

use dcron_core::config::{StoreBackend, StoreConfig};
use dcron_core::store::{ScoredMember, SortedSetStore};
use dcron_core::{DcronError, Result};
use futures::future::BoxFuture;
use redis::aio::MultiplexedConnection;
use redis::cluster::ClusterClient;
use redis::cluster_async::ClusterConnection;
use redis::{Cmd, FromRedisValue, RedisResult, Value};

const DEFAULT_KEY_PREFIX: &str = "distributed-cron:";

#[derive(Clone)]
enum Connection {
    Single(MultiplexedConnection),
    Cluster(ClusterConnection),
}

/// Sorted-set store backed by Redis or Redis Cluster.
///
/// Each cluster maps to one sorted set at `<key_prefix><cluster>`; members are
/// node identities and scores are renewal timestamps. Every command touches a
/// single key, so a cluster deployment routes each call to one slot.
#[derive(Clone)]
pub struct RedisStore {
    conn: Connection,
    key_prefix: String,
    command_timeout: Option<Duration>,
}

impl RedisStore {
    /// Connect to a single Redis node.
    pub async fn connect(redis_url: &str) -> Result<Self> {
        let client = redis::Client::open(redis_url).map_err(DcronError::store)?;
        let conn = client
            .get_multiplexed_async_connection()
            .await
            .map_err(DcronError::store)?;

        tracing::debug!(url = %redis_url, "Connected to Redis");
        Ok(Self::with_connection(Connection::Single(conn)))
    }

    /// Connect to a Redis Cluster through its seed nodes.
    pub async fn connect_cluster(nodes: &[String]) -> Result<Self> {
        let client = ClusterClient::new(nodes.to_vec()).map_err(DcronError::store)?;
        let conn = client
            .get_async_connection()
            .await
            .map_err(DcronError::store)?;

        tracing::debug!(seeds = nodes.len(), "Connected to Redis Cluster");
        Ok(Self::with_connection(Connection::Cluster(conn)))
    }

    fn with_connection(conn: Connection) -> Self {
        Self {
            conn,
            key_prefix: DEFAULT_KEY_PREFIX.to_string(),
            command_timeout: None,
        }
    }

    /// Connect using a store configuration section.
    pub async fn from_config(config: &StoreConfig) -> Result<Self> {
        let store = match config.backend {
            StoreBackend::RedisCluster => Self::connect_cluster(&config.cluster_nodes()).await?,
            _ => Self::connect(&config.url).await?,
        };
        Ok(store
            .with_key_prefix(config.key_prefix.clone())
            .with_command_timeout(config.command_timeout()))
    }

    /// Set the key prefix.
    pub fn with_key_prefix(mut self, prefix: impl Into<String>) -> Self {
        self.key_prefix = prefix.into();
        self
    }

    /// Bound every command by `timeout`.
    pub fn with_command_timeout(mut self, timeout: Option<Duration>) -> Self {
        self.command_timeout = timeout;
        self
    }

    /// Key of a cluster's sorted set.
    pub fn key(&self, cluster: &str) -> String {
        format!("{}{}", self.key_prefix, cluster)
    }

    async fn exec<T: FromRedisValue + Send>(&self, cmd: Cmd) -> Result<T> {
        let conn = self.conn.clone();
        bounded(self.command_timeout, async move {
            match conn {
                Connection::Single(mut conn) => cmd.query_async::<T>(&mut conn).await,
                Connection::Cluster(mut conn) => cmd.query_async::<T>(&mut conn).await,
            }
        })
        .await
    }
}

impl std::fmt::Debug for RedisStore {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RedisStore")
            .field("backend", &self.backend_name())
            .field("key_prefix", &self.key_prefix)
            .field("command_timeout", &self.command_timeout)
            .finish_non_exhaustive()
    }
}

/// Await `fut`, failing with a store error once `limit` elapses.
async fn bounded<T, F>(limit: Option<Duration>, fut: F) -> Result<T>
where
    F: Future<Output = RedisResult<T>>,
{
    match limit {
        Some(limit) => tokio::time::timeout(limit, fut)
            .await
            .map_err(DcronError::store)?
            .map_err(DcronError::store),
        None => fut.await.map_err(DcronError::store),
    }
}

/// Render a score bound the way Redis expects it.
fn score_bound(score: f64) -> String {
    if score == f64::INFINITY {
        "+inf".to_string()
    } else if score == f64::NEG_INFINITY {
        "-inf".to_string()
    } else {
        score.to_string()
    }
}

fn zadd_cmd(key: &str, member: &str, score: f64) -> Cmd {
    let mut cmd = redis::cmd("ZADD");
    cmd.arg(key).arg(score_bound(score)).arg(member);
    cmd
}

fn zrangebyscore_cmd(key: &str, min: f64, max: f64) -> Cmd {
    let mut cmd = redis::cmd("ZRANGEBYSCORE");
    cmd.arg(key)
        .arg(score_bound(min))
        .arg(score_bound(max))
        .arg("WITHSCORES");
    cmd
}

/// Exclusive upper bound: a member scored exactly at `cutoff` survives.
fn zremrangebyscore_cmd(key: &str, cutoff: f64) -> Cmd {
    let mut cmd = redis::cmd("ZREMRANGEBYSCORE");
    cmd.arg(key)
        .arg("-inf")
        .arg(format!("({}", score_bound(cutoff)));
    cmd
}

fn zrem_cmd(key: &str, member: &str) -> Cmd {
    let mut cmd = redis::cmd("ZREM");
    cmd.arg(key).arg(member);
    cmd
}

/// Decode a `WITHSCORES` reply into `(member, score)` pairs.
fn parse_scored(value: &Value) -> RedisResult<Vec<ScoredMember>> {
    redis::from_redis_value(value)
}

/// `ZREM` replies with the number of members removed.
fn parse_removed(value: &Value) -> RedisResult<bool> {
    Ok(redis::from_redis_value::<u64>(value)? > 0)
}

impl SortedSetStore for RedisStore {
    fn upsert<'a>(
        &'a self,
        cluster: &'a str,
        member: &'a str,
        score: f64,
    ) -> BoxFuture<'a, Result<()>> {
        Box::pin(async move {
            self.exec::<()>(zadd_cmd(&self.key(cluster), member, score))
                .await
        })
    }

    fn range_by_score<'a>(
        &'a self,
        cluster: &'a str,
        min: f64,
        max: f64,
    ) -> BoxFuture<'a, Result<Vec<ScoredMember>>> {
        Box::pin(async move {
            let reply: Value = self
                .exec(zrangebyscore_cmd(&self.key(cluster), min, max))
                .await?;
            parse_scored(&reply).map_err(DcronError::store)
        })
    }

    fn remove_older_than<'a>(
        &'a self,
        cluster: &'a str,
        cutoff: f64,
    ) -> BoxFuture<'a, Result<u64>> {
        Box::pin(async move {
            self.exec(zremrangebyscore_cmd(&self.key(cluster), cutoff))
                .await
        })
    }

    fn remove<'a>(&'a self, cluster: &'a str, member: &'a str) -> BoxFuture<'a, Result<bool>> {
        Box::pin(async move {
            let reply: Value = self.exec(zrem_cmd(&self.key(cluster), member)).await?;
            parse_removed(&reply).map_err(DcronError::store)
        })
    }

    fn backend_name(&self) -> &'static str {
        match self.conn {
            Connection::Single(_) => "redis",
            Connection::Cluster(_) => "redis-cluster",
        }
    }
}
