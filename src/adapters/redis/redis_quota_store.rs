//! Redis-backed quota store for production deployments.
//!
//! Each user is one hash at `{prefix}:user:{user_id}` with the fields
//! `userType`, `decksCreated` and `decksPublished`. Conditional writes run
//! as Lua scripts so the compare and the write happen in one round-trip on
//! the server, with no other command interleaved.

use async_trait::async_trait;
use redis::aio::MultiplexedConnection;
use redis::{AsyncCommands, Script};
use std::collections::HashMap;
use std::future::Future;
use std::time::Duration;

use crate::config::RedisConfig;
use crate::domain::foundation::UserId;
use crate::domain::quota::{DeckCounters, UserQuotaRecord, UserType};
use crate::ports::{QuotaStore, StoreError};

const FIELD_USER_TYPE: &str = "userType";
const FIELD_DECKS_CREATED: &str = "decksCreated";
const FIELD_DECKS_PUBLISHED: &str = "decksPublished";

/// Returns 1 if inserted, 0 if the key already exists.
const INSERT_SCRIPT: &str = r#"
if redis.call('EXISTS', KEYS[1]) == 1 then
  return 0
end
redis.call('HSET', KEYS[1], 'userType', ARGV[1], 'decksCreated', ARGV[2], 'decksPublished', ARGV[3])
return 1
"#;

/// Returns {status, userType, decksCreated, decksPublished}.
/// status: 1 applied, 0 counters differ from ARGV[1..2], -1 missing key.
const COMPARE_AND_SET_SCRIPT: &str = r#"
if redis.call('EXISTS', KEYS[1]) == 0 then
  return {-1, false, false, false}
end
local fields = redis.call('HMGET', KEYS[1], 'userType', 'decksCreated', 'decksPublished')
if fields[2] ~= ARGV[1] or fields[3] ~= ARGV[2] then
  return {0, fields[1], fields[2], fields[3]}
end
redis.call('HSET', KEYS[1], 'decksCreated', ARGV[3], 'decksPublished', ARGV[4])
return {1, fields[1], ARGV[3], ARGV[4]}
"#;

const STATUS_APPLIED: i64 = 1;
const STATUS_CONFLICT: i64 = 0;
const STATUS_MISSING: i64 = -1;

type CompareAndSetReply = (i64, Option<String>, Option<String>, Option<String>);

/// Redis implementation of the QuotaStore port.
#[derive(Clone)]
pub struct RedisQuotaStore {
    conn: MultiplexedConnection,
    key_prefix: String,
    timeout: Duration,
    insert_script: Script,
    compare_and_set_script: Script,
}

impl RedisQuotaStore {
    /// Create a store over an existing connection.
    pub fn new(conn: MultiplexedConnection, key_prefix: impl Into<String>, timeout: Duration) -> Self {
        Self {
            conn,
            key_prefix: key_prefix.into(),
            timeout,
            insert_script: Script::new(INSERT_SCRIPT),
            compare_and_set_script: Script::new(COMPARE_AND_SET_SCRIPT),
        }
    }

    /// Open a multiplexed connection using the given configuration.
    pub async fn connect(config: &RedisConfig) -> Result<Self, StoreError> {
        let client = redis::Client::open(config.url.as_str()).map_err(StoreError::unavailable)?;
        let conn = tokio::time::timeout(config.timeout(), client.get_multiplexed_tokio_connection())
            .await
            .map_err(|_| StoreError::unavailable("timed out connecting to redis"))?
            .map_err(StoreError::unavailable)?;

        tracing::info!(prefix = %config.key_prefix, "Connected quota store to redis");
        Ok(Self::new(conn, config.key_prefix.clone(), config.timeout()))
    }

    fn record_key(&self, user_id: &UserId) -> String {
        record_key(&self.key_prefix, user_id)
    }

    /// Bound a redis call by the configured timeout and map its errors.
    async fn call<T, F>(&self, op: &'static str, fut: F) -> Result<T, StoreError>
    where
        F: Future<Output = redis::RedisResult<T>>,
    {
        match tokio::time::timeout(self.timeout, fut).await {
            Ok(Ok(value)) => Ok(value),
            Ok(Err(e)) => {
                tracing::error!(op = op, "Redis command failed: {}", e);
                Err(StoreError::unavailable(e))
            }
            Err(_) => {
                tracing::error!(
                    op = op,
                    timeout_ms = self.timeout.as_millis() as u64,
                    "Redis command timed out"
                );
                Err(StoreError::unavailable(format!("redis {} timed out", op)))
            }
        }
    }
}

fn record_key(prefix: &str, user_id: &UserId) -> String {
    format!("{}:user:{}", prefix, user_id)
}

fn parse_counter(field: &str, value: Option<&str>) -> Result<u32, StoreError> {
    let value = value.ok_or_else(|| StoreError::corrupt(format!("missing field {}", field)))?;
    value
        .parse::<u32>()
        .map_err(|_| StoreError::corrupt(format!("{}={} is not a count", field, value)))
}

fn parse_user_type(value: Option<&str>) -> Result<UserType, StoreError> {
    let value = value.ok_or_else(|| StoreError::corrupt(format!("missing field {}", FIELD_USER_TYPE)))?;
    value
        .parse::<UserType>()
        .map_err(|_| StoreError::corrupt(format!("{}={} is not a tier", FIELD_USER_TYPE, value)))
}

/// Decode a hash as returned by HGETALL. An empty hash means no record.
fn record_from_hash(
    user_id: &UserId,
    hash: &HashMap<String, String>,
) -> Result<Option<UserQuotaRecord>, StoreError> {
    if hash.is_empty() {
        return Ok(None);
    }

    let field = |name: &str| hash.get(name).map(String::as_str);
    let user_type = parse_user_type(field(FIELD_USER_TYPE))?;
    let counters = DeckCounters::new(
        parse_counter(FIELD_DECKS_CREATED, field(FIELD_DECKS_CREATED))?,
        parse_counter(FIELD_DECKS_PUBLISHED, field(FIELD_DECKS_PUBLISHED))?,
    );

    Ok(Some(UserQuotaRecord::from_parts(user_id.clone(), user_type, counters)))
}

fn decode_compare_and_set(
    user_id: &UserId,
    (status, user_type, created, published): CompareAndSetReply,
) -> Result<UserQuotaRecord, StoreError> {
    match status {
        STATUS_MISSING => Err(StoreError::NotFound(user_id.clone())),
        STATUS_CONFLICT | STATUS_APPLIED => {
            let counters = DeckCounters::new(
                parse_counter(FIELD_DECKS_CREATED, created.as_deref())?,
                parse_counter(FIELD_DECKS_PUBLISHED, published.as_deref())?,
            );
            if status == STATUS_CONFLICT {
                return Err(StoreError::Conflict { current: counters });
            }
            let user_type = parse_user_type(user_type.as_deref())?;
            Ok(UserQuotaRecord::from_parts(user_id.clone(), user_type, counters))
        }
        other => Err(StoreError::corrupt(format!("unexpected script status {}", other))),
    }
}

#[async_trait]
impl QuotaStore for RedisQuotaStore {
    async fn get(&self, user_id: &UserId) -> Result<Option<UserQuotaRecord>, StoreError> {
        let key = self.record_key(user_id);
        let mut conn = self.conn.clone();

        let hash: HashMap<String, String> = self.call("HGETALL", conn.hgetall(&key)).await?;
        record_from_hash(user_id, &hash)
    }

    async fn put(&self, record: &UserQuotaRecord) -> Result<(), StoreError> {
        let key = self.record_key(&record.user_id);
        let mut conn = self.conn.clone();

        let mut invocation = self.insert_script.key(&key);
        invocation
            .arg(record.user_type.as_str())
            .arg(record.decks_created())
            .arg(record.decks_published());

        let inserted: i64 = self
            .call("EVALSHA insert", invocation.invoke_async(&mut conn))
            .await?;

        if inserted == 0 {
            return Err(StoreError::AlreadyExists(record.user_id.clone()));
        }
        Ok(())
    }

    async fn update_counters(
        &self,
        user_id: &UserId,
        expected: DeckCounters,
        next: DeckCounters,
    ) -> Result<UserQuotaRecord, StoreError> {
        let key = self.record_key(user_id);
        let mut conn = self.conn.clone();

        let mut invocation = self.compare_and_set_script.key(&key);
        invocation
            .arg(expected.decks_created)
            .arg(expected.decks_published)
            .arg(next.decks_created)
            .arg(next.decks_published);

        let reply: CompareAndSetReply = self
            .call("EVALSHA compare_and_set", invocation.invoke_async(&mut conn))
            .await?;

        decode_compare_and_set(user_id, reply)
    }

    async fn delete(&self, user_id: &UserId) -> Result<(), StoreError> {
        let key = self.record_key(user_id);
        let mut conn = self.conn.clone();

        self.call::<(), _>("DEL", conn.del(&key)).await
    }
}

impl std::fmt::Debug for RedisQuotaStore {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RedisQuotaStore")
            .field("key_prefix", &self.key_prefix)
            .field("timeout", &self.timeout)
            .finish_non_exhaustive()
    }
}
