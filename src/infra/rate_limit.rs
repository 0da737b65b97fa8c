use async_trait::async_trait;
use redis::{Script, aio::ConnectionManager};

use super::InfraError;
use crate::app_error::{AppError, AppResult};

#[async_trait]
pub trait RateLimiterTrait: Send + Sync {
    /// Count one request from `ip`. Returns `AppError::RateLimited` once the
    /// window's budget is spent.
    async fn check_ip(&self, ip: &str) -> AppResult<()>;

    /// Count one login attempt for `email`, whatever address it came from.
    async fn check_email(&self, email: &str) -> AppResult<()>;
}

/// Atomic increment that starts the window on the first hit. A key that
/// somehow lost its TTL gets one again.
const INCR_WITH_TTL_SCRIPT: &str = r#"
local current = redis.call('INCR', KEYS[1])
if current == 1 then
    redis.call('EXPIRE', KEYS[1], ARGV[1])
elseif redis.call('TTL', KEYS[1]) == -1 then
    redis.call('EXPIRE', KEYS[1], ARGV[1])
end
return current
"#;

/// Fixed-window limiter shared by every API instance through Redis.
#[derive(Clone)]
pub struct RedisRateLimiter {
    manager: ConnectionManager,
    window_secs: u64,
    max_per_ip: u64,
    max_per_email: u64,
    script: Script,
}

impl RedisRateLimiter {
    pub async fn new(
        redis_url: &str,
        window_secs: u64,
        max_per_ip: u64,
        max_per_email: u64,
    ) -> Result<Self, InfraError> {
        let client = redis::Client::open(redis_url).map_err(InfraError::RedisConnection)?;
        let manager = ConnectionManager::new(client)
            .await
            .map_err(InfraError::RedisConnection)?;
        Ok(Self {
            manager,
            window_secs,
            max_per_ip,
            max_per_email,
            script: Script::new(INCR_WITH_TTL_SCRIPT),
        })
    }

    async fn bump(&self, conn: &mut ConnectionManager, key: &str, limit: u64) -> AppResult<()> {
        let current: u64 = self
            .script
            .key(key)
            .arg(self.window_secs)
            .invoke_async(conn)
            .await
            .map_err(|e| AppError::Internal(e.to_string()))?;

        if current > limit {
            tracing::warn!(key, current, limit, "Rate limit exceeded");
            return Err(AppError::RateLimited);
        }
        Ok(())
    }
}

#[async_trait]
impl RateLimiterTrait for RedisRateLimiter {
    async fn check_ip(&self, ip: &str) -> AppResult<()> {
        let mut conn = self.manager.clone();
        self.bump(&mut conn, &format!("gymdesk:rate:ip:{ip}"), self.max_per_ip)
            .await
    }

    async fn check_email(&self, email: &str) -> AppResult<()> {
        let mut conn = self.manager.clone();
        let key = format!("gymdesk:rate:email:{}", email_key(email));
        self.bump(&mut conn, &key, self.max_per_email).await
    }
}

/// Addresses differing only in case or surrounding blanks share a budget.
pub fn email_key(email: &str) -> String {
    email.trim().to_lowercase()
}
